// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wires the desktop capabilities into an orchestrator and runs one export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use ausdruck_bridge::{DirectorySaver, HttpAssetFetcher, platform_print_host};
use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::events::{ExportEventKind, JobOutcome};
use ausdruck_core::types::{Delivery, RecordMeta};
use ausdruck_core::ExportConfig;
use ausdruck_document::{PdfRasterizer, RenderedDocument};
use ausdruck_pipeline::{AssetResolver, Capabilities, ExportOrchestrator, StartOutcome};

use super::data_dir;
use super::mount::mount;

/// Everything one `export` invocation needs.
#[derive(Debug)]
pub struct ExportRequest {
    pub document: PathBuf,
    pub meta: RecordMeta,
    pub delivery: Delivery,
    pub config: ExportConfig,
}

/// Resolve the effective config: an explicit file, or `ausdruck.json` in the
/// working directory, then command-line overrides.
pub fn load_config(
    explicit: Option<&Path>,
    base_url: Option<String>,
    out_dir: Option<PathBuf>,
) -> Result<ExportConfig> {
    let mut config = match explicit {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::load_from_dir(&std::env::current_dir()?)?,
    };
    if base_url.is_some() {
        config.asset_base_url = base_url;
    }
    if out_dir.is_some() {
        config.download_dir = out_dir;
    }
    config.validate()?;
    Ok(config)
}

pub fn read_document(path: &Path) -> Result<RenderedDocument> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Mount the document, run the orchestrator and return the job outcome.
pub async fn run_export(request: ExportRequest) -> Result<JobOutcome> {
    let ExportRequest {
        document,
        meta,
        delivery,
        config,
    } = request;

    let mut doc = read_document(&document)?;
    let download_dir = config
        .download_dir
        .clone()
        .unwrap_or_else(data_dir::default_download_dir);
    info!(document = %document.display(), dir = %download_dir.display(), "exporting");

    let fetcher = Arc::new(HttpAssetFetcher::new(config.fetch_timeout())?);
    let resolver = AssetResolver::new(config.asset_base_url.as_deref())?;
    // Loads report through the document's load signals; the handles are not
    // needed.
    let _loads = mount(&mut doc, fetcher.clone(), &resolver);

    let caps = Capabilities {
        rasterizer: Arc::new(PdfRasterizer),
        fetcher,
        saver: Arc::new(DirectorySaver::new(download_dir)),
        print_host: platform_print_host(),
    };
    let orchestrator = ExportOrchestrator::new(config, caps)?;

    let mut events = orchestrator.subscribe();
    let reporter = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.kind {
                    ExportEventKind::Transition { to, .. } => println!("  {to}"),
                    ExportEventKind::AssetWarning { src, message } => {
                        println!("  warning: {src}: {message}")
                    }
                    ExportEventKind::Finished(_) => break,
                    ExportEventKind::Started { .. } => {}
                },
                Err(RecvError::Lagged(missed)) => warn!(missed, "progress output lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = orchestrator.start_with(&mut doc, meta, delivery).await;
    if let Err(err) = reporter.await {
        warn!(error = %err, "progress reporter stopped");
    }

    match outcome {
        StartOutcome::Finished(outcome) => Ok(outcome),
        StartOutcome::Ignored => Err(ExportError::Config(
            "export already in progress".into(),
        )),
    }
}
