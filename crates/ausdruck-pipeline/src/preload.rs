// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image preload coordination.
//
// Waits until every image in a mounted document has either loaded or failed
// for good, so capture never races a half-painted bitmap. A failed image
// counts as done: the export goes ahead with whatever could be shown.

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use ausdruck_core::ExportConfig;
use ausdruck_core::types::LoadState;
use ausdruck_document::RenderedDocument;
use ausdruck_document::data_uri;

/// Tally of one preload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub total: usize,
    /// Already loaded or errored before the pass started.
    pub already_complete: usize,
    /// `data:` sources, complete without a network round trip.
    pub self_contained: usize,
    /// Images without a source; nothing to wait for.
    pub empty: usize,
    /// Pending images whose load succeeded during the pass.
    pub loaded: usize,
    /// Pending images whose load failed during the pass.
    pub errored: usize,
    /// Pending images that hit the per-image timeout.
    pub timed_out: usize,
    /// Pending images with no loader attached.
    pub unmounted: usize,
}

/// Outcome of waiting on one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waited {
    Settled(LoadState),
    TimedOut,
}

/// Resolves once all images reached a terminal load state, plus a settle
/// delay for layout.
#[derive(Debug, Clone)]
pub struct ImagePreloadCoordinator {
    load_timeout: Duration,
    settle: Duration,
}

impl ImagePreloadCoordinator {
    pub fn new(load_timeout: Duration, settle: Duration) -> Self {
        Self {
            load_timeout,
            settle,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.image_load_timeout(), config.preload_settle())
    }

    /// Wait for every image in `document`. Never fails.
    ///
    /// On return no image is `Pending`: timed-out and unmounted images are
    /// recorded as `Errored`.
    #[instrument(skip_all, fields(title = %document.title))]
    pub async fn wait_for_images(&self, document: &mut RenderedDocument) -> PreloadReport {
        let mut report = PreloadReport::default();
        let mut waits: Vec<(usize, watch::Receiver<LoadState>)> = Vec::new();

        for (index, img) in document.images_mut().into_iter().enumerate() {
            report.total += 1;
            if !img.has_source() {
                report.empty += 1;
                img.settle(LoadState::Errored);
                continue;
            }
            if data_uri::is_self_contained(img.src()) {
                report.self_contained += 1;
                img.settle(LoadState::Loaded);
                continue;
            }
            let state = img.load_state();
            if state.is_terminal() {
                report.already_complete += 1;
                img.settle(state);
                continue;
            }
            match img.load_signal() {
                Some(rx) => waits.push((index, rx)),
                None => {
                    warn!(src = img.src(), "image has no loader attached, treating as failed");
                    report.unmounted += 1;
                    img.settle(LoadState::Errored);
                }
            }
        }

        if !waits.is_empty() {
            debug!(pending = waits.len(), "waiting for image loads");
            let limit = self.load_timeout;
            let results = join_all(
                waits
                    .into_iter()
                    .map(|(index, rx)| async move { (index, await_terminal(rx, limit).await) }),
            )
            .await;

            let mut images = document.images_mut();
            for (index, waited) in results {
                let Some(img) = images.get_mut(index) else {
                    continue;
                };
                match waited {
                    Waited::Settled(LoadState::Loaded) => {
                        report.loaded += 1;
                        img.settle(LoadState::Loaded);
                    }
                    Waited::Settled(_) => {
                        report.errored += 1;
                        img.settle(LoadState::Errored);
                    }
                    Waited::TimedOut => {
                        warn!(src = img.src(), timeout = ?limit, "image load timed out");
                        report.timed_out += 1;
                        img.settle(LoadState::Errored);
                    }
                }
            }
        }

        tokio::time::sleep(self.settle).await;
        info!(?report, "images settled");
        report
    }
}

async fn await_terminal(mut rx: watch::Receiver<LoadState>, limit: Duration) -> Waited {
    match tokio::time::timeout(limit, rx.wait_for(|state| state.is_terminal())).await {
        Ok(Ok(state)) => Waited::Settled(*state),
        // Loader went away without a terminal value.
        Ok(Err(_)) => Waited::Settled(LoadState::Errored),
        Err(_) => Waited::TimedOut,
    }
}
