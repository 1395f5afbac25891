// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestration.
//
// Drives one export job through Preloading -> Inlining -> Capturing and on to
// Done or Failed. Progress is published as events; the caller never has to
// poll job state. A second trigger while a job runs is ignored.
//
// Download delivery rasterizes the document and saves the bytes. Print
// delivery hands the prepared document to the print surface and never touches
// the rasterizer, which is what makes Print the way out of a failed capture.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{error, info, instrument, warn};

use ausdruck_bridge::{AssetFetcher, FileSaver, PrintHost};
use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::events::{
    ArtifactDigest, ArtifactReceipt, ExportEvent, ExportEventKind, FailureReport, JobOutcome,
};
use ausdruck_core::human_errors::humanize_error;
use ausdruck_core::types::{Delivery, InlineState, JobId, RecordMeta};
use ausdruck_core::{ExportConfig, ExportJob, JobState};
use ausdruck_document::{Rasterizer, RenderedDocument};

use crate::gate::InFlightGate;
use crate::inline::{CrossOriginImageInliner, InlineCache};
use crate::integrity::hash_bytes;
use crate::preload::ImagePreloadCoordinator;
use crate::print_bridge::PrintBridge;

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Platform capabilities the orchestrator drives.
#[derive(Clone)]
pub struct Capabilities {
    pub rasterizer: Arc<dyn Rasterizer>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub saver: Arc<dyn FileSaver>,
    pub print_host: Arc<dyn PrintHost>,
}

/// Result of a `start` call.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A job was already in flight; nothing happened.
    Ignored,
    /// The job ran to a terminal state.
    Finished(JobOutcome),
}

impl StartOutcome {
    pub fn outcome(&self) -> Option<&JobOutcome> {
        match self {
            Self::Ignored => None,
            Self::Finished(outcome) => Some(outcome),
        }
    }
}

/// Runs export jobs for one triggering control.
pub struct ExportOrchestrator {
    config: ExportConfig,
    preload: ImagePreloadCoordinator,
    inliner: CrossOriginImageInliner,
    rasterizer: Arc<dyn Rasterizer>,
    saver: Arc<dyn FileSaver>,
    print_bridge: PrintBridge,
    gate: InFlightGate,
    events: broadcast::Sender<ExportEvent>,
}

impl ExportOrchestrator {
    /// Build an orchestrator; fails only on invalid configuration.
    pub fn new(config: ExportConfig, caps: Capabilities) -> Result<Self> {
        config.validate()?;
        let inliner = CrossOriginImageInliner::from_config(caps.fetcher, &config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            preload: ImagePreloadCoordinator::from_config(&config),
            inliner,
            rasterizer: caps.rasterizer,
            saver: caps.saver,
            print_bridge: PrintBridge::new(caps.print_host, &config),
            gate: InFlightGate::new(),
            events,
            config,
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// `true` while a job is running. Bind the trigger's disabled state here.
    pub fn in_progress(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    pub fn is_in_progress(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Lifecycle events for every job run by this orchestrator.
    pub fn subscribe(&self) -> broadcast::Receiver<ExportEvent> {
        self.events.subscribe()
    }

    /// Direct access to the print path, for printing an artifact that
    /// already exists (a certificate PDF served by the backend).
    pub fn print_bridge(&self) -> &PrintBridge {
        &self.print_bridge
    }

    /// Export `document` as a download.
    pub async fn start(&self, document: &mut RenderedDocument, meta: RecordMeta) -> StartOutcome {
        self.start_with(document, meta, Delivery::Download).await
    }

    /// Export `document` with the given delivery.
    ///
    /// Ignored if a job is already in flight. Otherwise runs to `Done` or
    /// `Failed` and emits exactly one `Finished` event. Dropping the returned
    /// future abandons the job and clears the in-flight flag.
    #[instrument(skip_all, fields(kind = %meta.kind, record = ?meta.record_id, ?delivery))]
    pub async fn start_with(
        &self,
        document: &mut RenderedDocument,
        meta: RecordMeta,
        delivery: Delivery,
    ) -> StartOutcome {
        let Some(guard) = self.gate.try_acquire() else {
            info!("export already in progress, trigger ignored");
            return StartOutcome::Ignored;
        };

        let mut job = ExportJob::new(meta.clone(), delivery);
        info!(job_id = %job.id, "export started");
        self.emit(job.id, ExportEventKind::Started { meta, delivery });

        let outcome = match self.run(&mut job, document).await {
            Ok(receipt) => {
                info!(
                    job_id = %job.id,
                    filename = %receipt.filename,
                    bytes = ?receipt.digest.as_ref().map(|d| d.bytes_len),
                    degraded = receipt.degraded_images,
                    "export done"
                );
                JobOutcome::Done(receipt)
            }
            Err(err) => {
                let failed_in = job.state;
                error!(job_id = %job.id, state = %failed_in, error = %err, "export failed");
                if let Err(transition) = self.transition(&mut job, JobState::Failed) {
                    error!(error = %transition, "could not record failure");
                }
                JobOutcome::Failed(FailureReport {
                    failed_in,
                    error: err.to_string(),
                    human: humanize_error(&err),
                })
            }
        };

        // Release the trigger before announcing the result, so listeners
        // reacting to `Finished` can start the next job.
        drop(guard);
        self.emit(job.id, ExportEventKind::Finished(outcome.clone()));
        StartOutcome::Finished(outcome)
    }

    async fn run(
        &self,
        job: &mut ExportJob,
        document: &mut RenderedDocument,
    ) -> Result<ArtifactReceipt> {
        self.transition(job, JobState::Preloading)?;
        self.preload.wait_for_images(document).await;

        self.transition(job, JobState::Inlining)?;
        let mut cache = InlineCache::new();
        let report = self.inliner.inline_images(document, &mut cache).await;
        for failure in &report.failures {
            let src = match failure {
                ExportError::AssetFetch { src, .. } | ExportError::AssetEncode { src, .. } => {
                    src.clone()
                }
                _ => String::new(),
            };
            self.emit(
                job.id,
                ExportEventKind::AssetWarning {
                    src,
                    message: failure.to_string(),
                },
            );
        }
        tokio::time::sleep(self.config.inline_settle()).await;

        self.transition(job, JobState::Capturing)?;
        if document.has_pending_images() {
            return Err(ExportError::Capture(
                "document still has images loading".into(),
            ));
        }
        let filename = job.meta.artifact_filename(self.rasterizer.extension());
        let (digest, location) = match job.delivery {
            Delivery::Download => {
                let bytes = self.capture(document).await?;
                let mime_type = self.rasterizer.mime_type();
                let location = self.saver.save_file(&filename, &bytes, mime_type)?;
                let digest = ArtifactDigest {
                    bytes_len: bytes.len(),
                    sha256: hash_bytes(&bytes),
                };
                (Some(digest), location)
            }
            Delivery::Print => {
                let printed = self
                    .print_bridge
                    .print_document(document, job.meta.kind.display_title())
                    .await?;
                if !printed.printed() {
                    warn!("print surface closed by the user before printing");
                }
                (None, None)
            }
        };

        let receipt = ArtifactReceipt {
            filename,
            delivery: job.delivery,
            digest,
            location,
            degraded_images: document
                .images()
                .iter()
                .filter(|img| img.has_source() && img.inline_state() == InlineState::External)
                .count(),
        };
        self.transition(job, JobState::Done)?;
        Ok(receipt)
    }

    /// Rasterize with the configured settings, bounded by the capture timeout.
    async fn capture(&self, document: &RenderedDocument) -> Result<Vec<u8>> {
        let limit = self.config.capture_timeout();
        let bytes = tokio::time::timeout(
            limit,
            self.rasterizer.rasterize(document, &self.config.capture),
        )
        .await
        .map_err(|_| ExportError::Capture(format!("timed out after {limit:?}")))?
        .map_err(|err| match err {
            ExportError::Capture(_) => err,
            other => ExportError::Capture(other.to_string()),
        })?;

        if bytes.is_empty() {
            return Err(ExportError::Capture("rasterizer produced no output".into()));
        }
        Ok(bytes)
    }

    fn transition(&self, job: &mut ExportJob, next: JobState) -> Result<()> {
        let from = job.advance(next)?;
        tracing::debug!(job_id = %job.id, %from, to = %next, "job transition");
        self.emit(job.id, ExportEventKind::Transition { from, to: next });
        Ok(())
    }

    fn emit(&self, job_id: JobId, kind: ExportEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(ExportEvent { job_id, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ausdruck_core::human_errors::Recovery;
    use ausdruck_core::types::{DocumentKind, LoadState};
    use ausdruck_document::{ImageElement, Node, data_uri};
    use tokio::time::Instant;

    use crate::testing::{
        BASE, FakeFetcher, FakePrintHost, FakeRasterizer, MemorySaver, SurfaceBehaviour,
        png_bytes,
    };

    struct Harness {
        orchestrator: ExportOrchestrator,
        fetcher: Arc<FakeFetcher>,
        rasterizer: Arc<FakeRasterizer>,
        saver: Arc<MemorySaver>,
        host: Arc<FakePrintHost>,
    }

    fn harness(fetcher: FakeFetcher, rasterizer: FakeRasterizer, surface: SurfaceBehaviour) -> Harness {
        let fetcher = Arc::new(fetcher);
        let rasterizer = Arc::new(rasterizer);
        let saver = Arc::new(MemorySaver::default());
        let host = Arc::new(FakePrintHost::new(surface));
        let config = ExportConfig {
            asset_base_url: Some(BASE.into()),
            ..ExportConfig::default()
        };
        let caps = Capabilities {
            rasterizer: rasterizer.clone(),
            fetcher: fetcher.clone(),
            saver: saver.clone(),
            print_host: host.clone(),
        };
        Harness {
            orchestrator: ExportOrchestrator::new(config, caps).expect("orchestrator"),
            fetcher,
            rasterizer,
            saver,
            host,
        }
    }

    fn application_meta() -> RecordMeta {
        RecordMeta::new(DocumentKind::Application, "42")
    }

    fn drain(rx: &mut broadcast::Receiver<ExportEvent>) -> Vec<ExportEventKind> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event.kind);
        }
        out
    }

    /// A signature that loads after 300 ms and a photo whose host is down.
    fn two_image_document() -> RenderedDocument {
        let (sig, sig_loader) = ImageElement::pending("/static/uploads/sig.png");
        let (photo, photo_loader) = ImageElement::pending("/static/uploads/photo.jpg");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            sig_loader.loaded();
            photo_loader.errored();
        });
        RenderedDocument::new("Job Application Form")
            .with_node(Node::Heading {
                text: "Job Application Form".into(),
            })
            .with_node(Node::Field {
                label: "Name".into(),
                value: "Jane Doe".into(),
            })
            .with_node(Node::Section {
                title: Some("Attachments".into()),
                children: vec![Node::Image(sig), Node::Image(photo)],
            })
    }

    #[tokio::test(start_paused = true)]
    async fn two_image_scenario_downloads_with_one_degraded_image() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(8, 4)),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let mut events = h.orchestrator.subscribe();
        let mut doc = two_image_document();

        let outcome = h.orchestrator.start(&mut doc, application_meta()).await;

        let Some(JobOutcome::Done(receipt)) = outcome.outcome() else {
            panic!("expected Done, got {outcome:?}");
        };
        assert_eq!(receipt.filename, "Job_Application_Form_42.pdf");
        assert_eq!(receipt.degraded_images, 1);
        let digest = receipt.digest.as_ref().expect("digest");
        assert_eq!(digest.sha256, hash_bytes(b"%PDF-1.7 fake"));
        assert_eq!(digest.bytes_len, b"%PDF-1.7 fake".len());
        assert_eq!(h.saver.names(), vec!["Job_Application_Form_42.pdf"]);

        let srcs: Vec<String> = doc.images().iter().map(|i| i.src().to_string()).collect();
        assert!(srcs[0].starts_with("data:image/png;base64,"));
        assert_eq!(srcs[1], "/static/uploads/photo.jpg");

        let snapshot = h.rasterizer.last_snapshot().expect("captured");
        assert_eq!(snapshot.images, 2);
        assert_eq!(snapshot.pending, 0);
        assert_eq!(snapshot.inlined, 1);

        let kinds = drain(&mut events);
        let warnings = kinds
            .iter()
            .filter(|k| matches!(k, ExportEventKind::AssetWarning { src, .. } if src == "/static/uploads/photo.jpg"))
            .count();
        assert_eq!(warnings, 1);
        let finished = kinds
            .iter()
            .filter(|k| matches!(k, ExportEventKind::Finished(_)))
            .count();
        assert_eq!(finished, 1);
        assert!(!h.orchestrator.is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn inlines_only_the_external_image_next_to_a_self_contained_one() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/photo.png", png_bytes(6, 6)),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let embedded = data_uri::encode("image/png", &png_bytes(2, 2));
        let (photo, photo_loader) = ImageElement::pending("/static/uploads/photo.png");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            photo_loader.loaded();
        });
        let mut doc = RenderedDocument::new("Certificate")
            .with_node(Node::Image(ImageElement::loaded(embedded.clone())))
            .with_node(Node::Image(photo));

        let outcome = h
            .orchestrator
            .start(&mut doc, RecordMeta::new(DocumentKind::Certificate, "9"))
            .await;

        let Some(JobOutcome::Done(receipt)) = outcome.outcome() else {
            panic!("expected Done, got {outcome:?}");
        };
        assert!(receipt.digest.as_ref().is_some_and(|d| d.bytes_len > 0));
        assert_eq!(receipt.degraded_images, 0);
        assert_eq!(h.fetcher.calls(), 1);
        assert_eq!(doc.images()[0].src(), embedded);
        assert!(doc.images()[1].src().starts_with("data:image/png;base64,"));
        let snapshot = h.rasterizer.last_snapshot().expect("captured");
        assert_eq!((snapshot.images, snapshot.inlined, snapshot.pending), (2, 2, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn capture_waits_for_loads_and_settle_delays() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(2, 2)),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let mut doc = two_image_document();
        let started = Instant::now();

        h.orchestrator.start(&mut doc, application_meta()).await;

        // 300 ms load, 800 ms preload settle, 300 ms inline settle.
        assert_eq!(started.elapsed(), Duration::from_millis(1_400));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_triggers_run_one_job() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(2, 2)),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let mut first = two_image_document();
        let mut second = two_image_document();

        let (a, b) = tokio::join!(
            h.orchestrator.start(&mut first, application_meta()),
            h.orchestrator.start(&mut second, application_meta()),
        );

        assert!(matches!(a, StartOutcome::Finished(_)));
        assert!(matches!(b, StartOutcome::Ignored));
        assert_eq!(h.rasterizer.calls(), 1);
        assert_eq!(h.saver.names().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_progress_signal_tracks_the_job() {
        let h = harness(FakeFetcher::new(), FakeRasterizer::default(), SurfaceBehaviour::NeverReady);
        let mut in_progress = h.orchestrator.in_progress();
        let mut doc = RenderedDocument::new("Certificate");

        let observer = async {
            in_progress.changed().await.expect("raised");
            let raised = *in_progress.borrow_and_update();
            in_progress.changed().await.expect("lowered");
            (raised, *in_progress.borrow_and_update())
        };
        let (_, (raised, lowered)) = tokio::join!(
            h.orchestrator
                .start(&mut doc, RecordMeta::unsaved(DocumentKind::Certificate)),
            observer,
        );

        assert!(raised);
        assert!(!lowered);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_failure_fails_job_and_recommends_print() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(2, 2)),
            FakeRasterizer::failing(),
            SurfaceBehaviour::NeverReady,
        );
        let mut events = h.orchestrator.subscribe();
        let mut doc = two_image_document();

        let outcome = h.orchestrator.start(&mut doc, application_meta()).await;

        let Some(JobOutcome::Failed(report)) = outcome.outcome() else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert_eq!(report.failed_in, JobState::Capturing);
        assert_eq!(report.human.recovery, Recovery::UsePrint);
        assert!(h.saver.names().is_empty());
        assert!(!h.orchestrator.is_in_progress());

        let transitions: Vec<(JobState, JobState)> = drain(&mut events)
            .into_iter()
            .filter_map(|k| match k {
                ExportEventKind::Transition { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions.last(),
            Some(&(JobState::Capturing, JobState::Failed))
        );

        // A failed job does not block the next trigger.
        let mut retry = RenderedDocument::new("Job Application Form");
        let again = h.orchestrator.start(&mut retry, application_meta()).await;
        assert!(matches!(again, StartOutcome::Finished(_)));
        assert_eq!(h.rasterizer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_export_of_same_document_fetches_nothing_new() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(2, 2)),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let mut doc = two_image_document();

        h.orchestrator.start(&mut doc, application_meta()).await;
        let fetched_once = h.fetcher.calls();
        h.orchestrator.start(&mut doc, application_meta()).await;

        // Only the broken photo is retried; the inlined signature is left alone.
        assert_eq!(h.fetcher.calls(), fetched_once + 1);
        assert!(doc.images()[0].src().starts_with("data:"));
        assert_eq!(doc.images()[0].load_state(), LoadState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn conversions_are_not_shared_between_records() {
        // Two records reference the same relative path with different content.
        let h = harness(
            FakeFetcher::new().with_versions(
                "/static/uploads/sig.png",
                vec![png_bytes(3, 1), png_bytes(5, 2)],
            ),
            FakeRasterizer::default(),
            SurfaceBehaviour::NeverReady,
        );
        let signed = || {
            RenderedDocument::new("Undertaking")
                .with_node(Node::Image(ImageElement::loaded("/static/uploads/sig.png")))
        };
        let mut first = signed();
        let mut second = signed();

        h.orchestrator
            .start(&mut first, RecordMeta::new(DocumentKind::Undertaking, "41"))
            .await;
        h.orchestrator
            .start(&mut second, RecordMeta::new(DocumentKind::Undertaking, "42"))
            .await;

        let size = |doc: &RenderedDocument| {
            let (_, bytes) = data_uri::decode(doc.images()[0].src()).expect("inlined");
            let img = image::load_from_memory(&bytes).expect("png");
            (img.width(), img.height())
        };
        assert_eq!(h.fetcher.calls(), 2);
        assert_eq!(size(&first), (3, 1));
        assert_eq!(size(&second), (5, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_capture_fails_at_the_capture_timeout() {
        let h = harness(FakeFetcher::new(), FakeRasterizer::stalled(), SurfaceBehaviour::NeverReady);
        let mut doc = RenderedDocument::new("Job Application Form");
        let started = Instant::now();

        let outcome = h.orchestrator.start(&mut doc, application_meta()).await;

        let Some(JobOutcome::Failed(report)) = outcome.outcome() else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert_eq!(report.failed_in, JobState::Capturing);
        assert!(report.error.contains("timed out"), "{}", report.error);
        assert_eq!(report.human.recovery, Recovery::UsePrint);
        // 800 ms preload settle, 300 ms inline settle, 60 s capture bound.
        assert_eq!(started.elapsed(), Duration::from_millis(61_100));
        assert!(!h.orchestrator.is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_start_clears_in_flight_flag() {
        let h = harness(FakeFetcher::new(), FakeRasterizer::default(), SurfaceBehaviour::NeverReady);
        let (img, _loader) = ImageElement::pending("/static/uploads/slow.png");
        let mut doc = RenderedDocument::new("Undertaking").with_node(Node::Image(img));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            h.orchestrator.start(&mut doc, RecordMeta::new(DocumentKind::Undertaking, "7")),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(!h.orchestrator.is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn print_delivery_goes_through_the_bridge() {
        let h = harness(
            FakeFetcher::new(),
            FakeRasterizer::default(),
            SurfaceBehaviour::ReadyAfter(Duration::from_millis(100)),
        );
        let mut doc = RenderedDocument::new("Undertaking");

        let outcome = h
            .orchestrator
            .start_with(&mut doc, RecordMeta::new(DocumentKind::Undertaking, "7"), Delivery::Print)
            .await;

        let Some(JobOutcome::Done(receipt)) = outcome.outcome() else {
            panic!("expected Done, got {outcome:?}");
        };
        assert_eq!(receipt.delivery, Delivery::Print);
        assert_eq!(receipt.location, None);
        assert_eq!(receipt.digest, None);
        assert_eq!(h.host.prints(), 1);
        assert_eq!(h.host.documents().len(), 1);
        assert!(h.host.created().is_empty());
        assert_eq!(h.rasterizer.calls(), 0);
        assert!(h.saver.names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn print_recovers_a_document_whose_capture_failed() {
        let h = harness(
            FakeFetcher::new().with_asset("/static/uploads/sig.png", png_bytes(8, 4)),
            FakeRasterizer::failing(),
            SurfaceBehaviour::ReadyAfter(Duration::from_millis(100)),
        );
        let mut doc = two_image_document();

        let download = h.orchestrator.start(&mut doc, application_meta()).await;
        let Some(JobOutcome::Failed(report)) = download.outcome() else {
            panic!("expected Failed, got {download:?}");
        };
        assert_eq!(report.human.recovery, Recovery::UsePrint);

        let print = h
            .orchestrator
            .start_with(&mut doc, application_meta(), Delivery::Print)
            .await;

        let Some(JobOutcome::Done(receipt)) = print.outcome() else {
            panic!("expected Done, got {print:?}");
        };
        assert_eq!(receipt.delivery, Delivery::Print);
        assert_eq!(receipt.degraded_images, 1);
        assert_eq!(h.rasterizer.calls(), 1);
        assert_eq!(h.host.prints(), 1);
        let shown = h.host.documents();
        assert_eq!(shown.len(), 1);
        assert_eq!((shown[0].images, shown[0].inlined, shown[0].pending), (2, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_print_surface_fails_and_recommends_download() {
        let h = harness(FakeFetcher::new(), FakeRasterizer::default(), SurfaceBehaviour::Blocked);
        let mut doc = RenderedDocument::new("Undertaking");

        let outcome = h
            .orchestrator
            .start_with(&mut doc, RecordMeta::new(DocumentKind::Undertaking, "7"), Delivery::Print)
            .await;

        let Some(JobOutcome::Failed(report)) = outcome.outcome() else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert_eq!(report.human.recovery, Recovery::UseDownload);
        assert_eq!(report.failed_in, JobState::Capturing);
        assert_eq!(h.rasterizer.calls(), 0);
        assert!(h.host.documents().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let caps = Capabilities {
            rasterizer: Arc::new(FakeRasterizer::default()),
            fetcher: Arc::new(FakeFetcher::new()),
            saver: Arc::new(MemorySaver::default()),
            print_host: Arc::new(FakePrintHost::new(SurfaceBehaviour::Blocked)),
        };
        let config = ExportConfig {
            fetch_timeout_ms: 0,
            ..ExportConfig::default()
        };
        assert!(matches!(
            ExportOrchestrator::new(config, caps),
            Err(ExportError::Config(_))
        ));
    }
}
