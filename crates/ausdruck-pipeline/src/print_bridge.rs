// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print hand-off.
//
// The rendered document is shown in a dedicated surface and printed once the
// surface has loaded it. No artifact is needed, so this path still works when
// capture fails. A finished artifact (a certificate PDF fetched from the
// server) can be printed the same way through a temporary object reference.
// Surfaces do not always report that they loaded, so a fallback timer prints
// anyway. Either path prints at most once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use ausdruck_bridge::{ObjectRef, PrintHost, PrintSurface};
use ausdruck_core::ExportConfig;
use ausdruck_core::error::Result;
use ausdruck_document::RenderedDocument;

/// What caused (or prevented) the print call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintTrigger {
    /// The surface reported its content loaded.
    Ready,
    /// The fallback timer fired first.
    Fallback,
    /// The user closed the surface before anything was printed.
    SurfaceClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    pub trigger: PrintTrigger,
    /// Reference the surface read its content through, when printing bytes.
    pub object: Option<ObjectRef>,
}

impl PrintOutcome {
    pub fn printed(&self) -> bool {
        self.trigger != PrintTrigger::SurfaceClosed
    }
}

/// Presents documents in a print surface and invokes native printing.
#[derive(Clone)]
pub struct PrintBridge {
    host: Arc<dyn PrintHost>,
    ready_settle: Duration,
    fallback: Duration,
    grace: Duration,
    close_after_print: bool,
}

impl PrintBridge {
    pub fn new(host: Arc<dyn PrintHost>, config: &ExportConfig) -> Self {
        Self {
            host,
            ready_settle: config.print_ready_settle(),
            fallback: config.print_fallback(),
            grace: config.object_ref_grace(),
            close_after_print: config.close_surface_after_print,
        }
    }

    /// Open `document` in a print surface and print it.
    ///
    /// Returns once printing was triggered (or skipped because the surface
    /// was closed). The surface is released `grace` later in the background.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn print_document(
        &self,
        document: &RenderedDocument,
        title: &str,
    ) -> Result<PrintOutcome> {
        let surface = self
            .host
            .open_document_surface(document, title)
            .inspect_err(|err| warn!(error = %err, "print surface not opened"))?;
        self.print_on(surface, None).await
    }

    /// Open finished `content` in a print surface and print it.
    ///
    /// The object reference is released `grace` later in the background; if
    /// no surface could be opened it is released before this returns the
    /// error.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn print(&self, content: &[u8], mime_type: &str, title: &str) -> Result<PrintOutcome> {
        let object = self.host.create_object_ref(content, mime_type)?;

        let surface = match self.host.open_surface(&object, title) {
            Ok(surface) => surface,
            Err(err) => {
                self.host.revoke_object_ref(&object);
                warn!(error = %err, "print surface not opened, reference released");
                return Err(err);
            }
        };
        self.print_on(surface, Some(object)).await
    }

    async fn print_on(
        &self,
        mut surface: Box<dyn PrintSurface>,
        object: Option<ObjectRef>,
    ) -> Result<PrintOutcome> {
        let ready = surface.take_ready_signal();
        let mut trigger = self.wait_for_print_moment(ready).await;
        if surface.is_closed() {
            trigger = PrintTrigger::SurfaceClosed;
        }

        let printed = match trigger {
            PrintTrigger::SurfaceClosed => {
                info!("surface closed before printing");
                Ok(())
            }
            PrintTrigger::Ready | PrintTrigger::Fallback => {
                info!(?trigger, "printing");
                surface.print()
            }
        };

        self.schedule_release(object.clone(), surface);
        printed.map(|()| PrintOutcome { trigger, object })
    }

    /// Ready signal plus settle delay, or the fallback deadline, whichever
    /// comes first. Once the ready signal wins the fallback is disarmed.
    async fn wait_for_print_moment(&self, ready: Option<oneshot::Receiver<()>>) -> PrintTrigger {
        let deadline = Instant::now() + self.fallback;
        let Some(ready) = ready else {
            tokio::time::sleep_until(deadline).await;
            return PrintTrigger::Fallback;
        };

        match tokio::time::timeout_at(deadline, ready).await {
            Ok(Ok(())) => {
                debug!(settle = ?self.ready_settle, "surface ready");
                tokio::time::sleep(self.ready_settle).await;
                PrintTrigger::Ready
            }
            // The surface dropped its signal; only the fallback is left.
            Ok(Err(_)) => {
                tokio::time::sleep_until(deadline).await;
                PrintTrigger::Fallback
            }
            Err(_) => PrintTrigger::Fallback,
        }
    }

    fn schedule_release(&self, object: Option<ObjectRef>, mut surface: Box<dyn PrintSurface>) {
        let host = Arc::clone(&self.host);
        let grace = self.grace;
        let close = self.close_after_print;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if close && !surface.is_closed() {
                surface.close();
            }
            if let Some(object) = object {
                host.revoke_object_ref(&object);
                debug!(id = object.id, "object reference released");
            }
        });
    }
}
