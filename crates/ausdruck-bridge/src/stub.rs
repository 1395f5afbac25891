// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub print host for desktop/CI builds where no print surface exists.
//
// Object references are tracked so leaks show up in logs, but every attempt
// to open a surface returns `PlatformUnavailable`.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use ausdruck_core::error::{ExportError, Result};

use ausdruck_document::RenderedDocument;

use crate::traits::{ObjectRef, PrintHost, PrintSurface};

/// Print host that never opens a surface.
#[derive(Debug, Default)]
pub struct StubPrintHost {
    next_id: AtomicU64,
    live: Mutex<HashSet<u64>>,
}

impl StubPrintHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of object references created and not yet revoked.
    pub fn live_refs(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

impl PrintHost for StubPrintHost {
    fn create_object_ref(&self, content: &[u8], mime_type: &str) -> Result<ObjectRef> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut live) = self.live.lock() {
            live.insert(id);
        }
        tracing::debug!(id, len = content.len(), mime_type, "stub object reference created");
        Ok(ObjectRef {
            id,
            url: format!("memory:{id}"),
        })
    }

    fn revoke_object_ref(&self, object: &ObjectRef) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&object.id);
        }
    }

    fn open_surface(&self, _object: &ObjectRef, _title: &str) -> Result<Box<dyn PrintSurface>> {
        tracing::warn!("PrintHost::open_surface called on stub host");
        Err(ExportError::PlatformUnavailable)
    }

    fn open_document_surface(
        &self,
        document: &RenderedDocument,
        _title: &str,
    ) -> Result<Box<dyn PrintSurface>> {
        tracing::warn!(title = %document.title, "PrintHost::open_document_surface called on stub host");
        Err(ExportError::PlatformUnavailable)
    }
}
