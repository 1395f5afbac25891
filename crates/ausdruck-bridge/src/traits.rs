// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the capabilities the export
// pipeline needs from its host.

use async_trait::async_trait;
use tokio::sync::oneshot;

use ausdruck_core::error::Result;
use ausdruck_document::RenderedDocument;

/// Fetch embedded image assets.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Load `url` with a fresh, credential-less request and return its bytes.
    ///
    /// Failures must be reported as `ExportError::AssetFetch`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Save-as-file action.
pub trait FileSaver: Send + Sync {
    /// Persist `bytes` under `filename`.
    ///
    /// Returns where the file ended up, if the platform can tell.
    fn save_file(&self, filename: &str, bytes: &[u8], mime_type: &str) -> Result<Option<String>>;
}

/// Temporary reference through which a print surface reads its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: u64,
    pub url: String,
}

/// Opens print surfaces.
pub trait PrintHost: Send + Sync {
    /// Create a temporary reference to `content`. Must be released with
    /// [`PrintHost::revoke_object_ref`].
    fn create_object_ref(&self, content: &[u8], mime_type: &str) -> Result<ObjectRef>;

    /// Release a reference created by [`PrintHost::create_object_ref`].
    fn revoke_object_ref(&self, object: &ObjectRef);

    /// Open a dedicated surface showing `object`.
    ///
    /// Returns `ExportError::PrintSurfaceBlocked` when the host refuses to
    /// open a new surface.
    fn open_surface(&self, object: &ObjectRef, title: &str) -> Result<Box<dyn PrintSurface>>;

    /// Open a dedicated surface that renders `document` itself.
    ///
    /// No artifact is involved, so this works when capture does not. Same
    /// refusal semantics as [`PrintHost::open_surface`].
    fn open_document_surface(
        &self,
        document: &RenderedDocument,
        title: &str,
    ) -> Result<Box<dyn PrintSurface>>;
}

/// A surface (window, frame, dialog) showing content that can be printed.
pub trait PrintSurface: Send {
    /// One-shot signal fired once the content has finished loading.
    ///
    /// Returns `None` if the signal was already taken or the surface has none.
    fn take_ready_signal(&mut self) -> Option<oneshot::Receiver<()>>;

    /// Whether the user already closed the surface.
    fn is_closed(&self) -> bool;

    /// Invoke the native print action.
    fn print(&self) -> Result<()>;

    /// Close the surface.
    fn close(&mut self);
}
