// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterization capability.
//
// The export pipeline treats the artifact encoder as opaque: it hands over a
// document whose images are safe to read and gets bytes back. Any error
// returned here fails the job.

use async_trait::async_trait;

use ausdruck_core::error::Result;
use ausdruck_core::types::CaptureSettings;

use crate::model::RenderedDocument;

/// Turns a rendered document into an exportable artifact.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// File extension of produced artifacts, without the dot.
    fn extension(&self) -> &'static str {
        "pdf"
    }

    /// MIME type of produced artifacts.
    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    /// Capture `document` with the given page and image settings.
    async fn rasterize(
        &self,
        document: &RenderedDocument,
        settings: &CaptureSettings,
    ) -> Result<Vec<u8>>;
}
