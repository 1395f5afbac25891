// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ausdruck-document — The rendered document the export pipeline works on.
//
// Provides the document tree with its embedded image references, the
// self-contained (`data:` URI) encoding used by the inliner, an offscreen
// canvas for bitmap re-encoding, and the rasterization capability with its
// printpdf-backed implementation.

pub mod capture;
pub mod data_uri;
pub mod image;
pub mod model;
pub mod pdf;

pub use capture::Rasterizer;
pub use self::image::canvas::OffscreenCanvas;
pub use model::{ImageElement, LoadNotifier, Node, RenderedDocument};
pub use pdf::rasterizer::PdfRasterizer;
