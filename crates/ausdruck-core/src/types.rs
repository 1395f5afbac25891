// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Ausdruck export pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of document the portal renders and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Job application form.
    Application,
    /// Candidate undertaking form.
    Undertaking,
    /// Issued certificate.
    Certificate,
}

impl DocumentKind {
    /// Fixed filename stem used for exported artifacts of this kind.
    pub fn filename_stem(&self) -> &'static str {
        match self {
            Self::Application => "Job_Application_Form",
            Self::Undertaking => "Undertaking_Form",
            Self::Certificate => "Certificate",
        }
    }

    /// Title shown on print surfaces.
    pub fn display_title(&self) -> &'static str {
        match self {
            Self::Application => "Job Application Form",
            Self::Undertaking => "Undertaking Form",
            Self::Certificate => "Certificate",
        }
    }

    /// Lowercase keyword, as accepted by [`std::str::FromStr`].
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Undertaking => "undertaking",
            Self::Certificate => "certificate",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" => Ok(Self::Application),
            "undertaking" => Ok(Self::Undertaking),
            "certificate" => Ok(Self::Certificate),
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

/// Record identity handed to the pipeline by the calling screen.
///
/// Only used to build the artifact filename; the pipeline never looks at the
/// record's business data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub kind: DocumentKind,
    pub record_id: Option<String>,
}

/// Placeholder used when a record has no identifier yet.
const MISSING_RECORD_ID: &str = "form";

impl RecordMeta {
    pub fn new(kind: DocumentKind, record_id: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: Some(record_id.into()),
        }
    }

    /// Metadata for a record that has not been assigned an id.
    pub fn unsaved(kind: DocumentKind) -> Self {
        Self {
            kind,
            record_id: None,
        }
    }

    /// Deterministic artifact filename: `<Stem>_<RecordId>.<ext>`.
    ///
    /// Characters outside `[A-Za-z0-9_-]` in the record id are replaced with
    /// `_` so the id can never escape the download directory.
    pub fn artifact_filename(&self, extension: &str) -> String {
        let id = self
            .record_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(sanitize_component)
            .unwrap_or_else(|| MISSING_RECORD_ID.to_string());
        format!("{}_{}.{}", self.kind.filename_stem(), id, extension)
    }
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top_mm: f32,
    pub right_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
}

impl Margins {
    /// Same margin on every edge, given in inches.
    pub fn uniform_inches(inches: f32) -> Self {
        let mm = inches * 25.4;
        Self {
            top_mm: mm,
            right_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
        }
    }
}

/// Settings handed to the rasterization capability for one capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    pub margins: Margins,
    /// Lossy compression quality for embedded images, in `(0, 1]`.
    pub image_quality: f32,
    /// Pixel-density multiplier applied when sizing bitmaps.
    pub scale: f32,
    /// Page background as RGB.
    pub background: [u8; 3],
}

impl CaptureSettings {
    /// Page size in millimetres after applying orientation.
    pub fn page_dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.paper_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w as f32, h as f32),
            Orientation::Landscape => (h as f32, w as f32),
        }
    }

    /// Image quality as a JPEG encoder percentage (1-100).
    pub fn jpeg_quality(&self) -> u8 {
        (self.image_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::uniform_inches(0.5),
            image_quality: 0.98,
            scale: 2.0,
            background: [0xff, 0xff, 0xff],
        }
    }
}

/// How a finished artifact reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// Save-as-file.
    Download,
    /// Hand the artifact to a print surface.
    Print,
}

/// Loading state of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    Pending,
    Loaded,
    Errored,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Whether an image source still points at an external resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineState {
    External,
    Inlined,
}
