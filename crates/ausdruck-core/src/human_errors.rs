// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing error messages for toasts and alerts.
//
// Every job-level error names the alternate output path as the way out:
// a failed download points at Print, a blocked print surface points at
// Download.

use crate::error::ExportError;

/// How the UI should present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Output was produced with reduced fidelity (e.g. a missing photo).
    Degraded,
    /// The user must do something (allow pop-ups, free disk space).
    ActionRequired,
    /// The job failed; retrying the same path is unlikely to help.
    Permanent,
}

/// Which output path the user should try next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    UsePrint,
    UseDownload,
    None,
}

/// A plain-language error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (toast title / alert heading).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub recovery: Recovery,
    pub severity: Severity,
}

/// Convert an `ExportError` into a message the UI can show as-is.
pub fn humanize_error(err: &ExportError) -> HumanError {
    match err {
        ExportError::AssetFetch { .. } | ExportError::AssetEncode { .. } => HumanError {
            message: "Some images could not be included.".into(),
            suggestion: "The document was exported, but one or more photos or signatures may be missing. Check the original uploads.".into(),
            recovery: Recovery::None,
            severity: Severity::Degraded,
        },

        ExportError::Capture(_) => HumanError {
            message: "PDF download failed.".into(),
            suggestion: "Please use the Print button instead.".into(),
            recovery: Recovery::UsePrint,
            severity: Severity::Permanent,
        },

        ExportError::Delivery(_) => HumanError {
            message: "The PDF could not be saved.".into(),
            suggestion: "Check that there is free space in your downloads folder, or use the Print button instead.".into(),
            recovery: Recovery::UsePrint,
            severity: Severity::ActionRequired,
        },

        ExportError::PrintSurfaceBlocked => HumanError {
            message: "Popup blocked.".into(),
            suggestion: "Please allow popups and try again, or use the download button.".into(),
            recovery: Recovery::UseDownload,
            severity: Severity::ActionRequired,
        },

        ExportError::Print(_) => HumanError {
            message: "Printing could not be started.".into(),
            suggestion: "Please try downloading the document instead.".into(),
            recovery: Recovery::UseDownload,
            severity: Severity::Permanent,
        },

        ExportError::PlatformUnavailable => HumanError {
            message: "This action isn't available on this device.".into(),
            suggestion: "Use the download button instead.".into(),
            recovery: Recovery::UseDownload,
            severity: Severity::Permanent,
        },

        ExportError::InvalidTransition { .. } => HumanError {
            message: "The export got into an unexpected state.".into(),
            suggestion: "Close the preview and try again.".into(),
            recovery: Recovery::None,
            severity: Severity::Permanent,
        },

        ExportError::Config(detail) => HumanError {
            message: "Export settings are invalid.".into(),
            suggestion: format!("Fix the export configuration and try again. ({detail})"),
            recovery: Recovery::None,
            severity: Severity::ActionRequired,
        },

        ExportError::Io(_) | ExportError::Serialization(_) => HumanError {
            message: "Something went wrong while exporting.".into(),
            suggestion: "Please try again, or use the Print button instead.".into(),
            recovery: Recovery::UsePrint,
            severity: Severity::Permanent,
        },
    }
}
