// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Ausdruck.

use thiserror::Error;

use crate::job::JobState;

/// Top-level error type for all Ausdruck operations.
#[derive(Debug, Error)]
pub enum ExportError {
    // -- Per-asset errors (absorbed by the inliner) --
    #[error("failed to fetch image '{src}': {reason}")]
    AssetFetch { src: String, reason: String },

    #[error("failed to encode image '{src}': {reason}")]
    AssetEncode { src: String, reason: String },

    // -- Job-level errors --
    #[error("document capture failed: {0}")]
    Capture(String),

    #[error("print surface could not be opened")]
    PrintSurfaceBlocked,

    #[error("print action failed: {0}")]
    Print(String),

    #[error("artifact delivery failed: {0}")]
    Delivery(String),

    #[error("invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobState, to: JobState },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl ExportError {
    /// Whether this error only affects a single embedded asset.
    ///
    /// Per-asset errors degrade image fidelity; they never fail a job.
    pub fn is_per_asset(&self) -> bool {
        matches!(self, Self::AssetFetch { .. } | Self::AssetEncode { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ExportError>;
