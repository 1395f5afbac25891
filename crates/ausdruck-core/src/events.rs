// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events emitted by the export pipeline. The presentation layer subscribes to
// these and re-renders; the pipeline never touches UI state directly.

use crate::human_errors::HumanError;
use crate::job::JobState;
use crate::types::{Delivery, JobId, RecordMeta};

/// One event on the pipeline's broadcast channel.
#[derive(Debug, Clone)]
pub struct ExportEvent {
    pub job_id: JobId,
    pub kind: ExportEventKind,
}

#[derive(Debug, Clone)]
pub enum ExportEventKind {
    /// A job was accepted by the single-flight gate.
    Started { meta: RecordMeta, delivery: Delivery },
    /// The job moved between lifecycle states.
    Transition { from: JobState, to: JobState },
    /// A single image could not be inlined; the job continues.
    AssetWarning { src: String, message: String },
    /// Terminal event, emitted exactly once per job.
    Finished(JobOutcome),
}

/// Terminal result of an export job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Done(ArtifactReceipt),
    Failed(FailureReport),
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn state(&self) -> JobState {
        match self {
            Self::Done(_) => JobState::Done,
            Self::Failed(_) => JobState::Failed,
        }
    }
}

/// What was delivered for a successful job.
#[derive(Debug, Clone)]
pub struct ArtifactReceipt {
    pub filename: String,
    pub delivery: Delivery,
    /// Fingerprint of the saved file. `None` when the document was printed
    /// straight from its print surface and no file exists.
    pub digest: Option<ArtifactDigest>,
    /// Where the artifact ended up, if the delivery capability reports it.
    pub location: Option<String>,
    /// Number of images that stayed external after inlining.
    pub degraded_images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDigest {
    pub bytes_len: usize,
    /// SHA-256 of the delivered bytes, hex encoded.
    pub sha256: String,
}

/// Why a job failed, ready for display.
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// State the job was in when the error happened.
    pub failed_in: JobState,
    /// Technical error text for logs.
    pub error: String,
    pub human: HumanError,
}
