// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export job lifecycle.
//
// A job moves Idle -> Preloading -> Inlining -> Capturing and ends in exactly
// one of Done or Failed. Failed is reachable from every non-terminal state;
// nothing leaves a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::types::{Delivery, JobId, RecordMeta};

/// Lifecycle states of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Created, not yet started.
    Idle,
    /// Waiting for embedded images to finish loading.
    Preloading,
    /// Rewriting external images into self-contained sources.
    Inlining,
    /// Capturing the document (as a file or in a print surface) and
    /// delivering it.
    Capturing,
    /// Artifact delivered.
    Done,
    /// Job aborted; see the failure report.
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `self -> next` is a legal edge.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Idle, Preloading)
            | (Preloading, Inlining)
            | (Inlining, Capturing)
            | (Capturing, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preloading => "preloading",
            Self::Inlining => "inlining",
            Self::Capturing => "capturing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One user-initiated request to produce an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: JobId,
    pub meta: RecordMeta,
    pub delivery: Delivery,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportJob {
    pub fn new(meta: RecordMeta, delivery: Delivery) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            meta,
            delivery,
            state: JobState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, returning the state that was left.
    pub fn advance(&mut self, next: JobState) -> Result<JobState> {
        if !self.state.can_transition_to(next) {
            return Err(ExportError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        self.updated_at = Utc::now();
        Ok(previous)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }
}
