// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ausdruck — Core types, job state machine, events and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod events;
pub mod human_errors;
pub mod job;
pub mod types;

pub use config::ExportConfig;
pub use error::ExportError;
pub use job::{ExportJob, JobState};
pub use types::*;
