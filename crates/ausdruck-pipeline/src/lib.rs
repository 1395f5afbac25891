// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ausdruck Pipeline — turns a rendered document into a downloaded file or a
// print job.
//
// preload -> inline -> capture -> deliver, run at most once at a time per
// triggering control, with every wait bounded by a fixed timeout.

pub mod gate;
pub mod inline;
pub mod integrity;
pub mod orchestrator;
pub mod preload;
pub mod print_bridge;
pub mod resolve;

#[cfg(test)]
mod testing;

pub use gate::{InFlightGate, InFlightGuard};
pub use inline::{CrossOriginImageInliner, InlineCache, InlineReport};
pub use orchestrator::{Capabilities, ExportOrchestrator, StartOutcome};
pub use preload::{ImagePreloadCoordinator, PreloadReport};
pub use print_bridge::{PrintBridge, PrintOutcome, PrintTrigger};
pub use resolve::AssetResolver;
