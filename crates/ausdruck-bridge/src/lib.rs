// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ausdruck — Platform capability abstractions.
//
// The export pipeline never talks to the network, the filesystem or a print
// dialog directly. It goes through the traits in `traits`, so the pipeline can
// be driven by fakes in tests and by real implementations in the binary.

pub mod desktop;
pub mod stub;
pub mod traits;

use std::sync::Arc;

pub use desktop::{DirectorySaver, HttpAssetFetcher};
pub use stub::StubPrintHost;
pub use traits::{AssetFetcher, FileSaver, ObjectRef, PrintHost, PrintSurface};

/// Print host for the current platform.
///
/// Desktop and CI builds have no print surface to open, so they get the stub,
/// which reports every surface as unavailable.
pub fn platform_print_host() -> Arc<dyn PrintHost> {
    Arc::new(StubPrintHost::new())
}
