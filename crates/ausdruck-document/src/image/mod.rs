// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — offscreen canvas used to re-encode fetched bitmaps.

pub mod canvas;

pub use canvas::OffscreenCanvas;
