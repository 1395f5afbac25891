// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default download location when neither the config nor the command line
// names one.

use std::path::PathBuf;

/// `$XDG_DATA_HOME/ausdruck/exports`, falling back to
/// `~/.local/share/ausdruck/exports`.
pub fn default_download_dir() -> PathBuf {
    data_home().join("ausdruck").join("exports")
}

fn data_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
