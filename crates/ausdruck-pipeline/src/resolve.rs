// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image source resolution.
//
// Rendered documents carry whatever the template put into `src`: absolute
// URLs, site-relative paths, or local file paths that point into the server's
// `Static/` tree. The fetcher only understands absolute http(s) URLs.

use url::Url;

use ausdruck_core::error::{ExportError, Result};

/// Directory marker for local static-asset paths that are served under
/// `<base>/static/`.
const STATIC_MARKER: &str = "Static/";

/// Turns image sources into absolute fetchable URLs.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    base: Option<Url>,
}

impl AssetResolver {
    /// Build a resolver; `base` is the origin relative paths hang off.
    pub fn new(base: Option<&str>) -> Result<Self> {
        let base = base
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(|b| {
                Url::parse(b)
                    .map_err(|e| ExportError::Config(format!("asset_base_url '{b}': {e}")))
            })
            .transpose()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Resolve one image source.
    ///
    /// Errors are per-image `AssetFetch` failures and never fatal.
    pub fn resolve(&self, src: &str) -> Result<String> {
        let fail = |reason: &str| ExportError::AssetFetch {
            src: src.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = src.trim();

        match Url::parse(trimmed) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(url.into()),
                "file" => self.rewrite_static(trimmed).ok_or_else(|| {
                    fail("local file path outside the static tree or no base URL")
                }),
                other => Err(fail(&format!("unsupported scheme '{other}'"))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base
                    .as_ref()
                    .ok_or_else(|| fail("relative path with no base URL configured"))?;
                base.join(trimmed)
                    .map(Into::into)
                    .map_err(|e| fail(&e.to_string()))
            }
            Err(e) => Err(fail(&e.to_string())),
        }
    }

    /// `file:///srv/app/Static/img/x.png` -> `<base>/static/img/x.png`.
    fn rewrite_static(&self, src: &str) -> Option<String> {
        let base = self.base.as_ref()?;
        let normalized = src.replace('\\', "/");
        let at = normalized.find(STATIC_MARKER)?;
        let rel = &normalized[at + STATIC_MARKER.len()..];
        if rel.is_empty() {
            return None;
        }
        Some(format!(
            "{}/static/{}",
            base.as_str().trim_end_matches('/'),
            rel
        ))
    }
}
