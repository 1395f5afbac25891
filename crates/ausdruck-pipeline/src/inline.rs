// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-origin image inlining.
//
// Capture reads pixels back from every image it paints. Pixels of an image
// served from another origin cannot be read, so before capture each external
// image is re-fetched anonymously, redrawn on an offscreen canvas at its
// natural size and swapped for a lossless `data:image/png;base64,...` source.
// An image that cannot be converted keeps its original source and only costs
// fidelity in the artifact.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use ausdruck_bridge::AssetFetcher;
use ausdruck_core::ExportConfig;
use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::types::InlineState;
use ausdruck_document::{OffscreenCanvas, RenderedDocument};

use crate::resolve::AssetResolver;

/// Conversions already done during one export job, keyed by original source.
///
/// Entries are only ever added. A cache lives as long as its job; there is
/// no process-wide instance.
#[derive(Debug, Default)]
pub struct InlineCache {
    entries: HashMap<String, String>,
}

impl InlineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, src: &str) -> Option<&str> {
        self.entries.get(src).map(String::as_str)
    }

    /// Record a conversion. An existing entry is kept.
    pub fn insert(&mut self, src: String, data_uri: String) {
        if let Entry::Vacant(slot) = self.entries.entry(src) {
            slot.insert(data_uri);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tally of one inlining pass.
#[derive(Debug, Default)]
pub struct InlineReport {
    /// Images whose source was rewritten.
    pub inlined: usize,
    /// Of those, images served from an earlier conversion of the same source.
    pub reused: usize,
    /// Distinct sources fetched during this pass.
    pub fetched: usize,
    /// Images already carrying a `data:` source.
    pub skipped_self_contained: usize,
    /// Images with no source at all.
    pub skipped_empty: usize,
    /// One entry per source that could not be converted.
    pub failures: Vec<ExportError>,
    /// Images left external because their source failed.
    pub left_external: usize,
}

/// Rewrites external image sources as self-contained PNG data URIs.
pub struct CrossOriginImageInliner {
    fetcher: Arc<dyn AssetFetcher>,
    resolver: AssetResolver,
    fetch_timeout: Duration,
}

impl CrossOriginImageInliner {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        resolver: AssetResolver,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            fetch_timeout,
        }
    }

    pub fn from_config(fetcher: Arc<dyn AssetFetcher>, config: &ExportConfig) -> Result<Self> {
        let resolver = AssetResolver::new(config.asset_base_url.as_deref())?;
        Ok(Self::new(fetcher, resolver, config.fetch_timeout()))
    }

    /// Inline every external image in `document`.
    ///
    /// Never fails as a whole; per-image failures are logged, returned in the
    /// report, and leave the image untouched. Running the pass again on the
    /// same document fetches nothing.
    #[instrument(skip_all, fields(title = %document.title))]
    pub async fn inline_images(
        &self,
        document: &mut RenderedDocument,
        cache: &mut InlineCache,
    ) -> InlineReport {
        let mut report = InlineReport::default();

        // Distinct sources that still need a conversion, in document order.
        let mut wanted: Vec<String> = Vec::new();
        for img in document.images() {
            if !img.has_source() {
                report.skipped_empty += 1;
            } else if img.inline_state() == InlineState::Inlined {
                report.skipped_self_contained += 1;
            } else if cache.get(img.src()).is_none() && !wanted.iter().any(|s| s == img.src()) {
                wanted.push(img.src().to_string());
            }
        }

        report.fetched = wanted.len();
        if !wanted.is_empty() {
            debug!(sources = wanted.len(), "converting external images");
        }
        let results = join_all(wanted.into_iter().map(|src| self.convert(src))).await;

        let mut fresh: Vec<String> = Vec::new();
        for (src, result) in results {
            match result {
                Ok(data_uri) => {
                    cache.insert(src.clone(), data_uri);
                    fresh.push(src);
                }
                Err(err) => {
                    warn!(src = %src, error = %err, "image left external");
                    report.failures.push(err);
                }
            }
        }

        for img in document.images_mut() {
            if !img.has_source() || img.inline_state() == InlineState::Inlined {
                continue;
            }
            let original = img.src().to_string();
            match cache.get(&original) {
                Some(data_uri) => {
                    img.replace_src(data_uri.to_string());
                    report.inlined += 1;
                    // The first image of a freshly converted source is the
                    // one that paid for the fetch.
                    if let Some(pos) = fresh.iter().position(|s| *s == original) {
                        fresh.swap_remove(pos);
                    } else {
                        report.reused += 1;
                    }
                }
                None => report.left_external += 1,
            }
        }

        info!(
            inlined = report.inlined,
            reused = report.reused,
            failed = report.failures.len(),
            "inlining pass finished"
        );
        report
    }

    /// Fetch, decode and re-encode one source.
    async fn convert(&self, src: String) -> (String, Result<String>) {
        let result = self.convert_inner(&src).await;
        (src, result)
    }

    async fn convert_inner(&self, src: &str) -> Result<String> {
        let url = self.resolver.resolve(src)?;
        let bytes = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&url))
            .await
            .map_err(|_| ExportError::AssetFetch {
                src: src.to_string(),
                reason: format!("timed out after {:?}", self.fetch_timeout),
            })?
            .map_err(|err| match err {
                ExportError::AssetFetch { reason, .. } => ExportError::AssetFetch {
                    src: src.to_string(),
                    reason,
                },
                other => ExportError::AssetFetch {
                    src: src.to_string(),
                    reason: other.to_string(),
                },
            })?;

        // Decoding and PNG encoding are CPU bound; keep them off the runtime
        // so conversions overlap.
        let owned_src = src.to_string();
        tokio::task::spawn_blocking(move || {
            OffscreenCanvas::draw(&owned_src, &bytes)?.to_png_data_uri()
        })
        .await
        .map_err(|err| ExportError::AssetEncode {
            src: src.to_string(),
            reason: format!("conversion task failed: {err}"),
        })?
        .map_err(|err| match err {
            ExportError::AssetEncode { reason, .. } => ExportError::AssetEncode {
                src: src.to_string(),
                reason,
            },
            other => other,
        })
    }
}
