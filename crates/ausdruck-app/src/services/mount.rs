// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mounting a deserialized document.
//
// A document read from disk has no loaders behind its images. Mounting starts
// one background load per external image, the way a page starts fetching its
// `<img>` tags as soon as they are attached. The preload coordinator then
// waits on those loads.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use ausdruck_bridge::AssetFetcher;
use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::types::InlineState;
use ausdruck_document::{OffscreenCanvas, RenderedDocument};
use ausdruck_pipeline::AssetResolver;

/// Start loading every external image in `document`.
///
/// Images with no source or a `data:` source are left as they are. The
/// returned handles finish once each load has reported.
pub fn mount(
    document: &mut RenderedDocument,
    fetcher: Arc<dyn AssetFetcher>,
    resolver: &AssetResolver,
) -> Vec<JoinHandle<()>> {
    let mut loads = Vec::new();
    for img in document.images_mut() {
        if !img.has_source() || img.inline_state() == InlineState::Inlined {
            continue;
        }
        let src = img.src().to_string();
        let notifier = img.attach_loader();
        let url = resolver.resolve(&src);
        let fetcher = Arc::clone(&fetcher);

        loads.push(tokio::spawn(async move {
            let decoded = match url {
                Ok(url) => match fetcher.fetch(&url).await {
                    Ok(bytes) => decode(src.clone(), bytes).await,
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            match decoded {
                Ok(()) => {
                    debug!(src = %src, "image loaded");
                    notifier.loaded();
                }
                Err(err) => {
                    debug!(src = %src, error = %err, "image failed to load");
                    notifier.errored();
                }
            }
        }));
    }
    loads
}

/// Decode on the blocking pool; a large scan would otherwise stall every
/// other load sharing the runtime thread.
async fn decode(src: String, bytes: Vec<u8>) -> Result<()> {
    let task_src = src.clone();
    tokio::task::spawn_blocking(move || OffscreenCanvas::draw(&task_src, &bytes).map(|_| ()))
        .await
        .map_err(|err| ExportError::AssetEncode {
            src,
            reason: format!("decode task failed: {err}"),
        })?
}
