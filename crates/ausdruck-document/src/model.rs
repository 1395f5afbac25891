// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendered document tree.
//
// A `RenderedDocument` is the finished, data-bound output of the template
// renderer for one record. The export pipeline borrows it mutably for one job
// and only ever rewrites image sources; headings, text and field values are
// business data and stay untouched.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use ausdruck_core::types::{InlineState, LoadState};

use crate::data_uri;

/// The finished visual tree for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub title: String,
    pub nodes: Vec<Node>,
}

/// One element of the rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    /// A labelled form value ("Name: Jane Doe").
    Field {
        label: String,
        value: String,
    },
    Section {
        #[serde(default)]
        title: Option<String>,
        children: Vec<Node>,
    },
    Image(ImageElement),
}

impl RenderedDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node, builder style.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// All images in document order, including those nested in sections.
    pub fn images(&self) -> Vec<&ImageElement> {
        let mut out = Vec::new();
        collect_images(&self.nodes, &mut out);
        out
    }

    /// Mutable access to every image, in document order.
    pub fn images_mut(&mut self) -> Vec<&mut ImageElement> {
        let mut out = Vec::new();
        collect_images_mut(&mut self.nodes, &mut out);
        out
    }

    /// Whether any image is still waiting for its load to finish.
    pub fn has_pending_images(&self) -> bool {
        self.images()
            .iter()
            .any(|img| img.load_state() == LoadState::Pending)
    }
}

fn collect_images<'a>(nodes: &'a [Node], out: &mut Vec<&'a ImageElement>) {
    for node in nodes {
        match node {
            Node::Image(img) => out.push(img),
            Node::Section { children, .. } => collect_images(children, out),
            _ => {}
        }
    }
}

fn collect_images_mut<'a>(nodes: &'a mut [Node], out: &mut Vec<&'a mut ImageElement>) {
    for node in nodes {
        match node {
            Node::Image(img) => out.push(img),
            Node::Section { children, .. } => collect_images_mut(children, out),
            _ => {}
        }
    }
}

/// An embedded image (signature, photo, scanned ID).
///
/// Load progress arrives through a `watch` channel fed by whoever mounted the
/// document; `state` caches the last observed value. An image deserialized
/// from disk starts `Pending` with no channel until it is mounted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageElement {
    src: String,
    #[serde(default)]
    alt: String,
    #[serde(skip, default = "pending")]
    state: LoadState,
    #[serde(skip)]
    signal: Option<watch::Receiver<LoadState>>,
}

fn pending() -> LoadState {
    LoadState::Pending
}

impl PartialEq for ImageElement {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.alt == other.alt && self.state == other.state
    }
}

impl ImageElement {
    /// An image whose bytes are already decoded and painted.
    pub fn loaded(src: impl Into<String>) -> Self {
        Self::with_state(src, LoadState::Loaded)
    }

    /// An image that permanently failed to load.
    pub fn errored(src: impl Into<String>) -> Self {
        Self::with_state(src, LoadState::Errored)
    }

    /// A mounted image still loading; the notifier reports completion.
    pub fn pending(src: impl Into<String>) -> (Self, LoadNotifier) {
        let mut img = Self::with_state(src, LoadState::Pending);
        let notifier = img.attach_loader();
        (img, notifier)
    }

    fn with_state(src: impl Into<String>, state: LoadState) -> Self {
        Self {
            src: src.into(),
            alt: String::new(),
            state,
            signal: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn has_source(&self) -> bool {
        !self.src.trim().is_empty()
    }

    /// Current load state, refreshed from the load channel when mounted.
    pub fn load_state(&self) -> LoadState {
        match &self.signal {
            Some(rx) if self.state == LoadState::Pending => *rx.borrow(),
            _ => self.state,
        }
    }

    pub fn inline_state(&self) -> InlineState {
        if data_uri::is_self_contained(&self.src) {
            InlineState::Inlined
        } else {
            InlineState::External
        }
    }

    /// Whether a mounted loader is reporting progress for this image.
    pub fn is_mounted(&self) -> bool {
        self.signal.is_some()
    }

    /// Start a new load cycle and hand back the notifier that ends it.
    ///
    /// Used when mounting a document that was deserialized or re-sourced.
    pub fn attach_loader(&mut self) -> LoadNotifier {
        let (tx, rx) = watch::channel(LoadState::Pending);
        self.state = LoadState::Pending;
        self.signal = Some(rx);
        LoadNotifier { tx }
    }

    /// A receiver to await load completion on, if mounted.
    pub fn load_signal(&self) -> Option<watch::Receiver<LoadState>> {
        self.signal.clone()
    }

    /// Record a terminal state observed by the preload coordinator.
    pub fn settle(&mut self, state: LoadState) {
        self.state = state;
        if state.is_terminal() {
            self.signal = None;
        }
    }

    /// Rewrite the source attribute. The new source counts as already loaded;
    /// the only caller is the inliner, which hands over decoded bytes.
    pub fn replace_src(&mut self, src: String) {
        self.src = src;
        self.state = LoadState::Loaded;
        self.signal = None;
    }
}

/// Completion handle for one image load.
///
/// Dropping the notifier without reporting counts as a failed load, so a
/// loader that disappears never leaves the image pending forever.
#[derive(Debug)]
pub struct LoadNotifier {
    tx: watch::Sender<LoadState>,
}

impl LoadNotifier {
    pub fn loaded(self) {
        self.tx.send_replace(LoadState::Loaded);
    }

    pub fn errored(self) {
        self.tx.send_replace(LoadState::Errored);
    }
}

impl Drop for LoadNotifier {
    fn drop(&mut self) {
        self.tx.send_if_modified(|state| {
            if *state == LoadState::Pending {
                *state = LoadState::Errored;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RenderedDocument {
        RenderedDocument::new("Job Application Form")
            .with_node(Node::Heading {
                text: "Applicant".into(),
            })
            .with_node(Node::Image(ImageElement::loaded("/static/photo.jpg")))
            .with_node(Node::Section {
                title: Some("Signatures".into()),
                children: vec![
                    Node::Field {
                        label: "Name".into(),
                        value: "Jane Doe".into(),
                    },
                    Node::Image(ImageElement::loaded("data:image/png;base64,AAAA")),
                ],
            })
    }

    #[test]
    fn images_include_nested_sections() {
        let doc = sample();
        let srcs: Vec<&str> = doc.images().iter().map(|img| img.src()).collect();
        assert_eq!(srcs, vec!["/static/photo.jpg", "data:image/png;base64,AAAA"]);
    }

    #[test]
    fn inline_state_follows_source() {
        let doc = sample();
        let images = doc.images();
        assert_eq!(images[0].inline_state(), InlineState::External);
        assert_eq!(images[1].inline_state(), InlineState::Inlined);
    }

    #[test]
    fn notifier_resolves_pending_image() {
        let (img, notifier) = ImageElement::pending("/static/sig.png");
        assert_eq!(img.load_state(), LoadState::Pending);
        notifier.loaded();
        assert_eq!(img.load_state(), LoadState::Loaded);
    }

    #[test]
    fn dropped_notifier_counts_as_error() {
        let (img, notifier) = ImageElement::pending("/static/sig.png");
        drop(notifier);
        assert_eq!(img.load_state(), LoadState::Errored);
    }

    #[test]
    fn replace_src_marks_loaded() {
        let (mut img, _notifier) = ImageElement::pending("/static/sig.png");
        img.replace_src("data:image/png;base64,AAAA".into());
        assert_eq!(img.load_state(), LoadState::Loaded);
        assert_eq!(img.inline_state(), InlineState::Inlined);
        assert!(!img.is_mounted());
    }

    #[test]
    fn deserialized_images_start_unmounted_and_pending() {
        let json = r#"{
            "title": "Undertaking",
            "nodes": [
                { "type": "heading", "text": "Undertaking" },
                { "type": "image", "src": "/static/sig.png", "alt": "signature" }
            ]
        }"#;
        let doc: RenderedDocument = serde_json::from_str(json).expect("parse");
        let images = doc.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].alt(), "signature");
        assert_eq!(images[0].load_state(), LoadState::Pending);
        assert!(!images[0].is_mounted());
        assert!(doc.has_pending_images());
    }
}
