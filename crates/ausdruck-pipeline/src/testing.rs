// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory capabilities for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::sync::oneshot;

use ausdruck_bridge::{AssetFetcher, FileSaver, ObjectRef, PrintHost, PrintSurface};
use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::types::{CaptureSettings, InlineState, LoadState};
use ausdruck_document::{Rasterizer, RenderedDocument};

pub const BASE: &str = "http://portal.local";

/// A small opaque PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([20, 40, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture");
    out.into_inner()
}

/// Serves fixed bytes per absolute URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct FakeFetcher {
    assets: HashMap<String, Vec<u8>>,
    sequences: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(format!("{BASE}{path}"), bytes);
        self
    }

    /// Serve `versions` one per request, repeating the last one. Models a
    /// path whose content differs between records.
    pub fn with_versions(self, path: &str, versions: Vec<Vec<u8>>) -> Self {
        self.sequences
            .lock()
            .expect("lock")
            .insert(format!("{BASE}{path}"), versions.into());
        self
    }

    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(format!("{BASE}{path}"), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(versions) = self.sequences.lock().expect("lock").get_mut(url) {
            let next = if versions.len() > 1 {
                versions.pop_front()
            } else {
                versions.front().cloned()
            };
            if let Some(bytes) = next {
                return Ok(bytes);
            }
        }
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| ExportError::AssetFetch {
                src: url.to_string(),
                reason: "HTTP 404 Not Found".into(),
            })
    }
}

/// Image states of a document at the moment it was captured or printed.
#[derive(Debug, Clone, Default)]
pub struct CaptureSnapshot {
    pub images: usize,
    pub inlined: usize,
    pub pending: usize,
}

impl CaptureSnapshot {
    pub fn of(document: &RenderedDocument) -> Self {
        let images = document.images();
        Self {
            images: images.len(),
            inlined: images
                .iter()
                .filter(|img| img.inline_state() == InlineState::Inlined)
                .count(),
            pending: images
                .iter()
                .filter(|img| img.load_state() == LoadState::Pending)
                .count(),
        }
    }
}

/// Produces a fake PDF and records the document state at capture time.
#[derive(Default)]
pub struct FakeRasterizer {
    fail: bool,
    stall: bool,
    pub calls: AtomicUsize,
    pub snapshots: Mutex<Vec<CaptureSnapshot>>,
}

impl FakeRasterizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Never finishes.
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_snapshot(&self) -> Option<CaptureSnapshot> {
        self.snapshots.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn rasterize(
        &self,
        document: &RenderedDocument,
        _settings: &CaptureSettings,
    ) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .expect("lock")
            .push(CaptureSnapshot::of(document));
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(ExportError::Capture("canvas is tainted".into()));
        }
        Ok(b"%PDF-1.7 fake".to_vec())
    }
}

/// Keeps every saved artifact in memory.
#[derive(Default)]
pub struct MemorySaver {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySaver {
    pub fn names(&self) -> Vec<String> {
        self.saved
            .lock()
            .expect("lock")
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl FileSaver for MemorySaver {
    fn save_file(&self, filename: &str, bytes: &[u8], _mime_type: &str) -> Result<Option<String>> {
        self.saved
            .lock()
            .expect("lock")
            .push((filename.to_string(), bytes.to_vec()));
        Ok(Some(format!("memory://{filename}")))
    }
}

/// How a fake surface behaves once opened.
#[derive(Debug, Clone, Copy)]
pub enum SurfaceBehaviour {
    /// The host refuses to open a surface.
    Blocked,
    /// Content finishes loading after the given delay.
    ReadyAfter(Duration),
    /// The ready signal never fires.
    NeverReady,
    /// The user closes the surface right away and it never loads.
    ClosedByUser,
}

/// Print host recording prints, revocations, closes and the documents it
/// was asked to show.
pub struct FakePrintHost {
    behaviour: SurfaceBehaviour,
    next_id: AtomicUsize,
    pub prints: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub created: Mutex<Vec<u64>>,
    pub revoked: Mutex<Vec<u64>>,
    pub documents: Mutex<Vec<CaptureSnapshot>>,
}

impl FakePrintHost {
    pub fn new(behaviour: SurfaceBehaviour) -> Self {
        Self {
            behaviour,
            next_id: AtomicUsize::new(1),
            prints: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            created: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
        }
    }

    pub fn prints(&self) -> usize {
        self.prints.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> Vec<u64> {
        self.revoked.lock().expect("lock").clone()
    }

    pub fn created(&self) -> Vec<u64> {
        self.created.lock().expect("lock").clone()
    }

    pub fn documents(&self) -> Vec<CaptureSnapshot> {
        self.documents.lock().expect("lock").clone()
    }

    fn open(&self) -> Result<Box<dyn PrintSurface>> {
        let (tx, rx) = oneshot::channel();
        let mut surface = FakeSurface {
            ready: Some(rx),
            held_sender: None,
            closed: Arc::new(AtomicBool::new(false)),
            prints: Arc::clone(&self.prints),
            closes: Arc::clone(&self.closes),
        };
        match self.behaviour {
            SurfaceBehaviour::Blocked => return Err(ExportError::PrintSurfaceBlocked),
            SurfaceBehaviour::ReadyAfter(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(());
                });
            }
            SurfaceBehaviour::NeverReady => surface.held_sender = Some(tx),
            SurfaceBehaviour::ClosedByUser => {
                surface.held_sender = Some(tx);
                surface.closed.store(true, Ordering::SeqCst);
            }
        }
        Ok(Box::new(surface))
    }
}

impl PrintHost for FakePrintHost {
    fn create_object_ref(&self, _content: &[u8], _mime_type: &str) -> Result<ObjectRef> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        self.created.lock().expect("lock").push(id);
        Ok(ObjectRef {
            id,
            url: format!("blob:{BASE}/{id}"),
        })
    }

    fn revoke_object_ref(&self, object: &ObjectRef) {
        self.revoked.lock().expect("lock").push(object.id);
    }

    fn open_surface(&self, _object: &ObjectRef, _title: &str) -> Result<Box<dyn PrintSurface>> {
        self.open()
    }

    fn open_document_surface(
        &self,
        document: &RenderedDocument,
        _title: &str,
    ) -> Result<Box<dyn PrintSurface>> {
        let surface = self.open()?;
        self.documents
            .lock()
            .expect("lock")
            .push(CaptureSnapshot::of(document));
        Ok(surface)
    }
}

struct FakeSurface {
    ready: Option<oneshot::Receiver<()>>,
    held_sender: Option<oneshot::Sender<()>>,
    closed: Arc<AtomicBool>,
    prints: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl PrintSurface for FakeSurface {
    fn take_ready_signal(&mut self) -> Option<oneshot::Receiver<()>> {
        self.ready.take()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn print(&self) -> Result<()> {
        self.prints.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.held_sender = None;
        self.closed.store(true, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
