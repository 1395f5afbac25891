// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterizer — flows a rendered document top to bottom across pages.
//
// Layout accumulates `Op`s for the current page and cuts a new `PdfPage`
// whenever the next block would cross the bottom margin. Images are only
// painted when self-contained; pixels of an external source cannot be read
// back, so it gets a caption instead.
//
// Rendering is CPU bound (JPEG re-encoding of every image) and runs on the
// blocking pool, so callers can bound it with a timer.

use async_trait::async_trait;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use ausdruck_core::error::{ExportError, Result};
use ausdruck_core::types::{CaptureSettings, InlineState};

use crate::capture::Rasterizer;
use crate::data_uri;
use crate::image::canvas::OffscreenCanvas;
use crate::model::{ImageElement, Node, RenderedDocument};

/// CSS reference pixel in points.
const PT_PER_CSS_PX: f32 = 0.75;
/// CSS reference resolution.
const CSS_DPI: f32 = 96.0;
/// Vertical gap after block elements.
const BLOCK_GAP_PT: f32 = 6.0;
/// Indentation per section nesting level.
const SECTION_INDENT_PT: f32 = 12.0;
/// Nesting never indents past this share of the usable width.
const MAX_INDENT_SHARE: f32 = 0.5;

const HEADING_SIZE_PT: f32 = 16.0;
const SECTION_TITLE_SIZE_PT: f32 = 13.0;
const BODY_SIZE_PT: f32 = 11.0;
const CAPTION_SIZE_PT: f32 = 9.0;

/// Captures rendered documents as PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfRasterizer;

impl PdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Render `document` into PDF bytes.
    #[instrument(skip_all, fields(title = %document.title, nodes = document.nodes.len()))]
    pub fn render(&self, document: &RenderedDocument, settings: &CaptureSettings) -> Result<Vec<u8>> {
        let (page_w_mm, page_h_mm) = settings.page_dimensions_mm();
        if page_w_mm <= settings.margins.left_mm + settings.margins.right_mm
            || page_h_mm <= settings.margins.top_mm + settings.margins.bottom_mm
        {
            return Err(ExportError::Capture(format!(
                "margins leave no printable area on a {page_w_mm}x{page_h_mm}mm page"
            )));
        }

        info!(
            paper = ?settings.paper_size,
            orientation = ?settings.orientation,
            "capturing document as PDF"
        );

        let mut doc = PdfDocument::new(&document.title);
        let mut layout = PageLayout::new(settings);
        for node in &document.nodes {
            layout.place_node(&mut doc, node, 0, settings)?;
        }
        let pages = layout.finish();

        debug!(pages = pages.len(), "layout complete");
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if output.is_empty() {
            return Err(ExportError::Capture("PDF serialisation produced no bytes".into()));
        }
        Ok(output)
    }
}

#[async_trait]
impl Rasterizer for PdfRasterizer {
    async fn rasterize(
        &self,
        document: &RenderedDocument,
        settings: &CaptureSettings,
    ) -> Result<Vec<u8>> {
        let rasterizer = self.clone();
        let document = document.clone();
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || rasterizer.render(&document, &settings))
            .await
            .map_err(|err| ExportError::Capture(format!("render task failed: {err}")))?
    }
}

// -- Layout -------------------------------------------------------------------

/// Top-to-bottom flow layout with automatic page breaks.
struct PageLayout {
    page_w: Mm,
    page_h: Mm,
    left_pt: f32,
    top_pt: f32,
    bottom_pt: f32,
    usable_w_pt: f32,
    cursor_pt: f32,
    ops: Vec<Op>,
    pages: Vec<PdfPage>,
}

impl PageLayout {
    fn new(settings: &CaptureSettings) -> Self {
        let (w_mm, h_mm) = settings.page_dimensions_mm();
        let page_h_pt = Mm(h_mm).into_pt().0;
        let left_pt = Mm(settings.margins.left_mm).into_pt().0;
        let right_pt = Mm(settings.margins.right_mm).into_pt().0;
        let top_pt = page_h_pt - Mm(settings.margins.top_mm).into_pt().0;
        let bottom_pt = Mm(settings.margins.bottom_mm).into_pt().0;
        Self {
            page_w: Mm(w_mm),
            page_h: Mm(h_mm),
            left_pt,
            top_pt,
            bottom_pt,
            usable_w_pt: Mm(w_mm).into_pt().0 - left_pt - right_pt,
            cursor_pt: top_pt,
            ops: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn usable_h_pt(&self) -> f32 {
        self.top_pt - self.bottom_pt
    }

    /// Break the page if `height_pt` does not fit below the cursor.
    fn reserve(&mut self, height_pt: f32) {
        let at_top = (self.cursor_pt - self.top_pt).abs() < f32::EPSILON;
        if !at_top && self.cursor_pt - height_pt < self.bottom_pt {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(PdfPage::new(self.page_w, self.page_h, ops));
        self.cursor_pt = self.top_pt;
    }

    fn finish(mut self) -> Vec<PdfPage> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }

    fn place_node(
        &mut self,
        doc: &mut PdfDocument,
        node: &Node,
        depth: usize,
        settings: &CaptureSettings,
    ) -> Result<()> {
        let indent = (depth as f32 * SECTION_INDENT_PT).min(self.usable_w_pt * MAX_INDENT_SHARE);
        match node {
            Node::Heading { text } => {
                self.write_wrapped(text, BuiltinFont::HelveticaBold, HEADING_SIZE_PT, indent);
                self.cursor_pt -= BLOCK_GAP_PT;
            }
            Node::Paragraph { text } => {
                self.write_wrapped(text, BuiltinFont::Helvetica, BODY_SIZE_PT, indent);
                self.cursor_pt -= BLOCK_GAP_PT;
            }
            Node::Field { label, value } => {
                let line = format!("{label}: {value}");
                self.write_wrapped(&line, BuiltinFont::Helvetica, BODY_SIZE_PT, indent);
            }
            Node::Section { title, children } => {
                if let Some(title) = title {
                    self.write_wrapped(
                        title,
                        BuiltinFont::HelveticaBold,
                        SECTION_TITLE_SIZE_PT,
                        indent,
                    );
                }
                for child in children {
                    self.place_node(doc, child, depth + 1, settings)?;
                }
                self.cursor_pt -= BLOCK_GAP_PT;
            }
            Node::Image(img) => self.place_image(doc, img, indent, settings)?,
        }
        Ok(())
    }

    fn write_wrapped(&mut self, text: &str, font: BuiltinFont, size_pt: f32, indent_pt: f32) {
        let line_height = size_pt * 1.3;
        // Average Helvetica glyph width is roughly half the font size.
        let avg_char_pt = 0.5 * size_pt;
        let max_chars = (((self.usable_w_pt - indent_pt) / avg_char_pt) as usize).max(1);

        for line in wrap_text(text, max_chars) {
            self.reserve(line_height);
            self.cursor_pt -= line_height;
            if line.is_empty() {
                continue;
            }
            self.ops.push(Op::StartTextSection);
            self.ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(self.left_pt + indent_pt),
                    y: Pt(self.cursor_pt),
                },
            });
            self.ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size_pt),
                font,
            });
            self.ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line)],
                font,
            });
            self.ops.push(Op::EndTextSection);
        }
    }

    fn place_image(
        &mut self,
        doc: &mut PdfDocument,
        img: &ImageElement,
        indent_pt: f32,
        settings: &CaptureSettings,
    ) -> Result<()> {
        if !img.has_source() {
            return Ok(());
        }
        if img.inline_state() == InlineState::External {
            debug!(src = img.src(), "external image cannot be read back, captioning");
            self.write_caption(img, indent_pt);
            return Ok(());
        }

        let canvas = match data_uri::decode(img.src())
            .ok_or_else(|| "malformed data URI".to_string())
            .and_then(|(_, bytes)| {
                OffscreenCanvas::draw("inline image", &bytes).map_err(|e| e.to_string())
            }) {
            Ok(canvas) => canvas,
            Err(reason) => {
                warn!(alt = img.alt(), %reason, "inlined image unreadable, captioning");
                self.write_caption(img, indent_pt);
                return Ok(());
            }
        };

        let (w_pt, h_pt) = image_display_size(
            canvas.natural_size(),
            self.usable_w_pt - indent_pt,
            self.usable_h_pt(),
        );
        let target_w = ((w_pt / 72.0) * CSS_DPI * settings.scale).ceil() as u32;
        let target_h = ((h_pt / 72.0) * CSS_DPI * settings.scale).ceil() as u32;

        let jpeg = canvas
            .fit_within(target_w, target_h)
            .flatten(settings.background)
            .to_jpeg_bytes(settings.jpeg_quality())?;
        let rgb = image::load_from_memory(&jpeg)
            .map_err(|err| ExportError::Capture(format!("re-decoding JPEG failed: {err}")))?
            .to_rgb8();
        let (px_w, px_h) = (rgb.width(), rgb.height());

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        self.reserve(h_pt);
        let dpi = px_w as f32 * 72.0 / w_pt;
        self.ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(self.left_pt + indent_pt)),
                translate_y: Some(Pt(self.cursor_pt - h_pt)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(dpi),
                rotate: None,
            },
        });
        self.cursor_pt -= h_pt + BLOCK_GAP_PT;

        debug!(px_w, px_h, w_pt, h_pt, dpi, "image placed");
        Ok(())
    }

    fn write_caption(&mut self, img: &ImageElement, indent_pt: f32) {
        let caption = if img.alt().is_empty() {
            "[image unavailable]".to_string()
        } else {
            format!("[{} unavailable]", img.alt())
        };
        self.write_wrapped(&caption, BuiltinFont::HelveticaOblique, CAPTION_SIZE_PT, indent_pt);
        self.cursor_pt -= BLOCK_GAP_PT;
    }
}

/// Display size in points for a bitmap of `natural` CSS pixels, shrunk to fit
/// the available box while keeping aspect ratio.
fn image_display_size(natural: (u32, u32), max_w_pt: f32, max_h_pt: f32) -> (f32, f32) {
    let w = natural.0 as f32 * PT_PER_CSS_PX;
    let h = natural.1 as f32 * PT_PER_CSS_PX;
    let scale = (max_w_pt / w).min(max_h_pt / h).min(1.0);
    (w * scale, h * scale)
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken on character boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        current = chunk.iter().collect();
                        current_len = chunk.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}
