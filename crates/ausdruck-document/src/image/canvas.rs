// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offscreen canvas — a decoded bitmap at its natural pixel size that can be
// exported losslessly (PNG / data URI) or lossily (JPEG) using the `image`
// crate.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, instrument};

use ausdruck_core::error::ExportError;

use crate::data_uri;

/// An in-memory bitmap owned by one conversion task.
///
/// Each inlining task draws into its own canvas, so conversions never share
/// pixel buffers.
pub struct OffscreenCanvas {
    image: DynamicImage,
}

impl OffscreenCanvas {
    /// Decode encoded bytes (PNG, JPEG, GIF, ...) at natural size.
    ///
    /// `src` is only used to label the error.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn draw(src: &str, data: &[u8]) -> Result<Self, ExportError> {
        let image = image::load_from_memory(data).map_err(|err| ExportError::AssetEncode {
            src: src.to_string(),
            reason: format!("decode failed: {err}"),
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ExportError::AssetEncode {
                src: src.to_string(),
                reason: "image has zero natural size".into(),
            });
        }
        debug!(
            width = image.width(),
            height = image.height(),
            "bitmap drawn to canvas"
        );
        Ok(Self { image })
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Natural pixel size (width, height).
    pub fn natural_size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Downscale to fit within `max_width` x `max_height`, keeping aspect
    /// ratio. Never upscales.
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (w, h) = self.natural_size();
        if w <= max_width && h <= max_height {
            return self;
        }
        let resized = self.image.resize(
            max_width.max(1),
            max_height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        Self { image: resized }
    }

    /// Composite transparent pixels over an opaque background colour.
    pub fn flatten(self, background: [u8; 3]) -> Self {
        if !self.image.color().has_alpha() {
            return self;
        }
        let rgba = self.image.to_rgba8();
        let [br, bg, bb] = background;
        let flattened = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let alpha = a as u32;
            let blend = |fg: u8, bgc: u8| -> u8 {
                ((fg as u32 * alpha + bgc as u32 * (255 - alpha) + 127) / 255) as u8
            };
            Rgba([blend(r, br), blend(g, bg), blend(b, bb), 255])
        });
        Self {
            image: DynamicImage::ImageRgba8(flattened),
        }
    }

    /// Lossless PNG export.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ExportError::AssetEncode {
                src: String::new(),
                reason: format!("PNG encoding failed: {err}"),
            })?;
        Ok(buffer)
    }

    /// Lossless export as a self-contained `data:image/png;base64,...` source.
    pub fn to_png_data_uri(&self) -> Result<String, ExportError> {
        let png = self.to_png_bytes()?;
        Ok(data_uri::encode("image/png", &png))
    }

    /// Lossy JPEG export with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ExportError::Capture(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}
