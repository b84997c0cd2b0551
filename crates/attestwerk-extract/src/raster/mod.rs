// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization for paginated documents.
//
// Renders PDF pages to raster images through PDFium. `pdfium-render` binds
// the native library at runtime, so builds never need it installed; a
// missing library surfaces as a decode error when the first PDF arrives.
// Pages are delivered lazily and in order through the `PageSource` visitor,
// so one page can be recognised while later ones are still unrendered.

use std::sync::Mutex;

use image::DynamicImage;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use attestwerk_core::error::AttestwerkError;

/// PDFium is not thread safe. Every FFI call in the process goes through
/// this lock, held for the whole of one rasterization pass.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// Rendering parameters for paginated documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Upscale factor over native page dimensions. Higher values raise
    /// recognition accuracy at a proportional rendering cost.
    pub scale: f32,
    /// Cap on either rendered dimension, preserving aspect ratio.
    pub max_dimension: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            max_dimension: 4000,
        }
    }
}

/// One rendered page. Numbering is 1-based.
pub struct PageImage {
    pub number: u32,
    pub image: DynamicImage,
}

/// Lazy, in-order supplier of a document's pages.
///
/// `on_page` fires with `(number, total)` before each page is rendered, so
/// consumers can announce a page even when its render then fails. `visit`
/// runs once per rendered page; returning an error stops the traversal,
/// which makes page boundaries the pipeline's cancellation points. One call
/// is one pass over the document.
pub trait PageSource: Send + Sync {
    fn for_each_page(
        &self,
        data: &[u8],
        on_page: &mut dyn FnMut(u32, u32),
        visit: &mut dyn FnMut(PageImage) -> Result<(), AttestwerkError>,
    ) -> Result<(), AttestwerkError>;
}

/// Renders PDF pages through PDFium.
#[derive(Debug, Clone, Default)]
pub struct PdfRasterizer {
    config: RasterConfig,
}

impl PdfRasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self { config }
    }
}

impl PageSource for PdfRasterizer {
    #[instrument(skip_all, fields(bytes = data.len()))]
    fn for_each_page(
        &self,
        data: &[u8],
        on_page: &mut dyn FnMut(u32, u32),
        visit: &mut dyn FnMut(PageImage) -> Result<(), AttestwerkError>,
    ) -> Result<(), AttestwerkError> {
        let _ffi = PDFIUM_LOCK.lock().map_err(|_| {
            AttestwerkError::Decode("rasterizer lock poisoned by an earlier panic".into())
        })?;

        let pdfium = Pdfium::new(bind_pdfium()?);
        let document = pdfium.load_pdf_from_byte_slice(data, None).map_err(|err| {
            AttestwerkError::Decode(format!("failed to open paginated document: {err}"))
        })?;

        let total = document.pages().len() as u32;
        if total == 0 {
            return Err(AttestwerkError::Decode("document contains no pages".into()));
        }
        debug!(pages = total, "rasterizing document");

        for (index, page) in document.pages().iter().enumerate() {
            let number = index as u32 + 1;
            on_page(number, total);
            let (width, height) =
                scaled_dimensions(page.width().value, page.height().value, &self.config);
            let render_config = PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height)
                .render_form_data(true)
                .render_annotations(true);
            let bitmap = page.render_with_config(&render_config).map_err(|err| {
                AttestwerkError::Decode(format!("failed to render page {number}: {err}"))
            })?;
            debug!(page = number, width, height, "page rendered");
            visit(PageImage {
                number,
                image: bitmap.as_image(),
            })?;
        }
        Ok(())
    }
}

/// Resolve the PDFium library, preferring a copy next to the executable.
fn bind_pdfium() -> Result<Box<dyn PdfiumLibraryBindings>, AttestwerkError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib/"))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|err| AttestwerkError::Decode(format!("PDFium library not available: {err}")))
}

/// Points-to-pixels conversion with the configured upscale and cap.
///
/// PDF points are 1/72 inch, so a 2.0 upscale renders at 144 DPI relative
/// to the page's native coordinate space.
fn scaled_dimensions(width_pts: f32, height_pts: f32, config: &RasterConfig) -> (i32, i32) {
    let mut width = width_pts * config.scale;
    let mut height = height_pts * config.scale;

    let longest = width.max(height);
    let cap = config.max_dimension as f32;
    if longest > cap {
        let ratio = cap / longest;
        width *= ratio;
        height *= ratio;
    }
    (width.round().max(1.0) as i32, height.round().max(1.0) as i32)
}
