// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognition backend.
//
// Wraps the `leptess` bindings to Tesseract 5.x behind the `tesseract`
// feature gate. Building needs the Tesseract and Leptonica system libraries
// (Debian/Ubuntu: `libtesseract-dev libleptonica-dev`); running needs the
// language data for the configured language (`tesseract-ocr-eng` for the
// default). Language data resolves from `EngineConfig::datapath` when set,
// otherwise through Tesseract's own search path (`TESSDATA_PREFIX` et al).

use std::io::Cursor;

use image::DynamicImage;
use leptess::{LepTess, Variable};
use tracing::{debug, instrument};

use attestwerk_core::error::AttestwerkError;
use attestwerk_core::{BoundingBox, Line, RecognitionResult, Word};

use super::backend::RecognitionBackend;
use super::{EngineConfig, RecognitionEngine, SegmentationMode};

impl SegmentationMode {
    /// Tesseract `tessedit_pageseg_mode` value.
    fn psm(self) -> &'static str {
        match self {
            Self::SparseText => "11",
            Self::Auto => "3",
            Self::SingleBlock => "6",
        }
    }
}

impl RecognitionEngine {
    /// Adapter backed by the Tesseract engine.
    pub fn tesseract(config: EngineConfig) -> Self {
        Self::with_backend(config, |cfg| {
            Ok(Box::new(TesseractBackend::new(cfg)?) as Box<dyn RecognitionBackend>)
        })
    }
}

/// Recognition backend driving one Tesseract instance.
pub struct TesseractBackend {
    lt: LepTess,
}

// A Tesseract handle has no thread affinity; the adapter's lock guarantees
// exclusive access, so moving the backend between worker threads is sound.
unsafe impl Send for TesseractBackend {}

impl TesseractBackend {
    /// Initialise Tesseract with the fixed engine configuration.
    #[instrument(skip_all, fields(language = %config.language))]
    pub fn new(config: &EngineConfig) -> Result<Self, AttestwerkError> {
        config.validate()?;

        let datapath = config
            .datapath
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        let mut lt = LepTess::new(datapath.as_deref(), &config.language).map_err(|err| {
            AttestwerkError::EngineInit(format!(
                "failed to initialise Tesseract with language '{}': {err} (is the language data installed?)",
                config.language
            ))
        })?;

        lt.set_variable(Variable::TesseditCharWhitelist, &config.char_whitelist)
            .map_err(|err| {
                AttestwerkError::EngineInit(format!("failed to set character whitelist: {err}"))
            })?;
        lt.set_variable(Variable::TesseditPagesegMode, config.segmentation.psm())
            .map_err(|err| {
                AttestwerkError::EngineInit(format!("failed to set segmentation mode: {err}"))
            })?;
        let spaces = if config.preserve_interword_spaces { "1" } else { "0" };
        lt.set_variable(Variable::PreserveInterwordSpaces, spaces)
            .map_err(|err| {
                AttestwerkError::EngineInit(format!("failed to set inter-word spacing: {err}"))
            })?;

        debug!("tesseract backend initialised");
        Ok(Self { lt })
    }

    /// Feed the encoded image to Tesseract, replacing any region restriction
    /// left behind by an earlier `set_rectangle`.
    fn set_image(&mut self, png: &[u8]) -> Result<(), AttestwerkError> {
        self.lt.set_image_from_mem(png).map_err(|err| {
            AttestwerkError::Recognition(format!("failed to load image into the engine: {err}"))
        })
    }

    /// Recognise each detected region at `level`, advancing progress
    /// linearly from `from` to `to` as regions complete.
    fn recognize_regions(
        &mut self,
        png: &[u8],
        level: leptess::capi::TessPageIteratorLevel,
        from: u8,
        to: u8,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Vec<(String, f32, BoundingBox)>, AttestwerkError> {
        // Box detection must see the whole page, so reset the image first.
        self.set_image(png)?;
        let Some(boxes) = self.lt.get_component_boxes(level, true) else {
            // No regions at this level (e.g. a blank page). Not an error.
            return Ok(Vec::new());
        };

        let regions: Vec<(i32, i32, i32, i32)> = (&boxes)
            .into_iter()
            .map(|b| {
                let geom = b.get_geometry();
                (geom.x, geom.y, geom.w, geom.h)
            })
            .collect();

        let total = regions.len().max(1);
        let span = (to - from) as usize;
        let mut out = Vec::with_capacity(regions.len());
        for (idx, &(x, y, w, h)) in regions.iter().enumerate() {
            self.lt.set_rectangle(x, y, w, h);
            let text = self.lt.get_utf8_text().unwrap_or_default().trim().to_string();
            if text.is_empty() {
                continue;
            }
            let confidence = self.lt.mean_text_conf() as f32;
            out.push((text, confidence, BoundingBox { x, y, width: w, height: h }));
            on_progress(from + (((idx + 1) * span) / total) as u8);
        }
        Ok(out)
    }
}

impl RecognitionBackend for TesseractBackend {
    fn recognize(
        &mut self,
        image: &DynamicImage,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<RecognitionResult, AttestwerkError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(AttestwerkError::Recognition(format!(
                "image dimensions must be non-zero (got {width}x{height})"
            )));
        }

        // Leptonica wants encoded image data; PNG round-trips losslessly.
        let mut png_buf = Cursor::new(Vec::new());
        image
            .write_to(&mut png_buf, image::ImageFormat::Png)
            .map_err(|err| {
                AttestwerkError::Recognition(format!("failed to encode image for the engine: {err}"))
            })?;
        let png = png_buf.into_inner();

        self.set_image(&png)?;
        on_progress(0);

        let text = self.lt.get_utf8_text().map_err(|err| {
            AttestwerkError::Recognition(format!("text recognition failed: {err}"))
        })?;
        let confidence = self.lt.mean_text_conf() as f32;
        on_progress(30);

        let lines: Vec<Line> = self
            .recognize_regions(
                &png,
                leptess::capi::TessPageIteratorLevel_RIL_TEXTLINE,
                30,
                65,
                on_progress,
            )?
            .into_iter()
            .map(|(text, confidence, bbox)| Line { text, confidence, bbox, page: None })
            .collect();

        let words: Vec<Word> = self
            .recognize_regions(
                &png,
                leptess::capi::TessPageIteratorLevel_RIL_WORD,
                65,
                100,
                on_progress,
            )?
            .into_iter()
            .map(|(text, confidence, bbox)| Word { text, confidence, bbox, page: None })
            .collect();

        on_progress(100);
        debug!(
            chars = text.len(),
            words = words.len(),
            lines = lines.len(),
            "tesseract pass complete"
        );
        Ok(RecognitionResult { text, confidence, words, lines })
    }
}
