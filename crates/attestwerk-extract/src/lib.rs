// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// attestwerk-extract — Document text extraction for Attestwerk.
//
// Provides the recognition engine adapter (lazy initialisation, serialised
// access, progress reporting), PDF page rasterization, text normalisation,
// certificate field mining, the extraction orchestrator, and an async
// service wrapper for interactive surfaces.

pub mod engine;
pub mod mine;
pub mod normalize;
pub mod pipeline;
pub mod raster;
pub mod service;

// Re-export the primary structs so callers can use `attestwerk_extract::TextExtractor` etc.
pub use engine::{EngineConfig, EngineState, RecognitionEngine, SegmentationMode};
pub use mine::FieldMiner;
pub use normalize::{NormalizeOptions, TextNormalizer};
pub use pipeline::TextExtractor;
pub use raster::{PageImage, PageSource, PdfRasterizer, RasterConfig};
pub use service::ExtractionService;

#[cfg(feature = "tesseract")]
pub use engine::tesseract::TesseractBackend;
