// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Attestwerk extraction pipeline.

use serde::{Deserialize, Serialize};

/// Media category of an input document, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaCategory {
    /// Raster image (`image/*`) — recognised in a single pass.
    Image,
    /// Multi-page paginated document, rasterized page by page.
    Paginated,
    /// Anything else — rejected before any engine work starts.
    Unsupported,
}

impl MediaCategory {
    /// Classify a declared MIME type string.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim();
        if mime.eq_ignore_ascii_case("application/pdf") {
            Self::Paginated
        } else if mime.len() > 6 && mime.as_bytes()[..6].eq_ignore_ascii_case(b"image/") {
            Self::Image
        } else {
            Self::Unsupported
        }
    }

    /// Guess a MIME type from content magic bytes.
    ///
    /// `%PDF` marks a paginated document; raster formats go through the
    /// image crate's format guesser.
    pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
        if data.len() >= 4 && &data[0..4] == b"%PDF" {
            return Some("application/pdf");
        }
        image::guess_format(data).ok().map(|format| format.to_mime_type())
    }
}

/// An input document: raw bytes plus the metadata the upload surface supplies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Raw file content.
    pub data: Vec<u8>,
    /// Declared MIME type (e.g. `image/png`, `application/pdf`).
    pub media_type: String,
    /// Display name, carried through to the extraction result.
    pub name: String,
}

impl Document {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
            name: name.into(),
        }
    }

    /// Build a document whose MIME type is sniffed from its content.
    ///
    /// Falls back to `application/octet-stream` (rejected downstream) when
    /// the content matches no known format.
    pub fn with_sniffed_type(data: Vec<u8>, name: impl Into<String>) -> Self {
        let media_type = MediaCategory::sniff_mime(&data)
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            data,
            media_type,
            name: name.into(),
        }
    }

    /// Media category this document will be processed as.
    pub fn category(&self) -> MediaCategory {
        MediaCategory::from_mime(&self.media_type)
    }
}

/// Axis-aligned bounding box in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A single recognised word with its confidence and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    /// Recognition confidence, 0–100.
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// 1-based page number for paginated input; absent for single images.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
}

/// A recognised text line with its confidence and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    /// Recognition confidence, 0–100.
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// 1-based page number for paginated input; absent for single images.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
}

/// Output of one recognition pass over a single image or page.
///
/// Text here is raw engine output; normalisation happens later in the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    /// Mean recognition confidence over the pass, 0–100.
    pub confidence: f32,
    pub words: Vec<Word>,
    pub lines: Vec<Line>,
}

/// Structured fields mined from normalised certificate text.
///
/// Every list is deduplicated (exact match, first occurrence kept). A
/// category with no matches is an empty list, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub names: Vec<String>,
    pub institutions: Vec<String>,
    pub dates: Vec<String>,
    pub degrees: Vec<String>,
    /// Kept for result-shape stability; no current mining rule fills it.
    pub certificates: Vec<String>,
    pub emails: Vec<String>,
    pub ids: Vec<String>,
}

impl CertificateInfo {
    /// True when no category matched anything.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.institutions.is_empty()
            && self.dates.is_empty()
            && self.degrees.is_empty()
            && self.certificates.is_empty()
            && self.emails.is_empty()
            && self.ids.is_empty()
    }
}

/// Terminal artifact of an extraction: normalised text, aggregate
/// confidence, word/line layout, mined fields, and source metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Normalised text; paginated input is joined behind `--- Page N ---`
    /// markers.
    pub text: String,
    /// 0–100; for paginated input, the arithmetic mean over pages.
    pub confidence: f32,
    pub words: Vec<Word>,
    pub lines: Vec<Line>,
    /// Number of pages processed; only present for paginated input.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_count: Option<u32>,
    pub certificate_info: CertificateInfo,
    /// Declared MIME type of the source document.
    pub source_media_type: String,
    /// Display name of the source document.
    pub source_name: String,
}
