// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document extraction orchestrator.
//
// Front door of the pipeline: dispatches on the declared media category,
// drives per-page recognition for paginated documents, aggregates text and
// layout across pages, and finishes every path with normalisation and field
// mining. Failure of any stage fails the whole extraction; partial results
// never escape.

use tracing::{debug, info, instrument, warn};

use attestwerk_core::error::AttestwerkError;
use attestwerk_core::{Document, ExtractionResult, Line, MediaCategory, Word};

use crate::engine::RecognitionEngine;
use crate::mine::FieldMiner;
use crate::normalize::TextNormalizer;
use crate::raster::{PageSource, PdfRasterizer};

/// Orchestrates extraction over one shared recognition engine.
///
/// The engine serialises concurrent callers internally, so a single
/// `TextExtractor` can serve a whole process; see `service` for the async
/// wrapper interactive surfaces use.
pub struct TextExtractor {
    engine: RecognitionEngine,
    pages: Box<dyn PageSource>,
    normalizer: TextNormalizer,
    miner: FieldMiner,
}

impl TextExtractor {
    /// Build an extractor around `engine` with PDF rasterization and default
    /// normalisation.
    pub fn new(engine: RecognitionEngine) -> Result<Self, AttestwerkError> {
        Ok(Self {
            engine,
            pages: Box::new(PdfRasterizer::default()),
            normalizer: TextNormalizer::new(),
            miner: FieldMiner::new()?,
        })
    }

    /// Replace the page source (tests, or paginated formats beyond PDF).
    pub fn with_page_source(mut self, pages: Box<dyn PageSource>) -> Self {
        self.pages = pages;
        self
    }

    /// Replace the text normaliser.
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// The underlying engine, for state inspection and explicit `terminate`.
    pub fn engine(&self) -> &RecognitionEngine {
        &self.engine
    }

    /// Extract text and structured fields from `document`.
    ///
    /// Progress behaviour differs by media category and is part of the
    /// contract: single images forward the engine's own continuous
    /// percentages, while paginated documents report only page-boundary
    /// values (`(page - 1) * 100 / page_count`, integer division), emitted
    /// before each page is rendered, with no intra-page detail.
    #[instrument(skip_all, fields(name = %document.name, media_type = %document.media_type))]
    pub fn extract_text(
        &self,
        document: &Document,
        on_progress: Option<&dyn Fn(u8)>,
    ) -> Result<ExtractionResult, AttestwerkError> {
        match document.category() {
            MediaCategory::Image => self.extract_image(document, on_progress),
            MediaCategory::Paginated => self.extract_paginated(document, on_progress),
            MediaCategory::Unsupported => {
                warn!("rejecting unsupported media type");
                Err(AttestwerkError::UnsupportedMedia(document.media_type.clone()))
            }
        }
    }

    /// Single-pass recognition over a raster image.
    fn extract_image(
        &self,
        document: &Document,
        on_progress: Option<&dyn Fn(u8)>,
    ) -> Result<ExtractionResult, AttestwerkError> {
        let image = image::load_from_memory(&document.data).map_err(|err| {
            AttestwerkError::Decode(format!("failed to decode image '{}': {err}", document.name))
        })?;
        let recognition = self.engine.recognize(&image, on_progress)?;
        info!(confidence = recognition.confidence, "image recognition complete");
        Ok(self.assemble(
            document,
            recognition.text,
            recognition.confidence,
            recognition.words,
            recognition.lines,
            None,
        ))
    }

    /// Sequential page-by-page recognition with boundary progress.
    fn extract_paginated(
        &self,
        document: &Document,
        on_progress: Option<&dyn Fn(u8)>,
    ) -> Result<ExtractionResult, AttestwerkError> {
        let mut text = String::new();
        let mut words = Vec::new();
        let mut lines = Vec::new();
        let mut confidences = Vec::new();

        self.pages.for_each_page(
            &document.data,
            // Boundary progress fires before the page renders; intra-page
            // percentages are deliberately not forwarded for paginated input.
            &mut |number, total| {
                if let Some(report) = on_progress {
                    report(((number - 1) * 100 / total) as u8);
                }
            },
            &mut |page| {
                let recognition = self.engine.recognize(&page.image, None)?;
                debug!(
                    page = page.number,
                    confidence = recognition.confidence,
                    "page recognised"
                );

                let cleaned = self.normalizer.clean(&recognition.text);
                text.push_str(&format!("\n--- Page {} ---\n{}\n", page.number, cleaned));
                words.extend(
                    recognition
                        .words
                        .into_iter()
                        .map(|word| Word { page: Some(page.number), ..word }),
                );
                lines.extend(
                    recognition
                        .lines
                        .into_iter()
                        .map(|line| Line { page: Some(page.number), ..line }),
                );
                confidences.push(recognition.confidence);
                Ok(())
            },
        )?;

        if confidences.is_empty() {
            return Err(AttestwerkError::Decode("document contains no pages".into()));
        }
        let page_count = confidences.len() as u32;
        let confidence = confidences.iter().sum::<f32>() / page_count as f32;
        info!(pages = page_count, confidence, "paginated recognition complete");
        Ok(self.assemble(document, text, confidence, words, lines, Some(page_count)))
    }

    /// Final normalisation, field mining, and result assembly shared by both
    /// extraction paths.
    fn assemble(
        &self,
        document: &Document,
        raw_text: String,
        confidence: f32,
        words: Vec<Word>,
        lines: Vec<Line>,
        page_count: Option<u32>,
    ) -> ExtractionResult {
        let text = self.normalizer.clean(&raw_text);
        let certificate_info = self.miner.mine(&text);
        info!(
            chars = text.len(),
            names = certificate_info.names.len(),
            dates = certificate_info.dates.len(),
            ids = certificate_info.ids.len(),
            "extraction assembled"
        );
        ExtractionResult {
            text,
            confidence: confidence.clamp(0.0, 100.0),
            words,
            lines,
            page_count,
            certificate_info,
            source_media_type: document.media_type.clone(),
            source_name: document.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::engine::backend::RecognitionBackend;
    use crate::raster::PageImage;
    use attestwerk_core::{BoundingBox, RecognitionResult};
    use image::DynamicImage;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Backend double: echoes image dimensions and a call counter, with
    /// per-call confidences, optional fixed text, failure injection, and
    /// overlap detection for concurrency tests.
    struct ScriptedBackend {
        confidences: Vec<f32>,
        progress: Vec<u8>,
        fixed_text: Option<String>,
        fail_on_call: Option<usize>,
        delay: Option<Duration>,
        busy: Option<Arc<AtomicBool>>,
        overlapped: Option<Arc<AtomicBool>>,
        calls: usize,
    }

    impl ScriptedBackend {
        fn plain() -> Self {
            Self {
                confidences: Vec::new(),
                progress: vec![100],
                fixed_text: None,
                fail_on_call: None,
                delay: None,
                busy: None,
                overlapped: None,
                calls: 0,
            }
        }
    }

    impl RecognitionBackend for ScriptedBackend {
        fn recognize(
            &mut self,
            image: &DynamicImage,
            on_progress: &mut dyn FnMut(u8),
        ) -> Result<RecognitionResult, AttestwerkError> {
            if let (Some(busy), Some(overlapped)) = (&self.busy, &self.overlapped) {
                if busy.swap(true, Ordering::SeqCst) {
                    overlapped.store(true, Ordering::SeqCst);
                }
            }
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            let call = self.calls;
            self.calls += 1;
            if self.fail_on_call == Some(call) {
                if let Some(busy) = &self.busy {
                    busy.store(false, Ordering::SeqCst);
                }
                return Err(AttestwerkError::Recognition("scripted recognition failure".into()));
            }
            for &pct in &self.progress {
                on_progress(pct);
            }
            let text = self.fixed_text.clone().unwrap_or_else(|| {
                format!("scan {}x{} pass {}", image.width(), image.height(), call + 1)
            });
            let confidence = self.confidences.get(call).copied().unwrap_or(90.0);
            let bbox = BoundingBox { x: 1, y: 2, width: 3, height: 4 };
            let result = RecognitionResult {
                text: text.clone(),
                confidence,
                words: vec![Word {
                    text: format!("w{}", call + 1),
                    confidence,
                    bbox,
                    page: None,
                }],
                lines: vec![Line {
                    text,
                    confidence,
                    bbox,
                    page: None,
                }],
            };
            if let Some(busy) = &self.busy {
                busy.store(false, Ordering::SeqCst);
            }
            Ok(result)
        }
    }

    /// Page source double: synthesises pages of distinct sizes, optionally
    /// failing partway through.
    struct FakePages {
        count: u32,
        fail_at: Option<u32>,
    }

    impl PageSource for FakePages {
        fn for_each_page(
            &self,
            _data: &[u8],
            on_page: &mut dyn FnMut(u32, u32),
            visit: &mut dyn FnMut(PageImage) -> Result<(), AttestwerkError>,
        ) -> Result<(), AttestwerkError> {
            for number in 1..=self.count {
                on_page(number, self.count);
                if self.fail_at == Some(number) {
                    return Err(AttestwerkError::Decode(format!(
                        "failed to render page {number}"
                    )));
                }
                visit(PageImage {
                    number,
                    image: DynamicImage::new_luma8(11 * number, 11),
                })?;
            }
            Ok(())
        }
    }

    fn scripted_engine(
        builds: Arc<AtomicUsize>,
        make: impl Fn() -> ScriptedBackend + Send + Sync + 'static,
    ) -> RecognitionEngine {
        RecognitionEngine::with_backend(EngineConfig::default(), move |_| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(make()) as Box<dyn RecognitionBackend>)
        })
    }

    fn extractor_with(engine: RecognitionEngine, pages: FakePages) -> TextExtractor {
        TextExtractor::new(engine)
            .unwrap()
            .with_page_source(Box::new(pages))
    }

    fn image_document(width: u32, height: u32, name: &str) -> Document {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        Document::new(buf.into_inner(), "image/png", name)
    }

    fn pdf_document(name: &str) -> Document {
        Document::new(b"%PDF-1.4 fake".to_vec(), "application/pdf", name)
    }

    #[test]
    fn image_extraction_produces_an_untagged_result() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 0, fail_at: None },
        );
        let document = image_document(11, 11, "award.png");

        let result = extractor.extract_text(&document, None).unwrap();

        assert_eq!(result.text, "scan 11x11 pass 1");
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.page_count, None);
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.words[0].page, None);
        assert_eq!(result.lines[0].page, None);
        assert_eq!(result.source_media_type, "image/png");
        assert_eq!(result.source_name, "award.png");
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn image_progress_forwards_continuous_engine_values() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), || ScriptedBackend {
                progress: vec![5, 40, 100],
                ..ScriptedBackend::plain()
            }),
            FakePages { count: 0, fail_at: None },
        );
        let document = image_document(11, 11, "award.png");

        let seen = Mutex::new(Vec::new());
        let report = |pct: u8| seen.lock().unwrap().push(pct);
        extractor.extract_text(&document, Some(&report)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![5, 40, 100]);
    }

    #[test]
    fn unsupported_media_is_rejected_before_engine_start() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 0, fail_at: None },
        );
        let document = Document::new(b"plain words".to_vec(), "text/plain", "notes.txt");

        let err = extractor.extract_text(&document, None).unwrap_err();

        assert!(matches!(err, AttestwerkError::UnsupportedMedia(ref m) if m == "text/plain"));
        assert_eq!(builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn paginated_pages_are_joined_with_markers() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 3, fail_at: None },
        );

        let result = extractor.extract_text(&pdf_document("scan.pdf"), None).unwrap();

        assert_eq!(
            result.text,
            "--- Page 1 ---\nscan 11x11 pass 1\n\
             --- Page 2 ---\nscan 22x11 pass 2\n\
             --- Page 3 ---\nscan 33x11 pass 3"
        );
        assert_eq!(result.page_count, Some(3));
    }

    #[test]
    fn paginated_confidence_is_the_page_mean_and_layout_is_tagged() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), || ScriptedBackend {
                confidences: vec![80.0, 90.0, 100.0],
                ..ScriptedBackend::plain()
            }),
            FakePages { count: 3, fail_at: None },
        );

        let result = extractor.extract_text(&pdf_document("scan.pdf"), None).unwrap();

        assert!((result.confidence - 90.0).abs() < 1e-3);
        assert_eq!(result.page_count, Some(3));
        let word_pages: Vec<_> = result.words.iter().map(|w| w.page).collect();
        assert_eq!(word_pages, vec![Some(1), Some(2), Some(3)]);
        let line_pages: Vec<_> = result.lines.iter().map(|l| l.page).collect();
        assert_eq!(line_pages, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn page_boundary_progress_uses_integer_floor() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 3, fail_at: None },
        );

        let seen = Mutex::new(Vec::new());
        let report = |pct: u8| seen.lock().unwrap().push(pct);
        extractor
            .extract_text(&pdf_document("scan.pdf"), Some(&report))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 33, 66]);
    }

    #[test]
    fn failing_page_render_aborts_the_extraction() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 3, fail_at: Some(2) },
        );

        let err = extractor
            .extract_text(&pdf_document("scan.pdf"), None)
            .unwrap_err();

        assert!(matches!(err, AttestwerkError::Decode(ref m) if m.contains("page 2")));
    }

    #[test]
    fn boundary_progress_precedes_each_page_render() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 3, fail_at: Some(2) },
        );

        let seen = Mutex::new(Vec::new());
        let report = |pct: u8| seen.lock().unwrap().push(pct);
        let err = extractor
            .extract_text(&pdf_document("scan.pdf"), Some(&report))
            .unwrap_err();

        // Page 2's boundary value goes out before its render is attempted,
        // so the abort arrives after [0, 33] and nothing further.
        assert!(matches!(err, AttestwerkError::Decode(ref m) if m.contains("page 2")));
        assert_eq!(*seen.lock().unwrap(), vec![0, 33]);
    }

    #[test]
    fn failing_recognition_mid_document_aborts() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), || ScriptedBackend {
                fail_on_call: Some(1),
                ..ScriptedBackend::plain()
            }),
            FakePages { count: 3, fail_at: None },
        );

        let err = extractor
            .extract_text(&pdf_document("scan.pdf"), None)
            .unwrap_err();

        assert!(matches!(err, AttestwerkError::Recognition(_)));
    }

    #[test]
    fn empty_page_source_is_a_decode_error() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 0, fail_at: None },
        );

        let err = extractor
            .extract_text(&pdf_document("empty.pdf"), None)
            .unwrap_err();

        assert!(matches!(err, AttestwerkError::Decode(ref m) if m.contains("no pages")));
    }

    #[test]
    fn terminate_then_extract_reinitialises_transparently() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 0, fail_at: None },
        );
        let document = image_document(11, 11, "award.png");

        extractor.extract_text(&document, None).unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        extractor.engine().terminate();

        extractor.extract_text(&document, None).unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_extractions_stay_attributable() {
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = {
            let busy = Arc::clone(&busy);
            let overlapped = Arc::clone(&overlapped);
            extractor_with(
                scripted_engine(Arc::clone(&builds), move || ScriptedBackend {
                    delay: Some(Duration::from_millis(25)),
                    busy: Some(Arc::clone(&busy)),
                    overlapped: Some(Arc::clone(&overlapped)),
                    ..ScriptedBackend::plain()
                }),
                FakePages { count: 0, fail_at: None },
            )
        };

        let small = image_document(11, 11, "small.png");
        let large = image_document(22, 22, "large.png");
        std::thread::scope(|scope| {
            let first = scope.spawn(|| extractor.extract_text(&small, None).unwrap());
            let second = scope.spawn(|| extractor.extract_text(&large, None).unwrap());
            assert!(first.join().unwrap().text.contains("11x11"));
            assert!(second.join().unwrap().text.contains("22x22"));
        });

        assert!(!overlapped.load(Ordering::SeqCst));
    }

    #[test]
    fn mined_fields_flow_from_recognised_text() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), || ScriptedBackend {
                fixed_text: Some(
                    "This is to certify that Jane Doe has completed the course".to_string(),
                ),
                ..ScriptedBackend::plain()
            }),
            FakePages { count: 0, fail_at: None },
        );

        let result = extractor
            .extract_text(&image_document(11, 11, "cert.png"), None)
            .unwrap();

        assert_eq!(result.certificate_info.names, vec!["Jane Doe"]);
    }

    #[test]
    fn out_of_range_confidence_clamps_into_bounds() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), || ScriptedBackend {
                confidences: vec![250.0],
                ..ScriptedBackend::plain()
            }),
            FakePages { count: 0, fail_at: None },
        );

        let result = extractor
            .extract_text(&image_document(11, 11, "award.png"), None)
            .unwrap();

        assert_eq!(result.confidence, 100.0);
    }

    #[test]
    fn page_count_serialises_only_for_paginated_results() {
        let builds = Arc::new(AtomicUsize::new(0));
        let extractor = extractor_with(
            scripted_engine(Arc::clone(&builds), ScriptedBackend::plain),
            FakePages { count: 2, fail_at: None },
        );

        let image_result = extractor
            .extract_text(&image_document(11, 11, "award.png"), None)
            .unwrap();
        let image_json = serde_json::to_value(&image_result).unwrap();
        assert!(image_json.get("page_count").is_none());

        let pdf_result = extractor
            .extract_text(&pdf_document("scan.pdf"), None)
            .unwrap();
        let pdf_json = serde_json::to_value(&pdf_result).unwrap();
        assert_eq!(pdf_json["page_count"], 2);
    }
}
