// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async extraction service.
//
// Wraps the synchronous `TextExtractor` for async callers: each request runs
// on the blocking pool so recognition never stalls the runtime, progress is
// streamed over an unbounded channel, and every request gets its own tracing
// span with a generated id.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument};
use uuid::Uuid;

use attestwerk_core::error::AttestwerkError;
use attestwerk_core::{Document, ExtractionResult};

use crate::pipeline::TextExtractor;

/// Cloneable handle over one shared extractor.
///
/// Clones share the extractor (and therefore the engine) through an `Arc`;
/// `shutdown` on any clone releases the engine for all of them.
#[derive(Clone)]
pub struct ExtractionService {
    extractor: Arc<TextExtractor>,
}

impl ExtractionService {
    pub fn new(extractor: TextExtractor) -> Self {
        Self { extractor: Arc::new(extractor) }
    }

    /// Extract without progress reporting.
    pub async fn extract(&self, document: Document) -> Result<ExtractionResult, AttestwerkError> {
        self.run(document, None).await
    }

    /// Extract and stream progress percentages into `progress`.
    ///
    /// A closed receiver does not fail the extraction; late percentages are
    /// silently dropped.
    pub async fn extract_with_progress(
        &self,
        document: Document,
        progress: UnboundedSender<u8>,
    ) -> Result<ExtractionResult, AttestwerkError> {
        self.run(document, Some(progress)).await
    }

    #[instrument(skip_all, fields(request = %Uuid::new_v4(), name = %document.name))]
    async fn run(
        &self,
        document: Document,
        progress: Option<UnboundedSender<u8>>,
    ) -> Result<ExtractionResult, AttestwerkError> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || {
            let forward = progress.map(|tx| {
                move |pct: u8| {
                    let _ = tx.send(pct);
                }
            });
            match &forward {
                Some(report) => extractor.extract_text(&document, Some(report)),
                None => extractor.extract_text(&document, None),
            }
        })
        .await
        .map_err(|err| AttestwerkError::Task(format!("extraction worker crashed: {err}")))?
    }

    /// Release the recognition engine. The next request reinitialises it.
    pub fn shutdown(&self) {
        info!("shutting down extraction service");
        self.extractor.engine().terminate();
    }
}
