// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine adapter.
//
// Owns the process-wide recognition engine as an explicit resource: lazily
// initialised on first use, serialised behind a mutex (the underlying engine
// is not reentrant), and released by `terminate` or drop. The concrete
// engine is injected through the `RecognitionBackend` trait so tests can
// substitute scripted engines; the production Tesseract backend lives in
// `tesseract` behind the feature gate of the same name.

pub mod backend;
#[cfg(feature = "tesseract")]
pub mod tesseract;

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use attestwerk_core::RecognitionResult;
use attestwerk_core::error::AttestwerkError;

use backend::{BackendFactory, RecognitionBackend};

/// Characters the engine is allowed to emit.
///
/// Tuned for certificate and diploma text: Latin letters, digits, and the
/// punctuation that plausibly appears on a printed award.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 .,;:!?\"-()[]{}/";

/// Page segmentation strategy passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentationMode {
    /// Find sparse, irregularly placed text (certificates, stamps, seals).
    SparseText,
    /// Fully automatic page segmentation.
    Auto,
    /// Treat the image as a single uniform block of text.
    SingleBlock,
}

/// Configuration applied to the engine at initialisation.
///
/// Fixed for the lifetime of one engine session; changing it requires
/// `terminate` followed by a fresh first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Language model identifier (e.g. `eng`).
    pub language: String,
    /// Directory holding language data; `None` uses the engine's own search path.
    pub datapath: Option<PathBuf>,
    /// Characters the engine may emit.
    pub char_whitelist: String,
    /// Page segmentation strategy.
    pub segmentation: SegmentationMode,
    /// Keep the engine's spacing between words instead of re-flowing it.
    pub preserve_interword_spaces: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            datapath: None,
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
            segmentation: SegmentationMode::SparseText,
            preserve_interword_spaces: true,
        }
    }
}

impl EngineConfig {
    /// Verify that the configured language data directory exists.
    pub fn validate(&self) -> Result<(), AttestwerkError> {
        if let Some(dir) = &self.datapath {
            if !dir.exists() {
                return Err(AttestwerkError::EngineInit(format!(
                    "language data directory not found at {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Observable lifecycle of the engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No engine loaded yet; the next use will initialise one.
    Uninitialized,
    /// A caller is loading the engine; others block until it is ready.
    Initializing,
    /// Engine loaded and accepting recognition calls.
    Ready,
    /// Engine released by `terminate`; re-initialises transparently on next use.
    Terminated,
}

const STATE_UNINITIALIZED: u8 = 0;
const STATE_INITIALIZING: u8 = 1;
const STATE_READY: u8 = 2;
const STATE_TERMINATED: u8 = 3;

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_INITIALIZING => Self::Initializing,
            STATE_READY => Self::Ready,
            STATE_TERMINATED => Self::Terminated,
            _ => Self::Uninitialized,
        }
    }
}

/// What the mutex guards: the engine instance, when one exists.
enum Slot {
    Empty,
    Loaded(Box<dyn RecognitionBackend>),
}

/// Process-wide recognition engine adapter.
///
/// At most one recognition pass runs at a time; concurrent callers block on
/// the internal lock rather than corrupting engine state. Initialisation is
/// checked under the same lock, so concurrent first callers converge on a
/// single engine instance. Dropping the adapter releases the engine;
/// `terminate` exists for explicit release and session restart.
pub struct RecognitionEngine {
    config: EngineConfig,
    factory: BackendFactory,
    slot: Mutex<Slot>,
    state: AtomicU8,
}

impl RecognitionEngine {
    /// Create an adapter that builds its engine with `factory` on first use.
    ///
    /// No engine work happens here; the first `initialize` or `recognize`
    /// call pays the model-loading cost.
    pub fn with_backend<F>(config: EngineConfig, factory: F) -> Self
    where
        F: Fn(&EngineConfig) -> Result<Box<dyn RecognitionBackend>, AttestwerkError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            slot: Mutex::new(Slot::Empty),
            state: AtomicU8::new(STATE_UNINITIALIZED),
        }
    }

    /// Current lifecycle state, readable without taking the engine lock.
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The configuration this adapter was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the engine if it is not already loaded.
    ///
    /// Idempotent: calling while `Ready` returns immediately, and a caller
    /// arriving mid-initialisation blocks on the lock, then finds the loaded
    /// engine instead of starting a second one.
    #[instrument(skip_all, fields(language = %self.config.language))]
    pub fn initialize(&self) -> Result<(), AttestwerkError> {
        let mut slot = self.slot.lock().map_err(|_| {
            AttestwerkError::EngineInit("engine lock poisoned by an earlier panic".into())
        })?;
        self.ensure_loaded(&mut slot)
    }

    /// Run one recognition pass over `image`.
    ///
    /// Initialises the engine first when necessary, including after
    /// `terminate`. Progress arrives through `on_progress` as integer
    /// percentages, clamped monotonic non-decreasing within this call
    /// regardless of what the backend emits; the callback runs on the
    /// recognising thread.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize(
        &self,
        image: &DynamicImage,
        on_progress: Option<&dyn Fn(u8)>,
    ) -> Result<RecognitionResult, AttestwerkError> {
        let mut slot = self.slot.lock().map_err(|_| {
            AttestwerkError::Recognition("engine lock poisoned by an earlier panic".into())
        })?;
        self.ensure_loaded(&mut slot)?;
        let Slot::Loaded(backend) = &mut *slot else {
            return Err(AttestwerkError::Recognition(
                "engine slot empty after initialisation".into(),
            ));
        };

        let mut last = 0u8;
        let mut forward = |raw: u8| {
            let pct = raw.min(100);
            if pct >= last {
                last = pct;
                if let Some(report) = on_progress {
                    report(pct);
                }
            }
        };

        let result = backend.recognize(image, &mut forward)?;
        debug!(
            confidence = result.confidence,
            words = result.words.len(),
            lines = result.lines.len(),
            "recognition pass complete"
        );
        Ok(result)
    }

    /// Release the engine and its language model.
    ///
    /// Safe to call at any time, including repeatedly or before first use.
    /// Also clears a poisoned lock left behind by a recognition pass that
    /// panicked, so the next use starts from a clean session.
    pub fn terminate(&self) {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(&*slot, Slot::Loaded(_)) {
            info!("recognition engine terminated");
        }
        *slot = Slot::Empty;
        drop(slot);
        self.slot.clear_poison();
        self.state.store(STATE_TERMINATED, Ordering::Release);
    }

    /// Load the engine into `slot` if empty. Caller holds the lock.
    fn ensure_loaded(&self, slot: &mut Slot) -> Result<(), AttestwerkError> {
        if matches!(slot, Slot::Loaded(_)) {
            return Ok(());
        }
        self.state.store(STATE_INITIALIZING, Ordering::Release);
        info!("initialising recognition engine");
        match (self.factory)(&self.config) {
            Ok(engine) => {
                *slot = Slot::Loaded(engine);
                self.state.store(STATE_READY, Ordering::Release);
                info!("recognition engine ready");
                Ok(())
            }
            Err(err) => {
                // A failed load leaves the adapter retryable.
                self.state.store(STATE_UNINITIALIZED, Ordering::Release);
                warn!(error = %err, "recognition engine failed to initialise");
                Err(err)
            }
        }
    }
}
