// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend seam for the recognition engine adapter.

use image::DynamicImage;

use attestwerk_core::RecognitionResult;
use attestwerk_core::error::AttestwerkError;

use super::EngineConfig;

/// A concrete recognition engine instance.
///
/// One backend serves one engine session: built by the adapter's factory
/// during initialisation, called serially (the adapter holds a lock across
/// `recognize`), and dropped on `terminate`.
pub trait RecognitionBackend: Send {
    /// Recognise text in `image`.
    ///
    /// `on_progress` receives raw percentages as the pass advances; the
    /// adapter clamps them into a monotonic sequence before they reach the
    /// caller, so backends are free to report coarsely.
    fn recognize(
        &mut self,
        image: &DynamicImage,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<RecognitionResult, AttestwerkError>;
}

/// Builds one backend per engine session.
pub type BackendFactory =
    Box<dyn Fn(&EngineConfig) -> Result<Box<dyn RecognitionBackend>, AttestwerkError> + Send + Sync>;
