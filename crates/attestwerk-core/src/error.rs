// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Attestwerk.

use thiserror::Error;

/// Top-level error type for all Attestwerk operations.
#[derive(Debug, Error)]
pub enum AttestwerkError {
    // -- Engine errors --
    #[error("recognition engine failed to initialise: {0}")]
    EngineInit(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Document errors --
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("document decode failed: {0}")]
    Decode(String),

    // -- Mining errors --
    #[error("field mining rule failed to compile: {0}")]
    Mining(String),

    // -- Service errors --
    #[error("extraction task failed: {0}")]
    Task(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AttestwerkError>;
