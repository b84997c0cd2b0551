// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for non-technical users.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive UI presentation.

use crate::error::AttestwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Engine or I/O blip; retrying as-is can work.
    Transient,
    /// User must do something (install language data, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying or user action (wrong format, damaged file).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the system should auto-retry.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert an `AttestwerkError` into a `HumanError` anyone can understand.
pub fn humanize_error(err: &AttestwerkError) -> HumanError {
    match err {
        // -- Engine errors --
        AttestwerkError::EngineInit(detail) => humanize_engine_error(detail),

        AttestwerkError::Recognition(_) => HumanError {
            message: "Text recognition didn't work on this document.".into(),
            suggestion: "Try scanning or photographing the document again with better lighting, making sure the text is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Document errors --
        AttestwerkError::UnsupportedMedia(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Upload a photo (JPEG or PNG) or a PDF instead. (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        AttestwerkError::Decode(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("pdfium") || lower.contains("library") {
                HumanError {
                    message: "PDF support isn't available on this device.".into(),
                    suggestion: "The PDF rendering component is missing. Reinstall the app, or install the PDFium library and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "This document couldn't be read.".into(),
                    suggestion: "The file may be damaged. Try opening it on a computer first to check it works, or try a different file.".into(),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            }
        }

        // -- Mining --
        AttestwerkError::Mining(_) => HumanError {
            message: "The app had an internal problem.".into(),
            suggestion: "Please report this. Retrying won't help until the app is updated.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Service --
        AttestwerkError::Task(_) => HumanError {
            message: "The extraction was interrupted.".into(),
            suggestion: "Try again. If this keeps happening, restart the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        AttestwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or try copying the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        AttestwerkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Parse engine initialisation details into human-readable messages.
fn humanize_engine_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("language") || lower.contains("tessdata") {
        HumanError {
            message: "Text recognition isn't set up on this device.".into(),
            suggestion: "The language data for text recognition is missing. Install the Tesseract language files (for English: tesseract-ocr-eng), then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("poisoned") {
        HumanError {
            message: "Text recognition needs a moment to recover.".into(),
            suggestion: "A previous extraction crashed. Try again; the engine restarts automatically.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "Text recognition couldn't start.".into(),
            suggestion: format!("Try again. If this keeps happening, restart the app. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_language_data_is_action_required() {
        let err = AttestwerkError::EngineInit(
            "failed to initialise Tesseract with language 'eng': no tessdata found".into(),
        );
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn recognition_failure_is_transient() {
        let err = AttestwerkError::Recognition("engine returned no text".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn unsupported_media_is_permanent() {
        let err = AttestwerkError::UnsupportedMedia("application/msword".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_renderer_is_action_required() {
        let err = AttestwerkError::Decode("PDFium library not available: not found".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn damaged_document_is_permanent() {
        let err = AttestwerkError::Decode("failed to open paginated document: bad xref".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn file_not_found_is_action_required() {
        let err = AttestwerkError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }
}
