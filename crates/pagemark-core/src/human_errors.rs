// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the editor surface.
//
// Every failed operation is reported to the user exactly once, as a single
// plain-language message with a suggestion. The taxonomy uses three severity
// levels that drive UI presentation.

use crate::error::PagemarkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something temporary — trying again may work.
    Transient,
    /// User must do something (wait for a running task, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying — damaged file, unsupported content.
    Permanent,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same action could succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

impl HumanError {
    /// Heading and suggestion joined into the one-line form used by toasts.
    pub fn one_line(&self) -> String {
        format!("{} {}", self.message, self.suggestion)
    }
}

/// Convert a `PagemarkError` into a `HumanError`.
pub fn humanize_error(err: &PagemarkError) -> HumanError {
    match err {
        PagemarkError::Import(_) => HumanError {
            message: "We couldn't open this document.".into(),
            suggestion: "The file may be damaged or password protected. Try opening it in another viewer first, or choose a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PagemarkError::Recognition(detail) => {
            if detail.contains("model") || detail.contains("unavailable") {
                HumanError {
                    message: "Text recognition isn't available right now.".into(),
                    suggestion: "The recognition models could not be loaded. Check the installation, then try again.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            } else {
                HumanError {
                    message: "Text recognition didn't work on this page.".into(),
                    suggestion: "Your existing annotations are unchanged. Try again, or add text manually with the text tool.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PagemarkError::Export(_) | PagemarkError::PdfError(_) => HumanError {
            message: "We couldn't save the document.".into(),
            suggestion: "Your edits are still here. Try saving again; if it keeps failing, one of the source files may be damaged.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PagemarkError::AnnotationConversion { .. } | PagemarkError::ImageError(_) => HumanError {
            message: "Part of an annotation couldn't be used.".into(),
            suggestion: "An inserted image may be damaged. Try removing it and inserting it again as PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PagemarkError::FontError(_) => HumanError {
            message: "The chosen font couldn't be loaded.".into(),
            suggestion: "A built-in font will be used instead; some accented letters may be simplified.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PagemarkError::Busy(operation) => HumanError {
            message: format!("Please wait — {operation} is still running."),
            suggestion: "Try again when the current task has finished.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        PagemarkError::UnknownSource(_) => HumanError {
            message: "A page refers to a document that is no longer open.".into(),
            suggestion: "Remove the page or open the document again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagemarkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
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

        PagemarkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
