//! Diagnostics as data.
//!
//! Passes accumulate `Diagnostic` values into a sink vector; nothing in the
//! front-end raises user-facing findings as errors or panics. Rendering
//! (colors, source excerpts) is a consumer concern.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

/// A related location attached to a primary diagnostic, e.g. "first
/// declaration here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub file: String,
    pub span: Span,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub span: Span,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn with_related(mut self, file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            file: file.into(),
            span,
            message_text: message.into(),
        });
        self
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
