//! Parse error type.

use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{Span, TokenKind};

/// A syntax error with its code and location.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// Label text for the primary span.
    pub context: Option<String>,
    /// Span of a related opener, for unclosed delimiters.
    pub related: Option<Span>,
}

impl ParseError {
    #[cold]
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
            context: None,
            related: None,
        }
    }

    #[cold]
    pub fn expected_expression(found: &TokenKind, span: Span) -> Self {
        ParseError::new(
            ErrorCode::ExpectedExpression,
            format!("expected expression, found `{}`", found.display_name()),
            span,
        )
        .with_context("expected expression here")
    }

    #[cold]
    pub fn unclosed(open: Span, found: &TokenKind, at: Span, delimiter: char) -> Self {
        let close = match delimiter {
            '(' => ')',
            '[' => ']',
            _ => '}',
        };
        ParseError {
            code: ErrorCode::UnclosedDelimiter,
            message: format!(
                "unclosed delimiter `{delimiter}`: expected `{close}`, found `{}`",
                found.display_name()
            ),
            span: at,
            context: Some(format!("expected `{close}`")),
            related: Some(open),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code)
            .with_message(&self.message)
            .with_label(self.span, self.context.as_deref().unwrap_or("here"));
        if let Some(open) = self.related {
            diag = diag.with_secondary_label(open, "opened here");
        }
        diag
    }
}
