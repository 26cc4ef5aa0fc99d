//! Runtime error types
//!
//! Every resolution and dispatch routine returns `EvalResult`; the `Err` arm
//! is the language-level error value. Only `MaxRecursion` is fatal.

use crate::ast::Span;
use thiserror::Error;

/// Errors raised while declaring types or running code
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// Invalid or conflicting declaration
    #[error("{message}")]
    Declaration {
        /// Error message
        message: String,
        /// Location of the declaration
        span: Span,
    },

    /// Method, property, operator or type not found, or arity mismatch
    #[error("{message}")]
    Resolution {
        /// Error message
        message: String,
        /// Location of the failing access
        span: Span,
    },

    /// Read of a write-only or write of a read-only member
    #[error("{message}")]
    Access {
        /// Error message
        message: String,
        /// Location of the failing access
        span: Span,
    },

    /// Circular reference, missing body, abstract instantiation
    #[error("{message}")]
    Semantic {
        /// Error message
        message: String,
        /// Location of the failing access
        span: Span,
    },

    /// General evaluation failure (type mismatch, division by zero, range)
    #[error("{message}")]
    Runtime {
        /// Error message
        message: String,
        /// Location of the failing expression
        span: Span,
    },

    /// Call stack exceeded the configured depth
    #[error("maximum recursion depth exceeded ({depth})")]
    MaxRecursion {
        /// Configured depth limit
        depth: usize,
        /// Location of the call that tripped the guard
        span: Span,
    },
}

/// Result of evaluating anything in the engine
pub type EvalResult<T = crate::runtime::Value> = Result<T, RuntimeError>;

impl RuntimeError {
    /// Declaration error
    pub fn declaration(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::Declaration {
            message: message.into(),
            span,
        }
    }

    /// Resolution error
    pub fn resolution(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::Resolution {
            message: message.into(),
            span,
        }
    }

    /// Access-control error
    pub fn access(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::Access {
            message: message.into(),
            span,
        }
    }

    /// Semantic-guard error
    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::Semantic {
            message: message.into(),
            span,
        }
    }

    /// General runtime error
    pub fn runtime(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::Runtime {
            message: message.into(),
            span,
        }
    }

    /// Whether evaluation must abort rather than continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::MaxRecursion { .. })
    }

    /// Source location of the error
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::Declaration { span, .. }
            | RuntimeError::Resolution { span, .. }
            | RuntimeError::Access { span, .. }
            | RuntimeError::Semantic { span, .. }
            | RuntimeError::Runtime { span, .. }
            | RuntimeError::MaxRecursion { span, .. } => *span,
        }
    }

    /// Attach a location if the error does not carry one yet
    pub fn with_span(mut self, at: Span) -> Self {
        match &mut self {
            RuntimeError::Declaration { span, .. }
            | RuntimeError::Resolution { span, .. }
            | RuntimeError::Access { span, .. }
            | RuntimeError::Semantic { span, .. }
            | RuntimeError::Runtime { span, .. }
            | RuntimeError::MaxRecursion { span, .. } => {
                if !span.is_known() {
                    *span = at;
                }
            }
        }
        self
    }

    /// Human-readable message including the location when known
    pub fn describe(&self) -> String {
        let span = self.span();
        if span.is_known() {
            format!("{} [line: {}, column: {}]", self, span.line, span.column)
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_recursion_is_fatal() {
        let err = RuntimeError::MaxRecursion {
            depth: 8,
            span: Span::default(),
        };
        assert!(err.is_fatal());
        assert!(!RuntimeError::access("property 'X' is read-only", Span::default()).is_fatal());
    }

    #[test]
    fn test_with_span_keeps_known_location() {
        let err = RuntimeError::resolution("nope", Span::new(3, 4)).with_span(Span::new(9, 9));
        assert_eq!(err.span(), Span::new(3, 4));

        let err = RuntimeError::resolution("nope", Span::default()).with_span(Span::new(9, 1));
        assert_eq!(err.span(), Span::new(9, 1));
    }

    #[test]
    fn test_describe_includes_position() {
        let err = RuntimeError::semantic("circular property reference detected: A", Span::new(2, 5));
        assert_eq!(
            err.describe(),
            "circular property reference detected: A [line: 2, column: 5]"
        );
    }
}
