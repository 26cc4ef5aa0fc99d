//! Call stack with recursion guard
//!
//! Every invocation that runs a body (method, property accessor, helper,
//! global function) pushes a frame first. Pushing past the limit fails with
//! the fatal `MaxRecursion` error instead of exhausting the host stack.

use crate::ast::Span;
use crate::runtime::error::{EvalResult, RuntimeError};

/// One active invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Qualified name, e.g. `TPoint.Move`
    pub name: String,
    /// Call site
    pub span: Span,
}

/// Stack of active invocations
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl CallStack {
    /// Create a stack that allows `max_depth` nested frames
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing when the depth limit is reached
    pub fn push(&mut self, name: impl Into<String>, span: Span) -> EvalResult<()> {
        if self.frames.len() >= self.max_depth {
            let name = name.into();
            tracing::debug!(depth = self.max_depth, frame = %name, "recursion guard tripped");
            return Err(RuntimeError::MaxRecursion {
                depth: self.max_depth,
                span,
            });
        }
        self.frames.push(Frame {
            name: name.into(),
            span,
        });
        Ok(())
    }

    /// Pop the innermost frame
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Current depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Configured limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Innermost frame
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Frame names from outermost to innermost
    pub fn trace(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = CallStack::new(4);
        stack.push("TFoo.Bar", Span::default()).unwrap();
        stack.push("TFoo.Baz", Span::default()).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().unwrap().name, "TFoo.Baz");
        assert_eq!(stack.pop().unwrap().name, "TFoo.Baz");
        assert_eq!(stack.trace(), vec!["TFoo.Bar".to_string()]);
    }

    #[test]
    fn test_overflow_is_fatal() {
        let mut stack = CallStack::new(2);
        stack.push("a", Span::default()).unwrap();
        stack.push("b", Span::default()).unwrap();
        let err = stack.push("c", Span::new(7, 1)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.span(), Span::new(7, 1));
        assert_eq!(stack.depth(), 2);
    }
}
