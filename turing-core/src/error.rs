use core::fmt;

use compact_str::CompactString;
use serde::Serialize;

use crate::{context::Context, lexer::Span, source::Source};

/// Why an evaluation stopped without producing a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(tag = "error", content = "value", rename_all = "snake_case")]
pub enum EvalError {
  /// The token is neither an operator name nor a base-10 integer.
  #[error("invalid token '{0}'")]
  InvalidToken(CompactString),
  #[error("stack is empty")]
  EmptyStack,
  #[error("not enough operands on the stack")]
  InsufficientOperands,
  /// A computed value fell outside `[0, 1048576)`.
  #[error("value {0} is out of range")]
  OutOfRange(i32),
  #[error("no value left on the stack")]
  EmptyResult,
  #[error("evaluation cancelled")]
  Cancelled,
}

impl EvalError {
  #[inline]
  pub const fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }
}

/// An [`EvalError`] together with where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct RunError {
  pub reason: EvalError,
  /// The token being executed, or [`None`] when the tokens ran out.
  pub span: Option<Span>,
  pub source: Source,
  /// The state of the machine when it stopped.
  pub context: Context,
}

impl RunError {
  #[inline]
  pub fn new(
    reason: EvalError,
    span: Option<Span>,
    source: &Source,
    context: Context,
  ) -> Self {
    Self {
      reason,
      span,
      source: source.clone(),
      context,
    }
  }
}

impl std::error::Error for RunError {}

impl fmt::Display for RunError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.reason)?;

    match self.span.and_then(|span| self.source.location(span.start)) {
      Some(location) => write!(f, " at {}:{}", self.source.name(), location),
      None => write!(f, " in {}", self.source.name()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_points_at_token() {
    let source = Source::new("input", "5\n  abc");
    let error = RunError::new(
      EvalError::InvalidToken("abc".into()),
      Some(Span { start: 4, end: 7 }),
      &source,
      Context::new(),
    );

    assert_eq!(error.to_string(), "invalid token 'abc' at input:2:3");
  }

  #[test]
  fn display_without_span() {
    let source = Source::new("input", "");
    let error =
      RunError::new(EvalError::EmptyResult, None, &source, Context::new());

    assert_eq!(error.to_string(), "no value left on the stack in input");
  }
}
