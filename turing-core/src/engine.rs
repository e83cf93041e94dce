use core::str::FromStr;
use std::time::{Duration, Instant};

use crate::{
  cancel::CancelToken,
  context::Context,
  error::{EvalError, RunError},
  journal::JournalOp,
  lexer::Lexer,
  operator::Operator,
  source::Source,
};

/// Runs programs against a [`Context`].
///
/// An engine holds no evaluation state of its own, so one engine can run any
/// number of programs, each against its own stack.
#[derive(Debug, Clone, Default)]
pub struct Engine {
  cancel: Option<CancelToken>,
  timeout: Option<Duration>,
}

impl Engine {
  #[inline]
  pub fn new() -> Self {
    Self {
      cancel: None,
      timeout: None,
    }
  }

  /// Stops runs with [`EvalError::Cancelled`] once `cancel` is cancelled.
  #[inline]
  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = Some(cancel);
    self
  }

  /// Stops runs with [`EvalError::Cancelled`] once they have taken longer
  /// than `timeout`.
  #[inline]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Executes every token of `source` in order.
  ///
  /// Cancellation is checked before each token, so a cancelled run stops
  /// within one token. On failure the returned [`RunError`] holds the
  /// context as it was when the failing token stopped.
  pub fn run(
    &self,
    mut context: Context,
    source: &Source,
  ) -> Result<Context, RunError> {
    let deadline = self
      .timeout
      .and_then(|timeout| Instant::now().checked_add(timeout));

    for token in Lexer::new(source.clone()) {
      if self.is_cancelled(deadline) {
        return Err(RunError::new(
          EvalError::Cancelled,
          Some(token.span),
          source,
          context,
        ));
      }

      let result = self.run_token(&mut context, token.text(source));
      if let Some(journal) = context.journal_mut() {
        journal.commit();
      }

      if let Err(reason) = result {
        return Err(RunError::new(reason, Some(token.span), source, context));
      }
    }

    Ok(context)
  }

  /// Runs `source` on a fresh [`Context`] and returns its final value.
  pub fn evaluate(&self, source: &Source) -> Result<i32, RunError> {
    let mut context = self.run(Context::new(), source)?;

    match context.result() {
      Ok(value) => Ok(value),
      Err(reason) => Err(RunError::new(reason, None, source, context)),
    }
  }

  /// Operator names win over literals, so a token is only parsed as an
  /// integer when no operator has its name.
  fn run_token(
    &self,
    context: &mut Context,
    token: &str,
  ) -> Result<(), EvalError> {
    if let Ok(operator) = Operator::from_str(token) {
      if let Some(journal) = context.journal_mut() {
        journal.op(JournalOp::Call(operator));
      }

      operator.run(context)
    } else {
      let value = token
        .parse::<i32>()
        .map_err(|_| EvalError::InvalidToken(token.into()))?;
      context.stack_push(value);

      Ok(())
    }
  }

  fn is_cancelled(&self, deadline: Option<Instant>) -> bool {
    self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
      || deadline.is_some_and(|deadline| Instant::now() >= deadline)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::prelude::*;

  #[test]
  fn runs_worked_example() {
    let source = Source::new("", "5 6 10 DUP POP - 10 123 +");

    let engine = Engine::new();
    let context = engine.run(Context::new(), &source).unwrap();

    assert_eq!(context.stack(), &[1, 133]);
  }

  #[test]
  fn tokens_run_in_order() {
    let source = Source::new("", "POP abc");

    let engine = Engine::new();
    assert_eq!(
      engine.run(Context::new(), &source).map_err(|err| err.reason),
      Err(EvalError::EmptyStack)
    );
  }

  #[test]
  fn error_keeps_context_and_span() {
    let source = Source::new("", "7 8 abc 9");

    let engine = Engine::new();
    let err = engine.run(Context::new(), &source).unwrap_err();

    assert_eq!(err.reason, EvalError::InvalidToken("abc".into()));
    assert_eq!(err.span, Some(Span { start: 4, end: 7 }));
    assert_eq!(err.context.stack(), &[7, 8]);
  }

  #[test]
  fn empty_result_has_no_span() {
    let source = Source::new("", "5 POP");

    let err = Engine::new().evaluate(&source).unwrap_err();

    assert_eq!(err.reason, EvalError::EmptyResult);
    assert_eq!(err.span, None);
  }

  #[test]
  fn cancelled_before_first_token() {
    let source = Source::new("", "1 2 +");
    let cancel = CancelToken::new();
    cancel.cancel();

    let engine = Engine::new().with_cancel(cancel);
    let err = engine.run(Context::new(), &source).unwrap_err();

    assert!(err.reason.is_cancelled());
    assert_eq!(err.span, Some(Span { start: 0, end: 1 }));
    assert!(err.context.stack().is_empty());
  }

  #[test]
  fn cancelled_run_keeps_earlier_tokens() {
    let cancel = CancelToken::new();
    let context = Engine::new()
      .run(Context::new(), &Source::new("", "4 5 DUP"))
      .unwrap();

    cancel.cancel();
    let rest = Source::new("", "+ 100 +");
    let err = Engine::new()
      .with_cancel(cancel)
      .run(context, &rest)
      .unwrap_err();

    assert!(err.reason.is_cancelled());
    assert_eq!(err.span, Some(Span { start: 0, end: 1 }));
    assert_eq!(err.context.stack(), &[4, 10]);
  }

  #[test]
  fn cancelled_midway_from_another_thread() {
    let text = core::iter::repeat("1 POP")
      .take(1_000_000)
      .collect::<Vec<_>>()
      .join(" ");
    let source = Source::new("", text);
    let cancel = CancelToken::new();

    let canceller = {
      let cancel = cancel.clone();
      std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(1));
        cancel.cancel();
      })
    };
    let err = Engine::new()
      .with_cancel(cancel)
      .run(Context::new(), &source)
      .unwrap_err();
    canceller.join().unwrap();

    assert!(err.reason.is_cancelled());
    let span = err.span.unwrap();
    // Every token before the span ran, and the one at it did not.
    match source.slice(span) {
      Some("1") => assert!(err.context.stack().is_empty()),
      Some("POP") => assert_eq!(err.context.stack(), &[1]),
      other => panic!("cancelled at unexpected token {other:?}"),
    }
  }

  #[test]
  fn uncancelled_token_runs_to_completion() {
    let source = Source::new("", "1 2 +");

    let engine = Engine::new().with_cancel(CancelToken::new());
    assert_eq!(engine.evaluate(&source).map_err(|err| err.reason), Ok(3));
  }

  #[test]
  fn zero_timeout_cancels() {
    let source = Source::new("", "1");

    let engine = Engine::new().with_timeout(Duration::ZERO);
    assert_eq!(
      engine.evaluate(&source).map_err(|err| err.reason),
      Err(EvalError::Cancelled)
    );
  }

  #[test]
  fn journal_records_each_token() {
    let source = Source::new("", "10 DUP POP");

    let engine = Engine::new();
    let context = engine
      .run(Context::new().with_journal(None), &source)
      .unwrap();
    let journal = context.journal().unwrap();

    assert_eq!(
      journal.entries().map(|e| e.ops.clone()).collect::<Vec<_>>(),
      vec![
        vec![JournalOp::Push(10)],
        vec![
          JournalOp::Call(Operator::Dup),
          JournalOp::Pop(10),
          JournalOp::Push(20)
        ],
        vec![JournalOp::Call(Operator::Pop), JournalOp::Pop(20)],
      ]
    );
  }

  #[test]
  fn engine_is_reusable() {
    let engine = Engine::new();
    let first = engine.evaluate(&Source::new("", "1 2 +")).unwrap();
    let second = engine.evaluate(&Source::new("", "4")).unwrap();

    assert_eq!((first, second), (3, 4));
  }
}
