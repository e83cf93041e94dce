use core::fmt;
use std::{
  io::{self, prelude::Write},
  sync::mpsc::{self, RecvTimeoutError},
  thread,
  time::Duration,
};

use codespan_reporting::{
  diagnostic::{Diagnostic, Label},
  files::SimpleFile,
  term::{
    self,
    termcolor::{ColorChoice, StandardStream},
  },
};
use crossterm::{
  cursor::MoveTo,
  terminal::{self, ClearType},
  QueueableCommand,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use turing_core::prelude::*;

/// The program the machine runs when none is given.
pub const DEMO_PROGRAM: &str = "5 6 10 DUP POP - 10 123 +";

/// A successful run: the final value and the machine it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
  pub value: i32,
  pub context: Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Ok,
  Failed,
  Cancelled,
}

impl Status {
  pub const fn exit_code(self) -> i32 {
    match self {
      Self::Ok => 0,
      Self::Failed => 1,
      Self::Cancelled => 2,
    }
  }
}

/// Runs evaluations on a worker thread and reports their outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Host {
  /// Cancel the worker once it has run this long.
  pub timeout: Option<Duration>,
  pub journal: bool,
  pub json: bool,
}

impl Host {
  pub fn evaluate(&self, source: Source) -> Result<Evaluation, RunError> {
    let cancel = CancelToken::new();
    let engine = Engine::new().with_cancel(cancel.clone());
    let context = if self.journal {
      Context::new().with_journal(None)
    } else {
      Context::new()
    };

    let (done_tx, done_rx) = mpsc::channel::<()>();
    debug!(source = source.name(), "starting evaluation worker");
    let worker = thread::spawn(move || {
      let result = engine.run(context, &source).and_then(|mut context| {
        match context.result() {
          Ok(value) => Ok(Evaluation { value, context }),
          Err(reason) => Err(RunError::new(reason, None, &source, context)),
        }
      });
      // The receiver is gone once the host stops waiting.
      let _ = done_tx.send(());
      result
    });

    if let Some(timeout) = self.timeout {
      if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(timeout) {
        warn!(?timeout, "evaluation timed out, cancelling");
        cancel.cancel();
      }
    }

    match worker.join() {
      Ok(result) => {
        debug!("evaluation worker finished");
        result
      }
      Err(panic) => std::panic::resume_unwind(panic),
    }
  }

  /// Prints the outcome of [`evaluate`](Self::evaluate) and returns its
  /// [`Status`].
  pub fn report(&self, result: &Result<Evaluation, RunError>) -> Status {
    let status = match result {
      Ok(evaluation) => {
        info!(value = evaluation.value, "final value");
        Status::Ok
      }
      Err(err) if err.reason.is_cancelled() => Status::Cancelled,
      Err(err) => {
        debug!(reason = ?err.reason, span = ?err.span, "evaluation failed");
        Status::Failed
      }
    };

    if self.json {
      println!("{}", ok_or_exit(serde_json::to_string(&Report::from(result))));
    } else {
      match result {
        Ok(evaluation) => println!("{}", evaluation.value),
        Err(err) => {
          ok_or_exit(emit_diagnostic(err));
        }
      }
    }

    if self.journal {
      let context = match result {
        Ok(evaluation) => &evaluation.context,
        Err(err) => &err.context,
      };

      if let Some(journal) = context.journal() {
        eprint!("{journal:#}");
      }
    }

    status
  }
}

/// The machine-readable form of an outcome, printed with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report<'a> {
  Ok {
    value: i32,
    stack: &'a [i32],
  },
  Error {
    error: &'a EvalError,
    span: Option<Span>,
    stack: &'a [i32],
  },
  Cancelled {
    span: Option<Span>,
    stack: &'a [i32],
  },
}

impl<'a> From<&'a Result<Evaluation, RunError>> for Report<'a> {
  fn from(value: &'a Result<Evaluation, RunError>) -> Self {
    match value {
      Ok(evaluation) => Self::Ok {
        value: evaluation.value,
        stack: evaluation.context.stack(),
      },
      Err(err) if err.reason.is_cancelled() => Self::Cancelled {
        span: err.span,
        stack: err.context.stack(),
      },
      Err(err) => Self::Error {
        error: &err.reason,
        span: err.span,
        stack: err.context.stack(),
      },
    }
  }
}

/// Renders a [`RunError`] as a diagnostic pointing at the failing token.
pub fn emit_diagnostic(
  err: &RunError,
) -> Result<(), codespan_reporting::files::Error> {
  let file = SimpleFile::new(err.source.name(), err.source.text());

  let mut diagnostic = Diagnostic::error()
    .with_message(err.reason.to_string())
    .with_notes(vec![format!("stack: {}", StackDisplay(err.context.stack()))]);
  if let Some(span) = err.span {
    diagnostic = diagnostic.with_labels(vec![
      Label::primary((), span.to_range()).with_message(label(&err.reason)),
    ]);
  }

  let writer = StandardStream::stderr(ColorChoice::Auto);
  let config = term::Config::default();
  let result = term::emit(&mut writer.lock(), &config, &file, &diagnostic);
  result
}

fn label(reason: &EvalError) -> String {
  match reason {
    EvalError::InvalidToken(_) => "not an operator or an integer".into(),
    EvalError::EmptyStack => "needs one value".into(),
    EvalError::InsufficientOperands => "needs two values".into(),
    EvalError::OutOfRange(value) => format!(
      "produced {value}, outside {}..{}",
      VALID_RANGE.start, VALID_RANGE.end
    ),
    EvalError::Cancelled => "stopped before this token".into(),
    EvalError::EmptyResult => "nothing left".into(),
  }
}

struct StackDisplay<'a>(&'a [i32]);

impl fmt::Display for StackDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;

    core::iter::once("")
      .chain(core::iter::repeat(" "))
      .zip(self.0)
      .try_for_each(|(sep, x)| write!(f, "{sep}{x}"))?;

    write!(f, "]")
  }
}

/// Unwraps a host-side result, or prints the error and exits with the
/// [`Status::Failed`] code.
pub fn ok_or_exit<T>(result: Result<T, impl fmt::Display>) -> T {
  result.unwrap_or_else(|err| {
    eprintln!("error: {err}");
    std::process::exit(Status::Failed.exit_code())
  })
}

/// Clears the terminal before a watched file is re-run.
pub fn clear_screen() -> io::Result<()> {
  io::stdout()
    .queue(terminal::Clear(ClearType::All))?
    .queue(MoveTo(0, 0))?
    .flush()
}
