//! A minimal stack machine.
//!
//! A program is a whitespace-separated list of integer literals and operator
//! names (`POP`, `DUP`, `+`, `-`). Tokens run left to right against a single
//! integer stack and the value left on top is the result.
//!
//! ```
//! assert_eq!(turing_core::evaluate("5 6 10 DUP POP - 10 123 +"), Ok(133));
//! ```

pub mod cancel;
pub mod context;
pub mod engine;
pub mod error;
pub mod journal;
pub mod lexer;
pub mod operator;
pub mod source;

pub mod prelude {
  //! Re-exports commonly used items.

  use super::*;

  pub use cancel::CancelToken;
  pub use context::Context;
  pub use engine::Engine;
  pub use error::{EvalError, RunError};
  pub use journal::{Journal, JournalEntry, JournalOp};
  pub use lexer::{Lexer, Span, Token};
  pub use operator::{validate, Operator, VALID_RANGE};
  pub use source::{Location, Source};
}

use prelude::*;

/// Evaluates `input` on a fresh stack and returns the value left on top.
pub fn evaluate(input: &str) -> Result<i32, EvalError> {
  Engine::new()
    .evaluate(&Source::new("input", input))
    .map_err(|err| err.reason)
}
