use crate::{
  error::EvalError,
  journal::{Journal, JournalOp},
};

/// The mutable state of one evaluation: the value stack and, optionally, a
/// [`Journal`] of everything that happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
  stack: Vec<i32>,
  journal: Option<Journal>,
}

impl Context {
  #[inline]
  pub fn new() -> Self {
    Self {
      stack: Vec::new(),
      journal: None,
    }
  }

  #[inline]
  pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
    self.stack = Vec::with_capacity(capacity);
    self
  }

  #[inline]
  pub fn with_journal(mut self, size: Option<usize>) -> Self {
    self.journal = Some(
      size
        .map(|size| Journal::new().with_size(size))
        .unwrap_or_default(),
    );
    self
  }

  #[inline]
  pub fn stack(&self) -> &[i32] {
    &self.stack
  }

  #[inline]
  pub fn journal(&self) -> Option<&Journal> {
    self.journal.as_ref()
  }

  #[inline]
  pub fn journal_mut(&mut self) -> Option<&mut Journal> {
    self.journal.as_mut()
  }

  pub fn stack_push(&mut self, value: i32) {
    if let Some(journal) = self.journal_mut() {
      journal.op(JournalOp::Push(value));
    }

    self.stack.push(value);
  }

  pub fn stack_pop(&mut self) -> Result<i32, EvalError> {
    let value = self.stack.pop().ok_or(EvalError::EmptyStack)?;

    if let Some(journal) = self.journal_mut() {
      journal.op(JournalOp::Pop(value));
    }

    Ok(value)
  }

  /// Takes the final value of an evaluation off the stack.
  ///
  /// Only the top value is taken. Anything left beneath it is ignored.
  pub fn result(&mut self) -> Result<i32, EvalError> {
    let value = self.stack_pop().map_err(|_| EvalError::EmptyResult)?;

    if let Some(journal) = self.journal_mut() {
      journal.commit();
    }

    Ok(value)
  }
}
