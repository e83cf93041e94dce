use core::fmt;
use std::collections::VecDeque;

use crate::operator::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalOp {
  Call(Operator),
  Push(i32),
  Pop(i32),
}

impl fmt::Display for JournalOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.alternate() {
      match self {
        Self::Call(op) => write!(f, "call({op})"),
        Self::Push(value) => write!(f, "push({value})"),
        Self::Pop(value) => write!(f, "pop({value})"),
      }
    } else {
      match self {
        Self::Call(op) => write!(f, "{op}"),
        Self::Push(value) | Self::Pop(value) => write!(f, "{value}"),
      }
    }
  }
}

/// The ops caused by executing a single token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JournalEntry {
  pub ops: Vec<JournalOp>,
}

impl fmt::Display for JournalEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    core::iter::once("")
      .chain(core::iter::repeat(", "))
      .zip(self.ops.iter())
      .try_for_each(|(sep, op)| {
        if f.alternate() {
          write!(f, "{sep}{op:#}")
        } else {
          write!(f, "{sep}{op}")
        }
      })
  }
}

/// A history of stack activity, one [`JournalEntry`] per committed token.
///
/// With a size set, only the most recent `size` entries are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Journal {
  ops: Vec<JournalOp>,
  entries: VecDeque<JournalEntry>,
  size: Option<usize>,
}

impl Journal {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn with_size(mut self, size: usize) -> Self {
    self.size = Some(size);
    self
  }

  /// Records an op in the pending entry.
  #[inline]
  pub fn op(&mut self, op: JournalOp) {
    self.ops.push(op);
  }

  /// Closes the pending entry. Does nothing if no ops were recorded.
  pub fn commit(&mut self) {
    if self.ops.is_empty() {
      return;
    }

    self.entries.push_back(JournalEntry {
      ops: core::mem::take(&mut self.ops),
    });

    if let Some(size) = self.size {
      while self.entries.len() > size {
        self.entries.pop_front();
      }
    }
  }

  /// Returns the committed entries, oldest first.
  #[inline]
  pub fn entries(&self) -> impl DoubleEndedIterator<Item = &JournalEntry> {
    self.entries.iter()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Display for Journal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use yansi::Paint;

    if !self.entries.is_empty() {
      writeln!(f, "Stack History (most recent first):")?;
    }

    for entry in self.entries.iter().rev() {
      write!(f, " *")?;

      for op in entry.ops.iter() {
        if f.alternate() {
          match op {
            JournalOp::Call(_) => write!(f, " {}", op.yellow())?,
            JournalOp::Push(_) => write!(f, " {}", op.green())?,
            JournalOp::Pop(_) => write!(f, " {}", op.red())?,
          }
        } else {
          write!(f, " {op}")?;
        }
      }

      writeln!(f)?;
    }

    Ok(())
  }
}
