// See the file footer for the licence text.

use core::{fmt, num::NonZeroUsize};
use std::{fs, io, path::Path, sync::Arc};

use unicode_segmentation::UnicodeSegmentation;

use crate::lexer::Span;

/// Named program text.
///
/// The contents live behind an [`Arc`], so cloning a [`Source`] is cheap and
/// the same program can be handed to a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source(Arc<SourceInner>);

#[derive(Debug, PartialEq, Eq)]
struct SourceInner {
  name: String,
  text: String,
  line_starts: Vec<usize>,
}

impl Source {
  /// Creates a new [`Source`].
  pub fn new<N, S>(name: N, text: S) -> Self
  where
    N: Into<String>,
    S: Into<String>,
  {
    let text = text.into();
    let line_starts = core::iter::once(0)
      .chain(text.match_indices('\n').map(|(i, _)| i + 1))
      .collect();

    Self(Arc::new(SourceInner {
      name: name.into(),
      text,
      line_starts,
    }))
  }

  /// Creates a new [`Source`] named after, and read from, a file path.
  pub fn from_path<P>(path: P) -> io::Result<Self>
  where
    P: AsRef<Path>,
  {
    let text = fs::read_to_string(&path)?;
    let name = path.as_ref().to_string_lossy().into_owned();

    Ok(Self::new(name, text))
  }

  #[inline]
  #[must_use]
  pub fn name(&self) -> &str {
    &self.0.name
  }

  #[inline]
  #[must_use]
  pub fn text(&self) -> &str {
    &self.0.text
  }

  /// Returns the text covered by a [`Span`], or [`None`] if the span does not
  /// fall on UTF-8 boundaries inside this source.
  #[inline]
  #[must_use]
  pub fn slice(&self, span: Span) -> Option<&str> {
    self.0.text.get(span.to_range())
  }

  /// Returns the human-readable [`Location`] of a byte index.
  ///
  /// [`None`] is returned when `index` is out-of-bounds or splits a UTF-8
  /// sequence. Columns count grapheme clusters, not bytes.
  #[must_use]
  pub fn location(&self, index: usize) -> Option<Location> {
    if index > self.0.text.len() {
      return None;
    }

    let line = match self.0.line_starts.binary_search(&index) {
      Ok(line) => line,
      Err(line) => line - 1,
    };
    let line_start = self.0.line_starts[line];
    let column = self
      .0
      .text
      .get(line_start..index)?
      .graphemes(true)
      .count();

    Some(Location {
      line: NonZeroUsize::new(line + 1)?,
      column: NonZeroUsize::new(column + 1)?,
    })
  }
}

/// A line and column in a [`Source`], both starting at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
  pub line: NonZeroUsize,
  pub column: NonZeroUsize,
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}


// SPDX: 0BSD
//
// Copyright (C) Leon Davis <leonskidev@pm.me>
// Copyright (C) Shane Vandegrift <vandesm14@gmail.com>
//
// Permission to use, copy, modify, and/or distribute this software for any
// purpose with or without fee is hereby granted.
//
// THE SOFTWARE IS PROVIDED ‚ÄúAS IS‚Äù AND THE AUTHOR DISCLAIMS ALL WARRANTIES WITH
// REGARD TO THIS SOFTWARE INCLUDING ALL IMPLIED WARRANTIES OF MERCHANTABILITY
// AND FITNESS. IN NO EVENT SHALL THE AUTHOR BE LIABLE FOR ANY SPECIAL, DIRECT,
// INDIRECT, OR CONSEQUENTIAL DAMAGES OR ANY DAMAGES WHATSOEVER RESULTING FROM
// LOSS OF USE, DATA OR PROFITS, WHETHER IN AN ACTION OF CONTRACT, NEGLIGENCE OR
// OTHER TORTIOUS ACTION, ARISING OUT OF OR IN CONNECTION WITH THE USE OR
// PERFORMANCE OF THIS SOFTWARE.
