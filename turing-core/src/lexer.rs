use core::{iter::FusedIterator, ops::Range};

use serde::Serialize;

use crate::source::Source;

/// A whitespace-delimited word of a [`Source`].
///
/// Tokens are not classified here. Whether a token is an operator or a
/// literal is decided by the engine when the token is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
  pub span: Span,
}

impl Token {
  /// Returns the text of this [`Token`] within `source`.
  #[inline]
  pub fn text<'a>(&self, source: &'a Source) -> &'a str {
    source.slice(self.span).unwrap_or_default()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
  /// The lower byte bound (inclusive).
  pub start: usize,
  /// The upper byte bound (exclusive).
  pub end: usize,
}

impl Span {
  /// Returns the <code>[Range]\<[usize]\></code> of this [`Span`].
  #[inline]
  pub const fn to_range(self) -> Range<usize> {
    Range {
      start: self.start,
      end: self.end,
    }
  }
}

/// Splits a [`Source`] into a stream of [`Token`]s.
///
/// Any run of Unicode whitespace separates two tokens, so empty tokens are
/// never produced. Once exhausted it keeps returning [`None`].
#[derive(Debug, Clone)]
pub struct Lexer {
  source: Source,
  cursor: usize,
}

impl Lexer {
  /// Creates a [`Lexer`] from a [`Source`].
  pub fn new(source: Source) -> Self {
    Self {
      // Skip the UTF-8 BOM, if present.
      cursor: if source.text().starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
      } else {
        0
      },
      source,
    }
  }
}

impl Iterator for Lexer {
  type Item = Token;

  fn next(&mut self) -> Option<Self::Item> {
    let text = self.source.text();

    let Some(offset) = text[self.cursor..].find(|c: char| !c.is_whitespace())
    else {
      self.cursor = text.len();
      return None;
    };

    let start = self.cursor + offset;
    let end = text[start..]
      .find(char::is_whitespace)
      .map_or(text.len(), |len| start + len);
    self.cursor = end;

    Some(Token {
      span: Span { start, end },
    })
  }
}

impl FusedIterator for Lexer {}
