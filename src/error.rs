//! Shared error utilities used across the compilation pipeline.
//!
//! One variant per pipeline stage: lexical, syntax, semantic. The first
//! error aborts the whole compilation – there is no recovery and no
//! multi-error reporting, so a single diagnostic is all we ever carry.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("{line}:{column}: lexical error: unrecognized character '{ch}'"))]
  Lexical { ch: char, line: usize, column: usize },

  #[snafu(display("{line}:{column}: syntax error: {message}"))]
  Syntax {
    message: String,
    line: usize,
    column: usize,
  },

  #[snafu(display("semantic error: {message}"))]
  Semantic { message: String },
}

impl CompileError {
  /// Lexical error anchored at a byte offset in the source.
  pub fn lexical(source: &str, loc: usize, ch: char) -> Self {
    let (line, column) = line_column(source, loc);
    Self::Lexical { ch, line, column }
  }

  /// Syntax error anchored at a byte offset in the source.
  pub fn syntax(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (line, column) = line_column(source, loc);
    Self::Syntax {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn semantic(message: impl Into<String>) -> Self {
    Self::Semantic {
      message: message.into(),
    }
  }
}

/// Convert a byte offset into a 1-based line:column pair.
fn line_column(source: &str, loc: usize) -> (usize, usize) {
  let safe_loc = loc.min(source.len());
  let mut line = 1;
  let mut column = 1;
  for ch in source[..safe_loc].chars() {
    if ch == '\n' {
      line += 1;
      column = 1;
    } else {
      column += 1;
    }
  }
  (line, column)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offsets_map_to_lines_and_columns() {
    let source = "let x = 5;\nexit(x);\n";
    assert_eq!(line_column(source, 0), (1, 1));
    assert_eq!(line_column(source, 4), (1, 5));
    assert_eq!(line_column(source, 11), (2, 1));
  }

  #[test]
  fn offset_past_end_is_clamped() {
    assert_eq!(line_column("x", 100), (1, 2));
  }
}
