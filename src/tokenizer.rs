//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond classifying characters. Multi-character operators are matched
//! before single-character ones to avoid ambiguity, keywords are resolved
//! from a fixed table, and `#` comments plus whitespace are discarded
//! without producing tokens.

use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  // Keywords.
  Exit,
  Print,
  Let,
  Set,
  If,
  Elif,
  Else,
  While,
  For,
  Fun,
  // Payload-carrying tokens; the text is recovered with `token_text`.
  Ident,
  IntLit,
  // Punctuation.
  OpenParen,
  CloseParen,
  OpenBrace,
  CloseBrace,
  Semi,
  // Operators.
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  EqEq,
  NotEq,
  Lt,
  Gt,
  LtEq,
  GtEq,
  // Reserved triple forms; lexed whole, rejected by the parser.
  TriplePlus,
  TripleMinus,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone, Copy)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

/// Resolve an alphanumeric run against the keyword table.
fn keyword_or_ident(word: &str) -> TokenKind {
  match word {
    "exit" => TokenKind::Exit,
    "print" => TokenKind::Print,
    "let" => TokenKind::Let,
    "set" => TokenKind::Set,
    "if" => TokenKind::If,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    _ => TokenKind::Ident,
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];

    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    // Line comment: consume through end-of-line, produce nothing.
    if c == b'#' {
      while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
      }
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let kind = keyword_or_ident(&input[start..i]);
      tokens.push(Token::new(kind, start, i - start));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::IntLit, start, i - start));
      continue;
    }

    // Triple forms need two characters of lookahead.
    if let Some((kind, text)) = [
      (TokenKind::TriplePlus, "+++"),
      (TokenKind::TripleMinus, "---"),
    ]
    .into_iter()
    .find(|(_, text)| input[i..].starts_with(text))
    {
      tokens.push(Token::new(kind, i, text.len()));
      i += text.len();
      continue;
    }

    // Two-character operators before their one-character counterparts.
    if let Some((kind, text)) = [
      (TokenKind::EqEq, "=="),
      (TokenKind::NotEq, "!="),
      (TokenKind::LtEq, "<="),
      (TokenKind::GtEq, ">="),
    ]
    .into_iter()
    .find(|(_, text)| input[i..].starts_with(text))
    {
      tokens.push(Token::new(kind, i, text.len()));
      i += text.len();
      continue;
    }

    let single = match c {
      b'(' => Some(TokenKind::OpenParen),
      b')' => Some(TokenKind::CloseParen),
      b'{' => Some(TokenKind::OpenBrace),
      b'}' => Some(TokenKind::CloseBrace),
      b';' => Some(TokenKind::Semi),
      b'=' => Some(TokenKind::Assign),
      b'+' => Some(TokenKind::Plus),
      b'-' => Some(TokenKind::Minus),
      b'*' => Some(TokenKind::Star),
      b'/' => Some(TokenKind::Slash),
      b'<' => Some(TokenKind::Lt),
      b'>' => Some(TokenKind::Gt),
      _ => None,
    };
    if let Some(kind) = single {
      tokens.push(Token::new(kind, i, 1));
      i += 1;
      continue;
    }

    // A bare `!` has no single-character meaning, so it lands here too.
    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lexical(input, i, invalid_char));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  debug!(count = tokens.len(), "tokenized");
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
