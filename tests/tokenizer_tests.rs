use ogen::tokenizer::{TokenKind, token_text, tokenize};

fn kinds(source: &str) -> Vec<TokenKind> {
  tokenize(source)
    .expect("lexing should succeed")
    .iter()
    .map(|token| token.kind)
    .collect()
}

#[test]
fn lexes_a_full_statement() {
  assert_eq!(
    kinds("let answer = 42;"),
    vec![
      TokenKind::Let,
      TokenKind::Ident,
      TokenKind::Assign,
      TokenKind::IntLit,
      TokenKind::Semi,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn every_keyword_resolves() {
  let table = [
    ("exit", TokenKind::Exit),
    ("print", TokenKind::Print),
    ("let", TokenKind::Let),
    ("set", TokenKind::Set),
    ("if", TokenKind::If),
    ("elif", TokenKind::Elif),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("fun", TokenKind::Fun),
  ];
  for (word, kind) in table {
    assert_eq!(kinds(word), vec![kind, TokenKind::Eof], "keyword {word}");
  }
}

#[test]
fn keywords_are_case_sensitive_and_prefixes_stay_identifiers() {
  assert_eq!(kinds("Exit"), vec![TokenKind::Ident, TokenKind::Eof]);
  assert_eq!(kinds("exits"), vec![TokenKind::Ident, TokenKind::Eof]);
  assert_eq!(kinds("lets"), vec![TokenKind::Ident, TokenKind::Eof]);
}

#[test]
fn identifiers_keep_their_text() {
  let source = "let loop_counter2 = 7;";
  let tokens = tokenize(source).expect("lexing should succeed");
  assert_eq!(tokens[1].kind, TokenKind::Ident);
  assert_eq!(token_text(&tokens[1], source), "loop_counter2");
  assert_eq!(tokens[3].kind, TokenKind::IntLit);
  assert_eq!(token_text(&tokens[3], source), "7");
}

#[test]
fn comments_produce_no_tokens() {
  let source = "# a whole line\nexit(0); # trailing\n# last line";
  assert_eq!(
    kinds(source),
    vec![
      TokenKind::Exit,
      TokenKind::OpenParen,
      TokenKind::IntLit,
      TokenKind::CloseParen,
      TokenKind::Semi,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn braces_and_comparisons_lex_in_source_order() {
  assert_eq!(
    kinds("while (i <= 10) { }"),
    vec![
      TokenKind::While,
      TokenKind::OpenParen,
      TokenKind::Ident,
      TokenKind::LtEq,
      TokenKind::IntLit,
      TokenKind::CloseParen,
      TokenKind::OpenBrace,
      TokenKind::CloseBrace,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn triple_forms_lex_whole() {
  assert_eq!(
    kinds("+ +++ -"),
    vec![
      TokenKind::Plus,
      TokenKind::TriplePlus,
      TokenKind::Minus,
      TokenKind::Eof,
    ]
  );
  assert_eq!(kinds("---"), vec![TokenKind::TripleMinus, TokenKind::Eof]);
}

#[test]
fn unrecognized_character_reports_line_and_column() {
  let err = tokenize("let x = 1;\nlet y = @;").expect_err("@ must not lex");
  let message = err.to_string();
  assert!(message.contains("2:9"), "got: {message}");
  assert!(message.contains('@'), "got: {message}");
}

#[test]
fn underscore_cannot_start_an_identifier() {
  assert!(tokenize("_x").is_err());
}
