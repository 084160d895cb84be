//! Recursive-descent parser producing one program tree in an arena.
//!
//! Statements are parsed by dispatching on one to three tokens of
//! lookahead; expressions use precedence climbing so associativity falls
//! out of the minimum-precedence threshold instead of a grammar table.
//! Any missing token or sub-construct aborts the whole compilation with a
//! syntax error.

use tracing::debug;

use crate::ast::{
  Arena, BinOp, CmpOp, Comparison, Condition, Expr, ExprId, Program, Stmt, StmtId, Term,
};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operator and its binding power, or `None` for non-operators.
/// `*` and `/` bind tighter than `+` and `-`.
fn bin_prec(kind: TokenKind) -> Option<(BinOp, u8)> {
  match kind {
    TokenKind::Plus => Some((BinOp::Add, 0)),
    TokenKind::Minus => Some((BinOp::Sub, 0)),
    TokenKind::Star => Some((BinOp::Mul, 1)),
    TokenKind::Slash => Some((BinOp::Div, 1)),
    _ => None,
  }
}

fn cmp_op(kind: TokenKind) -> Option<CmpOp> {
  match kind {
    TokenKind::EqEq => Some(CmpOp::Eq),
    TokenKind::NotEq => Some(CmpOp::Ne),
    TokenKind::Lt => Some(CmpOp::Lt),
    TokenKind::Gt => Some(CmpOp::Gt),
    TokenKind::LtEq => Some(CmpOp::Le),
    TokenKind::GtEq => Some(CmpOp::Ge),
    _ => None,
  }
}

/// Parse a token stream into a full program.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut parser = Parser {
    stream: TokenStream::new(tokens, source),
    arena: Arena::new(),
  };

  let mut stmts = Vec::new();
  while !parser.stream.is_eof() {
    stmts.push(parser.parse_stmt()?);
  }

  debug!(count = stmts.len(), "parsed top-level statements");
  Ok(Program {
    arena: parser.arena,
    stmts,
  })
}

struct Parser<'a> {
  stream: TokenStream<'a>,
  arena: Arena,
}

impl Parser<'_> {
  /// `int_lit | ident | ( expr )`
  fn parse_term(&mut self) -> CompileResult<ExprId> {
    if let Some(token) = self.stream.eat(TokenKind::IntLit) {
      let text = token_text(&token, self.stream.source);
      let value = text.parse::<i64>().map_err(|_| {
        CompileError::syntax(self.stream.source, token.loc, "integer literal out of range")
      })?;
      let term = self.arena.alloc_term(Term::IntLit { value });
      return Ok(self.arena.alloc_expr(Expr::Term(term)));
    }

    if let Some(token) = self.stream.eat(TokenKind::Ident) {
      let name = token_text(&token, self.stream.source).to_string();
      let term = self.arena.alloc_term(Term::Ident { name });
      return Ok(self.arena.alloc_expr(Expr::Term(term)));
    }

    if self.stream.eat(TokenKind::OpenParen).is_some() {
      let inner = self.parse_expr(0)?;
      self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
      let term = self.arena.alloc_term(Term::Paren { expr: inner });
      return Ok(self.arena.alloc_expr(Expr::Term(term)));
    }

    Err(self.stream.error_at_current("expected expression"))
  }

  /// Precedence climbing: fold operators at or above `min_prec` into the
  /// running left-hand side, recursing with `prec + 1` on the right so
  /// same-precedence operators associate left.
  fn parse_expr(&mut self, min_prec: u8) -> CompileResult<ExprId> {
    let mut lhs = self.parse_term()?;

    loop {
      let Some(kind) = self.stream.kind_at(0) else {
        break;
      };
      let Some((op, prec)) = bin_prec(kind) else {
        break;
      };
      if prec < min_prec {
        break;
      }

      self.stream.advance();
      let rhs = self.parse_expr(prec + 1)?;
      lhs = self.arena.alloc_expr(Expr::Binary { op, lhs, rhs });
    }

    Ok(lhs)
  }

  /// `expr cmp expr` – both sides and the operator are required.
  fn parse_comparison(&mut self) -> CompileResult<Comparison> {
    let lhs = self.parse_expr(0)?;
    let token = self
      .stream
      .peek(0)
      .copied()
      .ok_or_else(|| self.stream.error_at_current("expected comparison operator"))?;
    let Some(op) = cmp_op(token.kind) else {
      return Err(self.stream.error_at_current("expected comparison operator"));
    };
    self.stream.advance();
    let rhs = self.parse_expr(0)?;
    Ok(Comparison { lhs, op, rhs })
  }

  /// Condition form for `if`/`elif`: a bare expression is a truthiness
  /// test, otherwise a comparison operator and right-hand side follow.
  fn parse_condition(&mut self) -> CompileResult<Condition> {
    let lhs = self.parse_expr(0)?;
    if self.stream.at(TokenKind::CloseParen) {
      return Ok(Condition::Truthy(lhs));
    }
    let token = self
      .stream
      .peek(0)
      .copied()
      .ok_or_else(|| self.stream.error_at_current("expected comparison operator"))?;
    let Some(op) = cmp_op(token.kind) else {
      return Err(self.stream.error_at_current("expected comparison operator"));
    };
    self.stream.advance();
    let rhs = self.parse_expr(0)?;
    Ok(Condition::Compare(Comparison { lhs, op, rhs }))
  }

  /// `{ stmt* }`
  fn parse_scope(&mut self) -> CompileResult<Vec<StmtId>> {
    self.stream.expect(TokenKind::OpenBrace, "expected `{`")?;
    let mut body = Vec::new();
    while !self.stream.at(TokenKind::CloseBrace) && !self.stream.is_eof() {
      body.push(self.parse_stmt()?);
    }
    self.stream.expect(TokenKind::CloseBrace, "expected `}`")?;
    Ok(body)
  }

  /// `exit ( expr ) ;` and `print ( expr ) ;` share this shape.
  fn parse_call_like(&mut self, build: fn(ExprId) -> Stmt) -> CompileResult<StmtId> {
    self.stream.advance(); // keyword
    self.stream.expect(TokenKind::OpenParen, "expected `(`")?;
    let expr = self.parse_expr(0)?;
    self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
    self.stream.expect(TokenKind::Semi, "expected `;`")?;
    Ok(self.arena.alloc_stmt(build(expr)))
  }

  /// `ident = expr` without the trailing semicolon, shared by assignment
  /// statements and `for` clauses.
  fn parse_assign_clause(&mut self) -> CompileResult<StmtId> {
    let ident = self.stream.expect(TokenKind::Ident, "expected an identifier")?;
    let name = token_text(&ident, self.stream.source).to_string();
    self.stream.expect(TokenKind::Assign, "incomplete statement")?;
    let expr = self.parse_expr(0)?;
    Ok(self.arena.alloc_stmt(Stmt::Assign { name, expr }))
  }

  /// `let ident = expr` without the trailing semicolon.
  fn parse_let_clause(&mut self) -> CompileResult<StmtId> {
    self.stream.advance(); // `let`
    let ident = self.stream.expect(TokenKind::Ident, "expected an identifier")?;
    let name = token_text(&ident, self.stream.source).to_string();
    self.stream.expect(TokenKind::Assign, "expected `=`")?;
    let expr = self.parse_expr(0)?;
    Ok(self.arena.alloc_stmt(Stmt::Let { name, expr }))
  }

  /// `if ( cond ) { … } (elif ( cond ) { … })* (else { … })?`
  ///
  /// Elif arms are collected in declaration order, then folded from the
  /// back so each arm owns the next one, giving the singly-linked chain
  /// the generator walks. The else body always belongs to the root `if`.
  fn parse_if(&mut self) -> CompileResult<StmtId> {
    self.stream.advance(); // `if`
    self.stream.expect(TokenKind::OpenParen, "expected `(`")?;
    let cond = self.parse_condition()?;
    self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
    let body = self.parse_scope()?;

    let mut arms = Vec::new();
    while self.stream.eat(TokenKind::Elif).is_some() {
      self.stream.expect(TokenKind::OpenParen, "expected `(`")?;
      let elif_cond = self.parse_condition()?;
      self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
      let elif_body = self.parse_scope()?;
      arms.push((elif_cond, elif_body));
    }

    let else_body = if self.stream.eat(TokenKind::Else).is_some() {
      self.parse_scope()?
    } else {
      Vec::new()
    };

    let mut chain: Vec<StmtId> = Vec::new();
    for (elif_cond, elif_body) in arms.into_iter().rev() {
      let elif = self.arena.alloc_stmt(Stmt::If {
        cond: elif_cond,
        body: elif_body,
        elifs: chain,
        else_body: Vec::new(),
      });
      chain = vec![elif];
    }

    Ok(self.arena.alloc_stmt(Stmt::If {
      cond,
      body,
      elifs: chain,
      else_body,
    }))
  }

  /// `while ( expr cmp expr ) { … }` – the comparison is mandatory.
  fn parse_while(&mut self) -> CompileResult<StmtId> {
    self.stream.advance(); // `while`
    self.stream.expect(TokenKind::OpenParen, "expected `(`")?;
    let cond = self.parse_comparison()?;
    self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
    let body = self.parse_scope()?;
    Ok(self.arena.alloc_stmt(Stmt::While { cond, body }))
  }

  /// `for ( init? ; expr cmp expr ; update? ) { … }`
  fn parse_for(&mut self) -> CompileResult<StmtId> {
    self.stream.advance(); // `for`
    self.stream.expect(TokenKind::OpenParen, "expected `(`")?;

    let init = if self.stream.at(TokenKind::Let) {
      Some(self.parse_let_clause()?)
    } else if self.stream.at(TokenKind::Ident) {
      Some(self.parse_assign_clause()?)
    } else {
      None
    };
    self.stream.expect(TokenKind::Semi, "expected `;`")?;

    let cond = self.parse_comparison()?;
    self.stream.expect(TokenKind::Semi, "expected `;`")?;

    let update = if self.stream.at(TokenKind::CloseParen) {
      None
    } else {
      Some(self.parse_assign_clause()?)
    };
    self.stream.expect(TokenKind::CloseParen, "expected `)`")?;

    let body = self.parse_scope()?;
    Ok(self.arena.alloc_stmt(Stmt::For {
      init,
      cond,
      update,
      body,
    }))
  }

  /// `fun ( ) { … }` – parsed for forward compatibility, never lowered.
  fn parse_fun(&mut self) -> CompileResult<StmtId> {
    self.stream.advance(); // `fun`
    self.stream.expect(TokenKind::OpenParen, "expected `(`")?;
    self.stream.expect(TokenKind::CloseParen, "expected `)`")?;
    let body = self.parse_scope()?;
    Ok(self.arena.alloc_stmt(Stmt::Fun { body }))
  }

  fn parse_stmt(&mut self) -> CompileResult<StmtId> {
    let kind = self.stream.peek(0).map(|t| t.kind);

    match kind {
      Some(TokenKind::Exit) if self.stream.kind_at(1) == Some(TokenKind::OpenParen) => {
        self.parse_call_like(|expr| Stmt::Exit { expr })
      }
      Some(TokenKind::Print) if self.stream.kind_at(1) == Some(TokenKind::OpenParen) => {
        self.parse_call_like(|expr| Stmt::Print { expr })
      }
      Some(TokenKind::Let)
        if self.stream.kind_at(1) == Some(TokenKind::Ident)
          && self.stream.kind_at(2) == Some(TokenKind::Assign) =>
      {
        let stmt = self.parse_let_clause()?;
        self.stream.expect(TokenKind::Semi, "expected `;`")?;
        Ok(stmt)
      }
      Some(TokenKind::Set) => {
        self.stream.advance();
        let stmt = self.parse_assign_clause()?;
        self.stream.expect(TokenKind::Semi, "expected `;`")?;
        Ok(stmt)
      }
      Some(TokenKind::Ident) => {
        let stmt = self.parse_assign_clause()?;
        self.stream.expect(TokenKind::Semi, "expected `;`")?;
        Ok(stmt)
      }
      Some(TokenKind::If) => self.parse_if(),
      Some(TokenKind::While) => self.parse_while(),
      Some(TokenKind::For) => self.parse_for(),
      Some(TokenKind::Fun) => self.parse_fun(),
      Some(TokenKind::OpenBrace) => {
        let body = self.parse_scope()?;
        Ok(self.arena.alloc_stmt(Stmt::Scope { body }))
      }
      _ => Err(self.stream.error_at_current("invalid statement")),
    }
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self, offset: usize) -> Option<&Token> {
    self
      .tokens
      .get(self.pos + offset)
      .filter(|token| token.kind != TokenKind::Eof)
  }

  fn kind_at(&self, offset: usize) -> Option<TokenKind> {
    self.peek(offset).map(|token| token.kind)
  }

  fn at(&self, kind: TokenKind) -> bool {
    self.kind_at(0) == Some(kind)
  }

  fn advance(&mut self) -> Option<Token> {
    let token = self.peek(0).copied();
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  /// Consume the current token if it has the expected kind.
  fn eat(&mut self, kind: TokenKind) -> Option<Token> {
    if self.at(kind) { self.advance() } else { None }
  }

  fn expect(&mut self, kind: TokenKind, message: &str) -> CompileResult<Token> {
    self
      .eat(kind)
      .ok_or_else(|| self.error_at_current(message))
  }

  fn error_at_current(&self, message: &str) -> CompileError {
    let (loc, got) = match self.tokens.get(self.pos) {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    };
    CompileError::syntax(self.source, loc, format!("{message}, but got \"{got}\""))
  }

  fn is_eof(&self) -> bool {
    matches!(
      self.tokens.get(self.pos).map(|token| token.kind),
      Some(TokenKind::Eof) | None
    )
  }
}
