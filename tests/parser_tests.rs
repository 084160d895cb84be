use ogen::ast::{Arena, BinOp, CmpOp, Condition, Expr, ExprId, Program, Stmt, Term};
use ogen::parser::parse;
use ogen::tokenizer::tokenize;

fn parse_source(source: &str) -> Program {
  let tokens = tokenize(source).expect("lexing should succeed");
  parse(tokens, source).expect("parsing should succeed")
}

fn parse_error(source: &str) -> String {
  let tokens = tokenize(source).expect("lexing should succeed");
  parse(tokens, source)
    .expect_err("parsing should fail")
    .to_string()
}

/// Unwrap a term-expression down to the underlying term.
fn as_term<'a>(arena: &'a Arena, expr: ExprId) -> &'a Term {
  match arena.expr(expr) {
    Expr::Term(term) => arena.term(*term),
    other => panic!("expected a term, found {other:?}"),
  }
}

fn int_value(arena: &Arena, expr: ExprId) -> i64 {
  match as_term(arena, expr) {
    Term::IntLit { value } => *value,
    other => panic!("expected an integer literal, found {other:?}"),
  }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
  let program = parse_source("exit(1 + 2 * 3);");
  let arena = &program.arena;

  let Stmt::Exit { expr } = arena.stmt(program.stmts[0]) else {
    panic!("expected exit statement");
  };
  let Expr::Binary { op, lhs, rhs } = arena.expr(*expr) else {
    panic!("expected binary expression at the root");
  };
  assert_eq!(*op, BinOp::Add);
  assert_eq!(int_value(arena, *lhs), 1);

  let Expr::Binary { op, lhs, rhs } = arena.expr(*rhs) else {
    panic!("expected the multiplication on the right");
  };
  assert_eq!(*op, BinOp::Mul);
  assert_eq!(int_value(arena, *lhs), 2);
  assert_eq!(int_value(arena, *rhs), 3);
}

#[test]
fn same_precedence_operators_associate_left() {
  let program = parse_source("exit(10 - 2 - 3);");
  let arena = &program.arena;

  let Stmt::Exit { expr } = arena.stmt(program.stmts[0]) else {
    panic!("expected exit statement");
  };
  let Expr::Binary { op, lhs, rhs } = arena.expr(*expr) else {
    panic!("expected binary expression at the root");
  };
  assert_eq!(*op, BinOp::Sub);
  assert_eq!(int_value(arena, *rhs), 3);

  let Expr::Binary { op, lhs, rhs } = arena.expr(*lhs) else {
    panic!("expected nested subtraction on the left");
  };
  assert_eq!(*op, BinOp::Sub);
  assert_eq!(int_value(arena, *lhs), 10);
  assert_eq!(int_value(arena, *rhs), 2);
}

#[test]
fn parentheses_override_precedence() {
  let program = parse_source("exit((1 + 2) * 3);");
  let arena = &program.arena;

  let Stmt::Exit { expr } = arena.stmt(program.stmts[0]) else {
    panic!("expected exit statement");
  };
  let Expr::Binary { op, lhs, .. } = arena.expr(*expr) else {
    panic!("expected binary expression at the root");
  };
  assert_eq!(*op, BinOp::Mul);

  let Term::Paren { expr } = as_term(arena, *lhs) else {
    panic!("expected parenthesized left operand");
  };
  assert!(matches!(
    arena.expr(*expr),
    Expr::Binary { op: BinOp::Add, .. }
  ));
}

#[test]
fn let_set_and_plain_assignment_forms() {
  let program = parse_source("let x = 1;\nx = 2;\nset x = 3;");
  let arena = &program.arena;
  assert_eq!(program.stmts.len(), 3);

  assert!(matches!(
    arena.stmt(program.stmts[0]),
    Stmt::Let { name, .. } if name == "x"
  ));
  assert!(matches!(
    arena.stmt(program.stmts[1]),
    Stmt::Assign { name, .. } if name == "x"
  ));
  assert!(matches!(
    arena.stmt(program.stmts[2]),
    Stmt::Assign { name, .. } if name == "x"
  ));
}

#[test]
fn elif_clauses_chain_one_per_level() {
  let program = parse_source(
    "if (1 == 2) { exit(1); } elif (2 == 3) { exit(2); } elif (3 == 4) { exit(3); } else { exit(4); }",
  );
  let arena = &program.arena;

  let Stmt::If {
    cond,
    body,
    elifs,
    else_body,
  } = arena.stmt(program.stmts[0])
  else {
    panic!("expected if statement");
  };
  assert!(matches!(cond, Condition::Compare(cmp) if cmp.op == CmpOp::Eq));
  assert_eq!(body.len(), 1);
  assert_eq!(else_body.len(), 1, "else belongs to the root if");
  assert_eq!(elifs.len(), 1, "root owns only the first elif");

  let Stmt::If { elifs: inner, else_body: inner_else, .. } = arena.stmt(elifs[0]) else {
    panic!("expected the first elif to be an if node");
  };
  assert_eq!(inner.len(), 1, "first elif owns the second");
  assert!(inner_else.is_empty());

  let Stmt::If { elifs: last, .. } = arena.stmt(inner[0]) else {
    panic!("expected the second elif to be an if node");
  };
  assert!(last.is_empty(), "chain ends at the last elif");
}

#[test]
fn if_accepts_a_truthiness_condition() {
  let program = parse_source("if (1) { exit(0); }");
  let arena = &program.arena;
  let Stmt::If { cond, .. } = arena.stmt(program.stmts[0]) else {
    panic!("expected if statement");
  };
  assert!(matches!(cond, Condition::Truthy(_)));
}

#[test]
fn while_requires_a_two_sided_comparison() {
  let message = parse_error("while (1) { exit(0); }");
  assert!(message.contains("comparison"), "got: {message}");

  let program = parse_source("while (1 < 2) { exit(0); }");
  assert!(matches!(
    program.arena.stmt(program.stmts[0]),
    Stmt::While { cond, .. } if cond.op == CmpOp::Lt
  ));
}

#[test]
fn for_clauses_take_let_or_assign_inits() {
  let program = parse_source("for (let i = 0; i < 3; i = i + 1) { print(i); }");
  let arena = &program.arena;
  let Stmt::For {
    init,
    cond,
    update,
    body,
  } = arena.stmt(program.stmts[0])
  else {
    panic!("expected for statement");
  };
  assert!(matches!(arena.stmt(init.expect("init")), Stmt::Let { .. }));
  assert_eq!(cond.op, CmpOp::Lt);
  assert!(matches!(
    arena.stmt(update.expect("update")),
    Stmt::Assign { .. }
  ));
  assert_eq!(body.len(), 1);

  let program = parse_source("let i = 0; for (i = 5; i > 0; i = i - 1) { }");
  let Stmt::For { init, .. } = program.arena.stmt(program.stmts[1]) else {
    panic!("expected for statement");
  };
  assert!(matches!(
    program.arena.stmt(init.expect("init")),
    Stmt::Assign { .. }
  ));
}

#[test]
fn for_init_and_update_are_optional_shaped() {
  let program = parse_source("let i = 0; for (; i < 3;) { i = i + 1; }");
  let Stmt::For { init, update, .. } = program.arena.stmt(program.stmts[1]) else {
    panic!("expected for statement");
  };
  assert!(init.is_none());
  assert!(update.is_none());
}

#[test]
fn fun_parses_to_a_dedicated_node() {
  let program = parse_source("fun () { exit(1); }");
  assert!(matches!(
    program.arena.stmt(program.stmts[0]),
    Stmt::Fun { body } if body.len() == 1
  ));
}

#[test]
fn nested_scopes_parse_as_statements() {
  let program = parse_source("{ let a = 1; { let b = 2; } }");
  let arena = &program.arena;
  let Stmt::Scope { body } = arena.stmt(program.stmts[0]) else {
    panic!("expected scope statement");
  };
  assert_eq!(body.len(), 2);
  assert!(matches!(arena.stmt(body[1]), Stmt::Scope { .. }));
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
  let message = parse_error("exit(0)");
  assert!(message.contains("expected `;`"), "got: {message}");
}

#[test]
fn missing_close_paren_is_a_syntax_error() {
  let message = parse_error("exit(1;");
  assert!(message.contains("expected `)`"), "got: {message}");
}

#[test]
fn statement_must_start_with_a_known_construct() {
  let message = parse_error("42;");
  assert!(message.contains("invalid statement"), "got: {message}");
}

#[test]
fn exit_without_parentheses_is_rejected() {
  let message = parse_error("exit 0;");
  assert!(message.contains("invalid statement"), "got: {message}");
}

#[test]
fn reserved_triple_forms_are_rejected() {
  let message = parse_error("let x = +++;");
  assert!(message.contains("expected expression"), "got: {message}");
  assert!(parse_error("---;").contains("invalid statement"));
}

#[test]
fn oversized_integer_literal_is_a_syntax_error() {
  let message = parse_error("exit(99999999999999999999);");
  assert!(message.contains("out of range"), "got: {message}");
}

#[test]
fn unterminated_scope_reports_missing_brace() {
  let message = parse_error("{ exit(0);");
  assert!(message.contains("expected `}`"), "got: {message}");
}
