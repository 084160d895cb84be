//! Syntax-tree types and the arena that owns them.
//!
//! Every node lives in one of three append-only stores, one per tree
//! level (terms, expressions, statements), and cross-references are typed
//! indices into those stores. Nothing is deallocated individually; the
//! whole arena is torn down with the `Program` that owns it.

/// Index of a term in [`Arena::terms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermId(u32);

/// Index of an expression in [`Arena::exprs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprId(u32);

/// Index of a statement in [`Arena::stmts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtId(u32);

/// Arithmetic operators usable inside expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
}

/// Comparison operators usable in condition forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
  Eq,
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
}

/// Leaf level of the expression grammar.
#[derive(Debug, Clone)]
pub enum Term {
  IntLit { value: i64 },
  Ident { name: String },
  Paren { expr: ExprId },
}

/// An expression is either a term or a binary operation over two
/// sub-expressions.
#[derive(Debug, Clone)]
pub enum Expr {
  Term(TermId),
  Binary {
    op: BinOp,
    lhs: ExprId,
    rhs: ExprId,
  },
}

/// Two-sided comparison, required by `while` and `for` conditions.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
  pub lhs: ExprId,
  pub op: CmpOp,
  pub rhs: ExprId,
}

/// Condition form accepted by `if`/`elif`: either a plain expression
/// tested for truthiness against zero, or a two-sided comparison.
#[derive(Debug, Clone, Copy)]
pub enum Condition {
  Truthy(ExprId),
  Compare(Comparison),
}

/// Statement level of the tree.
///
/// Elif clauses are `If` nodes reused structurally: each entry in `elifs`
/// owns its own body and possibly further elifs, forming a singly-linked
/// chain. Only the root `If` of a chain carries an else body.
#[derive(Debug, Clone)]
pub enum Stmt {
  Exit {
    expr: ExprId,
  },
  Print {
    expr: ExprId,
  },
  Let {
    name: String,
    expr: ExprId,
  },
  Assign {
    name: String,
    expr: ExprId,
  },
  Scope {
    body: Vec<StmtId>,
  },
  If {
    cond: Condition,
    body: Vec<StmtId>,
    elifs: Vec<StmtId>,
    else_body: Vec<StmtId>,
  },
  While {
    cond: Comparison,
    body: Vec<StmtId>,
  },
  For {
    init: Option<StmtId>,
    cond: Comparison,
    update: Option<StmtId>,
    body: Vec<StmtId>,
  },
  // Parsed but never lowered; calling it is not supported.
  Fun {
    body: Vec<StmtId>,
  },
}

/// Append-only node stores for one compilation.
#[derive(Debug, Default)]
pub struct Arena {
  terms: Vec<Term>,
  exprs: Vec<Expr>,
  stmts: Vec<Stmt>,
}

impl Arena {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc_term(&mut self, term: Term) -> TermId {
    let id = TermId(self.terms.len() as u32);
    self.terms.push(term);
    id
  }

  pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
    let id = ExprId(self.exprs.len() as u32);
    self.exprs.push(expr);
    id
  }

  pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
    let id = StmtId(self.stmts.len() as u32);
    self.stmts.push(stmt);
    id
  }

  pub fn term(&self, id: TermId) -> &Term {
    &self.terms[id.0 as usize]
  }

  pub fn expr(&self, id: ExprId) -> &Expr {
    &self.exprs[id.0 as usize]
  }

  pub fn stmt(&self, id: StmtId) -> &Stmt {
    &self.stmts[id.0 as usize]
  }
}

/// One fully parsed compilation unit: the arena plus the ordered list of
/// top-level statements.
#[derive(Debug)]
pub struct Program {
  pub arena: Arena,
  pub stmts: Vec<StmtId>,
}
