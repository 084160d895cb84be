//! Code generation: lower the program tree into NASM x86-64 assembly.
//!
//! The emitter is a stack machine: every expression leaves exactly one
//! value on the machine stack and every consumer pops its operands, so no
//! register allocation is needed. Locals are addressed relative to `rsp`
//! with an offset recomputed at each reference, because the stack depth
//! moves as the program executes. All bookkeeping (symbol table, scope
//! marks, label counter) is per-generator state, so any number of
//! compilations can run in one process without cross-talk.

use tracing::debug;

use crate::ast::{
  Arena, BinOp, CmpOp, Comparison, Condition, Expr, ExprId, Program, Stmt, StmtId, Term,
};
use crate::error::{CompileError, CompileResult};

/// Emit assembly for a whole program.
pub fn generate(program: &Program) -> CompileResult<String> {
  Generator::new(program).generate()
}

/// Decimal-printing support routines. Digits are built on the stack and
/// written one byte per syscall, so the emitted program needs no data
/// section. `print_int` expects its value in `rax`.
const PRINT_HELPERS: &str = "\
print_int:
    mov rbx, 10
    test rax, rax
    jns .positive
    neg rax
    push rax
    push '-'
    mov rax, 1
    mov rdi, 1
    mov rsi, rsp
    mov rdx, 1
    syscall
    add rsp, 8
    pop rax
.positive:
    xor rcx, rcx
.convert:
    xor rdx, rdx
    div rbx
    add rdx, '0'
    push rdx
    inc rcx
    test rax, rax
    jnz .convert
    mov rbx, rcx
.emit:
    mov rax, 1
    mov rdi, 1
    mov rsi, rsp
    mov rdx, 1
    syscall
    add rsp, 8
    dec rbx
    jnz .emit
    ret

print_newline:
    push 10
    mov rax, 1
    mov rdi, 1
    mov rsi, rsp
    mov rdx, 1
    syscall
    add rsp, 8
    ret

";

/// The conditional jump taken when the comparison does NOT hold; the
/// fall-through path is reserved for the true branch.
fn negated_jump(op: CmpOp) -> &'static str {
  match op {
    CmpOp::Eq => "jne",
    CmpOp::Ne => "je",
    CmpOp::Lt => "jge",
    CmpOp::Gt => "jle",
    CmpOp::Le => "jg",
    CmpOp::Ge => "jl",
  }
}

/// A declared variable and the logical stack slot holding its value.
struct Var {
  name: String,
  stack_loc: usize,
}

struct Generator<'a> {
  arena: &'a Arena,
  stmts: &'a [StmtId],
  output: String,
  stack_size: usize,
  vars: Vec<Var>,
  scopes: Vec<usize>,
  label_count: usize,
}

impl<'a> Generator<'a> {
  fn new(program: &'a Program) -> Self {
    Self {
      arena: &program.arena,
      stmts: &program.stmts,
      output: String::new(),
      stack_size: 0,
      vars: Vec::new(),
      scopes: Vec::new(),
      label_count: 0,
    }
  }

  fn generate(mut self) -> CompileResult<String> {
    self.output.push_str("global _start\n\n");
    self.output.push_str(PRINT_HELPERS);
    self.output.push_str("_start:\n");

    let stmts = self.stmts;
    for &stmt in stmts {
      self.gen_stmt(stmt)?;
    }

    // Fall-off-the-end exit with status 0; an explicit `exit(E);` has
    // already performed its own syscall by the time we get here.
    self.output.push_str("    mov rax, 60\n");
    self.output.push_str("    mov rdi, 0\n");
    self.output.push_str("    syscall\n");

    debug!(bytes = self.output.len(), "generated assembly");
    Ok(self.output)
  }

  fn gen_term(&mut self, term: &Term) -> CompileResult<()> {
    match term {
      Term::IntLit { value } => {
        self.output.push_str(&format!("    mov rax, {value}\n"));
        self.push("rax");
      }
      Term::Ident { name } => {
        let Some(var) = self.vars.iter().find(|var| var.name == *name) else {
          return Err(CompileError::semantic(format!(
            "undeclared identifier: {name}"
          )));
        };
        // A registered entry whose slot has not been pushed yet can only
        // be the variable's own initializer reading it.
        let Some(depth) = self.stack_size.checked_sub(var.stack_loc + 1) else {
          return Err(CompileError::semantic(format!(
            "identifier used in its own initializer: {name}"
          )));
        };
        self.push(&format!("QWORD [rsp + {}]", depth * 8));
      }
      Term::Paren { expr } => self.gen_expr(*expr)?,
    }
    Ok(())
  }

  /// Right operand first, then left, so the pops come out as
  /// `rax` = lhs, `rbx` = rhs and non-commutative operators read
  /// naturally.
  fn gen_expr(&mut self, expr: ExprId) -> CompileResult<()> {
    let arena = self.arena;
    match arena.expr(expr) {
      Expr::Term(term) => self.gen_term(arena.term(*term))?,
      Expr::Binary { op, lhs, rhs } => {
        self.gen_expr(*rhs)?;
        self.gen_expr(*lhs)?;
        self.pop("rax");
        self.pop("rbx");
        match op {
          BinOp::Add => self.output.push_str("    add rax, rbx\n"),
          BinOp::Sub => self.output.push_str("    sub rax, rbx\n"),
          BinOp::Mul => self.output.push_str("    mul rbx\n"),
          BinOp::Div => {
            self.output.push_str("    mov rdx, 0\n");
            self.output.push_str("    div rbx\n");
          }
        }
        self.push("rax");
      }
    }
    Ok(())
  }

  /// Evaluate both sides of a comparison and branch to `fail_target` when
  /// it does not hold.
  fn gen_comparison(&mut self, cmp: &Comparison, fail_target: &str) -> CompileResult<()> {
    self.gen_expr(cmp.lhs)?;
    self.gen_expr(cmp.rhs)?;
    self.pop("rbx");
    self.pop("rax");
    self.output.push_str("    cmp rax, rbx\n");
    let jump = negated_jump(cmp.op);
    self.output.push_str(&format!("    {jump} {fail_target}\n"));
    Ok(())
  }

  /// Test + scoped body for one `if`/`elif` arm, then recurse down the
  /// elif chain. Every arm body ends by jumping to the shared
  /// `end_if_else` label so a taken branch never falls into a later arm.
  fn gen_if_arm(
    &mut self,
    cond: &Condition,
    body: &[StmtId],
    elifs: &[StmtId],
    end_if_else: &str,
    label_base: &str,
  ) -> CompileResult<()> {
    let end_label = self.fresh_label(label_base);
    match cond {
      Condition::Truthy(expr) => {
        self.gen_expr(*expr)?;
        self.pop("rax");
        self.output.push_str("    cmp rax, 0\n");
        self.output.push_str(&format!("    je {end_label}\n"));
      }
      Condition::Compare(cmp) => self.gen_comparison(cmp, &end_label)?,
    }

    self.begin_scope();
    for &stmt in body {
      self.gen_stmt(stmt)?;
    }
    self.end_scope();
    self.output.push_str(&format!("    jmp {end_if_else}\n"));
    self.output.push_str(&format!("{end_label}:\n"));

    let arena = self.arena;
    for &elif in elifs {
      if let Stmt::If {
        cond, body, elifs, ..
      } = arena.stmt(elif)
      {
        self.gen_if_arm(cond, body, elifs, end_if_else, "end_elif")?;
      }
    }
    Ok(())
  }

  fn gen_stmt(&mut self, id: StmtId) -> CompileResult<()> {
    let arena = self.arena;
    match arena.stmt(id) {
      Stmt::Exit { expr } => {
        self.gen_expr(*expr)?;
        self.output.push_str("    mov rax, 60\n");
        self.pop("rdi");
        self.output.push_str("    syscall\n");
      }
      Stmt::Print { expr } => {
        self.gen_expr(*expr)?;
        self.pop("rax");
        self.output.push_str("    call print_int\n");
        self.output.push_str("    call print_newline\n");
      }
      Stmt::Let { name, expr } => {
        if self.vars.iter().any(|var| var.name == *name) {
          return Err(CompileError::semantic(format!(
            "identifier already used: {name}"
          )));
        }
        // Register the slot first: the initializer's push lands exactly
        // where the entry says the value lives.
        self.vars.push(Var {
          name: name.clone(),
          stack_loc: self.stack_size,
        });
        self.gen_expr(*expr)?;
      }
      Stmt::Assign { name, expr } => {
        let Some(var) = self.vars.iter().find(|var| var.name == *name) else {
          return Err(CompileError::semantic(format!(
            "undeclared identifier: {name}"
          )));
        };
        let stack_loc = var.stack_loc;
        self.gen_expr(*expr)?;
        self.pop("rax");
        let offset = (self.stack_size - stack_loc - 1) * 8;
        self
          .output
          .push_str(&format!("    mov QWORD [rsp + {offset}], rax\n"));
      }
      Stmt::Scope { body } => {
        self.begin_scope();
        for &stmt in body {
          self.gen_stmt(stmt)?;
        }
        self.end_scope();
      }
      Stmt::If {
        cond,
        body,
        elifs,
        else_body,
      } => {
        let end_if_else = self.fresh_label("end_if_else");
        self.gen_if_arm(cond, body, elifs, &end_if_else, "end_if")?;

        // The else body is emitted unconditionally, empty or not.
        self.begin_scope();
        for &stmt in else_body {
          self.gen_stmt(stmt)?;
        }
        self.end_scope();
        self.output.push_str(&format!("{end_if_else}:\n"));
      }
      Stmt::While { cond, body } => {
        let start_label = self.fresh_label("start_while");
        let end_label = self.fresh_label("end_while");
        self.output.push_str(&format!("{start_label}:\n"));
        self.gen_comparison(cond, &end_label)?;
        self.begin_scope();
        for &stmt in body {
          self.gen_stmt(stmt)?;
        }
        self.end_scope();
        self.output.push_str(&format!("    jmp {start_label}\n"));
        self.output.push_str(&format!("{end_label}:\n"));
      }
      Stmt::For {
        init,
        cond,
        update,
        body,
      } => {
        // The init declaration lives in a scope enclosing the whole loop,
        // so the loop variable spans every iteration and its slot is
        // reclaimed when the statement ends.
        self.begin_scope();
        if let Some(init) = init {
          self.gen_stmt(*init)?;
        }
        let start_label = self.fresh_label("start_for");
        let end_label = self.fresh_label("end_for");
        self.output.push_str(&format!("{start_label}:\n"));
        self.gen_comparison(cond, &end_label)?;
        self.begin_scope();
        for &stmt in body {
          self.gen_stmt(stmt)?;
        }
        self.end_scope();
        if let Some(update) = update {
          self.gen_stmt(*update)?;
        }
        self.output.push_str(&format!("    jmp {start_label}\n"));
        self.output.push_str(&format!("{end_label}:\n"));
        self.end_scope();
      }
      // Function syntax is parsed but never lowered.
      Stmt::Fun { .. } => {}
    }
    Ok(())
  }

  fn push(&mut self, operand: &str) {
    self.output.push_str(&format!("    push {operand}\n"));
    self.stack_size += 1;
  }

  fn pop(&mut self, reg: &str) {
    self.output.push_str(&format!("    pop {reg}\n"));
    self.stack_size -= 1;
  }

  fn begin_scope(&mut self) {
    self.scopes.push(self.vars.len());
  }

  /// Drop every entry declared since the matching scope mark and release
  /// the stack space backing them.
  fn end_scope(&mut self) {
    if let Some(mark) = self.scopes.pop() {
      let pop_count = self.vars.len() - mark;
      if pop_count > 0 {
        self
          .output
          .push_str(&format!("    add rsp, {}\n", pop_count * 8));
      }
      self.stack_size -= pop_count;
      self.vars.truncate(mark);
    }
  }

  fn fresh_label(&mut self, base: &str) -> String {
    let label = format!("{base}_{}", self.label_count);
    self.label_count += 1;
    label
  }
}
