//! Expression parsing and desugaring
//!
//! One function per precedence level, each reading left-associatively from
//! the one below. Several constructs never reach the tree in their surface
//! form:
//!
//! - `-x` becomes `0 - x`, `a[i]` becomes `*(a + i)`, `a->m` becomes
//!   `(*a).m`, `>`/`>=` become `<`/`<=` with the operands swapped;
//! - `x++` becomes `({ T *t1 = &x; T t2 = *t1; *t1 = *t1 + 1; t2; })` so
//!   the operand is evaluated exactly once;
//! - `x op= y` becomes `({ T *t = &x; *t = *t op y; })`;
//! - `sizeof`/`_Alignof` fold to integer literals immediately.

use std::rc::Rc;

use crate::ast::types::{ary_of, char_ty, func_ty, int_ty, ptr_to, Type, TypeKind};
use crate::ast::{BinOp, Node, NodeKind, UnaryOp, Var};
use crate::common::{CompileError, CompileResult, Span};
use crate::token::TokenKind;

use super::Parser;

impl Parser {
    /// expr := assign ("," expr)?
    pub(super) fn expr(&mut self) -> CompileResult<Node> {
        let lhs = self.assign()?;
        if !self.cursor.consume(&TokenKind::Comma) {
            return Ok(lhs);
        }
        let rhs = self.expr()?;
        Ok(Node::binop(BinOp::Comma, lhs, rhs))
    }

    /// assign := conditional (assign-op assign)?
    pub(super) fn assign(&mut self) -> CompileResult<Node> {
        let lhs = self.conditional()?;

        if self.cursor.consume(&TokenKind::Eq) {
            let rhs = self.assign()?;
            return Ok(Node::binop(BinOp::Assign, lhs, rhs));
        }

        let op = match self.cursor.peek().kind {
            TokenKind::PlusEq => BinOp::Add,
            TokenKind::MinusEq => BinOp::Sub,
            TokenKind::StarEq => BinOp::Mul,
            TokenKind::SlashEq => BinOp::Div,
            TokenKind::PercentEq => BinOp::Mod,
            TokenKind::AmpEq => BinOp::BitAnd,
            TokenKind::PipeEq => BinOp::BitOr,
            TokenKind::CaretEq => BinOp::BitXor,
            TokenKind::LtLtEq => BinOp::Shl,
            TokenKind::GtGtEq => BinOp::Shr,
            _ => return Ok(lhs),
        };
        let _ = self.cursor.get();
        let rhs = self.assign()?;
        Ok(self.assign_eq(op, lhs, rhs))
    }

    fn conditional(&mut self) -> CompileResult<Node> {
        let cond = self.logor()?;
        if !self.cursor.consume(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.expr()?;
        self.cursor.expect(&TokenKind::Colon)?;
        let els = self.conditional()?;

        let span = cond.span.merge(els.span);
        let ty = then.ty.clone();
        Ok(Node::new(
            NodeKind::Cond {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            },
            ty,
            span,
        ))
    }

    fn logor(&mut self) -> CompileResult<Node> {
        let mut lhs = self.logand()?;
        while self.cursor.consume(&TokenKind::PipePipe) {
            let rhs = self.logand()?;
            lhs = Node::binop(BinOp::LogOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn logand(&mut self) -> CompileResult<Node> {
        let mut lhs = self.bit_or()?;
        while self.cursor.consume(&TokenKind::AmpAmp) {
            let rhs = self.bit_or()?;
            lhs = Node::binop(BinOp::LogAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_or(&mut self) -> CompileResult<Node> {
        let mut lhs = self.bit_xor()?;
        while self.cursor.consume(&TokenKind::Pipe) {
            let rhs = self.bit_xor()?;
            lhs = Node::binop(BinOp::BitOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_xor(&mut self) -> CompileResult<Node> {
        let mut lhs = self.bit_and()?;
        while self.cursor.consume(&TokenKind::Caret) {
            let rhs = self.bit_and()?;
            lhs = Node::binop(BinOp::BitXor, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_and(&mut self) -> CompileResult<Node> {
        let mut lhs = self.equality()?;
        while self.cursor.consume(&TokenKind::Amp) {
            let rhs = self.equality()?;
            lhs = Node::binop(BinOp::BitAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> CompileResult<Node> {
        let mut lhs = self.relational()?;
        loop {
            if self.cursor.consume(&TokenKind::EqEq) {
                let rhs = self.relational()?;
                lhs = Node::binop(BinOp::Eq, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::NotEq) {
                let rhs = self.relational()?;
                lhs = Node::binop(BinOp::Ne, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    /// `>` and `>=` are normalized to `<` and `<=` with the operands swapped.
    fn relational(&mut self) -> CompileResult<Node> {
        let mut lhs = self.shift()?;
        loop {
            if self.cursor.consume(&TokenKind::Lt) {
                let rhs = self.shift()?;
                lhs = Node::binop(BinOp::Lt, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::Gt) {
                let rhs = self.shift()?;
                lhs = Node::binop(BinOp::Lt, rhs, lhs);
            } else if self.cursor.consume(&TokenKind::LtEq) {
                let rhs = self.shift()?;
                lhs = Node::binop(BinOp::Le, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::GtEq) {
                let rhs = self.shift()?;
                lhs = Node::binop(BinOp::Le, rhs, lhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn shift(&mut self) -> CompileResult<Node> {
        let mut lhs = self.add()?;
        loop {
            if self.cursor.consume(&TokenKind::LtLt) {
                let rhs = self.add()?;
                lhs = Node::binop(BinOp::Shl, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::GtGt) {
                let rhs = self.add()?;
                lhs = Node::binop(BinOp::Shr, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn add(&mut self) -> CompileResult<Node> {
        let mut lhs = self.mul()?;
        loop {
            if self.cursor.consume(&TokenKind::Plus) {
                let rhs = self.mul()?;
                lhs = Node::binop(BinOp::Add, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::Minus) {
                let rhs = self.mul()?;
                lhs = Node::binop(BinOp::Sub, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn mul(&mut self) -> CompileResult<Node> {
        let mut lhs = self.unary()?;
        loop {
            if self.cursor.consume(&TokenKind::Star) {
                let rhs = self.unary()?;
                lhs = Node::binop(BinOp::Mul, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::Slash) {
                let rhs = self.unary()?;
                lhs = Node::binop(BinOp::Div, lhs, rhs);
            } else if self.cursor.consume(&TokenKind::Percent) {
                let rhs = self.unary()?;
                lhs = Node::binop(BinOp::Mod, lhs, rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn unary(&mut self) -> CompileResult<Node> {
        let span = self.cursor.span();

        if self.cursor.consume(&TokenKind::Minus) {
            let operand = self.unary()?;
            return Ok(Node::binop(BinOp::Sub, Node::num(0, span), operand));
        }
        if self.cursor.consume(&TokenKind::Star) {
            let operand = self.unary()?;
            let span = span.merge(operand.span);
            return Ok(Node::deref(operand, span));
        }
        if self.cursor.consume(&TokenKind::Amp) {
            let operand = self.unary()?;
            let span = span.merge(operand.span);
            return Ok(Node::addr(operand, span));
        }
        if self.cursor.consume(&TokenKind::Bang) {
            let operand = self.unary()?;
            let span = span.merge(operand.span);
            return Ok(Node::unary(UnaryOp::Not, operand, span));
        }
        if self.cursor.consume(&TokenKind::Tilde) {
            let operand = self.unary()?;
            let span = span.merge(operand.span);
            return Ok(Node::unary(UnaryOp::BitNot, operand, span));
        }
        if self.cursor.consume(&TokenKind::Sizeof) {
            let operand = self.unary()?;
            let ty = self.known_type(&operand)?;
            return Ok(Node::num(ty.size as i64, span.merge(operand.span)));
        }
        if self.cursor.consume(&TokenKind::Alignof) {
            let operand = self.unary()?;
            let ty = self.known_type(&operand)?;
            return Ok(Node::num(ty.align as i64, span.merge(operand.span)));
        }
        if self.cursor.consume(&TokenKind::PlusPlus) {
            let operand = self.unary()?;
            return Ok(self.assign_eq(BinOp::Add, operand, Node::num(1, span)));
        }
        if self.cursor.consume(&TokenKind::MinusMinus) {
            let operand = self.unary()?;
            return Ok(self.assign_eq(BinOp::Sub, operand, Node::num(1, span)));
        }
        self.postfix()
    }

    /// The parse-time type of `node`, required by `sizeof`/`_Alignof`.
    /// Incomplete structs are rejected; completing the tag later does not
    /// reach a type already copied into a declaration.
    fn known_type<'a>(&self, node: &'a Node) -> CompileResult<&'a Type> {
        let ty = node
            .ty
            .as_ref()
            .ok_or_else(|| CompileError::parser("operand has unknown type", node.span))?;
        if ty.is_incomplete() {
            return Err(CompileError::parser(
                "operand has incomplete type",
                node.span,
            ));
        }
        Ok(ty)
    }

    fn postfix(&mut self) -> CompileResult<Node> {
        let mut lhs = self.primary()?;

        loop {
            let span = self.cursor.span();

            if self.cursor.consume(&TokenKind::PlusPlus) {
                lhs = self.post_inc(lhs, 1, span);
            } else if self.cursor.consume(&TokenKind::MinusMinus) {
                lhs = self.post_inc(lhs, -1, span);
            } else if self.cursor.consume(&TokenKind::Dot) {
                let (name, name_span) = self.ident()?;
                lhs = member_access(lhs, name, name_span);
            } else if self.cursor.consume(&TokenKind::Arrow) {
                let (name, name_span) = self.ident()?;
                let span = lhs.span.merge(name_span);
                lhs = member_access(Node::deref(lhs, span), name, name_span);
            } else if self.cursor.consume(&TokenKind::LBracket) {
                let index = self.assign()?;
                self.cursor.expect(&TokenKind::RBracket)?;
                let sum = Node::binop(BinOp::Add, lhs, index);
                let span = sum.span;
                lhs = Node::deref(sum, span);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn primary(&mut self) -> CompileResult<Node> {
        let tok = self.cursor.get();
        match tok.kind {
            TokenKind::LParen => {
                if self.cursor.consume(&TokenKind::LBrace) {
                    return self.stmt_expr(tok.span);
                }
                let node = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Num(val) => Ok(Node::num(val, tok.span)),
            TokenKind::Str(bytes) => Ok(self.string_literal(bytes, tok.span)),
            TokenKind::Identifier(name) => {
                if self.cursor.consume(&TokenKind::LParen) {
                    self.function_call(name, tok.span)
                } else {
                    self.variable_ref(&name, tok.span)
                }
            }
            _ => Err(CompileError::parser(
                "primary expression expected",
                tok.span,
            )),
        }
    }

    /// `({ stmt... expr; })`; the `({` has already been consumed
    fn stmt_expr(&mut self, span: Span) -> CompileResult<Node> {
        self.env.push();
        let mut stmts = Vec::new();
        loop {
            stmts.push(self.stmt()?);
            if self.cursor.consume(&TokenKind::RBrace) {
                break;
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;
        self.env.pop();

        let last = stmts.pop().expect("loop pushes at least one statement");
        let last_span = last.span;
        let NodeKind::ExprStmt(last) = last.kind else {
            return Err(CompileError::parser(
                "statement expression returning void",
                last_span,
            ));
        };

        let ty = last.ty.clone();
        Ok(Node::new(
            NodeKind::StmtExpr { stmts, last },
            ty,
            span,
        ))
    }

    /// A string literal becomes an anonymous char-array global
    fn string_literal(&mut self, bytes: Vec<u8>, span: Span) -> Node {
        let ty = ary_of(char_ty(), Some(bytes.len()));
        let name = format!(".L.str{}", self.next_str_label);
        self.next_str_label += 1;

        let var = Var::global(name, ty, Some(bytes));
        self.prog.gvars.push(Rc::clone(&var));
        Node::var_ref(var, span)
    }

    fn variable_ref(&mut self, name: &str, span: Span) -> CompileResult<Node> {
        let Some(var) = self.env.find_var(name) else {
            return Err(CompileError::parser("undefined variable", span));
        };
        Ok(Node::var_ref(Rc::clone(var), span))
    }

    /// A call; the node carries the callee's function type. Calling a name
    /// with no visible function binding is only a warning, typed as a
    /// function returning int.
    fn function_call(&mut self, name: String, span: Span) -> CompileResult<Node> {
        let ty = match self.env.find_var(&name) {
            Some(var)
                if matches!(
                    var.ty.as_ref().map(|t| &t.kind),
                    Some(TypeKind::Func(_))
                ) =>
            {
                var.ty.clone()
            }
            _ => {
                self.warn("undefined function", span);
                Some(func_ty(int_ty()))
            }
        };

        let mut args = Vec::new();
        while !self.cursor.consume(&TokenKind::RParen) {
            if !args.is_empty() {
                self.cursor.expect(&TokenKind::Comma)?;
            }
            args.push(self.assign()?);
        }
        Ok(Node::new(NodeKind::Call { name, args }, ty, span))
    }

    // === Desugaring ===

    /// Wrap `exprs` into a statement expression whose value is the last one
    fn new_stmt_expr(&self, span: Span, mut exprs: Vec<Node>) -> Node {
        let last = exprs.pop().expect("statement expression needs a value");
        let stmts = exprs.into_iter().map(Node::expr_stmt).collect();
        let ty = last.ty.clone();
        Node::new(
            NodeKind::StmtExpr {
                stmts,
                last: Box::new(last),
            },
            ty,
            span,
        )
    }

    /// `x++` with `x: T` becomes `({ T *t1 = &x; T t2 = *t1;
    /// *t1 = *t1 + delta; t2; })`; `x--` uses a delta of -1.
    fn post_inc(&mut self, operand: Node, delta: i64, span: Span) -> Node {
        let ptr_tmp = self.new_tmp(operand.ty.clone().map(ptr_to));
        let val_tmp = self.new_tmp(operand.ty.clone());

        let exprs = vec![
            Node::binop(
                BinOp::Assign,
                Node::var_ref(Rc::clone(&ptr_tmp), span),
                Node::addr(operand, span),
            ),
            Node::binop(
                BinOp::Assign,
                Node::var_ref(Rc::clone(&val_tmp), span),
                Node::deref(Node::var_ref(Rc::clone(&ptr_tmp), span), span),
            ),
            Node::binop(
                BinOp::Assign,
                Node::deref(Node::var_ref(Rc::clone(&ptr_tmp), span), span),
                Node::binop(
                    BinOp::Add,
                    Node::deref(Node::var_ref(Rc::clone(&ptr_tmp), span), span),
                    Node::num(delta, span),
                ),
            ),
            Node::var_ref(val_tmp, span),
        ];
        self.new_stmt_expr(span, exprs)
    }

    /// `x op= y` with `x: T` becomes `({ T *t = &x; *t = *t op y; })`, so
    /// both the lvalue and the right-hand side are evaluated exactly once.
    fn assign_eq(&mut self, op: BinOp, lhs: Node, rhs: Node) -> Node {
        let span = lhs.span;
        let tmp = self.new_tmp(lhs.ty.clone().map(ptr_to));

        let exprs = vec![
            Node::binop(
                BinOp::Assign,
                Node::var_ref(Rc::clone(&tmp), span),
                Node::addr(lhs, span),
            ),
            Node::binop(
                BinOp::Assign,
                Node::deref(Node::var_ref(Rc::clone(&tmp), span), span),
                Node::binop(
                    op,
                    Node::deref(Node::var_ref(tmp, span), span),
                    rhs,
                ),
            ),
        ];
        self.new_stmt_expr(span, exprs)
    }
}

/// `.name` access; typed when the base is a struct with that member
fn member_access(base: Node, name: String, name_span: Span) -> Node {
    let span = base.span.merge(name_span);
    let ty = base
        .ty
        .as_ref()
        .and_then(|t| t.member(&name))
        .map(|m| m.ty.clone());
    Node::new(
        NodeKind::Member {
            base: Box::new(base),
            name,
        },
        ty,
        span,
    )
}
