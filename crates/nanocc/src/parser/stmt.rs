//! Statement and control-flow parsing
//!
//! Each loop and `switch` allocates a fresh [`CtrlId`](crate::ast::CtrlId)
//! and pushes it on the relevant stacks while its body is parsed; `break`,
//! `continue` and `case` resolve their targets from the top of those stacks.
//! `while` shares the loop node kind with `for` but does not open a scope of
//! its own; `for` scopes its init declaration over the whole construct.

use crate::ast::{Node, NodeKind};
use crate::common::{CompileError, CompileResult};
use crate::token::TokenKind;

use super::{Parser, SwitchFrame};

impl Parser {
    pub(super) fn stmt(&mut self) -> CompileResult<Node> {
        let tok = self.cursor.get();
        let span = tok.span;

        match tok.kind {
            TokenKind::Typedef => {
                let decl = self.declaration_type()?;
                self.env.bind_typedef(decl.name, decl.ty);
                Ok(Node::null(span))
            }

            TokenKind::If => {
                self.cursor.expect(&TokenKind::LParen)?;
                let cond = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                let then = self.stmt()?;
                let els = if self.cursor.consume(&TokenKind::Else) {
                    Some(Box::new(self.stmt()?))
                } else {
                    None
                };
                Ok(Node::new(
                    NodeKind::If {
                        cond: Box::new(cond),
                        then: Box::new(then),
                        els,
                    },
                    None,
                    span,
                ))
            }

            TokenKind::For => {
                let id = self.new_ctrl();
                self.cursor.expect(&TokenKind::LParen)?;
                self.env.push();
                self.breaks.push(id);
                self.continues.push(id);

                let init = if self.is_typename() {
                    Some(Box::new(self.declaration()?))
                } else if self.cursor.consume(&TokenKind::Semi) {
                    None
                } else {
                    Some(Box::new(self.expr_stmt()?))
                };

                let cond = if self.cursor.consume(&TokenKind::Semi) {
                    None
                } else {
                    let cond = self.expr()?;
                    self.cursor.expect(&TokenKind::Semi)?;
                    Some(Box::new(cond))
                };

                let inc = if self.cursor.consume(&TokenKind::RParen) {
                    None
                } else {
                    let inc = self.expr()?;
                    self.cursor.expect(&TokenKind::RParen)?;
                    Some(Box::new(inc))
                };

                let body = Box::new(self.stmt()?);

                self.breaks.pop();
                self.continues.pop();
                self.env.pop();
                Ok(Node::new(
                    NodeKind::For {
                        id,
                        init,
                        cond,
                        inc,
                        body,
                    },
                    None,
                    span,
                ))
            }

            TokenKind::While => {
                let id = self.new_ctrl();
                self.breaks.push(id);
                self.continues.push(id);

                self.cursor.expect(&TokenKind::LParen)?;
                let cond = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                let body = self.stmt()?;

                self.breaks.pop();
                self.continues.pop();
                Ok(Node::new(
                    NodeKind::For {
                        id,
                        init: None,
                        cond: Some(Box::new(cond)),
                        inc: None,
                        body: Box::new(body),
                    },
                    None,
                    span,
                ))
            }

            TokenKind::Do => {
                let id = self.new_ctrl();
                self.breaks.push(id);
                self.continues.push(id);

                let body = self.stmt()?;
                self.cursor.expect(&TokenKind::While)?;
                self.cursor.expect(&TokenKind::LParen)?;
                let cond = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                self.cursor.expect(&TokenKind::Semi)?;

                self.breaks.pop();
                self.continues.pop();
                Ok(Node::new(
                    NodeKind::DoWhile {
                        id,
                        body: Box::new(body),
                        cond: Box::new(cond),
                    },
                    None,
                    span,
                ))
            }

            TokenKind::Switch => {
                let id = self.new_ctrl();
                self.cursor.expect(&TokenKind::LParen)?;
                let cond = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;

                self.breaks.push(id);
                self.switches.push(SwitchFrame {
                    id,
                    cases: Vec::new(),
                });
                let body = self.stmt()?;
                let frame = self.switches.pop().expect("switch frame just pushed");
                self.breaks.pop();

                Ok(Node::new(
                    NodeKind::Switch {
                        id: frame.id,
                        cond: Box::new(cond),
                        body: Box::new(body),
                        cases: frame.cases,
                    },
                    None,
                    span,
                ))
            }

            TokenKind::Case => {
                if self.switches.is_empty() {
                    return Err(CompileError::parser("stray case", span));
                }
                let id = self.new_ctrl();
                let val = self.const_expr()?;
                self.cursor.expect(&TokenKind::Colon)?;
                let body = self.stmt()?;

                let frame = self.switches.last_mut().expect("checked non-empty above");
                frame.cases.push(id);
                Ok(Node::new(
                    NodeKind::Case {
                        id,
                        val,
                        body: Box::new(body),
                    },
                    None,
                    span,
                ))
            }

            TokenKind::Break => {
                let Some(target) = self.breaks.last().copied() else {
                    return Err(CompileError::parser("stray break", span));
                };
                Ok(Node::new(NodeKind::Break { target }, None, span))
            }

            TokenKind::Continue => {
                let Some(target) = self.continues.last().copied() else {
                    return Err(CompileError::parser("stray continue", span));
                };
                Ok(Node::new(NodeKind::Continue { target }, None, span))
            }

            TokenKind::Return => {
                let expr = self.expr()?;
                self.cursor.expect(&TokenKind::Semi)?;
                let span = span.merge(expr.span);
                Ok(Node::new(NodeKind::Return(Box::new(expr)), None, span))
            }

            TokenKind::LBrace => {
                self.env.push();
                let node = self.compound_stmt()?;
                self.env.pop();
                Ok(node)
            }

            TokenKind::Semi => Ok(Node::null(span)),

            _ => {
                self.cursor.unget(&tok);
                if self.is_typename() {
                    self.declaration()
                } else {
                    self.expr_stmt()
                }
            }
        }
    }

    /// Statements up to the closing `}` (already past the `{`); scope
    /// handling is the caller's business
    pub(super) fn compound_stmt(&mut self) -> CompileResult<Node> {
        let mut span = self.cursor.span();
        let mut stmts = Vec::new();
        loop {
            if self.cursor.peek().kind == TokenKind::RBrace {
                span = span.merge(self.cursor.get().span);
                break;
            }
            stmts.push(self.stmt()?);
        }
        Ok(Node::new(NodeKind::Block(stmts), None, span))
    }

    pub(super) fn expr_stmt(&mut self) -> CompileResult<Node> {
        let expr = self.expr()?;
        self.cursor.expect(&TokenKind::Semi)?;
        Ok(Node::expr_stmt(expr))
    }
}
