//! Abstract syntax tree
//!
//! The parser produces a fully-resolved tree: every name reference is an
//! `Rc<Var>` shared with the owning function or program, every `break`,
//! `continue` and `case` carries the [`CtrlId`] of the construct it targets,
//! and expression nodes carry the type known at parse time.

pub mod types;

use std::rc::Rc;

use crate::common::Span;
use types::{int_ty, ptr_to, Type};

/// Opaque handle identifying a control-flow construct (loop or switch).
///
/// `Break`/`Continue` nodes name their target with the same id as the
/// construct they jump out of, so a consumer can match them up without
/// back-pointers into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtrlId(pub u32);

/// A named variable, local or global
///
/// Created once by the parser and shared by reference everywhere it is used.
/// `ty` is `None` only for the synthesized temporaries of postfix `++`/`--`
/// and compound assignment before the operand type is known; the later pass
/// fills those in.
#[derive(Debug, PartialEq)]
pub struct Var {
    pub name: String,
    pub ty: Option<Type>,
    pub is_local: bool,
    /// Initial contents, for string-literal globals
    pub data: Option<Vec<u8>>,
}

impl Var {
    pub fn local(name: impl Into<String>, ty: Option<Type>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ty,
            is_local: true,
            data: None,
        })
    }

    pub fn global(name: impl Into<String>, ty: Type, data: Option<Vec<u8>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ty: Some(ty),
            is_local: false,
            data,
        })
    }
}

/// Binary operators (including assignment and comma)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    LogAnd,
    LogOr,
    Assign,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical `!`
    Not,
    /// Bitwise `~`
    BitNot,
}

/// An AST node: the kind payload plus the type and source range
#[derive(Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Type known at parse time; `None` where no value is produced
    pub ty: Option<Type>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum NodeKind {
    // === Expressions ===
    Num(i64),
    VarRef(Rc<Var>),
    BinOp {
        op: BinOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Addr(Box<Node>),
    Deref(Box<Node>),
    Member {
        base: Box<Node>,
        name: String,
    },
    Cond {
        cond: Box<Node>,
        then: Box<Node>,
        els: Box<Node>,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
    /// GNU statement expression `({ ... })`; `last` is the value-producing
    /// final expression, already unwrapped from its expression statement
    StmtExpr {
        stmts: Vec<Node>,
        last: Box<Node>,
    },

    // === Statements ===
    ExprStmt(Box<Node>),
    /// Declaration without observable effect (typedef, plain declaration)
    Null,
    If {
        cond: Box<Node>,
        then: Box<Node>,
        els: Option<Box<Node>>,
    },
    /// `for` and `while` loops; `while` leaves `init` and `inc` empty
    For {
        id: CtrlId,
        init: Option<Box<Node>>,
        cond: Option<Box<Node>>,
        inc: Option<Box<Node>>,
        body: Box<Node>,
    },
    DoWhile {
        id: CtrlId,
        body: Box<Node>,
        cond: Box<Node>,
    },
    Switch {
        id: CtrlId,
        cond: Box<Node>,
        body: Box<Node>,
        /// Ids of the `Case` nodes inside `body`, recorded as each case
        /// finishes parsing; chained labels register the inner case first
        cases: Vec<CtrlId>,
    },
    Case {
        id: CtrlId,
        val: i64,
        body: Box<Node>,
    },
    Break {
        target: CtrlId,
    },
    Continue {
        target: CtrlId,
    },
    Return(Box<Node>),
    Block(Vec<Node>),
    /// Function definition root; `body` is the `Block` of body statements
    Func {
        name: String,
        params: Vec<Rc<Var>>,
        body: Box<Node>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, ty: Option<Type>, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn num(val: i64, span: Span) -> Self {
        Self::new(NodeKind::Num(val), Some(int_ty()), span)
    }

    pub fn var_ref(var: Rc<Var>, span: Span) -> Self {
        let ty = var.ty.clone();
        Self::new(NodeKind::VarRef(var), ty, span)
    }

    /// Build a binary node, assigning the result type from the operands
    pub fn binop(op: BinOp, lhs: Node, rhs: Node) -> Self {
        let span = lhs.span.merge(rhs.span);
        let ty = match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::LogAnd | BinOp::LogOr => {
                Some(int_ty())
            }
            BinOp::Comma => rhs.ty.clone(),
            BinOp::Add | BinOp::Sub => match (&lhs.ty, &rhs.ty) {
                (Some(l), _) if l.base().is_some() => lhs.ty.clone(),
                (_, Some(r)) if r.base().is_some() => rhs.ty.clone(),
                _ => lhs.ty.clone().or_else(|| rhs.ty.clone()),
            },
            _ => lhs.ty.clone().or_else(|| rhs.ty.clone()),
        };
        Self::new(
            NodeKind::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    pub fn unary(op: UnaryOp, operand: Node, span: Span) -> Self {
        Self::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Some(int_ty()),
            span,
        )
    }

    pub fn addr(operand: Node, span: Span) -> Self {
        let ty = operand.ty.clone().map(ptr_to);
        Self::new(NodeKind::Addr(Box::new(operand)), ty, span)
    }

    /// Dereference; the result type is the pointee (or element) type
    pub fn deref(operand: Node, span: Span) -> Self {
        let ty = operand.ty.as_ref().and_then(|t| t.base().cloned());
        Self::new(NodeKind::Deref(Box::new(operand)), ty, span)
    }

    pub fn expr_stmt(expr: Node) -> Self {
        let span = expr.span;
        Self::new(NodeKind::ExprStmt(Box::new(expr)), None, span)
    }

    pub fn null(span: Span) -> Self {
        Self::new(NodeKind::Null, None, span)
    }
}

/// A parsed function definition
#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: String,
    /// `NodeKind::Func` node wrapping the body block
    pub body: Node,
    /// Parameters, in declaration order
    pub params: Vec<Rc<Var>>,
    /// All locals in declaration order, synthesized temporaries included
    pub lvars: Vec<Rc<Var>>,
    /// Filled by the later lowering phase
    pub bbs: Vec<BasicBlock>,
}

/// Placeholder for the lowering phase; the parser leaves these empty
#[derive(Debug, PartialEq)]
pub struct BasicBlock {
    pub label: u32,
}

/// A whole translation unit
#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub gvars: Vec<Rc<Var>>,
    pub funcs: Vec<Function>,
}
