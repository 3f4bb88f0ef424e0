//! Declaration parsing
//!
//! Declarators are parsed in two phases: the syntax is collected into a
//! [`DeclShape`] (pointer depth, name or nested declarator, array
//! dimensions), then finalized against the base type once it is known. Per
//! nesting level pointers wrap the base first, then array dimensions compose
//! innermost-first, then the nested shape is finalized with the result as its
//! base. That gives `int *x[3]` an array of pointers and `int (*x)[3]` a
//! pointer to an array.

use std::rc::Rc;

use crate::ast::types::{
    ary_of, bool_ty, char_ty, incomplete_struct, int_ty, ptr_to, struct_of, void_ty, Type,
};
use crate::ast::{BinOp, Node, NodeKind, Var};
use crate::common::{CompileError, CompileResult, Span};
use crate::token::TokenKind;

use super::Parser;

/// A finished declarator: the declared name and its full type
pub(super) struct DeclInfo {
    pub name: String,
    pub ty: Type,
    pub init: Option<Node>,
    pub span: Span,
}

/// Syntactic shape of one declarator nesting level
struct DeclShape {
    ptr_depth: usize,
    form: DeclForm,
    dims: Vec<Option<usize>>,
    init: Option<Node>,
    span: Span,
}

enum DeclForm {
    Name(String),
    Nested(Box<DeclShape>),
}

impl Parser {
    /// Whether the current token can begin a declaration
    pub(super) fn is_typename(&self) -> bool {
        match &self.cursor.peek().kind {
            TokenKind::Identifier(name) => self.env.find_typedef(name).is_some(),
            kind => kind.is_type_keyword(),
        }
    }

    /// declaration specifiers: a basic type keyword, a typedef name,
    /// `typeof(expr)`, or a struct specifier
    pub(super) fn decl_specifiers(&mut self) -> CompileResult<Type> {
        let tok = self.cursor.get();
        match tok.kind {
            TokenKind::Void => Ok(void_ty()),
            TokenKind::Bool => Ok(bool_ty()),
            TokenKind::Char => Ok(char_ty()),
            TokenKind::Int => Ok(int_ty()),
            TokenKind::Identifier(name) => self
                .env
                .find_typedef(&name)
                .cloned()
                .ok_or_else(|| CompileError::parser("typename expected", tok.span)),
            TokenKind::Typeof => {
                self.cursor.expect(&TokenKind::LParen)?;
                let node = self.expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                let span = node.span;
                node.ty
                    .ok_or_else(|| CompileError::parser("operand of typeof has no type", span))
            }
            TokenKind::Struct => self.struct_specifier(tok.span),
            _ => Err(CompileError::parser("typename expected", tok.span)),
        }
    }

    /// `struct tag? { member-declarations }?`
    fn struct_specifier(&mut self, span: Span) -> CompileResult<Type> {
        let tag = if matches!(self.cursor.peek().kind, TokenKind::Identifier(_)) {
            Some(self.ident()?.0)
        } else {
            None
        };

        let known = tag
            .as_deref()
            .and_then(|t| self.env.find_tag(t))
            .cloned();

        let ty = if self.cursor.consume(&TokenKind::LBrace) {
            let mut members = Vec::new();
            while !self.cursor.consume(&TokenKind::RBrace) {
                let member = self.declaration_type()?;
                members.push((member.name, member.ty));
            }
            struct_of(members)
        } else if let Some(found) = known {
            found
        } else if tag.is_some() {
            incomplete_struct()
        } else {
            return Err(CompileError::parser("bad struct definition", span));
        };

        if let Some(tag) = tag {
            self.env.bind_tag(tag, ty.clone());
        }
        Ok(ty)
    }

    /// `*`* direct-declarator `[dims]`* `= init`?
    pub(super) fn declarator(&mut self, base: Type) -> CompileResult<DeclInfo> {
        let shape = self.declarator_shape()?;
        Ok(finalize(shape, base))
    }

    fn declarator_shape(&mut self) -> CompileResult<DeclShape> {
        let start = self.cursor.span();
        let mut ptr_depth = 0;
        while self.cursor.consume(&TokenKind::Star) {
            ptr_depth += 1;
        }

        let form = if matches!(self.cursor.peek().kind, TokenKind::Identifier(_)) {
            DeclForm::Name(self.ident()?.0)
        } else if self.cursor.consume(&TokenKind::LParen) {
            let inner = self.declarator_shape()?;
            self.cursor.expect(&TokenKind::RParen)?;
            DeclForm::Nested(Box::new(inner))
        } else {
            return Err(CompileError::parser(
                "bad direct-declarator",
                self.cursor.span(),
            ));
        };

        let dims = self.read_array_dims()?;
        let init = if self.cursor.consume(&TokenKind::Eq) {
            Some(self.assign()?)
        } else {
            None
        };
        let span = start.merge(self.cursor.span());
        Ok(DeclShape {
            ptr_depth,
            form,
            dims,
            init,
            span,
        })
    }

    /// `[n]`* suffix; an empty `[]` yields an unknown length
    fn read_array_dims(&mut self) -> CompileResult<Vec<Option<usize>>> {
        let mut dims = Vec::new();
        while self.cursor.consume(&TokenKind::LBracket) {
            if self.cursor.consume(&TokenKind::RBracket) {
                dims.push(None);
                continue;
            }
            dims.push(Some(self.const_usize()?));
            self.cursor.expect(&TokenKind::RBracket)?;
        }
        Ok(dims)
    }

    /// Apply an array suffix to `ty`; used for top-level variables where no
    /// nested declarator syntax is allowed
    pub(super) fn read_array(&mut self, ty: Type) -> CompileResult<Type> {
        let dims = self.read_array_dims()?;
        Ok(compose_arrays(ty, &dims))
    }

    /// A constant expression: a literal only, no folding
    pub(super) fn const_expr(&mut self) -> CompileResult<i64> {
        let span = self.cursor.span();
        let node = self.expr()?;
        match node.kind {
            NodeKind::Num(val) => Ok(val),
            _ => Err(CompileError::parser("constant expression expected", span)),
        }
    }

    fn const_usize(&mut self) -> CompileResult<usize> {
        let span = self.cursor.span();
        let val = self.const_expr()?;
        usize::try_from(val)
            .map_err(|_| CompileError::parser("array length out of range", span))
    }

    /// specifiers declarator `;`: the syntactic form shared by typedefs and
    /// struct members; nothing is bound or allocated
    pub(super) fn declaration_type(&mut self) -> CompileResult<DeclInfo> {
        let ty = self.decl_specifiers()?;
        let decl = self.declarator(ty)?;
        self.cursor.expect(&TokenKind::Semi)?;
        Ok(decl)
    }

    /// A local variable declaration statement.
    ///
    /// `T v = init` is split into the declaration and a separate `v = init`
    /// expression statement; without an initializer the statement is a no-op
    /// node.
    pub(super) fn declaration(&mut self) -> CompileResult<Node> {
        let ty = self.decl_specifiers()?;
        let decl = self.declarator(ty)?;
        self.cursor.expect(&TokenKind::Semi)?;

        let span = decl.span;
        let var = Var::local(&decl.name, Some(decl.ty));
        self.env.bind_var(&decl.name, Rc::clone(&var));
        self.lvars.push(Rc::clone(&var));

        let Some(init) = decl.init else {
            return Ok(Node::null(span));
        };
        let lhs = Node::var_ref(var, span);
        Ok(Node::expr_stmt(Node::binop(BinOp::Assign, lhs, init)))
    }

    /// One function parameter; array parameters decay to pointers
    pub(super) fn param_declaration(&mut self) -> CompileResult<Rc<Var>> {
        let ty = self.decl_specifiers()?;
        let decl = self.declarator(ty)?;
        Ok(Var::local(&decl.name, Some(decl.ty.decay())))
    }
}

/// Resolve a declarator shape against the base type
fn finalize(shape: DeclShape, base: Type) -> DeclInfo {
    let mut ty = base;
    for _ in 0..shape.ptr_depth {
        ty = ptr_to(ty);
    }
    ty = compose_arrays(ty, &shape.dims);

    match shape.form {
        DeclForm::Name(name) => DeclInfo {
            name,
            ty,
            init: shape.init,
            span: shape.span,
        },
        DeclForm::Nested(inner) => {
            let mut info = finalize(*inner, ty);
            // The initializer can only have been consumed at the outermost
            // level, after the closing paren.
            if info.init.is_none() {
                info.init = shape.init;
            }
            info.span = shape.span;
            info
        }
    }
}

/// The first dimension written is the outermost array
fn compose_arrays(ty: Type, dims: &[Option<usize>]) -> Type {
    dims.iter()
        .rev()
        .fold(ty, |ty, len| ary_of(ty, *len))
}
