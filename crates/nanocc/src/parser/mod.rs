//! Recursive-descent parser
//!
//! Builds the AST from a token stream in a single forward pass. Name
//! resolution happens here: a `Var` is created at its definition and shared
//! by reference at every use. Types are attached to variables and literals
//! as they are parsed; nodes whose type cannot be known yet are left untyped
//! for the later pass.
//!
//! Semantic checking is deliberately thin so the code stays close to the
//! grammar. Invalid expressions such as `1+2=3` are accepted here and
//! rejected later.

mod cursor;
mod decl;
mod expr;
mod scope;
mod stmt;

use std::mem;
use std::rc::Rc;

use crate::ast::types::{func_ty, ptr_to, Type};
use crate::ast::{CtrlId, Function, Node, NodeKind, Program, Var};
use crate::common::{CompileError, CompileResult, ParseWarning, Span};
use crate::token::{Token, TokenKind};
use cursor::TokenCursor;
use scope::Env;

/// Parse an `Eof`-terminated token stream into a program.
///
/// Warnings (currently only "undefined function") are returned alongside the
/// program; any error aborts the parse.
pub fn parse(tokens: Vec<Token>) -> CompileResult<(Program, Vec<ParseWarning>)> {
    let mut parser = Parser::new(tokens);
    let prog = parser.parse()?;
    Ok((prog, parser.warnings))
}

/// An in-progress `switch`: its id plus the `case` ids collected so far
struct SwitchFrame {
    id: CtrlId,
    cases: Vec<CtrlId>,
}

/// Parser state for one translation unit.
///
/// Everything mutable lives here: the cursor, the scope stack, the locals of
/// the function being parsed, and the stacks that give `break`, `continue`
/// and `case` their targets.
pub struct Parser {
    cursor: TokenCursor,
    env: Env,
    prog: Program,
    /// Locals of the function currently being parsed, in declaration order
    lvars: Vec<Rc<Var>>,
    breaks: Vec<CtrlId>,
    continues: Vec<CtrlId>,
    switches: Vec<SwitchFrame>,
    next_ctrl: u32,
    /// Label counter for string-literal globals, starting at 1
    next_str_label: u32,
    warnings: Vec<ParseWarning>,
}

impl Parser {
    /// The token vector must end with exactly one `Eof` token.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            env: Env::new(),
            prog: Program::default(),
            lvars: Vec::new(),
            breaks: Vec::new(),
            continues: Vec::new(),
            switches: Vec::new(),
            next_ctrl: 0,
            next_str_label: 1,
            warnings: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> CompileResult<Program> {
        while self.cursor.peek().kind != TokenKind::Eof {
            self.toplevel()?;
        }
        Ok(mem::take(&mut self.prog))
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    // === Top-level declarations ===

    fn toplevel(&mut self) -> CompileResult<()> {
        let is_typedef = self.cursor.consume(&TokenKind::Typedef);
        let is_extern = self.cursor.consume(&TokenKind::Extern);

        let mut ty = self.decl_specifiers()?;
        while self.cursor.consume(&TokenKind::Star) {
            ty = ptr_to(ty);
        }

        let (name, _) = self.ident()?;

        // Function prototype or definition
        if self.cursor.consume(&TokenKind::LParen) {
            let mut params = Vec::new();
            while !self.cursor.consume(&TokenKind::RParen) {
                if !params.is_empty() {
                    self.cursor.expect(&TokenKind::Comma)?;
                }
                params.push(self.param_declaration()?);
            }

            if self.cursor.consume(&TokenKind::Semi) {
                // Prototype: parsed and discarded. Calls to a function that
                // has no definition in this unit still warn.
                return Ok(());
            }

            self.function_definition(name, ty, params, is_typedef)?;
            return Ok(());
        }

        ty = self.read_array(ty)?;
        self.cursor.expect(&TokenKind::Semi)?;

        if is_typedef {
            self.env.bind_typedef(name, ty);
            return Ok(());
        }

        // Global variable
        let var = Var::global(&name, ty, None);
        self.env.bind_var(name, Rc::clone(&var));
        if !is_extern {
            self.prog.gvars.push(var);
        }
        Ok(())
    }

    fn function_definition(
        &mut self,
        name: String,
        returning: Type,
        params: Vec<Rc<Var>>,
        is_typedef: bool,
    ) -> CompileResult<()> {
        self.lvars = Vec::new();
        self.breaks.clear();
        self.continues.clear();
        self.switches.clear();

        // Bind the name in the file scope before the body so the function
        // can call itself without a warning.
        let funty = func_ty(returning);
        self.env
            .bind_var(&name, Var::global(&name, funty, None));

        let brace_span = self.cursor.span();
        self.cursor.expect(&TokenKind::LBrace)?;
        if is_typedef {
            return Err(CompileError::parser(
                "typedef has function definition",
                brace_span,
            ));
        }

        self.env.push();
        for param in &params {
            self.env.bind_var(&param.name, Rc::clone(param));
            self.lvars.push(Rc::clone(param));
        }
        let block = self.compound_stmt()?;
        self.env.pop();

        let span = block.span;
        let body = Node::new(
            NodeKind::Func {
                name: name.clone(),
                params: params.clone(),
                body: Box::new(block),
            },
            None,
            span,
        );

        self.prog.funcs.push(Function {
            name,
            body,
            params,
            lvars: mem::take(&mut self.lvars),
            bbs: Vec::new(),
        });
        Ok(())
    }

    // === Shared helpers ===

    fn ident(&mut self) -> CompileResult<(String, Span)> {
        let tok = self.cursor.get();
        match tok.kind {
            TokenKind::Identifier(name) => Ok((name, tok.span)),
            _ => Err(CompileError::parser("identifier expected", tok.span)),
        }
    }

    fn new_ctrl(&mut self) -> CtrlId {
        let id = CtrlId(self.next_ctrl);
        self.next_ctrl += 1;
        id
    }

    /// Register a local with the current function without binding it in
    /// scope; used for the synthesized desugaring temporaries.
    fn new_tmp(&mut self, ty: Option<Type>) -> Rc<Var> {
        let var = Var::local(".tmp", ty);
        self.lvars.push(Rc::clone(&var));
        var
    }

    fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.warnings.push(ParseWarning::new(message, span));
    }
}
