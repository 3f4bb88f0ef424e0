//! nanocc: front end of a small C compiler.
//!
//! This crate turns an `Eof`-terminated token stream into a typed,
//! scope-resolved AST in a single forward pass. Parsing, name resolution,
//! declarator/type construction (including struct layout) and the desugaring
//! of postfix `++`/`--` and compound assignment all happen here; semantic
//! checking, lowering and code generation belong to later phases.
//!
//! ```
//! use logos::Logos;
//! use nanocc::common::Span;
//! use nanocc::token::{Token, TokenKind};
//!
//! let source = "int main() { return 42; }";
//! let mut lexer = TokenKind::lexer(source);
//! let mut tokens = Vec::new();
//! while let Some(kind) = lexer.next() {
//!     let span = Span::new(lexer.span().start, lexer.span().end);
//!     tokens.push(Token::new(kind.unwrap(), span));
//! }
//! tokens.push(Token::new(TokenKind::Eof, Span::new(source.len(), source.len())));
//!
//! let (program, warnings) = nanocc::parse(tokens).unwrap();
//! assert_eq!(program.funcs[0].name, "main");
//! assert!(warnings.is_empty());
//! ```

pub mod ast;
pub mod common;
pub mod parser;
pub mod token;

pub use common::{CompileError, CompileResult, DiagnosticReporter, ParseWarning};
pub use parser::{parse, Parser};
