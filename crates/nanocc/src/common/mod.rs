//! Common infrastructure shared across the front end

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, ParseWarning};
pub use span::Span;
