//! Shared base types for the strix front-end.
//!
//! This crate is the bottom of the dependency stack: spans, string
//! interning, diagnostics-as-data, and the cancellation token. Nothing in
//! here knows about the AST or the scope tree.

pub mod cancel;
pub mod diagnostics;
pub mod interner;
pub mod span;

pub use cancel::CancelToken;
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use interner::{Atom, Interner};
pub use span::{Span, Spanned};
