//! Variable-reference checking.
//!
//! A single pass over a parsed program with a resolved scope tree that
//! reports misuse of bindings: redeclarations, references before
//! declaration (including temporal-dead-zone violations for block-scoped
//! bindings), writes to immutable bindings, block-scoped declarations
//! outside block context, and (opt-in) local assignments that are never
//! read.
//!
//! The pass walks the AST once in source order, aggregating every textual
//! occurrence of a name into a per-binding reference list, and fires its
//! rules for each binding only after the binding's scope has been fully
//! collected. Diagnostics are data on the [`CheckResult`]; the pass never
//! aborts on a finding.
//!
//! ```
//! # use strix_checker::{CheckOptions, check};
//! # fn demo(ast: &strix_ast::Ast, scopes: &strix_scope::ScopeTree) {
//! let result = check(ast, scopes, "input.js", CheckOptions::default());
//! for diag in &result.diagnostics {
//!     println!("{}: {}", diag.span, diag.message_text);
//! }
//! # }
//! ```

pub mod diagnostics;
pub mod options;
pub mod reference;
mod state;
mod state_rules;
mod state_traversal;

pub use diagnostics::{DiagnosticKind, diagnostic_codes};
pub use options::CheckOptions;
pub use reference::{Reference, ReferenceCollection};
pub use state::{CheckResult, CheckerState, GlobalVarCollision};

use strix_ast::Ast;
use strix_scope::ScopeTree;

/// Run the pass over one compilation unit.
pub fn check(ast: &Ast, scopes: &ScopeTree, file: &str, options: CheckOptions) -> CheckResult {
    CheckerState::new(ast, scopes, file, options).run()
}
