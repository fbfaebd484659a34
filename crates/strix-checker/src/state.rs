//! Shared pass state.
//!
//! `CheckerState` owns everything the walk and the rules share: the input
//! AST and scope tree, the per-binding reference collections, the scope
//! stack, and the diagnostic sink. The walk lives in `state_traversal`,
//! the rules in `state_rules`.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use strix_ast::Ast;
use strix_common::diagnostics::format_message;
use strix_common::{Atom, Diagnostic, DiagnosticCategory, Span};
use strix_scope::{BindingId, ScopeId, ScopeTree};

use crate::diagnostics::DiagnosticKind;
use crate::options::CheckOptions;
use crate::reference::ReferenceCollection;

/// A global-scope collision between two hoisted declarations of one name.
/// The pass does not report these itself; the global VarCheck pass does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalVarCollision {
    pub name: String,
    pub first: Span,
    pub second: Span,
}

/// The output of one run over a compilation unit.
#[derive(Debug, Default)]
pub struct CheckResult {
    /// Findings, ordered by source position.
    pub diagnostics: Vec<Diagnostic>,
    /// Signals for the VarCheck collaborator.
    pub global_var_collisions: Vec<GlobalVarCollision>,
    /// The run was cancelled; queued diagnostics are still valid.
    pub cancelled: bool,
}

pub struct CheckerState<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) scopes: &'a ScopeTree,
    pub(crate) file: String,
    pub(crate) options: CheckOptions,
    pub(crate) scope_stack: Vec<ScopeId>,
    pub(crate) collections: FxHashMap<BindingId, ReferenceCollection>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) collisions: Vec<GlobalVarCollision>,
    /// Names mentioned in `@type`/`@typedef` annotations anywhere in the
    /// file; such names count as used.
    pub(crate) jsdoc_type_names: FxHashSet<Atom>,
    pub(crate) cancelled: bool,
}

impl<'a> CheckerState<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a ScopeTree, file: &str, options: CheckOptions) -> Self {
        CheckerState {
            ast,
            scopes,
            file: file.to_string(),
            options,
            scope_stack: Vec::new(),
            collections: FxHashMap::default(),
            diagnostics: Vec::new(),
            collisions: Vec::new(),
            jsdoc_type_names: ast.jsdoc_type_names(),
            cancelled: false,
        }
    }

    pub fn run(mut self) -> CheckResult {
        // Externs describe the ambient environment; nothing in them is
        // this pass's business.
        if self.scopes.is_externs {
            debug!(file = %self.file, "externs input, skipping");
            return CheckResult::default();
        }
        let root_node = self.scopes.scope(self.scopes.root).node;
        self.traverse(root_node);
        // Rules fire at scope exit (post-order); re-establish source order
        // for the sink. The sort is stable, so same-position diagnostics
        // keep their emission order.
        self.diagnostics.sort_by_key(|d| d.span.start);
        self.collisions.sort_by_key(|c| c.second.start);
        CheckResult {
            diagnostics: self.diagnostics,
            global_var_collisions: self.collisions,
            cancelled: self.cancelled,
        }
    }

    pub(crate) fn current_scope(&self) -> ScopeId {
        *self
            .scope_stack
            .last()
            .expect("the scope stack is never empty during the walk")
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Span, name: &str) {
        debug!(kind = kind.name(), name, %span, "diagnostic");
        let message = format_message(kind.message_template(), &[name]);
        let diagnostic = match kind.category() {
            DiagnosticCategory::Error => {
                Diagnostic::error(self.file.as_str(), span, message, kind.code())
            }
            _ => Diagnostic::warning(self.file.as_str(), span, message, kind.code()),
        };
        self.diagnostics.push(diagnostic);
    }
}
