//! The per-binding reference model.

use strix_ast::NodeId;
use strix_common::Span;
use strix_scope::{BindingKind, ScopeId};

/// One textual occurrence of a name, resolved to a binding.
#[derive(Clone, Copy, Debug)]
pub struct Reference {
    /// The identifier node.
    pub node: NodeId,
    /// The scope the reference lexically appears in.
    pub scope: ScopeId,
    pub span: Span,
    /// The reference is a declaration site of the binding (first or
    /// repeated).
    pub is_declaration: bool,
    /// A declaration site that sits below the binding's owner scope (a
    /// hoisted `var` declared inside a nested block).
    pub is_hoisted_declaration: bool,
    /// Assigned to: assignment target, compound assignment, `++`/`--`,
    /// destructuring target, `for`-`in`/`of` target.
    pub is_lvalue: bool,
    /// The value is consumed. For declarations this is set only when the
    /// loop header itself uses the binding (`for (x of ...)`).
    pub is_read: bool,
    /// Declaration site with an initializer.
    pub is_initializing: bool,
    /// The declared kind at this site (repeated declarations may use a
    /// different keyword than the binding's first one).
    pub decl_kind: Option<BindingKind>,
    /// Inside the default-value expression of parameter `index` of the
    /// function scope. Cleared by nested function boundaries.
    pub in_default_of: Option<(ScopeId, u16)>,
    /// Inside an expression that evaluates before a declaration's binding
    /// initializes: the declarator's own initializer, or the right-hand
    /// side of a `for`-`in`/`of` header. Holds the guarding declarator or
    /// loop node. Cleared by nested function boundaries.
    pub eval_region: Option<NodeId>,
}

/// All references to one binding, in source order, with rollups the rules
/// consult without rescanning.
#[derive(Debug, Default)]
pub struct ReferenceCollection {
    pub refs: Vec<Reference>,
    /// Any reference consumed the value.
    pub has_read: bool,
    /// Any non-declaration reference wrote the binding.
    pub has_write: bool,
}

impl ReferenceCollection {
    pub fn push(&mut self, reference: Reference) {
        self.has_read |= reference.is_read;
        self.has_write |= reference.is_lvalue && !reference.is_declaration;
        self.refs.push(reference);
    }

    /// Declaration references in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &Reference> {
        self.refs.iter().filter(|r| r.is_declaration)
    }
}
