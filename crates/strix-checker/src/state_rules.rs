//! The rule engine.
//!
//! Runs once per binding when the binding's scope exits, over the complete
//! reference list. Rule order is fixed (block-context, redeclaration, early
//! reference, constant reassignment, unused assignment) and the first rule
//! that reports wins; a binding produces at most one diagnostic per rule.

use tracing::trace;

use strix_ast::{NodeId, NodeKind};
use strix_scope::{Binding, BindingId, BindingKind, ScopeId, ScopeKind};

use crate::diagnostics::DiagnosticKind;
use crate::reference::ReferenceCollection;
use crate::state::{CheckerState, GlobalVarCollision};

impl<'a> CheckerState<'a> {
    pub(crate) fn check_scope(&mut self, sid: ScopeId) {
        trace!(scope = sid.index(), "firing rules for scope");
        let order: Vec<BindingId> = self.scopes.scope(sid).bindings().to_vec();
        for bid in order {
            // The collection is complete: every reference to this binding
            // lies inside the scope that is exiting now.
            let collection = self.collections.remove(&bid).unwrap_or_default();
            self.check_binding(bid, &collection);
        }
    }

    fn check_binding(&mut self, bid: BindingId, coll: &ReferenceCollection) {
        let scopes = self.scopes;
        let binding = scopes.binding(bid);
        if self.check_block_context(binding) {
            return;
        }
        if self.check_redeclaration(bid, binding, coll) {
            return;
        }
        if self.check_early_references(binding, coll) {
            return;
        }
        if self.check_const_reassignment(binding, coll) {
            return;
        }
        if self.options.unused_local_assignments {
            self.check_unused(binding, coll);
        }
    }

    // ------------------------------------------------------------------
    // Block-scoped declarations outside block context
    // ------------------------------------------------------------------

    fn check_block_context(&mut self, binding: &Binding) -> bool {
        if !matches!(
            binding.kind,
            BindingKind::Let | BindingKind::Const | BindingKind::Class | BindingKind::FunctionDecl
        ) {
            return false;
        }
        if self.is_bleeding_name(binding) {
            return false;
        }
        let Some(stmt) = self.declaration_statement(binding) else {
            return false;
        };
        let Some(parent) = self.ast.parent(stmt) else {
            return false;
        };
        let bare_body = match self.ast.kind(parent) {
            NodeKind::If { cons, alt, .. } => *cons == stmt || *alt == Some(stmt),
            NodeKind::While { body, .. }
            | NodeKind::DoWhile { body, .. }
            | NodeKind::With { body, .. }
            | NodeKind::Labeled { body, .. }
            | NodeKind::For { body, .. }
            | NodeKind::ForIn { body, .. }
            | NodeKind::ForOf { body, .. } => *body == stmt,
            _ => false,
        };
        if bare_body {
            let name = self.ast.name_of(binding.name).to_string();
            self.report(
                DiagnosticKind::DeclarationNotDirectlyInBlock,
                self.ast.span(stmt),
                &name,
            );
            return true;
        }
        false
    }

    /// The statement introducing the binding: the `var`/`let`/`const`
    /// statement, or the function/class declaration itself.
    fn declaration_statement(&self, binding: &Binding) -> Option<NodeId> {
        match binding.kind {
            BindingKind::FunctionDecl | BindingKind::Class => self.ast.parent(binding.decl_node),
            BindingKind::Let | BindingKind::Const | BindingKind::Var => self
                .ast
                .ancestors(binding.decl_node)
                .find(|&a| matches!(self.ast.kind(a), NodeKind::VarStmt { .. })),
            _ => None,
        }
    }

    /// A function or class expression's own name, visible only inside it.
    fn is_bleeding_name(&self, binding: &Binding) -> bool {
        self.ast.parent(binding.decl_node).is_some_and(|p| match self.ast.kind(p) {
            NodeKind::FunctionExpr { name, .. } | NodeKind::ClassExpr { name, .. } => {
                *name == Some(binding.decl_node)
            }
            _ => false,
        })
    }

    // ------------------------------------------------------------------
    // Redeclaration
    // ------------------------------------------------------------------

    fn check_redeclaration(
        &mut self,
        bid: BindingId,
        binding: &Binding,
        coll: &ReferenceCollection,
    ) -> bool {
        let scopes = self.scopes;
        let name = self.ast.name_of(binding.name).to_string();
        let mut seen_first = false;
        for r in coll.declarations() {
            // A `var` declared below its owner scope collides with any
            // block-scoped binding of the same name it hoists across; this
            // is where `if (a) { let x; var x; }` and the catch-parameter
            // `var` collisions are caught.
            if r.decl_kind == Some(BindingKind::Var)
                && r.scope != binding.scope
                && let Some(other) = self.crossed_shadow(r.scope, binding.scope, bid, binding)
            {
                let other_is_catch =
                    scopes.binding(other).kind == BindingKind::CatchParam;
                // Suppression does not cover collisions with a catch
                // parameter; the shadowing is real at runtime.
                if other_is_catch || !self.pair_suppressed(binding, r.node) {
                    self.report(DiagnosticKind::RedeclaredVariableError, r.span, &name);
                    return true;
                }
            }
            if !seen_first {
                seen_first = true;
                continue;
            }
            // A repeated declaration in the binding's own scope.
            let site_kind = r.decl_kind.unwrap_or(binding.kind);
            if self.is_bleeding_name(binding) {
                // Shadowing a function expression's own name is harmless;
                // the outer world never sees it.
                continue;
            }
            let catch_involved = binding.kind == BindingKind::CatchParam
                || site_kind == BindingKind::CatchParam;
            if !catch_involved && self.pair_suppressed(binding, r.node) {
                continue;
            }
            if catch_involved
                || binding.kind.is_block_scoped()
                || site_kind.is_block_scoped()
            {
                self.report(DiagnosticKind::RedeclaredVariableError, r.span, &name);
                return true;
            }
            if scopes.scope(binding.scope).kind == ScopeKind::Global {
                // Global hoisted collisions belong to VarCheck.
                self.collisions.push(GlobalVarCollision {
                    name,
                    first: self.ast.span(binding.decl_node),
                    second: r.span,
                });
                return true;
            }
            self.report(DiagnosticKind::RedeclaredVariable, r.span, &name);
            return true;
        }
        false
    }

    /// A block-scoped binding of the same name owned by a scope strictly
    /// between a declaration site and the binding's owner scope.
    fn crossed_shadow(
        &self,
        from: ScopeId,
        to: ScopeId,
        bid: BindingId,
        binding: &Binding,
    ) -> Option<BindingId> {
        let scopes = self.scopes;
        let mut current = from;
        while current != to {
            let scope = scopes.scope(current);
            if let Some(other) = scope.get(binding.name)
                && other != bid
                && scopes.binding(other).kind.is_block_scoped()
            {
                return Some(other);
            }
            current = scope.parent?;
        }
        None
    }

    fn pair_suppressed(&self, binding: &Binding, site: NodeId) -> bool {
        binding.suppress_duplicate || self.ast.suppresses_duplicate(site)
    }

    // ------------------------------------------------------------------
    // Early references
    // ------------------------------------------------------------------

    fn check_early_references(&mut self, binding: &Binding, coll: &ReferenceCollection) -> bool {
        let scopes = self.scopes;
        let decl_pos = self.ast.span(binding.decl_node).start;
        let guard = self.decl_guard(binding);
        let name = self.ast.name_of(binding.name).to_string();

        for r in coll.refs.iter().filter(|r| !r.is_declaration) {
            // Default-parameter expressions evaluate before the body runs
            // and before later parameters initialize.
            if let Some((fn_scope, param_index)) = r.in_default_of
                && fn_scope == binding.scope
            {
                match binding.kind {
                    BindingKind::Param => {
                        if binding.param_index.unwrap_or(0) >= param_index {
                            self.report(DiagnosticKind::EarlyReferenceError, r.span, &name);
                            return true;
                        }
                        continue;
                    }
                    _ => {
                        // A body-declared name read while the parameters
                        // initialize. If an outer scope also binds the
                        // name, that is what the default will see.
                        let outer = scopes
                            .scope(binding.scope)
                            .parent
                            .and_then(|p| scopes.lookup(p, binding.name));
                        if outer.is_some() {
                            continue;
                        }
                        self.report(DiagnosticKind::EarlyReferenceError, r.span, &name);
                        return true;
                    }
                }
            }

            // The declarator's own initializer and the right-hand side of a
            // declaring for-in/for-of header evaluate before the binding
            // initializes. `var x = x || {}` is the deliberate guard idiom;
            // for block-scoped bindings the same shape is a TDZ read.
            if let Some(region) = r.eval_region
                && Some(region) == guard
            {
                if binding.kind.is_block_scoped() {
                    self.report(DiagnosticKind::EarlyReferenceError, r.span, &name);
                    return true;
                }
                continue;
            }

            if r.span.start >= decl_pos {
                continue;
            }
            // Visible from scope entry: nothing to report for body
            // references.
            if binding.hoisted_fn
                || matches!(
                    binding.kind,
                    BindingKind::Param | BindingKind::Import | BindingKind::CatchParam
                )
            {
                continue;
            }
            // A reference inside a nested function runs after the
            // declaration does.
            if self.is_deferred(r.scope, binding.scope) {
                continue;
            }
            if binding.kind.is_block_scoped() {
                self.report(DiagnosticKind::EarlyReferenceError, r.span, &name);
            } else {
                // `var`, or a function declaration trapped in a block.
                self.report(DiagnosticKind::EarlyReference, r.span, &name);
            }
            return true;
        }
        false
    }

    /// The node whose evaluation precedes this binding's initialization:
    /// its declarator, or the whole loop header when the binding is
    /// declared by `for`-`in`/`of`.
    fn decl_guard(&self, binding: &Binding) -> Option<NodeId> {
        let mut declarator = None;
        for anc in self.ast.ancestors(binding.decl_node) {
            match self.ast.kind(anc) {
                NodeKind::VarDeclarator { .. } => declarator = Some(anc),
                NodeKind::VarStmt { .. } => {
                    if let Some(parent) = self.ast.parent(anc) {
                        match self.ast.kind(parent) {
                            NodeKind::ForIn { left, .. } | NodeKind::ForOf { left, .. }
                                if *left == anc =>
                            {
                                return Some(parent);
                            }
                            _ => {}
                        }
                    }
                    return declarator;
                }
                NodeKind::Program { .. }
                | NodeKind::Block { .. }
                | NodeKind::FunctionDecl { .. }
                | NodeKind::FunctionExpr { .. }
                | NodeKind::ArrowFunc { .. }
                | NodeKind::Catch { .. } => return None,
                _ => {}
            }
        }
        None
    }

    /// Whether a function boundary separates the reference's scope from the
    /// binding's scope; references inside nested functions are deferred and
    /// never early.
    fn is_deferred(&self, from: ScopeId, to: ScopeId) -> bool {
        let scopes = self.scopes;
        let mut current = from;
        while current != to {
            let scope = scopes.scope(current);
            if scope.kind == ScopeKind::Function {
                return true;
            }
            match scope.parent {
                Some(parent) => current = parent,
                None => {
                    debug_assert!(false, "reference scope must descend from binding scope");
                    return false;
                }
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Reassigned constants
    // ------------------------------------------------------------------

    fn check_const_reassignment(&mut self, binding: &Binding, coll: &ReferenceCollection) -> bool {
        if !binding.kind.is_immutable() {
            return false;
        }
        let Some(write) = coll.refs.iter().find(|r| r.is_lvalue && !r.is_declaration) else {
            return false;
        };
        let name = self.ast.name_of(binding.name).to_string();
        self.report(DiagnosticKind::ReassignedConstant, write.span, &name);
        true
    }

    // ------------------------------------------------------------------
    // Unused local assignments (opt-in)
    // ------------------------------------------------------------------

    fn check_unused(&mut self, binding: &Binding, coll: &ReferenceCollection) {
        let scopes = self.scopes;
        // goog.scope aliases may be referenced from type annotations the
        // pass cannot see.
        if scopes
            .chain(binding.scope)
            .any(|s| scopes.scope(s).is_goog_scope_body)
        {
            return;
        }
        // Global bindings (including `var`s hoisted out of global blocks)
        // are out of scope here; module-top bindings are module-local and
        // do qualify.
        if scopes.scope(binding.scope).kind == ScopeKind::Global {
            return;
        }
        match binding.kind {
            BindingKind::Param | BindingKind::CatchParam | BindingKind::FunctionDecl => return,
            BindingKind::Import if !self.options.unused_imports => return,
            _ => {}
        }
        if binding.is_typedef || binding.from_destructuring {
            return;
        }
        if binding.scope == scopes.root && scopes.is_exported(binding.name) {
            return;
        }
        if self.jsdoc_type_names.contains(&binding.name) {
            return;
        }
        if self.is_module_alias_init(binding) {
            return;
        }
        if coll.has_read {
            return;
        }
        let site = coll
            .refs
            .iter()
            .rev()
            .find(|r| r.is_lvalue || (r.is_declaration && r.is_initializing))
            .map(|r| r.span)
            .unwrap_or_else(|| self.ast.span(binding.decl_node));
        let name = self.ast.name_of(binding.name).to_string();
        self.report(DiagnosticKind::UnusedLocalAssignment, site, &name);
    }

    /// Aliases initialized from the goog primitives are tracked by the
    /// require checks, not by this rule.
    fn is_module_alias_init(&self, binding: &Binding) -> bool {
        let Some(parent) = self.ast.parent(binding.decl_node) else {
            return false;
        };
        let NodeKind::VarDeclarator { name, init: Some(init) } = self.ast.kind(parent) else {
            return false;
        };
        if *name != binding.decl_node {
            return false;
        }
        let NodeKind::Call { callee, .. } = self.ast.kind(*init) else {
            return false;
        };
        matches!(
            self.dotted_name(*callee).as_deref(),
            Some("goog.require" | "goog.requireType" | "goog.forwardDeclare" | "goog.module.get")
        )
    }

    /// `a.b.c` as a dotted string, for non-computed identifier chains.
    fn dotted_name(&self, node: NodeId) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = node;
        loop {
            match self.ast.kind(current) {
                NodeKind::Member { obj, prop, computed: false } => {
                    parts.push(self.ast.ident_name(*prop)?);
                    current = *obj;
                }
                NodeKind::Ident { name } => {
                    parts.push(*name);
                    break;
                }
                _ => return None,
            }
        }
        parts.reverse();
        Some(
            parts
                .iter()
                .map(|&a| self.ast.name_of(a))
                .collect::<Vec<_>>()
                .join("."),
        )
    }
}
