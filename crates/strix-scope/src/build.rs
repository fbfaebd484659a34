//! The reference scope builder.
//!
//! A single pre-order walk over the AST that creates scopes, classifies the
//! module containers (`import`/`export`, `goog.module`, the bundled
//! `goog.loadModule` form, `goog.scope`), hoists `var` declarations to the
//! nearest hoist target, and records every declaration site. Repeated
//! declarations of a name already bound in the target scope attach to the
//! existing binding instead of creating a new one; the checker reports on
//! those sites.

use tracing::{debug, trace};

use strix_ast::{Ast, DeclKind, NodeId, NodeKind};
use strix_common::Atom;

use crate::binding::{Binding, BindingId, BindingKind};
use crate::scope::{Scope, ScopeId, ScopeKind, ScopeTree};

/// Build the scope tree for one parsed compilation unit.
pub fn build(ast: &Ast, root: NodeId, is_externs: bool) -> ScopeTree {
    let mut builder = ScopeBuilder {
        ast,
        tree: ScopeTree::new(),
        stack: Vec::new(),
    };
    builder.tree.is_externs = is_externs;
    builder.build_program(root);
    builder.tree
}

struct ScopeBuilder<'a> {
    ast: &'a Ast,
    tree: ScopeTree,
    stack: Vec<ScopeId>,
}

impl<'a> ScopeBuilder<'a> {
    fn build_program(&mut self, root: NodeId) {
        let NodeKind::Program { body } = self.ast.kind(root) else {
            debug_assert!(false, "scope builder expects a Program root");
            return;
        };
        let kind = self.classify_program(body);
        debug!(?kind, "entering top scope");
        let body = body.clone();
        let sid = self.enter_scope(kind, root);
        self.tree.root = sid;
        for stmt in body {
            self.visit(stmt);
        }
        self.exit_scope();
    }

    /// Module-mode detection runs before anything else looks at the scope:
    /// it decides whether top-level `var` collisions are global (VarCheck's
    /// business) or module-local (reported by the checker).
    fn classify_program(&self, body: &[NodeId]) -> ScopeKind {
        let is_es6_module = body.iter().any(|&stmt| {
            matches!(
                self.ast.kind(stmt),
                NodeKind::ImportDecl { .. }
                    | NodeKind::ExportNamed { .. }
                    | NodeKind::ExportDefault { .. }
            )
        });
        if is_es6_module {
            return ScopeKind::Module;
        }
        if self
            .first_non_directive(body)
            .is_some_and(|stmt| self.is_goog_module_call(stmt))
        {
            return ScopeKind::GoogModule;
        }
        ScopeKind::Global
    }

    fn first_non_directive(&self, body: &[NodeId]) -> Option<NodeId> {
        body.iter()
            .copied()
            .find(|&stmt| match self.ast.kind(stmt) {
                NodeKind::ExprStmt { expr } => {
                    !matches!(self.ast.kind(*expr), NodeKind::StringLit { .. })
                }
                _ => true,
            })
    }

    fn is_goog_module_call(&self, stmt: NodeId) -> bool {
        let NodeKind::ExprStmt { expr } = self.ast.kind(stmt) else {
            return false;
        };
        let NodeKind::Call { callee, args } = self.ast.kind(*expr) else {
            return false;
        };
        self.goog_method(*callee) == Some("module")
            && args
                .first()
                .is_some_and(|&arg| matches!(self.ast.kind(arg), NodeKind::StringLit { .. }))
    }

    /// `goog.<method>(...)` callee recognition.
    fn goog_method(&self, callee: NodeId) -> Option<&'a str> {
        let NodeKind::Member { obj, prop, computed: false } = self.ast.kind(callee) else {
            return None;
        };
        let obj_name = self.ast.ident_name(*obj)?;
        if self.ast.name_of(obj_name) != "goog" {
            return None;
        }
        let prop_name = self.ast.ident_name(*prop)?;
        Some(self.ast.name_of(prop_name))
    }

    // ------------------------------------------------------------------
    // Scope stack
    // ------------------------------------------------------------------

    fn enter_scope(&mut self, kind: ScopeKind, node: NodeId) -> ScopeId {
        let parent = self.stack.last().copied();
        let sid = self.tree.push_scope(Scope::new(kind, node, parent));
        self.tree.map_node(node, sid);
        self.stack.push(sid);
        trace!(scope = sid.index(), ?kind, "enter scope");
        sid
    }

    fn exit_scope(&mut self) {
        if let Some(sid) = self.stack.pop() {
            trace!(scope = sid.index(), "exit scope");
        }
    }

    fn current(&self) -> ScopeId {
        *self.stack.last().expect("scope stack is never empty mid-walk")
    }

    fn hoist_target(&self) -> ScopeId {
        for &sid in self.stack.iter().rev() {
            if self.tree.scope(sid).kind.is_hoist_target() {
                return sid;
            }
        }
        self.tree.root
    }

    // ------------------------------------------------------------------
    // Walk
    // ------------------------------------------------------------------

    fn visit(&mut self, id: NodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::VarStmt { decl_kind, decls } => {
                let kind = match decl_kind {
                    DeclKind::Var => BindingKind::Var,
                    DeclKind::Let => BindingKind::Let,
                    DeclKind::Const => BindingKind::Const,
                };
                for decl in decls {
                    let NodeKind::VarDeclarator { name, init } = self.ast.kind(decl).clone() else {
                        debug_assert!(false, "VarStmt child must be a declarator");
                        continue;
                    };
                    self.declare_pattern(name, kind, None, false);
                    if let Some(init) = init {
                        self.visit(init);
                    }
                }
            }
            NodeKind::FunctionDecl { name, params, body } => {
                self.declare(name, BindingKind::FunctionDecl, None, false);
                self.visit_function(id, None, &params, body, ScopeKind::Function, false);
            }
            NodeKind::FunctionExpr { name, params, body } => {
                self.visit_function(id, name, &params, body, ScopeKind::Function, false);
            }
            NodeKind::ArrowFunc { params, body } => {
                self.visit_function(id, None, &params, body, ScopeKind::Function, false);
            }
            NodeKind::ClassDecl { name, superclass, body } => {
                self.declare(name, BindingKind::Class, None, false);
                self.visit_class(id, None, superclass, &body);
            }
            NodeKind::ClassExpr { name, superclass, body } => {
                self.visit_class(id, name, superclass, &body);
            }
            NodeKind::Block { body } => {
                self.enter_scope(ScopeKind::Block, id);
                for stmt in body {
                    self.visit(stmt);
                }
                self.exit_scope();
            }
            NodeKind::For { init, test, update, body } => {
                self.enter_scope(ScopeKind::ForHeader, id);
                if let Some(init) = init {
                    self.visit(init);
                }
                if let Some(test) = test {
                    self.visit(test);
                }
                if let Some(update) = update {
                    self.visit(update);
                }
                self.visit(body);
                self.exit_scope();
            }
            NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body } => {
                self.enter_scope(ScopeKind::ForHeader, id);
                self.visit(left);
                self.visit(right);
                self.visit(body);
                self.exit_scope();
            }
            NodeKind::Try { block, handler, finalizer } => {
                self.visit(block);
                if let Some(handler) = handler {
                    self.visit_catch(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.visit(finalizer);
                }
            }
            NodeKind::ImportDecl { specifiers, .. } => {
                for spec in specifiers {
                    match self.ast.kind(spec) {
                        NodeKind::ImportDefaultSpec { local }
                        | NodeKind::ImportNamespaceSpec { local }
                        | NodeKind::ImportNamedSpec { local, .. } => {
                            self.declare(*local, BindingKind::Import, None, false);
                        }
                        _ => debug_assert!(false, "unexpected import specifier"),
                    }
                }
            }
            NodeKind::ExportNamed { decl, specifiers } => {
                if let Some(decl) = decl {
                    self.visit(decl);
                    let mut names = Vec::new();
                    self.collect_declared_atoms(decl, &mut names);
                    self.tree.exported_names.extend(names);
                }
                for spec in specifiers {
                    if let NodeKind::ExportSpecifier { local, .. } = self.ast.kind(spec)
                        && let Some(name) = self.ast.ident_name(*local)
                    {
                        self.tree.exported_names.insert(name);
                    }
                }
            }
            NodeKind::Call { callee, args } => {
                match self.goog_container(callee, &args) {
                    Some(GoogContainer::LoadModule(fn_arg)) => {
                        let (kind, params, body) = self.load_module_shape(fn_arg);
                        self.visit_function(fn_arg, None, &params, body, kind, false);
                    }
                    Some(GoogContainer::Scope(fn_arg)) => {
                        let NodeKind::FunctionExpr { name, params, body } =
                            self.ast.kind(fn_arg).clone()
                        else {
                            unreachable!("goog_container checked the shape");
                        };
                        self.visit_function(fn_arg, name, &params, body, ScopeKind::Function, true);
                    }
                    None => {
                        self.visit(callee);
                        for arg in args {
                            self.visit(arg);
                        }
                    }
                }
            }
            kind => {
                let mut children = Vec::new();
                kind.for_each_child(|c| children.push(c));
                for child in children {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_function(
        &mut self,
        fn_node: NodeId,
        bleeding_name: Option<NodeId>,
        params: &[NodeId],
        body: NodeId,
        kind: ScopeKind,
        is_goog_scope: bool,
    ) {
        let sid = self.enter_scope(kind, fn_node);
        if is_goog_scope {
            self.tree.scope_mut(sid).is_goog_scope_body = true;
        }
        if let Some(name) = bleeding_name {
            // A function expression's name bleeds into its own scope only.
            self.declare(name, BindingKind::FunctionDecl, None, false);
        }
        for (index, &param) in params.iter().enumerate() {
            self.declare_pattern(param, BindingKind::Param, Some(index as u16), false);
        }
        if let NodeKind::Block { body: stmts } = self.ast.kind(body).clone() {
            // Function bodies share the function scope; no extra block scope.
            self.tree.map_node(body, sid);
            for stmt in stmts {
                self.visit(stmt);
            }
        } else {
            // Expression-bodied arrow.
            self.visit(body);
        }
        self.exit_scope();
    }

    fn visit_class(
        &mut self,
        class_node: NodeId,
        bleeding_name: Option<NodeId>,
        superclass: Option<NodeId>,
        members: &[NodeId],
    ) {
        self.enter_scope(ScopeKind::ClassBody, class_node);
        if let Some(name) = bleeding_name {
            self.declare(name, BindingKind::Class, None, false);
        }
        if let Some(superclass) = superclass {
            self.visit(superclass);
        }
        for &member in members {
            if let NodeKind::MethodDef { key, computed, params, body, .. } =
                self.ast.kind(member).clone()
            {
                if computed {
                    self.visit(key);
                }
                self.visit_function(member, None, &params, body, ScopeKind::Function, false);
            }
        }
        self.exit_scope();
    }

    fn visit_catch(&mut self, catch_node: NodeId) {
        let NodeKind::Catch { param, body } = self.ast.kind(catch_node).clone() else {
            debug_assert!(false, "try handler must be a catch clause");
            return;
        };
        let sid = self.enter_scope(ScopeKind::Catch, catch_node);
        if let Some(param) = param {
            self.declare_pattern(param, BindingKind::CatchParam, None, false);
        }
        if let NodeKind::Block { body: stmts } = self.ast.kind(body).clone() {
            // Catch bodies share the catch scope, like function bodies do.
            self.tree.map_node(body, sid);
            for stmt in stmts {
                self.visit(stmt);
            }
        }
        self.exit_scope();
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn declare_pattern(
        &mut self,
        node: NodeId,
        kind: BindingKind,
        param_index: Option<u16>,
        nested: bool,
    ) {
        match self.ast.kind(node).clone() {
            NodeKind::Ident { .. } => {
                self.declare(node, kind, param_index, nested);
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements.into_iter().flatten() {
                    self.declare_pattern(element, kind, param_index, true);
                }
            }
            NodeKind::ObjectPattern { props } => {
                for prop in props {
                    match self.ast.kind(prop).clone() {
                        NodeKind::Prop { key, value, computed } => {
                            if computed && let Some(key) = key {
                                self.visit(key);
                            }
                            self.declare_pattern(value, kind, param_index, true);
                        }
                        NodeKind::RestElement { arg } => {
                            self.declare_pattern(arg, kind, param_index, true);
                        }
                        _ => debug_assert!(false, "unexpected object pattern member"),
                    }
                }
            }
            NodeKind::AssignPattern { target, default } => {
                self.declare_pattern(target, kind, param_index, nested);
                self.visit(default);
            }
            NodeKind::RestElement { arg } => {
                self.declare_pattern(arg, kind, param_index, nested);
            }
            _ => debug_assert!(false, "not a binding pattern"),
        }
    }

    fn declare(
        &mut self,
        ident: NodeId,
        kind: BindingKind,
        param_index: Option<u16>,
        from_destructuring: bool,
    ) -> Option<BindingId> {
        let Some(name) = self.ast.ident_name(ident) else {
            debug_assert!(false, "declaration site must be an identifier");
            return None;
        };
        let target = if matches!(kind, BindingKind::Var) {
            self.hoist_target()
        } else {
            self.current()
        };
        if let Some(existing) = self.tree.scope(target).get(name) {
            // A repeated declaration: remember the site, keep the binding.
            trace!(name = self.ast.name_of(name), "duplicate declaration site");
            self.tree.record_decl_site(ident, existing);
            return Some(existing);
        }
        let doc = self.ast.jsdoc_for_declaration(ident);
        let hoisted_fn = matches!(kind, BindingKind::FunctionDecl)
            && self.tree.scope(target).kind.is_hoist_target();
        let binding = Binding {
            name,
            kind,
            decl_node: ident,
            scope: target,
            suppress_duplicate: self.ast.suppresses_duplicate(ident),
            is_typedef: doc.is_some_and(|d| d.is_typedef),
            hoisted_fn,
            param_index,
            from_destructuring,
        };
        debug!(
            name = self.ast.name_of(name),
            ?kind,
            scope = target.index(),
            "declare binding"
        );
        let id = self.tree.push_binding(binding);
        self.tree.scope_mut(target).insert(name, id);
        self.tree.record_decl_site(ident, id);
        Some(id)
    }

    fn collect_declared_atoms(&self, decl: NodeId, out: &mut Vec<Atom>) {
        match self.ast.kind(decl) {
            NodeKind::VarStmt { decls, .. } => {
                for &d in decls {
                    if let NodeKind::VarDeclarator { name, .. } = self.ast.kind(d) {
                        self.collect_pattern_atoms(*name, out);
                    }
                }
            }
            NodeKind::FunctionDecl { name, .. } | NodeKind::ClassDecl { name, .. } => {
                if let Some(atom) = self.ast.ident_name(*name) {
                    out.push(atom);
                }
            }
            _ => {}
        }
    }

    fn collect_pattern_atoms(&self, node: NodeId, out: &mut Vec<Atom>) {
        match self.ast.kind(node) {
            NodeKind::Ident { name } => out.push(*name),
            NodeKind::ArrayPattern { elements } => {
                for el in elements.iter().flatten() {
                    self.collect_pattern_atoms(*el, out);
                }
            }
            NodeKind::ObjectPattern { props } => {
                for &prop in props {
                    match self.ast.kind(prop) {
                        NodeKind::Prop { value, .. } => self.collect_pattern_atoms(*value, out),
                        NodeKind::RestElement { arg } => self.collect_pattern_atoms(*arg, out),
                        _ => {}
                    }
                }
            }
            NodeKind::AssignPattern { target, .. } => self.collect_pattern_atoms(*target, out),
            NodeKind::RestElement { arg } => self.collect_pattern_atoms(*arg, out),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // goog.* container recognition
    // ------------------------------------------------------------------

    fn goog_container(&self, callee: NodeId, args: &[NodeId]) -> Option<GoogContainer> {
        let method = self.goog_method(callee)?;
        let &fn_arg = args.first()?;
        if !matches!(self.ast.kind(fn_arg), NodeKind::FunctionExpr { .. }) {
            return None;
        }
        match method {
            "loadModule" => Some(GoogContainer::LoadModule(fn_arg)),
            "scope" => Some(GoogContainer::Scope(fn_arg)),
            _ => None,
        }
    }

    /// The bundled `goog.loadModule(function(exports){ 'use strict';
    /// goog.module('...'); ... })` form: the callback body is a goog.module
    /// scope. A callback without the `goog.module` preamble stays an
    /// ordinary function.
    fn load_module_shape(&self, fn_arg: NodeId) -> (ScopeKind, Vec<NodeId>, NodeId) {
        let NodeKind::FunctionExpr { params, body, .. } = self.ast.kind(fn_arg).clone() else {
            unreachable!("goog_container checked the shape");
        };
        let kind = match self.ast.kind(body) {
            NodeKind::Block { body: stmts } => {
                if self
                    .first_non_directive(stmts)
                    .is_some_and(|stmt| self.is_goog_module_call(stmt))
                {
                    ScopeKind::GoogModule
                } else {
                    ScopeKind::Function
                }
            }
            _ => ScopeKind::Function,
        };
        (kind, params, body)
    }
}

enum GoogContainer {
    LoadModule(NodeId),
    Scope(NodeId),
}
