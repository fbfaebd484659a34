//! The traversal driver.
//!
//! An explicit `Enter`/`Exit` frame stack walks the AST in source order;
//! recursion depth is bounded by the stack we own, not the thread's. Each
//! frame carries the reference context its parent computed for it: whether
//! the identifier position reads, writes, or declares, whether it sits in a
//! default-parameter expression, and whether it sits in an expression that
//! evaluates before its own declaration binds. Scopes are pushed when their
//! owning node is entered; a scope's rules fire when its owning node exits,
//! after every reference inside it has been collected.

use tracing::trace;

use strix_ast::{NodeId, NodeKind};
use strix_common::Atom;
use strix_scope::{BindingKind, ScopeId};

use crate::reference::Reference;
use crate::state::CheckerState;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    /// Statement position; identifiers do not occur here.
    Stmt,
    /// Value position, result consumed.
    Read,
    /// Value position, result discarded (expression statement, for-update).
    Discard,
    /// Assignment target. `read` is set when the old value is consumed
    /// (compound assignment or `++`/`--` whose result is used, loop
    /// headers).
    Write { read: bool },
    /// Declaration site.
    Decl {
        kind: BindingKind,
        initializing: bool,
        /// Bound by a `for`-`in`/`of` header; the loop itself uses it.
        for_target: bool,
    },
}

#[derive(Clone, Copy, Debug)]
struct Ctx {
    mode: Mode,
    /// Inside the default expression of a parameter of this scope.
    default_of: Option<(ScopeId, u16)>,
    /// Inside the evaluated-before-binding region of this declarator or
    /// loop-header node.
    eval_region: Option<NodeId>,
    /// Transport: the next `VarStmt` below is a `for`-`in`/`of` header.
    for_target: bool,
    /// Transport: defaults in this parameter pattern belong to this
    /// parameter.
    param_of: Option<(ScopeId, u16)>,
}

impl Ctx {
    fn stmt() -> Ctx {
        Ctx {
            mode: Mode::Stmt,
            default_of: None,
            eval_region: None,
            for_target: false,
            param_of: None,
        }
    }

    fn fresh(mode: Mode) -> Ctx {
        Ctx { mode, ..Ctx::stmt() }
    }

    /// Same extras, different mode.
    fn with_mode(self, mode: Mode) -> Ctx {
        Ctx { mode, ..self }
    }

    /// Pattern children keep a write/declare mode; everything else reads.
    fn element_mode(self) -> Mode {
        match self.mode {
            Mode::Write { .. } | Mode::Decl { .. } => self.mode,
            _ => Mode::Read,
        }
    }
}

enum Frame {
    Enter(NodeId, Ctx),
    Exit(Option<ScopeId>),
}

impl<'a> CheckerState<'a> {
    pub(crate) fn traverse(&mut self, root: NodeId) {
        let mut stack = vec![Frame::Enter(root, Ctx::stmt())];
        let mut children: Vec<(NodeId, Ctx)> = Vec::new();
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Exit(entered) => {
                    if let Some(sid) = entered {
                        self.check_scope(sid);
                        self.scope_stack.pop();
                        if let Some(token) = &self.options.cancel
                            && token.is_cancelled()
                        {
                            trace!("cancelled between scope exits");
                            self.cancelled = true;
                            return;
                        }
                    }
                }
                Frame::Enter(node, ctx) => {
                    let entered = match self.scopes.scope_for_node(node) {
                        // Function and catch bodies map to the scope their
                        // owner already pushed; only push fresh scopes.
                        Some(sid) if self.scope_stack.last() != Some(&sid) => {
                            self.scope_stack.push(sid);
                            Some(sid)
                        }
                        _ => None,
                    };
                    children.clear();
                    self.expand(node, ctx, &mut children);
                    stack.push(Frame::Exit(entered));
                    for &(child, child_ctx) in children.iter().rev() {
                        stack.push(Frame::Enter(child, child_ctx));
                    }
                }
            }
        }
    }

    /// Compute the context of every direct child, in source order.
    fn expand(&mut self, node: NodeId, ctx: Ctx, out: &mut Vec<(NodeId, Ctx)>) {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Ident { name } => {
                let name = *name;
                self.handle_ident(node, name, ctx);
            }
            NodeKind::Program { body } | NodeKind::Block { body } => {
                for &stmt in body {
                    out.push((stmt, Ctx::stmt()));
                }
            }
            NodeKind::ExprStmt { expr } => out.push((*expr, Ctx::fresh(Mode::Discard))),

            // Declarations -------------------------------------------------
            NodeKind::VarStmt { decl_kind, decls } => {
                let kind = match decl_kind {
                    strix_ast::DeclKind::Var => BindingKind::Var,
                    strix_ast::DeclKind::Let => BindingKind::Let,
                    strix_ast::DeclKind::Const => BindingKind::Const,
                };
                for &decl in decls {
                    let mut child = Ctx::fresh(Mode::Decl {
                        kind,
                        initializing: false,
                        for_target: ctx.for_target,
                    });
                    child.for_target = ctx.for_target;
                    out.push((decl, child));
                }
            }
            NodeKind::VarDeclarator { name, init } => {
                let Mode::Decl { kind, for_target, .. } = ctx.mode else {
                    debug_assert!(false, "declarator outside declaration context");
                    return;
                };
                out.push((
                    *name,
                    Ctx::fresh(Mode::Decl {
                        kind,
                        initializing: init.is_some(),
                        for_target,
                    }),
                ));
                if let Some(init) = init {
                    let mut child = Ctx::fresh(Mode::Read);
                    // The initializer evaluates before the binding does.
                    child.eval_region = Some(node);
                    out.push((*init, child));
                }
            }
            NodeKind::FunctionDecl { name, params, body } => {
                out.push((*name, Ctx::fresh(Mode::Decl {
                    kind: BindingKind::FunctionDecl,
                    initializing: false,
                    for_target: false,
                })));
                self.push_params(params, out);
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::FunctionExpr { name, params, body } => {
                if let Some(name) = name {
                    out.push((*name, Ctx::fresh(Mode::Decl {
                        kind: BindingKind::FunctionDecl,
                        initializing: false,
                        for_target: false,
                    })));
                }
                self.push_params(params, out);
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::ArrowFunc { params, body } => {
                self.push_params(params, out);
                let body_ctx = if matches!(ast.kind(*body), NodeKind::Block { .. }) {
                    Ctx::stmt()
                } else {
                    // Expression body: the value is the return value.
                    Ctx::fresh(Mode::Read)
                };
                out.push((*body, body_ctx));
            }
            NodeKind::ClassDecl { name, superclass, body } => {
                out.push((*name, Ctx::fresh(Mode::Decl {
                    kind: BindingKind::Class,
                    initializing: false,
                    for_target: false,
                })));
                if let Some(superclass) = superclass {
                    out.push((*superclass, Ctx::fresh(Mode::Read)));
                }
                for &member in body {
                    out.push((member, Ctx::stmt()));
                }
            }
            NodeKind::ClassExpr { name, superclass, body } => {
                if let Some(name) = name {
                    out.push((*name, Ctx::fresh(Mode::Decl {
                        kind: BindingKind::Class,
                        initializing: false,
                        for_target: false,
                    })));
                }
                if let Some(superclass) = superclass {
                    // extends-clauses evaluate with the class expression.
                    out.push((*superclass, ctx.with_mode(Mode::Read)));
                }
                for &member in body {
                    out.push((member, Ctx::stmt()));
                }
            }
            NodeKind::MethodDef { key, computed, params, body, .. } => {
                if *computed {
                    out.push((*key, Ctx::fresh(Mode::Read)));
                }
                self.push_params(params, out);
                out.push((*body, Ctx::stmt()));
            }

            // Patterns and literals ---------------------------------------
            NodeKind::ArrayLit { elements } | NodeKind::ArrayPattern { elements } => {
                let mode = ctx.element_mode();
                for &el in elements.iter().flatten() {
                    out.push((el, ctx.with_mode(mode)));
                }
            }
            NodeKind::ObjectLit { props } | NodeKind::ObjectPattern { props } => {
                for &prop in props {
                    out.push((prop, ctx));
                }
            }
            NodeKind::Prop { key, value, computed } => {
                if *computed && let Some(key) = key {
                    out.push((*key, ctx.with_mode(Mode::Read)));
                }
                out.push((*value, ctx.with_mode(ctx.element_mode())));
            }
            NodeKind::Spread { arg } | NodeKind::RestElement { arg } => {
                out.push((*arg, ctx.with_mode(ctx.element_mode())));
            }
            NodeKind::AssignPattern { target, default } => {
                out.push((*target, ctx.with_mode(ctx.element_mode())));
                let mut default_ctx = ctx.with_mode(Mode::Read);
                default_ctx.default_of = ctx.param_of.or(ctx.default_of);
                default_ctx.param_of = None;
                out.push((*default, default_ctx));
            }

            // Expressions -------------------------------------------------
            NodeKind::Assign { op, target, value } => {
                match ctx.mode {
                    Mode::Write { .. } | Mode::Decl { .. } => {
                        // A default inside an assignment-position pattern.
                        out.push((*target, ctx.with_mode(ctx.element_mode())));
                        out.push((*value, ctx.with_mode(Mode::Read)));
                    }
                    _ => {
                        let consumed = !matches!(ctx.mode, Mode::Discard);
                        out.push((
                            *target,
                            ctx.with_mode(Mode::Write { read: op.is_compound() && consumed }),
                        ));
                        out.push((*value, ctx.with_mode(Mode::Read)));
                    }
                }
            }
            NodeKind::Update { arg, .. } => {
                let consumed = matches!(ctx.mode, Mode::Read | Mode::Write { .. });
                out.push((*arg, ctx.with_mode(Mode::Write { read: consumed })));
            }
            NodeKind::Binary { left, right, .. } => {
                out.push((*left, ctx.with_mode(Mode::Read)));
                out.push((*right, ctx.with_mode(Mode::Read)));
            }
            NodeKind::Unary { arg, .. } => out.push((*arg, ctx.with_mode(Mode::Read))),
            NodeKind::Cond { test, cons, alt } => {
                out.push((*test, ctx.with_mode(Mode::Read)));
                out.push((*cons, ctx.with_mode(Mode::Read)));
                out.push((*alt, ctx.with_mode(Mode::Read)));
            }
            NodeKind::Call { callee, args } | NodeKind::New { callee, args } => {
                out.push((*callee, ctx.with_mode(Mode::Read)));
                for &arg in args {
                    out.push((arg, ctx.with_mode(Mode::Read)));
                }
            }
            NodeKind::Member { obj, prop, computed } => {
                out.push((*obj, ctx.with_mode(Mode::Read)));
                if *computed {
                    out.push((*prop, ctx.with_mode(Mode::Read)));
                }
            }
            NodeKind::Paren { expr } => out.push((*expr, ctx)),

            // Control flow ------------------------------------------------
            NodeKind::If { test, cons, alt } => {
                out.push((*test, Ctx::fresh(Mode::Read)));
                out.push((*cons, Ctx::stmt()));
                if let Some(alt) = alt {
                    out.push((*alt, Ctx::stmt()));
                }
            }
            NodeKind::For { init, test, update, body } => {
                if let Some(init) = init {
                    let init_ctx = if matches!(ast.kind(*init), NodeKind::VarStmt { .. }) {
                        Ctx::stmt()
                    } else {
                        Ctx::fresh(Mode::Discard)
                    };
                    out.push((*init, init_ctx));
                }
                if let Some(test) = test {
                    out.push((*test, Ctx::fresh(Mode::Read)));
                }
                if let Some(update) = update {
                    out.push((*update, Ctx::fresh(Mode::Discard)));
                }
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body } => {
                if matches!(ast.kind(*left), NodeKind::VarStmt { .. }) {
                    let mut left_ctx = Ctx::stmt();
                    left_ctx.for_target = true;
                    out.push((*left, left_ctx));
                } else {
                    // The loop assigns the target and the body consumes it.
                    out.push((*left, Ctx::fresh(Mode::Write { read: true })));
                }
                let mut right_ctx = Ctx::fresh(Mode::Read);
                // The iterated expression evaluates before the header
                // binding initializes.
                right_ctx.eval_region = Some(node);
                out.push((*right, right_ctx));
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::While { test, body } => {
                out.push((*test, Ctx::fresh(Mode::Read)));
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::DoWhile { body, test } => {
                out.push((*body, Ctx::stmt()));
                out.push((*test, Ctx::fresh(Mode::Read)));
            }
            NodeKind::With { obj, body } => {
                out.push((*obj, Ctx::fresh(Mode::Read)));
                out.push((*body, Ctx::stmt()));
            }
            NodeKind::Labeled { body, .. } => out.push((*body, Ctx::stmt())),
            NodeKind::Return { arg } => {
                if let Some(arg) = arg {
                    out.push((*arg, Ctx::fresh(Mode::Read)));
                }
            }
            NodeKind::Throw { arg } => out.push((*arg, Ctx::fresh(Mode::Read))),
            NodeKind::Try { block, handler, finalizer } => {
                out.push((*block, Ctx::stmt()));
                if let Some(handler) = handler {
                    out.push((*handler, Ctx::stmt()));
                }
                if let Some(finalizer) = finalizer {
                    out.push((*finalizer, Ctx::stmt()));
                }
            }
            NodeKind::Catch { param, body } => {
                if let Some(param) = param {
                    out.push((*param, Ctx::fresh(Mode::Decl {
                        kind: BindingKind::CatchParam,
                        initializing: false,
                        for_target: false,
                    })));
                }
                out.push((*body, Ctx::stmt()));
            }

            // Modules -----------------------------------------------------
            NodeKind::ImportDecl { specifiers, .. } => {
                for &spec in specifiers {
                    out.push((spec, Ctx::stmt()));
                }
            }
            NodeKind::ImportDefaultSpec { local }
            | NodeKind::ImportNamespaceSpec { local }
            | NodeKind::ImportNamedSpec { local, .. } => {
                out.push((*local, Ctx::fresh(Mode::Decl {
                    kind: BindingKind::Import,
                    initializing: false,
                    for_target: false,
                })));
            }
            NodeKind::ExportNamed { decl, specifiers } => {
                if let Some(decl) = decl {
                    out.push((*decl, Ctx::stmt()));
                }
                for &spec in specifiers {
                    out.push((spec, Ctx::stmt()));
                }
            }
            NodeKind::ExportSpecifier { local, .. } => {
                // Exporting a name is a use of it.
                out.push((*local, Ctx::fresh(Mode::Read)));
            }
            NodeKind::ExportDefault { expr } => out.push((*expr, Ctx::fresh(Mode::Read))),

            NodeKind::NumberLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::Empty
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. } => {}
        }
    }

    fn push_params(&self, params: &[NodeId], out: &mut Vec<(NodeId, Ctx)>) {
        let scope = self.current_scope();
        for (index, &param) in params.iter().enumerate() {
            let mut ctx = Ctx::fresh(Mode::Decl {
                kind: BindingKind::Param,
                initializing: false,
                for_target: false,
            });
            ctx.param_of = Some((scope, index as u16));
            out.push((param, ctx));
        }
    }

    fn handle_ident(&mut self, node: NodeId, name: Atom, ctx: Ctx) {
        let scope = self.current_scope();
        let span = self.ast.span(node);

        let scopes = self.scopes;
        if let Some(binding_id) = scopes.decl_site(node) {
            let binding = scopes.binding(binding_id);
            let (decl_kind, initializing, for_target) = match ctx.mode {
                Mode::Decl { kind, initializing, for_target } => (kind, initializing, for_target),
                _ => {
                    debug_assert!(false, "declaration site outside declaration context");
                    (binding.kind, false, false)
                }
            };
            let reference = Reference {
                node,
                scope,
                span,
                is_declaration: true,
                is_hoisted_declaration: decl_kind == BindingKind::Var && scope != binding.scope,
                is_lvalue: false,
                is_read: for_target,
                is_initializing: initializing,
                decl_kind: Some(decl_kind),
                in_default_of: ctx.default_of,
                eval_region: ctx.eval_region,
            };
            self.collections.entry(binding_id).or_default().push(reference);
            return;
        }

        let (is_lvalue, is_read) = match ctx.mode {
            Mode::Read | Mode::Discard => (false, true),
            Mode::Write { read } => (true, read),
            Mode::Stmt | Mode::Decl { .. } => {
                debug_assert!(false, "identifier in non-reference position");
                return;
            }
        };
        let Some(binding_id) = scopes.lookup(scope, name) else {
            // An undeclared name: an implicit global at runtime. Not this
            // pass's concern.
            trace!(name = self.ast.name_of(name), "unresolved reference");
            return;
        };
        let reference = Reference {
            node,
            scope,
            span,
            is_declaration: false,
            is_hoisted_declaration: false,
            is_lvalue,
            is_read,
            is_initializing: false,
            decl_kind: None,
            in_default_of: ctx.default_of,
            eval_region: ctx.eval_region,
        };
        self.collections.entry(binding_id).or_default().push(reference);
    }
}
