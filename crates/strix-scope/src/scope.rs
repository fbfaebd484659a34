//! Scopes and the scope tree.

use rustc_hash::{FxHashMap, FxHashSet};
use strix_ast::NodeId;
use strix_common::Atom;

use crate::binding::{Binding, BindingId};

/// Index of a scope in the [`ScopeTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub const fn new(index: u32) -> ScopeId {
        ScopeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// ES6 module top scope (the file has `import`/`export`).
    Module,
    /// `goog.module` file top scope, or the body of the function passed to
    /// `goog.loadModule` in the bundled form.
    GoogModule,
    /// One scope per function: parameters, bleeding function-expression
    /// name, body-root declarations, and hoisted `var`s all live here.
    Function,
    Block,
    /// Catch parameter plus the catch body's root declarations.
    Catch,
    /// `let`/`const` bindings of a `for`/`for-in`/`for-of` header.
    ForHeader,
    /// Holds a class expression's bleeding name.
    ClassBody,
}

impl ScopeKind {
    /// Scopes whose top-level `var` declarations are module-local.
    #[inline]
    pub const fn is_module_like(self) -> bool {
        matches!(self, ScopeKind::Module | ScopeKind::GoogModule)
    }

    /// Scopes that `var` declarations and hoisted functions attach to.
    #[inline]
    pub const fn is_hoist_target(self) -> bool {
        matches!(
            self,
            ScopeKind::Global | ScopeKind::Module | ScopeKind::GoogModule | ScopeKind::Function
        )
    }
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The node that introduced the scope.
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    /// Body of a function passed to `goog.scope`; unused-alias reporting is
    /// suppressed there.
    pub is_goog_scope_body: bool,
    names: FxHashMap<Atom, BindingId>,
    order: Vec<BindingId>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> Scope {
        Scope {
            kind,
            node,
            parent,
            is_goog_scope_body: false,
            names: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// The binding declared for `name` directly in this scope.
    pub fn get(&self, name: Atom) -> Option<BindingId> {
        self.names.get(&name).copied()
    }

    /// Bindings in declaration order.
    pub fn bindings(&self) -> &[BindingId] {
        &self.order
    }

    pub(crate) fn insert(&mut self, name: Atom, binding: BindingId) {
        self.names.insert(name, binding);
        self.order.push(binding);
    }
}

/// The resolved scope tree of one compilation unit.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    /// Scope introduced by (or merged onto) a node. Function bodies and
    /// catch bodies map to the scope of their function/catch node.
    scope_of_node: FxHashMap<NodeId, ScopeId>,
    /// Declaring identifier → binding, including repeated declarations of
    /// an already-bound name.
    decl_sites: FxHashMap<NodeId, BindingId>,
    pub root: ScopeId,
    /// Tree built from an externs file; the checker stays silent on these.
    pub is_externs: bool,
    /// Names exported from a module scope (declaration or specifier form).
    pub exported_names: FxHashSet<Atom>,
}

impl ScopeTree {
    pub(crate) fn new() -> ScopeTree {
        ScopeTree {
            scopes: Vec::new(),
            bindings: Vec::new(),
            scope_of_node: FxHashMap::default(),
            decl_sites: FxHashMap::default(),
            root: ScopeId::new(0),
            is_externs: false,
            exported_names: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    #[inline]
    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn push_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub(crate) fn push_binding(&mut self, binding: Binding) -> BindingId {
        let id = BindingId::new(self.bindings.len() as u32);
        self.bindings.push(binding);
        id
    }

    pub(crate) fn map_node(&mut self, node: NodeId, scope: ScopeId) {
        self.scope_of_node.insert(node, scope);
    }

    pub(crate) fn record_decl_site(&mut self, node: NodeId, binding: BindingId) {
        self.decl_sites.insert(node, binding);
    }

    /// The scope a node introduces (or is merged into), if any.
    pub fn scope_for_node(&self, node: NodeId) -> Option<ScopeId> {
        self.scope_of_node.get(&node).copied()
    }

    /// The binding a declaring identifier resolves to, if the node is a
    /// declaration site.
    pub fn decl_site(&self, node: NodeId) -> Option<BindingId> {
        self.decl_sites.get(&node).copied()
    }

    /// Lexical lookup through the scope chain.
    pub fn lookup(&self, mut scope: ScopeId, name: Atom) -> Option<BindingId> {
        loop {
            let s = self.scope(scope);
            if let Some(b) = s.get(name) {
                return Some(b);
            }
            scope = s.parent?;
        }
    }

    /// Walk the chain from `scope` to the root, inclusive.
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut current = Some(scope);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.scope(id).parent;
            Some(id)
        })
    }

    /// Whether `name` is exported from the module top scope.
    pub fn is_exported(&self, name: Atom) -> bool {
        self.exported_names.contains(&name)
    }
}
