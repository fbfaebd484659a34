//! The node arena.

use rustc_hash::{FxHashMap, FxHashSet};
use strix_common::{Atom, Interner, Span};

use crate::jsdoc::JsDoc;
use crate::node::{Node, NodeId, NodeKind};

/// Flat node storage with parent links and JSDoc attachments.
///
/// Children are created before their parents; [`Ast::add`] wires the parent
/// pointer of every direct child at creation time, so parent links are
/// complete as soon as the root exists.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    jsdoc: FxHashMap<NodeId, JsDoc>,
    /// The file-level `@fileoverview` record, when the source carries one.
    fileoverview: Option<JsDoc>,
    pub interner: Interner,
}

impl Ast {
    pub fn new() -> Ast {
        Ast::default()
    }

    /// Intern an identifier or string value.
    pub fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn name_of(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    /// Append a node and wire the parent links of its direct children.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        kind.for_each_child(|child| {
            // Children are allocated bottom-up, so the slot already exists.
            self.parents[child.index()] = Some(id);
        });
        self.nodes.push(Node { kind, span });
        self.parents.push(None);
        id
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk the parent chain, starting with the node's own parent.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.parent(id);
        std::iter::from_fn(move || {
            let next = current?;
            current = self.parent(next);
            Some(next)
        })
    }

    /// The identifier text of an `Ident` node, if it is one.
    pub fn ident_name(&self, id: NodeId) -> Option<Atom> {
        match self.kind(id) {
            NodeKind::Ident { name } => Some(*name),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // JSDoc attachment and queries
    // ------------------------------------------------------------------

    pub fn set_jsdoc(&mut self, id: NodeId, doc: JsDoc) {
        self.jsdoc.insert(id, doc);
    }

    pub fn jsdoc(&self, id: NodeId) -> Option<&JsDoc> {
        self.jsdoc.get(&id)
    }

    pub fn set_fileoverview(&mut self, doc: JsDoc) {
        self.fileoverview = Some(doc);
    }

    /// `@fileoverview @suppress {duplicate}` applies to the whole file.
    pub fn fileoverview_suppresses_duplicate(&self) -> bool {
        self.fileoverview
            .as_ref()
            .is_some_and(|doc| doc.suppress_duplicate)
    }

    /// The JSDoc record governing a declaration site: the nearest record on
    /// the node itself or an ancestor within the same statement (a declarator
    /// or its variable statement), not crossing statement containers.
    pub fn jsdoc_for_declaration(&self, id: NodeId) -> Option<&JsDoc> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(doc) = self.jsdoc.get(&node) {
                return Some(doc);
            }
            match self.kind(node) {
                NodeKind::Program { .. } | NodeKind::Block { .. } => return None,
                NodeKind::VarStmt { .. }
                | NodeKind::FunctionDecl { .. }
                | NodeKind::ClassDecl { .. }
                | NodeKind::ImportDecl { .. } => {
                    // Statement level reached; one more step catches the
                    // `export /** ... */ var x` arrangement.
                    current = self.parent(node);
                    if let Some(p) = current
                        && !matches!(self.kind(p), NodeKind::ExportNamed { .. })
                    {
                        return None;
                    }
                }
                _ => current = self.parent(node),
            }
        }
        None
    }

    /// Whether a declaration site is covered by `@suppress {duplicate}`,
    /// either directly or at the file level.
    pub fn suppresses_duplicate(&self, id: NodeId) -> bool {
        self.fileoverview_suppresses_duplicate()
            || self
                .jsdoc_for_declaration(id)
                .is_some_and(|doc| doc.suppress_duplicate)
    }

    /// Every name mentioned inside a `@type`/`@typedef` annotation anywhere
    /// in the file. Used to keep type-only aliases from being reported as
    /// dead stores.
    pub fn jsdoc_type_names(&self) -> FxHashSet<Atom> {
        let mut names = FxHashSet::default();
        for doc in self.jsdoc.values().chain(self.fileoverview.as_ref()) {
            names.extend(doc.type_names.iter().copied());
        }
        names
    }
}
