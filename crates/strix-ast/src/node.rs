//! Node identifiers and the tagged node kinds.

use strix_common::{Atom, Span};

/// Index of a node in the [`crate::Ast`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> NodeId {
        NodeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which keyword introduced a variable statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl AssignOp {
    /// Compound assignments read the target before writing it.
    #[inline]
    pub const fn is_compound(self) -> bool {
        !matches!(self, AssignOp::Assign)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    LogicalAnd,
    LogicalOr,
    In,
    InstanceOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
    Void,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// A node: tagged payload plus source span.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// The tagged node payloads.
///
/// Patterns (`ArrayPattern`, `ObjectPattern`, `AssignPattern`, `RestElement`)
/// appear both in declaration position (declarator names, parameters) and in
/// assignment position (`[a] = xs`); which one is meant is decided by
/// context, not by the node kind.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },

    // Expressions
    Ident {
        name: Atom,
    },
    NumberLit {
        value: f64,
    },
    StringLit {
        value: Atom,
    },
    BoolLit {
        value: bool,
    },
    NullLit,
    ArrayLit {
        elements: Vec<Option<NodeId>>,
    },
    ObjectLit {
        props: Vec<NodeId>,
    },
    /// Object-literal / object-pattern property. `key` is `None` for
    /// shorthand (`{x}`), where `value` is the lone identifier.
    Prop {
        key: Option<NodeId>,
        value: NodeId,
        computed: bool,
    },
    Spread {
        arg: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        arg: NodeId,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: NodeId,
    },
    Cond {
        test: NodeId,
        cons: NodeId,
        alt: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    New {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Member {
        obj: NodeId,
        prop: NodeId,
        computed: bool,
    },
    Paren {
        expr: NodeId,
    },
    FunctionExpr {
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
    },
    ArrowFunc {
        params: Vec<NodeId>,
        /// Block statement or bare expression.
        body: NodeId,
    },
    ClassExpr {
        name: Option<NodeId>,
        superclass: Option<NodeId>,
        body: Vec<NodeId>,
    },

    // Patterns
    ArrayPattern {
        elements: Vec<Option<NodeId>>,
    },
    ObjectPattern {
        props: Vec<NodeId>,
    },
    /// Pattern element or parameter with a default: `x = expr`.
    AssignPattern {
        target: NodeId,
        default: NodeId,
    },
    RestElement {
        arg: NodeId,
    },

    // Statements and declarations
    VarStmt {
        decl_kind: DeclKind,
        decls: Vec<NodeId>,
    },
    VarDeclarator {
        name: NodeId,
        init: Option<NodeId>,
    },
    FunctionDecl {
        name: NodeId,
        params: Vec<NodeId>,
        body: NodeId,
    },
    ClassDecl {
        name: NodeId,
        superclass: Option<NodeId>,
        body: Vec<NodeId>,
    },
    MethodDef {
        key: NodeId,
        computed: bool,
        is_static: bool,
        params: Vec<NodeId>,
        body: NodeId,
    },
    Block {
        body: Vec<NodeId>,
    },
    If {
        test: NodeId,
        cons: NodeId,
        alt: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOf {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        test: NodeId,
    },
    With {
        obj: NodeId,
        body: NodeId,
    },
    Labeled {
        label: Atom,
        body: NodeId,
    },
    Break {
        label: Option<Atom>,
    },
    Continue {
        label: Option<Atom>,
    },
    Return {
        arg: Option<NodeId>,
    },
    Throw {
        arg: NodeId,
    },
    Try {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    Catch {
        param: Option<NodeId>,
        body: NodeId,
    },
    ExprStmt {
        expr: NodeId,
    },
    Empty,

    // Modules
    ImportDecl {
        specifiers: Vec<NodeId>,
        source: Atom,
    },
    ImportDefaultSpec {
        local: NodeId,
    },
    ImportNamedSpec {
        imported: Atom,
        local: NodeId,
    },
    ImportNamespaceSpec {
        local: NodeId,
    },
    ExportNamed {
        decl: Option<NodeId>,
        specifiers: Vec<NodeId>,
    },
    ExportSpecifier {
        local: NodeId,
        exported: Atom,
    },
    ExportDefault {
        expr: NodeId,
    },
}

impl NodeKind {
    /// Function-like nodes open a new function scope.
    pub const fn is_function_like(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDecl { .. }
                | NodeKind::FunctionExpr { .. }
                | NodeKind::ArrowFunc { .. }
                | NodeKind::MethodDef { .. }
        )
    }

    pub const fn is_pattern(&self) -> bool {
        matches!(
            self,
            NodeKind::ArrayPattern { .. }
                | NodeKind::ObjectPattern { .. }
                | NodeKind::AssignPattern { .. }
                | NodeKind::RestElement { .. }
        )
    }

    /// Invoke `f` for every direct child, in source order.
    pub fn for_each_child(&self, mut f: impl FnMut(NodeId)) {
        use NodeKind::*;
        let each_opt = |id: &Option<NodeId>, f: &mut dyn FnMut(NodeId)| {
            if let Some(id) = id {
                f(*id);
            }
        };
        match self {
            Program { body } | Block { body } | ObjectLit { props: body } | ObjectPattern { props: body } => {
                for &id in body {
                    f(id);
                }
            }
            Ident { .. } | NumberLit { .. } | StringLit { .. } | BoolLit { .. } | NullLit
            | Empty | Break { .. } | Continue { .. } => {}
            ArrayLit { elements } | ArrayPattern { elements } => {
                for id in elements.iter().flatten() {
                    f(*id);
                }
            }
            Prop { key, value, .. } => {
                each_opt(key, &mut f);
                f(*value);
            }
            Spread { arg } | RestElement { arg } | Unary { arg, .. } | Update { arg, .. }
            | Throw { arg } | Paren { expr: arg } | ExprStmt { expr: arg }
            | ExportDefault { expr: arg } => f(*arg),
            Assign { target, value, .. } => {
                f(*target);
                f(*value);
            }
            Binary { left, right, .. } => {
                f(*left);
                f(*right);
            }
            Cond { test, cons, alt } => {
                f(*test);
                f(*cons);
                f(*alt);
            }
            Call { callee, args } | New { callee, args } => {
                f(*callee);
                for &a in args {
                    f(a);
                }
            }
            Member { obj, prop, .. } => {
                f(*obj);
                f(*prop);
            }
            FunctionExpr { name, params, body } => {
                each_opt(name, &mut f);
                for &p in params {
                    f(p);
                }
                f(*body);
            }
            ArrowFunc { params, body } => {
                for &p in params {
                    f(p);
                }
                f(*body);
            }
            ClassExpr { name, superclass, body } => {
                each_opt(name, &mut f);
                each_opt(superclass, &mut f);
                for &m in body {
                    f(m);
                }
            }
            ClassDecl { name, superclass, body } => {
                f(*name);
                each_opt(superclass, &mut f);
                for &m in body {
                    f(m);
                }
            }
            MethodDef { key, params, body, .. } => {
                f(*key);
                for &p in params {
                    f(p);
                }
                f(*body);
            }
            AssignPattern { target, default } => {
                f(*target);
                f(*default);
            }
            VarStmt { decls, .. } => {
                for &d in decls {
                    f(d);
                }
            }
            VarDeclarator { name, init } => {
                f(*name);
                each_opt(init, &mut f);
            }
            FunctionDecl { name, params, body } => {
                f(*name);
                for &p in params {
                    f(p);
                }
                f(*body);
            }
            If { test, cons, alt } => {
                f(*test);
                f(*cons);
                each_opt(alt, &mut f);
            }
            For { init, test, update, body } => {
                each_opt(init, &mut f);
                each_opt(test, &mut f);
                each_opt(update, &mut f);
                f(*body);
            }
            ForIn { left, right, body } | ForOf { left, right, body } => {
                f(*left);
                f(*right);
                f(*body);
            }
            While { test, body } => {
                f(*test);
                f(*body);
            }
            DoWhile { body, test } => {
                f(*body);
                f(*test);
            }
            With { obj, body } => {
                f(*obj);
                f(*body);
            }
            Labeled { body, .. } => f(*body),
            Return { arg } => each_opt(arg, &mut f),
            Try { block, handler, finalizer } => {
                f(*block);
                each_opt(handler, &mut f);
                each_opt(finalizer, &mut f);
            }
            Catch { param, body } => {
                each_opt(param, &mut f);
                f(*body);
            }
            ImportDecl { specifiers, .. } => {
                for &s in specifiers {
                    f(s);
                }
            }
            ImportDefaultSpec { local } | ImportNamespaceSpec { local }
            | ExportSpecifier { local, .. } => f(*local),
            ImportNamedSpec { local, .. } => f(*local),
            ExportNamed { decl, specifiers } => {
                each_opt(decl, &mut f);
                for &s in specifiers {
                    f(s);
                }
            }
        }
    }
}
