//! Arena-backed AST for ES5 plus ES6 modules.
//!
//! This crate is the *input* data model of the analysis passes: a parser
//! (external to this repository) lowers source text into an [`Ast`] via the
//! `add_*` constructors, attaching JSDoc records where the source carries
//! them. Nodes are stored in a flat arena and referenced by [`NodeId`];
//! parent links are wired at construction time, so consumers can walk both
//! down (through node payloads) and up (through [`Ast::parent`]).

pub mod arena;
pub mod jsdoc;
pub mod node;

pub use arena::Ast;
pub use jsdoc::JsDoc;
pub use node::{
    AssignOp, BinaryOp, DeclKind, Node, NodeId, NodeKind, UnaryOp, UpdateOp,
};
