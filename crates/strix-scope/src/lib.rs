//! Scope tree and binding model for the strix front-end.
//!
//! The checker consumes a [`ScopeTree`]: scopes and bindings in flat arenas,
//! a node→scope map for scope-introducing nodes, and a declaration-site map
//! resolving every declaring identifier to its binding. [`build`] is the
//! reference implementation of the scope-builder contract; a host compiler
//! with its own scope construction only needs to produce the same tree.

pub mod binding;
pub mod build;
pub mod scope;


pub use binding::{Binding, BindingId, BindingKind};
pub use build::build;
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
