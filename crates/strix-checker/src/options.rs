//! Pass configuration.

use strix_common::CancelToken;

/// Configuration for the variable-reference check.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Report assignments to locals that are never read
    /// (`UNUSED_LOCAL_ASSIGNMENT`). Off by default.
    pub unused_local_assignments: bool,
    /// Route `import` bindings through the unused-local rule as well.
    /// Off by default: unreferenced imports currently produce no warning,
    /// and flipping this is the supported way to change that without
    /// changing the default contract.
    pub unused_imports: bool,
    /// Optional cooperative cancellation; polled between scope exits.
    pub cancel: Option<CancelToken>,
}
