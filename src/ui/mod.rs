//! User interface module - operator-facing output.
//!
//! Interactive hand-offs (editor, fix-up shell) live in [crate::operator];
//! this module only prints.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_build_failure, display_candidates, display_changelog,
    display_error, display_package_header, display_run_summary, display_status, display_success,
};
