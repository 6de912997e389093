//! User interface module - progress and diagnostic output.
//!
//! Runs are non-interactive (they execute in CI), so everything here is output:
//! - `formatter` - Line builders and printers for run progress

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_beta_notice, display_boundary_warning, display_error, display_release_summary,
    display_remediation, display_run_header, display_skip, display_status, display_success,
};
