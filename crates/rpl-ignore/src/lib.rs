//! Path exclusion for directory sync.
//!
//! A directory handed to a sync may carry a `.replicateignore` file at its
//! top level. Each non-blank, non-comment line is a glob pattern; a file whose
//! basename or relative path matches *any* pattern is left out of the upload.
//! There is no precedence between patterns and no re-inclusion.
//!
//! # Modules
//!
//! - [`error`] — Error types for strict rule construction
//! - [`matcher`] — The pure `(pattern, path) -> bool` matcher and line parser
//! - [`rules`] — [`IgnoreRules`], the rule set loaded for one sync

pub mod error;
pub mod matcher;
pub mod rules;

pub use error::{IgnoreError, IgnoreResult};
pub use matcher::{parse_patterns, pattern_matches};
pub use rules::IgnoreRules;

/// Name of the ignore file looked up at the top of a synced directory.
pub const IGNORE_FILE_NAME: &str = ".replicateignore";
