//! SSH client config parsing, merging and generation.
//!
//! Managed hosts live between sentinel comments owned by one source each;
//! everything outside those sections is left as the user wrote it.

pub mod merge;
pub mod parser;
pub mod writer;

pub use merge::{merge_hosts, merge_sources, validate_entries};
pub use parser::{ConfigFile, Parser};
pub use writer::{write_config, write_document, write_string};

/// Opens a managed section: `# === BEGIN MMDOT MANAGED: <name> ===`.
pub const BEGIN_MARKER: &str = "# === BEGIN MMDOT MANAGED:";

/// Closes a managed section: `# === END MMDOT MANAGED: <name> ===`.
pub const END_MARKER: &str = "# === END MMDOT MANAGED:";

/// Trailing decoration of both markers.
pub const MARKER_SUFFIX: &str = "===";
