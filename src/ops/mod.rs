//! High-level operations behind each CLI command.
//!
//! Operations take configuration and collaborators as arguments and return
//! values; printing is left to the binary.

pub mod entry;
pub mod init;
pub mod site;

// Re-export commonly used functions
pub use entry::{entry_path, list_entries, new_entry, open_entry, search_entries, PathTarget};
pub use init::{describe_config, init_config, version_info};
pub use site::{build_site, serve};
