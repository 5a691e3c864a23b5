//! Shared helpers
//!
//! - [`fs`] - Atomic writes, JSON serialization and directory removal

pub mod fs;

pub use fs::{atomic_write, ensure_dir, remove_dir_all, to_json_pretty, write_json_file};
