//! Core types for the skeleton installer
//!
//! Error handling lives here:
//! - [`SkeletonError`] - typed failure cases
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for CLI display
//! - [`file_error`] - file operation errors that remember what they were doing

pub mod error;
pub mod file_error;

pub use error::{ErrorContext, SkeletonError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};
