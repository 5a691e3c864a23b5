//! Error handling for the skeleton installer
//!
//! Two layers, the same way the rest of the crate reports failures:
//! 1. [`SkeletonError`] - strongly typed failure cases raised at the boundaries
//! 2. [`ErrorContext`] - a user-facing wrapper with details and a suggestion
//!
//! Application code returns [`anyhow::Result`] and wraps typed errors with
//! context; the CLI converts whatever reaches it with [`user_friendly_error`].
//!
//! Note that most workflow outcomes are *not* errors. A failed restricted
//! install or a lock file that could not be rewritten is reported through the
//! console and the run still returns normally to the host. Only malformed
//! input and infrastructure problems surface here.
//!
//! # Examples
//!
//! ```rust,no_run
//! use skeleton_installer::core::{ErrorContext, SkeletonError, user_friendly_error};
//!
//! let ctx = ErrorContext::new(SkeletonError::ManifestNotFound {
//!     path: "composer.json".to_string(),
//! })
//! .with_suggestion("Run the installer from the project root");
//! ctx.display();
//!
//! let friendly = user_friendly_error(anyhow::anyhow!("something broke"));
//! println!("{friendly}");
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for skeleton installer operations.
///
/// ## Precondition violations
/// - [`InvalidInput`](Self::InvalidInput) - a collection was built from something that is not a list or mapping
/// - [`InvalidSpec`](Self::InvalidSpec) - an optional package was built from a spec missing required keys
///
/// ## Lookup misses
/// - [`KeyNotFound`](Self::KeyNotFound) - indexing a collection with an absent key
///
/// ## Files and configuration
/// - [`ManifestNotFound`](Self::ManifestNotFound), [`ManifestParseError`](Self::ManifestParseError)
/// - [`LockfileParseError`](Self::LockfileParseError)
/// - [`ConfigError`](Self::ConfigError)
/// - [`FileSystemError`](Self::FileSystemError), [`PermissionDenied`](Self::PermissionDenied)
/// - [`UnsafePackagePath`](Self::UnsafePackagePath) - a package name that would leave the vendor directory
///
/// ## Host collaboration
/// - [`InvalidVersionConstraint`](Self::InvalidVersionConstraint)
/// - [`InstallCommandNotFound`](Self::InstallCommandNotFound), [`InstallCommandFailed`](Self::InstallCommandFailed)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    /// Collection input was neither a list nor a mapping
    #[error("Collections require arrays or iterable objects, got {found}")]
    InvalidInput {
        /// Description of the value that was supplied
        found: String,
    },

    /// Collection lookup for a key that is not present
    #[error("Offset {key} does not exist in the collection")]
    KeyNotFound {
        /// The key that was requested
        key: String,
    },

    /// Optional package spec is missing one of `name`, `constraint`, `prompt`
    #[error("Optional package spec is missing required key '{key}'")]
    InvalidSpec {
        /// The first required key found missing
        key: String,
    },

    /// Manifest file does not exist
    #[error("Manifest file not found: {path}")]
    ManifestNotFound {
        /// Path that was expected to contain the manifest
        path: String,
    },

    /// Manifest file is not a JSON object
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Path to the manifest file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// Lock file is not valid JSON lock data
    #[error("Invalid lockfile syntax in {file}")]
    LockfileParseError {
        /// Path to the lock file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// Version constraint could not be parsed
    #[error("Invalid version constraint: {constraint}")]
    InvalidVersionConstraint {
        /// The constraint string as written in the manifest
        constraint: String,
    },

    /// The configured install command is not on PATH
    #[error("Install command '{program}' was not found")]
    InstallCommandNotFound {
        /// Program name from the configuration
        program: String,
    },

    /// The install command could not be started
    #[error("Failed to run install command '{command}'")]
    InstallCommandFailed {
        /// Rendered command line
        command: String,
        /// Underlying reason
        reason: String,
    },

    /// Configuration file problem
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// General file system failure
    #[error("File system error: {operation} on {path}")]
    FileSystemError {
        /// The operation that failed
        operation: String,
        /// The path involved
        path: String,
    },

    /// Insufficient permissions
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied {
        /// The operation that failed
        operation: String,
        /// The path involved
        path: String,
    },

    /// Package name that does not map to a directory below the vendor directory
    #[error("Package name '{name}' does not resolve to a directory inside the vendor directory")]
    UnsafePackagePath {
        /// The offending package name
        name: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// An error with optional user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SkeletonError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without any additional context.
    #[must_use]
    pub fn new(error: SkeletonError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Typed [`SkeletonError`]s get tailored suggestions. IO, JSON and TOML errors
/// from anywhere in the chain are mapped onto the closest variant. Anything
/// else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(skeleton_error) = error.downcast_ref::<SkeletonError>() {
        return create_error_context(skeleton_error.clone());
    }

    if let Some(file_error) = error.downcast_ref::<super::file_error::FileOperationError>() {
        return ErrorContext::new(SkeletonError::FileSystemError {
            operation: file_error.operation.to_string(),
            path: file_error.file_path.display().to_string(),
        })
        .with_details(file_error.user_message());
    }

    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            match io_error.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    return ErrorContext::new(SkeletonError::PermissionDenied {
                        operation: "file access".to_string(),
                        path: "unknown".to_string(),
                    })
                    .with_suggestion("Check the ownership and permissions of the project files")
                    .with_details(error.to_string());
                }
                std::io::ErrorKind::NotFound => {
                    return ErrorContext::new(SkeletonError::FileSystemError {
                        operation: "file access".to_string(),
                        path: "unknown".to_string(),
                    })
                    .with_suggestion(
                        "Check that the file or directory exists and the path is correct",
                    )
                    .with_details(error.to_string());
                }
                _ => {}
            }
        }

        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(SkeletonError::ConfigError {
                message: toml_error.to_string(),
            })
            .with_suggestion("Check the TOML syntax of the installer configuration file");
        }

        if let Some(json_error) = cause.downcast_ref::<serde_json::Error>() {
            return ErrorContext::new(SkeletonError::ManifestParseError {
                file: "unknown".to_string(),
                reason: json_error.to_string(),
            })
            .with_suggestion("Check the JSON syntax of the file")
            .with_details(error.to_string());
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SkeletonError::Other {
        message,
    })
}

fn create_error_context(error: SkeletonError) -> ErrorContext {
    match &error {
        SkeletonError::ManifestNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run the installer from the project root, or pass --project-dir")
            .with_details("The manifest name can be overridden with the COMPOSER environment variable"),
        SkeletonError::ManifestParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the manifest for JSON syntax errors")
            .with_details("The manifest must be a JSON object at the top level"),
        SkeletonError::LockfileParseError {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Delete the lock file and run a fresh install to regenerate it",
        ),
        SkeletonError::InvalidSpec {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Every optional package needs 'name', 'constraint' and 'prompt' keys",
        ),
        SkeletonError::InstallCommandNotFound {
            program,
        } => {
            let suggestion = format!(
                "Install '{program}' or set 'install-command' in the installer configuration"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        SkeletonError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the installer configuration file for invalid keys or values"),
        _ => ErrorContext::new(error),
    }
}
