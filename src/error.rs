//! Error types for conjure.
//!
//! All errors in conjure are represented by [`ConjureError`]. Every variant
//! belongs to one [`ErrorKind`], which is how callers tell configuration
//! mistakes apart from missing files and malformed pane trees.

use crate::config::BackendType;
use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`ConjureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported or misconfigured backend, macro, shell or command.
    Configuration,
    /// Something looked up by name does not exist.
    NotFound,
    /// The pane tree breaks a nesting rule.
    Structural,
    /// Filesystem or process failure.
    Io,
}

/// All possible errors that can occur in conjure.
#[derive(Error, Debug)]
pub enum ConjureError {
    /// Config file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Could not determine the user's config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// App config TOML parsing failed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Schema YAML parsing failed.
    #[error("Failed to parse schema: {0}")]
    SchemaParse(#[from] serde_yaml::Error),

    /// Schema parsed but breaks a basic rule (empty name, no panes).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// No schema file with this name in the schemas folder.
    #[error("No schema named '{name}' under the folder {}", .folder.display())]
    SchemaNotFound {
        /// Requested schema name.
        name: String,
        /// Folder that was searched.
        folder: PathBuf,
    },

    /// A schema with this name already exists.
    #[error("Schema already exists: {}", .0.display())]
    SchemaExists(PathBuf),

    /// Backend is not allowed in the root position.
    #[error("Backend type '{0}' not supported as a root plugin")]
    UnsupportedRootBackend(BackendType),

    /// Backend is not allowed in the nested position.
    #[error("Backend type '{0}' not supported as a nested plugin")]
    UnsupportedNestedBackend(BackendType),

    /// Backend or macro options did not match what the target accepts.
    #[error("Invalid options for {target}: {message}")]
    InvalidOptions {
        /// Backend or macro the options belong to.
        target: String,
        /// Decoder message.
        message: String,
    },

    /// Shell dialect outside of bash, zsh and fish.
    #[error("Shell type '{0}' is not supported")]
    UnsupportedShell(String),

    /// Command could not be split or quoted.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Macro name is not in the registry.
    #[error("Macro named '{0}' does not exist")]
    MacroNotFound(String),

    /// Script was never written (or was removed).
    #[error("Script named '{name}' doesn't exist at {}", .path.display())]
    ScriptNotFound {
        /// Script name without extension.
        name: String,
        /// Where the script was expected.
        path: PathBuf,
    },

    /// Root panes cannot declare `run-before`.
    #[error("Root pane '{0}' cannot have 'run-before' set")]
    RootPaneRunBefore(String),

    /// A nested root pane needs `wizard.root.nested`.
    #[error("Root pane '{0}' has nested=true but no nested backend is configured")]
    MissingNestedBackend(String),

    /// A nested root pane needs child panes.
    #[error("Root pane '{0}' has nested=true but no child panes")]
    NoChildPanes(String),

    /// A spawned process failed.
    #[error("Command '{0}' exited with a non-zero status")]
    ExecutionFailed(String),
}

impl ConjureError {
    /// Category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConjureError::ConfigParse(_)
            | ConjureError::SchemaParse(_)
            | ConjureError::InvalidSchema(_)
            | ConjureError::SchemaExists(_)
            | ConjureError::NoConfigDir
            | ConjureError::UnsupportedRootBackend(_)
            | ConjureError::UnsupportedNestedBackend(_)
            | ConjureError::InvalidOptions { .. }
            | ConjureError::UnsupportedShell(_)
            | ConjureError::InvalidCommand(_) => ErrorKind::Configuration,
            ConjureError::ConfigNotFound(_)
            | ConjureError::SchemaNotFound { .. }
            | ConjureError::MacroNotFound(_)
            | ConjureError::ScriptNotFound { .. } => ErrorKind::NotFound,
            ConjureError::RootPaneRunBefore(_)
            | ConjureError::MissingNestedBackend(_)
            | ConjureError::NoChildPanes(_) => ErrorKind::Structural,
            ConjureError::IoError(_) | ConjureError::ExecutionFailed(_) => ErrorKind::Io,
        }
    }
}

/// Convenient Result type alias for conjure operations.
pub type Result<T> = std::result::Result<T, ConjureError>;
