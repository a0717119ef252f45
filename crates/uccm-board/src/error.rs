//! Error types for board operations.

use std::path::PathBuf;

/// Errors that can occur loading or validating a board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading board files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board file not found.
    #[error("board file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Neither a project board file nor a built-in board has this name.
    #[error("unknown board '{name}'")]
    UnknownBoard { name: String },

    /// Invalid class name in a board file or leg usage.
    #[error("unknown capability class '{0}'")]
    UnknownClass(String),
}

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;
