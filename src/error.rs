use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised by the tree model and its hosts.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A directory was expected but the path is something else.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A file was expected but the path is a directory.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cursor position or parent directory could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Batch rename received a different number of names than targets.
    #[error("Expected {expected} names but got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A trash token could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The operation is not supported by this kind of node.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Configuration could not be resolved.
    #[error("Config error: {0}")]
    Config(String),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<base64::DecodeError> for TreeError {
    fn from(err: base64::DecodeError) -> Self {
        TreeError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TreeError = io_err.into();
        assert!(matches!(err, TreeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn count_mismatch_display() {
        let err = TreeError::CountMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Expected 3 names but got 2");
    }

    #[test]
    fn not_a_directory_display() {
        let err = TreeError::NotADirectory(PathBuf::from("/tmp/a.txt"));
        assert_eq!(err.to_string(), "Not a directory: /tmp/a.txt");
    }

    #[test]
    fn base64_error_becomes_decode() {
        use base64::Engine as _;
        let err: TreeError = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode("!!!")
            .unwrap_err()
            .into();
        assert!(matches!(err, TreeError::Decode(_)));
    }

    #[test]
    fn json_error_becomes_decode() {
        let err: TreeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TreeError::Decode(_)));
    }

    #[test]
    fn terminal_error_display() {
        let err = TreeError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }
}
