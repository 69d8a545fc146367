//! Shared primitives used across Lectern crates.

use thiserror::Error;

/// Result alias used across the workspace.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Top-level error type.
///
/// `code` is a stable dotted identifier (`reader.settings.parse_failed`) that
/// callers and tests match on; `message` is for humans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ReaderError {
    pub code: &'static str,
    pub message: String,
}

impl ReaderError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReaderError;

    #[test]
    fn display_prefixes_code() {
        let error = ReaderError::new("reader.io.read_failed", "missing file `page.html`");
        assert_eq!(
            error.to_string(),
            "reader.io.read_failed: missing file `page.html`"
        );
    }
}
