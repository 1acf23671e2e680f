//! Keyholder error taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Errors the binary distinguishes when choosing what to print and how to exit
#[derive(Error, Debug)]
pub enum KeyholderError {
    #[error("Key for '{0}' not found.")]
    NotFound(String),

    #[error("Secret store error: {0}")]
    Store(String),

    #[error("{} is corrupted and could not be loaded: {reason}", .path.display())]
    CorruptData { path: PathBuf, reason: String },

    #[error("Failed to copy to clipboard (is a display server running?): {0}")]
    ClipboardUnavailable(String),

    #[error("Invalid key name: {0}")]
    InvalidName(String),
}

impl KeyholderError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 1,
            _ => 2,
        }
    }
}

/// Check that a name can live in the line-oriented index
pub fn validate_name(name: &str) -> Result<(), KeyholderError> {
    if name.is_empty() {
        return Err(KeyholderError::InvalidName(
            "Name cannot be empty".to_string(),
        ));
    }

    if name.contains(['\n', '\r']) {
        return Err(KeyholderError::InvalidName(format!(
            "Name cannot contain line breaks: {:?}",
            name
        )));
    }

    if name.trim() != name {
        return Err(KeyholderError::InvalidName(format!(
            "Name cannot start or end with whitespace: {:?}",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(KeyholderError::NotFound("x".into()).exit_code(), 1);
        assert_eq!(KeyholderError::Store("down".into()).exit_code(), 2);
        assert_eq!(
            KeyholderError::ClipboardUnavailable("no display".into()).exit_code(),
            2
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("openai").is_ok());
        assert!(validate_name("api/openai").is_ok());
        assert!(validate_name("my service").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name("two\nlines").is_err());
        assert!(validate_name("carriage\r").is_err());
        assert!(validate_name(" padded").is_err());
        assert!(validate_name("padded ").is_err());
    }

    #[test]
    fn test_not_found_message() {
        let err = KeyholderError::NotFound("ghost".into());
        assert_eq!(err.to_string(), "Key for 'ghost' not found.");
    }
}
