use thiserror::Error;

/// Coarse classification of registry failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required input missing or malformed
    Validation,
    /// Referenced model (or file) does not exist
    NotFound,
    /// Backing store unreachable or write failed
    Storage,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("model {0} not found")]
    NotFound(String),

    #[error("file {file} not found in model {id}")]
    FileNotFound { id: String, file: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Storage(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::Io(_) | Self::Encoding(_) | Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_every_variant() {
        assert_eq!(RegistryError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(RegistryError::NotFound("a".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RegistryError::FileNotFound { id: "a".into(), file: "b".into() }.kind(),
            ErrorKind::NotFound
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(RegistryError::from(io).kind(), ErrorKind::Storage);
        assert_eq!(RegistryError::Storage("lock".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = RegistryError::NotFound("abc".into());
        assert_eq!(err.to_string(), "model abc not found");
    }
}
