//! Repository error type shared by every persistence operation.
//!
//! # Responsibility
//! - Carry one human-readable message plus the chain of underlying causes.
//! - Keep storage-engine error types from leaking past the repository layer.
//!
//! # Invariants
//! - `source()` always yields the first recorded cause.
//! - A missing register is not an error; lookups return `Ok(None)`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepositoryError>;

type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Single error kind raised by scopes and register repositories.
#[derive(Debug)]
pub struct RepositoryError {
    message: String,
    causes: Vec<Cause>,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Builds an error wrapping a single underlying cause.
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::new(message).caused_by(cause)
    }

    /// Appends one more cause, keeping the earlier ones first.
    pub fn caused_by(mut self, cause: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// All recorded causes in the order they were observed.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn Error + Send + Sync + 'static)> {
        self.causes.iter().map(|cause| cause.as_ref())
    }
}

impl Display for RepositoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for cause in &self.causes {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl Error for RepositoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.causes
            .first()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::RepositoryError;
    use std::error::Error;

    #[test]
    fn display_joins_message_and_causes() {
        let err = RepositoryError::new("error committing scope")
            .caused_by("database is locked")
            .caused_by("close failed");

        assert_eq!(
            err.to_string(),
            "error committing scope: database is locked: close failed"
        );
        assert_eq!(err.causes().count(), 2);
    }

    #[test]
    fn source_is_first_cause() {
        let inner = RepositoryError::new("error adding entry");
        let outer = RepositoryError::with_cause("error adding register 1", inner);

        let source = outer.source().expect("cause should be exposed");
        assert_eq!(source.to_string(), "error adding entry");
        assert_eq!(outer.message(), "error adding register 1");
    }

    #[test]
    fn error_without_causes_has_no_source() {
        let err = RepositoryError::new("database path not configured");
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "database path not configured");
    }
}
