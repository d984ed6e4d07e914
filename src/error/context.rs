//! Context helpers for attaching operator-facing detail to errors.

use super::{FormsyncError, Result};

/// Extension trait for adding context to any fallible result.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::WithContext` if `self` is an error.
    fn context(self, context: &str) -> Result<T>;

    /// Wrap the error with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::WithContext` if `self` is an error.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|source| FormsyncError::WithContext {
            context: context.to_string(),
            source: Box::new(source),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| FormsyncError::WithContext {
            context: f(),
            source: Box::new(source),
        })
    }
}

/// Extension trait for turning a missing value into a shape error.
pub trait OptionExt<T> {
    /// Convert `None` into a [`FormsyncError::Shape`] for the given record.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::Shape` if `self` is `None`.
    fn ok_or_shape(self, collection: &str, index: usize, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_shape(self, collection: &str, index: usize, reason: &str) -> Result<T> {
        self.ok_or_else(|| FormsyncError::shape(collection, index, reason))
    }
}
