//! Result type alias for remold operations

use crate::error::RemoldError;

/// Standard Result type for remold operations
pub type Result<T> = std::result::Result<T, RemoldError>;

/// Extension trait for Result to separate per-document failures from fatal ones
pub trait ResultExt<T> {
    /// Turn a recoverable error into `Ok(Err(..))` so a batch can carry on
    fn recoverable(self) -> Result<std::result::Result<T, RemoldError>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<std::result::Result<T, RemoldError>> {
        match self {
            Ok(value) => Ok(Ok(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Recoverable error: {}", err);
                Ok(Err(err))
            }
            Err(err) => Err(err),
        }
    }
}
