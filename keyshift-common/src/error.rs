//! Common error types for keyshift

use thiserror::Error;

/// Common result type for keyshift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across keyshift crates
#[derive(Error, Debug)]
pub enum Error {
    /// No `<note><maj|min...>` pattern anywhere in the uploaded filename
    #[error("Could not detect key from filename: {0}")]
    NoKeyInFilename(String),

    /// Key name is not present in the pitch class table
    #[error("Invalid key: {0}")]
    UnknownKey(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the error was caused by the caller's request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NoKeyInFilename(_) | Error::UnknownKey(_) | Error::InvalidInput(_)
        )
    }
}
