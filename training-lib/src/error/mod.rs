//! Error types

mod check;
mod config;

pub use check::*;
pub use config::*;

/// Top-level error for the training library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An existence check failed.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A binding was attached outside of a Tokio runtime.
    #[error("validator must be attached from within a Tokio runtime")]
    NoRuntime,
}
