//! Errors raised by the dispatch and cost engine.
//!
//! The engine never retries and never returns partial results: any of these aborts the whole call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The battery configuration or cost policy is inconsistent.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The input series is empty, malformed, or misaligned with the price series.
    #[error("invalid input: {0}")]
    InputValidation(String),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::InputValidation(message.into())
    }
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
