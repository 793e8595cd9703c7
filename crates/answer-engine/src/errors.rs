use action_primitives::ActionError;
use thiserror::Error;

/// Errors emitted by an oracle. The resolver absorbs all of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Network failure, timeout or server-side error
    #[error("oracle transport failure: {0}")]
    Transport(String),

    /// Every configured key was rate limited
    #[error("oracle rate limited: {0}")]
    RateLimited(String),

    /// The oracle answered but the payload could not be read
    #[error("malformed oracle response: {0}")]
    Malformed(String),

    /// The request was rejected or could not be built
    #[error("invalid oracle request: {0}")]
    InvalidRequest(String),
}

impl OracleError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Errors raised while reading a question from the interface
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("question text not found")]
    QuestionNotFound,

    #[error("question text is empty")]
    EmptyQuestion,

    #[error("no answer options found")]
    NoOptions,

    #[error("failed to read question: {0}")]
    Action(#[from] ActionError),
}
