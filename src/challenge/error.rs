use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("no security question stored for principal {0}")]
    LookupFailure(String),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("notification delivery failed: {0}")]
    NotifierFailure(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ChallengeError {
    /// Errors that abort the provider conversation instead of failing it.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LookupFailure(_) | Self::Store(_))
    }
}
