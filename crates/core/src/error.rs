use thiserror::Error;

pub type RewardsResult<T> = Result<T, RewardsError>;

#[derive(Error, Debug)]
pub enum RewardsError {
    /// Well-formed but unrecognized (user type, level) combination.
    #[error("No tier defined for user type '{user_type}' at level '{level}'")]
    TierNotFound { user_type: String, level: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RewardsError {
    pub fn tier_not_found(user_type: impl Into<String>, level: impl Into<String>) -> Self {
        RewardsError::TierNotFound {
            user_type: user_type.into(),
            level: level.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        RewardsError::InvalidArgument(msg.into())
    }
}
