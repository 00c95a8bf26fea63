use thiserror::Error;

pub type RaffleResult<T> = Result<T, RaffleError>;

#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Snapshot day {day} is outside the evaluation window [1, {duration_days}]")]
    DayOutOfRange { day: u32, duration_days: u32 },

    #[error("Unknown campaign: {0}")]
    UnknownCampaign(String),

    #[error("Unknown phase '{phase}' in campaign '{campaign}'")]
    UnknownPhase { campaign: String, phase: String },

    #[error("Campaign '{0}' has neither an explicit duration nor start/end dates")]
    MissingSchedule(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RaffleError {
    fn from(e: config::ConfigError) -> Self {
        RaffleError::Config(e.to_string())
    }
}
