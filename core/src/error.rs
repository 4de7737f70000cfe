use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(
        "Invalid bucket thresholds: expected ok_max < alert_min <= alert_max < critical_min, \
         got {ok_max}/{alert_min}/{alert_max}/{critical_min}"
    )]
    InvalidThresholds {
        ok_max: u32,
        alert_min: u32,
        alert_max: u32,
        critical_min: u32,
    },

    #[error("Invalid financial bands: {reason}")]
    InvalidFinancialBands { reason: String },

    #[error("Score weights allow {max_score} points, above the {cap} cap")]
    WeightsExceedCap { max_score: u64, cap: u32 },

    #[error("Unknown config key '{key}'")]
    UnknownConfigKey { key: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScoreResult<T> = Result<T, ScoreError>;
