use thiserror::Error;

#[derive(Debug, Error)]
pub enum TierError {
    #[error("{field} out of range: {value}")]
    InvalidRange { field: &'static str, value: f64 },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Scoring stage '{stage}' failed: {message}")]
    Stage { stage: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base load failed: {0}")]
    KnowledgeLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TierError {
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        TierError::Stage { stage, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, TierError>;

/// Check that `value` lies in [0, 1].
pub fn check_unit_interval(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(TierError::InvalidRange { field, value })
    }
}
