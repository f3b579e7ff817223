use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("similarity threshold must be in (0, 1], got {value}")]
    InvalidThreshold { value: f32 },

    #[error("retry attempts must be between 1 and {max}, got {value}")]
    InvalidRetries { value: u32, max: u32 },
}
