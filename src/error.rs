use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown timezone [{0}]")]
    UnknownTimezone(String),

    #[error("Invalid date [{0}]: expected DD-MM-YYYY")]
    InvalidDate(String),

    #[error("Local time [{0}] does not exist in timezone [{1}]")]
    InvalidLocalTime(String, String),

    #[error("Path template failed to compile: {0}")]
    Template(#[from] regex::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML deserialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
