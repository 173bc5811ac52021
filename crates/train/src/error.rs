use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("could not open config {path}: {source}")]
    ConfigOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid value at {path}:{line} for key {key}")]
    ConfigParse {
        path: String,
        line: usize,
        key: String,
    },

    #[error("checkpoint io failed at {path}: {reason}")]
    Checkpoint { path: String, reason: String },

    #[error("self-play failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, TrainError>;
