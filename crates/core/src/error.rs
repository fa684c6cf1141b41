use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoresError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("{0}")]
    Other(String),
}
