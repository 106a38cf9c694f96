use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid skip: {0}")]
    InvalidSkip(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),
}
