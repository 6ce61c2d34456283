use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("book delta carries invalid side byte {0}")]
    InvalidSide(u8),

    #[error("book delta carries invalid action byte {0}")]
    InvalidAction(u8),
}
