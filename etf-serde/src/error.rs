use std::fmt::Display;
use serde::{de, ser};
use etf::{AtomError, DecoderError, EncodeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // Decode
    #[error("Decoding error: {0}")]
    Decode(#[from] DecoderError),
    #[error("Unexpected value: expected {0}, found {1}")]
    UnexpectedValue(&'static str, &'static str),
    #[error("Integer didn't fit into target type")]
    Int,
    #[error("Expected a single character, found {0:?}")]
    Char(String),
    // Encode
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Invalid atom: {0}")]
    Atom(#[from] AtomError),
    // Both
    #[error("{0}")]
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}
