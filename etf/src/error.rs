use crate::tag::Tag;
use std::str::Utf8Error;
use thiserror::Error;

/// A decoding failure together with the input position at which it occurred.
#[derive(Debug, PartialEq, Error)]
#[error("{inner} at input position {at}")]
pub struct DecoderError {
    #[source]
    inner: DecodeError,
    at: usize,
}

impl DecoderError {

    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn inner(&self) -> &DecodeError {
        &self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }

}

#[derive(Debug, PartialEq, Error)]
pub enum DecodeError {
    #[error("Unexpected end of buffer: needed {needed} byte(s), {available} available")]
    Eof { needed: usize, available: usize },
    #[error("Incompatible ETF version {0}, expected 131")]
    Version(u8),
    #[error("Compressed payloads are not supported")]
    Compressed,
    #[error("Unknown term tag {0}")]
    UnknownTag(u8),
    #[error("Unsupported term {0}")]
    Unsupported(Tag),
    #[error("List does not end with the NIL_EXT terminator but with tag {0}")]
    ListTail(u8),
    #[error("Big integer of {0} digits exceeds the supported width")]
    BigIntTooLarge(usize),
    #[error("Invalid big integer sign {0}")]
    Sign(u8),
    #[error("Invalid number of significant bits {0} in bitstring")]
    BitCount(u8),
    #[error("String slice was not valid Utf-8: {0}")]
    Utf8(#[from] Utf8Error),
    #[error("Invalid atom: {0}")]
    Atom(#[from] AtomError),
    #[error("Expected {expected}, found tag {found}")]
    UnexpectedTag { expected: &'static str, found: u8 },
    #[error("Duplicate map key {0}")]
    DuplicateKey(String),
    #[error("Nesting exceeds the maximum depth of {0}")]
    Depth(usize),
    #[error("{0} trailing byte(s) after the term")]
    Trailing(usize),
    #[error("An allocation failed")]
    Allocation,
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }
}

impl From<std::collections::TryReserveError> for DecodeError {
    fn from(_e: std::collections::TryReserveError) -> DecodeError {
        DecodeError::Allocation
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),
    #[error("Length {0} exceeds maximum {}", u32::MAX)]
    Length(usize),
    #[error("Non-finite float {0} can not be encoded")]
    NonFinite(f64),
    #[error("Values of kind {0} can not be encoded")]
    Unsupported(&'static str),
    #[error("Nesting exceeds the maximum depth of {0}")]
    Depth(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtomError {
    #[error("Atom name of {0} characters exceeds the maximum of 255")]
    TooLong(usize),
}
