//! An encoder and decoder for the Erlang External Term Format (ETF), the binary serialization used by
//! Erlang/OTP for distribution and `term_to_binary/1`.
//!
//! Every message starts with the version byte `131`, followed by exactly one term. A term is a tag
//! byte and a payload whose layout the tag selects. Values on the Rust side are represented by the
//! closed enum `Value`.
//!
//! # A note on integers
//!
//! ETF has two fixed width integer forms (one unsigned byte and four signed bytes) and arbitrary
//! precision big integers. `Value::Integer` holds an `i64`; values outside of the 32 bit range are
//! encoded as big integers and come back as `Value::BigInt`. The one byte form is read as a signed
//! byte by this crate, so that negative small integers survive a round trip.
//!
//! This breaks compatibility with Erlang itself: `term_to_binary/1` writes every integer in
//! `0..=255` with the one byte form, and this crate reads `128..=255` back as `-128..=-1`.
//! `[131, 97, 200]` from an Erlang node decodes to `Value::Integer(-56)`, not `200`. Messages
//! produced by this crate are not affected, since it only uses the one byte form for `-127..=127`.
//!
//! # A note on atoms
//!
//! The atoms `nil`, `null`, `true` and `false` have special meaning: they decode to `Value::Nil` and
//! `Value::Boolean`. Every other atom becomes a `Value::Atom` (or a `Value::String`, depending on the
//! `DecoderConfig`).
//!
//! # A note on Maps
//!
//! `Value::Map` is a `Vec` of key-value pairs in wire order because `f64` implements neither `Ord`
//! nor `Eq`, so a `Value` can not be used as a key in any of the standard library maps.
//!
//! # Examples
//!
//! ```
//! use etf::*;
//!
//! let value = Value::Tuple(vec![Value::atom("ok").unwrap(), Value::from(42)]);
//! let buf = pack(&value).unwrap();
//! assert_eq!(buf, [
//!     0x83, // version
//!     0x68, // SMALL_TUPLE_EXT
//!     0x02, // arity
//!     0x77, // SMALL_ATOM_UTF8_EXT
//!     0x02, // length
//!     0x6f, // 'o'
//!     0x6b, // 'k'
//!     0x61, // SMALL_INTEGER_EXT
//!     0x2a, // 42
//! ]);
//! assert_eq!(value, unpack(&buf).unwrap());
//! ```

mod atom;
mod buffer;
mod config;
mod decoder;
mod encoder;
mod error;
mod tag;
mod value;

pub use atom::*;
pub use buffer::*;
pub use config::*;
pub use decoder::*;
pub use encoder::*;
pub use error::*;
pub use tag::*;
pub use value::*;

/// Encode `value` into a complete message with the default configuration.
pub fn pack(value: &Value) -> Result<Vec<u8>, EncodeError> {
    pack_with(value, &EncoderConfig::default())
}

pub fn pack_with(value: &Value, config: &EncoderConfig) -> Result<Vec<u8>, EncodeError> {
    let bytes = Encoder::with_config(config.clone()).encode_message(value)?;
    tracing::trace!(kind = value.typename(), len = bytes.len(), "packed value");
    Ok(bytes)
}

/// Decode a complete message with the default configuration.
pub fn unpack(buf: &[u8]) -> Result<Value, DecoderError> {
    unpack_with(buf, &DecoderConfig::default())
}

pub fn unpack_with(buf: &[u8], config: &DecoderConfig) -> Result<Value, DecoderError> {
    let value = Decoder::with_config(buf, config.clone()).decode_message()?;
    tracing::trace!(kind = value.typename(), len = buf.len(), "unpacked value");
    Ok(value)
}
