use crate::buffer::OutputBuffer;
use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::tag::{Tag, VERSION};
use crate::value::Value;
use crate::atom::Atom;
use num_bigint::{BigInt, Sign};
use std::io::Write;

/// Used to encode a `Value` into an ETF message. The message is built in memory and only handed out
/// once the whole value has been encoded, so a failing encode never yields partial output.
pub struct Encoder {
    buf: OutputBuffer,
    config: EncoderConfig,
    depth: usize,
}

impl Encoder {

    /// Encode a value with the default configuration. The result starts with the version byte.
    pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
        Self::with_config(EncoderConfig::default()).encode_message(value)
    }

    /// Encode a value to the given writer. The resulting `usize` is the amount of bytes that got
    /// written.
    pub fn encode_to<W: Write>(value: &Value, writer: &mut W) -> Result<usize, EncodeError> {
        let bytes = Self::encode(value)?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Self { buf: OutputBuffer::new(), config, depth: 0 }
    }

    /// Consumes the encoder and returns the complete message for `value`.
    pub fn encode_message(mut self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        self.buf.put_u8(VERSION);
        self.encode_inner(value)?;
        Ok(self.buf.into_vec())
    }

    fn encode_inner(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Nil         => self.encode_atom_name("nil"),
            Value::Boolean(v)  => self.encode_atom_name(if *v { "true" } else { "false" }),
            Value::Integer(v)  => self.encode_integer(*v),
            Value::Float(v)    => self.encode_float(*v),
            Value::BigInt(v)   => self.encode_bigint(v),
            Value::Atom(v)     => self.encode_atom(v),
            Value::String(v)   => self.encode_binary(v.as_bytes()),
            Value::Binary(v)   => self.encode_binary(v),
            Value::List(inner) => {
                if inner.is_empty() {
                    self.buf.put_u8(Tag::Nil as u8);
                    return Ok(());
                }
                self.enter()?;
                self.buf.put_u8(Tag::List as u8);
                self.buf.put_u32(Self::to_u32(inner.len())?);
                for element in inner.iter() {
                    self.encode_inner(element)?;
                }
                self.buf.put_u8(Tag::Nil as u8);
                self.leave();
                Ok(())
            },
            Value::Tuple(inner) => {
                self.enter()?;
                match u8::try_from(inner.len()) {
                    Ok(arity) => {
                        self.buf.put_u8(Tag::SmallTuple as u8);
                        self.buf.put_u8(arity);
                    },
                    Err(_) => {
                        self.buf.put_u8(Tag::LargeTuple as u8);
                        self.buf.put_u32(Self::to_u32(inner.len())?);
                    },
                }
                for element in inner.iter() {
                    self.encode_inner(element)?;
                }
                self.leave();
                Ok(())
            },
            Value::Map(inner) => {
                self.enter()?;
                self.buf.put_u8(Tag::Map as u8);
                self.buf.put_u32(Self::to_u32(inner.len())?);
                for (key, val) in inner.iter() {
                    self.encode_inner(key)?;
                    self.encode_inner(val)?;
                }
                self.leave();
                Ok(())
            },
            Value::BitBinary(_)
                | Value::Port(_)
                | Value::Pid(_)
                | Value::Reference(_)
                | Value::Export(_) => Err(EncodeError::Unsupported(value.typename())),
        }
    }

    fn encode_integer(&mut self, v: i64) -> Result<(), EncodeError> {
        match i32::try_from(v) {
            Ok(v) if -128 < v && v < 128 => {
                self.buf.put_u8(Tag::SmallInteger as u8);
                self.buf.put_u8(v as i8 as u8);
            },
            Ok(v) => {
                self.buf.put_u8(Tag::Integer as u8);
                self.buf.put_i32(v);
            },
            Err(_) => {
                return self.encode_bigint(&BigInt::from(v));
            },
        }
        Ok(())
    }

    fn encode_float(&mut self, v: f64) -> Result<(), EncodeError> {
        if !v.is_finite() {
            return Err(EncodeError::NonFinite(v));
        }
        if self.config.integral_floats && v.fract() == 0.0 && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) {
            return self.encode_integer(v as i64);
        }
        self.buf.put_u8(Tag::NewFloat as u8);
        self.buf.put_f64(v);
        Ok(())
    }

    /// Always uses `LARGE_BIG_EXT`. The digit count is written once the magnitude has been
    /// consumed.
    fn encode_bigint(&mut self, v: &BigInt) -> Result<(), EncodeError> {
        self.buf.put_u8(Tag::LargeBig as u8);
        let count_at = self.buf.len();
        self.buf.put_u32(0);
        self.buf.put_u8(match v.sign() { Sign::Minus => 1, _ => 0 });
        let mut count = 0usize;
        let mut pending_zeros = 0usize;
        for limb in v.magnitude().iter_u64_digits() {
            let mut limb = limb;
            for _ in 0..8 {
                let digit = (limb & 0xff) as u8;
                limb >>= 8;
                // zero digits are only written once a non-zero digit follows them
                if digit == 0 {
                    pending_zeros += 1;
                } else {
                    for _ in 0..pending_zeros {
                        self.buf.put_u8(0);
                    }
                    count += pending_zeros + 1;
                    pending_zeros = 0;
                    self.buf.put_u8(digit);
                }
            }
        }
        self.buf.patch_u32(count_at, Self::to_u32(count)?);
        Ok(())
    }

    fn encode_atom(&mut self, atom: &Atom) -> Result<(), EncodeError> {
        let name = atom.as_str();
        if atom.is_ascii() {
            self.encode_atom_name(name)
        } else {
            let len = u16::try_from(name.len()).map_err(|_| EncodeError::Length(name.len()))?;
            self.buf.put_u8(Tag::AtomUtf8 as u8);
            self.buf.put_u16(len);
            self.buf.put_slice(name.as_bytes());
            Ok(())
        }
    }

    /// Writes an ASCII atom name with `SMALL_ATOM_UTF8_EXT`.
    fn encode_atom_name(&mut self, name: &str) -> Result<(), EncodeError> {
        let len = u8::try_from(name.len()).map_err(|_| EncodeError::Length(name.len()))?;
        self.buf.put_u8(Tag::SmallAtomUtf8 as u8);
        self.buf.put_u8(len);
        self.buf.put_slice(name.as_bytes());
        Ok(())
    }

    fn encode_binary(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let len = Self::to_u32(bytes.len())?;
        self.buf.put_u8(Tag::Binary as u8);
        self.buf.put_u32(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    fn enter(&mut self) -> Result<(), EncodeError> {
        if self.depth >= self.config.max_depth {
            tracing::debug!(max_depth = self.config.max_depth, "value nested too deeply to encode");
            return Err(EncodeError::Depth(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    #[inline]
    fn to_u32(value: usize) -> Result<u32, EncodeError> {
        u32::try_from(value).map_err(|_| EncodeError::Length(value))
    }

}
