use crate::atom::Atom;
use crate::config::{AtomDecoding, BinaryDecoding, DecoderConfig, DuplicateKeys};
use crate::error::{DecodeError, DecoderError};
use crate::tag::{Tag, VERSION};
use crate::value::{BitBinary, Export, Pid, Port, Reference, Value};
use num_bigint::{BigInt, Sign};
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::str::from_utf8;

/// Used to decode ETF messages. Reads advance a single cursor through the input; every read checks
/// the remaining length first, so truncated input fails instead of producing a value.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    config: DecoderConfig,
}

impl<'a> Decoder<'a> {

    /// Decode a complete message with the default configuration.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<Value, DecoderError> {
        Self::with_config(buf.as_ref(), DecoderConfig::default()).decode_message()
    }

    pub fn with_config(buf: &'a [u8], config: DecoderConfig) -> Self {
        Self { buf, pos: 0, depth: 0, config }
    }

    /// Checks the version byte, rejects compressed payloads and decodes exactly one term.
    pub fn decode_message(mut self) -> Result<Value, DecoderError> {
        let value = self.decode_message_inner().map_err(|e| e.at(self.pos))?;
        Ok(value)
    }

    /// Decode a single term without a version byte, as found nested in other formats. Returns the
    /// value and the number of consumed bytes.
    pub fn decode_term(mut self) -> Result<(Value, usize), DecoderError> {
        let value = self.decode_value().map_err(|e| e.at(self.pos))?;
        Ok((value, self.pos))
    }

    fn decode_message_inner(&mut self) -> Result<Value, DecodeError> {
        let version = self.read_u8()?;
        if version != VERSION {
            tracing::debug!(version, "incompatible ETF version");
            return Err(DecodeError::Version(version));
        }
        if self.buf.get(self.pos) == Some(&(Tag::Compressed as u8)) {
            tracing::debug!("rejecting compressed payload");
            return Err(DecodeError::Compressed);
        }
        let value = self.decode_value()?;
        let trailing = self.buf.len() - self.pos;
        if trailing > 0 && !self.config.allow_trailing {
            return Err(DecodeError::Trailing(trailing));
        }
        Ok(value)
    }

    fn decode_value(&mut self) -> Result<Value, DecodeError> {
        let tag = self.read_tag()?;
        match tag {
            Tag::SmallTuple     => {
                let arity = usize::from(self.read_u8()?);
                self.decode_elements(arity).map(Value::Tuple)
            },
            Tag::LargeTuple     => {
                let arity = self.read_len()?;
                self.decode_elements(arity).map(Value::Tuple)
            },
            Tag::Map            => {
                let len = self.read_len()?;
                self.decode_map(len)
            },
            Tag::List           => {
                let len = self.read_len()?;
                let elements = self.decode_elements(len)?;
                match self.read_u8()? {
                    t if t == Tag::Nil as u8 => Ok(Value::List(elements)),
                    t => Err(DecodeError::ListTail(t)),
                }
            },
            _ => self.decode_scalar(tag),
        }
    }

    /// Every term without elements. Must stay out of line, otherwise its locals become part of the
    /// frame of each nesting level.
    #[inline(never)]
    fn decode_scalar(&mut self, tag: Tag) -> Result<Value, DecodeError> {
        match tag {
            Tag::SmallInteger   => Ok(Value::Integer(i64::from(self.read_u8()? as i8))),
            Tag::Integer        => Ok(Value::Integer(i64::from(self.read_i32()?))),
            Tag::Float
                | Tag::NewFloat => Ok(Value::Float(f64::from_be_bytes(self.read_array()?))),
            Tag::Atom
                | Tag::SmallAtom
                | Tag::AtomUtf8
                | Tag::SmallAtomUtf8 => {
                let name = self.read_atom_name(tag)?;
                self.alias_atom(name)
            },
            Tag::Nil            => Ok(Value::List(Vec::new())),
            Tag::String         => {
                let len = usize::from(self.read_u16()?);
                Ok(Value::String(from_utf8(self.read_slice(len)?)?.to_owned()))
            },
            Tag::Binary         => {
                let len = self.read_len()?;
                let bytes = self.read_slice(len)?;
                match self.config.binaries {
                    BinaryDecoding::Utf8 => match from_utf8(bytes) {
                        Ok(s)  => Ok(Value::String(s.to_owned())),
                        Err(_) => Ok(Value::Binary(bytes.to_vec())),
                    },
                    BinaryDecoding::Bytes => Ok(Value::Binary(bytes.to_vec())),
                }
            },
            Tag::BitBinary      => {
                let len = self.read_len()?;
                let bits = self.read_u8()?;
                let mut data = self.read_slice(len)?.to_vec();
                if let Some(last) = data.last_mut() {
                    if !(1..=8).contains(&bits) {
                        return Err(DecodeError::BitCount(bits));
                    }
                    *last >>= 8 - bits;
                }
                Ok(Value::BitBinary(BitBinary { bits, data }))
            },
            Tag::SmallBig       => {
                let digits = usize::from(self.read_u8()?);
                self.decode_bigint(digits)
            },
            Tag::LargeBig       => {
                let digits = self.read_len()?;
                self.decode_bigint(digits)
            },
            Tag::Port           => {
                let node = self.decode_atom()?;
                let id = u64::from(self.read_u32()?);
                let creation = u32::from(self.read_u8()?);
                Ok(Value::Port(Port { node, id, creation }))
            },
            Tag::NewPort        => {
                let node = self.decode_atom()?;
                let id = u64::from(self.read_u32()?);
                let creation = self.read_u32()?;
                Ok(Value::Port(Port { node, id, creation }))
            },
            Tag::V4Port         => {
                let node = self.decode_atom()?;
                let id = u64::from_be_bytes(self.read_array()?);
                let creation = self.read_u32()?;
                Ok(Value::Port(Port { node, id, creation }))
            },
            Tag::Pid            => {
                let node = self.decode_atom()?;
                let id = self.read_u32()?;
                let serial = self.read_u32()?;
                let creation = u32::from(self.read_u8()?);
                Ok(Value::Pid(Pid { node, id, serial, creation }))
            },
            Tag::NewPid         => {
                let node = self.decode_atom()?;
                let id = self.read_u32()?;
                let serial = self.read_u32()?;
                let creation = self.read_u32()?;
                Ok(Value::Pid(Pid { node, id, serial, creation }))
            },
            Tag::Reference      => {
                let node = self.decode_atom()?;
                let id = vec![self.read_u32()?];
                let creation = u32::from(self.read_u8()?);
                Ok(Value::Reference(Reference { node, creation, id }))
            },
            Tag::NewReference   => {
                let len = usize::from(self.read_u16()?);
                let node = self.decode_atom()?;
                let creation = u32::from(self.read_u8()?);
                let id = self.read_words(len)?;
                Ok(Value::Reference(Reference { node, creation, id }))
            },
            Tag::NewerReference => {
                let len = usize::from(self.read_u16()?);
                let node = self.decode_atom()?;
                let creation = self.read_u32()?;
                let id = self.read_words(len)?;
                Ok(Value::Reference(Reference { node, creation, id }))
            },
            Tag::Export         => {
                let module = self.decode_atom()?;
                let function = self.decode_atom()?;
                let arity = match self.read_u8()? {
                    t if t == Tag::SmallInteger as u8 => self.read_u8()?,
                    found => return Err(DecodeError::UnexpectedTag { expected: "SMALL_INTEGER_EXT", found }),
                };
                Ok(Value::Export(Export { module, function, arity }))
            },
            Tag::SmallTuple
                | Tag::LargeTuple
                | Tag::Map
                | Tag::List => Err(DecodeError::UnexpectedTag { expected: "a term without elements", found: tag as u8 }),
            Tag::Fun
                | Tag::NewFun
                | Tag::AtomCacheRef
                | Tag::Compressed => {
                tracing::debug!(tag = %tag, "unsupported term");
                Err(DecodeError::Unsupported(tag))
            },
        }
    }

    fn decode_elements(&mut self, len: usize) -> Result<Vec<Value>, DecodeError> {
        self.enter()?;
        let mut elements = Vec::new();
        // every element takes at least one byte
        elements.try_reserve(len.min(self.remaining()))?;
        for _ in 0..len {
            elements.push(self.decode_value()?);
        }
        self.leave();
        Ok(elements)
    }

    fn decode_map(&mut self, len: usize) -> Result<Value, DecodeError> {
        self.enter()?;
        let mut pairs: Vec<(Value, Value)> = Vec::new();
        pairs.try_reserve(len.min(self.remaining() / 2))?;
        // positions of the pairs in `pairs` by the hash of their key
        let mut index: HashMap<u64, Vec<usize>> = HashMap::new();
        let hasher = RandomState::new();
        for _ in 0..len {
            let key = self.decode_value()?;
            let val = self.decode_value()?;
            let bucket = index.entry(hasher.hash_one(&key)).or_default();
            match bucket.iter().copied().find(|&i| pairs[i].0 == key) {
                Some(_) if self.config.duplicate_keys == DuplicateKeys::Reject => {
                    return Err(DecodeError::DuplicateKey(key.to_string()));
                },
                Some(i) => { pairs[i].1 = val; },
                None => {
                    bucket.push(pairs.len());
                    pairs.push((key, val));
                },
            }
        }
        self.leave();
        Ok(Value::Map(pairs))
    }

    fn decode_bigint(&mut self, digits: usize) -> Result<Value, DecodeError> {
        let sign = match self.read_u8()? {
            0 => Sign::Plus,
            1 => Sign::Minus,
            s => return Err(DecodeError::Sign(s)),
        };
        if digits > self.config.max_bigint_digits {
            return Err(DecodeError::BigIntTooLarge(digits));
        }
        let bytes = self.read_slice(digits)?;
        Ok(Value::BigInt(BigInt::from_bytes_le(sign, bytes)))
    }

    /// Reads an atom which names a node, module or function. No aliasing takes place.
    fn decode_atom(&mut self) -> Result<Atom, DecodeError> {
        let found = self.read_u8()?;
        match Tag::try_from(found) {
            Ok(tag) if tag.is_atom() => Ok(Atom::new(self.read_atom_name(tag)?)?),
            Ok(Tag::AtomCacheRef) => Err(DecodeError::Unsupported(Tag::AtomCacheRef)),
            _ => Err(DecodeError::UnexpectedTag { expected: "atom", found }),
        }
    }

    fn read_atom_name(&mut self, tag: Tag) -> Result<String, DecodeError> {
        let len = match tag {
            Tag::SmallAtom | Tag::SmallAtomUtf8 => usize::from(self.read_u8()?),
            _ => usize::from(self.read_u16()?),
        };
        let bytes = self.read_slice(len)?;
        match tag {
            // Latin-1 maps every byte to the code point of the same value
            Tag::Atom | Tag::SmallAtom => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            _ => Ok(from_utf8(bytes)?.to_owned()),
        }
    }

    fn alias_atom(&self, name: String) -> Result<Value, DecodeError> {
        match name.as_str() {
            "nil" | "null" => Ok(Value::Nil),
            "true"         => Ok(Value::Boolean(true)),
            "false"        => Ok(Value::Boolean(false)),
            _ => match self.config.atoms {
                AtomDecoding::Atom   => Ok(Value::Atom(Atom::new(name)?)),
                AtomDecoding::String => Ok(Value::String(name)),
            },
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= self.config.max_depth {
            tracing::debug!(max_depth = self.config.max_depth, "message nested too deeply");
            return Err(DecodeError::Depth(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let b = self.read_u8()?;
        Tag::try_from(b).map_err(|b| {
            tracing::debug!(tag = b, "unknown term tag");
            DecodeError::UnknownTag(b)
        })
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            Err(DecodeError::Eof { needed: len, available: self.remaining() })
        } else {
            let buf = self.buf;
            self.pos += len;
            Ok(&buf[self.pos - len..self.pos])
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.read_slice(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(slice);
        Ok(array)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// A four byte length field.
    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_u32()?;
        len.try_into().map_err(|_| DecodeError::Allocation)
    }

    fn read_words(&mut self, len: usize) -> Result<Vec<u32>, DecodeError> {
        let mut words = Vec::new();
        words.try_reserve(len.min(self.remaining() / 4))?;
        for _ in 0..len {
            words.push(self.read_u32()?);
        }
        Ok(words)
    }

}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use crate::config::{AtomDecoding, BinaryDecoding, DecoderConfig, DuplicateKeys, DEFAULT_MAX_DEPTH};
    use crate::error::DecodeError;
    use crate::tag::Tag;
    use crate::value::{BitBinary, Export, Pid, Port, Reference, Value};
    use crate::atom::Atom;
    use num_bigint::BigInt;

    fn decode(buf: &[u8]) -> Result<Value, DecodeError> {
        Decoder::decode(buf).map_err(|e| e.into_inner())
    }

    fn node() -> Atom {
        Atom::new("n@h").unwrap()
    }

    #[test]
    fn version_and_compression() {
        assert_eq!(Err(DecodeError::Eof { needed: 1, available: 0 }), decode(&[]));
        assert_eq!(Err(DecodeError::Version(130)), decode(&[130, 97, 42]));
        assert_eq!(Err(DecodeError::Compressed), decode(&[131, 80, 0, 0, 0, 1, 120, 156]));
        assert_eq!(Err(DecodeError::Eof { needed: 1, available: 0 }), decode(&[131]));
    }

    #[test]
    fn integers() {
        assert_eq!(Ok(Value::Integer(42)), decode(&[131, 97, 42]));
        assert_eq!(Ok(Value::Integer(-64)), decode(&[131, 97, 0xc0]));
        assert_eq!(Ok(Value::Integer(128)), decode(&[131, 98, 0, 0, 0, 128]));
        assert_eq!(Ok(Value::Integer(-1)), decode(&[131, 98, 0xff, 0xff, 0xff, 0xff]));
    }

    #[test]
    fn floats() {
        let bytes = 4.2f64.to_be_bytes();
        let mut buf = vec![131, 70];
        buf.extend_from_slice(&bytes);
        assert_eq!(Ok(Value::Float(4.2)), decode(&buf));
        buf[1] = 99;
        assert_eq!(Ok(Value::Float(4.2)), decode(&buf));
    }

    #[test]
    fn atom_aliasing() {
        assert_eq!(Ok(Value::Nil), decode(&[131, 119, 3, b'n', b'i', b'l']));
        assert_eq!(Ok(Value::Nil), decode(&[131, 119, 4, b'n', b'u', b'l', b'l']));
        assert_eq!(Ok(Value::Boolean(true)), decode(&[131, 118, 0, 4, b't', b'r', b'u', b'e']));
        assert_eq!(Ok(Value::Boolean(false)), decode(&[131, 100, 0, 5, b'f', b'a', b'l', b's', b'e']));
        assert_eq!(Ok(Value::atom("ok").unwrap()), decode(&[131, 119, 2, b'o', b'k']));
        let config = DecoderConfig::default().atoms(AtomDecoding::String);
        assert_eq!(
            Value::from("ok"),
            Decoder::with_config(&[131, 119, 2, b'o', b'k'], config).decode_message().unwrap()
        );
    }

    #[test]
    fn latin1_atoms() {
        assert_eq!(Ok(Value::atom("ü").unwrap()), decode(&[131, 115, 1, 0xfc]));
    }

    #[test]
    fn oversized_atom() {
        let mut buf = vec![131, 118, 1, 0];
        buf.extend(std::iter::repeat(b'a').take(256));
        assert!(matches!(decode(&buf), Err(DecodeError::Atom(_))));
    }

    #[test]
    fn invalid_utf8() {
        assert!(matches!(decode(&[131, 119, 2, 0xc3, 0x28]), Err(DecodeError::Utf8(_))));
        assert!(matches!(decode(&[131, 107, 0, 2, 0xc3, 0x28]), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn bigints() {
        assert_eq!(Ok(Value::BigInt(BigInt::from(0))), decode(&[131, 110, 0, 0]));
        assert_eq!(Ok(Value::BigInt(BigInt::from(0x0201))), decode(&[131, 110, 2, 0, 1, 2]));
        assert_eq!(
            Ok(Value::BigInt(-BigInt::from(u64::MAX))),
            decode(&[131, 111, 0, 0, 0, 8, 1, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
        );
        assert_eq!(
            Err(DecodeError::BigIntTooLarge(9)),
            decode(&[131, 110, 9, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1])
        );
        assert_eq!(Err(DecodeError::Sign(2)), decode(&[131, 110, 1, 2, 1]));
        let config = DecoderConfig::default().max_bigint_digits(9);
        assert_eq!(
            Value::BigInt(BigInt::from(1u8) << 64),
            Decoder::with_config(&[131, 110, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1], config).decode_message().unwrap()
        );
    }

    #[test]
    fn lists() {
        assert_eq!(Ok(Value::List(vec![])), decode(&[131, 106]));
        assert_eq!(
            Ok(Value::List(vec![Value::Integer(1), Value::Integer(2)])),
            decode(&[131, 108, 0, 0, 0, 2, 97, 1, 97, 2, 106])
        );
        assert_eq!(Err(DecodeError::ListTail(97)), decode(&[131, 108, 0, 0, 0, 1, 97, 1, 97, 2]));
        assert_eq!(Err(DecodeError::Eof { needed: 1, available: 0 }), decode(&[131, 108, 0, 0, 0, 1, 97, 1]));
    }

    #[test]
    fn huge_counts_fail_without_allocating() {
        assert!(matches!(decode(&[131, 108, 0xff, 0xff, 0xff, 0xff, 106]), Err(DecodeError::UnknownTag(_)) | Err(DecodeError::Eof { .. })));
        assert!(matches!(decode(&[131, 116, 0xff, 0xff, 0xff, 0xff]), Err(DecodeError::Eof { .. })));
        assert!(matches!(decode(&[131, 109, 0xff, 0xff, 0xff, 0xff, 0]), Err(DecodeError::Eof { needed: 0xffff_ffff, available: 1 })));
    }

    #[test]
    fn tuples() {
        assert_eq!(Ok(Value::Tuple(vec![])), decode(&[131, 104, 0]));
        assert_eq!(
            Ok(Value::Tuple(vec![Value::atom("ok").unwrap(), Value::Integer(1)])),
            decode(&[131, 104, 2, 119, 2, b'o', b'k', 97, 1])
        );
        assert_eq!(Ok(Value::Tuple(vec![Value::Integer(7)])), decode(&[131, 105, 0, 0, 0, 1, 97, 7]));
    }

    #[test]
    fn maps() {
        let buf = [131, 116, 0, 0, 0, 3, 97, 1, 97, 10, 97, 2, 97, 20, 97, 1, 97, 30];
        assert_eq!(
            Ok(Value::Map(vec![
                (Value::Integer(1), Value::Integer(30)),
                (Value::Integer(2), Value::Integer(20)),
            ])),
            decode(&buf)
        );
        let config = DecoderConfig::default().duplicate_keys(DuplicateKeys::Reject);
        let err = Decoder::with_config(&buf, config).decode_message().unwrap_err();
        assert_eq!(DecodeError::DuplicateKey("1".to_owned()), err.into_inner());
    }

    #[test]
    fn strings_and_binaries() {
        assert_eq!(Ok(Value::from("hi")), decode(&[131, 107, 0, 2, b'h', b'i']));
        assert_eq!(Ok(Value::from("hi")), decode(&[131, 109, 0, 0, 0, 2, b'h', b'i']));
        assert_eq!(Ok(Value::Binary(vec![0xff, 0])), decode(&[131, 109, 0, 0, 0, 2, 0xff, 0]));
        let config = DecoderConfig::default().binaries(BinaryDecoding::Bytes);
        assert_eq!(
            Value::Binary(b"hi".to_vec()),
            Decoder::with_config(&[131, 109, 0, 0, 0, 2, b'h', b'i'], config).decode_message().unwrap()
        );
    }

    #[test]
    fn bit_binaries() {
        assert_eq!(
            Ok(Value::BitBinary(BitBinary { bits: 3, data: vec![0xff, 0b101] })),
            decode(&[131, 77, 0, 0, 0, 2, 3, 0xff, 0b1010_0000])
        );
        assert_eq!(
            Ok(Value::BitBinary(BitBinary { bits: 8, data: vec![0xab] })),
            decode(&[131, 77, 0, 0, 0, 1, 8, 0xab])
        );
        assert_eq!(Ok(Value::BitBinary(BitBinary { bits: 0, data: vec![] })), decode(&[131, 77, 0, 0, 0, 0, 0]));
        assert_eq!(Err(DecodeError::BitCount(0)), decode(&[131, 77, 0, 0, 0, 1, 0, 0xab]));
        assert_eq!(Err(DecodeError::BitCount(9)), decode(&[131, 77, 0, 0, 0, 1, 9, 0xab]));
    }

    #[test]
    fn pids_and_ports() {
        let node_bytes = [119, 3, b'n', b'@', b'h'];
        let mut buf = vec![131, 88];
        buf.extend_from_slice(&node_bytes);
        buf.extend_from_slice(&[0, 0, 0, 83, 0, 0, 0, 1, 0, 0, 0, 7]);
        assert_eq!(Ok(Value::Pid(Pid { node: node(), id: 83, serial: 1, creation: 7 })), decode(&buf));

        let mut buf = vec![131, 103];
        buf.extend_from_slice(&node_bytes);
        buf.extend_from_slice(&[0, 0, 0, 83, 0, 0, 0, 1, 2]);
        assert_eq!(Ok(Value::Pid(Pid { node: node(), id: 83, serial: 1, creation: 2 })), decode(&buf));

        let mut buf = vec![131, 102];
        buf.extend_from_slice(&node_bytes);
        buf.extend_from_slice(&[0, 0, 0, 5, 1]);
        assert_eq!(Ok(Value::Port(Port { node: node(), id: 5, creation: 1 })), decode(&buf));

        let mut buf = vec![131, 89];
        buf.extend_from_slice(&node_bytes);
        buf.extend_from_slice(&[0, 0, 0, 5, 0, 0, 0, 1]);
        assert_eq!(Ok(Value::Port(Port { node: node(), id: 5, creation: 1 })), decode(&buf));

        let mut buf = vec![131, 120];
        buf.extend_from_slice(&node_bytes);
        buf.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 5, 0, 0, 0, 1]);
        assert_eq!(Ok(Value::Port(Port { node: node(), id: (1 << 32) + 5, creation: 1 })), decode(&buf));
    }

    #[test]
    fn references() {
        let mut buf = vec![131, 90, 0, 2];
        buf.extend_from_slice(&[119, 3, b'n', b'@', b'h']);
        buf.extend_from_slice(&[0, 0, 0, 9, 0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(Ok(Value::Reference(Reference { node: node(), creation: 9, id: vec![1, 2] })), decode(&buf));

        let mut buf = vec![131, 114, 0, 1];
        buf.extend_from_slice(&[119, 3, b'n', b'@', b'h']);
        buf.extend_from_slice(&[3, 0, 0, 0, 1]);
        assert_eq!(Ok(Value::Reference(Reference { node: node(), creation: 3, id: vec![1] })), decode(&buf));

        let mut buf = vec![131, 101];
        buf.extend_from_slice(&[119, 3, b'n', b'@', b'h']);
        buf.extend_from_slice(&[0, 0, 0, 1, 3]);
        assert_eq!(Ok(Value::Reference(Reference { node: node(), creation: 3, id: vec![1] })), decode(&buf));
    }

    #[test]
    fn exports() {
        let buf = [131, 113, 119, 5, b'l', b'i', b's', b't', b's', 119, 3, b'm', b'a', b'p', 97, 2];
        assert_eq!(
            Ok(Value::Export(Export { module: Atom::new("lists").unwrap(), function: Atom::new("map").unwrap(), arity: 2 })),
            decode(&buf)
        );
        let buf = [131, 113, 119, 1, b'l', 119, 1, b'm', 98, 0, 0, 0, 2];
        assert_eq!(Err(DecodeError::UnexpectedTag { expected: "SMALL_INTEGER_EXT", found: 98 }), decode(&buf));
        let buf = [131, 113, 97, 1];
        assert_eq!(Err(DecodeError::UnexpectedTag { expected: "atom", found: 97 }), decode(&buf));
    }

    #[test]
    fn unsupported_and_unknown() {
        assert_eq!(Err(DecodeError::Unsupported(Tag::Fun)), decode(&[131, 117, 0, 0, 0, 0]));
        assert_eq!(Err(DecodeError::Unsupported(Tag::NewFun)), decode(&[131, 112, 0, 0, 0, 0]));
        assert_eq!(Err(DecodeError::Unsupported(Tag::AtomCacheRef)), decode(&[131, 82, 0]));
        assert_eq!(Err(DecodeError::Unsupported(Tag::AtomCacheRef)), decode(&[131, 88, 82, 0]));
        assert_eq!(Err(DecodeError::UnknownTag(0)), decode(&[131, 0]));
        assert_eq!(Err(DecodeError::UnknownTag(131)), decode(&[131, 108, 0, 0, 0, 1, 131]));
    }

    #[test]
    fn trailing_bytes() {
        assert_eq!(Err(DecodeError::Trailing(2)), decode(&[131, 97, 1, 97, 2]));
        let config = DecoderConfig::default().allow_trailing(true);
        assert_eq!(Value::Integer(1), Decoder::with_config(&[131, 97, 1, 97, 2], config).decode_message().unwrap());
    }

    #[test]
    fn error_position() {
        let buf: &[u8] = &[131, 108, 0, 0, 0, 1, 97, 1, 97, 2];
        let err = Decoder::decode(buf).unwrap_err();
        assert_eq!(9, err.position());
        assert_eq!("List does not end with the NIL_EXT terminator but with tag 97 at input position 9", err.to_string());
    }

    #[test]
    fn depth_limit() {
        let mut buf = vec![131];
        for _ in 0..5 {
            buf.extend_from_slice(&[108, 0, 0, 0, 1]);
        }
        buf.push(106);
        buf.extend(std::iter::repeat(106).take(5));
        assert!(Decoder::with_config(&buf, DecoderConfig::default().max_depth(5)).decode_message().is_ok());
        let err = Decoder::with_config(&buf, DecoderConfig::default().max_depth(4)).decode_message().unwrap_err();
        assert_eq!(DecodeError::Depth(4), err.into_inner());
    }

    #[test]
    fn duplicate_keys_across_encodings() {
        // 5 as SMALL_INTEGER_EXT and INTEGER_EXT, `ok` as ATOM_EXT and SMALL_ATOM_UTF8_EXT
        let buf = [
            131, 116, 0, 0, 0, 4,
            97, 5, 97, 1,
            100, 0, 2, b'o', b'k', 97, 2,
            98, 0, 0, 0, 5, 97, 3,
            119, 2, b'o', b'k', 97, 4,
        ];
        assert_eq!(
            Ok(Value::Map(vec![
                (Value::Integer(5), Value::Integer(3)),
                (Value::atom("ok").unwrap(), Value::Integer(4)),
            ])),
            decode(&buf)
        );
        let config = DecoderConfig::default().duplicate_keys(DuplicateKeys::Reject);
        let err = Decoder::with_config(&buf, config).decode_message().unwrap_err();
        assert_eq!(DecodeError::DuplicateKey("5".to_owned()), err.into_inner());
    }

    #[test]
    fn large_maps_decode_in_linear_time() {
        let n: u32 = 100_000;
        let mut buf = vec![131, 116];
        buf.extend_from_slice(&n.to_be_bytes());
        for i in 0..n {
            buf.push(98);
            buf.extend_from_slice(&i.to_be_bytes());
            buf.push(106);
        }
        let start = std::time::Instant::now();
        let value = decode(&buf).unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(10), "took {:?}", start.elapsed());
        match value {
            Value::Map(pairs) => assert_eq!(n as usize, pairs.len()),
            other => panic!("expected a map, got {}", other.typename()),
        }
    }

    fn nested_lists(depth: usize) -> Vec<u8> {
        let mut buf = vec![131];
        for _ in 0..depth {
            buf.extend_from_slice(&[108, 0, 0, 0, 1]);
        }
        buf.push(106);
        buf.extend(std::iter::repeat(106).take(depth));
        buf
    }

    #[test]
    fn default_depth_fits_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(|| {
                let deepest = Decoder::decode(&nested_lists(DEFAULT_MAX_DEPTH - 1)).map(|_| ()).map_err(|e| e.into_inner());
                let too_deep = Decoder::decode(&nested_lists(DEFAULT_MAX_DEPTH + 1)).map(|_| ()).map_err(|e| e.into_inner());
                (deepest, too_deep)
            })
            .unwrap();
        let (deepest, too_deep) = handle.join().unwrap();
        assert_eq!(Ok(()), deepest);
        assert_eq!(Err(DecodeError::Depth(DEFAULT_MAX_DEPTH)), too_deep);
    }

    #[test]
    fn bare_term() {
        let (value, consumed) = Decoder::with_config(&[97, 1, 0xff], DecoderConfig::default()).decode_term().unwrap();
        assert_eq!(Value::Integer(1), value);
        assert_eq!(2, consumed);
    }

}
