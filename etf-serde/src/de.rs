use serde::de::{self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::StringDeserializer;
use serde::forward_to_deserialize_any;
use etf::{DecoderConfig, Value};
use num_traits::ToPrimitive;
use std::vec;

use crate::error::{Error, Result};

/// Drives a `Deserialize` implementation from an owned `etf::Value`.
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

/// Decode a complete ETF message and deserialize it into `T`.
pub fn from_bytes<T: DeserializeOwned>(s: &[u8]) -> Result<T> {
    from_value(etf::unpack(s)?)
}

pub fn from_bytes_with<T: DeserializeOwned>(s: &[u8], config: &DecoderConfig) -> Result<T> {
    from_value(etf::unpack_with(s, config)?)
}

impl Deserializer {
    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedValue(expected, self.value.typename())
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil         => visitor.visit_unit(),
            Value::Boolean(v)  => visitor.visit_bool(v),
            Value::Integer(v)  => visitor.visit_i64(v),
            Value::Float(v)    => visitor.visit_f64(v),
            Value::BigInt(v)   => {
                if let Some(i) = v.to_i64() {
                    visitor.visit_i64(i)
                } else if let Some(u) = v.to_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = v.to_i128() {
                    visitor.visit_i128(i)
                } else if let Some(u) = v.to_u128() {
                    visitor.visit_u128(u)
                } else {
                    Err(Error::Int)
                }
            },
            Value::Atom(v)     => visitor.visit_string(v.into_string()),
            Value::String(v)   => visitor.visit_string(v),
            Value::Binary(v)   => visitor.visit_byte_buf(v),
            Value::List(v)
                | Value::Tuple(v) => visitor.visit_seq(SeqDeserializer::new(v)),
            Value::Map(v)      => visitor.visit_map(MapDeserializer::new(v)),
            ref o => Err(Error::UnexpectedValue("a serializable value", o.typename())),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(Error::Char(s)),
                }
            },
            _ => Err(self.unexpected("a single character")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Atom(a)   => visitor.visit_string(a.into_string()),
            Value::Binary(b) => match String::from_utf8(b) {
                Ok(s) => visitor.visit_string(s),
                Err(e) => visitor.visit_byte_buf(e.into_bytes()),
            },
            _ => Err(self.unexpected("a string")),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    /// Binaries which happen to be valid Utf-8 are decoded as strings, so both are accepted here.
    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Binary(b) => visitor.visit_byte_buf(b),
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            Value::List(v)   => visitor.visit_seq(SeqDeserializer::new(v)),
            _ => Err(self.unexpected("a binary")),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil => visitor.visit_unit(),
            _ => Err(self.unexpected("nil")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::List(v) | Value::Tuple(v) => visitor.visit_seq(SeqDeserializer::new(v)),
            _ => Err(self.unexpected("a list or tuple")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Map(v) => visitor.visit_map(MapDeserializer::new(v)),
            _ => Err(self.unexpected("a map")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    /// Accepts a bare atom for unit variants and a tagged tuple `{Variant, Payload}` for all others.
    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Atom(a) => visitor.visit_enum(EnumDeserializer::new(a.into_string(), None)),
            Value::String(s) => visitor.visit_enum(EnumDeserializer::new(s, None)),
            Value::Tuple(mut v) if v.len() == 2 => {
                let payload = v.pop();
                let variant = match v.pop() {
                    Some(Value::Atom(a)) => a.into_string(),
                    Some(Value::String(s)) => s,
                    Some(o) => return Err(Error::UnexpectedValue("an atom naming a variant", o.typename())),
                    None => return Err(Error::UnexpectedValue("an atom naming a variant", "nothing")),
                };
                visitor.visit_enum(EnumDeserializer::new(variant, payload))
            },
            _ => Err(self.unexpected("an atom or a tagged tuple")),
        }
    }

    /// Atoms which alias to `nil` or booleans are turned back into their names.
    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil        => visitor.visit_str("nil"),
            Value::Boolean(b) => visitor.visit_str(if b { "true" } else { "false" }),
            _ => self.deserialize_string(visitor),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64
    }
}

struct SeqDeserializer {
    iter: vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(values: Vec<Value>) -> Self {
        Self { iter: values.into_iter() }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(pairs: Vec<(Value, Value)>) -> Self {
        Self { iter: pairs.into_iter(), value: None }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::Message("Map value requested before its key".to_owned())),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    payload: Option<Value>,
}

impl EnumDeserializer {
    fn new(variant: String, payload: Option<Value>) -> Self {
        Self { variant, payload }
    }
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let deserializer: StringDeserializer<Error> = self.variant.into_deserializer();
        let variant = seed.deserialize(deserializer)?;
        Ok((variant, VariantDeserializer { payload: self.payload }))
    }
}

struct VariantDeserializer {
    payload: Option<Value>,
}

impl VariantDeserializer {
    fn payload(self) -> Result<Deserializer> {
        self.payload
            .map(Deserializer::new)
            .ok_or(Error::UnexpectedValue("a tagged tuple", "atom"))
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.payload {
            None | Some(Value::Nil) => Ok(()),
            Some(o) => Err(Error::UnexpectedValue("nil", o.typename())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.payload()?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.payload()?, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_map(self.payload()?, visitor)
    }

}
