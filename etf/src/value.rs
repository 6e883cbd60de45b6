//! The host side of the codec. Encoding takes a `Value` tree, decoding produces one. Runtime terms
//! which only make sense inside a running Erlang system (process identifiers, ports, references,
//! external funs and bitstrings) are decoded into plain records but can not be encoded.

use crate::atom::Atom;
use crate::error::AtomError;
use num_bigint::BigInt;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// The possible values according to the ETF data model as seen from Rust.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Encoded as the atom `nil`. The atoms `nil` and `null` decode to this.
    Nil,
    /// Encoded as the atoms `true` and `false`.
    Boolean(bool),
    Integer(i64),
    Float(f64),
    BigInt(BigInt),
    Atom(Atom),
    /// Encoded as `BINARY_EXT`. With the default `BinaryDecoding::Utf8`, every `BINARY_EXT` whose
    /// payload is valid Utf-8 decodes to this variant.
    String(String),
    /// Encoded as `BINARY_EXT`. Decodes back to `Value::String` if the bytes happen to be valid
    /// Utf-8, unless the decoder is configured with `BinaryDecoding::Bytes`.
    Binary(Vec<u8>),
    /// A proper list. The empty list is `NIL_EXT` on wire.
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Key-value pairs in wire order.
    Map(Vec<(Value, Value)>),
    BitBinary(BitBinary),
    Port(Port),
    Pid(Pid),
    Reference(Reference),
    Export(Export),
}

/// A bitstring. Only the `bits` most significant bits of the last byte belong to it; after decoding
/// they have been shifted down into the least significant positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitBinary {
    pub bits: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port {
    pub node: Atom,
    pub id: u64,
    pub creation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pid {
    pub node: Atom,
    pub id: u32,
    pub serial: u32,
    pub creation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub node: Atom,
    pub creation: u32,
    /// Uninterpreted id words
    pub id: Vec<u32>,
}

/// An external fun, `fun Module:Function/Arity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Export {
    pub module: Atom,
    pub function: Atom,
    pub arity: u8,
}

impl Value {

    /// Shorthand for a validated `Value::Atom`.
    pub fn atom<S: Into<String>>(name: S) -> Result<Self, AtomError> {
        Atom::new(name).map(Value::Atom)
    }

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Nil          => "nil",
            Self::Boolean(_)   => "boolean",
            Self::Integer(_)   => "integer",
            Self::Float(_)     => "float",
            Self::BigInt(_)    => "big integer",
            Self::Atom(_)      => "atom",
            Self::String(_)    => "string",
            Self::Binary(_)    => "binary",
            Self::List(_)      => "list",
            Self::Tuple(_)     => "tuple",
            Self::Map(_)       => "map",
            Self::BitBinary(_) => "bitstring",
            Self::Port(_)      => "port",
            Self::Pid(_)       => "pid",
            Self::Reference(_) => "reference",
            Self::Export(_)    => "export",
        }
    }

    /// Looks up the value of the first pair whose key equals `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn quote(s: &str, q: char) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push(q);
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                c if c == q => { out.push('\\'); out.push(c); },
                c => out.push(c),
            }
        }
        out.push(q);
        out
    }

    /// Atoms which start with a lowercase letter and consist of alphanumerics, `_` and `@` can be
    /// written without quotes.
    fn atom_literal(name: &str) -> String {
        let mut chars = name.chars();
        let bare = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@');
        if bare {
            name.to_owned()
        } else {
            Self::quote(name, '\'')
        }
    }

    fn block<I: Iterator<Item = String>>(open: &str, close: &str, items: I) -> String {
        let body = items
            .flat_map(|item| format!("{},", item).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
            .collect::<Vec<String>>();
        if body.is_empty() {
            format!("{}{}", open, close)
        } else {
            format!("{}\n{}\n{}", open, body.join("\n"), close)
        }
    }

}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil          => f.write_str("nil"),
            Value::Boolean(v)   => write!(f, "{}", v),
            Value::Integer(v)   => write!(f, "{}", v),
            Value::Float(v)     => write!(f, "{:?}", v),
            Value::BigInt(v)    => write!(f, "{}", v),
            Value::Atom(v)      => f.write_str(&Self::atom_literal(v.as_str())),
            Value::String(v)    => f.write_str(&Self::quote(v, '"')),
            Value::Binary(v)    => write!(f, "<<{}>>", v.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(",")),
            Value::BitBinary(v) => {
                let mut parts = v.data.iter().map(|b| b.to_string()).collect::<Vec<_>>();
                if let Some(last) = parts.last_mut() {
                    if v.bits < 8 {
                        last.push_str(&format!(":{}", v.bits));
                    }
                }
                write!(f, "<<{}>>", parts.join(","))
            },
            Value::List(v)      => f.write_str(&Self::block("[", "]", v.iter().map(|e| e.to_string()))),
            Value::Tuple(v)     => f.write_str(&Self::block("{", "}", v.iter().map(|e| e.to_string()))),
            Value::Map(v)       => f.write_str(&Self::block("#{", "}", v.iter().map(|(k, e)| format!("{} => {}", k, e)))),
            Value::Port(v)      => write!(f, "#Port<{}.{}>", Self::atom_literal(v.node.as_str()), v.id),
            Value::Pid(v)       => write!(f, "<{}.{}.{}>", Self::atom_literal(v.node.as_str()), v.id, v.serial),
            Value::Reference(v) => write!(f, "#Ref<{}.{}>", Self::atom_literal(v.node.as_str()),
                v.id.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(".")),
            Value::Export(v)    => write!(f, "fun {}:{}/{}", Self::atom_literal(v.module.as_str()),
                Self::atom_literal(v.function.as_str()), v.arity),
        }
    }
}

/// Consistent with `PartialEq`: `0.0` and `-0.0` hash alike.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil          => {},
            Value::Boolean(v)   => v.hash(state),
            Value::Integer(v)   => v.hash(state),
            Value::Float(v)     => (if *v == 0.0 { 0u64 } else { v.to_bits() }).hash(state),
            Value::BigInt(v)    => v.hash(state),
            Value::Atom(v)      => v.hash(state),
            Value::String(v)    => v.hash(state),
            Value::Binary(v)    => v.hash(state),
            Value::List(v)
                | Value::Tuple(v) => v.hash(state),
            Value::Map(v)       => v.hash(state),
            Value::BitBinary(v) => v.hash(state),
            Value::Port(v)      => v.hash(state),
            Value::Pid(v)       => v.hash(state),
            Value::Reference(v) => v.hash(state),
            Value::Export(v)    => v.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(BigInt::from(v)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Value::BigInt(v)
    }
}

impl From<Atom> for Value {
    fn from(v: Atom) -> Self {
        Value::Atom(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}
