//! Every ETF term starts with a tag byte which selects its kind and the layout of the payload that
//! follows. Multi-byte integers in a payload are in network byte order, the digits of big integers
//! are stored least significant first.

use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

/// The first byte of every ETF message.
pub const VERSION: u8 = 131;

/// Tag bytes as defined by the external term format. Some of them are only recognized so that they
/// can be rejected with a precise error.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Tag {
    /// zlib compressed payload, directly after the version byte
    Compressed = 80,
    /// Index into the atom cache of a distribution header
    AtomCacheRef = 82,
    /// Bitstring whose length in bits is not a multiple of eight
    BitBinary = 77,
    NewPid = 88,
    NewPort = 89,
    NewerReference = 90,
    /// IEEE-754 double in eight bytes
    NewFloat = 70,
    SmallInteger = 97,
    Integer = 98,
    /// Legacy float. Read as an eight byte IEEE-754 double.
    Float = 99,
    /// Latin-1 atom with a two byte length
    Atom = 100,
    Reference = 101,
    Port = 102,
    Pid = 103,
    SmallTuple = 104,
    LargeTuple = 105,
    /// The empty list which also terminates every proper list
    Nil = 106,
    /// A list of bytes, two byte length
    String = 107,
    List = 108,
    Binary = 109,
    SmallBig = 110,
    LargeBig = 111,
    NewFun = 112,
    Export = 113,
    NewReference = 114,
    /// Latin-1 atom with a one byte length
    SmallAtom = 115,
    Map = 116,
    Fun = 117,
    AtomUtf8 = 118,
    SmallAtomUtf8 = 119,
    V4Port = 120,
}

impl Tag {

    /// Returns the mnemonic of the tag as used in the ETF documentation. This is useful for error
    /// messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Tag::Compressed     => "COMPRESSED",
            Tag::AtomCacheRef   => "ATOM_CACHE_REF",
            Tag::BitBinary      => "BIT_BINARY_EXT",
            Tag::NewPid         => "NEW_PID_EXT",
            Tag::NewPort        => "NEW_PORT_EXT",
            Tag::NewerReference => "NEWER_REFERENCE_EXT",
            Tag::NewFloat       => "NEW_FLOAT_EXT",
            Tag::SmallInteger   => "SMALL_INTEGER_EXT",
            Tag::Integer        => "INTEGER_EXT",
            Tag::Float          => "FLOAT_EXT",
            Tag::Atom           => "ATOM_EXT",
            Tag::Reference      => "REFERENCE_EXT",
            Tag::Port           => "PORT_EXT",
            Tag::Pid            => "PID_EXT",
            Tag::SmallTuple     => "SMALL_TUPLE_EXT",
            Tag::LargeTuple     => "LARGE_TUPLE_EXT",
            Tag::Nil            => "NIL_EXT",
            Tag::String         => "STRING_EXT",
            Tag::List           => "LIST_EXT",
            Tag::Binary         => "BINARY_EXT",
            Tag::SmallBig       => "SMALL_BIG_EXT",
            Tag::LargeBig       => "LARGE_BIG_EXT",
            Tag::NewFun         => "NEW_FUN_EXT",
            Tag::Export         => "EXPORT_EXT",
            Tag::NewReference   => "NEW_REFERENCE_EXT",
            Tag::SmallAtom      => "SMALL_ATOM_EXT",
            Tag::Map            => "MAP_EXT",
            Tag::Fun            => "FUN_EXT",
            Tag::AtomUtf8       => "ATOM_UTF8_EXT",
            Tag::SmallAtomUtf8  => "SMALL_ATOM_UTF8_EXT",
            Tag::V4Port         => "V4_PORT_EXT",
        }
    }

    /// Whether the tag introduces an atom, in any of its four encodings.
    pub fn is_atom(&self) -> bool {
        matches!(*self, Tag::Atom | Tag::SmallAtom | Tag::AtomUtf8 | Tag::SmallAtomUtf8)
    }

}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u8)
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            80  => Ok(Tag::Compressed),
            82  => Ok(Tag::AtomCacheRef),
            77  => Ok(Tag::BitBinary),
            88  => Ok(Tag::NewPid),
            89  => Ok(Tag::NewPort),
            90  => Ok(Tag::NewerReference),
            70  => Ok(Tag::NewFloat),
            97  => Ok(Tag::SmallInteger),
            98  => Ok(Tag::Integer),
            99  => Ok(Tag::Float),
            100 => Ok(Tag::Atom),
            101 => Ok(Tag::Reference),
            102 => Ok(Tag::Port),
            103 => Ok(Tag::Pid),
            104 => Ok(Tag::SmallTuple),
            105 => Ok(Tag::LargeTuple),
            106 => Ok(Tag::Nil),
            107 => Ok(Tag::String),
            108 => Ok(Tag::List),
            109 => Ok(Tag::Binary),
            110 => Ok(Tag::SmallBig),
            111 => Ok(Tag::LargeBig),
            112 => Ok(Tag::NewFun),
            113 => Ok(Tag::Export),
            114 => Ok(Tag::NewReference),
            115 => Ok(Tag::SmallAtom),
            116 => Ok(Tag::Map),
            117 => Ok(Tag::Fun),
            118 => Ok(Tag::AtomUtf8),
            119 => Ok(Tag::SmallAtomUtf8),
            120 => Ok(Tag::V4Port),
            x   => Err(x),
        }
    }
}
