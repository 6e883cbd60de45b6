//! Conveniently serialize and deserialize your Rust data structures into the Erlang External Term
//! Format.
//!
//! Serialization goes through `etf::Value`: structs become maps with atom keys, unit variants become
//! atoms and all other enum variants become tagged tuples `{Variant, Payload}`, which is how Erlang
//! code usually models them.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat {
//!     name: String,
//!     species: Species,
//! }
//!
//! // The canonical Erlang representation of this value, as `etfq` would print it:
//! // ```
//! // #{
//! //   name => "Jessica",
//! //   species => 'LynxLynx',
//! // }
//! // ```
//! let cat = Cat { name: "Jessica".to_owned(), species: Species::LynxLynx };
//!
//! let bytes = etf_serde::to_bytes(&cat).unwrap();
//! assert_eq!(bytes, [
//!   0x83,                                                 // version
//!   0x74, 0x00, 0x00, 0x00, 0x02,                         // MAP_EXT with 2 pairs
//!     0x77, 0x04,                                         // SMALL_ATOM_UTF8_EXT of length 4
//!       0x6e, 0x61, 0x6d, 0x65,                           // 'name'
//!     0x6d, 0x00, 0x00, 0x00, 0x07,                       // BINARY_EXT of length 7
//!       0x4a, 0x65, 0x73, 0x73, 0x69, 0x63, 0x61,         // 'Jessica'
//!     0x77, 0x07,                                         // SMALL_ATOM_UTF8_EXT of length 7
//!       0x73, 0x70, 0x65, 0x63, 0x69, 0x65, 0x73,         // 'species'
//!     0x77, 0x08,                                         // SMALL_ATOM_UTF8_EXT of length 8
//!       0x4c, 0x79, 0x6e, 0x78, 0x4c, 0x79, 0x6e, 0x78,   // 'LynxLynx'
//! ]);
//!
//! let deserialized: Cat = etf_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(cat, deserialized);
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_bytes_with, from_value, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_bytes, to_value, to_writer, Serializer};

#[cfg(test)]
mod tests {
    use serde::{Serialize, Deserialize};
    use std::collections::HashMap;
    use super::{to_bytes, to_writer, from_bytes};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Enum {
        UnitVariant,
        NewtypeVariant(bool),
        TupleVariant(f32, f32),
        StructVariant{ a: usize, b: usize, c: usize },
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Struct {
        field: u8,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct UnitStruct;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct NewtypeStruct(String);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TupleStruct(char, char, char);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Test {
        bool: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        f32: f32,
        f64: f64,
        char: char,
        str: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        #[serde(with = "serde_bytes")]
        text_bytes: Vec<u8>,
        none: Option<u8>,
        some: Option<u8>,
        unit: (),
        unit_struct: UnitStruct,
        newtype_struct: NewtypeStruct,
        tuple_struct: TupleStruct,
        seq: Vec<String>,
        empty: Vec<u8>,
        tuple: (u16, u16, u16),
        map: HashMap<usize, String>,
        r#struct: Struct,
        unit_variant: Enum,
        newtype_variant: Enum,
        tuple_variant: Enum,
        struct_variant: Enum,
    }

    fn message() -> Test {
        Test {
            bool: true,
            i8: -1,
            i16: -20,
            i32: -7000,
            i64: i64::MIN,
            u8: 1,
            u16: 20,
            u32: 7000,
            u64: u64::MAX,
            f32: 1337.8472,
            f64: 1337.8472,
            char: 'x',
            str: "Test".to_string(),
            bytes: vec![0x83, 0x74, 0x00, 0x00, 0x00, 0x02, 0xff],
            text_bytes: b"valid utf-8".to_vec(),
            none: None,
            some: Some(0),
            unit: (),
            unit_struct: UnitStruct,
            newtype_struct: NewtypeStruct("Qapla'".to_string()),
            tuple_struct: TupleStruct('a', 'ö', '🦀'),
            seq: vec![
                "Elen".to_string(),
                "síla".to_string(),
                "lúmenn'".to_string(),
                "omentielvo".to_string(),
            ],
            empty: vec![],
            tuple: (0, 0, 0),
            map: [
                (1701, "Enterprise".to_string()),
                (74656, "Voyager".to_string())
            ].into_iter().collect(),
            r#struct: Struct {
                field: 42,
            },
            unit_variant: Enum::UnitVariant,
            newtype_variant: Enum::NewtypeVariant(false),
            tuple_variant: Enum::TupleVariant(1.0, 0.999),
            struct_variant: Enum::StructVariant {
                a: 255,
                b: 0,
                c: 33,
            }
        }
    }

    #[test]
    fn roundtrip() {
        let message = message();
        assert_eq!(message, from_bytes::<Test>(&to_bytes(&message).unwrap()).unwrap());
    }

    #[test]
    fn writer() {
        let message = message();
        let mut buf = Vec::new();
        let written = to_writer(&mut buf, &message).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(to_bytes(&message).unwrap(), buf);
    }

    #[test]
    fn non_finite_floats_fail() {
        assert!(matches!(to_bytes(&f64::NAN), Err(super::Error::Encode(_))));
    }
}
