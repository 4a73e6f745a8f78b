//! Row decoding for typed queries.
//!
//! Raw engine rows are deserialized straight from [`Value`] into the caller's
//! row type. Object rows decode into structs or maps, tuple rows into tuples
//! or sequences. A row whose columns cannot produce the requested type is
//! reported as [`Error::Decode`]; columns the type does not name are ignored.
//! Column values are handed to the visitor as-is, so nothing is rewritten on
//! the way through.

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{Deserialize, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::engine::{ObjectRow, TupleRow};
use crate::error::{DecodeError, Error, Result};
use crate::value::Value;

pub fn decode_object<T: DeserializeOwned>(sql: &str, row: ObjectRow) -> Result<T> {
    let de: MapDeserializer<'_, _, DecodeError> = MapDeserializer::new(row.into_iter());
    T::deserialize(de).map_err(|source| decode_error(sql, source))
}

pub fn decode_tuple<T: DeserializeOwned>(sql: &str, row: TupleRow) -> Result<T> {
    let de: SeqDeserializer<_, DecodeError> = SeqDeserializer::new(row.into_iter());
    T::deserialize(de).map_err(|source| decode_error(sql, source))
}

pub fn decode_objects<T: DeserializeOwned>(sql: &str, rows: Vec<ObjectRow>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode_object(sql, row)).collect()
}

pub fn decode_tuples<T: DeserializeOwned>(sql: &str, rows: Vec<TupleRow>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode_tuple(sql, row)).collect()
}

fn decode_error(sql: &str, source: DecodeError) -> Error {
    Error::Decode {
        sql: sql.to_string(),
        source,
    }
}

/// Deserializer over a single column value.
pub struct ValueDeserializer(Value);

impl<'de> IntoDeserializer<'de, DecodeError> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer(self)
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, DecodeError> {
        match self.0 {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Real(f) => visitor.visit_f64(f),
            Value::Text(s) => visitor.visit_string(s),
            Value::Blob(b) => visitor.visit_byte_buf(b),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, DecodeError> {
        if self.0.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    // SQLite has no boolean storage class; 0 and 1 read back as integers.
    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, DecodeError> {
        match self.0 {
            Value::Integer(0) => visitor.visit_bool(false),
            Value::Integer(1) => visitor.visit_bool(true),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, DecodeError> {
        match self.0 {
            Value::Blob(bytes) => {
                let de: SeqDeserializer<_, DecodeError> = SeqDeserializer::new(bytes.into_iter());
                de.deserialize_any(visitor)
            }
            other => ValueDeserializer(other).deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, DecodeError> {
        match self.0 {
            Value::Text(s) => {
                let de: StringDeserializer<DecodeError> = s.into_deserializer();
                visitor.visit_enum(de)
            }
            other => ValueDeserializer(other).deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::object_row;
    use crate::identity::Principal;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
        email: Option<String>,
    }

    #[test]
    fn test_decode_object_into_struct() {
        let row = object_row(&[
            ("id", Value::Integer(1)),
            ("name", Value::Text("a".into())),
            ("email", Value::Null),
            ("age", Value::Integer(30)),
        ]);
        let user: User = decode_object("SELECT * FROM users", row).unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "a".into(),
                email: None,
            }
        );
    }

    #[test]
    fn test_decode_object_shape_mismatch() {
        let row = object_row(&[("id", Value::Text("not a number".into()))]);
        let err = decode_object::<User>("SELECT id FROM users", row).unwrap_err();
        match err {
            Error::Decode { sql, .. } => assert_eq!(sql, "SELECT id FROM users"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_tuple_is_positional() {
        let row = vec![Value::Integer(7), Value::Text("b".into()), Value::Blob(vec![1, 2])];
        let (id, name, data): (i64, String, Vec<u8>) = decode_tuple("q", row).unwrap();
        assert_eq!(id, 7);
        assert_eq!(name, "b");
        assert_eq!(data, vec![1, 2]);
    }

    #[test]
    fn test_decode_tuple_wrong_arity() {
        let row = vec![Value::Integer(7)];
        assert!(decode_tuple::<(i64, String)>("q", row).is_err());
    }

    #[test]
    fn test_decode_into_untyped_rows() {
        let rows = vec![object_row(&[("n", Value::Real(0.5))])];
        let decoded: Vec<HashMap<String, Value>> = decode_objects("q", rows).unwrap();
        assert_eq!(decoded[0]["n"], Value::Real(0.5));

        let tuples: Vec<Vec<Value>> = decode_tuples("q", vec![vec![Value::Null]]).unwrap();
        assert_eq!(tuples, vec![vec![Value::Null]]);
    }

    #[test]
    fn test_non_finite_reals_survive_decoding() {
        let rows = vec![object_row(&[("x", Value::Real(f64::INFINITY))])];
        let raw: Vec<HashMap<String, Value>> = decode_objects("SELECT 1e999 AS x", rows).unwrap();
        assert_eq!(raw[0]["x"], Value::Real(f64::INFINITY));

        let (y,): (f64,) = decode_tuple("SELECT -1e999", vec![Value::Real(f64::NEG_INFINITY)]).unwrap();
        assert_eq!(y, f64::NEG_INFINITY);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Owner {
        owner: Principal,
        avatar: Option<Vec<u8>>,
        active: bool,
    }

    #[test]
    fn test_decode_blob_and_integer_boolean() {
        let row = object_row(&[
            ("owner", Value::Blob(vec![0xca, 0x11])),
            ("avatar", Value::Blob(b"png".to_vec())),
            ("active", Value::Integer(1)),
        ]);
        let owner: Owner = decode_object("q", row).unwrap();
        assert_eq!(
            owner,
            Owner {
                owner: Principal::from_bytes(vec![0xca, 0x11]),
                avatar: Some(b"png".to_vec()),
                active: true,
            }
        );

        let raw: HashMap<String, Value> =
            decode_object("q", object_row(&[("b", Value::Blob(b"text".to_vec()))])).unwrap();
        assert_eq!(raw["b"], Value::Blob(b"text".to_vec()));
    }

    #[test]
    fn test_integer_outside_boolean_range_is_rejected() {
        let row = object_row(&[
            ("owner", Value::Blob(vec![])),
            ("avatar", Value::Null),
            ("active", Value::Integer(2)),
        ]);
        assert!(matches!(decode_object::<Owner>("q", row), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_tuple_with_extra_columns_fails() {
        let row = vec![Value::Integer(1), Value::Integer(2)];
        assert!(decode_tuple::<(i64,)>("q", row).is_err());
    }
}
