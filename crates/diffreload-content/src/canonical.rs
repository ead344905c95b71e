#![forbid(unsafe_code)]

//! Type-tagged canonical encoding of any `serde::Serialize` value.
//!
//! Every value starts with a one-byte tag naming its serde data model kind,
//! followed by a fixed-width or length-prefixed payload. Compound values end
//! with [`END`]. The encoding is a prefix code: no encoded value is a prefix
//! of a different one, so concatenated fields never run into each other.
//!
//! # Invariants
//!
//! - `None` and `Some(x)` carry different tags, at every nesting depth.
//! - Floats are written as their IEEE-754 bits. Every NaN payload and both
//!   infinities stay distinct from each other and from `None`. `0.0` and
//!   `-0.0` differ too, which can only cause an extra reload.
//! - Integer width and signedness are part of the tag.
//! - Lengths and variant indices are little-endian `u64` / `u32`.

use std::fmt::Display;

use serde::Serialize;
use serde::ser;
use thiserror::Error;

const BOOL: u8 = 0x01;
const I8: u8 = 0x02;
const I16: u8 = 0x03;
const I32: u8 = 0x04;
const I64: u8 = 0x05;
const I128: u8 = 0x06;
const U8: u8 = 0x07;
const U16: u8 = 0x08;
const U32: u8 = 0x09;
const U64: u8 = 0x0A;
const U128: u8 = 0x0B;
const F32: u8 = 0x10;
const F64: u8 = 0x11;
const CHAR: u8 = 0x12;
const STR: u8 = 0x13;
const BYTES: u8 = 0x14;
const NONE: u8 = 0x15;
const SOME: u8 = 0x16;
const UNIT: u8 = 0x17;
const UNIT_STRUCT: u8 = 0x18;
const UNIT_VARIANT: u8 = 0x19;
const NEWTYPE_STRUCT: u8 = 0x1A;
const NEWTYPE_VARIANT: u8 = 0x1B;
const SEQ: u8 = 0x1C;
const TUPLE: u8 = 0x1D;
/// Closes every compound value.
pub(crate) const END: u8 = 0x1E;
const TUPLE_STRUCT: u8 = 0x1F;
const TUPLE_VARIANT: u8 = 0x20;
const MAP: u8 = 0x21;
const STRUCT: u8 = 0x22;
const STRUCT_VARIANT: u8 = 0x23;
const FIELD: u8 = 0x24;

/// A `Serialize` impl reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EncodeError(String);

impl ser::Error for EncodeError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Append the canonical encoding of `value` to `out`.
///
/// On error `out` may hold a partial encoding.
pub(crate) fn encode_into<V: Serialize + ?Sized>(
    out: &mut Vec<u8>,
    value: &V,
) -> Result<(), EncodeError> {
    value.serialize(&mut Encoder { out })
}

struct Encoder<'o> {
    out: &'o mut Vec<u8>,
}

impl Encoder<'_> {
    fn tag(&mut self, tag: u8) {
        self.out.push(tag);
    }

    fn len(&mut self, len: usize) {
        self.out.extend_from_slice(&(len as u64).to_le_bytes());
    }

    fn raw_str(&mut self, s: &str) {
        self.len(s.len());
        self.out.extend_from_slice(s.as_bytes());
    }

    fn variant(&mut self, tag: u8, index: u32, name: &str) {
        self.tag(tag);
        self.out.extend_from_slice(&index.to_le_bytes());
        self.raw_str(name);
    }
}

impl ser::Serializer for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<(), EncodeError> {
        self.tag(BOOL);
        self.out.push(u8::from(v));
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), EncodeError> {
        self.tag(I8);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<(), EncodeError> {
        self.tag(I16);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<(), EncodeError> {
        self.tag(I32);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<(), EncodeError> {
        self.tag(I64);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), EncodeError> {
        self.tag(I128);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), EncodeError> {
        self.tag(U8);
        self.out.push(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), EncodeError> {
        self.tag(U16);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<(), EncodeError> {
        self.tag(U32);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<(), EncodeError> {
        self.tag(U64);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), EncodeError> {
        self.tag(U128);
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), EncodeError> {
        self.tag(F32);
        self.out.extend_from_slice(&v.to_bits().to_le_bytes());
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<(), EncodeError> {
        self.tag(F64);
        self.out.extend_from_slice(&v.to_bits().to_le_bytes());
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), EncodeError> {
        self.tag(CHAR);
        self.out.extend_from_slice(&u32::from(v).to_le_bytes());
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), EncodeError> {
        self.tag(STR);
        self.raw_str(v);
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), EncodeError> {
        self.tag(BYTES);
        self.len(v.len());
        self.out.extend_from_slice(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), EncodeError> {
        self.tag(NONE);
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), EncodeError> {
        self.tag(SOME);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), EncodeError> {
        self.tag(UNIT);
        Ok(())
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), EncodeError> {
        self.tag(UNIT_STRUCT);
        self.raw_str(name);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<(), EncodeError> {
        self.variant(UNIT_VARIANT, variant_index, variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.tag(NEWTYPE_STRUCT);
        self.raw_str(name);
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.variant(NEWTYPE_VARIANT, variant_index, variant);
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, EncodeError> {
        self.tag(SEQ);
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, EncodeError> {
        self.tag(TUPLE);
        Ok(self)
    }

    fn serialize_tuple_struct(self, name: &'static str, _len: usize) -> Result<Self, EncodeError> {
        self.tag(TUPLE_STRUCT);
        self.raw_str(name);
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self, EncodeError> {
        self.variant(TUPLE_VARIANT, variant_index, variant);
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, EncodeError> {
        self.tag(MAP);
        Ok(self)
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self, EncodeError> {
        self.tag(STRUCT);
        self.raw_str(name);
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self, EncodeError> {
        self.variant(STRUCT_VARIANT, variant_index, variant);
        Ok(self)
    }
}

// ── Compound values ──────────────────────────────────────────────────────

impl ser::SerializeSeq for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeTuple for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeTupleStruct for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeTupleVariant for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeMap for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodeError> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeStruct for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.tag(FIELD);
        self.raw_str(key);
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

impl ser::SerializeStructVariant for &mut Encoder<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.tag(FIELD);
        self.raw_str(key);
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.tag(END);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn bytes<V: Serialize + ?Sized>(value: &V) -> Vec<u8> {
        let mut out = Vec::new();
        encode_into(&mut out, value).expect("encodes");
        out
    }

    #[test]
    fn nested_options_keep_their_tags() {
        assert_ne!(bytes(&Some(None::<String>)), bytes(&None::<Option<String>>));
        assert_ne!(bytes(&Some(Some(0u8))), bytes(&Some(0u8)));
    }

    #[test]
    fn non_finite_floats_are_distinct() {
        let values = [
            bytes(&None::<f64>),
            bytes(&Some(f64::NAN)),
            bytes(&Some(f64::INFINITY)),
            bytes(&Some(f64::NEG_INFINITY)),
            bytes(&Some(0.0f64)),
        ];
        for (i, a) in values.iter().enumerate() {
            for b in &values[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_ne!(bytes(&f32::NAN), bytes(&f32::INFINITY));
    }

    #[test]
    fn integer_width_is_tagged() {
        assert_ne!(bytes(&1u8), bytes(&1u16));
        assert_ne!(bytes(&1i32), bytes(&1u32));
    }

    #[test]
    fn float_layout_is_raw_bits() {
        let mut expected = vec![F32];
        expected.extend_from_slice(&1.5f32.to_bits().to_le_bytes());
        assert_eq!(bytes(&1.5f32), expected);
    }

    #[test]
    fn sequences_are_self_delimiting() {
        let nested = bytes(&vec![vec![1u8], vec![]]);
        let flat = bytes(&vec![vec![1u8]]);
        assert_ne!(nested, flat);
        assert_eq!(nested.last(), Some(&END));
    }

    #[test]
    fn maps_accept_any_key_type() {
        let mut map: BTreeMap<(u8, u8), u8> = BTreeMap::new();
        map.insert((1, 2), 3);
        assert!(!bytes(&map).is_empty());
    }
}
