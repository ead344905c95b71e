#![forbid(unsafe_code)]

//! Unique content fingerprints built from serialized fields.
//!
//! [`EncodableContent`] serializes an ordered list of fields selected from a
//! source record into one canonical byte string. Two fingerprints compare
//! equal exactly when every selected field serialized to the same bytes, so a
//! changed field can never be missed.
//!
//! # Encoding
//!
//! Each field is written with the type-tagged encoding in
//! [`canonical`](crate::canonical), in selection order. `None` and `Some`
//! are tagged and floats are written as raw bits, so distinct values never
//! share bytes, and every field is self-delimiting, so reordering or shifting
//! fields always changes the bytes.
//!
//! # Caveats
//!
//! - Collections with unspecified iteration order (`HashMap`, `HashSet`) may
//!   encode equal values differently. That over-triggers reloads but never
//!   hides one; prefer `BTreeMap`/`Vec` for selected fields.
//! - `0.0` and `-0.0`, or two NaNs with different payloads, encode
//!   differently. Same outcome: an extra reload at most.
//!
//! # Example
//!
//! ```
//! use diffreload_content::EncodableContent;
//!
//! struct Row {
//!     title: String,
//!     price: u32,
//!     notes: Vec<u8>, // not displayed, not selected
//! }
//!
//! let row = Row { title: "Golf".into(), price: 21_000, notes: vec![1, 2, 3] };
//! let before = EncodableContent::of(&row)
//!     .field(|r| &r.title)
//!     .field(|r| r.price)
//!     .data();
//!
//! let row = Row { price: 22_000, ..row };
//! let after = EncodableContent::of(&row)
//!     .field(|r| &r.title)
//!     .field(|r| r.price)
//!     .data();
//!
//! assert_ne!(before, after);
//! ```

use std::fmt;

use serde::Serialize;

use crate::canonical::encode_into;
use crate::error::{ContentError, Result};

/// Canonical byte encoding of the selected fields of a row.
///
/// Equality is byte equality. Hashable, so it can also key a map.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedFingerprint(Box<[u8]>);

impl EncodedFingerprint {
    /// Raw encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EncodedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedFingerprint(")?;
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for EncodedFingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Builder for an [`EncodedFingerprint`] over fields of `R`.
///
/// Any number of fields can be selected; each selection is a closure reading
/// one serializable value (owned or borrowed) from the root.
pub struct EncodableContent<'a, R: ?Sized> {
    root: &'a R,
    buffer: Vec<u8>,
    fields: usize,
    error: Option<ContentError>,
}

impl<'a, R: ?Sized> EncodableContent<'a, R> {
    /// Start a fingerprint over `root`.
    #[must_use]
    pub fn of(root: &'a R) -> Self {
        Self {
            root,
            buffer: Vec::with_capacity(64),
            fields: 0,
            error: None,
        }
    }

    /// Select the next field.
    #[must_use]
    pub fn field<V, E>(self, extract: E) -> Self
    where
        E: FnOnce(&'a R) -> V,
        V: Serialize,
    {
        let value = extract(self.root);
        self.value(&value)
    }

    /// Append a value that is not read from the root (e.g. a derived label).
    #[must_use]
    pub fn value<V: Serialize + ?Sized>(mut self, value: &V) -> Self {
        if self.error.is_some() {
            self.fields += 1;
            return self;
        }
        if let Err(source) = encode_into(&mut self.buffer, value) {
            self.error = Some(ContentError::Encode {
                index: self.fields,
                source,
            });
        }
        self.fields += 1;
        self
    }

    /// Number of fields selected so far.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields
    }

    /// Finish the fingerprint, reporting the first field that failed to encode.
    pub fn try_data(mut self) -> Result<EncodedFingerprint> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        Ok(EncodedFingerprint(self.buffer.into_boxed_slice()))
    }

    /// Finish the fingerprint; `None` if any field failed to encode.
    ///
    /// A `None` fingerprint makes the row reload on every detection pass,
    /// which is the safe outcome for content that cannot be captured.
    #[must_use]
    pub fn data(self) -> Option<EncodedFingerprint> {
        self.try_data().ok()
    }
}

impl<R: ?Sized> fmt::Debug for EncodableContent<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodableContent")
            .field("fields", &self.fields)
            .field("encoded_len", &self.buffer.len())
            .field("failed", &self.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;
    use serde::ser::Error as _;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("value refuses to serialize"))
        }
    }

    #[derive(Clone)]
    struct Car {
        brand: &'static str,
        model: String,
        plate: Option<String>,
        price: i64,
        color: (f32, f32, f32),
        manual: Vec<u8>,
    }

    fn car() -> Car {
        Car {
            brand: "Ford",
            model: "Mustang".to_string(),
            plate: Some("ABC123".to_string()),
            price: 30_000,
            color: (0.5, 0.75, 1.0),
            manual: vec![7; 32],
        }
    }

    fn displayed(car: &Car) -> Option<EncodedFingerprint> {
        EncodableContent::of(car)
            .field(|c| c.brand)
            .field(|c| &c.model)
            .field(|c| &c.plate)
            .field(|c| c.price)
            .field(|c| c.color)
            .data()
    }

    #[test]
    fn equal_fields_equal_fingerprint() {
        assert_eq!(displayed(&car()), displayed(&car()));
    }

    #[test]
    fn changed_selected_field_changes_fingerprint() {
        let a = car();
        let mut b = car();
        b.price += 1;
        assert_ne!(displayed(&a), displayed(&b));

        let mut c = car();
        c.plate = None;
        assert_ne!(displayed(&a), displayed(&c));

        let mut d = car();
        d.color.2 = 0.99;
        assert_ne!(displayed(&a), displayed(&d));
    }

    #[test]
    fn unselected_field_is_ignored() {
        let a = car();
        let mut b = car();
        b.manual.clear();
        assert_eq!(displayed(&a), displayed(&b));
    }

    #[test]
    fn field_order_matters() {
        let c = car();
        let ab = EncodableContent::of(&c)
            .field(|c| &c.model)
            .field(|c| c.brand)
            .data();
        let ba = EncodableContent::of(&c)
            .field(|c| c.brand)
            .field(|c| &c.model)
            .data();
        assert_ne!(ab, ba);
    }

    #[test]
    fn shifted_boundaries_do_not_collide() {
        let pair = ("ab".to_string(), "c".to_string());
        let left = EncodableContent::of(&pair)
            .field(|p| &p.0)
            .field(|p| &p.1)
            .data();
        let shifted = ("a".to_string(), "bc".to_string());
        let right = EncodableContent::of(&shifted)
            .field(|p| &p.0)
            .field(|p| &p.1)
            .data();
        assert_ne!(left, right);
    }

    #[test]
    fn more_than_ten_fields() {
        let values: Vec<u32> = (0..16).collect();
        let mut content = EncodableContent::of(&values);
        for i in 0..values.len() {
            content = content.field(move |v| v[i]);
        }
        assert_eq!(content.field_count(), 16);
        let fp = content.data().expect("sixteen integers encode");
        // Tag plus four little-endian bytes per u32.
        assert_eq!(fp.len(), 16 * 5);
    }

    #[test]
    fn empty_selection_is_valid() {
        let fp = EncodableContent::of(&()).data().expect("empty selection");
        assert!(fp.is_empty());
        let unit = EncodableContent::of(&()).field(|u| *u).data();
        assert_ne!(Some(fp), unit);
    }

    #[test]
    fn encode_failure_reports_field_index() {
        let err = EncodableContent::of(&Unencodable)
            .value(&"ok")
            .field(|u| u)
            .value(&5)
            .try_data()
            .expect_err("second field fails");
        assert_eq!(err.field_index(), 1);
    }

    #[test]
    fn encode_failure_yields_none() {
        assert!(EncodableContent::of(&Unencodable).field(|u| u).data().is_none());
    }

    #[test]
    fn derived_values_can_be_appended() {
        let c = car();
        let label = format!("{} {}", c.brand, c.model);
        let a = EncodableContent::of(&c).value(label.as_str()).data();
        let b = EncodableContent::of(&c)
            .field(|c| format!("{} {}", c.brand, c.model))
            .data();
        assert_eq!(a, b);
    }

    #[test]
    fn debug_is_hex() {
        let fp = EncodableContent::of(&7u8).field(|v| *v).data().expect("encodes");
        assert_eq!(format!("{fp:?}"), "EncodedFingerprint(0707)");
    }

    #[test]
    fn optional_color_channels_stay_distinct() {
        let channels = [None, Some(f32::NAN), Some(f32::INFINITY), Some(1.0)];
        let fingerprints: Vec<_> = channels
            .iter()
            .map(|c| EncodableContent::of(c).field(|c| c).data())
            .collect();
        for (i, a) in fingerprints.iter().enumerate() {
            for b in &fingerprints[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
