#![forbid(unsafe_code)]

//! Fast, non-unique content fingerprints.
//!
//! [`HashableContent`] feeds each selected field, in order, into one
//! fixed-seed `ahash` hasher and keeps the final 64-bit value. It is cheaper
//! than [`EncodableContent`](crate::EncodableContent) and stores eight bytes
//! per row, but two different inputs can collide. A collision means a changed
//! row is not reloaded, so use it only where a rare stale row is acceptable.
//!
//! The seeds are fixed, so equal inputs hash equally for the lifetime of the
//! process (and across processes on the same build and CPU).

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

use ahash::{AHasher, RandomState};

const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// 64-bit hash of the selected fields of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashFingerprint(u64);

impl HashFingerprint {
    /// Wrap a raw hash value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw hash value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HashFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Builder for a [`HashFingerprint`] over fields of `R`.
pub struct HashableContent<'a, R: ?Sized> {
    root: &'a R,
    hasher: AHasher,
    fields: usize,
}

impl<'a, R: ?Sized> HashableContent<'a, R> {
    /// Start a fingerprint over `root`.
    #[must_use]
    pub fn of(root: &'a R) -> Self {
        let state = RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]);
        Self {
            root,
            hasher: state.build_hasher(),
            fields: 0,
        }
    }

    /// Select the next field.
    #[must_use]
    pub fn field<V, E>(self, extract: E) -> Self
    where
        E: FnOnce(&'a R) -> V,
        V: Hash,
    {
        let value = extract(self.root);
        self.value(&value)
    }

    /// Mix in a value that is not read from the root.
    #[must_use]
    pub fn value<V: Hash + ?Sized>(mut self, value: &V) -> Self {
        value.hash(&mut self.hasher);
        self.fields += 1;
        self
    }

    /// Number of fields selected so far.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields
    }

    /// Finish and return the fingerprint.
    #[must_use]
    pub fn hash_value(mut self) -> HashFingerprint {
        // Folding the arity in separates `()` from a single empty field.
        self.hasher.write_usize(self.fields);
        HashFingerprint(self.hasher.finish())
    }
}

impl<R: ?Sized> fmt::Debug for HashableContent<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashableContent")
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Motorcycle {
        vin: i64,
        brand: &'static str,
        model: &'static str,
        plate: Option<String>,
        price: i64,
    }

    fn bike(plate: Option<&str>) -> Motorcycle {
        Motorcycle {
            vin: 42,
            brand: "Ducati",
            model: "Diavel",
            plate: plate.map(str::to_string),
            price: 18_000,
        }
    }

    fn displayed(m: &Motorcycle) -> HashFingerprint {
        HashableContent::of(m)
            .field(|m| m.brand)
            .field(|m| m.model)
            .field(|m| &m.plate)
            .field(|m| m.price)
            .hash_value()
    }

    #[test]
    fn equal_fields_equal_hash() {
        assert_eq!(displayed(&bike(Some("XY1"))), displayed(&bike(Some("XY1"))));
    }

    #[test]
    fn changed_plate_changes_hash() {
        assert_ne!(displayed(&bike(Some("XY1"))), displayed(&bike(Some("XY2"))));
        assert_ne!(displayed(&bike(Some("XY1"))), displayed(&bike(None)));
    }

    #[test]
    fn unselected_field_is_ignored() {
        let a = bike(None);
        let mut b = bike(None);
        b.vin = -1;
        assert_eq!(displayed(&a), displayed(&b));
    }

    #[test]
    fn order_sensitive() {
        let pair = (1u32, 2u32);
        let ab = HashableContent::of(&pair)
            .field(|p| p.0)
            .field(|p| p.1)
            .hash_value();
        let ba = HashableContent::of(&pair)
            .field(|p| p.1)
            .field(|p| p.0)
            .hash_value();
        assert_ne!(ab, ba);
    }

    #[test]
    fn arity_is_mixed_in() {
        let empty = HashableContent::of(&()).hash_value();
        let one = HashableContent::of(&()).value(&()).hash_value();
        assert_ne!(empty, one);
    }

    #[test]
    fn raw_round_trip_and_display() {
        let fp = HashFingerprint::from_raw(0xabc);
        assert_eq!(fp.raw(), 0xabc);
        assert_eq!(fp.to_string(), "0000000000000abc");
    }
}
