#![forbid(unsafe_code)]

//! Content fingerprints for diffreload rows.
//!
//! A fingerprint summarizes what a row *displays*, so the reload engine can
//! tell whether a visible row is stale. Two strategies are provided:
//!
//! - [`EncodableContent`] → [`EncodedFingerprint`]: canonical serialization of
//!   the selected fields. Unique; the default choice.
//! - [`HashableContent`] → [`HashFingerprint`]: a 64-bit hash of the selected
//!   fields. Faster and smaller, but collisions (missed reloads) are possible.
//!
//! Select exactly the fields a row displays. Selecting extra fields causes
//! needless reloads; leaving out a displayed field leaves rows stale.

pub mod canonical;
pub mod encodable;
pub mod error;
pub mod hashable;

pub use canonical::EncodeError;
pub use encodable::{EncodableContent, EncodedFingerprint};
pub use error::{ContentError, Result};
pub use hashable::{HashFingerprint, HashableContent};
