//! Controller-database style device identifiers.
//!
//! The identifier is 16 bytes rendered as 32 lowercase hex characters, laid out
//! the way community controller-mapping databases expect:
//!
//! - vendor/product known: `03 00 00 00 | vid | 00 00 | pid | 00 00 | ver | 00 00`
//!   (each id little-endian 16-bit)
//! - otherwise: `05 00 00 00 | first 12 bytes of the display name, zero padded`
//!
//! Name truncation works on UTF-8 bytes and may split a multi-byte character.

use crate::metadata::DeviceProperties;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const VENDOR_PRODUCT_MARKER: u8 = 0x03;
const NAME_MARKER: u8 = 0x05;
const NAME_BYTES: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Derive from device properties: vendor/product layout when both are non-zero,
    /// name layout otherwise.
    pub fn from_properties(props: &DeviceProperties) -> Self {
        if props.vendor_id != 0 && props.product_id != 0 {
            Self::from_vendor_product(props.vendor_id, props.product_id, props.version)
        } else {
            Self::from_name(props.display_name())
        }
    }

    /// `03000000`, then vendor, product and version as little-endian `u16`s,
    /// each followed by two zero bytes.
    pub fn from_vendor_product(vendor: u16, product: u16, version: u16) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0] = VENDOR_PRODUCT_MARKER;
        for (chunk, part) in bytes[4..]
            .chunks_exact_mut(4)
            .zip([vendor, product, version])
        {
            chunk[..2].copy_from_slice(&part.to_le_bytes());
        }
        Self::from_bytes(bytes)
    }

    /// `05000000` followed by the first 12 bytes of `name`, zero-padded.
    pub fn from_name(name: &str) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0] = NAME_MARKER;
        let src = name.as_bytes();
        let n = src.len().min(NAME_BYTES);
        bytes[4..4 + n].copy_from_slice(&src[..n]);
        Self::from_bytes(bytes)
    }

    fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes).as_simple().to_string())
    }

    /// Whether this identifier was derived from the display name.
    pub fn is_name_derived(&self) -> bool {
        self.0.starts_with("05")
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(name: Option<&str>, vid: u16, pid: u16, ver: u16) -> DeviceProperties {
        DeviceProperties {
            name: name.map(str::to_string),
            vendor_id: vid,
            product_id: pid,
            version: ver,
            ..Default::default()
        }
    }

    #[test]
    fn xbox_360_controller_layout() {
        let id = Identifier::from_properties(&props(Some("Xbox 360"), 0x045E, 0x028E, 0x0114));
        assert_eq!(id.as_str(), "030000005e0400008e02000014010000");
        assert_eq!(id.as_str().len(), 32);
        assert!(!id.is_name_derived());
    }

    #[test]
    fn vendor_product_is_deterministic_and_ignores_name() {
        let a = Identifier::from_properties(&props(Some("Pad A"), 0x054C, 0x05C4, 0x0100));
        let b = Identifier::from_properties(&props(Some("Pad B"), 0x054C, 0x05C4, 0x0100));
        assert_eq!(a, b);
        let c = Identifier::from_properties(&props(Some("Pad A"), 0x054C, 0x05C4, 0x0101));
        assert_ne!(a, c);
    }

    #[test]
    fn short_names_are_zero_padded() {
        let id = Identifier::from_properties(&props(Some("Pad"), 0, 0, 0));
        assert_eq!(id.as_str(), "05000000506164000000000000000000");
        assert!(id.is_name_derived());
    }

    #[test]
    fn long_names_are_truncated_to_twelve_bytes() {
        let a = Identifier::from_name("Generic USB Joystick");
        let b = Identifier::from_name("Generic USB Gamepad");
        // Both share the prefix "Generic USB " (12 bytes).
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0500000047656e657269632055534220");
    }

    #[test]
    fn one_zero_id_falls_back_to_name() {
        let vendor_only = Identifier::from_properties(&props(Some("Pad"), 0x1234, 0, 1));
        assert_eq!(vendor_only, Identifier::from_name("Pad"));
    }

    #[test]
    fn missing_name_uses_unknown() {
        let id = Identifier::from_properties(&props(None, 0, 0, 0));
        assert_eq!(id, Identifier::from_name("Unknown"));
    }

    #[test]
    fn truncation_is_byte_level() {
        // 13 bytes; the cut keeps only the first byte of the last 'é'.
        let id = Identifier::from_name("aéééééé");
        assert_eq!(&id.as_str()[8..], "61c3a9c3a9c3a9c3a9c3a9c3");
    }
}
