// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global identifiers of DDS entities (participants, readers, writers).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size (in bytes) of an rmw GID (`rmw_gid_t::data`).
pub const GID_STORAGE_SIZE: usize = 24;

/// Opaque, fixed-size identifier assigned by the middleware.
///
/// Ordering is byte-lexicographic so GIDs can key ordered maps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Gid {
    data: [u8; GID_STORAGE_SIZE],
}

impl Gid {
    #[must_use]
    pub const fn new(data: [u8; GID_STORAGE_SIZE]) -> Self {
        Self { data }
    }

    /// Build a GID from a slice that must be exactly [`GID_STORAGE_SIZE`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let data: [u8; GID_STORAGE_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidArgument("gid must be 24 bytes long"))?;
        Ok(Self { data })
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; GID_STORAGE_SIZE] {
        &self.data
    }

    #[must_use]
    pub const fn into_bytes(self) -> [u8; GID_STORAGE_SIZE] {
        self.data
    }
}

impl From<[u8; GID_STORAGE_SIZE]> for Gid {
    fn from(data: [u8; GID_STORAGE_SIZE]) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for Gid {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Hex bytes separated by dots, e.g. `1.f.0.a0...`.
impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.data[..GID_STORAGE_SIZE - 1] {
            write!(f, "{:x}.", byte)?;
        }
        write!(f, "{:x}", self.data[GID_STORAGE_SIZE - 1])
    }
}

impl fmt::Debug for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gid({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn gid_with(prefix: &[u8]) -> Gid {
        let mut data = [0u8; GID_STORAGE_SIZE];
        data[..prefix.len()].copy_from_slice(prefix);
        Gid::new(data)
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let a = gid_with(&[1, 2, 3]);
        let b = gid_with(&[1, 2, 4]);
        let c = gid_with(&[2]);

        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&c), Ordering::Less);
        assert_eq!(c.cmp(&a), Ordering::Greater);
        assert_eq!(a.cmp(&gid_with(&[1, 2, 3])), Ordering::Equal);
    }

    #[test]
    fn display_uses_dotted_hex() {
        let gid = gid_with(&[0x01, 0xab, 0x10]);
        let rendered = gid.to_string();
        assert!(rendered.starts_with("1.ab.10.0."));
        assert_eq!(rendered.split('.').count(), GID_STORAGE_SIZE);
        assert!(!rendered.ends_with('.'));
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(Gid::from_slice(&[0u8; 16]).is_err());
        let gid = Gid::from_slice(&[7u8; GID_STORAGE_SIZE]).expect("24 bytes");
        assert_eq!(gid.as_bytes(), &[7u8; GID_STORAGE_SIZE]);
    }
}
