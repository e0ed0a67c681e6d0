// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ROS interface type hash (`RIHS01_...`) carried in the DDS USER_DATA QoS.
//!
//! USER_DATA holds `key=value;` pairs; the hash lives under `typehash`.

use crate::{Error, Result};
use std::fmt;

/// Length of the hash value in bytes.
pub const TYPE_HASH_SIZE: usize = 32;
const USER_DATA_KEY: &str = "typehash";
const RIHS01_PREFIX: &str = "RIHS01_";

/// Versioned interface type hash. Version 0 means unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeHash {
    pub version: u8,
    pub value: [u8; TYPE_HASH_SIZE],
}

impl TypeHash {
    #[must_use]
    pub const fn new(version: u8, value: [u8; TYPE_HASH_SIZE]) -> Self {
        Self { version, value }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.version == 0
    }

    /// Parse the `RIHS01_<64 hex digits>` form.
    pub fn parse(text: &str) -> Result<Self> {
        let hex = text
            .strip_prefix(RIHS01_PREFIX)
            .ok_or_else(|| Error::InvalidTypeHash(format!("missing RIHS01_ prefix: {text}")))?;
        if hex.len() != TYPE_HASH_SIZE * 2 {
            return Err(Error::InvalidTypeHash(format!(
                "expected {} hex digits, got {}",
                TYPE_HASH_SIZE * 2,
                hex.len()
            )));
        }

        if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidTypeHash(format!("non-hex digits in {text}")));
        }

        let mut value = [0u8; TYPE_HASH_SIZE];
        for (byte, pair) in value.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            *byte = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
        }

        Ok(Self::new(1, value))
    }
}

/// Value of an ASCII hex digit; callers check `is_ascii_hexdigit` first.
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RIHS{:02}_", self.version)?;
        for byte in &self.value {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Extract the type hash from raw USER_DATA bytes.
///
/// Data that is not in `key=value;` form, or has no `typehash` key, yields an
/// unset hash. A `typehash` entry that does not parse is an error.
pub fn parse_type_hash_from_user_data(user_data: &[u8]) -> Result<TypeHash> {
    let Some(raw) = user_data_value(user_data, USER_DATA_KEY) else {
        return Ok(TypeHash::default());
    };
    let text = std::str::from_utf8(raw)
        .map_err(|_| Error::InvalidTypeHash("typehash value is not utf-8".to_string()))?;
    TypeHash::parse(text)
}

/// Render the USER_DATA entry for `type_hash`, empty when the hash is unset.
#[must_use]
pub fn encode_type_hash_for_user_data(type_hash: &TypeHash) -> String {
    if type_hash.is_unset() {
        return String::new();
    }
    format!("{USER_DATA_KEY}={type_hash};")
}

fn user_data_value<'a>(user_data: &'a [u8], key: &str) -> Option<&'a [u8]> {
    user_data
        .split(|&b| b == b';')
        .filter_map(|pair| {
            let eq = pair.iter().position(|&b| b == b'=')?;
            Some((&pair[..eq], &pair[eq + 1..]))
        })
        .find(|(k, _)| *k == key.as_bytes())
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_hash() -> TypeHash {
        let mut value = [0u8; TYPE_HASH_SIZE];
        for (i, byte) in value.iter_mut().enumerate() {
            *byte = i as u8;
        }
        TypeHash::new(1, value)
    }

    const COUNTING_RIHS: &str =
        "RIHS01_000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn foreign_user_data_gives_unset_hash() {
        let hash =
            parse_type_hash_from_user_data(b"something that isn't key equals value semicolon")
                .expect("parse");
        assert!(hash.is_unset());
        assert_eq!(hash, TypeHash::default());

        let hash = parse_type_hash_from_user_data(b"key1=value1;key2=value2;key3=value3;")
            .expect("parse");
        assert!(hash.is_unset());
    }

    #[test]
    fn typehash_key_is_parsed() {
        let data = format!("foo=bar;typehash={COUNTING_RIHS};key=value;");
        let hash = parse_type_hash_from_user_data(data.as_bytes()).expect("parse");
        assert_eq!(hash, counting_hash());
    }

    #[test]
    fn malformed_typehash_is_an_error() {
        let err = parse_type_hash_from_user_data(b"typehash=RIHS01_abc;").expect_err("short");
        assert!(matches!(err, Error::InvalidTypeHash(_)));

        let err = parse_type_hash_from_user_data(b"typehash=nothash;").expect_err("prefix");
        assert!(matches!(err, Error::InvalidTypeHash(_)));
    }

    #[test]
    fn signed_or_non_hex_digits_are_rejected() {
        let plus = format!("RIHS01_+a{}", &COUNTING_RIHS[9..]);
        assert_eq!(plus.len(), COUNTING_RIHS.len());
        assert!(matches!(TypeHash::parse(&plus), Err(Error::InvalidTypeHash(_))));

        let letters = format!("RIHS01_zz{}", &COUNTING_RIHS[9..]);
        assert!(matches!(TypeHash::parse(&letters), Err(Error::InvalidTypeHash(_))));

        let upper = COUNTING_RIHS.replace("0a0b", "0A0B");
        assert_eq!(TypeHash::parse(&upper).expect("upper-case hex"), counting_hash());
    }

    #[test]
    fn encode_for_user_data() {
        assert_eq!(encode_type_hash_for_user_data(&TypeHash::default()), "");
        assert_eq!(
            encode_type_hash_for_user_data(&counting_hash()),
            format!("typehash={COUNTING_RIHS};")
        );
        assert_eq!(counting_hash().to_string(), COUNTING_RIHS);
    }
}
