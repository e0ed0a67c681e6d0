// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS Security file lookup inside an enclave directory.
//!
//! Each attribute has an ordered list of candidate files; the first candidate
//! that qualifies is used. `.p11` files hold a PKCS#11 URI and are only
//! considered when the middleware supports PKCS#11.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Security attribute name to resolved URI.
pub type SecurityFiles = BTreeMap<String, String>;

const PKCS11_URI_PREFIX: &str = "pkcs11:";

#[derive(Clone, Copy)]
enum Source {
    /// Plain file, referenced by `prefix` + path.
    File,
    /// File whose first token is a `pkcs11:` URI.
    Pkcs11,
}

const REQUIRED_FILES: &[(&str, &[(&str, Source)])] = &[
    (
        "IDENTITY_CA",
        &[
            ("identity_ca.cert.p11", Source::Pkcs11),
            ("identity_ca.cert.pem", Source::File),
        ],
    ),
    (
        "CERTIFICATE",
        &[("cert.p11", Source::Pkcs11), ("cert.pem", Source::File)],
    ),
    (
        "PRIVATE_KEY",
        &[("key.p11", Source::Pkcs11), ("key.pem", Source::File)],
    ),
    (
        "PERMISSIONS_CA",
        &[
            ("permissions_ca.cert.p11", Source::Pkcs11),
            ("permissions_ca.cert.pem", Source::File),
        ],
    ),
    ("GOVERNANCE", &[("governance.p7s", Source::File)]),
    ("PERMISSIONS", &[("permissions.p7s", Source::File)]),
];

const OPTIONAL_FILES: &[(&str, &str)] = &[("CRL", "crl.pem")];

/// Resolve the security files of `secure_root` without PKCS#11 support.
pub fn get_security_files(prefix: &str, secure_root: &Path) -> Result<SecurityFiles> {
    get_security_files_with_pkcs11(false, prefix, secure_root)
}

/// Resolve the security files of `secure_root`.
///
/// Fails with [`Error::MissingSecurityFile`] if any required attribute has no
/// usable file; nothing is returned in that case.
pub fn get_security_files_with_pkcs11(
    supports_pkcs11: bool,
    prefix: &str,
    secure_root: &Path,
) -> Result<SecurityFiles> {
    let mut result = SecurityFiles::new();

    for (attribute, candidates) in REQUIRED_FILES {
        let value = candidates.iter().find_map(|(name, source)| {
            let full_path = secure_root.join(name);
            match source {
                Source::File => file_uri(prefix, &full_path),
                Source::Pkcs11 if supports_pkcs11 => pkcs11_uri(&full_path),
                Source::Pkcs11 => None,
            }
        });

        let Some(value) = value else {
            log::warn!(
                "[security] no file for {} in '{}'",
                attribute,
                secure_root.display()
            );
            return Err(Error::MissingSecurityFile((*attribute).to_string()));
        };
        result.insert((*attribute).to_string(), value);
    }

    for (attribute, name) in OPTIONAL_FILES {
        if let Some(value) = file_uri(prefix, &secure_root.join(name)) {
            result.insert((*attribute).to_string(), value);
        }
    }

    log::debug!(
        "[security] resolved {} attribute(s) in '{}'",
        result.len(),
        secure_root.display()
    );
    Ok(result)
}

fn file_uri(prefix: &str, full_path: &Path) -> Option<String> {
    full_path
        .is_file()
        .then(|| format!("{prefix}{}", full_path.display()))
}

fn pkcs11_uri(full_path: &Path) -> Option<String> {
    let content = fs::read_to_string(full_path).ok()?;
    let uri = content.split_whitespace().next()?;
    uri.starts_with(PKCS11_URI_PREFIX).then(|| uri.to_string())
}
