// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration for the rmw graph layer.
//!
//! ## Security Configuration (SROS2)
//! - `ROS_SECURITY_ENABLE`: Enable security ("true")
//! - `ROS_SECURITY_KEYSTORE`: Keystore root directory
//! - `ROS_SECURITY_ENCLAVE`: Enclave name, e.g. "/talker_listener/talker"
//! - `HDDS_SECURITY_PKCS11`: Accept PKCS#11 URIs for key material ("1" or "true")
//! - `HDDS_SECURITY_URI_PREFIX`: Prefix of file URIs (default: "file://")
//!
//! ## Logging
//! - `HDDS_LOG_LEVEL`: Logging level (default: "info")
//!
//! # Example
//!
//! ```bash
//! export ROS_SECURITY_ENABLE=true
//! export ROS_SECURITY_KEYSTORE=/opt/keystore
//! export ROS_SECURITY_ENCLAVE=/talker_listener/talker
//! export HDDS_LOG_LEVEL=debug
//! ```

use crate::security::{get_security_files_with_pkcs11, SecurityFiles};
use crate::Result;
use std::env;
use std::path::PathBuf;

/// Environment variable names
pub const ENV_ROS_SECURITY_ENABLE: &str = "ROS_SECURITY_ENABLE";
pub const ENV_ROS_SECURITY_KEYSTORE: &str = "ROS_SECURITY_KEYSTORE";
pub const ENV_ROS_SECURITY_ENCLAVE: &str = "ROS_SECURITY_ENCLAVE";
pub const ENV_SECURITY_PKCS11: &str = "HDDS_SECURITY_PKCS11";
pub const ENV_SECURITY_URI_PREFIX: &str = "HDDS_SECURITY_URI_PREFIX";
pub const ENV_LOG_LEVEL: &str = "HDDS_LOG_LEVEL";

const DEFAULT_URI_PREFIX: &str = "file://";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Security configuration, `None` when security is disabled
    pub security: Option<SecurityEnvConfig>,
}

/// Security configuration from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityEnvConfig {
    pub keystore: Option<PathBuf>,
    pub enclave: Option<String>,
    pub supports_pkcs11: bool,
    pub uri_prefix: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            security: None,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl EnvConfig {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a variable.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.is_empty());

        let log_level = non_empty(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let enabled = non_empty(ENV_ROS_SECURITY_ENABLE)
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let security = enabled.then(|| SecurityEnvConfig {
            keystore: non_empty(ENV_ROS_SECURITY_KEYSTORE).map(PathBuf::from),
            enclave: non_empty(ENV_ROS_SECURITY_ENCLAVE),
            supports_pkcs11: non_empty(ENV_SECURITY_PKCS11)
                .map(|s| is_truthy(&s))
                .unwrap_or(false),
            uri_prefix: lookup(ENV_SECURITY_URI_PREFIX)
                .unwrap_or_else(|| DEFAULT_URI_PREFIX.to_string()),
        });

        Self {
            log_level,
            security,
        }
    }

    /// Check if any custom configuration was provided
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.log_level != DEFAULT_LOG_LEVEL || self.security.is_some()
    }

    /// Check if security is configured
    #[must_use]
    pub fn is_security_enabled(&self) -> bool {
        self.security.is_some()
    }

    /// Parsed log level, `Info` when the configured value is not a level name.
    #[must_use]
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Enclave directory: `<keystore>/enclaves/<enclave>`.
    #[must_use]
    pub fn secure_root(&self) -> Option<PathBuf> {
        let security = self.security.as_ref()?;
        let keystore = security.keystore.as_ref()?;
        let enclave = security.enclave.as_deref()?.trim_start_matches('/');
        Some(keystore.join("enclaves").join(enclave))
    }

    /// Security files of the configured enclave.
    ///
    /// `None` when security is disabled or no enclave is configured.
    pub fn security_files(&self) -> Option<Result<SecurityFiles>> {
        let security = self.security.as_ref()?;
        let root = self.secure_root()?;
        Some(get_security_files_with_pkcs11(
            security.supports_pkcs11,
            &security.uri_prefix,
            &root,
        ))
    }
}
