// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `rmw_time_t` equivalent used by QoS durations (deadline, lifespan, lease).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const NSEC_PER_SEC: u64 = 1_000_000_000;
/// DDS durations carry seconds as a signed 32-bit integer.
const DDS_MAX_SEC: u64 = i32::MAX as u64;

/// Duration split into seconds and nanoseconds.
///
/// Ordering compares `sec` first, then `nsec`. The sentinels
/// [`RmwTime::DEFAULT`], [`RmwTime::BEST_AVAILABLE`] and [`RmwTime::INFINITE`]
/// must be matched by equality, not by arithmetic on their values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RmwTime {
    pub sec: u64,
    pub nsec: u64,
}

impl RmwTime {
    /// "Unspecified": the policy is not set (e.g. no deadline).
    pub const DEFAULT: Self = Self::new(0, 0);
    /// Resolve the value from the discovered peers.
    pub const BEST_AVAILABLE: Self = Self::new(9_223_372_036, 854_775_806);
    /// Largest duration expressible as signed nanoseconds.
    pub const INFINITE: Self = Self::new(9_223_372_036, 854_775_807);

    #[must_use]
    pub const fn new(sec: u64, nsec: u64) -> Self {
        Self { sec, nsec }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    #[must_use]
    pub fn is_best_available(&self) -> bool {
        *self == Self::BEST_AVAILABLE
    }

    /// Convert to a `Duration`, saturating when `nsec` overflows.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.sec).saturating_add(Duration::from_nanos(self.nsec))
    }

    /// Normalize and clamp to what a DDS `Duration_t` can carry.
    ///
    /// `nsec` is folded into `sec` until it is below one second. Lengths past
    /// `i32::MAX` seconds saturate at `{i32::MAX, 999_999_999}`.
    #[must_use]
    pub fn clamp_to_dds_time(&self) -> Self {
        let mut sec_adjust = self.nsec / NSEC_PER_SEC;
        let mut overflow = false;

        if sec_adjust > DDS_MAX_SEC {
            sec_adjust = DDS_MAX_SEC;
            overflow = true;
        }

        let sec = if self.sec > DDS_MAX_SEC - sec_adjust {
            overflow = true;
            DDS_MAX_SEC
        } else {
            self.sec + sec_adjust
        };

        if overflow {
            log::debug!(
                "[time] duration cannot be represented by DDS, truncated at INT_MAX seconds + (10^9 - 1) nanoseconds"
            );
            return Self::new(sec, NSEC_PER_SEC - 1);
        }

        Self::new(sec, self.nsec - sec_adjust * NSEC_PER_SEC)
    }
}

impl From<Duration> for RmwTime {
    fn from(duration: Duration) -> Self {
        Self::new(duration.as_secs(), u64::from(duration.subsec_nanos()))
    }
}

impl fmt::Display for RmwTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s {}ns", self.sec, self.nsec)
    }
}
