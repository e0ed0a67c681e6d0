// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ROS 2 QoS profiles as seen by the rmw layer.
//!
//! Unlike the DDS policies of the core stack, every policy here may also be
//! `SystemDefault` (let the middleware decide), `BestAvailable` (resolve from
//! discovered peers) or `Unknown` (reported by a peer we cannot interpret).

/// Best-available policy resolution against discovered peers.
pub mod best_available;
/// Publisher/subscription compatibility checks.
pub mod compatibility;
/// Type hash carried in the DDS USER_DATA QoS.
pub mod type_hash;

pub use best_available::{
    best_available_for_publisher, best_available_for_subscription,
    best_available_for_topic_publisher, best_available_for_topic_subscription,
    has_best_available_policy, update_best_available_for_services,
};
pub use compatibility::{check_compatible, check_compatible_into, QosCompatibility};
pub use type_hash::{encode_type_hash_for_user_data, parse_type_hash_from_user_data, TypeHash};

use crate::time::RmwTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HISTORY policy kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPolicy {
    #[default]
    SystemDefault,
    KeepLast,
    KeepAll,
    Unknown,
}

/// RELIABILITY policy kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReliabilityPolicy {
    #[default]
    SystemDefault,
    Reliable,
    BestEffort,
    BestAvailable,
    Unknown,
}

/// DURABILITY policy kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurabilityPolicy {
    #[default]
    SystemDefault,
    TransientLocal,
    Volatile,
    BestAvailable,
    Unknown,
}

/// LIVELINESS policy kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LivelinessPolicy {
    #[default]
    SystemDefault,
    Automatic,
    ManualByTopic,
    BestAvailable,
    Unknown,
}

impl HistoryPolicy {
    /// Canonical name, `None` for `Unknown`.
    #[must_use]
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::SystemDefault => Some("system_default"),
            Self::KeepLast => Some("keep_last"),
            Self::KeepAll => Some("keep_all"),
            Self::Unknown => None,
        }
    }
}

impl ReliabilityPolicy {
    /// Canonical name, `None` for `Unknown`.
    #[must_use]
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::SystemDefault => Some("system_default"),
            Self::Reliable => Some("reliable"),
            Self::BestEffort => Some("best_effort"),
            Self::BestAvailable => Some("best_available"),
            Self::Unknown => None,
        }
    }

    /// The actual behavior cannot be determined statically.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown)
    }
}

impl DurabilityPolicy {
    /// Canonical name, `None` for `Unknown`.
    #[must_use]
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::SystemDefault => Some("system_default"),
            Self::TransientLocal => Some("transient_local"),
            Self::Volatile => Some("volatile"),
            Self::BestAvailable => Some("best_available"),
            Self::Unknown => None,
        }
    }

    /// The actual behavior cannot be determined statically.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown)
    }
}

impl LivelinessPolicy {
    /// Canonical name, `None` for `Unknown`.
    #[must_use]
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::SystemDefault => Some("system_default"),
            Self::Automatic => Some("automatic"),
            Self::ManualByTopic => Some("manual_by_topic"),
            Self::BestAvailable => Some("best_available"),
            Self::Unknown => None,
        }
    }

    /// The actual behavior cannot be determined statically.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown)
    }
}

macro_rules! display_policy {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str().unwrap_or("unknown"))
                }
            }
        )*
    };
}

display_policy!(HistoryPolicy, ReliabilityPolicy, DurabilityPolicy, LivelinessPolicy);

/// QoS profile of a ROS 2 publisher or subscription.
///
/// `history`, `depth`, `lifespan` and `avoid_ros_namespace_conventions` are
/// carried along but never looked at by compatibility checks or best-available
/// resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosProfile {
    pub history: HistoryPolicy,
    pub depth: usize,
    pub reliability: ReliabilityPolicy,
    pub durability: DurabilityPolicy,
    pub deadline: RmwTime,
    pub lifespan: RmwTime,
    pub liveliness: LivelinessPolicy,
    pub liveliness_lease_duration: RmwTime,
    pub avoid_ros_namespace_conventions: bool,
}

impl Default for QosProfile {
    /// `rmw_qos_profile_default`: reliable, volatile, keep last 10.
    fn default() -> Self {
        Self {
            history: HistoryPolicy::KeepLast,
            depth: 10,
            reliability: ReliabilityPolicy::Reliable,
            durability: DurabilityPolicy::Volatile,
            deadline: RmwTime::DEFAULT,
            lifespan: RmwTime::DEFAULT,
            liveliness: LivelinessPolicy::SystemDefault,
            liveliness_lease_duration: RmwTime::DEFAULT,
            avoid_ros_namespace_conventions: false,
        }
    }
}

impl QosProfile {
    /// Every policy left to the middleware.
    #[must_use]
    pub fn system_default() -> Self {
        Self {
            history: HistoryPolicy::SystemDefault,
            depth: 0,
            reliability: ReliabilityPolicy::SystemDefault,
            durability: DurabilityPolicy::SystemDefault,
            liveliness: LivelinessPolicy::SystemDefault,
            ..Self::default()
        }
    }

    /// Profile used by service clients and servers.
    #[must_use]
    pub fn services_default() -> Self {
        Self::default()
    }

    /// Best effort, keep last 5: suited to high-rate sensor streams.
    #[must_use]
    pub fn sensor_data() -> Self {
        Self {
            depth: 5,
            reliability: ReliabilityPolicy::BestEffort,
            ..Self::default()
        }
    }

    /// Every negotiable policy resolved from discovered peers.
    #[must_use]
    pub fn best_available() -> Self {
        Self {
            reliability: ReliabilityPolicy::BestAvailable,
            durability: DurabilityPolicy::BestAvailable,
            deadline: RmwTime::BEST_AVAILABLE,
            liveliness: LivelinessPolicy::BestAvailable,
            liveliness_lease_duration: RmwTime::BEST_AVAILABLE,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reliability(mut self, reliability: ReliabilityPolicy) -> Self {
        self.reliability = reliability;
        self
    }

    #[must_use]
    pub fn with_durability(mut self, durability: DurabilityPolicy) -> Self {
        self.durability = durability;
        self
    }

    #[must_use]
    pub fn with_liveliness(mut self, liveliness: LivelinessPolicy) -> Self {
        self.liveliness = liveliness;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: RmwTime) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_liveliness_lease_duration(mut self, lease: RmwTime) -> Self {
        self.liveliness_lease_duration = lease;
        self
    }
}
