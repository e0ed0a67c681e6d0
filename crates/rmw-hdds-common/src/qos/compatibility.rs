// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher/subscription QoS compatibility.
//!
//! Errors are evaluated first and all of them are reported. Warnings are only
//! looked at when no error was found; they flag combinations whose runtime
//! behavior depends on a `system_default` or `unknown` policy.

use super::{DurabilityPolicy, LivelinessPolicy, QosProfile, ReliabilityPolicy};
use crate::time::RmwTime;
use std::fmt::Write as _;

/// Outcome of a compatibility check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QosCompatibility {
    /// The endpoints will communicate.
    Ok,
    /// The endpoints may not communicate, depending on unknown policies.
    Warning,
    /// The endpoints will not communicate.
    Error,
}

/// Check whether `publisher` can serve `subscription`.
///
/// The reason lists one `ERROR: ...;` or `WARNING: ...;` entry per violated
/// rule and is empty when the result is [`QosCompatibility::Ok`].
#[must_use]
pub fn check_compatible(
    publisher: &QosProfile,
    subscription: &QosProfile,
) -> (QosCompatibility, String) {
    let mut reason = String::new();

    check_errors(publisher, subscription, &mut reason);
    if !reason.is_empty() {
        return (QosCompatibility::Error, reason);
    }

    check_warnings(publisher, subscription, &mut reason);
    if !reason.is_empty() {
        return (QosCompatibility::Warning, reason);
    }

    (QosCompatibility::Ok, reason)
}

/// Same as [`check_compatible`], writing the reason into a C string buffer.
///
/// An empty buffer is left untouched. Otherwise the reason is truncated to
/// `buffer.len() - 1` bytes and NUL-terminated.
pub fn check_compatible_into(
    publisher: &QosProfile,
    subscription: &QosProfile,
    buffer: &mut [u8],
) -> QosCompatibility {
    let (compatibility, reason) = check_compatible(publisher, subscription);

    if let Some(capacity) = buffer.len().checked_sub(1) {
        let written = reason.len().min(capacity);
        buffer[..written].copy_from_slice(&reason.as_bytes()[..written]);
        buffer[written] = 0;
    }

    compatibility
}

/// Subscription requests a period (deadline or lease) the publisher does not offer.
fn period_violation(publisher: RmwTime, subscription: RmwTime) -> Option<PeriodViolation> {
    if subscription.is_default() {
        return None;
    }
    if publisher.is_default() {
        return Some(PeriodViolation::Missing);
    }
    (subscription < publisher).then_some(PeriodViolation::Tighter)
}

enum PeriodViolation {
    Missing,
    Tighter,
}

fn check_errors(publisher: &QosProfile, subscription: &QosProfile, reason: &mut String) {
    if publisher.reliability == ReliabilityPolicy::BestEffort
        && subscription.reliability == ReliabilityPolicy::Reliable
    {
        reason.push_str("ERROR: Best effort publisher and reliable subscription;");
    }

    if publisher.durability == DurabilityPolicy::Volatile
        && subscription.durability == DurabilityPolicy::TransientLocal
    {
        reason.push_str("ERROR: Volatile publisher and transient local subscription;");
    }

    match period_violation(publisher.deadline, subscription.deadline) {
        Some(PeriodViolation::Missing) => {
            reason.push_str("ERROR: Subscription has a deadline, but publisher does not;");
        }
        Some(PeriodViolation::Tighter) => {
            reason.push_str("ERROR: Subscription deadline is less than publisher deadline;");
        }
        None => {}
    }

    if publisher.liveliness == LivelinessPolicy::Automatic
        && subscription.liveliness == LivelinessPolicy::ManualByTopic
    {
        reason.push_str(
            "ERROR: Publisher's liveliness is automatic and subscription's is manual by topic;",
        );
    }

    match period_violation(
        publisher.liveliness_lease_duration,
        subscription.liveliness_lease_duration,
    ) {
        Some(PeriodViolation::Missing) => reason.push_str(
            "ERROR: Subscription has a liveliness lease duration, but publisher does not;",
        ),
        Some(PeriodViolation::Tighter) => reason
            .push_str("ERROR: Subscription liveliness lease duration is less than publisher;"),
        None => {}
    }
}

// Writing into a String never fails, so the fmt results below are ignored.
fn check_warnings(publisher: &QosProfile, subscription: &QosProfile, reason: &mut String) {
    let (pub_rel, sub_rel) = (publisher.reliability, subscription.reliability);
    if pub_rel.is_unknown() && sub_rel.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Publisher reliability is {} and subscription reliability is {};",
            pub_rel, sub_rel
        );
    } else if pub_rel.is_unknown() && sub_rel == ReliabilityPolicy::Reliable {
        let _ = write!(
            reason,
            "WARNING: Reliable subscription, but publisher is {};",
            pub_rel
        );
    } else if pub_rel == ReliabilityPolicy::BestEffort && sub_rel.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Best effort publisher, but subscription is {};",
            sub_rel
        );
    }

    let (pub_dur, sub_dur) = (publisher.durability, subscription.durability);
    if pub_dur.is_unknown() && sub_dur.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Publisher durability is {} and subscription durability is {};",
            pub_dur, sub_dur
        );
    } else if pub_dur.is_unknown() && sub_dur == DurabilityPolicy::TransientLocal {
        let _ = write!(
            reason,
            "WARNING: Transient local subscription, but publisher is {};",
            pub_dur
        );
    } else if pub_dur == DurabilityPolicy::Volatile && sub_dur.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Volatile publisher, but subscription is {};",
            sub_dur
        );
    }

    let (pub_live, sub_live) = (publisher.liveliness, subscription.liveliness);
    if pub_live.is_unknown() && sub_live.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Publisher liveliness is {} and subscription liveliness is {};",
            pub_live, sub_live
        );
    } else if pub_live.is_unknown() && sub_live == LivelinessPolicy::ManualByTopic {
        let _ = write!(
            reason,
            "WARNING: Subscription's liveliness is manual by topic, but publisher's is {};",
            pub_live
        );
    } else if pub_live == LivelinessPolicy::Automatic && sub_live.is_unknown() {
        let _ = write!(
            reason,
            "WARNING: Publisher's liveliness is automatic, but subscription's is {};",
            sub_live
        );
    }
}
