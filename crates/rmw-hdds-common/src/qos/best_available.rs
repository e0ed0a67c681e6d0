// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolution of `BestAvailable` policies.
//!
//! Only fields still set to their best-available sentinel are touched; every
//! concrete value chosen by the caller is kept as is.

use super::{DurabilityPolicy, LivelinessPolicy, QosProfile, ReliabilityPolicy};
use crate::endpoint::TopicEndpointInfo;
use crate::time::RmwTime;
use crate::{Error, Result};

/// Whether any negotiable field of `profile` asks for peer-based resolution.
#[must_use]
pub fn has_best_available_policy(profile: &QosProfile) -> bool {
    profile.reliability == ReliabilityPolicy::BestAvailable
        || profile.durability == DurabilityPolicy::BestAvailable
        || profile.liveliness == LivelinessPolicy::BestAvailable
        || profile.deadline.is_best_available()
        || profile.liveliness_lease_duration.is_best_available()
}

/// Resolve a subscription profile against the publishers already on its topic.
///
/// The subscription asks for a policy level only when every publisher offers
/// it, and for the loosest deadline and lease any publisher declares.
pub fn best_available_for_subscription<'a, I>(publishers: I, subscription: &mut QosProfile)
where
    I: IntoIterator<Item = &'a QosProfile>,
{
    let mut all_reliable = true;
    let mut all_transient_local = true;
    let mut all_manual_by_topic = true;
    let mut largest_deadline: Option<RmwTime> = None;
    let mut largest_lease: Option<RmwTime> = None;

    for profile in publishers {
        all_reliable &= profile.reliability == ReliabilityPolicy::Reliable;
        all_transient_local &= profile.durability == DurabilityPolicy::TransientLocal;
        all_manual_by_topic &= profile.liveliness == LivelinessPolicy::ManualByTopic;
        largest_deadline = widest(largest_deadline, profile.deadline, std::cmp::max);
        largest_lease = widest(largest_lease, profile.liveliness_lease_duration, std::cmp::max);
    }

    if subscription.reliability == ReliabilityPolicy::BestAvailable {
        subscription.reliability = if all_reliable {
            ReliabilityPolicy::Reliable
        } else {
            ReliabilityPolicy::BestEffort
        };
    }
    if subscription.durability == DurabilityPolicy::BestAvailable {
        subscription.durability = if all_transient_local {
            DurabilityPolicy::TransientLocal
        } else {
            DurabilityPolicy::Volatile
        };
    }
    if subscription.liveliness == LivelinessPolicy::BestAvailable {
        subscription.liveliness = if all_manual_by_topic {
            LivelinessPolicy::ManualByTopic
        } else {
            LivelinessPolicy::Automatic
        };
    }
    if subscription.deadline.is_best_available() {
        subscription.deadline = largest_deadline.unwrap_or(RmwTime::DEFAULT);
    }
    if subscription.liveliness_lease_duration.is_best_available() {
        subscription.liveliness_lease_duration = largest_lease.unwrap_or(RmwTime::DEFAULT);
    }
}

/// Resolve a publisher profile against the subscriptions already on its topic.
///
/// Reliable and transient local are offered unconditionally since they serve
/// every subscription. Deadline and lease follow the tightest request.
pub fn best_available_for_publisher<'a, I>(subscriptions: I, publisher: &mut QosProfile)
where
    I: IntoIterator<Item = &'a QosProfile>,
{
    if publisher.reliability == ReliabilityPolicy::BestAvailable {
        publisher.reliability = ReliabilityPolicy::Reliable;
    }
    if publisher.durability == DurabilityPolicy::BestAvailable {
        publisher.durability = DurabilityPolicy::TransientLocal;
    }

    let mut any_manual_by_topic = false;
    let mut smallest_deadline: Option<RmwTime> = None;
    let mut smallest_lease: Option<RmwTime> = None;

    for profile in subscriptions {
        any_manual_by_topic |= profile.liveliness == LivelinessPolicy::ManualByTopic;
        smallest_deadline = widest(smallest_deadline, profile.deadline, std::cmp::min);
        smallest_lease = widest(smallest_lease, profile.liveliness_lease_duration, std::cmp::min);
    }

    if publisher.liveliness == LivelinessPolicy::BestAvailable {
        publisher.liveliness = if any_manual_by_topic {
            LivelinessPolicy::ManualByTopic
        } else {
            LivelinessPolicy::Automatic
        };
    }
    if publisher.deadline.is_best_available() {
        publisher.deadline = smallest_deadline.unwrap_or(RmwTime::DEFAULT);
    }
    if publisher.liveliness_lease_duration.is_best_available() {
        publisher.liveliness_lease_duration = smallest_lease.unwrap_or(RmwTime::DEFAULT);
    }
}

/// Fold a peer period into the running pick, skipping unset periods.
fn widest(
    current: Option<RmwTime>,
    candidate: RmwTime,
    pick: fn(RmwTime, RmwTime) -> RmwTime,
) -> Option<RmwTime> {
    if candidate.is_default() {
        return current;
    }
    Some(current.map_or(candidate, |value| pick(value, candidate)))
}

/// Resolve a subscription on `topic_name` against the publishers found there.
///
/// `get_endpoint_info(topic_name, no_mangle)` is only called when the profile
/// has something to resolve; it is always asked for mangled names.
pub fn best_available_for_topic_subscription<F>(
    topic_name: &str,
    profile: &mut QosProfile,
    get_endpoint_info: F,
) -> Result<()>
where
    F: FnOnce(&str, bool) -> Result<Vec<TopicEndpointInfo>>,
{
    if topic_name.is_empty() {
        return Err(Error::InvalidArgument("topic_name is empty"));
    }
    if has_best_available_policy(profile) {
        let publishers = get_endpoint_info(topic_name, false)?;
        best_available_for_subscription(publishers.iter().map(|info| &info.qos_profile), profile);
    }
    Ok(())
}

/// Resolve a publisher on `topic_name` against the subscriptions found there.
pub fn best_available_for_topic_publisher<F>(
    topic_name: &str,
    profile: &mut QosProfile,
    get_endpoint_info: F,
) -> Result<()>
where
    F: FnOnce(&str, bool) -> Result<Vec<TopicEndpointInfo>>,
{
    if topic_name.is_empty() {
        return Err(Error::InvalidArgument("topic_name is empty"));
    }
    if has_best_available_policy(profile) {
        let subscriptions = get_endpoint_info(topic_name, false)?;
        best_available_for_publisher(subscriptions.iter().map(|info| &info.qos_profile), profile);
    }
    Ok(())
}

/// Replace best-available fields with the services default policies.
#[must_use]
pub fn update_best_available_for_services(profile: &QosProfile) -> QosProfile {
    let services = QosProfile::services_default();
    let mut result = *profile;

    if result.reliability == ReliabilityPolicy::BestAvailable {
        result.reliability = services.reliability;
    }
    if result.durability == DurabilityPolicy::BestAvailable {
        result.durability = services.durability;
    }
    if result.liveliness == LivelinessPolicy::BestAvailable {
        result.liveliness = services.liveliness;
    }
    if result.deadline.is_best_available() {
        result.deadline = services.deadline;
    }
    if result.liveliness_lease_duration.is_best_available() {
        result.liveliness_lease_duration = services.liveliness_lease_duration;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointType;
    use crate::gid::Gid;

    fn peer(
        reliability: ReliabilityPolicy,
        durability: DurabilityPolicy,
        deadline: RmwTime,
        liveliness: LivelinessPolicy,
        lease: RmwTime,
    ) -> QosProfile {
        QosProfile::default()
            .with_reliability(reliability)
            .with_durability(durability)
            .with_deadline(deadline)
            .with_liveliness(liveliness)
            .with_liveliness_lease_duration(lease)
    }

    #[test]
    fn subscription_without_publishers_gets_highest_level() {
        let mut sub = QosProfile::best_available();
        best_available_for_subscription(std::iter::empty(), &mut sub);

        assert_eq!(sub.reliability, ReliabilityPolicy::Reliable);
        assert_eq!(sub.durability, DurabilityPolicy::TransientLocal);
        assert_eq!(sub.liveliness, LivelinessPolicy::ManualByTopic);
        assert_eq!(sub.deadline, RmwTime::DEFAULT);
        assert_eq!(sub.liveliness_lease_duration, RmwTime::DEFAULT);
    }

    #[test]
    fn subscription_matches_single_publisher() {
        let publisher = peer(
            ReliabilityPolicy::BestEffort,
            DurabilityPolicy::TransientLocal,
            RmwTime::new(1, 0),
            LivelinessPolicy::ManualByTopic,
            RmwTime::new(2, 0),
        );
        let mut sub = QosProfile::best_available();
        best_available_for_subscription([&publisher], &mut sub);

        assert_eq!(sub.reliability, publisher.reliability);
        assert_eq!(sub.durability, publisher.durability);
        assert_eq!(sub.liveliness, publisher.liveliness);
        assert_eq!(sub.deadline, publisher.deadline);
        assert_eq!(sub.liveliness_lease_duration, publisher.liveliness_lease_duration);
    }

    #[test]
    fn subscription_follows_weakest_publisher() {
        let publishers = [
            peer(
                ReliabilityPolicy::Reliable,
                DurabilityPolicy::TransientLocal,
                RmwTime::DEFAULT,
                LivelinessPolicy::Automatic,
                RmwTime::new(1, 0),
            ),
            peer(
                ReliabilityPolicy::BestEffort,
                DurabilityPolicy::TransientLocal,
                RmwTime::new(3, 0),
                LivelinessPolicy::ManualByTopic,
                RmwTime::DEFAULT,
            ),
            peer(
                ReliabilityPolicy::Reliable,
                DurabilityPolicy::Volatile,
                RmwTime::new(2, 0),
                LivelinessPolicy::ManualByTopic,
                RmwTime::new(2, 0),
            ),
        ];
        let mut sub = QosProfile::best_available();
        best_available_for_subscription(&publishers, &mut sub);

        assert_eq!(sub.reliability, ReliabilityPolicy::BestEffort);
        assert_eq!(sub.durability, DurabilityPolicy::Volatile);
        assert_eq!(sub.liveliness, LivelinessPolicy::Automatic);
        assert_eq!(sub.deadline, RmwTime::new(3, 0));
        assert_eq!(sub.liveliness_lease_duration, RmwTime::new(2, 0));
    }

    #[test]
    fn publisher_without_subscriptions() {
        let mut publisher = QosProfile::best_available();
        best_available_for_publisher(std::iter::empty(), &mut publisher);

        assert_eq!(publisher.reliability, ReliabilityPolicy::Reliable);
        assert_eq!(publisher.durability, DurabilityPolicy::TransientLocal);
        assert_eq!(publisher.liveliness, LivelinessPolicy::Automatic);
        assert_eq!(publisher.deadline, RmwTime::DEFAULT);
        assert_eq!(publisher.liveliness_lease_duration, RmwTime::DEFAULT);
    }

    #[test]
    fn publisher_follows_strictest_subscription() {
        let subscriptions = [
            peer(
                ReliabilityPolicy::BestEffort,
                DurabilityPolicy::TransientLocal,
                RmwTime::DEFAULT,
                LivelinessPolicy::Automatic,
                RmwTime::new(1, 0),
            ),
            peer(
                ReliabilityPolicy::Reliable,
                DurabilityPolicy::Volatile,
                RmwTime::new(3, 0),
                LivelinessPolicy::ManualByTopic,
                RmwTime::DEFAULT,
            ),
            peer(
                ReliabilityPolicy::BestEffort,
                DurabilityPolicy::Volatile,
                RmwTime::new(2, 0),
                LivelinessPolicy::Automatic,
                RmwTime::new(2, 0),
            ),
        ];
        let mut publisher = QosProfile::best_available();
        best_available_for_publisher(&subscriptions, &mut publisher);

        assert_eq!(publisher.reliability, ReliabilityPolicy::Reliable);
        assert_eq!(publisher.durability, DurabilityPolicy::TransientLocal);
        assert_eq!(publisher.liveliness, LivelinessPolicy::ManualByTopic);
        assert_eq!(publisher.deadline, RmwTime::new(2, 0));
        assert_eq!(publisher.liveliness_lease_duration, RmwTime::new(1, 0));
    }

    #[test]
    fn concrete_fields_are_kept() {
        let publishers = [peer(
            ReliabilityPolicy::BestEffort,
            DurabilityPolicy::Volatile,
            RmwTime::new(5, 0),
            LivelinessPolicy::Automatic,
            RmwTime::new(5, 0),
        )];
        let mut sub = QosProfile::default()
            .with_durability(DurabilityPolicy::BestAvailable)
            .with_deadline(RmwTime::new(7, 0));
        best_available_for_subscription(&publishers, &mut sub);

        assert_eq!(sub.reliability, ReliabilityPolicy::Reliable);
        assert_eq!(sub.durability, DurabilityPolicy::Volatile);
        assert_eq!(sub.deadline, RmwTime::new(7, 0));
        assert_eq!(sub.liveliness, LivelinessPolicy::SystemDefault);
    }

    #[test]
    fn detects_best_available_fields() {
        assert!(!has_best_available_policy(&QosProfile::default()));
        assert!(has_best_available_policy(&QosProfile::best_available()));
        assert!(has_best_available_policy(
            &QosProfile::default().with_liveliness_lease_duration(RmwTime::BEST_AVAILABLE)
        ));
        assert!(has_best_available_policy(
            &QosProfile::default().with_liveliness(LivelinessPolicy::BestAvailable)
        ));
    }

    #[test]
    fn services_replace_best_available_with_defaults() {
        let profile = QosProfile::best_available().with_durability(DurabilityPolicy::TransientLocal);
        let resolved = update_best_available_for_services(&profile);
        let services = QosProfile::services_default();

        assert_eq!(resolved.reliability, services.reliability);
        assert_eq!(resolved.durability, DurabilityPolicy::TransientLocal);
        assert_eq!(resolved.liveliness, services.liveliness);
        assert_eq!(resolved.deadline, services.deadline);
        assert_eq!(resolved.liveliness_lease_duration, services.liveliness_lease_duration);
        assert!(!has_best_available_policy(&resolved));
    }

    fn endpoint(qos_profile: QosProfile) -> TopicEndpointInfo {
        TopicEndpointInfo {
            node_name: "node".to_string(),
            node_namespace: "/".to_string(),
            topic_type: "type".to_string(),
            endpoint_type: EndpointType::Publisher,
            endpoint_gid: Gid::default(),
            qos_profile,
        }
    }

    #[test]
    fn topic_entry_point_queries_only_when_needed() {
        let mut profile = QosProfile::default();
        best_available_for_topic_subscription("rt/chatter", &mut profile, |_, _| {
            panic!("no lookup expected for a concrete profile")
        })
        .expect("resolve");
        assert_eq!(profile, QosProfile::default());

        let mut profile = QosProfile::best_available();
        best_available_for_topic_subscription("rt/chatter", &mut profile, |topic, no_mangle| {
            assert_eq!(topic, "rt/chatter");
            assert!(!no_mangle);
            Ok(vec![endpoint(
                QosProfile::default().with_reliability(ReliabilityPolicy::BestEffort),
            )])
        })
        .expect("resolve");
        assert_eq!(profile.reliability, ReliabilityPolicy::BestEffort);
    }

    #[test]
    fn topic_entry_point_rejects_empty_topic_and_propagates_errors() {
        let mut profile = QosProfile::best_available();
        let err = best_available_for_topic_publisher("", &mut profile, |_, _| Ok(Vec::new()))
            .expect_err("empty topic");
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = best_available_for_topic_publisher("rt/chatter", &mut profile, |_, _| {
            Err(Error::InvalidArgument("lookup failed"))
        })
        .expect_err("lookup error");
        assert!(matches!(err, Error::InvalidArgument("lookup failed")));
        assert_eq!(profile, QosProfile::best_available());
    }
}
