// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference-counted topic/type bookkeeping per participant and node.
//!
//! Each `(topic, type)` occurrence is stored once per `add_topic` call, so a
//! tuple added twice must be removed twice. Entries are pruned as soon as they
//! empty out; the maps never hold empty containers.

use crate::gid::Gid;
use crate::{Error, NamesAndTypes, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;

/// `(namespace, node name)`.
pub type NamespaceNamePair = (String, String);
/// Topic name to every type recorded on it, one entry per occurrence.
pub type TopicToTypes = BTreeMap<String, Vec<String>>;
pub type NodeTopicMap = BTreeMap<NamespaceNamePair, TopicToTypes>;
pub type ParticipantNodeMap = BTreeMap<Gid, NodeTopicMap>;

#[derive(Default)]
struct TopicCacheState {
    topic_to_types: TopicToTypes,
    participant_to_nodes_to_topics: ParticipantNodeMap,
}

/// Topic cache for layers that do not track node/entity associations.
#[derive(Default)]
pub struct TopicCache {
    state: Mutex<TopicCacheState>,
}

impl TopicCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the topic to types multiset.
    #[must_use]
    pub fn get_topic_to_types(&self) -> TopicToTypes {
        self.state.lock().topic_to_types.clone()
    }

    /// Snapshot of the participant to node to topic to types multiset.
    #[must_use]
    pub fn get_participant_to_nodes_to_topics(&self) -> ParticipantNodeMap {
        self.state.lock().participant_to_nodes_to_topics.clone()
    }

    /// Record one occurrence of `type_name` on `topic_name` for the given node.
    pub fn add_topic(
        &self,
        gid: Gid,
        namespace: &str,
        node_name: &str,
        topic_name: &str,
        type_name: &str,
    ) -> bool {
        let mut guard = self.state.lock();

        log::debug!(
            "[topic_cache] add topic '{}' type '{}' for node ns='{}' name='{}' of participant {}",
            topic_name,
            type_name,
            namespace,
            node_name,
            gid
        );

        guard
            .topic_to_types
            .entry(topic_name.to_string())
            .or_default()
            .push(type_name.to_string());
        guard
            .participant_to_nodes_to_topics
            .entry(gid)
            .or_default()
            .entry((namespace.to_string(), node_name.to_string()))
            .or_default()
            .entry(topic_name.to_string())
            .or_default()
            .push(type_name.to_string());
        true
    }

    /// Drop one occurrence recorded by [`TopicCache::add_topic`].
    ///
    /// Returns `false`, leaving the cache untouched, if this node of `gid`
    /// never recorded `type_name` on `topic_name`.
    pub fn remove_topic(
        &self,
        gid: Gid,
        namespace: &str,
        node_name: &str,
        topic_name: &str,
        type_name: &str,
    ) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let key = (namespace.to_string(), node_name.to_string());
        let Some(nodes) = state.participant_to_nodes_to_topics.get_mut(&gid) else {
            log::warn!(
                "[topic_cache] unexpected removal on topic '{}' with type '{}': unknown participant {}",
                topic_name,
                type_name,
                gid
            );
            return false;
        };
        let removed = nodes
            .get_mut(&key)
            .is_some_and(|topics| remove_one(topics, topic_name, type_name));
        if !removed {
            log::warn!(
                "[topic_cache] unexpected removal on topic '{}' with type '{}' for node ns='{}' name='{}' of participant {}",
                topic_name,
                type_name,
                namespace,
                node_name,
                gid
            );
            return false;
        }

        if nodes.get(&key).is_some_and(BTreeMap::is_empty) {
            nodes.remove(&key);
        }
        if nodes.is_empty() {
            state.participant_to_nodes_to_topics.remove(&gid);
        }

        // Every node occurrence is mirrored in the global multiset.
        if !remove_one(&mut state.topic_to_types, topic_name, type_name) {
            log::error!(
                "[topic_cache] topic '{}' type '{}' missing from the global map",
                topic_name,
                type_name
            );
        }

        log::debug!(
            "[topic_cache] removed topic '{}' type '{}' for participant {}",
            topic_name,
            type_name,
            gid
        );
        true
    }

    /// Number of type occurrences recorded on the mangled form of `topic_name`.
    pub fn get_count<M>(&self, topic_name: &str, mangle_topic: M) -> Result<usize>
    where
        M: Fn(&str) -> String,
    {
        let mangled = mangle_topic(topic_name);
        if mangled.is_empty() {
            return Err(Error::InvalidArgument("topic name mangles to an empty string"));
        }
        let guard = self.state.lock();
        Ok(guard.topic_to_types.get(&mangled).map_or(0, Vec::len))
    }

    /// Demangled names and types of every recorded topic.
    ///
    /// Topics that demangle to an empty string are not ROS topics and are skipped.
    pub fn get_names_and_types<T, Y>(&self, demangle_topic: T, demangle_type: Y) -> NamesAndTypes
    where
        T: Fn(&str) -> String,
        Y: Fn(&str) -> String,
    {
        let guard = self.state.lock();
        collect_names_and_types(&guard.topic_to_types, &demangle_topic, &demangle_type)
    }

    /// Demangled names and types recorded for one node of one participant.
    ///
    /// An unknown participant or node yields an empty result.
    pub fn get_names_and_types_by_node<T, Y>(
        &self,
        gid: Gid,
        node_name: &str,
        namespace: &str,
        demangle_topic: T,
        demangle_type: Y,
    ) -> NamesAndTypes
    where
        T: Fn(&str) -> String,
        Y: Fn(&str) -> String,
    {
        let guard = self.state.lock();
        let key = (namespace.to_string(), node_name.to_string());
        guard
            .participant_to_nodes_to_topics
            .get(&gid)
            .and_then(|nodes| nodes.get(&key))
            .map(|topics| collect_names_and_types(topics, &demangle_topic, &demangle_type))
            .unwrap_or_default()
    }
}

fn remove_one(topics: &mut TopicToTypes, topic_name: &str, type_name: &str) -> bool {
    let Some(types) = topics.get_mut(topic_name) else {
        return false;
    };
    let Some(index) = types.iter().position(|ty| ty == type_name) else {
        return false;
    };
    types.remove(index);
    if types.is_empty() {
        topics.remove(topic_name);
    }
    true
}

fn collect_names_and_types(
    topics: &TopicToTypes,
    demangle_topic: &dyn Fn(&str) -> String,
    demangle_type: &dyn Fn(&str) -> String,
) -> NamesAndTypes {
    let mut result = NamesAndTypes::new();
    for (topic, types) in topics {
        let name = demangle_topic(topic);
        if name.is_empty() {
            continue;
        }
        result
            .entry(name)
            .or_default()
            .extend(types.iter().map(|ty| demangle_type(ty)));
    }
    result
}

impl fmt::Display for TopicCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();

        writeln!(f, "Participant Info:")?;
        for (gid, nodes) in &guard.participant_to_nodes_to_topics {
            writeln!(f, "  gid: {gid}")?;
            for ((namespace, name), topics) in nodes {
                writeln!(f, "    Node:")?;
                writeln!(f, "      ns='{namespace}'")?;
                writeln!(f, "      name='{name}'")?;
                writeln!(f, "      Topics:")?;
                for (topic, types) in topics {
                    writeln!(f, "        {topic}: {}", types.join(","))?;
                }
            }
        }

        writeln!(f, "Cumulative TopicToTypes:")?;
        for (topic, types) in &guard.topic_to_types {
            writeln!(f, "  {topic}: {}", types.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity_demangle;

    fn gid(text: &str) -> Gid {
        let mut bytes = [0u8; 24];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Gid::new(bytes)
    }

    fn occurrences(topics: &TopicToTypes) -> usize {
        topics.values().map(Vec::len).sum()
    }

    fn node_occurrences(participants: &ParticipantNodeMap) -> usize {
        participants
            .values()
            .flat_map(BTreeMap::values)
            .map(occurrences)
            .sum()
    }

    #[test]
    fn add_remove_one_topic() {
        let cache = TopicCache::new();
        let gid = gid("my_fake_gid");

        assert!(cache.add_topic(gid, "my_ns", "my_node", "my_topic", "my_type"));
        let topics = cache.get_topic_to_types();
        assert_eq!(topics["my_topic"], vec!["my_type".to_string()]);
        assert_eq!(occurrences(&topics), 1);

        let participants = cache.get_participant_to_nodes_to_topics();
        let key = ("my_ns".to_string(), "my_node".to_string());
        assert_eq!(participants[&gid][&key]["my_topic"], vec!["my_type".to_string()]);
        assert_eq!(node_occurrences(&participants), 1);

        assert!(cache.remove_topic(gid, "my_ns", "my_node", "my_topic", "my_type"));
        assert!(cache.get_topic_to_types().is_empty());
        assert!(cache.get_participant_to_nodes_to_topics().is_empty());
    }

    #[test]
    fn add_remove_multiple_topics() {
        let cache = TopicCache::new();
        let gid0 = gid("gid0");
        let gid1 = gid("gid1");
        let tuples = [
            (gid0, "ns", "node0", "topic0", "type0"),
            (gid0, "ns", "node0", "topic0", "type0"),
            (gid0, "ns", "node1", "topic0", "type0"),
            (gid0, "ns", "node1", "topic1", "type0"),
            (gid0, "ns", "node1", "topic1", "type1"),
            (gid1, "ns", "node2", "topic2", "type2"),
            (gid1, "ns", "node2", "topic3", "type3"),
        ];

        for (gid, ns, node, topic, ty) in tuples {
            cache.add_topic(gid, ns, node, topic, ty);
        }
        assert_eq!(occurrences(&cache.get_topic_to_types()), 7);
        assert_eq!(node_occurrences(&cache.get_participant_to_nodes_to_topics()), 7);
        assert_eq!(cache.get_count("topic0", identity_demangle).expect("count"), 3);
        assert_eq!(cache.get_count("missing", identity_demangle).expect("count"), 0);

        for (gid, ns, node, topic, ty) in tuples {
            assert!(cache.remove_topic(gid, ns, node, topic, ty));
        }
        assert!(cache.get_topic_to_types().is_empty());
        assert!(cache.get_participant_to_nodes_to_topics().is_empty());
    }

    #[test]
    fn removing_unknown_topic_or_type_fails() {
        let cache = TopicCache::new();
        let gid = gid("gid");
        assert!(!cache.remove_topic(gid, "ns", "node", "topic", "type"));

        cache.add_topic(gid, "ns", "node", "topic", "type");
        assert!(!cache.remove_topic(gid, "ns", "node", "topic", "other_type"));
        assert_eq!(occurrences(&cache.get_topic_to_types()), 1);
    }

    #[test]
    fn removing_from_another_node_leaves_counts_intact() {
        let cache = TopicCache::new();
        let owner = gid("owner");
        let stranger = gid("stranger");
        cache.add_topic(owner, "ns", "node", "topic", "type");

        assert!(!cache.remove_topic(stranger, "ns", "node", "topic", "type"));
        assert!(!cache.remove_topic(owner, "ns", "other_node", "topic", "type"));
        assert!(!cache.remove_topic(owner, "other_ns", "node", "topic", "type"));
        assert_eq!(occurrences(&cache.get_topic_to_types()), 1);
        assert_eq!(node_occurrences(&cache.get_participant_to_nodes_to_topics()), 1);
        assert_eq!(cache.get_count("topic", identity_demangle).expect("count"), 1);

        assert!(cache.remove_topic(owner, "ns", "node", "topic", "type"));
        assert!(cache.get_topic_to_types().is_empty());
        assert!(cache.get_participant_to_nodes_to_topics().is_empty());
    }

    #[test]
    fn get_count_rejects_empty_mangled_name() {
        let cache = TopicCache::new();
        let err = cache.get_count("topic", |_| String::new()).expect_err("empty");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn names_and_types_apply_demangling() {
        let cache = TopicCache::new();
        let participant = gid("gid");
        cache.add_topic(participant, "/", "talker", "rt/chatter", "std_msgs::msg::dds_::String_");
        cache.add_topic(participant, "/", "talker", "rt/chatter", "std_msgs::msg::dds_::String_");
        cache.add_topic(participant, "/", "talker", "DCPSInternal", "internal");
        cache.add_topic(participant, "/", "listener", "rt/rosout", "rcl_interfaces::msg::dds_::Log_");

        let demangle_topic = |name: &str| name.strip_prefix("rt").unwrap_or_default().to_string();
        let demangle_type = |name: &str| name.replace("::dds_::", "::").trim_end_matches('_').to_string();

        let all = cache.get_names_and_types(demangle_topic, demangle_type);
        assert_eq!(all.len(), 2);
        assert_eq!(
            all["/chatter"].iter().collect::<Vec<_>>(),
            vec!["std_msgs::msg::String"]
        );

        let by_node =
            cache.get_names_and_types_by_node(participant, "talker", "/", demangle_topic, demangle_type);
        assert_eq!(by_node.keys().collect::<Vec<_>>(), vec!["/chatter"]);

        assert!(cache
            .get_names_and_types_by_node(participant, "ghost", "/", demangle_topic, demangle_type)
            .is_empty());
        assert!(cache
            .get_names_and_types_by_node(gid("other"), "talker", "/", demangle_topic, demangle_type)
            .is_empty());
    }

    #[test]
    fn display_lists_participants_and_topics() {
        let cache = TopicCache::new();
        cache.add_topic(gid("gid"), "ns", "node", "topic", "type");
        let dump = cache.to_string();
        assert!(dump.contains("Participant Info:"));
        assert!(dump.contains("name='node'"));
        assert!(dump.contains("  topic: type"));
    }
}
