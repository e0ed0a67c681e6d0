// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ROS graph cache: discovered DDS endpoints plus node associations.
//!
//! Writers and readers come from DDS discovery and are keyed by their own GID.
//! Which node owns which endpoint is only known through the gossip messages
//! ([`ParticipantEntitiesInfo`]) each participant publishes, so node lists
//! refer to endpoints by GID and every lookup tolerates GIDs that have no
//! endpoint record (yet, or anymore).
//!
//! One mutex guards the whole cache. Each call is atomic; callers that need a
//! mutation and its publication to be atomic hold their own lock around both
//! (see [`crate::Context`]).

use crate::endpoint::{EndpointType, TopicEndpointInfo};
use crate::gid::Gid;
use crate::msg::{NodeEntitiesInfo, ParticipantEntitiesInfo};
use crate::qos::QosProfile;
use crate::{Error, NamesAndTypes, Result};
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Node name reported for endpoints whose owner is not known.
pub const NODE_NAME_UNKNOWN: &str = "_NODE_NAME_UNKNOWN_";
/// Node namespace reported for endpoints whose owner is not known.
pub const NODE_NAMESPACE_UNKNOWN: &str = "_NODE_NAMESPACE_UNKNOWN_";

/// Discovered writer or reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityInfo {
    pub topic_name: String,
    pub topic_type: String,
    pub participant_gid: Gid,
    pub qos: QosProfile,
}

impl EntityInfo {
    #[must_use]
    pub fn new(topic_name: &str, topic_type: &str, participant_gid: Gid, qos: QosProfile) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            topic_type: topic_type.to_string(),
            participant_gid,
            qos,
        }
    }
}

pub type EntityGidToInfo = BTreeMap<Gid, EntityInfo>;
pub type ParticipantToNodesMap = BTreeMap<Gid, Vec<NodeEntitiesInfo>>;

type OnChangeCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct GraphState {
    data_writers: EntityGidToInfo,
    data_readers: EntityGidToInfo,
    participants: ParticipantToNodesMap,
}

impl GraphState {
    fn entities(&self, is_reader: bool) -> &EntityGidToInfo {
        if is_reader {
            &self.data_readers
        } else {
            &self.data_writers
        }
    }

    fn entities_mut(&mut self, is_reader: bool) -> &mut EntityGidToInfo {
        if is_reader {
            &mut self.data_readers
        } else {
            &mut self.data_writers
        }
    }

    fn nodes_mut(&mut self, participant_gid: Gid) -> &mut Vec<NodeEntitiesInfo> {
        self.participants
            .get_mut(&participant_gid)
            .unwrap_or_else(|| panic!("participant {participant_gid} was never added to the graph"))
    }

    /// Apply `modify` to a node of a local participant and snapshot the result.
    fn modify_node<F>(
        &mut self,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
        modify: F,
    ) -> ParticipantEntitiesInfo
    where
        F: FnOnce(&mut NodeEntitiesInfo),
    {
        let nodes = self.nodes_mut(participant_gid);
        let node = nodes
            .iter_mut()
            .find(|node| node.is(node_name, node_namespace))
            .unwrap_or_else(|| {
                panic!(
                    "node '{node_name}' in namespace '{node_namespace}' was never added to participant {participant_gid}"
                )
            });
        modify(node);
        ParticipantEntitiesInfo::new(participant_gid, nodes.clone())
    }

    fn find_node(&self, node_name: &str, node_namespace: &str) -> Option<&NodeEntitiesInfo> {
        self.participants
            .values()
            .flatten()
            .find(|node| node.is(node_name, node_namespace))
    }

    /// Node of `participant_gid` owning endpoint `gid`, if announced.
    fn owner_of(&self, participant_gid: Gid, gid: Gid, is_reader: bool) -> Option<&NodeEntitiesInfo> {
        self.participants.get(&participant_gid)?.iter().find(|node| {
            let gids = if is_reader {
                &node.reader_gids
            } else {
                &node.writer_gids
            };
            gids.contains(&gid)
        })
    }

    fn count(&self, topic_name: &str, is_reader: bool) -> usize {
        self.entities(is_reader)
            .values()
            .filter(|info| info.topic_name == topic_name)
            .count()
    }

    fn info_by_topic(
        &self,
        topic_name: &str,
        demangle_type: &dyn Fn(&str) -> String,
        is_reader: bool,
    ) -> Vec<TopicEndpointInfo> {
        let endpoint_type = if is_reader {
            EndpointType::Subscription
        } else {
            EndpointType::Publisher
        };

        self.entities(is_reader)
            .iter()
            .filter(|(_, info)| info.topic_name == topic_name)
            .map(|(gid, info)| {
                let (node_name, node_namespace) =
                    match self.owner_of(info.participant_gid, *gid, is_reader) {
                        Some(node) => (node.node_name.clone(), node.node_namespace.clone()),
                        None => (
                            NODE_NAME_UNKNOWN.to_string(),
                            NODE_NAMESPACE_UNKNOWN.to_string(),
                        ),
                    };
                TopicEndpointInfo {
                    node_name,
                    node_namespace,
                    topic_type: demangle_type(&info.topic_type),
                    endpoint_type,
                    endpoint_gid: *gid,
                    qos_profile: info.qos,
                }
            })
            .collect()
    }

    fn names_and_types_by_node(
        &self,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: &dyn Fn(&str) -> String,
        demangle_type: &dyn Fn(&str) -> String,
        is_reader: bool,
    ) -> Result<NamesAndTypes> {
        let node = self
            .find_node(node_name, node_namespace)
            .ok_or_else(|| Error::NodeNameNonExistent {
                name: node_name.to_string(),
                namespace: node_namespace.to_string(),
            })?;
        let (gids, entities) = if is_reader {
            (&node.reader_gids, &self.data_readers)
        } else {
            (&node.writer_gids, &self.data_writers)
        };

        let mut topics = NamesAndTypes::new();
        for info in gids.iter().filter_map(|gid| entities.get(gid)) {
            insert_demangled(&mut topics, info, demangle_topic, demangle_type);
        }
        Ok(topics)
    }
}

fn insert_demangled(
    topics: &mut NamesAndTypes,
    info: &EntityInfo,
    demangle_topic: &dyn Fn(&str) -> String,
    demangle_type: &dyn Fn(&str) -> String,
) {
    let topic = demangle_topic(&info.topic_name);
    if topic.is_empty() {
        return;
    }
    topics
        .entry(topic)
        .or_default()
        .insert(demangle_type(&info.topic_type));
}

/// Local view of the ROS graph.
#[derive(Default)]
pub struct GraphCache {
    state: Mutex<GraphState>,
    on_change: Mutex<Option<OnChangeCallback>>,
    deferred: AtomicUsize,
    pending_change: AtomicBool,
}

/// Ends a deferral window opened by [`GraphCache::deferring_notifications`].
struct DeferGuard<'a> {
    cache: &'a GraphCache,
}

impl Drop for DeferGuard<'_> {
    fn drop(&mut self) {
        if self.cache.deferred.fetch_sub(1, Ordering::AcqRel) == 1
            && self.cache.pending_change.swap(false, Ordering::AcqRel)
        {
            self.cache.run_on_change();
        }
    }
}

impl GraphCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a callback run after every mutation, outside the cache lock.
    ///
    /// Mutations made through [`crate::Context`] notify once, after their
    /// announcement was published or rolled back, so the callback never
    /// observes an entity that was not announced.
    pub fn set_on_change_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_change.lock() = Some(Arc::new(callback));
    }

    pub fn clear_on_change_callback(&self) {
        *self.on_change.lock() = None;
    }

    fn notify(&self) {
        if self.deferred.load(Ordering::Acquire) > 0 {
            self.pending_change.store(true, Ordering::Release);
            // The window may have closed before the flag was set.
            if self.deferred.load(Ordering::Acquire) > 0
                || !self.pending_change.swap(false, Ordering::AcqRel)
            {
                return;
            }
        }
        self.run_on_change();
    }

    fn run_on_change(&self) {
        let callback = self.on_change.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Run `f` with change notifications held back; at most one fires at the end.
    ///
    /// Notifications raised by other threads meanwhile are delayed too, never
    /// dropped.
    pub(crate) fn deferring_notifications<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        self.deferred.fetch_add(1, Ordering::AcqRel);
        let _guard = DeferGuard { cache: self };
        f(self)
    }

    /// Record a discovered writer. Returns `false` if the GID is already known.
    pub fn add_writer(
        &self,
        gid: Gid,
        topic_name: &str,
        type_name: &str,
        participant_gid: Gid,
        qos: QosProfile,
    ) -> bool {
        self.add_entity(gid, topic_name, type_name, participant_gid, qos, false)
    }

    /// Record a discovered reader. Returns `false` if the GID is already known.
    pub fn add_reader(
        &self,
        gid: Gid,
        topic_name: &str,
        type_name: &str,
        participant_gid: Gid,
        qos: QosProfile,
    ) -> bool {
        self.add_entity(gid, topic_name, type_name, participant_gid, qos, true)
    }

    pub fn add_entity(
        &self,
        gid: Gid,
        topic_name: &str,
        type_name: &str,
        participant_gid: Gid,
        qos: QosProfile,
        is_reader: bool,
    ) -> bool {
        let added = {
            let mut guard = self.state.lock();
            match guard.entities_mut(is_reader).entry(gid) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(EntityInfo::new(topic_name, type_name, participant_gid, qos));
                    true
                }
            }
        };

        if added {
            log::debug!(
                "[graph] add {} {} topic='{}' type='{}' participant={}",
                if is_reader { "reader" } else { "writer" },
                gid,
                topic_name,
                type_name,
                participant_gid
            );
            self.notify();
        }
        added
    }

    pub fn remove_writer(&self, gid: Gid) -> bool {
        self.remove_entity(gid, false)
    }

    pub fn remove_reader(&self, gid: Gid) -> bool {
        self.remove_entity(gid, true)
    }

    /// Forget a writer or reader. Returns `false` if it was not known.
    pub fn remove_entity(&self, gid: Gid, is_reader: bool) -> bool {
        let removed = self.state.lock().entities_mut(is_reader).remove(&gid).is_some();
        if removed {
            log::debug!(
                "[graph] remove {} {}",
                if is_reader { "reader" } else { "writer" },
                gid
            );
            self.notify();
        }
        removed
    }

    /// Register a participant with no nodes. Already known participants are kept.
    pub fn add_participant(&self, participant_gid: Gid) {
        let added = match self.state.lock().participants.entry(participant_gid) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Vec::new());
                true
            }
        };
        if added {
            log::debug!("[graph] add participant {}", participant_gid);
            self.notify();
        }
    }

    pub fn remove_participant(&self, participant_gid: Gid) -> bool {
        let removed = self
            .state
            .lock()
            .participants
            .remove(&participant_gid)
            .is_some();
        if removed {
            log::debug!("[graph] remove participant {}", participant_gid);
            self.notify();
        }
        removed
    }

    /// Install the node list announced by a participant.
    ///
    /// The message replaces whatever was known about that participant. An
    /// empty node list removes the participant.
    pub fn update_participant_entities(&self, msg: &ParticipantEntitiesInfo) {
        {
            let mut guard = self.state.lock();
            if msg.nodes.is_empty() {
                guard.participants.remove(&msg.gid);
            } else {
                guard.participants.insert(msg.gid, msg.nodes.clone());
            }
        }
        log::debug!(
            "[graph] participant {} announced {} node(s)",
            msg.gid,
            msg.nodes.len()
        );
        self.notify();
    }

    /// Snapshot of the nodes of one participant.
    #[must_use]
    pub fn participant_entities(&self, participant_gid: Gid) -> Option<ParticipantEntitiesInfo> {
        self.state
            .lock()
            .participants
            .get(&participant_gid)
            .map(|nodes| ParticipantEntitiesInfo::new(participant_gid, nodes.clone()))
    }

    /// Overwrite the node list of a participant, keeping it even when empty.
    pub(crate) fn restore_participant_nodes(&self, participant_gid: Gid, nodes: Vec<NodeEntitiesInfo>) {
        self.state.lock().participants.insert(participant_gid, nodes);
        self.notify();
    }

    /// Add a node to a local participant.
    ///
    /// # Panics
    ///
    /// If `participant_gid` was never added.
    pub fn add_node(
        &self,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let msg = {
            let mut guard = self.state.lock();
            let nodes = guard.nodes_mut(participant_gid);
            nodes.push(NodeEntitiesInfo::new(node_name, node_namespace));
            ParticipantEntitiesInfo::new(participant_gid, nodes.clone())
        };
        log::debug!(
            "[graph] add node ns='{}' name='{}' to participant {}",
            node_namespace,
            node_name,
            participant_gid
        );
        self.notify();
        msg
    }

    /// Remove a node from a local participant.
    ///
    /// # Panics
    ///
    /// If `participant_gid` was never added.
    pub fn remove_node(
        &self,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        let (msg, removed) = {
            let mut guard = self.state.lock();
            let nodes = guard.nodes_mut(participant_gid);
            let before = nodes.len();
            nodes.retain(|node| !node.is(node_name, node_namespace));
            let removed = nodes.len() != before;
            (ParticipantEntitiesInfo::new(participant_gid, nodes.clone()), removed)
        };

        if removed {
            log::debug!(
                "[graph] remove node ns='{}' name='{}' from participant {}",
                node_namespace,
                node_name,
                participant_gid
            );
            self.notify();
        } else {
            log::warn!(
                "[graph] remove_node: node ns='{}' name='{}' not found in participant {}",
                node_namespace,
                node_name,
                participant_gid
            );
        }
        msg
    }

    /// Record that a node owns `writer_gid`.
    ///
    /// # Panics
    ///
    /// If the participant or the node was never added.
    pub fn associate_writer(
        &self,
        writer_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.associate(writer_gid, participant_gid, node_name, node_namespace, false)
    }

    /// Record that a node no longer owns `writer_gid`. Unknown GIDs are ignored.
    ///
    /// # Panics
    ///
    /// If the participant or the node was never added.
    pub fn dissociate_writer(
        &self,
        writer_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.dissociate(writer_gid, participant_gid, node_name, node_namespace, false)
    }

    /// Record that a node owns `reader_gid`.
    ///
    /// # Panics
    ///
    /// If the participant or the node was never added.
    pub fn associate_reader(
        &self,
        reader_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.associate(reader_gid, participant_gid, node_name, node_namespace, true)
    }

    /// Record that a node no longer owns `reader_gid`. Unknown GIDs are ignored.
    ///
    /// # Panics
    ///
    /// If the participant or the node was never added.
    pub fn dissociate_reader(
        &self,
        reader_gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
    ) -> ParticipantEntitiesInfo {
        self.dissociate(reader_gid, participant_gid, node_name, node_namespace, true)
    }

    fn associate(
        &self,
        gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
        is_reader: bool,
    ) -> ParticipantEntitiesInfo {
        let msg = self
            .state
            .lock()
            .modify_node(participant_gid, node_name, node_namespace, |node| {
                if is_reader {
                    node.reader_gids.push(gid);
                } else {
                    node.writer_gids.push(gid);
                }
            });
        log::debug!(
            "[graph] associate {} {} with node ns='{}' name='{}'",
            if is_reader { "reader" } else { "writer" },
            gid,
            node_namespace,
            node_name
        );
        self.notify();
        msg
    }

    fn dissociate(
        &self,
        gid: Gid,
        participant_gid: Gid,
        node_name: &str,
        node_namespace: &str,
        is_reader: bool,
    ) -> ParticipantEntitiesInfo {
        let msg = self
            .state
            .lock()
            .modify_node(participant_gid, node_name, node_namespace, |node| {
                let gids = if is_reader {
                    &mut node.reader_gids
                } else {
                    &mut node.writer_gids
                };
                if let Some(index) = gids.iter().position(|candidate| *candidate == gid) {
                    gids.remove(index);
                }
            });
        log::debug!(
            "[graph] dissociate {} {} from node ns='{}' name='{}'",
            if is_reader { "reader" } else { "writer" },
            gid,
            node_namespace,
            node_name
        );
        self.notify();
        msg
    }

    /// Writers whose stored topic name is exactly `topic_name`.
    #[must_use]
    pub fn get_writer_count(&self, topic_name: &str) -> usize {
        self.state.lock().count(topic_name, false)
    }

    /// Readers whose stored topic name is exactly `topic_name`.
    #[must_use]
    pub fn get_reader_count(&self, topic_name: &str) -> usize {
        self.state.lock().count(topic_name, true)
    }

    /// Demangled topic names and types of every known writer and reader.
    pub fn get_names_and_types<T, Y>(&self, demangle_topic: T, demangle_type: Y) -> NamesAndTypes
    where
        T: Fn(&str) -> String,
        Y: Fn(&str) -> String,
    {
        let guard = self.state.lock();
        let mut topics = NamesAndTypes::new();
        for info in guard.data_readers.values().chain(guard.data_writers.values()) {
            insert_demangled(&mut topics, info, &demangle_topic, &demangle_type);
        }
        topics
    }

    /// Topics the node publishes on.
    ///
    /// The first node matching `(name, namespace)` is used when several
    /// participants host one with the same name.
    pub fn get_writer_names_and_types_by_node<T, Y>(
        &self,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: T,
        demangle_type: Y,
    ) -> Result<NamesAndTypes>
    where
        T: Fn(&str) -> String,
        Y: Fn(&str) -> String,
    {
        self.state.lock().names_and_types_by_node(
            node_name,
            node_namespace,
            &demangle_topic,
            &demangle_type,
            false,
        )
    }

    /// Topics the node subscribes to.
    pub fn get_reader_names_and_types_by_node<T, Y>(
        &self,
        node_name: &str,
        node_namespace: &str,
        demangle_topic: T,
        demangle_type: Y,
    ) -> Result<NamesAndTypes>
    where
        T: Fn(&str) -> String,
        Y: Fn(&str) -> String,
    {
        self.state.lock().names_and_types_by_node(
            node_name,
            node_namespace,
            &demangle_topic,
            &demangle_type,
            true,
        )
    }

    /// Publishers on `topic_name`, with their owning node when known.
    pub fn get_writers_info_by_topic<Y>(
        &self,
        topic_name: &str,
        demangle_type: Y,
    ) -> Vec<TopicEndpointInfo>
    where
        Y: Fn(&str) -> String,
    {
        self.state.lock().info_by_topic(topic_name, &demangle_type, false)
    }

    /// Subscriptions on `topic_name`, with their owning node when known.
    pub fn get_readers_info_by_topic<Y>(
        &self,
        topic_name: &str,
        demangle_type: Y,
    ) -> Vec<TopicEndpointInfo>
    where
        Y: Fn(&str) -> String,
    {
        self.state.lock().info_by_topic(topic_name, &demangle_type, true)
    }

    #[must_use]
    pub fn get_number_of_nodes(&self) -> usize {
        self.state.lock().participants.values().map(Vec::len).sum()
    }

    /// Names and namespaces of every node, in participant order.
    #[must_use]
    pub fn get_node_names(&self) -> (Vec<String>, Vec<String>) {
        self.state
            .lock()
            .participants
            .values()
            .flatten()
            .map(|node| (node.node_name.clone(), node.node_namespace.clone()))
            .unzip()
    }
}

impl fmt::Display for GraphCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();

        writeln!(f, "---------------------------------")?;
        writeln!(f, "Graph cache:")?;
        writeln!(f, "  Discovered data writers:")?;
        for (gid, info) in &guard.data_writers {
            writeln!(
                f,
                "    gid: '{gid}', topic name: '{}', topic_type: '{}'",
                info.topic_name, info.topic_type
            )?;
        }
        writeln!(f, "  Discovered data readers:")?;
        for (gid, info) in &guard.data_readers {
            writeln!(
                f,
                "    gid: '{gid}', topic name: '{}', topic_type: '{}'",
                info.topic_name, info.topic_type
            )?;
        }
        writeln!(f, "  Discovered participants:")?;
        for (gid, nodes) in &guard.participants {
            writeln!(f, "    gid: '{gid}'")?;
            writeln!(f, "    nodes:")?;
            for node in nodes {
                writeln!(
                    f,
                    "      namespace: '{}' name: '{}'",
                    node.node_namespace, node.node_name
                )?;
                writeln!(f, "      associated data readers gids:")?;
                for reader in &node.reader_gids {
                    writeln!(f, "        {reader}")?;
                }
                writeln!(f, "      associated data writers gids:")?;
                for writer in &node.writer_gids {
                    writeln!(f, "        {writer}")?;
                }
            }
        }
        writeln!(f, "---------------------------------")
    }
}
