// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Graph cache and QoS reconciliation shared by DDS-based rmw layers.
//!
//! Every participant announces the nodes it hosts, and which DDS readers and
//! writers each node owns, through a gossip message
//! ([`ParticipantEntitiesInfo`]). This crate keeps the local view of that
//! graph consistent and answers the introspection queries ROS 2 tools issue:
//!
//! - [`GraphCache`]: writers, readers and participants discovered so far,
//!   plus node-to-entity associations received by gossip.
//! - [`TopicCache`]: lighter topic/type reference counting for layers that do
//!   not track node associations.
//! - [`Context`]: couples a cache mutation with the outbound gossip publish and
//!   rolls the mutation back if the publish fails.
//! - [`qos`]: compatibility checks between a publisher and a subscription, and
//!   resolution of "best available" policies against discovered peers.
//! - [`security`]: lookup of the DDS Security files of an enclave.
//!
//! Nothing here opens sockets or serializes wire bytes; the hosting middleware
//! feeds discovery events in and provides the publish callback.
//!
//! # Example
//!
//! ```
//! use rmw_hdds_common::{identity_demangle, GraphCache, Gid, QosProfile};
//!
//! let cache = GraphCache::new();
//! let participant = Gid::new([1; 24]);
//! let writer = Gid::new([2; 24]);
//!
//! cache.add_participant(participant);
//! cache.add_node(participant, "talker", "/");
//! cache.add_writer(writer, "rt/chatter", "std_msgs::msg::dds_::String_", participant, QosProfile::default());
//! cache.associate_writer(writer, participant, "talker", "/");
//!
//! let topics = cache
//!     .get_writer_names_and_types_by_node("talker", "/", identity_demangle, identity_demangle)
//!     .expect("node exists");
//! assert!(topics.contains_key("rt/chatter"));
//! ```

pub mod config;
pub mod context;
pub mod endpoint;
pub mod gid;
pub mod graph;
pub mod msg;
pub mod qos;
pub mod security;
pub mod time;
pub mod topic_cache;

pub use config::EnvConfig;
pub use context::{Context, GossipPublisher};
pub use endpoint::{EndpointType, TopicEndpointInfo};
pub use gid::{Gid, GID_STORAGE_SIZE};
pub use graph::{EntityInfo, GraphCache, NODE_NAMESPACE_UNKNOWN, NODE_NAME_UNKNOWN};
pub use msg::{NodeEntitiesInfo, ParticipantEntitiesInfo};
pub use qos::{
    DurabilityPolicy, HistoryPolicy, LivelinessPolicy, QosCompatibility, QosProfile,
    ReliabilityPolicy,
};
pub use security::{get_security_files, get_security_files_with_pkcs11, SecurityFiles};
pub use time::RmwTime;
pub use topic_cache::TopicCache;

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Topic name to the set of type names seen on it.
pub type NamesAndTypes = BTreeMap<String, BTreeSet<String>>;

/// Errors emitted by the graph, QoS and security helpers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("node '{name}' in namespace '{namespace}' does not exist")]
    NodeNameNonExistent { name: String, namespace: String },
    #[error("no gossip publisher attached to the context")]
    PublisherUnavailable,
    #[error("failed to publish participant entities: {0}")]
    PublishFailed(String),
    #[error("required security file missing for attribute {0}")]
    MissingSecurityFile(String),
    #[error("invalid type hash: {0}")]
    InvalidTypeHash(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Demangle function that keeps names untouched.
///
/// Handy for callers that store logical ROS names directly in the caches.
#[must_use]
pub fn identity_demangle(name: &str) -> String {
    name.to_string()
}
