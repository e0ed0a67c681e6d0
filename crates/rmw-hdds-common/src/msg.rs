// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gossip messages exchanged between participants.
//!
//! A [`ParticipantEntitiesInfo`] always carries the full node list of its
//! participant; receivers replace whatever they stored for that GID.

use crate::gid::Gid;
use serde::{Deserialize, Serialize};

/// One node hosted by a participant and the DDS entities it owns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntitiesInfo {
    pub node_name: String,
    pub node_namespace: String,
    pub reader_gids: Vec<Gid>,
    pub writer_gids: Vec<Gid>,
}

impl NodeEntitiesInfo {
    #[must_use]
    pub fn new(node_name: &str, node_namespace: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            node_namespace: node_namespace.to_string(),
            reader_gids: Vec::new(),
            writer_gids: Vec::new(),
        }
    }

    /// Node identity is the `(name, namespace)` pair.
    #[must_use]
    pub fn is(&self, node_name: &str, node_namespace: &str) -> bool {
        self.node_name == node_name && self.node_namespace == node_namespace
    }
}

/// Snapshot of every node a participant hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantEntitiesInfo {
    pub gid: Gid,
    pub nodes: Vec<NodeEntitiesInfo>,
}

impl ParticipantEntitiesInfo {
    #[must_use]
    pub fn new(gid: Gid, nodes: Vec<NodeEntitiesInfo>) -> Self {
        Self { gid, nodes }
    }

    #[must_use]
    pub fn node(&self, node_name: &str, node_namespace: &str) -> Option<&NodeEntitiesInfo> {
        self.nodes
            .iter()
            .find(|node| node.is(node_name, node_namespace))
    }
}
