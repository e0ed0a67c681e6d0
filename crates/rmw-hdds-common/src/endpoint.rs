// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint records returned by the "info by topic" graph queries.

use crate::gid::Gid;
use crate::qos::QosProfile;
use std::fmt;

/// Role of an endpoint on a topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointType {
    Publisher,
    Subscription,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publisher => f.write_str("publisher"),
            Self::Subscription => f.write_str("subscription"),
        }
    }
}

/// Node, type, GID and QoS of one publisher or subscription on a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicEndpointInfo {
    pub node_name: String,
    pub node_namespace: String,
    pub topic_type: String,
    pub endpoint_type: EndpointType,
    pub endpoint_gid: Gid,
    pub qos_profile: QosProfile,
}
