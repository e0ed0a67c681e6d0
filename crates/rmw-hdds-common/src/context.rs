// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Graph context of one local participant.
//!
//! Node and endpoint lifecycle events update the shared [`GraphCache`] and
//! announce the participant's new node list to its peers. Both happen under
//! the context lock, and the cache change is undone when the announcement
//! cannot be published, so the local cache never shows an entity that peers
//! were not told about.

use crate::gid::Gid;
use crate::graph::GraphCache;
use crate::msg::ParticipantEntitiesInfo;
use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Sends a participant's node list to its peers.
pub trait GossipPublisher: Send + Sync {
    fn publish(&self, msg: &ParticipantEntitiesInfo) -> Result<()>;
}

impl<F> GossipPublisher for F
where
    F: Fn(&ParticipantEntitiesInfo) -> Result<()> + Send + Sync,
{
    fn publish(&self, msg: &ParticipantEntitiesInfo) -> Result<()> {
        self(msg)
    }
}

/// Couples graph cache mutations with their gossip announcement.
pub struct Context {
    gid: Gid,
    graph_cache: Arc<GraphCache>,
    publisher: RwLock<Option<Box<dyn GossipPublisher>>>,
    node_update: Mutex<()>,
}

impl Context {
    /// Create the context of participant `gid` and register it in the cache.
    pub fn new(gid: Gid, graph_cache: Arc<GraphCache>) -> Self {
        graph_cache.add_participant(gid);
        Self {
            gid,
            graph_cache,
            publisher: RwLock::new(None),
            node_update: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn gid(&self) -> Gid {
        self.gid
    }

    #[must_use]
    pub fn graph_cache(&self) -> Arc<GraphCache> {
        Arc::clone(&self.graph_cache)
    }

    pub fn set_publisher<P>(&self, publisher: P)
    where
        P: GossipPublisher + 'static,
    {
        *self.publisher.write() = Some(Box::new(publisher));
    }

    /// Detach the publisher; later graph updates fail and are rolled back.
    pub fn clear_publisher(&self) {
        *self.publisher.write() = None;
    }

    /// Merge a node list received from a peer. Our own echo is ignored.
    pub fn handle_gossip(&self, msg: &ParticipantEntitiesInfo) {
        if msg.gid == self.gid {
            log::trace!("[context] ignoring own participant entities");
            return;
        }
        self.graph_cache.update_participant_entities(msg);
    }

    fn publish(&self, msg: &ParticipantEntitiesInfo) -> Result<()> {
        let guard = self.publisher.read();
        let publisher = guard.as_ref().ok_or(Error::PublisherUnavailable)?;
        publisher.publish(msg).map_err(|err| match err {
            Error::PublishFailed(_) => err,
            other => Error::PublishFailed(other.to_string()),
        })
    }

    /// Run `mutate` and publish its snapshot.
    ///
    /// On failure the local participant's node list is restored to what it
    /// was before `mutate` ran.
    fn commit<M>(&self, what: &str, mutate: M) -> Result<()>
    where
        M: FnOnce(&GraphCache) -> ParticipantEntitiesInfo,
    {
        let _guard = self.node_update.lock();
        self.graph_cache.deferring_notifications(|cache| {
            let previous = cache
                .participant_entities(self.gid)
                .map(|msg| msg.nodes)
                .unwrap_or_default();
            let msg = mutate(cache);

            if let Err(err) = self.publish(&msg) {
                log::error!("[context] {} not announced, rolling back: {}", what, err);
                cache.restore_participant_nodes(self.gid, previous);
                return Err(err);
            }

            log::debug!("[context] {} announced for participant {}", what, self.gid);
            Ok(())
        })
    }

    pub fn add_node_graph(&self, name: &str, namespace_: &str) -> Result<()> {
        let gid = self.gid;
        self.commit("node creation", |cache| {
            cache.add_node(gid, name, namespace_)
        })
    }

    pub fn destroy_node_graph(&self, name: &str, namespace_: &str) -> Result<()> {
        let gid = self.gid;
        self.commit("node destruction", |cache| {
            cache.remove_node(gid, name, namespace_)
        })
    }

    pub fn add_subscriber_graph(
        &self,
        subscription_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("subscription creation", |cache| {
            cache.associate_reader(subscription_gid, gid, name, namespace_)
        })
    }

    pub fn destroy_subscriber_graph(
        &self,
        subscription_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("subscription destruction", |cache| {
            cache.dissociate_reader(subscription_gid, gid, name, namespace_)
        })
    }

    pub fn add_publisher_graph(
        &self,
        publisher_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("publisher creation", |cache| {
            cache.associate_writer(publisher_gid, gid, name, namespace_)
        })
    }

    pub fn destroy_publisher_graph(
        &self,
        publisher_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("publisher destruction", |cache| {
            cache.dissociate_writer(publisher_gid, gid, name, namespace_)
        })
    }

    /// A client owns a request writer and a response reader.
    pub fn add_client_graph(
        &self,
        request_publisher_gid: Gid,
        response_subscriber_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("client creation", |cache| {
            cache.associate_writer(request_publisher_gid, gid, name, namespace_);
            cache.associate_reader(response_subscriber_gid, gid, name, namespace_)
        })
    }

    pub fn destroy_client_graph(
        &self,
        request_publisher_gid: Gid,
        response_subscriber_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("client destruction", |cache| {
            cache.dissociate_writer(request_publisher_gid, gid, name, namespace_);
            cache.dissociate_reader(response_subscriber_gid, gid, name, namespace_)
        })
    }

    /// A service owns a request reader and a response writer.
    pub fn add_service_graph(
        &self,
        request_subscriber_gid: Gid,
        response_publisher_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("service creation", |cache| {
            cache.associate_reader(request_subscriber_gid, gid, name, namespace_);
            cache.associate_writer(response_publisher_gid, gid, name, namespace_)
        })
    }

    pub fn destroy_service_graph(
        &self,
        request_subscriber_gid: Gid,
        response_publisher_gid: Gid,
        name: &str,
        namespace_: &str,
    ) -> Result<()> {
        let gid = self.gid;
        self.commit("service destruction", |cache| {
            cache.dissociate_reader(request_subscriber_gid, gid, name, namespace_);
            cache.dissociate_writer(response_publisher_gid, gid, name, namespace_)
        })
    }
}
