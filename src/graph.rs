//! A dense-index adjacency-list multigraph: the shared backing store for
//! [`crate::sdf::SdfGraph`] and the marked-graph/HSDF outputs of
//! [`crate::transform`].
//!
//! Grounded on `petgraph::graph::Graph`'s design (arena of node/edge
//! structs, adjacency recovered via per-node edge-index lists) but
//! simplified: CSDF graphs are built once and never mutated afterwards
//! (no actor or channel is ever removed), so there is no free-list or
//! edge-unlinking machinery — only append-only construction plus O(1)
//! index lookups, per the Design Notes' "avoid attribute bags; represent
//! nodes by index in an arena".

use indexmap::IndexMap;
use std::hash::Hash;

use crate::cyclic::CyclicVector;

/// A dense index into the actor arena.
pub type ActorIndex = usize;
/// A dense index into the channel arena.
pub type EdgeIndex = usize;

/// An actor (computational node): a name-erased identity plus its
/// per-phase execution time.
#[derive(Debug, Clone)]
pub struct Actor {
    pub wcet: CyclicVector,
}

/// A channel (directed multi-edge): per-phase production and consumption
/// rates, initial tokens, and an optional capacity bound.
#[derive(Debug, Clone)]
pub struct Channel {
    pub source: ActorIndex,
    pub target: ActorIndex,
    pub production: CyclicVector,
    pub consumption: CyclicVector,
    pub tokens: i64,
    pub capacity: Option<i64>,
}

/// An append-only, dense-indexed multigraph of [`Actor`]s and [`Channel`]s.
///
/// `V` is the caller's opaque actor identity, kept only in the `names`
/// table at the boundary; every traversal and algorithm in this crate
/// operates on [`ActorIndex`]/[`EdgeIndex`] instead.
#[derive(Debug, Clone)]
pub struct SdfMultigraph<V> {
    actors: Vec<Actor>,
    channels: Vec<Channel>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
    names: IndexMap<V, ActorIndex>,
}

impl<V: Clone + Eq + Hash> Default for SdfMultigraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Eq + Hash> SdfMultigraph<V> {
    pub fn new() -> Self {
        SdfMultigraph {
            actors: Vec::new(),
            channels: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            names: IndexMap::new(),
        }
    }

    /// Adds a new actor, or returns the index of an already-named one.
    pub fn add_actor(&mut self, name: V, wcet: CyclicVector) -> ActorIndex {
        if let Some(&idx) = self.names.get(&name) {
            return idx;
        }
        let idx = self.actors.len();
        self.actors.push(Actor { wcet });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.names.insert(name, idx);
        idx
    }

    /// Appends a new channel between two already-added actors.
    pub fn add_channel(
        &mut self,
        source: ActorIndex,
        target: ActorIndex,
        production: CyclicVector,
        consumption: CyclicVector,
        tokens: i64,
        capacity: Option<i64>,
    ) -> EdgeIndex {
        let idx = self.channels.len();
        self.channels.push(Channel {
            source,
            target,
            production,
            consumption,
            tokens,
            capacity,
        });
        self.outgoing[source].push(idx);
        self.incoming[target].push(idx);
        idx
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn actor(&self, idx: ActorIndex) -> &Actor {
        &self.actors[idx]
    }

    pub fn channel(&self, idx: EdgeIndex) -> &Channel {
        &self.channels[idx]
    }

    pub fn actor_index(&self, name: &V) -> Option<ActorIndex> {
        self.names.get(name).copied()
    }

    pub fn actor_name(&self, idx: ActorIndex) -> &V {
        self.names
            .get_index(idx)
            .map(|(name, _)| name)
            .expect("actor index out of range")
    }

    pub fn actor_indices(&self) -> impl Iterator<Item = ActorIndex> {
        0..self.actors.len()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        0..self.channels.len()
    }

    /// Channel indices leaving `node`, in insertion order.
    pub fn edges_out(&self, node: ActorIndex) -> &[EdgeIndex] {
        &self.outgoing[node]
    }

    /// Channel indices entering `node`, in insertion order.
    pub fn edges_in(&self, node: ActorIndex) -> &[EdgeIndex] {
        &self.incoming[node]
    }

    pub fn endpoints(&self, edge: EdgeIndex) -> (ActorIndex, ActorIndex) {
        let c = &self.channels[edge];
        (c.source, c.target)
    }
}
