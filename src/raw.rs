//! The typed construction input consumed by [`crate::sdf::SdfGraph::new`].
//!
//! This is the schema boundary named in the spec's External Interfaces: a
//! host application parses its own file format (XML, JSON, YAML, ...; not
//! this crate's concern, per the Non-goal on file loaders) into a
//! [`RawGraph`] and hands it to us. The shape mirrors what
//! `sdfpy/core.py::SDFGraph.__build` actually destructures out of its
//! parsed document: per-actor `wcet`, per-channel `production`/
//! `consumption`/`tokens`/`capacity`.

use std::collections::HashMap;

use crate::cyclic::CyclicVector;

/// One actor's construction-time attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawActor {
    /// Execution time per phase, cyclically repeating.
    pub wcet: Vec<i64>,
}

/// One channel's construction-time attributes: a directed edge from
/// `source` to `target` carrying per-phase production and consumption
/// rates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawChannel<V> {
    pub source: V,
    pub target: V,
    pub production: Vec<i64>,
    pub consumption: Vec<i64>,
    /// Initial tokens on the channel.
    pub tokens: i64,
    /// An optional finite buffer capacity; `None` means unbounded.
    pub capacity: Option<i64>,
}

/// A complete, unvalidated CSDF graph as handed to [`crate::sdf::SdfGraph::new`].
///
/// `V` is the caller's choice of opaque actor identity (typically
/// `String`), hashed only at this boundary — internal algorithms operate
/// on dense indices.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawGraph<V> {
    pub actors: HashMap<V, RawActor>,
    pub channels: Vec<RawChannel<V>>,
}

impl<V> RawGraph<V> {
    pub fn new() -> Self
    where
        V: std::hash::Hash + Eq,
    {
        RawGraph {
            actors: HashMap::new(),
            channels: Vec::new(),
        }
    }
}

impl<V> Default for RawGraph<V>
where
    V: std::hash::Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl RawActor {
    pub fn to_cyclic(&self) -> CyclicVector {
        CyclicVector::new(self.wcet.clone())
    }
}
