//! Typed error surfaces for the three fallible subsystems: graph
//! construction, path algorithms, and the MCR engine.
//!
//! Grounded on the exception hierarchy of `sdfpy/graphs.py`
//! (`InfeasibleCycle` / `PositiveCycle` / `NegativeCycle`) and
//! `sdfpy/core.py::SDFParseError`, realized as `thiserror`-derived enums
//! rather than bare exceptions so callers can match on variants.

use thiserror::Error;

/// An edge triple `(source, target, multigraph key)` identifying a channel
/// by its dense indices, as produced by [`crate::graph::SdfMultigraph`].
pub type EdgeRef = (usize, usize, u32);

/// An ordered, simple directed cycle, canonicalised so the
/// lexicographically smallest edge appears first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub Vec<EdgeRef>);

impl Cycle {
    /// Rotates `edges` so its lexicographically smallest edge is first.
    pub fn canonicalise(edges: Vec<EdgeRef>) -> Self {
        if edges.is_empty() {
            return Cycle(edges);
        }
        let (min_pos, _) = edges
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| **e)
            .expect("edges is non-empty");
        let mut rotated = Vec::with_capacity(edges.len());
        rotated.extend_from_slice(&edges[min_pos..]);
        rotated.extend_from_slice(&edges[..min_pos]);
        Cycle(rotated)
    }

    pub fn edges(&self) -> &[EdgeRef] {
        &self.0
    }
}

/// Errors raised while constructing or validating an [`crate::sdf::SdfGraph`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SdfError {
    /// A malformed rate vector, non-integer token count, or similarly
    /// malformed construction input.
    #[error("{context}: {message}")]
    Parse { context: String, message: String },

    /// A channel's balance equation conflicts with an already-assigned
    /// fractional repetition vector entry.
    #[error("inconsistent edge ({source_actor}, {target_actor}): production/consumption rates do not balance with the rest of the graph")]
    InconsistentEdge { source_actor: String, target_actor: String },

    /// A parallel pair of channels `(u, v)` / `(v, u)` fails the CSDF cycle
    /// balance equation.
    #[error("inconsistent cycle through ({a}, {b}, {a})")]
    InconsistentCycle { a: String, b: String },
}

/// Errors raised by [`crate::algo::paths::longest_distances`] and
/// [`crate::algo::paths::shortest_distances`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CycleError {
    /// `longest_distances` found a cycle whose total weight is positive.
    #[error("positive cycle detected: {0:?}")]
    PositiveCycle(Cycle),

    /// `shortest_distances` found a cycle whose total weight is negative.
    #[error("negative cycle detected: {0:?}")]
    NegativeCycle(Cycle),
}

/// Errors raised by [`crate::algo::mcr::max_cycle_ratio`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum McrError {
    /// A strongly connected component contains a token-free cycle with
    /// positive weight: no finite cycle ratio estimate dominates it, so no
    /// admissible periodic schedule exists for that component (a
    /// deadlocked cycle, in CSDF terms).
    #[error("infeasible: deadlocked cycle with zero tokens and positive weight: {0:?}")]
    Infeasible(Cycle),
}

pub type SdfResult<T> = Result<T, SdfError>;
pub type PathResult<T> = Result<T, CycleError>;
pub type McrResult<T> = Result<T, McrError>;
