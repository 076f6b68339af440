//! Consistency checking, maximum cycle ratio, and strictly-periodic
//! scheduling for cyclo-static dataflow (CSDF) graphs.
//!
//! A CSDF graph is a directed multigraph of *actors* that fire
//! cyclically, producing and consuming integer token counts on *channels*
//! per a per-phase rate pattern, with per-phase integer execution times.
//! This crate answers three questions about such a graph:
//!
//! - Is it **structurally consistent**? ([`sdf::SdfGraph::new`] derives
//!   the repetition vector, normalisation vector, and modulus, or reports
//!   exactly which balance equation fails.)
//! - What is its **throughput**? ([`algo::mcr::max_cycle_ratio`] computes
//!   the maximum cycle ratio of a rate graph via parametric policy
//!   iteration.)
//! - What is a **strictly-periodic schedule** achieving — or bounding —
//!   that throughput? ([`schedule::strictly_periodic_schedule`].)
//!
//! Loading a graph from an external format (XML, JSON, YAML, ...) is the
//! caller's concern: build a [`raw::RawGraph`] and hand it to
//! [`sdf::SdfGraph::new`].

mod cyclic;
mod error;
mod forest;
mod integers;
mod pqueue;
mod rate_vector;

pub mod algo;
pub mod graph;
pub mod raw;
pub mod schedule;
pub mod sdf;
pub mod transform;

pub use cyclic::{CyclicSlice, CyclicVector};
pub use error::{Cycle, CycleError, EdgeRef, McrError, McrResult, PathResult, SdfError, SdfResult};
pub use graph::{ActorIndex, Actor, Channel, EdgeIndex, SdfMultigraph};
pub use raw::{RawActor, RawChannel, RawGraph};
pub use schedule::{strictly_periodic_schedule, Schedule};
pub use sdf::SdfGraph;
pub use transform::{
    multi_rate_equivalent, sample_crates, sample_prates, single_rate_apx, single_rate_as_marked_graph,
    single_rate_equivalent, unfold, MarkedEdge, MarkedGraph,
};

pub use rate_vector::parse as parse_rate_vector;
