//! Strictly-periodic schedules: a `(start, period)` pair per actor,
//! derived from the single-rate approximation's maximum cycle ratio.
//!
//! Grounded on `sdfpy/schedule.py::strictly_periodic_schedule`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::algo::mcr::{max_cycle_ratio, RatioEdge};
use crate::error::{SdfError, SdfResult};
use crate::sdf::SdfGraph;
use crate::transform;

/// `start[v]`, `period[v]` for every actor `v`, both exact rationals:
/// `v` fires at times `start[v] + k * period[v]` for `k = 0, 1, ...`.
pub type Schedule<V> = HashMap<V, (BigRational, BigRational)>;

/// The longest distance from each node's own zero baseline under a
/// parametric rational edge weight, assuming (as guaranteed once edges are
/// weighted by `weight - ratio * tokens` at the graph's own maximum cycle
/// ratio) that no cycle has strictly positive total weight.
///
/// A dedicated rational-weighted relaxation rather than a generalization
/// of [`crate::algo::paths::longest_distances`]: the latter operates on
/// `i64` weights, while the eigenvector here is generally fractional.
fn rational_longest_distances(n: usize, edges: &[(usize, usize, BigRational)]) -> Vec<BigRational> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, (from, _, _)) in edges.iter().enumerate() {
        adj[*from].push(i);
    }

    let mut dist = vec![BigRational::zero(); n];
    for _pass in 0..=n {
        let mut improved = false;
        for u in 0..n {
            for &idx in &adj[u] {
                let (_, v, weight) = &edges[idx];
                let candidate = &dist[u] + weight;
                if candidate > dist[*v] {
                    dist[*v] = candidate;
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
    dist
}

/// Derives a strictly-periodic schedule for `sdf`: every actor fires at a
/// fixed period (a multiple of the graph's maximum cycle ratio) starting
/// at a fixed offset, with start times normalised so the earliest firing
/// is at time zero.
///
/// `pessimistic` selects which bound of [`transform::single_rate_apx`] is
/// used to build the single-rate approximation the schedule is computed
/// over (`true` yields a schedule admissible for the original CSDF graph;
/// `false` an optimistic one that may not be).
///
/// Grounded on `sdfpy/schedule.py::strictly_periodic_schedule`.
pub fn strictly_periodic_schedule<V: Clone + Eq + Hash + Debug>(
    sdf: &SdfGraph<V>,
    pessimistic: bool,
) -> SdfResult<Schedule<V>> {
    let apx = transform::single_rate_apx(sdf, pessimistic)?;
    let mg = transform::single_rate_as_marked_graph(&apx, true);

    let ratio_edges: Vec<RatioEdge> = mg
        .edges
        .iter()
        .enumerate()
        .map(|(i, e)| RatioEdge {
            from: e.from,
            to: e.to,
            weight: e.weight,
            tokens: e.tokens,
            edge: (e.from, e.to, i as u32),
        })
        .collect();

    let (cycle_time, _critical_cycle) = max_cycle_ratio(mg.node_count, &ratio_edges).map_err(|err| SdfError::Parse {
        context: "strictly_periodic_schedule".to_string(),
        message: err.to_string(),
    })?;

    let weighted: Vec<(usize, usize, BigRational)> = mg
        .edges
        .iter()
        .map(|e| {
            let weight = BigRational::from_integer(BigInt::from(e.weight))
                - &cycle_time * BigRational::from_integer(BigInt::from(e.tokens));
            (e.from, e.to, weight)
        })
        .collect();
    let eigen = rational_longest_distances(mg.node_count, &weighted);

    let modulus = sdf.modulus();
    let mut result: Schedule<V> = HashMap::new();
    for idx in apx.actor_indices() {
        let name = apx.actor_name(idx).clone();
        let orig_idx = sdf
            .graph()
            .actor_index(&name)
            .expect("single-rate approximation keeps the same actor identities");
        let q_v = sdf.repetition_vector()[orig_idx];
        if modulus % q_v != 0 {
            return Err(SdfError::Parse {
                context: format!("{name:?}"),
                message: "modulus is not an integer multiple of the actor's repetition count".to_string(),
            });
        }
        let k = modulus / q_v;
        let period = BigRational::from_integer(BigInt::from(k)) * &cycle_time;
        let start = &eigen[idx] + BigRational::from_integer(BigInt::from(k - 1)) * &cycle_time;
        result.insert(name, (start, period));
    }

    let min_start = result
        .values()
        .map(|(start, _)| start.clone())
        .min()
        .expect("a graph with at least one actor yields a non-empty schedule");
    for (start, _period) in result.values_mut() {
        *start -= &min_start;
    }

    Ok(result)
}
