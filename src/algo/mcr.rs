//! The Maximum Cycle Ratio engine: parametric policy iteration over a
//! weighted, token-annotated directed multigraph.
//!
//! Grounded on `sdfpy/mcr.py`: `max_cycle_ratio` dispatches the whole
//! graph over its strongly connected components (only a component with an
//! internal cycle can contribute a ratio), and `compute_mcr_component`
//! runs Howard-style policy iteration on each one. A node's current best
//! incoming path is tracked in a [`Forest`]; whenever relaxing an edge
//! would re-parent a node under one of its own descendants, that closes a
//! cycle, whose ratio is read off directly from the raw `(weight, tokens)`
//! sums — no floating point, and no need to fix the ratio estimate before
//! comparing it to the current one. An [`IndexedPriorityQueue`] drives
//! which node gets relaxed next, ordered by its current tentative
//! distance so the largest pending improvement is applied first.

use std::cmp::Reverse;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::error::{Cycle, EdgeRef, McrError, McrResult};
use crate::forest::Forest;
use crate::pqueue::IndexedPriorityQueue;
use tracing::{instrument, trace};

use super::scc::tarjan_scc;

/// One edge of the rate graph fed to [`max_cycle_ratio`]: a weight (e.g.
/// accumulated execution time) and a non-negative token count, tagged with
/// the [`EdgeRef`] that identifies it in the caller's graph.
#[derive(Debug, Clone, Copy)]
pub struct RatioEdge {
    pub from: usize,
    pub to: usize,
    pub weight: i64,
    pub tokens: i64,
    pub edge: EdgeRef,
}

fn to_rational(x: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(x))
}

struct LocalEdge {
    to: usize,
    weight: i64,
    tokens: i64,
    edge: EdgeRef,
}

/// Runs policy iteration over a single strongly connected component.
///
/// `adj[u]` lists the outgoing edges of local node `u`. Returns the
/// component's maximum cycle ratio and a witnessing simple cycle.
#[instrument(skip_all, fields(n = n))]
fn compute_mcr_component(n: usize, adj: &[Vec<LocalEdge>]) -> McrResult<(BigRational, Cycle)> {
    let mut lambda = BigRational::zero();
    let mut witness: Option<Cycle> = None;

    'outer: loop {
        let mut dist = vec![BigRational::zero(); n];
        let mut forest: Forest<usize> = Forest::new(n);
        let mut queue: IndexedPriorityQueue<Reverse<BigRational>> = IndexedPriorityQueue::new();
        for u in 0..n {
            queue.set(u, Reverse(dist[u].clone()));
        }

        while let Some((u, _)) = queue.pop() {
            for (edge_idx, local_edge) in adj[u].iter().enumerate() {
                let v = local_edge.to;
                let w_prime = to_rational(local_edge.weight)
                    - &lambda * to_rational(local_edge.tokens);
                let candidate = &dist[u] + &w_prime;
                if candidate <= dist[v] {
                    continue;
                }

                if let Some(chain) = ancestor_chain(&forest, u, v) {
                    let cycle_edges = cycle_edge_indices(&forest, &chain);
                    let mut raw_weight = 0i64;
                    let mut raw_tokens = 0i64;
                    let mut refs = Vec::with_capacity(cycle_edges.len() + 1);
                    for &(node, edge_idx) in &cycle_edges {
                        let e = &adj[node][edge_idx];
                        raw_weight += e.weight;
                        raw_tokens += e.tokens;
                        refs.push(e.edge);
                    }
                    raw_weight += local_edge.weight;
                    raw_tokens += local_edge.tokens;
                    refs.push(local_edge.edge);

                    if raw_tokens == 0 {
                        return Err(McrError::Infeasible(Cycle::canonicalise(refs)));
                    }
                    let ratio = BigRational::new(BigInt::from(raw_weight), BigInt::from(raw_tokens));
                    debug_assert!(ratio > lambda, "a closing cycle must strictly improve lambda");
                    trace!(?ratio, raw_weight, raw_tokens, "pivoting to a higher cycle ratio");
                    lambda = ratio;
                    witness = Some(Cycle::canonicalise(refs));
                    continue 'outer;
                }

                dist[v] = candidate;
                forest.add_edge(u, v, edge_idx);
                queue.set(v, Reverse(dist[v].clone()));
            }
        }

        let witness = witness.unwrap_or_else(|| Cycle::canonicalise(Vec::new()));
        return Ok((lambda, witness));
    }
}

/// Walks `forest` parent pointers from `u` looking for `v`. Returns the
/// chain `[u, parent(u), ..., v]` if found.
fn ancestor_chain(forest: &Forest<usize>, u: usize, v: usize) -> Option<Vec<usize>> {
    let mut chain = vec![u];
    let mut cur = u;
    loop {
        if cur == v {
            return Some(chain);
        }
        let parent = forest.parent(cur)?;
        chain.push(parent);
        cur = parent;
    }
}

/// Given the ancestor chain `[u, ..., v]`, returns the cycle's tree edges
/// in order `v -> ... -> u`, each as `(parent_node, local_edge_index)` —
/// `Forest::add_edge(parent, child, edge_idx)` caches `edge_idx` as an
/// index into the *parent's* adjacency list, so the child's cached
/// in-edge must be paired back up with its parent, not with itself.
fn cycle_edge_indices(forest: &Forest<usize>, chain: &[usize]) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(chain.len().saturating_sub(1));
    for i in 0..chain.len() - 1 {
        let child = chain[i];
        let parent = chain[i + 1];
        let edge_idx = forest
            .parent_edge(child)
            .expect("chain nodes below the root must have a parent edge");
        out.push((parent, edge_idx));
    }
    out.reverse();
    out
}

/// Computes the maximum cycle ratio over the whole graph `(n, edges)`,
/// dispatching over strongly connected components: a component with no
/// internal cycle (a singleton with no self-loop) cannot contribute a
/// ratio and is skipped. If the graph has no cycle at all, returns a ratio
/// of zero with an empty witness.
pub fn max_cycle_ratio(n: usize, edges: &[RatioEdge]) -> McrResult<(BigRational, Cycle)> {
    let mut adj_global: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in edges.iter().enumerate() {
        adj_global[e.from].push(i);
    }
    let plain_adj: Vec<Vec<usize>> = adj_global
        .iter()
        .map(|edges_here| edges_here.iter().map(|&i| edges[i].to).collect())
        .collect();

    let components = tarjan_scc(n, &plain_adj);

    let mut best: Option<(BigRational, Cycle)> = None;

    for component in &components {
        if component.len() == 1 {
            let node = component[0];
            let has_self_loop = adj_global[node].iter().any(|&i| edges[i].to == node);
            if !has_self_loop {
                continue;
            }
        }

        let mut global_to_local = vec![usize::MAX; n];
        for (local, &global) in component.iter().enumerate() {
            global_to_local[global] = local;
        }

        let mut local_adj: Vec<Vec<LocalEdge>> = (0..component.len()).map(|_| Vec::new()).collect();
        for &global_u in component {
            let local_u = global_to_local[global_u];
            for &edge_idx in &adj_global[global_u] {
                let e = edges[edge_idx];
                if global_to_local[e.to] == usize::MAX {
                    continue; // leaves the component, not part of its cycles
                }
                local_adj[local_u].push(LocalEdge {
                    to: global_to_local[e.to],
                    weight: e.weight,
                    tokens: e.tokens,
                    edge: e.edge,
                });
            }
        }

        let (ratio, cycle) = compute_mcr_component(component.len(), &local_adj)?;
        if cycle.edges().is_empty() {
            continue;
        }
        if best.as_ref().map(|(b, _)| &ratio > b).unwrap_or(true) {
            best = Some((ratio, cycle));
        }
    }

    Ok(best.unwrap_or((BigRational::zero(), Cycle::canonicalise(Vec::new()))))
}
