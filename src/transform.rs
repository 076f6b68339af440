//! Rate transforms: single-rate (HSDF) equivalence, actor unfolding,
//! single-rate approximation, and the marked-graph form consumed by the
//! maximum cycle ratio engine.
//!
//! Grounded on `sdfpy/transform.py` (`sample_prates`, `sample_crates`,
//! `single_rate_equivalent`, `multi_rate_equivalent`, `unfold`,
//! `single_rate_apx`, `single_rate_as_marked_graph`).

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;

use crate::cyclic::{CyclicSlice, CyclicVector};
use crate::error::{EdgeRef, SdfError, SdfResult};
use crate::graph::{ActorIndex, SdfMultigraph};
use crate::integers::{extended_gcd, gcd};
use crate::sdf::predecessor;
use crate::sdf::SdfGraph;

/// The production rates seen by an actor unfolded `period` times, starting
/// at phase `offset`: the token count already produced before `offset`,
/// and the per-period-window rate pattern.
///
/// Grounded on `sdfpy/transform.py::sample_prates`.
pub fn sample_prates(vector: &CyclicVector, offset: i64, period: i64) -> (i64, CyclicVector) {
    let len = vector.len() as i64;
    let pattern_len = len / gcd(len, period);
    let mut pattern = Vec::with_capacity(pattern_len as usize);
    for i in 0..pattern_len {
        let start = offset + i * period;
        pattern.push(vector.sum(start, Some(start + period), 1));
    }
    let token_delta = vector.sum(0, Some(offset), 1);
    (token_delta, CyclicVector::new(pattern))
}

/// The consumption rates seen by an actor unfolded `period` times, starting
/// at phase `offset`.
///
/// Grounded on `sdfpy/transform.py::sample_crates`.
pub fn sample_crates(vector: &CyclicVector, offset: i64, period: i64) -> (i64, CyclicVector) {
    let len = vector.len() as i64;
    let pattern_len = len / gcd(len, period);
    let mut pattern = Vec::with_capacity(pattern_len as usize);
    for i in 0..pattern_len {
        let start = offset + 1 + (i - 1) * period;
        pattern.push(vector.sum(start, Some(start + period), 1));
    }
    let token_delta = pattern[0] - vector.sum(0, Some(offset + 1), 1);
    (token_delta, CyclicVector::new(pattern))
}

/// Expands every actor `v` into `q[v]` single-rate copies `(v, 1)..(v,
/// q[v])`, one per firing in a repetition-vector period, wiring each
/// consuming firing to the exact producing firing that must precede it
/// (via [`predecessor::predecessor`]).
///
/// Grounded on `sdfpy/transform.py::single_rate_equivalent`. Node count
/// equals `sum(q)`; every generated channel carries non-negative tokens.
pub fn single_rate_equivalent<V: Clone + Eq + Hash + Debug>(
    sdf: &SdfGraph<V>,
) -> SdfMultigraph<(V, usize)> {
    let g = sdf.graph();
    let q = sdf.repetition_vector();
    let mut out: SdfMultigraph<(V, usize)> = SdfMultigraph::new();

    for v in g.actor_indices() {
        let name = g.actor_name(v).clone();
        let wcet = &g.actor(v).wcet;
        for j in 0..q[v] {
            out.add_actor((name.clone(), j as usize + 1), CyclicVector::constant(wcet.at(j)));
        }
    }

    for v in g.actor_indices() {
        let v_name = g.actor_name(v).clone();
        for &edge in g.edges_in(v) {
            let (u, _) = g.endpoints(edge);
            let u_name = g.actor_name(u).clone();
            let ch = g.channel(edge);
            for j in 0..q[v] {
                let k = j + 1;
                let i = predecessor::predecessor(&ch.production, &ch.consumption, ch.tokens, k);
                let source_phase = (i - 1).rem_euclid(q[u]) + 1;
                let tokens = (q[u] - i).div_euclid(q[u]);
                let source_idx = out
                    .actor_index(&(u_name.clone(), source_phase as usize))
                    .expect("every unfolded firing phase must have been added above");
                let target_idx = out
                    .actor_index(&(v_name.clone(), k as usize))
                    .expect("every unfolded firing phase must have been added above");
                out.add_channel(
                    source_idx,
                    target_idx,
                    CyclicVector::constant(1),
                    CyclicVector::constant(1),
                    tokens,
                    None,
                );
            }
        }
    }

    out
}

/// Collapses every actor's intrinsic phase pattern into `phases[v]`
/// single-token-rate firings per period, without fully unfolding to the
/// repetition vector. Generalizes the original's per-channel
/// `Tv == len(prates)` assumption to the actor's full phase count, so
/// actors fed by several channels of differing pattern lengths still
/// unfold consistently (`CyclicVector` indexing already wraps cyclically
/// at any length).
///
/// Grounded on `sdfpy/transform.py::multi_rate_equivalent`.
pub fn multi_rate_equivalent<V: Clone + Eq + Hash + Debug>(
    sdf: &SdfGraph<V>,
) -> SdfMultigraph<(V, usize)> {
    let g = sdf.graph();
    let mut out: SdfMultigraph<(V, usize)> = SdfMultigraph::new();

    for v in g.actor_indices() {
        let name = g.actor_name(v).clone();
        let wcet = &g.actor(v).wcet;
        let phi = sdf.phases(v);
        for i in 0..phi {
            out.add_actor((name.clone(), i as usize + 1), CyclicVector::constant(wcet.at(i)));
        }
    }

    for edge in g.edge_indices() {
        let (v, w) = g.endpoints(edge);
        let ch = g.channel(edge);
        let v_phases = sdf.phases(v);
        let w_phases = sdf.phases(w);
        let plen = ch.production.len() as i64;
        let csum = ch.consumption.full_sum();
        let psum = ch.production.full_sum();
        let gvw = gcd(csum, psum);

        let v_name = g.actor_name(v).clone();
        let w_name = g.actor_name(w).clone();

        for j in 0..w_phases {
            for i in 0..plen.min(v_phases) {
                let delta_i_n = ch.tokens + ch.production.sum(0, Some(i + 1), 1) - ch.consumption.sum(0, Some(j + 1), 1);
                let delta_i1_n = ch.tokens + ch.production.sum(0, Some(i), 1) - ch.consumption.sum(0, Some(j + 1), 1);
                let sol_min = (gvw - delta_i_n - 1).div_euclid(gvw);
                let sol_max = (gvw - delta_i1_n - 1).div_euclid(gvw);
                if sol_min >= sol_max {
                    continue;
                }

                let source_idx = out
                    .actor_index(&(v_name.clone(), i as usize + 1))
                    .expect("source phase must already be added");
                let target_idx = out
                    .actor_index(&(w_name.clone(), j as usize + 1))
                    .expect("target phase must already be added");
                let tokens = ch.tokens + ch.production.sum(0, Some(i), 1) + ch.consumption.sum(j + 1, None, 1);
                out.add_channel(
                    source_idx,
                    target_idx,
                    CyclicVector::constant(psum),
                    CyclicVector::constant(csum),
                    tokens,
                    None,
                );
            }
        }
    }

    out
}

/// Unfolds actor `v` into `periods[v]` copies, each firing at `1/periods[v]`
/// of `v`'s original rate, and re-derives each channel's rate pattern over
/// the enumerated set of producer phases that actually feed a given
/// consumer phase.
///
/// Grounded on `sdfpy/transform.py::unfold` ("Algorithm ? in PhD thesis"):
/// for consumer firing `(w, j)`, the feasible producer residues `i mod
/// gcd(Tv, plen*gm/gvw)` are enumerated via the integer inequality on
/// `sol_min..sol_max`, inverted through a modular inverse found by
/// [`extended_gcd`]. Node identity always keeps the `(actor, phase)` pair
/// (the original special-cases `Tv == 1`/`Tw == 1` to bare actor names;
/// this crate keeps a single, uniformly typed node identity instead).
pub fn unfold<V: Clone + Eq + Hash + Debug>(
    sdf: &SdfGraph<V>,
    periods: &HashMap<ActorIndex, i64>,
) -> SdfResult<SdfGraph<(V, usize)>> {
    let g = sdf.graph();
    let period_of = |v: ActorIndex| periods.get(&v).copied().unwrap_or(1);

    let mut raw = crate::raw::RawGraph::new();
    for v in g.actor_indices() {
        let name = g.actor_name(v).clone();
        let wcet = &g.actor(v).wcet;
        let tv = period_of(v);
        for i in 0..tv {
            let pattern = match wcet.slice(i, None, tv) {
                CyclicSlice::Pattern(p) => p,
                CyclicSlice::Window(_) => unreachable!("slice with stop=None always returns a Pattern"),
            };
            raw.actors.insert((name.clone(), i as usize + 1), crate::raw::RawActor { wcet: pattern.as_slice().to_vec() });
        }
    }

    for edge in g.edge_indices() {
        let (v, w) = g.endpoints(edge);
        let ch = g.channel(edge);
        let tv = period_of(v);
        let tw = period_of(w);
        let plen = ch.production.len() as i64;
        let clen = ch.consumption.len() as i64;
        let tokens = ch.tokens;

        let csum = ch.consumption.full_sum() * tw / gcd(tw, clen);
        let psum = ch.production.full_sum() * tv / gcd(tv, plen);
        let gm = gcd(csum, psum);
        let gvw = gcd(csum, ch.production.full_sum());

        let (g_cd, mulinv, _) = extended_gcd(ch.production.full_sum() / gvw, gm / gvw);
        debug_assert_eq!(g_cd, 1, "xgcd must certify the modular inverse exists");

        let step = gcd(tv, plen * gm / gvw);

        let v_name = g.actor_name(v).clone();
        let w_name = g.actor_name(w).clone();

        for j in 0..tw {
            let mut sols: HashSet<i64> = HashSet::new();
            let n0_count = clen / gcd(clen, tw);
            for n0 in 0..n0_count {
                for i0 in 0..plen {
                    let delta_i_n = tokens + ch.production.sum(0, Some(i0 + 1), 1) - ch.consumption.sum(0, Some(j + 1 + n0 * tw), 1);
                    let delta_i1_n = tokens + ch.production.sum(0, Some(i0), 1) - ch.consumption.sum(0, Some(j + 1 + n0 * tw), 1);
                    let sol_min = (gvw - delta_i_n - 1).div_euclid(gvw);
                    let sol_max = (gvw - delta_i1_n - 1).div_euclid(gvw);
                    for sol in sol_min..sol_max {
                        let s = (i0 + sol * mulinv * plen).rem_euclid(step);
                        sols.insert(s);
                    }
                }
            }

            let mut incoming: HashSet<i64> = HashSet::new();
            for residue in &sols {
                let mut i0 = *residue;
                while i0 < tv {
                    incoming.insert(i0);
                    i0 += step;
                }
            }

            let (tokens_c, incoming_crates) = sample_crates(&ch.consumption, j, tw);

            for i in incoming {
                let (tokens_p, incoming_prates) = sample_prates(&ch.production, i, tv);
                raw.channels.push(crate::raw::RawChannel {
                    source: (v_name.clone(), i as usize + 1),
                    target: (w_name.clone(), j as usize + 1),
                    production: incoming_prates.as_slice().to_vec(),
                    consumption: incoming_crates.as_slice().to_vec(),
                    tokens: tokens + tokens_c + tokens_p,
                    capacity: None,
                });
            }
        }
    }

    SdfGraph::new(raw)
}

/// Approximates `sdf` by a single-rate graph over the same actors: each
/// actor's execution time collapses to its worst-case (`pessimistic`) or
/// best-case phase, and each channel's tokens become the linear
/// predecessor-bound delay scaled by the normalisation vector.
///
/// Grounded on `sdfpy/transform.py::single_rate_apx`. As in the original,
/// `lo`/`hi` name the two bounds returned by
/// [`predecessor::predecessor_lin_bounds`] but the *pessimistic* schedule
/// uses the second (`hi`-looking) element and the *optimistic* one the
/// first — kept exactly as the source computes it rather than renamed to
/// look more intuitive.
pub fn single_rate_apx<V: Clone + Eq + Hash + Debug>(
    sdf: &SdfGraph<V>,
    pessimistic: bool,
) -> SdfResult<SdfMultigraph<V>> {
    let g = sdf.graph();
    let mut out: SdfMultigraph<V> = SdfMultigraph::new();

    for v in g.actor_indices() {
        let wcet = g.actor(v).wcet.as_slice();
        let w = if pessimistic {
            *wcet.iter().max().expect("wcet has at least one phase")
        } else {
            *wcet.iter().min().expect("wcet has at least one phase")
        };
        out.add_actor(g.actor_name(v).clone(), CyclicVector::constant(w));
    }

    for edge in g.edge_indices() {
        let (source, target) = g.endpoints(edge);
        let ch = g.channel(edge);
        let (a, b) = predecessor::predecessor_lin_bounds(&ch.production, &ch.consumption, ch.tokens);
        let delay = if pessimistic { b } else { a };

        let s = BigRational::from_integer(BigInt::from(sdf.normalisation_vector()[edge]));
        let toks = &s * &delay;
        if !toks.is_integer() {
            return Err(SdfError::Parse {
                context: format!("channel {edge}"),
                message: "single-rate approximation delay is not an integer multiple of the normalisation vector".to_string(),
            });
        }
        let tokens = toks.to_integer().to_i64().ok_or_else(|| SdfError::Parse {
            context: format!("channel {edge}"),
            message: "single-rate approximation token count exceeds 64-bit range".to_string(),
        })?;

        let source_idx = out.actor_index(g.actor_name(source)).expect("source actor must already be added");
        let target_idx = out.actor_index(g.actor_name(target)).expect("target actor must already be added");
        out.add_channel(source_idx, target_idx, CyclicVector::constant(1), CyclicVector::constant(1), tokens, None);
    }

    Ok(out)
}

/// A single-rate graph reduced to the weighted, token-annotated edge form
/// the maximum cycle ratio engine consumes directly.
#[derive(Debug, Clone)]
pub struct MarkedGraph {
    pub node_count: usize,
    pub edges: Vec<MarkedEdge>,
}

/// One edge of a [`MarkedGraph`]: `weight` is the execution time of the
/// actor the edge is attached to (source when relating start times, target
/// when relating finish times) and `tokens` is the channel's delay.
#[derive(Debug, Clone, Copy)]
pub struct MarkedEdge {
    pub from: usize,
    pub to: usize,
    pub weight: i64,
    pub tokens: i64,
    pub edge: EdgeRef,
}

/// Builds the marked-graph form of a single-rate graph `hsdf`.
///
/// When `relate_start_times` is `true`, edge `(u, v)` carries `u`'s
/// execution time; this yields the constraint `t(v, k) >= t(u, k - d) +
/// wcet(u)` on firing *start* times. When `false`, the edge is anchored at
/// `v`'s execution time instead, relating firing *finish* times.
///
/// Grounded on `sdfpy/transform.py::single_rate_as_marked_graph`.
pub fn single_rate_as_marked_graph<V: Clone + Eq + Hash>(hsdf: &SdfMultigraph<V>, relate_start_times: bool) -> MarkedGraph {
    let mut edges = Vec::new();
    for v in hsdf.actor_indices() {
        let wcet = hsdf.actor(v).wcet.at(0);
        if relate_start_times {
            for &e in hsdf.edges_out(v) {
                let (_, target) = hsdf.endpoints(e);
                let ch = hsdf.channel(e);
                edges.push(MarkedEdge { from: v, to: target, weight: wcet, tokens: ch.tokens, edge: (v, target, e as u32) });
            }
        } else {
            for &e in hsdf.edges_in(v) {
                let (source, _) = hsdf.endpoints(e);
                let ch = hsdf.channel(e);
                edges.push(MarkedEdge { from: source, to: v, weight: wcet, tokens: ch.tokens, edge: (source, v, e as u32) });
            }
        }
    }
    MarkedGraph { node_count: hsdf.actor_count(), edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawActor, RawChannel, RawGraph};

    fn two_actor_chain() -> SdfGraph<&'static str> {
        let mut g: RawGraph<&str> = RawGraph::new();
        g.actors.insert("A", RawActor { wcet: vec![1] });
        g.actors.insert("B", RawActor { wcet: vec![1] });
        g.channels.push(RawChannel {
            source: "A",
            target: "B",
            production: vec![1],
            consumption: vec![1],
            tokens: 1,
            capacity: None,
        });
        SdfGraph::new(g).unwrap()
    }

    #[test]
    fn single_rate_equivalent_has_sum_q_nodes() {
        let sdf = two_actor_chain();
        let hsdf = single_rate_equivalent(&sdf);
        let expected: i64 = sdf.repetition_vector().iter().sum();
        assert_eq!(hsdf.actor_count() as i64, expected);
    }

    #[test]
    fn single_rate_equivalent_tokens_are_non_negative() {
        let sdf = two_actor_chain();
        let hsdf = single_rate_equivalent(&sdf);
        for e in hsdf.edge_indices() {
            assert!(hsdf.channel(e).tokens >= 0);
        }
    }

    #[test]
    fn sample_prates_matches_full_sum_over_one_period() {
        let v = CyclicVector::new(vec![2, 3]);
        let (delta, pattern) = sample_prates(&v, 0, 1);
        assert_eq!(delta, 0);
        assert_eq!(pattern.full_sum(), v.full_sum());
    }

    #[test]
    fn marked_graph_start_times_carries_source_wcet() {
        let sdf = two_actor_chain();
        let apx = single_rate_apx(&sdf, true).unwrap();
        let mg = single_rate_as_marked_graph(&apx, true);
        assert!(!mg.edges.is_empty());
        for e in &mg.edges {
            let source_wcet = apx.actor(e.from).wcet.at(0);
            assert_eq!(e.weight, source_wcet);
        }
    }

    #[test]
    fn single_rate_apx_is_idempotent_on_an_already_single_rate_graph() {
        let sdf = two_actor_chain();
        let apx = single_rate_apx(&sdf, true).unwrap();
        let raw_apx: RawGraph<&str> = RawGraph {
            actors: apx
                .actor_indices()
                .map(|i| (*apx.actor_name(i), RawActor { wcet: apx.actor(i).wcet.as_slice().to_vec() }))
                .collect(),
            channels: apx
                .edge_indices()
                .map(|e| {
                    let (s, t) = apx.endpoints(e);
                    let ch = apx.channel(e);
                    RawChannel {
                        source: *apx.actor_name(s),
                        target: *apx.actor_name(t),
                        production: ch.production.as_slice().to_vec(),
                        consumption: ch.consumption.as_slice().to_vec(),
                        tokens: ch.tokens,
                        capacity: ch.capacity,
                    }
                })
                .collect(),
        };
        let sdf_apx = SdfGraph::new(raw_apx).unwrap();
        let apx2 = single_rate_apx(&sdf_apx, true).unwrap();
        assert_eq!(apx2.actor_count(), apx.actor_count());
        assert_eq!(apx2.channel_count(), apx.channel_count());
        for e in apx2.edge_indices() {
            assert_eq!(apx2.channel(e).tokens, apx.channel(e).tokens);
        }
    }
}
