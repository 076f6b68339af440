//! Consistency checking and repetition-vector derivation for cyclo-static
//! dataflow graphs.
//!
//! Grounded on `sdfpy/core.py::SDFGraph.__build`/`__check_consistency`:
//! every actor's intrinsic phase count is the lcm of its own execution-time
//! pattern length and the production/consumption pattern lengths of every
//! incident channel; the fractional repetition vector is propagated across
//! an undirected spanning walk of the graph (each channel imposing a ratio
//! between its endpoints' repetition counts), checked for consistency at
//! every re-visited actor and at every antiparallel channel pair, then
//! scaled to the minimal positive integer vector by the lcm of its
//! denominators.

pub mod predecessor;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};
use tracing::instrument;

use crate::cyclic::CyclicVector;
use crate::error::{SdfError, SdfResult};
use crate::graph::{ActorIndex, EdgeIndex, SdfMultigraph};
use crate::integers::{gcd, lcm};
use crate::raw::RawGraph;

/// A validated CSDF graph, together with its derived repetition vector,
/// normalisation vector, and modulus.
pub struct SdfGraph<V> {
    graph: SdfMultigraph<V>,
    phases: Vec<i64>,
    repetition_vector: Vec<i64>,
    normalisation_vector: Vec<i64>,
    modulus: i64,
}

fn lcm_bigint(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    (a / a.gcd(b)) * b
}

impl<V: Clone + Eq + Hash + Debug> SdfGraph<V> {
    /// Validates `raw` and derives its repetition vector, normalisation
    /// vector, and modulus.
    #[instrument(skip_all)]
    pub fn new(raw: RawGraph<V>) -> SdfResult<Self> {
        let mut graph: SdfMultigraph<V> = SdfMultigraph::new();

        for (name, actor) in &raw.actors {
            if actor.wcet.is_empty() {
                return Err(SdfError::Parse {
                    context: format!("{name:?}"),
                    message: "wcet vector must have at least one phase".to_string(),
                });
            }
            graph.add_actor(name.clone(), CyclicVector::new(actor.wcet.clone()));
        }

        for ch in &raw.channels {
            if ch.production.is_empty() || ch.consumption.is_empty() {
                return Err(SdfError::Parse {
                    context: format!("{:?} -> {:?}", ch.source, ch.target),
                    message: "production/consumption vectors must have at least one phase"
                        .to_string(),
                });
            }
            let production = CyclicVector::new(ch.production.clone());
            let consumption = CyclicVector::new(ch.consumption.clone());
            if production.full_sum() <= 0 {
                return Err(SdfError::Parse {
                    context: format!("{:?} -> {:?}", ch.source, ch.target),
                    message: format!(
                        "invalid production rate vector (sum = {})",
                        production.full_sum()
                    ),
                });
            }
            if consumption.full_sum() <= 0 {
                return Err(SdfError::Parse {
                    context: format!("{:?} -> {:?}", ch.source, ch.target),
                    message: format!(
                        "invalid consumption rate vector (sum = {})",
                        consumption.full_sum()
                    ),
                });
            }
            let source = graph.actor_index(&ch.source).ok_or_else(|| SdfError::Parse {
                context: format!("{:?}", ch.source),
                message: "channel references an unknown actor".to_string(),
            })?;
            let target = graph.actor_index(&ch.target).ok_or_else(|| SdfError::Parse {
                context: format!("{:?}", ch.target),
                message: "channel references an unknown actor".to_string(),
            })?;
            graph.add_channel(source, target, production, consumption, ch.tokens, ch.capacity);
        }

        let n = graph.actor_count();
        let mut phases = vec![1i64; n];
        for v in 0..n {
            phases[v] = graph.actor(v).wcet.len() as i64;
        }
        for edge in graph.edge_indices() {
            let (source, target) = graph.endpoints(edge);
            let ch = graph.channel(edge);
            phases[source] = lcm(phases[source], ch.production.len() as i64);
            phases[target] = lcm(phases[target], ch.consumption.len() as i64);
        }

        let node_lcm_rates = Self::node_lcm_rates(&graph, n);
        let fractional_q = Self::fractional_repetition_vector(&graph, &phases)?;

        let mut m = BigInt::one();
        for f in fractional_q.values() {
            m = lcm_bigint(&m, f.denom());
        }

        let mut repetition_vector = vec![0i64; n];
        for v in 0..n {
            let value = &fractional_q[&v]
                * BigRational::from_integer(m.clone())
                * BigRational::from_integer(BigInt::from(phases[v]));
            debug_assert!(value.is_integer(), "repetition vector entry must be integral");
            repetition_vector[v] = value.to_integer().to_i64().ok_or_else(|| SdfError::Parse {
                context: format!("{:?}", graph.actor_name(v)),
                message: "repetition vector entry exceeds 64-bit range".to_string(),
            })?;
        }

        let mut tpi = BigInt::one();
        for v in 0..n {
            let value = BigRational::from_integer(node_lcm_rates[v].clone())
                * &fractional_q[&v]
                * BigRational::from_integer(m.clone());
            debug_assert!(value.is_integer(), "modulus contribution must be integral");
            tpi = lcm_bigint(&tpi, &value.to_integer());
        }
        let modulus = tpi.to_i64().ok_or_else(|| SdfError::Parse {
            context: "modulus".to_string(),
            message: "modulus exceeds 64-bit range".to_string(),
        })?;

        let mut normalisation_vector = vec![0i64; graph.channel_count()];
        for edge in graph.edge_indices() {
            let (source, _) = graph.endpoints(edge);
            let ch = graph.channel(edge);
            let numerator = &tpi * BigInt::from(ch.production.len() as i64);
            let denominator = BigInt::from(repetition_vector[source]) * BigInt::from(ch.production.full_sum());
            let (quotient, remainder) = numerator.div_rem(&denominator);
            debug_assert!(remainder.is_zero(), "normalisation vector entry must divide evenly");
            normalisation_vector[edge] = quotient.to_i64().ok_or_else(|| SdfError::Parse {
                context: format!("channel {edge}"),
                message: "normalisation vector entry exceeds 64-bit range".to_string(),
            })?;
        }

        Ok(SdfGraph {
            graph,
            phases,
            repetition_vector,
            normalisation_vector,
            modulus,
        })
    }

    fn node_lcm_rates(graph: &SdfMultigraph<V>, n: usize) -> Vec<BigInt> {
        let mut rates = vec![BigInt::one(); n];
        for edge in graph.edge_indices() {
            let (source, target) = graph.endpoints(edge);
            let ch = graph.channel(edge);

            let p_sum = BigInt::from(ch.production.full_sum());
            let p_len = BigInt::from(ch.production.len() as i64);
            let p_denom = &p_len / p_sum.gcd(&p_len);
            rates[source] = lcm_bigint(&lcm_bigint(&rates[source], &p_sum), &p_denom);

            let c_sum = BigInt::from(ch.consumption.full_sum());
            let c_len = BigInt::from(ch.consumption.len() as i64);
            let c_denom = &c_len / c_sum.gcd(&c_len);
            rates[target] = lcm_bigint(&lcm_bigint(&rates[target], &c_sum), &c_denom);
        }
        rates
    }

    fn fractional_repetition_vector(
        graph: &SdfMultigraph<V>,
        phases: &[i64],
    ) -> SdfResult<HashMap<ActorIndex, BigRational>> {
        let n = graph.actor_count();
        let mut undirected: Vec<Vec<(ActorIndex, EdgeIndex)>> = vec![Vec::new(); n];
        for edge in graph.edge_indices() {
            let (source, target) = graph.endpoints(edge);
            undirected[source].push((target, edge));
            if source != target {
                undirected[target].push((source, edge));
            }
        }

        let mut fractional_q: HashMap<ActorIndex, BigRational> = HashMap::new();
        let mut visited = vec![false; n];

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut stack: Vec<(ActorIndex, usize)> = vec![(start, 0)];
            while let Some(&mut (node, ref mut pos)) = stack.last_mut() {
                if *pos < undirected[node].len() {
                    let (neighbour, edge) = undirected[node][*pos];
                    *pos += 1;
                    Self::visit_edge(graph, phases, &mut fractional_q, edge)?;
                    if !visited[neighbour] {
                        visited[neighbour] = true;
                        stack.push((neighbour, 0));
                    }
                } else {
                    stack.pop();
                }
            }
            fractional_q.entry(start).or_insert_with(BigRational::one);
        }

        Ok(fractional_q)
    }

    fn visit_edge(
        graph: &SdfMultigraph<V>,
        phases: &[i64],
        fractional_q: &mut HashMap<ActorIndex, BigRational>,
        edge: EdgeIndex,
    ) -> SdfResult<()> {
        let (source, target) = graph.endpoints(edge);
        let ch = graph.channel(edge);
        let p_sum = ch.production.sum(0, Some(phases[source]), 1);
        let c_sum = ch.consumption.sum(0, Some(phases[target]), 1);

        if source == target {
            if p_sum != c_sum {
                return Err(SdfError::InconsistentEdge {
                    source_actor: format!("{:?}", graph.actor_name(source)),
                    target_actor: format!("{:?}", graph.actor_name(target)),
                });
            }
            fractional_q.entry(source).or_insert_with(BigRational::one);
            return Ok(());
        }

        if let Some(&reverse) = graph
            .edges_out(target)
            .iter()
            .find(|&&e2| graph.endpoints(e2).1 == source)
        {
            let rev_ch = graph.channel(reverse);
            let p_rev = rev_ch.production.sum(0, Some(phases[target]), 1);
            let c_rev = rev_ch.consumption.sum(0, Some(phases[source]), 1);
            if p_sum * p_rev != c_sum * c_rev {
                return Err(SdfError::InconsistentCycle {
                    a: format!("{:?}", graph.actor_name(source)),
                    b: format!("{:?}", graph.actor_name(target)),
                });
            }
        }

        match (fractional_q.get(&source).cloned(), fractional_q.get(&target).cloned()) {
            (Some(qv), Some(qw)) => {
                if &qv * BigRational::from_integer(BigInt::from(p_sum))
                    != &qw * BigRational::from_integer(BigInt::from(c_sum))
                {
                    return Err(SdfError::InconsistentEdge {
                        source_actor: format!("{:?}", graph.actor_name(source)),
                        target_actor: format!("{:?}", graph.actor_name(target)),
                    });
                }
            }
            (Some(qv), None) => {
                let ratio = BigRational::new(BigInt::from(p_sum), BigInt::from(c_sum));
                fractional_q.insert(target, qv * ratio);
            }
            (None, Some(qw)) => {
                let ratio = BigRational::new(BigInt::from(c_sum), BigInt::from(p_sum));
                fractional_q.insert(source, qw * ratio);
            }
            (None, None) => {
                fractional_q.insert(source, BigRational::one());
                let ratio = BigRational::new(BigInt::from(p_sum), BigInt::from(c_sum));
                fractional_q.insert(target, ratio);
            }
        }

        Ok(())
    }

    pub fn graph(&self) -> &SdfMultigraph<V> {
        &self.graph
    }

    pub fn repetition_vector(&self) -> &[i64] {
        &self.repetition_vector
    }

    pub fn normalisation_vector(&self) -> &[i64] {
        &self.normalisation_vector
    }

    pub fn modulus(&self) -> i64 {
        self.modulus
    }

    pub fn phases(&self, actor: ActorIndex) -> i64 {
        self.phases[actor]
    }

    pub fn period(&self, actor: ActorIndex) -> i64 {
        self.phases[actor]
    }

    /// The closed-form predecessor function of channel `edge`, evaluated
    /// at firing `k` of the consuming actor.
    pub fn predecessor(&self, edge: EdgeIndex, k: i64) -> i64 {
        let ch = self.graph.channel(edge);
        predecessor::predecessor(&ch.production, &ch.consumption, ch.tokens, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawActor, RawChannel, RawGraph};

    fn two_actor_ring(p_rate: i64, c_rate: i64, tokens: i64) -> RawGraph<&'static str> {
        let mut g = RawGraph::new();
        g.actors.insert("A", RawActor { wcet: vec![1] });
        g.actors.insert("B", RawActor { wcet: vec![1] });
        g.channels.push(RawChannel {
            source: "A",
            target: "B",
            production: vec![p_rate],
            consumption: vec![c_rate],
            tokens,
            capacity: None,
        });
        g.channels.push(RawChannel {
            source: "B",
            target: "A",
            production: vec![c_rate],
            consumption: vec![p_rate],
            tokens: 0,
            capacity: None,
        });
        g
    }

    #[test]
    fn consistent_ring_has_repetition_vector() {
        let raw = two_actor_ring(2, 3, 0);
        let sdf = SdfGraph::new(raw).unwrap();
        let a = sdf.graph().actor_index(&"A").unwrap();
        let b = sdf.graph().actor_index(&"B").unwrap();
        // q[A]/q[B] == crate_B/prate_A == 3/2 balance, so q = (3, 2) up to scaling
        assert_eq!(sdf.repetition_vector()[a] * 2, sdf.repetition_vector()[b] * 3);
    }

    #[test]
    fn single_actor_self_loop_requires_balanced_rates() {
        let mut g: RawGraph<&str> = RawGraph::new();
        g.actors.insert("A", RawActor { wcet: vec![1] });
        g.channels.push(RawChannel {
            source: "A",
            target: "A",
            production: vec![1],
            consumption: vec![2],
            tokens: 0,
            capacity: None,
        });
        assert!(SdfGraph::new(g).is_err());
    }

    #[test]
    fn isolated_actor_fires_through_its_whole_phase_pattern_once() {
        let mut g: RawGraph<&str> = RawGraph::new();
        g.actors.insert("Solo", RawActor { wcet: vec![1, 2, 3] });
        let sdf = SdfGraph::new(g).unwrap();
        let idx = sdf.graph().actor_index(&"Solo").unwrap();
        assert_eq!(sdf.repetition_vector()[idx], 3);
    }
}
