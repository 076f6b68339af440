//! Longest- and shortest-distance computation over a (possibly cyclic)
//! weighted directed multigraph, with cycle detection.
//!
//! Grounded on `sdfpy/graphs.py`'s `longest_distances`/`shortest_distances`:
//! a DFS pass builds a spanning forest and a reverse-postorder node
//! ordering, then repeated relaxation passes over that ordering converge
//! on the extremal distances in any graph whose only cycles have weight
//! zero (the CSDF balance invariant). A cycle with the wrong-signed total
//! weight is witnessed and reported rather than silently ignored, since it
//! means the rate graph deadlocks or is unschedulable.

use fixedbitset::FixedBitSet;

use crate::error::{Cycle, CycleError, EdgeRef, PathResult};

/// One weighted directed edge, tagged with the [`EdgeRef`] identifying it
/// for cycle witnesses.
#[derive(Debug, Clone, Copy)]
pub struct WeightedEdge {
    pub from: usize,
    pub to: usize,
    pub weight: i64,
    pub edge: EdgeRef,
}

fn adjacency(n: usize, edges: &[WeightedEdge]) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); n];
    for (i, e) in edges.iter().enumerate() {
        out[e.from].push(i);
    }
    out
}

/// Reverse-postorder DFS over the nodes reachable from `root` (a node with
/// no incoming unvisited edges from an earlier-discovered node sorts
/// first). Nodes `root` cannot reach never appear in the returned order.
fn reverse_postorder(root: usize, n: usize, adj: &[Vec<usize>], edges: &[WeightedEdge]) -> Vec<usize> {
    let mut visited = FixedBitSet::with_capacity(n);
    let mut order = Vec::with_capacity(n);

    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    visited.insert(root);
    while let Some(&mut (node, ref mut next)) = stack.last_mut() {
        if *next < adj[node].len() {
            let edge_idx = adj[node][*next];
            *next += 1;
            let to = edges[edge_idx].to;
            if !visited[to] {
                visited.insert(to);
                stack.push((to, 0));
            }
        } else {
            order.push(node);
            stack.pop();
        }
    }
    order.reverse();
    order
}

/// Given a predecessor-edge map and a node known to lie on a cycle, walks
/// predecessor pointers until the cycle closes and returns it.
fn extract_cycle(pred: &[Option<usize>], edges: &[WeightedEdge], start: usize) -> Cycle {
    let mut seen = vec![usize::MAX; pred.len()];
    let mut node = start;
    let mut order = Vec::new();
    loop {
        if seen[node] != usize::MAX {
            let cycle_edges: Vec<EdgeRef> = order[seen[node]..]
                .iter()
                .map(|&edge_idx: &usize| edges[edge_idx].edge)
                .collect();
            return Cycle::canonicalise(cycle_edges);
        }
        seen[node] = order.len();
        let edge_idx = pred[node].expect("node on a cycle must have a predecessor");
        order.push(edge_idx);
        node = edges[edge_idx].from;
    }
}

/// The in-edge of each node in the longest/shortest-paths tree rooted at
/// the `root` passed to [`longest_distances`]/[`shortest_distances`].
/// `parents[root]` and every node `root` cannot reach are `None`.
pub type Parents = Vec<Option<EdgeRef>>;

/// Core relaxation: if `maximize`, computes longest distances from `root`
/// and flags a cycle whose total weight is `> 0`; otherwise computes
/// shortest distances and flags a cycle whose total weight is `< 0`.
/// `distances[root] == 0`; tree edges sum to the stored distances.
fn relax(n: usize, edges: &[WeightedEdge], root: usize, maximize: bool) -> Result<(Parents, Vec<i64>), Cycle> {
    let adj = adjacency(n, edges);
    let order = reverse_postorder(root, n, &adj, edges);

    let mut dist = vec![0i64; n];
    let mut pred: Vec<Option<usize>> = vec![None; n];
    let mut reached = FixedBitSet::with_capacity(n);
    reached.insert(root);

    let better = |a: i64, b: i64| if maximize { a > b } else { a < b };

    for _pass in 0..=order.len() {
        let mut improved = false;
        for &node in &order {
            if !reached[node] {
                continue;
            }
            for &edge_idx in &adj[node] {
                let e = edges[edge_idx];
                let candidate = dist[node] + e.weight;
                if !reached[e.to] || better(candidate, dist[e.to]) {
                    dist[e.to] = candidate;
                    pred[e.to] = Some(edge_idx);
                    reached.insert(e.to);
                    improved = true;
                }
            }
        }
        if !improved {
            let parents = pred.iter().map(|p| p.map(|idx| edges[idx].edge)).collect();
            return Ok((parents, dist));
        }
    }

    // still improving after order.len()+1 passes: some reachable node lies
    // on a wrong-signed cycle. Find one more relaxable edge and walk back.
    for &node in &order {
        if !reached[node] {
            continue;
        }
        for &edge_idx in &adj[node] {
            let e = edges[edge_idx];
            let candidate = dist[node] + e.weight;
            if better(candidate, dist[e.to]) {
                pred[e.to] = Some(edge_idx);
                return Err(extract_cycle(&pred, edges, e.to));
            }
        }
    }
    unreachable!("relaxation claimed to not converge but no improving edge was found")
}

/// The longest distance from `root` to every node it reaches, with the
/// predecessor tree that realizes those distances. Errors if a reachable
/// cycle has strictly positive total weight.
pub fn longest_distances(n: usize, root: usize, edges: &[WeightedEdge]) -> PathResult<(Parents, Vec<i64>)> {
    relax(n, edges, root, true).map_err(CycleError::PositiveCycle)
}

/// The shortest distance from `root` to every node it reaches, with the
/// predecessor tree that realizes those distances. Errors if a reachable
/// cycle has strictly negative total weight.
pub fn shortest_distances(n: usize, root: usize, edges: &[WeightedEdge]) -> PathResult<(Parents, Vec<i64>)> {
    relax(n, edges, root, false).map_err(CycleError::NegativeCycle)
}
