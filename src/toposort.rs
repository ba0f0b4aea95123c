//! Kahn's topological sort over dense node indices.

use smallvec::SmallVec;
use std::collections::VecDeque;

/// Successor lists: `edges[a]` holds every `b` that must come after `a`.
pub type Edges = [SmallVec<[usize; 4]>];

/// Order nodes `0..edges.len()` so every edge points forward.
///
/// Nodes become ready in index order and are emitted first-in first-out, so
/// unrelated nodes keep their relative index order. On a cycle, returns the
/// nodes that could not be placed.
pub fn toposort(edges: &Edges) -> Result<Vec<usize>, Vec<usize>> {
    let n = edges.len();
    let mut incoming = vec![0usize; n];
    for successors in edges {
        for &m in successors {
            incoming[m] += 1;
        }
    }

    let mut ready: VecDeque<usize> = (0..n).filter(|&v| incoming[v] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(v) = ready.pop_front() {
        order.push(v);
        for &m in &edges[v] {
            incoming[m] -= 1;
            if incoming[m] == 0 {
                ready.push_back(m);
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err((0..n).filter(|&v| incoming[v] > 0).collect())
    }
}
