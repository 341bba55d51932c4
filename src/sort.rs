use crate::{
    adjacency::AdjacencyList,
    error::{Error, Result},
    types::Value,
};
use std::collections::VecDeque;

/// Kahn's algorithm over `adjacency`, on the calling thread.
///
/// Roots are seeded in index order, so the output is deterministic for a
/// given adjacency list. This is the reference the parallel executor has to
/// agree with.
///
/// # Errors
/// [`Error::CyclicGraph`] if there is no root in a non-empty graph or if some
/// vertices never reach in-degree zero.
pub fn sort<V: Value>(adjacency: &AdjacencyList<V>) -> Result<Vec<V>> {
    if adjacency.is_empty() {
        return Ok(vec![]);
    }

    let mut in_degrees = adjacency.calculate_in_degrees();
    let mut queue: VecDeque<usize> = in_degrees
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(idx, _)| idx)
        .collect();
    if queue.is_empty() {
        return Err(Error::CyclicGraph);
    }

    let mut ordered = Vec::with_capacity(adjacency.len());
    while let Some(idx) = queue.pop_front() {
        ordered.push(idx);
        for child in adjacency.out_neighbor_indices(idx) {
            in_degrees[child] -= 1;
            if in_degrees[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    // Vertices on a cycle never reach zero and are never emitted.
    if ordered.len() != adjacency.len() {
        return Err(Error::CyclicGraph);
    }

    Ok(ordered
        .into_iter()
        .filter_map(|idx| adjacency.pair_at(idx))
        .map(|pair| pair.vertex().get().clone())
        .collect())
}
