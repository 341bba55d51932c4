use crate::{
    error::{Error, Result},
    graph::{Edge, Vertex},
    types::{HashMap, IndexSet, Value},
};
use rustc_hash::FxBuildHasher;

/// A vertex together with the vertices that depend on it.
#[derive(Debug, Clone)]
pub struct AdjacencyPair<V> {
    vertex: Vertex<V>,
    out_neighbors: Vec<Vertex<V>>,
}

impl<V> AdjacencyPair<V> {
    /// The vertex this pair describes.
    pub fn vertex(&self) -> &Vertex<V> {
        &self.vertex
    }

    /// Vertices depending on this one, in edge order.
    pub fn out_neighbors(&self) -> &[Vertex<V>] {
        &self.out_neighbors
    }

    /// A vertex nothing depends on. Its callback output is part of the
    /// final result set.
    pub fn is_ending(&self) -> bool {
        self.out_neighbors.is_empty()
    }
}

/// Read-only index over a graph snapshot.
///
/// Indices follow vertex-set iteration order and are only meaningful for
/// the lifetime of this list. In-degree vectors and the executor's units are
/// positional over those indices.
#[must_use]
#[derive(Debug, Clone)]
pub struct AdjacencyList<V> {
    pairs: Vec<AdjacencyPair<V>>,
    index: HashMap<Vertex<V>, usize>,
    ending: IndexSet<Vertex<V>>,
}

impl<V: Value> AdjacencyList<V> {
    /// Build the list in one pass over the edges.
    ///
    /// # Errors
    /// [`Error::InvalidGraph`] if an edge names a vertex outside `vertices`.
    pub fn new<'a>(
        vertices: impl IntoIterator<Item = &'a Vertex<V>>,
        edges: impl IntoIterator<Item = &'a Edge<V>>,
    ) -> Result<Self> {
        let vertices = vertices.into_iter();
        let mut index = HashMap::with_capacity_and_hasher(vertices.size_hint().0, FxBuildHasher);
        let mut pairs = Vec::with_capacity(vertices.size_hint().0);
        for vertex in vertices {
            if index.contains_key(vertex) {
                continue;
            }
            index.insert(vertex.clone(), pairs.len());
            pairs.push(AdjacencyPair {
                vertex: vertex.clone(),
                out_neighbors: vec![],
            });
        }

        for edge in edges {
            let (Some(&from), true) = (index.get(edge.from()), index.contains_key(edge.to())) else {
                return Err(Error::InvalidGraph {
                    edge: edge.to_string(),
                });
            };
            let out_neighbors = &mut pairs[from].out_neighbors;
            // Edge sets are deduplicated upstream, but a raw iterator may repeat.
            if !out_neighbors.contains(edge.to()) {
                out_neighbors.push(edge.to().clone());
            }
        }

        let ending = pairs
            .iter()
            .filter(|pair| pair.is_ending())
            .map(|pair| pair.vertex.clone())
            .collect();

        Ok(Self {
            pairs,
            index,
            ending,
        })
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `true` for a graph without vertices.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Positional index of `value`.
    pub fn index_of(&self, value: &V) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// Pair at positional `index`.
    pub fn pair_at(&self, index: usize) -> Option<&AdjacencyPair<V>> {
        self.pairs.get(index)
    }

    /// Out-neighbors of the vertex at positional `index`.
    pub fn out_neighbors_at(&self, index: usize) -> Option<&[Vertex<V>]> {
        self.pair_at(index).map(AdjacencyPair::out_neighbors)
    }

    /// Out-neighbors of `value`.
    pub fn out_neighbors_for(&self, value: &V) -> Option<&[Vertex<V>]> {
        self.out_neighbors_at(self.index_of(value)?)
    }

    /// Count, for every vertex, how many out-neighbor lists name it.
    ///
    /// Always recomputed; the result is private to the caller.
    pub fn calculate_in_degrees(&self) -> Vec<usize> {
        let mut in_degrees = vec![0; self.len()];
        for pair in &self.pairs {
            for neighbor in &pair.out_neighbors {
                in_degrees[self.index[neighbor]] += 1;
            }
        }
        in_degrees
    }

    /// Whether nothing depends on `value`.
    pub fn is_ending_vertex(&self, value: &V) -> bool {
        self.ending.contains(value)
    }

    /// Vertices nothing depends on, in vertex order.
    pub fn ending_vertices(&self) -> &IndexSet<Vertex<V>> {
        &self.ending
    }

    /// Pairs in positional order.
    pub fn iter(&self) -> core::slice::Iter<'_, AdjacencyPair<V>> {
        self.pairs.iter()
    }

    /// Positional out-neighbor indices, used by the executor to link units.
    pub(crate) fn out_neighbor_indices(&self, index: usize) -> Vec<usize> {
        self.pairs[index]
            .out_neighbors
            .iter()
            .map(|neighbor| self.index[neighbor])
            .collect()
    }
}

impl<'a, V> IntoIterator for &'a AdjacencyList<V> {
    type Item = &'a AdjacencyPair<V>;
    type IntoIter = core::slice::Iter<'a, AdjacencyPair<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
