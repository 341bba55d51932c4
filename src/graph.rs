use crate::{
    adjacency::AdjacencyList,
    config::PoolConfig,
    error::{Error, Result},
    executor::Executor,
    pool::WorkerPool,
    result::AsyncResult,
    sort,
    task::{Coordinator, Inputs},
    types::{IndexSet, Output, Value},
};
use core::{borrow::Borrow, fmt};
use derive_more::{Deref, Display, From};
use std::sync::Arc;

/// A graph node wrapping a caller value.
///
/// Equality and hashing are those of the wrapped value, so two vertices
/// wrapping equal values are the same vertex.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, From)]
#[repr(transparent)]
pub struct Vertex<V>(V);

impl<V> Vertex<V> {
    /// Wrap `value`.
    pub fn new(value: V) -> Self {
        Self(value)
    }

    /// The wrapped value.
    pub fn get(&self) -> &V {
        &self.0
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> V {
        self.0
    }
}

impl<V> Borrow<V> for Vertex<V> {
    fn borrow(&self) -> &V {
        &self.0
    }
}

/// A directed dependency: `to` depends on `from`, so `from` is processed
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge<V> {
    from: Vertex<V>,
    to: Vertex<V>,
}

impl<V> Edge<V> {
    /// Edge making `to` depend on `from`.
    pub fn new(from: V, to: V) -> Self {
        Self {
            from: Vertex(from),
            to: Vertex(to),
        }
    }

    /// The vertex processed first.
    pub fn from(&self) -> &Vertex<V> {
        &self.from
    }

    /// The dependent vertex.
    pub fn to(&self) -> &Vertex<V> {
        &self.to
    }
}

impl<V: fmt::Debug> fmt::Display for Edge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.from.0, self.to.0)
    }
}

/// A mutable set of vertices and dependency edges.
///
/// Both sets keep insertion order and ignore duplicates. Cycles are not
/// rejected here; they surface when the graph is sorted.
#[must_use]
#[derive(Debug, Clone)]
pub struct Graph<V> {
    vertices: IndexSet<Vertex<V>>,
    edges: IndexSet<Edge<V>>,
}

impl<V: Value> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> Graph<V> {
    /// Empty graph.
    pub fn new() -> Self {
        Self {
            vertices: IndexSet::default(),
            edges: IndexSet::default(),
        }
    }

    /// Build a graph with the given vertices and no edges.
    pub fn from_values(values: impl IntoIterator<Item = V>) -> Self {
        let mut graph = Self::new();
        graph.add_vertices(values);
        graph
    }

    /// Build a graph from edges, adding every endpoint as a vertex in order
    /// of first appearance.
    pub fn from_edges(edges: impl IntoIterator<Item = (V, V)>) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph
                .add_vertex(from.clone())
                .add_vertex(to.clone())
                .add_edge(from, to);
        }
        graph
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> &IndexSet<Vertex<V>> {
        &self.vertices
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &IndexSet<Edge<V>> {
        &self.edges
    }

    /// Whether `value` is one of the vertices.
    pub fn contains_vertex(&self, value: &V) -> bool {
        self.vertices.contains(value)
    }

    /// Add a vertex; a duplicate is ignored.
    pub fn add_vertex(&mut self, value: V) -> &mut Self {
        self.vertices.insert(Vertex(value));
        self
    }

    /// Add every value as a vertex, skipping duplicates.
    pub fn add_vertices(&mut self, values: impl IntoIterator<Item = V>) -> &mut Self {
        self.vertices.extend(values.into_iter().map(Vertex));
        self
    }

    /// Remove a vertex. Edges naming it are kept, so the graph stops
    /// validating until they are removed too.
    pub fn remove_vertex(&mut self, value: &V) -> &mut Self {
        self.vertices.shift_remove(value);
        self
    }

    /// Make `to` depend on `from`. Endpoints are checked when sorting.
    pub fn add_edge(&mut self, from: V, to: V) -> &mut Self {
        self.edges.insert(Edge::new(from, to));
        self
    }

    /// Remove the edge `from -> to` if present.
    pub fn remove_edge(&mut self, from: V, to: V) -> &mut Self {
        self.edges.shift_remove(&Edge::new(from, to));
        self
    }

    /// Check that every edge endpoint is one of the graph's vertices.
    ///
    /// # Errors
    /// [`Error::InvalidGraph`] naming the first offending edge.
    pub fn validate(&self) -> Result<()> {
        match self
            .edges
            .iter()
            .find(|edge| !self.vertices.contains(&edge.from) || !self.vertices.contains(&edge.to))
        {
            Some(edge) => Err(Error::InvalidGraph {
                edge: edge.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Snapshot the graph into an adjacency list.
    ///
    /// # Errors
    /// [`Error::InvalidGraph`] if validation fails.
    pub fn adjacency_list(&self) -> Result<AdjacencyList<V>> {
        AdjacencyList::new(&self.vertices, &self.edges)
    }

    /// Topologically sort the vertex values on the calling thread.
    ///
    /// # Errors
    /// [`Error::InvalidGraph`] or [`Error::CyclicGraph`].
    pub fn sort(&self) -> Result<Vec<V>> {
        sort::sort(&self.adjacency_list()?)
    }

    /// Execute `on_vertex` for every vertex on `pool`, honoring the edges.
    ///
    /// # Errors
    /// Only [`Error::InvalidGraph`]; execution failures are reported through
    /// the returned [`AsyncResult`].
    pub fn sort_async<P, O, F>(&self, pool: Arc<P>, on_vertex: F) -> Result<AsyncResult<V, O>>
    where
        P: WorkerPool + 'static,
        O: Output,
        F: Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        Ok(Executor::new(pool).execute_async(self.adjacency_list()?, on_vertex))
    }

    /// Like [`Graph::sort_async`], with an error callback.
    ///
    /// # Errors
    /// Only [`Error::InvalidGraph`].
    pub fn sort_async_with_errors<P, O, F, E>(
        &self,
        pool: Arc<P>,
        on_vertex: F,
        on_error: E,
    ) -> Result<AsyncResult<V, O>>
    where
        P: WorkerPool + 'static,
        O: Output,
        F: Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync + 'static,
        E: Fn(Option<&V>, &Error, &Coordinator) + Send + Sync + 'static,
    {
        Ok(Executor::new(pool).execute_async_with_errors(
            self.adjacency_list()?,
            on_vertex,
            on_error,
        ))
    }

    /// Like [`Graph::sort_async`] on a fresh pool built from
    /// [`PoolConfig::default`]. The pool lives as long as the run does.
    ///
    /// # Errors
    /// [`Error::InvalidGraph`] or [`Error::PoolBuild`].
    pub fn sort_async_default<O, F>(&self, on_vertex: F) -> Result<AsyncResult<V, O>>
    where
        O: Output,
        F: Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        let adjacency = self.adjacency_list()?;
        let pool = Arc::new(PoolConfig::default().build()?);
        Ok(Executor::new(pool).execute_async(adjacency, on_vertex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_ignored_and_order_is_kept() {
        let mut graph = Graph::from_values(["C", "A", "B", "A"]);
        graph.add_edge("A", "B").add_edge("A", "B");
        let order: Vec<_> = graph.vertices().iter().map(|v| *v.get()).collect();
        assert_eq!(order, ["C", "A", "B"]);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn validate_rejects_dangling_edges() {
        let mut graph = Graph::from_values(["A", "B"]);
        graph.add_edge("A", "B");
        assert!(graph.validate().is_ok());

        graph.add_edge("B", "Z");
        assert!(matches!(graph.validate(), Err(Error::InvalidGraph { .. })));
        assert!(matches!(graph.sort(), Err(Error::InvalidGraph { .. })));
    }

    #[test]
    fn removing_a_vertex_leaves_its_edges_dangling() {
        let mut graph = Graph::from_edges([("A", "B")]);
        graph.remove_vertex(&"B");
        assert!(!graph.contains_vertex(&"B"));
        assert!(graph.validate().is_err());

        graph.remove_edge("A", "B");
        assert!(graph.validate().is_ok());
        assert_eq!(graph.sort().unwrap(), ["A"]);
    }

    #[test]
    fn copies_are_independent() {
        let original = Graph::from_edges([(1, 2)]);
        let mut copy = original.clone();
        copy.add_edge(2, 1);
        assert_eq!(original.edges().len(), 1);
        assert!(original.sort().is_ok());
        assert!(copy.sort().unwrap_err().is_cycle());
    }
}
