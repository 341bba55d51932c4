use indexmap::{IndexMap as _IndexMap, IndexSet as _IndexSet};
use rustc_hash::FxBuildHasher;
use std::collections::{HashMap as _HashMap, HashSet as _HashSet};

/// Bounds every vertex value must satisfy to travel between pool workers.
///
/// Blanket-implemented; values are cloned into the adjacency list snapshot
/// and into each dependent's input aggregate.
pub trait Value: Clone + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static {}

/// Bounds every callback output must satisfy.
pub trait Output: Clone + Send + Sync + 'static {}

impl<T> Output for T where T: Clone + Send + Sync + 'static {}

pub(crate) type HashMap<K, V> = _HashMap<K, V, FxBuildHasher>;
pub(crate) type HashSet<T> = _HashSet<T, FxBuildHasher>;
/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
/// `IndexSet` type with fast hasher.
pub type IndexSet<T> = _IndexSet<T, FxBuildHasher>;
