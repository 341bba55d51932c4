#![allow(dead_code)]

use cdg::{
    config::PoolConfig,
    error::RejectedSubmission,
    graph::Graph,
    pool::{Job, WorkerPool},
    types::Value,
};
use rayon::ThreadPool;
use std::{
    sync::{
        Arc, Condvar, Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// A graph with its expected ending vertices and the orderings the
/// sequential sort may produce. Cyclic fixtures have no orderings, and their
/// `ending` lists the ending vertices reachable without passing a cycle.
pub struct Fixture<V> {
    pub name: &'static str,
    pub graph: Graph<V>,
    pub ending: Vec<V>,
    pub orderings: Vec<Vec<V>>,
}

impl<V: Value> Fixture<V> {
    pub fn is_cyclic(&self) -> bool {
        self.orderings.is_empty()
    }
}

fn fixture<V: Value>(
    name: &'static str,
    graph: Graph<V>,
    ending: &[V],
    orderings: &[&[V]],
) -> Fixture<V> {
    Fixture {
        name,
        graph,
        ending: ending.to_vec(),
        orderings: orderings.iter().map(|ordering| ordering.to_vec()).collect(),
    }
}

pub fn string_fixtures() -> Vec<Fixture<&'static str>> {
    let mut simple_4 = Graph::from_values(["A", "B"]);
    simple_4.add_edge("B", "A");

    let mut valid_1 = Graph::from_values(["A", "B", "C", "D", "E", "F"]);
    valid_1
        .add_edge("A", "B")
        .add_edge("A", "D")
        .add_edge("B", "C")
        .add_edge("C", "D")
        .add_edge("C", "E")
        .add_edge("D", "E");

    //   A --> D --> E
    //   | \   ^
    //   |  \  |
    //   v   v |
    //   C <-- B <-- F
    let mut valid_3 = Graph::new();
    valid_3
        .add_vertices(["A", "B", "C", "D", "E", "F"])
        .add_edge("A", "B")
        .add_edge("A", "C")
        .add_edge("A", "D")
        .add_edge("B", "C")
        .add_edge("B", "D")
        .add_edge("D", "E")
        .add_edge("F", "B");

    vec![
        fixture("valid_simple_1", Graph::new(), &[], &[&[]]),
        fixture("valid_simple_2", Graph::from_values(["A"]), &["A"], &[&["A"]]),
        fixture(
            "valid_simple_3",
            Graph::from_values(["A", "B"]),
            &["A", "B"],
            &[&["A", "B"]],
        ),
        fixture("valid_simple_4", simple_4, &["A"], &[&["B", "A"]]),
        fixture(
            "valid_1",
            valid_1,
            &["E", "F"],
            &[
                &["A", "B", "C", "D", "E", "F"],
                &["F", "A", "B", "C", "D", "E"],
                &["A", "F", "B", "C", "D", "E"],
            ],
        ),
        fixture(
            "valid_3",
            valid_3,
            &["C", "E"],
            &[&["A", "F", "B", "C", "D", "E"]],
        ),
        fixture(
            "cycle_1",
            Graph::from_edges([("A", "B"), ("B", "A")]),
            &[],
            &[],
        ),
        fixture(
            "cycle_2",
            Graph::from_edges([("A", "B"), ("B", "C"), ("C", "A")]),
            &[],
            &[],
        ),
    ]
}

fn valid_2() -> Graph<u32> {
    let mut graph = Graph::from_values(1..=9);
    graph
        .add_edge(1, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(4, 3)
        .add_edge(4, 6)
        .add_edge(5, 8)
        .add_edge(6, 5)
        .add_edge(6, 8)
        .add_edge(9, 8);
    graph
}

pub fn number_fixtures() -> Vec<Fixture<u32>> {
    let mut valid_4 = Graph::from_values(1..=6);
    valid_4
        .add_edge(1, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(2, 4)
        .add_edge(2, 5)
        .add_edge(3, 4)
        .add_edge(5, 3)
        .add_edge(6, 3)
        .add_edge(6, 5);

    let mut valid_5 = Graph::from_values(1..=5);
    valid_5
        .add_edge(1, 2)
        .add_edge(2, 3)
        .add_edge(3, 4)
        .add_edge(4, 5);

    // 4 -> 6 -> 5 -> 4. Ending vertex 3 waits on 4 and 8 on 5 and 6, so only
    // the isolated 7 completes.
    let mut cycle_3 = valid_2();
    cycle_3.add_edge(5, 4);

    vec![
        fixture(
            "valid_2",
            valid_2(),
            &[3, 7, 8],
            &[
                &[7, 9, 1, 4, 6, 5, 8, 2, 3],
                &[1, 2, 9, 7, 4, 6, 3, 5, 8],
                &[1, 7, 9, 2, 4, 3, 6, 5, 8],
            ],
        ),
        fixture("valid_4", valid_4, &[4], &[&[1, 6, 2, 5, 3, 4]]),
        fixture("valid_5", valid_5, &[5], &[&[1, 2, 3, 4, 5]]),
        fixture("cycle_3", cycle_3, &[7], &[]),
    ]
}

/// Assert `order` is a permutation of the graph's vertices with every edge
/// pointing forward.
pub fn assert_respects_edges<V: Value>(graph: &Graph<V>, order: &[V]) {
    assert_eq!(order.len(), graph.vertices().len(), "{order:?}");
    for vertex in graph.vertices() {
        assert!(order.contains(vertex.get()), "{vertex:?} missing from {order:?}");
    }
    let position = |value: &V| order.iter().position(|v| v == value);
    for edge in graph.edges() {
        assert!(
            position(edge.from().get()) < position(edge.to().get()),
            "{edge} violated by {order:?}"
        );
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A pool shared by every test in the binary.
pub fn shared_pool() -> Arc<ThreadPool> {
    static POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();
    Arc::clone(POOL.get_or_init(|| {
        Arc::new(
            PoolConfig::default()
                .num_threads(6)
                .thread_name_prefix("test-worker")
                .build()
                .expect("test pool"),
        )
    }))
}

/// Accepts the first `accept` jobs, then behaves like a pool that is
/// shutting down.
pub struct RejectingPool {
    inner: ThreadPool,
    accept: usize,
    submitted: AtomicUsize,
}

impl RejectingPool {
    pub fn new(accept: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: PoolConfig::default().num_threads(2).build().expect("test pool"),
            accept,
            submitted: AtomicUsize::new(0),
        })
    }
}

impl WorkerPool for RejectingPool {
    fn submit(&self, job: Job) -> Result<(), RejectedSubmission> {
        if self.submitted.fetch_add(1, Ordering::SeqCst) < self.accept {
            self.inner.spawn(job);
            Ok(())
        } else {
            Err(RejectedSubmission::new("shutting down"))
        }
    }
}

/// Runs every job on the submitting thread.
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn submit(&self, job: Job) -> Result<(), RejectedSubmission> {
        job();
        Ok(())
    }
}

/// One-shot latch callbacks can block on.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    pub fn wait(&self) {
        let guard = self.open.lock().unwrap();
        let _guard = self
            .opened
            .wait_timeout_while(guard, Duration::from_secs(10), |open| !*open)
            .unwrap();
    }
}
