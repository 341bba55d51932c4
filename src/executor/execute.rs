use crate::{
    error::{Error, RejectedSubmission},
    executor::Run,
    pool::WorkerPool,
    sync::{Arc, Ordering, lock},
    task::Inputs,
    types::{HashMap, HashSet, Output, Value},
};
use core::{any::Any, cell::RefCell, mem};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

crate::sync::thread_local! {
    // Addresses of the runs driven further up this thread's stack.
    static DRIVING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

impl<V: Value, O: Output, P: WorkerPool + ?Sized + 'static> Run<V, O, P> {
    /// Hand the step of unit `idx` to the pool.
    ///
    /// The caller must already have counted this job in `outstanding`.
    pub(super) fn submit(self: &Arc<Self>, idx: usize) -> Result<(), RejectedSubmission> {
        let run = Arc::clone(self);
        self.pool.submit(Box::new(move || run.drive(idx)))
    }

    /// Body of every submitted job.
    ///
    /// A pool running jobs inline would nest one step per dependency level.
    /// A job for a run this thread is already driving is queued on the run
    /// instead, and the outer call loops over that queue.
    fn drive(self: &Arc<Self>, idx: usize) {
        let key = Arc::as_ptr(self) as usize;
        let nested = DRIVING.with(|driving| {
            let mut driving = driving.borrow_mut();
            let nested = driving.contains(&key);
            if !nested {
                driving.push(key);
            }
            nested
        });
        if nested {
            // The queued step keeps its outstanding count until it runs.
            lock(&self.deferred).push_back(idx);
            return;
        }

        let mut next = Some(idx);
        while let Some(idx) = next {
            self.step(idx);
            next = lock(&self.deferred).pop_front();
        }
        DRIVING.with(|driving| {
            let popped = driving.borrow_mut().pop();
            assert_eq!(popped, Some(key), "Run::drive: [1]");
        });
    }

    /// One arrival at unit `idx`: either the arrival that makes it ready, or
    /// a no-op apart from releasing the outstanding count it carried.
    fn step(self: &Arc<Self>, idx: usize) {
        let unit = &self.units[idx];
        // AcqRel: the arrival reaching zero must observe every earlier
        // predecessor's input write.
        if unit.parents_left.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.process(idx);
        }
        self.release();
    }

    fn process(self: &Arc<Self>, idx: usize) {
        let unit = &self.units[idx];
        let pair = self.adjacency.pair_at(idx).expect("Run::process: [1]");
        let value = pair.vertex().get();

        let removed = lock(&self.remaining).remove(&idx);
        assert!(removed, "Run::process: [2]");

        // Every predecessor wrote before submitting this unit and the unit runs
        // at most once, so the aggregate can be moved out.
        let inputs = Inputs::new(unit.is_start, mem::take(&mut *lock(&unit.inputs)));
        trace!(vertex = ?value, inputs = inputs.len(), "processing vertex");

        let (output, failure) = match panic::catch_unwind(AssertUnwindSafe(|| {
            (self.on_vertex)(value, &inputs, &self.coordinator)
        })) {
            Ok(Ok(output)) => (Some(output), None),
            Ok(Err(err)) => (None, Some(Error::Callback(err))),
            Err(payload) => (None, Some(Error::CallbackPanicked(panic_message(&*payload)))),
        };
        if failure.is_some() {
            self.failed.store(true, Ordering::Release);
        }

        if let (true, Some(output)) = (pair.is_ending(), &output) {
            lock(&self.results).insert(value.clone(), output.clone());
        }

        // Once discontinued, already submitted units drain but nothing new is
        // handed out.
        if !self.coordinator.is_processing_discontinued() {
            for &child in &unit.children {
                lock(&self.units[child].inputs).insert(value.clone(), output.clone());
                self.outstanding.fetch_add(1, Ordering::AcqRel);
                if let Err(rejected) = self.submit(child) {
                    // Can't reach zero here: this step still holds its own count.
                    self.outstanding.fetch_sub(1, Ordering::AcqRel);
                    self.reject(child, rejected);
                }
            }
        }

        if let Some(failure) = failure {
            self.report(Some(value), &failure);
        }
    }

    /// Give back one outstanding count; whoever returns the last one
    /// finalizes the run.
    pub(super) fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finish();
        }
    }

    fn finish(&self) {
        let remaining = mem::take(&mut *lock(&self.remaining));
        let discontinued = self.coordinator.is_processing_discontinued();
        let rejected = self.rejected.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);

        // Nothing is in flight, yet some units never became ready. If we never
        // stopped submitting, only a cycle explains that. Otherwise the
        // leftovers may simply be unsubmitted, so look for a cycle among them.
        let cyclic = !remaining.is_empty()
            && (!(discontinued || rejected) || self.has_cycle(&remaining));
        if cyclic {
            self.report(None, &Error::CyclicGraph);
        }

        let successful = remaining.is_empty() && !failed && !rejected && !discontinued;
        let results = mem::take(&mut *lock(&self.results));
        debug!(
            successful,
            remaining = remaining.len(),
            results = results.len(),
            "graph execution finished"
        );
        let completed = self.handle.complete(results, successful);
        assert!(completed, "Run::finish: [1]");
    }

    /// Whether the units in `remaining` contain a cycle.
    ///
    /// Every predecessor outside `remaining` has run, so peeling off units
    /// with no predecessor left inside the set leaves exactly the units on or
    /// behind a cycle.
    fn has_cycle(&self, remaining: &HashSet<usize>) -> bool {
        let mut in_degrees: HashMap<usize, usize> =
            remaining.iter().map(|&idx| (idx, 0)).collect();
        for &idx in remaining {
            for child in &self.units[idx].children {
                if let Some(in_degree) = in_degrees.get_mut(child) {
                    *in_degree += 1;
                }
            }
        }

        let mut ready: Vec<usize> = in_degrees
            .iter()
            .filter(|&(_, &in_degree)| in_degree == 0)
            .map(|(&idx, _)| idx)
            .collect();
        let mut peeled = 0;
        while let Some(idx) = ready.pop() {
            peeled += 1;
            for &child in &self.units[idx].children {
                if let Some(in_degree) = in_degrees.get_mut(&child) {
                    *in_degree -= 1;
                    if *in_degree == 0 {
                        ready.push(child);
                    }
                }
            }
        }
        peeled < remaining.len()
    }

    pub(super) fn reject(&self, idx: usize, rejected: RejectedSubmission) {
        self.rejected.store(true, Ordering::Release);
        let value = self
            .adjacency
            .pair_at(idx)
            .expect("Run::reject: [1]")
            .vertex()
            .get();
        self.report(Some(value), &Error::SubmissionRejected(rejected));
    }

    /// Deliver `error` to the error callback. A panicking callback is
    /// swallowed so it cannot take the worker down.
    pub(super) fn report(&self, vertex: Option<&V>, error: &Error) {
        warn!(vertex = ?vertex, %error, "graph execution error");
        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.on_error)(vertex, error, &self.coordinator);
        }));
        if notified.is_err() {
            debug!("error callback panicked");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
