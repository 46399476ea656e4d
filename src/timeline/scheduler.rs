//! One-shot timers on a host-driven clock
//!
//! Nothing here reads wall time. The host feeds its current time through
//! `pop_due`/`advance_to`, which makes every delay reproducible in tests.
//! Each scheduled task hands back a `TaskHandle` that can cancel it.

/// Identifies one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// A task whose due time has been reached
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub handle: TaskHandle,
    pub due_ms: f64,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    handle: TaskHandle,
    due_ms: f64,
    payload: T,
}

/// Cancellable one-shot timer queue
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: f64,
    next_id: u64,
    /// Kept in scheduling order; ids are monotonic so they double as tiebreak
    queue: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            queue: Vec::new(),
        }
    }

    /// Current clock value
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Schedule `payload` to fire no earlier than `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: f64, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.queue.push(Pending {
            handle,
            due_ms: self.now_ms + delay_ms.max(0.0),
            payload,
        });
        handle
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.queue.len();
        self.queue.retain(|task| task.handle != handle);
        self.queue.len() != before
    }

    /// Drop every pending task, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let cleared = self.queue.len();
        self.queue.clear();
        cleared
    }

    /// Number of tasks still waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.iter().any(|task| task.handle == handle)
    }

    /// Handles of pending tasks, earliest first
    pub fn pending_handles(&self) -> Vec<TaskHandle> {
        let mut tasks: Vec<_> = self.queue.iter().map(|t| (t.due_ms, t.handle)).collect();
        tasks.sort_by(|(due_a, a), (due_b, b)| due_a.total_cmp(due_b).then(a.0.cmp(&b.0)));
        tasks.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Remove and return the earliest task due at or before `until_ms`.
    ///
    /// The clock jumps to the task's due time, so anything scheduled while
    /// handling it is measured from when it fired rather than from `until_ms`.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<Fired<T>> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .total_cmp(&b.due_ms)
                    .then(a.handle.0.cmp(&b.handle.0))
            })
            .map(|(i, _)| i)?;

        let task = self.queue.remove(index);
        if task.due_ms > self.now_ms {
            self.now_ms = task.due_ms;
        }
        Some(Fired {
            handle: task.handle,
            due_ms: task.due_ms,
            payload: task.payload,
        })
    }

    /// Move the clock forward without firing anything. Never moves backward.
    pub fn advance_to(&mut self, now_ms: f64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }

    /// Fire everything due up to `now_ms`, in order, then settle the clock there
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<Fired<T>> {
        let mut fired = Vec::new();
        while let Some(task) = self.pop_due(now_ms) {
            fired.push(task);
        }
        self.advance_to(now_ms);
        fired
    }
}
