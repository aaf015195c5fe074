//! Single-threaded queue of delayed tasks.
//!
//! Replies are not produced the moment a query arrives: the chat front end
//! schedules them with a fixed "typing" delay and runs them when due. Nothing
//! here spawns threads; the owner polls the queue from its own loop.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// A task waiting for its deadline.
#[derive(Debug)]
struct Scheduled<T> {
    /// When the task becomes runnable.
    due: Instant,
    /// Insertion order, breaking deadline ties.
    seq: u64,
    /// Payload.
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Deadline-ordered task queue. Equal deadlines run in insertion order.
#[derive(Debug)]
pub struct EventQueue<T> {
    /// Pending tasks, earliest first.
    heap: BinaryHeap<Reverse<Scheduled<T>>>,
    /// Next insertion number.
    next_seq: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> EventQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay` after `now`.
    pub fn schedule_at(&mut self, now: Instant, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            due: now + delay,
            seq,
            task,
        }));
    }

    /// Schedule `task` to run `delay` from now.
    pub fn schedule(&mut self, delay: Duration, task: T) {
        self.schedule_at(Instant::now(), delay, task);
    }

    /// Deadline of the earliest task.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(s)| s.due)
    }

    /// Take the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(s)| s.task)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no task is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Block until every task has run, in deadline order.
    ///
    /// `on_wait` is called between polls while a task is not yet due, with
    /// the time remaining; it should sleep at most that long.
    pub fn run_until_idle(&mut self, mut on_wait: impl FnMut(Duration), mut run: impl FnMut(T)) {
        while let Some(due) = self.next_deadline() {
            let now = Instant::now();
            if let Some(task) = self.pop_due(now) {
                run(task);
            } else {
                on_wait(due.saturating_duration_since(now));
            }
        }
    }
}
