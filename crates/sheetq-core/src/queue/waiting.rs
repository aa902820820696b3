//! Priority-ordered waiting list.

use std::collections::VecDeque;

use super::request::Job;

/// Requests awaiting admission, ordered by non-increasing priority with
/// submission order preserved among equal priorities.
#[derive(Default)]
pub(crate) struct WaitingList {
    entries: VecDeque<Box<dyn Job>>,
}

impl WaitingList {
    /// Insert after every entry whose priority is >= the new one (stable).
    pub(crate) fn insert(&mut self, job: Box<dyn Job>) {
        let priority = job.priority();
        let at = self.entries.partition_point(|j| j.priority() >= priority);
        self.entries.insert(at, job);
    }

    pub(crate) fn pop_front(&mut self) -> Option<Box<dyn Job>> {
        self.entries.pop_front()
    }

    pub(crate) fn drain(&mut self) -> Vec<Box<dyn Job>> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
