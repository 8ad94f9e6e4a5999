//! Timer queue for delayed side effects.
//!
//! Tasks are ordered by due time, ties by scheduling order. The queue never
//! runs anything itself: the engine pops due tasks under its state lock, so
//! a firing timer and a live command never interleave writes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Deliver a canned bot answer to `recipient_id`.
    BotReply { recipient_id: String, body: String },
    /// Retire a notification whose lifetime has elapsed.
    ExpireNotification { id: String },
}

/// A task removed from the queue because its deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask {
    pub id: TaskId,
    pub due: DateTime<Utc>,
    pub task: ScheduledTask,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BTreeMap<(DateTime<Utc>, u64), (TaskId, ScheduledTask)>,
    index: HashMap<TaskId, (DateTime<Utc>, u64)>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: DateTime<Utc>, task: ScheduledTask) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TaskId(seq);

        self.queue.insert((due, seq), (id, task));
        self.index.insert(id, (due, seq));
        id
    }

    /// Cancel a pending task. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.index.remove(&id) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Cancel every pending task matching `pred`; returns how many were
    /// dropped.
    pub fn cancel_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&ScheduledTask) -> bool,
    {
        let doomed: Vec<_> = self
            .queue
            .iter()
            .filter(|(_, (_, task))| pred(task))
            .map(|(key, (id, _))| (*key, *id))
            .collect();

        for (key, id) in &doomed {
            self.queue.remove(key);
            self.index.remove(id);
        }
        doomed.len()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<DueTask> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        let (id, task) = self.queue.remove(&key)?;
        self.index.remove(&id);
        Some(DueTask {
            id,
            due: key.0,
            task,
        })
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
