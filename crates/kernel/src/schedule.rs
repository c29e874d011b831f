use serde::{Deserialize, Serialize};
use sidescape_common::EntityId;
use std::collections::BTreeMap;

/// Identity of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cadence {
    Once,
    Every(f32),
}

#[derive(Debug, Clone)]
struct Task<A> {
    owner: EntityId,
    cadence: Cadence,
    remaining: f32,
    action: A,
}

/// A task that came due during [`Scheduler::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    pub task: TaskId,
    pub owner: EntityId,
    pub action: A,
}

/// Time-based task scheduler.
///
/// Instead of invoking callbacks, due tasks are returned to the caller as
/// typed action values, so whoever owns the scheduler also owns the state
/// the actions mutate. Tasks fire in id order within one advance.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    tasks: BTreeMap<TaskId, Task<A>>,
    next_id: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.tasks.contains_key(&task)
    }

    /// Fire `action` every `interval` seconds until cancelled.
    pub fn every(&mut self, owner: EntityId, interval: f32, action: A) -> TaskId {
        assert!(
            interval.is_finite() && interval > 0.0,
            "periodic interval must be positive"
        );
        self.insert(owner, Cadence::Every(interval), interval, action)
    }

    /// Fire `action` once after `delay` seconds. A zero delay fires on the
    /// next advance, after the current step has completed.
    pub fn once(&mut self, owner: EntityId, delay: f32, action: A) -> TaskId {
        assert!(delay.is_finite() && delay >= 0.0, "delay must be non-negative");
        self.insert(owner, Cadence::Once, delay, action)
    }

    fn insert(&mut self, owner: EntityId, cadence: Cadence, remaining: f32, action: A) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(
            id,
            Task {
                owner,
                cadence,
                remaining,
                action,
            },
        );
        id
    }

    /// Cancel one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, task: TaskId) -> bool {
        self.tasks.remove(&task).is_some()
    }

    /// Cancel every task owned by `owner`. Returns how many were removed.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Advance time by `dt` seconds and collect every task that came due.
    /// A periodic task fires at most once per advance.
    pub fn advance(&mut self, dt: f32) -> Vec<Fired<A>> {
        let mut fired = Vec::new();
        let mut finished = Vec::new();
        for (id, task) in self.tasks.iter_mut() {
            task.remaining -= dt;
            if task.remaining > 0.0 {
                continue;
            }
            fired.push(Fired {
                task: *id,
                owner: task.owner,
                action: task.action.clone(),
            });
            match task.cadence {
                Cadence::Once => finished.push(*id),
                Cadence::Every(interval) => {
                    task.remaining += interval;
                    if task.remaining <= 0.0 {
                        task.remaining = interval;
                    }
                }
            }
        }
        for id in finished {
            self.tasks.remove(&id);
        }
        fired
    }
}
