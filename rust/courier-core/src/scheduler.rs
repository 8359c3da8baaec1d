//! Cancellable one-shot and periodic tasks on a virtual clock.
//!
//! Nothing here sleeps: the owner advances time and drains due tasks with
//! [`Scheduler::pop_due`]. Tasks due at the same instant fire in creation order.

use std::collections::BTreeMap;
use std::time::Duration;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    task: T,
    period: Option<Duration>,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), Entry<T>>,
    deadlines: FxHashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self { now: Duration::ZERO, next_id: 0, queue: BTreeMap::new(), deadlines: FxHashMap::default() }
    }

    pub fn now(&self) -> Duration { self.now }

    /// Runs `task` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskHandle {
        self.insert(delay, task, None)
    }

    /// Runs `task` every `period`, first one period from now.
    pub fn schedule_every(&mut self, period: Duration, task: T) -> TaskHandle {
        // a zero period would never let the clock move
        let period = period.max(Duration::from_millis(1));
        self.insert(period, task, Some(period))
    }

    fn insert(&mut self, delay: Duration, task: T, period: Option<Duration>) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        let at = self.now + delay;
        self.queue.insert((at, id), Entry { task, period });
        self.deadlines.insert(id, at);
        TaskHandle(id)
    }

    /// Returns false when the task already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(at) => self.queue.remove(&(at, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_active(&self, handle: TaskHandle) -> bool { self.deadlines.contains_key(&handle.0) }

    pub fn active(&self) -> usize { self.queue.len() }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Removes the earliest task due at or before `until` and moves the clock to its deadline.
    /// Periodic tasks are re-armed before they are returned, so the caller may cancel them.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, T)>
    where
        T: Clone,
    {
        let (&(at, id), _) = self.queue.iter().next()?;
        if at > until {
            return None;
        }
        let entry = self.queue.remove(&(at, id))?;
        self.now = self.now.max(at);
        match entry.period {
            Some(period) => {
                let next = at + period;
                self.queue.insert((next, id), Entry { task: entry.task.clone(), period: Some(period) });
                self.deadlines.insert(id, next);
            }
            None => {
                self.deadlines.remove(&id);
            }
        }
        Some((TaskHandle(id), entry.task))
    }

    /// Moves the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration { Duration::from_millis(v) }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<(u128, &'static str)> {
        let mut fired = Vec::new();
        while let Some((_, t)) = s.pop_due(until) {
            fired.push((s.now().as_millis(), t));
        }
        s.set_now(until);
        fired
    }

    #[test]
    fn one_shots_fire_in_deadline_then_creation_order() {
        let mut s = Scheduler::new();
        s.schedule_once(ms(100), "b");
        s.schedule_once(ms(50), "a");
        s.schedule_once(ms(100), "c");
        assert_eq!(drain(&mut s, ms(99)), vec![(50, "a")]);
        assert_eq!(drain(&mut s, ms(200)), vec![(100, "b"), (100, "c")]);
        assert_eq!(s.active(), 0);
    }

    #[test]
    fn periodic_rearms_until_cancelled() {
        let mut s = Scheduler::new();
        let h = s.schedule_every(ms(250), "tick");
        assert_eq!(drain(&mut s, ms(760)), vec![(250, "tick"), (500, "tick"), (750, "tick")]);
        assert!(s.is_active(h));
        assert_eq!(s.next_deadline(), Some(ms(1000)));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(drain(&mut s, ms(5000)).is_empty());
    }

    #[test]
    fn cancelled_one_shot_never_fires() {
        let mut s = Scheduler::new();
        let h = s.schedule_once(ms(10), "x");
        s.schedule_once(ms(20), "y");
        assert!(s.cancel(h));
        assert_eq!(drain(&mut s, ms(30)), vec![(20, "y")]);
        assert!(!s.is_active(h));
    }

    #[test]
    fn delays_are_relative_to_current_clock() {
        let mut s = Scheduler::new();
        s.set_now(ms(1000));
        s.schedule_once(ms(150), "face");
        assert_eq!(s.next_deadline(), Some(ms(1150)));
        s.set_now(ms(10));
        assert_eq!(s.now(), ms(1000));
    }
}
