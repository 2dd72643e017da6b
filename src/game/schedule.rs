//! Cooperative timer queue for periodic behaviours driven by the simulation clock

/// Pending one-shot timers, fired in due-time order
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Timer<T> {
    due_at: u64,
    seq: u64,
    task: T,
}

impl<T: Copy + Ord> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, task: T, due_at: u64) {
        self.timers.push(Timer {
            due_at,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Remove and return every timer due at `now`, ordered by due time,
    /// then by task order, then by scheduling order.
    pub fn take_due(&mut self, now: u64) -> Vec<(u64, T)> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due_at <= now);
        self.timers = pending;
        due.sort_by(|a, b| (a.due_at, a.task, a.seq).cmp(&(b.due_at, b.task, b.seq)));
        due.into_iter().map(|t| (t.due_at, t.task)).collect()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_at).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T: Copy + Ord> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Next slot of a fixed-period timer strictly after `now`. Missed slots are skipped.
pub fn next_period(due_at: u64, period: u64, now: u64) -> u64 {
    let period = period.max(1);
    if now < due_at {
        return due_at + period;
    }
    due_at + ((now - due_at) / period + 1) * period
}
