//! Deferred animation transitions
//!
//! Entries count down in simulation time, so a frozen or paused session
//! never fires them early. Each entry carries the animator generation it was
//! scheduled under; the session drops entries whose generation is stale.

/// Work to run when a one-shot clip is over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredAction {
    /// Landing clip done: clear the landing flag and pick a movement clip
    FinishLanding,
    /// Spell cast or arrow shot done: return to a resting clip
    FinishAction,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Deferred {
    remaining: f32,
    action: DeferredAction,
    generation: u64,
}

/// Pending transitions, due in order of remaining time
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    entries: Vec<Deferred>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` seconds of simulation time
    pub fn schedule(&mut self, delay: f32, action: DeferredAction, generation: u64) {
        self.entries.push(Deferred {
            remaining: delay.max(0.0),
            action,
            generation,
        });
    }

    /// Count down by `dt`, returning due entries earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<(DeferredAction, u64)> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }

        let mut due: Vec<Deferred> = Vec::new();
        self.entries.retain(|entry| {
            if entry.remaining <= 0.0 {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due.into_iter().map(|e| (e.action, e.generation)).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0.5, DeferredAction::FinishLanding, 3);

        assert!(queue.advance(0.25).is_empty());
        assert_eq!(queue.advance(0.25), vec![(DeferredAction::FinishLanding, 3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fires_once() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0.1, DeferredAction::FinishAction, 1);
        assert_eq!(queue.advance(1.0).len(), 1);
        assert!(queue.advance(1.0).is_empty());
    }

    #[test]
    fn test_earliest_first() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0.3, DeferredAction::FinishAction, 1);
        queue.schedule(0.1, DeferredAction::FinishLanding, 2);
        let due = queue.advance(0.5);
        assert_eq!(due, vec![(DeferredAction::FinishLanding, 2), (DeferredAction::FinishAction, 1)]);
    }

    #[test]
    fn test_zero_delay_fires_next_advance() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0.0, DeferredAction::FinishLanding, 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.advance(0.0).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut queue = DeferredQueue::new();
        queue.schedule(1.0, DeferredAction::FinishAction, 0);
        queue.clear();
        assert!(queue.advance(2.0).is_empty());
    }
}
