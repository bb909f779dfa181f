//! Frame-timed follow-up actions.
//!
//! Delayed transitions (bringing a scratched cue ball back, re-racking after
//! a game) live here instead of in host timers, so they are part of the
//! deterministic state and drained by `advance_frame`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    RestoreCueBall,
    Rerack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub fire_at_frame: u64,
    pub action: TimedAction,
}

/// Pending timed events, ordered by due frame then insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    events: Vec<TimedEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at_frame: u64, action: TimedAction) {
        let at = self
            .events
            .iter()
            .position(|e| e.fire_at_frame > fire_at_frame)
            .unwrap_or(self.events.len());
        self.events.insert(
            at,
            TimedEvent {
                fire_at_frame,
                action,
            },
        );
    }

    /// Remove and return every action due at or before `frame`.
    pub fn drain_due(&mut self, frame: u64) -> Vec<TimedAction> {
        let due = self
            .events
            .iter()
            .take_while(|e| e.fire_at_frame <= frame)
            .count();
        self.events.drain(..due).map(|e| e.action).collect()
    }

    pub fn cancel(&mut self, action: TimedAction) {
        self.events.retain(|e| e.action != action);
    }

    pub fn is_scheduled(&self, action: TimedAction) -> bool {
        self.events.iter().any(|e| e.action == action)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_due_order() {
        let mut queue = EventQueue::new();
        queue.schedule(40, TimedAction::Rerack);
        queue.schedule(30, TimedAction::RestoreCueBall);
        assert!(queue.drain_due(29).is_empty());
        assert_eq!(queue.drain_due(30), vec![TimedAction::RestoreCueBall]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(100), vec![TimedAction::Rerack]);
        assert!(queue.is_empty());
    }

    #[test]
    fn same_frame_keeps_insertion_order() {
        let mut queue = EventQueue::new();
        queue.schedule(10, TimedAction::Rerack);
        queue.schedule(10, TimedAction::RestoreCueBall);
        assert_eq!(
            queue.drain_due(10),
            vec![TimedAction::Rerack, TimedAction::RestoreCueBall]
        );
    }

    #[test]
    fn cancel_removes_matching_actions() {
        let mut queue = EventQueue::new();
        queue.schedule(5, TimedAction::RestoreCueBall);
        queue.schedule(9, TimedAction::Rerack);
        queue.cancel(TimedAction::RestoreCueBall);
        assert!(!queue.is_scheduled(TimedAction::RestoreCueBall));
        assert!(queue.is_scheduled(TimedAction::Rerack));
    }
}
