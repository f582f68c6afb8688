//! Scheduled one-shot transitions keyed to game time
//!
//! Replaces wall-clock timers: the tick driver advances game time and drains
//! whatever came due, so tests simulate delays without real waiting and a
//! phase exit can cancel everything still pending.

/// Delayed transitions the simulation can schedule for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Boss may start firing lightning
    BossReady,
    /// Enter the Victory phase (boss explosion has played out)
    Victory,
    /// Full reset back to the title screen
    ResetToTitle,
}

/// Queue of (due-time, event) pairs in frame units
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    entries: Vec<(f64, Scheduled)>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `what` to fire once game time reaches `due`
    pub fn schedule(&mut self, due: f64, what: Scheduled) {
        self.entries.push((due, what));
    }

    /// Remove and return everything due at or before `now`, in due order
    pub fn drain_due(&mut self, now: f64) -> Vec<Scheduled> {
        let mut due: Vec<(f64, Scheduled)> = Vec::new();
        self.entries.retain(|&(at, what)| {
            if at <= now {
                due.push((at, what));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, what)| what).collect()
    }

    /// Drop every pending entry (called on phase exit)
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// True if an event of this kind is still pending
    pub fn contains(&self, what: Scheduled) -> bool {
        self.entries.iter().any(|&(_, w)| w == what)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_only_due_entries() {
        let mut queue = EventQueue::new();
        queue.schedule(10.0, Scheduled::BossReady);
        queue.schedule(20.0, Scheduled::Victory);

        assert!(queue.drain_due(5.0).is_empty());
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.drain_due(10.0), vec![Scheduled::BossReady]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain_due(100.0), vec![Scheduled::Victory]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_orders_by_due_time() {
        let mut queue = EventQueue::new();
        queue.schedule(30.0, Scheduled::ResetToTitle);
        queue.schedule(10.0, Scheduled::Victory);
        queue.schedule(20.0, Scheduled::BossReady);

        assert_eq!(
            queue.drain_due(30.0),
            vec![Scheduled::Victory, Scheduled::BossReady, Scheduled::ResetToTitle]
        );
    }

    #[test]
    fn test_cancel_all_discards_pending() {
        let mut queue = EventQueue::new();
        queue.schedule(10.0, Scheduled::Victory);
        queue.schedule(20.0, Scheduled::ResetToTitle);
        queue.cancel_all();
        assert!(queue.is_empty());
        assert!(queue.drain_due(f64::MAX).is_empty());
    }
}
