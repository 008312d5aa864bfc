use std::time::Duration;

use super::tree::NodeId;
use crate::common::config::AnimationEasing;

/// Scalar field a transition drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionTarget {
    NotebookScroll(NodeId),
    ViewOpacity(NodeId),
}

impl TransitionTarget {
    pub fn node(self) -> NodeId {
        match self {
            TransitionTarget::NotebookScroll(n) | TransitionTarget::ViewOpacity(n) => n,
        }
    }
}

#[derive(Debug, Clone)]
struct Transition {
    target: TransitionTarget,
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
    easing: AnimationEasing,
}

impl Transition {
    fn value_at(&self, now: Duration) -> (f64, bool) {
        let elapsed = now.saturating_sub(self.start);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, true);
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let s = self.easing.apply(t);
        (self.from + (self.to - self.from) * s, false)
    }
}

/// Pending interpolations, advanced once per layout pass.
#[derive(Debug, Default, Clone)]
pub struct Transitions {
    active: Vec<Transition>,
}

impl Transitions {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.active.is_empty() }

    pub fn len(&self) -> usize { self.active.len() }

    /// Starts a transition, replacing any running one for the same target.
    pub fn add(
        &mut self,
        target: TransitionTarget,
        from: f64,
        to: f64,
        start: Duration,
        duration: Duration,
        easing: AnimationEasing,
    ) {
        self.active.retain(|t| t.target != target);
        self.active.push(Transition { target, from, to, start, duration, easing });
    }

    /// Drops transitions touching `node`.
    pub fn cancel_node(&mut self, node: NodeId) { self.active.retain(|t| t.target.node() != node); }

    /// Current value of every transition. Finished ones report their end
    /// value once and are dropped.
    pub fn advance(&mut self, now: Duration) -> Vec<(TransitionTarget, f64)> {
        let mut values = Vec::with_capacity(self.active.len());
        self.active.retain(|t| {
            let (value, done) = t.value_at(now);
            values.push((t.target, value));
            !done
        });
        values
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn node() -> NodeId {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn linear_transition_interpolates_and_finishes() {
        let n = node();
        let mut transitions = Transitions::new();
        let target = TransitionTarget::NotebookScroll(n);
        transitions.add(
            target,
            0.0,
            300.0,
            Duration::from_secs(1),
            Duration::from_millis(200),
            AnimationEasing::Linear,
        );

        assert_eq!(transitions.advance(Duration::from_millis(1100)), vec![(target, 150.0)]);
        assert_eq!(transitions.advance(Duration::from_millis(1500)), vec![(target, 300.0)]);
        assert!(transitions.is_empty());
        assert!(transitions.advance(Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn restarting_a_target_replaces_it() {
        let n = node();
        let mut transitions = Transitions::new();
        let target = TransitionTarget::ViewOpacity(n);
        let easing = AnimationEasing::Linear;
        transitions.add(target, 0.0, 1.0, Duration::ZERO, Duration::from_secs(1), easing);
        transitions.add(target, 0.5, 1.0, Duration::ZERO, Duration::ZERO, easing);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions.advance(Duration::ZERO), vec![(target, 1.0)]);
    }

    #[test]
    fn cancel_node_drops_its_transitions() {
        let n = node();
        let mut transitions = Transitions::new();
        let easing = AnimationEasing::EaseOutQuad;
        let second = Duration::from_secs(1);
        transitions.add(TransitionTarget::ViewOpacity(n), 0.0, 1.0, Duration::ZERO, second, easing);
        transitions.add(TransitionTarget::NotebookScroll(n), 0.0, 9.0, Duration::ZERO, second, easing);
        transitions.cancel_node(n);
        assert!(transitions.is_empty());
    }
}
