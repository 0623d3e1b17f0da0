// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trigger elements and their firing state machine.

use crate::action::Action;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a trigger element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Firing state of a trigger element or of a single action slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Offset action whose owner has not fired yet
    Disarmed,
    /// Offset action waiting out its delay
    PreTrigger,
    /// Waiting for the next fire time
    Armed,
    /// Fired this window
    Triggered,
    /// Will never fire again
    Complete,
}

/// When an element fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// Fire a single time
    Once {
        /// Absolute activation time in seconds
        start: f64,
    },
    /// Fire every `period` seconds, starting at `start + period`, until `end`
    Periodic {
        /// Absolute activation time in seconds
        start: f64,
        /// Seconds between firings; must be positive (validated at load)
        period: f64,
        /// Expiry time; `f64::INFINITY` never expires
        end: f64,
    },
}

/// Runtime firing state for one action of an element
#[derive(Debug, Clone)]
struct ActionSlot {
    state: TriggerState,
    /// Time the owner last fired; the reference point for offset actions
    relative_start: f64,
}

impl Default for ActionSlot {
    fn default() -> Self {
        Self {
            state: TriggerState::Disarmed,
            relative_start: 0.0,
        }
    }
}

/// A scheduled unit owning a list of actions and a firing state machine
///
/// `evaluate` advances the state machine against a new timestamp; actions
/// made eligible by the call are collected in insertion order and drained
/// with [`take_due`](Self::take_due).
#[derive(Debug, Clone)]
pub struct TriggerElement {
    id: ElementId,
    schedule: Schedule,
    actions: Vec<Action>,
    state: TriggerState,
    next_time: f64,
    slots: Vec<ActionSlot>,
    due: Vec<usize>,
}

impl TriggerElement {
    /// Create an element with the given schedule and no actions
    pub fn new(schedule: Schedule) -> Self {
        Self {
            id: ElementId::new(),
            schedule,
            actions: Vec::new(),
            state: TriggerState::Armed,
            next_time: Self::first_fire_time(schedule),
            slots: Vec::new(),
            due: Vec::new(),
        }
    }

    /// Create an element that fires a single time at `start`
    pub fn once(start: f64) -> Self {
        Self::new(Schedule::Once { start })
    }

    /// Create an element that fires every `period` seconds from
    /// `start + period`, never expiring
    pub fn periodic(start: f64, period: f64) -> Self {
        debug_assert!(period > 0.0, "period must be positive");
        Self::new(Schedule::Periodic {
            start,
            period,
            end: f64::INFINITY,
        })
    }

    /// Set the expiry time of a periodic schedule; no effect on `once`
    pub fn with_end(mut self, end: f64) -> Self {
        if let Schedule::Periodic {
            end: ref mut slot, ..
        } = self.schedule
        {
            *slot = end;
        }
        self
    }

    /// Append an action; insertion order is dispatch order
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self.slots.push(ActionSlot::default());
        self
    }

    /// The element's unique ID
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The element's schedule
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Current firing state
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Next absolute time the element fires or re-arms
    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    /// The element's actions in dispatch order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// The action at `index`
    pub fn action(&self, index: usize) -> &Action {
        &self.actions[index]
    }

    /// Runtime firing state of the action at `index`
    pub fn action_state(&self, index: usize) -> TriggerState {
        self.slots[index].state
    }

    /// Re-arm the element and disarm every action slot
    pub fn reset(&mut self) {
        self.state = TriggerState::Armed;
        self.next_time = Self::first_fire_time(self.schedule);
        for slot in &mut self.slots {
            *slot = ActionSlot::default();
        }
        self.due.clear();
    }

    /// Advance the state machine to `time`, returning the new state
    ///
    /// Actions made eligible by this call are queued for
    /// [`take_due`](Self::take_due). Offset actions are polled on every call,
    /// so a slow external clock can satisfy an offset many evaluations after
    /// the owner fired.
    pub fn evaluate(&mut self, time: f64) -> TriggerState {
        match self.schedule {
            Schedule::Once { start } => match self.state {
                TriggerState::Armed if time >= start => self.fire(time),
                TriggerState::Triggered => self.state = TriggerState::Complete,
                _ => {}
            },
            Schedule::Periodic { period, end, .. } => {
                if time >= end {
                    // Expiry wins over a coinciding fire instant.
                    if self.state != TriggerState::Complete {
                        self.state = TriggerState::Complete;
                        self.drop_pending();
                    }
                } else if time < self.next_time {
                    if self.state != TriggerState::Armed {
                        self.state = TriggerState::Armed;
                    }
                } else if self.state == TriggerState::Armed {
                    self.fire(time);
                    self.next_time += period;
                }
            }
        }

        self.poll_offsets(time);
        self.state
    }

    /// Actions made eligible since the last call, in insertion order
    pub fn take_due(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.due)
    }

    /// Whether the element can never fire anything again
    ///
    /// A `once` element with an offset action still waiting out its delay is
    /// not spent even though its schedule state reads `Complete`.
    pub fn is_spent(&self) -> bool {
        self.state == TriggerState::Complete
            && self.due.is_empty()
            && self
                .slots
                .iter()
                .all(|slot| slot.state != TriggerState::PreTrigger)
    }

    fn first_fire_time(schedule: Schedule) -> f64 {
        match schedule {
            Schedule::Once { start } => start,
            Schedule::Periodic { start, period, .. } => start + period,
        }
    }

    fn fire(&mut self, time: f64) {
        self.state = TriggerState::Triggered;
        for (index, action) in self.actions.iter().enumerate() {
            let slot = &mut self.slots[index];
            if action.is_offset() {
                slot.state = TriggerState::PreTrigger;
                slot.relative_start = time;
            } else {
                slot.state = TriggerState::Triggered;
                self.due.push(index);
            }
        }
    }

    fn poll_offsets(&mut self, time: f64) {
        for (index, action) in self.actions.iter().enumerate() {
            let slot = &mut self.slots[index];
            if slot.state == TriggerState::PreTrigger {
                let offset = action.offset.unwrap_or(0.0);
                if time - slot.relative_start >= offset {
                    slot.state = TriggerState::Triggered;
                    self.due.push(index);
                }
            }
        }
    }

    fn drop_pending(&mut self) {
        for slot in &mut self.slots {
            if slot.state == TriggerState::PreTrigger {
                slot.state = TriggerState::Complete;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn once_with_action(start: f64) -> TriggerElement {
        TriggerElement::once(start).with_action(Action::new("a"))
    }

    #[test]
    fn test_once_lifecycle() {
        let mut element = once_with_action(5.0);

        assert_eq!(element.evaluate(4.0), TriggerState::Armed);
        assert!(element.take_due().is_empty());

        assert_eq!(element.evaluate(5.0), TriggerState::Triggered);
        assert_eq!(element.take_due(), vec![0]);

        assert_eq!(element.evaluate(6.0), TriggerState::Complete);
        assert!(element.take_due().is_empty());
        assert!(element.is_spent());
    }

    #[test]
    fn test_once_never_fires_early() {
        let mut element = once_with_action(5.0);
        assert_eq!(element.evaluate(4.999), TriggerState::Armed);
        assert!(element.take_due().is_empty());
    }

    #[test]
    fn test_periodic_fire_times() {
        let mut element = TriggerElement::periodic(0.0, 2.0)
            .with_end(10.0)
            .with_action(Action::new("b"));

        let mut fired_at = Vec::new();
        for tick in 0..=11 {
            let time = f64::from(tick);
            element.evaluate(time);
            if !element.take_due().is_empty() {
                fired_at.push(time);
            }
        }

        assert_eq!(fired_at, vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(element.state(), TriggerState::Complete);
        assert!(element.is_spent());
    }

    #[test]
    fn test_periodic_expiry_wins_at_fire_instant() {
        let mut element = TriggerElement::periodic(0.0, 5.0)
            .with_end(5.0)
            .with_action(Action::new("b"));

        assert_eq!(element.evaluate(5.0), TriggerState::Complete);
        assert!(element.take_due().is_empty());
    }

    #[test]
    fn test_periodic_expiry_mid_cycle() {
        let mut element = TriggerElement::periodic(0.0, 4.0)
            .with_end(5.0)
            .with_action(Action::new("b"));

        element.evaluate(4.0);
        assert_eq!(element.take_due(), vec![0]);

        assert_eq!(element.evaluate(5.0), TriggerState::Complete);
        assert!(element.is_spent());
    }

    #[test]
    fn test_periodic_unbounded_by_default() {
        let mut element = TriggerElement::periodic(0.0, 2.0).with_action(Action::new("b"));

        element.evaluate(1.0e9);
        assert_eq!(element.take_due(), vec![0]);
        assert_ne!(element.state(), TriggerState::Complete);
    }

    #[test]
    fn test_periodic_rearms_between_cycles() {
        let mut element = TriggerElement::periodic(0.0, 2.0).with_action(Action::new("b"));

        assert_eq!(element.evaluate(2.0), TriggerState::Triggered);
        element.take_due();
        assert_eq!(element.evaluate(3.0), TriggerState::Armed);
        assert_eq!(element.evaluate(4.0), TriggerState::Triggered);
        assert_eq!(element.take_due(), vec![0]);
    }

    #[test]
    fn test_offset_action_fires_each_cycle() {
        let mut element = TriggerElement::periodic(0.0, 2.0)
            .with_action(Action::new("flash"))
            .with_action(Action::new("fade").with_offset(0.5));

        element.evaluate(2.0);
        assert_eq!(element.take_due(), vec![0]);
        assert_eq!(element.action_state(1), TriggerState::PreTrigger);

        element.evaluate(2.5);
        assert_eq!(element.take_due(), vec![1]);

        element.evaluate(3.0);
        assert!(element.take_due().is_empty());

        element.evaluate(4.0);
        assert_eq!(element.take_due(), vec![0]);
        element.evaluate(4.5);
        assert_eq!(element.take_due(), vec![1]);
    }

    #[test]
    fn test_offset_satisfied_by_slow_clock() {
        let mut element =
            TriggerElement::once(1.0).with_action(Action::new("late").with_offset(0.5));

        assert_eq!(element.evaluate(1.0), TriggerState::Triggered);
        assert!(element.take_due().is_empty());

        assert_eq!(element.evaluate(1.2), TriggerState::Complete);
        assert!(element.take_due().is_empty());
        assert!(!element.is_spent());

        element.evaluate(5.0);
        assert_eq!(element.take_due(), vec![0]);
        assert!(element.is_spent());
    }

    #[test]
    fn test_offset_dropped_on_expiry() {
        let mut element = TriggerElement::periodic(0.0, 2.0)
            .with_end(3.0)
            .with_action(Action::new("fade").with_offset(1.5));

        element.evaluate(2.0);
        assert_eq!(element.action_state(0), TriggerState::PreTrigger);

        assert_eq!(element.evaluate(3.0), TriggerState::Complete);
        assert!(element.is_spent());

        element.evaluate(3.5);
        assert!(element.take_due().is_empty());
    }

    #[test]
    fn test_offset_rearm_is_not_cumulative() {
        // An offset longer than the period is abandoned at each re-fire and
        // never accumulates into a later cycle.
        let mut element = TriggerElement::periodic(0.0, 2.0)
            .with_action(Action::new("fade").with_offset(3.0));

        for tick in 0..=8 {
            element.evaluate(f64::from(tick));
            assert!(element.take_due().is_empty());
        }
        assert_eq!(element.action_state(0), TriggerState::PreTrigger);
    }

    #[test]
    fn test_reset_replays() {
        let mut element = once_with_action(5.0);
        element.evaluate(5.0);
        element.take_due();
        element.evaluate(6.0);
        assert!(element.is_spent());

        element.reset();
        assert_eq!(element.state(), TriggerState::Armed);
        assert_eq!(element.next_time(), 5.0);
        assert_eq!(element.action_state(0), TriggerState::Disarmed);

        element.evaluate(5.0);
        assert_eq!(element.take_due(), vec![0]);
    }

    #[test]
    fn test_periodic_reset_recomputes_next_time() {
        let mut element = TriggerElement::periodic(1.0, 2.0).with_action(Action::new("b"));
        element.evaluate(3.0);
        element.take_due();
        assert_eq!(element.next_time(), 5.0);

        element.reset();
        assert_eq!(element.next_time(), 3.0);
    }
}
