#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pre-match lobby that gathers role assignments and starts the match.
//!
//! The lobby reacts to [`Event::TimeAdvanced`] like any other system: once the
//! countdown elapses, or when a start is forced, unconnected slots are handed
//! to AI and a single [`Command::StartMatch`] is emitted.

use std::time::Duration;

use maze_chase_core::{Command, Event, Role, SlotAssignment};
use tracing::info;

/// Countdown applied when no explicit length is configured.
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(60);

/// Slot roster and countdown state.
#[derive(Clone, Debug)]
pub struct Lobby {
    slots: Vec<SlotAssignment>,
    countdown_length: Duration,
    remaining: Option<Duration>,
    started: bool,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::with_countdown(DEFAULT_COUNTDOWN)
    }
}

impl Lobby {
    /// Creates an empty lobby whose countdown lasts `countdown`.
    #[must_use]
    pub fn with_countdown(countdown: Duration) -> Self {
        Self {
            slots: Vec::new(),
            countdown_length: countdown,
            remaining: None,
            started: false,
        }
    }

    /// Replaces the roster; the first update starts the countdown.
    pub fn set_slots(&mut self, slots: Vec<SlotAssignment>) {
        self.slots = slots;
        self.start_countdown();
    }

    /// Starts the countdown unless it is already running.
    pub fn start_countdown(&mut self) {
        if self.remaining.is_none() && !self.started {
            self.remaining = Some(self.countdown_length);
        }
    }

    /// Advances the countdown from world events and starts the match when it elapses.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            let Event::TimeAdvanced { dt } = event else {
                continue;
            };
            let Some(remaining) = self.remaining else {
                continue;
            };
            let left = remaining.saturating_sub(*dt);
            self.remaining = Some(left);
            if left.is_zero() {
                self.fill_ai();
                self.start_match(out);
            }
        }
    }

    /// Starts immediately, substituting the default roster when nobody joined.
    pub fn force_start(&mut self, out: &mut Vec<Command>) {
        if self.slots.is_empty() {
            self.slots = default_roster();
        }
        self.fill_ai();
        self.start_match(out);
    }

    /// Current roster.
    #[must_use]
    pub fn slots(&self) -> &[SlotAssignment] {
        &self.slots
    }

    /// Time left on the countdown, if it is running.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Reports whether the match start was already emitted.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    fn fill_ai(&mut self) {
        for role in std::iter::once(Role::Theseus).chain(Role::PURSUERS) {
            if let Some(slot) = self.slots.iter_mut().find(|slot| slot.role == role) {
                if !slot.connected {
                    slot.is_ai = true;
                }
            }
        }
    }

    fn start_match(&mut self, out: &mut Vec<Command>) {
        if self.started {
            return;
        }
        self.started = true;
        self.remaining = None;
        info!(slots = self.slots.len(), "lobby starting match");
        out.push(Command::StartMatch {
            slots: self.slots.clone(),
        });
    }
}

/// Roster used when a match is forced without participants: a human runner
/// and four AI pursuers.
#[must_use]
pub fn default_roster() -> Vec<SlotAssignment> {
    let mut slots = vec![SlotAssignment::new("theseus", Role::Theseus, false, true)];
    slots.extend(
        Role::PURSUERS
            .iter()
            .map(|role| SlotAssignment::new(format!("{}-ai", role.label()), *role, true, false)),
    );
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_has_one_human_runner() {
        let roster = default_roster();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster[0].role, Role::Theseus);
        assert!(!roster[0].is_ai);
        assert!(roster[1..].iter().all(|slot| slot.is_ai && !slot.connected));
        assert_eq!(roster[1].id, "hunter-ai");
    }

    #[test]
    fn countdown_is_idle_until_roster_arrives() {
        let mut lobby = Lobby::default();
        let mut out = Vec::new();
        lobby.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(120),
            }],
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(lobby.remaining(), None);
    }
}
