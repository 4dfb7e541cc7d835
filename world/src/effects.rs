//! Timed power effects keyed by kind.

use std::{collections::BTreeMap, time::Duration};

use maze_chase_core::{EffectKind, PursuitMode};

/// Active effects mapped to the clock reading at which they expire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EffectMap {
    expiries: BTreeMap<EffectKind, Duration>,
}

impl EffectMap {
    /// Starts or refreshes `kind` so that it lasts `duration` from `now`.
    pub(crate) fn activate(&mut self, kind: EffectKind, now: Duration, duration: Duration) {
        let _ = self.expiries.insert(kind, now.saturating_add(duration));
    }

    pub(crate) fn is_active(&self, kind: EffectKind) -> bool {
        self.expiries.contains_key(&kind)
    }

    /// Removes every effect whose expiry is at or before `now`, in kind order.
    pub(crate) fn expire(&mut self, now: Duration) -> Vec<EffectKind> {
        let expired: Vec<EffectKind> = self
            .expiries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in &expired {
            let _ = self.expiries.remove(kind);
        }
        expired
    }

    pub(crate) fn clear(&mut self) {
        self.expiries.clear();
    }

    /// Pursuer mode implied by the active effects; glutton wins over fright.
    pub(crate) fn mode(&self) -> PursuitMode {
        if self.is_active(EffectKind::Glutton) {
            PursuitMode::Fruit
        } else if self.is_active(EffectKind::Fright) {
            PursuitMode::Frightened
        } else {
            PursuitMode::Normal
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EffectKind, Duration)> + '_ {
        self.expiries.iter().map(|(kind, expiry)| (*kind, *expiry))
    }
}
