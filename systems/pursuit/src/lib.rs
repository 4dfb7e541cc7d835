#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuer decision making: role targets, scored direction choice and the
//! anti-loop breaker.
//!
//! Every function here is pure apart from the injected random source, so each
//! role strategy can be exercised in isolation.

use std::collections::{HashSet, VecDeque};

use maze_chase_core::{CellCoord, Direction, PursuitMode, RandomExt, Role};
use rand::RngCore;

/// Tiles ahead of the runner targeted by the warden.
const WARDEN_LEAD: i64 = 4;
/// Tiles ahead of the runner used as the tracker's pivot.
const TRACKER_LEAD: i64 = 2;
/// Euclidean distance beyond which the brute chases instead of retreating.
const BRUTE_CHASE_DISTANCE: f32 = 8.0;
/// Probability that a path-following pursuer replans at a decision point.
pub const PATH_REFRESH_CHANCE: f64 = 0.1;

/// Positions a pursuer reasons about when picking its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PursuitView {
    /// Grid columns.
    pub columns: u32,
    /// Grid rows.
    pub rows: u32,
    /// Runner's current tile.
    pub runner: CellCoord,
    /// Runner's current heading, if moving.
    pub runner_heading: Option<Direction>,
    /// Tile of the hunter pursuer, used by the tracker.
    pub hunter: Option<CellCoord>,
}

impl PursuitView {
    /// Clamps a signed target into the playable interior `[1, cols-2] x [1, rows-2]`.
    #[must_use]
    pub fn clamp(&self, column: i64, row: i64) -> CellCoord {
        let max_column = (i64::from(self.columns) - 2).max(1);
        let max_row = (i64::from(self.rows) - 2).max(1);
        CellCoord::new(
            column.clamp(1, max_column) as u32,
            row.clamp(1, max_row) as u32,
        )
    }

    fn runner_ahead(&self, tiles: i64) -> (i64, i64) {
        let (dx, dy) = self.runner_heading.map_or((0, 0), Direction::delta);
        (
            i64::from(self.runner.column()) + i64::from(dx) * tiles,
            i64::from(self.runner.row()) + i64::from(dy) * tiles,
        )
    }
}

/// Tile a pursuer steers toward in the provided mode.
///
/// Frightened pursuers score against the runner's tile and flee it; fruit
/// mode ignores targets entirely, so the runner's tile is returned unchanged.
#[must_use]
pub fn select_target(
    role: Role,
    mode: PursuitMode,
    pursuer: CellCoord,
    view: &PursuitView,
) -> CellCoord {
    match mode {
        PursuitMode::Frightened | PursuitMode::Fruit => view.runner,
        PursuitMode::Normal => role_target(role, pursuer, view),
    }
}

/// Role-specific chase target, clamped to the playable interior.
#[must_use]
pub fn role_target(role: Role, pursuer: CellCoord, view: &PursuitView) -> CellCoord {
    let runner = (i64::from(view.runner.column()), i64::from(view.runner.row()));
    let (column, row) = match role {
        Role::Theseus | Role::Hunter => runner,
        Role::Warden => view.runner_ahead(WARDEN_LEAD),
        Role::Tracker => {
            let ahead = view.runner_ahead(TRACKER_LEAD);
            match view.hunter {
                Some(hunter) => {
                    let vector = (
                        ahead.0 - i64::from(hunter.column()),
                        ahead.1 - i64::from(hunter.row()),
                    );
                    (ahead.0 + vector.0, ahead.1 + vector.1)
                }
                None => ahead,
            }
        }
        Role::Brute => {
            if pursuer.euclidean_distance(view.runner) > BRUTE_CHASE_DISTANCE {
                runner
            } else {
                (1, i64::from(view.rows) - 2)
            }
        }
    };
    view.clamp(column, row)
}

/// Direction picked at a decision point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    /// Direction to step in.
    pub direction: Direction,
    /// Whether the anti-loop override replaced the scored choice.
    pub forced_random: bool,
}

/// Chooses the next direction for a pursuer standing on `tile`.
///
/// Open directions are evaluated up, down, left, right. Reversing is only
/// allowed when it is the sole option. A forced-random request or fruit mode
/// picks uniformly; otherwise options are scored by the Euclidean distance
/// from the neighbouring tile to `target`, minimised normally and maximised
/// when frightened. Returns `None` when the pursuer is boxed in.
pub fn choose_direction<F, R>(
    tile: CellCoord,
    heading: Option<Direction>,
    target: CellCoord,
    mode: PursuitMode,
    force_random: bool,
    mut is_walkable: F,
    rng: &mut R,
) -> Option<Decision>
where
    F: FnMut(CellCoord) -> bool,
    R: RngCore + ?Sized,
{
    let options: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|direction| tile.step(*direction).is_some_and(&mut is_walkable))
        .collect();
    if options.is_empty() {
        return None;
    }

    let reverse = heading.map(Direction::opposite);
    let forward: Vec<Direction> = options
        .iter()
        .copied()
        .filter(|direction| Some(*direction) != reverse)
        .collect();
    let choices = if forward.is_empty() { options } else { forward };

    if force_random {
        return rng.pick(&choices).map(|direction| Decision {
            direction: *direction,
            forced_random: true,
        });
    }
    if mode == PursuitMode::Fruit {
        return rng.pick(&choices).map(|direction| Decision {
            direction: *direction,
            forced_random: false,
        });
    }

    let score = |direction: Direction| {
        tile.step(direction)
            .map_or(f32::MAX, |next| next.euclidean_distance(target))
    };
    let mut best = choices[0];
    let mut best_score = score(best);
    for direction in choices.iter().copied().skip(1) {
        let candidate = score(direction);
        let better = match mode {
            PursuitMode::Frightened => candidate >= best_score,
            PursuitMode::Normal | PursuitMode::Fruit => candidate < best_score,
        };
        if better {
            best = direction;
            best_score = candidate;
        }
    }

    Some(Decision {
        direction: best,
        forced_random: false,
    })
}

/// Reports whether a path-following pursuer should replan this decision.
///
/// Paths with at most one tile left are always refreshed; otherwise a
/// replan happens with [`PATH_REFRESH_CHANCE`].
pub fn should_refresh_path<R: RngCore + ?Sized>(remaining: usize, rng: &mut R) -> bool {
    remaining <= 1 || rng.chance(PATH_REFRESH_CHANCE)
}

/// Detects pursuers oscillating between a couple of tiles while the runner waits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopBreaker {
    history: VecDeque<CellCoord>,
    loop_count: u32,
    threshold: u32,
    armed: bool,
}

impl LoopBreaker {
    /// Tiles remembered per pursuer.
    pub const HISTORY: usize = 6;
    /// Most recent tiles inspected for collapse.
    pub const WINDOW: usize = 5;
    /// Entries required before the window counts as collapsed.
    pub const MIN_ENTRIES: usize = 4;
    /// Largest number of distinct tiles in a collapsed window.
    pub const MAX_DISTINCT: usize = 2;
    /// Inclusive range the trigger threshold is drawn from.
    pub const THRESHOLD_RANGE: (u32, u32) = (2, 5);

    /// Creates a breaker with a freshly drawn threshold.
    pub fn new<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        Self {
            history: VecDeque::with_capacity(Self::HISTORY),
            loop_count: 0,
            threshold: draw_threshold(rng),
            armed: false,
        }
    }

    /// Records an arrival and reports whether the override was armed by it.
    pub fn record<R: RngCore + ?Sized>(
        &mut self,
        tile: CellCoord,
        runner_idle: bool,
        rng: &mut R,
    ) -> bool {
        self.history.push_back(tile);
        if self.history.len() > Self::HISTORY {
            let _ = self.history.pop_front();
        }

        if !runner_idle {
            self.loop_count = 0;
            self.armed = false;
            return false;
        }

        let skip = self.history.len().saturating_sub(Self::WINDOW);
        let window: Vec<CellCoord> = self.history.iter().skip(skip).copied().collect();
        let distinct: HashSet<CellCoord> = window.iter().copied().collect();
        if distinct.len() <= Self::MAX_DISTINCT && window.len() >= Self::MIN_ENTRIES {
            self.loop_count += 1;
        } else {
            self.loop_count = 0;
        }

        if self.loop_count >= self.threshold {
            self.armed = true;
            self.loop_count = 0;
            self.threshold = draw_threshold(rng);
            return true;
        }
        false
    }

    /// Reports whether the next decision must be random.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consumes the pending override.
    pub fn take_armed(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }

    /// Consecutive collapsed windows observed so far.
    #[must_use]
    pub const fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Collapsed windows required to arm the override.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

fn draw_threshold<R: RngCore + ?Sized>(rng: &mut R) -> u32 {
    let (min, max) = LoopBreaker::THRESHOLD_RANGE;
    rng.int(i64::from(min), i64::from(max)) as u32
}
