#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tile-stepping movement state machine shared by every actor.
//!
//! A [`Mover`] is either idle on a tile or moving toward one adjacent tile.
//! Leaving the idle state requires a validated direction: the next step of an
//! active path, a queued input direction, or a direction supplied by AI. Arrival
//! snaps the continuous position to the exact tile centre, so following a path
//! never accumulates drift.

use glam::Vec2;
use maze_chase_core::{CellCoord, Direction};

/// Remaining distance, in tiles, below which a moving actor snaps onto its target.
pub const ARRIVAL_EPSILON: f32 = 0.05;

/// Motion state of a [`Mover`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// Resting on a tile and awaiting a direction.
    Idle,
    /// Interpolating toward an adjacent tile.
    Moving {
        /// Tile being entered.
        target: CellCoord,
        /// Direction of travel.
        direction: Direction,
    },
}

/// Continuous-position actor that advances one tile at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct Mover {
    tile: CellCoord,
    position: Vec2,
    state: MotionState,
    heading: Option<Direction>,
    desired: Option<Direction>,
    path: Vec<CellCoord>,
    path_index: usize,
}

impl Mover {
    /// Creates an idle mover resting on the provided tile.
    #[must_use]
    pub fn new(tile: CellCoord) -> Self {
        Self {
            tile,
            position: tile.center(),
            state: MotionState::Idle,
            heading: None,
            desired: None,
            path: Vec::new(),
            path_index: 0,
        }
    }

    /// Tile the mover last arrived at.
    #[must_use]
    pub const fn tile(&self) -> CellCoord {
        self.tile
    }

    /// Continuous position in tile space.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current motion state.
    #[must_use]
    pub const fn state(&self) -> MotionState {
        self.state
    }

    /// Reports whether the mover rests on a tile.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, MotionState::Idle)
    }

    /// Direction of the most recent step, cleared when input-driven motion stalls.
    #[must_use]
    pub const fn heading(&self) -> Option<Direction> {
        self.heading
    }

    /// Queued input direction.
    #[must_use]
    pub const fn desired(&self) -> Option<Direction> {
        self.desired
    }

    /// Reports whether a path is being followed.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    /// Tiles of the active path that have not been reached yet.
    #[must_use]
    pub fn remaining_path(&self) -> &[CellCoord] {
        self.path.get(self.path_index..).unwrap_or(&[])
    }

    /// Final tile of the active path.
    #[must_use]
    pub fn path_goal(&self) -> Option<CellCoord> {
        self.remaining_path().last().copied()
    }

    /// Queues an input direction and abandons any active path.
    pub fn steer(&mut self, direction: Direction) {
        self.clear_path();
        self.desired = Some(direction);
    }

    /// Starts following `path`, which must begin at the current tile.
    ///
    /// Paths with fewer than two tiles or that start elsewhere are ignored.
    pub fn follow_path(&mut self, path: Vec<CellCoord>) -> bool {
        if path.len() < 2 || path.first() != Some(&self.tile) {
            return false;
        }
        self.path = path;
        self.path_index = 1;
        true
    }

    /// Drops the active path without touching the queued direction.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }

    /// Places the mover on `tile` immediately and leaves it idle.
    pub fn teleport(&mut self, tile: CellCoord) {
        self.tile = tile;
        self.position = tile.center();
        self.state = MotionState::Idle;
        self.skip_reached_path_tiles();
    }

    /// Resets the mover onto a spawn tile, discarding every queued intent.
    pub fn reset(&mut self, tile: CellCoord) {
        *self = Self::new(tile);
    }

    /// Picks the next step for an input- or path-driven mover.
    ///
    /// Follows the path's next tile when a path is active; otherwise prefers
    /// the queued direction over the current heading. A stalled mover loses
    /// its heading.
    pub fn plan_step<F>(&mut self, mut is_walkable: F) -> Option<Direction>
    where
        F: FnMut(CellCoord) -> bool,
    {
        if !self.is_idle() {
            return None;
        }

        self.skip_reached_path_tiles();
        if let Some(next) = self.path.get(self.path_index).copied() {
            match Direction::between(self.tile, next) {
                Some(direction) => self.desired = Some(direction),
                None => {
                    self.clear_path();
                    self.desired = None;
                }
            }
        }

        let tile = self.tile;
        let fallback = if self.has_path() { None } else { self.heading };
        let choice = [self.desired, fallback]
            .into_iter()
            .flatten()
            .find(|direction| tile.step(*direction).is_some_and(&mut is_walkable));
        if choice.is_none() {
            self.heading = None;
        }
        choice
    }

    /// Leaves the idle state toward `direction` when the destination is walkable.
    ///
    /// Invalid requests are ignored and reported as `false`.
    pub fn start<F>(&mut self, direction: Direction, mut is_walkable: F) -> bool
    where
        F: FnMut(CellCoord) -> bool,
    {
        if !self.is_idle() {
            return false;
        }
        let Some(target) = self.tile.step(direction) else {
            return false;
        };
        if !is_walkable(target) {
            return false;
        }
        self.state = MotionState::Moving { target, direction };
        self.heading = Some(direction);
        true
    }

    /// Moves `distance` tiles toward the current target, returning the tile on arrival.
    pub fn advance(&mut self, distance: f32) -> Option<CellCoord> {
        let MotionState::Moving { target, direction } = self.state else {
            return None;
        };

        let destination = target.center();
        let remaining = self.position.distance(destination);
        if distance.max(0.0) + ARRIVAL_EPSILON >= remaining {
            self.tile = target;
            self.position = destination;
            self.state = MotionState::Idle;
            self.skip_reached_path_tiles();
            return Some(target);
        }

        self.position += direction.unit() * distance.max(0.0);
        None
    }

    fn skip_reached_path_tiles(&mut self) {
        while self.path.get(self.path_index) == Some(&self.tile) {
            self.path_index += 1;
        }
        if !self.path.is_empty() && self.path_index >= self.path.len() {
            self.clear_path();
            self.desired = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: CellCoord) -> bool {
        true
    }

    #[test]
    fn starts_idle_on_tile_centre() {
        let mover = Mover::new(CellCoord::new(3, 4));
        assert!(mover.is_idle());
        assert_eq!(mover.position(), Vec2::new(3.0, 4.0));
        assert_eq!(mover.heading(), None);
    }

    #[test]
    fn blocked_start_is_ignored() {
        let mut mover = Mover::new(CellCoord::new(1, 1));
        assert!(!mover.start(Direction::North, |_| false));
        assert!(mover.is_idle());
        assert_eq!(mover.heading(), None);
    }

    #[test]
    fn start_rejects_underflowing_step() {
        let mut mover = Mover::new(CellCoord::new(0, 0));
        assert!(!mover.start(Direction::West, open));
        assert!(!mover.start(Direction::North, open));
    }

    #[test]
    fn advance_interpolates_then_snaps() {
        let mut mover = Mover::new(CellCoord::new(2, 2));
        assert!(mover.start(Direction::East, open));

        assert_eq!(mover.advance(0.4), None);
        assert!((mover.position().x - 2.4).abs() < 1e-6);
        assert!(!mover.is_idle());

        assert_eq!(mover.advance(0.58), Some(CellCoord::new(3, 2)));
        assert_eq!(mover.position(), Vec2::new(3.0, 2.0));
        assert_eq!(mover.tile(), CellCoord::new(3, 2));
        assert!(mover.is_idle());
    }

    #[test]
    fn moving_mover_refuses_new_start() {
        let mut mover = Mover::new(CellCoord::new(2, 2));
        assert!(mover.start(Direction::South, open));
        assert!(!mover.start(Direction::East, open));
    }

    #[test]
    fn queued_direction_falls_back_to_heading() {
        let mut mover = Mover::new(CellCoord::new(2, 2));
        assert!(mover.start(Direction::East, open));
        let _ = mover.advance(1.0);

        mover.steer(Direction::North);
        let wall = CellCoord::new(3, 1);
        assert_eq!(mover.plan_step(|cell| cell != wall), Some(Direction::East));
    }

    #[test]
    fn stalled_mover_loses_heading() {
        let mut mover = Mover::new(CellCoord::new(2, 2));
        assert!(mover.start(Direction::East, open));
        let _ = mover.advance(1.0);

        assert_eq!(mover.plan_step(|_| false), None);
        assert_eq!(mover.heading(), None);
    }

    #[test]
    fn steering_abandons_path() {
        let mut mover = Mover::new(CellCoord::new(1, 1));
        assert!(mover.follow_path(vec![CellCoord::new(1, 1), CellCoord::new(2, 1)]));
        mover.steer(Direction::South);
        assert!(!mover.has_path());
        assert_eq!(mover.plan_step(open), Some(Direction::South));
    }

    #[test]
    fn path_must_start_on_current_tile() {
        let mut mover = Mover::new(CellCoord::new(1, 1));
        assert!(!mover.follow_path(vec![CellCoord::new(2, 1), CellCoord::new(3, 1)]));
        assert!(!mover.follow_path(vec![CellCoord::new(1, 1)]));
        assert!(!mover.has_path());
    }

    #[test]
    fn teleport_skips_portal_pair_in_path() {
        let left = CellCoord::new(0, 4);
        let right = CellCoord::new(9, 4);
        let mut mover = Mover::new(CellCoord::new(1, 4));
        assert!(mover.follow_path(vec![CellCoord::new(1, 4), left, right, CellCoord::new(8, 4)]));

        assert_eq!(mover.plan_step(open), Some(Direction::West));
        assert!(mover.start(Direction::West, open));
        assert_eq!(mover.advance(1.0), Some(left));
        mover.teleport(right);

        assert_eq!(mover.remaining_path(), &[CellCoord::new(8, 4)]);
        assert_eq!(mover.plan_step(open), Some(Direction::West));
    }
}
