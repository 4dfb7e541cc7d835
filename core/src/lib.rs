#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the maze chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that scoring,
//! audio and presentation layers react to independently. Systems consume
//! immutable views and respond with plain values or new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod grid;
pub mod rng;

pub use grid::{Cell, GhostHouse, Grid, Maze};
pub use rng::{MazeRng, RandomExt};

/// Default number of grid columns for a level.
pub const DEFAULT_COLUMNS: u32 = 28;
/// Default number of grid rows for a level.
pub const DEFAULT_ROWS: u32 = 31;

/// Game flavour built on top of the shared maze core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Pellet-collecting chase with doors, power items, lives and levels.
    Arcade,
    /// Theseus and the Minotaur pursuit with a thread trail and path-following AI.
    Labyrinth,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Generates the first level for a new match and discards prior state.
    ConfigureMatch {
        /// Game flavour to simulate.
        variant: Variant,
        /// Number of grid columns.
        columns: u32,
        /// Number of grid rows.
        rows: u32,
        /// Base seed plumbed unchanged into the random stream.
        seed: u32,
    },
    /// Places actors according to the lobby roster and starts the match.
    StartMatch {
        /// Role-to-participant assignments captured at setup time.
        slots: Vec<SlotAssignment>,
    },
    /// Replaces the pending input for a human-controlled entity.
    SubmitInput {
        /// Entity receiving the input.
        entity: EntityId,
        /// Directional flags and optional tap target.
        input: InputState,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that a level maze was generated.
    MazeGenerated {
        /// One-based level index.
        level: u32,
        /// Seed of the attempt that produced the grid.
        seed: u32,
        /// Number of generation attempts consumed.
        attempts: u32,
        /// Whether the grid passed validation or is the degraded fallback.
        validated: bool,
    },
    /// Announces that actors were placed and play began.
    MatchStarted {
        /// Game flavour being simulated.
        variant: Variant,
    },
    /// Confirms that an entity passed through a portal.
    EntityTeleported {
        /// Entity that teleported.
        entity: EntityId,
        /// Portal cell that was entered.
        from: CellCoord,
        /// Paired portal cell the entity now occupies.
        to: CellCoord,
    },
    /// Reports that a door overlay changed state.
    DoorToggled {
        /// Cell covered by the door.
        cell: CellCoord,
        /// Whether the door is now passable.
        open: bool,
    },
    /// A regular pellet was collected.
    PelletCollected {
        /// Cell the pellet occupied.
        cell: CellCoord,
    },
    /// A power item was collected.
    PowerCollected {
        /// Cell the item occupied.
        cell: CellCoord,
        /// Effect granted by the item.
        effect: EffectKind,
    },
    /// A timed effect ran out.
    EffectExpired {
        /// Effect that expired.
        effect: EffectKind,
    },
    /// A pursuer and the runner met on the same tile.
    Collision {
        /// Pursuer involved in the collision.
        pursuer: EntityId,
        /// Result of the encounter.
        outcome: CollisionOutcome,
    },
    /// The anti-loop breaker overrode a pursuer's scored choice.
    ForcedRandomMove {
        /// Pursuer whose direction was randomised.
        entity: EntityId,
    },
    /// A pursuer severed the runner's thread.
    ThreadCut {
        /// Pursuer that cut the thread.
        entity: EntityId,
        /// Number of thread tiles left after the cut.
        remaining: usize,
    },
    /// Every pellet of the level was collected.
    LevelCleared {
        /// One-based level index that was cleared.
        level: u32,
    },
    /// The runner completed the final level.
    MatchWon,
    /// The runner ran out of lives or was caught.
    MatchLost,
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in evaluation order: up, down, left, right.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Unit vector in tile space.
    #[must_use]
    pub fn unit(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    /// Direction of a single orthogonal step between adjacent cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Straight-line distance between the two cell centres.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        self.center().distance(other.center())
    }

    /// Coordinate shifted by the provided signed offsets, if it stays non-negative.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellCoord::new(column, row))
    }

    /// Adjacent coordinate one step in the provided direction.
    ///
    /// Only underflow is rejected; callers bound the result against their grid.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Centre of the cell in continuous tile space.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32)
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Participant roles. The runner is pursued by four differently-minded pursuers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The pursued runner.
    Theseus,
    /// Pursuer that chases the runner's current tile.
    Hunter,
    /// Pursuer that cuts the runner off a few tiles ahead.
    Warden,
    /// Pursuer that flanks by reflecting the hunter's approach vector.
    Tracker,
    /// Pursuer that chases from afar and retreats to a corner up close.
    Brute,
}

impl Role {
    /// Pursuer roles in spawn order.
    pub const PURSUERS: [Role; 4] = [Role::Hunter, Role::Warden, Role::Tracker, Role::Brute];

    /// Reports whether the role hunts the runner.
    #[must_use]
    pub const fn is_pursuer(self) -> bool {
        !matches!(self, Self::Theseus)
    }

    /// Lowercase label used in rosters and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Theseus => "theseus",
            Self::Hunter => "hunter",
            Self::Warden => "warden",
            Self::Tracker => "tracker",
            Self::Brute => "brute",
        }
    }
}

/// Timed effects granted by power items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Runner moves faster.
    Speed,
    /// Pursuers move slower.
    Slow,
    /// Pursuers flee from the runner.
    Fright,
    /// Pursuers wander randomly.
    Glutton,
    /// Runner passes through walls and captures pursuers on contact.
    Super,
}

impl EffectKind {
    /// Every effect in power-item table order.
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Speed,
        EffectKind::Slow,
        EffectKind::Fright,
        EffectKind::Glutton,
        EffectKind::Super,
    ];
}

/// Behaviour mode applied to every pursuer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuitMode {
    /// Role-specific chase heuristics.
    #[default]
    Normal,
    /// Scores are inverted so pursuers maximise distance.
    Frightened,
    /// Pursuers ignore targets and wander.
    Fruit,
}

/// Result of a runner and pursuer sharing a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// The pursuer was captured and sent back to its spawn point.
    Capture,
    /// The runner lost a life.
    LifeLost,
}

/// Per-tick input for a controlled entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    /// Up key held.
    pub up: bool,
    /// Down key held.
    pub down: bool,
    /// Left key held.
    pub left: bool,
    /// Right key held.
    pub right: bool,
    /// Tap-to-move destination.
    pub target: Option<CellCoord>,
}

impl InputState {
    /// Input holding a single direction.
    #[must_use]
    pub fn toward(direction: Direction) -> Self {
        let mut input = Self::default();
        match direction {
            Direction::North => input.up = true,
            Direction::South => input.down = true,
            Direction::West => input.left = true,
            Direction::East => input.right = true,
        }
        input
    }

    /// Input holding only a tap target.
    #[must_use]
    pub fn tap(target: CellCoord) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Resolved direction; horizontal flags win over vertical ones.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        if self.right {
            Some(Direction::East)
        } else if self.left {
            Some(Direction::West)
        } else if self.down {
            Some(Direction::South)
        } else if self.up {
            Some(Direction::North)
        } else {
            None
        }
    }
}

/// Role-to-participant assignment supplied by the lobby at match setup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// Participant identifier.
    pub id: String,
    /// Role the participant plays.
    pub role: Role,
    /// Whether the role is driven by AI.
    pub is_ai: bool,
    /// Whether a human participant is connected.
    pub connected: bool,
}

impl SlotAssignment {
    /// Creates a new slot assignment.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role, is_ai: bool, connected: bool) -> Self {
        Self {
            id: id.into(),
            role,
            is_ai,
            connected,
        }
    }
}

/// Immutable representation of a single entity used for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Role played by the entity.
    pub role: Role,
    /// Tile the entity last arrived at.
    pub tile: CellCoord,
    /// Continuous position in tile space; cell centres sit on integers.
    pub position: Vec2,
    /// Current heading, if moving or recently moved.
    pub facing: Option<Direction>,
    /// Whether AI drives the entity.
    pub is_ai: bool,
}

/// Immutable representation of a door overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorSnapshot {
    /// Cell covered by the door.
    pub cell: CellCoord,
    /// Whether the door is currently passable.
    pub open: bool,
}
