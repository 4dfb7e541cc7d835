#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural maze generation with symmetry, connectivity and warp validation.
//!
//! A half-width maze is carved with a biased recursive backtracker, braided,
//! looped, decorated with small rooms and thinned to single-width corridors.
//! It is then mirrored, fitted with a central ghost house and breached by warp
//! tunnels. [`generate_validated`] retries with derived seeds until the result
//! passes [`validation`], falling back to the last attempt when the budget runs
//! out.

use std::collections::HashSet;

use maze_chase_core::{
    Cell, CellCoord, Direction, GhostHouse, Grid, Maze, MazeRng, RandomExt, DEFAULT_COLUMNS,
    DEFAULT_ROWS,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod validation;

const MIN_COLUMNS: u32 = 10;
const MIN_ROWS: u32 = 9;

/// Room footprints and their relative selection weights.
const ROOM_SIZES: [(u32, u32, f64); 7] = [
    (1, 1, 95.0),
    (1, 2, 1.0),
    (2, 1, 1.0),
    (2, 2, 0.5),
    (3, 2, 0.3),
    (2, 3, 0.3),
    (4, 4, 0.1),
];

/// Columns scanned west of the seam for floor to link to.
const SEAM_REACH: u32 = 2;
/// Columns scanned west of the pen door for floor to link to.
const DOOR_REACH: u32 = 3;

/// Neighbour order used when braiding dead ends.
const BRAID_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Tunable constants that shape generated mazes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Number of columns in the full grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Generation attempts before falling back to an unvalidated maze.
    pub max_attempts: u32,
    /// Probability of continuing the previous carving direction.
    pub corridor_bias: f64,
    /// Dead-end braiding passes.
    pub braid_passes: u32,
    /// Target number of extra loops punched through walls.
    pub extra_loops: u32,
    /// Half-grid area divided by this value yields the room placement attempts.
    pub room_area_divisor: u32,
    /// Double-corridor thinning passes.
    pub thinning_passes: u32,
    /// Upper bound on closures made while enforcing single-width corridors.
    pub max_width_closures: u32,
    /// Minimum number of links opened across the symmetry seam.
    pub center_links_min: u32,
    /// Maximum number of links opened across the symmetry seam.
    pub center_links_max: u32,
    /// Minimum number of warp rows.
    pub warp_rows_min: u32,
    /// Maximum number of warp rows.
    pub warp_rows_max: u32,
    /// Width of the ghost house ring.
    pub ghost_house_width: u32,
    /// Height of the ghost house ring.
    pub ghost_house_height: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            max_attempts: 30,
            corridor_bias: 0.7,
            braid_passes: 2,
            extra_loops: 6,
            room_area_divisor: 40,
            thinning_passes: 3,
            max_width_closures: 200,
            center_links_min: 2,
            center_links_max: 4,
            warp_rows_min: 1,
            warp_rows_max: 3,
            ghost_house_width: 6,
            ghost_house_height: 5,
        }
    }
}

impl GenerationConfig {
    /// Copy of the configuration resized to the provided dimensions.
    #[must_use]
    pub fn with_dimensions(&self, columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            ..self.clone()
        }
    }

    /// Checks that the configuration describes a buildable maze.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_columns = MIN_COLUMNS.max(self.ghost_house_width + 4);
        let min_rows = MIN_ROWS.max(self.ghost_house_height + 4);
        if self.columns < min_columns || self.rows < min_rows {
            return Err(ConfigError::GridTooSmall {
                columns: self.columns,
                rows: self.rows,
                min_columns,
                min_rows,
            });
        }
        if self.ghost_house_width < 3 || self.ghost_house_height < 3 {
            return Err(ConfigError::GhostHouseTooSmall {
                width: self.ghost_house_width,
                height: self.ghost_house_height,
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if !(0.0..=1.0).contains(&self.corridor_bias) {
            return Err(ConfigError::BiasOutOfRange(self.corridor_bias));
        }
        if self.room_area_divisor == 0 {
            return Err(ConfigError::ZeroRoomDivisor);
        }
        check_range("center_links", self.center_links_min, self.center_links_max)?;
        check_range("warp_rows", self.warp_rows_min, self.warp_rows_max)?;
        if self.warp_rows_min == 0 {
            return Err(ConfigError::EmptyRange {
                name: "warp_rows",
                min: self.warp_rows_min,
                max: self.warp_rows_max,
            });
        }
        Ok(())
    }
}

fn check_range(name: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::EmptyRange { name, min, max });
    }
    Ok(())
}

/// Reasons a [`GenerationConfig`] cannot produce a maze.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid cannot host the ghost house and a surrounding corridor.
    #[error("grid {columns}x{rows} is smaller than the minimum {min_columns}x{min_rows}")]
    GridTooSmall {
        /// Requested columns.
        columns: u32,
        /// Requested rows.
        rows: u32,
        /// Smallest accepted column count.
        min_columns: u32,
        /// Smallest accepted row count.
        min_rows: u32,
    },
    /// The ghost house has no interior.
    #[error("ghost house {width}x{height} has no interior")]
    GhostHouseTooSmall {
        /// Requested ring width.
        width: u32,
        /// Requested ring height.
        height: u32,
    },
    /// The attempt budget is zero.
    #[error("at least one generation attempt is required")]
    NoAttempts,
    /// The corridor bias is not a probability.
    #[error("corridor bias {0} is outside [0, 1]")]
    BiasOutOfRange(f64),
    /// The room divisor would divide by zero.
    #[error("room area divisor must be positive")]
    ZeroRoomDivisor,
    /// A min/max pair is inverted or empty.
    #[error("{name} range {min}..={max} is empty")]
    EmptyRange {
        /// Name of the offending range.
        name: &'static str,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
}

/// Maze returned by [`generate_validated`] with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedMaze {
    /// Generated layout.
    pub maze: Maze,
    /// Seed of the attempt that produced the layout.
    pub seed: u32,
    /// Attempts consumed, including the returned one.
    pub attempts: u32,
    /// Whether the layout passed validation.
    pub validated: bool,
    /// Random stream positioned after generation, for deriving the level layout.
    pub rng: MazeRng,
}

/// Generates mazes with seeds `seed`, `seed + 1`, ... until one validates.
///
/// When every attempt fails the last generated maze is returned with
/// `validated == false`; an imperfect maze is preferred over no level.
pub fn generate_validated(
    config: &GenerationConfig,
    seed: u32,
) -> Result<GeneratedMaze, ConfigError> {
    config.validate()?;

    let mut attempt = 0;
    loop {
        let attempt_seed = seed.wrapping_add(attempt);
        let mut generator = MazeGenerator::new(config, MazeRng::new(attempt_seed));
        let maze = generator.generate();
        attempt += 1;

        let report = validation::validate(
            &maze,
            config.warp_rows_min as usize,
            config.warp_rows_max as usize,
        );
        debug!(attempt, seed = attempt_seed, ?report, "generated maze candidate");

        if report.is_valid() || attempt >= config.max_attempts {
            if !report.is_valid() {
                warn!(
                    attempts = attempt,
                    seed = attempt_seed,
                    ?report,
                    "maze validation budget exhausted; using last candidate"
                );
            }
            return Ok(GeneratedMaze {
                maze,
                seed: attempt_seed,
                attempts: attempt,
                validated: report.is_valid(),
                rng: generator.into_rng(),
            });
        }
    }
}

/// Single-attempt maze builder driven by an injected random source.
#[derive(Debug)]
pub struct MazeGenerator<'a, R> {
    config: &'a GenerationConfig,
    rng: R,
}

#[derive(Clone, Copy, Debug)]
struct CarveFrame {
    cell: CellCoord,
    heading: Option<Direction>,
}

impl<'a, R: RngCore> MazeGenerator<'a, R> {
    /// Creates a generator for the configuration drawing from `rng`.
    #[must_use]
    pub fn new(config: &'a GenerationConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Returns the random source, positioned after everything drawn so far.
    #[must_use]
    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Builds one maze without validating it.
    pub fn generate(&mut self) -> Maze {
        let ghost_house = house_bounds(
            self.config.columns,
            self.config.rows,
            self.config.ghost_house_width,
            self.config.ghost_house_height,
        );
        let half_columns = self.config.columns / 2;
        let mut half = self.carve_half(half_columns, self.config.rows, &ghost_house);
        self.braid_dead_ends(&mut half, &ghost_house);
        self.add_loops(&mut half, &ghost_house);
        let rooms = self.carve_rooms(&mut half, &ghost_house);
        thin_double_corridors(&mut half, self.config.thinning_passes, &rooms);
        enforce_single_width(&mut half, &rooms, self.config.max_width_closures);
        let links = self.draw_count(self.config.center_links_min, self.config.center_links_max);
        self.open_center_links(&mut half, links, &ghost_house);

        let mut grid = mirror(&half, self.config.columns);
        carve_ghost_house(&mut grid, &ghost_house);
        let warp_count = self.draw_count(self.config.warp_rows_min, self.config.warp_rows_max);
        let warp_rows = self.create_warp_tunnels(&mut grid, warp_count);

        Maze {
            grid,
            ghost_house,
            warp_rows,
        }
    }

    fn draw_count(&mut self, min: u32, max: u32) -> usize {
        usize::try_from(self.rng.int(i64::from(min), i64::from(max))).unwrap_or(0)
    }

    /// Randomised depth-first backtracker on the odd-cell lattice, routed around the pen.
    fn carve_half(&mut self, columns: u32, rows: u32, house: &GhostHouse) -> Grid {
        let mut grid = Grid::filled(columns, rows, Cell::Wall);
        let start = CellCoord::new(1, 1);
        grid.set(start, Cell::Floor);
        let mut stack = vec![CarveFrame {
            cell: start,
            heading: None,
        }];

        while let Some(current) = stack.last().copied() {
            let mut order = self.rng.shuffle(&Direction::ALL);
            if let Some(heading) = current.heading {
                if self.rng.chance(self.config.corridor_bias) {
                    order.retain(|direction| *direction != heading);
                    order.insert(0, heading);
                }
            }

            let mut carved = false;
            for direction in order {
                let (dx, dy) = direction.delta();
                let Some(next) = current.cell.offset(dx * 2, dy * 2) else {
                    continue;
                };
                let inside = next.column() > 0
                    && next.column() < columns - 1
                    && next.row() > 0
                    && next.row() < rows - 1;
                if !inside || house.covers(next) || grid.is_floor(next) {
                    continue;
                }
                grid.set(next, Cell::Floor);
                if let Some(between) = current.cell.step(direction) {
                    grid.set(between, Cell::Floor);
                }
                stack.push(CarveFrame {
                    cell: next,
                    heading: Some(direction),
                });
                carved = true;
                break;
            }

            if !carved {
                let _ = stack.pop();
            }
        }

        grid
    }

    /// Opens one wall next to each dead end, never breaching the outer border.
    fn braid_dead_ends(&mut self, grid: &mut Grid, house: &GhostHouse) {
        for _ in 0..self.config.braid_passes {
            let dead_ends: Vec<CellCoord> = interior(grid)
                .filter(|cell| grid.is_floor(*cell) && grid.floor_neighbor_count(*cell) <= 1)
                .collect();

            for cell in self.rng.shuffle(&dead_ends) {
                let options: Vec<CellCoord> = BRAID_ORDER
                    .iter()
                    .filter_map(|direction| grid.neighbor(cell, *direction))
                    .filter(|next| {
                        !grid.is_floor(*next) && !on_half_border(grid, *next) && !house.covers(*next)
                    })
                    .collect();
                if let Some(pick) = self.rng.pick(&options) {
                    grid.set(*pick, Cell::Floor);
                }
            }
        }
    }

    /// Punches walls that already touch two floors, creating cycles.
    fn add_loops(&mut self, grid: &mut Grid, house: &GhostHouse) {
        let target = self.config.extra_loops;
        let max_column = i64::from(grid.columns()) - 2;
        let max_row = i64::from(grid.rows()) - 2;
        let mut added = 0;
        let mut tries = 0;
        while added < target && tries < target * 4 {
            tries += 1;
            let column = self.rng.int(1, max_column);
            let row = self.rng.int(1, max_row);
            let cell = CellCoord::new(column as u32, row as u32);
            if grid.get(cell) == Some(Cell::Wall)
                && !house.covers(cell)
                && grid.floor_neighbor_count(cell) >= 2
            {
                grid.set(cell, Cell::Floor);
                added += 1;
            }
        }
    }

    /// Carves sparse rectangular rooms that touch existing floor.
    fn carve_rooms(&mut self, grid: &mut Grid, house: &GhostHouse) -> HashSet<CellCoord> {
        let total_weight: f64 = ROOM_SIZES.iter().map(|(_, _, weight)| weight).sum();
        let attempts = grid.rows() * grid.columns() / self.config.room_area_divisor;
        let mut rooms = HashSet::new();

        for _ in 0..attempts {
            let roll = self.rng.unit() * total_weight;
            let mut pick = (ROOM_SIZES[0].0, ROOM_SIZES[0].1);
            let mut accumulated = 0.0;
            for (width, height, weight) in ROOM_SIZES {
                accumulated += weight;
                if roll <= accumulated {
                    pick = (width, height);
                    break;
                }
            }

            let (width, height) = pick;
            let max_column = (i64::from(grid.columns()) - i64::from(width) - 1).max(1);
            let max_row = (i64::from(grid.rows()) - i64::from(height) - 1).max(1);
            let column = self.rng.int(1, max_column) as u32;
            let row = self.rng.int(1, max_row) as u32;

            if !room_placeable(grid, house, column, row, width, height) {
                continue;
            }
            for y in row..row + height {
                for x in column..column + width {
                    let cell = CellCoord::new(x, y);
                    grid.set(cell, Cell::Floor);
                    let _ = rooms.insert(cell);
                }
            }
        }

        rooms
    }

    /// Opens seam cells that reach nearby floor so the mirrored halves join.
    fn open_center_links(&mut self, grid: &mut Grid, count: usize, house: &GhostHouse) {
        let seam = grid.columns() - 1;
        let candidates: Vec<u32> = (2..grid.rows().saturating_sub(2))
            .filter(|row| {
                let cell = CellCoord::new(seam, *row);
                !house.covers(cell) && floor_to_west(grid, cell, SEAM_REACH).is_some()
            })
            .collect();
        for row in self.rng.shuffle(&candidates).into_iter().take(count) {
            let cell = CellCoord::new(seam, row);
            let gap = floor_to_west(grid, cell, SEAM_REACH).unwrap_or(1);
            for step in 0..gap {
                grid.set(CellCoord::new(seam - step, row), Cell::Floor);
            }
        }
    }

    /// Breaches both borders on up to `count` rows already open next to the border.
    fn create_warp_tunnels(&mut self, grid: &mut Grid, count: usize) -> Vec<u32> {
        let last_column = grid.columns() - 1;
        let candidates: Vec<u32> = (2..grid.rows().saturating_sub(2))
            .filter(|row| {
                grid.is_floor(CellCoord::new(1, *row))
                    && grid.is_floor(CellCoord::new(last_column - 1, *row))
            })
            .collect();
        let mut warp_rows: Vec<u32> = self.rng.shuffle(&candidates).into_iter().take(count).collect();
        if warp_rows.is_empty() {
            warp_rows.push(grid.rows() / 2);
        }

        for row in &warp_rows {
            grid.set(CellCoord::new(0, *row), Cell::Floor);
            grid.set(CellCoord::new(last_column, *row), Cell::Floor);
        }
        warp_rows
    }
}

fn interior(grid: &Grid) -> impl Iterator<Item = CellCoord> {
    let columns = grid.columns();
    (1..grid.rows().saturating_sub(1)).flat_map(move |row| {
        (1..columns.saturating_sub(1)).map(move |column| CellCoord::new(column, row))
    })
}

/// Distance to the nearest floor cell west of `cell`, scanning at most `reach` cells.
fn floor_to_west(grid: &Grid, cell: CellCoord, reach: u32) -> Option<u32> {
    (1..=reach.min(cell.column())).find(|step| {
        grid.is_floor(CellCoord::new(cell.column() - step, cell.row()))
    })
}

/// Pen bounds centred on a grid of the given size.
///
/// The width grows by one when its parity differs from the grid's so the
/// pen stays mirror-symmetric.
fn house_bounds(columns: u32, rows: u32, width: u32, height: u32) -> GhostHouse {
    let width = width + (columns - width) % 2;
    let left = (columns - width) / 2;
    let top = rows / 2 - height / 2;
    GhostHouse::new(left, top, left + width - 1, top + height - 1)
}

/// Outer border of the half grid; the seam column on the right stays open to carving.
fn on_half_border(grid: &Grid, cell: CellCoord) -> bool {
    cell.row() == 0 || cell.row() + 1 == grid.rows() || cell.column() == 0
}

fn room_placeable(
    grid: &Grid,
    house: &GhostHouse,
    column: u32,
    row: u32,
    width: u32,
    height: u32,
) -> bool {
    for y in row..row + height {
        for x in column..column + width {
            let cell = CellCoord::new(x, y);
            if grid.get(cell) != Some(Cell::Wall) || house.covers(cell) {
                return false;
            }
        }
    }

    for y in row.saturating_sub(1)..=row + height {
        for x in column.saturating_sub(1)..=column + width {
            let covered = (row..row + height).contains(&y) && (column..column + width).contains(&x);
            if !covered && grid.is_floor(CellCoord::new(x, y)) {
                return true;
            }
        }
    }
    false
}

/// Closes the second cell of accidental double-wide corridors outside rooms
/// whenever the floor stays connected.
fn thin_double_corridors(grid: &mut Grid, passes: u32, rooms: &HashSet<CellCoord>) {
    let columns = grid.columns();
    let rows = grid.rows();
    for _ in 0..passes {
        for y in 1..rows.saturating_sub(1) {
            for x in 1..columns.saturating_sub(2) {
                thin_pair(grid, CellCoord::new(x, y), CellCoord::new(x + 1, y), rooms);
            }
        }
        for y in 1..rows.saturating_sub(2) {
            for x in 1..columns.saturating_sub(1) {
                thin_pair(grid, CellCoord::new(x, y), CellCoord::new(x, y + 1), rooms);
            }
        }
    }
}

fn thin_pair(grid: &mut Grid, first: CellCoord, second: CellCoord, rooms: &HashSet<CellCoord>) {
    if grid.is_floor(first)
        && grid.is_floor(second)
        && !rooms.contains(&second)
        && grid.floor_neighbor_count(second) >= 3
        && can_close(grid, second, rooms)
    {
        grid.set(second, Cell::Wall);
    }
}

/// Closes one cell of each adjacent floor pair when the grid stays connected.
fn enforce_single_width(grid: &mut Grid, rooms: &HashSet<CellCoord>, max_closures: u32) {
    let mut closures = 0;
    let columns = grid.columns();
    let rows = grid.rows();
    for y in 1..rows.saturating_sub(1) {
        for x in 1..columns.saturating_sub(1) {
            let cell = CellCoord::new(x, y);
            if rooms.contains(&cell) {
                continue;
            }
            for partner in [CellCoord::new(x + 1, y), CellCoord::new(x, y + 1)] {
                if closures >= max_closures {
                    return;
                }
                if !grid.is_floor(cell) || !grid.is_floor(partner) || rooms.contains(&partner) {
                    continue;
                }
                let close = if grid.floor_neighbor_count(cell) >= grid.floor_neighbor_count(partner) {
                    cell
                } else {
                    partner
                };
                if can_close(grid, close, rooms) {
                    grid.set(close, Cell::Wall);
                    closures += 1;
                }
            }
        }
    }
}

fn can_close(grid: &mut Grid, cell: CellCoord, rooms: &HashSet<CellCoord>) -> bool {
    if rooms.contains(&cell) {
        return false;
    }
    grid.set(cell, Cell::Wall);
    let connected = validation::is_connected(grid);
    grid.set(cell, Cell::Floor);
    connected
}

/// Reflects the half maze into a full-width grid with a solid border.
///
/// On odd widths the centre column repeats the seam so links still cross.
fn mirror(half: &Grid, columns: u32) -> Grid {
    let rows = half.rows();
    let seam = half.columns().saturating_sub(1);
    let mut grid = Grid::filled(columns, rows, Cell::Wall);
    for cell in half.coords() {
        if let Some(value) = half.get(cell) {
            grid.set(cell, value);
            grid.set(grid.mirror(cell), value);
            if columns % 2 == 1 && cell.column() == seam {
                grid.set(CellCoord::new(half.columns(), cell.row()), value);
            }
        }
    }

    for column in 0..columns {
        grid.set(CellCoord::new(column, 0), Cell::Wall);
        grid.set(CellCoord::new(column, rows - 1), Cell::Wall);
    }
    for row in 0..rows {
        grid.set(CellCoord::new(0, row), Cell::Wall);
        grid.set(CellCoord::new(columns - 1, row), Cell::Wall);
    }
    grid
}

/// Walls off the pen, hollows it and breaches its top edge.
///
/// The breach sits on the centre column and its mirror, so it is a single cell
/// on odd widths and the two seam cells on even widths. It extends upward
/// until it meets an existing corridor.
fn carve_ghost_house(grid: &mut Grid, house: &GhostHouse) {
    for y in house.top()..=house.bottom() {
        for x in house.left()..=house.right() {
            let cell = CellCoord::new(x, y);
            let value = if house.contains_interior(cell) {
                Cell::Floor
            } else {
                Cell::Wall
            };
            grid.set(cell, value);
        }
    }

    let door = CellCoord::new((house.left() + house.right()) / 2, house.top());
    open_symmetric(grid, door);
    let mut row = house.top();
    while row > 1 {
        row -= 1;
        let cell = CellCoord::new(door.column(), row);
        open_symmetric(grid, cell);
        if grid
            .neighbor(cell, Direction::North)
            .is_some_and(|next| grid.is_floor(next))
        {
            break;
        }
        if let Some(gap) = floor_to_west(grid, cell, DOOR_REACH) {
            for step in 1..gap {
                open_symmetric(grid, CellCoord::new(cell.column() - step, row));
            }
            break;
        }
    }
}

fn open_symmetric(grid: &mut Grid, cell: CellCoord) {
    grid.set(cell, Cell::Floor);
    grid.set(grid.mirror(cell), Cell::Floor);
}
