//! Structural checks applied to every generated maze.

use std::collections::VecDeque;

use maze_chase_core::{CellCoord, Direction, Grid, Maze};

/// Outcome of validating a generated maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every cell equals its horizontal mirror.
    pub symmetric: bool,
    /// Every floor cell is reachable from every other floor cell.
    pub connected: bool,
    /// Warp rows are within the allowed count and open at both borders.
    pub warp_rows_ok: bool,
}

impl ValidationReport {
    /// Reports whether every check passed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.symmetric && self.connected && self.warp_rows_ok
    }
}

/// Runs every check against the maze.
#[must_use]
pub fn validate(maze: &Maze, min_warp_rows: usize, max_warp_rows: usize) -> ValidationReport {
    ValidationReport {
        symmetric: is_symmetric(&maze.grid),
        connected: is_connected(&maze.grid),
        warp_rows_ok: warp_rows_valid(&maze.grid, &maze.warp_rows, min_warp_rows, max_warp_rows),
    }
}

/// Reports whether `cell[y][x] == cell[y][columns - 1 - x]` for every cell.
#[must_use]
pub fn is_symmetric(grid: &Grid) -> bool {
    grid.coords()
        .all(|cell| grid.get(cell) == grid.get(grid.mirror(cell)))
}

/// Reports whether the floor cells form a single connected component.
///
/// A grid without floor cells is not considered connected.
#[must_use]
pub fn is_connected(grid: &Grid) -> bool {
    let Some(start) = grid.floor_cells().next() else {
        return false;
    };
    let reached = flood_fill(grid, start);
    grid.floor_cells().count() == reached
}

/// Reports whether every listed row is open at both borders and the count is in range.
#[must_use]
pub fn warp_rows_valid(grid: &Grid, warp_rows: &[u32], min: usize, max: usize) -> bool {
    if grid.columns() == 0 {
        return false;
    }
    let last_column = grid.columns() - 1;
    let open = warp_rows
        .iter()
        .filter(|row| {
            grid.is_floor(CellCoord::new(0, **row))
                && grid.is_floor(CellCoord::new(last_column, **row))
        })
        .count();
    open == warp_rows.len() && (min..=max).contains(&open)
}

/// Number of floor cells reachable from `start` through orthogonal steps.
fn flood_fill(grid: &Grid, start: CellCoord) -> usize {
    let mut visited = vec![false; grid.columns() as usize * grid.rows() as usize];
    let index = |cell: CellCoord| cell.row() as usize * grid.columns() as usize + cell.column() as usize;

    let mut queue = VecDeque::new();
    visited[index(start)] = true;
    queue.push_back(start);
    let mut reached = 0;

    while let Some(current) = queue.pop_front() {
        reached += 1;
        for direction in Direction::ALL {
            let Some(next) = grid.neighbor(current, direction) else {
                continue;
            };
            if !grid.is_floor(next) || visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back(next);
        }
    }

    reached
}
