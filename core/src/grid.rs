//! Tile grid produced by maze generation and consumed by every system.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction};

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Impassable cell.
    Wall,
    /// Passable cell.
    Floor,
}

impl Cell {
    /// Reports whether entities may stand on the cell.
    #[must_use]
    pub const fn is_floor(self) -> bool {
        matches!(self, Self::Floor)
    }

    const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
        }
    }
}

/// Dense row-major grid of wall and floor cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with every cell set to `fill`.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, fill: Cell) -> Self {
        let count = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            cells: vec![fill; count],
        }
    }

    /// Parses an ASCII drawing where `#` marks walls and any other glyph floor.
    ///
    /// Rows shorter than the first are padded with walls.
    #[must_use]
    pub fn from_ascii(drawing: &str) -> Self {
        let lines: Vec<&str> = drawing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let columns = lines.first().map_or(0, |line| line.chars().count()) as u32;
        let rows = lines.len() as u32;
        let mut grid = Self::filled(columns, rows, Cell::Wall);
        for (row, line) in lines.iter().enumerate() {
            for (column, glyph) in line.chars().enumerate().take(columns as usize) {
                if glyph != '#' {
                    grid.set(CellCoord::new(column as u32, row as u32), Cell::Floor);
                }
            }
        }
        grid
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Cell stored at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the coordinate holds a floor cell.
    #[must_use]
    pub fn is_floor(&self, cell: CellCoord) -> bool {
        self.get(cell).is_some_and(Cell::is_floor)
    }

    /// Overwrites the cell at the coordinate. Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, value: Cell) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = value;
        }
    }

    /// Neighbour in the provided direction, if it lies inside the grid.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        cell.step(direction).filter(|next| self.contains(*next))
    }

    /// Number of orthogonal neighbours that are floor.
    #[must_use]
    pub fn floor_neighbor_count(&self, cell: CellCoord) -> usize {
        Direction::ALL
            .iter()
            .filter_map(|direction| self.neighbor(cell, *direction))
            .filter(|next| self.is_floor(*next))
            .count()
    }

    /// Iterator over every floor coordinate in row-major order.
    pub fn floor_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.coords().filter(|cell| self.is_floor(*cell))
    }

    /// Iterator over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Horizontal mirror of the coordinate across the vertical centre line.
    #[must_use]
    pub const fn mirror(&self, cell: CellCoord) -> CellCoord {
        CellCoord::new(self.columns - 1 - cell.column(), cell.row())
    }

    /// Renders the grid with `#` for walls and `.` for floors.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.rows as usize);
        for row in 0..self.rows {
            if row > 0 {
                out.push('\n');
            }
            for column in 0..self.columns {
                let cell = self.cells[(row * self.columns + column) as usize];
                out.push(cell.glyph());
            }
        }
        out
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Central holding pen where pursuers spawn.
///
/// Bounds are inclusive and describe the wall ring; the interior is every cell
/// strictly inside the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GhostHouse {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl GhostHouse {
    /// Creates a ghost house from inclusive ring bounds.
    #[must_use]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Leftmost ring column.
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.left
    }

    /// Topmost ring row.
    #[must_use]
    pub const fn top(&self) -> u32 {
        self.top
    }

    /// Rightmost ring column.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.right
    }

    /// Bottom ring row.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.bottom
    }

    /// Reports whether the cell lies on the ring or inside it.
    #[must_use]
    pub const fn covers(&self, cell: CellCoord) -> bool {
        cell.column() >= self.left
            && cell.column() <= self.right
            && cell.row() >= self.top
            && cell.row() <= self.bottom
    }

    /// Reports whether the cell lies strictly inside the ring.
    #[must_use]
    pub const fn contains_interior(&self, cell: CellCoord) -> bool {
        cell.column() > self.left
            && cell.column() < self.right
            && cell.row() > self.top
            && cell.row() < self.bottom
    }

    /// Interior cells in row-major order.
    #[must_use]
    pub fn interior_cells(&self) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        for row in self.top + 1..self.bottom {
            for column in self.left + 1..self.right {
                cells.push(CellCoord::new(column, row));
            }
        }
        cells
    }
}

/// Complete output of maze generation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Maze {
    /// Wall and floor layout.
    pub grid: Grid,
    /// Central pen bounds.
    pub ghost_house: GhostHouse,
    /// Rows whose border cells form warp tunnel pairs.
    pub warp_rows: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let drawing = "#####\n#...#\n#.#.#\n#####";
        let grid = Grid::from_ascii(drawing);
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.to_ascii(), drawing);
    }

    #[test]
    fn floor_neighbor_count_ignores_out_of_bounds() {
        let grid = Grid::from_ascii("..\n..");
        assert_eq!(grid.floor_neighbor_count(CellCoord::new(0, 0)), 2);
    }

    #[test]
    fn ghost_house_interior_excludes_ring() {
        let house = GhostHouse::new(11, 13, 16, 17);
        let interior = house.interior_cells();
        assert_eq!(interior.len(), 4 * 3);
        assert!(interior.iter().all(|cell| house.contains_interior(*cell)));
        assert!(!house.contains_interior(CellCoord::new(11, 14)));
        assert!(!house.contains_interior(CellCoord::new(12, 13)));
        assert!(house.covers(CellCoord::new(12, 13)));
        assert!(!house.covers(CellCoord::new(10, 13)));
    }

    #[test]
    fn mirror_reflects_across_centre() {
        let grid = Grid::filled(28, 31, Cell::Wall);
        assert_eq!(grid.mirror(CellCoord::new(0, 4)), CellCoord::new(27, 4));
        assert_eq!(grid.mirror(CellCoord::new(13, 4)), CellCoord::new(14, 4));
    }
}
