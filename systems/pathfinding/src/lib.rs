#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shortest-path search over four-connected tile grids.
//!
//! Both searches are pure functions of their inputs. Walkability is supplied
//! by the caller so door overlays, wall-passing effects and portal links stay
//! outside this crate.

use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap, VecDeque},
};

use maze_chase_core::{CellCoord, Direction, Grid};

/// Neighbour expansion order for the A* search.
const SEARCH_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Finds a shortest four-directional path from `start` to `goal`, both inclusive.
///
/// The search is A* with unit step costs and a Manhattan heuristic; ties on
/// the estimated cost resolve in discovery order. The start cell is never
/// tested for walkability. An empty vector signals an unreachable goal.
pub fn find_path<F>(
    columns: u32,
    rows: u32,
    start: CellCoord,
    goal: CellCoord,
    mut is_walkable: F,
) -> Vec<CellCoord>
where
    F: FnMut(CellCoord) -> bool,
{
    let in_bounds = |cell: CellCoord| cell.column() < columns && cell.row() < rows;
    if !in_bounds(start) || !in_bounds(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
    let mut cost: HashMap<CellCoord, u32> = HashMap::new();
    let mut sequence = 0_u64;

    let _ = cost.insert(start, 0);
    open.push(OpenEntry {
        estimate: start.manhattan_distance(goal),
        sequence,
        cell: start,
    });

    while let Some(entry) = open.pop() {
        let current = entry.cell;
        if current == goal {
            return reconstruct(&came_from, start, current);
        }

        let current_cost = cost.get(&current).copied().unwrap_or(u32::MAX);
        if entry.estimate > current_cost.saturating_add(current.manhattan_distance(goal)) {
            continue;
        }

        for direction in SEARCH_ORDER {
            let Some(next) = current.step(direction) else {
                continue;
            };
            if !in_bounds(next) || !is_walkable(next) {
                continue;
            }

            let tentative = current_cost + 1;
            if tentative >= cost.get(&next).copied().unwrap_or(u32::MAX) {
                continue;
            }

            let _ = came_from.insert(next, current);
            let _ = cost.insert(next, tentative);
            sequence += 1;
            open.push(OpenEntry {
                estimate: tentative + next.manhattan_distance(goal),
                sequence,
                cell: next,
            });
        }
    }

    Vec::new()
}

/// Convenience wrapper around [`find_path`] that walks the grid's floor cells.
#[must_use]
pub fn find_path_on_grid(grid: &Grid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    find_path(grid.columns(), grid.rows(), start, goal, |cell| {
        grid.is_floor(cell)
    })
}

/// Best-effort route used by tap-to-move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteToward {
    /// Tiles from the start to [`RouteToward::reached`], both inclusive.
    pub path: Vec<CellCoord>,
    /// Reachable tile closest to the requested target by Manhattan distance.
    pub reached: CellCoord,
}

/// Breadth-first route toward `target` that degrades to the closest reachable tile.
///
/// Neighbours are the walkable orthogonal tiles in up, down, left, right
/// order followed by the tile returned from `link`, which models portal pairs.
/// Returns `None` when no tile is closer than the start itself.
pub fn find_path_toward<F, L>(
    columns: u32,
    rows: u32,
    start: CellCoord,
    target: CellCoord,
    mut is_walkable: F,
    mut link: L,
) -> Option<RouteToward>
where
    F: FnMut(CellCoord) -> bool,
    L: FnMut(CellCoord) -> Option<CellCoord>,
{
    let in_bounds = |cell: CellCoord| cell.column() < columns && cell.row() < rows;

    let mut queue = VecDeque::from([start]);
    let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
    let _ = came_from.insert(start, start);
    let mut best = start;
    let mut best_score = start.manhattan_distance(target);

    while let Some(current) = queue.pop_front() {
        let score = current.manhattan_distance(target);
        if score < best_score {
            best = current;
            best_score = score;
        }
        if current == target {
            best = current;
            break;
        }

        let linked = link(current).filter(|pair| in_bounds(*pair));
        let neighbours = Direction::ALL
            .into_iter()
            .filter_map(|direction| current.step(direction))
            .filter(|next| in_bounds(*next))
            .filter(|next| is_walkable(*next))
            .chain(linked);
        let discovered: Vec<CellCoord> = neighbours.collect();
        for next in discovered {
            if came_from.contains_key(&next) {
                continue;
            }
            let _ = came_from.insert(next, current);
            queue.push_back(next);
        }
    }

    if best == start {
        return None;
    }
    Some(RouteToward {
        path: reconstruct(&came_from, start, best),
        reached: best,
    })
}

fn reconstruct(
    came_from: &HashMap<CellCoord, CellCoord>,
    start: CellCoord,
    end: CellCoord,
) -> Vec<CellCoord> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let Some(previous) = came_from.get(&current).copied() else {
            break;
        };
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    estimate: u32,
    sequence: u64,
    cell: CellCoord,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        Reverse((self.estimate, self.sequence)).cmp(&Reverse((other.estimate, other.sequence)))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_field_path_length_is_manhattan_plus_one() {
        let start = CellCoord::new(1, 1);
        let goal = CellCoord::new(6, 4);
        let path = find_path(8, 6, start, goal, |_| true);

        assert_eq!(path.len() as u32, start.manhattan_distance(goal) + 1);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
    }

    #[test]
    fn path_steps_are_orthogonal_neighbours() {
        let grid = Grid::from_ascii(
            "#######
             #.....#
             #.###.#
             #...#.#
             #######",
        );
        let path = find_path_on_grid(&grid, CellCoord::new(1, 3), CellCoord::new(5, 3));

        assert_eq!(path.len(), 9);
        for pair in path.windows(2) {
            assert!(Direction::between(pair[0], pair[1]).is_some());
            assert!(grid.is_floor(pair[1]));
        }
    }

    #[test]
    fn walled_off_goal_yields_empty_path() {
        let grid = Grid::from_ascii(
            "#####
             #.#.#
             #####",
        );
        assert!(find_path_on_grid(&grid, CellCoord::new(1, 1), CellCoord::new(3, 1)).is_empty());
    }

    #[test]
    fn out_of_bounds_goal_yields_empty_path() {
        assert!(find_path(3, 3, CellCoord::new(1, 1), CellCoord::new(9, 9), |_| true).is_empty());
    }

    #[test]
    fn start_equal_to_goal_is_single_tile() {
        let cell = CellCoord::new(2, 2);
        assert_eq!(find_path(4, 4, cell, cell, |_| false), vec![cell]);
    }

    #[test]
    fn toward_unreachable_target_stops_at_closest_tile() {
        let grid = Grid::from_ascii(
            "#######
             #...#.#
             #######",
        );
        let route = find_path_toward(
            grid.columns(),
            grid.rows(),
            CellCoord::new(1, 1),
            CellCoord::new(5, 1),
            |cell| grid.is_floor(cell),
            |_| None,
        )
        .expect("a closer tile exists");

        assert_eq!(route.reached, CellCoord::new(3, 1));
        assert_eq!(
            route.path,
            vec![CellCoord::new(1, 1), CellCoord::new(2, 1), CellCoord::new(3, 1)]
        );
    }

    #[test]
    fn toward_follows_portal_links() {
        let grid = Grid::from_ascii(
            "#######
             ..#.#..
             #######",
        );
        let left = CellCoord::new(0, 1);
        let right = CellCoord::new(6, 1);
        let route = find_path_toward(
            grid.columns(),
            grid.rows(),
            CellCoord::new(1, 1),
            CellCoord::new(5, 1),
            |cell| grid.is_floor(cell),
            |cell| match cell {
                c if c == left => Some(right),
                c if c == right => Some(left),
                _ => None,
            },
        )
        .expect("target reachable through the portal");

        assert_eq!(route.reached, CellCoord::new(5, 1));
        assert_eq!(
            route.path,
            vec![CellCoord::new(1, 1), left, right, CellCoord::new(5, 1)]
        );
    }

    #[test]
    fn toward_without_progress_is_none() {
        let grid = Grid::from_ascii(
            "#####
             #.#.#
             #####",
        );
        assert!(find_path_toward(
            grid.columns(),
            grid.rows(),
            CellCoord::new(1, 1),
            CellCoord::new(3, 1),
            |cell| grid.is_floor(cell),
            |_| None,
        )
        .is_none());
    }
}
