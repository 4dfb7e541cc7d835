//! Per-level layout derived from a generated maze: spawns, portals, doors and items.

use std::{collections::BTreeMap, time::Duration};

use maze_chase_core::{
    CellCoord, DoorSnapshot, EffectKind, Event, Maze, RandomExt, Variant,
};
use rand::RngCore;

use crate::rules::Rules;

/// Border cell of a warp row linked to its counterpart on the opposite edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Portal {
    /// Cell occupied by the portal.
    pub cell: CellCoord,
    /// Identifier of this portal; left portals are even, right portals odd.
    pub id: u32,
    /// Identifier of the paired portal.
    pub pair: u32,
}

/// Wall cell overlay that periodically becomes passable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Door {
    cell: CellCoord,
    open: bool,
    timer: Duration,
    interval: Duration,
}

/// Collectible resting on a floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Item {
    Pellet,
    Power(EffectKind),
}

/// Mutable state of the level currently being played.
#[derive(Clone, Debug)]
pub(crate) struct Stage {
    pub(crate) maze: Maze,
    pub(crate) portals: Vec<Portal>,
    pub(crate) doors: Vec<Door>,
    pub(crate) items: BTreeMap<CellCoord, Item>,
    pub(crate) runner_spawn: CellCoord,
    pub(crate) pursuer_spawns: Vec<CellCoord>,
}

impl Stage {
    /// Lays out a level, drawing spawns, doors and items from `rng` in that order.
    ///
    /// Doors and items only exist in the arcade variant.
    pub(crate) fn build<R>(maze: Maze, variant: Variant, rules: &Rules, rng: &mut R) -> Self
    where
        R: RngCore + ?Sized,
    {
        let (runner_spawn, pursuer_spawns) = pick_spawn_points(&maze, rng);
        let portals = build_portals(&maze);
        let mut stage = Self {
            maze,
            portals,
            doors: Vec::new(),
            items: BTreeMap::new(),
            runner_spawn,
            pursuer_spawns,
        };
        if variant == Variant::Arcade {
            stage.doors = build_doors(&stage.maze, rules, rng);
            stage.items = build_items(&stage, rules, rng);
        }
        stage
    }

    /// Reports whether an entity may enter `cell`.
    ///
    /// Wall-passing entities may enter any in-bounds cell; everyone else needs
    /// floor or an open door.
    pub(crate) fn is_walkable(&self, cell: CellCoord, pass_walls: bool) -> bool {
        let grid = &self.maze.grid;
        if !grid.contains(cell) {
            return false;
        }
        if pass_walls || grid.is_floor(cell) {
            return true;
        }
        self.doors.iter().any(|door| door.cell == cell && door.open)
    }

    /// Cell of the portal paired with the portal on `cell`, if any.
    pub(crate) fn portal_exit(&self, cell: CellCoord) -> Option<CellCoord> {
        let portal = self.portals.iter().find(|portal| portal.cell == cell)?;
        self.portals
            .iter()
            .find(|candidate| candidate.id == portal.pair)
            .map(|pair| pair.cell)
    }

    /// Advances door timers, toggling and redrawing the interval of every due door.
    pub(crate) fn tick_doors<R>(
        &mut self,
        dt: Duration,
        rules: &Rules,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: RngCore + ?Sized,
    {
        for door in &mut self.doors {
            door.timer = door.timer.saturating_add(dt);
            if door.timer < door.interval {
                continue;
            }
            door.open = !door.open;
            door.timer = Duration::ZERO;
            door.interval = draw_door_interval(rules, rng);
            out_events.push(Event::DoorToggled {
                cell: door.cell,
                open: door.open,
            });
        }
    }

    pub(crate) fn door_snapshots(&self) -> Vec<DoorSnapshot> {
        self.doors
            .iter()
            .map(|door| DoorSnapshot {
                cell: door.cell,
                open: door.open,
            })
            .collect()
    }
}

/// Shuffles the interior floor for the runner and the pen interior for pursuers.
///
/// Pursuers fall back to the remaining floor when the pen holds fewer than four cells.
fn pick_spawn_points<R>(maze: &Maze, rng: &mut R) -> (CellCoord, Vec<CellCoord>)
where
    R: RngCore + ?Sized,
{
    let house = maze.ghost_house;
    let floors: Vec<CellCoord> = interior_floor(maze)
        .filter(|cell| !house.contains_interior(*cell))
        .collect();
    let shuffled = rng.shuffle(&floors);
    let runner = shuffled
        .first()
        .copied()
        .unwrap_or_else(|| CellCoord::new(1, 1));

    let pen: Vec<CellCoord> = house
        .interior_cells()
        .into_iter()
        .filter(|cell| maze.grid.is_floor(*cell))
        .collect();
    let pool = if pen.len() >= 4 {
        pen
    } else {
        shuffled.into_iter().filter(|cell| *cell != runner).collect()
    };
    let pursuers = rng.shuffle(&pool).into_iter().take(4).collect();
    (runner, pursuers)
}

fn build_portals(maze: &Maze) -> Vec<Portal> {
    let last_column = maze.grid.columns().saturating_sub(1);
    let mut portals = Vec::with_capacity(maze.warp_rows.len() * 2);
    for (index, row) in maze.warp_rows.iter().enumerate() {
        let id = index as u32 * 2;
        portals.push(Portal {
            cell: CellCoord::new(0, *row),
            id,
            pair: id + 1,
        });
        portals.push(Portal {
            cell: CellCoord::new(last_column, *row),
            id: id + 1,
            pair: id,
        });
    }
    portals
}

/// Picks interior wall cells touching at least two floors and closes them as doors.
fn build_doors<R>(maze: &Maze, rules: &Rules, rng: &mut R) -> Vec<Door>
where
    R: RngCore + ?Sized,
{
    let grid = &maze.grid;
    let candidates: Vec<CellCoord> = interior_cells(maze)
        .filter(|cell| !grid.is_floor(*cell) && grid.floor_neighbor_count(*cell) >= 2)
        .collect();
    rng.shuffle(&candidates)
        .into_iter()
        .take(rules.door_count)
        .map(|cell| Door {
            cell,
            open: false,
            timer: Duration::ZERO,
            interval: draw_door_interval(rules, rng),
        })
        .collect()
}

/// Scatters pellets over the eligible floor and promotes a shuffled few to power items.
fn build_items<R>(stage: &Stage, rules: &Rules, rng: &mut R) -> BTreeMap<CellCoord, Item>
where
    R: RngCore + ?Sized,
{
    let power_count = rng.int(
        i64::from(rules.power_items_min),
        i64::from(rules.power_items_max),
    );
    let house = stage.maze.ghost_house;
    let eligible: Vec<CellCoord> = interior_floor(&stage.maze)
        .filter(|cell| !house.contains_interior(*cell))
        .filter(|cell| stage.portals.iter().all(|portal| portal.cell != *cell))
        .collect();
    let power_cells: Vec<CellCoord> = rng
        .shuffle(&eligible)
        .into_iter()
        .take(usize::try_from(power_count).unwrap_or(0))
        .collect();

    let mut items = BTreeMap::new();
    for cell in eligible {
        if cell == stage.runner_spawn {
            continue;
        }
        let item = if power_cells.contains(&cell) {
            let effect = rng
                .pick(&EffectKind::ALL)
                .copied()
                .unwrap_or(EffectKind::Speed);
            Item::Power(effect)
        } else {
            Item::Pellet
        };
        let _ = items.insert(cell, item);
    }
    items
}

fn draw_door_interval<R>(rules: &Rules, rng: &mut R) -> Duration
where
    R: RngCore + ?Sized,
{
    let millis = rng.int(
        rules.door_interval_min_ms as i64,
        rules.door_interval_max_ms as i64,
    );
    Duration::from_millis(u64::try_from(millis).unwrap_or(0))
}

/// Cells strictly inside the outer border, in row-major order.
fn interior_cells(maze: &Maze) -> impl Iterator<Item = CellCoord> + '_ {
    let columns = maze.grid.columns();
    let rows = maze.grid.rows();
    maze.grid.coords().filter(move |cell| {
        cell.column() >= 1
            && cell.row() >= 1
            && cell.column() + 1 < columns
            && cell.row() + 1 < rows
    })
}

fn interior_floor(maze: &Maze) -> impl Iterator<Item = CellCoord> + '_ {
    interior_cells(maze).filter(|cell| maze.grid.is_floor(*cell))
}
