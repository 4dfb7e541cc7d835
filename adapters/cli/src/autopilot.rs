use maze_chase_core::{CellCoord, Command, InputState};
use maze_chase_world::{query, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Ticks the runner may spend travelling toward a goal before it is replaced.
const PATIENCE_TICKS: u32 = 90;

/// Drives the runner by tapping toward the nearest collectible, or toward a
/// random open tile when nothing is left to collect.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    target: Option<CellCoord>,
    patience: u32,
}

impl Autopilot {
    /// Creates an autopilot whose wandering is derived from `seed`.
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            target: None,
            patience: 0,
        }
    }

    /// Queues a tap for the runner once it reached or gave up on its goal.
    pub(crate) fn steer(&mut self, world: &World, out: &mut Vec<Command>) {
        let Some(runner) = query::runner(world) else {
            return;
        };
        let arrived = self.target.map_or(true, |target| target == runner.tile);
        if !arrived && self.patience > 0 {
            self.patience -= 1;
            return;
        }

        let goal = if arrived {
            nearest_collectible(world, runner.tile).or_else(|| self.wander(world, runner.tile))
        } else {
            self.wander(world, runner.tile)
        };
        let Some(goal) = goal else {
            return;
        };
        self.target = Some(goal);
        self.patience = PATIENCE_TICKS;
        out.push(Command::SubmitInput {
            entity: runner.id,
            input: InputState::tap(goal),
        });
    }

    fn wander(&mut self, world: &World, from: CellCoord) -> Option<CellCoord> {
        let grid = query::grid(world)?;
        let open: Vec<CellCoord> = grid
            .floor_cells()
            .filter(|cell| *cell != from && query::is_walkable(world, *cell))
            .collect();
        open.choose(&mut self.rng).copied()
    }
}

fn nearest_collectible(world: &World, from: CellCoord) -> Option<CellCoord> {
    query::pellets(world)
        .into_iter()
        .chain(query::power_items(world).into_iter().map(|(cell, _)| cell))
        .filter(|cell| *cell != from)
        .min_by_key(|cell| (cell.manhattan_distance(from), *cell))
}

#[cfg(test)]
mod tests {
    use maze_chase_core::Variant;
    use maze_chase_system_lobby::Lobby;
    use maze_chase_world::apply;

    use super::*;

    fn started(variant: Variant) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant,
                columns: 28,
                rows: 31,
                seed: 42,
            },
            &mut events,
        );
        let mut commands = Vec::new();
        Lobby::default().force_start(&mut commands);
        for command in commands {
            apply(&mut world, command, &mut events);
        }
        world
    }

    fn tap_target(command: &Command) -> Option<CellCoord> {
        match command {
            Command::SubmitInput { input, .. } => input.target,
            _ => None,
        }
    }

    #[test]
    fn taps_the_nearest_pellet_once_per_goal() {
        let world = started(Variant::Arcade);
        let runner = query::runner(&world).expect("runner placed").tile;
        let mut autopilot = Autopilot::new(7);

        let mut commands = Vec::new();
        autopilot.steer(&world, &mut commands);
        assert_eq!(commands.len(), 1);
        let target = tap_target(&commands[0]).expect("tap target");
        let nearest = query::pellets(&world)
            .into_iter()
            .chain(query::power_items(&world).into_iter().map(|(cell, _)| cell))
            .map(|cell| cell.manhattan_distance(runner))
            .min()
            .expect("arcade level has collectibles");
        assert_eq!(target.manhattan_distance(runner), nearest);

        commands.clear();
        autopilot.steer(&world, &mut commands);
        assert!(commands.is_empty());
    }

    #[test]
    fn wanders_to_open_tiles_in_the_labyrinth() {
        let world = started(Variant::Labyrinth);
        let mut autopilot = Autopilot::new(7);
        let mut commands = Vec::new();
        autopilot.steer(&world, &mut commands);

        let target = tap_target(&commands[0]).expect("tap target");
        assert!(query::is_walkable(&world, target));
        assert_ne!(Some(target), query::runner(&world).map(|runner| runner.tile));
    }
}
