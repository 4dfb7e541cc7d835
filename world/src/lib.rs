#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state for the maze chase engine.
//!
//! The world owns the current level, every actor, the effect timers and the
//! score. Adapters mutate it exclusively through [`apply`] and observe it
//! through [`query`]; each command reports what happened as [`Event`] values.

mod effects;
mod level;
mod rules;

use std::time::Duration;

use maze_chase_core::{
    CellCoord, CollisionOutcome, Command, EffectKind, EntityId, EntitySnapshot, Event,
    InputState, Maze, MazeRng, PursuitMode, Role, SlotAssignment, Variant,
};
use maze_chase_system_maze_generation::{generate_validated, GenerationConfig};
use maze_chase_system_movement::Mover;
use maze_chase_system_pathfinding::{find_path, find_path_toward};
use maze_chase_system_pursuit::{
    choose_direction, select_target, should_refresh_path, LoopBreaker, PursuitView,
};
use tracing::{debug, info, warn};

use effects::EffectMap;
use level::{Item, Stage};

pub use level::Portal;
pub use rules::Rules;

/// Seed offset between consecutive levels of a match.
const LEVEL_SEED_STRIDE: u32 = 1_000;

const ARCADE_RUNNER_BASE_SPEED: f32 = 5.0;
const ARCADE_RUNNER_SPEED_PER_LEVEL: f32 = 0.25;
const ARCADE_PURSUER_BASE_SPEED: f32 = 4.4;
const ARCADE_PURSUER_SPEED_PER_LEVEL: f32 = 0.2;
const SPEED_EFFECT_MULTIPLIER: f32 = 1.4;
const SLOW_EFFECT_MULTIPLIER: f32 = 0.6;

/// Progress of the current match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchPhase {
    /// A level may be generated but actors have not been placed.
    #[default]
    Setup,
    /// The simulation advances on every tick.
    Playing,
    /// The runner cleared the final level.
    Won,
    /// The runner ran out of lives or was caught.
    Lost,
}

#[derive(Clone, Debug)]
struct Actor {
    id: EntityId,
    role: Role,
    is_ai: bool,
    spawn: CellCoord,
    mover: Mover,
    last_teleport: Option<Duration>,
    breaker: Option<LoopBreaker>,
}

impl Actor {
    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            role: self.role,
            tile: self.mover.tile(),
            position: self.mover.position(),
            facing: self.mover.heading(),
            is_ai: self.is_ai,
        }
    }

    fn respawn(&mut self) {
        self.mover.reset(self.spawn);
        self.last_teleport = None;
    }
}

/// Represents the authoritative maze chase world state.
#[derive(Debug)]
pub struct World {
    variant: Variant,
    rules: Rules,
    generation: GenerationConfig,
    base_seed: u32,
    level: u32,
    stage: Option<Stage>,
    rng: MazeRng,
    runner: Option<Actor>,
    pursuers: Vec<Actor>,
    effects: EffectMap,
    thread: Vec<CellCoord>,
    score: u32,
    lives: u32,
    next_extra_life: u32,
    phase: MatchPhase,
    clock: Duration,
    tick_index: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an unconfigured world with default generation settings and rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GenerationConfig::default(), Rules::default())
    }

    /// Creates an unconfigured world with explicit generation settings and rules.
    #[must_use]
    pub fn with_config(generation: GenerationConfig, rules: Rules) -> Self {
        Self {
            variant: Variant::Arcade,
            lives: rules.lives,
            next_extra_life: rules.extra_life_every,
            rules,
            generation,
            base_seed: 0,
            level: 0,
            stage: None,
            rng: MazeRng::new(0),
            runner: None,
            pursuers: Vec::new(),
            effects: EffectMap::default(),
            thread: Vec::new(),
            score: 0,
            phase: MatchPhase::Setup,
            clock: Duration::ZERO,
            tick_index: 0,
        }
    }

    fn level_seed(&self) -> u32 {
        self.base_seed
            .wrapping_add(self.level.wrapping_mul(LEVEL_SEED_STRIDE))
    }

    /// Generates the maze for the current level and lays it out.
    fn load_level(&mut self, out_events: &mut Vec<Event>) -> bool {
        let seed = self.level_seed();
        match generate_validated(&self.generation, seed) {
            Ok(generated) => {
                out_events.push(Event::MazeGenerated {
                    level: self.level,
                    seed: generated.seed,
                    attempts: generated.attempts,
                    validated: generated.validated,
                });
                info!(
                    level = self.level,
                    seed = generated.seed,
                    attempts = generated.attempts,
                    validated = generated.validated,
                    "level generated"
                );
                self.install_level(generated.maze, generated.rng);
                true
            }
            Err(error) => {
                warn!(%error, level = self.level, "level generation rejected");
                self.stage = None;
                false
            }
        }
    }

    fn install_level(&mut self, maze: Maze, mut rng: MazeRng) {
        let stage = Stage::build(maze, self.variant, &self.rules, &mut rng);
        self.rng = rng;
        self.stage = Some(stage);
        self.effects.clear();
        self.thread.clear();
    }

    /// Creates actors for the roster and places them on the current level.
    fn spawn_actors(&mut self, slots: &[SlotAssignment]) {
        let runner_is_ai = slots
            .iter()
            .find(|slot| slot.role == Role::Theseus)
            .is_some_and(|slot| slot.is_ai);
        let placeholder = CellCoord::new(0, 0);
        self.runner = Some(Actor {
            id: EntityId::new(0),
            role: Role::Theseus,
            is_ai: runner_is_ai,
            spawn: placeholder,
            mover: Mover::new(placeholder),
            last_teleport: None,
            breaker: None,
        });

        self.pursuers = Role::PURSUERS
            .iter()
            .enumerate()
            .map(|(index, role)| {
                let is_ai = slots
                    .iter()
                    .find(|slot| slot.role == *role)
                    .map_or(true, |slot| slot.is_ai);
                Actor {
                    id: EntityId::new(index as u32 + 1),
                    role: *role,
                    is_ai,
                    spawn: placeholder,
                    mover: Mover::new(placeholder),
                    last_teleport: None,
                    breaker: Some(LoopBreaker::new(&mut self.rng)),
                }
            })
            .collect();
        self.place_actors();
    }

    /// Moves every actor to its spawn on the current stage.
    ///
    /// Pursuers without a spawn point are dropped.
    fn place_actors(&mut self) {
        let Some(stage) = self.stage.as_ref() else {
            return;
        };
        if let Some(runner) = self.runner.as_mut() {
            runner.spawn = stage.runner_spawn;
            runner.respawn();
        }
        let spawns = &stage.pursuer_spawns;
        self.pursuers.truncate(spawns.len());
        for (pursuer, spawn) in self.pursuers.iter_mut().zip(spawns) {
            pursuer.spawn = *spawn;
            pursuer.respawn();
        }
        self.thread.clear();
        if self.variant == Variant::Labyrinth {
            self.thread.push(stage.runner_spawn);
        }
    }

    fn reset_positions(&mut self) {
        if let Some(runner) = self.runner.as_mut() {
            runner.respawn();
        }
        for pursuer in &mut self.pursuers {
            pursuer.respawn();
        }
    }

    /// Super lets the runner cross walls; a runner still inside a wall or a
    /// closed door keeps crossing until it stands on open ground again.
    fn runner_passes_walls(&self) -> bool {
        if self.variant == Variant::Arcade && self.effects.is_active(EffectKind::Super) {
            return true;
        }
        let (Some(stage), Some(runner)) = (self.stage.as_ref(), self.runner.as_ref()) else {
            return false;
        };
        !stage.is_walkable(runner.mover.tile(), false)
    }

    fn runner_speed(&self) -> f32 {
        match self.variant {
            Variant::Arcade => {
                let base = ARCADE_RUNNER_BASE_SPEED
                    + ARCADE_RUNNER_SPEED_PER_LEVEL * self.level as f32;
                if self.effects.is_active(EffectKind::Speed) {
                    base * SPEED_EFFECT_MULTIPLIER
                } else {
                    base
                }
            }
            Variant::Labyrinth => labyrinth_speed(Role::Theseus),
        }
    }

    fn pursuer_speed(&self, role: Role) -> f32 {
        match self.variant {
            Variant::Arcade => {
                let base = ARCADE_PURSUER_BASE_SPEED
                    + ARCADE_PURSUER_SPEED_PER_LEVEL * self.level as f32;
                if self.effects.is_active(EffectKind::Slow) {
                    base * SLOW_EFFECT_MULTIPLIER
                } else {
                    base
                }
            }
            Variant::Labyrinth => labyrinth_speed(role),
        }
    }

    /// Applies a submitted input to a human-controlled actor.
    fn submit_input(&mut self, entity: EntityId, input: InputState) {
        let variant = self.variant;
        let targets_runner = self
            .runner
            .as_ref()
            .is_some_and(|runner| runner.id == entity);
        let pass_walls = targets_runner && self.runner_passes_walls();
        let Some(stage) = self.stage.as_ref() else {
            return;
        };
        let actor = if targets_runner {
            self.runner.as_mut()
        } else {
            self.pursuers.iter_mut().find(|pursuer| pursuer.id == entity)
        };
        let Some(actor) = actor else {
            debug!(entity = entity.get(), "input for unknown entity ignored");
            return;
        };
        if actor.is_ai && actor.role.is_pursuer() {
            debug!(entity = entity.get(), "input for AI pursuer ignored");
            return;
        }

        if let Some(direction) = input.direction() {
            actor.mover.steer(direction);
        } else if let Some(target) = input.target {
            if let Some(path) = route(variant, stage, actor.mover.tile(), target, pass_walls) {
                let _ = actor.mover.follow_path(path);
            }
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if let Some(stage) = self.stage.as_mut() {
            stage.tick_doors(dt, &self.rules, &mut self.rng, out_events);
        }
        if self.advance_runner(dt, out_events) == Flow::Halt {
            return;
        }
        self.advance_pursuers(dt, out_events);
        if self.resolve_collisions(out_events) == Flow::Halt {
            return;
        }
        for effect in self.effects.expire(self.clock) {
            debug!(?effect, "effect expired");
            out_events.push(Event::EffectExpired { effect });
        }
    }

    fn advance_runner(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> Flow {
        let pass_walls = self.runner_passes_walls();
        let distance = self.runner_speed() * dt.as_secs_f32();
        let cooldown = self.rules.portal_cooldown();
        let (Some(stage), Some(runner)) = (self.stage.as_ref(), self.runner.as_mut()) else {
            return Flow::Continue;
        };

        steer_by_input(runner, stage, self.variant, pass_walls);
        let Some(tile) = travel(runner, stage, distance, self.clock, cooldown, out_events) else {
            return Flow::Continue;
        };

        match self.variant {
            Variant::Labyrinth => {
                if self.thread.last() != Some(&tile) {
                    self.thread.push(tile);
                }
                Flow::Continue
            }
            Variant::Arcade => self.collect(tile, out_events),
        }
    }

    /// Collects the item on `tile` and advances the level once the board is empty.
    fn collect(&mut self, tile: CellCoord, out_events: &mut Vec<Event>) -> Flow {
        let Some(stage) = self.stage.as_mut() else {
            return Flow::Continue;
        };
        match stage.items.remove(&tile) {
            Some(Item::Pellet) => {
                out_events.push(Event::PelletCollected { cell: tile });
                self.award(self.rules.pellet_points);
            }
            Some(Item::Power(effect)) => {
                out_events.push(Event::PowerCollected { cell: tile, effect });
                self.award(self.rules.power_points);
                self.effects
                    .activate(effect, self.clock, self.rules.effect_duration());
                debug!(?effect, "effect activated");
            }
            None => return Flow::Continue,
        }

        if self.stage.as_ref().is_some_and(|stage| stage.items.is_empty()) {
            self.clear_level(out_events);
            return Flow::Halt;
        }
        Flow::Continue
    }

    fn clear_level(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::LevelCleared { level: self.level });
        info!(level = self.level, score = self.score, "level cleared");
        if self.level >= self.rules.levels {
            self.phase = MatchPhase::Won;
            out_events.push(Event::MatchWon);
            info!(score = self.score, "match won");
            return;
        }

        self.level += 1;
        if self.load_level(out_events) {
            self.place_actors();
        } else {
            self.phase = MatchPhase::Setup;
        }
    }

    fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if self.rules.extra_life_every > 0 && self.score >= self.next_extra_life {
            self.lives += 1;
            self.next_extra_life = self
                .next_extra_life
                .saturating_add(self.rules.extra_life_every);
            info!(lives = self.lives, score = self.score, "extra life awarded");
        }
    }

    fn advance_pursuers(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let cooldown = self.rules.portal_cooldown();
        let mode = self.effects.mode();
        let Some(runner) = self.runner.as_ref() else {
            return;
        };
        let runner_tile = runner.mover.tile();
        let runner_heading = runner.mover.heading();
        let runner_idle = runner.mover.is_idle();

        for index in 0..self.pursuers.len() {
            let distance = self.pursuer_speed(self.pursuers[index].role) * dt.as_secs_f32();
            let hunter = self
                .pursuers
                .iter()
                .find(|pursuer| pursuer.role == Role::Hunter)
                .map(|pursuer| pursuer.mover.tile());
            let Some(stage) = self.stage.as_ref() else {
                return;
            };
            let grid = &stage.maze.grid;
            let view = PursuitView {
                columns: grid.columns(),
                rows: grid.rows(),
                runner: runner_tile,
                runner_heading,
                hunter,
            };
            let pursuer = &mut self.pursuers[index];

            if pursuer.is_ai {
                decide(pursuer, stage, self.variant, mode, &view, &mut self.rng, out_events);
            } else {
                steer_by_input(pursuer, stage, self.variant, false);
            }

            let Some(tile) = travel(pursuer, stage, distance, self.clock, cooldown, out_events)
            else {
                continue;
            };
            if let Some(breaker) = pursuer.breaker.as_mut() {
                if breaker.record(tile, runner_idle, &mut self.rng) {
                    debug!(entity = pursuer.id.get(), "loop breaker armed");
                }
            }
            if self.variant == Variant::Labyrinth {
                if let Some(cut) = self.thread.iter().position(|cell| *cell == tile) {
                    let _ = self.thread.drain(..=cut);
                    out_events.push(Event::ThreadCut {
                        entity: pursuer.id,
                        remaining: self.thread.len(),
                    });
                }
            }
        }
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) -> Flow {
        let Some(runner_tile) = self.runner.as_ref().map(|runner| runner.mover.tile()) else {
            return Flow::Continue;
        };
        let captures = self.variant == Variant::Arcade
            && (self.effects.mode() != PursuitMode::Normal
                || self.effects.is_active(EffectKind::Super));

        for index in 0..self.pursuers.len() {
            if self.pursuers[index].mover.tile() != runner_tile {
                continue;
            }
            let pursuer = self.pursuers[index].id;
            if captures {
                self.pursuers[index].respawn();
                out_events.push(Event::Collision {
                    pursuer,
                    outcome: CollisionOutcome::Capture,
                });
                self.award(self.rules.capture_points);
                continue;
            }

            out_events.push(Event::Collision {
                pursuer,
                outcome: CollisionOutcome::LifeLost,
            });
            self.lose_life(out_events);
            return Flow::Halt;
        }
        Flow::Continue
    }

    fn lose_life(&mut self, out_events: &mut Vec<Event>) {
        let caught = self.variant == Variant::Labyrinth;
        self.lives = self.lives.saturating_sub(1);
        if caught || self.lives == 0 {
            self.phase = MatchPhase::Lost;
            out_events.push(Event::MatchLost);
            info!(score = self.score, level = self.level, "match lost");
            return;
        }
        info!(lives = self.lives, "life lost");
        self.reset_positions();
    }
}

/// Whether the rest of a tick should still run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt,
}

fn labyrinth_speed(role: Role) -> f32 {
    match role {
        Role::Theseus => 6.0,
        Role::Hunter => 5.2,
        Role::Warden => 4.6,
        Role::Tracker => 4.8,
        Role::Brute => 4.4,
    }
}

/// Route for a tap target: A* in the labyrinth, best effort with portals in the arcade.
///
/// Returns `None` when no step toward the target is possible.
fn route(
    variant: Variant,
    stage: &Stage,
    start: CellCoord,
    target: CellCoord,
    pass_walls: bool,
) -> Option<Vec<CellCoord>> {
    let grid = &stage.maze.grid;
    let walkable = |cell: CellCoord| stage.is_walkable(cell, pass_walls);
    let path = match variant {
        Variant::Labyrinth => find_path(grid.columns(), grid.rows(), start, target, walkable),
        Variant::Arcade => {
            find_path_toward(grid.columns(), grid.rows(), start, target, walkable, |cell| {
                stage.portal_exit(cell)
            })?
            .path
        }
    };
    (path.len() >= 2).then_some(path)
}

/// Starts the next step of an input- or path-driven actor.
///
/// A blocked arcade path is replanned toward its goal.
fn steer_by_input(actor: &mut Actor, stage: &Stage, variant: Variant, pass_walls: bool) {
    if !actor.mover.is_idle() {
        return;
    }
    let walkable = |cell: CellCoord| stage.is_walkable(cell, pass_walls);
    if let Some(direction) = actor.mover.plan_step(walkable) {
        let _ = actor.mover.start(direction, walkable);
        return;
    }
    if variant == Variant::Arcade {
        if let Some(goal) = actor.mover.path_goal() {
            if let Some(path) = route(variant, stage, actor.mover.tile(), goal, pass_walls) {
                let _ = actor.mover.follow_path(path);
            }
        }
    }
}

/// Picks and starts the next step of an AI pursuer.
fn decide(
    pursuer: &mut Actor,
    stage: &Stage,
    variant: Variant,
    mode: PursuitMode,
    view: &PursuitView,
    rng: &mut MazeRng,
    out_events: &mut Vec<Event>,
) {
    if !pursuer.mover.is_idle() {
        return;
    }
    let tile = pursuer.mover.tile();
    let walkable = |cell: CellCoord| stage.is_walkable(cell, false);
    let target = select_target(pursuer.role, mode, tile, view);
    let force_random = pursuer
        .breaker
        .as_mut()
        .is_some_and(LoopBreaker::take_armed);

    if variant == Variant::Labyrinth && !force_random {
        let stale = !pursuer.mover.has_path()
            || should_refresh_path(pursuer.mover.remaining_path().len(), rng);
        if stale {
            let grid = &stage.maze.grid;
            let path = find_path(grid.columns(), grid.rows(), tile, target, walkable);
            let _ = pursuer.mover.follow_path(path);
        }
        if pursuer.mover.has_path() {
            if let Some(direction) = pursuer.mover.plan_step(walkable) {
                let _ = pursuer.mover.start(direction, walkable);
                return;
            }
        }
    }

    pursuer.mover.clear_path();
    let Some(decision) = choose_direction(
        tile,
        pursuer.mover.heading(),
        target,
        mode,
        force_random,
        walkable,
        rng,
    ) else {
        return;
    };
    if decision.forced_random {
        out_events.push(Event::ForcedRandomMove {
            entity: pursuer.id,
        });
    }
    let _ = pursuer.mover.start(decision.direction, walkable);
}

/// Advances an actor and resolves arrival, teleporting off portals outside the cooldown.
///
/// Returns the tile the actor rests on after arriving.
fn travel(
    actor: &mut Actor,
    stage: &Stage,
    distance: f32,
    clock: Duration,
    cooldown: Duration,
    out_events: &mut Vec<Event>,
) -> Option<CellCoord> {
    let arrived = actor.mover.advance(distance)?;
    let Some(exit) = stage.portal_exit(arrived) else {
        return Some(arrived);
    };
    let cooled = actor
        .last_teleport
        .map_or(true, |last| clock.saturating_sub(last) >= cooldown);
    if !cooled {
        return Some(arrived);
    }

    actor.mover.teleport(exit);
    actor.last_teleport = Some(clock);
    out_events.push(Event::EntityTeleported {
        entity: actor.id,
        from: arrived,
        to: exit,
    });
    Some(exit)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMatch {
            variant,
            columns,
            rows,
            seed,
        } => {
            world.variant = variant;
            world.base_seed = seed;
            world.generation = world.generation.with_dimensions(columns, rows);
            world.level = 1;
            world.score = 0;
            world.lives = world.rules.lives;
            world.next_extra_life = world.rules.extra_life_every;
            world.phase = MatchPhase::Setup;
            world.runner = None;
            world.pursuers.clear();
            world.clock = Duration::ZERO;
            let _ = world.load_level(out_events);
        }
        Command::StartMatch { slots } => {
            if world.phase != MatchPhase::Setup || world.stage.is_none() {
                warn!(phase = ?world.phase, "start request ignored");
                return;
            }
            world.spawn_actors(&slots);
            world.phase = MatchPhase::Playing;
            out_events.push(Event::MatchStarted {
                variant: world.variant,
            });
            info!(variant = ?world.variant, level = world.level, "match started");
        }
        Command::SubmitInput { entity, input } => {
            if world.phase == MatchPhase::Playing {
                world.submit_input(entity, input);
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            if world.phase == MatchPhase::Playing {
                world.tick(dt, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use maze_chase_core::{
        CellCoord, DoorSnapshot, EffectKind, EntitySnapshot, Grid, Maze, PursuitMode, Variant,
    };

    use super::{Item, MatchPhase, Portal, Rules, World};

    /// Game flavour configured for the match.
    #[must_use]
    pub fn variant(world: &World) -> Variant {
        world.variant
    }

    /// Progress of the current match.
    #[must_use]
    pub fn phase(world: &World) -> MatchPhase {
        world.phase
    }

    /// Rules the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// One-based index of the current level, or zero before configuration.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Simulated time elapsed since the match was configured.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Maze of the current level.
    #[must_use]
    pub fn maze(world: &World) -> Option<&Maze> {
        world.stage.as_ref().map(|stage| &stage.maze)
    }

    /// Wall and floor layout of the current level.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        maze(world).map(|maze| &maze.grid)
    }

    /// Warp portals of the current level.
    #[must_use]
    pub fn portals(world: &World) -> &[Portal] {
        world
            .stage
            .as_ref()
            .map(|stage| stage.portals.as_slice())
            .unwrap_or_default()
    }

    /// Door overlays and their current state.
    #[must_use]
    pub fn doors(world: &World) -> Vec<DoorSnapshot> {
        world
            .stage
            .as_ref()
            .map(|stage| stage.door_snapshots())
            .unwrap_or_default()
    }

    /// Reports whether a regular actor may currently enter `cell`.
    #[must_use]
    pub fn is_walkable(world: &World, cell: CellCoord) -> bool {
        world
            .stage
            .as_ref()
            .is_some_and(|stage| stage.is_walkable(cell, false))
    }

    /// Snapshots of the runner followed by the pursuers in identifier order.
    #[must_use]
    pub fn entities(world: &World) -> Vec<EntitySnapshot> {
        world
            .runner
            .iter()
            .chain(world.pursuers.iter())
            .map(super::Actor::snapshot)
            .collect()
    }

    /// Snapshot of the runner, once the match has started.
    #[must_use]
    pub fn runner(world: &World) -> Option<EntitySnapshot> {
        world.runner.as_ref().map(super::Actor::snapshot)
    }

    /// Tiles of the runner's thread, oldest first.
    #[must_use]
    pub fn thread(world: &World) -> &[CellCoord] {
        &world.thread
    }

    /// Cells still holding a regular pellet.
    #[must_use]
    pub fn pellets(world: &World) -> Vec<CellCoord> {
        items(world)
            .filter(|(_, item)| matches!(item, Item::Pellet))
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Cells still holding a power item, with the effect each grants.
    #[must_use]
    pub fn power_items(world: &World) -> Vec<(CellCoord, EffectKind)> {
        items(world)
            .filter_map(|(cell, item)| match item {
                Item::Power(effect) => Some((cell, effect)),
                Item::Pellet => None,
            })
            .collect()
    }

    /// Number of collectibles left on the level.
    #[must_use]
    pub fn remaining_items(world: &World) -> usize {
        world.stage.as_ref().map_or(0, |stage| stage.items.len())
    }

    /// Active effects with the clock reading at which each expires.
    #[must_use]
    pub fn active_effects(world: &World) -> Vec<(EffectKind, Duration)> {
        world.effects.iter().collect()
    }

    /// Mode every AI pursuer currently follows.
    #[must_use]
    pub fn pursuit_mode(world: &World) -> PursuitMode {
        world.effects.mode()
    }

    fn items(world: &World) -> impl Iterator<Item = (CellCoord, Item)> + '_ {
        world
            .stage
            .iter()
            .flat_map(|stage| stage.items.iter().map(|(cell, item)| (*cell, *item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::{Direction, GhostHouse, Grid};

    const STEP: Duration = Duration::from_millis(50);
    const RUNNER: EntityId = EntityId::new(0);

    fn default_slots() -> Vec<SlotAssignment> {
        let mut slots = vec![SlotAssignment::new("theseus", Role::Theseus, false, true)];
        slots.extend(
            Role::PURSUERS
                .iter()
                .map(|role| SlotAssignment::new(role.label(), *role, true, false)),
        );
        slots
    }

    fn corridor_maze() -> Maze {
        Maze {
            grid: Grid::from_ascii(
                "############
                 #..........#
                 #.########.#
                 ............
                 #.########.#
                 #..........#
                 ############",
            ),
            ghost_house: GhostHouse::new(3, 1, 8, 5),
            warp_rows: vec![3],
        }
    }

    /// Starts a match on a hand-drawn maze with no pursuers.
    fn solo_world(variant: Variant, maze: Maze) -> World {
        let mut world = World::new();
        world.variant = variant;
        world.level = 1;
        world.install_level(maze, MazeRng::new(17));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartMatch {
                slots: default_slots(),
            },
            &mut events,
        );
        world.pursuers.clear();
        world
    }

    fn place_runner(world: &mut World, tile: CellCoord) {
        let runner = world.runner.as_mut().expect("runner");
        runner.spawn = tile;
        runner.respawn();
        world.thread = vec![tile];
    }

    fn tick(world: &mut World, events: &mut Vec<Event>) {
        apply(world, Command::Tick { dt: STEP }, events);
    }

    fn steer(world: &mut World, direction: Direction) {
        let mut events = Vec::new();
        apply(
            world,
            Command::SubmitInput {
                entity: RUNNER,
                input: InputState::toward(direction),
            },
            &mut events,
        );
    }

    fn runner_tile(world: &World) -> CellCoord {
        query::runner(world).expect("runner").tile
    }

    fn tick_until<F>(world: &mut World, events: &mut Vec<Event>, mut done: F) -> bool
    where
        F: FnMut(&World) -> bool,
    {
        for _ in 0..400 {
            tick(world, events);
            if done(world) {
                return true;
            }
        }
        false
    }

    fn teleports(events: &[Event]) -> Vec<(CellCoord, CellCoord)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::EntityTeleported { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn configure_match_generates_first_level() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant: Variant::Arcade,
                columns: 28,
                rows: 31,
                seed: 42,
            },
            &mut events,
        );

        let Some(Event::MazeGenerated {
            level,
            seed,
            attempts,
            ..
        }) = events.first()
        else {
            panic!("expected maze generation event, got {events:?}");
        };
        assert_eq!(*level, 1);
        assert_eq!(*seed, 42 + 1_000 + attempts - 1);
        assert_eq!(query::phase(&world), MatchPhase::Setup);
        assert!(query::grid(&world).is_some());
        assert!(query::remaining_items(&world) > 0);
        assert_eq!(query::doors(&world).len(), 6);
        assert!(query::entities(&world).is_empty());
    }

    #[test]
    fn rejected_dimensions_leave_world_unconfigured() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant: Variant::Arcade,
                columns: 4,
                rows: 4,
                seed: 1,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert!(query::maze(&world).is_none());

        apply(
            &mut world,
            Command::StartMatch {
                slots: default_slots(),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::phase(&world), MatchPhase::Setup);
    }

    #[test]
    fn start_match_places_runner_and_four_pursuers() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant: Variant::Labyrinth,
                columns: 28,
                rows: 31,
                seed: 7,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StartMatch {
                slots: default_slots(),
            },
            &mut events,
        );

        assert!(events.contains(&Event::MatchStarted {
            variant: Variant::Labyrinth
        }));
        let entities = query::entities(&world);
        assert_eq!(entities.len(), 5);
        assert_eq!(entities[0].role, Role::Theseus);
        assert!(!entities[0].is_ai);
        assert!(entities[1..].iter().all(|entity| entity.is_ai));
        let house = query::maze(&world).expect("maze").ghost_house;
        assert!(entities[1..]
            .iter()
            .all(|entity| house.contains_interior(entity.tile)));
        assert_eq!(query::thread(&world), &[entities[0].tile]);
    }

    #[test]
    fn portal_teleports_once_within_cooldown() {
        let mut world = solo_world(Variant::Labyrinth, corridor_maze());
        place_runner(&mut world, CellCoord::new(2, 3));
        let left = CellCoord::new(0, 3);
        let right = CellCoord::new(11, 3);
        let mut events = Vec::new();

        steer(&mut world, Direction::West);
        assert!(tick_until(&mut world, &mut events, |world| runner_tile(world) == right));
        assert_eq!(teleports(&events), vec![(left, right)]);
        let teleported_at = query::clock(&world);

        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(10, 3)
        }));
        assert!(tick_until(&mut world, &mut events, |world| runner_tile(world) == right));
        assert!(query::clock(&world) - teleported_at < world.rules.portal_cooldown());
        for _ in 0..4 {
            tick(&mut world, &mut events);
        }
        assert_eq!(runner_tile(&world), right);
        assert_eq!(teleports(&events).len(), 1);

        for _ in 0..10 {
            tick(&mut world, &mut events);
        }
        steer(&mut world, Direction::West);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(10, 3)
        }));
        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| runner_tile(world) == left));
        assert_eq!(teleports(&events), vec![(left, right), (right, left)]);
    }

    #[test]
    fn labyrinth_thread_grows_and_is_cut_by_pursuers() {
        let mut world = solo_world(Variant::Labyrinth, corridor_maze());
        place_runner(&mut world, CellCoord::new(1, 1));
        let mut events = Vec::new();

        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(5, 1)
        }));
        assert_eq!(
            query::thread(&world),
            &[
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(3, 1),
                CellCoord::new(4, 1),
                CellCoord::new(5, 1),
            ]
        );

        let mut pursuer = Actor {
            id: EntityId::new(1),
            role: Role::Hunter,
            is_ai: false,
            spawn: CellCoord::new(2, 2),
            mover: Mover::new(CellCoord::new(1, 2)),
            last_teleport: None,
            breaker: None,
        };
        assert!(pursuer.mover.start(Direction::North, |_| true));
        world.pursuers.push(pursuer);
        world.runner.as_mut().expect("runner").mover.reset(CellCoord::new(5, 1));

        events.clear();
        assert!(tick_until(&mut world, &mut events, |world| {
            world.pursuers[0].mover.tile() == CellCoord::new(1, 1)
        }));
        assert!(events.contains(&Event::ThreadCut {
            entity: EntityId::new(1),
            remaining: 4
        }));
        assert_eq!(query::thread(&world)[0], CellCoord::new(2, 1));
    }

    #[test]
    fn labyrinth_capture_loses_the_match() {
        let mut world = solo_world(Variant::Labyrinth, corridor_maze());
        place_runner(&mut world, CellCoord::new(1, 1));
        world.pursuers.push(Actor {
            id: EntityId::new(1),
            role: Role::Hunter,
            is_ai: true,
            spawn: CellCoord::new(5, 1),
            mover: Mover::new(CellCoord::new(5, 1)),
            last_teleport: None,
            breaker: Some(LoopBreaker::new(&mut MazeRng::new(1))),
        });

        let mut events = Vec::new();
        assert!(tick_until(&mut world, &mut events, |world| {
            query::phase(world) == MatchPhase::Lost
        }));
        assert!(events.contains(&Event::Collision {
            pursuer: EntityId::new(1),
            outcome: CollisionOutcome::LifeLost
        }));
        assert_eq!(events.last(), Some(&Event::MatchLost));
    }

    fn arcade_world() -> World {
        let mut world = solo_world(Variant::Arcade, corridor_maze());
        place_runner(&mut world, CellCoord::new(1, 1));
        let stage = world.stage.as_mut().expect("stage");
        stage.doors.clear();
        stage.items.clear();
        world
    }

    fn add_pursuer(world: &mut World, tile: CellCoord, spawn: CellCoord) {
        world.pursuers.push(Actor {
            id: EntityId::new(1),
            role: Role::Hunter,
            is_ai: false,
            spawn,
            mover: Mover::new(tile),
            last_teleport: None,
            breaker: None,
        });
    }

    #[test]
    fn pellets_score_and_clearing_the_last_level_wins() {
        let mut world = arcade_world();
        world.level = world.rules.levels;
        let stage = world.stage.as_mut().expect("stage");
        let _ = stage.items.insert(CellCoord::new(2, 1), Item::Pellet);
        let _ = stage
            .items
            .insert(CellCoord::new(3, 1), Item::Power(EffectKind::Speed));

        let mut events = Vec::new();
        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| {
            query::phase(world) == MatchPhase::Won
        }));

        assert_eq!(query::score(&world), 60);
        let tail: Vec<&Event> = events
            .iter()
            .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
            .collect();
        assert_eq!(
            tail,
            vec![
                &Event::PelletCollected {
                    cell: CellCoord::new(2, 1)
                },
                &Event::PowerCollected {
                    cell: CellCoord::new(3, 1),
                    effect: EffectKind::Speed
                },
                &Event::LevelCleared { level: 3 },
                &Event::MatchWon,
            ]
        );
    }

    #[test]
    fn clearing_an_early_level_generates_the_next() {
        let mut world = arcade_world();
        world.generation = world.generation.with_dimensions(21, 17);
        world.base_seed = 900;
        let _ = world
            .stage
            .as_mut()
            .expect("stage")
            .items
            .insert(CellCoord::new(2, 1), Item::Pellet);

        let mut events = Vec::new();
        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| query::level(world) == 2));

        assert!(events.contains(&Event::LevelCleared { level: 1 }));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::MazeGenerated { level: 2, .. }
        )));
        assert_eq!(query::grid(&world).expect("grid").columns(), 21);
        assert_eq!(query::phase(&world), MatchPhase::Playing);
        let runner = query::runner(&world).expect("runner");
        assert_eq!(runner.tile, world.stage.as_ref().expect("stage").runner_spawn);
        assert!(query::remaining_items(&world) > 0);
    }

    #[test]
    fn collision_without_power_costs_a_life_and_resets_positions() {
        let mut world = arcade_world();
        add_pursuer(&mut world, CellCoord::new(1, 1), CellCoord::new(10, 5));

        let mut events = Vec::new();
        tick(&mut world, &mut events);

        assert!(events.contains(&Event::Collision {
            pursuer: EntityId::new(1),
            outcome: CollisionOutcome::LifeLost
        }));
        assert_eq!(query::lives(&world), 2);
        assert_eq!(world.pursuers[0].mover.tile(), CellCoord::new(10, 5));
        assert_eq!(query::phase(&world), MatchPhase::Playing);
    }

    #[test]
    fn losing_the_last_life_ends_the_match() {
        let mut world = arcade_world();
        world.lives = 1;
        add_pursuer(&mut world, CellCoord::new(1, 1), CellCoord::new(10, 5));

        let mut events = Vec::new();
        tick(&mut world, &mut events);
        assert_eq!(query::phase(&world), MatchPhase::Lost);
        assert_eq!(events.last(), Some(&Event::MatchLost));

        events.clear();
        tick(&mut world, &mut events);
        assert_eq!(events, vec![Event::TimeAdvanced { dt: STEP }]);
    }

    #[test]
    fn frightened_collision_captures_the_pursuer() {
        let mut world = arcade_world();
        world
            .effects
            .activate(EffectKind::Fright, Duration::ZERO, Duration::from_secs(10));
        add_pursuer(&mut world, CellCoord::new(1, 1), CellCoord::new(10, 5));

        let mut events = Vec::new();
        tick(&mut world, &mut events);

        assert!(events.contains(&Event::Collision {
            pursuer: EntityId::new(1),
            outcome: CollisionOutcome::Capture
        }));
        assert_eq!(query::score(&world), 200);
        assert_eq!(query::lives(&world), 3);
        assert_eq!(world.pursuers[0].mover.tile(), CellCoord::new(10, 5));
    }

    #[test]
    fn crossing_the_score_threshold_awards_a_life() {
        let mut world = arcade_world();
        world.score = 9_995;
        world.award(10);
        assert_eq!(query::lives(&world), 4);
        world.award(10);
        assert_eq!(query::lives(&world), 4);
    }

    #[test]
    fn effects_expire_after_their_duration() {
        let mut world = arcade_world();
        world
            .effects
            .activate(EffectKind::Slow, world.clock, world.rules.effect_duration());
        assert_eq!(query::active_effects(&world).len(), 1);

        let mut events = Vec::new();
        assert!(tick_until(&mut world, &mut events, |world| {
            query::active_effects(world).is_empty()
        }));
        assert!(events.contains(&Event::EffectExpired {
            effect: EffectKind::Slow
        }));
        assert!(query::clock(&world) >= Duration::from_secs(10));
    }

    #[test]
    fn super_runner_walks_through_walls() {
        let mut world = arcade_world();
        world
            .effects
            .activate(EffectKind::Super, Duration::ZERO, Duration::from_secs(10));

        let mut events = Vec::new();
        steer(&mut world, Direction::South);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(1, 2)
        }));
        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(2, 2)
        }));
        assert!(!query::is_walkable(&world, CellCoord::new(2, 2)));
    }

    fn walled_block_maze() -> Maze {
        Maze {
            grid: Grid::from_ascii(
                "#######
                 #.....#
                 #.###.#
                 #.###.#
                 #.###.#
                 #.....#
                 #######",
            ),
            ghost_house: GhostHouse::new(2, 2, 4, 4),
            warp_rows: Vec::new(),
        }
    }

    #[test]
    fn runner_left_inside_a_wall_can_walk_back_out() {
        let mut world = solo_world(Variant::Arcade, walled_block_maze());
        world.level = world.rules.levels;
        let stage = world.stage.as_mut().expect("stage");
        stage.doors.clear();
        stage.items.clear();
        let _ = stage.items.insert(CellCoord::new(5, 5), Item::Pellet);
        place_runner(&mut world, CellCoord::new(3, 3));
        assert!(!query::is_walkable(&world, CellCoord::new(3, 3)));
        assert!(query::active_effects(&world).is_empty());

        let mut events = Vec::new();
        steer(&mut world, Direction::West);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(1, 3)
        }));

        for _ in 0..40 {
            tick(&mut world, &mut events);
        }
        assert_eq!(runner_tile(&world), CellCoord::new(1, 3));

        steer(&mut world, Direction::South);
        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(1, 5)
        }));
        steer(&mut world, Direction::East);
        assert!(tick_until(&mut world, &mut events, |world| {
            query::phase(world) == MatchPhase::Won
        }));
        assert!(events.contains(&Event::PelletCollected {
            cell: CellCoord::new(5, 5)
        }));
    }

    #[test]
    fn arcade_tap_routes_through_portals() {
        let mut world = arcade_world();
        place_runner(&mut world, CellCoord::new(1, 3));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SubmitInput {
                entity: RUNNER,
                input: InputState::tap(CellCoord::new(10, 3)),
            },
            &mut events,
        );
        let path = world.runner.as_ref().expect("runner").mover.remaining_path().to_vec();
        assert_eq!(
            path,
            vec![
                CellCoord::new(0, 3),
                CellCoord::new(11, 3),
                CellCoord::new(10, 3)
            ]
        );

        assert!(tick_until(&mut world, &mut events, |world| {
            runner_tile(world) == CellCoord::new(10, 3)
        }));
        assert_eq!(
            teleports(&events),
            vec![(CellCoord::new(0, 3), CellCoord::new(11, 3))]
        );
    }

    #[test]
    fn input_for_ai_pursuers_is_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant: Variant::Arcade,
                columns: 28,
                rows: 31,
                seed: 3,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StartMatch {
                slots: default_slots(),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SubmitInput {
                entity: EntityId::new(1),
                input: InputState::toward(Direction::North),
            },
            &mut events,
        );
        assert_eq!(world.pursuers[0].mover.desired(), None);
    }
}
