#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for maze chase matches.
//!
//! Generates and prints the first level for a seed, can emit or load a share
//! string for it, and simulates a match with an autopilot runner for a fixed
//! number of ticks.

mod autopilot;
mod config;
mod maze_transfer;

use std::{
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use maze_chase_core::{CollisionOutcome, Command, Event, Variant};
use maze_chase_system_lobby::Lobby;
use maze_chase_world::{apply, query, MatchPhase, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autopilot::Autopilot;
use config::Settings;
use maze_transfer::MazeSnapshot;

/// Simulated time per tick.
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(
    name = "maze-chase",
    version,
    about = "Generate mazes and simulate maze chase matches"
)]
struct Cli {
    /// Base seed for the match; defaults to the current time.
    #[arg(long)]
    seed: Option<u32>,
    /// Grid columns; overrides the settings file.
    #[arg(long)]
    columns: Option<u32>,
    /// Grid rows; overrides the settings file.
    #[arg(long)]
    rows: Option<u32>,
    /// TOML settings file with `[generation]` and `[rules]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Game flavour to simulate.
    #[arg(long, value_enum, default_value_t = VariantArg::Arcade)]
    variant: VariantArg,
    /// Ticks to simulate after generation; zero only prints the maze.
    #[arg(long, default_value_t = 0)]
    ticks: u64,
    /// Print a share string for the generated maze.
    #[arg(long)]
    share: bool,
    /// Decode and print a share string instead of generating a maze.
    #[arg(long, value_name = "SHARE", conflicts_with_all = ["seed", "ticks", "share"])]
    load: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    Arcade,
    Labyrinth,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Arcade => Variant::Arcade,
            VariantArg::Labyrinth => Variant::Labyrinth,
        }
    }
}

/// Entry point for the maze chase command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(share) = cli.load.as_deref() {
        let snapshot = MazeSnapshot::decode(share).context("failed to load share string")?;
        println!(
            "level {} seed {} ({}x{})",
            snapshot.level,
            snapshot.seed,
            snapshot.maze.grid.columns(),
            snapshot.maze.grid.rows()
        );
        println!("{}", snapshot.maze.grid.to_ascii());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let columns = cli.columns.unwrap_or(settings.generation.columns);
    let rows = cli.rows.unwrap_or(settings.generation.rows);
    let seed = cli.seed.unwrap_or_else(clock_seed);
    let variant = Variant::from(cli.variant);

    let mut world = World::with_config(settings.generation, settings.rules);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureMatch {
            variant,
            columns,
            rows,
            seed,
        },
        &mut events,
    );
    let Some(maze) = query::maze(&world) else {
        bail!("no maze can be generated on a {columns}x{rows} grid");
    };
    let Some((level_seed, attempts, validated)) = events.iter().find_map(|event| match event {
        Event::MazeGenerated {
            seed,
            attempts,
            validated,
            ..
        } => Some((*seed, *attempts, *validated)),
        _ => None,
    }) else {
        bail!("world reported no generated maze");
    };

    println!(
        "seed {seed}: level 1 from seed {level_seed} after {attempts} attempt(s){}",
        if validated { "" } else { " (unvalidated)" }
    );
    println!("{}", maze.grid.to_ascii());

    if cli.share {
        let snapshot = MazeSnapshot {
            seed: level_seed,
            level: query::level(&world),
            maze: maze.clone(),
        };
        println!("{}", snapshot.encode().context("failed to encode share string")?);
    }

    if cli.ticks > 0 {
        let tally = simulate(&mut world, seed, cli.ticks);
        println!(
            "{:?} after {} ticks ({:.1}s): level {}, score {}, lives {}",
            query::phase(&world),
            query::tick_index(&world),
            query::clock(&world).as_secs_f32(),
            query::level(&world),
            query::score(&world),
            query::lives(&world)
        );
        println!(
            "pellets {}, power items {}, captures {}, lives lost {}, teleports {}, thread cuts {}",
            tally.pellets,
            tally.power_items,
            tally.captures,
            tally.lives_lost,
            tally.teleports,
            tally.thread_cuts
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn clock_seed() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    // Low 32 bits of the millisecond clock.
    now.as_millis() as u32
}

/// Event counts gathered while simulating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    pellets: u32,
    power_items: u32,
    captures: u32,
    lives_lost: u32,
    teleports: u32,
    thread_cuts: u32,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PelletCollected { .. } => self.pellets += 1,
                Event::PowerCollected { .. } => self.power_items += 1,
                Event::Collision {
                    outcome: CollisionOutcome::Capture,
                    ..
                } => self.captures += 1,
                Event::Collision {
                    outcome: CollisionOutcome::LifeLost,
                    ..
                } => self.lives_lost += 1,
                Event::EntityTeleported { .. } => self.teleports += 1,
                Event::ThreadCut { .. } => self.thread_cuts += 1,
                Event::LevelCleared { level } => info!(level, "autopilot cleared a level"),
                _ => {}
            }
        }
    }
}

/// Starts the match through the lobby and runs it with the autopilot runner.
fn simulate(world: &mut World, seed: u32, ticks: u64) -> Tally {
    let mut lobby = Lobby::default();
    let mut commands = Vec::new();
    lobby.force_start(&mut commands);

    let mut events = Vec::new();
    let mut tally = Tally::default();
    let mut autopilot = Autopilot::new(u64::from(seed));
    for _ in 0..ticks {
        autopilot.steer(world, &mut commands);
        commands.push(Command::Tick { dt: FRAME });
        for command in commands.drain(..) {
            apply(world, command, &mut events);
        }
        tally.record(&events);
        events.clear();
        if matches!(query::phase(world), MatchPhase::Won | MatchPhase::Lost) {
            break;
        }
    }
    if query::phase(world) == MatchPhase::Setup {
        warn!("match never started");
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(variant: Variant, seed: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMatch {
                variant,
                columns: 28,
                rows: 31,
                seed,
            },
            &mut events,
        );
        world
    }

    #[test]
    fn cli_accepts_documented_flags() {
        let cli = Cli::try_parse_from([
            "maze-chase",
            "--seed",
            "9",
            "--columns",
            "21",
            "--rows",
            "17",
            "--variant",
            "labyrinth",
            "--ticks",
            "600",
            "--share",
        ])
        .expect("flags parse");
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.variant, VariantArg::Labyrinth);
        assert_eq!(cli.ticks, 600);
        assert!(cli.share);
        assert!(Cli::try_parse_from(["maze-chase", "--load", "maze:v1", "--share"]).is_err());
    }

    #[test]
    fn autopilot_collects_pellets_in_the_arcade() {
        let mut world = configured(Variant::Arcade, 42);
        let before = query::remaining_items(&world);
        let tally = simulate(&mut world, 42, 1_200);
        assert_ne!(query::phase(&world), MatchPhase::Setup);
        assert!(tally.pellets + tally.power_items > 0);
        assert!(query::remaining_items(&world) < before || query::level(&world) > 1);
    }

    #[test]
    fn simulation_is_reproducible() {
        let mut first = configured(Variant::Labyrinth, 5);
        let mut second = configured(Variant::Labyrinth, 5);
        assert_eq!(simulate(&mut first, 5, 900), simulate(&mut second, 5, 900));
        assert_eq!(query::entities(&first), query::entities(&second));
        assert_eq!(query::thread(&first), query::thread(&second));
    }
}
