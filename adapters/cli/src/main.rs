#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Urban Brush grid.

mod config;
mod snapshot_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use urban_brush_core::{Command, Event, GridConfig, GridSnapshot, Percent};
use urban_brush_system_brush::{Brush, BrushInput, BrushKind};
use urban_brush_world::{self as world, query, Grid};

#[derive(Parser)]
#[command(name = "urban-brush")]
#[command(about = "Paint populations and road networks onto a lot grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with [grid] and [brush] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a grid and write its snapshot.
    New {
        /// Randomize populations and roads
        #[arg(long)]
        random: bool,
        /// Seed overriding the configured one
        #[arg(long)]
        seed: Option<u64>,
        /// Snapshot file to write (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Apply one brush stroke to a snapshot.
    Brush {
        /// Snapshot file to edit in place (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Brush to stroke with
        #[arg(short, long, value_enum)]
        kind: KindArg,
        /// Position of the stroke, as X,Y
        #[arg(long, value_parser = parse_point)]
        at: Vec2,
        /// Pickup position of a drag, as X,Y
        #[arg(long, value_parser = parse_point)]
        from: Option<Vec2>,
        /// Positions whose roads are marked before a break or connect, as X,Y
        #[arg(long, value_parser = parse_point)]
        mark: Vec<Vec2>,
        /// Inner radius in lots
        #[arg(long)]
        inner: Option<f32>,
        /// Outer radius in lots
        #[arg(long)]
        outer: Option<f32>,
        /// Transfer share in percent
        #[arg(long)]
        amount: Option<u8>,
    },

    /// Print totals and the population of the lot nearest to a point.
    Inspect {
        /// Snapshot file to read (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Position to inspect, as X,Y
        #[arg(long, value_parser = parse_point)]
        at: Option<Vec2>,
    },

    /// Print a snapshot as a single-line transfer string.
    Export {
        /// Snapshot file to read (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
    },

    /// Convert a transfer string back into a snapshot file.
    Import {
        /// File holding the transfer string
        #[arg(short, long)]
        input: PathBuf,
        /// Snapshot file to write (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Repulse,
    Attract,
    Drag,
    Break,
    Connect,
}

impl From<KindArg> for BrushKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Repulse => BrushKind::Repulse,
            KindArg::Attract => BrushKind::Attract,
            KindArg::Drag => BrushKind::Drag,
            KindArg::Break => BrushKind::Break,
            KindArg::Connect => BrushKind::Connect,
        }
    }
}

fn parse_point(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("invalid x coordinate '{x}': {error}"))?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("invalid y coordinate '{y}': {error}"))?;
    Ok(Vec2::new(x, y))
}

/// Entry point for the Urban Brush command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::New {
            random,
            seed,
            output,
        } => {
            let mut grid = Grid::new(GridConfig {
                seed: seed.unwrap_or(config.grid.seed),
                ..config.grid
            });
            if random {
                let mut events = Vec::new();
                world::apply(&mut grid, Command::Randomize, &mut events);
                log_events(&events);
            }
            write_snapshot(&output, &query::dump(&grid))?;
            info!(shape = %query::shape(&grid), path = %output.display(), "grid written");
        }

        Commands::Brush {
            snapshot,
            kind,
            at,
            from,
            mark,
            inner,
            outer,
            amount,
        } => {
            let kind = BrushKind::from(kind);
            if kind == BrushKind::Drag && from.is_none() {
                bail!("the drag brush needs a pickup position (--from X,Y)");
            }
            if !kind.edits_roads() && !mark.is_empty() {
                bail!("--mark only applies to the break and connect brushes");
            }
            if kind != BrushKind::Drag && from.is_some() {
                bail!("--from only applies to the drag brush");
            }

            let mut grid = load_grid(&snapshot, &config.grid)?;
            let mut brush = Brush::new(kind, config.brush, query::config(&grid).lot_size);
            let mut settings = brush.settings();
            if let Some(inner) = inner {
                settings.inner_radius = inner;
            }
            if let Some(outer) = outer {
                settings.outer_radius = outer;
            }
            if let Some(amount) = amount {
                settings.amount = Percent::new(amount);
            }
            brush.configure(settings);

            let mut events = Vec::new();
            for anchor in from.into_iter().chain(mark) {
                events = step(
                    &mut grid,
                    &mut brush,
                    &events,
                    BrushInput {
                        secondary_click: Some(anchor),
                        ..BrushInput::default()
                    },
                );
            }
            let _ = brush.take_inspect();
            let _ = step(
                &mut grid,
                &mut brush,
                &events,
                BrushInput {
                    primary_click: Some(at),
                    ..BrushInput::default()
                },
            );

            write_snapshot(&snapshot, &query::dump(&grid))?;
            println!(
                "total population {}, open roads {}",
                query::total_population(&grid),
                query::open_road_count(&grid)
            );
        }

        Commands::Inspect { snapshot, at } => {
            let grid = load_grid(&snapshot, &config.grid)?;
            println!(
                "{} grid, total population {}, open roads {}",
                query::shape(&grid),
                query::total_population(&grid),
                query::open_road_count(&grid)
            );
            if let Some(anchor) = at {
                let lot = query::nearest_lot(&grid, anchor).context("the grid has no lots")?;
                println!(
                    "population of lot {} is {}, building height {}",
                    lot.coord(),
                    lot.population(),
                    lot.building_height()
                );
            }
        }

        Commands::Export { snapshot } => {
            let snapshot = read_snapshot(&snapshot)?;
            println!("{}", snapshot_transfer::encode(&snapshot)?);
        }

        Commands::Import { input, output } => {
            let contents = fs::read_to_string(&input)
                .with_context(|| format!("failed to read transfer string at {}", input.display()))?;
            let snapshot = snapshot_transfer::decode(&contents)
                .with_context(|| format!("invalid transfer string in {}", input.display()))?;
            write_snapshot(&output, &snapshot)?;
            info!(shape = %snapshot.shape(), path = %output.display(), "snapshot imported");
        }
    }

    Ok(())
}

/// Runs one frame of brush input and returns the events it produced.
fn step(grid: &mut Grid, brush: &mut Brush, events: &[Event], input: BrushInput) -> Vec<Event> {
    let mut commands = Vec::new();
    brush.handle(events, input, &mut commands);

    let mut generated = Vec::new();
    for command in commands {
        world::apply(grid, command, &mut generated);
    }
    log_events(&generated);
    generated
}

fn log_events(events: &[Event]) {
    for event in events {
        debug!(?event, "grid event");
    }
}

/// Rebuilds a grid around a snapshot, taking the shape from the snapshot itself.
fn load_grid(path: &Path, config: &GridConfig) -> Result<Grid> {
    let snapshot = read_snapshot(path)?;
    let shape = snapshot.shape();
    let mut grid = Grid::new(GridConfig {
        rows: shape.rows(),
        columns: shape.columns(),
        ..config.clone()
    });
    grid.load(&snapshot)
        .with_context(|| format!("snapshot at {} is malformed", path.display()))?;
    Ok(grid)
}

fn read_snapshot(path: &Path) -> Result<GridSnapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot at {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse snapshot at {}", path.display()))
}

fn write_snapshot(path: &Path, snapshot: &GridSnapshot) -> Result<()> {
    let json = serde_json::to_string(snapshot).context("failed to serialize snapshot")?;
    fs::write(path, json).with_context(|| format!("failed to write snapshot to {}", path.display()))
}
