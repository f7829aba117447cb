#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for inspecting and editing Isle maps.

mod session;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glam::{IVec2, Vec2};
use isle_core::{int_to_rotation, BuildingId, Event, Rotation, WorldPosition, Zoom};
use isle_rendering::{Camera, RenderOptions, RenderSelection};
use isle_world::{
    file::{IslandFile, MapFile},
    query, Catalog, LayerKind, WorldConfig,
};
use session::Session;
use tracing::{debug, info};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Inspect and edit Isle maps without opening a window.
#[derive(Debug, Parser)]
#[command(name = "isle", version)]
struct Cli {
    /// Building and texture catalog in TOML.
    #[arg(long, default_value = "catalog.toml")]
    catalog: PathBuf,
    /// World configuration in TOML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log directive used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Creates a map from island templates.
    New {
        /// Target `.map` file.
        output: PathBuf,
        /// Number of world columns.
        #[arg(long)]
        width: i32,
        /// Number of world rows.
        #[arg(long)]
        height: i32,
        /// Island template placed at a world cell, as `FILE@X,Y`.
        #[arg(long = "island", value_parser = parse_island)]
        islands: Vec<IslandPlacement>,
    },
    /// Prints an overview of a map.
    Inspect {
        /// Map to read.
        map: PathBuf,
    },
    /// Places a building and saves the result.
    Place {
        /// Map to edit.
        map: PathBuf,
        /// Building id from the catalog.
        building: u32,
        /// Column of the top-left footprint cell.
        x: i32,
        /// Row of the top-left footprint cell.
        y: i32,
        /// Quarter turns of the building, `0..=3`.
        #[arg(long, default_value_t = 0)]
        rotation: i32,
        /// Where to write the edited map; defaults to the input.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Removes the building covering a cell and saves the result.
    Remove {
        /// Map to edit.
        map: PathBuf,
        /// Any column covered by the building.
        x: i32,
        /// Any row covered by the building.
        y: i32,
        /// Where to write the edited map; defaults to the input.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Reports the building covering a cell and the cells it selects.
    Select {
        /// Map to read.
        map: PathBuf,
        /// World column.
        x: i32,
        /// World row.
        y: i32,
    },
    /// Translates a window pixel into a world cell.
    Pick {
        /// Map to read.
        map: PathBuf,
        /// Pixel column.
        #[arg(allow_negative_numbers = true)]
        mouse_x: i32,
        /// Pixel row.
        #[arg(allow_negative_numbers = true)]
        mouse_y: i32,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Uploads every layer and lists the draw calls of one frame.
    Frame {
        /// Map to read.
        map: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
        /// Window width in pixels.
        #[arg(long, default_value_t = 1280.0)]
        viewport_width: f32,
        /// Window height in pixels.
        #[arg(long, default_value_t = 720.0)]
        viewport_height: f32,
        /// Island layers to draw.
        #[arg(long, value_enum, default_value_t = LayerChoice::All)]
        layers: LayerChoice,
        /// Draws island grids.
        #[arg(long)]
        grids: bool,
        /// Draws the world grid.
        #[arg(long)]
        world_grid: bool,
        /// Skips the deep water.
        #[arg(long)]
        no_deep_water: bool,
    },
}

#[derive(Debug, clap::Args)]
struct ViewArgs {
    /// Camera column in pixels.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    camera_x: f32,
    /// Camera row in pixels.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    camera_y: f32,
    /// World rotation in quarter turns, `0..=3`.
    #[arg(long, default_value_t = 0)]
    rotation: i32,
    /// Zoom level.
    #[arg(long, value_enum, default_value_t = ZoomChoice::Gfx)]
    zoom: ZoomChoice,
}

impl ViewArgs {
    fn camera(&self) -> Vec2 {
        Vec2::new(self.camera_x, self.camera_y)
    }

    fn rotation(&self) -> Result<Rotation> {
        int_to_rotation(self.rotation).map_err(|error| anyhow!(error))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ZoomChoice {
    Sgfx,
    Mgfx,
    Gfx,
}

impl From<ZoomChoice> for Zoom {
    fn from(choice: ZoomChoice) -> Self {
        match choice {
            ZoomChoice::Sgfx => Zoom::Sgfx,
            ZoomChoice::Mgfx => Zoom::Mgfx,
            ZoomChoice::Gfx => Zoom::Gfx,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LayerChoice {
    Coast,
    Terrain,
    Buildings,
    Mixed,
    All,
    Nothing,
}

impl From<LayerChoice> for RenderSelection {
    fn from(choice: LayerChoice) -> Self {
        match choice {
            LayerChoice::Coast => RenderSelection::Coast,
            LayerChoice::Terrain => RenderSelection::Terrain,
            LayerChoice::Buildings => RenderSelection::Buildings,
            LayerChoice::Mixed => RenderSelection::Mixed,
            LayerChoice::All => RenderSelection::All,
            LayerChoice::Nothing => RenderSelection::Nothing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct IslandPlacement {
    path: PathBuf,
    position: IVec2,
}

fn parse_island(value: &str) -> Result<IslandPlacement, String> {
    let (path, position) = value
        .rsplit_once('@')
        .ok_or_else(|| format!("expected FILE@X,Y, got `{value}`"))?;
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after `@`, got `{position}`"))?;
    let parse = |text: &str| {
        text.trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid coordinate `{text}`: {error}"))
    };
    Ok(IslandPlacement {
        path: PathBuf::from(path),
        position: IVec2::new(parse(x)?, parse(y)?),
    })
}

fn init_tracing(directive: &str) -> Result<()> {
    let directive: Directive = directive
        .parse()
        .with_context(|| format!("invalid log directive `{directive}`"))?;
    let filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
}

fn load_config(path: Option<&Path>) -> Result<WorldConfig> {
    match path {
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(WorldConfig::default()),
    }
}

fn print_events(events: &[Event]) -> Result<()> {
    for event in events {
        println!(
            "{}",
            serde_json::to_string(event).context("failed to encode event")?
        );
    }
    Ok(())
}

fn log_view_events(events: &[Event]) {
    for event in events {
        debug!(?event, "view changed");
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("failed to read catalog {}", cli.catalog.display()))?;
    info!(buildings = catalog.building_count(), "loaded catalog");

    match cli.action {
        Action::New {
            output,
            width,
            height,
            islands,
        } => {
            let mut map = MapFile::new(config.map_version.clone(), width, height);
            for island in islands {
                let template = IslandFile::load(&island.path).with_context(|| {
                    format!("failed to read island template {}", island.path.display())
                })?;
                map.add_island(template, island.position.x, island.position.y);
            }
            let session = Session::from_map(catalog, &config, &map)?;
            session.save(&output)?;
            for line in session.describe() {
                println!("{line}");
            }
        }
        Action::Inspect { map } => {
            let session = Session::open(catalog, &config, &map)?;
            for line in session.describe() {
                println!("{line}");
            }
        }
        Action::Place {
            map,
            building,
            x,
            y,
            rotation,
            output,
        } => {
            let rotation = int_to_rotation(rotation).map_err(|error| anyhow!(error))?;
            let mut session = Session::open(catalog, &config, &map)?;
            let events =
                session.place(BuildingId::new(building), WorldPosition::new(x, y), rotation)?;
            print_events(&events)?;
            session.save(output.as_deref().unwrap_or(&map))?;
        }
        Action::Remove { map, x, y, output } => {
            let mut session = Session::open(catalog, &config, &map)?;
            let events = session.remove(WorldPosition::new(x, y))?;
            print_events(&events)?;
            session.save(output.as_deref().unwrap_or(&map))?;
        }
        Action::Select { map, x, y } => {
            let mut session = Session::open(catalog, &config, &map)?;
            let position = WorldPosition::new(x, y);
            let Some(building) = session.building_at(position) else {
                bail!("no building at ({x}, {y})");
            };
            println!("building {}", building.get());
            print_events(&session.select(position)?)?;
        }
        Action::Pick {
            map,
            mouse_x,
            mouse_y,
            view,
        } => {
            let mut session = Session::open(catalog, &config, &map)?;
            log_view_events(&session.set_view(view.rotation()?, view.zoom.into())?);
            let cell = session.pick(IVec2::new(mouse_x, mouse_y), view.camera());
            if !session.is_picked_in_world() {
                println!("outside ({}, {})", cell.x, cell.y);
                return Ok(());
            }
            let position = WorldPosition::from(cell);
            let terrain = query::tile(session.world(), LayerKind::Terrain, position)
                .and_then(|tile| tile.building())
                .map_or_else(|| "water".to_owned(), |id| id.get().to_string());
            println!("cell ({}, {}) terrain {terrain}", cell.x, cell.y);
        }
        Action::Frame {
            map,
            view,
            viewport_width,
            viewport_height,
            layers,
            grids,
            world_grid,
            no_deep_water,
        } => {
            let mut session = Session::open(catalog, &config, &map)?;
            log_view_events(&session.set_view(view.rotation()?, view.zoom.into())?);
            let camera = Camera::new(view.camera(), Vec2::new(viewport_width, viewport_height));
            let options = RenderOptions {
                selection: layers.into(),
                island_grids: grids,
                deep_water: !no_deep_water,
                world_grid,
            };
            let plan = session.plan(&camera, &options)?;
            println!("buffers {} bytes {}", plan.buffers, plan.bytes);
            for call in plan.calls {
                println!("{:?} instances {}", call.target, call.instances);
            }
        }
    }
    Ok(())
}

/// Entry point for the Isle command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log)?;
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn island_placements_parse_paths_with_at_signs() {
        assert_eq!(
            parse_island("maps/a@b.isl@12,-3"),
            Ok(IslandPlacement {
                path: PathBuf::from("maps/a@b.isl"),
                position: IVec2::new(12, -3),
            })
        );
        assert!(parse_island("island.isl").is_err());
        assert!(parse_island("island.isl@1").is_err());
        assert!(parse_island("island.isl@x,1").is_err());
    }

    #[test]
    fn arguments_parse_into_actions() {
        let cli = Cli::try_parse_from([
            "isle", "--catalog", "c.toml", "place", "a.map", "900", "3", "4", "--rotation", "2",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.action,
            Action::Place {
                building: 900,
                x: 3,
                y: 4,
                rotation: 2,
                output: None,
                ..
            }
        ));
    }

    #[test]
    fn the_command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
