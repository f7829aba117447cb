//! Headless editing session wiring the world to the pure systems.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use glam::{IVec2, Vec2};
use isle_core::{
    BuildingCatalog, BuildingId, ChangeRotation, ChangeZoom, Command, Context, Event,
    PlacementError, Rotation, WorldPosition, Zoom,
};
use isle_rendering::{plan_frame, Camera, DrawCall, MemoryBufferStore, RenderOptions, WorldBuffers};
use isle_system_builder::{Builder, BuilderInput};
use isle_system_mouse_picker::{MousePicker, PickerView};
use isle_world::{apply, file::MapFile, query, Catalog, LayerKind, World, WorldConfig};
use tracing::{debug, info};

/// Outcome of planning one frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FramePlan {
    pub(crate) calls: Vec<DrawCall>,
    pub(crate) buffers: usize,
    pub(crate) bytes: usize,
}

/// A loaded world plus the systems acting on it.
pub(crate) struct Session {
    catalog: Catalog,
    world: World,
    builder: Builder,
    picker: MousePicker,
}

impl Session {
    pub(crate) fn open(catalog: Catalog, config: &WorldConfig, map: &Path) -> Result<Self> {
        let world = World::load(map, &Context::from_catalog(&catalog), config)
            .with_context(|| format!("failed to load map {}", map.display()))?;
        Ok(Self::with_world(catalog, world))
    }

    pub(crate) fn from_map(catalog: Catalog, config: &WorldConfig, map: &MapFile) -> Result<Self> {
        let world = World::from_map(map, &Context::from_catalog(&catalog), config)
            .context("map content is invalid")?;
        Ok(Self::with_world(catalog, world))
    }

    fn with_world(catalog: Catalog, world: World) -> Self {
        let size = query::world_size(&world);
        info!(
            width = size.x,
            height = size.y,
            islands = query::islands(&world).len(),
            "loaded map"
        );
        Self {
            catalog,
            world,
            builder: Builder::new(),
            picker: MousePicker::with_synthetic_images(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Places a building through the builder, failing with the rejection reason.
    pub(crate) fn place(
        &mut self,
        building: BuildingId,
        origin: WorldPosition,
        rotation: Rotation,
    ) -> Result<Vec<Event>> {
        self.builder = Builder::new();
        let mut commands = Vec::new();
        let choose = BuilderInput {
            choose_building: Some(building),
            ..BuilderInput::default()
        };
        self.builder.handle(None, choose, |_| None, &mut commands);
        for _ in 0..rotation.index() {
            let turn = BuilderInput {
                rotate_building: Some(ChangeRotation::Right),
                ..BuilderInput::default()
            };
            self.builder.handle(None, turn, |_| None, &mut commands);
        }

        let preview = self.builder.preview(Some(origin), |building, origin, rotation| {
            self.buildability(building, origin, rotation).is_ok()
        });
        if let Some(preview) = preview.filter(|preview| !preview.placeable) {
            let reason = self
                .buildability(preview.building, preview.origin, preview.rotation)
                .err()
                .unwrap_or(PlacementError::NotBuildable);
            bail!(
                "cannot place building {} at ({}, {}): {reason:?}",
                building.get(),
                origin.x(),
                origin.y()
            );
        }

        let confirm = BuilderInput {
            confirm_action: true,
            cursor_cell: Some(origin),
            ..BuilderInput::default()
        };
        self.builder.handle(preview, confirm, |_| None, &mut commands);
        // one placement per call, later cursor actions select instead
        self.builder = Builder::new();
        self.run(commands)
    }

    pub(crate) fn remove(&mut self, position: WorldPosition) -> Result<Vec<Event>> {
        let commands = self.cursor_action(
            position,
            BuilderInput {
                remove_action: true,
                ..BuilderInput::default()
            },
        );
        if commands.is_empty() {
            bail!("no building at ({}, {})", position.x(), position.y());
        }
        self.run(commands)
    }

    pub(crate) fn select(&mut self, position: WorldPosition) -> Result<Vec<Event>> {
        let commands = self.cursor_action(
            position,
            BuilderInput {
                confirm_action: true,
                ..BuilderInput::default()
            },
        );
        self.run(commands)
    }

    /// Steps the world towards the requested rotation and zoom.
    pub(crate) fn set_view(&mut self, rotation: Rotation, zoom: Zoom) -> Result<Vec<Event>> {
        let mut commands = Vec::new();
        let mut current = query::rotation(&self.world);
        while current != rotation {
            let change = if current.index() < rotation.index() {
                ChangeRotation::Right
            } else {
                ChangeRotation::Left
            };
            current = current.step(change);
            self.rotate_and_zoom(Some(change), None, &mut commands);
        }
        let mut current = query::zoom(&self.world);
        while current != zoom {
            let change = if current < zoom {
                ChangeZoom::ZoomIn
            } else {
                ChangeZoom::ZoomOut
            };
            current = current.step(change);
            self.rotate_and_zoom(None, Some(change), &mut commands);
        }
        self.run(commands)
    }

    /// World cell under a window pixel.
    pub(crate) fn pick(&mut self, mouse: IVec2, camera: Vec2) -> IVec2 {
        let size = query::world_size(&self.world);
        let view = PickerView {
            zoom: query::zoom(&self.world),
            rotation: query::rotation(&self.world),
            world_width: size.x,
            world_height: size.y,
            camera,
        };
        self.picker.on_mouse_enter(true);
        let _ = self.picker.on_mouse_moved(mouse, &view);
        self.picker.current_position()
    }

    pub(crate) fn is_picked_in_world(&self) -> bool {
        let size = query::world_size(&self.world);
        self.picker.is_current_in_world(size.x, size.y)
    }

    /// Uploads every layer into host buffers and plans a frame.
    pub(crate) fn plan(&self, camera: &Camera, options: &RenderOptions) -> Result<FramePlan> {
        let mut store = MemoryBufferStore::new();
        let _ = WorldBuffers::upload(&self.world, &mut store).context("failed to upload layers")?;
        Ok(FramePlan {
            calls: plan_frame(&self.world, camera, options),
            buffers: store.buffer_count(),
            bytes: store.bytes_written(),
        })
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        self.world
            .save(path)
            .with_context(|| format!("failed to save map {}", path.display()))
    }

    /// Human readable overview of the world.
    pub(crate) fn describe(&self) -> Vec<String> {
        let size = query::world_size(&self.world);
        let mut lines = vec![format!(
            "world {}x{} rotation {} zoom {}",
            size.x,
            size.y,
            query::rotation(&self.world).name(),
            query::zoom(&self.world).name()
        )];
        for island in query::islands(&self.world) {
            let aabb = island.aabb();
            let buildings = island
                .buildings()
                .tiles()
                .iter()
                .filter(|tile| tile.has_building())
                .count();
            lines.push(format!(
                "island {} at ({}, {}) size {}x{} climate {} building tiles {buildings}",
                island.id().get(),
                aabb.position.x,
                aabb.position.y,
                aabb.size.x,
                aabb.size.y,
                island.climate().unwrap_or("-"),
            ));
        }
        lines.push(format!(
            "deep water tiles {}",
            query::deep_water(&self.world).instances()
        ));
        lines
    }

    /// Building covering a world cell, if any.
    pub(crate) fn building_at(&self, position: WorldPosition) -> Option<BuildingId> {
        query::tile(&self.world, LayerKind::Buildings, position).and_then(|tile| tile.building())
    }

    fn buildability(
        &self,
        building: BuildingId,
        origin: WorldPosition,
        rotation: Rotation,
    ) -> Result<(), PlacementError> {
        let definition = self
            .catalog
            .building(building)
            .ok_or(PlacementError::UnknownBuilding)?;
        query::is_buildable_at(&self.world, origin, definition, rotation, &self.catalog)
    }

    fn cursor_action(&mut self, position: WorldPosition, input: BuilderInput) -> Vec<Command> {
        let mut commands = Vec::new();
        let world = &self.world;
        self.builder.handle(
            None,
            BuilderInput {
                cursor_cell: Some(position),
                ..input
            },
            |cell| {
                query::tile(world, LayerKind::Buildings, cell).and_then(|tile| tile.building())
            },
            &mut commands,
        );
        commands
    }

    fn rotate_and_zoom(
        &mut self,
        rotate_world: Option<ChangeRotation>,
        zoom_world: Option<ChangeZoom>,
        commands: &mut Vec<Command>,
    ) {
        let input = BuilderInput {
            rotate_world,
            zoom_world,
            ..BuilderInput::default()
        };
        self.builder.handle(None, input, |_| None, commands);
    }

    fn run(&mut self, commands: Vec<Command>) -> Result<Vec<Event>> {
        let ctx = Context::from_catalog(&self.catalog);
        let mut events = Vec::new();
        for command in commands {
            debug!(?command, "applying command");
            apply(&mut self.world, command, &ctx, &mut events)
                .context("world content is corrupt")?;
        }
        Ok(events)
    }
}
