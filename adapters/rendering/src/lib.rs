#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts shared by Isle adapters.
//!
//! Layers keep their instance data in host memory. This crate mirrors that
//! data into a [`BufferStore`], keeps it current as world events arrive and
//! decides which layers a frame has to draw.

mod store;

use anyhow::{ensure, Context as _, Result as AnyResult};
use glam::{IVec2, Vec2};
use isle_core::{Event, Rotation, Zoom, NR_OF_ROTATIONS, NR_OF_ZOOMS};
use isle_world::{query, Layer, LayerKind, ScreenBounds, World};
use tracing::debug;

pub use store::{BufferHandle, BufferStore, MemoryBufferStore};

const MATRIX_BYTES: usize = std::mem::size_of::<glam::Mat4>();
const IVEC4_BYTES: usize = std::mem::size_of::<glam::IVec4>();

/// Island layers a frame draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderSelection {
    /// Shallow water and beach only.
    Coast,
    /// Ground tiles only.
    Terrain,
    /// Placed buildings only.
    Buildings,
    /// Terrain with buildings drawn on top.
    Mixed,
    /// Coast followed by the mixed layer.
    #[default]
    All,
    /// No island layer.
    Nothing,
}

impl RenderSelection {
    /// Island layer kinds drawn for the selection, in drawing order.
    #[must_use]
    pub fn layer_kinds(self) -> &'static [LayerKind] {
        match self {
            Self::Coast => &[LayerKind::Coast],
            Self::Terrain => &[LayerKind::Terrain],
            Self::Buildings => &[LayerKind::Buildings],
            Self::Mixed => &[LayerKind::Mixed],
            Self::All => &[LayerKind::Coast, LayerKind::Mixed],
            Self::Nothing => &[],
        }
    }
}

/// Everything the player can toggle about what gets drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Island layers.
    pub selection: RenderSelection,
    /// Draws the outline of every buildable island cell.
    pub island_grids: bool,
    /// Draws the deep water around the islands.
    pub deep_water: bool,
    /// Draws the outline of every world cell.
    pub world_grid: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            selection: RenderSelection::All,
            island_grids: false,
            deep_water: true,
            world_grid: false,
        }
    }
}

/// Screen region shown by the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Top-left corner in screen pixels.
    pub position: Vec2,
    /// Window size in pixels.
    pub viewport: Vec2,
}

impl Camera {
    /// Creates a camera.
    #[must_use]
    pub const fn new(position: Vec2, viewport: Vec2) -> Self {
        Self { position, viewport }
    }

    /// Screen rectangle covered by the window.
    #[must_use]
    pub fn view_bounds(&self) -> ScreenBounds {
        ScreenBounds {
            min: self.position,
            max: self.position + self.viewport,
        }
    }

    /// Indices of the islands whose coast overlaps the window.
    #[must_use]
    pub fn visible_islands(&self, world: &World) -> Vec<usize> {
        let view = self.view_bounds();
        let (zoom, rotation) = (query::zoom(world), query::rotation(world));
        query::islands(world)
            .iter()
            .enumerate()
            .filter(|(_, island)| {
                island
                    .screen_bounds(zoom, rotation)
                    .is_some_and(|bounds| bounds.intersects(&view))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

/// Layer a draw call reads its instances from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawTarget {
    /// Water around the islands.
    DeepWater,
    /// Layer of one island.
    Island {
        /// Index of the island.
        index: usize,
        /// Layer of the island.
        kind: LayerKind,
    },
    /// Outline of every world cell.
    WorldGrid,
}

/// One instanced draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    /// Layer providing the instances.
    pub target: DrawTarget,
    /// Number of instances to draw.
    pub instances: usize,
    /// Zoom selecting the model matrix buffer.
    pub zoom: Zoom,
    /// Rotation selecting the model matrix buffer and gfx component.
    pub rotation: Rotation,
}

/// Draw calls for one frame, back to front.
#[must_use]
pub fn plan_frame(world: &World, camera: &Camera, options: &RenderOptions) -> Vec<DrawCall> {
    let (zoom, rotation) = (query::zoom(world), query::rotation(world));
    let call = |target: DrawTarget, layer: &Layer| DrawCall {
        target,
        instances: layer.instances(),
        zoom,
        rotation,
    };

    let mut calls = Vec::new();
    if options.deep_water {
        calls.push(call(DrawTarget::DeepWater, query::deep_water(world)));
    }

    let islands = query::islands(world);
    let visible = camera.visible_islands(world);
    for &index in &visible {
        for &kind in options.selection.layer_kinds() {
            if let Some(layer) = islands[index].layer(kind) {
                calls.push(call(DrawTarget::Island { index, kind }, layer));
            }
        }
    }
    if options.island_grids {
        for &index in &visible {
            let kind = LayerKind::Grid;
            calls.push(call(DrawTarget::Island { index, kind }, islands[index].grid()));
        }
    }

    if options.world_grid {
        calls.push(call(DrawTarget::WorldGrid, query::world_grid(world)));
    }
    calls
}

/// Buffers mirroring one layer's instance arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerBuffers {
    kind: LayerKind,
    instances: usize,
    model_matrices: [[BufferHandle; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
    gfx_numbers: BufferHandle,
    building_ids: BufferHandle,
    selected: BufferHandle,
}

impl LayerBuffers {
    /// Creates the layer's buffers and stores every instance array in them.
    pub fn upload<S>(layer: &Layer, label: &str, store: &mut S) -> AnyResult<Self>
    where
        S: BufferStore + ?Sized,
    {
        let mut create = |suffix: String| store.create_buffer(&format!("{label}_{suffix}"));
        let model_matrices = Zoom::ALL.map(|zoom| {
            Rotation::ALL.map(|rotation| {
                create(format!("model_matrices_{}_{}", zoom.name(), rotation.name()))
            })
        });
        let gfx_numbers = create("gfx_numbers".to_owned());
        let building_ids = create("building_ids".to_owned());
        let selected = create("selected".to_owned());

        let buffers = Self {
            kind: layer.kind(),
            instances: layer.instances(),
            model_matrices,
            gfx_numbers,
            building_ids,
            selected,
        };

        for zoom in Zoom::ALL {
            for rotation in Rotation::ALL {
                store
                    .store_data(
                        buffers.model_matrices[zoom.index()][rotation.index()],
                        bytemuck::cast_slice(layer.model_matrices(zoom, rotation)),
                    )
                    .with_context(|| {
                        format!("failed to store {label} model matrices for {zoom:?} {rotation:?}")
                    })?;
            }
        }
        store
            .store_data(buffers.gfx_numbers, bytemuck::cast_slice(layer.gfx_numbers()))
            .with_context(|| format!("failed to store {label} gfx numbers"))?;
        store
            .store_data(buffers.building_ids, bytemuck::cast_slice(layer.building_ids()))
            .with_context(|| format!("failed to store {label} building ids"))?;
        buffers.store_selection(layer, store)?;

        debug!(layer = ?buffers.kind, instances = buffers.instances, "uploaded layer buffers");
        Ok(buffers)
    }

    /// Layer the buffers were created for.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Number of instances held by each buffer.
    #[must_use]
    pub fn instances(&self) -> usize {
        self.instances
    }

    /// Model matrix buffer of a zoom and rotation.
    #[must_use]
    pub fn model_matrices(&self, zoom: Zoom, rotation: Rotation) -> BufferHandle {
        self.model_matrices[zoom.index()][rotation.index()]
    }

    /// Per-instance gfx buffer.
    #[must_use]
    pub fn gfx_numbers(&self) -> BufferHandle {
        self.gfx_numbers
    }

    /// Per-instance building id buffer.
    #[must_use]
    pub fn building_ids(&self) -> BufferHandle {
        self.building_ids
    }

    /// Per-instance selection buffer.
    #[must_use]
    pub fn selected(&self) -> BufferHandle {
        self.selected
    }

    /// Rewrites the instance slots of the given world cells under every rotation.
    ///
    /// The layer must still hold as many instances as when it was uploaded.
    pub fn update_cells<S>(&self, layer: &Layer, cells: &[IVec2], store: &mut S) -> AnyResult<()>
    where
        S: BufferStore + ?Sized,
    {
        ensure!(
            layer.instances() == self.instances,
            "{:?} layer holds {} instances, its buffers {}",
            self.kind,
            layer.instances(),
            self.instances
        );

        for &cell in cells {
            for rotation in Rotation::ALL {
                let slot = layer.instance_id(cell, rotation).with_context(|| {
                    format!("{:?} layer has no instance at {cell}", self.kind)
                })?;

                for zoom in Zoom::ALL {
                    let matrix = &layer.model_matrices(zoom, rotation)[slot];
                    store.store_sub_data(
                        self.model_matrices(zoom, rotation),
                        slot * MATRIX_BYTES,
                        bytemuck::bytes_of(matrix),
                    )?;
                }
                store.store_sub_data(
                    self.gfx_numbers,
                    slot * IVEC4_BYTES,
                    bytemuck::bytes_of(&layer.gfx_numbers()[slot]),
                )?;
                store.store_sub_data(
                    self.building_ids,
                    slot * IVEC4_BYTES,
                    bytemuck::bytes_of(&layer.building_ids()[slot]),
                )?;
                store.store_sub_data(
                    self.selected,
                    slot * IVEC4_BYTES,
                    bytemuck::bytes_of(&layer.selected()[slot]),
                )?;
            }
        }

        debug!(layer = ?self.kind, cells = cells.len(), "updated layer buffers");
        Ok(())
    }

    /// Replaces the selection buffer.
    pub fn store_selection<S>(&self, layer: &Layer, store: &mut S) -> AnyResult<()>
    where
        S: BufferStore + ?Sized,
    {
        store
            .store_data(self.selected, bytemuck::cast_slice(layer.selected()))
            .with_context(|| format!("failed to store {:?} selection", self.kind))
    }
}

/// Buffers of the layers belonging to one island.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IslandBuffers {
    /// Shallow water and beach.
    pub coast: LayerBuffers,
    /// Ground tiles.
    pub terrain: LayerBuffers,
    /// Placed buildings.
    pub buildings: LayerBuffers,
    /// Terrain with buildings on top.
    pub mixed: LayerBuffers,
    /// Buildable cell outlines.
    pub grid: LayerBuffers,
}

/// Buffers of every layer in the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldBuffers {
    islands: Vec<IslandBuffers>,
    deep_water: LayerBuffers,
    world_grid: LayerBuffers,
}

impl WorldBuffers {
    /// Uploads every layer of the world.
    pub fn upload<S>(world: &World, store: &mut S) -> AnyResult<Self>
    where
        S: BufferStore + ?Sized,
    {
        let mut islands = Vec::new();
        for (index, island) in query::islands(world).iter().enumerate() {
            let mut upload = |layer: &Layer| {
                LayerBuffers::upload(
                    layer,
                    &format!("island{index}_{}", layer.kind().name()),
                    store,
                )
            };
            islands.push(IslandBuffers {
                coast: upload(island.coast())?,
                terrain: upload(island.terrain())?,
                buildings: upload(island.buildings())?,
                mixed: upload(island.mixed())?,
                grid: upload(island.grid())?,
            });
        }

        let deep_water = LayerBuffers::upload(query::deep_water(world), "deep_water", store)?;
        let world_grid = LayerBuffers::upload(query::world_grid(world), "world_grid", store)?;

        Ok(Self {
            islands,
            deep_water,
            world_grid,
        })
    }

    /// Buffers of an island.
    #[must_use]
    pub fn island(&self, index: usize) -> Option<&IslandBuffers> {
        self.islands.get(index)
    }

    /// Buffers of the deep water layer.
    #[must_use]
    pub fn deep_water(&self) -> &LayerBuffers {
        &self.deep_water
    }

    /// Buffers of the world grid.
    #[must_use]
    pub fn world_grid(&self) -> &LayerBuffers {
        &self.world_grid
    }

    /// Buffers read by a draw call.
    #[must_use]
    pub fn target(&self, target: DrawTarget) -> Option<&LayerBuffers> {
        match target {
            DrawTarget::DeepWater => Some(&self.deep_water),
            DrawTarget::WorldGrid => Some(&self.world_grid),
            DrawTarget::Island { index, kind } => {
                let island = self.islands.get(index)?;
                match kind {
                    LayerKind::Coast => Some(&island.coast),
                    LayerKind::Terrain => Some(&island.terrain),
                    LayerKind::Buildings => Some(&island.buildings),
                    LayerKind::Mixed => Some(&island.mixed),
                    LayerKind::Grid => Some(&island.grid),
                    LayerKind::DeepWater | LayerKind::WorldGrid => None,
                }
            }
        }
    }

    /// Brings the buffers in line with the world after `events` were applied.
    pub fn apply_events<S>(&self, world: &World, events: &[Event], store: &mut S) -> AnyResult<()>
    where
        S: BufferStore + ?Sized,
    {
        let islands = query::islands(world);
        for event in events {
            match event {
                Event::BuildingPlaced { island, cells, .. }
                | Event::BuildingRemoved { island, cells, .. } => {
                    let index = island.get() as usize;
                    let (Some(layers), Some(buffers)) = (islands.get(index), self.islands.get(index))
                    else {
                        anyhow::bail!("event refers to unknown island {index}");
                    };
                    let cells: Vec<IVec2> = cells.iter().map(|cell| cell.as_ivec2()).collect();
                    buffers
                        .buildings
                        .update_cells(layers.buildings(), &cells, store)?;
                    buffers.mixed.update_cells(layers.mixed(), &cells, store)?;
                }
                Event::SelectionChanged { .. } => {
                    // the previous selection may sit on any island
                    for (layers, buffers) in islands.iter().zip(&self.islands) {
                        buffers.buildings.store_selection(layers.buildings(), store)?;
                        buffers.mixed.store_selection(layers.mixed(), store)?;
                    }
                }
                Event::BuildingPlacementRejected { .. }
                | Event::BuildingRemovalRejected { .. }
                | Event::RotationChanged { .. }
                | Event::ZoomChanged { .. } => {}
            }
        }
        Ok(())
    }
}
