use crate::{
    math::TileIndex,
    projection::{GeoBounds, TileProjection},
    result::{TileError, TileResult},
    tessellation::{
        AreaOfInterest, BoundaryVertexSet, TileBuffers, TileConditionMap, TileMeshBuilder,
    },
};
use bevy::{log::debug, math::DVec2};
use itertools::Itertools;

/// Tessellates sets of tiles with heterogeneous zoom levels into crack free meshes.
///
/// The builder remembers the area of interest of the last tessellation.
#[derive(Clone, Debug, Default)]
pub struct TileGeometryBuilder {
    aoi_zoom_level: Option<u32>,
    aoi_bounds: Option<AreaOfInterest>,
}

impl TileGeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The zoom level of the grid the area of interest is expressed in.
    pub fn aoi_zoom_level(&self) -> TileResult<u32> {
        self.aoi_zoom_level
            .ok_or(TileError::UninitializedState("aoi zoom level"))
    }

    /// The bounding box of the last tessellated tiles in the grid of [`Self::aoi_zoom_level`].
    pub fn aoi_bounds(&self) -> TileResult<AreaOfInterest> {
        self.aoi_bounds
            .ok_or(TileError::UninitializedState("aoi bounds"))
    }

    /// The area of interest as a fraction of the whole domain, in `[0, 1]`.
    pub fn aoi_world_bounds(&self) -> TileResult<(DVec2, DVec2)> {
        let bounds = self.aoi_bounds()?;
        let count = TileIndex::count(self.aoi_zoom_level()?) as f64;

        Ok((bounds.min.as_dvec2() / count, bounds.max.as_dvec2() / count))
    }

    /// The area of interest in longitude and latitude.
    pub fn aoi_geo_bounds(&self, projection: &impl TileProjection) -> TileResult<GeoBounds> {
        let bounds = self.aoi_bounds()?;
        let zoom = self.aoi_zoom_level()?;

        let min = bounds.min.as_dvec2();
        let max = bounds.max.as_dvec2();

        Ok(GeoBounds::from_corners(
            projection.grid_to_lon_lat(zoom, min.x, min.y),
            projection.grid_to_lon_lat(zoom, max.x, max.y),
        ))
    }

    /// Builds the buffers of every distinct tile, ordered by ascending zoom level.
    ///
    /// Tiles of equal zoom keep the order in which they were first passed.
    /// Fails without partial results if any tile is invalid or degenerate.
    pub fn tessellate_tiles(
        &mut self,
        tiles: impl IntoIterator<Item = TileIndex>,
    ) -> TileResult<Vec<TileBuffers>> {
        self.aoi_zoom_level = None;
        self.aoi_bounds = None;

        let tiles: Vec<TileIndex> = tiles
            .into_iter()
            .map(TileIndex::validate)
            .collect::<TileResult<Vec<_>>>()?
            .into_iter()
            .unique()
            .sorted_by_key(|tile| tile.zoom)
            .collect();

        let conditions = TileConditionMap::build(tiles.iter().copied());
        let boundary = BoundaryVertexSet::from_conditions(&conditions);

        let Some(area) = boundary.area_of_interest() else {
            return Ok(Vec::new());
        };

        let mesh_builder = TileMeshBuilder::new(&conditions, &boundary);

        let buffers = tiles
            .iter()
            .map(|&tile| {
                let mut buffers = TileBuffers::new(tile, area);
                mesh_builder.build(&mut buffers)?;
                Ok(buffers)
            })
            .collect::<TileResult<Vec<_>>>()?;

        debug!(
            "Tessellated {} tiles into {} triangles, area of interest {:?} at zoom {}.",
            buffers.len(),
            buffers.iter().map(TileBuffers::triangle_count).sum::<usize>(),
            area,
            conditions.max_zoom()
        );

        self.aoi_zoom_level = Some(conditions.max_zoom());
        self.aoi_bounds = Some(area);

        Ok(buffers)
    }
}

/// Tessellates the tiles with a fresh [`TileGeometryBuilder`].
pub fn tessellate(tiles: impl IntoIterator<Item = TileIndex>) -> TileResult<Vec<TileBuffers>> {
    TileGeometryBuilder::new().tessellate_tiles(tiles)
}
