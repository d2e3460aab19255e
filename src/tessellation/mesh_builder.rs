use crate::{
    math::TileIndex,
    result::{TileError, TileResult},
    tessellation::{BoundaryVertexSet, TileBuffers, TileConditionMap},
};
use bevy::math::{DVec2, I64Vec2};
use std::iter;

/// Walks the quadtree below a requested tile and emits its stitched polygons.
///
/// Both the condition map and the boundary vertices are read only during the walk.
pub struct TileMeshBuilder<'a> {
    conditions: &'a TileConditionMap,
    boundary: &'a BoundaryVertexSet,
}

impl<'a> TileMeshBuilder<'a> {
    pub fn new(conditions: &'a TileConditionMap, boundary: &'a BoundaryVertexSet) -> Self {
        Self {
            conditions,
            boundary,
        }
    }

    /// Appends the geometry of the tile owning the buffers.
    pub fn build(&self, buffers: &mut TileBuffers) -> TileResult<()> {
        self.append_tile(buffers, buffers.tile(), 0)
    }

    fn append_tile(&self, buffers: &mut TileBuffers, tile: TileIndex, depth: u32) -> TileResult<()> {
        let condition = self.conditions.get(tile);

        // Nested textured tiles are emitted into their own buffers.
        if condition.has_texture() && depth != 0 {
            return Ok(());
        }

        if condition.is_subdivided() {
            for child in tile.children() {
                self.append_tile(buffers, child, depth + 1)?;
            }

            Ok(())
        } else {
            self.append_polygon(buffers, tile)
        }
    }

    /// Emits a triangle fan around the center of the tile, which includes every
    /// boundary vertex touching one of its edges.
    fn append_polygon(&self, buffers: &mut TileBuffers, tile: TileIndex) -> TileResult<()> {
        let boundary = self.boundary_loop(tile);

        if boundary.len() < 3 {
            return Err(TileError::DegenerateGeometry {
                tile,
                points: boundary.len(),
            });
        }

        let (min, max) = tile.grid_bounds(self.boundary.finest_zoom());
        let center = (min + max).as_dvec2() / 2.0;

        let vertices: Vec<DVec2> = iter::once(center)
            .chain(boundary.iter().map(|vertex| vertex.as_dvec2()))
            .collect();

        // Texture coordinates are relative to the tile whose texture the buffers carry.
        let (owner_min, owner_max) = buffers.tile().grid_bounds(self.boundary.finest_zoom());
        let owner_size = (owner_max - owner_min).as_dvec2();
        let texcoords: Vec<DVec2> = vertices
            .iter()
            .map(|&vertex| (vertex - owner_min.as_dvec2()) / owner_size)
            .collect();

        let count = boundary.len() as u32;
        let indices: Vec<u32> = (1..=count)
            .flat_map(|index| [0, index, index % count + 1])
            .collect();

        buffers.append(&vertices, &texcoords, &indices);

        Ok(())
    }

    /// The boundary of the tile, sweeping the left, top, right and bottom edge in this order.
    fn boundary_loop(&self, tile: TileIndex) -> Vec<I64Vec2> {
        let (min, max) = tile.grid_bounds(self.boundary.finest_zoom());

        [
            self.boundary.vertical_edge(min.x, min.y, max.y),
            self.boundary.horizontal_edge(max.y, min.x, max.x),
            self.boundary.vertical_edge(max.x, max.y, min.y),
            self.boundary.horizontal_edge(min.y, max.x, min.x),
        ]
        .concat()
    }
}
