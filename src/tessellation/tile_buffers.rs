use crate::{math::TileIndex, tessellation::AreaOfInterest};
use bevy::{
    math::DVec2,
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
    },
};

/// The graphic buffers of a single requested tile.
///
/// Vertex positions are normalized into the unit box of the shared [`AreaOfInterest`],
/// texture coordinates are local to the tile and indices form a triangle list.
#[derive(Clone, Debug)]
pub struct TileBuffers {
    tile: TileIndex,
    area: AreaOfInterest,
    vertices: Vec<[f32; 2]>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl TileBuffers {
    pub fn new(tile: TileIndex, area: AreaOfInterest) -> Self {
        Self {
            tile,
            area,
            vertices: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Appends a chunk of geometry, given in finest grid positions.
    ///
    /// The indices of the chunk refer to its own vertices and are offset by the vertices already stored.
    pub fn append(&mut self, vertices: &[DVec2], texcoords: &[DVec2], indices: &[u32]) {
        let offset = self.vertices.len() as u32;

        self.vertices.extend(
            vertices
                .iter()
                .map(|&vertex| self.area.normalize(vertex).as_vec2().to_array()),
        );
        self.texcoords
            .extend(texcoords.iter().map(|texcoord| texcoord.as_vec2().to_array()));
        self.indices.extend(indices.iter().map(|index| index + offset));
    }

    pub fn tile(&self) -> TileIndex {
        self.tile
    }

    pub fn area_of_interest(&self) -> AreaOfInterest {
        self.area
    }

    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.vertices
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates over the vertex positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 2]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|triangle| {
            [triangle[0], triangle[1], triangle[2]].map(|index| self.vertices[index as usize])
        })
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn texcoord_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texcoords)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Creates a flat mesh in the xy plane, with the tile texture mapped by the first uv channel.
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|&[x, y]| [x, y, 0.0]).collect();
        let normals: Vec<[f32; 3]> = vec![[0.0, 0.0, 1.0]; positions.len()];

        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, self.texcoords.clone())
        .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::I64Vec2;

    fn buffers() -> TileBuffers {
        let area = AreaOfInterest {
            min: I64Vec2::ZERO,
            max: I64Vec2::new(4, 2),
        };

        TileBuffers::new(TileIndex::ROOT, area)
    }

    #[test]
    fn append_offsets_indices() {
        let mut buffers = buffers();
        let triangle = [DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(4.0, 2.0)];

        buffers.append(&triangle, &triangle, &[0, 1, 2]);
        buffers.append(&triangle, &triangle, &[2, 1, 0]);

        assert_eq!(buffers.vertices().len(), 6);
        assert_eq!(buffers.indices(), &[0, 1, 2, 5, 4, 3]);
        assert_eq!(buffers.vertices()[2], [1.0, 1.0]);
        assert_eq!(buffers.triangle_count(), 2);
        assert_eq!(
            buffers.triangles().nth(1),
            Some([[1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
        );
    }

    #[test]
    fn byte_views() {
        let mut buffers = buffers();
        let triangle = [DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(4.0, 2.0)];
        buffers.append(&triangle, &triangle, &[0, 1, 2]);

        assert_eq!(buffers.vertex_bytes().len(), 3 * 2 * 4);
        assert_eq!(buffers.texcoord_bytes().len(), 3 * 2 * 4);
        assert_eq!(buffers.index_bytes().len(), 3 * 4);
    }

    #[test]
    fn mesh_attributes() {
        let mut buffers = buffers();
        let triangle = [DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(4.0, 2.0)];
        buffers.append(&triangle, &triangle, &[0, 1, 2]);

        let mesh = buffers.to_mesh();

        assert_eq!(mesh.count_vertices(), 3);
        assert_eq!(mesh.indices().map(Indices::len), Some(3));
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
    }
}
