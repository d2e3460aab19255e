//! Converts a set of tiles of differing zoom levels into crack free triangle meshes.
//!
//! The tessellation runs in three passes.
//! First the [`TileConditionMap`] marks every requested tile and the quadrants of its ancestors.
//! Then the [`BoundaryVertexSet`] collects the corners of all requested tiles in the grid of the finest zoom level.
//! Finally the [`TileMeshBuilder`] emits one triangle fan per leaf polygon, whose boundary
//! contains every collected vertex lying on its edges.

mod boundary;
mod condition;
mod geometry_builder;
mod mesh_builder;
mod tile_buffers;

pub use boundary::{AreaOfInterest, BoundaryVertexSet};
pub use condition::{TileCondition, TileConditionMap};
pub use geometry_builder::{tessellate, TileGeometryBuilder};
pub use mesh_builder::TileMeshBuilder;
pub use tile_buffers::TileBuffers;
