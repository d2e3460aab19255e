//! This crate provides the ability to drape the tiles of a web map service over a flat
//! surface, without cracks between tiles of different detail.
//!
//! # Background
//! There are two questions that each tiled map renderer has to answer:
//!
//! ## Which tiles are required?
//! Map services split the world into a quadtree of square tiles, where each zoom level
//! doubles the resolution of the previous one.
//! Given a region and the ground resolution required at its corners, the [`TileQuery`](query::TileQuery)
//! selects a set of disjoint tiles that covers the region, each of them just detailed enough.
//! The rasters of these tiles are then provided by a [`TileFetcher`](source::TileFetcher),
//! which downloads them and keeps them in a [`DiskCache`](source::DiskCache).
//! See the [`query`] and [`source`] modules for more information.
//!
//! ## How to mesh tiles of mixed zoom levels?
//! Neighbouring tiles of different zoom levels share only part of their edges.
//! Meshing each tile as a plain quad would leave T-junctions along these edges, which
//! show up as visible cracks once the surface is displaced.
//! Therefore the [`TileGeometryBuilder`](tessellation::TileGeometryBuilder) splits the
//! edges of each tile at every corner of its neighbours and emits one buffer per tile,
//! which can be turned into a bevy mesh.
//! See the [`tessellation`] module for more information.

pub mod math;
pub mod projection;
pub mod query;
pub mod result;
pub mod source;
pub mod tessellation;

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        math::TileIndex,
        projection::{GeoBounds, TileProjection, TileProjectionKind},
        query::{RegionOfInterest, TileQuery},
        result::{TileError, TileResult},
        source::{
            DiskCache, DiskCacheConfig, HttpTileFetcher, RasterCache, TileFetch, TileFetcher,
            TileImage, TileSourceConfig,
        },
        tessellation::{tessellate, TileBuffers, TileGeometryBuilder},
    };
}
