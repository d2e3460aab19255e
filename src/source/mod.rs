//! Loads the rasters of tiles from a tiled map service.

mod cache;
mod config;
mod fetch;

pub use cache::{CacheLock, DiskCache, RasterCache};
pub use config::{DiskCacheConfig, TileSourceConfig};
pub use fetch::{HttpTileFetcher, TileFetch, TileFetcher, TileImage};
