use crate::{
    projection::{TileProjection, TileProjectionKind},
    query::TileQuery,
};
use anyhow::Result;
use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// Describes where the tiles of a layer come from and how they are laid out on the globe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TileSourceConfig {
    /// The url of each tile, with `{zoom}`, `{x}` and `{y}` placeholders.
    pub url: String,
    /// The edge length of a tile image in pixels.
    pub tile_size: u32,
    /// Coarser tiles are never selected.
    pub min_zoom: u32,
    /// Finer tiles are never selected.
    pub max_zoom: u32,
    pub projection: TileProjectionKind,
    pub request_timeout_secs: u64,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://tile.openstreetmap.org/{zoom}/{x}/{y}.png".to_string(),
            tile_size: 256,
            min_zoom: 0,
            max_zoom: 20,
            projection: TileProjectionKind::Mercator,
            request_timeout_secs: 30,
        }
    }
}

impl TileSourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn query(&self) -> TileQuery<'_> {
        TileQuery::new(self)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let encoded = fs::read_to_string(path)?;
        Ok(ron::from_str(&encoded)?)
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, encoded)?;
        Ok(())
    }
}

impl TileProjection for TileSourceConfig {
    fn grid_to_lon_lat(&self, zoom: u32, x: f64, y: f64) -> DVec2 {
        self.projection.grid_to_lon_lat(zoom, x, y)
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

/// Settings of the [`DiskCache`](super::DiskCache).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DiskCacheConfig {
    pub path: PathBuf,
    /// The total size of all entries in bytes, beyond which the oldest ones are evicted.
    pub size_limit: u64,
    /// Locks held longer than this are considered abandoned and are broken.
    pub lock_expiration_secs: u64,
    /// Entries older than this are treated as missing.
    pub data_expiration_secs: u64,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("world_tiles_cache"),
            size_limit: 1 << 27,
            lock_expiration_secs: 2 * 60,
            data_expiration_secs: 10 * 24 * 60 * 60,
        }
    }
}

impl DiskCacheConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn lock_expiration(&self) -> Duration {
        Duration::from_secs(self.lock_expiration_secs)
    }

    pub fn data_expiration(&self) -> Duration {
        Duration::from_secs(self.data_expiration_secs)
    }
}
