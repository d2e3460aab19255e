use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// An axis aligned box in WGS-84 longitude and latitude degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub const WORLD: Self = GeoBounds {
        min_lon: -180.0,
        min_lat: -90.0,
        max_lon: 180.0,
        max_lat: 90.0,
    };

    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Creates the bounds spanned by two arbitrary opposite corners.
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);

        Self::new(min.x, min.y, max.x, max.y)
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.min_lon, self.min_lat)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.max_lon, self.max_lat)
    }

    pub fn middle(&self) -> DVec2 {
        (self.min() + self.max()) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// The corners in counter-clockwise order, starting at the minimum.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min(),
            DVec2::new(self.max_lon, self.min_lat),
            self.max(),
            DVec2::new(self.min_lon, self.max_lat),
        ]
    }
}

/// Maps the tile grid of a quadtree onto the globe.
pub trait TileProjection {
    /// Converts a (fractional) grid position at the zoom level to longitude and latitude in degrees.
    fn grid_to_lon_lat(&self, zoom: u32, x: f64, y: f64) -> DVec2;

    /// The edge length of a tile image in pixels.
    fn tile_size(&self) -> u32;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum TileProjectionKind {
    /// The slippy map tiling, where row 0 touches the north pole.
    #[default]
    Mercator,
    /// Splits the bounding box linearly in longitude and latitude.
    Equirectangular { world_bbox: GeoBounds },
}

impl TileProjectionKind {
    pub fn grid_to_lon_lat(self, zoom: u32, x: f64, y: f64) -> DVec2 {
        let divisions = (1u64 << zoom) as f64;

        match self {
            TileProjectionKind::Mercator => {
                let lon = x / divisions * 360.0 - 180.0;
                let lat = (PI * (1.0 - 2.0 * y / divisions)).sinh().atan().to_degrees();

                DVec2::new(lon, lat)
            }
            TileProjectionKind::Equirectangular { world_bbox } => {
                world_bbox.min()
                    + DVec2::new(world_bbox.width(), world_bbox.height()) * DVec2::new(x, y)
                        / divisions
            }
        }
    }
}
