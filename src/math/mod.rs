//! Tile addressing and the geodesy required to judge the resolution of a tile.

mod tile_index;

pub use tile_index::{Corner, TileIndex, MAX_ZOOM};

use bevy::math::{DVec2, DVec3};
use map_3d::{geodetic2ecef, Ellipsoid};

/// Converts a WGS-84 longitude/latitude pair in degrees to earth centered, earth fixed coordinates in meters.
pub fn lon_lat_to_ecef(lon_lat: DVec2) -> DVec3 {
    let (x, y, z) = geodetic2ecef(
        lon_lat.y.to_radians(),
        lon_lat.x.to_radians(),
        0.0,
        Ellipsoid::WGS84,
    );

    DVec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecef_on_equator() {
        let position = lon_lat_to_ecef(DVec2::new(0.0, 0.0));

        assert!((position.x - 6378137.0).abs() < 1e-3);
        assert!(position.y.abs() < 1e-3);
        assert!(position.z.abs() < 1e-3);

        let pole = lon_lat_to_ecef(DVec2::new(0.0, 90.0));
        assert!((pole.z - 6356752.314245).abs() < 1e-2);
    }
}
