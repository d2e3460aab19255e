use crate::{
    math::{TileIndex, MAX_ZOOM},
    projection::GeoBounds,
    source::TileSourceConfig,
};
use bevy::math::DVec2;

/// A polygon in longitude and latitude degrees, with the required ground resolution at each vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionOfInterest {
    pub polygon: Vec<DVec2>,
    /// The maximum meters per pixel acceptable at the vertex of the same index.
    pub meters_per_pixel: Vec<f64>,
}

impl RegionOfInterest {
    pub fn new(polygon: Vec<DVec2>, meters_per_pixel: Vec<f64>) -> Self {
        debug_assert_eq!(polygon.len(), meters_per_pixel.len());

        Self {
            polygon,
            meters_per_pixel,
        }
    }

    /// Requires the same resolution everywhere.
    pub fn uniform(polygon: Vec<DVec2>, meters_per_pixel: f64) -> Self {
        let meters_per_pixel = vec![meters_per_pixel; polygon.len()];

        Self::new(polygon, meters_per_pixel)
    }

    /// The required resolution at the position, interpolated by inverse distance weighting.
    pub fn required_mpp(&self, position: DVec2) -> f64 {
        let mut weights = 0.0;
        let mut sum = 0.0;

        for (&vertex, &mpp) in self.polygon.iter().zip(&self.meters_per_pixel) {
            let distance = vertex.distance(position);

            if distance < f64::EPSILON {
                return mpp;
            }

            weights += 1.0 / distance;
            sum += mpp / distance;
        }

        sum / weights
    }

    /// The part of the polygon inside the bounds.
    pub fn clip(&self, bounds: &GeoBounds) -> Vec<DVec2> {
        clip_polygon(&self.polygon, bounds)
    }
}

/// Selects the tiles of a source that cover a region at the required resolution.
pub struct TileQuery<'a> {
    config: &'a TileSourceConfig,
}

impl<'a> TileQuery<'a> {
    pub fn new(config: &'a TileSourceConfig) -> Self {
        Self { config }
    }

    /// Returns disjoint tiles covering the region, each detailed enough for the part of the region it covers.
    pub fn tiles_for_area(&self, roi: &RegionOfInterest) -> Vec<TileIndex> {
        let mut tiles = Vec::new();

        if roi.polygon.len() >= 3 {
            self.collect_tiles(TileIndex::ROOT, roi, &mut tiles);
        }

        tiles
    }

    fn collect_tiles(&self, tile: TileIndex, roi: &RegionOfInterest, tiles: &mut Vec<TileIndex>) {
        let tile_in_roi = roi.clip(&tile.world_bbox(self.config));

        if polygon_area(&tile_in_roi) <= 0.0 {
            return;
        }

        if self.is_detailed_enough(tile, roi, &tile_in_roi) {
            tiles.push(tile);
        } else {
            for child in tile.children() {
                self.collect_tiles(child, roi, tiles);
            }
        }
    }

    fn is_detailed_enough(
        &self,
        tile: TileIndex,
        roi: &RegionOfInterest,
        tile_in_roi: &[DVec2],
    ) -> bool {
        if tile.zoom < self.config.min_zoom {
            return false;
        }
        if tile.zoom >= self.config.max_zoom.min(MAX_ZOOM) {
            return true;
        }

        let mpp = tile.mpp(self.config);

        tile_in_roi
            .iter()
            .all(|&position| roi.required_mpp(position) >= mpp)
    }
}

/// Clips a simple polygon against the bounds, one bounding half plane after the other.
fn clip_polygon(polygon: &[DVec2], bounds: &GeoBounds) -> Vec<DVec2> {
    let planes: [(DVec2, f64); 4] = [
        (DVec2::X, bounds.min_lon),
        (DVec2::NEG_X, -bounds.max_lon),
        (DVec2::Y, bounds.min_lat),
        (DVec2::NEG_Y, -bounds.max_lat),
    ];

    let mut output = polygon.to_vec();

    for (normal, offset) in planes {
        let input = std::mem::take(&mut output);
        let inside = |point: DVec2| point.dot(normal) >= offset;

        for (index, &current) in input.iter().enumerate() {
            let previous = input[(index + input.len() - 1) % input.len()];

            if inside(current) != inside(previous) {
                let t = (offset - previous.dot(normal)) / (current - previous).dot(normal);
                output.push(previous.lerp(current, t));
            }
            if inside(current) {
                output.push(current);
            }
        }
    }

    output
}

/// The unsigned area of a simple polygon, zero for fewer than three vertices.
fn polygon_area(polygon: &[DVec2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }

    // Relative to the first vertex, small regions far from the origin keep their precision.
    let origin = polygon[0];
    let twice_area: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(&a, &b)| (a - origin).perp_dot(b - origin))
        .sum();

    twice_area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tel_aviv() -> Vec<DVec2> {
        vec![
            DVec2::new(34.809299, 32.105306),
            DVec2::new(34.816682, 32.027579),
            DVec2::new(34.741740, 32.031382),
        ]
    }

    fn tiny_triangle(size: f64) -> Vec<DVec2> {
        let corner = DVec2::new(34.8, 32.05);

        vec![
            corner,
            corner + DVec2::new(size, 0.0),
            corner + DVec2::new(0.0, size),
        ]
    }

    fn is_ancestor(ancestor: TileIndex, tile: TileIndex) -> bool {
        tile.ancestors().any(|other| other == ancestor)
    }

    #[test]
    fn inverse_distance_weighting() {
        let roi = RegionOfInterest::new(
            vec![DVec2::ZERO, DVec2::new(2.0, 0.0), DVec2::new(1.0, 4.0)],
            vec![10.0, 30.0, 50.0],
        );

        assert_eq!(roi.required_mpp(DVec2::ZERO), 10.0);
        assert_eq!(roi.required_mpp(DVec2::new(1.0, 4.0)), 50.0);

        let between = roi.required_mpp(DVec2::new(1.0, 0.0));
        assert!(between > 10.0 && between < 30.0);

        // Closer vertices weigh more.
        let near_first = roi.required_mpp(DVec2::new(0.2, 0.0));
        assert!(near_first < between);
    }

    #[test]
    fn clipping() {
        let square = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        let bounds = GeoBounds::new(2.0, -1.0, 6.0, 2.0);

        let clipped = clip_polygon(&square, &bounds);
        assert!((polygon_area(&clipped) - 4.0).abs() < 1e-12);
        assert!(clipped.iter().all(|&point| bounds.contains(point)));

        let outside = clip_polygon(&square, &GeoBounds::new(5.0, 5.0, 6.0, 6.0));
        assert!(outside.is_empty());

        let inside = clip_polygon(&square, &GeoBounds::new(-1.0, -1.0, 5.0, 5.0));
        assert_eq!(polygon_area(&inside), 16.0);
    }

    #[test]
    fn tiles_cover_region() {
        let config = TileSourceConfig::default();
        let roi = RegionOfInterest::uniform(tel_aviv(), 100.0);

        let tiles = config.query().tiles_for_area(&roi);
        assert!(!tiles.is_empty());

        for &tile in &tiles {
            assert!(tile.mpp(&config) <= 100.0);
            assert!(polygon_area(&roi.clip(&tile.world_bbox(&config))) > 0.0);

            for &other in &tiles {
                assert!(!is_ancestor(tile, other));
            }
        }

        let covered: f64 = tiles
            .iter()
            .map(|tile| polygon_area(&roi.clip(&tile.world_bbox(&config))))
            .sum();
        let area = polygon_area(&roi.polygon);
        assert!((covered - area).abs() < area * 1e-6);
    }

    #[test]
    fn coarser_requirement_selects_coarser_tiles() {
        let config = TileSourceConfig::default();

        let fine = config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(tel_aviv(), 10.0));
        let coarse = config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(tel_aviv(), 1000.0));

        let deepest = |tiles: &[TileIndex]| tiles.iter().map(|tile| tile.zoom).max();
        assert!(deepest(&coarse) < deepest(&fine));
    }

    #[test]
    fn zoom_limits() {
        let config = TileSourceConfig {
            max_zoom: 3,
            ..Default::default()
        };
        let tiles = config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(tel_aviv(), 1.0));

        assert_eq!(tiles, vec![TileIndex::new(3, 4, 3)]);

        let config = TileSourceConfig {
            min_zoom: 2,
            ..Default::default()
        };
        let whole_world = GeoBounds::new(-170.0, -80.0, 170.0, 80.0).corners().to_vec();
        let tiles = config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(whole_world, 1e9));

        assert_eq!(tiles.len(), 16);
        assert!(tiles.iter().all(|tile| tile.zoom == 2));
    }

    #[test]
    fn zoom_is_capped_at_finest_level() {
        let config = TileSourceConfig {
            max_zoom: MAX_ZOOM + 1,
            ..Default::default()
        };
        let tiles = config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(tiny_triangle(1e-6), 0.0));

        assert!(!tiles.is_empty());
        assert!(tiles
            .iter()
            .all(|tile| tile.is_valid() && tile.zoom == MAX_ZOOM));
        assert!(crate::tessellation::tessellate(tiles).is_ok());
    }

    #[test]
    fn small_region_far_from_origin() {
        let triangle = tiny_triangle(1e-6);
        assert!((polygon_area(&triangle) - 5e-13).abs() < 5e-19);

        let config = TileSourceConfig::default();
        let roi = RegionOfInterest::uniform(triangle, 1.0);
        let tiles = config.query().tiles_for_area(&roi);
        assert!(!tiles.is_empty());

        let covered: f64 = tiles
            .iter()
            .map(|tile| polygon_area(&roi.clip(&tile.world_bbox(&config))))
            .sum();
        let area = polygon_area(&roi.polygon);
        assert!((covered - area).abs() < area * 1e-6);
    }

    #[test]
    fn degenerate_region() {
        let config = TileSourceConfig::default();
        let line = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 10.0)];

        assert!(config
            .query()
            .tiles_for_area(&RegionOfInterest::uniform(line, 100.0))
            .is_empty());
    }
}
