use crate::{
    math::lon_lat_to_ecef,
    projection::{GeoBounds, TileProjection},
    result::{TileError, TileResult},
};
use bevy::math::{DVec2, I64Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The deepest zoom level a [`TileIndex`] may address.
///
/// Finest-grid coordinates are scaled by `2^(zoom + 1)`, so this keeps them well inside `i64`.
pub const MAX_ZOOM: u32 = 30;

/// The quadrant of its parent a tile occupies.
///
/// The discriminants double as bit flags, so that several corners can be combined in a
/// [`TileCondition`](crate::tessellation::TileCondition).
#[repr(u8)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Corner {
    BottomLeft = 1,
    BottomRight = 2,
    TopLeft = 4,
    TopRight = 8,
}

impl Corner {
    /// All corners in child order.
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopLeft,
        Corner::TopRight,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// The position of a child in this corner within [`TileIndex::children`].
    pub fn child_index(self) -> usize {
        self.bits().trailing_zeros() as usize
    }
}

/// The global identifier of a tile in the quadtree.
///
/// Zoom level 0 consists of a single root tile covering the whole domain,
/// each following level splits every tile into four children.
/// Within the grid the x axis points right and the y axis points up, so that odd y
/// coordinates occupy the top half of their parent. Corner names and "up" refer to this
/// grid only, the projection decides where a row lies on the globe
/// (row 0 touches the north pole under Mercator).
#[derive(
    Copy, Clone, Default, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct TileIndex {
    /// The zoom level of the tile, where 0 is the root.
    pub zoom: u32,
    /// The x position of the tile in tile sizes.
    pub x: u32,
    /// The y position of the tile in tile sizes.
    pub y: u32,
}

impl TileIndex {
    /// Sentinel for "no tile", e.g. the parent of the root.
    pub const INVALID: TileIndex = TileIndex {
        zoom: u32::MAX,
        x: u32::MAX,
        y: u32::MAX,
    };

    pub const ROOT: TileIndex = TileIndex {
        zoom: 0,
        x: 0,
        y: 0,
    };

    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// The count of tiles in x and y direction at the zoom level.
    pub fn count(zoom: u32) -> u64 {
        1 << zoom
    }

    pub fn is_valid(self) -> bool {
        self.zoom <= MAX_ZOOM
            && (self.x as u64) < Self::count(self.zoom)
            && (self.y as u64) < Self::count(self.zoom)
    }

    pub fn validate(self) -> TileResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(TileError::InvalidTileIndex(self))
        }
    }

    pub fn parent(self) -> Self {
        if self.zoom == 0 || !self.is_valid() {
            return Self::INVALID;
        }

        Self {
            zoom: self.zoom - 1,
            x: self.x >> 1,
            y: self.y >> 1,
        }
    }

    /// The four children ordered bottom-left, bottom-right, top-left, top-right.
    pub fn children(self) -> [Self; 4] {
        [0, 1, 2, 3].map(|index| {
            TileIndex::new(
                self.zoom + 1,
                (self.x << 1) + index % 2,
                (self.y << 1) + index / 2,
            )
        })
    }

    /// The quadrant of the parent this tile occupies.
    pub fn corner(self) -> Corner {
        match (self.x % 2 == 1, self.y % 2 == 1) {
            (true, true) => Corner::TopRight,
            (false, true) => Corner::TopLeft,
            (true, false) => Corner::BottomRight,
            (false, false) => Corner::BottomLeft,
        }
    }

    /// Iterates over all ancestors of this tile, starting with the parent and ending with the root.
    pub fn ancestors(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self.parent()), |tile| Some(tile.parent()))
            .take_while(|tile| tile.is_valid())
    }

    /// The position of the tile in a flat array of all tiles of all zoom levels,
    /// ordered by zoom, then row, then column.
    pub fn index(self) -> u64 {
        let shallower = ((1u64 << (2 * self.zoom)) - 1) / 3;

        shallower + self.y as u64 * Self::count(self.zoom) + self.x as u64
    }

    /// The inverse of [`TileIndex::index`].
    /// Indices past the last tile of [`MAX_ZOOM`] yield [`TileIndex::INVALID`].
    pub fn from_index(index: u64) -> Self {
        let mut remainder = index;

        for zoom in 0..=MAX_ZOOM {
            let width = Self::count(zoom);

            if remainder < width * width {
                return Self::new(zoom, (remainder % width) as u32, (remainder / width) as u32);
            }

            remainder -= width * width;
        }

        Self::INVALID
    }

    /// The minimum and maximum corner of the tile in the integer grid of `finest_zoom`.
    pub fn grid_bounds(self, finest_zoom: u32) -> (I64Vec2, I64Vec2) {
        let factor = 1i64 << (finest_zoom - self.zoom);
        let min = I64Vec2::new(self.x as i64, self.y as i64) * factor;

        (min, min + factor)
    }

    /// Substitutes the `{zoom}`, `{x}` and `{y}` placeholders of a url template.
    pub fn url(self, template: &str) -> String {
        template
            .replace("{zoom}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    /// Returns the bounding box of the tile in WGS-84 longitude and latitude.
    pub fn world_bbox(self, projection: &impl TileProjection) -> GeoBounds {
        let (x, y) = (self.x as f64, self.y as f64);
        let a = projection.grid_to_lon_lat(self.zoom, x, y);
        let b = projection.grid_to_lon_lat(self.zoom, x + 1.0, y + 1.0);

        GeoBounds::from_corners(a, b)
    }

    /// Returns the ground resolution of a single texture pixel in meters.
    pub fn mpp(self, projection: &impl TileProjection) -> f64 {
        let bbox = self.world_bbox(projection);
        let middle = bbox.middle();
        let pixel_size = DVec2::new(bbox.width(), bbox.height()) / projection.tile_size() as f64;

        let center = lon_lat_to_ecef(middle);
        let center_dx = lon_lat_to_ecef(middle + DVec2::new(pixel_size.x, 0.0));
        let center_dy = lon_lat_to_ecef(middle + DVec2::new(0.0, pixel_size.y));

        center.distance(center_dx).max(center.distance(center_dy))
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}_{}_{}", self.zoom, self.x, self.y)
    }
}
