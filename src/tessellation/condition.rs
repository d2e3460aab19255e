use crate::math::{Corner, TileIndex};
use bevy::utils::HashMap;

bitflags::bitflags! {
    /// Describes how a tile takes part in a tessellation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct TileCondition: u8 {
        const BOTTOM_LEFT  = Corner::BottomLeft as u8;
        const BOTTOM_RIGHT = Corner::BottomRight as u8;
        const TOP_LEFT     = Corner::TopLeft as u8;
        const TOP_RIGHT    = Corner::TopRight as u8;
        const CORNERS      = Self::BOTTOM_LEFT.bits()
                           | Self::BOTTOM_RIGHT.bits()
                           | Self::TOP_LEFT.bits()
                           | Self::TOP_RIGHT.bits();
        /// The tile itself was requested and carries its own texture.
        const HAS_TEXTURE  = 1 << 5;
    }
}

impl TileCondition {
    pub fn has_texture(self) -> bool {
        self.contains(TileCondition::HAS_TEXTURE)
    }

    /// Whether some descendant of the tile is textured independently.
    pub fn is_subdivided(self) -> bool {
        self.intersects(TileCondition::CORNERS)
    }
}

impl From<Corner> for TileCondition {
    fn from(corner: Corner) -> Self {
        TileCondition::from_bits_retain(corner.bits())
    }
}

/// The condition of every requested tile and all of its ancestors.
///
/// Requested tiles are marked with [`TileCondition::HAS_TEXTURE`], while each ancestor
/// records the quadrants through which requested descendants are reached.
/// The map is immutable once built.
#[derive(Clone, Debug, Default)]
pub struct TileConditionMap {
    conditions: HashMap<TileIndex, TileCondition>,
    max_zoom: u32,
}

impl TileConditionMap {
    /// Builds the map from valid tiles.
    pub fn build(tiles: impl IntoIterator<Item = TileIndex>) -> Self {
        let mut map = Self::default();

        for tile in tiles {
            map.insert(tile);
        }

        map
    }

    fn insert(&mut self, tile: TileIndex) {
        *self.conditions.entry(tile).or_default() |= TileCondition::HAS_TEXTURE;
        self.max_zoom = self.max_zoom.max(tile.zoom + 1);

        let mut child = tile;

        for ancestor in tile.ancestors() {
            // An ancestor that was already known had its own ancestors marked when it was added.
            let known = self.conditions.contains_key(&ancestor);

            *self.conditions.entry(ancestor).or_default() |= child.corner().into();

            if known {
                break;
            }

            child = ancestor;
        }
    }

    /// The condition of the tile, empty for tiles outside of the map.
    pub fn get(&self, tile: TileIndex) -> TileCondition {
        self.conditions.get(&tile).copied().unwrap_or_default()
    }

    pub fn contains(&self, tile: TileIndex) -> bool {
        self.conditions.contains_key(&tile)
    }

    /// One more than the deepest zoom level of the requested tiles.
    ///
    /// Tile corners and centers are integral in the grid of this zoom level.
    pub fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    /// Iterates over the requested tiles in arbitrary order.
    pub fn textured_tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.conditions
            .iter()
            .filter(|(_, condition)| condition.has_texture())
            .map(|(&tile, _)| tile)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
