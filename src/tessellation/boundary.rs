use crate::tessellation::TileConditionMap;
use bevy::{
    math::{DVec2, I64Vec2},
    utils::HashMap,
};
use itertools::Either;
use std::collections::BTreeSet;

/// The bounding box of all requested tiles in the finest grid.
///
/// Output vertices are normalized against it, so that the meshes of all tiles
/// compose a single continuous surface in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AreaOfInterest {
    pub min: I64Vec2,
    pub max: I64Vec2,
}

impl AreaOfInterest {
    pub fn size(&self) -> I64Vec2 {
        self.max - self.min
    }

    /// Maps a finest grid position into the unit box of the area.
    pub fn normalize(&self, position: DVec2) -> DVec2 {
        (position - self.min.as_dvec2()) / self.size().as_dvec2()
    }
}

/// The corners of all requested tiles, expressed in the integer grid of the finest zoom level.
///
/// A coarse tile splits each of its edges at every corner of a finer tile touching it,
/// which keeps neighbouring meshes free of T-junctions.
#[derive(Clone, Debug)]
pub struct BoundaryVertexSet {
    finest_zoom: u32,
    /// The y positions of all vertices, grouped by their x position.
    columns: HashMap<i64, BTreeSet<i64>>,
    /// The x positions of all vertices, grouped by their y position.
    rows: HashMap<i64, BTreeSet<i64>>,
    area: Option<AreaOfInterest>,
}

impl BoundaryVertexSet {
    pub fn new(finest_zoom: u32) -> Self {
        Self {
            finest_zoom,
            columns: HashMap::default(),
            rows: HashMap::default(),
            area: None,
        }
    }

    /// Collects the four corners of every textured tile of the map.
    pub fn from_conditions(conditions: &TileConditionMap) -> Self {
        let mut vertices = Self::new(conditions.max_zoom());

        for tile in conditions.textured_tiles() {
            let (min, max) = tile.grid_bounds(vertices.finest_zoom);

            vertices.insert(min);
            vertices.insert(I64Vec2::new(max.x, min.y));
            vertices.insert(I64Vec2::new(min.x, max.y));
            vertices.insert(max);
        }

        vertices
    }

    pub fn insert(&mut self, vertex: I64Vec2) {
        self.columns.entry(vertex.x).or_default().insert(vertex.y);
        self.rows.entry(vertex.y).or_default().insert(vertex.x);

        self.area = Some(match self.area {
            Some(area) => AreaOfInterest {
                min: area.min.min(vertex),
                max: area.max.max(vertex),
            },
            None => AreaOfInterest {
                min: vertex,
                max: vertex,
            },
        });
    }

    pub fn contains(&self, vertex: I64Vec2) -> bool {
        self.columns
            .get(&vertex.x)
            .is_some_and(|column| column.contains(&vertex.y))
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.area.is_none()
    }

    pub fn finest_zoom(&self) -> u32 {
        self.finest_zoom
    }

    /// The bounding box of all vertices, `None` while the set is empty.
    pub fn area_of_interest(&self) -> Option<AreaOfInterest> {
        self.area
    }

    /// The start of the vertical edge at `x` from `from_y` towards `to_y`, followed by
    /// all vertices strictly between both ends, ordered by their distance to the start.
    pub fn vertical_edge(&self, x: i64, from_y: i64, to_y: i64) -> Vec<I64Vec2> {
        edge(self.columns.get(&x), from_y, to_y)
            .map(|y| I64Vec2::new(x, y))
            .collect()
    }

    /// The start of the horizontal edge at `y` from `from_x` towards `to_x`, followed by
    /// all vertices strictly between both ends, ordered by their distance to the start.
    pub fn horizontal_edge(&self, y: i64, from_x: i64, to_x: i64) -> Vec<I64Vec2> {
        edge(self.rows.get(&y), from_x, to_x)
            .map(|x| I64Vec2::new(x, y))
            .collect()
    }
}

fn edge(line: Option<&BTreeSet<i64>>, from: i64, to: i64) -> impl Iterator<Item = i64> + '_ {
    let (low, high) = (from.min(to), from.max(to));

    let between = line
        .filter(|_| high - low > 1)
        .map(|line| line.range(low + 1..high).copied())
        .into_iter()
        .flatten();

    let between = if from <= to {
        Either::Left(between)
    } else {
        Either::Right(between.rev())
    };

    std::iter::once(from).chain(between)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TileIndex;

    #[test]
    fn collects_tile_corners() {
        let conditions = TileConditionMap::build([TileIndex::new(1, 0, 0), TileIndex::new(2, 2, 0)]);
        let vertices = BoundaryVertexSet::from_conditions(&conditions);

        assert_eq!(vertices.finest_zoom(), 3);
        assert_eq!(vertices.len(), 7);
        assert!(vertices.contains(I64Vec2::new(4, 2)));
        assert!(vertices.contains(I64Vec2::new(6, 2)));
        assert!(!vertices.contains(I64Vec2::new(2, 2)));

        let area = vertices.area_of_interest().unwrap();
        assert_eq!(area.min, I64Vec2::new(0, 0));
        assert_eq!(area.max, I64Vec2::new(6, 4));
    }

    #[test]
    fn edges_are_ordered_from_their_start() {
        let mut vertices = BoundaryVertexSet::new(4);
        for y in [0, 2, 3, 8, 16] {
            vertices.insert(I64Vec2::new(4, y));
        }
        vertices.insert(I64Vec2::new(5, 4));

        assert_eq!(
            vertices.vertical_edge(4, 0, 8),
            vec![
                I64Vec2::new(4, 0),
                I64Vec2::new(4, 2),
                I64Vec2::new(4, 3)
            ]
        );
        assert_eq!(
            vertices.vertical_edge(4, 8, 0),
            vec![
                I64Vec2::new(4, 8),
                I64Vec2::new(4, 3),
                I64Vec2::new(4, 2)
            ]
        );
        assert_eq!(
            vertices.horizontal_edge(4, 8, 0),
            vec![I64Vec2::new(8, 4), I64Vec2::new(5, 4)]
        );
        assert_eq!(vertices.vertical_edge(7, 0, 8), vec![I64Vec2::new(7, 0)]);
    }

    #[test]
    fn normalizes_into_unit_box() {
        let area = AreaOfInterest {
            min: I64Vec2::new(4, 0),
            max: I64Vec2::new(8, 2),
        };

        assert_eq!(area.normalize(DVec2::new(4.0, 0.0)), DVec2::ZERO);
        assert_eq!(area.normalize(DVec2::new(8.0, 2.0)), DVec2::ONE);
        assert_eq!(area.normalize(DVec2::new(6.0, 1.0)), DVec2::splat(0.5));
    }
}
