//! Tile classification per zone
//!
//! The simulation core only reads tiles. A `TileMap` answers "can an agent
//! stand here"; `ZoneMaps` keys one map per named zone.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{HearthError, Result};
use crate::core::types::{GridPos, ZoneId};
use crate::spatial::grid::Grid;

/// Tile kinds the village is built from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Grass,
    Dirt,
    Path,
    Floor,
    Sand,
    Crop,
    Door,
    WallWood,
    WallStone,
    Water,
    Fence,
    Table,
    Wardrobe,
    Bed,
    Anvil,
    Pew,
    CandleStand,
}

impl TileKind {
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            TileKind::WallWood
                | TileKind::WallStone
                | TileKind::Water
                | TileKind::Fence
                | TileKind::Table
                | TileKind::Wardrobe
                | TileKind::Bed
                | TileKind::Anvil
                | TileKind::Pew
                | TileKind::CandleStand
        )
    }

    /// ASCII legend used by `TileMap::from_ascii`
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Some(match glyph {
            '.' => TileKind::Grass,
            ',' => TileKind::Dirt,
            '=' => TileKind::Path,
            '_' => TileKind::Floor,
            ':' => TileKind::Sand,
            '"' => TileKind::Crop,
            'D' => TileKind::Door,
            'w' => TileKind::WallWood,
            '#' => TileKind::WallStone,
            '~' => TileKind::Water,
            'f' => TileKind::Fence,
            'T' => TileKind::Table,
            'W' => TileKind::Wardrobe,
            'B' => TileKind::Bed,
            'A' => TileKind::Anvil,
            'P' => TileKind::Pew,
            'C' => TileKind::CandleStand,
            _ => return None,
        })
    }
}

/// Result of asking whether a cell can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Walkable,
    Blocking,
    OutOfBounds,
}

impl Classification {
    #[inline]
    pub fn is_walkable(&self) -> bool {
        matches!(self, Classification::Walkable)
    }
}

#[derive(Debug, Clone)]
pub struct TileMap {
    tiles: Grid<TileKind>,
}

impl TileMap {
    /// Open map of grass
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            tiles: Grid::new(width, height),
        }
    }

    /// Build a map from rows of legend glyphs. All rows must share one width.
    pub fn from_ascii(rows: &[&str]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(HearthError::TileMap("map has no tiles".into()));
        }

        let mut map = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(HearthError::TileMap(format!(
                    "row {} has width {}, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            for (x, glyph) in row.chars().enumerate() {
                let kind = TileKind::from_glyph(glyph).ok_or_else(|| {
                    HearthError::TileMap(format!("unknown glyph '{}' at ({}, {})", glyph, x, y))
                })?;
                map.set(GridPos::new(x as i32, y as i32), kind);
            }
        }
        Ok(map)
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn get(&self, pos: GridPos) -> Option<TileKind> {
        self.tiles.get(pos).copied()
    }

    /// Tile mutation belongs between ticks
    pub fn set(&mut self, pos: GridPos, kind: TileKind) {
        self.tiles.set(pos, kind);
    }

    pub fn classify(&self, pos: GridPos) -> Classification {
        match self.tiles.get(pos) {
            None => Classification::OutOfBounds,
            Some(kind) if kind.is_blocking() => Classification::Blocking,
            Some(_) => Classification::Walkable,
        }
    }

    #[inline]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.classify(pos).is_walkable()
    }
}

/// One tile map per named zone
#[derive(Debug, Clone, Default)]
pub struct ZoneMaps {
    zones: AHashMap<ZoneId, TileMap>,
}

impl ZoneMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: ZoneId, map: TileMap) {
        self.zones.insert(zone, map);
    }

    pub fn get(&self, zone: &ZoneId) -> Option<&TileMap> {
        self.zones.get(zone)
    }

    pub fn get_mut(&mut self, zone: &ZoneId) -> Option<&mut TileMap> {
        self.zones.get_mut(zone)
    }

    /// Unknown zones classify every cell as out of bounds
    pub fn classify(&self, zone: &ZoneId, pos: GridPos) -> Classification {
        self.zones
            .get(zone)
            .map(|map| map.classify(pos))
            .unwrap_or(Classification::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_set() {
        assert!(TileKind::WallWood.is_blocking());
        assert!(TileKind::CandleStand.is_blocking());
        assert!(TileKind::Water.is_blocking());
        assert!(!TileKind::Grass.is_blocking());
        assert!(!TileKind::Door.is_blocking());
        assert!(!TileKind::Crop.is_blocking());
    }

    #[test]
    fn test_from_ascii_and_classify() {
        let map = TileMap::from_ascii(&["..#", ".~.", "..."]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        assert_eq!(map.classify(GridPos::new(0, 0)), Classification::Walkable);
        assert_eq!(map.classify(GridPos::new(2, 0)), Classification::Blocking);
        assert_eq!(map.classify(GridPos::new(1, 1)), Classification::Blocking);
        assert_eq!(map.classify(GridPos::new(3, 0)), Classification::OutOfBounds);
        assert_eq!(map.classify(GridPos::new(-1, 2)), Classification::OutOfBounds);
    }

    #[test]
    fn test_from_ascii_rejects_ragged_rows() {
        let result = TileMap::from_ascii(&["...", ".."]);
        assert!(matches!(result, Err(HearthError::TileMap(_))));
    }

    #[test]
    fn test_from_ascii_rejects_unknown_glyph() {
        let result = TileMap::from_ascii(&["..?"]);
        assert!(matches!(result, Err(HearthError::TileMap(_))));
    }

    #[test]
    fn test_unknown_zone_is_out_of_bounds() {
        let mut zones = ZoneMaps::new();
        zones.insert(ZoneId::new("world"), TileMap::new(5, 5));
        assert!(zones.classify(&ZoneId::new("world"), GridPos::new(1, 1)).is_walkable());
        assert_eq!(
            zones.classify(&ZoneId::new("cellar"), GridPos::new(1, 1)),
            Classification::OutOfBounds
        );
    }
}
