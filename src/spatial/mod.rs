//! Tile maps and pathfinding

pub mod grid;
pub mod pathfinding;
pub mod tile_map;

pub use grid::Grid;
pub use pathfinding::find_path;
pub use tile_map::{Classification, TileKind, TileMap, ZoneMaps};
