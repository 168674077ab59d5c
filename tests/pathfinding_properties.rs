//! Pathfinder behavior on hand-built and generated maps

use proptest::prelude::*;

use hearthwood::core::types::{GridPos, Vec2};
use hearthwood::spatial::pathfinding::find_path;
use hearthwood::spatial::tile_map::{TileKind, TileMap};

fn cell(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32, y as f32)
}

#[test]
fn test_straight_line_on_empty_grid() {
    let map = TileMap::new(10, 10);
    let path = find_path(&map, cell(0, 0), cell(3, 0));
    assert_eq!(path, vec![GridPos::new(1, 0), GridPos::new(2, 0), GridPos::new(3, 0)]);
}

#[test]
fn test_path_walks_through_door() {
    let map = TileMap::from_ascii(&[
        "..........",
        ".wwwwwwww.",
        ".w______w.",
        ".w______w.",
        ".wwwDwwww.",
        "..........",
    ])
    .unwrap();
    let path = find_path(&map, cell(4, 5), cell(5, 2));
    assert!(!path.is_empty());
    assert!(path.contains(&GridPos::new(4, 4)));
    assert_eq!(path.last(), Some(&GridPos::new(5, 2)));
    assert!(path.iter().all(|p| map.is_walkable(*p)));
}

#[test]
fn test_enclosed_beyond_ring_is_unreachable() {
    // 9x9 block of stone with the target at its centre
    let mut map = TileMap::new(20, 20);
    for y in 6..=14 {
        for x in 6..=14 {
            map.set(GridPos::new(x, y), TileKind::WallStone);
        }
    }
    assert!(find_path(&map, cell(0, 0), cell(10, 10)).is_empty());
}

proptest! {
    #[test]
    fn prop_open_grid_paths_are_manhattan_optimal(
        sx in 0i32..30, sy in 0i32..30, tx in 0i32..30, ty in 0i32..30,
    ) {
        let map = TileMap::new(30, 30);
        let start = GridPos::new(sx, sy);
        let target = GridPos::new(tx, ty);
        let path = find_path(&map, start.to_vec2(), target.to_vec2());

        if start.to_vec2().distance(&target.to_vec2()) < 2.0 {
            prop_assert_eq!(path, vec![target]);
        } else {
            prop_assert_eq!(path.len() as u32, start.manhattan(&target));
            let mut previous = start;
            for step in &path {
                prop_assert_eq!(previous.manhattan(step), 1);
                prop_assert!(step.manhattan(&target) < previous.manhattan(&target));
                previous = *step;
            }
            prop_assert_eq!(previous, target);
        }
    }

    #[test]
    fn prop_enclosed_targets_are_unreachable(tx in 8i32..12, ty in 8i32..12) {
        let mut map = TileMap::new(20, 20);
        for y in (ty - 4)..=(ty + 4) {
            for x in (tx - 4)..=(tx + 4) {
                map.set(GridPos::new(x, y), TileKind::Water);
            }
        }
        prop_assert!(find_path(&map, cell(0, 0), cell(tx, ty)).is_empty());
    }
}
