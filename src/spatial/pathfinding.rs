//! A* pathfinding on zone tile maps
//!
//! Four-directional movement with unit step cost and a Manhattan heuristic.
//! Search is bounded by a fixed expansion budget so one call always fits in
//! a frame; an exhausted budget reads the same as "unreachable".
//!
//! Unreachable is not an error. Callers get an empty path and decide what to
//! do with it (the action executor abandons the move).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::core::types::{GridPos, Vec2};
use crate::spatial::tile_map::TileMap;

/// Maximum node expansions per search
pub const MAX_EXPANSIONS: usize = 500;

/// Largest ring searched around a blocked target
pub const MAX_RETARGET_RADIUS: i32 = 3;

/// Start/target closer than this skip the search entirely
pub const SHORT_CIRCUIT_DISTANCE: f32 = 2.0;

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    pos: GridPos,
    g_cost: u32,
    h_cost: u32,
}

impl PathNode {
    #[inline]
    fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; prefer nodes closer to the goal on ties
        other
            .f_cost()
            .cmp(&self.f_cost())
            .then_with(|| other.h_cost.cmp(&self.h_cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a walkable route from `start` to `target`.
///
/// The returned cells exclude the start cell and end at the (possibly
/// substituted) target. Empty means unreachable.
///
/// - Within `SHORT_CIRCUIT_DISTANCE` a walkable target cell is returned
///   directly.
/// - A blocked target is replaced by the first walkable cell on the nearest
///   ring around it, up to `MAX_RETARGET_RADIUS`.
pub fn find_path(map: &TileMap, start: Vec2, target: Vec2) -> Vec<GridPos> {
    if !within_reach(map, start) || !within_reach(map, target) {
        return Vec::new();
    }
    let start_cell = start.to_cell();
    let mut goal = target.to_cell();

    if start.distance(&target) < SHORT_CIRCUIT_DISTANCE && map.is_walkable(goal) {
        return vec![goal];
    }

    if !map.is_walkable(goal) {
        match nearest_walkable(map, goal) {
            Some(substitute) => {
                tracing::trace!(?goal, ?substitute, "Retargeted blocked destination");
                goal = substitute;
            }
            None => return Vec::new(),
        }
    }

    if start_cell == goal {
        return vec![goal];
    }

    search(map, start_cell, goal)
}

/// Finite and close enough to the map that a retarget ring could touch it
fn within_reach(map: &TileMap, point: Vec2) -> bool {
    let reach = MAX_RETARGET_RADIUS as f32 + 1.0;
    point.x.is_finite()
        && point.y.is_finite()
        && point.x > -reach
        && point.y > -reach
        && point.x < map.width() as f32 + reach
        && point.y < map.height() as f32 + reach
}

/// First walkable cell on the smallest ring around `center`.
///
/// Rings are scanned row by row (top to bottom, left to right), visiting only
/// the cells on the ring's edge.
pub fn nearest_walkable(map: &TileMap, center: GridPos) -> Option<GridPos> {
    for r in 1..=MAX_RETARGET_RADIUS {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let candidate = GridPos::new(center.x.saturating_add(dx), center.y.saturating_add(dy));
                if map.is_walkable(candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

fn search(map: &TileMap, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<GridPos, GridPos> = AHashMap::new();
    let mut g_scores: AHashMap<GridPos, u32> = AHashMap::new();
    let mut closed: AHashSet<GridPos> = AHashSet::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        pos: start,
        g_cost: 0,
        h_cost: start.manhattan(&goal),
    });

    let mut expansions = 0;
    while let Some(current) = open_set.pop() {
        // Stale entry left behind by a cheaper relaxation
        if !closed.insert(current.pos) {
            continue;
        }

        if current.pos == goal {
            return reconstruct_path(&came_from, current.pos);
        }

        expansions += 1;
        if expansions > MAX_EXPANSIONS {
            tracing::trace!(?start, ?goal, "Path search exceeded expansion budget");
            return Vec::new();
        }

        for neighbor in current.pos.neighbors() {
            if closed.contains(&neighbor) || !map.is_walkable(neighbor) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    pos: neighbor,
                    g_cost: tentative_g,
                    h_cost: neighbor.manhattan(&goal),
                });
            }
        }
    }

    Vec::new()
}

/// Walk `came_from` back to the start, which is left out of the result
fn reconstruct_path(came_from: &AHashMap<GridPos, GridPos>, mut current: GridPos) -> Vec<GridPos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.pop();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tile_map::TileKind;

    fn cells(points: &[(i32, i32)]) -> Vec<GridPos> {
        points.iter().map(|&(x, y)| GridPos::new(x, y)).collect()
    }

    #[test]
    fn test_straight_line() {
        let map = TileMap::new(10, 10);
        let path = find_path(&map, Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0));
        assert_eq!(path, cells(&[(1, 0), (2, 0), (3, 0)]));
    }

    #[test]
    fn test_short_circuit_returns_target_cell() {
        let map = TileMap::new(10, 10);
        let path = find_path(&map, Vec2::new(2.0, 2.0), Vec2::new(3.2, 2.9));
        assert_eq!(path, cells(&[(3, 3)]));
    }

    #[test]
    fn test_short_circuit_skipped_for_blocked_target() {
        let mut map = TileMap::new(10, 10);
        map.set(GridPos::new(3, 2), TileKind::Table);
        let path = find_path(&map, Vec2::new(2.0, 2.0), Vec2::new(3.0, 2.0));
        assert_eq!(path, cells(&[(2, 1)]));
    }

    #[test]
    fn test_path_around_wall() {
        let map = TileMap::from_ascii(&[
            ".....",
            "..#..",
            "..#..",
            "..#..",
            ".....",
        ])
        .unwrap();
        let path = find_path(&map, Vec2::new(0.0, 2.0), Vec2::new(4.0, 2.0));

        assert_eq!(path.last(), Some(&GridPos::new(4, 2)));
        assert!(path.iter().all(|c| map.is_walkable(*c)));
        // Detour over or under the wall: 4 across plus 2 up and 2 back down
        assert_eq!(path.len(), 8);
        // Each step moves exactly one tile
        let mut prev = GridPos::new(0, 2);
        for cell in &path {
            assert_eq!(prev.manhattan(cell), 1);
            prev = *cell;
        }
    }

    #[test]
    fn test_blocked_target_retargets_to_ring() {
        let mut map = TileMap::new(10, 10);
        map.set(GridPos::new(5, 5), TileKind::Table);
        let path = find_path(&map, Vec2::new(0.0, 5.0), Vec2::new(5.0, 5.0));
        // First walkable cell on ring 1, scanning top row left to right
        assert_eq!(path.last(), Some(&GridPos::new(4, 4)));
    }

    #[test]
    fn test_enclosed_target_unreachable() {
        let mut map = TileMap::new(12, 12);
        for y in 1..=9 {
            for x in 1..=9 {
                map.set(GridPos::new(x, y), TileKind::WallStone);
            }
        }
        let path = find_path(&map, Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_walled_off_region_unreachable() {
        let map = TileMap::from_ascii(&[
            "...#...",
            "...#...",
            "...#...",
        ])
        .unwrap();
        let path = find_path(&map, Vec2::new(0.0, 1.0), Vec2::new(6.0, 1.0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_expansion_budget_exceeded() {
        // Open 60x60 field with the target sealed in a pocket: the search
        // floods the field and gives up after the budget.
        let mut map = TileMap::new(60, 60);
        for (x, y) in [(49, 50), (51, 50), (50, 49), (50, 51)] {
            map.set(GridPos::new(x, y), TileKind::Fence);
        }
        let path = find_path(&map, Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_nearest_walkable_prefers_smaller_radius() {
        let mut map = TileMap::new(10, 10);
        for y in 4..=6 {
            for x in 4..=6 {
                map.set(GridPos::new(x, y), TileKind::Water);
            }
        }
        // Ring 1 fully blocked, ring 2 top-left corner is the first hit
        assert_eq!(nearest_walkable(&map, GridPos::new(5, 5)), Some(GridPos::new(3, 3)));
    }

    #[test]
    fn test_far_or_non_finite_target_unreachable() {
        let map = TileMap::new(10, 10);
        for target in [
            Vec2::new(1e12, 3.0),
            Vec2::new(-1e12, -1e12),
            Vec2::new(f32::NAN, 2.0),
            Vec2::new(2.0, f32::INFINITY),
        ] {
            assert!(find_path(&map, Vec2::new(1.0, 1.0), target).is_empty());
        }
        assert_eq!(nearest_walkable(&map, GridPos::new(i32::MAX, i32::MIN)), None);
    }

    #[test]
    fn test_off_map_target_out_of_bounds() {
        let map = TileMap::new(5, 5);
        // (9,9) is out of bounds, ring up to 3 reaches (6,6) at most: still off-map
        let path = find_path(&map, Vec2::new(0.0, 0.0), Vec2::new(9.0, 9.0));
        assert!(path.is_empty());
    }
}
