//! The demo village: one 50x50 zone and its five residents

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{Vec2, ZoneId};
use crate::entity::agent::{Agent, Personality};
use crate::spatial::tile_map::{TileMap, ZoneMaps};

pub const WORLD_ZONE: &str = "world";
pub const VILLAGE_SIZE: usize = 50;

struct Canvas(Vec<Vec<char>>);

impl Canvas {
    fn new(size: usize) -> Self {
        Self(vec![vec!['.'; size]; size])
    }

    fn put(&mut self, x: usize, y: usize, glyph: char) {
        if let Some(cell) = self.0.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = glyph;
        }
    }

    fn fill(&mut self, (x0, y0): (usize, usize), (x1, y1): (usize, usize), glyph: char) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put(x, y, glyph);
            }
        }
    }

    /// Walled box with a floor inside and one door in the wall
    fn building(&mut self, min: (usize, usize), max: (usize, usize), wall: char, door: (usize, usize)) {
        self.fill(min, max, wall);
        self.fill((min.0 + 1, min.1 + 1), (max.0 - 1, max.1 - 1), '_');
        self.put(door.0, door.1, 'D');
    }

    fn rows(&self) -> Vec<String> {
        self.0.iter().map(|row| row.iter().collect()).collect()
    }
}

/// ASCII rows of the village, in the `TileKind::from_glyph` legend
pub fn village_rows() -> Vec<String> {
    let mut c = Canvas::new(VILLAGE_SIZE);

    // Main roads
    c.fill((2, 25), (47, 25), '=');
    c.fill((25, 5), (25, 45), '=');

    // Castle with pews in the hall
    c.building((34, 12), (42, 20), '#', (38, 20));
    c.fill((36, 13), (40, 13), 'P');

    // Church
    c.building((8, 13), (14, 19), 'w', (11, 19));
    c.fill((9, 15), (10, 15), 'P');
    c.fill((12, 15), (13, 15), 'P');
    c.put(11, 14, 'C');

    // Bakery, entered from the road
    c.building((27, 20), (31, 23), 'w', (28, 23));
    c.put(30, 21, 'T');

    // Home
    c.building((19, 26), (23, 30), 'w', (23, 27));
    c.put(20, 29, 'B');
    c.put(22, 29, 'W');

    // Tavern
    c.building((29, 29), (34, 32), 'w', (30, 29));
    c.fill((31, 30), (32, 31), 'T');

    // Market square and forge
    c.fill((30, 33), (34, 36), ':');
    c.fill((35, 33), (38, 35), ',');
    c.put(37, 34, 'A');

    // Farm: fenced crop fields either side of the road
    c.fill((7, 20), (7, 24), 'f');
    c.fill((7, 26), (7, 29), 'f');
    c.fill((8, 21), (16, 23), '"');
    c.fill((8, 24), (16, 24), ',');
    c.fill((8, 26), (16, 28), '"');

    // Mill race and pond
    c.fill((2, 26), (4, 31), '~');
    c.fill((40, 38), (45, 42), '~');

    // Guard tower
    c.fill((18, 36), (20, 39), '#');

    c.rows()
}

pub fn village_map() -> Result<TileMap> {
    let rows = village_rows();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    TileMap::from_ascii(&refs)
}

/// Zone set holding only the village
pub fn village_zones() -> Result<ZoneMaps> {
    let mut zones = ZoneMaps::new();
    zones.insert(ZoneId::new(WORLD_ZONE), village_map()?);
    Ok(zones)
}

/// (name, role, start, traits, background, goal)
type Resident = (&'static str, &'static str, (f32, f32), [&'static str; 3], &'static str, &'static str);

const RESIDENTS: [Resident; 5] = [
    (
        "Bob",
        "Farmer",
        (12.0, 25.0),
        ["Hardworking", "Simple", "Superstitious"],
        "Has worked this land for 40 years. Distrusts magic.",
        "To have a bountiful harvest and pay his taxes.",
    ),
    (
        "Alice",
        "Baker",
        (28.0, 25.0),
        ["Cheerful", "Gossip", "Generous"],
        "Knows everyone's secrets because everyone buys her bread.",
        "To bake the perfect cake for the King one day.",
    ),
    (
        "Lord Edmund",
        "Noble",
        (38.0, 18.0),
        ["Arrogant", "Educated", "Anxious"],
        "Inherited a crumbling estate. Worried about peasant revolts.",
        "To restore his family's wealth and status.",
    ),
    (
        "Guard Tom",
        "Guard",
        (22.0, 38.0),
        ["Loyal", "Lazy", "Hungry"],
        "Former soldier who took a quiet village job.",
        "To get through the shift without trouble and find a snack.",
    ),
    (
        "Merchant Jane",
        "Merchant",
        (32.0, 33.0),
        ["Shrewd", "Charismatic", "Opportunist"],
        "Travels between cities. Sees value where others don't.",
        "To amass enough gold to buy a noble title.",
    ),
];

pub fn roster(config: &SimulationConfig) -> Vec<Agent> {
    RESIDENTS
        .iter()
        .map(|(name, role, (x, y), traits, background, goal)| {
            Agent::new(
                *name,
                *role,
                Personality::new(traits, background, goal),
                ZoneId::new(WORLD_ZONE),
                Vec2::new(*x, *y),
                config,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::planning::{DEFAULT_LOCATION, LOCATIONS};

    #[test]
    fn test_village_is_square() {
        let map = village_map().unwrap();
        assert_eq!(map.width(), VILLAGE_SIZE);
        assert_eq!(map.height(), VILLAGE_SIZE);
    }

    #[test]
    fn test_named_locations_are_walkable() {
        let map = village_map().unwrap();
        for (name, pos) in LOCATIONS {
            assert!(map.is_walkable(pos.to_cell()), "{} is blocked", name);
        }
        assert!(map.is_walkable(DEFAULT_LOCATION.to_cell()));
    }

    #[test]
    fn test_residents_start_on_walkable_tiles() {
        let map = village_map().unwrap();
        let agents = roster(&SimulationConfig::default());
        assert_eq!(agents.len(), 5);
        for agent in &agents {
            assert!(map.is_walkable(agent.position.to_cell()), "{} starts blocked", agent.name);
        }
        assert_eq!(agents[4].personality.traits_line(), "Shrewd, Charismatic, Opportunist");
    }
}
