//! Themes: tile styles and generation tunables for a branch of the level
//!
//! A theme is an immutable value shared by `Arc`. The level applies one base
//! theme across its room graph and special rooms override it.

use serde::{Deserialize, Serialize};

use super::cell::CellType;
use super::room::RoomKind;
use crate::error::ConfigError;
use crate::geometry::Coord;
use crate::pool::weighted_index;
use crate::rng::GameRng;

/// Discrete probability distribution over counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// (value, weight) pairs
    pub outcomes: Vec<(u32, u32)>,
}

impl Distribution {
    pub fn new(outcomes: Vec<(u32, u32)>) -> Self {
        Self { outcomes }
    }

    /// Always yields `value`
    pub fn constant(value: u32) -> Self {
        Self::new(vec![(value, 1)])
    }

    /// Equal weight for every value in `lo..=hi`
    pub fn uniform(lo: u32, hi: u32) -> Self {
        Self::new((lo..=hi).map(|v| (v, 1)).collect())
    }

    pub fn sample(&self, rng: &mut GameRng) -> u32 {
        let weights: Vec<u32> = self.outcomes.iter().map(|&(_, w)| w).collect();
        weighted_index(&weights, rng).map_or(0, |i| self.outcomes[i].0)
    }

    /// Values that can actually be drawn
    pub fn support(&self) -> impl Iterator<Item = u32> + '_ {
        self.outcomes.iter().filter(|(_, w)| *w > 0).map(|&(v, _)| v)
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.support().next().is_none() {
            return Err(ConfigError::EmptyDistribution(name));
        }
        Ok(())
    }
}

/// Coordinate to tile function
///
/// Styles are pure functions of the position so repainting a tile is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum TileStyle {
    Solid { tile: CellType },
    Checker { even: CellType, odd: CellType },
    /// `alt` on roughly one tile in `one_in`, picked by a coordinate hash
    Scatter {
        base: CellType,
        alt: CellType,
        one_in: u32,
        salt: u32,
    },
}

impl TileStyle {
    pub const fn solid(tile: CellType) -> Self {
        TileStyle::Solid { tile }
    }

    pub fn tile_at(&self, at: Coord) -> CellType {
        match *self {
            TileStyle::Solid { tile } => tile,
            TileStyle::Checker { even, odd } => {
                if (at.x + at.y).rem_euclid(2) == 0 { even } else { odd }
            }
            TileStyle::Scatter { base, alt, one_in, salt } => {
                if one_in > 0 && coord_hash(at, salt) % one_in == 0 { alt } else { base }
            }
        }
    }
}

fn coord_hash(at: Coord, salt: u32) -> u32 {
    let mut h = (at.x as u32).wrapping_mul(0x9E37_79B1)
        ^ (at.y as u32).wrapping_mul(0x85EB_CA77)
        ^ salt;
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h
}

/// Post-hoc tile rewrite: tiles matching `from` are repainted with `to`
/// with chance 1/`one_in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub from: CellType,
    pub to: TileStyle,
    #[serde(default = "Rule::always")]
    pub one_in: u32,
}

impl Rule {
    pub fn new(from: CellType, to: TileStyle, one_in: u32) -> Self {
        Self { from, to, one_in }
    }

    fn always() -> u32 {
        1
    }

    pub fn matches(&self, tile: CellType) -> bool {
        tile == self.from
    }

    pub fn apply(&self, tile: CellType, at: Coord, rng: &mut GameRng) -> CellType {
        if self.matches(tile) && rng.one_in(self.one_in.max(1)) {
            self.to.tile_at(at)
        } else {
            tile
        }
    }
}

/// Tile styles and tunables for a branch of the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub name: String,
    pub wall_tile: TileStyle,
    pub room_tile: TileStyle,
    pub corridor_tile: TileStyle,
    pub water_tile: TileStyle,
    pub hole_tile: TileStyle,
    /// Feature name requested for each corridor door
    pub door_feature: String,
    pub rules: Vec<Rule>,
    pub corridor_thickness: Distribution,
    /// Selected cells per sector, each outcome in 3..=5
    pub room_squares: Distribution,
    pub secret_corridors: Distribution,
    pub door_chance: f64,
    /// Resample the thickness at every corridor point
    pub uneven_corridors: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "stone".to_string(),
            wall_tile: TileStyle::solid(CellType::Wall),
            room_tile: TileStyle::solid(CellType::Floor),
            corridor_tile: TileStyle::solid(CellType::Corridor),
            water_tile: TileStyle::solid(CellType::Water),
            hole_tile: TileStyle::solid(CellType::Hole),
            door_feature: "door".to_string(),
            rules: Vec::new(),
            corridor_thickness: Distribution::new(vec![(1, 6), (2, 1)]),
            room_squares: Distribution::uniform(3, 5),
            secret_corridors: Distribution::new(vec![(0, 2), (1, 2), (2, 1)]),
            door_chance: 0.6,
            uneven_corridors: false,
        }
    }
}

impl Theme {
    /// Theme for a special room kind, derived from this base theme
    ///
    /// Ordinary rooms get an unchanged copy.
    pub fn variant(&self, kind: RoomKind) -> Theme {
        let mut theme = self.clone();
        match kind {
            RoomKind::Ordinary => {}
            RoomKind::Flooded => {
                theme.name = format!("{}/flooded", self.name);
                theme.rules.push(Rule::new(CellType::Floor, self.water_tile.clone(), 3));
            }
            RoomKind::Pit => {
                theme.name = format!("{}/pit", self.name);
                theme.rules.push(Rule::new(CellType::Floor, self.hole_tile.clone(), 6));
            }
            RoomKind::Vault => {
                theme.name = format!("{}/vault", self.name);
                theme.door_chance = 0.0;
            }
        }
        theme
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.corridor_thickness.validate("corridor_thickness")?;
        self.room_squares.validate("room_squares")?;
        self.secret_corridors.validate("secret_corridors")?;

        if let Some(bad) = self.room_squares.support().find(|v| !(3..=5).contains(v)) {
            return Err(ConfigError::RoomSquaresOutOfRange(bad));
        }
        if let Some(bad) = self.corridor_thickness.support().find(|&v| v == 0) {
            return Err(ConfigError::OutOfRange {
                name: "corridor_thickness",
                value: bad.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.door_chance) {
            return Err(ConfigError::OutOfRange {
                name: "door_chance",
                value: self.door_chance.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_default_theme_is_valid() {
        let base = Theme::default();
        base.validate().unwrap();
        for kind in RoomKind::iter() {
            base.variant(kind).validate().unwrap();
        }
    }

    #[test]
    fn test_variants_keep_base_tunables() {
        let base = Theme {
            door_chance: 0.9,
            ..Theme::default()
        };
        let flooded = base.variant(RoomKind::Flooded);
        assert_eq!(flooded.door_chance, 0.9);
        assert_eq!(flooded.rules.len(), 1);
        assert_eq!(base.variant(RoomKind::Pit).rules.len(), 1);
        assert_eq!(base.variant(RoomKind::Vault).door_chance, 0.0);
        assert_eq!(base.variant(RoomKind::Ordinary), base);
    }

    #[test]
    fn test_room_squares_out_of_range() {
        let theme = Theme {
            room_squares: Distribution::new(vec![(4, 1), (6, 1)]),
            ..Theme::default()
        };
        assert!(matches!(theme.validate(), Err(ConfigError::RoomSquaresOutOfRange(6))));

        // zero-weight outcomes are never drawn, so they are not checked
        let theme = Theme {
            room_squares: Distribution::new(vec![(4, 1), (9, 0)]),
            ..Theme::default()
        };
        assert!(theme.validate().is_ok());
    }

    #[test]
    fn test_empty_distribution_rejected() {
        let theme = Theme {
            secret_corridors: Distribution::new(vec![(1, 0)]),
            ..Theme::default()
        };
        assert!(matches!(
            theme.validate(),
            Err(ConfigError::EmptyDistribution("secret_corridors"))
        ));
    }

    #[test]
    fn test_distribution_sample_in_support() {
        let dist = Distribution::new(vec![(3, 1), (5, 2), (9, 0)]);
        let mut rng = GameRng::new(5);
        for _ in 0..200 {
            let v = dist.sample(&mut rng);
            assert!(v == 3 || v == 5);
        }
        assert_eq!(Distribution::constant(4).sample(&mut rng), 4);
    }

    #[test]
    fn test_styles_are_position_stable() {
        let style = TileStyle::Scatter {
            base: CellType::Floor,
            alt: CellType::Water,
            one_in: 3,
            salt: 1,
        };
        let at = Coord::new(12, 7);
        assert_eq!(style.tile_at(at), style.tile_at(at));

        let checker = TileStyle::Checker {
            even: CellType::Floor,
            odd: CellType::Water,
        };
        assert_eq!(checker.tile_at(Coord::new(0, 0)), CellType::Floor);
        assert_eq!(checker.tile_at(Coord::new(1, 0)), CellType::Water);
        assert_eq!(checker.tile_at(Coord::new(-1, 0)), CellType::Water);
    }

    #[test]
    fn test_theme_from_json_uses_defaults() {
        let json = r#"{
            "name": "cave",
            "room_tile": {"style": "solid", "tile": "water"},
            "door_chance": 0.25
        }"#;
        let theme: Theme = serde_json::from_str(json).unwrap();
        assert_eq!(theme.name, "cave");
        assert_eq!(theme.room_tile.tile_at(Coord::ZERO), CellType::Water);
        assert_eq!(theme.door_chance, 0.25);
        assert_eq!(theme.room_squares, Distribution::uniform(3, 5));
    }

    #[test]
    fn test_rule_applies_only_to_matching_tiles() {
        let rule = Rule::new(CellType::Floor, TileStyle::solid(CellType::Hole), 1);
        let mut rng = GameRng::new(1);
        assert_eq!(rule.apply(CellType::Floor, Coord::ZERO, &mut rng), CellType::Hole);
        assert_eq!(rule.apply(CellType::Wall, Coord::ZERO, &mut rng), CellType::Wall);

        let checker = Rule::new(
            CellType::Floor,
            TileStyle::Checker {
                even: CellType::Water,
                odd: CellType::Hole,
            },
            1,
        );
        assert_eq!(checker.apply(CellType::Floor, Coord::new(1, 0), &mut rng), CellType::Hole);
    }

    #[test]
    fn test_variants_paint_with_themed_water_and_holes() {
        let base = Theme {
            water_tile: TileStyle::solid(CellType::Hole),
            hole_tile: TileStyle::solid(CellType::Water),
            ..Theme::default()
        };
        let mut rng = GameRng::new(4);
        let flooded = base.variant(RoomKind::Flooded);
        let pit = base.variant(RoomKind::Pit);
        let repaint = |theme: &Theme, rng: &mut GameRng| {
            let mut out = Vec::new();
            for x in 0..120 {
                let at = Coord::new(x, 0);
                out.push(theme.rules.iter().fold(CellType::Floor, |t, r| r.apply(t, at, rng)));
            }
            out
        };

        let wet = repaint(&flooded, &mut rng);
        assert!(wet.contains(&CellType::Hole));
        assert!(!wet.contains(&CellType::Water));

        let broken = repaint(&pit, &mut rng);
        assert!(broken.contains(&CellType::Water));
        assert!(!broken.contains(&CellType::Hole));
    }
}
