//! Tile kinds painted onto a canvas

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Terrain kind of a single tile
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum CellType {
    #[default]
    Stone = 0,
    Wall = 1,
    /// Passable, but drawn exactly like a wall
    SecretDoor = 2,
    Door = 3,
    Doorway = 4,
    Corridor = 5,
    Floor = 6,
    Water = 7,
    Hole = 8,
    UpStairs = 9,
    DownStairs = 10,
}

impl CellType {
    /// Check if this is passable (can walk through)
    pub const fn is_passable(&self) -> bool {
        matches!(
            self,
            CellType::Floor
                | CellType::Corridor
                | CellType::Door
                | CellType::Doorway
                | CellType::SecretDoor
                | CellType::UpStairs
                | CellType::DownStairs
        )
    }

    /// Floor-like tiles that can take an object or feature
    pub const fn is_open_floor(&self) -> bool {
        matches!(self, CellType::Floor)
    }

    /// Get the display character for this cell type
    pub const fn symbol(&self) -> char {
        match self {
            CellType::Stone => ' ',
            CellType::Wall => '#',
            CellType::SecretDoor => '#', // looks like wall
            CellType::Door => '+',
            CellType::Doorway => '.',
            CellType::Corridor => ',',
            CellType::Floor => '.',
            CellType::Water => '~',
            CellType::Hole => 'O',
            CellType::UpStairs => '<',
            CellType::DownStairs => '>',
        }
    }
}
