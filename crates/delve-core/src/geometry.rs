//! Integer grid coordinates

use core::fmt;
use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point on the tile grid, also used as a width/height pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance
    pub fn dist2(self, other: Coord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Manhattan distance
    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Product of the components, when used as a size
    pub fn area(self) -> i32 {
        self.x * self.y
    }

    /// Whether `other` is exactly one diagonal step away
    pub fn is_diagonal_to(self, other: Coord) -> bool {
        (self.x - other.x).abs() == 1 && (self.y - other.y).abs() == 1
    }

    /// Whether `other` is exactly one cardinal step away
    pub fn is_cardinal_to(self, other: Coord) -> bool {
        self.dist2(other) == 1
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
