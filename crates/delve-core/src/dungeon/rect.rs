//! Rectangles and lattice edges
//!
//! A `Rect` covers the half-open tile range `pos .. pos + size`. Its sides are
//! described on the lattice between tiles, so two rectangles that touch share
//! an identical `Edge` value.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::geometry::Coord;

/// Which side of a rectangle an edge bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    /// Outward unit step
    pub const fn normal(self) -> Coord {
        match self {
            Side::North => Coord::new(0, -1),
            Side::South => Coord::new(0, 1),
            Side::East => Coord::new(1, 0),
            Side::West => Coord::new(-1, 0),
        }
    }

    /// East and West sides run along vertical lattice lines
    pub const fn is_vertical(self) -> bool {
        matches!(self, Side::East | Side::West)
    }
}

/// An axis-aligned segment on the tile lattice, endpoints normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    a: Coord,
    b: Coord,
}

impl Edge {
    /// Create an edge; endpoint order does not matter
    pub fn new(p: Coord, q: Coord) -> Self {
        if p <= q { Self { a: p, b: q } } else { Self { a: q, b: p } }
    }

    pub fn endpoints(&self) -> (Coord, Coord) {
        (self.a, self.b)
    }

    pub fn is_horizontal(&self) -> bool {
        self.a.y == self.b.y
    }

    pub fn is_vertical(&self) -> bool {
        self.a.x == self.b.x
    }

    pub fn len(&self) -> i32 {
        self.a.manhattan(self.b)
    }

    pub fn is_empty(&self) -> bool {
        self.a == self.b
    }

    /// Lattice midpoint, rounded towards the first endpoint
    pub fn midpoint(&self) -> Coord {
        Coord::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    pub fn is_parallel(&self, other: &Edge) -> bool {
        (self.is_horizontal() && other.is_horizontal())
            || (self.is_vertical() && other.is_vertical())
    }

    /// Collinear with an overlap of positive length
    pub fn touches(&self, other: &Edge) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.is_horizontal() && other.is_horizontal() {
            self.a.y == other.a.y && self.a.x.max(other.a.x) < self.b.x.min(other.b.x)
        } else if self.is_vertical() && other.is_vertical() {
            self.a.x == other.a.x && self.a.y.max(other.a.y) < self.b.y.min(other.b.y)
        } else {
            false
        }
    }
}

/// Axis-aligned integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Coord,
    pub size: Coord,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            pos: Coord::new(x, y),
            size: Coord::new(width, height),
        }
    }

    pub fn from_pos_size(pos: Coord, size: Coord) -> Self {
        Self { pos, size }
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// One past the bottom-right tile
    pub fn end(&self) -> Coord {
        self.pos + self.size
    }

    pub fn area(&self) -> i32 {
        self.size.area()
    }

    /// Whether the tile lies inside (half-open on the far sides)
    pub fn contains(&self, c: Coord) -> bool {
        c.x >= self.pos.x
            && c.x < self.pos.x + self.size.x
            && c.y >= self.pos.y
            && c.y < self.pos.y + self.size.y
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.pos.x >= self.pos.x
            && other.pos.y >= self.pos.y
            && other.end().x <= self.end().x
            && other.end().y <= self.end().y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.pos.x < other.end().x
            && other.pos.x < self.end().x
            && self.pos.y < other.end().y
            && other.pos.y < self.end().y
    }

    /// Rough center tile
    pub fn center(&self) -> Coord {
        Coord::new(self.pos.x + self.size.x / 2, self.pos.y + self.size.y / 2)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let lo = Coord::new(self.pos.x.min(other.pos.x), self.pos.y.min(other.pos.y));
        let hi = Coord::new(self.end().x.max(other.end().x), self.end().y.max(other.end().y));
        Rect::from_pos_size(lo, hi - lo)
    }

    /// Split into a `cols` x `rows` grid, row-major
    ///
    /// Boundaries use integer division so the cells tile the parent exactly;
    /// cells may differ in size by one tile when the size does not divide.
    pub fn subdivide(&self, cols: i32, rows: i32) -> Vec<Rect> {
        let mut cells = Vec::with_capacity((cols.max(0) * rows.max(0)) as usize);
        for row in 0..rows {
            let y0 = self.pos.y + row * self.size.y / rows;
            let y1 = self.pos.y + (row + 1) * self.size.y / rows;
            for col in 0..cols {
                let x0 = self.pos.x + col * self.size.x / cols;
                let x1 = self.pos.x + (col + 1) * self.size.x / cols;
                cells.push(Rect::new(x0, y0, x1 - x0, y1 - y0));
            }
        }
        cells
    }

    /// The four sides on the lattice: North, South, West, East
    pub fn edges(&self) -> [(Edge, Side); 4] {
        let Coord { x, y } = self.pos;
        let Coord { x: ex, y: ey } = self.end();
        [
            (Edge::new(Coord::new(x, y), Coord::new(ex, y)), Side::North),
            (Edge::new(Coord::new(x, ey), Coord::new(ex, ey)), Side::South),
            (Edge::new(Coord::new(x, y), Coord::new(x, ey)), Side::West),
            (Edge::new(Coord::new(ex, y), Coord::new(ex, ey)), Side::East),
        ]
    }

    /// Every tile inside the rectangle, row-major
    pub fn tiles(&self) -> impl Iterator<Item = Coord> + '_ {
        (self.pos.y..self.end().y)
            .flat_map(move |y| (self.pos.x..self.end().x).map(move |x| Coord::new(x, y)))
    }

    /// Tiles on the rectangle's own border ring
    pub fn is_border_tile(&self, c: Coord) -> bool {
        self.contains(c)
            && (c.x == self.pos.x
                || c.y == self.pos.y
                || c.x == self.end().x - 1
                || c.y == self.end().y - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(10, 20, 5, 4);
        assert!(r.contains(Coord::new(10, 20)));
        assert!(r.contains(Coord::new(14, 23)));
        assert!(!r.contains(Coord::new(15, 23)));
        assert!(!r.contains(Coord::new(14, 24)));
    }

    #[test]
    fn test_subdivide_tiles_exactly() {
        let sector = Rect::new(0, 0, 25, 25);
        let cells = sector.subdivide(4, 4);
        assert_eq!(cells.len(), 16);
        assert_eq!(cells.iter().map(Rect::area).sum::<i32>(), 625);
        assert_eq!(cells[0], Rect::new(0, 0, 6, 6));
        assert_eq!(cells[15].end(), Coord::new(25, 25));

        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_neighbouring_cells_share_edges() {
        let cells = Rect::new(0, 0, 25, 25).subdivide(4, 4);
        let east_of_first = cells[0].edges()[3].0;
        let west_of_second = cells[1].edges()[2].0;
        assert_eq!(east_of_first, west_of_second);

        let south_of_first = cells[0].edges()[1].0;
        let north_of_below = cells[4].edges()[0].0;
        assert_eq!(south_of_first, north_of_below);
    }

    #[test]
    fn test_edge_normalization() {
        let e1 = Edge::new(Coord::new(5, 0), Coord::new(0, 0));
        let e2 = Edge::new(Coord::new(0, 0), Coord::new(5, 0));
        assert_eq!(e1, e2);
        assert_eq!(e1.len(), 5);
        assert_eq!(e1.midpoint(), Coord::new(2, 0));
    }

    #[test]
    fn test_edge_touches() {
        let a = Edge::new(Coord::new(0, 6), Coord::new(6, 6));
        let b = Edge::new(Coord::new(3, 6), Coord::new(9, 6));
        let c = Edge::new(Coord::new(6, 6), Coord::new(9, 6));
        let d = Edge::new(Coord::new(0, 7), Coord::new(6, 7));
        let v = Edge::new(Coord::new(6, 0), Coord::new(6, 6));

        assert!(a.touches(&b));
        assert!(!a.touches(&c), "meeting at a point is not touching");
        assert!(!a.touches(&d));
        assert!(!a.touches(&v));
        assert!(a.is_parallel(&d));
        assert!(!a.is_parallel(&v));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0, 0, 6, 6);
        let b = Rect::new(6, 0, 6, 6);
        assert_eq!(a.union(&b), Rect::new(0, 0, 12, 6));
    }

    #[test]
    fn test_border_tiles() {
        let r = Rect::new(0, 0, 4, 3);
        assert_eq!(r.tiles().count(), 12);
        assert_eq!(r.tiles().filter(|c| r.is_border_tile(*c)).count(), 10);
    }
}
