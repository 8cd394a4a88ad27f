//! Rooms and their boundary connectors
//!
//! A room is the union of one or more sector cells. Its connectors are the
//! lattice edges that occur exactly once across those cells, i.e. the outer
//! boundary. Each connector can be joined by a corridor, merged with a
//! touching connector of another room, or hidden as a secret passage.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::rect::{Edge, Rect, Side};
use super::theme::Theme;
use crate::geometry::Coord;

/// Index of a room in its `Layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub usize);

/// Handle to one connector of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId {
    pub room: RoomId,
    pub index: usize,
}

bitflags! {
    /// Connector state set by the marking passes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ConnectorFlags: u8 {
        /// Endpoint of some corridor
        const USED = 0x01;
        /// Drawn as solid wall, passable in play
        const HIDDEN = 0x02;
        /// Merged with a touching connector of another room
        const SHARED = 0x04;
    }
}

impl Serialize for ConnectorFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConnectorFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(ConnectorFlags::from_bits_truncate(bits))
    }
}

/// A boundary edge of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConnector {
    pub edge: Edge,
    /// Which side of the owning room this edge bounds
    pub side: Side,
    pub flags: ConnectorFlags,
}

impl RoomConnector {
    pub fn new(edge: Edge, side: Side) -> Self {
        Self {
            edge,
            side,
            flags: ConnectorFlags::empty(),
        }
    }

    /// The room's own wall tile at the middle of the edge
    pub fn center(&self) -> Coord {
        let mid = self.edge.midpoint();
        match self.side {
            Side::South => mid + Coord::new(0, -1),
            Side::East => mid + Coord::new(-1, 0),
            Side::North | Side::West => mid,
        }
    }

    /// First tile outside the room in front of `center`
    pub fn outside(&self) -> Coord {
        self.center() + self.side.normal()
    }

    /// Wall tiles running along the inside of the edge
    pub fn wall_tiles(&self) -> Vec<Coord> {
        let (a, b) = self.edge.endpoints();
        match self.side {
            Side::North => (a.x..b.x).map(|x| Coord::new(x, a.y)).collect(),
            Side::South => (a.x..b.x).map(|x| Coord::new(x, a.y - 1)).collect(),
            Side::West => (a.y..b.y).map(|y| Coord::new(a.x, y)).collect(),
            Side::East => (a.y..b.y).map(|y| Coord::new(a.x - 1, y)).collect(),
        }
    }

    pub fn is_used(&self) -> bool {
        self.flags.contains(ConnectorFlags::USED)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ConnectorFlags::HIDDEN)
    }

    pub fn is_shared(&self) -> bool {
        self.flags.contains(ConnectorFlags::SHARED)
    }
}

/// Gameplay flavour of a room, drawn from the room-kind pool
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    #[default]
    Ordinary,
    /// Floor partly under water
    Flooded,
    /// Floor broken by holes
    Pit,
    /// Reachable only through secret connectors
    Vault,
}

impl RoomKind {
    /// Special rooms keep their own theme when the level theme is applied
    pub fn is_special(self) -> bool {
        !matches!(self, RoomKind::Ordinary)
    }
}

/// A room made of one or more cardinally adjacent cells
///
/// Rooms are identified by their `RoomId`; two rooms with identical geometry
/// are still different rooms, so `Room` has no equality.
#[derive(Debug, Clone)]
pub struct Room {
    rects: Vec<Rect>,
    bounds: Rect,
    connectors: Vec<RoomConnector>,
    /// Sector the room was carved from
    pub sector: usize,
    pub kind: RoomKind,
    pub theme: Option<Arc<Theme>>,
}

impl Room {
    /// Create an empty room for the given sector
    pub fn new(sector: usize) -> Self {
        Self {
            rects: Vec::new(),
            bounds: Rect::new(0, 0, 0, 0),
            connectors: Vec::new(),
            sector,
            kind: RoomKind::Ordinary,
            theme: None,
        }
    }

    /// Add a cell, then recompute bounds and boundary connectors
    pub fn add_rect(&mut self, rect: Rect) {
        self.bounds = if self.rects.is_empty() {
            rect
        } else {
            self.bounds.union(&rect)
        };
        self.rects.push(rect);
        self.connectors = Self::boundary_connectors(&self.rects);
    }

    /// Edges occurring exactly once across all rects, in rect order
    fn boundary_connectors(rects: &[Rect]) -> Vec<RoomConnector> {
        let mut counts: HashMap<Edge, u32> = HashMap::new();
        for rect in rects {
            for (edge, _) in rect.edges() {
                *counts.entry(edge).or_insert(0) += 1;
            }
        }

        rects
            .iter()
            .flat_map(|r| r.edges())
            .filter(|(edge, _)| counts.get(edge) == Some(&1))
            .map(|(edge, side)| RoomConnector::new(edge, side))
            .collect()
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Bounding position of all cells
    pub fn position(&self) -> Coord {
        self.bounds.pos
    }

    /// Bounding size of all cells
    pub fn size(&self) -> Coord {
        self.bounds.size
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn connectors(&self) -> &[RoomConnector] {
        &self.connectors
    }

    pub fn connector(&self, index: usize) -> Option<&RoomConnector> {
        self.connectors.get(index)
    }

    pub fn connector_mut(&mut self, index: usize) -> Option<&mut RoomConnector> {
        self.connectors.get_mut(index)
    }

    /// Whether the tile lies in any of the room's cells
    pub fn contains(&self, c: Coord) -> bool {
        self.rects.iter().any(|r| r.contains(c))
    }

    /// All tiles of the room, cell by cell
    pub fn tiles(&self) -> impl Iterator<Item = Coord> + '_ {
        self.rects.iter().flat_map(|r| r.tiles())
    }

    /// Tiles strictly inside the walls
    pub fn interior_tiles(&self) -> Vec<Coord> {
        let walls: Vec<Coord> = self.connectors.iter().flat_map(|c| c.wall_tiles()).collect();
        self.tiles().filter(|t| !walls.contains(t)).collect()
    }

    pub fn area(&self) -> i32 {
        self.rects.iter().map(Rect::area).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn l_shaped_room() -> Room {
        let mut room = Room::new(0);
        room.add_rect(Rect::new(0, 0, 6, 6));
        room.add_rect(Rect::new(6, 0, 6, 6));
        room.add_rect(Rect::new(0, 6, 6, 6));
        room
    }

    #[test]
    fn test_single_cell_has_four_connectors() {
        let mut room = Room::new(0);
        room.add_rect(Rect::new(6, 6, 6, 6));
        assert_eq!(room.connectors().len(), 4);
        assert_eq!(room.position(), Coord::new(6, 6));
        assert_eq!(room.size(), Coord::new(6, 6));
    }

    #[test]
    fn test_inner_edges_cancel() {
        let room = l_shaped_room();
        // 3 cells * 4 edges - 2 shared pairs
        assert_eq!(room.connectors().len(), 8);
        assert_eq!(room.bounds(), Rect::new(0, 0, 12, 12));

        let inner = Edge::new(Coord::new(6, 0), Coord::new(6, 6));
        assert!(room.connectors().iter().all(|c| c.edge != inner));
    }

    #[test]
    fn test_connectors_are_unique() {
        let room = l_shaped_room();
        let edges: HashSet<Edge> = room.connectors().iter().map(|c| c.edge).collect();
        assert_eq!(edges.len(), room.connectors().len());
    }

    #[test]
    fn test_center_is_own_wall_tile() {
        let mut room = Room::new(0);
        room.add_rect(Rect::new(6, 6, 6, 6));
        for connector in room.connectors() {
            assert!(room.contains(connector.center()), "{:?}", connector.side);
            assert!(!room.contains(connector.outside()), "{:?}", connector.side);
            assert!(connector.wall_tiles().contains(&connector.center()));
        }
    }

    #[test]
    fn test_interior_excludes_walls() {
        let mut room = Room::new(0);
        room.add_rect(Rect::new(0, 0, 6, 5));
        let interior = room.interior_tiles();
        assert_eq!(interior.len(), 4 * 3);
        assert!(!interior.contains(&Coord::new(0, 0)));
        assert!(interior.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn test_room_kind_special() {
        assert!(!RoomKind::Ordinary.is_special());
        assert!(RoomKind::Flooded.is_special());
        assert!(RoomKind::Vault.is_special());
    }
}
