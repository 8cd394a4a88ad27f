//! Corridors and corridor routing
//!
//! Corridors run between the centers of two room connectors. Inside a sector
//! they join parallel connectors with a Z-shaped path and must not clip any
//! room; between grid-adjacent sectors they take an L-shaped path.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::layout::Layout;
use super::room::{ConnectorId, RoomConnector, RoomId};
use super::theme::Theme;
use crate::error::{ConfigError, Result};
use crate::geometry::Coord;

/// Index of a corridor in its `Layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorridorId(pub usize);

/// Router that produced a corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum CorridorKind {
    IntraSector,
    InterSector,
}

/// A path between two connectors, endpoints inclusive
#[derive(Debug, Clone)]
pub struct Corridor {
    pub start: ConnectorId,
    pub end: ConnectorId,
    points: Vec<Coord>,
    pub kind: CorridorKind,
    pub theme: Option<Arc<Theme>>,
}

impl Corridor {
    pub fn new(
        start: ConnectorId,
        end: ConnectorId,
        points: Vec<Coord>,
        kind: CorridorKind,
    ) -> Self {
        Self {
            start,
            end,
            points,
            kind,
            theme: None,
        }
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    /// Points strictly between the two endpoints
    pub fn interior(&self) -> &[Coord] {
        if self.points.len() <= 2 {
            &[]
        } else {
            &self.points[1..self.points.len() - 1]
        }
    }

    /// Rooms at the start and end
    pub fn rooms(&self) -> (RoomId, RoomId) {
        (self.start.room, self.end.room)
    }

    pub fn connects(&self, a: RoomId, b: RoomId) -> bool {
        let (s, e) = self.rooms();
        (s == a && e == b) || (s == b && e == a)
    }
}

/// Tracks which rooms are connected to each other
///
/// Uses equivalence classes: rooms in the same class are connected.
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    /// Each room's equivalence class
    classes: Vec<usize>,
}

impl ConnectivityTracker {
    /// Create a tracker where every room is its own class
    pub fn new(num_rooms: usize) -> Self {
        Self {
            classes: (0..num_rooms).collect(),
        }
    }

    /// Check if two rooms are in the same class
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        if a >= self.classes.len() || b >= self.classes.len() {
            return false;
        }
        self.classes[a] == self.classes[b]
    }

    /// Merge the classes of two rooms
    pub fn merge(&mut self, a: usize, b: usize) {
        if a >= self.classes.len() || b >= self.classes.len() {
            return;
        }

        let old_class = self.classes[b];
        let new_class = self.classes[a];
        for class in &mut self.classes {
            if *class == old_class {
                *class = new_class;
            }
        }
    }
}

/// Append the straight run from the last point of `path` to `to`
fn walk_to(path: &mut Vec<Coord>, to: Coord) {
    let Some(&from) = path.last() else {
        path.push(to);
        return;
    };
    let step = Coord::new((to.x - from.x).signum(), (to.y - from.y).signum());
    debug_assert!(step.x == 0 || step.y == 0, "diagonal run {from} -> {to}");

    let mut at = from;
    while at != to {
        at = at + step;
        path.push(at);
    }
}

/// Z-shaped path between two parallel connectors
///
/// Vertical edges (East/West sides) leave along x to the midway column, cross
/// over in y, then finish along x. Horizontal edges do the same with the axes
/// swapped.
pub fn z_path(from: &RoomConnector, to: &RoomConnector) -> Vec<Coord> {
    let (a, b) = (from.center(), to.center());
    let mut path = vec![a];
    if from.side.is_vertical() {
        let mid_x = (a.x + b.x) / 2;
        walk_to(&mut path, Coord::new(mid_x, a.y));
        walk_to(&mut path, Coord::new(mid_x, b.y));
    } else {
        let mid_y = (a.y + b.y) / 2;
        walk_to(&mut path, Coord::new(a.x, mid_y));
        walk_to(&mut path, Coord::new(b.x, mid_y));
    }
    walk_to(&mut path, b);
    path
}

/// L-shaped path leaving `from` along its edge normal axis
pub fn l_path(from: &RoomConnector, to: &RoomConnector) -> Vec<Coord> {
    let (a, b) = (from.center(), to.center());
    let mut path = vec![a];
    if from.side.is_vertical() {
        walk_to(&mut path, Coord::new(b.x, a.y));
    } else {
        walk_to(&mut path, Coord::new(a.x, b.y));
    }
    walk_to(&mut path, b);
    path
}

/// Every connector pair between two rooms, nearest centers first
///
/// The sort is stable, so ties keep connector order.
pub fn connector_pairs(
    layout: &Layout,
    a: RoomId,
    b: RoomId,
    parallel_only: bool,
) -> Vec<(ConnectorId, ConnectorId, i64)> {
    let (room_a, room_b) = (layout.room(a), layout.room(b));
    let mut pairs = Vec::new();
    for (i, ca) in room_a.connectors().iter().enumerate() {
        for (j, cb) in room_b.connectors().iter().enumerate() {
            if parallel_only && !ca.edge.is_parallel(&cb.edge) {
                continue;
            }
            pairs.push((
                ConnectorId { room: a, index: i },
                ConnectorId { room: b, index: j },
                ca.center().dist2(cb.center()),
            ));
        }
    }
    pairs.sort_by_key(|&(_, _, d)| d);
    pairs
}

/// Unordered room pair key
fn pair_key(a: RoomId, b: RoomId) -> (RoomId, RoomId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Connect rooms of grid-adjacent sectors
///
/// Sectors are laid out row-major on a square grid of `sectors_per_side`.
/// For each ordered pair of neighbouring sectors every connector pair between
/// their rooms is considered nearest first, and accepted while that room pair
/// holds fewer than `n_best` corridors over the whole run.
pub fn route_sectors(
    layout: &mut Layout,
    sectors_per_side: usize,
    n_best: usize,
) -> Result<Vec<CorridorId>> {
    let count = layout.sectors().len();
    if sectors_per_side * sectors_per_side != count {
        return Err(ConfigError::SectorGrid(format!(
            "{count} sectors do not form a {sectors_per_side}x{sectors_per_side} grid"
        ))
        .into());
    }

    let grid = |i: usize| Coord::new((i % sectors_per_side) as i32, (i / sectors_per_side) as i32);
    let mut per_pair: HashMap<(RoomId, RoomId), usize> = HashMap::new();
    let mut added = Vec::new();

    for s in 0..count {
        for t in 0..count {
            if grid(s).manhattan(grid(t)) != 1 {
                continue;
            }

            let mut candidates = Vec::new();
            for &ra in &layout.sectors()[s].rooms {
                for &rb in &layout.sectors()[t].rooms {
                    candidates.extend(connector_pairs(layout, ra, rb, false));
                }
            }
            candidates.sort_by_key(|&(_, _, d)| d);

            let before = added.len();
            for (ca, cb, _) in candidates {
                let used = per_pair.entry(pair_key(ca.room, cb.room)).or_insert(0);
                if *used >= n_best {
                    continue;
                }
                *used += 1;

                let (Some(from), Some(to)) = (layout.connector(ca), layout.connector(cb)) else {
                    continue;
                };
                let corridor = Corridor::new(ca, cb, l_path(from, to), CorridorKind::InterSector);
                added.push(layout.add_corridor(corridor));
            }
            let routed = added.len() - before;
            tracing::debug!(from = s, to = t, corridors = routed, "routed sector pair");
        }
    }

    tracing::info!(corridors = added.len(), sectors = count, "inter-sector routing done");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::rect::{Edge, Rect, Side};
    use crate::dungeon::sector::tile_sectors;
    use crate::error::GenError;
    use crate::rng::GameRng;

    fn connector(side: Side, a: (i32, i32), b: (i32, i32)) -> RoomConnector {
        RoomConnector::new(Edge::new(a.into(), b.into()), side)
    }

    fn assert_manhattan(path: &[Coord]) {
        for w in path.windows(2) {
            assert_eq!(w[0].manhattan(w[1]), 1, "{} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_tracker_merge() {
        let mut tracker = ConnectivityTracker::new(4);
        assert!(!tracker.are_connected(0, 1));
        tracker.merge(0, 1);
        tracker.merge(2, 3);
        assert!(tracker.are_connected(1, 0));
        assert!(!tracker.are_connected(1, 2));
        tracker.merge(1, 3);
        assert!(tracker.are_connected(0, 2));
        assert!(!tracker.are_connected(0, 9));
    }

    #[test]
    fn test_z_path_vertical_edges() {
        // east wall of a room at x 0..6, west wall of a room at x 12..18
        let from = connector(Side::East, (6, 0), (6, 6));
        let to = connector(Side::West, (12, 12), (12, 18));
        let path = z_path(&from, &to);

        assert_eq!(path.first(), Some(&Coord::new(5, 3)));
        assert_eq!(path.last(), Some(&Coord::new(12, 15)));
        assert_eq!(path[1], Coord::new(6, 3), "leaves along the normal");
        assert_manhattan(&path);
        assert!(path.contains(&Coord::new(8, 3)));
        assert!(path.contains(&Coord::new(8, 15)));
    }

    #[test]
    fn test_z_path_horizontal_edges() {
        let from = connector(Side::South, (0, 6), (6, 6));
        let to = connector(Side::North, (0, 12), (6, 12));
        let path = z_path(&from, &to);
        assert_eq!(path.first(), Some(&Coord::new(3, 5)));
        assert_eq!(path.last(), Some(&Coord::new(3, 12)));
        assert!(path.iter().all(|p| p.x == 3));
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn test_l_path_follows_start_normal() {
        let from = connector(Side::North, (0, 10), (6, 10));
        let to = connector(Side::West, (20, 0), (20, 4));
        let path = l_path(&from, &to);
        assert_eq!(path[1], Coord::new(3, 9));
        assert_eq!(path.last(), Some(&Coord::new(20, 2)));
        assert_manhattan(&path);
        // the corner sits on the start column
        assert!(path.contains(&Coord::new(3, 2)));
    }

    #[test]
    fn test_corridor_interior() {
        let start = ConnectorId { room: RoomId(0), index: 0 };
        let end = ConnectorId { room: RoomId(1), index: 2 };
        let points = vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)];
        let corridor = Corridor::new(start, end, points, CorridorKind::IntraSector);
        assert_eq!(corridor.interior(), &[Coord::new(1, 0)]);
        assert!(corridor.connects(RoomId(1), RoomId(0)));
        assert!(!corridor.connects(RoomId(1), RoomId(2)));

        let adjacent = vec![Coord::new(0, 0), Coord::new(1, 0)];
        let touching = Corridor::new(start, end, adjacent, CorridorKind::InterSector);
        assert!(touching.interior().is_empty());
    }

    fn tiled(seed: u64, per_side: usize) -> Layout {
        let mut layout = Layout::new();
        let side = 24 * per_side as i32;
        let map = Rect::new(0, 0, side, side);
        let mut rng = GameRng::new(seed);
        tile_sectors(&mut layout, map, per_side, &Theme::default(), 1, &mut rng).unwrap();
        layout
    }

    #[test]
    fn test_inter_sector_cap_holds_across_both_directions() {
        let grid = |s: usize| Coord::new((s % 3) as i32, (s / 3) as i32);
        for n_best in [1, 2] {
            for seed in 0..20 {
                let mut layout = tiled(seed, 3);
                let added = route_sectors(&mut layout, 3, n_best).unwrap();

                let mut per_pair: HashMap<(RoomId, RoomId), usize> = HashMap::new();
                for &id in &added {
                    let corridor = layout.corridor(id);
                    assert_eq!(corridor.kind, CorridorKind::InterSector);
                    let (a, b) = corridor.rooms();
                    let (sa, sb) = (layout.room(a).sector, layout.room(b).sector);
                    let apart = grid(sa).manhattan(grid(sb));
                    assert_eq!(apart, 1, "sectors {sa} and {sb} are not neighbours");
                    *per_pair.entry(pair_key(a, b)).or_insert(0) += 1;
                }

                // every room pair across neighbouring sectors has far more than 2 connector pairs
                let mut expected = 0;
                for s in 0..9 {
                    for t in (s + 1)..9 {
                        if grid(s).manhattan(grid(t)) == 1 {
                            let sectors = layout.sectors();
                            expected += sectors[s].rooms.len() * sectors[t].rooms.len();
                        }
                    }
                }
                assert_eq!(per_pair.len(), expected, "seed {seed}");
                assert!(per_pair.values().all(|&n| n == n_best), "seed {seed}, cap {n_best}");
            }
        }
    }

    #[test]
    fn test_route_sectors_needs_square_grid() {
        let mut layout = tiled(1, 2);
        let result = route_sectors(&mut layout, 3, 1);
        assert!(matches!(result, Err(GenError::Config(ConfigError::SectorGrid(_)))));
        let inter = layout.corridors().filter(|(_, c)| c.kind == CorridorKind::InterSector);
        assert_eq!(inter.count(), 0);
    }
}
