//! Sector tiling: cell selection, room grouping and intra-sector corridors
//!
//! A sector is split into a 4x4 grid. A handful of cells are selected so that
//! no selected cell is diagonal to one selected before it; cardinally adjacent
//! selections merge into one room, and the rooms are then joined by corridors.

use serde::{Deserialize, Serialize};

use super::corridor::{
    ConnectivityTracker, Corridor, CorridorId, CorridorKind, connector_pairs, z_path,
};
use super::layout::Layout;
use super::rect::Rect;
use super::room::{Room, RoomId};
use super::theme::Theme;
use crate::error::{ConfigError, GenError, Result};
use crate::geometry::Coord;
use crate::rng::GameRng;

/// Cells per sector side
pub const GRID_SIDE: usize = 4;
/// Cells per sector
pub const CELL_COUNT: usize = GRID_SIDE * GRID_SIDE;

/// Index of a sector in its `Layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(pub usize);

/// One tiled region of the map
#[derive(Debug, Clone)]
pub struct Sector {
    pub rect: Rect,
    cells: Vec<Rect>,
    mask: [bool; CELL_COUNT],
    selection_order: Vec<usize>,
    pub rooms: Vec<RoomId>,
    pub corridors: Vec<CorridorId>,
}

impl Sector {
    /// Grid position of cell `i`
    pub fn cell_coord(i: usize) -> Coord {
        Coord::new((i % GRID_SIDE) as i32, (i / GRID_SIDE) as i32)
    }

    pub fn cells(&self) -> &[Rect] {
        &self.cells
    }

    pub fn mask(&self) -> &[bool; CELL_COUNT] {
        &self.mask
    }

    /// Selected cells in the order they were picked
    pub fn selection_order(&self) -> &[usize] {
        &self.selection_order
    }

    pub fn selected_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Pick `wanted` cells, each not diagonal to any earlier pick
fn select_cells(wanted: usize, rng: &mut GameRng) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = Vec::with_capacity(wanted);
    while order.len() < wanted {
        let legal: Vec<usize> = (0..CELL_COUNT)
            .filter(|i| !order.contains(i))
            .filter(|&i| {
                let c = Sector::cell_coord(i);
                order.iter().all(|&s| !c.is_diagonal_to(Sector::cell_coord(s)))
            })
            .collect();

        let Some(&pick) = rng.choose(&legal) else {
            return Err(GenError::NoLegalCell {
                selected: order.len(),
                wanted,
            });
        };
        order.push(pick);
    }
    Ok(order)
}

/// Cluster selected cells by cardinal adjacency, visiting them in index order
///
/// Each cell joins the first group holding a cardinal neighbour.
fn group_cells(mask: &[bool; CELL_COUNT]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for cell in (0..CELL_COUNT).filter(|&i| mask[i]) {
        let c = Sector::cell_coord(cell);
        let home = groups
            .iter_mut()
            .find(|g| g.iter().any(|&other| c.is_cardinal_to(Sector::cell_coord(other))));
        match home {
            Some(group) => group.push(cell),
            None => groups.push(vec![cell]),
        }
    }
    groups
}

/// Tile one sector and add its rooms and corridors to the layout
pub fn tile_sector(
    layout: &mut Layout,
    rect: Rect,
    theme: &Theme,
    n_best: usize,
    rng: &mut GameRng,
) -> Result<SectorId> {
    let wanted = theme.room_squares.sample(rng);
    if !(3..=5).contains(&wanted) {
        return Err(ConfigError::RoomSquaresOutOfRange(wanted).into());
    }

    let cells = rect.subdivide(GRID_SIDE as i32, GRID_SIDE as i32);
    let selection_order = select_cells(wanted as usize, rng)?;
    let mut mask = [false; CELL_COUNT];
    for &i in &selection_order {
        mask[i] = true;
    }

    let sector_index = layout.sectors().len();
    let mut rooms = Vec::new();
    for group in group_cells(&mask) {
        let mut room = Room::new(sector_index);
        for cell in group {
            room.add_rect(cells[cell]);
        }
        rooms.push(layout.add_room(room));
    }

    let id = layout.add_sector(Sector {
        rect,
        cells,
        mask,
        selection_order,
        rooms,
        corridors: Vec::new(),
    });

    let corridors = connect_rooms(layout, id, n_best);
    tracing::debug!(
        sector = id.0,
        squares = wanted,
        rooms = layout.sector(id).rooms.len(),
        corridors = corridors.len(),
        "tiled sector"
    );
    layout.sector_mut(id).corridors = corridors;
    Ok(id)
}

/// Tile a `per_side` x `per_side` grid of sectors over `map`, row-major
pub fn tile_sectors(
    layout: &mut Layout,
    map: Rect,
    per_side: usize,
    theme: &Theme,
    n_best: usize,
    rng: &mut GameRng,
) -> Result<Vec<SectorId>> {
    map.subdivide(per_side as i32, per_side as i32)
        .into_iter()
        .map(|rect| tile_sector(layout, rect, theme, n_best, rng))
        .collect()
}

/// Join the rooms of one sector with Z-shaped corridors
///
/// Room pairs are visited nearest first and skipped once already in one
/// component. For each pair the `n_best` closest parallel connector pairs are
/// tried; a corridor is kept only if no interior point lies in a room.
fn connect_rooms(layout: &mut Layout, sector: SectorId, n_best: usize) -> Vec<CorridorId> {
    let rooms = layout.sector(sector).rooms.clone();

    let mut pairs = Vec::new();
    for i in 0..rooms.len() {
        for j in i + 1..rooms.len() {
            let d = layout.room(rooms[i]).position().dist2(layout.room(rooms[j]).position());
            pairs.push((i, j, d));
        }
    }
    pairs.sort_by_key(|&(_, _, d)| d);

    let mut tracker = ConnectivityTracker::new(rooms.len());
    let mut accepted = Vec::new();
    for (i, j, _) in pairs {
        if tracker.are_connected(i, j) {
            continue;
        }

        let mut joined = false;
        let nearest = connector_pairs(layout, rooms[i], rooms[j], true);
        for (ca, cb, _) in nearest.into_iter().take(n_best) {
            let (Some(from), Some(to)) = (layout.connector(ca), layout.connector(cb)) else {
                continue;
            };
            let corridor = Corridor::new(ca, cb, z_path(from, to), CorridorKind::IntraSector);
            let clear = corridor
                .interior()
                .iter()
                .all(|p| rooms.iter().all(|&r| !layout.room(r).contains(*p)));
            if clear {
                accepted.push(layout.add_corridor(corridor));
                joined = true;
            }
        }

        if joined {
            tracker.merge(i, j);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::theme::Distribution;

    fn theme_with_squares(n: u32) -> Theme {
        Theme {
            room_squares: Distribution::constant(n),
            ..Theme::default()
        }
    }

    #[test]
    fn test_selection_is_order_legal() {
        for seed in 0..50 {
            let mut rng = GameRng::new(seed);
            let order = select_cells(5, &mut rng).unwrap();
            assert_eq!(order.len(), 5);
            for (k, &cell) in order.iter().enumerate() {
                let c = Sector::cell_coord(cell);
                assert!(order[..k].iter().all(|&e| !c.is_diagonal_to(Sector::cell_coord(e))));
                assert!(!order[..k].contains(&cell));
            }
        }
    }

    #[test]
    fn test_selection_runs_out_of_cells() {
        let mut rng = GameRng::new(1);
        assert!(matches!(
            select_cells(CELL_COUNT, &mut rng),
            Err(GenError::NoLegalCell { wanted: CELL_COUNT, .. })
        ));
    }

    #[test]
    fn test_grouping_by_cardinal_adjacency() {
        let mut mask = [false; CELL_COUNT];
        for i in [0, 1, 2, 10] {
            mask[i] = true;
        }
        assert_eq!(group_cells(&mask), vec![vec![0, 1, 2], vec![10]]);

        let mut mask = [false; CELL_COUNT];
        for i in [1, 5, 9, 3] {
            mask[i] = true;
        }
        assert_eq!(group_cells(&mask), vec![vec![1, 5, 9], vec![3]]);
    }

    #[test]
    fn test_tile_sector_builds_rooms() {
        let mut layout = Layout::new();
        let mut rng = GameRng::new(12);
        let theme = theme_with_squares(4);
        let id = tile_sector(&mut layout, Rect::new(0, 0, 25, 25), &theme, 1, &mut rng).unwrap();

        let sector = layout.sector(id);
        assert_eq!(sector.selected_count(), 4);
        assert_eq!(sector.selection_order().len(), 4);
        assert!(!sector.rooms.is_empty());

        let cells_in_rooms: usize =
            sector.rooms.iter().map(|&r| layout.room(r).rects().len()).sum();
        assert_eq!(cells_in_rooms, 4);
        for &r in &sector.rooms {
            assert_eq!(layout.room(r).sector, id.0);
            assert!(sector.rect.contains_rect(&layout.room(r).bounds()));
        }
    }

    #[test]
    fn test_intra_corridors_avoid_rooms() {
        for seed in 0..40 {
            let mut layout = Layout::new();
            let mut rng = GameRng::new(seed);
            let theme = theme_with_squares(5);
            let id =
                tile_sector(&mut layout, Rect::new(0, 0, 24, 24), &theme, 2, &mut rng).unwrap();

            let sector = layout.sector(id);
            for &c in &sector.corridors {
                let corridor = layout.corridor(c);
                assert_eq!(corridor.kind, CorridorKind::IntraSector);
                for p in corridor.interior() {
                    assert!(
                        layout.rooms().all(|(_, room)| !room.contains(*p)),
                        "seed {seed}: {p} inside a room"
                    );
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_squares_rejected() {
        let mut layout = Layout::new();
        let mut rng = GameRng::new(0);
        let theme = theme_with_squares(7);
        let err = tile_sector(&mut layout, Rect::new(0, 0, 24, 24), &theme, 1, &mut rng);
        assert!(matches!(err, Err(GenError::Config(ConfigError::RoomSquaresOutOfRange(7)))));
    }
}
