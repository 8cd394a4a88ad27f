//! Level generation driver
//!
//! Main entry point is `LevelGenerator::generate`, which:
//! 1. Tiles the sector grid into rooms and intra-sector corridors
//! 2. Routes corridors between grid-adjacent sectors
//! 3. Marks shared, used and hidden connectors
//! 4. Builds the room graph and scores centrality from the root
//! 5. Assigns room kinds and themes
//! 6. Draws rooms, corridors and doors onto the canvas
//! 7. Applies theme rules and places the stairs

use std::collections::HashSet;
use std::sync::Arc;

use super::canvas::{Canvas, EntityFactory};
use super::cell::CellType;
use super::corridor::{CorridorId, route_sectors};
use super::graph::{NodeId, RoomGraph, ThemedItem};
use super::layout::Layout;
use super::marker::{MarkerReport, mark_connectors};
use super::rect::Rect;
use super::room::{ConnectorId, Room, RoomConnector, RoomId, RoomKind};
use super::sector::tile_sectors;
use super::theme::Theme;
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, GenError, Result};
use crate::geometry::Coord;
use crate::rng::GameRng;

/// A generated level
#[derive(Debug, Clone)]
pub struct Level {
    pub layout: Layout,
    pub graph: RoomGraph,
    /// Traversal root, holding the up stairs
    pub root: NodeId,
    /// Most central node, holding the down stairs
    pub anchor: NodeId,
    pub up_stairs: Coord,
    pub down_stairs: Coord,
    pub markers: MarkerReport,
}

/// Builds levels from a validated configuration
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: GeneratorConfig,
    theme: Arc<Theme>,
}

impl LevelGenerator {
    pub fn new(config: GeneratorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let theme = Arc::new(config.theme.clone());
        Ok(Self { config, theme })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one level onto `canvas`
    ///
    /// `on_room_drawn` runs once for every room, right after it is drawn.
    pub fn generate<F>(
        &self,
        canvas: &mut dyn Canvas,
        factory: &mut dyn EntityFactory,
        rng: &mut GameRng,
        mut on_room_drawn: F,
    ) -> Result<Level>
    where
        F: FnMut(RoomId, &Room, &mut dyn Canvas),
    {
        let map = Rect::new(0, 0, self.config.map_width, self.config.map_height);
        if !canvas.bounds().contains_rect(&map) {
            return Err(GenError::OutOfBounds(map.end() - Coord::new(1, 1)));
        }

        let side = self.config.sectors_per_side as usize;
        let mut layout = Layout::new();
        tile_sectors(&mut layout, map, side, &self.theme, self.config.intra_sector_best, rng)?;
        route_sectors(&mut layout, side, self.config.inter_sector_best)?;
        let markers = mark_connectors(&mut layout, &self.theme, rng);

        let mut graph = RoomGraph::build(&layout)?;
        let root_room = match layout.corridors().next() {
            Some((_, corridor)) => corridor.start.room,
            None if layout.room_count() > 0 => RoomId(0),
            None => return Err(GenError::Invariant("level has no rooms".to_string())),
        };
        let root = graph.node_for_room(root_room);
        graph.compute_centrality(root);
        let anchor = graph.most_central().unwrap_or(root);

        self.assign_kinds(&mut layout, rng)?;
        graph.set_theme(&mut layout, root, &self.theme, |item| match item {
            ThemedItem::Room(room) => !room.kind.is_special(),
            ThemedItem::Corridor(_) => true,
        });

        // rooms in traversal order, then the ones it never reached
        let mut room_order = Vec::with_capacity(layout.room_count());
        let mut corridor_order = Vec::with_capacity(layout.corridor_count());
        let mut seen_rooms = vec![false; layout.room_count()];
        for step in graph.traverse(root) {
            let room = graph.node(step.node).room;
            if !seen_rooms[room.0] {
                seen_rooms[room.0] = true;
                room_order.push(room);
            }
            corridor_order.extend(step.corridor);
        }
        let reached = room_order.len();
        room_order.extend(layout.rooms().map(|(id, _)| id).filter(|id| !seen_rooms[id.0]));
        let traversed: HashSet<CorridorId> = corridor_order.iter().copied().collect();
        let untraversed = layout.corridors().map(|(id, _)| id).filter(|id| !traversed.contains(id));
        corridor_order.extend(untraversed);
        if reached < room_order.len() {
            let unreached = room_order.len() - reached;
            tracing::warn!(unreached, "rooms not reachable from the root");
        }

        for &room in &room_order {
            self.draw_room(canvas, &layout, room)?;
            on_room_drawn(room, layout.room(room), &mut *canvas);
        }
        for &corridor in &corridor_order {
            self.draw_corridor(canvas, &layout, corridor, rng)?;
        }
        let mut doors_done = HashSet::new();
        for &corridor in &corridor_order {
            let c = layout.corridor(corridor);
            for end in [c.start, c.end] {
                if doors_done.insert(end) {
                    self.draw_door(canvas, factory, &layout, end, rng)?;
                }
            }
        }

        self.apply_rules(canvas, &layout, rng)?;

        let up_room = graph.node(root).room;
        let up_stairs =
            place_stairs(canvas, &layout, up_room, &room_order, CellType::UpStairs, rng)?;
        let down_room = graph.node(anchor).room;
        let down_stairs =
            place_stairs(canvas, &layout, down_room, &room_order, CellType::DownStairs, rng)?;

        tracing::info!(
            seed = rng.seed(),
            rooms = layout.room_count(),
            corridors = layout.corridor_count(),
            nodes = graph.len(),
            anchor = anchor.0,
            "level generated"
        );

        Ok(Level {
            layout,
            graph,
            root,
            anchor,
            up_stairs,
            down_stairs,
            markers,
        })
    }

    fn assign_kinds(&self, layout: &mut Layout, rng: &mut GameRng) -> Result<()> {
        let mut pool = self.config.room_kind_pool()?;
        let ids: Vec<RoomId> = layout.rooms().map(|(id, _)| id).collect();
        for id in ids {
            let kind = pool.next(rng).copied().unwrap_or_default();
            let room = layout.room_mut(id);
            room.kind = kind;
            if kind.is_special() {
                room.theme = Some(Arc::new(self.theme.variant(kind)));
                tracing::debug!(room = id.0, kind = %kind, "special room");
            }
        }
        Ok(())
    }

    fn theme_for<'a>(&'a self, theme: Option<&'a Arc<Theme>>) -> &'a Theme {
        theme.unwrap_or(&self.theme).as_ref()
    }

    fn draw_room(&self, canvas: &mut dyn Canvas, layout: &Layout, id: RoomId) -> Result<()> {
        let room = layout.room(id);
        let theme = self.theme_for(room.theme.as_ref());
        let floor = |c: Coord| theme.room_tile.tile_at(c);
        let wall = |c: Coord| theme.wall_tile.tile_at(c);

        for at in room.interior_tiles() {
            canvas.draw(at, &floor)?;
        }
        for connector in room.connectors() {
            for at in connector.wall_tiles() {
                canvas.draw(at, &wall)?;
            }
        }
        for connector in room.connectors().iter().filter(|c| c.is_shared()) {
            for at in shared_openings(layout, id, connector) {
                canvas.draw(at, &floor)?;
            }
        }
        Ok(())
    }

    fn draw_corridor(
        &self,
        canvas: &mut dyn Canvas,
        layout: &Layout,
        id: CorridorId,
        rng: &mut GameRng,
    ) -> Result<()> {
        let corridor = layout.corridor(id);
        let theme = self.theme_for(corridor.theme.as_ref());
        let style = |c: Coord| theme.corridor_tile.tile_at(c);

        let mut thickness = theme.corridor_thickness.sample(rng).max(1) as i32;
        for &p in corridor.interior() {
            if theme.uneven_corridors {
                thickness = theme.corridor_thickness.sample(rng).max(1) as i32;
            }
            if matches!(canvas.tile(p), Some(CellType::Stone | CellType::Wall)) {
                canvas.draw(p, &style)?;
            }
            let off = (thickness - 1) / 2;
            for at in Rect::new(p.x - off, p.y - off, thickness, thickness).tiles() {
                if canvas.tile(at) == Some(CellType::Stone) {
                    canvas.draw(at, &style)?;
                }
            }
        }
        Ok(())
    }

    fn draw_door(
        &self,
        canvas: &mut dyn Canvas,
        factory: &mut dyn EntityFactory,
        layout: &Layout,
        end: ConnectorId,
        rng: &mut GameRng,
    ) -> Result<()> {
        let connector = layout.connector(end).ok_or_else(|| {
            GenError::Invariant(format!("corridor ends at missing connector {end:?}"))
        })?;
        let room = layout.room(end.room);
        let theme = self.theme_for(room.theme.as_ref());
        let at = connector.center();

        if connector.is_shared() {
            let floor = |c: Coord| theme.room_tile.tile_at(c);
            return canvas.draw(at, &floor);
        }
        if connector.is_hidden() || room.kind == RoomKind::Vault {
            return canvas.draw(at, &|_| CellType::SecretDoor);
        }
        if rng.chance(theme.door_chance) {
            canvas.draw(at, &|_| CellType::Door)?;
            canvas.try_add_feature(&theme.door_feature, &[at], factory)?;
            Ok(())
        } else {
            canvas.draw(at, &|_| CellType::Doorway)
        }
    }

    /// Rewrite room interiors and corridor paths with their theme's rules
    fn apply_rules(
        &self,
        canvas: &mut dyn Canvas,
        layout: &Layout,
        rng: &mut GameRng,
    ) -> Result<()> {
        let rooms = layout
            .rooms()
            .map(|(_, r)| (self.theme_for(r.theme.as_ref()), r.interior_tiles()));
        let corridors = layout
            .corridors()
            .map(|(_, c)| (self.theme_for(c.theme.as_ref()), c.interior().to_vec()));

        for (theme, tiles) in rooms.chain(corridors) {
            if theme.rules.is_empty() {
                continue;
            }
            for at in tiles {
                let Some(before) = canvas.tile(at) else { continue };
                let after = theme.rules.iter().fold(before, |tile, rule| rule.apply(tile, at, rng));
                if after != before {
                    canvas.draw(at, &|_| after)?;
                }
            }
        }
        Ok(())
    }
}

/// Wall tiles of a shared connector that face another room's interior
///
/// Corner tiles stay as walls on both sides.
fn shared_openings(layout: &Layout, id: RoomId, connector: &RoomConnector) -> Vec<Coord> {
    let own = layout.room(id);
    let along = if connector.side.is_vertical() { Coord::new(0, 1) } else { Coord::new(1, 0) };
    let normal = connector.side.normal();

    connector
        .wall_tiles()
        .into_iter()
        .filter(|&w| own.contains(w - along) && own.contains(w + along))
        .filter(|&w| {
            let across = w + normal;
            layout.rooms().any(|(other, room)| {
                other != id
                    && room.contains(across)
                    && room.contains(across - along)
                    && room.contains(across + along)
            })
        })
        .collect()
}

/// Put `tile` on a random free floor tile of `first`
///
/// A room without free floor falls through to the other rooms of `order`,
/// then to any free floor tile of the canvas.
fn place_stairs(
    canvas: &mut dyn Canvas,
    layout: &Layout,
    first: RoomId,
    order: &[RoomId],
    tile: CellType,
    rng: &mut GameRng,
) -> Result<Coord> {
    let empty_tiles = canvas.empty_tiles();
    let empty: HashSet<Coord> = empty_tiles.iter().copied().collect();
    let free_in = |room: RoomId| -> Vec<Coord> {
        layout
            .room(room)
            .interior_tiles()
            .into_iter()
            .filter(|t| empty.contains(t))
            .collect()
    };

    let mut candidates = Vec::new();
    let rooms = std::iter::once(first).chain(order.iter().copied().filter(|&r| r != first));
    for room in rooms {
        candidates = free_in(room);
        if !candidates.is_empty() {
            if room != first {
                tracing::debug!(
                    %tile,
                    wanted = first.0,
                    room = room.0,
                    "stairs moved to another room"
                );
            }
            break;
        }
    }
    if candidates.is_empty() {
        tracing::debug!(%tile, "no room has free floor, using any free tile");
        candidates = empty_tiles;
    }

    let Some(&at) = rng.choose(&candidates) else {
        return Err(GenError::NoPlacement(format!("{tile}: no free floor tile left")));
    };
    canvas.draw(at, &|_| tile)?;
    Ok(at)
}
