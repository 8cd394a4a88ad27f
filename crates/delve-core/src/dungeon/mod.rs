//! Dungeon layout
//!
//! Contains rooms, corridors, sectors, the room graph and the level driver.

mod canvas;
mod cell;
mod corridor;
mod generation;
mod graph;
mod layout;
mod marker;
mod rect;
mod room;
mod sector;
mod theme;

pub use canvas::{Canvas, CountingFactory, EntityFactory, EntityHandle, GridCanvas, Placed, Styler};
pub use cell::CellType;
pub use corridor::{
    ConnectivityTracker, Corridor, CorridorId, CorridorKind, connector_pairs, l_path, route_sectors,
    z_path,
};
pub use generation::{Level, LevelGenerator};
pub use graph::{Node, NodeId, RoomGraph, Step, ThemedItem, Traversal};
pub use layout::Layout;
pub use marker::{MarkerReport, mark_connectors};
pub use rect::{Edge, Rect, Side};
pub use room::{ConnectorFlags, ConnectorId, Room, RoomConnector, RoomId, RoomKind};
pub use sector::{CELL_COUNT, GRID_SIDE, Sector, SectorId, tile_sector, tile_sectors};
pub use theme::{Distribution, Rule, Theme, TileStyle};
