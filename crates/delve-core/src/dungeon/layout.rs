//! Arena owning every room, corridor and sector of one level

use super::corridor::{Corridor, CorridorId};
use super::room::{ConnectorId, Room, RoomConnector, RoomId};
use super::sector::{Sector, SectorId};

/// All structural pieces of a level, addressed by index
///
/// Ids are only handed out by the `add_*` methods, so indexing with them
/// cannot go out of range for the layout that created them.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    rooms: Vec<Room>,
    corridors: Vec<Corridor>,
    sectors: Vec<Sector>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, room: Room) -> RoomId {
        self.rooms.push(room);
        RoomId(self.rooms.len() - 1)
    }

    pub fn add_corridor(&mut self, corridor: Corridor) -> CorridorId {
        self.corridors.push(corridor);
        CorridorId(self.corridors.len() - 1)
    }

    pub fn add_sector(&mut self, sector: Sector) -> SectorId {
        self.sectors.push(sector);
        SectorId(self.sectors.len() - 1)
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.0]
    }

    pub fn room_mut(&mut self, id: RoomId) -> &mut Room {
        &mut self.rooms[id.0]
    }

    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().enumerate().map(|(i, r)| (RoomId(i), r))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn corridor(&self, id: CorridorId) -> &Corridor {
        &self.corridors[id.0]
    }

    pub fn corridor_mut(&mut self, id: CorridorId) -> &mut Corridor {
        &mut self.corridors[id.0]
    }

    pub fn corridors(&self) -> impl Iterator<Item = (CorridorId, &Corridor)> {
        self.corridors.iter().enumerate().map(|(i, c)| (CorridorId(i), c))
    }

    pub fn corridor_count(&self) -> usize {
        self.corridors.len()
    }

    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.0]
    }

    pub fn sector_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.sectors[id.0]
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&RoomConnector> {
        self.rooms.get(id.room.0)?.connector(id.index)
    }

    pub fn connector_mut(&mut self, id: ConnectorId) -> Option<&mut RoomConnector> {
        self.rooms.get_mut(id.room.0)?.connector_mut(id.index)
    }

    /// Every connector of every room, in room then connector order
    pub fn connector_ids(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.rooms().flat_map(|(room, r)| {
            (0..r.connectors().len()).map(move |index| ConnectorId { room, index })
        })
    }
}
