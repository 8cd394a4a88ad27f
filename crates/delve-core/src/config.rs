//! Generator configuration
//!
//! Loaded from JSON; every field has a default so partial documents work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dungeon::{RoomKind, Theme};
use crate::error::ConfigError;
use crate::pool::{PoolEntry, WeightedPool};

/// Smallest sector side: four cells of at least three tiles
pub const MIN_SECTOR_SIDE: i32 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub map_width: i32,
    pub map_height: i32,
    /// Sectors along each map axis
    pub sectors_per_side: i32,
    /// Connector pairs tried per room pair inside a sector
    pub intra_sector_best: usize,
    /// Corridors allowed per room pair between sectors
    pub inter_sector_best: usize,
    /// Floor identifier handed to the entity factory
    pub floor: u32,
    pub theme: Theme,
    pub room_kinds: Vec<PoolEntry<RoomKind>>,
    pub pool_capacity: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            map_width: 72,
            map_height: 48,
            sectors_per_side: 2,
            intra_sector_best: 1,
            inter_sector_best: 1,
            floor: 1,
            theme: Theme::default(),
            room_kinds: vec![
                PoolEntry::new(RoomKind::Ordinary, 20),
                PoolEntry::new(RoomKind::Flooded, 3),
                PoolEntry::new(RoomKind::Pit, 2),
                PoolEntry::new(RoomKind::Vault, 1).capped(1),
            ],
            pool_capacity: 8,
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a JSON config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Width and height of one sector
    pub fn sector_size(&self) -> (i32, i32) {
        let side = self.sectors_per_side.max(1);
        (self.map_width / side, self.map_height / side)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sectors_per_side < 1 {
            return Err(ConfigError::SectorGrid(format!(
                "sectors_per_side must be at least 1, got {}",
                self.sectors_per_side
            )));
        }
        let side = self.sectors_per_side;
        if self.map_width % side != 0 || self.map_height % side != 0 {
            return Err(ConfigError::SectorGrid(format!(
                "{}x{} map does not divide into {} sectors per side",
                self.map_width, self.map_height, self.sectors_per_side
            )));
        }
        let (w, h) = self.sector_size();
        if w < MIN_SECTOR_SIDE || h < MIN_SECTOR_SIDE {
            return Err(ConfigError::SectorGrid(format!(
                "sectors of {w}x{h} are smaller than {MIN_SECTOR_SIDE} tiles"
            )));
        }
        if self.intra_sector_best == 0 {
            return Err(ConfigError::OutOfRange {
                name: "intra_sector_best",
                value: "0".to_string(),
            });
        }
        if self.inter_sector_best == 0 {
            return Err(ConfigError::OutOfRange {
                name: "inter_sector_best",
                value: "0".to_string(),
            });
        }
        self.theme.validate()?;
        self.room_kind_pool().map(|_| ())
    }

    /// Fresh pool over the configured room kinds
    pub fn room_kind_pool(&self) -> Result<WeightedPool<RoomKind>, ConfigError> {
        WeightedPool::build(self.pool_capacity, self.room_kinds.clone())
    }
}
