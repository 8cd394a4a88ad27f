//! delve-core: sector-grid dungeon layout generation
//!
//! Splits a map into a grid of sectors, carves rooms out of each sector's
//! 4x4 cell grid, routes corridors inside and between sectors, and builds a
//! room graph used for theming, drawing and stair placement. Output goes to
//! any [`dungeon::Canvas`]; prefabs can be stamped onto the same canvas.
//!
//! No I/O beyond optional config loading.

pub mod config;
pub mod dungeon;
pub mod error;
pub mod geometry;
pub mod pool;
pub mod prefab;
pub mod rng;

pub use config::GeneratorConfig;
pub use error::{ConfigError, GenError, Result};
pub use geometry::Coord;
pub use rng::GameRng;
