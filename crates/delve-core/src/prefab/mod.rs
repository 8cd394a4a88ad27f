//! Prefabricated patterns
//!
//! A prefab is a stack of layers, each a rectangular grid of per-cell
//! instruction lists. Placement rotates and mirrors a pattern by index
//! arithmetic, picks one layer from each named group, and pre-renders nested
//! prefabs before the outer transform is applied.

mod place;
mod transform;

use std::sync::Arc;

use crate::dungeon::CellType;
use crate::error::ConfigError;
use crate::geometry::Coord;

pub use place::{ScratchCanvas, place_pattern, place_prefab};
pub use transform::{PlacementSpec, ReadOrder, ReadOrderIter, Rotation, Transform};

/// One drawing instruction stored in a pattern cell
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Tile(CellType),
    Object(String),
    Feature(String),
    /// Connection point for joining the prefab to the level
    Connection,
    /// Another prefab anchored at this cell
    Nested(Arc<Prefab>),
}

/// Rectangular grid of instruction lists, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PrefabPattern {
    width: usize,
    height: usize,
    cells: Vec<Vec<Instruction>>,
    /// Tiles per cell side
    cell_size: usize,
}

impl PrefabPattern {
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<Vec<Instruction>>,
    ) -> Result<Self, ConfigError> {
        if cells.len() != width * height {
            return Err(ConfigError::OutOfRange {
                name: "prefab cells",
                value: format!("{} cells for a {width}x{height} pattern", cells.len()),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
            cell_size: 1,
        })
    }

    /// Build from text rows, one char per cell
    pub fn from_rows<F>(rows: &[&str], legend: F) -> Result<Self, ConfigError>
    where
        F: Fn(char) -> Vec<Instruction>,
    {
        let width = rows.first().map_or(0, |r| r.chars().count());
        if let Some(bad) = rows.iter().find(|r| r.chars().count() != width) {
            return Err(ConfigError::OutOfRange {
                name: "prefab row",
                value: format!("{bad:?} is not {width} wide"),
            });
        }
        let cells = rows.iter().flat_map(|r| r.chars()).map(legend).collect();
        Self::new(width, rows.len(), cells)
    }

    pub fn with_cell_size(mut self, cell_size: usize) -> Result<Self, ConfigError> {
        if cell_size == 0 {
            return Err(ConfigError::OutOfRange {
                name: "cell_size",
                value: "0".to_string(),
            });
        }
        self.cell_size = cell_size;
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Footprint in tiles
    pub fn logical_size(&self) -> Coord {
        Coord::new((self.width * self.cell_size) as i32, (self.height * self.cell_size) as i32)
    }

    pub fn cells(&self) -> &[Vec<Instruction>] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> &[Instruction] {
        &self.cells[y * self.width + x]
    }

    /// Coarse cells or nested prefabs must be rendered before transforming
    pub fn needs_prerender(&self) -> bool {
        self.cell_size > 1
            || self
                .cells
                .iter()
                .flatten()
                .any(|i| matches!(i, Instruction::Nested(_)))
    }

    /// Materialized copy laid out as `transform` would place it
    pub fn transformed(&self, transform: &Transform) -> PrefabPattern {
        let (tw, th) = transform.target_size(self.width, self.height);
        let mut cells = vec![Vec::new(); self.cells.len()];
        for (k, src) in transform.read_order(self.width, self.height).iter().enumerate() {
            let at = transform.place(k, tw, th);
            cells[at.y as usize * tw + at.x as usize] = self.cells[src].clone();
        }
        PrefabPattern {
            width: tw,
            height: th,
            cells,
            cell_size: self.cell_size,
        }
    }
}

/// Layers sharing a named group are mutually exclusive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LayerGroup {
    #[default]
    Ungrouped,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layers are placed in ascending order
    pub order: i32,
    pub group: LayerGroup,
    pub weight: f64,
    pub pattern: PrefabPattern,
}

impl Layer {
    pub fn new(order: i32, pattern: PrefabPattern) -> Self {
        Self {
            order,
            group: LayerGroup::Ungrouped,
            weight: 1.0,
            pattern,
        }
    }

    pub fn in_group(mut self, group: &str, weight: f64) -> Self {
        self.group = LayerGroup::Named(group.to_string());
        self.weight = weight;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    pub name: String,
    pub layers: Vec<Layer>,
}

impl Prefab {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            layers: Vec::new(),
        }
    }

    /// Prefab with one ungrouped layer
    pub fn single(name: &str, pattern: PrefabPattern) -> Self {
        Self::new(name).with_layer(Layer::new(0, pattern))
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }
}
