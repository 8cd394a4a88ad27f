//! Prefab placement onto a canvas

use std::borrow::Cow;
use std::collections::HashMap;

use super::transform::{PlacementSpec, Transform};
use super::{Instruction, Layer, LayerGroup, Prefab, PrefabPattern};
use crate::dungeon::{Canvas, CellType, EntityFactory, EntityHandle, Rect, Styler};
use crate::error::{GenError, Result};
use crate::geometry::Coord;
use crate::pool::weighted_index_f64;
use crate::rng::GameRng;

/// Place every selected layer of `prefab` anchored at `at`
///
/// The transform is resolved once and shared by all layers.
pub fn place_prefab(
    canvas: &mut dyn Canvas,
    factory: &mut dyn EntityFactory,
    prefab: &Prefab,
    at: Coord,
    spec: &PlacementSpec,
    rng: &mut GameRng,
) -> Result<Transform> {
    let transform = spec.resolve(rng);
    tracing::debug!(
        prefab = %prefab.name,
        at = %at,
        rotation = %transform.rotation,
        "placing prefab"
    );
    place_layers(canvas, factory, prefab, at, &transform, rng)?;
    Ok(transform)
}

fn place_layers(
    canvas: &mut dyn Canvas,
    factory: &mut dyn EntityFactory,
    prefab: &Prefab,
    at: Coord,
    transform: &Transform,
    rng: &mut GameRng,
) -> Result<()> {
    for layer in choose_layers(prefab, rng) {
        place_pattern(canvas, factory, &layer.pattern, at, transform, rng)?;
    }
    Ok(())
}

/// Ungrouped layers plus one weighted pick per named group, by layer order
fn choose_layers<'a>(prefab: &'a Prefab, rng: &mut GameRng) -> Vec<&'a Layer> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, layer) in prefab.layers.iter().enumerate() {
        if let LayerGroup::Named(name) = &layer.group {
            match groups.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, members)) => members.push(i),
                None => groups.push((name.as_str(), vec![i])),
            }
        }
    }

    let mut chosen: HashMap<&str, usize> = HashMap::new();
    for (name, members) in &groups {
        let size = members.len() as f64;
        let weights: Vec<f64> = members.iter().map(|&i| prefab.layers[i].weight / size).collect();
        match weighted_index_f64(&weights, rng) {
            Some(pick) => {
                chosen.insert(*name, members[pick]);
            }
            None => {
                tracing::debug!(
                    prefab = %prefab.name,
                    group = *name,
                    "no layer of group has weight"
                )
            }
        }
    }

    let mut layers: Vec<(usize, &Layer)> = prefab
        .layers
        .iter()
        .enumerate()
        .filter(|(i, layer)| match &layer.group {
            LayerGroup::Ungrouped => true,
            LayerGroup::Named(name) => chosen.get(name.as_str()) == Some(i),
        })
        .collect();
    layers.sort_by_key(|(_, layer)| layer.order);
    layers.into_iter().map(|(_, layer)| layer).collect()
}

/// Place one pattern with an already resolved transform
///
/// Patterns with nested prefabs or coarse cells are rendered onto a scratch
/// canvas first and the rendered tiles are transformed as a whole.
pub fn place_pattern(
    canvas: &mut dyn Canvas,
    factory: &mut dyn EntityFactory,
    pattern: &PrefabPattern,
    at: Coord,
    transform: &Transform,
    rng: &mut GameRng,
) -> Result<()> {
    let flat = if pattern.needs_prerender() {
        Cow::Owned(prerender(pattern, factory, rng)?)
    } else {
        Cow::Borrowed(pattern)
    };

    let (w, h) = (flat.width(), flat.height());
    let (tw, th) = transform.target_size(w, h);
    let origin = transform.origin(at, tw, th);
    for (k, src) in transform.read_order(w, h).iter().enumerate() {
        let dst = origin + transform.place(k, tw, th);
        for instruction in &flat.cells()[src] {
            apply(canvas, factory, instruction, dst)?;
        }
    }
    Ok(())
}

/// Render a pattern untransformed into a pattern of single-tile cells
fn prerender(
    pattern: &PrefabPattern,
    factory: &mut dyn EntityFactory,
    rng: &mut GameRng,
) -> Result<PrefabPattern> {
    let size = pattern.logical_size();
    let mut scratch = ScratchCanvas::new(size.x, size.y);
    let side = pattern.cell_size() as i32;

    for y in 0..pattern.height() {
        for x in 0..pattern.width() {
            let origin = Coord::new(x as i32 * side, y as i32 * side);
            for instruction in pattern.cell(x, y) {
                match instruction {
                    Instruction::Tile(tile) => {
                        let tile = *tile;
                        scratch.fill_rect(origin, Coord::new(side, side), &move |_| tile)?;
                    }
                    Instruction::Nested(inner) => {
                        let identity = Transform::IDENTITY;
                        place_layers(&mut scratch, factory, inner, origin, &identity, rng)?;
                    }
                    other => apply(&mut scratch, factory, other, origin)?,
                }
            }
        }
    }
    Ok(scratch.into_pattern())
}

fn apply(
    canvas: &mut dyn Canvas,
    factory: &mut dyn EntityFactory,
    instruction: &Instruction,
    at: Coord,
) -> Result<()> {
    match instruction {
        Instruction::Tile(tile) => {
            let tile = *tile;
            canvas.draw(at, &move |_| tile)
        }
        Instruction::Object(name) => canvas.add_object(name, at, factory).map(|_| ()),
        Instruction::Feature(name) => {
            if !canvas.try_add_feature(name, &[at], factory)? {
                tracing::warn!(feature = %name, at = %at, "prefab feature not placed");
            }
            Ok(())
        }
        Instruction::Connection => canvas.add_connection(at),
        Instruction::Nested(inner) => Err(GenError::Invariant(format!(
            "nested prefab `{}` reached placement without pre-rendering",
            inner.name
        ))),
    }
}

/// Canvas that records instructions instead of building anything
///
/// Used to render nested prefabs in their own frame. Tiles are kept ahead of
/// objects and features in each cell so replaying a cell draws the floor
/// before anything is placed on it.
#[derive(Debug, Clone)]
pub struct ScratchCanvas {
    width: i32,
    height: i32,
    cells: Vec<Vec<Instruction>>,
    connections: Vec<Coord>,
    placed: u64,
}

impl ScratchCanvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); (width.max(0) * height.max(0)) as usize],
            connections: Vec::new(),
            placed: 0,
        }
    }

    fn index(&self, at: Coord) -> usize {
        (at.y * self.width + at.x) as usize
    }

    fn holds_item(&self, at: Coord) -> bool {
        self.cells[self.index(at)]
            .iter()
            .any(|i| matches!(i, Instruction::Object(_) | Instruction::Feature(_)))
    }

    /// Recorded instructions as a pattern with one tile per cell
    pub fn into_pattern(self) -> PrefabPattern {
        let (w, h) = (self.width.max(0) as usize, self.height.max(0) as usize);
        // cell count always matches the dimensions
        PrefabPattern {
            width: w,
            height: h,
            cells: self.cells,
            cell_size: 1,
        }
    }
}

impl Canvas for ScratchCanvas {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn floor(&self) -> u32 {
        0
    }

    fn tile(&self, at: Coord) -> Option<CellType> {
        if !self.bounds().contains(at) {
            return None;
        }
        self.cells[self.index(at)].iter().find_map(|i| match i {
            Instruction::Tile(t) => Some(*t),
            _ => None,
        })
    }

    fn draw(&mut self, at: Coord, styler: Styler<'_>) -> Result<()> {
        self.check_bounds(at)?;
        let i = self.index(at);
        let cell = &mut self.cells[i];
        cell.retain(|i| !matches!(i, Instruction::Tile(_)));
        cell.insert(0, Instruction::Tile(styler(at)));
        Ok(())
    }

    fn add_object(
        &mut self,
        name: &str,
        at: Coord,
        _factory: &mut dyn EntityFactory,
    ) -> Result<EntityHandle> {
        self.check_bounds(at)?;
        let i = self.index(at);
        self.cells[i].push(Instruction::Object(name.to_string()));
        self.placed += 1;
        Ok(EntityHandle(self.placed))
    }

    fn try_add_feature(
        &mut self,
        name: &str,
        candidates: &[Coord],
        _factory: &mut dyn EntityFactory,
    ) -> Result<bool> {
        for &at in candidates {
            self.check_bounds(at)?;
            if self.holds_item(at) {
                continue;
            }
            let i = self.index(at);
            self.cells[i].push(Instruction::Feature(name.to_string()));
            return Ok(true);
        }
        Ok(false)
    }

    fn empty_tiles(&self) -> Vec<Coord> {
        self.bounds()
            .tiles()
            .filter(|at| self.tile(*at).is_some_and(|t| t.is_open_floor()) && !self.holds_item(*at))
            .collect()
    }

    fn add_connection(&mut self, at: Coord) -> Result<()> {
        self.check_bounds(at)?;
        let i = self.index(at);
        self.cells[i].push(Instruction::Connection);
        self.connections.push(at);
        Ok(())
    }

    fn connections(&self) -> &[Coord] {
        &self.connections
    }
}
