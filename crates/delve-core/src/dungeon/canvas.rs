//! Paintable surface receiving generation output
//!
//! The generator and prefab placement only talk to `Canvas` and
//! `EntityFactory`; `GridCanvas` is the in-memory surface used by the CLI and
//! the tests.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::cell::CellType;
use super::rect::Rect;
use crate::error::{GenError, Result};
use crate::geometry::Coord;

/// Coordinate to tile function passed to drawing calls
pub type Styler<'a> = &'a dyn Fn(Coord) -> CellType;

/// Opaque handle to an entity built by an `EntityFactory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Builds live entities for placed objects and features
pub trait EntityFactory {
    fn build(&mut self, name: &str, at: Coord, floor: u32) -> EntityHandle;
}

/// Factory handing out sequential handles
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    pub built: Vec<(String, Coord, u32)>,
}

impl EntityFactory for CountingFactory {
    fn build(&mut self, name: &str, at: Coord, floor: u32) -> EntityHandle {
        self.built.push((name.to_string(), at, floor));
        EntityHandle(self.built.len() as u64)
    }
}

/// An object or feature placed on a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placed {
    pub name: String,
    pub at: Coord,
    pub handle: EntityHandle,
}

/// A 2-D surface keyed by integer coordinates
///
/// Every write outside `bounds()` fails with `GenError::OutOfBounds`.
pub trait Canvas {
    fn bounds(&self) -> Rect;

    /// Floor identifier passed on to the entity factory
    fn floor(&self) -> u32;

    /// Current tile, `None` outside the bounds or where nothing was drawn
    fn tile(&self, at: Coord) -> Option<CellType>;

    fn draw(&mut self, at: Coord, styler: Styler<'_>) -> Result<()>;

    fn add_object(
        &mut self,
        name: &str,
        at: Coord,
        factory: &mut dyn EntityFactory,
    ) -> Result<EntityHandle>;

    /// Place a feature on the first free candidate; `Ok(false)` if none is free
    fn try_add_feature(
        &mut self,
        name: &str,
        candidates: &[Coord],
        factory: &mut dyn EntityFactory,
    ) -> Result<bool>;

    /// Open floor tiles holding no object or feature, row-major
    fn empty_tiles(&self) -> Vec<Coord>;

    fn add_connection(&mut self, at: Coord) -> Result<()>;

    /// Connection points recorded by prefabs
    fn connections(&self) -> &[Coord];

    fn check_bounds(&self, at: Coord) -> Result<()> {
        if self.bounds().contains(at) {
            Ok(())
        } else {
            Err(GenError::OutOfBounds(at))
        }
    }

    /// Straight line from `a` to `b` inclusive
    fn draw_line(&mut self, a: Coord, b: Coord, styler: Styler<'_>) -> Result<()> {
        let (dx, dy) = ((b.x - a.x).abs(), -(b.y - a.y).abs());
        let (sx, sy) = ((b.x - a.x).signum(), (b.y - a.y).signum());
        let mut err = dx + dy;
        let mut at = a;
        loop {
            self.draw(at, styler)?;
            if at == b {
                return Ok(());
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                at.x += sx;
            }
            if e2 <= dx {
                err += dx;
                at.y += sy;
            }
        }
    }

    fn fill_rect(&mut self, pos: Coord, size: Coord, styler: Styler<'_>) -> Result<()> {
        for at in Rect::from_pos_size(pos, size).tiles() {
            self.draw(at, styler)?;
        }
        Ok(())
    }

    /// Outline only
    fn draw_rect(&mut self, pos: Coord, size: Coord, styler: Styler<'_>) -> Result<()> {
        let rect = Rect::from_pos_size(pos, size);
        for at in rect.tiles().filter(|c| rect.is_border_tile(*c)) {
            self.draw(at, styler)?;
        }
        Ok(())
    }
}

/// Row-major grid of tiles with placed objects and features
#[derive(Debug, Clone)]
pub struct GridCanvas {
    width: i32,
    height: i32,
    floor: u32,
    tiles: Vec<CellType>,
    objects: Vec<Placed>,
    features: Vec<Placed>,
    connections: Vec<Coord>,
}

impl GridCanvas {
    pub fn new(width: i32, height: i32, floor: u32) -> Self {
        Self {
            width,
            height,
            floor,
            tiles: vec![CellType::Stone; (width.max(0) * height.max(0)) as usize],
            objects: Vec::new(),
            features: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn objects(&self) -> &[Placed] {
        &self.objects
    }

    pub fn features(&self) -> &[Placed] {
        &self.features
    }

    /// Tiles of one row, left to right
    pub fn row(&self, y: i32) -> &[CellType] {
        let start = (y * self.width) as usize;
        &self.tiles[start..start + self.width as usize]
    }

    pub fn count(&self, tile: CellType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    fn index(&self, at: Coord) -> usize {
        (at.y * self.width + at.x) as usize
    }

    fn occupied(&self) -> HashSet<Coord> {
        self.objects.iter().chain(&self.features).map(|p| p.at).collect()
    }

    /// One line per row, objects drawn as `*`
    pub fn render_ascii(&self) -> String {
        let objects: HashSet<Coord> = self.objects.iter().map(|p| p.at).collect();
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for (x, tile) in self.row(y).iter().enumerate() {
                if objects.contains(&Coord::new(x as i32, y)) {
                    out.push('*');
                } else {
                    out.push(tile.symbol());
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Canvas for GridCanvas {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn floor(&self) -> u32 {
        self.floor
    }

    fn tile(&self, at: Coord) -> Option<CellType> {
        self.bounds().contains(at).then(|| self.tiles[self.index(at)])
    }

    fn draw(&mut self, at: Coord, styler: Styler<'_>) -> Result<()> {
        self.check_bounds(at)?;
        let i = self.index(at);
        self.tiles[i] = styler(at);
        Ok(())
    }

    fn add_object(
        &mut self,
        name: &str,
        at: Coord,
        factory: &mut dyn EntityFactory,
    ) -> Result<EntityHandle> {
        self.check_bounds(at)?;
        let handle = factory.build(name, at, self.floor);
        self.objects.push(Placed {
            name: name.to_string(),
            at,
            handle,
        });
        Ok(handle)
    }

    fn try_add_feature(
        &mut self,
        name: &str,
        candidates: &[Coord],
        factory: &mut dyn EntityFactory,
    ) -> Result<bool> {
        let occupied = self.occupied();
        for &at in candidates {
            self.check_bounds(at)?;
            if occupied.contains(&at) || !self.tiles[self.index(at)].is_passable() {
                continue;
            }
            let handle = factory.build(name, at, self.floor);
            self.features.push(Placed {
                name: name.to_string(),
                at,
                handle,
            });
            return Ok(true);
        }
        Ok(false)
    }

    fn empty_tiles(&self) -> Vec<Coord> {
        let occupied = self.occupied();
        self.bounds()
            .tiles()
            .filter(|at| self.tiles[self.index(*at)].is_open_floor() && !occupied.contains(at))
            .collect()
    }

    fn add_connection(&mut self, at: Coord) -> Result<()> {
        self.check_bounds(at)?;
        self.connections.push(at);
        Ok(())
    }

    fn connections(&self) -> &[Coord] {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(_: Coord) -> CellType {
        CellType::Floor
    }

    #[test]
    fn test_out_of_bounds_write_fails() {
        let mut canvas = GridCanvas::new(5, 4, 1);
        assert!(canvas.draw(Coord::new(4, 3), &floor).is_ok());
        let outside = canvas.draw(Coord::new(5, 0), &floor);
        assert!(matches!(outside, Err(GenError::OutOfBounds(c)) if c == Coord::new(5, 0)));
        assert!(canvas.draw(Coord::new(-1, 0), &floor).is_err());
        assert_eq!(canvas.tile(Coord::new(9, 9)), None);
    }

    #[test]
    fn test_rect_helpers() {
        let mut canvas = GridCanvas::new(6, 6, 1);
        canvas.draw_rect(Coord::new(0, 0), Coord::new(4, 3), &|_| CellType::Wall).unwrap();
        assert_eq!(canvas.count(CellType::Wall), 10);

        canvas.fill_rect(Coord::new(1, 1), Coord::new(2, 1), &floor).unwrap();
        assert_eq!(canvas.count(CellType::Floor), 2);
        assert_eq!(
            canvas.row(1)[..4],
            [CellType::Wall, CellType::Floor, CellType::Floor, CellType::Wall]
        );
    }

    #[test]
    fn test_draw_line_is_inclusive() {
        let mut canvas = GridCanvas::new(8, 8, 1);
        canvas.draw_line(Coord::new(1, 2), Coord::new(6, 2), &floor).unwrap();
        assert_eq!(canvas.count(CellType::Floor), 6);

        canvas.draw_line(Coord::new(0, 0), Coord::new(3, 3), &|_| CellType::Water).unwrap();
        assert_eq!(canvas.tile(Coord::new(3, 3)), Some(CellType::Water));
        assert_eq!(canvas.count(CellType::Water), 4);
    }

    #[test]
    fn test_features_need_free_passable_tiles() {
        let mut canvas = GridCanvas::new(4, 1, 2);
        let mut factory = CountingFactory::default();
        canvas.fill_rect(Coord::new(1, 0), Coord::new(3, 1), &floor).unwrap();

        // stone at x=0 is skipped
        let candidates = [Coord::new(0, 0), Coord::new(1, 0)];
        assert!(canvas.try_add_feature("altar", &candidates, &mut factory).unwrap());
        assert_eq!(canvas.features()[0].at, Coord::new(1, 0));
        assert!(!canvas.try_add_feature("altar", &candidates, &mut factory).unwrap());

        canvas.add_object("gem", Coord::new(2, 0), &mut factory).unwrap();
        assert_eq!(canvas.empty_tiles(), vec![Coord::new(3, 0)]);
        assert_eq!(factory.built.len(), 2);
        assert_eq!(factory.built[1], ("gem".to_string(), Coord::new(2, 0), 2));
    }

    #[test]
    fn test_render_ascii() {
        let mut canvas = GridCanvas::new(3, 2, 1);
        let mut factory = CountingFactory::default();
        canvas.draw(Coord::new(0, 0), &|_| CellType::Wall).unwrap();
        canvas.draw(Coord::new(1, 1), &floor).unwrap();
        canvas.add_object("gem", Coord::new(2, 1), &mut factory).unwrap();
        assert_eq!(canvas.render_ascii(), "#  \n .*\n");
    }
}
