//! Rotation and mirroring of row-major patterns
//!
//! A rotation is applied as a read order over the untouched source array; a
//! mirror is applied by running the output cursor backwards along its axis.
//! The two never interact, so any combination works without building a
//! rotated copy of the pattern.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::geometry::Coord;
use crate::rng::GameRng;

/// Clockwise quarter turns
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const fn quarter_turns(self) -> i32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    /// Any integer, reduced modulo four
    pub const fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    /// 90 and 270 swap width and height
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }
}

/// Source indices in target row-major order
///
/// Iteration starts at `start`, advances by `step` within a target row and by
/// `wrap` when a target row of `row_len` cells is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOrder {
    start: isize,
    step: isize,
    wrap: isize,
    row_len: usize,
    total: usize,
}

impl ReadOrder {
    /// Read order for a `width` x `height` source rotated by `rotation`
    pub fn new(width: usize, height: usize, rotation: Rotation) -> Self {
        let (w, h) = (width as isize, height as isize);
        let (start, step, wrap) = match rotation {
            Rotation::R0 => (0, 1, 1),
            Rotation::R90 => ((h - 1) * w, -w, (h - 1) * w + 1),
            Rotation::R180 => (w * h - 1, -1, -1),
            Rotation::R270 => (w - 1, w, -1 - (h - 1) * w),
        };
        let row_len = if rotation.swaps_axes() { height } else { width };
        Self {
            start,
            step,
            wrap,
            row_len,
            total: width * height,
        }
    }

    pub fn iter(&self) -> ReadOrderIter {
        ReadOrderIter {
            order: *self,
            at: self.start,
            done: 0,
        }
    }
}

impl IntoIterator for ReadOrder {
    type Item = usize;
    type IntoIter = ReadOrderIter;

    fn into_iter(self) -> ReadOrderIter {
        self.iter()
    }
}

pub struct ReadOrderIter {
    order: ReadOrder,
    at: isize,
    done: usize,
}

impl Iterator for ReadOrderIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done >= self.order.total {
            return None;
        }
        let current = self.at;
        self.done += 1;
        self.at += if self.done % self.order.row_len == 0 {
            self.order.wrap
        } else {
            self.order.step
        };
        Some(current as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.order.total - self.done;
        (left, Some(left))
    }
}

/// How a pattern is laid onto the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Rotation,
    /// Reverse each output row
    pub mirror_x: bool,
    /// Reverse the output rows
    pub mirror_y: bool,
    /// Place the pattern's center, not its top-left corner, at the anchor
    pub centered: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: Rotation::R0,
        mirror_x: false,
        mirror_y: false,
        centered: false,
    };

    pub const fn rotated(rotation: Rotation) -> Self {
        Transform {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Target footprint of a `width` x `height` source
    pub fn target_size(&self, width: usize, height: usize) -> (usize, usize) {
        if self.rotation.swaps_axes() { (height, width) } else { (width, height) }
    }

    pub fn read_order(&self, width: usize, height: usize) -> ReadOrder {
        ReadOrder::new(width, height, self.rotation)
    }

    /// Output offset of the `k`-th cell in target row-major order
    pub fn place(&self, k: usize, target_w: usize, target_h: usize) -> Coord {
        let (tx, ty) = (k % target_w, k / target_w);
        let x = if self.mirror_x { target_w - 1 - tx } else { tx };
        let y = if self.mirror_y { target_h - 1 - ty } else { ty };
        Coord::new(x as i32, y as i32)
    }

    /// Top-left tile of the footprint for an anchor at `at`
    pub fn origin(&self, at: Coord, target_w: usize, target_h: usize) -> Coord {
        if self.centered {
            at - Coord::new(target_w as i32 / 2, target_h as i32 / 2)
        } else {
            at
        }
    }

    /// As (horizontal flip, quarter turns): first rotate, then maybe flip
    fn canonical(&self) -> (bool, i32) {
        let mut turns = self.rotation.quarter_turns();
        // a vertical flip is a horizontal flip plus a half turn
        if self.mirror_y {
            turns += 2;
        }
        (self.mirror_x != self.mirror_y, turns.rem_euclid(4))
    }

    fn from_canonical(flip: bool, turns: i32, centered: bool) -> Self {
        Transform {
            rotation: Rotation::from_quarter_turns(turns),
            mirror_x: flip,
            mirror_y: false,
            centered,
        }
    }

    /// `self` followed by `next`, as one transform
    ///
    /// The result is normalized to use `mirror_x` only and keeps the
    /// centering of `self`.
    pub fn then(&self, next: &Transform) -> Transform {
        let (flip_a, turns_a) = self.canonical();
        let (flip_b, turns_b) = next.canonical();
        // a flip reverses the sense of every rotation applied after it
        let turns = turns_a + if flip_a { -turns_b } else { turns_b };
        Self::from_canonical(flip_a != flip_b, turns, self.centered)
    }

    /// Same placement on every pattern, ignoring centering
    pub fn same_mapping(&self, other: &Transform) -> bool {
        self.canonical() == other.canonical()
    }
}

/// Requested placement, resolved once per prefab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSpec {
    pub rotation: Rotation,
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub centered: bool,
    /// Replace rotation and mirrors with one random choice
    pub randomize: bool,
}

impl PlacementSpec {
    pub fn fixed(transform: Transform) -> Self {
        Self {
            rotation: transform.rotation,
            mirror_x: transform.mirror_x,
            mirror_y: transform.mirror_y,
            centered: transform.centered,
            randomize: false,
        }
    }

    /// Freeze the transform used for every layer of one placement
    pub fn resolve(&self, rng: &mut GameRng) -> Transform {
        if !self.randomize {
            return Transform {
                rotation: self.rotation,
                mirror_x: self.mirror_x,
                mirror_y: self.mirror_y,
                centered: self.centered,
            };
        }
        Transform {
            rotation: Rotation::from_quarter_turns(rng.rn2(4) as i32),
            mirror_x: rng.one_in(2),
            mirror_y: rng.one_in(2),
            centered: self.centered,
        }
    }
}
