use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::common::config::Margins;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Point { x, y } }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

/// Axis-aligned box. A rect with `w <= 0` or `h <= 0` is null and contains
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self { Rect { x, y, w, h } }

    pub fn is_null(&self) -> bool { self.w <= 0 || self.h <= 0 }

    pub fn right(&self) -> i32 { self.x + self.w }

    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn origin(&self) -> Point { Point::new(self.x, self.y) }

    pub fn area(&self) -> i64 {
        if self.is_null() { 0 } else { self.w as i64 * self.h as i64 }
    }

    pub fn contains(&self, p: Point) -> bool {
        !self.is_null() && p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_null()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn overlaps(&self, other: &Rect) -> bool { !self.intersection(other).is_null() }

    /// The common part of both rects; null when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Rect::default();
        }
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Smallest rect covering both. Null operands are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn clamp_to(&mut self, bounds: &Rect) { *self = self.intersection(bounds); }

    pub fn translate(&self, by: Point) -> Rect { Rect::new(self.x + by.x, self.y + by.y, self.w, self.h) }

    pub fn shrink(&self, margins: &Margins) -> Rect {
        Rect::new(
            self.x + margins.left,
            self.y + margins.top,
            self.w - margins.horizontal(),
            self.h - margins.vertical(),
        )
    }

    /// Parts of `self` not covered by `hole`, as at most four disjoint rects.
    pub fn difference(&self, hole: &Rect) -> Vec<Rect> {
        if self.is_null() {
            return Vec::new();
        }
        let cut = self.intersection(hole);
        if cut.is_null() {
            return vec![*self];
        }

        let mut out = Vec::with_capacity(4);
        if cut.y > self.y {
            out.push(Rect::new(self.x, self.y, self.w, cut.y - self.y));
        }
        if cut.bottom() < self.bottom() {
            out.push(Rect::new(self.x, cut.bottom(), self.w, self.bottom() - cut.bottom()));
        }
        if cut.x > self.x {
            out.push(Rect::new(self.x, cut.y, cut.x - self.x, cut.h));
        }
        if cut.right() < self.right() {
            out.push(Rect::new(cut.right(), cut.y, self.right() - cut.right(), cut.h));
        }
        out
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// A set of pairwise disjoint rects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self { Region::default() }

    pub fn rects(&self) -> &[Rect] { &self.rects }

    pub fn into_rects(self) -> Vec<Rect> { self.rects }

    pub fn is_empty(&self) -> bool { self.rects.is_empty() }

    pub fn area(&self) -> i64 { self.rects.iter().map(Rect::area).sum() }

    pub fn contains(&self, p: Point) -> bool { self.rects.iter().any(|r| r.contains(p)) }

    pub fn extents(&self) -> Rect { self.rects.iter().fold(Rect::default(), |acc, r| acc.union(r)) }

    pub fn subtract_rect(&mut self, hole: &Rect) {
        if hole.is_null() {
            return;
        }
        self.rects = self.rects.iter().flat_map(|r| r.difference(hole)).collect();
    }

    pub fn subtract(&mut self, other: &Region) {
        for hole in &other.rects {
            self.subtract_rect(hole);
        }
    }

    pub fn add_rect(&mut self, rect: &Rect) {
        let mut pieces = Region::from(*rect);
        pieces.subtract(self);
        self.rects.extend(pieces.rects);
    }

    pub fn add(&mut self, other: &Region) {
        for r in &other.rects {
            self.add_rect(r);
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        let rects = if rect.is_null() { Vec::new() } else { vec![rect] };
        Region { rects }
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut region = Region::new();
        for r in iter {
            region.add_rect(&r);
        }
        region
    }
}
