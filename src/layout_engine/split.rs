use serde::{Deserialize, Serialize};

use super::tree::{NodeId, TreeNode};
use crate::common::config::SplitTheme;
use crate::model::{Point, Rect};

pub const MIN_RATIO: f64 = 0.05;
pub const MAX_RATIO: f64 = 0.95;

/// `Vertical` divides with a vertical bar (children side by side),
/// `Horizontal` with a horizontal bar (children stacked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitOrientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pack {
    First,
    Second,
}

#[derive(Debug, Clone)]
pub struct Split {
    pack0: Option<NodeId>,
    pack1: Option<NodeId>,
    orientation: SplitOrientation,
    ratio: f64,
    allocation: Rect,
    bar: Rect,
    theme: SplitTheme,
}

pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.5;
    }
    ratio.clamp(MIN_RATIO, MAX_RATIO)
}

impl Split {
    pub fn new(orientation: SplitOrientation) -> Self {
        Split {
            pack0: None,
            pack1: None,
            orientation,
            ratio: 0.5,
            allocation: Rect::default(),
            bar: Rect::default(),
            theme: SplitTheme::default(),
        }
    }

    pub fn orientation(&self) -> SplitOrientation { self.orientation }

    pub fn pack0(&self) -> Option<NodeId> { self.pack0 }

    pub fn pack1(&self) -> Option<NodeId> { self.pack1 }

    pub fn pack(&self, pack: Pack) -> Option<NodeId> {
        match pack {
            Pack::First => self.pack0,
            Pack::Second => self.pack1,
        }
    }

    pub(crate) fn set_pack(&mut self, pack: Pack, child: Option<NodeId>) -> Option<NodeId> {
        match pack {
            Pack::First => std::mem::replace(&mut self.pack0, child),
            Pack::Second => std::mem::replace(&mut self.pack1, child),
        }
    }

    pub fn sibling_of(&self, child: NodeId) -> Option<NodeId> {
        if self.pack0 == Some(child) {
            self.pack1
        } else if self.pack1 == Some(child) {
            self.pack0
        } else {
            None
        }
    }

    pub fn ratio(&self) -> f64 { self.ratio }

    /// Stores the clamped ratio and returns it. The caller re-lays out the
    /// children.
    pub fn set_ratio(&mut self, ratio: f64) -> f64 {
        self.ratio = clamp_ratio(ratio);
        self.ratio
    }

    pub fn allocation(&self) -> Rect { self.allocation }

    pub fn bar(&self) -> Rect { self.bar }

    fn inner(&self) -> Rect { self.allocation.shrink(&self.theme.margin) }

    /// Length along the split axis shared by both children.
    fn available(&self) -> i32 {
        let inner = self.inner();
        match self.orientation {
            SplitOrientation::Vertical => inner.w - self.theme.width,
            SplitOrientation::Horizontal => inner.h - self.theme.width,
        }
    }

    /// Clamps `proposed` into the legal range, keeping both children at or
    /// above their minimum size along the split axis when that is possible.
    pub fn compute_split_constraint(&self, proposed: f64, min0: (i32, i32), min1: (i32, i32)) -> f64 {
        let ratio = clamp_ratio(proposed);
        let available = self.available();
        if available <= 0 {
            return ratio;
        }
        let (m0, m1) = match self.orientation {
            SplitOrientation::Vertical => (min0.0, min1.0),
            SplitOrientation::Horizontal => (min0.1, min1.1),
        };
        let lo = m0 as f64 / available as f64;
        let hi = 1.0 - m1 as f64 / available as f64;
        let ratio = if lo <= hi { ratio.clamp(lo, hi) } else { ratio };
        clamp_ratio(ratio)
    }

    /// Ratio corresponding to a pointer position over the split.
    pub fn ratio_at(&self, p: Point) -> f64 {
        let a = self.allocation;
        match self.orientation {
            SplitOrientation::Vertical if a.w > 0 => (p.x - a.x) as f64 / a.w as f64,
            SplitOrientation::Horizontal if a.h > 0 => (p.y - a.y) as f64 / a.h as f64,
            _ => self.ratio,
        }
    }

    pub fn set_allocation(&mut self, allocation: Rect, theme: &SplitTheme) -> (Rect, Rect) {
        self.allocation = allocation;
        self.theme = theme.clone();
        let (r0, bar, r1) = self.compute_geometry(self.ratio);
        self.bar = bar;
        (r0, r1)
    }

    /// Children rects and bar rect for `ratio`, without storing anything.
    pub fn compute_geometry(&self, ratio: f64) -> (Rect, Rect, Rect) {
        let inner = self.inner();
        let bar_w = self.theme.width;
        let available = self.available().max(0);
        let first = (available as f64 * clamp_ratio(ratio)).floor() as i32;
        let second = available - first;
        match self.orientation {
            SplitOrientation::Vertical => (
                Rect::new(inner.x, inner.y, first, inner.h),
                Rect::new(inner.x + first, inner.y, bar_w, inner.h),
                Rect::new(inner.x + first + bar_w, inner.y, second, inner.h),
            ),
            SplitOrientation::Horizontal => (
                Rect::new(inner.x, inner.y, inner.w, first),
                Rect::new(inner.x, inner.y + first, inner.w, bar_w),
                Rect::new(inner.x, inner.y + first + bar_w, inner.w, second),
            ),
        }
    }

    /// Minimum size of a split holding children of the given minimum sizes.
    pub fn min_allocation(
        orientation: SplitOrientation,
        theme: &SplitTheme,
        min0: (i32, i32),
        min1: (i32, i32),
    ) -> (i32, i32) {
        match orientation {
            SplitOrientation::Vertical => (
                min0.0 + min1.0 + theme.width + theme.margin.horizontal(),
                min0.1.max(min1.1) + theme.margin.vertical(),
            ),
            SplitOrientation::Horizontal => (
                min0.0.max(min1.0) + theme.margin.horizontal(),
                min0.1 + min1.1 + theme.width + theme.margin.vertical(),
            ),
        }
    }
}

impl TreeNode for Split {
    fn children(&self) -> Vec<NodeId> { self.pack0.into_iter().chain(self.pack1).collect() }

    fn push_child(&mut self, child: NodeId) {
        if self.pack0.is_none() {
            self.pack0 = Some(child);
        } else if self.pack1.is_none() {
            self.pack1 = Some(child);
        } else {
            panic!("split already holds two children");
        }
    }

    fn remove_child(&mut self, child: NodeId) -> bool {
        if self.pack0 == Some(child) {
            self.pack0 = None;
            true
        } else if self.pack1 == Some(child) {
            self.pack1 = None;
            true
        } else {
            false
        }
    }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        if self.pack0 == Some(old) {
            self.pack0 = Some(new);
            true
        } else if self.pack1 == Some(old) {
            self.pack1 = Some(new);
            true
        } else {
            false
        }
    }

    fn label(&self) -> String {
        format!("Split {} ratio={:.2} {}", self.orientation, self.ratio, self.allocation)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Margins;

    fn theme(width: i32) -> SplitTheme { SplitTheme { margin: Margins::default(), width } }

    #[test]
    fn ratio_is_always_clamped() {
        let mut split = Split::new(SplitOrientation::Vertical);
        for proposed in [-3.0, 0.0, 0.04, 0.5, 0.96, 1.0, 42.0, f64::NAN] {
            let r = split.set_ratio(proposed);
            assert!((MIN_RATIO..=MAX_RATIO).contains(&r), "{proposed} -> {r}");
            assert_eq!(split.ratio(), r);
        }
    }

    #[test]
    fn vertical_allocation_divides_width() {
        let mut split = Split::new(SplitOrientation::Vertical);
        split.set_ratio(0.25);
        let (a, b) = split.set_allocation(Rect::new(0, 0, 1006, 500), &theme(6));
        assert_eq!(a, Rect::new(0, 0, 250, 500));
        assert_eq!(split.bar(), Rect::new(250, 0, 6, 500));
        assert_eq!(b, Rect::new(256, 0, 750, 500));
    }

    #[test]
    fn horizontal_allocation_divides_height() {
        let mut split = Split::new(SplitOrientation::Horizontal);
        let (a, b) = split.set_allocation(Rect::new(10, 20, 300, 400), &theme(0));
        assert_eq!(a, Rect::new(10, 20, 300, 200));
        assert_eq!(b, Rect::new(10, 220, 300, 200));
    }

    #[test]
    fn constraint_respects_child_minimums() {
        let mut split = Split::new(SplitOrientation::Vertical);
        split.set_allocation(Rect::new(0, 0, 1000, 500), &theme(0));
        assert_eq!(split.compute_split_constraint(0.1, (300, 10), (300, 10)), 0.3);
        assert_eq!(split.compute_split_constraint(0.9, (300, 10), (300, 10)), 0.7);
        assert_eq!(split.compute_split_constraint(0.5, (300, 10), (300, 10)), 0.5);
        // Minimums that cannot both be met leave the plain clamp.
        assert_eq!(split.compute_split_constraint(0.99, (800, 10), (800, 10)), MAX_RATIO);
    }

    #[test]
    fn pointer_projection_follows_orientation() {
        let mut split = Split::new(SplitOrientation::Horizontal);
        split.set_allocation(Rect::new(0, 100, 400, 200), &theme(0));
        assert_eq!(split.ratio_at(Point::new(999, 150)), 0.25);
    }

    #[test]
    fn min_allocation_adds_along_axis() {
        let t = theme(6);
        assert_eq!(
            Split::min_allocation(SplitOrientation::Vertical, &t, (100, 50), (200, 80)),
            (306, 80)
        );
        assert_eq!(
            Split::min_allocation(SplitOrientation::Horizontal, &t, (100, 50), (200, 80)),
            (200, 136)
        );
    }
}
