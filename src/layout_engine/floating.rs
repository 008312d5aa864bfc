use serde::{Deserialize, Serialize};

use crate::common::config::FloatingTheme;
use crate::model::{Point, Rect};

/// Edge or corner a floating resize drags. `None` resizes like `TopLeft`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResizeEdge {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// Signs applied to the pointer delta on width and height.
    fn factors(self) -> (i32, i32) {
        match self {
            ResizeEdge::None | ResizeEdge::TopLeft => (-1, -1),
            ResizeEdge::Top => (0, -1),
            ResizeEdge::TopRight => (1, -1),
            ResizeEdge::Left => (-1, 0),
            ResizeEdge::Right => (1, 0),
            ResizeEdge::BottomLeft => (-1, 1),
            ResizeEdge::Bottom => (0, 1),
            ResizeEdge::BottomRight => (1, 1),
        }
    }

    /// `original` resized by the pointer moving `delta`. The size never drops
    /// below 1x1 and the edge opposite to the dragged one stays put.
    pub fn apply(self, original: Rect, delta: Point) -> Rect {
        let (fx, fy) = self.factors();
        let w = (original.w + fx * delta.x).max(1);
        let h = (original.h + fy * delta.y).max(1);
        let x = if fx < 0 { original.x + original.w - w } else { original.x };
        let y = if fy < 0 { original.y + original.h - h } else { original.y };
        Rect::new(x, y, w, h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingHit {
    Close,
    Bind,
    Title,
    Edge(ResizeEdge),
    Client,
}

/// Decoration geometry around a floating view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloatingFrame {
    pub base: Rect,
    pub title: Rect,
    pub close: Rect,
    pub bind: Rect,
    pub client: Rect,
}

impl FloatingFrame {
    pub fn new(client: Rect, theme: &FloatingTheme) -> Self {
        let m = &theme.margin;
        let base = Rect::new(
            client.x - m.left,
            client.y - m.top - theme.title_height,
            client.w + m.horizontal(),
            client.h + m.vertical() + theme.title_height,
        );
        let title = Rect::new(base.x + m.left, base.y + m.top, client.w, theme.title_height);
        let close = Rect::new(title.right() - theme.close_width, title.y, theme.close_width, title.h);
        let bind = Rect::new(close.x - theme.bind_width, title.y, theme.bind_width, title.h);
        FloatingFrame { base, title, close, bind, client }
    }

    pub fn hit(&self, p: Point) -> Option<FloatingHit> {
        if !self.base.contains(p) {
            return None;
        }
        if self.close.contains(p) {
            return Some(FloatingHit::Close);
        }
        if self.bind.contains(p) {
            return Some(FloatingHit::Bind);
        }
        if self.title.contains(p) {
            return Some(FloatingHit::Title);
        }
        if self.client.contains(p) {
            return Some(FloatingHit::Client);
        }
        let left = p.x < self.client.x;
        let right = p.x >= self.client.right();
        let top = p.y < self.title.y;
        let bottom = p.y >= self.client.bottom();
        let edge = match (top, bottom, left, right) {
            (true, _, true, _) => ResizeEdge::TopLeft,
            (true, _, _, true) => ResizeEdge::TopRight,
            (_, true, true, _) => ResizeEdge::BottomLeft,
            (_, true, _, true) => ResizeEdge::BottomRight,
            (true, ..) => ResizeEdge::Top,
            (_, true, ..) => ResizeEdge::Bottom,
            (_, _, true, _) => ResizeEdge::Left,
            (_, _, _, true) => ResizeEdge::Right,
            _ => return Some(FloatingHit::Title),
        };
        Some(FloatingHit::Edge(edge))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn bottom_right_grows_size_only() {
        let r = ResizeEdge::BottomRight.apply(Rect::new(10, 10, 100, 50), Point::new(20, 30));
        assert_eq!(r, Rect::new(10, 10, 120, 80));
    }

    #[test]
    fn top_left_keeps_bottom_right_corner() {
        let r = ResizeEdge::TopLeft.apply(Rect::new(10, 10, 100, 50), Point::new(20, 30));
        assert_eq!(r, Rect::new(30, 40, 80, 20));
        assert_eq!(ResizeEdge::None.apply(Rect::new(10, 10, 100, 50), Point::new(20, 30)), r);
    }

    #[test]
    fn resize_never_goes_below_one_pixel() {
        let original = Rect::new(0, 0, 40, 40);
        for edge in ResizeEdge::iter() {
            let r = edge.apply(original, Point::new(-500, -500));
            let s = edge.apply(original, Point::new(500, 500));
            assert!(r.w >= 1 && r.h >= 1, "{edge}: {r}");
            assert!(s.w >= 1 && s.h >= 1, "{edge}: {s}");
        }
        let r = ResizeEdge::Top.apply(original, Point::new(0, 100));
        assert_eq!(r, Rect::new(0, 39, 40, 1));
    }

    #[test]
    fn frame_hit_regions() {
        let theme = FloatingTheme::default();
        let frame = FloatingFrame::new(Rect::new(100, 100, 400, 300), &theme);
        assert_eq!(frame.base, Rect::new(94, 72, 412, 334));
        assert_eq!(frame.hit(Point::new(110, 80)), Some(FloatingHit::Title));
        assert_eq!(frame.hit(Point::new(frame.close.x, 80)), Some(FloatingHit::Close));
        assert_eq!(frame.hit(Point::new(frame.bind.x, 80)), Some(FloatingHit::Bind));
        assert_eq!(frame.hit(Point::new(200, 200)), Some(FloatingHit::Client));
        assert_eq!(frame.hit(Point::new(95, 73)), Some(FloatingHit::Edge(ResizeEdge::TopLeft)));
        assert_eq!(frame.hit(Point::new(505, 405)), Some(FloatingHit::Edge(ResizeEdge::BottomRight)));
        assert_eq!(frame.hit(Point::new(300, 402)), Some(FloatingHit::Edge(ResizeEdge::Bottom)));
        assert_eq!(frame.hit(Point::new(96, 200)), Some(FloatingHit::Edge(ResizeEdge::Left)));
        assert_eq!(frame.hit(Point::new(10, 10)), None);
    }
}
