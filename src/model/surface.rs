//! Types shared with the surface/protocol layer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Opaque handle of a client surface, assigned by the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ConfigureState: u32 {
        const MAXIMIZED = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const ACTIVATED = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl DockEdge {
    /// The strip of `area` a dock of the given thickness reserves.
    pub fn reserve(self, area: &Rect, size: i32) -> Rect {
        let size = size.max(0);
        match self {
            DockEdge::Top => Rect::new(area.x, area.y, area.w, size.min(area.h)),
            DockEdge::Bottom => {
                let h = size.min(area.h);
                Rect::new(area.x, area.bottom() - h, area.w, h)
            }
            DockEdge::Left => Rect::new(area.x, area.y, size.min(area.w), area.h),
            DockEdge::Right => {
                let w = size.min(area.w);
                Rect::new(area.right() - w, area.y, w, area.h)
            }
        }
    }

    /// `area` with the reserved strip removed.
    pub fn shrink(self, area: &Rect, size: i32) -> Rect {
        let r = self.reserve(area, size);
        match self {
            DockEdge::Top => Rect::new(area.x, area.y + r.h, area.w, area.h - r.h),
            DockEdge::Bottom => Rect::new(area.x, area.y, area.w, area.h - r.h),
            DockEdge::Left => Rect::new(area.x + r.w, area.y, area.w - r.w, area.h),
            DockEdge::Right => Rect::new(area.x, area.y, area.w - r.w, area.h),
        }
    }
}

/// How a newly created surface wants to be managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRole {
    #[default]
    Toplevel,
    /// A dialog-like toplevel that floats above its parent.
    Transient { parent: SurfaceId },
    Popup { parent: SurfaceId, x: i32, y: i32 },
    Dock { edge: DockEdge, size: i32 },
}

/// Requests the engine sends back to the surface layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRequest {
    Configure {
        surface: SurfaceId,
        width: i32,
        height: i32,
        state: ConfigureState,
    },
    Close {
        surface: SurfaceId,
    },
    Focus {
        surface: Option<SurfaceId>,
    },
}

impl SurfaceRequest {
    pub fn surface(&self) -> Option<SurfaceId> {
        match self {
            SurfaceRequest::Configure { surface, .. } | SurfaceRequest::Close { surface } => {
                Some(*surface)
            }
            SurfaceRequest::Focus { surface } => *surface,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dock_reservations_cut_matching_edge() {
        let area = Rect::new(0, 0, 1000, 800);
        assert_eq!(DockEdge::Top.shrink(&area, 30), Rect::new(0, 30, 1000, 770));
        assert_eq!(DockEdge::Bottom.shrink(&area, 30), Rect::new(0, 0, 1000, 770));
        assert_eq!(DockEdge::Left.shrink(&area, 50), Rect::new(50, 0, 950, 800));
        assert_eq!(DockEdge::Right.reserve(&area, 50), Rect::new(950, 0, 50, 800));
        assert_eq!(DockEdge::Top.reserve(&area, 5000).h, 800);
    }
}
