pub mod focus_history;
pub mod geometry;
pub mod surface;

pub use focus_history::FocusHistory;
pub use geometry::{Point, Rect, Region};
pub use surface::{ConfigureState, DockEdge, SurfaceId, SurfaceRequest, SurfaceRole};
