pub mod allocator;
pub mod engine;
mod error;
pub mod floating;
pub mod notebook;
pub mod snapshot;
pub mod split;
pub mod transitions;
pub mod tree;
pub mod view;
pub mod viewport;
pub mod workspace;

pub use allocator::{Output, OutputId};
pub use engine::{LayoutEngine, SplitDirection};
pub use error::{LayoutError, Result};
pub use floating::{FloatingFrame, FloatingHit, ResizeEdge};
pub use notebook::{DropZone, Notebook, NotebookButton, NotebookHit};
pub use snapshot::{LayoutSnapshot, TabColor};
pub use split::{Pack, Split, SplitOrientation};
pub use tree::{Node, NodeId, NodeKind, Tree, TreeNode};
pub use view::{ManagedType, RevertData, View};
pub use viewport::Viewport;
pub use workspace::{LayerKind, Workspace};
