use thiserror::Error;

use super::tree::NodeId;
use super::view::ManagedType;
use crate::model::SurfaceId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("surface {0} is not managed")]
    UnknownSurface(SurfaceId),
    #[error("surface {0} is already managed")]
    SurfaceExists(SurfaceId),
    #[error("node {0:?} no longer exists or has the wrong kind")]
    UnknownNode(NodeId),
    #[error("the only top-level notebook of a viewport cannot be closed")]
    CannotCloseRoot,
    #[error("view is {actual}, expected {expected}")]
    WrongManagedType { expected: ManagedType, actual: ManagedType },
    #[error("workspace has no viewport yet")]
    NoViewport,
    #[error("workspace {0} does not exist")]
    UnknownWorkspace(usize),
    #[error("splitting needs more room")]
    NoRoomToSplit,
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
