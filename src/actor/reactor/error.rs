use thiserror::Error;

use crate::layout_engine::{LayoutError, ManagedType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrabError {
    #[error("a {0} grab is already active")]
    AlreadyActive(&'static str),
    #[error("a {0} view cannot be grabbed that way")]
    Unsupported(ManagedType),
}

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Grab(#[from] GrabError),
}
