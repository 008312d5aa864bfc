use serde::{Deserialize, Serialize};

use super::tree::{NodeId, TreeNode};
use crate::model::{ConfigureState, DockEdge, Point, Rect, SurfaceId, SurfaceRequest};

/// Placement mode of a view.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManagedType {
    Unconfigured,
    Floating,
    Notebook,
    Fullscreen,
    Dock,
    Popup,
}

/// Where a fullscreen view goes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevertData {
    pub managed_type: ManagedType,
    pub notebook: Option<NodeId>,
    pub viewport: NodeId,
}

#[derive(Debug, Clone)]
pub struct View {
    surface: SurfaceId,
    managed_type: ManagedType,
    floating_wished: Rect,
    notebook_wished: Rect,
    wished: Rect,
    title: String,
    has_keyboard_focus: bool,
    last_configure: Option<(i32, i32, ConfigureState)>,
    pub(crate) revert: Option<RevertData>,
    pub(crate) dock: Option<(DockEdge, i32)>,
    pub(crate) popup_offset: Point,
    pub(crate) transient_for: Option<SurfaceId>,
    pub(crate) opacity: f64,
    committed: bool,
    children: Vec<NodeId>,
}

impl View {
    pub fn new(surface: SurfaceId, width: i32, height: i32) -> Self {
        let pos = Rect::new(0, 0, width.max(1), height.max(1));
        View {
            surface,
            managed_type: ManagedType::Unconfigured,
            floating_wished: pos,
            notebook_wished: pos,
            wished: pos,
            title: String::new(),
            has_keyboard_focus: false,
            last_configure: None,
            revert: None,
            dock: None,
            popup_offset: Point::default(),
            transient_for: None,
            opacity: 1.0,
            committed: false,
            children: Vec::new(),
        }
    }

    pub fn surface(&self) -> SurfaceId { self.surface }

    pub fn managed_type(&self) -> ManagedType { self.managed_type }

    pub fn is(&self, ty: ManagedType) -> bool { self.managed_type == ty }

    pub fn set_managed_type(&mut self, ty: ManagedType) {
        self.managed_type = ty;
        self.resolve_wished();
    }

    pub fn title(&self) -> &str { &self.title }

    pub fn set_title(&mut self, title: impl Into<String>) { self.title = title.into(); }

    pub fn has_keyboard_focus(&self) -> bool { self.has_keyboard_focus }

    pub fn set_focus_state(&mut self, focused: bool) { self.has_keyboard_focus = focused; }

    pub fn floating_wished(&self) -> Rect { self.floating_wished }

    pub fn set_floating_wished(&mut self, rect: Rect) {
        self.floating_wished = rect;
        self.resolve_wished();
    }

    pub fn notebook_wished(&self) -> Rect { self.notebook_wished }

    pub fn set_notebook_wished(&mut self, rect: Rect) {
        self.notebook_wished = rect;
        self.resolve_wished();
    }

    /// The rect the view currently wants, picked from the floating or the
    /// notebook rect according to its managed type.
    pub fn wished(&self) -> Rect { self.wished }

    pub fn opacity(&self) -> f64 { self.opacity }

    pub fn is_committed(&self) -> bool { self.committed }

    pub(crate) fn mark_committed(&mut self) -> bool { !std::mem::replace(&mut self.committed, true) }

    pub fn revert(&self) -> Option<RevertData> { self.revert }

    pub fn dock(&self) -> Option<(DockEdge, i32)> { self.dock }

    pub fn transient_for(&self) -> Option<SurfaceId> { self.transient_for }

    fn resolve_wished(&mut self) {
        self.wished = match self.managed_type {
            ManagedType::Notebook | ManagedType::Fullscreen => self.notebook_wished,
            _ => self.floating_wished,
        };
    }

    pub fn configure_state(&self) -> ConfigureState {
        let mut state = ConfigureState::empty();
        match self.managed_type {
            ManagedType::Notebook => state |= ConfigureState::MAXIMIZED,
            ManagedType::Fullscreen => state |= ConfigureState::FULLSCREEN,
            _ => {}
        }
        if self.has_keyboard_focus {
            state |= ConfigureState::ACTIVATED;
        }
        state
    }

    /// Builds the configure for the current wished geometry, or `None` when
    /// the client already got exactly this one.
    pub(crate) fn reconfigure(&mut self) -> Option<SurfaceRequest> {
        self.resolve_wished();
        let next = (self.wished.w, self.wished.h, self.configure_state());
        if self.last_configure == Some(next) {
            return None;
        }
        self.last_configure = Some(next);
        Some(SurfaceRequest::Configure {
            surface: self.surface,
            width: next.0,
            height: next.1,
            state: next.2,
        })
    }
}

impl TreeNode for View {
    fn children(&self) -> Vec<NodeId> { self.children.clone() }

    fn push_child(&mut self, child: NodeId) { self.children.push(child); }

    fn remove_child(&mut self, child: NodeId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        before != self.children.len()
    }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.children.iter_mut().find(|c| **c == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }

    fn label(&self) -> String {
        format!("View {} [{}] {:?} {}", self.surface, self.managed_type, self.title, self.wished)
    }
}
