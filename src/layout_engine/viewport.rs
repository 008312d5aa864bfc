use super::allocator::OutputId;
use super::tree::{NodeId, TreeNode};
use crate::model::{DockEdge, Rect};

/// Root of one output's tiled subtree.
#[derive(Debug, Clone)]
pub struct Viewport {
    output: OutputId,
    raw_area: Rect,
    effective_area: Rect,
    child: Option<NodeId>,
}

impl Viewport {
    pub fn new(output: OutputId, raw_area: Rect) -> Self {
        Viewport {
            output,
            raw_area,
            effective_area: raw_area,
            child: None,
        }
    }

    pub fn output(&self) -> OutputId { self.output }

    pub fn raw_area(&self) -> Rect { self.raw_area }

    /// The raw area minus the strips reserved by docks.
    pub fn effective_area(&self) -> Rect { self.effective_area }

    pub fn child(&self) -> Option<NodeId> { self.child }

    pub(crate) fn set_raw_area(&mut self, output: OutputId, raw_area: Rect) {
        self.output = output;
        self.raw_area = raw_area;
        self.effective_area = raw_area;
    }

    /// Recomputes the effective area from the docks overlapping this
    /// viewport.
    pub(crate) fn apply_docks(&mut self, docks: impl IntoIterator<Item = (DockEdge, i32)>) {
        self.effective_area = docks
            .into_iter()
            .fold(self.raw_area, |area, (edge, size)| edge.shrink(&area, size));
        if self.effective_area.is_null() {
            self.effective_area = self.raw_area;
        }
    }
}

impl TreeNode for Viewport {
    fn children(&self) -> Vec<NodeId> { self.child.into_iter().collect() }

    fn push_child(&mut self, child: NodeId) {
        assert!(self.child.is_none(), "viewport already holds a top-level component");
        self.child = Some(child);
    }

    fn remove_child(&mut self, child: NodeId) -> bool {
        if self.child == Some(child) {
            self.child = None;
            true
        } else {
            false
        }
    }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        if self.child == Some(old) {
            self.child = Some(new);
            true
        } else {
            false
        }
    }

    fn label(&self) -> String {
        format!("Viewport {} raw={} effective={}", self.output, self.raw_area, self.effective_area)
    }
}
