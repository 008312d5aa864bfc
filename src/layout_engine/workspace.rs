use serde::{Deserialize, Serialize};

use super::tree::{NodeId, Tree, TreeNode};
use crate::model::FocusHistory;

/// Stacking layers of a workspace, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    Viewports,
    Docks,
    Floating,
    Fullscreen,
}

/// Ordered container; the last child is on top.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    children: Vec<NodeId>,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self { Layer { kind, children: Vec::new() } }

    pub fn kind(&self) -> LayerKind { self.kind }

    /// Moves `child` on top. Viewports keep their output order.
    pub fn raise(&mut self, child: NodeId) -> bool {
        if self.kind == LayerKind::Viewports || self.children.last() == Some(&child) {
            return false;
        }
        let Some(index) = self.children.iter().position(|c| *c == child) else {
            return false;
        };
        let child = self.children.remove(index);
        self.children.push(child);
        true
    }
}

impl TreeNode for Layer {
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

    fn label(&self) -> String { format!("Layer {}", self.kind) }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    index: usize,
    layers: Vec<NodeId>,
    viewports_layer: NodeId,
    docks_layer: NodeId,
    floating_layer: NodeId,
    fullscreen_layer: NodeId,
    default_notebook: Option<NodeId>,
    pub(crate) focus_history: FocusHistory<NodeId>,
}

impl Workspace {
    /// Builds a workspace with its empty layers and returns its key.
    pub fn create(tree: &mut Tree, index: usize) -> NodeId {
        let viewports_layer = tree.insert(Layer::new(LayerKind::Viewports));
        let docks_layer = tree.insert(Layer::new(LayerKind::Docks));
        let floating_layer = tree.insert(Layer::new(LayerKind::Floating));
        let fullscreen_layer = tree.insert(Layer::new(LayerKind::Fullscreen));
        let id = tree.insert(Workspace {
            index,
            layers: Vec::new(),
            viewports_layer,
            docks_layer,
            floating_layer,
            fullscreen_layer,
            default_notebook: None,
            focus_history: FocusHistory::default(),
        });
        for layer in [viewports_layer, docks_layer, floating_layer, fullscreen_layer] {
            tree.attach(id, layer);
        }
        id
    }

    pub fn index(&self) -> usize { self.index }

    pub fn layer(&self, kind: LayerKind) -> NodeId {
        match kind {
            LayerKind::Viewports => self.viewports_layer,
            LayerKind::Docks => self.docks_layer,
            LayerKind::Floating => self.floating_layer,
            LayerKind::Fullscreen => self.fullscreen_layer,
        }
    }

    pub fn default_notebook(&self) -> Option<NodeId> { self.default_notebook }

    pub(crate) fn set_default_notebook(&mut self, notebook: Option<NodeId>) {
        self.default_notebook = notebook;
    }

    pub fn focus_history(&self) -> &FocusHistory<NodeId> { &self.focus_history }
}

impl TreeNode for Workspace {
    fn children(&self) -> Vec<NodeId> { self.layers.clone() }

    fn push_child(&mut self, child: NodeId) { self.layers.push(child); }

    fn remove_child(&mut self, child: NodeId) -> bool {
        let before = self.layers.len();
        self.layers.retain(|c| *c != child);
        before != self.layers.len()
    }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.layers.iter_mut().find(|c| **c == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }

    fn label(&self) -> String {
        format!("Workspace {} history={}", self.index, self.focus_history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_builds_layers_in_stacking_order() {
        let mut tree = Tree::new();
        let ws = Workspace::create(&mut tree, 0);
        let w = tree.workspace(ws).unwrap();
        let expected: Vec<_> = [
            LayerKind::Viewports,
            LayerKind::Docks,
            LayerKind::Floating,
            LayerKind::Fullscreen,
        ]
        .into_iter()
        .map(|k| w.layer(k))
        .collect();
        assert_eq!(tree.children(ws), expected);
        for layer in expected {
            assert_eq!(tree.parent(layer), Some(ws));
        }
    }

    #[test]
    fn viewports_layer_never_reorders() {
        let mut layer = Layer::new(LayerKind::Viewports);
        let mut tree = Tree::new();
        let a = tree.insert(Layer::new(LayerKind::Floating));
        let b = tree.insert(Layer::new(LayerKind::Floating));
        layer.push_child(a);
        layer.push_child(b);
        assert!(!layer.raise(a));
        assert_eq!(layer.children(), vec![a, b]);
    }
}
