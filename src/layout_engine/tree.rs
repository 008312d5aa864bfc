//! Arena holding every layout node.
//!
//! Nodes own their children through key lists and point at their parent
//! with a plain key. The arena keeps both directions in sync: a node is in at
//! most one child list, and `parent(child) == Some(p)` exactly when `p` lists
//! `child`.

use enum_dispatch::enum_dispatch;
use slotmap::SlotMap;
use tracing::trace;

use super::notebook::Notebook;
use super::split::Split;
use super::view::View;
use super::viewport::Viewport;
use super::workspace::{Layer, Workspace};

slotmap::new_key_type! { pub struct NodeId; }

/// Child bookkeeping every node kind provides.
#[enum_dispatch]
pub trait TreeNode {
    fn children(&self) -> Vec<NodeId>;
    fn push_child(&mut self, child: NodeId);
    fn remove_child(&mut self, child: NodeId) -> bool;
    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool;
    fn label(&self) -> String;
}

#[enum_dispatch(TreeNode)]
#[derive(Debug, Clone)]
pub enum Node {
    Workspace(Workspace),
    Layer(Layer),
    Viewport(Viewport),
    Split(Split),
    Notebook(Notebook),
    View(View),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Workspace,
    Layer,
    Viewport,
    Split,
    Notebook,
    View,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Workspace(_) => NodeKind::Workspace,
            Node::Layer(_) => NodeKind::Layer,
            Node::Viewport(_) => NodeKind::Viewport,
            Node::Split(_) => NodeKind::Split,
            Node::Notebook(_) => NodeKind::Notebook,
            Node::View(_) => NodeKind::View,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    node: Node,
}

#[derive(Debug, Default, Clone)]
pub struct Tree {
    nodes: SlotMap<NodeId, Slot>,
}

macro_rules! typed_accessors {
    ($($variant:ident: $ty:ty => $get:ident, $get_mut:ident;)*) => {
        $(
            pub fn $get(&self, id: NodeId) -> Option<&$ty> {
                match self.get(id)? {
                    Node::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self, id: NodeId) -> Option<&mut $ty> {
                match self.get_mut(id)? {
                    Node::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        )*
    };
}

impl Tree {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Adds a detached node.
    pub fn insert(&mut self, node: impl Into<Node>) -> NodeId {
        self.nodes.insert(Slot { parent: None, node: node.into() })
    }

    pub fn insert_child(&mut self, parent: NodeId, node: impl Into<Node>) -> NodeId {
        let id = self.insert(node);
        self.attach(parent, id);
        id
    }

    pub fn contains(&self, id: NodeId) -> bool { self.nodes.contains_key(id) }

    pub fn get(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id).map(|s| &s.node) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).map(|s| &mut s.node)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> { self.get(id).map(Node::kind) }

    typed_accessors! {
        Workspace: Workspace => workspace, workspace_mut;
        Layer: Layer => layer, layer_mut;
        Viewport: Viewport => viewport, viewport_mut;
        Split: Split => split, split_mut;
        Notebook: Notebook => notebook, notebook_mut;
        View: View => view, view_mut;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self.nodes.get(id)?.parent }

    /// Snapshot of the child list.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(TreeNode::children).unwrap_or_default()
    }

    /// Appends `child` to `parent`, first removing it from any previous
    /// parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.attach_with(parent, child, |node| node.push_child(child));
    }

    /// Like [`Tree::attach`], but lets the caller place the child in the
    /// parent (tab activation, split slot) through `insert`.
    pub fn attach_with<R>(
        &mut self,
        parent: NodeId,
        child: NodeId,
        insert: impl FnOnce(&mut Node) -> R,
    ) -> R {
        assert!(self.contains(parent), "attach to missing parent {parent:?}");
        assert!(self.contains(child), "attach of missing child {child:?}");
        assert!(
            child != parent && !self.is_ancestor(child, parent),
            "attaching {child:?} under {parent:?} would create a cycle"
        );
        self.detach(child);
        let result = insert(&mut self.nodes[parent].node);
        self.nodes[child].parent = Some(parent);
        trace!(?parent, ?child, "attach");
        result
    }

    /// Removes `child` from its parent. Returns false when it had none.
    pub fn detach(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(child).and_then(|s| s.parent.take()) else {
            return false;
        };
        if let Some(slot) = self.nodes.get_mut(parent) {
            let removed = slot.node.remove_child(child);
            debug_assert!(removed, "{parent:?} did not list its child {child:?}");
        }
        trace!(?parent, ?child, "detach");
        true
    }

    /// Puts `new` at the position of `old` inside the parent of `old`.
    /// `old` ends up detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        assert!(
            new != parent && !self.is_ancestor(new, parent),
            "replacing {old:?} by {new:?} would create a cycle"
        );
        self.detach(new);
        let replaced = self.nodes[parent].node.replace_child(old, new);
        assert!(replaced, "{parent:?} did not list its child {old:?}");
        self.nodes[old].parent = None;
        self.nodes[new].parent = Some(parent);
        true
    }

    /// Deletes `id` and all of its descendants, returning them in
    /// pre-order.
    pub fn remove(&mut self, id: NodeId) -> Vec<(NodeId, Node)> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let mut order = vec![id];
        order.extend(self.all_children(id));
        order
            .into_iter()
            .filter_map(|n| self.nodes.remove(n).map(|slot| (n, slot.node)))
            .collect()
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// First ancestor (or `id` itself) of the given kind.
    pub fn find_up(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.kind(*n) == Some(kind))
    }

    /// Descendants of `root` in depth-first pre-order, `root` excluded.
    pub fn all_children(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).into_iter().rev());
        }
        out
    }

    /// `root` and its descendants, level by level.
    pub fn breadth_first(&self, root: NodeId) -> Vec<NodeId> {
        if !self.contains(root) {
            return Vec::new();
        }
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            let children = self.children(out[i]);
            out.extend(children);
            i += 1;
        }
        out
    }

    pub fn children_of_kind(&self, root: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.all_children(root).into_iter().filter(|n| self.kind(*n) == Some(kind)).collect()
    }

    /// Visits `root` and its descendants depth first, handing the tree to
    /// `f` so it may restructure it. Child lists are read after `f` ran on
    /// their parent, and nodes removed meanwhile are skipped.
    pub fn walk_mut(&mut self, root: NodeId, f: &mut impl FnMut(&mut Tree, NodeId)) {
        if !self.contains(root) {
            return;
        }
        f(self, root);
        for child in self.children(root) {
            if self.contains(child) {
                self.walk_mut(child, f);
            }
        }
    }

    /// Brings `id` forward: each notebook on the way up selects the branch
    /// holding it and each layer raises it. Returns true when anything
    /// changed.
    pub fn activate(&mut self, id: NodeId) -> bool {
        let mut changed = false;
        let mut child = id;
        for ancestor in self.ancestors(id) {
            match self.get_mut(ancestor) {
                Some(Node::Notebook(nb)) => changed |= nb.select(child),
                Some(Node::Layer(layer)) => changed |= layer.raise(child),
                _ => {}
            }
            child = ancestor;
        }
        changed
    }

    /// Whether `id` is the selected branch in its notebook parent.
    pub fn is_selected(&self, id: NodeId) -> bool {
        match self.parent(id).and_then(|p| self.notebook(p)) {
            Some(nb) => nb.selected() == Some(id),
            None => self.parent(id).is_some(),
        }
    }

    pub fn dump(&self, root: NodeId) -> String {
        let mut out = String::new();
        if self.contains(root) {
            _ = ascii_tree::write_tree(&mut out, &self.ascii_tree(root));
        }
        out
    }

    fn ascii_tree(&self, id: NodeId) -> ascii_tree::Tree {
        let status = match self.parent(id) {
            None => "",
            Some(_) if self.is_selected(id) => "☒ ",
            Some(_) => "☐ ",
        };
        let label = self.get(id).map(TreeNode::label).unwrap_or_default();
        let desc = format!("{status}{id:?} {label}");
        let children: Vec<_> = self.children(id).into_iter().map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }
}
