//! Render-facing view of the current workspace, rebuilt after each layout
//! pass and serializable to JSON.

use serde::Serialize;

use super::allocator::OutputId;
use super::engine::LayoutEngine;
use super::floating::FloatingFrame;
use super::notebook::{NotebookAreas, NotebookButton};
use super::split::SplitOrientation;
use super::tree::{NodeId, NodeKind, Tree};
use super::view::{ManagedType, View};
use super::workspace::LayerKind;
use crate::model::{Rect, SurfaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabColor {
    Focused,
    Selected,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub node: NodeId,
    pub surface: SurfaceId,
    pub title: String,
    pub managed_type: ManagedType,
    pub rect: Rect,
    pub opacity: f64,
    pub focused: bool,
}

impl ViewSnapshot {
    fn new(node: NodeId, view: &View) -> Self {
        ViewSnapshot {
            node,
            surface: view.surface(),
            title: view.title().to_owned(),
            managed_type: view.managed_type(),
            rect: view.wished(),
            opacity: view.opacity(),
            focused: view.has_keyboard_focus(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSnapshot {
    pub view: NodeId,
    pub title: String,
    pub rect: Rect,
    pub color: TabColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookSnapshot {
    pub node: NodeId,
    pub allocation: Rect,
    pub client_area: Rect,
    pub is_default: bool,
    pub exposay: bool,
    pub scroll_offset: f64,
    pub hovered: Option<NotebookButton>,
    pub areas: NotebookAreas,
    pub tabs: Vec<TabSnapshot>,
    pub thumbnails: Vec<(NodeId, Rect)>,
    /// The selected view, drawn in the client area.
    pub client: Option<ViewSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSnapshot {
    pub node: NodeId,
    pub orientation: SplitOrientation,
    pub ratio: f64,
    pub allocation: Rect,
    pub bar: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewportSnapshot {
    pub node: NodeId,
    pub output: OutputId,
    pub raw_area: Rect,
    pub effective_area: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatingSnapshot {
    pub view: ViewSnapshot,
    pub frame: FloatingFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub workspace: usize,
    pub viewports: Vec<ViewportSnapshot>,
    pub splits: Vec<SplitSnapshot>,
    pub notebooks: Vec<NotebookSnapshot>,
    pub docks: Vec<ViewSnapshot>,
    pub floating: Vec<FloatingSnapshot>,
    pub fullscreen: Vec<ViewSnapshot>,
    pub popups: Vec<ViewSnapshot>,
    /// Outline of what the active grab would do on release.
    pub grab_preview: Option<Rect>,
}

impl LayoutSnapshot {
    pub fn capture(engine: &LayoutEngine) -> Self {
        let tree = engine.tree();
        let ws = engine.current_workspace();
        let layer = |kind: LayerKind| tree.workspace(ws).map(|w| w.layer(kind));
        let viewports_layer = layer(LayerKind::Viewports);
        let views_in = |kind: LayerKind| {
            layer(kind)
                .map(|l| tree.children(l))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|id| tree.view(id).map(|v| ViewSnapshot::new(id, v)))
                .collect::<Vec<_>>()
        };
        let of_kind = |kind: NodeKind| viewports_layer.map(|l| tree.children_of_kind(l, kind)).unwrap_or_default();

        let viewports = viewports_layer
            .map(|l| tree.children(l))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| {
                let vp = tree.viewport(id)?;
                Some(ViewportSnapshot {
                    node: id,
                    output: vp.output(),
                    raw_area: vp.raw_area(),
                    effective_area: vp.effective_area(),
                })
            })
            .collect();

        let splits = of_kind(NodeKind::Split)
            .into_iter()
            .filter_map(|id| {
                let s = tree.split(id)?;
                Some(SplitSnapshot {
                    node: id,
                    orientation: s.orientation(),
                    ratio: s.ratio(),
                    allocation: s.allocation(),
                    bar: s.bar(),
                })
            })
            .collect();

        let notebooks = of_kind(NodeKind::Notebook)
            .into_iter()
            .filter_map(|id| notebook_snapshot(tree, id))
            .collect();

        let floating = engine
            .floating_views()
            .into_iter()
            .filter_map(|id| {
                let view = tree.view(id)?;
                Some(FloatingSnapshot {
                    view: ViewSnapshot::new(id, view),
                    frame: engine.floating_frame(id)?,
                })
            })
            .collect();

        let popups = tree
            .children_of_kind(ws, NodeKind::View)
            .into_iter()
            .filter_map(|id| tree.view(id).filter(|v| v.is(ManagedType::Popup)).map(|v| ViewSnapshot::new(id, v)))
            .collect();

        LayoutSnapshot {
            workspace: engine.current_workspace_index(),
            viewports,
            splits,
            notebooks,
            docks: views_in(LayerKind::Docks),
            floating,
            fullscreen: views_in(LayerKind::Fullscreen),
            popups,
            grab_preview: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string_pretty(self) }
}

fn notebook_snapshot(tree: &Tree, id: NodeId) -> Option<NotebookSnapshot> {
    let nb = tree.notebook(id)?;
    let selected = nb.selected();
    let tabs = nb
        .rendered_tab_rects()
        .into_iter()
        .filter_map(|(view, rect)| {
            let v = tree.view(view)?;
            let color = if v.has_keyboard_focus() {
                TabColor::Focused
            } else if selected == Some(view) {
                TabColor::Selected
            } else {
                TabColor::Normal
            };
            Some(TabSnapshot { view, title: v.title().to_owned(), rect, color })
        })
        .collect();
    Some(NotebookSnapshot {
        node: id,
        allocation: nb.allocation(),
        client_area: nb.client_area(),
        is_default: nb.is_default(),
        exposay: nb.in_exposay(),
        scroll_offset: nb.rendered_scroll_offset,
        hovered: nb.mouse_over(),
        areas: nb.areas().clone(),
        tabs,
        thumbnails: nb.exposay_buttons().to_vec(),
        client: selected.and_then(|s| tree.view(s).map(|v| ViewSnapshot::new(s, v))),
    })
}

impl LayoutEngine {
    pub fn snapshot(&self) -> LayoutSnapshot { LayoutSnapshot::capture(self) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Config;
    use crate::layout_engine::allocator::Output;
    use crate::model::SurfaceRole;

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(Config::default());
        engine.update_outputs(vec![Output::new(0, Rect::new(0, 0, 1280, 800))]);
        engine
    }

    #[test]
    fn tab_colors_follow_focus_and_selection() {
        let mut engine = engine();
        let a = engine.manage_surface(SurfaceId(1), 100, 100, SurfaceRole::Toplevel).unwrap();
        let b = engine.manage_surface(SurfaceId(2), 100, 100, SurfaceRole::Toplevel).unwrap();
        engine.unbind_window(b).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.notebooks.len(), 1);
        let nb = &snapshot.notebooks[0];
        assert!(nb.is_default);
        assert_eq!(nb.tabs.iter().map(|t| (t.view, t.color)).collect::<Vec<_>>(), vec![(a, TabColor::Selected)]);
        assert_eq!(snapshot.floating.len(), 1);
        assert!(snapshot.floating[0].view.focused);
        assert_eq!(snapshot.floating[0].frame.client, snapshot.floating[0].view.rect);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut engine = engine();
        engine.manage_surface(SurfaceId(7), 100, 100, SurfaceRole::Toplevel).unwrap();
        let json = engine.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["workspace"], 0);
        assert_eq!(value["viewports"][0]["raw_area"]["w"], 1280);
        assert_eq!(value["notebooks"][0]["tabs"][0]["color"], "focused");
    }
}
