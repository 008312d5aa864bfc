use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use super::allocator::{self, Output};
use super::error::{LayoutError, Result};
use super::floating::{FloatingFrame, FloatingHit};
use super::notebook::{DropZone, Notebook};
use super::split::{Pack, Split, SplitOrientation};
use super::transitions::{TransitionTarget, Transitions};
use super::tree::{Node, NodeId, NodeKind, Tree};
use super::view::{ManagedType, RevertData, View};
use super::viewport::Viewport;
use super::workspace::{LayerKind, Workspace};
use crate::common::collections::HashMap;
use crate::common::config::{Config, Theme};
use crate::model::{
    DockEdge, FocusHistory, Point, Rect, SurfaceId, SurfaceRequest, SurfaceRole,
};

/// Side of a notebook a new notebook is split off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitDirection {
    Left,
    Right,
    Top,
    Bottom,
}

impl SplitDirection {
    pub fn orientation(self) -> SplitOrientation {
        match self {
            SplitDirection::Left | SplitDirection::Right => SplitOrientation::Vertical,
            SplitDirection::Top | SplitDirection::Bottom => SplitOrientation::Horizontal,
        }
    }

    /// The directional drop zones map onto splits, tab and center do not.
    pub fn from_zone(zone: DropZone) -> Option<Self> {
        match zone {
            DropZone::Left => Some(SplitDirection::Left),
            DropZone::Right => Some(SplitDirection::Right),
            DropZone::Top => Some(SplitDirection::Top),
            DropZone::Bottom => Some(SplitDirection::Bottom),
            DropZone::Tab | DropZone::Center => None,
        }
    }

    fn new_notebook_first(self) -> bool { matches!(self, SplitDirection::Left | SplitDirection::Top) }
}

/// Owns the node arena and every workspace. All structural changes go
/// through here so the focus histories, default notebooks and outgoing
/// configure requests stay consistent with the tree.
pub struct LayoutEngine {
    tree: Tree,
    workspaces: Vec<NodeId>,
    current: usize,
    config: Config,
    outputs: Vec<Output>,
    surfaces: HashMap<SurfaceId, NodeId>,
    global_focus: FocusHistory<NodeId>,
    focused: Option<NodeId>,
    transitions: Transitions,
    requests: Vec<SurfaceRequest>,
    needs_redraw: bool,
    now: Duration,
}

impl LayoutEngine {
    pub fn new(config: Config) -> Self {
        let count = config.settings.workspace_count.max(1);
        let mut engine = LayoutEngine {
            tree: Tree::new(),
            workspaces: Vec::new(),
            current: 0,
            config,
            outputs: Vec::new(),
            surfaces: HashMap::default(),
            global_focus: FocusHistory::new(),
            focused: None,
            transitions: Transitions::new(),
            requests: Vec::new(),
            needs_redraw: true,
            now: Duration::ZERO,
        };
        for _ in 0..count {
            engine.create_workspace();
        }
        engine
    }

    pub fn tree(&self) -> &Tree { &self.tree }

    pub fn config(&self) -> &Config { &self.config }

    pub fn outputs(&self) -> &[Output] { &self.outputs }

    pub fn workspaces(&self) -> &[NodeId] { &self.workspaces }

    pub fn current_workspace_index(&self) -> usize { self.current }

    pub fn current_workspace(&self) -> NodeId { self.workspaces[self.current] }

    pub fn focused(&self) -> Option<NodeId> { self.focused }

    pub fn global_focus(&self) -> &FocusHistory<NodeId> { &self.global_focus }

    pub fn view_for(&self, surface: SurfaceId) -> Option<NodeId> { self.surfaces.get(&surface).copied() }

    pub fn now(&self) -> Duration { self.now }

    pub fn has_transitions(&self) -> bool { !self.transitions.is_empty() }

    /// Drains the requests queued for the surface layer.
    pub fn take_requests(&mut self) -> Vec<SurfaceRequest> { std::mem::take(&mut self.requests) }

    /// Returns whether a redraw was scheduled since the last call.
    pub fn take_redraw(&mut self) -> bool { std::mem::replace(&mut self.needs_redraw, false) }

    pub fn request_redraw(&mut self) { self.needs_redraw = true; }

    fn shade(&self) -> bool { self.config.settings.enable_shade_windows }

    fn view_ref(&self, view: NodeId) -> Result<&View> {
        self.tree.view(view).ok_or(LayoutError::UnknownNode(view))
    }

    fn expect_managed(&self, view: NodeId, expected: ManagedType) -> Result<()> {
        let actual = self.view_ref(view)?.managed_type();
        if actual != expected {
            return Err(LayoutError::WrongManagedType { expected, actual });
        }
        Ok(())
    }

    pub fn workspace_of(&self, node: NodeId) -> Option<NodeId> {
        self.tree.find_up(node, NodeKind::Workspace)
    }

    fn layer(&self, workspace: NodeId, kind: LayerKind) -> Option<NodeId> {
        self.tree.workspace(workspace).map(|ws| ws.layer(kind))
    }

    /// Viewports of a workspace in output order.
    pub fn viewports(&self, workspace: NodeId) -> Vec<NodeId> {
        self.layer(workspace, LayerKind::Viewports)
            .map(|layer| self.tree.children(layer))
            .unwrap_or_default()
    }

    /// Every tiled notebook of a workspace, in tree order.
    pub fn notebooks(&self, workspace: NodeId) -> Vec<NodeId> {
        self.layer(workspace, LayerKind::Viewports)
            .map(|layer| self.tree.children_of_kind(layer, NodeKind::Notebook))
            .unwrap_or_default()
    }

    // Configuration and workspaces.

    pub fn set_config(&mut self, config: Config) {
        let shade = config.settings.enable_shade_windows;
        self.config = config;
        for ws in self.workspaces.clone() {
            for nb in self.tree.children_of_kind(ws, NodeKind::Notebook) {
                if let Some(nb) = self.tree.notebook_mut(nb) {
                    nb.shade_windows = shade;
                }
            }
        }
        while self.workspaces.len() < self.config.settings.workspace_count {
            self.create_workspace();
        }
        self.relayout();
    }

    /// Appends a workspace laid out over the current outputs and returns its
    /// index.
    pub fn create_workspace(&mut self) -> usize {
        let index = self.workspaces.len();
        let ws = Workspace::create(&mut self.tree, index);
        self.workspaces.push(ws);
        self.update_viewport_layout(ws);
        self.relayout();
        debug!(index, "workspace created");
        index
    }

    #[instrument(skip(self))]
    pub fn switch_workspace(&mut self, index: usize) -> Result<()> {
        if index >= self.workspaces.len() {
            return Err(LayoutError::UnknownWorkspace(index));
        }
        if index == self.current {
            return Ok(());
        }
        self.unfocus_current();
        self.current = index;
        debug!(index, "switched workspace");
        self.refocus();
        self.relayout();
        Ok(())
    }

    // Default notebook.

    /// The notebook new windows land in, re-elected when the recorded one
    /// went away.
    pub fn default_notebook(&mut self, workspace: NodeId) -> Option<NodeId> {
        let recorded = self.tree.workspace(workspace)?.default_notebook();
        if let Some(nb) = recorded
            && self.tree.notebook(nb).is_some()
            && self.workspace_of(nb) == Some(workspace)
        {
            return Some(nb);
        }
        self.update_default_notebook(workspace)
    }

    /// Elects the first notebook of the workspace as its default.
    pub fn update_default_notebook(&mut self, workspace: NodeId) -> Option<NodeId> {
        let first = self.notebooks(workspace).into_iter().next();
        self.mark_default(workspace, first);
        first
    }

    pub fn set_default_notebook(&mut self, notebook: NodeId) -> Result<()> {
        if self.tree.notebook(notebook).is_none() {
            return Err(LayoutError::UnknownNode(notebook));
        }
        let ws = self.workspace_of(notebook).ok_or(LayoutError::UnknownNode(notebook))?;
        self.mark_default(ws, Some(notebook));
        self.needs_redraw = true;
        Ok(())
    }

    fn mark_default(&mut self, workspace: NodeId, notebook: Option<NodeId>) {
        let Some(old) = self.tree.workspace(workspace).map(Workspace::default_notebook) else {
            return;
        };
        if let Some(old) = old
            && let Some(nb) = self.tree.notebook_mut(old)
        {
            nb.set_default(false);
        }
        if let Some(new) = notebook
            && let Some(nb) = self.tree.notebook_mut(new)
        {
            nb.set_default(true);
        }
        if let Some(ws) = self.tree.workspace_mut(workspace) {
            ws.set_default_notebook(notebook);
        }
        trace!(?workspace, ?notebook, "default notebook");
    }

    // Surface lifecycle.

    /// Creates the view of a new surface and places it according to its
    /// role.
    #[instrument(skip(self))]
    pub fn manage_surface(
        &mut self,
        surface: SurfaceId,
        width: i32,
        height: i32,
        role: SurfaceRole,
    ) -> Result<NodeId> {
        if self.surfaces.contains_key(&surface) {
            return Err(LayoutError::SurfaceExists(surface));
        }
        let parent = match role {
            SurfaceRole::Popup { parent, .. } => {
                Some(self.view_for(parent).ok_or(LayoutError::UnknownSurface(parent))?)
            }
            SurfaceRole::Transient { parent } => self.view_for(parent),
            SurfaceRole::Toplevel | SurfaceRole::Dock { .. } => None,
        };
        let view = self.tree.insert(View::new(surface, width, height));
        self.surfaces.insert(surface, view);
        let ws = self.current_workspace();

        match role {
            SurfaceRole::Toplevel => {
                match self.bind_window(view, true) {
                    Err(LayoutError::NoViewport) => {
                        debug!(%surface, "no viewport yet, floating");
                        self.insert_floating(view, ws);
                    }
                    other => other?,
                }
                self.set_keyboard_focus(view)?;
            }
            SurfaceRole::Transient { parent: parent_surface } => {
                let anchor = parent.and_then(|p| self.tree.view(p)).map(View::wished);
                if let Some(v) = self.tree.view_mut(view) {
                    v.transient_for = Some(parent_surface);
                    if let Some(anchor) = anchor {
                        let r = v.floating_wished();
                        v.set_floating_wished(Rect::new(
                            anchor.x + (anchor.w - r.w) / 2,
                            anchor.y + (anchor.h - r.h) / 2,
                            r.w,
                            r.h,
                        ));
                    }
                }
                self.insert_floating(view, ws);
                self.set_keyboard_focus(view)?;
            }
            SurfaceRole::Popup { x, y, .. } => {
                if let Some(v) = self.tree.view_mut(view) {
                    v.popup_offset = Point::new(x, y);
                    v.set_managed_type(ManagedType::Popup);
                }
                if let Some(parent) = parent {
                    self.tree.attach(parent, view);
                }
            }
            SurfaceRole::Dock { edge, size } => {
                if let Some(v) = self.tree.view_mut(view) {
                    v.dock = Some((edge, size));
                    v.set_managed_type(ManagedType::Dock);
                }
                if let Some(layer) = self.layer(ws, LayerKind::Docks) {
                    self.tree.attach(layer, view);
                }
            }
        }
        debug!(%surface, ?view, "surface managed");
        self.relayout();
        Ok(view)
    }

    /// First buffer of a surface. Starts its fade-in.
    pub fn surface_committed(&mut self, surface: SurfaceId) -> Result<()> {
        let view = self.view_for(surface).ok_or(LayoutError::UnknownSurface(surface))?;
        let settings = &self.config.settings;
        let fade = seconds(settings.fade_in_time);
        let fade_in = settings.animate && !fade.is_zero();
        let easing = settings.animation_easing;
        let v = self.tree.view_mut(view).ok_or(LayoutError::UnknownNode(view))?;
        if v.mark_committed() && fade_in {
            v.opacity = 0.0;
            self.transitions.add(TransitionTarget::ViewOpacity(view), 0.0, 1.0, self.now, fade, easing);
            trace!(%surface, "fade in");
        }
        self.needs_redraw = true;
        Ok(())
    }

    pub fn set_title(&mut self, surface: SurfaceId, title: String) -> Result<()> {
        let view = self.view_for(surface).ok_or(LayoutError::UnknownSurface(surface))?;
        if let Some(v) = self.tree.view_mut(view) {
            v.set_title(title);
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Forgets a destroyed surface. Its transient children float on their
    /// own, its popups go with it.
    #[instrument(skip(self))]
    pub fn destroy_surface(&mut self, surface: SurfaceId) -> Result<()> {
        let view = self.view_for(surface).ok_or(LayoutError::UnknownSurface(surface))?;
        let ws = self.workspace_of(view).unwrap_or_else(|| self.current_workspace());
        let was_focused = self.focused == Some(view);

        // Unmapped first so rescued transients cannot resolve back to it.
        self.surfaces.remove(&surface);
        for child in self.tree.children(view) {
            if self.tree.view(child).is_some_and(|c| !c.is(ManagedType::Popup)) {
                self.tree.detach(child);
                self.insert_floating(child, ws);
            }
        }
        self.detach_view(view);
        self.discard(view);

        if was_focused {
            self.refocus();
        }
        debug!(%surface, "surface destroyed");
        self.relayout();
        Ok(())
    }

    /// Deletes a detached subtree and every reference to the views in it.
    fn discard(&mut self, node: NodeId) {
        for (id, removed) in self.tree.remove(node) {
            self.transitions.cancel_node(id);
            let Node::View(view) = removed else { continue };
            self.surfaces.remove(&view.surface());
            self.global_focus.remove(id);
            for ws in &self.workspaces {
                if let Some(ws) = self.tree.workspace_mut(*ws) {
                    ws.focus_history.remove(id);
                }
            }
            if self.focused == Some(id) {
                self.focused = None;
            }
        }
    }

    /// Takes a view out of the tree and out of every workspace focus
    /// history.
    pub fn detach_view(&mut self, view: NodeId) {
        for ws in &self.workspaces {
            if let Some(ws) = self.tree.workspace_mut(*ws) {
                ws.focus_history.remove(view);
            }
        }
        self.tree.detach(view);
    }

    /// Puts the focused view back in front of its new workspace history
    /// after it moved.
    fn restore_history(&mut self, view: NodeId) {
        if self.focused != Some(view) {
            return;
        }
        if let Some(ws) = self.workspace_of(view)
            && let Some(ws) = self.tree.workspace_mut(ws)
        {
            ws.focus_history.move_front(view);
        }
    }

    // Placement.

    /// Adds a view as a tab, to the workspace default notebook when
    /// `notebook` is `None`.
    pub fn insert_window_in_notebook(
        &mut self,
        view: NodeId,
        notebook: Option<NodeId>,
        prefer_activate: bool,
    ) -> Result<()> {
        self.view_ref(view)?;
        let notebook = match notebook {
            Some(nb) => nb,
            None => {
                let ws = self.current_workspace();
                self.default_notebook(ws).ok_or(LayoutError::NoViewport)?
            }
        };
        if self.tree.notebook(notebook).is_none() {
            return Err(LayoutError::UnknownNode(notebook));
        }
        if let Some(v) = self.tree.view_mut(view) {
            v.revert = None;
            v.set_managed_type(ManagedType::Notebook);
        }
        self.tree.attach_with(notebook, view, |node| match node {
            Node::Notebook(nb) => nb.add(view, prefer_activate),
            _ => false,
        });
        self.restore_history(view);
        Ok(())
    }

    /// Puts a view in the floating layer of `workspace`, or above its
    /// transient parent when that one is still managed.
    fn insert_floating(&mut self, view: NodeId, workspace: NodeId) {
        let parent = self
            .tree
            .view(view)
            .and_then(View::transient_for)
            .and_then(|s| self.view_for(s))
            .filter(|p| *p != view && !self.tree.is_ancestor(view, *p));
        let target = match parent {
            Some(parent) => parent,
            None => match self.layer(workspace, LayerKind::Floating) {
                Some(layer) => layer,
                None => return,
            },
        };

        let areas: Vec<Rect> = self
            .viewports(workspace)
            .into_iter()
            .filter_map(|vp| self.tree.viewport(vp).map(Viewport::raw_area))
            .collect();
        if let Some(v) = self.tree.view_mut(view) {
            v.set_managed_type(ManagedType::Floating);
            let r = v.floating_wished();
            if let Some(first) = areas.first()
                && !areas.iter().any(|a| a.overlaps(&r))
            {
                v.set_floating_wished(Rect::new(first.x, first.y, r.w, r.h));
            }
        }
        self.tree.attach(target, view);
        self.restore_history(view);
    }

    /// Moves a view into the default notebook of its workspace.
    #[instrument(skip(self))]
    pub fn bind_window(&mut self, view: NodeId, activate: bool) -> Result<()> {
        self.view_ref(view)?;
        let ws = self.workspace_of(view).unwrap_or_else(|| self.current_workspace());
        let notebook = self.default_notebook(ws).ok_or(LayoutError::NoViewport)?;
        self.detach_view(view);
        self.insert_window_in_notebook(view, Some(notebook), activate)?;
        if activate {
            self.tree.activate(view);
        }
        self.relayout();
        Ok(())
    }

    /// Turns a tab into a floating window.
    #[instrument(skip(self))]
    pub fn unbind_window(&mut self, view: NodeId) -> Result<()> {
        self.expect_managed(view, ManagedType::Notebook)?;
        let ws = self.workspace_of(view).unwrap_or_else(|| self.current_workspace());
        self.detach_view(view);
        self.insert_floating(view, ws);
        self.tree.activate(view);
        self.relayout();
        Ok(())
    }

    /// Applies a new floating rect, from a move or resize grab.
    pub fn set_floating_rect(&mut self, view: NodeId, rect: Rect) -> Result<()> {
        self.expect_managed(view, ManagedType::Floating)?;
        if let Some(v) = self.tree.view_mut(view) {
            v.set_floating_wished(rect);
        }
        self.relayout();
        Ok(())
    }

    pub fn floating_frame(&self, view: NodeId) -> Option<FloatingFrame> {
        let v = self.tree.view(view).filter(|v| v.is(ManagedType::Floating))?;
        Some(FloatingFrame::new(v.wished(), &self.config.theme.floating))
    }

    // Fullscreen.

    /// Fullscreens a tab on its own viewport, or a floating window on the
    /// viewport under its center.
    #[instrument(skip(self))]
    pub fn fullscreen(&mut self, view: NodeId) -> Result<()> {
        let v = self.view_ref(view)?;
        let viewport = match v.managed_type() {
            ManagedType::Fullscreen => return Ok(()),
            ManagedType::Notebook => self.tree.find_up(view, NodeKind::Viewport),
            ManagedType::Floating => {
                let r = v.wished();
                let center = Point::new(r.x + r.w / 2, r.y + r.h / 2);
                let ws = self.workspace_of(view).unwrap_or_else(|| self.current_workspace());
                self.viewport_at(ws, center).or_else(|| self.viewports(ws).first().copied())
            }
            actual => {
                return Err(LayoutError::WrongManagedType { expected: ManagedType::Notebook, actual });
            }
        };
        let viewport = viewport.ok_or(LayoutError::NoViewport)?;
        self.fullscreen_on(view, viewport)
    }

    fn fullscreen_on(&mut self, view: NodeId, viewport: NodeId) -> Result<()> {
        let managed_type = self.view_ref(view)?.managed_type();
        let notebook = match managed_type {
            ManagedType::Notebook => self.tree.parent(view),
            _ => None,
        };
        let raw = self
            .tree
            .viewport(viewport)
            .map(Viewport::raw_area)
            .ok_or(LayoutError::UnknownNode(viewport))?;
        let ws = self.workspace_of(viewport).ok_or(LayoutError::UnknownNode(viewport))?;
        let layer = self.layer(ws, LayerKind::Fullscreen).ok_or(LayoutError::UnknownNode(ws))?;

        self.detach_view(view);
        self.unfullscreen_viewport(viewport, view)?;
        if let Some(v) = self.tree.view_mut(view) {
            v.revert = Some(RevertData { managed_type, notebook, viewport });
            v.set_managed_type(ManagedType::Fullscreen);
            v.set_notebook_wished(raw);
        }
        self.tree.attach(layer, view);
        self.restore_history(view);
        debug!(?view, ?viewport, "fullscreen");
        self.relayout();
        Ok(())
    }

    /// Unfullscreens whatever else is fullscreen on `viewport`.
    fn unfullscreen_viewport(&mut self, viewport: NodeId, except: NodeId) -> Result<()> {
        let others: Vec<NodeId> = self
            .fullscreen_views()
            .into_iter()
            .filter(|fs| {
                *fs != except
                    && self.tree.view(*fs).and_then(View::revert).is_some_and(|r| r.viewport == viewport)
            })
            .collect();
        for other in others {
            self.unfullscreen(other)?;
        }
        Ok(())
    }

    fn fullscreen_views(&self) -> Vec<NodeId> {
        self.workspaces
            .iter()
            .filter_map(|ws| self.layer(*ws, LayerKind::Fullscreen))
            .flat_map(|layer| self.tree.children(layer))
            .collect()
    }

    /// Sends a fullscreen view back where it came from. The revert notebook
    /// falls back to the default notebook when it was closed meanwhile.
    #[instrument(skip(self))]
    pub fn unfullscreen(&mut self, view: NodeId) -> Result<()> {
        let v = self.view_ref(view)?;
        if !v.is(ManagedType::Fullscreen) {
            return Ok(());
        }
        let revert = v.revert();
        let ws = revert
            .and_then(|r| self.workspace_of(r.viewport))
            .or_else(|| self.workspace_of(view))
            .unwrap_or_else(|| self.current_workspace());

        self.detach_view(view);
        if let Some(v) = self.tree.view_mut(view) {
            v.revert = None;
        }
        match revert {
            Some(RevertData { managed_type: ManagedType::Notebook, notebook, .. }) => {
                let alive = notebook
                    .filter(|nb| self.tree.notebook(*nb).is_some() && self.workspace_of(*nb).is_some());
                let target = match alive {
                    Some(nb) => Some(nb),
                    None => self.default_notebook(ws),
                };
                match target {
                    Some(nb) => self.insert_window_in_notebook(view, Some(nb), true)?,
                    None => self.insert_floating(view, ws),
                }
            }
            _ => self.insert_floating(view, ws),
        }
        debug!(?view, "unfullscreen");
        self.relayout();
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self, view: NodeId) -> Result<()> {
        if self.view_ref(view)?.is(ManagedType::Fullscreen) {
            self.unfullscreen(view)
        } else {
            self.fullscreen(view)
        }
    }

    /// Moves a fullscreen view to another viewport.
    #[instrument(skip(self))]
    pub fn fullscreen_client_to_viewport(&mut self, view: NodeId, viewport: NodeId) -> Result<()> {
        self.expect_managed(view, ManagedType::Fullscreen)?;
        let Some(revert) = self.view_ref(view)?.revert() else {
            return Err(LayoutError::UnknownNode(view));
        };
        if revert.viewport == viewport {
            return Ok(());
        }
        let raw = self
            .tree
            .viewport(viewport)
            .map(Viewport::raw_area)
            .ok_or(LayoutError::UnknownNode(viewport))?;
        let ws = self.workspace_of(viewport).ok_or(LayoutError::UnknownNode(viewport))?;
        let layer = self.layer(ws, LayerKind::Fullscreen).ok_or(LayoutError::UnknownNode(ws))?;
        self.unfullscreen_viewport(viewport, view)?;
        if let Some(v) = self.tree.view_mut(view) {
            v.revert = Some(RevertData { viewport, ..revert });
            v.set_notebook_wished(raw);
        }
        self.tree.attach(layer, view);
        self.restore_history(view);
        self.relayout();
        Ok(())
    }

    /// Points revert data at `to` wherever it pointed at the closed `from`.
    fn retarget_reverts(&mut self, from: NodeId, to: NodeId) {
        for fs in self.fullscreen_views() {
            if let Some(v) = self.tree.view_mut(fs)
                && let Some(revert) = v.revert.as_mut()
                && revert.notebook == Some(from)
            {
                revert.notebook = Some(to);
            }
        }
    }

    // Splits and notebooks.

    /// Replaces `notebook` by a split holding it and a new notebook on the
    /// given side. A given view moves into the new notebook.
    #[instrument(skip(self))]
    pub fn split(
        &mut self,
        notebook: NodeId,
        direction: SplitDirection,
        view: Option<NodeId>,
    ) -> Result<NodeId> {
        if self.tree.notebook(notebook).is_none() || self.tree.parent(notebook).is_none() {
            return Err(LayoutError::UnknownNode(notebook));
        }
        if let Some(view) = view {
            self.view_ref(view)?;
        }
        let new = self.tree.insert(Notebook::new(self.shade()));
        let split = self.tree.insert(Split::new(direction.orientation()));
        self.tree.replace(notebook, split);
        let (first, second) =
            if direction.new_notebook_first() { (new, notebook) } else { (notebook, new) };
        self.set_pack(split, Pack::First, first)?;
        self.set_pack(split, Pack::Second, second)?;

        if let Some(view) = view {
            self.detach_view(view);
            self.insert_window_in_notebook(view, Some(new), true)?;
        }
        debug!(?notebook, ?new, %direction, "split");
        self.relayout();
        Ok(new)
    }

    pub fn split_left(&mut self, notebook: NodeId, view: Option<NodeId>) -> Result<NodeId> {
        self.split(notebook, SplitDirection::Left, view)
    }

    pub fn split_right(&mut self, notebook: NodeId, view: Option<NodeId>) -> Result<NodeId> {
        self.split(notebook, SplitDirection::Right, view)
    }

    pub fn split_top(&mut self, notebook: NodeId, view: Option<NodeId>) -> Result<NodeId> {
        self.split(notebook, SplitDirection::Top, view)
    }

    pub fn split_bottom(&mut self, notebook: NodeId, view: Option<NodeId>) -> Result<NodeId> {
        self.split(notebook, SplitDirection::Bottom, view)
    }

    /// Closes a notebook: its sibling takes the place of the parent split
    /// and its tabs move to the default notebook.
    /// Puts `child` in one slot of `split`. A previous occupant of that
    /// slot is detached and left parentless.
    pub fn set_pack(&mut self, split: NodeId, pack: Pack, child: NodeId) -> Result<Option<NodeId>> {
        let previous = self.tree.split(split).ok_or(LayoutError::UnknownNode(split))?.pack(pack);
        if previous == Some(child) {
            return Ok(None);
        }
        if let Some(previous) = previous {
            self.tree.detach(previous);
        }
        self.tree.attach_with(split, child, |node| {
            if let Node::Split(s) = node {
                s.set_pack(pack, Some(child));
            }
        });
        Ok(previous)
    }

    #[instrument(skip(self))]
    pub fn notebook_close(&mut self, notebook: NodeId) -> Result<()> {
        let tabs = self.tree.notebook(notebook).ok_or(LayoutError::UnknownNode(notebook))?.tabs().to_vec();
        let parent = self.tree.parent(notebook).ok_or(LayoutError::UnknownNode(notebook))?;
        let Some(sibling) = self.tree.split(parent).and_then(|s| s.sibling_of(notebook)) else {
            return Err(LayoutError::CannotCloseRoot);
        };
        let ws = self.workspace_of(notebook).ok_or(LayoutError::UnknownNode(notebook))?;

        self.tree.replace(parent, sibling);
        if let Some(nb) = self.tree.notebook_mut(notebook) {
            nb.set_default(false);
        }
        let default = self.default_notebook(ws).ok_or(LayoutError::NoViewport)?;
        for view in tabs {
            self.insert_window_in_notebook(view, Some(default), false)?;
        }
        self.retarget_reverts(notebook, default);
        for (id, _) in self.tree.remove(parent) {
            self.transitions.cancel_node(id);
        }
        debug!(?notebook, ?default, "notebook closed");
        self.relayout();
        Ok(())
    }

    pub fn min_allocation(&self, node: NodeId) -> (i32, i32) {
        let theme = &self.config.theme;
        match self.tree.get(node) {
            Some(Node::Notebook(_)) => Notebook::min_allocation(&theme.notebook),
            Some(Node::Split(split)) => {
                let min0 = split.pack0().map(|c| self.min_allocation(c)).unwrap_or_default();
                let min1 = split.pack1().map(|c| self.min_allocation(c)).unwrap_or_default();
                Split::min_allocation(split.orientation(), &theme.split, min0, min1)
            }
            _ => (0, 0),
        }
    }

    /// Ratio `proposed` clamped so both children keep their minimum size.
    pub fn constrain_split_ratio(&self, split: NodeId, proposed: f64) -> Option<f64> {
        let s = self.tree.split(split)?;
        let min0 = s.pack0().map(|c| self.min_allocation(c)).unwrap_or_default();
        let min1 = s.pack1().map(|c| self.min_allocation(c)).unwrap_or_default();
        Some(s.compute_split_constraint(proposed, min0, min1))
    }

    pub fn set_split_ratio(&mut self, split: NodeId, ratio: f64) -> Result<f64> {
        let s = self.tree.split_mut(split).ok_or(LayoutError::UnknownNode(split))?;
        let ratio = s.set_ratio(ratio);
        self.relayout();
        Ok(ratio)
    }

    pub fn start_exposay(&mut self, notebook: NodeId) -> Result<()> {
        let nb = self.tree.notebook_mut(notebook).ok_or(LayoutError::UnknownNode(notebook))?;
        nb.start_exposay();
        self.relayout();
        Ok(())
    }

    /// Clicking the selected tab in shade mode hides it; clicking a hidden
    /// one shows it again.
    pub fn toggle_iconify(&mut self, view: NodeId) -> Result<()> {
        let parent = self.tree.parent(view).ok_or(LayoutError::UnknownNode(view))?;
        let nb = self.tree.notebook_mut(parent).ok_or(LayoutError::UnknownNode(parent))?;
        if nb.selected() == Some(view) {
            nb.iconify_selected();
        } else {
            self.tree.activate(view);
        }
        self.relayout();
        Ok(())
    }

    /// Scrolls a tab strip, right for positive `px`.
    pub fn scroll_notebook(&mut self, notebook: NodeId, px: i32) -> bool {
        let settings = &self.config.settings;
        let (animate, duration, easing) =
            (settings.animate, seconds(settings.scroll_duration), settings.animation_easing);
        let Some(nb) = self.tree.notebook_mut(notebook) else {
            return false;
        };
        let moved = if px >= 0 { nb.scroll_right(px) } else { nb.scroll_left(-px) };
        let Some((_, to)) = moved else {
            return false;
        };
        if animate && !duration.is_zero() {
            let from = nb.rendered_scroll_offset;
            let target = TransitionTarget::NotebookScroll(notebook);
            self.transitions.add(target, from, f64::from(to), self.now, duration, easing);
        } else {
            nb.rendered_scroll_offset = f64::from(to);
        }
        self.needs_redraw = true;
        true
    }

    /// Asks the client of a view to close.
    pub fn close_view(&mut self, view: NodeId) -> Result<()> {
        let surface = self.view_ref(view)?.surface();
        self.requests.push(SurfaceRequest::Close { surface });
        Ok(())
    }

    /// Refreshes the hovered button of every notebook. Returns true when a
    /// redraw is needed.
    pub fn update_hover(&mut self, p: Point) -> bool {
        let mut changed = false;
        for nb in self.notebooks(self.current_workspace()) {
            if let Some(nb) = self.tree.notebook_mut(nb) {
                changed |= nb.update_mouse_over(p);
            }
        }
        self.needs_redraw |= changed;
        changed
    }

    // Keyboard focus.

    fn unfocus_current(&mut self) {
        if let Some(old) = self.focused.take()
            && let Some(v) = self.tree.view_mut(old)
        {
            v.set_focus_state(false);
        }
    }

    #[instrument(skip(self))]
    pub fn set_keyboard_focus(&mut self, view: NodeId) -> Result<()> {
        let surface = self.view_ref(view)?.surface();
        if self.focused == Some(view) {
            return Ok(());
        }
        self.unfocus_current();
        if let Some(ws) = self.workspace_of(view)
            && let Some(ws) = self.tree.workspace_mut(ws)
        {
            ws.focus_history.move_front(view);
        }
        self.global_focus.move_front(view);
        self.tree.activate(view);
        if let Some(v) = self.tree.view_mut(view) {
            v.set_focus_state(true);
        }
        self.focused = Some(view);
        self.requests.push(SurfaceRequest::Focus { surface: Some(surface) });
        self.relayout();
        Ok(())
    }

    /// Brings a view forward without focusing it.
    pub fn activate(&mut self, view: NodeId) -> bool {
        let changed = self.tree.activate(view);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Most recent live view of the workspace history, pruning dead keys on
    /// the way.
    fn focus_candidate(&mut self, workspace: NodeId) -> Option<NodeId> {
        let mut history = self.tree.workspace(workspace)?.focus_history.clone();
        let candidate = history.front(|k| {
            self.tree.view(k).is_some_and(|v| !v.is(ManagedType::Popup))
                && self.workspace_of(k) == Some(workspace)
        });
        if let Some(ws) = self.tree.workspace_mut(workspace) {
            ws.focus_history = history;
        }
        candidate
    }

    fn refocus(&mut self) {
        let ws = self.current_workspace();
        let candidate =
            if self.config.settings.auto_refocus { self.focus_candidate(ws) } else { None };
        match candidate {
            Some(view) => {
                if let Err(err) = self.set_keyboard_focus(view) {
                    warn!(?view, %err, "refocus failed");
                }
            }
            None => {
                self.unfocus_current();
                self.requests.push(SurfaceRequest::Focus { surface: None });
            }
        }
    }

    // Queries.

    pub fn viewport_at(&self, workspace: NodeId, p: Point) -> Option<NodeId> {
        self.viewports(workspace)
            .into_iter()
            .find(|vp| self.tree.viewport(*vp).is_some_and(|v| v.raw_area().contains(p)))
    }

    pub fn find_mouse_viewport(&self, p: Point) -> Option<NodeId> {
        self.viewport_at(self.current_workspace(), p)
    }

    /// First notebook of the current workspace with a drop zone under `p`.
    pub fn find_drop_target(&self, p: Point) -> Option<(NodeId, DropZone)> {
        self.notebooks(self.current_workspace())
            .into_iter()
            .find_map(|nb| self.tree.notebook(nb)?.drop_zone_at(p).map(|zone| (nb, zone)))
    }

    pub fn notebook_at(&self, p: Point) -> Option<NodeId> {
        self.notebooks(self.current_workspace())
            .into_iter()
            .find(|nb| self.tree.notebook(*nb).is_some_and(|n| n.allocation().contains(p)))
    }

    pub fn split_bar_at(&self, p: Point) -> Option<NodeId> {
        let layer = self.layer(self.current_workspace(), LayerKind::Viewports)?;
        self.tree
            .children_of_kind(layer, NodeKind::Split)
            .into_iter()
            .find(|s| self.tree.split(*s).is_some_and(|s| s.bar().contains(p)))
    }

    /// Floating views of the current workspace, bottom to top. Transient
    /// children stack above their parent, tiled or not.
    pub fn floating_views(&self) -> Vec<NodeId> {
        self.tree
            .children_of_kind(self.current_workspace(), NodeKind::View)
            .into_iter()
            .filter(|v| self.tree.view(*v).is_some_and(|v| v.is(ManagedType::Floating)))
            .collect()
    }

    pub fn floating_at(&self, p: Point) -> Option<(NodeId, FloatingHit)> {
        self.floating_views()
            .into_iter()
            .rev()
            .find_map(|v| self.floating_frame(v)?.hit(p).map(|hit| (v, hit)))
    }

    pub fn fullscreen_at(&self, p: Point) -> Option<NodeId> {
        let layer = self.layer(self.current_workspace(), LayerKind::Fullscreen)?;
        self.tree
            .children(layer)
            .into_iter()
            .rev()
            .find(|v| self.tree.view(*v).is_some_and(|v| v.wished().contains(p)))
    }

    /// The view whose client area is under `p`, topmost first.
    pub fn view_at(&self, p: Point) -> Option<NodeId> {
        if let Some(view) = self.fullscreen_at(p) {
            return Some(view);
        }
        if let Some((view, _)) = self.floating_at(p) {
            return Some(view);
        }
        let nb = self.tree.notebook(self.notebook_at(p)?)?;
        let selected = nb.selected()?;
        nb.client_area().contains(p).then_some(selected)
    }

    // Layout.

    /// Reconciles every workspace with a new output set. An empty or fully
    /// degenerate set is ignored.
    #[instrument(skip(self))]
    pub fn update_outputs(&mut self, outputs: Vec<Output>) {
        if allocator::allocate(&outputs).is_empty() {
            warn!("no usable output, keeping current viewports");
            return;
        }
        self.outputs = outputs;
        for ws in self.workspaces.clone() {
            self.update_viewport_layout(ws);
        }
        self.relayout();
    }

    /// Index-aligned reuse of the workspace viewports for the current
    /// allocation.
    fn update_viewport_layout(&mut self, workspace: NodeId) {
        let allocations = allocator::allocate(&self.outputs);
        let Some(layer) = self.layer(workspace, LayerKind::Viewports) else {
            return;
        };
        if allocations.is_empty() {
            return;
        }
        let shade = self.shade();
        let existing = self.tree.children(layer);
        let mut changed = existing.len() != allocations.len();
        for (i, (output, area)) in allocations.iter().enumerate() {
            match existing.get(i).and_then(|vp| self.tree.viewport_mut(*vp)) {
                Some(vp) => {
                    changed |= vp.raw_area() != *area;
                    vp.set_raw_area(*output, *area);
                }
                None => {
                    let vp = self.tree.insert_child(layer, Viewport::new(*output, *area));
                    self.tree.insert_child(vp, Notebook::new(shade));
                    trace!(%output, %area, "viewport created");
                }
            }
        }

        let first = self.tree.children(layer).first().copied();
        for vp in existing.into_iter().skip(allocations.len()) {
            self.remove_viewport(workspace, vp, first);
        }
        self.default_notebook(workspace);

        let origin = first.and_then(|vp| self.tree.viewport(vp)).map(|vp| vp.raw_area().origin());
        if changed && let Some(origin) = origin {
            let floating = self.layer(workspace, LayerKind::Floating);
            for view in floating.map(|l| self.tree.children(l)).unwrap_or_default() {
                if let Some(v) = self.tree.view_mut(view) {
                    let r = v.floating_wished();
                    v.set_floating_wished(Rect::new(origin.x, origin.y, r.w, r.h));
                }
            }
        }
    }

    /// Drops a viewport whose output went away. Its tabs move to the default
    /// notebook and fullscreen views on it move to `fallback`.
    fn remove_viewport(&mut self, workspace: NodeId, viewport: NodeId, fallback: Option<NodeId>) {
        self.tree.detach(viewport);
        let default = self.default_notebook(workspace);
        for nb in self.tree.children_of_kind(viewport, NodeKind::Notebook) {
            let tabs = self.tree.notebook(nb).map(|n| n.tabs().to_vec()).unwrap_or_default();
            for view in tabs {
                match default {
                    Some(default) => {
                        if let Err(err) = self.insert_window_in_notebook(view, Some(default), false) {
                            warn!(?view, %err, "could not rescue tab");
                        }
                    }
                    None => {
                        self.tree.detach(view);
                        self.insert_floating(view, workspace);
                    }
                }
            }
            if let Some(default) = default {
                self.retarget_reverts(nb, default);
            }
        }
        for fs in self.fullscreen_views() {
            let on_viewport =
                self.tree.view(fs).and_then(View::revert).is_some_and(|r| r.viewport == viewport);
            if !on_viewport {
                continue;
            }
            match fallback {
                Some(fallback) => {
                    if let Some(revert) = self.tree.view_mut(fs).and_then(|v| v.revert.as_mut()) {
                        revert.viewport = fallback;
                    }
                }
                None => {
                    if let Err(err) = self.unfullscreen(fs) {
                        warn!(?fs, %err, "could not unfullscreen");
                    }
                }
            }
        }
        for (id, _) in self.tree.remove(viewport) {
            self.transitions.cancel_node(id);
        }
        debug!(?viewport, "viewport removed");
    }

    /// Recomputes every allocation top-down and queues the configures that
    /// changed.
    pub fn relayout(&mut self) {
        let theme = self.config.theme.clone();
        for ws in self.workspaces.clone() {
            self.layout_workspace(ws, &theme);
        }
        self.needs_redraw = true;
    }

    fn layout_workspace(&mut self, workspace: NodeId, theme: &Theme) {
        let Some(ws) = self.tree.workspace(workspace) else {
            return;
        };
        let viewports_layer = ws.layer(LayerKind::Viewports);
        let docks_layer = ws.layer(LayerKind::Docks);
        let viewports = self.tree.children(viewports_layer);

        let mut reservations: HashMap<NodeId, Vec<(DockEdge, i32)>> = HashMap::default();
        for dock in self.tree.children(docks_layer) {
            let Some(v) = self.tree.view(dock) else { continue };
            let Some((edge, size)) = v.dock() else { continue };
            let r = v.floating_wished();
            let center = Point::new(r.x + r.w / 2, r.y + r.h / 2);
            let target = viewports
                .iter()
                .copied()
                .find(|vp| self.tree.viewport(*vp).is_some_and(|v| v.raw_area().contains(center)))
                .or_else(|| viewports.first().copied());
            let Some(target) = target else { continue };
            let Some(raw) = self.tree.viewport(target).map(Viewport::raw_area) else { continue };
            reservations.entry(target).or_default().push((edge, size));
            if let Some(v) = self.tree.view_mut(dock) {
                v.set_floating_wished(edge.reserve(&raw, size));
            }
        }

        for vp in &viewports {
            let Some(viewport) = self.tree.viewport_mut(*vp) else { continue };
            viewport.apply_docks(reservations.remove(vp).unwrap_or_default());
            let (area, child) = (viewport.effective_area(), viewport.child());
            if let Some(child) = child {
                allocate(&mut self.tree, theme, child, area);
            }
        }

        for fs in self.fullscreen_views() {
            let raw = self
                .tree
                .view(fs)
                .and_then(View::revert)
                .and_then(|r| self.tree.viewport(r.viewport))
                .map(Viewport::raw_area);
            if let Some(raw) = raw
                && let Some(v) = self.tree.view_mut(fs)
            {
                v.set_notebook_wished(raw);
            }
        }

        let focused = self.focused;
        for nb in self.tree.children_of_kind(viewports_layer, NodeKind::Notebook) {
            if let Some(nb) = self.tree.notebook_mut(nb) {
                let has_focus = focused.is_some() && nb.selected() == focused;
                nb.set_selected_has_focus(has_focus);
            }
        }

        for id in self.tree.children_of_kind(workspace, NodeKind::View) {
            if self.tree.view(id).is_some_and(|v| v.is(ManagedType::Popup)) {
                let anchor = self.tree.parent(id).and_then(|p| self.tree.view(p)).map(View::wished);
                if let Some(anchor) = anchor
                    && let Some(v) = self.tree.view_mut(id)
                {
                    let r = v.floating_wished();
                    let o = v.popup_offset;
                    v.set_floating_wished(Rect::new(anchor.x + o.x, anchor.y + o.y, r.w, r.h));
                }
                continue;
            }
            if let Some(request) = self.tree.view_mut(id).and_then(View::reconfigure) {
                self.requests.push(request);
            }
        }
    }

    /// Advances running transitions to `now`.
    pub fn tick(&mut self, now: Duration) {
        self.now = now;
        for (target, value) in self.transitions.advance(now) {
            match target {
                TransitionTarget::NotebookScroll(nb) => {
                    if let Some(nb) = self.tree.notebook_mut(nb) {
                        nb.rendered_scroll_offset = value;
                    }
                }
                TransitionTarget::ViewOpacity(view) => {
                    if let Some(v) = self.tree.view_mut(view) {
                        v.opacity = value;
                    }
                }
            }
            self.needs_redraw = true;
        }
    }

    /// ASCII rendering of the current workspace.
    pub fn dump_tree(&self) -> String { self.tree.dump(self.current_workspace()) }
}

fn seconds(s: f64) -> Duration { Duration::try_from_secs_f64(s).unwrap_or_default() }

fn allocate(tree: &mut Tree, theme: &Theme, node: NodeId, rect: Rect) {
    match tree.get_mut(node) {
        Some(Node::Split(split)) => {
            let (first, second) = split.set_allocation(rect, &theme.split);
            let packs = [(split.pack0(), first), (split.pack1(), second)];
            for (child, rect) in packs {
                if let Some(child) = child {
                    allocate(tree, theme, child, rect);
                }
            }
        }
        Some(Node::Notebook(nb)) => {
            nb.set_allocation(rect, theme);
            let client = nb.client_area();
            for tab in nb.tabs().to_vec() {
                if let Some(v) = tree.view_mut(tab) {
                    v.set_notebook_wished(client);
                }
            }
        }
        _ => {}
    }
}
