//! Modal pointer operations. At most one grab is active; while it is, it
//! sees every pointer event before the tree does.

use tracing::{debug, trace, warn};

use super::error::GrabError;
use crate::layout_engine::{
    DropZone, LayoutEngine, LayoutError, ManagedType, NodeId, ResizeEdge, SplitDirection,
};
use crate::model::{Point, Rect};

#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Grab {
    MovingFloat {
        view: NodeId,
        origin: Point,
        original: Rect,
    },
    ResizingFloat {
        view: NodeId,
        edge: ResizeEdge,
        origin: Point,
        original: Rect,
        pending: Rect,
    },
    DraggingSplit {
        split: NodeId,
        original: f64,
        pending: f64,
    },
    /// A tab dragged toward another notebook or a split zone. `start` is the
    /// rect of the pressed tab button.
    RebindingClient {
        view: NodeId,
        start: Rect,
        target: Option<(NodeId, DropZone)>,
    },
    MovingFullscreenOwner {
        view: NodeId,
        viewport: Option<NodeId>,
    },
}

impl Grab {
    pub fn name(&self) -> &'static str { self.into() }

    pub fn move_float(view: NodeId, origin: Point, original: Rect) -> Self {
        Grab::MovingFloat { view, origin, original }
    }

    pub fn resize_float(view: NodeId, edge: ResizeEdge, origin: Point, original: Rect) -> Self {
        Grab::ResizingFloat { view, edge, origin, original, pending: original }
    }

    pub fn drag_split(split: NodeId, ratio: f64) -> Self {
        Grab::DraggingSplit { split, original: ratio, pending: ratio }
    }

    pub fn rebind(view: NodeId, start: Rect) -> Self {
        Grab::RebindingClient { view, start, target: None }
    }

    pub fn move_fullscreen(view: NodeId) -> Self { Grab::MovingFullscreenOwner { view, viewport: None } }

    /// Whether the nodes this grab holds still exist in the expected state.
    fn is_live(&self, engine: &LayoutEngine) -> bool {
        let view_is = |view: NodeId, ty: ManagedType| engine.tree().view(view).is_some_and(|v| v.is(ty));
        match self {
            Grab::MovingFloat { view, .. } | Grab::ResizingFloat { view, .. } => {
                view_is(*view, ManagedType::Floating)
            }
            Grab::DraggingSplit { split, .. } => engine.tree().split(*split).is_some(),
            Grab::RebindingClient { view, .. } => engine.tree().view(*view).is_some(),
            Grab::MovingFullscreenOwner { view, .. } => view_is(*view, ManagedType::Fullscreen),
        }
    }

    /// Forgets a cached drop target or viewport that is gone or no longer
    /// on the current workspace.
    fn forget_stale_targets(&mut self, engine: &LayoutEngine) {
        let current = |node: NodeId| engine.workspace_of(node) == Some(engine.current_workspace());
        match self {
            Grab::RebindingClient { target, .. } => {
                if let Some((notebook, _)) = *target
                    && !(engine.tree().notebook(notebook).is_some() && current(notebook))
                {
                    *target = None;
                }
            }
            Grab::MovingFullscreenOwner { viewport, .. } => {
                if let Some(vp) = *viewport
                    && !(engine.tree().viewport(vp).is_some() && current(vp))
                {
                    *viewport = None;
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct GrabController {
    active: Option<Grab>,
}

impl GrabController {
    pub fn new() -> Self { Self::default() }

    pub fn is_active(&self) -> bool { self.active.is_some() }

    pub fn active(&self) -> Option<&Grab> { self.active.as_ref() }

    pub fn start(&mut self, grab: Grab) -> Result<(), GrabError> {
        if let Some(active) = &self.active {
            return Err(GrabError::AlreadyActive(active.name()));
        }
        debug!(grab = grab.name(), "grab start");
        self.active = Some(grab);
        Ok(())
    }

    /// Drops the active grab. A live floating move is put back where it
    /// started; other grabs never touched the tree.
    pub fn cancel(&mut self, engine: &mut LayoutEngine) {
        let Some(grab) = self.active.take() else {
            return;
        };
        debug!(grab = grab.name(), "grab cancel");
        if let Grab::MovingFloat { view, original, .. } = grab
            && grab_is_floating(engine, view)
        {
            log_failure(engine.set_floating_rect(view, original));
        }
        engine.request_redraw();
    }

    /// Clears a grab whose nodes went away. Returns true when the grab is
    /// still usable.
    fn revalidate(&mut self, engine: &LayoutEngine) -> bool {
        let Some(grab) = self.active.as_mut() else {
            return false;
        };
        if !grab.is_live(engine) {
            debug!(grab = grab.name(), "grab target went away, cancelling");
            self.active = None;
            return false;
        }
        grab.forget_stale_targets(engine);
        true
    }

    /// Feeds pointer motion to the active grab. Returns true when it was
    /// consumed.
    pub fn motion(&mut self, engine: &mut LayoutEngine, p: Point) -> bool {
        if !self.revalidate(engine) {
            return false;
        }
        let Some(grab) = self.active.as_mut() else {
            return false;
        };
        match grab {
            Grab::MovingFloat { view, origin, original } => {
                let rect = original.translate(p - *origin);
                log_failure(engine.set_floating_rect(*view, rect));
            }
            Grab::ResizingFloat { edge, origin, original, pending, .. } => {
                *pending = edge.apply(*original, p - *origin);
            }
            Grab::DraggingSplit { split, pending, .. } => {
                let proposed = engine.tree().split(*split).map(|s| s.ratio_at(p));
                if let Some(ratio) = proposed.and_then(|r| engine.constrain_split_ratio(*split, r)) {
                    *pending = ratio;
                }
            }
            Grab::RebindingClient { target, .. } => {
                if let Some(found) = engine.find_drop_target(p) {
                    *target = Some(found);
                }
            }
            Grab::MovingFullscreenOwner { viewport, .. } => {
                if let Some(found) = engine.find_mouse_viewport(p) {
                    *viewport = Some(found);
                }
            }
        }
        trace!(?p, grab = grab.name(), "grab motion");
        engine.request_redraw();
        true
    }

    /// A button release ends the grab and commits it. Presses are swallowed
    /// while a grab runs.
    pub fn button(&mut self, engine: &mut LayoutEngine, p: Point, pressed: bool) -> bool {
        if !self.revalidate(engine) {
            return false;
        }
        if pressed {
            return true;
        }
        let Some(grab) = self.active.take() else {
            return false;
        };
        debug!(grab = grab.name(), ?p, "grab release");
        match grab {
            Grab::MovingFloat { view, origin, original } => {
                log_failure(engine.set_floating_rect(view, original.translate(p - origin)));
            }
            Grab::ResizingFloat { view, pending, .. } => {
                log_failure(engine.set_floating_rect(view, pending));
            }
            Grab::DraggingSplit { split, pending, .. } => {
                log_failure(engine.set_split_ratio(split, pending).map(drop));
            }
            Grab::RebindingClient { view, start, target } => {
                let resolved = engine.find_drop_target(p).or(target);
                log_failure(release_rebind(engine, view, start, resolved, p));
            }
            Grab::MovingFullscreenOwner { view, viewport } => {
                if let Some(viewport) = viewport {
                    log_failure(engine.fullscreen_client_to_viewport(view, viewport));
                }
            }
        }
        engine.request_redraw();
        true
    }

    /// Outline of what releasing now would do.
    pub fn preview(&self, engine: &LayoutEngine) -> Option<Rect> {
        match self.active.as_ref()? {
            Grab::MovingFloat { .. } => None,
            Grab::ResizingFloat { pending, .. } => Some(*pending),
            Grab::DraggingSplit { split, pending, .. } => {
                engine.tree().split(*split).map(|s| s.compute_geometry(*pending).1)
            }
            Grab::RebindingClient { target, .. } => {
                let (nb, zone) = (*target)?;
                engine.tree().notebook(nb).map(|n| n.drop_preview(zone))
            }
            Grab::MovingFullscreenOwner { viewport, .. } => {
                engine.tree().viewport((*viewport)?).map(|vp| vp.raw_area())
            }
        }
    }
}

fn grab_is_floating(engine: &LayoutEngine, view: NodeId) -> bool {
    engine.tree().view(view).is_some_and(|v| v.is(ManagedType::Floating))
}

fn log_failure(result: Result<(), LayoutError>) {
    if let Err(err) = result {
        warn!(%err, "grab commit failed");
    }
}

fn release_rebind(
    engine: &mut LayoutEngine,
    view: NodeId,
    start: Rect,
    target: Option<(NodeId, DropZone)>,
    p: Point,
) -> Result<(), LayoutError> {
    let target = target
        .filter(|(notebook, _)| !start.contains(p) && engine.tree().notebook(*notebook).is_some());
    let Some((notebook, zone)) = target else {
        if grab_is_floating(engine, view) {
            engine.bind_window(view, true)?;
        }
        let shade = engine.config().settings.enable_shade_windows;
        let tiled = engine.tree().view(view).is_some_and(|v| v.is(ManagedType::Notebook));
        if shade && tiled && engine.tree().is_selected(view) {
            return engine.toggle_iconify(view);
        }
        engine.activate(view);
        return engine.set_keyboard_focus(view);
    };

    match SplitDirection::from_zone(zone) {
        Some(direction) => {
            engine.split(notebook, direction, Some(view))?;
            engine.activate(view);
        }
        None => {
            if engine.tree().parent(view) != Some(notebook) {
                engine.detach_view(view);
                engine.insert_window_in_notebook(view, Some(notebook), true)?;
                engine.relayout();
            }
            engine.set_keyboard_focus(view)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::Config;
    use crate::layout_engine::Output;
    use crate::model::{SurfaceId, SurfaceRole};

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(Config::default());
        engine.update_outputs(vec![Output::new(0, Rect::new(0, 0, 1920, 1080))]);
        engine
    }

    fn floating(engine: &mut LayoutEngine, id: u64, rect: Rect) -> NodeId {
        let view = engine.manage_surface(SurfaceId(id), rect.w, rect.h, SurfaceRole::Toplevel).unwrap();
        engine.unbind_window(view).unwrap();
        engine.set_floating_rect(view, rect).unwrap();
        view
    }

    fn root_notebook(engine: &mut LayoutEngine) -> NodeId {
        let ws = engine.current_workspace();
        engine.default_notebook(ws).unwrap()
    }

    #[test]
    fn move_grab_commits_pointer_delta() {
        let mut engine = engine();
        let view = floating(&mut engine, 1, Rect::new(0, 0, 40, 40));
        let mut grabs = GrabController::new();
        grabs.start(Grab::move_float(view, Point::new(50, 50), Rect::new(0, 0, 40, 40))).unwrap();

        assert!(grabs.motion(&mut engine, Point::new(60, 55)));
        assert_eq!(engine.tree().view(view).unwrap().wished(), Rect::new(10, 5, 40, 40));
        assert!(grabs.button(&mut engine, Point::new(70, 65), false));
        assert!(!grabs.is_active());
        assert_eq!(engine.tree().view(view).unwrap().wished(), Rect::new(20, 15, 40, 40));
    }

    #[test]
    fn only_one_grab_at_a_time() {
        let mut engine = engine();
        let view = floating(&mut engine, 1, Rect::new(0, 0, 40, 40));
        let mut grabs = GrabController::new();
        grabs.start(Grab::move_float(view, Point::new(0, 0), Rect::new(0, 0, 40, 40))).unwrap();
        let second = grabs.start(Grab::resize_float(view, ResizeEdge::Right, Point::new(0, 0), Rect::default()));
        assert_eq!(second, Err(GrabError::AlreadyActive("moving_float")));
        assert!(matches!(grabs.active(), Some(Grab::MovingFloat { .. })));
        assert!(grabs.button(&mut engine, Point::new(0, 0), true));
        assert!(grabs.is_active());
    }

    #[test]
    fn controller_is_free_again_after_cancel_or_release() {
        let mut engine = engine();
        let original = Rect::new(0, 0, 40, 40);
        let view = floating(&mut engine, 1, original);
        let mut grabs = GrabController::new();

        grabs.start(Grab::move_float(view, Point::new(0, 0), original)).unwrap();
        grabs.cancel(&mut engine);
        assert_eq!(grabs.start(Grab::move_float(view, Point::new(0, 0), original)), Ok(()));

        assert!(grabs.button(&mut engine, Point::new(10, 10), false));
        assert!(!grabs.is_active());
        assert_eq!(grabs.start(Grab::resize_float(view, ResizeEdge::Right, Point::new(0, 0), original)), Ok(()));
    }

    #[test]
    fn resize_applies_on_release_only() {
        let mut engine = engine();
        let original = Rect::new(10, 10, 100, 50);
        let view = floating(&mut engine, 1, original);
        let mut grabs = GrabController::new();
        grabs.start(Grab::resize_float(view, ResizeEdge::BottomRight, Point::new(110, 60), original)).unwrap();

        grabs.motion(&mut engine, Point::new(130, 90));
        assert_eq!(engine.tree().view(view).unwrap().wished(), original);
        assert_eq!(grabs.preview(&engine), Some(Rect::new(10, 10, 120, 80)));
        grabs.button(&mut engine, Point::new(130, 90), false);
        assert_eq!(engine.tree().view(view).unwrap().wished(), Rect::new(10, 10, 120, 80));
    }

    #[test]
    fn cancel_restores_moved_window() {
        let mut engine = engine();
        let original = Rect::new(100, 100, 40, 40);
        let view = floating(&mut engine, 1, original);
        let mut grabs = GrabController::new();
        grabs.start(Grab::move_float(view, Point::new(0, 0), original)).unwrap();
        grabs.motion(&mut engine, Point::new(300, 300));
        grabs.cancel(&mut engine);
        assert!(!grabs.is_active());
        assert_eq!(engine.tree().view(view).unwrap().wished(), original);
    }

    #[test]
    fn destroyed_target_cancels_grab() {
        let mut engine = engine();
        let view = floating(&mut engine, 1, Rect::new(0, 0, 40, 40));
        let mut grabs = GrabController::new();
        grabs.start(Grab::move_float(view, Point::new(0, 0), Rect::new(0, 0, 40, 40))).unwrap();
        engine.destroy_surface(SurfaceId(1)).unwrap();
        assert!(!grabs.motion(&mut engine, Point::new(5, 5)));
        assert!(!grabs.is_active());
    }

    #[test]
    fn split_drag_commits_constrained_ratio() {
        let mut engine = engine();
        let root = root_notebook(&mut engine);
        engine.split_right(root, None).unwrap();
        let split = engine.tree().parent(root).unwrap();
        let mut grabs = GrabController::new();
        grabs.start(Grab::drag_split(split, 0.5)).unwrap();

        grabs.motion(&mut engine, Point::new(5, 500));
        let Some(Grab::DraggingSplit { pending, .. }) = grabs.active().cloned() else {
            panic!("split grab ended early");
        };
        assert!(pending > 0.05 && pending < 0.5, "{pending}");
        assert_eq!(engine.tree().split(split).unwrap().ratio(), 0.5);

        grabs.button(&mut engine, Point::new(5, 500), false);
        assert_eq!(engine.tree().split(split).unwrap().ratio(), pending);
    }

    #[test]
    fn rebind_into_right_zone_splits() {
        let mut engine = engine();
        let root = root_notebook(&mut engine);
        engine.manage_surface(SurfaceId(1), 100, 100, SurfaceRole::Toplevel).unwrap();
        let b = engine.manage_surface(SurfaceId(2), 100, 100, SurfaceRole::Toplevel).unwrap();
        let start = engine.tree().notebook(root).unwrap().selected_box();

        let mut grabs = GrabController::new();
        grabs.start(Grab::rebind(b, start)).unwrap();
        grabs.motion(&mut engine, Point::new(1900, 540));
        assert_eq!(grabs.preview(&engine), Some(engine.tree().notebook(root).unwrap().areas().popup_right));
        grabs.button(&mut engine, Point::new(1900, 540), false);

        let new = engine.tree().parent(b).unwrap();
        assert_ne!(new, root);
        let split = engine.tree().split(engine.tree().parent(new).unwrap()).unwrap();
        assert_eq!((split.pack0(), split.pack1()), (Some(root), Some(new)));
    }

    #[test]
    fn rebind_forgets_closed_target_notebook() {
        let mut engine = engine();
        let root = root_notebook(&mut engine);
        let a = engine.manage_surface(SurfaceId(1), 100, 100, SurfaceRole::Toplevel).unwrap();
        engine.manage_surface(SurfaceId(2), 100, 100, SurfaceRole::Toplevel).unwrap();
        let right = engine.split_right(root, None).unwrap();
        let area = engine.tree().notebook(right).unwrap().allocation();
        let center = Point::new(area.x + area.w / 2, area.y + area.h / 2);

        let mut grabs = GrabController::new();
        grabs.start(Grab::rebind(a, Rect::default())).unwrap();
        grabs.motion(&mut engine, center);
        assert!(matches!(
            grabs.active(),
            Some(Grab::RebindingClient { target: Some((nb, _)), .. }) if *nb == right
        ));

        engine.notebook_close(right).unwrap();
        assert!(grabs.button(&mut engine, Point::new(5000, 5000), false));
        assert!(!grabs.is_active());
        assert_eq!(engine.tree().parent(a), Some(root));
        assert!(engine.tree().notebook(root).unwrap().contains(a));
    }

    #[test]
    fn rebind_released_on_start_rect_focuses() {
        let mut engine = engine();
        let root = root_notebook(&mut engine);
        let a = engine.manage_surface(SurfaceId(1), 100, 100, SurfaceRole::Toplevel).unwrap();
        engine.manage_surface(SurfaceId(2), 100, 100, SurfaceRole::Toplevel).unwrap();
        let start = engine
            .tree()
            .notebook(root)
            .unwrap()
            .tab_rects()
            .iter()
            .find(|(v, _)| *v == a)
            .map(|(_, r)| *r)
            .unwrap();

        let mut grabs = GrabController::new();
        grabs.start(Grab::rebind(a, start)).unwrap();
        let inside = Point::new(start.x + 1, start.y + 1);
        grabs.motion(&mut engine, inside);
        grabs.button(&mut engine, inside, false);
        assert_eq!(engine.focused(), Some(a));
        assert_eq!(engine.tree().notebook(root).unwrap().selected(), Some(a));
    }
}
