use tracing::debug;

use crate::actor::reactor::error::{GrabError, ReactorError};
use crate::actor::reactor::grab::Grab;
use crate::actor::reactor::Reactor;
use crate::layout_engine::{LayoutError, ManagedType, NodeId, ResizeEdge};
use crate::model::{SurfaceId, SurfaceRole};

pub struct SurfaceEventHandler;

impl SurfaceEventHandler {
    pub fn handle_surface_created(
        reactor: &mut Reactor,
        surface: SurfaceId,
        width: i32,
        height: i32,
        role: SurfaceRole,
    ) -> Result<(), ReactorError> {
        let view = reactor.layout.manage_surface(surface, width, height, role)?;
        debug!(%surface, ?view, ?role, "surface managed");
        Ok(())
    }

    pub fn handle_surface_committed(reactor: &mut Reactor, surface: SurfaceId) -> Result<(), ReactorError> {
        Ok(reactor.layout.surface_committed(surface)?)
    }

    pub fn handle_surface_destroyed(reactor: &mut Reactor, surface: SurfaceId) -> Result<(), ReactorError> {
        Ok(reactor.layout.destroy_surface(surface)?)
    }

    pub fn handle_title_changed(
        reactor: &mut Reactor,
        surface: SurfaceId,
        title: String,
    ) -> Result<(), ReactorError> {
        Ok(reactor.layout.set_title(surface, title)?)
    }

    /// Client-side move request. What gets moved depends on how the view is
    /// managed: floating windows follow the pointer, fullscreen views hop
    /// viewports and tabs are dragged to a drop zone.
    pub fn handle_start_move(reactor: &mut Reactor, surface: SurfaceId) -> Result<(), ReactorError> {
        let (view, ty) = Self::managed(reactor, surface)?;
        let grab = match ty {
            ManagedType::Floating => Grab::move_float(view, reactor.pointer, Self::wished(reactor, view)),
            ManagedType::Fullscreen => Grab::move_fullscreen(view),
            // No start rect, any release over a drop zone counts.
            ManagedType::Notebook => Grab::rebind(view, Default::default()),
            other => return Err(GrabError::Unsupported(other).into()),
        };
        Ok(reactor.grab.start(grab)?)
    }

    pub fn handle_start_resize(
        reactor: &mut Reactor,
        surface: SurfaceId,
        edge: ResizeEdge,
    ) -> Result<(), ReactorError> {
        let (view, ty) = Self::managed(reactor, surface)?;
        if ty != ManagedType::Floating {
            return Err(GrabError::Unsupported(ty).into());
        }
        let grab = Grab::resize_float(view, edge, reactor.pointer, Self::wished(reactor, view));
        Ok(reactor.grab.start(grab)?)
    }

    fn managed(reactor: &Reactor, surface: SurfaceId) -> Result<(NodeId, ManagedType), LayoutError> {
        let view = reactor.layout.view_for(surface).ok_or(LayoutError::UnknownSurface(surface))?;
        let ty = reactor
            .layout
            .tree()
            .view(view)
            .map(|v| v.managed_type())
            .ok_or(LayoutError::UnknownSurface(surface))?;
        Ok((view, ty))
    }

    fn wished(reactor: &Reactor, view: NodeId) -> crate::model::Rect {
        reactor.layout.tree().view(view).map(|v| v.wished()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use crate::actor::reactor::tests::reactor;
    use crate::actor::reactor::{ButtonState, Event, Grab, PointerButton};
    use crate::layout_engine::{ManagedType, Output};
    use crate::model::{DockEdge, Rect, SurfaceId, SurfaceRequest, SurfaceRole};

    #[test]
    fn transient_destroyed_with_parent_stays_floating() {
        let (mut reactor, _rx) = reactor();
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(1),
            width: 800,
            height: 600,
            role: SurfaceRole::Toplevel,
        });
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(2),
            width: 200,
            height: 100,
            role: SurfaceRole::Transient { parent: SurfaceId(1) },
        });
        reactor.handle_event(Event::SurfaceDestroyed(SurfaceId(1)));

        let layout = reactor.layout();
        assert_eq!(layout.view_for(SurfaceId(1)), None);
        let child = layout.view_for(SurfaceId(2)).unwrap();
        assert!(layout.tree().view(child).unwrap().is(ManagedType::Floating));
        assert_eq!(reactor.snapshot().floating.len(), 1);
    }

    #[test]
    fn titles_reach_the_tab_strip() {
        let (mut reactor, _rx) = reactor();
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(1),
            width: 10,
            height: 10,
            role: SurfaceRole::Toplevel,
        });
        reactor.handle_event(Event::TitleChanged(SurfaceId(1), "editor".into()));
        assert_eq!(reactor.snapshot().notebooks[0].tabs[0].title, "editor");
    }

    #[test]
    fn dock_reserves_output_edge() {
        let (mut reactor, rx) = reactor();
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(9),
            width: 1920,
            height: 30,
            role: SurfaceRole::Dock { edge: DockEdge::Bottom, size: 30 },
        });
        assert_eq!(reactor.snapshot().viewports[0].effective_area, Rect::new(0, 0, 1920, 1050));
        assert_eq!(reactor.snapshot().docks.len(), 1);
        assert!(rx.try_iter().any(|(_, r)| matches!(r, SurfaceRequest::Configure { surface: SurfaceId(9), .. })));
    }

    #[test]
    fn fullscreen_move_hops_to_other_output() {
        let (mut reactor, _rx) = reactor();
        reactor.handle_event(Event::OutputsChanged(vec![
            Output::new(0, Rect::new(0, 0, 1920, 1080)),
            Output::new(1, Rect::new(1920, 0, 1280, 1024)),
        ]));
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(1),
            width: 10,
            height: 10,
            role: SurfaceRole::Toplevel,
        });
        reactor.handle_event(Event::Command(crate::actor::reactor::Command::ToggleFullscreen));
        reactor.handle_event(Event::StartMove(SurfaceId(1)));
        assert!(matches!(reactor.grab().active(), Some(Grab::MovingFullscreenOwner { .. })));

        reactor.handle_event(Event::PointerMotion { x: 2000, y: 100 });
        assert_eq!(reactor.snapshot().grab_preview, Some(Rect::new(1920, 0, 1280, 1024)));
        reactor.handle_event(Event::PointerButton {
            button: PointerButton::Left,
            state: ButtonState::Released,
        });
        let view = reactor.layout().view_for(SurfaceId(1)).unwrap();
        assert_eq!(reactor.layout().tree().view(view).unwrap().wished(), Rect::new(1920, 0, 1280, 1024));
    }

    #[test]
    fn second_grab_request_is_refused() {
        let (mut reactor, _rx) = reactor();
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(1),
            width: 10,
            height: 10,
            role: SurfaceRole::Toplevel,
        });
        reactor.handle_event(Event::StartMove(SurfaceId(1)));
        reactor.handle_event(Event::StartMove(SurfaceId(1)));
        assert!(matches!(reactor.grab().active(), Some(Grab::RebindingClient { .. })));
    }
}
