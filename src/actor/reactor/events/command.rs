use tracing::{debug, info};

use crate::actor::reactor::error::ReactorError;
use crate::actor::reactor::{Command, Reactor};
use crate::common::config::Config;
use crate::layout_engine::{LayoutError, ManagedType, NodeId, SplitDirection, SplitOrientation};

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_command(reactor: &mut Reactor, cmd: Command) -> Result<(), ReactorError> {
        info!(?cmd);
        match cmd {
            Command::SwitchWorkspace(index) => {
                reactor.grab.cancel(&mut reactor.layout);
                reactor.layout.switch_workspace(index)?;
            }
            Command::CreateWorkspace => {
                let index = reactor.layout.create_workspace();
                debug!(index, "workspace created by command");
            }
            Command::CloseNotebook => {
                let notebook = Self::focused_notebook(reactor)
                    .or_else(|| reactor.layout.notebook_at(reactor.pointer));
                if let Some(notebook) = notebook {
                    reactor.layout.notebook_close(notebook)?;
                }
            }
            Command::SplitFocused(direction) => {
                let ws = reactor.layout.current_workspace();
                let notebook = match Self::focused_notebook(reactor) {
                    Some(nb) => Some(nb),
                    None => reactor.layout.default_notebook(ws),
                };
                if let Some(notebook) = notebook {
                    Self::split(reactor, notebook, direction)?;
                }
            }
            Command::ToggleFullscreen
            | Command::CloseFocused
            | Command::BindFocused
            | Command::FloatFocused => {
                let Some(view) = reactor.layout.focused() else {
                    debug!(?cmd, "nothing focused");
                    return Ok(());
                };
                Self::on_focused(reactor, cmd, view)?;
            }
        }
        Ok(())
    }

    pub fn handle_config_updated(reactor: &mut Reactor, mut new_cfg: Config) {
        let fixed = new_cfg.auto_fix_values();
        if fixed > 0 {
            info!(fixed, "corrected invalid config values");
        }
        reactor.grab.cancel(&mut reactor.layout);
        reactor.layout.set_config(new_cfg);
    }

    fn on_focused(reactor: &mut Reactor, cmd: Command, view: NodeId) -> Result<(), LayoutError> {
        let layout = &mut reactor.layout;
        match cmd {
            Command::ToggleFullscreen => layout.toggle_fullscreen(view),
            Command::CloseFocused => layout.close_view(view),
            Command::BindFocused => layout.bind_window(view, true),
            Command::FloatFocused => layout.unbind_window(view),
            _ => Ok(()),
        }
    }

    fn focused_notebook(reactor: &Reactor) -> Option<NodeId> {
        let layout = &reactor.layout;
        let view = layout.focused()?;
        if !layout.tree().view(view)?.is(ManagedType::Notebook) {
            return None;
        }
        layout.tree().parent(view).filter(|p| layout.tree().notebook(*p).is_some())
    }

    /// Splits off an empty notebook when the source one has room for two.
    fn split(reactor: &mut Reactor, notebook: NodeId, direction: SplitDirection) -> Result<(), LayoutError> {
        let nb = reactor.layout.tree().notebook(notebook).ok_or(LayoutError::UnknownNode(notebook))?;
        let room = match direction.orientation() {
            SplitOrientation::Vertical => nb.can_vsplit(),
            SplitOrientation::Horizontal => nb.can_hsplit(),
        };
        if !room {
            return Err(LayoutError::NoRoomToSplit);
        }
        reactor.layout.split(notebook, direction, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use crate::actor::reactor::tests::reactor;
    use crate::actor::reactor::{Command, Event, Reactor};
    use crate::common::config::Config;
    use crate::layout_engine::{ManagedType, Output, SplitDirection};
    use crate::model::{Rect, SurfaceId, SurfaceRequest, SurfaceRole};

    fn create(reactor: &mut Reactor, id: u64) {
        reactor.handle_event(Event::SurfaceCreated {
            surface: SurfaceId(id),
            width: 300,
            height: 200,
            role: SurfaceRole::Toplevel,
        });
    }

    #[test]
    fn close_focused_asks_the_client() {
        let (mut reactor, rx) = reactor();
        create(&mut reactor, 3);
        rx.try_iter().for_each(drop);
        reactor.handle_event(Event::Command(Command::CloseFocused));
        let sent: Vec<_> = rx.try_iter().map(|(_, r)| r).collect();
        assert_eq!(sent, vec![SurfaceRequest::Close { surface: SurfaceId(3) }]);
        assert!(reactor.layout().view_for(SurfaceId(3)).is_some());
    }

    #[test]
    fn toggle_fullscreen_round_trip() {
        let (mut reactor, _rx) = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::Command(Command::ToggleFullscreen));
        assert_eq!(reactor.snapshot().fullscreen.len(), 1);
        assert_eq!(reactor.snapshot().fullscreen[0].rect, Rect::new(0, 0, 1920, 1080));
        reactor.handle_event(Event::Command(Command::ToggleFullscreen));
        assert_eq!(reactor.snapshot().fullscreen.len(), 0);
        assert_eq!(reactor.snapshot().notebooks[0].tabs.len(), 1);
    }

    #[test]
    fn float_then_bind_focused() {
        let (mut reactor, _rx) = reactor();
        create(&mut reactor, 1);
        let view = reactor.layout().view_for(SurfaceId(1)).unwrap();
        reactor.handle_event(Event::Command(Command::FloatFocused));
        assert!(reactor.layout().tree().view(view).unwrap().is(ManagedType::Floating));
        reactor.handle_event(Event::Command(Command::BindFocused));
        assert!(reactor.layout().tree().view(view).unwrap().is(ManagedType::Notebook));
    }

    #[test]
    fn split_focused_then_close_notebook() {
        let (mut reactor, _rx) = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::Command(Command::SplitFocused(SplitDirection::Bottom)));
        assert_eq!(reactor.snapshot().notebooks.len(), 2);
        assert_eq!(reactor.snapshot().splits.len(), 1);

        reactor.handle_event(Event::Command(Command::CloseNotebook));
        assert_eq!(reactor.snapshot().notebooks.len(), 1);
        assert_eq!(reactor.snapshot().notebooks[0].tabs.len(), 1);
    }

    #[test]
    fn split_refused_without_room() {
        let (mut reactor, _rx) = reactor();
        reactor.handle_event(Event::OutputsChanged(vec![Output::new(0, Rect::new(0, 0, 600, 400))]));
        reactor.handle_event(Event::Command(Command::SplitFocused(SplitDirection::Right)));
        assert_eq!(reactor.snapshot().notebooks.len(), 1);
    }

    #[test]
    fn workspaces_are_created_and_switched() {
        let (mut reactor, _rx) = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::Command(Command::CreateWorkspace));
        reactor.handle_event(Event::Command(Command::SwitchWorkspace(1)));
        assert_eq!(reactor.layout().current_workspace_index(), 1);
        assert_eq!(reactor.snapshot().workspace, 1);
        assert_eq!(reactor.layout().focused(), None);

        reactor.handle_event(Event::Command(Command::SwitchWorkspace(0)));
        assert_eq!(reactor.layout().focused(), reactor.layout().view_for(SurfaceId(1)));
    }

    #[test]
    fn config_update_grows_workspaces() {
        let (mut reactor, _rx) = reactor();
        let mut config = Config::default();
        config.settings.workspace_count = 3;
        reactor.handle_event(Event::ConfigChanged(Box::new(config)));
        assert_eq!(reactor.layout().workspaces().len(), 3);
    }
}
