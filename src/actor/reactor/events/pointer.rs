use tracing::{debug, trace};

use crate::actor::reactor::error::ReactorError;
use crate::actor::reactor::grab::Grab;
use crate::actor::reactor::{ButtonState, PointerButton, Reactor};
use crate::layout_engine::{FloatingHit, NodeId, NotebookButton};
use crate::model::{Point, Rect};

pub struct PointerEventHandler;

impl PointerEventHandler {
    pub fn handle_motion(reactor: &mut Reactor, p: Point) -> Result<(), ReactorError> {
        reactor.pointer = p;
        if reactor.grab.motion(&mut reactor.layout, p) {
            return Ok(());
        }
        reactor.layout.update_hover(p);
        if reactor.layout.config().settings.mouse_focus
            && let Some(view) = reactor.layout.view_at(p)
            && reactor.layout.focused() != Some(view)
        {
            trace!(?view, "focus follows mouse");
            reactor.layout.set_keyboard_focus(view)?;
        }
        Ok(())
    }

    pub fn handle_button(
        reactor: &mut Reactor,
        button: PointerButton,
        state: ButtonState,
    ) -> Result<(), ReactorError> {
        let p = reactor.pointer;
        if reactor.grab.button(&mut reactor.layout, p, state == ButtonState::Pressed) {
            return Ok(());
        }
        let wheel = reactor.layout.config().settings.wheel_scroll_step;
        match (button, state) {
            (PointerButton::Left, ButtonState::Pressed) => Self::left_pressed(reactor, p),
            (PointerButton::Forward, ButtonState::Pressed) => {
                Self::scroll_tabs_at(reactor, p, -wheel);
                Ok(())
            }
            (PointerButton::Back, ButtonState::Pressed) => {
                Self::scroll_tabs_at(reactor, p, wheel);
                Ok(())
            }
            (_, ButtonState::Released) => {
                if let Some(view) = reactor.layout.view_at(p) {
                    reactor.layout.set_keyboard_focus(view)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Wheel over a tab strip scrolls it. Both axes count the same.
    pub fn handle_axis(reactor: &mut Reactor, horizontal: i32, vertical: i32) {
        if reactor.grab.is_active() {
            return;
        }
        let steps = horizontal + vertical;
        if steps != 0 {
            let (p, px) = (reactor.pointer, steps * reactor.layout.config().settings.wheel_scroll_step);
            Self::scroll_tabs_at(reactor, p, px);
        }
    }

    fn scroll_tabs_at(reactor: &mut Reactor, p: Point, px: i32) {
        let Some(nb) = reactor.layout.notebook_at(p) else {
            return;
        };
        if reactor.layout.tree().notebook(nb).is_some_and(|n| n.tabs_area().contains(p)) {
            reactor.layout.scroll_notebook(nb, px);
        }
    }

    /// Left press, topmost target first: fullscreen clients, floating frames,
    /// split bars, then notebook buttons.
    fn left_pressed(reactor: &mut Reactor, p: Point) -> Result<(), ReactorError> {
        if reactor.layout.fullscreen_at(p).is_some() {
            return Ok(());
        }
        if let Some((view, hit)) = reactor.layout.floating_at(p) {
            return Self::floating_pressed(reactor, view, hit, p);
        }
        if let Some(split) = reactor.layout.split_bar_at(p) {
            let ratio = reactor.layout.tree().split(split).map(|s| s.ratio()).unwrap_or(0.5);
            return Ok(reactor.grab.start(Grab::drag_split(split, ratio))?);
        }
        if let Some(nb) = reactor.layout.notebook_at(p) {
            return Self::notebook_pressed(reactor, nb, p);
        }
        Ok(())
    }

    fn floating_pressed(
        reactor: &mut Reactor,
        view: NodeId,
        hit: FloatingHit,
        p: Point,
    ) -> Result<(), ReactorError> {
        debug!(?view, ?hit, "floating frame pressed");
        let layout = &mut reactor.layout;
        let rect = layout.tree().view(view).map(|v| v.wished()).unwrap_or_default();
        match hit {
            FloatingHit::Close => layout.close_view(view)?,
            FloatingHit::Bind => {
                layout.bind_window(view, true)?;
                layout.set_keyboard_focus(view)?;
            }
            FloatingHit::Title => reactor.grab.start(Grab::move_float(view, p, rect))?,
            FloatingHit::Edge(edge) => reactor.grab.start(Grab::resize_float(view, edge, p, rect))?,
            FloatingHit::Client => {}
        }
        Ok(())
    }

    fn notebook_pressed(reactor: &mut Reactor, nb: NodeId, p: Point) -> Result<(), ReactorError> {
        let Some(notebook) = reactor.layout.tree().notebook(nb) else {
            return Ok(());
        };
        let Some(button) = notebook.button_at(p) else {
            return Ok(());
        };
        debug!(?nb, ?button, "notebook button pressed");
        let (selected, can_hsplit, can_vsplit) =
            (notebook.selected(), notebook.can_hsplit(), notebook.can_vsplit());
        let pressed_rect = Self::pressed_rect(reactor, nb, button, p);
        let arrow = reactor.layout.config().settings.arrow_scroll_step;
        let layout = &mut reactor.layout;

        match button {
            NotebookButton::Close => layout.notebook_close(nb)?,
            NotebookButton::HSplit if can_hsplit => {
                layout.split_bottom(nb, None)?;
            }
            NotebookButton::VSplit if can_vsplit => {
                layout.split_right(nb, None)?;
            }
            NotebookButton::HSplit | NotebookButton::VSplit => {}
            NotebookButton::Mark => layout.set_default_notebook(nb)?,
            NotebookButton::Exposay => layout.start_exposay(nb)?,
            NotebookButton::CloseClient => {
                if let Some(view) = selected {
                    layout.close_view(view)?;
                }
            }
            NotebookButton::Unbind => {
                if let Some(view) = selected {
                    layout.unbind_window(view)?;
                }
            }
            NotebookButton::ScrollLeft => {
                layout.scroll_notebook(nb, -arrow);
            }
            NotebookButton::ScrollRight => {
                layout.scroll_notebook(nb, arrow);
            }
            NotebookButton::Tab(view) | NotebookButton::ExposayThumbnail(view) => {
                reactor.grab.start(Grab::rebind(view, pressed_rect))?;
            }
        }
        Ok(())
    }

    /// Rect of the tab or thumbnail under `p`, the grab start area of a
    /// rebind.
    fn pressed_rect(reactor: &Reactor, nb: NodeId, button: NotebookButton, p: Point) -> Rect {
        let Some(notebook) = reactor.layout.tree().notebook(nb) else {
            return Rect::default();
        };
        let candidates: Vec<Rect> = match button {
            NotebookButton::Tab(_) => std::iter::once(notebook.selected_box())
                .chain(notebook.tab_rects().iter().map(|(_, r)| *r))
                .collect(),
            NotebookButton::ExposayThumbnail(_) => {
                notebook.exposay_buttons().iter().map(|(_, r)| *r).collect()
            }
            _ => Vec::new(),
        };
        candidates.into_iter().find(|r| r.contains(p)).unwrap_or_default()
    }
}
