//! The reactor owns the layout engine and is the only thing that mutates it.
//!
//! It takes input events from the surface layer, routes pointer events to the
//! active grab or to the node under the pointer, and sends the resulting
//! surface requests back out. Every event runs to completion before the next
//! one is looked at.

mod error;
mod events;
mod grab;
mod replay;

use std::thread;
use std::time::Duration;

pub use error::{GrabError, ReactorError};
use events::command::CommandEventHandler;
use events::pointer::PointerEventHandler;
use events::surface::SurfaceEventHandler;
pub use grab::{Grab, GrabController};
use num_enum::{IntoPrimitive, TryFromPrimitive};
pub use replay::{Record, replay};
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{debug, instrument, trace, warn};

use crate::actor;
use crate::common::config::Config;
use crate::layout_engine::{LayoutEngine, LayoutSnapshot, Output, ResizeEdge, SplitDirection};
use crate::model::{Point, SurfaceId, SurfaceRequest, SurfaceRole};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// A client mapped a new surface. Toplevels are tiled, the other roles
    /// are placed relative to their parent or their output edge.
    SurfaceCreated {
        surface: SurfaceId,
        width: i32,
        height: i32,
        #[serde(default)]
        role: SurfaceRole,
    },
    /// The client attached content to the surface.
    SurfaceCommitted(SurfaceId),
    SurfaceDestroyed(SurfaceId),
    TitleChanged(SurfaceId, String),

    /// Client-initiated interactive move, usually from its own decorations.
    StartMove(SurfaceId),
    StartResize {
        surface: SurfaceId,
        edge: ResizeEdge,
    },

    PointerMotion {
        x: i32,
        y: i32,
    },
    PointerButton {
        button: PointerButton,
        state: ButtonState,
    },
    /// Scroll wheel, in steps. Positive values scroll right or down.
    PointerAxis {
        horizontal: i32,
        vertical: i32,
    },

    /// The full output set. An empty set keeps the current layout.
    OutputsChanged(Vec<Output>),
    Command(Command),
    ConfigChanged(Box<Config>),

    /// Advances running transitions to `now`, measured from an arbitrary
    /// fixed origin.
    Tick(#[serde_as(as = "DurationMilliSeconds<u64>")] Duration),
}

/// Linux input button codes.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive
)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum PointerButton {
    Left = 0x110,
    Right = 0x111,
    Middle = 0x112,
    Side = 0x113,
    Extra = 0x114,
    Forward = 0x115,
    Back = 0x116,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ToggleFullscreen,
    CloseFocused,
    BindFocused,
    FloatFocused,
    SwitchWorkspace(usize),
    CreateWorkspace,
    SplitFocused(SplitDirection),
    /// Closes the notebook holding the focused view, or the one under the
    /// pointer when nothing is focused.
    CloseNotebook,
}

pub struct Reactor {
    layout: LayoutEngine,
    grab: GrabController,
    pointer: Point,
    requests_tx: actor::Sender<SurfaceRequest>,
    record: Record,
    snapshot: LayoutSnapshot,
}

impl Reactor {
    pub fn spawn(
        config: Config,
        record: Record,
        requests_tx: actor::Sender<SurfaceRequest>,
    ) -> std::io::Result<Sender> {
        let (events_tx, events) = actor::channel();
        thread::Builder::new().name("reactor".to_string()).spawn(move || {
            Reactor::new(config, record, requests_tx).run(events);
        })?;
        Ok(events_tx)
    }

    pub fn new(config: Config, mut record: Record, requests_tx: actor::Sender<SurfaceRequest>) -> Reactor {
        record.start(&config);
        let layout = LayoutEngine::new(config);
        let snapshot = layout.snapshot();
        Reactor {
            layout,
            grab: GrabController::new(),
            pointer: Point::default(),
            requests_tx,
            record,
            snapshot,
        }
    }

    pub fn run(mut self, events: Receiver) {
        for (span, event) in events.iter() {
            let _guard = span.enter();
            self.handle_event(event);
        }
        debug!("event channel closed, reactor exiting");
    }

    pub fn layout(&self) -> &LayoutEngine { &self.layout }

    pub fn grab(&self) -> &GrabController { &self.grab }

    pub fn pointer(&self) -> Point { self.pointer }

    /// State of the last layout pass, with the outline of the active grab.
    pub fn snapshot(&self) -> &LayoutSnapshot { &self.snapshot }

    fn log_event(&self, event: &Event) {
        match event {
            Event::PointerMotion { .. } | Event::Tick(_) => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event=?event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        self.record.on_event(&event);
        let result = match event {
            Event::SurfaceCreated { surface, width, height, role } => {
                SurfaceEventHandler::handle_surface_created(self, surface, width, height, role)
            }
            Event::SurfaceCommitted(surface) => {
                SurfaceEventHandler::handle_surface_committed(self, surface)
            }
            Event::SurfaceDestroyed(surface) => {
                SurfaceEventHandler::handle_surface_destroyed(self, surface)
            }
            Event::TitleChanged(surface, title) => {
                SurfaceEventHandler::handle_title_changed(self, surface, title)
            }
            Event::StartMove(surface) => SurfaceEventHandler::handle_start_move(self, surface),
            Event::StartResize { surface, edge } => {
                SurfaceEventHandler::handle_start_resize(self, surface, edge)
            }
            Event::PointerMotion { x, y } => {
                PointerEventHandler::handle_motion(self, Point::new(x, y))
            }
            Event::PointerButton { button, state } => {
                PointerEventHandler::handle_button(self, button, state)
            }
            Event::PointerAxis { horizontal, vertical } => {
                PointerEventHandler::handle_axis(self, horizontal, vertical);
                Ok(())
            }
            Event::OutputsChanged(outputs) => {
                self.layout.update_outputs(outputs);
                Ok(())
            }
            Event::Command(cmd) => CommandEventHandler::handle_command(self, cmd),
            Event::ConfigChanged(config) => {
                CommandEventHandler::handle_config_updated(self, *config);
                Ok(())
            }
            Event::Tick(now) => {
                self.layout.tick(now);
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(%err, "event rejected");
        }
        self.flush();
    }

    /// Sends queued surface requests and refreshes the snapshot when the
    /// layout changed.
    fn flush(&mut self) {
        for request in self.layout.take_requests() {
            self.requests_tx.send(request);
        }
        if self.layout.take_redraw() {
            self.snapshot = self.layout.snapshot();
            self.snapshot.grab_preview = self.grab.preview(&self.layout);
        }
    }
}
