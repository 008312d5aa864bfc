//! Event recording and replay.
//!
//! A recording is a text file with one RON value per line: the config the
//! reactor started with, then every event it handled, in order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use super::{Event, Reactor};
use crate::actor;
use crate::common::config::Config;
use crate::model::SurfaceRequest;

pub struct Record {
    file: Option<BufWriter<File>>,
}

impl Record {
    pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating recording {}", path.display()))?;
                info!(path = %path.display(), "recording events");
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Record { file })
    }

    pub fn is_recording(&self) -> bool { self.file.is_some() }

    pub(super) fn start(&mut self, config: &Config) {
        self.write_line(config);
    }

    pub(super) fn on_event(&mut self, event: &Event) {
        self.write_line(event);
    }

    fn write_line<T: serde::Serialize>(&mut self, value: &T) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = write_ron_line(file, value) {
            warn!(%err, "recording failed, no longer recording");
            self.file = None;
        }
    }
}

fn write_ron_line<T: serde::Serialize>(file: &mut BufWriter<File>, value: &T) -> anyhow::Result<()> {
    let line = ron::to_string(value)?;
    writeln!(file, "{line}")?;
    file.flush()?;
    Ok(())
}

/// Feeds a recording into a fresh reactor and returns it once every event
/// was handled. Surface requests go to `requests_tx`.
pub fn replay(path: &Path, requests_tx: actor::Sender<SurfaceRequest>) -> anyhow::Result<Reactor> {
    let file = File::open(path).with_context(|| format!("opening recording {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let config_line = lines.next().context("recording is empty")??;
    let config: Config = ron::from_str(&config_line).context("parsing recorded config")?;
    let mut reactor = Reactor::new(config, Record::new(None)?, requests_tx);
    for (n, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event =
            ron::from_str(&line).with_context(|| format!("parsing event on line {}", n + 2))?;
        reactor.handle_event(event);
    }
    Ok(reactor)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::layout_engine::Output;
    use crate::model::{Rect, SurfaceId, SurfaceRole};

    #[test]
    fn recorded_session_replays_to_same_layout() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.settings.animate = false;
        let (tx, _rx) = actor::channel();
        let mut reactor = Reactor::new(config, Record::new(Some(file.path())).unwrap(), tx);
        for event in [
            Event::OutputsChanged(vec![Output::new(0, Rect::new(0, 0, 1280, 720))]),
            Event::SurfaceCreated {
                surface: SurfaceId(1),
                width: 640,
                height: 480,
                role: SurfaceRole::Toplevel,
            },
            Event::TitleChanged(SurfaceId(1), "shell".into()),
            Event::Command(super::super::Command::FloatFocused),
        ] {
            reactor.handle_event(event);
        }

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 5);

        let (tx, _rx) = actor::channel();
        let replayed = replay(file.path(), tx).unwrap();
        assert!(!replayed.layout().config().settings.animate);
        assert_eq!(replayed.snapshot(), reactor.snapshot());
    }

    #[test]
    fn bad_line_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", ron::to_string(&Config::default()).unwrap()).unwrap();
        writeln!(file, "not_an_event(1)").unwrap();
        let (tx, _rx) = actor::channel();
        let err = replay(file.path(), tx).err().unwrap();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }
}
