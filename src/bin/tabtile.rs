use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tabtile::actor::{self, reactor};
use tabtile::actor::reactor::{Event, Reactor};
use tabtile::common::config::{Config, config_file};
use tabtile::common::log;
use tracing::{debug, info, warn};

#[derive(Parser)]
struct Cli {
    /// Config file to use instead of ~/.tabtile.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a recorded session instead of reading events from stdin. The
    /// recorded config wins over --config.
    #[arg(long, conflicts_with = "record")]
    replay: Option<PathBuf>,

    /// Record handled events to the specified file path. Overwrites the file
    /// if it exists.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Disable animations.
    #[arg(long)]
    no_animate: bool,

    /// What to print once every event was handled.
    #[arg(long, value_enum, default_value_t = Dump::Tree)]
    dump: Dump,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dump {
    /// ASCII rendering of the current workspace tree.
    Tree,
    /// JSON layout snapshot.
    Snapshot,
    None,
}

fn main() -> anyhow::Result<()> {
    let opt = Cli::parse();
    log::init_logging();

    let (requests_tx, requests_rx) = actor::channel();
    let reactor = match &opt.replay {
        Some(path) => reactor::replay(path, requests_tx)?,
        None => {
            let config = load_config(&opt)?;
            let record = reactor::Record::new(opt.record.as_deref())?;
            let mut reactor = Reactor::new(config, record, requests_tx);
            read_events(&mut reactor)?;
            reactor
        }
    };

    for (_, request) in requests_rx.try_iter() {
        debug!(?request, "surface request");
    }

    match opt.dump {
        Dump::Tree => println!("{}", reactor.layout().dump_tree()),
        Dump::Snapshot => println!("{}", reactor.snapshot().to_json()?),
        Dump::None => {}
    }
    Ok(())
}

fn load_config(opt: &Cli) -> anyhow::Result<Config> {
    let path = opt.config.clone().or_else(config_file);
    let mut config = Config::load_or_default(path.as_deref())
        .with_context(|| format!("loading config from {path:?}"))?;
    for issue in config.validate() {
        warn!(%issue, "config");
    }
    let fixed = config.auto_fix_values();
    if fixed > 0 {
        info!(fixed, "corrected invalid config values");
    }
    config.settings.animate &= !opt.no_animate;
    Ok(config)
}

/// One RON event per line. Blank lines and lines starting with `//` are
/// skipped.
fn read_events(reactor: &mut Reactor) -> anyhow::Result<()> {
    for (n, line) in std::io::stdin().lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let event: Event =
            ron::from_str(line).with_context(|| format!("parsing event on stdin line {}", n + 1))?;
        reactor.handle_event(event);
    }
    Ok(())
}
