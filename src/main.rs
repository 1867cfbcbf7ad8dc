use clap::Parser;
use crossterm::tty::IsTty;
use std::{
    io::{self, stdin, stdout, ErrorKind},
    path::{Path, PathBuf},
    process, thread,
    time::Duration,
};
use tarry::{
    config::{Config, ConfigStore, FileConfigStore},
    engine::Countdown,
    error::{Error, Result},
    keymap,
    logging,
    runtime::{CrosstermInputSource, FixedTicker, Runner},
    session::Session,
    terminal::{TerminalDisplay, TerminalGuard},
    ui::DEFAULT_TITLE,
};

/// countdown gate for shell scripts
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Shows a countdown bar and a keybinding legend. Exits 0 when the timer runs out or on 'c', 1 on 'q', or the configured code of a mapped key."
)]
pub struct Cli {
    /// timer in seconds
    #[clap(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    time: u64,

    /// title of the keybinding panel
    #[clap(long)]
    title: Option<String>,

    /// Keybinding mapping. Format: <retcode>:<key>:<label> (64 <= retcode <= 113)
    #[clap(short = 'm', long = "mapping", value_name = "MAPPING")]
    mappings: Vec<String>,

    /// read defaults (title, mappings) from this JSON file
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // help and version are not failures
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    if let Some(path) = logging::init() {
        tracing::debug!(path = %path.display(), "logging enabled");
    }

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            tracing::error!(%err, "exiting");
            eprintln!("tarry: {}", err);
            process::exit(err.exit_code());
        }
    }
}

/// A missing default file means no defaults; any file that exists must be
/// valid, whether named with `--config` or found at the default location.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source: io::Error::new(ErrorKind::NotFound, "no such file"),
                });
            }
            FileConfigStore::with_path(path).load()
        }
        None => FileConfigStore::new().load(),
    }
}

/// Validate everything, then either run the countdown UI or, without a
/// terminal, just sleep. Returns the process exit code.
fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?.merge(cli.title, cli.mappings);
    let keymap = keymap::resolve(&config.mappings)?;
    let total = Duration::from_secs(cli.time);
    let title = config.title.as_deref().filter(|t| !t.is_empty());

    if !stdin().is_tty() || !stdout().is_tty() {
        tracing::info!(secs = cli.time, "no terminal, sleeping");
        println!(
            "tarry - sleeping for {} seconds: '{}'",
            cli.time,
            title.unwrap_or(DEFAULT_TITLE)
        );
        thread::sleep(total);
        return Ok(0);
    }

    let outcome = {
        let mut guard = TerminalGuard::init()?;
        let mut display = TerminalDisplay::new(guard.terminal_mut(), &keymap, title);
        let mut events = Runner::new(CrosstermInputSource::new(), FixedTicker::default());
        Countdown::new(Session::new(total), &keymap).run(&mut events, &mut display)?
    };

    Ok(outcome.exit_code())
}
