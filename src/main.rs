//! 3DS Emulator Frontend - Entry Point
//!
//! Parses the command line, loads the persisted settings and either runs one
//! of the informational modes, the key rebinding window, or an emulation
//! session.

use std::io::{self, Write};
use std::process::ExitCode;
use tracing::error;

use ctrfront::cli::{self, CliArgs, LaunchIntent};
use ctrfront::config::{self, ConfigStore};
use ctrfront::error::Result;
use ctrfront::settings::Settings;
use ctrfront::window::SdlWindow;
use ctrfront::{bootstrap, logging, rebind};

fn main() -> ExitCode {
    // Usage errors (including a bad --gdbport) exit here, before anything else
    let args = CliArgs::parse_args();
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "ctrfront".to_string());

    // A broken store still yields default settings; only the modes that
    // need the store report it
    let store = config::default_path().and_then(|path| ConfigStore::open(&path));
    let settings = store.as_ref().map(Settings::from_store).unwrap_or_default();
    logging::init(&settings.log_filter);

    match run(args, &program, store, &settings, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(
    args: CliArgs,
    program: &str,
    store: anyhow::Result<ConfigStore>,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<()> {
    match args.into_intent(program)? {
        LaunchIntent::ShowHelp => write!(out, "{}", cli::help_text())?,
        LaunchIntent::ShowVersion => writeln!(out, "{}", cli::version_text())?,
        LaunchIntent::ListBindings => {
            store?;
            cli::write_bindings(out, settings)?;
        }
        LaunchIntent::RebindKey(index) => rebind::rebind(index, &mut store?, settings)?,
        LaunchIntent::Launch { rom_path, gdb_port } => {
            store?;
            bootstrap::run(&rom_path, gdb_port, settings, SdlWindow::new)?
        }
    }
    Ok(())
}
