//! Command-line argument parsing
//!
//! Turns the argument vector into exactly one `LaunchIntent`:
//! - `-h/--help`, `-v/--version`: print and exit
//! - `-l/--list-bindings`: print every binding and exit
//! - `-r/--rebind=KEY`: capture a new key for one binding
//! - otherwise launch the last bare path, optionally with `-g/--gdbport=N`
//!
//! When several of the exiting modes are given, the first one on the command
//! line runs.

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::{FrontendError, Result};
use crate::input::{self, scancode_name};
use crate::settings::Settings;

/// 3DS emulator frontend
#[derive(Parser, Debug)]
#[command(
    name = "ctrfront",
    about = "3DS emulator frontend",
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
pub struct CliArgs {
    /// Enable gdb stub on port NUMBER
    #[arg(short = 'g', long = "gdbport", value_name = "NUMBER", value_parser = parse_port)]
    pub gdbport: Option<u16>,

    /// List the current keybindings
    #[arg(short = 'l', long = "list-bindings")]
    pub list_bindings: bool,

    /// Rebind a key (see -l for key names)
    #[arg(short = 'r', long = "rebind", value_name = "KEY")]
    pub rebind: Option<String>,

    /// Display this help and exit
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Output version information and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Image to boot (the last one given wins)
    #[arg(value_name = "FILENAME")]
    pub paths: Vec<PathBuf>,

    /// Earliest mode flag on the command line
    #[arg(skip)]
    pub first_mode: Option<ModeFlag>,
}

/// Flags that select a mode other than launching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlag {
    Help,
    Version,
    ListBindings,
    Rebind,
}

/// Argument ids of the mode flags
const MODE_FLAGS: [(&str, ModeFlag); 4] = [
    ("help", ModeFlag::Help),
    ("version", ModeFlag::Version),
    ("list_bindings", ModeFlag::ListBindings),
    ("rebind", ModeFlag::Rebind),
];

/// The mode flag given first, by position on the command line
fn first_mode(matches: &ArgMatches) -> Option<ModeFlag> {
    MODE_FLAGS
        .iter()
        .filter(|(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
        .filter_map(|&(id, mode)| matches.index_of(id).map(|index| (index, mode)))
        .min_by_key(|&(index, _)| index)
        .map(|(_, mode)| mode)
}

/// What this invocation should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchIntent {
    ShowHelp,
    ShowVersion,
    ListBindings,
    /// Capture a new key for the binding at this catalog index
    RebindKey(usize),
    Launch {
        rom_path: PathBuf,
        gdb_port: Option<u16>,
    },
}

impl CliArgs {
    /// Parse the process arguments, exiting with a usage error on failure
    pub fn parse_args() -> Self {
        Self::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse `args` (including the program name)
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut parsed = Self::from_arg_matches(&matches)?;
        parsed.first_mode = first_mode(&matches);
        Ok(parsed)
    }

    /// Decide the mode. `program` is used in diagnostics.
    pub fn into_intent(self, program: &str) -> Result<LaunchIntent> {
        match self.first_mode {
            Some(ModeFlag::Help) => Ok(LaunchIntent::ShowHelp),
            Some(ModeFlag::Version) => Ok(LaunchIntent::ShowVersion),
            Some(ModeFlag::ListBindings) => Ok(LaunchIntent::ListBindings),
            Some(ModeFlag::Rebind) => {
                let name = self.rebind.unwrap_or_default();
                input::index_of(&name)
                    .map(LaunchIntent::RebindKey)
                    .ok_or_else(|| FrontendError::UnknownKeyName {
                        name,
                        program: program.to_string(),
                    })
            }
            None => {
                let rom_path = self.paths.into_iter().last().ok_or(FrontendError::NoTarget)?;
                Ok(LaunchIntent::Launch {
                    rom_path,
                    gdb_port: self.gdbport,
                })
            }
        }
    }
}

/// Parse a port number like `strtoul(s, _, 0)`: `0x` hex, leading `0` octal,
/// decimal otherwise. The whole string must be consumed.
pub fn parse_port(s: &str) -> std::result::Result<u16, String> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    let (digits, radix) = if let Some(hex) = hex {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("invalid port number: {:?}", s));
    }
    u16::from_str_radix(digits, radix).map_err(|_| format!("port number out of range: {}", s))
}

/// Usage text
pub fn help_text() -> String {
    CliArgs::command().render_help().to_string()
}

/// Version line
pub fn version_text() -> String {
    format!("ctrfront {}", env!("CARGO_PKG_VERSION"))
}

/// Print `name: key` for every binding, in catalog order
pub fn write_bindings(out: &mut impl Write, settings: &Settings) -> io::Result<()> {
    for (name, code) in settings.bindings.entries() {
        writeln!(out, "{}: {}", name, scancode_name(code))?;
    }
    Ok(())
}
