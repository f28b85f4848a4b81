//! Settings
//!
//! Process-wide settings, built once from the persistent store and then
//! overridden by command line flags.

use std::str::FromStr;
use tracing::warn;

use crate::config::ConfigStore;
use crate::input::{BindingTable, MAPPING};

pub const CONTROLS_SECTION: &str = "Controls";
pub const DEBUGGING_SECTION: &str = "Debugging";
pub const MISC_SECTION: &str = "Miscellaneous";

pub const DEFAULT_GDBSTUB_PORT: u16 = 24689;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Frontend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Start the gdb stub with the system
    pub use_gdbstub: bool,
    /// Port the gdb stub listens on
    pub gdbstub_port: u16,
    /// `tracing` filter directives
    pub log_filter: String,
    /// Key bindings
    pub bindings: BindingTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_gdbstub: false,
            gdbstub_port: DEFAULT_GDBSTUB_PORT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            bindings: BindingTable::default(),
        }
    }
}

impl Settings {
    /// Read settings from the store, falling back to defaults per key
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Self::default();

        let mut bindings = defaults.bindings.clone();
        for (index, name) in MAPPING.iter().enumerate() {
            let code = read_or(store, CONTROLS_SECTION, name, bindings.code(index));
            bindings.set(index, code);
        }

        Self {
            use_gdbstub: read_or(store, DEBUGGING_SECTION, "use_gdbstub", defaults.use_gdbstub),
            gdbstub_port: read_or(store, DEBUGGING_SECTION, "gdbstub_port", defaults.gdbstub_port),
            log_filter: store
                .get(MISC_SECTION, "log_filter")
                .map(str::to_string)
                .unwrap_or(defaults.log_filter),
            bindings,
        }
    }

    /// Apply the `--gdbport` override
    pub fn with_gdbstub(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.use_gdbstub = true;
            self.gdbstub_port = port;
        }
        self
    }
}

fn read_or<T: FromStr + Copy>(store: &ConfigStore, section: &str, key: &str, default: T) -> T {
    match store.get(section, key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("invalid value {:?} for {}.{}, using default", raw, section, key);
            default
        }),
        None => default,
    }
}
