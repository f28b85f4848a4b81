//! Emulation Bootstrap
//!
//! Drives one emulation session from window creation to shutdown. Every
//! resource is held by a local whose `Drop` releases it, so any early return
//! unwinds in reverse acquisition order: system shutdown, then the window.

use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::{FrontendError, Result};
use crate::loader::{self, ResultStatus};
use crate::pacing::FramePacer;
use crate::settings::Settings;
use crate::system::System;
use crate::window::EmuWindow;

/// Run `rom_path` until its window is closed, one frame per 1/60 s at most.
///
/// `settings` are the persisted settings; `gdb_port` overrides them.
/// `open_window` acquires the window the system is bound to.
pub fn run<W, F>(
    rom_path: &Path,
    gdb_port: Option<u16>,
    settings: &Settings,
    open_window: F,
) -> Result<()>
where
    W: EmuWindow,
    F: FnOnce(&Settings) -> Result<W>,
{
    let settings = settings.clone().with_gdbstub(gdb_port);

    let mut window = open_window(&settings)?;

    let mut loader = loader::get_loader(rom_path)
        .ok_or_else(|| FrontendError::NoLoader(rom_path.to_path_buf()))?;

    let system_mode = loader
        .load_kernel_system_mode()
        .ok_or(FrontendError::SystemMode)?;

    let mut system = System::init(&mut window, system_mode, &settings);

    let load_result = loader.load(&mut system);
    if load_result != ResultStatus::Success {
        return Err(FrontendError::Load(load_result));
    }

    info!("running {}", rom_path.display());
    let pacer = FramePacer::default();
    while system.is_window_open() {
        let frame_start = Instant::now();
        system.run_loop();
        pacer.wait(frame_start);
    }

    Ok(())
}
