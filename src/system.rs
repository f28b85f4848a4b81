//! Emulated System
//!
//! Owns the session between system initialization and shutdown: the window
//! binding, the loaded image and the core step. Shutdown runs exactly once,
//! either explicitly or when the system is dropped.

use tracing::{debug, info};

use crate::input::ButtonState;
use crate::loader::{FileType, ResultStatus};
use crate::settings::Settings;
use crate::window::EmuWindow;

/// ARM11 cycles per emulated frame (268 MHz / 60)
pub const CYCLES_PER_FRAME: u64 = 4_468_724;

const MIB: usize = 1024 * 1024;

/// Kernel memory configuration required by an application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMode(u8);

impl SystemMode {
    /// 64 MiB application memory
    pub const PROD: SystemMode = SystemMode(0);
    /// 96 MiB application memory
    pub const DEV1: SystemMode = SystemMode(2);
    /// 80 MiB application memory
    pub const DEV2: SystemMode = SystemMode(3);
    /// 72 MiB application memory
    pub const DEV3: SystemMode = SystemMode(4);
    /// 32 MiB application memory
    pub const DEV4: SystemMode = SystemMode(5);

    /// Decode a raw mode code; undefined codes give `None`
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 | 2..=5 => Some(SystemMode(raw)),
            _ => None,
        }
    }

    /// Raw mode code
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Memory available to the application in this mode
    pub fn app_memory_bytes(&self) -> usize {
        match self.0 {
            0 => 64 * MIB,
            2 => 96 * MIB,
            3 => 80 * MIB,
            4 => 72 * MIB,
            _ => 32 * MIB,
        }
    }
}

/// Program image handed over by a loader
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Format the image came from
    pub file_type: FileType,
    /// Address execution starts at
    pub entry_point: u32,
    /// Memory the image occupies once mapped
    pub footprint: usize,
    /// Raw image contents
    pub data: Vec<u8>,
}

/// Gdb stub configuration for this session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdbStub {
    pub port: u16,
}

/// Emulated system bound to a window
pub struct System<'w> {
    window: &'w mut dyn EmuWindow,
    mode: SystemMode,
    gdbstub: Option<GdbStub>,
    image: Option<LoadedImage>,
    pad: ButtonState,
    ticks: u64,
    frames: u64,
    powered: bool,
}

impl<'w> System<'w> {
    /// Initialize the system on `window` in `mode`
    pub fn init(window: &'w mut dyn EmuWindow, mode: SystemMode, settings: &Settings) -> Self {
        window.make_current();

        let gdbstub = settings.use_gdbstub.then_some(GdbStub {
            port: settings.gdbstub_port,
        });
        match gdbstub {
            Some(stub) => info!("gdb stub enabled on port {}", stub.port),
            None => debug!("gdb stub disabled"),
        }

        info!(
            "system initialized (mode {}, {} MiB application memory)",
            mode.raw(),
            mode.app_memory_bytes() / MIB
        );

        Self {
            window,
            mode,
            gdbstub,
            image: None,
            pad: ButtonState::default(),
            ticks: 0,
            frames: 0,
            powered: true,
        }
    }

    /// Map a program image into memory
    pub fn load_image(&mut self, image: LoadedImage) -> ResultStatus {
        if self.image.is_some() {
            return ResultStatus::ErrorAlreadyLoaded;
        }
        if image.footprint > self.mode.app_memory_bytes() {
            return ResultStatus::ErrorMemoryAllocationFailed;
        }

        info!(
            "loaded {:?} image: {} bytes, entry 0x{:08X}",
            image.file_type, image.footprint, image.entry_point
        );
        self.image = Some(image);
        ResultStatus::Success
    }

    /// Execute one core step: a frame of emulated time, then present and poll
    pub fn run_loop(&mut self) {
        if !self.powered {
            return;
        }

        self.ticks += CYCLES_PER_FRAME;
        self.frames += 1;

        self.window.swap_buffers();
        self.window.poll_events();
        self.pad = self.window.pad_state();
    }

    /// Whether the bound window is still open
    pub fn is_window_open(&self) -> bool {
        self.window.is_open()
    }

    /// Shut the system down; later calls do nothing
    pub fn shutdown(&mut self) {
        if !self.powered {
            return;
        }
        self.powered = false;
        self.image = None;
        self.window.done_current();
        info!("system shut down after {} frames", self.frames);
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn gdbstub(&self) -> Option<GdbStub> {
        self.gdbstub
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    /// Pad state latched at the last core step
    pub fn pad(&self) -> ButtonState {
        self.pad
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }
}

impl Drop for System<'_> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
