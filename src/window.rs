//! Emulation Window
//!
//! The window an emulated system renders into, and its SDL2 implementation.

use sdl2::event::{Event, WindowEvent};
use sdl2::pixels::Color;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2::EventPump;
use tracing::{debug, info};

use crate::error::{FrontendError, Result};
use crate::input::{BindingTable, ButtonState};
use crate::settings::Settings;

/// Top screen is 400x240, bottom screen 320x240, stacked
pub const SCREEN_WIDTH: u32 = 400;
pub const SCREEN_HEIGHT: u32 = 480;

/// Window an emulated system is bound to
pub trait EmuWindow {
    /// Whether the window is still open, and a close request hasn't yet been sent
    fn is_open(&self) -> bool;

    /// Process pending window and input events
    fn poll_events(&mut self);

    /// Present the current frame
    fn swap_buffers(&mut self);

    /// Bind the rendering context to the calling system
    fn make_current(&mut self);

    /// Release the rendering context
    fn done_current(&mut self);

    /// Current pressed state of the logical inputs
    fn pad_state(&self) -> ButtonState;
}

/// SDL2 emulation window
pub struct SdlWindow {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    bindings: BindingTable,
    pad: ButtonState,
    is_open: bool,
    _sdl: sdl2::Sdl,
}

impl SdlWindow {
    /// Create the window. Failure leaves nothing to tear down.
    pub fn new(settings: &Settings) -> Result<Self> {
        let sdl_context = sdl2::init().map_err(FrontendError::Window)?;
        let video_subsystem = sdl_context.video().map_err(FrontendError::Window)?;

        let title = format!("ctrfront {}", env!("CARGO_PKG_VERSION"));
        let window = video_subsystem
            .window(&title, SCREEN_WIDTH, SCREEN_HEIGHT)
            .position_centered()
            .build()
            .map_err(|e| FrontendError::Window(e.to_string()))?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| FrontendError::Window(e.to_string()))?;

        let event_pump = sdl_context.event_pump().map_err(FrontendError::Window)?;

        info!("created {}x{} emulation window", SCREEN_WIDTH, SCREEN_HEIGHT);

        Ok(Self {
            canvas,
            event_pump,
            bindings: settings.bindings.clone(),
            pad: ButtonState::default(),
            is_open: true,
            _sdl: sdl_context,
        })
    }

    fn on_key_event(&mut self, code: i32, pressed: bool) {
        if let Some(index) = self.bindings.lookup(code) {
            self.pad.set(index, pressed);
        }
    }
}

impl EmuWindow for SdlWindow {
    fn is_open(&self) -> bool {
        self.is_open
    }

    fn poll_events(&mut self) {
        while self.is_open {
            let Some(event) = self.event_pump.poll_event() else {
                break;
            };
            match event {
                Event::Quit { .. }
                | Event::Window {
                    win_event: WindowEvent::Close,
                    ..
                } => self.is_open = false,
                Event::KeyDown {
                    scancode: Some(scancode),
                    repeat: false,
                    ..
                } => self.on_key_event(scancode as i32, true),
                Event::KeyUp {
                    scancode: Some(scancode),
                    ..
                } => self.on_key_event(scancode as i32, false),
                _ => {}
            }
        }
    }

    fn swap_buffers(&mut self) {
        self.canvas.present();
    }

    fn make_current(&mut self) {
        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
    }

    fn done_current(&mut self) {
        self.pad = ButtonState::default();
    }

    fn pad_state(&self) -> ButtonState {
        self.pad
    }
}

impl Drop for SdlWindow {
    fn drop(&mut self) {
        debug!("destroying emulation window");
    }
}
