//! Key Rebinding
//!
//! Opens a small window, waits for exactly one key press and stores its
//! scancode under the chosen logical input in the `Controls` section.
//!
//! The loop polls without blocking and paces itself to at most 60 iterations
//! per second, so capture latency is bounded by one frame.

use sdl2::event::{Event, WindowEvent};
use sdl2::pixels::Color;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2::EventPump;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ConfigStore;
use crate::error::{FrontendError, Result};
use crate::input::{scancode_name, MAPPING};
use crate::pacing::{FramePacer, FPS};
use crate::settings::{Settings, CONTROLS_SECTION};

pub const REBIND_WINDOW_WIDTH: u32 = 640;
pub const REBIND_WINDOW_HEIGHT: u32 = 480;

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    WaitingForKey,
    Closed,
}

/// Events the capture loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The window's close button
    WindowClose,
    /// A key went down (physical scancode)
    KeyDown(i32),
    /// Application quit request
    Quit,
    /// Anything else
    Other,
}

/// Window the capture loop drives
pub trait CaptureSurface {
    /// Next pending event, without blocking
    fn poll_event(&mut self) -> Option<CaptureEvent>;

    /// Draw and present an idle frame
    fn render_idle(&mut self);
}

/// One capture session for the `index`-th logical input
pub struct KeyCapture<'a> {
    index: usize,
    store: &'a mut ConfigStore,
    state: SessionState,
    captured: Option<i32>,
    pacer: FramePacer,
}

impl<'a> KeyCapture<'a> {
    pub fn new(index: usize, store: &'a mut ConfigStore) -> Self {
        Self {
            index,
            store,
            state: SessionState::WaitingForKey,
            captured: None,
            pacer: FramePacer::new(FPS),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run until a key is captured or the window is closed.
    /// Returns the captured scancode, if any.
    pub fn run<S: CaptureSurface>(&mut self, surface: &mut S) -> Result<Option<i32>> {
        while self.state == SessionState::WaitingForKey {
            let frame_start = Instant::now();

            self.poll_events(surface)?;

            if self.state == SessionState::WaitingForKey {
                surface.render_idle();
                self.pacer.wait(frame_start);
            }
        }
        Ok(self.captured)
    }

    fn poll_events<S: CaptureSurface>(&mut self, surface: &mut S) -> Result<()> {
        while self.state == SessionState::WaitingForKey {
            let Some(event) = surface.poll_event() else {
                break;
            };
            match event {
                CaptureEvent::WindowClose | CaptureEvent::Quit => {
                    debug!("rebind window closed without a key press");
                    self.state = SessionState::Closed;
                }
                CaptureEvent::KeyDown(code) => self.on_key_down(code)?,
                CaptureEvent::Other => {}
            }
        }
        Ok(())
    }

    fn on_key_down(&mut self, code: i32) -> Result<()> {
        let key_name = MAPPING[self.index];
        self.state = SessionState::Closed;
        self.store.set_key(CONTROLS_SECTION, key_name, &code.to_string())?;
        self.captured = Some(code);
        info!(key = key_name, code, "binding saved to {}", self.store.path().display());
        Ok(())
    }
}

/// SDL2 window for the capture loop
pub struct SdlCaptureSurface {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    _sdl: sdl2::Sdl,
}

impl SdlCaptureSurface {
    pub fn new() -> Result<Self> {
        let sdl_context = sdl2::init().map_err(FrontendError::Window)?;
        let video_subsystem = sdl_context.video().map_err(FrontendError::Window)?;

        let title = format!("ctrfront {} | Rebinding keys", env!("CARGO_PKG_VERSION"));
        let window = video_subsystem
            .window(&title, REBIND_WINDOW_WIDTH, REBIND_WINDOW_HEIGHT)
            .position_centered()
            .build()
            .map_err(|e| FrontendError::Window(e.to_string()))?;

        let canvas = window
            .into_canvas()
            .accelerated()
            .build()
            .map_err(|e| FrontendError::Window(e.to_string()))?;

        let event_pump = sdl_context.event_pump().map_err(FrontendError::Window)?;

        Ok(Self {
            canvas,
            event_pump,
            _sdl: sdl_context,
        })
    }
}

impl CaptureSurface for SdlCaptureSurface {
    fn poll_event(&mut self) -> Option<CaptureEvent> {
        let event = self.event_pump.poll_event()?;
        Some(match event {
            Event::Window {
                win_event: WindowEvent::Close,
                ..
            } => CaptureEvent::WindowClose,
            Event::KeyDown {
                scancode: Some(scancode),
                ..
            } => CaptureEvent::KeyDown(scancode as i32),
            Event::Quit { .. } => CaptureEvent::Quit,
            _ => CaptureEvent::Other,
        })
    }

    fn render_idle(&mut self) {
        self.canvas.set_draw_color(Color::RGB(0xFF, 0xFF, 0xFF));
        self.canvas.clear();
        self.canvas.present();
    }
}

/// Interactively rebind the `index`-th logical input
pub fn rebind(index: usize, store: &mut ConfigStore, settings: &Settings) -> Result<()> {
    rebind_with(
        index,
        store,
        settings,
        SdlCaptureSurface::new,
        &mut io::stdout().lock(),
    )
}

/// Rebind using the surface `open_surface` creates, reporting to `out`.
/// The prompt only appears once the surface exists.
pub fn rebind_with<S, F, W>(
    index: usize,
    store: &mut ConfigStore,
    settings: &Settings,
    open_surface: F,
    out: &mut W,
) -> Result<()>
where
    S: CaptureSurface,
    F: FnOnce() -> Result<S>,
    W: Write,
{
    let key_name = MAPPING[index];
    let mut surface = open_surface()?;
    writeln!(
        out,
        "Press a key to bind to {} (currently {})...",
        key_name,
        scancode_name(settings.bindings.code(index))
    )?;
    out.flush()?;

    let mut capture = KeyCapture::new(index, store);
    match capture.run(&mut surface)? {
        Some(code) => writeln!(out, "Rebound {} to {}.", key_name, scancode_name(code))?,
        None => info!("{} left unchanged", key_name),
    }
    Ok(())
}
