//! 3DS Emulator Frontend Library
//!
//! Command line handling, emulation bootstrap and the interactive key
//! rebinding window of an SDL2 frontend. The emulated core, the window and
//! the loaders are reached through the `System`, `EmuWindow` and `AppLoader`
//! seams.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod loader;
pub mod logging;
pub mod pacing;
pub mod rebind;
pub mod settings;
pub mod system;
pub mod window;
