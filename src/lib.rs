/*
 *  lib.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Switchboard loads user-supplied native shared libraries into a
//! handheld-console emulator, runs each plugin's cooperative main loop on
//! its own worker thread, and interleaves those loops with the emulator's
//! frame pipeline. Plugins inspect and rewrite emulator state - guest
//! memory, HID buffers, the video overlay - between frames.
//!
//! The embedding emulator supplies a [`system::EmulatorSystem`]
//! implementation and calls [`PluginManager::process_vsync`] from its
//! frame event; everything else is driven from here.

pub mod config;
pub mod constants;
pub mod error;
pub mod hid;
pub mod overlay;
pub mod plugin;
pub mod system;

pub use error::PluginHostError;
pub use plugin::{available_plugins, default_plugins_dir, PluginManager, PLUGIN_INTERFACE_VERSION};
pub use system::{EmulatorSystem, MemoryRegion, MockSystem};
