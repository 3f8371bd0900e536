/*
 *  plugin/mod.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Plugin subsystem - loading, scheduling, ABI
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

//! The plugin host proper.
//!
//! Layers, leaves first:
//!
//! 1. **`dynlib`** - uniform open/resolve/close over the OS linker
//! 2. **`ffi`** - the stable C ABI surface (version, enums, slot types)
//! 3. **`record`** - per-plugin state and the park-state rendezvous
//! 4. **`scheduler`** - the cooperative handshake and teardown pipeline
//! 5. **`manager`** - lifecycle owner: load, remove, enumerate, activate
//! 6. **`bindings`** - host API registration and extern "C" glue
//! 7. **`discover`** - plugins-directory conventions

pub mod bindings;
pub mod discover;
pub mod dynlib;
pub mod ffi;
pub mod manager;
pub mod record;
pub mod scheduler;

pub use discover::{available_plugins, default_plugins_dir};
pub use ffi::PLUGIN_INTERFACE_VERSION;
pub use manager::{
    ListChangedCallback, PluginManager, PopupCallback, RenderCallback, ScreenshotCallback,
};
pub use record::{ParkPoint, PluginRecord};
