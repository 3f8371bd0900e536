/*
 *  system/mod.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Abstract facade over the emulator core
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

//! The narrow slice of the emulator core the plugin host needs. The real
//! emulator implements [`EmulatorSystem`] over its kernel; tests and the
//! standalone runner use [`mock::MockSystem`].

pub mod mock;

use std::sync::Arc;

use crate::hid::HidFacade;

pub use mock::MockSystem;

/// A contiguous guest memory region (heap, main module, stack).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub size: u64,
}

/// Facade over the emulator core. Everything a host API entry may need,
/// and nothing else; the kernel's process, page table and timing stay on
/// the far side of this trait.
///
/// Calls made while no guest process is running must return the benign
/// defaults documented per method; the host never gates on powered-on
/// state before querying.
pub trait EmulatorSystem: Send + Sync {
    /// Pause guest execution.
    fn pause(&self);

    /// Resume guest execution.
    fn resume(&self);

    /// Whether a guest process is currently running.
    fn is_emulating(&self) -> bool;

    /// Whether guest execution is paused.
    fn is_paused(&self) -> bool;

    /// Frames presented since boot. 0 when not emulating.
    fn frame_count(&self) -> u64;

    /// Current presentation rate. 0.0 when not emulating.
    fn fps(&self) -> f64;

    /// Title of the running game, if any.
    fn rom_name(&self) -> Option<String>;

    /// Program ID of the running title. 0 when not emulating.
    fn program_id(&self) -> u64;

    /// Kernel process ID of the guest. 0 when not emulating.
    fn process_id(&self) -> u64;

    fn heap_region(&self) -> Option<MemoryRegion>;
    fn main_region(&self) -> Option<MemoryRegion>;
    fn stack_region(&self) -> Option<MemoryRegion>;

    /// Read guest memory. Returns false (leaving `out` untouched) when the
    /// range is not fully valid.
    fn read_memory(&self, address: u64, out: &mut [u8]) -> bool;

    /// Write guest memory. Returns false without a partial write when the
    /// range is not fully valid.
    fn write_memory(&self, address: u64, data: &[u8]) -> bool;

    /// Wall-clock ticks of the guest clock.
    fn clock_ticks(&self) -> u64;

    /// Elapsed CPU ticks.
    fn cpu_ticks(&self) -> u64;

    /// Whether the console is docked (drives the overlay resolution).
    fn is_docked(&self) -> bool;

    /// The HID applet resource, once the guest process is far enough along
    /// to own one. None before that point; callers re-query lazily.
    fn hid(&self) -> Option<Arc<dyn HidFacade>>;
}
