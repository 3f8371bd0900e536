/*
 *  system/mock.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  In-process emulator facade for tests and the standalone runner
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

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

use crate::hid::{HidFacade, MockHid};

use super::{EmulatorSystem, MemoryRegion};

// Guest tick rates: 19.2 MHz wall clock, 1020 MHz CPU.
const CLOCK_TICKS_PER_FRAME: u64 = 19_200_000 / 60;
const CPU_TICKS_PER_FRAME: u64 = 1_020_000_000 / 60;

struct MockInner {
    rom_name: Option<String>,
    program_id: u64,
    process_id: u64,
    heap: MemoryRegion,
    main: MemoryRegion,
    stack: MemoryRegion,
    memory: Vec<u8>,
    hid: Option<Arc<MockHid>>,
}

/// A console with no game in it: a fake guest process with a small flat
/// memory, fixed regions, and a [`MockHid`]. Powers on with `power_on`,
/// advances with `advance_frame`.
pub struct MockSystem {
    inner: Mutex<MockInner>,
    emulating: AtomicBool,
    paused: AtomicBool,
    docked: AtomicBool,
    frames: AtomicU64,
}

/// Base guest address of the mock's flat memory.
pub const MOCK_MEMORY_BASE: u64 = 0x0800_0000;
/// Size of the mock's flat memory.
pub const MOCK_MEMORY_SIZE: u64 = 0x1_0000;

impl MockSystem {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockInner {
                rom_name: None,
                program_id: 0,
                process_id: 0,
                heap: MemoryRegion { start: MOCK_MEMORY_BASE, size: MOCK_MEMORY_SIZE / 2 },
                main: MemoryRegion {
                    start: MOCK_MEMORY_BASE + MOCK_MEMORY_SIZE / 2,
                    size: MOCK_MEMORY_SIZE / 4,
                },
                stack: MemoryRegion {
                    start: MOCK_MEMORY_BASE + 3 * MOCK_MEMORY_SIZE / 4,
                    size: MOCK_MEMORY_SIZE / 4,
                },
                memory: vec![0; MOCK_MEMORY_SIZE as usize],
                hid: None,
            }),
            emulating: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            docked: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    /// Boot a fake guest process.
    pub fn power_on(&self, rom_name: &str, program_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.rom_name = Some(rom_name.to_string());
        inner.program_id = program_id;
        inner.process_id = 0x51;
        inner.hid = Some(Arc::new(MockHid::new()));
        drop(inner);
        self.frames.store(0, Ordering::Relaxed);
        self.emulating.store(true, Ordering::Relaxed);
        info!("Mock guest '{}' powered on", rom_name);
    }

    /// Stop the fake guest process.
    pub fn power_off(&self) {
        self.emulating.store(false, Ordering::Relaxed);
        let mut inner = self.inner.lock().unwrap();
        inner.rom_name = None;
        inner.program_id = 0;
        inner.process_id = 0;
        inner.hid = None;
    }

    pub fn set_docked(&self, docked: bool) {
        self.docked.store(docked, Ordering::Relaxed);
    }

    /// Present one frame.
    pub fn advance_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// The mock HID, for test inspection.
    pub fn mock_hid(&self) -> Option<Arc<MockHid>> {
        self.inner.lock().unwrap().hid.clone()
    }

    fn span(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let end = address.checked_add(len as u64)?;
        if address < MOCK_MEMORY_BASE || end > MOCK_MEMORY_BASE + MOCK_MEMORY_SIZE {
            return None;
        }
        let offset = (address - MOCK_MEMORY_BASE) as usize;
        Some(offset..offset + len)
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorSystem for MockSystem {
    fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    fn is_emulating(&self) -> bool {
        self.emulating.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn fps(&self) -> f64 {
        if self.is_emulating() {
            60.0
        } else {
            0.0
        }
    }

    fn rom_name(&self) -> Option<String> {
        self.inner.lock().unwrap().rom_name.clone()
    }

    fn program_id(&self) -> u64 {
        self.inner.lock().unwrap().program_id
    }

    fn process_id(&self) -> u64 {
        self.inner.lock().unwrap().process_id
    }

    fn heap_region(&self) -> Option<MemoryRegion> {
        if !self.is_emulating() {
            return None;
        }
        Some(self.inner.lock().unwrap().heap)
    }

    fn main_region(&self) -> Option<MemoryRegion> {
        if !self.is_emulating() {
            return None;
        }
        Some(self.inner.lock().unwrap().main)
    }

    fn stack_region(&self) -> Option<MemoryRegion> {
        if !self.is_emulating() {
            return None;
        }
        Some(self.inner.lock().unwrap().stack)
    }

    fn read_memory(&self, address: u64, out: &mut [u8]) -> bool {
        if !self.is_emulating() {
            return false;
        }
        let inner = self.inner.lock().unwrap();
        match self.span(address, out.len()) {
            Some(range) => {
                out.copy_from_slice(&inner.memory[range]);
                true
            }
            None => false,
        }
    }

    fn write_memory(&self, address: u64, data: &[u8]) -> bool {
        if !self.is_emulating() {
            return false;
        }
        let mut inner = self.inner.lock().unwrap();
        match self.span(address, data.len()) {
            Some(range) => {
                inner.memory[range].copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    fn clock_ticks(&self) -> u64 {
        self.frame_count() * CLOCK_TICKS_PER_FRAME
    }

    fn cpu_ticks(&self) -> u64 {
        self.frame_count() * CPU_TICKS_PER_FRAME
    }

    fn is_docked(&self) -> bool {
        self.docked.load(Ordering::Relaxed)
    }

    fn hid(&self) -> Option<Arc<dyn HidFacade>> {
        if !self.is_emulating() {
            return None;
        }
        self.inner
            .lock()
            .unwrap()
            .hid
            .clone()
            .map(|hid| hid as Arc<dyn HidFacade>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powered_off_returns_sentinels() {
        let system = MockSystem::new();
        assert!(!system.is_emulating());
        assert_eq!(system.program_id(), 0);
        assert!(system.heap_region().is_none());
        assert!(system.hid().is_none());

        let mut buf = [0u8; 4];
        assert!(!system.read_memory(MOCK_MEMORY_BASE, &mut buf));
    }

    #[test]
    fn test_memory_roundtrip_and_bounds() {
        let system = MockSystem::new();
        system.power_on("test", 0x0100_0000_0000_0001);

        assert!(system.write_memory(MOCK_MEMORY_BASE + 0x10, &[1, 2, 3, 4]));
        let mut buf = [0u8; 4];
        assert!(system.read_memory(MOCK_MEMORY_BASE + 0x10, &mut buf));
        assert_eq!(buf, [1, 2, 3, 4]);

        // Straddling the end of the region must not partially write.
        let end = MOCK_MEMORY_BASE + MOCK_MEMORY_SIZE - 2;
        assert!(!system.write_memory(end, &[9, 9, 9, 9]));
        let mut tail = [0u8; 2];
        assert!(system.read_memory(end, &mut tail));
        assert_eq!(tail, [0, 0]);
    }

    #[test]
    fn test_ticks_follow_frames() {
        let system = MockSystem::new();
        system.power_on("test", 1);
        system.advance_frame();
        system.advance_frame();
        assert_eq!(system.frame_count(), 2);
        assert_eq!(system.clock_ticks(), 2 * CLOCK_TICKS_PER_FRAME);
        assert_eq!(system.cpu_ticks(), 2 * CPU_TICKS_PER_FRAME);
    }
}
