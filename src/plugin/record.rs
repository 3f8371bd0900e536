/*
 *  plugin/record.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Per-plugin state and the park-state rendezvous
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

use std::os::raw::c_void;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::JoinHandle;

use libloading::Library;

use crate::hid::HidFacade;
use crate::system::EmulatorSystem;

use super::ffi;
use super::manager::ManagerShared;

/// Where a plugin's worker currently stands in the cooperative handshake.
///
/// The two boundary flags of the handshake form a small state machine, not
/// independent booleans: a parked worker is at exactly one boundary, and
/// the baton-holder is unambiguous at every instant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkPoint {
    /// The worker holds the baton and is inside plugin code.
    Running = 0,
    /// The worker is parked after `on_main_loop` returned (also the state
    /// of a freshly created record that has completed zero passes).
    MainLoop = 1,
    /// The worker is parked inside frame-advance, waiting for a vsync.
    Vsync = 2,
    /// The worker observed the stop flag and exited.
    Stopped = 3,
}

impl ParkPoint {
    fn from_raw(raw: u8) -> ParkPoint {
        match raw {
            0 => ParkPoint::Running,
            1 => ParkPoint::MainLoop,
            2 => ParkPoint::Vsync,
            _ => ParkPoint::Stopped,
        }
    }

    /// Whether teardown may fire from this state. Stopped counts: the
    /// worker reaches it only through a main-loop boundary.
    pub fn is_main_loop_boundary(self) -> bool {
        matches!(self, ParkPoint::MainLoop | ParkPoint::Stopped)
    }
}

/// Condvar-protected side of the rendezvous.
pub(crate) struct Gate {
    /// The baton: "the worker may proceed now". Cleared by the worker on
    /// every wake.
    pub ready: bool,
    /// "The worker must exit on its next wake at a main-loop boundary."
    pub stopped: bool,
}

/// Everything the host keeps per loaded plugin. Owned by the manager;
/// the worker thread holds a shared handle for the record's lifetime so a
/// brief manager-side release during a pass cannot drop it mid-call.
pub struct PluginRecord {
    pub(crate) path: PathBuf,
    pub(crate) name: String,

    /// Keeps the shared library mapped. Taken (and closed) exactly once
    /// during unload; None for records that were never backed by a
    /// library.
    pub(crate) lib: Mutex<Option<Library>>,

    /// Resolved `on_main_loop`, cached at load.
    pub(crate) main_loop: ffi::MainLoopFn,
    /// Resolved `on_close`, if the plugin exports one.
    pub(crate) on_close: Option<ffi::CloseFn>,

    /// The dedicated worker, spawned lazily on the first driven pass.
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,

    pub(crate) gate: Mutex<Gate>,
    pub(crate) cv: Condvar,

    // Written only while `gate` is held; readable lock-free by the entry
    // points' boundary scans.
    park: AtomicU8,

    /// HID applet resource, bound lazily once the guest process runs.
    pub(crate) hid: Mutex<Option<Arc<dyn HidFacade>>>,

    pub(crate) system: Arc<dyn EmulatorSystem>,
    pub(crate) manager: Weak<ManagerShared>,
}

impl PluginRecord {
    pub(crate) fn new(
        path: PathBuf,
        name: String,
        lib: Option<Library>,
        main_loop: ffi::MainLoopFn,
        on_close: Option<ffi::CloseFn>,
        system: Arc<dyn EmulatorSystem>,
        manager: Weak<ManagerShared>,
    ) -> Arc<Self> {
        Arc::new(Self {
            path,
            name,
            lib: Mutex::new(lib),
            main_loop,
            on_close,
            worker: Mutex::new(None),
            gate: Mutex::new(Gate { ready: false, stopped: false }),
            cv: Condvar::new(),
            park: AtomicU8::new(ParkPoint::MainLoop as u8),
            hid: Mutex::new(None),
            system,
            manager,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current park state. Relaxed is enough: every write happens under
    /// the gate mutex, and observers that act on the value re-check after
    /// taking that mutex.
    pub fn park_point(&self) -> ParkPoint {
        ParkPoint::from_raw(self.park.load(Ordering::Relaxed))
    }

    /// Transition the park state. Requires the gate guard so transitions
    /// stay serialized with the condvar protocol.
    pub(crate) fn set_park(&self, _gate: &mut Gate, point: ParkPoint) {
        self.park.store(point as u8, Ordering::Relaxed);
    }

    /// The frame-advance suspension point, executed on the worker thread
    /// from inside a plugin call: park at the vsync boundary, hand the
    /// baton back, and block until the scheduler hands it over again.
    pub(crate) fn park_for_vsync(&self) {
        let mut gate = self.gate.lock().unwrap();
        self.set_park(&mut gate, ParkPoint::Vsync);
        self.cv.notify_all();
        while !gate.ready {
            gate = self.cv.wait(gate).unwrap();
        }
        gate.ready = false;
        // The scheduler already moved the state back to Running before
        // setting `ready`; execution resumes inside the plugin.
    }

    /// HID facade handle, if bound yet. Must be checked on every call:
    /// `start` legitimately runs before the guest process exists.
    pub(crate) fn hid(&self) -> Option<Arc<dyn HidFacade>> {
        self.hid.lock().unwrap().clone()
    }

    /// The opaque context handed to the plugin's `start` and passed back
    /// on every host API call.
    pub(crate) fn context_ptr(self: &Arc<Self>) -> *mut c_void {
        Arc::as_ptr(self) as *mut c_void
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_point_raw_roundtrip() {
        assert_eq!(ParkPoint::from_raw(0), ParkPoint::Running);
        assert_eq!(ParkPoint::from_raw(1), ParkPoint::MainLoop);
        assert_eq!(ParkPoint::from_raw(2), ParkPoint::Vsync);
        assert_eq!(ParkPoint::from_raw(3), ParkPoint::Stopped);
    }

    #[test]
    fn test_main_loop_boundary_classification() {
        assert!(ParkPoint::MainLoop.is_main_loop_boundary());
        assert!(ParkPoint::Stopped.is_main_loop_boundary());
        assert!(!ParkPoint::Vsync.is_main_loop_boundary());
        assert!(!ParkPoint::Running.is_main_loop_boundary());
    }
}
