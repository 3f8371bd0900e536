/*
 *  plugin/scheduler.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Cooperative scheduling between plugin workers and the frame pipeline
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

//! The baton pass. Each plugin has one worker thread running
//! [`worker_main`]; the emulator's vsync event and the manager's pacing
//! thread drive it through [`process_from_vsync`] and
//! [`process_from_pacing`]. At any instant exactly one side progresses:
//! the drivers park on the record's condvar while the worker runs, and
//! the worker parks while a driver observes it.
//!
//! Teardown is boundary-only: the enabled key-set is consulted each time
//! a worker parks at a main-loop boundary, never at a vsync boundary, so
//! `on_close` cannot interrupt a loop iteration in flight.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use log::{debug, error, info, trace};

use crate::constants::PACING_INTERVAL;
use crate::system::EmulatorSystem;

use super::dynlib;
use super::manager::ManagerShared;
use super::record::{ParkPoint, PluginRecord};

/// What woke the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Vsync,
    Pacing,
}

/// Body of a plugin's worker thread: wait for the baton, run one
/// main-loop pass, park, repeat until told to stop.
fn worker_main(record: Arc<PluginRecord>) {
    debug!("Worker for plugin '{}' started", record.name);
    loop {
        let mut gate = record.gate.lock().unwrap();
        while !gate.ready {
            gate = record.cv.wait(gate).unwrap();
        }
        gate.ready = false;
        if gate.stopped {
            // Reached only from a main-loop boundary; the terminal state
            // keeps counting as one for the scheduler's final look.
            record.set_park(&mut gate, ParkPoint::Stopped);
            drop(gate);
            record.cv.notify_all();
            break;
        }
        drop(gate);

        // The driver moved the park state to Running before waking us.
        unsafe { (record.main_loop)() };

        let mut gate = record.gate.lock().unwrap();
        record.set_park(&mut gate, ParkPoint::MainLoop);
        drop(gate);
        record.cv.notify_all();
    }
    debug!("Worker for plugin '{}' exited", record.name);
}

fn spawn_worker_if_needed(record: &Arc<PluginRecord>) -> bool {
    let mut worker = record.worker.lock().unwrap();
    if worker.is_some() {
        return true;
    }
    let thread_record = Arc::clone(record);
    let spawned = thread::Builder::new()
        .name(format!("plugin-{}", record.name))
        .spawn(move || worker_main(thread_record));
    match spawned {
        Ok(handle) => {
            *worker = Some(handle);
            true
        }
        Err(e) => {
            error!("Failed to spawn worker for plugin '{}': {}", record.name, e);
            false
        }
    }
}

/// Bind the HID applet resource once the guest process is far enough
/// along to own one. Until then every HID entry returns its sentinel.
fn bind_hid_if_ready(record: &PluginRecord) {
    let mut hid = record.hid.lock().unwrap();
    if hid.is_none() {
        *hid = record.system.hid();
        if hid.is_some() {
            debug!("Plugin '{}' acquired the HID facade", record.name);
        }
    }
}

/// Drive one pass: hand the baton to the worker and block until it parks
/// again. If it parked at a main-loop boundary and its path has left the
/// enabled key-set, mark it stopped and queue it for removal.
pub(crate) fn process_pass(shared: &ManagerShared, record: &Arc<PluginRecord>, trigger: Trigger) {
    if !spawn_worker_if_needed(record) {
        return;
    }
    bind_hid_if_ready(record);

    trace!("Pass on plugin '{}' ({:?})", record.name, trigger);
    {
        let mut gate = record.gate.lock().unwrap();
        record.set_park(&mut gate, ParkPoint::Running);
        gate.ready = true;
        record.cv.notify_all();
    }

    let mut gate = record.gate.lock().unwrap();
    while record.park_point() == ParkPoint::Running {
        gate = record.cv.wait(gate).unwrap();
    }

    if record.park_point() == ParkPoint::MainLoop
        && !shared.key_set.lock().unwrap().contains(&record.path)
    {
        gate.stopped = true;
        shared.pending_removal.lock().unwrap().push(Arc::clone(record));
        debug!("Plugin '{}' left the enabled set, queued for removal", record.name);
    }
}

/// Vsync entry point, invoked from the emulator's frame event. Every
/// plugin parked inside frame-advance is resumed and driven until it
/// parks there again (a plugin may run any number of complete main-loop
/// iterations between two frames) or is stopped.
pub(crate) fn process_from_vsync(shared: &ManagerShared) {
    let _drive = shared.drive.lock().unwrap();
    let plugins: Vec<_> = shared.plugins.lock().unwrap().clone();
    for record in &plugins {
        if record.park_point() != ParkPoint::Vsync {
            continue;
        }
        loop {
            process_pass(shared, record, Trigger::Vsync);
            if record.park_point() != ParkPoint::MainLoop {
                break;
            }
            if record.gate.lock().unwrap().stopped {
                break;
            }
        }
    }
    drain_removals(shared);
}

/// Pacing entry point, invoked periodically from the manager's pacing
/// thread. Performs exactly one pass per plugin parked at a main-loop
/// boundary; vsync-parked plugins wait for a real frame.
pub(crate) fn process_from_pacing(shared: &ManagerShared) {
    let _drive = shared.drive.lock().unwrap();
    let plugins: Vec<_> = shared.plugins.lock().unwrap().clone();
    for record in &plugins {
        if record.park_point() != ParkPoint::MainLoop {
            continue;
        }
        if record.gate.lock().unwrap().stopped {
            continue;
        }
        process_pass(shared, record, Trigger::Pacing);
    }
    drain_removals(shared);
}

/// Complete the unload of every queued record: fire `on_close` (on this
/// thread, with the worker parked), wake the worker into its exit path,
/// join it, close the library, drop the record, tell the UI.
pub(crate) fn drain_removals(shared: &ManagerShared) {
    let pending: Vec<_> = {
        let mut queue = shared.pending_removal.lock().unwrap();
        queue.drain(..).collect()
    };
    for record in pending {
        info!("Unloading plugin '{}'", record.name);
        if let Some(on_close) = record.on_close {
            unsafe { on_close() };
        }
        {
            let mut gate = record.gate.lock().unwrap();
            gate.ready = true;
            record.cv.notify_all();
        }
        if let Some(handle) = record.worker.lock().unwrap().take() {
            if handle.join().is_err() {
                error!("Worker for plugin '{}' panicked during shutdown", record.name);
            }
        }
        if let Some(lib) = record.lib.lock().unwrap().take() {
            dynlib::close(lib);
        }
        shared
            .plugins
            .lock()
            .unwrap()
            .retain(|other| !Arc::ptr_eq(other, &record));
        shared.notify_list_changed();
    }
}

/// Body of the manager's pacing thread. Sleeps a fixed slice of the
/// nominal refresh period and sweeps while the manager is active; exits
/// when the manager shuts down.
pub(crate) fn pacing_loop(shared: Arc<ManagerShared>) {
    debug!("Pacing thread started");
    while shared.pacing_run.load(Ordering::Relaxed) {
        thread::sleep(PACING_INTERVAL);
        if shared.active.load(Ordering::Relaxed) {
            process_from_pacing(&shared);
        }
    }
    debug!("Pacing thread exited");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, OnceLock};

    use super::*;
    use crate::plugin::ffi;
    use crate::system::MockSystem;

    fn test_shared() -> Arc<ManagerShared> {
        ManagerShared::new(Arc::new(MockSystem::new()))
    }

    fn insert_record(
        shared: &Arc<ManagerShared>,
        name: &str,
        main_loop: ffi::MainLoopFn,
        on_close: Option<ffi::CloseFn>,
    ) -> Arc<PluginRecord> {
        let path = PathBuf::from(format!("/tmp/{}.so", name));
        shared.key_set.lock().unwrap().insert(path.clone());
        let record = PluginRecord::new(
            path,
            name.to_string(),
            None,
            main_loop,
            on_close,
            shared.system.clone(),
            Arc::downgrade(shared),
        );
        shared.plugins.lock().unwrap().push(Arc::clone(&record));
        record
    }

    fn unload_all(shared: &Arc<ManagerShared>) {
        shared.key_set.lock().unwrap().clear();
        // A couple of sweeps: one to queue, the drain completes teardown.
        process_from_pacing(shared);
        process_from_vsync(shared);
        assert!(shared.plugins.lock().unwrap().is_empty());
    }

    static SINGLE_LOOPS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_plain() {
        SINGLE_LOOPS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_pass_runs_one_main_loop_iteration() {
        let shared = test_shared();
        let record = insert_record(&shared, "plugin_plain", loop_plain, None);

        assert_eq!(record.park_point(), ParkPoint::MainLoop);
        process_pass(&shared, &record, Trigger::Pacing);
        assert_eq!(SINGLE_LOOPS.load(Ordering::SeqCst), 1);
        // Handshake alternation: the pass always returns on a boundary.
        assert_eq!(record.park_point(), ParkPoint::MainLoop);

        process_pass(&shared, &record, Trigger::Pacing);
        assert_eq!(SINGLE_LOOPS.load(Ordering::SeqCst), 2);

        unload_all(&shared);
    }

    static FRESH_LOOPS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_fresh() {
        FRESH_LOOPS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_vsync_entry_ignores_main_loop_parked_plugins() {
        let shared = test_shared();
        let _record = insert_record(&shared, "plugin_fresh", loop_fresh, None);

        // A fresh record parks at the main-loop boundary; only the pacing
        // sweep may start it.
        process_from_vsync(&shared);
        assert_eq!(FRESH_LOOPS.load(Ordering::SeqCst), 0);

        process_from_pacing(&shared);
        assert_eq!(FRESH_LOOPS.load(Ordering::SeqCst), 1);

        unload_all(&shared);
    }

    static FA_RECORD: OnceLock<Arc<PluginRecord>> = OnceLock::new();
    static FA_LOOPS: AtomicU32 = AtomicU32::new(0);
    static FA_CALLS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_three_advances() {
        FA_LOOPS.fetch_add(1, Ordering::SeqCst);
        let record = FA_RECORD.get().expect("record registered before driving");
        for _ in 0..3 {
            FA_CALLS.fetch_add(1, Ordering::SeqCst);
            record.park_for_vsync();
        }
    }

    #[test]
    fn test_frame_advance_pairing_across_vsyncs() {
        let shared = test_shared();
        let record = insert_record(&shared, "plugin_advance", loop_three_advances, None);
        FA_RECORD.set(Arc::clone(&record)).ok();

        // Pacing starts the first iteration; it parks inside its first
        // frame-advance.
        process_from_pacing(&shared);
        assert_eq!(record.park_point(), ParkPoint::Vsync);
        assert_eq!(FA_LOOPS.load(Ordering::SeqCst), 1);
        assert_eq!(FA_CALLS.load(Ordering::SeqCst), 1);

        // The pacing sweep keys on main-loop boundaries only; a
        // vsync-parked plugin is left for the frame event.
        process_from_pacing(&shared);
        assert_eq!(FA_CALLS.load(Ordering::SeqCst), 1);

        // Three frames: two resume into the remaining frame-advances, the
        // third completes the iteration and starts the next one, which
        // parks at its own first frame-advance.
        for _ in 0..3 {
            process_from_vsync(&shared);
        }
        assert_eq!(FA_LOOPS.load(Ordering::SeqCst), 2);
        assert_eq!(FA_CALLS.load(Ordering::SeqCst), 4);
        assert_eq!(record.park_point(), ParkPoint::Vsync);

        // Unload: the in-flight iteration must finish its remaining two
        // frame-advances before teardown fires.
        shared.key_set.lock().unwrap().clear();
        process_from_vsync(&shared);
        process_from_vsync(&shared);
        process_from_vsync(&shared);
        assert_eq!(FA_LOOPS.load(Ordering::SeqCst), 2);
        assert!(shared.plugins.lock().unwrap().is_empty());
        assert_eq!(record.park_point(), ParkPoint::Stopped);
    }

    static CLOSE_RECORD: OnceLock<Arc<PluginRecord>> = OnceLock::new();
    static CLOSE_LOOPS: AtomicU32 = AtomicU32::new(0);
    static CLOSE_CALLS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_one_advance() {
        CLOSE_LOOPS.fetch_add(1, Ordering::SeqCst);
        CLOSE_RECORD
            .get()
            .expect("record registered before driving")
            .park_for_vsync();
    }
    unsafe extern "C" fn close_counting() {
        CLOSE_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_unload_mid_loop_fires_close_once_on_main_loop_boundary() {
        let shared = test_shared();
        let list_changes = Arc::new(AtomicU32::new(0));
        {
            let list_changes = Arc::clone(&list_changes);
            shared.set_list_changed_callback(Box::new(move || {
                list_changes.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let record =
            insert_record(&shared, "plugin_closing", loop_one_advance, Some(close_counting));
        CLOSE_RECORD.set(Arc::clone(&record)).ok();

        // Start the iteration; it parks mid-loop inside frame-advance.
        process_from_pacing(&shared);
        assert_eq!(record.park_point(), ParkPoint::Vsync);

        // The user unticks the plugin while its pass is in flight.
        shared.key_set.lock().unwrap().remove(&record.path);

        // No teardown at the vsync boundary: the close handle only fires
        // once the iteration runs to completion.
        assert_eq!(CLOSE_CALLS.load(Ordering::SeqCst), 0);
        process_from_vsync(&shared);

        assert_eq!(CLOSE_LOOPS.load(Ordering::SeqCst), 1);
        assert_eq!(CLOSE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(list_changes.load(Ordering::SeqCst), 1);
        assert!(shared.plugins.lock().unwrap().is_empty());
        assert!(record.worker.lock().unwrap().is_none());
        assert!(record.park_point().is_main_loop_boundary());

        // Idempotence: further sweeps neither close again nor notify.
        process_from_vsync(&shared);
        process_from_pacing(&shared);
        assert_eq!(CLOSE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(list_changes.load(Ordering::SeqCst), 1);
    }

    static PACED_LOOPS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_paced() {
        PACED_LOOPS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_removal_through_pacing_sweep() {
        let shared = test_shared();
        let record = insert_record(&shared, "plugin_paced", loop_paced, None);

        process_from_pacing(&shared);
        assert_eq!(PACED_LOOPS.load(Ordering::SeqCst), 1);

        shared.key_set.lock().unwrap().remove(&record.path);
        // The sweep drives one more pass, observes the key gone, and its
        // own drain completes the teardown.
        process_from_pacing(&shared);
        assert_eq!(PACED_LOOPS.load(Ordering::SeqCst), 2);
        assert!(shared.plugins.lock().unwrap().is_empty());
        assert_eq!(record.park_point(), ParkPoint::Stopped);
    }
}
