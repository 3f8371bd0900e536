/*
 *  plugin/manager.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Lifecycle owner for the set of loaded plugins
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

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{error, info, warn};

use crate::error::PluginHostError;
use crate::overlay::{OverlayCanvas, RawFrame};
use crate::system::EmulatorSystem;

use super::bindings;
use super::dynlib;
use super::ffi;
use super::record::PluginRecord;
use super::scheduler;

/// Presents the overlay canvas; supplied by the render back-end.
pub type RenderCallback = Box<dyn Fn(&tiny_skia::Pixmap) + Send + Sync>;
/// Produces the current frame as raw RGBA; supplied by the render back-end.
pub type ScreenshotCallback = Box<dyn Fn() -> Option<RawFrame> + Send + Sync>;
/// Fired after the loaded set changes so the UI can refresh its list.
pub type ListChangedCallback = Box<dyn Fn() + Send + Sync>;
/// Shows a popup dialog: message, icon hint, severity.
pub type PopupCallback = Box<dyn Fn(&str, &str, ffi::PopupKind) + Send + Sync>;

#[derive(Default)]
pub(crate) struct HostCallbacks {
    pub render: Option<RenderCallback>,
    pub screenshot: Option<ScreenshotCallback>,
    pub list_changed: Option<ListChangedCallback>,
    pub popup: Option<PopupCallback>,
}

/// Manager state shared with plugin workers and the pacing thread.
pub(crate) struct ManagerShared {
    pub(crate) system: Arc<dyn EmulatorSystem>,

    /// Loaded records. A record stays here until its worker has observed
    /// the stop flag and exited.
    pub(crate) plugins: Mutex<Vec<Arc<PluginRecord>>>,

    /// The intended-loaded set; authoritative for unload decisions. The
    /// scheduler consults it at every main-loop boundary.
    pub(crate) key_set: Mutex<HashSet<PathBuf>>,

    /// Records whose teardown was decided during the current sweep.
    pub(crate) pending_removal: Mutex<Vec<Arc<PluginRecord>>>,

    pub(crate) last_error: Mutex<String>,
    pub(crate) active: AtomicBool,

    /// Cleared once, when the manager shuts down.
    pub(crate) pacing_run: AtomicBool,

    /// Serializes the vsync and pacing entry points; with two driver
    /// threads this is what keeps a record from being driven twice at
    /// once (the pacing sweep simply queues behind a long frame).
    pub(crate) drive: Mutex<()>,

    pub(crate) overlay: Mutex<OverlayCanvas>,
    pub(crate) callbacks: Mutex<HostCallbacks>,
}

impl ManagerShared {
    pub(crate) fn new(system: Arc<dyn EmulatorSystem>) -> Arc<Self> {
        let docked = system.is_docked();
        Arc::new(Self {
            system,
            plugins: Mutex::new(Vec::new()),
            key_set: Mutex::new(HashSet::new()),
            pending_removal: Mutex::new(Vec::new()),
            last_error: Mutex::new(String::new()),
            active: AtomicBool::new(false),
            pacing_run: AtomicBool::new(true),
            drive: Mutex::new(()),
            overlay: Mutex::new(OverlayCanvas::new(docked)),
            callbacks: Mutex::new(HostCallbacks::default()),
        })
    }

    pub(crate) fn notify_list_changed(&self) {
        let callbacks = self.callbacks.lock().unwrap();
        if let Some(cb) = callbacks.list_changed.as_ref() {
            cb();
        }
    }

    pub(crate) fn set_list_changed_callback(&self, cb: ListChangedCallback) {
        self.callbacks.lock().unwrap().list_changed = Some(cb);
    }
}

/// Reject any plugin whose reported interface version is not exactly the
/// host's.
pub(crate) fn check_interface_version(reported: Option<u64>) -> Result<(), PluginHostError> {
    match reported {
        Some(version) if version == ffi::PLUGIN_INTERFACE_VERSION => Ok(()),
        Some(version) => Err(PluginHostError::AbiMismatch {
            plugin: Some(version),
            host: ffi::PLUGIN_INTERFACE_VERSION,
        }),
        None => Err(PluginHostError::AbiMismatch {
            plugin: None,
            host: ffi::PLUGIN_INTERFACE_VERSION,
        }),
    }
}

/// The plugin manager: load, remove, enumerate, activate. One per
/// emulator instance; owns the pacing thread.
pub struct PluginManager {
    shared: Arc<ManagerShared>,
    pacing_thread: Mutex<Option<JoinHandle<()>>>,
}

impl PluginManager {
    pub fn new(system: Arc<dyn EmulatorSystem>) -> Self {
        Self {
            shared: ManagerShared::new(system),
            pacing_thread: Mutex::new(None),
        }
    }

    /// Enable or disable plugin scheduling. The pacing thread is spawned
    /// on the first activation and parks between sweeps while inactive;
    /// activation never touches the loaded set.
    pub fn set_active(&self, active: bool) {
        let was = self.shared.active.swap(active, Ordering::SeqCst);
        if active && !was {
            let mut slot = self.pacing_thread.lock().unwrap();
            if slot.is_none() {
                let shared = Arc::clone(&self.shared);
                match std::thread::Builder::new()
                    .name("plugin-pacing".to_string())
                    .spawn(move || scheduler::pacing_loop(shared))
                {
                    Ok(handle) => *slot = Some(handle),
                    Err(e) => error!("Failed to spawn pacing thread: {}", e),
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// The emulator's vsync hook. Resumes every plugin waiting inside
    /// frame-advance and completes pending unloads.
    pub fn process_vsync(&self) {
        if !self.is_active() {
            return;
        }
        scheduler::process_from_vsync(&self.shared);
    }

    /// Load a plugin from `path` and call its `start` exactly once. On
    /// failure nothing is loaded and the rendered error is kept for
    /// [`last_error`](Self::last_error).
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<(), PluginHostError> {
        let path = path.as_ref();
        if self.shared.key_set.lock().unwrap().contains(path) {
            warn!("Plugin {} is already loaded", path.display());
            return Ok(());
        }
        match self.try_load(path) {
            Ok(name) => {
                info!("{} successfully loaded", name);
                Ok(())
            }
            Err(e) => {
                error!("Plugin {} was not loaded with error: {}", path.display(), e);
                *self.shared.last_error.lock().unwrap() = e.to_string();
                Err(e)
            }
        }
    }

    fn try_load(&self, path: &Path) -> Result<String, PluginHostError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let lib = dynlib::open(path).map_err(PluginHostError::LoadFailure)?;

        let reported = unsafe {
            dynlib::resolve::<ffi::InterfaceVersionFn>(&lib, ffi::SYM_INTERFACE_VERSION)
        }
        .map(|version_fn| unsafe { version_fn() });
        check_interface_version(reported)?;

        let start = unsafe { dynlib::resolve::<ffi::StartFn>(&lib, ffi::SYM_START) }
            .ok_or(PluginHostError::MissingEntrypoint("start"))?;
        let main_loop = unsafe { dynlib::resolve::<ffi::MainLoopFn>(&lib, ffi::SYM_MAIN_LOOP) }
            .ok_or(PluginHostError::MissingEntrypoint("on_main_loop"))?;
        let on_close = unsafe { dynlib::resolve::<ffi::CloseFn>(&lib, ffi::SYM_CLOSE) };

        // Fill the plugin's host API slots before `start` so setup code
        // may already call back in.
        unsafe { bindings::connect(&lib) };

        let record = PluginRecord::new(
            path.to_path_buf(),
            name.clone(),
            Some(lib),
            main_loop,
            on_close,
            Arc::clone(&self.shared.system),
            Arc::downgrade(&self.shared),
        );

        self.shared.key_set.lock().unwrap().insert(path.to_path_buf());
        unsafe { start(record.context_ptr()) };
        self.shared.plugins.lock().unwrap().push(record);
        Ok(name)
    }

    /// Erase `path` from the intended-loaded set. The scheduler completes
    /// the teardown at the plugin's next main-loop boundary.
    pub fn remove_plugin(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if self.shared.key_set.lock().unwrap().remove(path) {
            info!("Plugin {} scheduled for removal", path.display());
        } else {
            warn!("Plugin {} is not loaded, nothing to remove", path.display());
        }
    }

    /// The intended-loaded set, sorted for stable listings.
    pub fn loaded_plugins(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.shared.key_set.lock().unwrap().iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Rendered message of the most recent load failure.
    pub fn last_error(&self) -> String {
        self.shared.last_error.lock().unwrap().clone()
    }

    pub fn set_render_callback(&self, cb: RenderCallback) {
        self.shared.callbacks.lock().unwrap().render = Some(cb);
    }

    pub fn set_screenshot_callback(&self, cb: ScreenshotCallback) {
        self.shared.callbacks.lock().unwrap().screenshot = Some(cb);
    }

    pub fn set_list_changed_callback(&self, cb: ListChangedCallback) {
        self.shared.set_list_changed_callback(cb);
    }

    pub fn set_popup_callback(&self, cb: PopupCallback) {
        self.shared.callbacks.lock().unwrap().popup = Some(cb);
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<ManagerShared> {
        &self.shared
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        // Plugins are expected to have gone through the ordinary unload
        // path already; here only the pacing thread is collected.
        self.shared.pacing_run.store(false, Ordering::SeqCst);
        if let Some(handle) = self.pacing_thread.lock().unwrap().take() {
            if handle.join().is_err() {
                error!("Pacing thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use super::*;
    use crate::plugin::record::ParkPoint;
    use crate::system::MockSystem;

    #[test]
    fn test_interface_version_must_match_exactly() {
        assert!(check_interface_version(Some(ffi::PLUGIN_INTERFACE_VERSION)).is_ok());

        let err = check_interface_version(Some(ffi::PLUGIN_INTERFACE_VERSION + 1))
            .expect_err("newer version must be rejected");
        let message = err.to_string();
        assert!(message.contains(&(ffi::PLUGIN_INTERFACE_VERSION + 1).to_string()));
        assert!(message.contains(&ffi::PLUGIN_INTERFACE_VERSION.to_string()));

        assert!(check_interface_version(None).is_err());
    }

    #[test]
    fn test_load_failure_records_last_error_and_loads_nothing() {
        let manager = PluginManager::new(Arc::new(MockSystem::new()));
        let result = manager.load_plugin("/nonexistent/plugin_ghost.so");
        assert!(matches!(result, Err(PluginHostError::LoadFailure(_))));
        assert!(!manager.last_error().is_empty());
        assert!(manager.loaded_plugins().is_empty());
        assert!(manager.shared().plugins.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_path_is_a_noop() {
        let manager = PluginManager::new(Arc::new(MockSystem::new()));
        manager.remove_plugin("/nonexistent/plugin_ghost.so");
        assert!(manager.loaded_plugins().is_empty());
    }

    static PACING_LOOPS: AtomicU32 = AtomicU32::new(0);
    unsafe extern "C" fn loop_counting() {
        PACING_LOOPS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_pacing_thread_progresses_plugins_without_vsync() {
        let manager = PluginManager::new(Arc::new(MockSystem::new()));
        let shared = Arc::clone(manager.shared());

        let path = PathBuf::from("/tmp/plugin_pacing_test.so");
        shared.key_set.lock().unwrap().insert(path.clone());
        let record = PluginRecord::new(
            path.clone(),
            "plugin_pacing_test".to_string(),
            None,
            loop_counting,
            None,
            Arc::clone(&shared.system),
            Arc::downgrade(&shared),
        );
        shared.plugins.lock().unwrap().push(Arc::clone(&record));

        manager.set_active(true);
        assert!(manager.is_active());
        // Flipping the flag again must not spawn a second thread.
        manager.set_active(false);
        manager.set_active(true);

        // A few pacing intervals, generously.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while PACING_LOOPS.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(PACING_LOOPS.load(Ordering::SeqCst) >= 2);

        // Unload through the ordinary path before the manager goes away.
        manager.remove_plugin(&path);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !shared.plugins.lock().unwrap().is_empty()
            && std::time::Instant::now() < deadline
        {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(shared.plugins.lock().unwrap().is_empty());
        assert_eq!(record.park_point(), ParkPoint::Stopped);
    }

    #[test]
    fn test_loaded_plugins_reports_key_set_sorted() {
        let manager = PluginManager::new(Arc::new(MockSystem::new()));
        let shared = manager.shared();
        shared.key_set.lock().unwrap().insert(PathBuf::from("/tmp/plugin_b.so"));
        shared.key_set.lock().unwrap().insert(PathBuf::from("/tmp/plugin_a.so"));
        assert_eq!(
            manager.loaded_plugins(),
            vec![PathBuf::from("/tmp/plugin_a.so"), PathBuf::from("/tmp/plugin_b.so")]
        );
    }
}
