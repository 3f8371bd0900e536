//! Global constants shared across the plugin host.

use std::time::Duration;

/// Nominal refresh rate of the console's display, in Hz.
pub const NOMINAL_REFRESH_HZ: u32 = 60;

/// Number of frame periods the pacing thread sleeps between sweeps.
pub const PACING_FRAMES: u32 = 4;

/// Interval between pacing sweeps. Plugins parked at a main-loop boundary
/// are driven once per sweep while the emulator produces no frames.
pub const PACING_INTERVAL: Duration =
    Duration::from_micros((PACING_FRAMES as u64 * 1_000_000) / NOMINAL_REFRESH_HZ as u64);

/// Overlay canvas size while the console is docked.
pub const DOCKED_WIDTH: u32 = 1920;
pub const DOCKED_HEIGHT: u32 = 1080;

/// Overlay canvas size in handheld (undocked) mode.
pub const HANDHELD_WIDTH: u32 = 1280;
pub const HANDHELD_HEIGHT: u32 = 720;

/// Basename prefix a shared library must carry to be offered for loading.
pub const PLUGIN_FILE_PREFIX: &str = "plugin_";

/// Shared-library suffixes accepted by the plugins-directory scan.
pub const PLUGIN_FILE_SUFFIXES: [&str; 3] = ["so", "dll", "dylib"];

/// Maximum number of controller slots, including the handheld slot.
pub const MAX_CONTROLLERS: usize = 10;

/// Maximum number of simultaneously tracked touch points.
pub const MAX_TOUCH_SLOTS: usize = 16;
