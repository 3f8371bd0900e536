/*
 *  main.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Standalone runner: hosts plugins against the mock console
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

use std::sync::Arc;
use std::time::Duration;

use env_logger::Env;
use log::{info, warn};

use switchboard::plugin::{available_plugins, default_plugins_dir};
use switchboard::system::MockSystem;
use switchboard::{config, PluginManager};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load()?;

    let default_level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("{} vers. {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let system = Arc::new(MockSystem::new());
    system.set_docked(cfg.docked());
    system.power_on("Mock Title", 0x0100_0000_0000_0000);

    let manager = PluginManager::new(system.clone());
    manager.set_list_changed_callback(Box::new(|| info!("Loaded plugin set changed")));
    manager.set_render_callback(Box::new(|pixmap| {
        info!("Overlay presented ({}x{})", pixmap.width(), pixmap.height());
    }));

    let plugins_dir = cfg
        .plugins_dir
        .clone()
        .or_else(default_plugins_dir)
        .ok_or("No plugins directory available")?;
    info!("Scanning {} for plugins", plugins_dir.display());

    let mut candidates = available_plugins(&plugins_dir);
    if let Some(selected) = cfg.plugins.as_ref() {
        candidates.retain(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| selected.iter().any(|wanted| wanted == name))
                .unwrap_or(false)
        });
    }
    if candidates.is_empty() {
        warn!("No plugins found under {}", plugins_dir.display());
    }
    for path in &candidates {
        if manager.load_plugin(path).is_err() {
            warn!("Skipping {}: {}", path.display(), manager.last_error());
        }
    }

    manager.set_active(true);

    let frame = Duration::from_micros(1_000_000 / cfg.target_fps() as u64);
    let mut presented: u64 = 0;
    loop {
        std::thread::sleep(frame);
        system.advance_frame();
        manager.process_vsync();
        presented += 1;
        if cfg.frames.map(|limit| presented >= limit).unwrap_or(false) {
            break;
        }
    }

    // Unload through the ordinary path, then give the scheduler a final
    // frame to complete the teardowns.
    for path in manager.loaded_plugins() {
        manager.remove_plugin(&path);
    }
    manager.process_vsync();
    std::thread::sleep(switchboard::constants::PACING_INTERVAL * 2);
    manager.set_active(false);

    info!("Presented {} frames, shutting down", presented);
    Ok(())
}
