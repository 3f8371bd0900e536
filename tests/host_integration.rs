/*
 *  tests/host_integration.rs
 *
 *  Integration tests for the plugin host public API
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 */

use std::path::PathBuf;
use std::sync::Arc;

use switchboard::plugin::available_plugins;
use switchboard::system::MockSystem;
use switchboard::{PluginHostError, PluginManager};

#[test]
fn test_load_rejects_missing_library_and_keeps_error() {
    let manager = PluginManager::new(Arc::new(MockSystem::new()));

    let result = manager.load_plugin("/nonexistent/plugin_ghost.so");
    assert!(matches!(result, Err(PluginHostError::LoadFailure(_))));

    // The platform error is retained for the UI.
    assert!(!manager.last_error().is_empty());
    assert!(manager.loaded_plugins().is_empty());
}

#[test]
fn test_load_rejects_non_library_file() {
    let dir = std::env::temp_dir().join(format!("switchboard-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("plugin_not_a_library.so");
    std::fs::write(&path, b"definitely not ELF").unwrap();

    let manager = PluginManager::new(Arc::new(MockSystem::new()));
    assert!(manager.load_plugin(&path).is_err());
    assert!(manager.loaded_plugins().is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_activation_is_idempotent_and_removal_of_unknown_is_noop() {
    let manager = PluginManager::new(Arc::new(MockSystem::new()));
    assert!(!manager.is_active());

    manager.set_active(true);
    manager.set_active(true);
    assert!(manager.is_active());
    manager.set_active(false);
    assert!(!manager.is_active());
    manager.set_active(true);
    assert!(manager.is_active());

    manager.remove_plugin(PathBuf::from("/nonexistent/plugin_ghost.so"));
    assert!(manager.loaded_plugins().is_empty());
}

#[test]
fn test_discovery_follows_filesystem_conventions() {
    let dir = std::env::temp_dir().join(format!("switchboard-it-scan-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(dir.join("plugin_one.so"), b"").unwrap();
    std::fs::write(dir.join("libother.so"), b"").unwrap();
    std::fs::write(dir.join("nested").join("plugin_two.dll"), b"").unwrap();
    std::fs::write(dir.join("plugin_readme.md"), b"").unwrap();

    let found = available_plugins(&dir);
    assert_eq!(
        found,
        vec![dir.join("nested").join("plugin_two.dll"), dir.join("plugin_one.so")]
    );

    std::fs::remove_dir_all(&dir).unwrap();
}
