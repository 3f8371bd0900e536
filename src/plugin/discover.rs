/*
 *  plugin/discover.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Plugins-directory scan
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

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::constants::{PLUGIN_FILE_PREFIX, PLUGIN_FILE_SUFFIXES};

/// The per-user plugins directory, created on first use.
pub fn default_plugins_dir() -> Option<PathBuf> {
    let dir = dirs_next::data_dir()?.join("switchboard").join("plugins");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        info!("Could not create plugins directory {}: {}", dir.display(), e);
        return None;
    }
    Some(dir)
}

/// Whether a file is offered for loading: shared-library suffix and a
/// basename starting with `plugin_`.
pub fn is_plugin_file(path: &Path) -> bool {
    let has_suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PLUGIN_FILE_SUFFIXES.contains(&ext))
        .unwrap_or(false);
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(PLUGIN_FILE_PREFIX))
        .unwrap_or(false);
    has_suffix && has_prefix
}

/// Scan `dir` recursively for loadable plugin files, sorted for a stable
/// listing. A missing directory yields an empty list.
pub fn available_plugins(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(dir, &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Not scanning {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found);
        } else if is_plugin_file(&path) {
            debug!("{} is a plugin candidate", path.display());
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("switchboard-discover-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_is_plugin_file_rules() {
        assert!(is_plugin_file(Path::new("/p/plugin_cheats.so")));
        assert!(is_plugin_file(Path::new("/p/plugin_cheats.dll")));
        assert!(is_plugin_file(Path::new("/p/plugin_cheats.dylib")));
        assert!(!is_plugin_file(Path::new("/p/cheats.so")));
        assert!(!is_plugin_file(Path::new("/p/plugin_cheats.txt")));
        assert!(!is_plugin_file(Path::new("/p/plugin_cheats")));
    }

    #[test]
    fn test_scan_recurses_and_filters() {
        let dir = scratch_dir("scan");
        std::fs::write(dir.join("plugin_a.so"), b"").unwrap();
        std::fs::write(dir.join("b.so"), b"").unwrap();
        std::fs::write(dir.join("plugin_c.txt"), b"").unwrap();
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub").join("plugin_d.dylib"), b"").unwrap();

        let found = available_plugins(&dir);
        assert_eq!(
            found,
            vec![dir.join("plugin_a.so"), dir.join("sub").join("plugin_d.dylib")]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_of_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join("switchboard-discover-missing");
        assert!(available_plugins(&dir).is_empty());
    }
}
