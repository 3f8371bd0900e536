/*
 *  plugin/dynlib.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Thin facade over the OS dynamic linker
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

use std::path::Path;

use libloading::Library;
use log::debug;

/// Open a shared library with lazy binding. On failure the trimmed
/// platform error string is returned for the last-error slot.
pub fn open(path: &Path) -> Result<Library, String> {
    debug!("Opening shared library: {}", path.display());
    unsafe { Library::new(path) }.map_err(describe)
}

/// Resolve a named symbol to a copyable value (a function pointer, or the
/// address of an exported object). Returns None when the symbol is absent.
///
/// # Safety
///
/// `T` must match the actual type of the exported symbol; `symbol` must be
/// NUL-terminated.
pub unsafe fn resolve<T: Copy>(lib: &Library, symbol: &[u8]) -> Option<T> {
    lib.get::<T>(symbol).ok().map(|sym| *sym)
}

/// Close a library handle. Destructive; must be called exactly once per
/// successful open (dropping the `Library` without this loses the error).
pub fn close(lib: Library) {
    if let Err(e) = lib.close() {
        log::warn!("Closing shared library failed: {}", describe(e));
    }
}

fn describe(err: libloading::Error) -> String {
    err.to_string().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library_reports_platform_error() {
        let result = open(Path::new("/nonexistent/plugin_missing.so"));
        let err = result.err().expect("open must fail");
        assert!(!err.is_empty());
    }
}
