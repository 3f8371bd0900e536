/*
 *  error.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Unified error type for plugin loading
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

use std::error::Error;
use std::fmt;

/// Errors observable on the host side of the plugin boundary.
///
/// Everything the plugin itself can observe is encoded as return-value
/// sentinels on the C ABI; this type only surfaces to the embedding UI.
#[derive(Debug)]
pub enum PluginHostError {
    /// The dynamic linker refused the library; carries the platform error.
    LoadFailure(String),

    /// The plugin reports an interface version other than the host's, or
    /// does not export the version query at all.
    AbiMismatch { plugin: Option<u64>, host: u64 },

    /// A required entry point is not exported by the library.
    MissingEntrypoint(&'static str),
}

impl fmt::Display for PluginHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginHostError::LoadFailure(msg) =>
                write!(f, "Failed to load library: {}", msg),
            PluginHostError::AbiMismatch { plugin: Some(plugin), host } =>
                write!(f, "Plugin interface version {} does not match host version {}",
                    plugin, host),
            PluginHostError::AbiMismatch { plugin: None, host } =>
                write!(f, "Plugin does not report an interface version (host version {})",
                    host),
            PluginHostError::MissingEntrypoint(symbol) =>
                write!(f, "Plugin does not export required entry point '{}'", symbol),
        }
    }
}

impl Error for PluginHostError {}
