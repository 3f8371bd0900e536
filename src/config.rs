/*
 *  config.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Layered configuration for the standalone runner
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

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Runner configuration. All fields optional so file and CLI layers can
/// be merged; effective defaults are applied by the accessors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Log filter, e.g. "info" or "debug".
    pub log_level: Option<String>,
    /// Directory scanned for plugin files.
    pub plugins_dir: Option<PathBuf>,
    /// Start the mock console docked.
    pub docked: Option<bool>,
    /// Frame rate the runner drives vsync at.
    pub target_fps: Option<u32>,
    /// Stop after this many frames (run until interrupted otherwise).
    pub frames: Option<u64>,
    /// Basenames of the plugins to enable; everything discovered when
    /// empty.
    pub plugins: Option<Vec<String>>,
}

impl Config {
    pub fn target_fps(&self) -> u32 {
        self.target_fps.unwrap_or(crate::constants::NOMINAL_REFRESH_HZ)
    }

    pub fn docked(&self) -> bool {
        self.docked.unwrap_or(false)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "switchboard", about = "Switchboard plugin host runner")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Directory scanned for plugin files
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub plugins_dir: Option<PathBuf>,
    /// Start the mock console docked
    #[arg(long, action = ArgAction::SetTrue)]
    pub docked: bool,
    #[arg(long)]
    pub target_fps: Option<u32>,
    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,
    /// Enable only this plugin (repeatable)
    #[arg(long = "plugin")]
    pub plugins: Vec<String>,
    /// Dump the fully merged config and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    load_with(cli)
}

fn load_with(cli: Cli) -> Result<Config, ConfigError> {
    // 1) defaults
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(path) = cli.config.as_ref() {
        if path.exists() {
            merge(&mut cfg, read_yaml(path)?);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else if let Some(path) = find_config_file() {
        merge(&mut cfg, read_yaml(&path)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, &cli);

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        println!("{}", serde_yaml::to_string(&cfg)?);
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let candidate = home.join(".config/switchboard/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        let candidate = home.join(".config/switchboard.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    for candidate in &["switchboard.yaml", "config.yaml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

fn merge(base: &mut Config, layer: Config) {
    if layer.log_level.is_some() {
        base.log_level = layer.log_level;
    }
    if layer.plugins_dir.is_some() {
        base.plugins_dir = layer.plugins_dir;
    }
    if layer.docked.is_some() {
        base.docked = layer.docked;
    }
    if layer.target_fps.is_some() {
        base.target_fps = layer.target_fps;
    }
    if layer.frames.is_some() {
        base.frames = layer.frames;
    }
    if layer.plugins.is_some() {
        base.plugins = layer.plugins;
    }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() {
        cfg.log_level = cli.log_level.clone();
    }
    if cli.plugins_dir.is_some() {
        cfg.plugins_dir = cli.plugins_dir.clone();
    }
    if cli.docked {
        cfg.docked = Some(true);
    }
    if cli.target_fps.is_some() {
        cfg.target_fps = cli.target_fps;
    }
    if cli.frames.is_some() {
        cfg.frames = cli.frames;
    }
    if !cli.plugins.is_empty() {
        cfg.plugins = Some(cli.plugins.clone());
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(fps) = cfg.target_fps {
        if fps == 0 || fps > 240 {
            return Err(ConfigError::Validation(format!(
                "target_fps must be between 1 and 240, got {}",
                fps
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_layers_file_under_cli() {
        let mut cfg = Config::default();
        merge(
            &mut cfg,
            Config {
                log_level: Some("debug".to_string()),
                target_fps: Some(30),
                ..Config::default()
            },
        );
        let cli = Cli {
            config: None,
            log_level: None,
            plugins_dir: Some(PathBuf::from("/tmp/plugins")),
            docked: true,
            target_fps: Some(60),
            frames: None,
            plugins: vec!["plugin_demo.so".to_string()],
            dump_config: false,
        };
        apply_cli_overrides(&mut cfg, &cli);

        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.target_fps(), 60);
        assert!(cfg.docked());
        assert_eq!(cfg.plugins_dir, Some(PathBuf::from("/tmp/plugins")));
        assert_eq!(cfg.plugins, Some(vec!["plugin_demo.so".to_string()]));
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let cfg = Config { target_fps: Some(0), ..Config::default() };
        assert!(validate(&cfg).is_err());
        let cfg = Config { target_fps: Some(60), ..Config::default() };
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let text = "log_level: info\ntarget_fps: 30\ndocked: true\n";
        let cfg: Config = serde_yaml::from_str(text).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert_eq!(cfg.target_fps(), 30);
        assert!(cfg.docked());
    }
}
