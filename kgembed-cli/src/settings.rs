// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Tool settings: where the framework lives and how its processes run

use anyhow::{Context, Result};
use kgembed_pbg::PbgToolchain;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings that describe the machine rather than the training run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolSettings {
    /// Directory for intermediate files
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    #[serde(default)]
    pub toolchain: PbgToolchain,
}

impl ToolSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {:?}", path))?;
        Ok(settings)
    }

    /// Load settings with priority: env > file > defaults
    ///
    /// Supported environment variables:
    /// - KGEMBED_PYTHON: run the tools as `<python> -m <module>`
    /// - KGEMBED_ALLOW_DUPLICATE_OPENMP: set KMP_DUPLICATE_LIB_OK for the tools (default: true)
    pub fn load(settings_file: Option<&Path>) -> Result<Self> {
        let settings = match settings_file {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Settings file not found: {:?}", path);
                }
                tracing::info!("Loading settings from file: {:?}", path);
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        Ok(settings.merge_with_env(|key| std::env::var(key).ok()))
    }

    fn merge_with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(python) = var("KGEMBED_PYTHON") {
            self.toolchain.python = Some(python).filter(|p| !p.is_empty());
        }

        if let Some(allow) = var("KGEMBED_ALLOW_DUPLICATE_OPENMP") {
            match parse_flag(&allow) {
                Some(allow) => self.toolchain.allow_duplicate_openmp = allow,
                None => tracing::warn!(
                    "Ignoring KGEMBED_ALLOW_DUPLICATE_OPENMP={:?}, expected true or false",
                    allow
                ),
            }
        }

        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = ToolSettings::default();
        assert_eq!(settings.work_dir, None);
        assert_eq!(settings.toolchain, PbgToolchain::default());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgembed.toml");
        std::fs::write(
            &path,
            r#"
work_dir = "/scratch/kgembed"

[toolchain]
python = "python3.10"
allow_duplicate_openmp = false

[toolchain.env]
OMP_NUM_THREADS = "1"
"#,
        )
        .unwrap();

        let settings = ToolSettings::from_file(&path).unwrap();
        assert_eq!(settings.work_dir, Some(PathBuf::from("/scratch/kgembed")));
        assert_eq!(settings.toolchain.python.as_deref(), Some("python3.10"));
        assert!(!settings.toolchain.allow_duplicate_openmp);
        assert_eq!(settings.toolchain.env["OMP_NUM_THREADS"], "1");
        assert_eq!(settings.toolchain.train_program, "torchbiggraph_train");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ToolSettings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "work_dir = [").unwrap();
        assert!(ToolSettings::from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let settings = ToolSettings::default().merge_with_env(env(&[
            ("KGEMBED_PYTHON", "/usr/bin/python3"),
            ("KGEMBED_ALLOW_DUPLICATE_OPENMP", "false"),
        ]));
        assert_eq!(settings.toolchain.python.as_deref(), Some("/usr/bin/python3"));
        assert!(!settings.toolchain.allow_duplicate_openmp);

        let settings = settings.merge_with_env(env(&[
            ("KGEMBED_PYTHON", ""),
            ("KGEMBED_ALLOW_DUPLICATE_OPENMP", "maybe"),
        ]));
        assert_eq!(settings.toolchain.python, None);
        assert!(!settings.toolchain.allow_duplicate_openmp);
    }
}
