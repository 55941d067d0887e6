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

//! Config files handed to the framework tools
//!
//! The tools load their config from a Python module exposing
//! `get_torchbiggraph_config()`. The module written here reads a JSON file
//! next to it, so no config value ever has to be escaped as Python source.

use kgembed_core::{EmbedResult, PbgConfig};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_MODULE: &str = "pbg_config.py";
pub const CONFIG_JSON: &str = "pbg_config.json";

const MODULE_SOURCE: &str = r#"# Generated by kgembed. Edits are overwritten on the next run.
import json
import os

_CONFIG_JSON = os.path.join(os.path.dirname(os.path.abspath(__file__)), "pbg_config.json")


def get_torchbiggraph_config():
    with open(_CONFIG_JSON) as f:
        return json.load(f)
"#;

/// Write the JSON config and its loader module into `dir`, returning the
/// module path to pass to the tools.
pub fn write_config(dir: &Path, config: &PbgConfig) -> EmbedResult<PathBuf> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(CONFIG_JSON), config.to_json()?)?;

    let module = dir.join(CONFIG_MODULE);
    fs::write(&module, MODULE_SOURCE)?;
    Ok(module)
}
