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

//! How the PyTorch-BigGraph tools are launched

use kgembed_core::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable that lets two OpenMP runtimes load into one
/// process (PyTorch and a system libomp on macOS)
pub const DUPLICATE_OPENMP_VAR: &str = "KMP_DUPLICATE_LIB_OK";

/// One of the three framework entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Import,
    Train,
    Export,
}

impl Tool {
    /// Python module run with `python -m`
    pub fn module(self) -> &'static str {
        match self {
            Tool::Import => "torchbiggraph.converters.import_from_tsv",
            Tool::Train => "torchbiggraph.train",
            Tool::Export => "torchbiggraph.converters.export_to_tsv",
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            Tool::Import => Stage::Import,
            Tool::Train => Stage::Train,
            Tool::Export => Stage::Export,
        }
    }
}

/// Program names and child-process environment for the framework tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbgToolchain {
    /// When set, tools run as `<python> -m <module>` instead of through
    /// their console scripts
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default = "default_import_program")]
    pub import_program: String,

    #[serde(default = "default_train_program")]
    pub train_program: String,

    #[serde(default = "default_export_program")]
    pub export_program: String,

    /// Set `KMP_DUPLICATE_LIB_OK=TRUE` for the tools
    #[serde(default = "default_allow_duplicate_openmp")]
    pub allow_duplicate_openmp: bool,

    /// Extra variables for the tools (e.g. `OMP_NUM_THREADS`)
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_import_program() -> String {
    "torchbiggraph_import_from_tsv".to_string()
}

fn default_train_program() -> String {
    "torchbiggraph_train".to_string()
}

fn default_export_program() -> String {
    "torchbiggraph_export_to_tsv".to_string()
}

fn default_allow_duplicate_openmp() -> bool {
    true
}

impl Default for PbgToolchain {
    fn default() -> Self {
        Self {
            python: None,
            import_program: default_import_program(),
            train_program: default_train_program(),
            export_program: default_export_program(),
            allow_duplicate_openmp: default_allow_duplicate_openmp(),
            env: BTreeMap::new(),
        }
    }
}

impl PbgToolchain {
    /// Run every tool through `python -m`
    pub fn with_python(python: impl Into<String>) -> Self {
        Self {
            python: Some(python.into()),
            ..Self::default()
        }
    }

    pub fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Import => &self.import_program,
            Tool::Train => &self.train_program,
            Tool::Export => &self.export_program,
        }
    }

    /// Program to spawn and the arguments that precede the tool's own
    pub fn launcher(&self, tool: Tool) -> (&str, Vec<&'static str>) {
        match &self.python {
            Some(python) => (python.as_str(), vec!["-m", tool.module()]),
            None => (self.program(tool), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_scripts_by_default() {
        let toolchain = PbgToolchain::default();
        assert_eq!(
            toolchain.launcher(Tool::Train),
            ("torchbiggraph_train", Vec::<&str>::new())
        );
        assert!(toolchain.allow_duplicate_openmp);
    }

    #[test]
    fn test_python_launcher() {
        let toolchain = PbgToolchain::with_python("python3");
        assert_eq!(
            toolchain.launcher(Tool::Export),
            ("python3", vec!["-m", "torchbiggraph.converters.export_to_tsv"])
        );
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let toolchain: PbgToolchain =
            serde_json::from_str(r#"{"train_program": "/opt/pbg/bin/torchbiggraph_train"}"#)
                .unwrap();
        assert_eq!(toolchain.train_program, "/opt/pbg/bin/torchbiggraph_train");
        assert_eq!(toolchain.import_program, "torchbiggraph_import_from_tsv");
        assert!(toolchain.allow_duplicate_openmp);
    }
}
