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

//! [`EmbeddingBackend`] over the PyTorch-BigGraph console tools

use crate::config_file::write_config;
use crate::toolchain::{PbgToolchain, Tool, DUPLICATE_OPENMP_VAR};
use kgembed_core::{EmbedError, EmbedResult, EmbeddingBackend, PbgConfig, TrainMode};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Column layout of the reformatted edge lists
const LHS_COL: &str = "0";
const REL_COL: &str = "1";
const RHS_COL: &str = "2";

const EXPORT_SCRATCH_DIR: &str = "export";

/// Runs each stage as a child process. Tool output goes straight to this
/// process's stdout/stderr so training progress stays visible.
#[derive(Debug, Clone)]
pub struct PbgBackend {
    toolchain: PbgToolchain,
    work_dir: PathBuf,
}

impl PbgBackend {
    /// `work_dir` receives the generated config and export scratch files
    pub fn new(toolchain: PbgToolchain, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            work_dir: work_dir.into(),
        }
    }

    fn command(&self, tool: Tool, config_module: &Path) -> Command {
        let (program, prefix) = self.toolchain.launcher(tool);
        let mut cmd = Command::new(program);
        cmd.args(prefix);
        if self.toolchain.allow_duplicate_openmp {
            cmd.env(DUPLICATE_OPENMP_VAR, "TRUE");
        }
        cmd.envs(&self.toolchain.env);
        cmd.arg(config_module);
        cmd
    }

    pub(crate) fn import_command(&self, config_module: &Path, edge_paths: &[PathBuf]) -> Command {
        let mut cmd = self.command(Tool::Import, config_module);
        cmd.args(["--lhs-col", LHS_COL, "--rel-col", REL_COL, "--rhs-col", RHS_COL]);
        cmd.args(edge_paths);
        cmd
    }

    pub(crate) fn train_command(&self, config_module: &Path, mode: TrainMode) -> Command {
        let mut cmd = self.command(Tool::Train, config_module);
        if let Some(rank) = mode.rank() {
            cmd.arg("--rank").arg(rank.to_string());
        }
        cmd
    }

    pub(crate) fn export_command(
        &self,
        config_module: &Path,
        entities: &Path,
        relation_types: &Path,
    ) -> Command {
        let mut cmd = self.command(Tool::Export, config_module);
        cmd.arg("--entities-output").arg(entities);
        cmd.arg("--relation-types-output").arg(relation_types);
        cmd
    }

    fn run(&self, tool: Tool, mut cmd: Command) -> EmbedResult<()> {
        info!("Running {:?}", cmd);
        let status = cmd.status().map_err(|source| EmbedError::Spawn {
            program: cmd.get_program().to_string_lossy().into_owned(),
            source,
        })?;

        if !status.success() {
            return Err(EmbedError::Backend {
                stage: tool.stage(),
                status,
            });
        }
        debug!("{:?} exited with {}", tool, status);
        Ok(())
    }
}

impl EmbeddingBackend for PbgBackend {
    fn import_edges(&self, config: &PbgConfig, edge_paths: &[PathBuf]) -> EmbedResult<()> {
        let module = write_config(&self.work_dir, config)?;
        self.run(Tool::Import, self.import_command(&module, edge_paths))
    }

    fn train(&self, config: &PbgConfig, mode: TrainMode) -> EmbedResult<()> {
        let module = write_config(&self.work_dir, config)?;
        self.run(Tool::Train, self.train_command(&module, mode))
    }

    fn export(
        &self,
        config: &PbgConfig,
        entities: &mut dyn Write,
        relation_types: &mut dyn Write,
    ) -> EmbedResult<()> {
        let module = write_config(&self.work_dir, config)?;

        // The exporter refuses to overwrite, so start from an empty scratch dir
        let scratch = self.work_dir.join(EXPORT_SCRATCH_DIR);
        if scratch.exists() {
            fs::remove_dir_all(&scratch)?;
        }
        fs::create_dir_all(&scratch)?;

        let entities_tmp = scratch.join(kgembed_core::ENTITIES_OUTPUT);
        let relation_types_tmp = scratch.join(kgembed_core::RELATION_TYPES_OUTPUT);
        self.run(
            Tool::Export,
            self.export_command(&module, &entities_tmp, &relation_types_tmp),
        )?;

        copy_into(&entities_tmp, entities)?;
        copy_into(&relation_types_tmp, relation_types)?;
        fs::remove_dir_all(&scratch)?;
        Ok(())
    }
}

fn copy_into(path: &Path, out: &mut dyn Write) -> EmbedResult<u64> {
    let mut file = File::open(path)?;
    Ok(io::copy(&mut file, out)?)
}
