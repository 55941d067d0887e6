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

//! Sequential training pipeline
//!
//! ```text
//! prepare output -> reformat -> import -> train -> export
//! ```
//!
//! Every stage depends on the one before it. Nothing is retried and nothing
//! resumes; the first error ends the run.

use crate::backend::{EmbeddingBackend, TrainMode};
use crate::config::PbgConfig;
use crate::error::{EmbedError, EmbedResult, Stage};
use crate::layout::RunLayout;
use crate::options::TrainingOptions;
use crate::reformat::{ensure_reformatted, ReformatOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span, warn};

/// Run-level switches that are not part of the model configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Remove the output directory before starting
    pub clean_output: bool,
    /// This machine's rank; required when training on several machines
    pub rank: Option<u32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            clean_output: true,
            rank: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: u64,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub train_mode: TrainMode,
    pub num_partitions: u32,
    pub output_cleared: bool,
    pub reformat: ReformatOutcome,
    pub stages: Vec<StageTiming>,
    pub entities_output: PathBuf,
    pub relation_types_output: PathBuf,
}

impl RunReport {
    pub fn elapsed_ms(&self, stage: Stage) -> Option<u64> {
        self.stages
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.elapsed_ms)
    }
}

/// Drives one training run against an [`EmbeddingBackend`]
pub struct Pipeline<B> {
    backend: B,
    options: TrainingOptions,
    layout: RunLayout,
    run: RunOptions,
}

impl<B: EmbeddingBackend> Pipeline<B> {
    pub fn new(backend: B, options: TrainingOptions, layout: RunLayout, run: RunOptions) -> Self {
        Self {
            backend,
            options,
            layout,
            run,
        }
    }

    /// The configuration every stage receives
    pub fn config(&self) -> PbgConfig {
        PbgConfig::assemble(&self.options, &self.layout)
    }

    /// Execute all stages in order.
    ///
    /// Options and rank are checked before any stage touches the disk.
    pub fn run(&self) -> EmbedResult<RunReport> {
        self.options.validate()?;
        let mode = TrainMode::resolve(self.options.num_machines, self.run.rank)?;
        let config = self.config();
        let started_at = Utc::now();
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        info!(
            input = %self.layout.input().display(),
            output = %self.layout.output_dir().display(),
            partitions = config.num_partitions(),
            ?mode,
            "Starting embedding run"
        );

        let output_cleared = timed(&mut stages, Stage::PrepareOutput, || self.prepare_output())?;

        let edges = self.layout.reformatted_edges();
        let reformat = timed(&mut stages, Stage::Reformat, || {
            ensure_reformatted(self.layout.input(), &edges)
        })?;

        timed(&mut stages, Stage::Import, || {
            self.backend.import_edges(&config, std::slice::from_ref(&edges))
        })?;

        timed(&mut stages, Stage::Train, || self.backend.train(&config, mode))?;

        timed(&mut stages, Stage::Export, || self.export(&config))?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            train_mode: mode,
            num_partitions: config.num_partitions(),
            output_cleared,
            reformat,
            stages,
            entities_output: self.layout.entities_output(),
            relation_types_output: self.layout.relation_types_output(),
        };
        info!(
            entities = %report.entities_output.display(),
            relation_types = %report.relation_types_output.display(),
            "Embedding run finished"
        );
        Ok(report)
    }

    /// Remove a previous run's output. Returns whether anything was removed.
    fn prepare_output(&self) -> EmbedResult<bool> {
        let dir = self.layout.output_dir();
        if !self.run.clean_output {
            info!("Keeping existing output in {:?}", dir);
            return Ok(false);
        }

        let cleanup_err = |source| EmbedError::OutputCleanup {
            path: dir.to_path_buf(),
            source,
        };
        if !dir.try_exists().map_err(cleanup_err)? {
            return Ok(false);
        }

        warn!("Removing previous output directory {:?}", dir);
        fs::remove_dir_all(dir).map_err(cleanup_err)?;
        Ok(true)
    }

    fn export(&self, config: &PbgConfig) -> EmbedResult<()> {
        fs::create_dir_all(self.layout.output_dir())?;

        let entities_path = self.layout.entities_output();
        let relation_types_path = self.layout.relation_types_output();
        for path in [&entities_path, &relation_types_path] {
            if path.exists() {
                return Err(EmbedError::OutputExists(path.clone()));
            }
        }

        let mut entities = BufWriter::new(create_new(&entities_path)?);
        let mut relation_types = BufWriter::new(create_new(&relation_types_path)?);
        self.backend
            .export(config, &mut entities, &mut relation_types)?;
        entities.flush()?;
        relation_types.flush()?;
        Ok(())
    }
}

fn create_new(path: &Path) -> EmbedResult<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => EmbedError::OutputExists(path.to_path_buf()),
            _ => EmbedError::Io(e),
        })
}

fn timed<T>(
    timings: &mut Vec<StageTiming>,
    stage: Stage,
    f: impl FnOnce() -> EmbedResult<T>,
) -> EmbedResult<T> {
    let _span = info_span!("stage", stage = %stage).entered();
    let start = Instant::now();
    info!("Stage {} started", stage);

    let value = f().map_err(|e| {
        error!(error = %e, "Stage {} failed", stage);
        e
    })?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(elapsed_ms, "Stage {} finished", stage);
    timings.push(StageTiming { stage, elapsed_ms });
    Ok(value)
}
