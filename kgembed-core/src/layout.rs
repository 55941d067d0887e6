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

//! On-disk layout of a training run

use std::path::{Path, PathBuf};

/// Name of the exported entity embeddings file
pub const ENTITIES_OUTPUT: &str = "entities_output.tsv";

/// Name of the exported relation-type parameters file
pub const RELATION_TYPES_OUTPUT: &str = "relation_types_tf.tsv";

/// Default directory for intermediate files
pub const DEFAULT_WORK_DIR: &str = "tmp";

/// Paths used by a run, derived from the input file, the output directory
/// and a work directory for intermediates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    input: PathBuf,
    output_dir: PathBuf,
    work_dir: PathBuf,
}

impl RunLayout {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Three-column edge list, named after the input file
    pub fn reformatted_edges(&self) -> PathBuf {
        match self.input.file_name() {
            Some(name) => self.work_dir.join(name),
            None => self.work_dir.join("edges.tsv"),
        }
    }

    /// Entity counts and name dictionaries written by the importer
    pub fn entity_dir(&self) -> PathBuf {
        self.output_dir.join("data")
    }

    /// Partitioned edge buckets written by the importer
    pub fn partitioned_edges_dir(&self) -> PathBuf {
        self.entity_dir().join("edges_partitioned")
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.output_dir.join("model")
    }

    pub fn entities_output(&self) -> PathBuf {
        self.output_dir.join(ENTITIES_OUTPUT)
    }

    pub fn relation_types_output(&self) -> PathBuf {
        self.output_dir.join(RELATION_TYPES_OUTPUT)
    }
}
