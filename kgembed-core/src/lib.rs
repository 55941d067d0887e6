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

//! Kgembed Core
//!
//! Configuration and orchestration for knowledge-graph embedding runs:
//! - **Options**: the user-facing training options and their validation
//! - **Config**: mapping options onto the framework's config schema
//! - **Reformat**: KGTK edge files to three-column edge lists
//! - **Pipeline**: the sequential reformat, import, train, export driver
//!
//! The framework itself sits behind [`EmbeddingBackend`].
//!
//! # Example
//!
//! ```rust,ignore
//! use kgembed_core::{Pipeline, RunLayout, RunOptions, TrainingOptions};
//!
//! let layout = RunLayout::new("wikidata.tsv", "embeddings", "tmp");
//! let pipeline = Pipeline::new(backend, TrainingOptions::default(), layout, RunOptions::default());
//! let report = pipeline.run()?;
//! println!("entities written to {:?}", report.entities_output);
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod layout;
pub mod options;
pub mod pipeline;
pub mod reformat;

pub use backend::{EmbeddingBackend, TrainMode};
pub use config::{num_partitions, EntitySchema, PbgConfig, RelationSchema};
pub use error::{EmbedError, EmbedResult, Stage};
pub use layout::{RunLayout, DEFAULT_WORK_DIR, ENTITIES_OUTPUT, RELATION_TYPES_OUTPUT};
pub use options::{Comparator, LossFn, Operator, TrainingOptions};
pub use pipeline::{Pipeline, RunOptions, RunReport, StageTiming};
pub use reformat::{
    ensure_reformatted, reformat_edge_file, reformat_edges, ReformatOutcome, ReformatStats,
};
