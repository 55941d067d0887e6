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

//! Error types for the embedding pipeline

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for pipeline operations
pub type EmbedResult<T> = Result<T, EmbedError>;

/// Errors that can occur while preparing, training or exporting embeddings
#[derive(Debug, Error)]
pub enum EmbedError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input row without the head, relation and tail columns
    #[error("{}:{line}: expected at least 4 tab-separated columns, found {columns}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        columns: usize,
    },

    /// Option value the framework would reject
    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// Distributed run started without a machine rank
    #[error("Distributed training over {num_machines} machines requires a rank (--rank or KGEMBED_RANK)")]
    MissingRank { num_machines: u32 },

    /// Rank outside `0..num_machines`
    #[error("Rank {rank} is out of range for {num_machines} machines")]
    InvalidRank { rank: u32, num_machines: u32 },

    /// Export target already present
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Existing output directory could not be removed
    #[error("Failed to clear output directory {}: {source}", .path.display())]
    OutputCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Framework tool could not be started
    #[error("Failed to run `{program}`: {source}. Is PyTorch-BigGraph installed? Run: pip install torchbiggraph")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Framework tool exited unsuccessfully
    #[error("{stage} failed: {status}")]
    Backend { stage: Stage, status: ExitStatus },

    /// Framework tool failed without an exit status
    ///
    /// Returned by backends that run the framework in-process (or wrap it
    /// behind another API) and so have no child process to report on.
    #[error("{stage} failed: {message}")]
    BackendMessage { stage: Stage, message: String },
}

impl From<serde_json::Error> for EmbedError {
    fn from(e: serde_json::Error) -> Self {
        EmbedError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for EmbedError {
    fn from(e: csv::Error) -> Self {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => EmbedError::Io(io),
            other => EmbedError::Serialization(format!("{:?}", other)),
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PrepareOutput,
    Reformat,
    Import,
    Train,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::PrepareOutput,
        Stage::Reformat,
        Stage::Import,
        Stage::Train,
        Stage::Export,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::PrepareOutput => "prepare_output",
            Stage::Reformat => "reformat",
            Stage::Import => "import",
            Stage::Train => "train",
            Stage::Export => "export",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
