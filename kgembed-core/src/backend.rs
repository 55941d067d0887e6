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

//! Seam between the pipeline and the embedding framework

use crate::config::PbgConfig;
use crate::error::{EmbedError, EmbedResult};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// How the trainer runs on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrainMode {
    Local,
    Distributed { rank: u32 },
}

impl TrainMode {
    /// Pick the mode for `num_machines`, checking the supplied rank.
    ///
    /// A single machine ignores any rank; a distributed run requires one
    /// in `0..num_machines`.
    pub fn resolve(num_machines: u32, rank: Option<u32>) -> EmbedResult<Self> {
        if num_machines <= 1 {
            return Ok(TrainMode::Local);
        }

        match rank {
            None => Err(EmbedError::MissingRank { num_machines }),
            Some(rank) if rank >= num_machines => {
                Err(EmbedError::InvalidRank { rank, num_machines })
            }
            Some(rank) => Ok(TrainMode::Distributed { rank }),
        }
    }

    pub fn rank(self) -> Option<u32> {
        match self {
            TrainMode::Local => None,
            TrainMode::Distributed { rank } => Some(rank),
        }
    }
}

/// The three framework entry points the pipeline drives
pub trait EmbeddingBackend {
    /// Import three-column edge lists into the partitioned store under
    /// `config.entity_path` and `config.edge_paths`.
    fn import_edges(&self, config: &PbgConfig, edge_paths: &[PathBuf]) -> EmbedResult<()>;

    /// Train embeddings; blocks until training finishes.
    fn train(&self, config: &PbgConfig, mode: TrainMode) -> EmbedResult<()>;

    /// Write the trained entity embeddings and relation-type parameters as
    /// TSV rows of `identifier value value ...`.
    fn export(
        &self,
        config: &PbgConfig,
        entities: &mut dyn Write,
        relation_types: &mut dyn Write,
    ) -> EmbedResult<()>;
}

impl<B: EmbeddingBackend + ?Sized> EmbeddingBackend for &B {
    fn import_edges(&self, config: &PbgConfig, edge_paths: &[PathBuf]) -> EmbedResult<()> {
        (**self).import_edges(config, edge_paths)
    }

    fn train(&self, config: &PbgConfig, mode: TrainMode) -> EmbedResult<()> {
        (**self).train(config, mode)
    }

    fn export(
        &self,
        config: &PbgConfig,
        entities: &mut dyn Write,
        relation_types: &mut dyn Write,
    ) -> EmbedResult<()> {
        (**self).export(config, entities, relation_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_machine_is_local() {
        assert_eq!(TrainMode::resolve(1, None).unwrap(), TrainMode::Local);
        assert_eq!(TrainMode::resolve(1, Some(5)).unwrap(), TrainMode::Local);
    }

    #[test]
    fn test_distributed_needs_rank() {
        assert!(matches!(
            TrainMode::resolve(3, None),
            Err(EmbedError::MissingRank { num_machines: 3 })
        ));
        assert!(matches!(
            TrainMode::resolve(3, Some(3)),
            Err(EmbedError::InvalidRank { rank: 3, .. })
        ));
        assert_eq!(
            TrainMode::resolve(3, Some(2)).unwrap(),
            TrainMode::Distributed { rank: 2 }
        );
    }
}
