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

//! Framework configuration assembled from [`TrainingOptions`]
//!
//! The field names follow the PyTorch-BigGraph config schema so the struct
//! serializes straight into what the framework parses.

use crate::layout::RunLayout;
use crate::options::{Comparator, LossFn, Operator, TrainingOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The single entity type every node belongs to
pub const ENTITY_TYPE: &str = "all";

/// The single relation schema; with dynamic relations the edge's relation
/// column selects per-type parameters under it
pub const RELATION_NAME: &str = "all_edges";

/// Partition count for a run across `num_machines` machines.
///
/// Single-machine runs use one partition; distributed runs use twice the
/// machine count so every machine can hold a bucket while others train.
pub fn num_partitions(num_machines: u32) -> u32 {
    if num_machines > 1 {
        num_machines * 2
    } else {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub num_partitions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub name: String,
    pub lhs: String,
    pub rhs: String,
    pub operator: Operator,
}

/// Configuration consumed by the importer, trainer and exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbgConfig {
    pub entity_path: PathBuf,
    pub edge_paths: Vec<PathBuf>,
    pub checkpoint_path: PathBuf,
    pub entities: BTreeMap<String, EntitySchema>,
    pub relations: Vec<RelationSchema>,
    pub dynamic_relations: bool,
    pub dimension: u32,
    pub init_scale: f64,
    pub global_emb: bool,
    pub comparator: Comparator,
    pub bias: bool,
    pub num_epochs: u32,
    pub num_uniform_negs: u32,
    pub loss_fn: LossFn,
    pub lr: f64,
    pub regularization_coef: f64,
    pub eval_fraction: f64,
    pub num_machines: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed_init_method: Option<String>,
}

impl PbgConfig {
    /// Map options onto the framework schema. Pure: equal inputs give equal
    /// configs.
    pub fn assemble(options: &TrainingOptions, layout: &RunLayout) -> Self {
        let mut entities = BTreeMap::new();
        entities.insert(
            ENTITY_TYPE.to_string(),
            EntitySchema {
                num_partitions: num_partitions(options.num_machines),
            },
        );

        Self {
            entity_path: layout.entity_dir(),
            edge_paths: vec![layout.partitioned_edges_dir()],
            checkpoint_path: layout.checkpoint_dir(),
            entities,
            relations: vec![RelationSchema {
                name: RELATION_NAME.to_string(),
                lhs: ENTITY_TYPE.to_string(),
                rhs: ENTITY_TYPE.to_string(),
                operator: options.operator,
            }],
            dynamic_relations: options.dynamic_relations,
            dimension: options.dimension,
            init_scale: options.init_scale,
            global_emb: options.global_emb,
            comparator: options.comparator,
            bias: options.bias,
            num_epochs: options.num_epochs,
            num_uniform_negs: options.num_uniform_negs,
            loss_fn: options.loss_fn,
            lr: options.learning_rate,
            regularization_coef: options.regularization_coef,
            eval_fraction: options.eval_fraction,
            num_machines: options.num_machines,
            distributed_init_method: options.distributed_init_method.clone(),
        }
    }

    pub fn num_partitions(&self) -> u32 {
        self.entities
            .get(ENTITY_TYPE)
            .map(|e| e.num_partitions)
            .unwrap_or(1)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
