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

//! Training options collected from the command line
//!
//! Every option maps one-to-one onto a field of the framework config; the
//! enums serialize with the framework's own spelling.

use crate::error::{EmbedError, EmbedResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: u32 = 100;

/// Default standard deviation of the initial embeddings
pub const DEFAULT_INIT_SCALE: f64 = 0.01;

/// Default number of training epochs
pub const DEFAULT_NUM_EPOCHS: u32 = 100;

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default regularization coefficient
pub const DEFAULT_REGULARIZATION_COEF: f64 = 1e-3;

/// Default number of uniformly sampled negatives per positive
pub const DEFAULT_NUM_UNIFORM_NEGS: u32 = 1000;

/// How scores between transformed embeddings are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    #[default]
    #[cfg_attr(feature = "clap", value(name = "dot"))]
    Dot,
    #[cfg_attr(feature = "clap", value(name = "cos"))]
    Cos,
    #[cfg_attr(feature = "clap", value(name = "l2"))]
    L2,
    #[cfg_attr(feature = "clap", value(name = "squared_l2"))]
    SquaredL2,
}

/// Relation operator, i.e. the model family
///
/// TransE => translation, RESCAL => linear, DistMult => diagonal,
/// ComplEx => complex_diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[cfg_attr(feature = "clap", value(name = "translation"))]
    Translation,
    #[cfg_attr(feature = "clap", value(name = "linear"))]
    Linear,
    #[cfg_attr(feature = "clap", value(name = "diagonal"))]
    Diagonal,
    #[default]
    #[cfg_attr(feature = "clap", value(name = "complex_diagonal"))]
    ComplexDiagonal,
}

/// Training loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum LossFn {
    #[default]
    #[cfg_attr(feature = "clap", value(name = "ranking"))]
    Ranking,
    #[cfg_attr(feature = "clap", value(name = "logistic"))]
    Logistic,
    #[cfg_attr(feature = "clap", value(name = "softmax"))]
    Softmax,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Dot => "dot",
            Comparator::Cos => "cos",
            Comparator::L2 => "l2",
            Comparator::SquaredL2 => "squared_l2",
        }
    }
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Translation => "translation",
            Operator::Linear => "linear",
            Operator::Diagonal => "diagonal",
            Operator::ComplexDiagonal => "complex_diagonal",
        }
    }
}

impl LossFn {
    pub fn as_str(self) -> &'static str {
        match self {
            LossFn::Ranking => "ranking",
            LossFn::Logistic => "logistic",
            LossFn::Softmax => "softmax",
        }
    }
}

macro_rules! impl_choice {
    ($ty:ident, $name:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EmbedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(EmbedError::InvalidOption {
                    name: $name,
                    reason: format!(
                        "unknown value {:?}, expected one of: {}",
                        s,
                        [$($ty::$variant.as_str()),+].join("|")
                    ),
                })
            }
        }
    };
}

impl_choice!(Comparator, "comparator", [Dot, Cos, L2, SquaredL2]);
impl_choice!(Operator, "operator", [Translation, Linear, Diagonal, ComplexDiagonal]);
impl_choice!(LossFn, "loss_fn", [Ranking, Logistic, Softmax]);

/// User-facing training options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    /// Dimension of the real space the embeddings live in
    pub dimension: u32,
    /// Standard deviation of the initial embeddings
    pub init_scale: f64,
    pub comparator: Comparator,
    /// Learn a bias term per entity
    pub bias: bool,
    pub num_epochs: u32,
    pub operator: Operator,
    /// Learn a global embedding per entity type
    pub global_emb: bool,
    pub loss_fn: LossFn,
    pub learning_rate: f64,
    pub regularization_coef: f64,
    /// Negatives sampled uniformly per positive edge
    pub num_uniform_negs: u32,
    /// Treat relation types as data (graphs with many relations)
    pub dynamic_relations: bool,
    /// Fraction of edges withheld from training for evaluation
    pub eval_fraction: f64,
    pub num_machines: u32,
    /// URI through which distributed workers rendezvous
    pub distributed_init_method: Option<String>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            init_scale: DEFAULT_INIT_SCALE,
            comparator: Comparator::default(),
            bias: false,
            num_epochs: DEFAULT_NUM_EPOCHS,
            operator: Operator::default(),
            global_emb: false,
            loss_fn: LossFn::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            regularization_coef: DEFAULT_REGULARIZATION_COEF,
            num_uniform_negs: DEFAULT_NUM_UNIFORM_NEGS,
            dynamic_relations: true,
            eval_fraction: 0.0,
            num_machines: 1,
            distributed_init_method: None,
        }
    }
}

impl TrainingOptions {
    pub fn is_distributed(&self) -> bool {
        self.num_machines > 1
    }

    /// Reject values the framework would fail on later, mid-run
    pub fn validate(&self) -> EmbedResult<()> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> EmbedResult<()> {
            Err(EmbedError::InvalidOption {
                name,
                reason: reason.into(),
            })
        }

        if self.dimension == 0 {
            return invalid("dimension", "must be positive");
        }
        if self.num_epochs == 0 {
            return invalid("num_epochs", "must be positive");
        }
        if self.num_machines == 0 {
            return invalid("num_machines", "must be at least 1");
        }
        if !(self.init_scale > 0.0) {
            return invalid("init_scale", format!("must be positive, got {}", self.init_scale));
        }
        if !(self.learning_rate > 0.0) {
            return invalid(
                "learning_rate",
                format!("must be positive, got {}", self.learning_rate),
            );
        }
        if !(self.regularization_coef >= 0.0) {
            return invalid(
                "regularization_coef",
                format!("must not be negative, got {}", self.regularization_coef),
            );
        }
        if !(0.0..1.0).contains(&self.eval_fraction) {
            return invalid(
                "eval_fraction",
                format!("must be in [0, 1), got {}", self.eval_fraction),
            );
        }
        if self.is_distributed() && self.distributed_init_method.is_none() {
            return invalid(
                "distributed_init_method",
                format!(
                    "required when training on {} machines (e.g. tcp://10.0.0.1:30050)",
                    self.num_machines
                ),
            );
        }

        Ok(())
    }
}
