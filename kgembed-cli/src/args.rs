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

//! Command-line arguments

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use kgembed_core::options::{
    DEFAULT_DIMENSION, DEFAULT_INIT_SCALE, DEFAULT_LEARNING_RATE, DEFAULT_NUM_EPOCHS,
    DEFAULT_NUM_UNIFORM_NEGS, DEFAULT_REGULARIZATION_COEF,
};
use kgembed_core::{Comparator, LossFn, Operator, RunOptions, TrainingOptions};
use std::ffi::OsString;
use std::path::PathBuf;

/// Two-letter flags written with a single dash (`-op translation`).
/// clap reads `-op` as `-o p`, so these are rewritten to their `--op`
/// aliases before parsing.
const LEGACY_FLAGS: [&str; 10] = [
    "-op", "-ge", "-lf", "-lr", "-rc", "-nn", "-dr", "-ef", "-nm", "-dm",
];

/// Rewrite single-dash two-letter flags into their long aliases.
///
/// Only exact matches are rewritten, and nothing after a bare `--`.
pub fn expand_legacy_flags<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    argv.into_iter()
        .map(|arg| {
            let arg = arg.into();
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match arg.to_str() {
                Some(flag) if LEGACY_FLAGS.contains(&flag) => format!("-{}", flag).into(),
                _ => arg,
            }
        })
        .collect()
}

#[derive(Parser, Debug)]
#[command(name = "kgembed", author, version)]
#[command(
    about = "Train knowledge-graph embeddings from a KGTK edge file with PyTorch-BigGraph",
    long_about = None
)]
pub struct Args {
    /// Input KGTK file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for the embedding TSVs
    #[arg(short, long)]
    pub output: PathBuf,

    /// Dimension of the real space the embeddings live in
    #[arg(short, long, default_value_t = DEFAULT_DIMENSION)]
    pub dimension: u32,

    /// Standard deviation of the initial embeddings
    #[arg(short = 's', long = "init-scale", alias = "init_scale", default_value_t = DEFAULT_INIT_SCALE)]
    pub init_scale: f64,

    /// Comparator type
    #[arg(short, long, value_enum, default_value_t = Comparator::Dot)]
    pub comparator: Comparator,

    /// Learn a bias term per entity
    #[arg(short, long, action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "false")]
    pub bias: bool,

    /// Number of training epochs
    #[arg(short = 'e', long = "num-epochs", alias = "num_epochs", default_value_t = DEFAULT_NUM_EPOCHS)]
    pub num_epochs: u32,

    /// Operator, i.e. the model: TransE=>translation, RESCAL=>linear,
    /// DistMult=>diagonal, ComplEx=>complex_diagonal
    #[arg(long, alias = "op", value_enum, default_value_t = Operator::ComplexDiagonal)]
    pub operator: Operator,

    /// Learn a global embedding per entity type
    #[arg(long = "global-emb", aliases = ["global_emb", "ge"], action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "false")]
    pub global_emb: bool,

    /// Loss function
    #[arg(long = "loss-fn", aliases = ["loss_fn", "lf"], value_enum, default_value_t = LossFn::Ranking)]
    pub loss_fn: LossFn,

    /// Learning rate
    #[arg(long = "learning-rate", aliases = ["learning_rate", "lr"], default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f64,

    /// Regularization coefficient
    #[arg(long = "regularization-coef", aliases = ["regularization_coef", "rc"], default_value_t = DEFAULT_REGULARIZATION_COEF)]
    pub regularization_coef: f64,

    /// Negatives sampled uniformly per positive edge
    #[arg(long = "num-uniform-negs", aliases = ["num_uniform_negs", "nn"], default_value_t = DEFAULT_NUM_UNIFORM_NEGS)]
    pub num_uniform_negs: u32,

    /// Use dynamic relations (graphs with many relation types)
    #[arg(
        long = "dynamic-relations",
        aliases = ["dynamic_relations", "dynamic_relaitons", "dr"],
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value = "true"
    )]
    pub dynamic_relations: bool,

    /// Fraction of edges withheld from training to track evaluation metrics
    #[arg(long = "eval-fraction", aliases = ["eval_fraction", "ef"], default_value_t = 0.0)]
    pub eval_fraction: f64,

    /// Number of machines for distributed training
    #[arg(long = "num-machines", aliases = ["num_machines", "nm"], default_value_t = 1)]
    pub num_machines: u32,

    /// URI through which the workers of a distributed run synchronize
    #[arg(long = "distributed-init-method", aliases = ["distributed_init_method", "dm"])]
    pub distributed_init_method: Option<String>,

    /// Rank of this machine in a distributed run
    #[arg(long, env = "KGEMBED_RANK")]
    pub rank: Option<u32>,

    /// Directory for intermediate files [default: tmp]
    #[arg(long = "work-dir", alias = "work_dir", env = "KGEMBED_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Keep the output directory of a previous run instead of removing it
    #[arg(long = "keep-output")]
    pub keep_output: bool,

    /// Tool settings file (TOML)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the run report as JSON (machine-readable)
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Parse `argv`, accepting the single-dash two-letter flags
    pub fn parse_with_legacy_flags<I, T>(argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(expand_legacy_flags(argv))
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            dimension: self.dimension,
            init_scale: self.init_scale,
            comparator: self.comparator,
            bias: self.bias,
            num_epochs: self.num_epochs,
            operator: self.operator,
            global_emb: self.global_emb,
            loss_fn: self.loss_fn,
            learning_rate: self.learning_rate,
            regularization_coef: self.regularization_coef,
            num_uniform_negs: self.num_uniform_negs,
            dynamic_relations: self.dynamic_relations,
            eval_fraction: self.eval_fraction,
            num_machines: self.num_machines,
            distributed_init_method: self.distributed_init_method.clone(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            clean_output: !self.keep_output,
            rank: self.rank,
        }
    }
}
