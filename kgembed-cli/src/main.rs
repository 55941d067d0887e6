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

//! Kgembed CLI
//!
//! Reformats a KGTK edge file, then imports, trains and exports
//! knowledge-graph embeddings with PyTorch-BigGraph.

mod args;
mod settings;

use anyhow::{Context, Result};
use args::Args;
use kgembed_core::{Pipeline, RunLayout, RunReport, Stage, DEFAULT_WORK_DIR};
use kgembed_pbg::PbgBackend;
use settings::ToolSettings;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse_with_legacy_flags(std::env::args_os());
    init_logging(args.verbose);

    let settings = ToolSettings::load(args.settings.as_deref())?;
    let work_dir = args
        .work_dir
        .clone()
        .or_else(|| settings.work_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));
    info!("Using work directory {:?}", work_dir);

    let layout = RunLayout::new(&args.input, &args.output, &work_dir);
    let backend = PbgBackend::new(settings.toolchain, &work_dir);
    let pipeline = Pipeline::new(
        backend,
        args.training_options(),
        layout,
        args.run_options(),
    );

    let report = pipeline
        .run()
        .with_context(|| format!("Embedding run for {:?} failed", args.input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "kgembed=debug,kgembed_core=debug,kgembed_pbg=debug"
    } else {
        "kgembed=info,kgembed_core=info,kgembed_pbg=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport) {
    println!("✓ Embeddings written");
    println!("  Entities:       {}", report.entities_output.display());
    println!("  Relation types: {}", report.relation_types_output.display());
    println!(
        "  Partitions: {}, Mode: {:?}",
        report.num_partitions, report.train_mode
    );
    for stage in Stage::ALL {
        if let Some(ms) = report.elapsed_ms(stage) {
            println!("  {:<15} {:>10} ms", stage.as_str(), ms);
        }
    }
}
