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

//! Integration tests for the training pipeline

use kgembed_core::{
    EmbedError, EmbedResult, EmbeddingBackend, Operator, PbgConfig, Pipeline, ReformatOutcome,
    RunLayout, RunOptions, Stage, TrainMode, TrainingOptions,
};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const KGTK_INPUT: &str = "id\tnode1\tlabel\tnode2\n\
                          e1\tQ1\tP31\tQ5\n\
                          e2\tQ2\tP31\tQ5\n\
                          e3\tQ1\tP40\tQ2\n";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Import { edges: Vec<PathBuf>, contents: String },
    Train(TrainMode),
    Export,
}

/// In-memory backend recording every call it receives
#[derive(Default)]
struct RecordingBackend {
    calls: RefCell<Vec<Call>>,
    configs: RefCell<Vec<PbgConfig>>,
    fail_import: bool,
}

impl RecordingBackend {
    fn failing_import() -> Self {
        Self {
            fail_import: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl EmbeddingBackend for RecordingBackend {
    fn import_edges(&self, config: &PbgConfig, edge_paths: &[PathBuf]) -> EmbedResult<()> {
        self.configs.borrow_mut().push(config.clone());
        if self.fail_import {
            return Err(EmbedError::BackendMessage {
                stage: Stage::Import,
                message: "importer crashed".to_string(),
            });
        }
        let contents = fs::read_to_string(&edge_paths[0])?;
        self.calls.borrow_mut().push(Call::Import {
            edges: edge_paths.to_vec(),
            contents,
        });
        Ok(())
    }

    fn train(&self, config: &PbgConfig, mode: TrainMode) -> EmbedResult<()> {
        self.configs.borrow_mut().push(config.clone());
        self.calls.borrow_mut().push(Call::Train(mode));
        Ok(())
    }

    fn export(
        &self,
        config: &PbgConfig,
        entities: &mut dyn Write,
        relation_types: &mut dyn Write,
    ) -> EmbedResult<()> {
        self.configs.borrow_mut().push(config.clone());
        self.calls.borrow_mut().push(Call::Export);
        entities.write_all(b"Q1\t0.1\t0.2\nQ2\t0.3\t0.4\nQ5\t0.5\t0.6\n")?;
        relation_types.write_all(b"P31\tall_edges\tlhs\tcomplex_diagonal\treal\t1.0\t1.0\n")?;
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("graph.tsv"), KGTK_INPUT).unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn layout(&self) -> RunLayout {
        RunLayout::new(self.path("graph.tsv"), self.path("out"), self.path("tmp"))
    }
}

fn run(
    backend: &RecordingBackend,
    fixture: &Fixture,
    options: TrainingOptions,
    run: RunOptions,
) -> EmbedResult<kgembed_core::RunReport> {
    Pipeline::new(backend, options, fixture.layout(), run).run()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_local_run_calls_stages_in_order() {
    let fixture = Fixture::new();
    let backend = RecordingBackend::default();

    let report = run(
        &backend,
        &fixture,
        TrainingOptions::default(),
        RunOptions::default(),
    )
    .unwrap();

    let reformatted = fixture.path("tmp/graph.tsv");
    assert_eq!(
        backend.calls(),
        vec![
            Call::Import {
                edges: vec![reformatted.clone()],
                contents: "Q1\tP31\tQ5\nQ2\tP31\tQ5\nQ1\tP40\tQ2\n".to_string(),
            },
            Call::Train(TrainMode::Local),
            Call::Export,
        ]
    );

    assert_eq!(report.num_partitions, 1);
    assert!(!report.output_cleared);
    assert!(matches!(report.reformat, ReformatOutcome::Generated(s) if s.rows_written == 3));
    let stages: Vec<_> = report.stages.iter().map(|t| t.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(Stage::ALL.iter().all(|s| report.elapsed_ms(*s).is_some()));

    assert_eq!(read(&report.entities_output).lines().count(), 3);
    assert!(read(&report.relation_types_output).starts_with("P31\tall_edges"));
}

#[test]
fn test_every_stage_sees_the_same_config() {
    let fixture = Fixture::new();
    let backend = RecordingBackend::default();
    let options = TrainingOptions {
        dimension: 32,
        operator: Operator::Translation,
        ..Default::default()
    };

    run(&backend, &fixture, options.clone(), RunOptions::default()).unwrap();

    let expected = PbgConfig::assemble(&options, &fixture.layout());
    let configs = backend.configs.borrow();
    assert_eq!(configs.len(), 3);
    assert!(configs.iter().all(|c| *c == expected));
    assert_eq!(expected.checkpoint_path, fixture.path("out/model"));
}

#[test]
fn test_second_run_without_cleanup_fails() {
    let fixture = Fixture::new();
    let keep = RunOptions {
        clean_output: false,
        rank: None,
    };

    run(
        &RecordingBackend::default(),
        &fixture,
        TrainingOptions::default(),
        keep.clone(),
    )
    .unwrap();
    let entities_before = read(&fixture.path("out/entities_output.tsv"));

    let err = run(
        &RecordingBackend::default(),
        &fixture,
        TrainingOptions::default(),
        keep,
    )
    .unwrap_err();

    match err {
        EmbedError::OutputExists(path) => {
            assert_eq!(path, fixture.path("out/entities_output.tsv"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(&fixture.path("out/entities_output.tsv")), entities_before);
}

#[test]
fn test_second_run_with_cleanup_succeeds() {
    let fixture = Fixture::new();

    run(
        &RecordingBackend::default(),
        &fixture,
        TrainingOptions::default(),
        RunOptions::default(),
    )
    .unwrap();
    fs::write(fixture.path("out/stale.txt"), "left over").unwrap();

    let report = run(
        &RecordingBackend::default(),
        &fixture,
        TrainingOptions::default(),
        RunOptions::default(),
    )
    .unwrap();

    assert!(report.output_cleared);
    assert_eq!(report.reformat, ReformatOutcome::Reused);
    assert!(!fixture.path("out/stale.txt").exists());
    assert!(report.entities_output.exists());
}

#[test]
fn test_distributed_run_uses_rank() {
    let fixture = Fixture::new();
    let backend = RecordingBackend::default();
    let options = TrainingOptions {
        num_machines: 3,
        distributed_init_method: Some("tcp://10.0.0.1:30050".to_string()),
        ..Default::default()
    };

    let report = run(
        &backend,
        &fixture,
        options,
        RunOptions {
            clean_output: true,
            rank: Some(1),
        },
    )
    .unwrap();

    assert_eq!(report.num_partitions, 6);
    assert_eq!(report.train_mode, TrainMode::Distributed { rank: 1 });
    assert!(backend
        .calls()
        .contains(&Call::Train(TrainMode::Distributed { rank: 1 })));
}

#[test]
fn test_distributed_run_without_rank_touches_nothing() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.path("out")).unwrap();
    fs::write(fixture.path("out/keep.txt"), "previous run").unwrap();
    let backend = RecordingBackend::default();
    let options = TrainingOptions {
        num_machines: 2,
        distributed_init_method: Some("tcp://10.0.0.1:30050".to_string()),
        ..Default::default()
    };

    let err = run(&backend, &fixture, options, RunOptions::default()).unwrap_err();

    assert!(matches!(err, EmbedError::MissingRank { num_machines: 2 }));
    assert!(backend.calls().is_empty());
    assert!(fixture.path("out/keep.txt").exists());
    assert!(!fixture.path("tmp/graph.tsv").exists());
}

#[test]
fn test_import_failure_stops_the_run() {
    let fixture = Fixture::new();
    let backend = RecordingBackend::failing_import();

    let err = run(
        &backend,
        &fixture,
        TrainingOptions::default(),
        RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        EmbedError::BackendMessage {
            stage: Stage::Import,
            ..
        }
    ));
    assert!(backend.calls().is_empty());
    assert!(!fixture.path("out/entities_output.tsv").exists());
}

#[test]
fn test_malformed_input_never_reaches_backend() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("graph.tsv"),
        "id\tnode1\tlabel\tnode2\ne1\tQ1\tP31\tQ5\ne2\tQ2\n",
    )
    .unwrap();
    let backend = RecordingBackend::default();

    let err = run(
        &backend,
        &fixture,
        TrainingOptions::default(),
        RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, EmbedError::MalformedRow { line: 3, columns: 2, .. }));
    assert!(backend.calls().is_empty());
}
