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

//! Runs the full pipeline against shell scripts standing in for the
//! framework tools.

#![cfg(unix)]

use kgembed_core::{EmbedError, Pipeline, RunLayout, RunOptions, Stage, TrainingOptions};
use kgembed_pbg::{PbgBackend, PbgToolchain};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// Scripts are written then executed; serializing the tests keeps another
// test's fork from holding a script open for writing (ETXTBSY).
static SERIAL: Mutex<()> = Mutex::new(());

const IMPORT_SCRIPT: &str = r#"#!/bin/sh
echo "import $*" >> "$CALL_LOG"
"#;

const TRAIN_SCRIPT: &str = r#"#!/bin/sh
echo "train $* omp=$KMP_DUPLICATE_LIB_OK" >> "$CALL_LOG"
"#;

const EXPORT_SCRIPT: &str = r#"#!/bin/sh
echo "export" >> "$CALL_LOG"
while [ $# -gt 0 ]; do
    case "$1" in
        --entities-output) printf 'Q1\t0.25\t-0.5\n' > "$2"; shift ;;
        --relation-types-output) printf 'P31\tall_edges\tlhs\tcomplex_diagonal\treal\t1.0\n' > "$2"; shift ;;
    esac
    shift
done
"#;

const FAILING_SCRIPT: &str = "#!/bin/sh\nexit 3\n";

struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("graph.tsv"),
            "id\tnode1\tlabel\tnode2\ne1\tQ1\tP31\tQ5\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn script(&self, name: &str, body: &str) -> String {
        let path = self.path(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn toolchain(&self, train_body: &str) -> PbgToolchain {
        let mut toolchain = PbgToolchain {
            import_program: self.script("import.sh", IMPORT_SCRIPT),
            train_program: self.script("train.sh", train_body),
            export_program: self.script("export.sh", EXPORT_SCRIPT),
            ..PbgToolchain::default()
        };
        toolchain.env.insert(
            "CALL_LOG".to_string(),
            self.path("calls.log").to_string_lossy().into_owned(),
        );
        toolchain
    }

    fn pipeline(
        &self,
        toolchain: PbgToolchain,
        options: TrainingOptions,
        run: RunOptions,
    ) -> Pipeline<PbgBackend> {
        let work = self.path("work");
        Pipeline::new(
            PbgBackend::new(toolchain, &work),
            options,
            RunLayout::new(self.path("graph.tsv"), self.path("out"), work),
            run,
        )
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_local_run_end_to_end() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let tools = FakeTools::new();
    let pipeline = tools.pipeline(
        tools.toolchain(TRAIN_SCRIPT),
        TrainingOptions::default(),
        RunOptions::default(),
    );

    let report = pipeline.run().unwrap();

    let module = display(&tools.path("work/pbg_config.py"));
    let edges = display(&tools.path("work/graph.tsv"));
    assert_eq!(
        tools.calls(),
        vec![
            format!("import {module} --lhs-col 0 --rel-col 1 --rhs-col 2 {edges}"),
            format!("train {module} omp=TRUE"),
            "export".to_string(),
        ]
    );

    assert_eq!(
        fs::read_to_string(&report.entities_output).unwrap(),
        "Q1\t0.25\t-0.5\n"
    );
    assert!(fs::read_to_string(&report.relation_types_output)
        .unwrap()
        .starts_with("P31\tall_edges"));
    assert!(!tools.path("work/export").exists());

    let json = fs::read_to_string(tools.path("work/pbg_config.json")).unwrap();
    let config: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(config["entities"]["all"]["num_partitions"], 1);
}

#[test]
fn test_distributed_rank_reaches_trainer() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let tools = FakeTools::new();
    let options = TrainingOptions {
        num_machines: 2,
        distributed_init_method: Some("tcp://127.0.0.1:30050".to_string()),
        ..Default::default()
    };
    let pipeline = tools.pipeline(
        tools.toolchain(TRAIN_SCRIPT),
        options,
        RunOptions {
            clean_output: true,
            rank: Some(1),
        },
    );

    pipeline.run().unwrap();

    let module = display(&tools.path("work/pbg_config.py"));
    assert!(tools
        .calls()
        .contains(&format!("train {module} --rank 1 omp=TRUE")));
}

#[test]
fn test_failing_trainer_aborts_before_export() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let tools = FakeTools::new();
    let pipeline = tools.pipeline(
        tools.toolchain(FAILING_SCRIPT),
        TrainingOptions::default(),
        RunOptions::default(),
    );

    let err = pipeline.run().unwrap_err();

    match err {
        EmbedError::Backend { stage, status } => {
            assert_eq!(stage, Stage::Train);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tools.calls().len(), 1);
    assert!(!tools.path("out/entities_output.tsv").exists());
}
