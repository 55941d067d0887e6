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

//! KGTK edge file to three-column edge list
//!
//! KGTK files carry `id node1 label node2 ...` columns. The importer wants
//! `head relation tail`, so columns 1..=3 are kept and everything else is
//! dropped. Rows whose second column is `node1` are headers.

use crate::error::{EmbedError, EmbedResult};
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Value of column 1 in a KGTK header row
pub const HEADER_MARKER: &[u8] = b"node1";

/// Minimum columns a data row must carry
pub const MIN_COLUMNS: usize = 4;

const HEAD_COL: usize = 1;
const RELATION_COL: usize = 2;
const TAIL_COL: usize = 3;

/// Counters from one reformat pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReformatStats {
    pub rows_read: u64,
    pub rows_written: u64,
    pub headers_skipped: u64,
}

/// What [`ensure_reformatted`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReformatOutcome {
    /// Target existed from an earlier run and was reused
    Reused,
    Generated(ReformatStats),
}

/// Stream `reader` into `writer`, keeping head, relation and tail.
///
/// `source` only labels errors. Rows with fewer than [`MIN_COLUMNS`]
/// columns fail with their 1-based line number.
pub fn reformat_edges<R: Read, W: Write>(
    reader: R,
    writer: W,
    source: &Path,
) -> EmbedResult<ReformatStats> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut stats = ReformatStats::default();
    let mut record = ByteRecord::new();
    let mut edge = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        stats.rows_read += 1;

        if record.get(HEAD_COL) == Some(HEADER_MARKER) {
            stats.headers_skipped += 1;
            continue;
        }

        if record.len() < MIN_COLUMNS {
            return Err(EmbedError::MalformedRow {
                path: source.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(stats.rows_read),
                columns: record.len(),
            });
        }

        edge.clear();
        edge.push_field(&record[HEAD_COL]);
        edge.push_field(&record[RELATION_COL]);
        edge.push_field(&record[TAIL_COL]);
        writer.write_byte_record(&edge)?;
        stats.rows_written += 1;
    }

    writer.flush()?;
    Ok(stats)
}

/// Reformat `input` into a new file at `output`.
///
/// The rows go to a sibling `.partial` file that is renamed into place on
/// success, so a failed pass never leaves a target that looks complete.
pub fn reformat_edge_file(input: &Path, output: &Path) -> EmbedResult<ReformatStats> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(output);
    let result = File::open(input).map_err(EmbedError::from).and_then(|src| {
        let dst = File::create(&partial)?;
        let mut dst = BufWriter::new(dst);
        let stats = reformat_edges(BufReader::new(src), &mut dst, input)?;
        dst.flush()?;
        Ok(stats)
    });

    match result {
        Ok(stats) => {
            fs::rename(&partial, output)?;
            debug!(
                rows_read = stats.rows_read,
                rows_written = stats.rows_written,
                headers_skipped = stats.headers_skipped,
                "Reformatted {:?} -> {:?}",
                input,
                output
            );
            Ok(stats)
        }
        Err(e) => {
            // best effort: the partial file may not have been created
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

/// Produce the edge list unless an earlier run already did
pub fn ensure_reformatted(input: &Path, output: &Path) -> EmbedResult<ReformatOutcome> {
    if output.exists() {
        info!("Edge list {:?} is ready (reusing)", output);
        return Ok(ReformatOutcome::Reused);
    }

    info!("Generating the edge list for import: {:?} -> {:?}", input, output);
    let stats = reformat_edge_file(input, output)?;
    info!(rows = stats.rows_written, "Edge list {:?} is ready", output);
    Ok(ReformatOutcome::Generated(stats))
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}
