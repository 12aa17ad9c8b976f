use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossbeam::queue::ArrayQueue;
use crossbeam::utils::Backoff;
use noodles::fasta;

use crate::error::PipelineError;
use crate::io_util::open_maybe_gz;
use crate::mapping::MappingRecord;
use crate::work::WorkUnit;

/// Walks the query FASTA files and the mapping file in lock-step, emitting
/// a `WorkUnit` onto `q1` for every mapping that groups with the query
/// currently being scanned. See SPEC_FULL.md §4.R for the two-pointer
/// protocol this implements. Sets `reader_done` on exit, whether it exited
/// cleanly or on a fatal error (recorded into `error_slot`).
pub fn run<P: AsRef<Path>>(
    query_paths: &[P],
    mapping_path: &Path,
    q1: &ArrayQueue<WorkUnit>,
    reader_done: &AtomicBool,
    skipped_qid: &AtomicU64,
    error_slot: &Mutex<Option<anyhow::Error>>,
) {
    if let Err(e) = run_inner(query_paths, mapping_path, q1, skipped_qid) {
        let mut slot = error_slot.lock().unwrap();
        if slot.is_none() {
            *slot = Some(e);
        }
    }
    reader_done.store(true, Ordering::Release);
}

fn push_blocking(q1: &ArrayQueue<WorkUnit>, mut unit: WorkUnit) {
    let backoff = Backoff::new();
    while let Err(rejected) = q1.push(unit) {
        unit = rejected;
        backoff.snooze();
    }
}

type MappingLines = Lines<BufReader<File>>;

/// Reads the next non-blank mapping line, parsing it. Returns `None` at EOF.
fn next_mapping(lines: &mut MappingLines) -> Result<Option<(MappingRecord, String)>> {
    for line in lines {
        let line = line.context("failed to read mapping file")?;
        if line.trim().is_empty() {
            continue;
        }
        let mapping = MappingRecord::parse(&line)?;
        return Ok(Some((mapping, line)));
    }
    Ok(None)
}

fn run_inner<P: AsRef<Path>>(
    query_paths: &[P],
    mapping_path: &Path,
    q1: &ArrayQueue<WorkUnit>,
    skipped_qid: &AtomicU64,
) -> Result<()> {
    let mapping_file = File::open(mapping_path).map_err(|e| {
        anyhow::Error::new(PipelineError::InputOpen(format!("{}: {e}", mapping_path.display())))
    })?;
    let mut mapping_lines: MappingLines = BufReader::new(mapping_file).lines();

    let mut held: Option<(MappingRecord, String)> = None;
    let mut mapping_exhausted = false;

    'queries: for query_path in query_paths {
        if mapping_exhausted {
            break;
        }
        let query_path = query_path.as_ref();
        let reader = open_maybe_gz(query_path)
            .with_context(|| format!("failed to open query file {}", query_path.display()))?;
        let mut fasta_reader = fasta::Reader::new(reader);

        for record in fasta_reader.records() {
            if mapping_exhausted {
                break 'queries;
            }

            let record = record
                .with_context(|| format!("failed to read FASTA record from {}", query_path.display()))?;
            let q_id = String::from_utf8_lossy(record.name()).into_owned();
            let mut q_sequence = record.sequence().as_ref().to_vec();
            q_sequence.make_ascii_uppercase();

            if held.is_none() {
                held = next_mapping(&mut mapping_lines)?;
                if held.is_none() {
                    mapping_exhausted = true;
                    break 'queries;
                }
            }

            // The held mapping belongs to a later query; this one has none.
            if held.as_ref().unwrap().0.q_id != q_id {
                skipped_qid.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            loop {
                let (mapping, raw_line) = held.take().expect("just checked held.is_some()");
                push_blocking(q1, WorkUnit { mapping, raw_line, q_sequence: q_sequence.clone() });

                match next_mapping(&mut mapping_lines)? {
                    Some((next_record, next_line)) => {
                        let same_group = next_record.q_id == q_id;
                        held = Some((next_record, next_line));
                        if !same_group {
                            break;
                        }
                    }
                    None => {
                        mapping_exhausted = true;
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
