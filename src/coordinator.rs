use std::fs::File;
use std::io::BufWriter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use crossbeam::queue::ArrayQueue;

use crate::aligner::EditDistanceAligner;
use crate::config::Config;
use crate::reader;
use crate::reference_index::ReferenceIndex;
use crate::work::WorkUnit;
use crate::worker;
use crate::writer;

/// Modest library default, sized to keep unit/integration tests fast rather
/// than to approximate the production figure. See `production` for the
/// latter.
const DEFAULT_QUEUE_CAPACITY: usize = 1 << 14;

/// Production-sized queue capacity, approximating the spec's ~2^17 figure
/// for a multi-gigabase run. Wired in by the binary via `Coordinator::production`.
const PRODUCTION_QUEUE_CAPACITY: usize = 1 << 17;

/// Builds the Reference Index, allocates Q1/Q2 and the termination flags,
/// spawns Reader/Workers/Writer, and joins them in order. See SPEC_FULL.md
/// §4.C / §5 for the full contract.
pub struct Coordinator {
    queue_capacity: usize,
}

impl Default for Coordinator {
    fn default() -> Self {
        Coordinator { queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

impl Coordinator {
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Coordinator { queue_capacity }
    }

    /// Production-sized `Coordinator`, as wired in by `main`.
    pub fn production() -> Self {
        Coordinator { queue_capacity: PRODUCTION_QUEUE_CAPACITY }
    }

    pub fn run(&self, config: &Config) -> Result<()> {
        let reference_index = Arc::new(
            ReferenceIndex::build(&config.ref_sequences).context("failed to build reference index")?,
        );
        anyhow::ensure!(!reference_index.is_empty(), "no reference sequences were loaded");
        eprintln!("loaded {} reference sequence(s)", reference_index.len());

        let q1: Arc<ArrayQueue<WorkUnit>> = Arc::new(ArrayQueue::new(self.queue_capacity));
        let q2: Arc<ArrayQueue<String>> = Arc::new(ArrayQueue::new(self.queue_capacity));
        let reader_done = Arc::new(AtomicBool::new(false));
        let error_slot: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));
        let aligned = Arc::new(AtomicU64::new(0));
        let skipped_qid = Arc::new(AtomicU64::new(0));
        let aligner_failures = Arc::new(AtomicU64::new(0));
        let working: Vec<Arc<AtomicBool>> =
            (0..config.threads).map(|_| Arc::new(AtomicBool::new(true))).collect();

        let output_file = File::create(&config.sam_output_file).with_context(|| {
            format!("failed to create output file {}", config.sam_output_file.display())
        })?;
        let output = BufWriter::new(output_file);

        let reader_handle = {
            let q1 = Arc::clone(&q1);
            let reader_done = Arc::clone(&reader_done);
            let skipped_qid = Arc::clone(&skipped_qid);
            let error_slot = Arc::clone(&error_slot);
            let query_paths = config.query_sequences.clone();
            let mapping_path = config.mashmap_paf_file.clone();
            thread::spawn(move || {
                reader::run(&query_paths, &mapping_path, &q1, &reader_done, &skipped_qid, &error_slot);
            })
        };

        let mut worker_handles = Vec::with_capacity(config.threads);
        for is_working in &working {
            let q1 = Arc::clone(&q1);
            let q2 = Arc::clone(&q2);
            let reader_done = Arc::clone(&reader_done);
            let is_working = Arc::clone(is_working);
            let reference_index = Arc::clone(&reference_index);
            let error_slot = Arc::clone(&error_slot);
            let aligned = Arc::clone(&aligned);
            let aligner_failures = Arc::clone(&aligner_failures);
            let percentage_identity = config.percentage_identity;

            worker_handles.push(thread::spawn(move || {
                let aligner = EditDistanceAligner;
                worker::run(
                    &q1,
                    &q2,
                    &reader_done,
                    &is_working,
                    &aligner,
                    &reference_index,
                    percentage_identity,
                    &aligned,
                    &aligner_failures,
                    &error_slot,
                );
            }));
        }

        let writer_handle = {
            let q2 = Arc::clone(&q2);
            let working = working.clone();
            let error_slot = Arc::clone(&error_slot);
            thread::spawn(move || {
                writer::run(&q2, &working, output, &error_slot);
            })
        };

        reader_handle.join().expect("reader thread panicked");
        for handle in worker_handles {
            handle.join().expect("worker thread panicked");
        }
        writer_handle.join().expect("writer thread panicked");

        let error_slot = Arc::try_unwrap(error_slot)
            .unwrap_or_else(|_| unreachable!("all threads holding error_slot have joined"))
            .into_inner()
            .unwrap();
        if let Some(e) = error_slot {
            return Err(e);
        }

        let aligned = aligned.load(Ordering::Relaxed);
        let skipped_qid = skipped_qid.load(Ordering::Relaxed);
        let failures = aligner_failures.load(Ordering::Relaxed);
        eprintln!(
            "alignment pipeline finished; {aligned} record(s) aligned, \
             {skipped_qid} query record(s) skipped for missing qId, \
             {failures} record(s) rejected by the aligner"
        );
        Ok(())
    }
}
