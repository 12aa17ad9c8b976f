use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::queue::ArrayQueue;
use crossbeam::utils::Backoff;

use crate::error::PipelineError;

/// Sole consumer of `q2`: writes each non-empty line verbatim to `out`,
/// preserving Q2 dequeue order (not necessarily input order - see
/// SPEC_FULL.md §4.O). Exits once `q2` is observed empty with every
/// worker's `is_working` flag cleared.
pub fn run<W: Write>(
    q2: &ArrayQueue<String>,
    workers_done: &[Arc<AtomicBool>],
    mut out: W,
    error_slot: &Mutex<Option<anyhow::Error>>,
) {
    let backoff = Backoff::new();
    loop {
        match q2.pop() {
            Some(line) => {
                backoff.reset();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = out.write_all(line.as_bytes()) {
                    let mut slot = error_slot.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(anyhow::Error::new(PipelineError::OutputWrite(e.to_string())));
                    }
                    return;
                }
            }
            None => {
                let all_workers_done = workers_done.iter().all(|w| !w.load(Ordering::Acquire));
                if all_workers_done && q2.is_empty() {
                    break;
                }
                backoff.snooze();
            }
        }
    }
    if let Err(e) = out.flush() {
        let mut slot = error_slot.lock().unwrap();
        if slot.is_none() {
            *slot = Some(anyhow::Error::new(PipelineError::OutputWrite(e.to_string())));
        }
    }
}
