use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use crossbeam::queue::ArrayQueue;
use crossbeam::utils::Backoff;

use crate::aligner::{AlignStatus, PairwiseAligner};
use crate::dna::reverse_complement;
use crate::mapping::Strand;
use crate::reference_index::ReferenceIndex;
use crate::work::WorkUnit;

/// One worker's run loop: dequeue `WorkUnit`s from `q1`, align, push a
/// formatted output line (or nothing, on aligner rejection) onto `q2`.
/// Exits once `q1` is observed empty with `reader_done` set, clearing
/// `is_working` on the way out - see SPEC_FULL.md §4.W / §5.
#[allow(clippy::too_many_arguments)]
pub fn run<A: PairwiseAligner>(
    q1: &ArrayQueue<WorkUnit>,
    q2: &ArrayQueue<String>,
    reader_done: &AtomicBool,
    is_working: &AtomicBool,
    aligner: &A,
    reference_index: &ReferenceIndex,
    percentage_identity: f64,
    aligned: &AtomicU64,
    aligner_failures: &AtomicU64,
    error_slot: &Mutex<Option<anyhow::Error>>,
) {
    let backoff = Backoff::new();
    loop {
        match q1.pop() {
            Some(unit) => {
                backoff.reset();
                match process_unit(&unit, aligner, reference_index, percentage_identity) {
                    Ok(Some(line)) => {
                        aligned.fetch_add(1, Ordering::Relaxed);
                        push_blocking(q2, line);
                    }
                    Ok(None) => {
                        aligner_failures.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        let mut slot = error_slot.lock().unwrap();
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                }
            }
            None => {
                if reader_done.load(Ordering::Acquire) && q1.is_empty() {
                    break;
                }
                backoff.snooze();
            }
        }
    }
    is_working.store(false, Ordering::Release);
}

fn push_blocking(q2: &ArrayQueue<String>, mut line: String) {
    let backoff = Backoff::new();
    while let Err(rejected) = q2.push(line) {
        line = rejected;
        backoff.snooze();
    }
}

/// Runs one Work Unit through the per-unit algorithm of SPEC_FULL.md §4.W.
/// Returns `Ok(None)` for an aligner rejection (non-fatal), `Err` only for a
/// bound violation upstream (out-of-range coordinates), which is fatal.
fn process_unit<A: PairwiseAligner>(
    unit: &WorkUnit,
    aligner: &A,
    reference_index: &ReferenceIndex,
    percentage_identity: f64,
) -> Result<Option<String>> {
    let mapping = &unit.mapping;
    let ref_seq = reference_index.get(&mapping.ref_id);

    let r_start = mapping.r_start as usize;
    let r_end = mapping.r_end as usize;
    anyhow::ensure!(
        r_end < ref_seq.len(),
        "rEndPos {r_end} out of bounds for reference {} (len {})",
        mapping.ref_id,
        ref_seq.len()
    );
    let ref_region = &ref_seq[r_start..=r_end];

    let q_start = mapping.q_start as usize;
    let q_end = mapping.q_end as usize;
    anyhow::ensure!(
        q_end < unit.q_sequence.len(),
        "qEndPos {q_end} out of bounds for query {} (len {})",
        mapping.q_id,
        unit.q_sequence.len()
    );
    let query_region = &unit.q_sequence[q_start..=q_end];
    let l_q = query_region.len();

    let strand_oriented = match mapping.strand {
        Strand::Fwd => query_region.to_vec(),
        Strand::Rev => reverse_complement(query_region),
    };

    let edit_distance_limit = if percentage_identity <= 0.0 {
        None
    } else {
        Some(((1.0 - percentage_identity / 100.0) * l_q as f64).floor() as usize)
    };

    let result = aligner.align(&strand_oriented, ref_region, edit_distance_limit);

    if result.status != AlignStatus::Ok {
        return Ok(None);
    }

    let divergence = result.edit_distance as f64 / result.alignment_length as f64;
    let line = format!(
        "{}\ted:i:{}\tal:i{}\tad:f:{}\tcg:Z:{}\n",
        unit.raw_line,
        result.edit_distance,
        result.alignment_length,
        divergence,
        result.cigar_string()
    );
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::EditDistanceAligner;
    use crate::mapping::MappingRecord;
    use crate::reference_index::ReferenceIndex;
    use std::io::Write;

    fn index_with(fasta: &str) -> ReferenceIndex {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{fasta}").unwrap();
        ReferenceIndex::build(&[file.path()]).unwrap()
    }

    #[test]
    fn forward_strand_exact_match() {
        let index = index_with(">r1\nACGTACGTAC\n");
        let mapping = MappingRecord::parse("q1\t8\t0\t7\t+\tr1\t10\t0\t7").unwrap();
        let unit = WorkUnit { mapping, raw_line: "q1\t8\t0\t7\t+\tr1\t10\t0\t7".into(), q_sequence: b"ACGTACGT".to_vec() };

        let line = process_unit(&unit, &EditDistanceAligner, &index, 0.0).unwrap().unwrap();
        assert!(line.starts_with("q1\t8\t0\t7\t+\tr1\t10\t0\t7\t"));
        assert!(line.trim_end().ends_with("cg:Z:8="));
        assert!(line.contains("al:i8"));
    }

    #[test]
    fn reverse_strand_is_complemented_before_aligning() {
        let index = index_with(">r1\nAAAACCCC\n");
        let mapping = MappingRecord::parse("q1\t4\t0\t3\t-\tr1\t8\t4\t7").unwrap();
        let unit = WorkUnit { mapping, raw_line: "q1\t4\t0\t3\t-\tr1\t8\t4\t7".into(), q_sequence: b"GGGG".to_vec() };

        let line = process_unit(&unit, &EditDistanceAligner, &index, 0.0).unwrap().unwrap();
        assert!(line.trim_end().ends_with("cg:Z:4="));
    }

    #[test]
    fn bounded_divergence_emits_edit_distance() {
        let index = index_with(">r1\nACGTACGTAC\n");
        // Query differs from the reference window in exactly one base.
        let mapping = MappingRecord::parse("q1\t10\t0\t9\t+\tr1\t10\t0\t9").unwrap();
        let unit = WorkUnit {
            mapping,
            raw_line: "q1\t10\t0\t9\t+\tr1\t10\t0\t9".into(),
            q_sequence: b"ACGTTCGTAC".to_vec(),
        };

        let line = process_unit(&unit, &EditDistanceAligner, &index, 80.0).unwrap().unwrap();
        assert!(line.contains("ed:i:1"));
    }

    #[test]
    fn impossibly_tight_bound_yields_no_output() {
        let index = index_with(">r1\nCCCCCCCCCC\n");
        let mapping = MappingRecord::parse("q1\t10\t0\t9\t+\tr1\t10\t0\t9").unwrap();
        let unit = WorkUnit {
            mapping,
            raw_line: "q1\t10\t0\t9\t+\tr1\t10\t0\t9".into(),
            q_sequence: b"AAAAAAAAAA".to_vec(),
        };

        // percentage_identity=100 over a fully mismatching window -> limit 0.
        let outcome = process_unit(&unit, &EditDistanceAligner, &index, 100.0).unwrap();
        assert!(outcome.is_none());
    }
}
