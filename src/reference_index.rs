use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use noodles::fasta;

use crate::error::PipelineError;
use crate::io_util::open_maybe_gz;

/// Immutable, read-only map of reference sequence id -> upper-cased
/// sequence bytes. Built once before the pipeline starts and shared with
/// every Worker behind an `Arc` for the remainder of the run.
pub struct ReferenceIndex {
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceIndex {
    /// Scans one or more FASTA inputs, uppercasing each sequence and keying
    /// it by the first whitespace-delimited token of its header. Fails if
    /// an identifier repeats, across or within files.
    pub fn build<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut sequences = HashMap::new();

        for path in paths {
            let path = path.as_ref();
            let reader = open_maybe_gz(path)
                .with_context(|| format!("failed to open reference file {}", path.display()))?;
            let mut fasta_reader = fasta::Reader::new(reader);

            for record in fasta_reader.records() {
                let record = record
                    .with_context(|| format!("failed to read FASTA record from {}", path.display()))?;
                let id = String::from_utf8_lossy(record.name()).into_owned();
                let mut seq = record.sequence().as_ref().to_vec();
                seq.make_ascii_uppercase();

                if sequences.insert(id.clone(), seq).is_some() {
                    return Err(anyhow::Error::new(PipelineError::DuplicateRefId(id)));
                }
            }
        }

        Ok(ReferenceIndex { sequences })
    }

    /// Returns the full upper-cased sequence for `ref_id`.
    ///
    /// Panics if `ref_id` is absent. Every call site reaches this only for
    /// a `refId` a Mapping Record already named, which the upstream
    /// mapper's contract guarantees exists in the reference set (§3
    /// invariants) - a missing id here means that contract was violated
    /// upstream, not a condition this crate can recover from.
    pub fn get(&self, ref_id: &str) -> &[u8] {
        self.sequences
            .get(ref_id)
            .unwrap_or_else(|| panic!("reference id {ref_id} missing from index"))
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
