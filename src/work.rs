use crate::mapping::MappingRecord;

/// One unit of work dequeued by a Worker: the parsed mapping, the original
/// line it came from (retained verbatim for pass-through), and an owned
/// copy of the query sequence it refers to (owned so the Reader can move on
/// to the next query without pinning FASTA buffers).
pub struct WorkUnit {
    pub mapping: MappingRecord,
    pub raw_line: String,
    pub q_sequence: Vec<u8>,
}
