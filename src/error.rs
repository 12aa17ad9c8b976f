use thiserror::Error;

/// The error taxonomy for one pipeline invocation.
///
/// `AlignerFailure` deliberately has no variant here: it is a per-record,
/// non-fatal outcome that Workers count rather than propagate.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open input file {0}")]
    InputOpen(String),

    #[error("malformed mapping record: {0}")]
    MalformedMapping(String),

    #[error("duplicate reference sequence id: {0}")]
    DuplicateRefId(String),

    #[error("failed to write output: {0}")]
    OutputWrite(String),
}
