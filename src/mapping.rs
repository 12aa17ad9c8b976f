use crate::error::PipelineError;

/// The strand a mapping record was reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Fwd,
    Rev,
}

/// One parsed mapping record. Column indices follow the PAF-shaped layout
/// documented in SPEC_FULL.md §3 / §6; columns beyond index 8 are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    pub q_id: String,
    pub q_start: u64,
    pub q_end: u64,
    pub strand: Strand,
    pub ref_id: String,
    pub r_start: u64,
    pub r_end: u64,
}

impl MappingRecord {
    /// Parses one whitespace-delimited mapping line. Fails if fewer than 9
    /// columns are present, an integer field doesn't parse, the strand
    /// token isn't `+`/`-`, or `start > end` on either axis.
    pub fn parse(line: &str) -> Result<Self, PipelineError> {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 9 {
            return Err(PipelineError::MalformedMapping(format!(
                "expected at least 9 whitespace-delimited columns, found {}",
                cols.len()
            )));
        }

        let parse_u64 = |s: &str| -> Result<u64, PipelineError> {
            s.parse::<u64>()
                .map_err(|_| PipelineError::MalformedMapping(format!("not an integer: {s}")))
        };

        let q_id = cols[0].to_string();
        let q_start = parse_u64(cols[2])?;
        let q_end = parse_u64(cols[3])?;
        let strand = match cols[4] {
            "+" => Strand::Fwd,
            "-" => Strand::Rev,
            other => {
                return Err(PipelineError::MalformedMapping(format!(
                    "unknown strand token: {other}"
                )))
            }
        };
        let ref_id = cols[5].to_string();
        let r_start = parse_u64(cols[7])?;
        let r_end = parse_u64(cols[8])?;

        if q_start > q_end {
            return Err(PipelineError::MalformedMapping(format!(
                "qStartPos {q_start} > qEndPos {q_end}"
            )));
        }
        if r_start > r_end {
            return Err(PipelineError::MalformedMapping(format!(
                "rStartPos {r_start} > rEndPos {r_end}"
            )));
        }

        Ok(MappingRecord { q_id, q_start, q_end, strand, ref_id, r_start, r_end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let record = MappingRecord::parse("q1\t8\t0\t7\t+\tr1\t10\t0\t7\tNM:i:0").unwrap();
        assert_eq!(record.q_id, "q1");
        assert_eq!(record.q_start, 0);
        assert_eq!(record.q_end, 7);
        assert_eq!(record.strand, Strand::Fwd);
        assert_eq!(record.ref_id, "r1");
        assert_eq!(record.r_start, 0);
        assert_eq!(record.r_end, 7);
    }

    #[test]
    fn parses_reverse_strand() {
        let record = MappingRecord::parse("q1 4 0 3 - r1 8 4 7").unwrap();
        assert_eq!(record.strand, Strand::Rev);
    }

    #[test]
    fn rejects_too_few_columns() {
        let err = MappingRecord::parse("q1 4 0 3 - r1 8").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedMapping(_)));
    }

    #[test]
    fn rejects_unknown_strand() {
        let err = MappingRecord::parse("q1 4 0 3 ? r1 8 4 7").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedMapping(_)));
    }

    #[test]
    fn rejects_non_numeric_field() {
        let err = MappingRecord::parse("q1 4 x 3 + r1 8 4 7").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedMapping(_)));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = MappingRecord::parse("q1 4 7 3 + r1 8 4 7").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedMapping(_)));
    }
}
