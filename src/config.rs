use std::path::PathBuf;

use crate::cli::Cli;

/// Fully resolved configuration for one pipeline invocation. Separate from
/// `Cli` so that the pipeline can be driven programmatically (e.g. from
/// integration tests) without going through argument parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub ref_sequences: Vec<PathBuf>,
    pub query_sequences: Vec<PathBuf>,
    pub mashmap_paf_file: PathBuf,
    pub sam_output_file: PathBuf,
    pub threads: usize,
    pub percentage_identity: f64,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            ref_sequences: cli.ref_sequences,
            query_sequences: cli.query_sequences,
            mashmap_paf_file: cli.mashmap_paf_file,
            sam_output_file: cli.sam_output_file,
            threads: cli.threads.max(1),
            percentage_identity: cli.percentage_identity,
        }
    }
}
