use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Realign sketch-mapper PAF records base-by-base against their reference sequences",
    long_about = None
)]
pub struct Cli {
    /// Reference FASTA file(s), gzip-compressed or plain.
    #[arg(
        short = 'r', long = "ref-sequences", value_name = "FASTA",
        required = true, num_args = 1.., value_parser(check_input_exists)
    )]
    pub ref_sequences: Vec<PathBuf>,

    /// Query FASTA file(s), in the same qId order as the mapping file.
    #[arg(
        short = 'q', long = "query-sequences", value_name = "FASTA",
        required = true, num_args = 1.., value_parser(check_input_exists)
    )]
    pub query_sequences: Vec<PathBuf>,

    /// Sorted, qId-grouped mapping file (PAF-shaped, at least 9 columns).
    #[arg(
        short = 'm', long = "mashmap-paf-file", value_name = "PAF",
        required = true, value_parser(check_input_exists)
    )]
    pub mashmap_paf_file: PathBuf,

    /// Output alignment file. PAF-shaped despite the name.
    #[arg(short = 'o', long = "sam-output-file", value_name = "PAF")]
    pub sam_output_file: PathBuf,

    /// Number of worker threads.
    #[arg(short = 't', long = "threads", value_name = "THREADS", default_value_t = 1)]
    pub threads: usize,

    /// Target minimum percent identity. 0 means unbounded divergence.
    #[arg(short = 'p', long = "percentage-identity", value_name = "PCT", default_value_t = 0.0)]
    pub percentage_identity: f64,
}

fn check_input_exists(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("file does not exist: {s}"))
    }
}
