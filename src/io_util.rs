use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::bufread::MultiGzDecoder;

use crate::error::PipelineError;

/// Either a plain or a gzip-decompressed byte stream behind one `Read` impl.
pub enum MaybeGzReader<R: BufRead> {
    Plain(R),
    Gz(Box<MultiGzDecoder<R>>),
}

impl<R: BufRead> Read for MaybeGzReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MaybeGzReader::Plain(r) => r.read(buf),
            MaybeGzReader::Gz(r) => r.read(buf),
        }
    }
}

/// Opens a FASTA input, transparently decompressing gzip input detected by
/// its magic bytes (`1F 8B`) rather than by file extension.
pub fn open_maybe_gz(path: &Path) -> Result<BufReader<MaybeGzReader<BufReader<File>>>> {
    let file = File::open(path).map_err(|e| {
        anyhow::Error::new(PipelineError::InputOpen(format!("{}: {e}", path.display())))
    })?;
    let mut buffered = BufReader::new(file);

    let is_gzip = {
        let header = buffered
            .fill_buf()
            .with_context(|| format!("failed to probe {}", path.display()))?;
        header.len() >= 2 && header[0] == 0x1f && header[1] == 0x8b
    };

    let reader = if is_gzip {
        MaybeGzReader::Gz(Box::new(MultiGzDecoder::new(buffered)))
    } else {
        MaybeGzReader::Plain(buffered)
    };
    Ok(BufReader::new(reader))
}
