//! Transparent byte source: opens a file, sniffs it for the gzip magic
//! bytes (`1F 8B`), and hands back a plain [`BufRead`] either way, so
//! gzip-compressed treebank files need no special-casing by callers.
//! Uses the same `Box<dyn Read>` indirection as archive member
//! decompression elsewhere in the ecosystem.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{BankError, BankResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens `path`, sniffing its first two bytes for the gzip magic number
/// regardless of file extension, and returns a line-buffered reader over
/// the (possibly decompressed) UTF-8 byte stream.
pub fn open_lines(path: &Path) -> BankResult<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| BankError::open(path, e))?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 2];
    let peeked = peek(&mut reader, &mut magic)?;

    if peeked == 2 && magic == GZIP_MAGIC {
        debug!(path = %path.display(), "detected gzip-compressed treebank file");
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Fills `buf` with up to `buf.len()` bytes without consuming them from
/// `reader`'s subsequent reads.
fn peek<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let available = reader.fill_buf()?;
    let n = available.len().min(buf.len());
    buf[..n].copy_from_slice(&available[..n]);
    Ok(n)
}
