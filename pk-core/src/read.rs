use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{PkError, Result};
use crate::header::{EntryHeader, HEADER_LEN};

/// Required extension of an archive file.
pub const ARCHIVE_EXT: &str = "pk";

/// Check that `path` names an existing regular file with the `.pk`
/// extension. Both extraction entry points apply this before the
/// destination check; neither is sufficient alone.
pub fn check_archive_path(path: &Path) -> Result<()> {
    let has_ext = path.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXT);
    if !has_ext || !path.is_file() {
        return Err(PkError::NotAnArchive(path.to_path_buf()));
    }
    Ok(())
}

/// Fill `buf` from `reader`, tolerating short reads. Returns the number
/// of bytes actually read, which is less than `buf.len()` only at EOF.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}

/// Lazy forward-only scan over an archive's headers.
///
/// Payloads are seeked over, never read. The iterator fuses after the
/// first error or the clean end of the stream; restarting means
/// reopening the archive.
pub struct Entries<R> {
    reader: R,
    offset: u64,
    done: bool,
}

impl Entries<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_archive_path(path)?;
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read + Seek> Entries<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    fn next_header(&mut self) -> Result<Option<EntryHeader>> {
        let mut buf = [0u8; HEADER_LEN];
        let got = read_full(&mut self.reader, &mut buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(PkError::TruncatedHeader {
                offset: self.offset,
                got,
            });
        }
        let header = EntryHeader::decode(&buf)?;
        // seeking past EOF is not an error here; verify_integrity is
        // what catches a truncated trailing payload
        self.reader.seek(SeekFrom::Current(header.size() as i64))?;
        self.offset += HEADER_LEN as u64 + header.size();
        Ok(Some(header))
    }
}

impl<R: Read + Seek> Iterator for Entries<R> {
    type Item = Result<EntryHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_header() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Collect every header in archive order.
pub fn scan_headers(path: impl AsRef<Path>) -> Result<Vec<EntryHeader>> {
    Entries::open(path)?.collect()
}

/// The sole aggregate corruption check: the archive's byte length must
/// equal the sum of all header and payload lengths. Swapped or shifted
/// content of equal total length is not detectable.
pub fn verify_integrity(path: &Path, headers: &[EntryHeader]) -> Result<()> {
    let actual = std::fs::metadata(path)?.len();
    let expected = headers
        .iter()
        .map(|h| HEADER_LEN as u64 + h.size())
        .sum::<u64>();
    if expected != actual {
        return Err(PkError::CorruptedArchive { expected, actual });
    }
    Ok(())
}

/// Scan plus integrity check, in archive order.
pub fn list_content(path: impl AsRef<Path>) -> Result<Vec<EntryHeader>> {
    let path = path.as_ref();
    let headers = scan_headers(path)?;
    verify_integrity(path, &headers)?;
    Ok(headers)
}
