use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::ProgressState;
use crate::error::{PkError, Result};
use crate::header::{EntryHeader, HEADER_LEN};
use crate::read::{self, read_full};

/// Size of the copy buffer between the archive and an output file.
/// Any chunk size reproduces byte-identical output.
const COPY_BUF: usize = 64 * 1024;

/// Unpack every entry of `archive` into `dest_dir`.
///
/// Duplicate entry names all extract; the later occurrence overwrites
/// the earlier one on disk. Returns the written paths in archive order.
pub fn full_unpack(
    archive: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    on_progress: Option<impl Fn(ProgressState)>,
) -> Result<Vec<PathBuf>> {
    let archive = archive.as_ref();
    let dest_dir = dest_dir.as_ref();
    validate(archive, dest_dir)?;
    let headers = read::scan_headers(archive)?;
    read::verify_integrity(archive, &headers)?;
    extract_entries(archive, dest_dir, None, on_progress)
}

/// Unpack only the entries named in `names` into `dest_dir`.
///
/// Every requested name must exist in the archive; a missing one fails
/// with `UnknownEntry` before any file is written. Duplicate entry
/// names resolve first-match-wins: only the first occurrence of a
/// requested name is written.
pub fn unpack(
    archive: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    names: &[String],
    on_progress: Option<impl Fn(ProgressState)>,
) -> Result<Vec<PathBuf>> {
    let archive = archive.as_ref();
    let dest_dir = dest_dir.as_ref();
    validate(archive, dest_dir)?;

    let headers = read::scan_headers(archive)?;
    read::verify_integrity(archive, &headers)?;
    let known: HashSet<&str> = headers.iter().map(EntryHeader::name).collect();
    for name in names {
        if !known.contains(name.as_str()) {
            return Err(PkError::UnknownEntry(name.clone()));
        }
    }

    let selected: HashSet<&str> = names.iter().map(String::as_str).collect();
    extract_entries(archive, dest_dir, Some(selected), on_progress)
}

/// Archive path must look like an archive AND the destination must be
/// an existing directory; either failure alone aborts.
fn validate(archive: &Path, dest_dir: &Path) -> Result<()> {
    read::check_archive_path(archive)?;
    if !dest_dir.is_dir() {
        return Err(PkError::DestinationNotDirectory(dest_dir.to_path_buf()));
    }
    Ok(())
}

fn extract_entries(
    archive: &Path,
    dest_dir: &Path,
    selected: Option<HashSet<&str>>,
    on_progress: Option<impl Fn(ProgressState)>,
) -> Result<Vec<PathBuf>> {
    let mut remaining = selected;
    let mut reader = BufReader::new(File::open(archive)?);
    let mut written = Vec::new();
    let mut offset = 0u64;
    loop {
        let mut buf = [0u8; HEADER_LEN];
        let got = read_full(&mut reader, &mut buf)?;
        if got == 0 {
            break;
        }
        if got < HEADER_LEN {
            return Err(PkError::TruncatedHeader { offset, got });
        }
        let header = EntryHeader::decode(&buf)?;
        offset += HEADER_LEN as u64;

        // first occurrence of a selected name wins; later duplicates
        // are skipped like unselected entries
        let wanted = match &mut remaining {
            Some(set) => set.take(header.name()).is_some(),
            None => true,
        };
        if wanted {
            let out_path = dest_dir.join(header.name());
            copy_payload(&mut reader, &header, &out_path)?;
            written.push(out_path);
            if let Some(on_progress) = &on_progress {
                on_progress(ProgressState::Wrote(written.len()));
            }
        } else {
            reader.seek(SeekFrom::Current(header.size() as i64))?;
        }
        offset += header.size();
    }
    Ok(written)
}

fn copy_payload<R: Read>(reader: &mut R, header: &EntryHeader, out_path: &Path) -> Result<()> {
    // created or truncated unconditionally
    let mut out = File::create(out_path)?;
    let mut buf = [0u8; COPY_BUF];
    let mut left = header.size();
    while left > 0 {
        let want = left.min(COPY_BUF as u64) as usize;
        let got = read_full(reader, &mut buf[..want])?;
        if got == 0 {
            return Err(PkError::TruncatedPayload {
                name: header.name().to_owned(),
                expected: header.size(),
                got: header.size() - left,
            });
        }
        out.write_all(&buf[..got])?;
        left -= got as u64;
    }
    Ok(())
}
