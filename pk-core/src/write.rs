use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::ProgressState;
use crate::error::{PkError, Result};
use crate::header::EntryHeader;
use crate::read::ARCHIVE_EXT;

/// Resolve a source set into the list of files to pack.
///
/// Accepts either a single directory, walked recursively with dotfiles
/// and dot-directories excluded at every depth, or one or more existing
/// regular files taken in the given order. Anything else is rejected.
/// Directory traversal order is whatever the filesystem yields, not
/// sorted.
pub fn resolve_sources(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    match sources {
        [] => Err(PkError::InvalidSourceSet),
        [dir] if dir.is_dir() => {
            let mut files = Vec::new();
            let walker = WalkDir::new(dir).into_iter().filter_entry(|e| !is_hidden(e));
            for entry in walker {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Ok(files)
        }
        files => {
            if files.iter().all(|f| f.is_file()) {
                Ok(files.to_vec())
            } else {
                Err(PkError::InvalidSourceSet)
            }
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|s| s.starts_with('.'))
}

/// Pack `sources` into `dest_dir/name.pk`.
///
/// The archive is built in a temporary file next to the target and
/// renamed into place only on success, so a failed pack leaves no
/// partial `.pk` behind and an existing archive is never clobbered.
/// Returns the path of the created archive.
pub fn create_archive(
    dest_dir: impl AsRef<Path>,
    name: &str,
    sources: &[PathBuf],
    on_progress: Option<impl Fn(ProgressState)>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    if !dest_dir.is_dir() {
        return Err(PkError::DestinationNotDirectory(dest_dir.to_path_buf()));
    }
    let file_name = format!("{name}.{ARCHIVE_EXT}");
    let target = dest_dir.join(&file_name);
    if target.exists() {
        return Err(PkError::ArchiveAlreadyExists(target));
    }

    let files = resolve_sources(sources)?;
    // absolute form of the target, for the self-reference guard below;
    // the target itself does not exist yet so it cannot be canonicalized
    let target_abs = dest_dir.canonicalize()?.join(&file_name);

    let mut tmp = NamedTempFile::new_in(dest_dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let mut packed = 0usize;
        for path in &files {
            // never pack the archive into itself when the destination
            // sits inside the walked tree
            if path.canonicalize().is_ok_and(|p| p == target_abs) {
                continue;
            }
            append_file(&mut writer, path)?;
            packed += 1;
            if let Some(on_progress) = &on_progress {
                on_progress(ProgressState::Packed(packed));
            }
        }
        writer.flush()?;
    }

    tmp.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            PkError::ArchiveAlreadyExists(target.clone())
        } else {
            PkError::Io(e.error)
        }
    })?;
    Ok(target)
}

fn append_file<W: Write>(writer: &mut W, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(PkError::InvalidName)?;
    let size = std::fs::metadata(path)?.len();
    let header = EntryHeader::new(name, size)?;
    writer.write_all(&header.encode())?;

    // clamp to the declared size in case the source grows mid-copy
    let mut src = File::open(path)?.take(size);
    let copied = std::io::copy(&mut src, writer)?;
    if copied != size {
        return Err(PkError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("source file `{}` shrank while packing", path.display()),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HEADER_LEN, NAME_LEN};

    fn touch(path: &Path, contents: &[u8]) -> PathBuf {
        std::fs::write(path, contents).unwrap();
        path.to_path_buf()
    }

    #[test]
    fn rejects_bad_source_sets() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(&dir.path().join("a.txt"), b"a");
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();

        assert!(matches!(resolve_sources(&[]), Err(PkError::InvalidSourceSet)));
        // directory mixed with a file
        assert!(matches!(
            resolve_sources(&[sub.clone(), file.clone()]),
            Err(PkError::InvalidSourceSet)
        ));
        // missing file
        assert!(matches!(
            resolve_sources(&[file.clone(), dir.path().join("absent")]),
            Err(PkError::InvalidSourceSet)
        ));
        // explicit files keep their order
        let b = touch(&dir.path().join("b.txt"), b"b");
        assert_eq!(resolve_sources(&[b.clone(), file.clone()]).unwrap(), [b, file]);
    }

    #[test]
    fn walk_skips_hidden_at_every_depth() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("kept.txt"), b"k");
        touch(&dir.path().join(".secret"), b"s");
        let hidden_dir = dir.path().join(".git");
        std::fs::create_dir(&hidden_dir).unwrap();
        touch(&hidden_dir.join("config"), b"c");
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        touch(&sub.join(".hidden"), b"h");
        touch(&sub.join("deep.txt"), b"d");

        let mut names: Vec<_> = resolve_sources(&[dir.path().to_path_buf()])
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["deep.txt", "kept.txt"]);
    }

    #[test]
    fn fails_on_missing_destination_and_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let src = touch(&dir.path().join("a.txt"), b"a");

        assert!(matches!(
            create_archive(
                dir.path().join("nowhere"),
                "out",
                std::slice::from_ref(&src),
                None::<fn(ProgressState)>
            ),
            Err(PkError::DestinationNotDirectory(_))
        ));

        touch(&dir.path().join("out.pk"), b"");
        assert!(matches!(
            create_archive(
                dir.path(),
                "out",
                std::slice::from_ref(&src),
                None::<fn(ProgressState)>
            ),
            Err(PkError::ArchiveAlreadyExists(_))
        ));
    }

    #[test]
    fn byte_exact_layout() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(&dir.path().join("a.txt"), b"hello");
        let b = touch(&dir.path().join("b.bin"), b"");

        let archive = create_archive(dir.path(), "out", &[a, b], None::<fn(ProgressState)>).unwrap();
        assert_eq!(archive, dir.path().join("out.pk"));

        let bytes = std::fs::read(&archive).unwrap();
        assert_eq!(bytes.len(), 2 * HEADER_LEN + 5);
        assert_eq!(&bytes[..5], b"a.txt");
        assert!(bytes[5..NAME_LEN].iter().all(|&x| x == 0));
        assert_eq!(&bytes[NAME_LEN..HEADER_LEN], b"00000005");
        assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 5], b"hello");
        assert_eq!(&bytes[HEADER_LEN + 5..HEADER_LEN + 5 + 5], b"b.bin");
        assert_eq!(&bytes[HEADER_LEN + 5 + NAME_LEN..], b"00000000");
    }

    #[test]
    fn long_basename_round_trips() {
        // 255 bytes is the longest basename most filesystems allow,
        // comfortably inside the 256-byte field
        let dir = tempfile::tempdir().unwrap();
        let name = "x".repeat(255);
        let src = touch(&dir.path().join(&name), b"payload");
        let archive = create_archive(dir.path(), "out", &[src], None::<fn(ProgressState)>).unwrap();
        let headers = crate::read::list_content(&archive).unwrap();
        assert_eq!(headers[0].name(), name);
        assert_eq!(headers[0].size(), 7);
    }

    #[test]
    fn failed_pack_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            create_archive(dir.path(), "out", &[], None::<fn(ProgressState)>),
            Err(PkError::InvalidSourceSet)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn archive_inside_walked_tree_skips_itself() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.txt"), b"a");
        let archive = create_archive(
            dir.path(),
            "self",
            &[dir.path().to_path_buf()],
            None::<fn(ProgressState)>,
        )
        .unwrap();
        let names: Vec<_> = crate::read::list_content(&archive)
            .unwrap()
            .into_iter()
            .map(|h| h.name().to_owned())
            .collect();
        assert_eq!(names, ["a.txt"]);
    }

    #[test]
    fn progress_reports_each_entry() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(&dir.path().join("a"), b"1");
        let b = touch(&dir.path().join("b"), b"2");
        let seen = std::cell::RefCell::new(Vec::new());
        create_archive(
            dir.path(),
            "out",
            &[a, b],
            Some(|state| seen.borrow_mut().push(state)),
        )
        .unwrap();
        assert_eq!(
            *seen.borrow(),
            [ProgressState::Packed(1), ProgressState::Packed(2)]
        );
    }
}
