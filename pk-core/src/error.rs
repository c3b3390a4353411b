use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PkError>;

#[derive(Debug, thiserror::Error)]
pub enum PkError {
    #[error("Upstream IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Destination is not a directory: {0}")]
    DestinationNotDirectory(PathBuf),
    #[error("Archive already exists: {0}")]
    ArchiveAlreadyExists(PathBuf),
    #[error("Sources must be a single directory or one or more regular files")]
    InvalidSourceSet,

    #[error("Entry name is {len} bytes, limit is 256: {name}")]
    NameTooLong { name: String, len: usize },
    #[error("Payload size {0} does not fit in the 8-digit size field")]
    SizeOverflow(u64),
    #[error("Entry name is not valid UTF-8")]
    InvalidName,
    #[error("Size field is not ASCII decimal: {0:02X?}")]
    InvalidSizeField([u8; 8]),

    #[error("Truncated header at offset {offset}: got {got} of 264 bytes")]
    TruncatedHeader { offset: u64, got: usize },
    #[error("Truncated payload for entry `{name}`: got {got} of {expected} bytes")]
    TruncatedPayload { name: String, expected: u64, got: u64 },
    #[error("Corrupted archive: entries describe {expected} bytes, file is {actual}")]
    CorruptedArchive { expected: u64, actual: u64 },
    #[error("Not an archive: {0}")]
    NotAnArchive(PathBuf),
    #[error("Entry not found in archive: {0}")]
    UnknownEntry(String),
}
