use crate::error::{PkError, Result};

/// Width of the zero-padded name field.
pub const NAME_LEN: usize = 256;
/// Width of the ASCII decimal size field.
pub const SIZE_LEN: usize = 8;
/// Total fixed header width preceding every payload.
pub const HEADER_LEN: usize = NAME_LEN + SIZE_LEN;

/// Exclusive upper bound on a payload size (10^8, one past the largest
/// value the 8-digit decimal field can carry).
pub const MAX_PAYLOAD: u64 = 100_000_000;

/// One entry's metadata: basename plus exact payload byte length.
///
/// On disk this is a fixed 264-byte block: the UTF-8 name right-padded
/// with NULs to 256 bytes, followed by the size as 8 zero-padded ASCII
/// decimal digits. The size field is text by design, not a binary
/// integer; byte compatibility with existing `.pk` files depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    name: String,
    size: u64,
}

impl EntryHeader {
    pub fn new(name: impl Into<String>, size: u64) -> Result<Self> {
        let name = name.into();
        if name.len() > NAME_LEN {
            let len = name.len();
            return Err(PkError::NameTooLong { name, len });
        }
        if size >= MAX_PAYLOAD {
            return Err(PkError::SizeOverflow(size));
        }
        Ok(Self { name, size })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..self.name.len()].copy_from_slice(self.name.as_bytes());
        let size = format!("{:0width$}", self.size, width = SIZE_LEN);
        buf[NAME_LEN..].copy_from_slice(size.as_bytes());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        let name_field = &buf[..NAME_LEN];
        // trailing NULs are padding, interior bytes are kept verbatim
        let name_end = name_field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let name = std::str::from_utf8(&name_field[..name_end])
            .map_err(|_| PkError::InvalidName)?
            .to_owned();

        let size_field: [u8; SIZE_LEN] = buf[NAME_LEN..].try_into().unwrap();
        if !size_field.iter().all(u8::is_ascii_digit) {
            return Err(PkError::InvalidSizeField(size_field));
        }
        let size = size_field
            .iter()
            .fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));

        Ok(Self { name, size })
    }
}
