pub mod error;
pub mod extract;
pub mod header;
pub mod read;
pub mod write;

/// Progress notification emitted by the writer and the extractor.
///
/// Counters are running totals, not entry indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// `n` entries appended to the archive so far.
    Packed(usize),
    /// `n` files written to the destination so far.
    Wrote(usize),
}
