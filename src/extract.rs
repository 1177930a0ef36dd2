//! Spliced-subsequence extraction.
//!
//! Given a parent nucleotide sequence and the resolved spans of a feature,
//! this module materializes the feature's own sequence: each span is sliced
//! out of the parent (1-based inclusive bounds), reverse-complemented when it
//! sits on the minus strand, and the pieces are concatenated in span order.

use thiserror::Error;

use crate::model::{LocationSpan, Strand};

/// Errors that can occur during span extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("span {start}..{end} is outside the sequence (length {length})")]
    OutOfRange {
        start: u32,
        end: u32,
        length: usize,
    },

    #[error("sequence contains a non-ASCII symbol {0:?}")]
    NonAsciiSymbol(char),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Complement of one upper-case nucleotide. Degenerate IUPAC codes map to
/// their complementary code (R to Y, K to M and so on); anything unrecognized
/// becomes N.
fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' | b'W' | b'N' => base,
        _ => b'N',
    }
}

/// Reverse complement of an upper-case nucleotide sequence.
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| char::from(complement(b)))
        .collect()
}

/// Materializes the spliced subsequence described by `spans`.
///
/// The result length always equals the sum of the span lengths; nothing
/// outside the declared spans is read. A sequence holding anything other
/// than ASCII is reported as [`ExtractError::NonAsciiSymbol`] rather than
/// sliced.
///
/// # Arguments
///
/// * `sequence` - The parent nucleotide sequence (ASCII, upper case)
/// * `spans` - Ordered spans from [`crate::location::parse_location`]
pub fn extract_spans(sequence: &str, spans: &[LocationSpan]) -> ExtractResult<String> {
    for span in spans {
        if span.start == 0 || span.end < span.start || span.end as usize > sequence.len() {
            return Err(ExtractError::OutOfRange {
                start: span.start,
                end: span.end,
                length: sequence.len(),
            });
        }
    }

    let total: usize = spans.iter().map(|s| s.length() as usize).sum();
    let mut spliced = String::with_capacity(total);
    for span in spans {
        let slice = sequence
            .get(span.start as usize - 1..span.end as usize)
            .filter(|slice| slice.is_ascii())
            .ok_or_else(|| non_ascii_symbol(sequence))?;
        match span.strand {
            Strand::Forward => spliced.push_str(slice),
            Strand::Reverse => spliced.push_str(&reverse_complement(slice)),
        }
    }
    Ok(spliced)
}

/// The bounds check has already passed when this is called, so a failed
/// slice means a multi-byte character is present somewhere.
fn non_ascii_symbol(sequence: &str) -> ExtractError {
    let symbol = sequence.chars().find(|c| !c.is_ascii()).unwrap_or('?');
    ExtractError::NonAsciiSymbol(symbol)
}
