//! EMBL flat-file parser.
//!
//! EMBL is the European mirror format of GenBank: every line opens with a
//! two-letter code, the feature table rides on `FT` lines, and the
//! location/qualifier grammar is shared with GenBank.
//!
//! ## EMBL format
//!
//! ```text
//! ID   U49845; SV 1; linear; genomic DNA; STD; FUN; 5028 BP.
//! AC   U49845;
//! DE   Saccharomyces cerevisiae TCP1-beta gene, partial cds.
//! FT   source          1..5028
//! FT                   /organism="Saccharomyces cerevisiae"
//! FT   CDS             <1..206
//! FT                   /codon_start=3
//! SQ   Sequence 5028 BP; 1510 A; 1074 C; 835 G; 1609 T; 0 other;
//!      gatcctccat atacaacggt atctccacct caggtttaga tctcaacaac ggaaccattg        60
//! //
//! ```
//!
//! Columns match GenBank: the feature key sits at column 6 and the
//! location/qualifier content at column 22, with the `FT` code occupying
//! the first two columns.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{split_qualifier, RecordBuilder};
use crate::model::GenomicRecord;

/// Errors that can occur during EMBL parsing.
#[derive(Error, Debug)]
pub enum EmblError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed EMBL input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("record {0:?} is missing its // terminator")]
    MissingTerminator(String),
}

/// Result type for EMBL operations.
pub type EmblResult<T> = Result<T, EmblError>;

/// Qualifier and continuation content follows 19 spaces after the FT code.
const FT_QUALIFIER_INDENT: &str = "                   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Sequence,
}

#[derive(Debug, PartialEq, Eq)]
enum FeatureLine<'a> {
    Key { key: &'a str, location: &'a str },
    Qualifier(&'a str),
    Continuation(&'a str),
}

/// Classifies the payload of one `FT` line, enforcing the column rules.
fn classify_feature_line(line: &str, line_no: usize) -> EmblResult<FeatureLine<'_>> {
    let rest = &line[2..];
    if let Some(content) = rest.strip_prefix(FT_QUALIFIER_INDENT) {
        let content = content.trim();
        if content.starts_with('/') {
            return Ok(FeatureLine::Qualifier(content));
        }
        return Ok(FeatureLine::Continuation(content));
    }

    let bytes = rest.as_bytes();
    if rest.starts_with("   ") && bytes.len() > 3 && bytes[3] != b' ' {
        let body = &rest[3..];
        let (key, location) = match body.split_once(|c: char| c.is_whitespace()) {
            Some((key, location)) => (key, location.trim()),
            None => (body, ""),
        };
        return Ok(FeatureLine::Key { key, location });
    }

    Err(EmblError::MalformedInput {
        line: line_no,
        message: format!("unexpected indentation in feature table: {:?}", line),
    })
}

/// Streaming reader over an EMBL source.
#[derive(Debug)]
pub struct Reader<B> {
    reader: B,
}

impl Reader<BufReader<File>> {
    /// Opens an EMBL file. A missing path fails with `FileNotFound` before
    /// any parsing happens.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EmblResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EmblError::FileNotFound(path.to_path_buf()),
            _ => EmblError::Io(e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<B: BufRead> Reader<B> {
    /// Wraps an already-open source.
    pub fn new(reader: B) -> Self {
        Self { reader }
    }

    /// Consumes the reader into a lazy record iterator.
    pub fn records(self) -> Records<B> {
        Records {
            lines: self.reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

/// Lazy iterator over the records of an EMBL source.
pub struct Records<B: BufRead> {
    lines: Lines<B>,
    line_no: usize,
    done: bool,
}

impl<B: BufRead> Records<B> {
    fn parse_record(&mut self) -> EmblResult<Option<GenomicRecord>> {
        let mut builder = RecordBuilder::new();
        let mut section = Section::Header;

        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = line?;
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with("//") {
                if builder.seen_content() {
                    return self.finish(builder).map(Some);
                }
                continue;
            }

            match section {
                Section::Header => {
                    if line.starts_with("ID ") {
                        self.set_id(&mut builder, line)?;
                    } else if line.starts_with("FT ") {
                        self.feature_line(&mut builder, line)?;
                    } else if line.starts_with("SQ ") || line == "SQ" {
                        builder.finish_feature();
                        section = Section::Sequence;
                    }
                    // AC, DE, XX, FH and the other codes are irrelevant here.
                }
                Section::Sequence => self.sequence_line(&mut builder, line)?,
            }
        }

        if builder.seen_content() {
            Err(EmblError::MissingTerminator(builder.id_for_error()))
        } else {
            Ok(None)
        }
    }

    fn set_id(&self, builder: &mut RecordBuilder, line: &str) -> EmblResult<()> {
        let rest = line[2..].trim_start();
        let id = rest
            .split([';', ' '])
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EmblError::MalformedInput {
                line: self.line_no,
                message: "ID line is missing the record identifier".to_string(),
            })?;
        builder.set_identity(id, declared_bp(rest));
        Ok(())
    }

    fn feature_line(&self, builder: &mut RecordBuilder, line: &str) -> EmblResult<()> {
        match classify_feature_line(line, self.line_no)? {
            FeatureLine::Key { key, location } => builder.start_feature(key, location),
            FeatureLine::Qualifier(content) => {
                if !builder.in_feature() {
                    return Err(EmblError::MalformedInput {
                        line: self.line_no,
                        message: format!("qualifier {:?} before any feature key", content),
                    });
                }
                let (name, value) =
                    split_qualifier(content).ok_or_else(|| EmblError::MalformedInput {
                        line: self.line_no,
                        message: format!("invalid qualifier line: {:?}", content),
                    })?;
                builder.start_qualifier(name, value);
            }
            FeatureLine::Continuation(content) => {
                if !builder.in_feature() {
                    return Err(EmblError::MalformedInput {
                        line: self.line_no,
                        message: "continuation line before any feature key".to_string(),
                    });
                }
                builder.continuation(content);
            }
        }
        Ok(())
    }

    fn sequence_line(&self, builder: &mut RecordBuilder, line: &str) -> EmblResult<()> {
        builder.push_sequence_line(line).map_err(|symbol| EmblError::MalformedInput {
            line: self.line_no,
            message: format!("invalid symbol {:?} in sequence data", symbol),
        })
    }

    fn finish(&self, builder: RecordBuilder) -> EmblResult<GenomicRecord> {
        builder.finish().ok_or_else(|| EmblError::MalformedInput {
            line: self.line_no,
            message: "record has no ID line".to_string(),
        })
    }
}

impl<B: BufRead> Iterator for Records<B> {
    type Item = EmblResult<GenomicRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parse_record() {
            Ok(Some(record)) => Some(Ok(record)),
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

/// Pulls the declared base-pair count out of an ID line payload, e.g. the
/// `5028 BP.` segment. EMBL revised the ID line over the years, so this
/// scans `;`-separated segments rather than trusting a fixed position.
fn declared_bp(rest: &str) -> Option<u32> {
    for segment in rest.split(';') {
        let segment = segment.trim();
        if let Some(number) = segment
            .strip_suffix("BP.")
            .or_else(|| segment.strip_suffix("BP"))
        {
            return number.trim().parse().ok();
        }
    }
    None
}

/// Parses a whole EMBL file into memory.
pub fn parse_embl_file<P: AsRef<Path>>(path: P) -> EmblResult<Vec<GenomicRecord>> {
    Reader::from_file(path)?.records().collect()
}

/// Parses EMBL content from a reader.
pub fn parse_embl<B: BufRead>(reader: B) -> EmblResult<Vec<GenomicRecord>> {
    Reader::new(reader).records().collect()
}

/// Parses EMBL content from a string.
pub fn parse_embl_str(content: &str) -> EmblResult<Vec<GenomicRecord>> {
    parse_embl(content.as_bytes())
}
