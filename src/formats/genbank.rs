//! GenBank flat-file parser.
//!
//! Parses `//`-terminated GenBank records into [`GenomicRecord`]s, lazily,
//! one record at a time.
//!
//! ## GenBank format
//!
//! ```text
//! LOCUS       U49845     5028 bp    DNA             PLN       21-JUN-1999
//! DEFINITION  Saccharomyces cerevisiae TCP1-beta gene, partial cds.
//! FEATURES             Location/Qualifiers
//!      source          1..5028
//!                      /organism="Saccharomyces cerevisiae"
//!      CDS             <1..206
//!                      /codon_start=3
//!                      /protein_id="AAA98665.1"
//! ORIGIN
//!         1 gatcctccat atacaacggt atctccacct caggtttaga tctcaacaac ggaaccattg
//! //
//! ```
//!
//! The feature table is column based: a feature key starts at column 6 with
//! its location from column 22; qualifier and continuation lines are
//! indented to column 22, the former starting with `/`. A continuation that
//! arrives before the first qualifier extends a wrapped location expression.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{split_qualifier, RecordBuilder};
use crate::model::GenomicRecord;

/// Errors that can occur during GenBank parsing.
#[derive(Error, Debug)]
pub enum GenbankError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed GenBank input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("record {0:?} is missing its // terminator")]
    MissingTerminator(String),
}

/// Result type for GenBank operations.
pub type GenbankResult<T> = Result<T, GenbankError>;

/// Qualifier and continuation lines are indented to column 22.
const QUALIFIER_INDENT: &str = "                     ";

/// The sections a record walks through, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Features,
    Origin,
}

/// A classified feature-table line.
#[derive(Debug, PartialEq, Eq)]
enum FeatureLine<'a> {
    /// New feature: key plus the first location fragment.
    Key { key: &'a str, location: &'a str },
    /// `/name=value` or `/name`, already stripped of its indent.
    Qualifier(&'a str),
    /// Continuation of the previous qualifier value or of the location.
    Continuation(&'a str),
}

/// Classifies one line inside the feature table, enforcing the column rules.
fn classify_feature_line(line: &str, line_no: usize) -> GenbankResult<FeatureLine<'_>> {
    if let Some(content) = line.strip_prefix(QUALIFIER_INDENT) {
        let content = content.trim();
        if content.starts_with('/') {
            return Ok(FeatureLine::Qualifier(content));
        }
        return Ok(FeatureLine::Continuation(content));
    }

    let bytes = line.as_bytes();
    if line.starts_with("     ") && bytes.len() > 5 && bytes[5] != b' ' {
        let rest = &line[5..];
        let (key, location) = match rest.split_once(|c: char| c.is_whitespace()) {
            Some((key, location)) => (key, location.trim()),
            None => (rest, ""),
        };
        return Ok(FeatureLine::Key { key, location });
    }

    Err(GenbankError::MalformedInput {
        line: line_no,
        message: format!("unexpected indentation in feature table: {:?}", line),
    })
}

/// Streaming reader over a GenBank source.
///
/// # Examples
///
/// ```no_run
/// use gbk2faa::formats::genbank::Reader;
///
/// let reader = Reader::from_file("K12.gbk").unwrap();
/// for record in reader.records() {
///     let record = record.unwrap();
///     println!("{}: {} bp, {} features", record.id, record.len(), record.features.len());
/// }
/// ```
#[derive(Debug)]
pub struct Reader<B> {
    reader: B,
}

impl Reader<BufReader<File>> {
    /// Opens a GenBank file. A missing path fails with `FileNotFound`
    /// before any parsing happens.
    pub fn from_file<P: AsRef<Path>>(path: P) -> GenbankResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GenbankError::FileNotFound(path.to_path_buf()),
            _ => GenbankError::Io(e),
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

/// Lazy iterator over the records of a GenBank source.
///
/// Yields one `GenomicRecord` per `//`-terminated block; parsing stops at
/// the first error.
pub struct Records<B: BufRead> {
    lines: Lines<B>,
    line_no: usize,
    done: bool,
}

impl<B: BufRead> Records<B> {
    fn parse_record(&mut self) -> GenbankResult<Option<GenomicRecord>> {
        let mut builder = RecordBuilder::new();
        let mut section = Section::Header;

        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = line?;
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            match section {
                Section::Header => {
                    if line.starts_with("LOCUS ") {
                        self.set_locus(&mut builder, line)?;
                    } else if line.starts_with("FEATURES") {
                        section = Section::Features;
                    } else if line.starts_with("ORIGIN") {
                        section = Section::Origin;
                    } else if line.starts_with("//") {
                        if builder.seen_content() {
                            return self.finish(builder).map(Some);
                        }
                        // A stray terminator before any content: keep scanning.
                    }
                    // All other header sections are irrelevant here.
                }
                Section::Features => {
                    if line.starts_with("//") {
                        return self.finish(builder).map(Some);
                    } else if line.starts_with("ORIGIN") {
                        builder.finish_feature();
                        section = Section::Origin;
                    } else if !line.starts_with(' ') {
                        // BASE COUNT, CONTIG and friends end the feature table.
                        builder.finish_feature();
                        section = Section::Header;
                    } else {
                        self.feature_line(&mut builder, line)?;
                    }
                }
                Section::Origin => {
                    if line.starts_with("//") {
                        return self.finish(builder).map(Some);
                    }
                    self.sequence_line(&mut builder, line)?;
                }
            }
        }

        if builder.seen_content() {
            Err(GenbankError::MissingTerminator(builder.id_for_error()))
        } else {
            Ok(None)
        }
    }

    fn set_locus(&self, builder: &mut RecordBuilder, line: &str) -> GenbankResult<()> {
        let mut parts = line.split_whitespace();
        parts.next(); // the LOCUS keyword
        let id = parts.next().ok_or_else(|| GenbankError::MalformedInput {
            line: self.line_no,
            message: "LOCUS line is missing the record identifier".to_string(),
        })?;
        let declared_length = parts.next().and_then(|len| len.parse().ok());
        builder.set_identity(id, declared_length);
        Ok(())
    }

    fn feature_line(&self, builder: &mut RecordBuilder, line: &str) -> GenbankResult<()> {
        match classify_feature_line(line, self.line_no)? {
            FeatureLine::Key { key, location } => builder.start_feature(key, location),
            FeatureLine::Qualifier(content) => {
                if !builder.in_feature() {
                    return Err(GenbankError::MalformedInput {
                        line: self.line_no,
                        message: format!("qualifier {:?} before any feature key", content),
                    });
                }
                let (name, value) = split_qualifier(content).ok_or_else(|| {
                    GenbankError::MalformedInput {
                        line: self.line_no,
                        message: format!("invalid qualifier line: {:?}", content),
                    }
                })?;
                builder.start_qualifier(name, value);
            }
            FeatureLine::Continuation(content) => {
                if !builder.in_feature() {
                    return Err(GenbankError::MalformedInput {
                        line: self.line_no,
                        message: "continuation line before any feature key".to_string(),
                    });
                }
                builder.continuation(content);
            }
        }
        Ok(())
    }

    fn sequence_line(&self, builder: &mut RecordBuilder, line: &str) -> GenbankResult<()> {
        builder.push_sequence_line(line).map_err(|symbol| GenbankError::MalformedInput {
            line: self.line_no,
            message: format!("invalid symbol {:?} in sequence data", symbol),
        })
    }

    fn finish(&self, builder: RecordBuilder) -> GenbankResult<GenomicRecord> {
        builder.finish().ok_or_else(|| GenbankError::MalformedInput {
            line: self.line_no,
            message: "record has no LOCUS line".to_string(),
        })
    }
}

impl<B: BufRead> Iterator for Records<B> {
    type Item = GenbankResult<GenomicRecord>;

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

/// Parses a whole GenBank file into memory.
///
/// # Arguments
///
/// * `path` - Path to the GenBank file
///
/// # Returns
///
/// All records of the file, in file order.
pub fn parse_genbank_file<P: AsRef<Path>>(path: P) -> GenbankResult<Vec<GenomicRecord>> {
    Reader::from_file(path)?.records().collect()
}

/// Parses GenBank content from a reader.
pub fn parse_genbank<B: BufRead>(reader: B) -> GenbankResult<Vec<GenomicRecord>> {
    Reader::new(reader).records().collect()
}

/// Parses GenBank content from a string.
///
/// Useful for testing or processing in-memory data.
pub fn parse_genbank_str(content: &str) -> GenbankResult<Vec<GenomicRecord>> {
    parse_genbank(content.as_bytes())
}
