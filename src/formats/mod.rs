//! Flat-file genome record parsing.
//!
//! Supports automatic format detection for:
//! - GenBank (.gb, .gbk, .gbff, .genbank)
//! - EMBL (.embl, .dat)
//!
//! Format detection priority:
//! 1. Explicit format specification (-f option)
//! 2. File extension
//! 3. Content-based detection (LOCUS vs ID header line)

pub mod embl;
pub mod genbank;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Feature, GenomicRecord};

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Genbank,
    Embl,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Genbank => write!(f, "GenBank"),
            FileFormat::Embl => write!(f, "EMBL"),
        }
    }
}

/// Errors that can occur while detecting and parsing record files.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("empty file")]
    EmptyFile,

    #[error("could not determine file format.\n\
             Hint: Use -f/--format to specify the format explicitly:\n  \
             gbk2faa -f genbank <file>   # GenBank flat file\n  \
             gbk2faa -f embl <file>      # EMBL flat file")]
    UnknownFormat,

    #[error("GenBank error: {0}")]
    GenbankError(#[from] genbank::GenbankError),

    #[error("EMBL error: {0}")]
    EmblError(#[from] embl::EmblError),
}

/// Result type for format detection and dispatch.
pub type ParseResult<T> = Result<T, ParseError>;

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "gb" | "gbk" | "gbff" | "genbank" => Some(FileFormat::Genbank),
        "embl" | "dat" => Some(FileFormat::Embl),
        _ => None,
    }
}

/// Detects the file format by examining the content.
///
/// Only the first non-empty line matters: GenBank records open with a
/// `LOCUS` line, EMBL records with an `ID` line.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("LOCUS ") {
            return Some(FileFormat::Genbank);
        }

        if trimmed.starts_with("ID ") {
            return Some(FileFormat::Embl);
        }

        // First non-empty line doesn't match any known format
        return None;
    }

    None
}

/// Reads the first non-blank line of a file for content-based detection.
fn first_significant_line<P: AsRef<Path>>(path: P) -> ParseResult<Option<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ParseError::FileNotFound(path.to_path_buf()),
        _ => ParseError::IoError(e),
    })?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

/// Detects the format of a file, by extension first, then by content.
pub fn detect_format<P: AsRef<Path>>(path: P) -> ParseResult<FileFormat> {
    if let Some(format) = detect_format_from_extension(&path) {
        return Ok(format);
    }
    match first_significant_line(&path)? {
        Some(line) => detect_format_from_content(&line).ok_or(ParseError::UnknownFormat),
        None => Err(ParseError::EmptyFile),
    }
}

fn parse_with<P: AsRef<Path>>(path: P, format: FileFormat) -> ParseResult<Vec<GenomicRecord>> {
    match format {
        FileFormat::Genbank => Ok(genbank::parse_genbank_file(path)?),
        FileFormat::Embl => Ok(embl::parse_embl_file(path)?),
    }
}

/// Parses a record file with optional format specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension
/// 3. Content-based detection
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<FileFormat>,
) -> ParseResult<Vec<GenomicRecord>> {
    let format = match forced_format {
        Some(format) => format,
        None => detect_format(&path)?,
    };
    parse_with(path, format)
}

/// Parses a record file, automatically detecting the format.
/// Convenience wrapper around parse_file_with_options.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Vec<GenomicRecord>> {
    parse_file_with_options(path, None)
}

/// Parses a record file with explicit format specification.
///
/// Use this when you know the format in advance or want to force a specific parser.
pub fn parse_file_as<P: AsRef<Path>>(path: P, format: FileFormat) -> ParseResult<Vec<GenomicRecord>> {
    parse_file_with_options(path, Some(format))
}

// ---------------------------------------------------------------------------
// Shared feature-table assembly
// ---------------------------------------------------------------------------
//
// GenBank and EMBL share the location/qualifier grammar; only line prefixes
// and header sections differ. Both parsers drive the builders below.

/// Splits `/name=value` (or flag-style `/name`) qualifier content.
///
/// Returns `None` for content without a `/` or with an empty name.
pub(crate) fn split_qualifier(content: &str) -> Option<(&str, &str)> {
    let body = content.strip_prefix('/')?;
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name, value),
        None => (body, ""),
    };
    if name.is_empty() {
        None
    } else {
        Some((name, value))
    }
}

/// Strips one pair of surrounding double quotes from an accumulated value.
fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

struct FeatureBuilder {
    feature: Feature,
    /// Qualifier currently being accumulated; continuations append here.
    /// `None` until the first qualifier arrives, while the location may
    /// still wrap onto further lines.
    pending: Option<(String, String)>,
}

impl FeatureBuilder {
    fn new(key: &str, location: &str) -> Self {
        Self {
            feature: Feature::new(key, location),
            pending: None,
        }
    }

    fn start_qualifier(&mut self, name: &str, value: &str) {
        self.close_pending();
        self.pending = Some((name.to_string(), value.to_string()));
    }

    fn continuation(&mut self, content: &str) {
        match &mut self.pending {
            Some((name, value)) => {
                // Wrapped free text rejoins with a space; wrapped sequence
                // data like /translation must rejoin seamlessly.
                if name != "translation" && !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(content);
            }
            None => self.feature.location.push_str(content),
        }
    }

    fn close_pending(&mut self) {
        if let Some((name, value)) = self.pending.take() {
            self.feature.add_qualifier(&name, strip_quotes(&value).to_string());
        }
    }

    fn finish(mut self) -> Feature {
        self.close_pending();
        self.feature
    }
}

/// Accumulates one record while a parser walks its lines.
pub(crate) struct RecordBuilder {
    id: Option<String>,
    declared_length: Option<u32>,
    sequence: String,
    features: Vec<Feature>,
    current: Option<FeatureBuilder>,
}

impl RecordBuilder {
    pub(crate) fn new() -> Self {
        Self {
            id: None,
            declared_length: None,
            sequence: String::new(),
            features: Vec::new(),
            current: None,
        }
    }

    pub(crate) fn set_identity(&mut self, id: &str, declared_length: Option<u32>) {
        self.id = Some(id.to_string());
        self.declared_length = declared_length;
    }

    pub(crate) fn seen_content(&self) -> bool {
        self.id.is_some()
            || self.current.is_some()
            || !self.features.is_empty()
            || !self.sequence.is_empty()
    }

    pub(crate) fn in_feature(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn start_feature(&mut self, key: &str, location: &str) {
        self.finish_feature();
        self.current = Some(FeatureBuilder::new(key, location));
    }

    pub(crate) fn start_qualifier(&mut self, name: &str, value: &str) {
        if let Some(builder) = &mut self.current {
            builder.start_qualifier(name, value);
        }
    }

    pub(crate) fn continuation(&mut self, content: &str) {
        if let Some(builder) = &mut self.current {
            builder.continuation(content);
        }
    }

    pub(crate) fn finish_feature(&mut self) {
        if let Some(builder) = self.current.take() {
            self.features.push(builder.finish());
        }
    }

    /// Appends one sequence line, skipping position numbers and normalizing
    /// to uppercase. The first symbol that is not an ASCII letter comes back
    /// as the error so the parser can name it in its own diagnostic.
    pub(crate) fn push_sequence_line(&mut self, line: &str) -> Result<(), char> {
        for token in line.split_whitespace() {
            if token.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            for c in token.chars() {
                if !c.is_ascii_alphabetic() {
                    return Err(c);
                }
                self.sequence.push(c.to_ascii_uppercase());
            }
        }
        Ok(())
    }

    pub(crate) fn id_for_error(&self) -> String {
        self.id.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Completes the record. `None` when no identifier was ever seen.
    pub(crate) fn finish(mut self) -> Option<GenomicRecord> {
        self.finish_feature();
        let id = self.id?;
        let warning = match self.declared_length {
            Some(declared) if declared as usize != self.sequence.len() => Some(format!(
                "record {}: header declares {} bp but sequence has {} bp",
                id,
                declared,
                self.sequence.len()
            )),
            _ => None,
        };
        Some(GenomicRecord {
            id,
            declared_length: self.declared_length,
            sequence: self.sequence,
            features: self.features,
            warning,
        })
    }
}
