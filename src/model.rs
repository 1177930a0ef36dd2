//! Data model for genomic flat-file records.
//!
//! This module contains the structures shared by every parser and by the
//! translation pipeline:
//! - `GenomicRecord`: one `//`-terminated flat-file entry
//! - `Feature`: an annotated feature with its qualifiers
//! - `LocationSpan`: a resolved (start, end, strand) stretch of the parent
//! - `ProteinRecord`: a translated CDS ready for FASTA rendering
//!
//! Records are built once by a parser and never mutated afterwards; a
//! `ProteinRecord` is produced per CDS and handed straight to the emitter.

/// Strand of a location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Returns the opposite strand.
    pub fn flipped(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    /// Returns the conventional one-character symbol (`+` or `-`).
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// One contiguous stretch of the parent sequence, in 1-based inclusive
/// coordinates as written in the flat file.
///
/// A feature location resolves to an ordered list of spans: one for a simple
/// range, several for a `join`. Each span carries its own strand because
/// mixed-strand joins are legal in the location grammar. The partial flags
/// record `<`/`>` markers; the numeric bounds are still the ones used for
/// extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationSpan {
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    /// A `<` marker: the true start lies before `start`.
    pub start_partial: bool,
    /// A `>` marker: the true end lies beyond `end`.
    pub end_partial: bool,
}

impl LocationSpan {
    /// Creates a complete (non-partial) span.
    pub fn new(start: u32, end: u32, strand: Strand) -> Self {
        Self {
            start,
            end,
            strand,
            start_partial: false,
            end_partial: false,
        }
    }

    /// Number of bases covered by the span.
    pub fn length(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// An annotated feature: key, raw location expression, qualifiers.
///
/// Qualifiers are an ordered key-to-values mapping. Repeated qualifiers
/// (`/db_xref` is the usual case) accumulate under one key; the first value
/// is the one conventionally used for attributes like `protein_id`,
/// `locus_tag`, `transl_table` and `translation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature key (`source`, `gene`, `CDS`, ...).
    pub key: String,
    /// Raw location expression, e.g. `complement(join(12..78,134..202))`.
    pub location: String,
    qualifiers: Vec<(String, Vec<String>)>,
}

impl Feature {
    /// Creates a feature with no qualifiers yet.
    pub fn new(key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            location: location.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Appends a qualifier value, grouping repeated names under one entry.
    pub fn add_qualifier(&mut self, name: &str, value: String) {
        if let Some((_, values)) = self.qualifiers.iter_mut().find(|(n, _)| n == name) {
            values.push(value);
        } else {
            self.qualifiers.push((name.to_string(), vec![value]));
        }
    }

    /// First value of a qualifier, if present.
    pub fn qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// All values of a qualifier, in file order (empty when absent).
    pub fn qualifier_values(&self, name: &str) -> &[String] {
        self.qualifiers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if the qualifier is present, even valueless.
    pub fn has_qualifier(&self, name: &str) -> bool {
        self.qualifiers.iter().any(|(n, _)| n == name)
    }

    /// Iterates over (name, values) pairs in file order.
    pub fn qualifiers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.qualifiers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Returns true for coding-sequence features.
    pub fn is_cds(&self) -> bool {
        self.key == "CDS"
    }
}

/// One complete flat-file record: identifier, nucleotide sequence and the
/// ordered feature table.
///
/// The sequence is upper-case normalized at parse time. `declared_length`
/// keeps the header's base count; when it disagrees with the observed
/// sequence, the parser sets `warning` and the observed sequence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRecord {
    /// Record identifier (LOCUS name or EMBL ID).
    pub id: String,
    /// Base count declared in the header, when one was given.
    pub declared_length: Option<u32>,
    /// Full nucleotide sequence, upper case.
    pub sequence: String,
    /// Features in file order.
    pub features: Vec<Feature>,
    /// Set when the declared and observed lengths disagree.
    pub warning: Option<String>,
}

impl GenomicRecord {
    /// Observed sequence length in bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns true if the record carries no sequence.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// CDS features with their position in the feature table.
    pub fn cds_features(&self) -> impl Iterator<Item = (usize, &Feature)> {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_cds())
    }
}

/// A translated coding sequence, ready for FASTA rendering.
///
/// `id` is the feature's `protein_id` and `tag` its `locus_tag`, both
/// falling back to `"unknown"` when the qualifier is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub id: String,
    pub tag: String,
    pub sequence: String,
}

impl ProteinRecord {
    /// Renders the record as a two-line FASTA entry (no trailing newline).
    pub fn to_fasta(&self) -> String {
        format!(">{} {}\n{}", self.id, self.tag, self.sequence)
    }
}
