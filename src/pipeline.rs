//! CDS extraction and translation pipeline.
//!
//! Drives a record stream end to end: select the CDS features, resolve
//! their locations against the record sequence, splice the nucleotides and
//! translate them into protein. Every entry point comes in two flavors
//! that share all of this work: a FASTA-producing pass, and a counting
//! pass that performs identical validation without materializing output.

use std::path::Path;

use thiserror::Error;

use crate::extract::{extract_spans, ExtractError};
use crate::formats::embl::{self, EmblError};
use crate::formats::genbank::{self, GenbankError};
use crate::genetic_code::{GeneticCodes, TranslationError};
use crate::location::{parse_location, LocationError};
use crate::model::{Feature, GenomicRecord, ProteinRecord};

/// What went wrong while processing a single CDS feature.
#[derive(Error, Debug)]
pub enum CdsError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Translation(#[from] TranslationError),
}

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Genbank(#[from] GenbankError),

    #[error(transparent)]
    Embl(#[from] EmblError),

    #[error("record {record}, feature {index}: {source}")]
    Cds {
        record: String,
        index: usize,
        source: CdsError,
    },
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Options controlling CDS translation.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Stop at the first stop codon and discard it. When false, stop
    /// codons are written through as `*`.
    pub to_stop: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self { to_stop: true }
    }
}

/// Translates one CDS feature against its record's sequence.
///
/// An annotated `/translation` qualifier is authoritative: it is passed
/// through verbatim and nothing is recomputed. Otherwise the feature's
/// location is parsed, the matching nucleotides spliced out, the reading
/// frame adjusted for `/codon_start` and the result translated with the
/// table named by `/transl_table` (table 1 when absent).
///
/// `protein_id` and `locus_tag` both fall back to `"unknown"` when the
/// annotation lacks them.
pub fn translate_cds_feature(
    record: &GenomicRecord,
    feature: &Feature,
    codes: &GeneticCodes,
    options: &TranslateOptions,
) -> Result<ProteinRecord, CdsError> {
    let id = feature.qualifier("protein_id").unwrap_or("unknown").to_string();
    let tag = feature.qualifier("locus_tag").unwrap_or("unknown").to_string();

    if let Some(translation) = feature.qualifier("translation") {
        return Ok(ProteinRecord {
            id,
            tag,
            sequence: translation.to_string(),
        });
    }

    let code = codes.resolve(feature.qualifier("transl_table").unwrap_or("1"))?;
    let spans = parse_location(&feature.location)?;
    let nucleotides = extract_spans(&record.sequence, &spans)?;
    let frame = nucleotides.get(codon_start_offset(feature)..).unwrap_or("");
    let sequence = code.translate_cds(frame, options.to_stop)?;

    Ok(ProteinRecord { id, tag, sequence })
}

/// Extracts one CDS feature's nucleotide sequence without translating it.
///
/// The returned record carries nucleotides in its sequence field; headers
/// are built exactly as for protein output.
pub fn extract_cds_feature(
    record: &GenomicRecord,
    feature: &Feature,
) -> Result<ProteinRecord, CdsError> {
    let id = feature.qualifier("protein_id").unwrap_or("unknown").to_string();
    let tag = feature.qualifier("locus_tag").unwrap_or("unknown").to_string();

    let spans = parse_location(&feature.location)?;
    let sequence = extract_spans(&record.sequence, &spans)?;

    Ok(ProteinRecord { id, tag, sequence })
}

/// Reads `/codon_start` as a frame offset. 1, 2 and 3 map to offsets 0, 1
/// and 2; a missing or unparseable value falls back to frame 1.
fn codon_start_offset(feature: &Feature) -> usize {
    match feature
        .qualifier("codon_start")
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        Some(n @ 1..=3) => n - 1,
        _ => 0,
    }
}

/// Runs the translation pass over a record stream, feeding every protein
/// into `sink`. The first record or CDS error aborts the run.
fn translate_stream<I, E, F>(
    records: I,
    options: &TranslateOptions,
    sink: &mut F,
) -> PipelineResult<()>
where
    I: Iterator<Item = Result<GenomicRecord, E>>,
    PipelineError: From<E>,
    F: FnMut(ProteinRecord),
{
    let codes = GeneticCodes::new();
    for record in records {
        let record = record?;
        for (index, feature) in record.cds_features() {
            let protein = translate_cds_feature(&record, feature, &codes, options).map_err(
                |source| PipelineError::Cds {
                    record: record.id.clone(),
                    index,
                    source,
                },
            )?;
            sink(protein);
        }
    }
    Ok(())
}

/// Runs the extraction-only pass over a record stream.
fn extract_stream<I, E, F>(records: I, sink: &mut F) -> PipelineResult<()>
where
    I: Iterator<Item = Result<GenomicRecord, E>>,
    PipelineError: From<E>,
    F: FnMut(ProteinRecord),
{
    for record in records {
        let record = record?;
        for (index, feature) in record.cds_features() {
            let entry = extract_cds_feature(&record, feature).map_err(|source| {
                PipelineError::Cds {
                    record: record.id.clone(),
                    index,
                    source,
                }
            })?;
            sink(entry);
        }
    }
    Ok(())
}

/// Translates every CDS of a GenBank file into FASTA entries.
///
/// Each entry is a `>{protein_id} {locus_tag}` header line plus the
/// protein sequence, in file order.
///
/// # Examples
///
/// ```no_run
/// let proteins = gbk2faa::pipeline::gbk_to_faa("K12.gbk").unwrap();
/// for entry in &proteins {
///     println!("{}", entry);
/// }
/// ```
pub fn gbk_to_faa<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<String>> {
    gbk_to_faa_with_options(path, &TranslateOptions::default())
}

/// Like [`gbk_to_faa`], with explicit translation options.
pub fn gbk_to_faa_with_options<P: AsRef<Path>>(
    path: P,
    options: &TranslateOptions,
) -> PipelineResult<Vec<String>> {
    let mut entries = Vec::new();
    translate_stream(
        genbank::Reader::from_file(path)?.records(),
        options,
        &mut |protein| entries.push(protein.to_fasta()),
    )?;
    Ok(entries)
}

/// Counts the proteins a GenBank file would produce.
///
/// Runs the same parsing, location resolution and translation as
/// [`gbk_to_faa`], so it fails on exactly the same inputs, but renders no
/// FASTA and holds no entries in memory.
pub fn gbk_to_faa_count<P: AsRef<Path>>(path: P) -> PipelineResult<usize> {
    gbk_to_faa_count_with_options(path, &TranslateOptions::default())
}

/// Like [`gbk_to_faa_count`], with explicit translation options.
pub fn gbk_to_faa_count_with_options<P: AsRef<Path>>(
    path: P,
    options: &TranslateOptions,
) -> PipelineResult<usize> {
    let mut count = 0usize;
    translate_stream(
        genbank::Reader::from_file(path)?.records(),
        options,
        &mut |_| count += 1,
    )?;
    Ok(count)
}

/// Extracts every CDS of a GenBank file as nucleotide FASTA entries,
/// without translating them.
pub fn gbk_to_ffn<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<String>> {
    let mut entries = Vec::new();
    extract_stream(genbank::Reader::from_file(path)?.records(), &mut |entry| {
        entries.push(entry.to_fasta())
    })?;
    Ok(entries)
}

/// Translates every CDS of an EMBL file into FASTA entries.
pub fn embl_to_faa<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<String>> {
    embl_to_faa_with_options(path, &TranslateOptions::default())
}

/// Like [`embl_to_faa`], with explicit translation options.
pub fn embl_to_faa_with_options<P: AsRef<Path>>(
    path: P,
    options: &TranslateOptions,
) -> PipelineResult<Vec<String>> {
    let mut entries = Vec::new();
    translate_stream(
        embl::Reader::from_file(path)?.records(),
        options,
        &mut |protein| entries.push(protein.to_fasta()),
    )?;
    Ok(entries)
}

/// Counts the proteins an EMBL file would produce.
pub fn embl_to_faa_count<P: AsRef<Path>>(path: P) -> PipelineResult<usize> {
    embl_to_faa_count_with_options(path, &TranslateOptions::default())
}

/// Like [`embl_to_faa_count`], with explicit translation options.
pub fn embl_to_faa_count_with_options<P: AsRef<Path>>(
    path: P,
    options: &TranslateOptions,
) -> PipelineResult<usize> {
    let mut count = 0usize;
    translate_stream(
        embl::Reader::from_file(path)?.records(),
        options,
        &mut |_| count += 1,
    )?;
    Ok(count)
}

/// Extracts every CDS of an EMBL file as nucleotide FASTA entries.
pub fn embl_to_ffn<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<String>> {
    let mut entries = Vec::new();
    extract_stream(embl::Reader::from_file(path)?.records(), &mut |entry| {
        entries.push(entry.to_fasta())
    })?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_RECORDS: &str = r#"LOCUS       TESTA                   30 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     source          1..30
                     /organism="Escherichia coli"
     CDS             1..9
                     /protein_id="P1"
                     /locus_tag="t1"
     CDS             complement(13..21)
                     /protein_id="P2"
                     /locus_tag="t2"
ORIGIN
        1 atgaaataac ccctaatcca tgggaaattt
//
LOCUS       TESTB                   15 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..15
                     /protein_id="P3"
                     /locus_tag="t3"
                     /translation="MSTAR"
ORIGIN
        1 atgtctaccg ctcgt
//
"#;

    fn write_gbk(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_gbk_to_faa_end_to_end() {
        let file = write_gbk(TWO_RECORDS);
        let entries = gbk_to_faa(file.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ">P1 t1\nMK");
        // complement(13..21) reads ATGGATTAG off the reverse strand.
        assert_eq!(entries[1], ">P2 t2\nMD");
        // The annotated /translation wins over recomputation.
        assert_eq!(entries[2], ">P3 t3\nMSTAR");
    }

    #[test]
    fn test_count_matches_faa_output() {
        let file = write_gbk(TWO_RECORDS);
        let entries = gbk_to_faa(file.path()).unwrap();
        let count = gbk_to_faa_count(file.path()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(count, entries.len());
    }

    #[test]
    fn test_output_is_deterministic() {
        let file = write_gbk(TWO_RECORDS);
        let first = gbk_to_faa(file.path()).unwrap();
        let second = gbk_to_faa(file.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_keep_stops_option() {
        let file = write_gbk(TWO_RECORDS);
        let options = TranslateOptions { to_stop: false };
        let entries = gbk_to_faa_with_options(file.path(), &options).unwrap();
        assert_eq!(entries[0], ">P1 t1\nMK*");
        assert_eq!(entries[1], ">P2 t2\nMD*");
    }

    #[test]
    fn test_gbk_to_ffn_extracts_nucleotides() {
        let file = write_gbk(TWO_RECORDS);
        let entries = gbk_to_ffn(file.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ">P1 t1\nATGAAATAA");
        assert_eq!(entries[1], ">P2 t2\nATGGATTAG");
    }

    #[test]
    fn test_missing_identifiers_fall_back_to_unknown() {
        let content = r#"LOCUS       TESTC                    9 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..9
ORIGIN
        1 atgaaataa
//
"#;
        let file = write_gbk(content);
        let entries = gbk_to_faa(file.path()).unwrap();
        assert_eq!(entries, vec![">unknown unknown\nMK".to_string()]);
    }

    #[test]
    fn test_codon_start_shifts_the_frame() {
        let content = r#"LOCUS       TESTD                   10 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..10
                     /protein_id="P4"
                     /locus_tag="t4"
                     /codon_start=2
ORIGIN
        1 catgaaataa
//
"#;
        let file = write_gbk(content);
        let entries = gbk_to_faa(file.path()).unwrap();
        assert_eq!(entries, vec![">P4 t4\nMK".to_string()]);
    }

    #[test]
    fn test_invalid_codon_start_falls_back_to_frame_one() {
        let content = r#"LOCUS       TESTE                   10 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..10
                     /protein_id="P5"
                     /locus_tag="t5"
                     /codon_start=9
ORIGIN
        1 catgaaataa
//
"#;
        let file = write_gbk(content);
        let entries = gbk_to_faa(file.path()).unwrap();
        // CAT GAA ATA, trailing A ignored.
        assert_eq!(entries, vec![">P5 t5\nHEI".to_string()]);
    }

    #[test]
    fn test_unknown_translation_table_aborts_both_modes() {
        let content = r#"LOCUS       TESTF                    9 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..9
                     /transl_table=999
ORIGIN
        1 atgaaataa
//
"#;
        let file = write_gbk(content);

        let err = gbk_to_faa(file.path()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cds {
                source: CdsError::Translation(TranslationError::UnknownCodonTable(_)),
                ..
            }
        ));

        // The counting pass validates identically.
        assert!(gbk_to_faa_count(file.path()).is_err());
    }

    #[test]
    fn test_skipping_failed_features_keeps_the_rest() {
        // Per-feature entry points let a caller drop one bad CDS without
        // losing the rest of the record.
        let content = r#"LOCUS       TESTJ                   18 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..9
                     /protein_id="B1"
                     /locus_tag="t1"
                     /transl_table=999
     CDS             10..18
                     /protein_id="G1"
                     /locus_tag="t2"
ORIGIN
        1 atgaaataaa tggattag
//
"#;
        let file = write_gbk(content);
        let reader = genbank::Reader::from_file(file.path()).unwrap();
        let codes = GeneticCodes::new();
        let options = TranslateOptions::default();

        let mut proteins = Vec::new();
        let mut skipped = 0;
        for record in reader.records() {
            let record = record.unwrap();
            for (_, feature) in record.cds_features() {
                match translate_cds_feature(&record, feature, &codes, &options) {
                    Ok(protein) => proteins.push(protein.to_fasta()),
                    Err(CdsError::Translation(TranslationError::UnknownCodonTable(_))) => {
                        skipped += 1;
                    }
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
        }

        assert_eq!(skipped, 1);
        assert_eq!(proteins, vec![">G1 t2\nMD".to_string()]);
    }

    #[test]
    fn test_malformed_location_carries_record_context() {
        let content = r#"LOCUS       TESTG                    9 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             order(1..9)
ORIGIN
        1 atgaaataa
//
"#;
        let file = write_gbk(content);
        let err = gbk_to_faa(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TESTG"));
        assert!(matches!(
            err,
            PipelineError::Cds {
                source: CdsError::Location(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cds_beyond_sequence_end() {
        let content = r#"LOCUS       TESTH                    9 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..300
ORIGIN
        1 atgaaataa
//
"#;
        let file = write_gbk(content);
        let err = gbk_to_faa(file.path()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cds {
                source: CdsError::Extract(ExtractError::OutOfRange { .. }),
                ..
            }
        ));
    }

    #[test]
    fn test_non_ascii_sequence_surfaces_as_parse_error() {
        let content = r#"LOCUS       TESTK                    5 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             1..4
                     /protein_id="P7"
ORIGIN
        1 atgça
//
"#;
        let file = write_gbk(content);
        let err = gbk_to_faa(file.path()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Genbank(GenbankError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_partial_cds_translates_numerically() {
        let content = r#"LOCUS       TESTI                    9 bp    DNA     linear   BCT 01-JAN-2024
FEATURES             Location/Qualifiers
     CDS             <1..>9
                     /protein_id="P6"
                     /locus_tag="t6"
ORIGIN
        1 atgaaataa
//
"#;
        let file = write_gbk(content);
        let entries = gbk_to_faa(file.path()).unwrap();
        assert_eq!(entries, vec![">P6 t6\nMK".to_string()]);
    }

    #[test]
    fn test_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.gbk");
        let err = gbk_to_faa(&missing).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Genbank(GenbankError::FileNotFound(_))
        ));
        let err = embl_to_faa(&missing).unwrap_err();
        assert!(matches!(err, PipelineError::Embl(EmblError::FileNotFound(_))));
    }

    #[test]
    fn test_embl_to_faa_matches_genbank_semantics() {
        let content = r#"ID   TESTA; SV 1; linear; genomic DNA; STD; BCT; 9 BP.
FT   CDS             1..9
FT                   /protein_id="P1"
FT                   /locus_tag="t1"
SQ   Sequence 9 BP;
     atgaaataa                                                                9
//
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let entries = embl_to_faa(file.path()).unwrap();
        assert_eq!(entries, vec![">P1 t1\nMK".to_string()]);
        assert_eq!(embl_to_faa_count(file.path()).unwrap(), 1);
        assert_eq!(embl_to_ffn(file.path()).unwrap(), vec![">P1 t1\nATGAAATAA".to_string()]);
    }

    #[test]
    fn test_translation_qualifier_skips_table_resolution() {
        let mut record = GenomicRecord {
            id: "X".to_string(),
            declared_length: None,
            sequence: "ATGAAATAA".to_string(),
            features: Vec::new(),
            warning: None,
        };
        let mut feature = Feature::new("CDS", "1..9");
        feature.add_qualifier("translation", "MK".to_string());
        feature.add_qualifier("transl_table", "999".to_string());
        record.features.push(feature);

        let codes = GeneticCodes::new();
        let protein = translate_cds_feature(
            &record,
            &record.features[0],
            &codes,
            &TranslateOptions::default(),
        )
        .unwrap();
        assert_eq!(protein.sequence, "MK");
    }

    #[test]
    fn test_codon_start_offset_parsing() {
        let mut feature = Feature::new("CDS", "1..9");
        assert_eq!(codon_start_offset(&feature), 0);
        feature.add_qualifier("codon_start", "3".to_string());
        assert_eq!(codon_start_offset(&feature), 2);

        let mut bad = Feature::new("CDS", "1..9");
        bad.add_qualifier("codon_start", "zero".to_string());
        assert_eq!(codon_start_offset(&bad), 0);
    }
}
