//! gbk2faa - Predicted proteins from annotated genomes
//!
//! Extracts every CDS feature from GenBank or EMBL flat files and writes
//! the predicted proteins as FASTA.
//!
//! ## Usage
//!
//! ```bash
//! gbk2faa K12.gbk                  # protein FASTA to stdout
//! gbk2faa -o K12.faa K12.gbk       # protein FASTA to a file
//! gbk2faa -c K12.gbk               # print the protein count only
//! gbk2faa --ffn K12.gbk            # untranslated nucleotide CDS
//! gbk2faa -f embl U49845.dat       # force the EMBL parser
//! ```
//!
//! ## Supported Formats
//!
//! - GenBank (.gb, .gbk, .gbff, .genbank)
//! - EMBL (.embl, .dat)

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use gbk2faa::formats::{detect_format, embl, genbank, FileFormat};
use gbk2faa::genetic_code::GeneticCodes;
use gbk2faa::model::GenomicRecord;
use gbk2faa::pipeline::{extract_cds_feature, translate_cds_feature, TranslateOptions};

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// GenBank flat file
    Genbank,
    /// EMBL flat file
    Embl,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Genbank => Some(FileFormat::Genbank),
            FormatArg::Embl => Some(FileFormat::Embl),
            FormatArg::Auto => None,
        }
    }
}

/// gbk2faa - Predicted protein FASTA from annotated genomes
///
/// Reads a GenBank or EMBL flat file, extracts every CDS feature and
/// writes the predicted proteins as FASTA, one entry per CDS. With -c,
/// performs the same work and prints only the number of proteins.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Annotated genome file (GenBank or EMBL format)
    file: PathBuf,

    /// Force a specific file format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Print the number of proteins instead of FASTA
    #[arg(short = 'c', long = "count")]
    count: bool,

    /// Emit untranslated nucleotide CDS sequences instead of proteins
    #[arg(long = "ffn")]
    ffn: bool,

    /// Write stop codons through as '*' instead of ending at the first stop
    #[arg(long = "keep-stops")]
    keep_stops: bool,

    /// Skip CDS features that fail instead of aborting
    #[arg(long = "skip-bad")]
    skip_bad: bool,
}

/// What one run produced.
struct Outcome {
    entries: Vec<String>,
    produced: usize,
    skipped: usize,
}

/// Walks a record stream, translating or extracting every CDS.
fn process<I, E>(records: I, args: &Args) -> Result<Outcome>
where
    I: Iterator<Item = Result<GenomicRecord, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let codes = GeneticCodes::new();
    let options = TranslateOptions {
        to_stop: !args.keep_stops,
    };
    let mut outcome = Outcome {
        entries: Vec::new(),
        produced: 0,
        skipped: 0,
    };

    for record in records {
        let record = record?;
        if let Some(warning) = &record.warning {
            eprintln!("warning: {}", warning);
        }
        for (index, feature) in record.cds_features() {
            let result = if args.ffn {
                extract_cds_feature(&record, feature)
            } else {
                translate_cds_feature(&record, feature, &codes, &options)
            };
            match result {
                Ok(entry) => {
                    outcome.produced += 1;
                    if !args.count {
                        outcome.entries.push(entry.to_fasta());
                    }
                }
                Err(e) if args.skip_bad => {
                    outcome.skipped += 1;
                    eprintln!(
                        "warning: record {}, feature {}: {} (skipped)",
                        record.id, index, e
                    );
                }
                Err(e) => anyhow::bail!("record {}, feature {}: {}", record.id, index, e),
            }
        }
    }

    Ok(outcome)
}

/// Writes FASTA entries separated by one blank line, with no blank line
/// after the last entry.
fn write_entries<W: Write>(writer: &mut W, entries: &[String]) -> io::Result<()> {
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", entry)?;
    }
    Ok(())
}

/// Writes the run's output to stdout or a file.
fn write_output(args: &Args, outcome: &Outcome) -> Result<()> {
    if args.count {
        if args.output == "-" {
            println!("{}", outcome.produced);
        } else {
            let mut file = std::fs::File::create(&args.output)?;
            writeln!(file, "{}", outcome.produced)?;
        }
    } else if args.output == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_entries(&mut handle, &outcome.entries)?;
    } else {
        let mut file = std::fs::File::create(&args.output)?;
        write_entries(&mut file, &outcome.entries)?;
        eprintln!("Wrote {} entries to {}", outcome.entries.len(), args.output);
    }

    if outcome.skipped > 0 {
        eprintln!("{} CDS feature(s) skipped", outcome.skipped);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.count && args.ffn {
        anyhow::bail!("--count cannot be combined with --ffn");
    }

    let forced: Option<FileFormat> = args.format.into();
    let format = match forced {
        Some(format) => format,
        None => detect_format(&args.file)?,
    };

    let outcome = match format {
        FileFormat::Genbank => process(genbank::Reader::from_file(&args.file)?.records(), &args)?,
        FileFormat::Embl => process(embl::Reader::from_file(&args.file)?.records(), &args)?,
    };

    write_output(&args, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_blank_line_separated() {
        let entries = vec![">P1 t1\nMK".to_string(), ">P2 t2\nMD".to_string()];
        let mut out = Vec::new();
        write_entries(&mut out, &entries).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">P1 t1\nMK\n\n>P2 t2\nMD\n");
    }

    #[test]
    fn test_last_entry_has_no_trailing_blank_line() {
        let mut out = Vec::new();
        write_entries(&mut out, &[">P1 t1\nMK".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">P1 t1\nMK\n");

        let mut empty = Vec::new();
        write_entries(&mut empty, &[]).unwrap();
        assert!(empty.is_empty());
    }
}
