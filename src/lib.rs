//! # gbk2faa - Predicted Proteins from Annotated Genomes
//!
//! Turns annotated GenBank and EMBL flat files into predicted protein
//! FASTA, driven by each record's CDS features.
//!
//! ## Architecture
//!
//! The pipeline is a chain of small modules with clear seams:
//! - `model`: genomic records, features, location spans and FASTA entries
//! - `formats`: GenBank and EMBL parsers with automatic format detection
//! - `location`: the feature-location expression grammar
//! - `extract`: span splicing and reverse complementation
//! - `genetic_code`: NCBI translation tables and CDS translation
//! - `pipeline`: end-to-end file-to-FASTA and counting passes
//! - `metrics`: molecular weight, hydropathy and composition statistics
//!
//! ## Example
//!
//! ```no_run
//! use gbk2faa::pipeline::gbk_to_faa;
//!
//! let proteins = gbk_to_faa("K12.gbk").unwrap();
//! for entry in &proteins {
//!     println!("{}\n", entry);
//! }
//! ```

pub mod extract;
pub mod formats;
pub mod genetic_code;
pub mod location;
pub mod metrics;
pub mod model;
pub mod pipeline;
