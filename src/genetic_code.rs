//! Genetic code tables and CDS translation.
//!
//! This module provides:
//! - The NCBI genetic code tables (1-6, 9-16, 21-33)
//! - Codon-by-codon translation of a coding sequence, with the standard
//!   `to_stop` behavior (halt at the first stop codon and discard it)
//!
//! Only A, C, G, T (and U, read as T) are translatable; a codon containing N
//! translates to the wildcard `X`, and any other symbol is an error.

use std::collections::HashMap;

use thiserror::Error;

/// Errors that can occur while selecting a table or translating a CDS.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("unknown or unsupported translation table: {0:?}")]
    UnknownCodonTable(String),

    #[error("invalid codon {codon:?} at codon index {index}")]
    InvalidCodon { codon: String, index: usize },
}

/// Result type for translation operations.
pub type TranslationResult<T> = Result<T, TranslationError>;

/// NCBI code id, name and the 64-character `ncbieaa` amino-acid string
/// (codons enumerated TTT, TTC, TTA, TTG, TCT, ... in T, C, A, G order).
const NCBI_CODES: &[(u8, &str, &str)] = &[
    (
        1,
        "Standard",
        "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        2,
        "Vertebrate Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG",
    ),
    (
        3,
        "Yeast Mitochondrial",
        "FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        4,
        "Mold/Protozoan/Coelenterate Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        5,
        "Invertebrate Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG",
    ),
    (
        6,
        "Ciliate/Dasycladacean/Hexamita Nuclear",
        "FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        9,
        "Echinoderm/Flatworm Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
    ),
    (
        10,
        "Euplotid Nuclear",
        "FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        11,
        "Bacterial/Archaeal/Plant Plastid",
        "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        12,
        "Alternative Yeast Nuclear",
        "FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        13,
        "Ascidian Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG",
    ),
    (
        14,
        "Alternative Flatworm Mitochondrial",
        "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
    ),
    (
        15,
        "Blepharisma Macronuclear",
        "FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        16,
        "Chlorophycean Mitochondrial",
        "FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        21,
        "Trematode Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG",
    ),
    (
        22,
        "Scenedesmus obliquus Mitochondrial",
        "FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        23,
        "Thraustochytrium Mitochondrial",
        "FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        24,
        "Rhabdopleuridae Mitochondrial",
        "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG",
    ),
    (
        25,
        "Candidate Division SR1/Gracilibacteria",
        "FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        26,
        "Pachysolen tannophilus Nuclear",
        "FFLLSSSSYY**CC*WLLLAPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        27,
        "Karyorelict Nuclear",
        "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        28,
        "Condylostoma Nuclear",
        "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        29,
        "Mesodinium Nuclear",
        "FFLLSSSSYYYYCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        30,
        "Peritrich Nuclear",
        "FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        31,
        "Blastocrithidia Nuclear",
        "FFLLSSSSYYEECCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        32,
        "Balanophoraceae Plastid",
        "FFLLSSSSYY*WCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    ),
    (
        33,
        "Cephalodiscidae Mitochondrial",
        "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG",
    ),
];

/// A genetic code table for translating codons to amino acids.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    /// Name of the genetic code
    pub name: String,
    /// Codon to amino acid mapping (64 entries)
    codon_table: HashMap<String, char>,
}

impl GeneticCode {
    /// Builds a code from its NCBI `ncbieaa` string.
    fn new(id: u8, name: &str, ncbieaa: &str) -> Self {
        let bases = ['T', 'C', 'A', 'G'];
        let mut codon_table = HashMap::new();

        let mut aas = ncbieaa.chars();
        for &b1 in &bases {
            for &b2 in &bases {
                for &b3 in &bases {
                    let codon = format!("{}{}{}", b1, b2, b3);
                    codon_table.insert(codon, aas.next().unwrap_or('X'));
                }
            }
        }

        Self {
            id,
            name: name.to_string(),
            codon_table,
        }
    }

    /// Translates a single codon.
    ///
    /// Returns `Some('*')` for a stop codon, `Some('X')` when the codon
    /// contains an N wildcard, and `None` when it contains any symbol
    /// outside {A, C, G, T, U, N} (including a wrong length).
    pub fn translate_codon(&self, codon: &str) -> Option<char> {
        if codon.len() != 3 {
            return None;
        }

        // Accept lower case and RNA input.
        let codon_dna: String = codon
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .map(|c| if c == 'U' { 'T' } else { c })
            .collect();

        if codon_dna.chars().all(|c| matches!(c, 'A' | 'C' | 'G' | 'T')) {
            return Some(self.codon_table.get(&codon_dna).copied().unwrap_or('X'));
        }

        if codon_dna
            .chars()
            .all(|c| matches!(c, 'A' | 'C' | 'G' | 'T' | 'N'))
        {
            return Some('X');
        }

        None
    }

    /// Translates a coding sequence codon by codon from position 0.
    ///
    /// With `to_stop` the translation halts at the first stop codon and the
    /// stop symbol is discarded (the usual behavior for predicted proteins);
    /// otherwise every stop codon is emitted as `*` and translation runs to
    /// the end. A trailing 1-2 bases that do not fill a codon are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use gbk2faa::genetic_code::GeneticCodes;
    ///
    /// let codes = GeneticCodes::new();
    /// let standard = codes.default_code();
    /// assert_eq!(standard.translate_cds("ATGAAATAA", true).unwrap(), "MK");
    /// assert_eq!(standard.translate_cds("ATGAAATAA", false).unwrap(), "MK*");
    /// ```
    pub fn translate_cds(&self, sequence: &str, to_stop: bool) -> TranslationResult<String> {
        let bytes = sequence.as_bytes();
        let mut protein = String::with_capacity(bytes.len() / 3);

        for (index, chunk) in bytes.chunks_exact(3).enumerate() {
            let codon = match std::str::from_utf8(chunk) {
                Ok(codon) => codon,
                Err(_) => {
                    return Err(TranslationError::InvalidCodon {
                        codon: String::from_utf8_lossy(chunk).into_owned(),
                        index,
                    })
                }
            };
            match self.translate_codon(codon) {
                Some('*') => {
                    if to_stop {
                        break;
                    }
                    protein.push('*');
                }
                Some(aa) => protein.push(aa),
                None => {
                    return Err(TranslationError::InvalidCodon {
                        codon: codon.to_string(),
                        index,
                    })
                }
            }
        }

        Ok(protein)
    }
}

/// All available genetic codes from NCBI.
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    /// Creates the complete set of NCBI genetic codes.
    pub fn new() -> Self {
        let codes = NCBI_CODES
            .iter()
            .map(|&(id, name, ncbieaa)| GeneticCode::new(id, name, ncbieaa))
            .collect();
        Self { codes }
    }

    /// Returns all genetic codes.
    pub fn all(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Gets a genetic code by ID.
    pub fn get(&self, id: u8) -> Option<&GeneticCode> {
        self.codes.iter().find(|c| c.id == id)
    }

    /// Gets the default (Standard) genetic code.
    pub fn default_code(&self) -> &GeneticCode {
        self.get(1).expect("Standard genetic code should always exist")
    }

    /// Resolves a `transl_table` qualifier value to a code.
    ///
    /// Anything that does not name a supported table, numeric or not, is an
    /// `UnknownCodonTable` error carrying the raw value.
    pub fn resolve(&self, raw: &str) -> TranslationResult<&GeneticCode> {
        let trimmed = raw.trim();
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| TranslationError::UnknownCodonTable(trimmed.to_string()))
    }
}

impl Default for GeneticCodes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_code_translation() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_codon("ATG"), Some('M')); // Start codon
        assert_eq!(standard.translate_codon("TAA"), Some('*')); // Stop codon
        assert_eq!(standard.translate_codon("TAG"), Some('*')); // Stop codon
        assert_eq!(standard.translate_codon("TGA"), Some('*')); // Stop codon
        assert_eq!(standard.translate_codon("TTT"), Some('F')); // Phenylalanine
        assert_eq!(standard.translate_codon("GGG"), Some('G')); // Glycine
    }

    #[test]
    fn test_rna_and_case_insensitive() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_codon("AUG"), Some('M'));
        assert_eq!(standard.translate_codon("UUU"), Some('F'));
        assert_eq!(standard.translate_codon("atg"), Some('M'));
        assert_eq!(standard.translate_codon("AtG"), Some('M'));
    }

    #[test]
    fn test_n_wildcard_codons() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_codon("ATN"), Some('X'));
        assert_eq!(standard.translate_codon("NNN"), Some('X'));
        assert_eq!(standard.translate_codon("NTG"), Some('X'));
    }

    #[test]
    fn test_invalid_codon_symbols() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        // IUPAC ambiguity codes other than N are not translatable.
        assert_eq!(standard.translate_codon("CTR"), None);
        assert_eq!(standard.translate_codon("A-G"), None);
        assert_eq!(standard.translate_codon("AT"), None);
        assert_eq!(standard.translate_codon("ATGC"), None);
    }

    #[test]
    fn test_different_genetic_codes() {
        let codes = GeneticCodes::new();

        // In the standard code, TGA is a stop.
        let standard = codes.get(1).unwrap();
        assert_eq!(standard.translate_codon("TGA"), Some('*'));

        // In vertebrate mitochondrial (code 2), TGA is Trp.
        let vert_mito = codes.get(2).unwrap();
        assert_eq!(vert_mito.translate_codon("TGA"), Some('W'));
    }

    #[test]
    fn test_translate_cds_stops_at_first_stop() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_cds("ATGAAATAA", true).unwrap(), "MK");
        assert_eq!(standard.translate_cds("ATGAAATAA", false).unwrap(), "MK*");
        // Internal stop with to_stop=false keeps going.
        assert_eq!(standard.translate_cds("ATGTAAATG", false).unwrap(), "M*M");
        assert_eq!(standard.translate_cds("ATGTAAATG", true).unwrap(), "M");
    }

    #[test]
    fn test_translate_cds_ignores_trailing_bases() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_cds("ATGAA", true).unwrap(), "M");
        assert_eq!(standard.translate_cds("ATGA", true).unwrap(), "M");
        assert_eq!(standard.translate_cds("AT", true).unwrap(), "");
    }

    #[test]
    fn test_translate_cds_invalid_codon_reports_index() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        let err = standard.translate_cds("ATGTRA", true).unwrap_err();
        match err {
            TranslationError::InvalidCodon { codon, index } => {
                assert_eq!(codon, "TRA");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_translate_cds_n_codons_become_x() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_cds("ATGNNNAAA", true).unwrap(), "MXK");
    }

    #[test]
    fn test_resolve_table_ids() {
        let codes = GeneticCodes::new();

        assert_eq!(codes.resolve("11").unwrap().id, 11);
        assert_eq!(codes.resolve(" 1 ").unwrap().id, 1);

        for bad in ["999", "7", "0", "abc", ""] {
            assert!(
                matches!(
                    codes.resolve(bad),
                    Err(TranslationError::UnknownCodonTable(_))
                ),
                "expected rejection of table {bad:?}"
            );
        }
    }

    #[test]
    fn test_all_tables_present() {
        let codes = GeneticCodes::new();
        assert_eq!(codes.all().len(), NCBI_CODES.len());
        assert!(codes.get(33).is_some());
        assert!(codes.get(17).is_none());
    }
}
