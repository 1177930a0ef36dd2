//! Protein sequence metrics.
//!
//! Descriptive statistics over predicted proteins: molecular weight,
//! Kyte-Doolittle hydropathy profiles and residue composition. All
//! functions are pure and operate on plain amino-acid strings, so they
//! compose directly with the pipeline's FASTA output.

use std::collections::HashMap;

/// Mass of one water molecule in g/mol, released per peptide bond.
const WATER_MASS: f64 = 18.02;

/// Average mass of one free amino acid in g/mol, from the NIST Chemistry
/// WebBook. `None` for anything outside the twenty standard residues.
fn residue_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'A' => 89.0932,   // C3H7NO2
        'R' => 174.2010,  // C6H14N4O2
        'N' => 132.1179,  // C4H8N2O3
        'D' => 133.1027,  // C4H7NO4
        'C' => 121.158,   // C3H7NO2S
        'E' => 147.1293,  // C5H9NO4
        'Q' => 146.1445,  // C5H10N2O3
        'G' => 75.0666,   // C2H5NO2
        'H' => 155.1546,  // C6H9N3O2
        'I' => 131.1729,  // C6H13NO2
        'L' => 131.1729,  // C6H13NO2
        'K' => 146.1876,  // C6H14N2O2
        'M' => 149.211,   // C5H11NO2S
        'F' => 165.1891,  // C9H11NO2
        'P' => 115.1305,  // C5H9NO2
        'S' => 105.0926,  // C3H7NO3
        'T' => 119.1192,  // C4H9NO3
        'W' => 204.2252,  // C11H12N2O2
        'Y' => 181.1885,  // C9H11NO3
        'V' => 117.1463,  // C5H11NO2
        _ => return None,
    };
    Some(mass)
}

/// Kyte-Doolittle hydropathy index of one residue.
fn kyte_doolittle(residue: char) -> Option<f64> {
    let value = match residue {
        'A' => 1.80,
        'R' => -4.50,
        'N' => -3.50,
        'D' => -3.50,
        'C' => 2.50,
        'E' => -3.50,
        'Q' => -3.50,
        'G' => -0.40,
        'H' => -3.20,
        'I' => 4.50,
        'L' => 3.80,
        'K' => -3.90,
        'M' => 1.90,
        'F' => 2.80,
        'P' => -1.60,
        'S' => -0.80,
        'T' => -0.70,
        'W' => -0.90,
        'Y' => -1.30,
        'V' => 4.20,
        _ => return None,
    };
    Some(value)
}

/// Molecular weight of a protein in g/mol.
///
/// Sums the residue masses and removes one water per peptide bond. Stop
/// symbols and ambiguity codes are skipped; an empty sequence weighs 0.
///
/// # Examples
///
/// ```
/// use gbk2faa::metrics::molecular_weight;
///
/// let weight = molecular_weight("GG");
/// assert!((weight - 132.1132).abs() < 1e-6);
/// ```
pub fn molecular_weight(protein: &str) -> f64 {
    let mut total = 0.0;
    let mut residues = 0u64;
    for c in protein.chars() {
        if let Some(mass) = residue_mass(c) {
            total += mass;
            residues += 1;
        }
    }
    if residues == 0 {
        return 0.0;
    }
    total - (residues - 1) as f64 * WATER_MASS
}

/// Sliding-window Kyte-Doolittle hydropathy profile.
///
/// Returns one mean score per full window of `window_size` residues, so a
/// sequence shorter than the window yields no scores. Residues without a
/// hydropathy value contribute zero to their windows.
///
/// Sustained scores above roughly 1.6 over a 19 to 21 residue window are
/// the classic hint of a transmembrane helix.
pub fn hydrophobicity(protein: &str, window_size: usize) -> Vec<f64> {
    if window_size == 0 {
        return Vec::new();
    }
    let residues: Vec<char> = protein.chars().collect();
    residues
        .windows(window_size)
        .map(|window| {
            let sum: f64 = window.iter().filter_map(|&c| kyte_doolittle(c)).sum();
            sum / window_size as f64
        })
        .collect()
}

/// Counts every symbol of the sequence, stop and ambiguity codes included.
pub fn amino_counts(protein: &str) -> HashMap<char, u64> {
    let mut counts: HashMap<char, u64> = HashMap::new();
    for c in protein.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

/// Relative frequency of every symbol as a percentage of sequence length.
///
/// Aromaticity after Lobry 1994 falls out directly as the summed
/// percentages of F, W and Y divided by 100.
pub fn amino_percentage(protein: &str) -> HashMap<char, f64> {
    let length = protein.chars().count() as f64;
    amino_counts(protein)
        .into_iter()
        .map(|(residue, count)| (residue, count as f64 / length * 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_single_residue_weight() {
        assert!(close(molecular_weight("G"), 75.0666));
        assert!(close(molecular_weight("A"), 89.0932));
    }

    #[test]
    fn test_peptide_bond_subtracts_water() {
        assert!(close(molecular_weight("GG"), 2.0 * 75.0666 - 18.02));
        assert!(close(molecular_weight("MK"), 149.211 + 146.1876 - 18.02));
    }

    #[test]
    fn test_weight_skips_stops_and_ambiguity() {
        assert!(close(molecular_weight("MK*"), molecular_weight("MK")));
        assert!(close(molecular_weight("MXK"), molecular_weight("MK")));
        assert_eq!(molecular_weight(""), 0.0);
        assert_eq!(molecular_weight("X*"), 0.0);
    }

    #[test]
    fn test_hydrophobicity_window_means() {
        let profile = hydrophobicity("AILV", 2);
        assert_eq!(profile.len(), 3);
        assert!(close(profile[0], (1.80 + 4.50) / 2.0));
        assert!(close(profile[1], (4.50 + 3.80) / 2.0));
        assert!(close(profile[2], (3.80 + 4.20) / 2.0));
    }

    #[test]
    fn test_hydrophobicity_short_sequences_and_zero_window() {
        assert!(hydrophobicity("AI", 5).is_empty());
        assert!(hydrophobicity("AIL", 0).is_empty());
        assert_eq!(hydrophobicity("RR", 1), vec![-4.50, -4.50]);
    }

    #[test]
    fn test_hydrophobicity_unknown_contributes_zero() {
        let profile = hydrophobicity("AXA", 3);
        assert_eq!(profile.len(), 1);
        assert!(close(profile[0], (1.80 + 1.80) / 3.0));
    }

    #[test]
    fn test_amino_counts_include_everything() {
        let counts = amino_counts("MKKM*");
        assert_eq!(counts.get(&'M'), Some(&2));
        assert_eq!(counts.get(&'K'), Some(&2));
        assert_eq!(counts.get(&'*'), Some(&1));
        assert!(amino_counts("").is_empty());
    }

    #[test]
    fn test_amino_percentage() {
        let percentages = amino_percentage("MKKK");
        assert!(close(percentages[&'M'], 25.0));
        assert!(close(percentages[&'K'], 75.0));
    }

    #[test]
    fn test_aromaticity_from_percentages() {
        let percentages = amino_percentage("FWYA");
        let aromaticity: f64 = ['F', 'W', 'Y']
            .iter()
            .filter_map(|aa| percentages.get(aa))
            .map(|p| p / 100.0)
            .sum();
        assert!(close(aromaticity, 0.75));
    }
}
