use std::str::FromStr;

use rustyms::{AminoAcid, CheckedAminoAcid, Protease, SequenceElement};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Splits a protein into peptide substrings. The returned slices borrow from `protein`
/// so hits can reference them for the whole search.
pub trait SequenceDigestor {
    fn digest<'a>(&self, protein: &'a str, min_length: usize) -> Vec<&'a str>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enzyme {
    Trypsin,
    TrypsinP,
    LysC,
    ArgC,
    AspN,
    Chymotrypsin,
    NoCleavage,
}

impl FromStr for Enzyme {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim() {
            "Trypsin" => Ok(Enzyme::Trypsin),
            "Trypsin/P" => Ok(Enzyme::TrypsinP),
            "Lys-C" => Ok(Enzyme::LysC),
            "Arg-C" => Ok(Enzyme::ArgC),
            "Asp-N" => Ok(Enzyme::AspN),
            "Chymotrypsin" => Ok(Enzyme::Chymotrypsin),
            "no cleavage" => Ok(Enzyme::NoCleavage),
            other => Err(ConfigurationError::UnknownEnzyme(other.to_string())),
        }
    }
}

/// Residues that do not block a cleavage site when they follow it (anything but proline).
const NOT_PROLINE: [AminoAcid; 21] = [
    AminoAcid::Alanine,
    AminoAcid::Arginine,
    AminoAcid::Asparagine,
    AminoAcid::AsparticAcid,
    AminoAcid::Cysteine,
    AminoAcid::Glutamine,
    AminoAcid::GlutamicAcid,
    AminoAcid::Glycine,
    AminoAcid::Histidine,
    AminoAcid::Isoleucine,
    AminoAcid::Leucine,
    AminoAcid::Lysine,
    AminoAcid::Methionine,
    AminoAcid::Phenylalanine,
    AminoAcid::Serine,
    AminoAcid::Threonine,
    AminoAcid::Tryptophan,
    AminoAcid::Tyrosine,
    AminoAcid::Valine,
    AminoAcid::Selenocysteine,
    AminoAcid::Pyrrolysine,
];

impl Enzyme {
    /// Cleavage rule as rustyms protease, `None` if the enzyme never cuts.
    pub fn protease(&self) -> Option<Protease> {
        let before_not_proline = |residues: &[AminoAcid]| Protease {
            n_term: vec![Some(residues.to_vec())],
            c_term: vec![Some(NOT_PROLINE.to_vec())],
        };
        match self {
            Enzyme::Trypsin => Some(before_not_proline(&[AminoAcid::Lysine, AminoAcid::Arginine])),
            Enzyme::TrypsinP => Some(Protease {
                n_term: vec![Some(vec![AminoAcid::Lysine, AminoAcid::Arginine])],
                c_term: Vec::new(),
            }),
            Enzyme::LysC => Some(before_not_proline(&[AminoAcid::Lysine])),
            Enzyme::ArgC => Some(before_not_proline(&[AminoAcid::Arginine])),
            Enzyme::AspN => Some(Protease {
                n_term: Vec::new(),
                c_term: vec![Some(vec![AminoAcid::AsparticAcid])],
            }),
            Enzyme::Chymotrypsin => Some(before_not_proline(&[
                AminoAcid::Phenylalanine,
                AminoAcid::Tyrosine,
                AminoAcid::Tryptophan,
                AminoAcid::Leucine,
            ])),
            Enzyme::NoCleavage => None,
        }
    }
}

/// Cut positions of `protease` in `protein`, strictly between its first and last residue.
/// A glycine is appended so a cut right before the last residue is tested as well.
fn cleavage_sites(protease: &Protease, protein: &str) -> Vec<usize> {
    let mut sequence: Vec<SequenceElement<_>> = protein
        .bytes()
        .map(|code| {
            let aminoacid = AminoAcid::try_from(code).unwrap_or(AminoAcid::Unknown);
            SequenceElement::new(CheckedAminoAcid::new(aminoacid), None)
        })
        .collect();
    sequence.push(SequenceElement::new(CheckedAminoAcid::new(AminoAcid::Glycine), None));
    protease
        .match_locations(&sequence)
        .into_iter()
        .filter(|&site| site > 0 && site < protein.len() && protein.is_char_boundary(site))
        .collect()
}

/// Specific digestion with a fixed number of allowed missed cleavages.
#[derive(Clone, Debug)]
pub struct EnzymaticDigestion {
    enzyme: Enzyme,
    missed_cleavages: usize,
}

impl EnzymaticDigestion {
    pub fn new(enzyme: Enzyme, missed_cleavages: usize) -> Self {
        Self {
            enzyme,
            missed_cleavages,
        }
    }
}

impl SequenceDigestor for EnzymaticDigestion {
    fn digest<'a>(&self, protein: &'a str, min_length: usize) -> Vec<&'a str> {
        if protein.is_empty() {
            return Vec::new();
        }
        let mut boundaries = vec![0];
        if let Some(protease) = self.enzyme.protease() {
            boundaries.extend(cleavage_sites(&protease, protein));
        }
        boundaries.push(protein.len());

        let mut peptides = Vec::new();
        for start in 0..boundaries.len() - 1 {
            let last_end = (start + 1 + self.missed_cleavages).min(boundaries.len() - 1);
            for end in start + 1..=last_end {
                let peptide = &protein[boundaries[start]..boundaries[end]];
                if peptide.len() >= min_length {
                    peptides.push(peptide);
                }
            }
        }
        peptides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trypsin() {
        let digestion = EnzymaticDigestion::new(Enzyme::Trypsin, 0);
        assert_eq!(
            digestion.digest("AAKPBBRCCKDD", 1),
            vec!["AAKPBBR", "CCK", "DD"]
        );
    }

    #[test]
    fn test_cut_before_last_residue() {
        let digestion = EnzymaticDigestion::new(Enzyme::Trypsin, 0);
        assert_eq!(digestion.digest("PEPTIDEKA", 1), vec!["PEPTIDEK", "A"]);
        assert_eq!(digestion.digest("PEPTIDEKP", 1), vec!["PEPTIDEKP"]);
        assert_eq!(digestion.digest("K", 1), vec!["K"]);
        let digestion = EnzymaticDigestion::new(Enzyme::TrypsinP, 0);
        assert_eq!(digestion.digest("MKPEPTIDEK", 1), vec!["MK", "PEPTIDEK"]);
    }

    #[test]
    fn test_asp_n_and_chymotrypsin() {
        let digestion = EnzymaticDigestion::new(Enzyme::AspN, 0);
        assert_eq!(digestion.digest("DAADKKD", 1), vec!["DAA", "DKK", "D"]);
        let digestion = EnzymaticDigestion::new(Enzyme::Chymotrypsin, 0);
        assert_eq!(digestion.digest("AAFPAWKLA", 1), vec!["AAFPAW", "KL", "A"]);
    }

    #[test]
    fn test_protease_rules() {
        assert!(Enzyme::NoCleavage.protease().is_none());
        let trypsin = Enzyme::Trypsin.protease().unwrap();
        assert_eq!(trypsin.n_term.len(), 1);
        assert_eq!(trypsin.c_term.len(), 1);
        assert_eq!(cleavage_sites(&trypsin, "AKRPK"), vec![2]);
        assert!(cleavage_sites(&trypsin, "").is_empty());
    }

    #[test]
    fn test_missed_cleavages_and_min_length() {
        let digestion = EnzymaticDigestion::new(Enzyme::Trypsin, 1);
        assert_eq!(
            digestion.digest("AAKBBRCC", 3),
            vec!["AAK", "AAKBBR", "BBR", "BBRCC"]
        );
    }

    #[test]
    fn test_enzyme_names() {
        assert_eq!("Trypsin/P".parse::<Enzyme>().unwrap(), Enzyme::TrypsinP);
        assert_eq!(
            "Pepsin".parse::<Enzyme>(),
            Err(ConfigurationError::UnknownEnzyme("Pepsin".to_string()))
        );
    }

    #[test]
    fn test_no_cleavage() {
        let digestion = EnzymaticDigestion::new(Enzyme::NoCleavage, 2);
        assert_eq!(digestion.digest("PEPTIDEK", 1), vec!["PEPTIDEK"]);
        assert!(digestion.digest("", 1).is_empty());
    }
}
