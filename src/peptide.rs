use std::fmt;
use std::sync::Arc;

use rustyms::{
    AminoAcid, CheckedAminoAcid, Peptidoform, SequenceElement, SequencePosition, UnAmbiguous,
};

use crate::error::Error;
use crate::formula::FormulaExt;
use crate::modification::{Modification, Terminus};

/// Position a modification can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Site {
    NTerm,
    Residue(usize),
    CTerm,
}

impl From<Site> for SequencePosition {
    fn from(site: Site) -> Self {
        match site {
            Site::NTerm => SequencePosition::NTerm,
            Site::Residue(idx) => SequencePosition::Index(idx),
            Site::CTerm => SequencePosition::CTerm,
        }
    }
}

/// Parses an upper case one-letter code into an amino acid with a defined composition.
/// `X`, `B`, `Z` and `J` are rejected.
fn parse_residue(code: u8) -> Option<CheckedAminoAcid<UnAmbiguous>> {
    if !code.is_ascii_uppercase() {
        return None;
    }
    let aminoacid = AminoAcid::try_from(code).ok()?;
    if matches!(aminoacid, AminoAcid::Unknown | AminoAcid::AmbiguousLeucine) {
        return None;
    }
    CheckedAminoAcid::new(aminoacid).into_unambiguous()
}

#[derive(Clone, Debug)]
struct Residue {
    code: u8,
    aminoacid: CheckedAminoAcid<UnAmbiguous>,
    modification: Option<Arc<Modification>>,
}

/// Peptide with per-residue and terminal modifications.
#[derive(Clone, Debug)]
pub struct ModifiedPeptide {
    residues: Vec<Residue>,
    n_term: Option<Arc<Modification>>,
    c_term: Option<Arc<Modification>>,
}

impl ModifiedPeptide {
    /// Creates an unmodified peptide.
    ///
    /// # Arguments
    /// * `sequence` - One-letter amino acid sequence
    ///
    pub fn from_sequence(sequence: &str) -> Result<Self, Error> {
        let residues = sequence
            .bytes()
            .map(|code| {
                parse_residue(code)
                    .map(|aminoacid| Residue {
                        code,
                        aminoacid,
                        modification: None,
                    })
                    .ok_or_else(|| Error::InvalidPeptideSequence(sequence.to_string()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        if residues.is_empty() {
            return Err(Error::InvalidPeptideSequence(sequence.to_string()));
        }
        Ok(Self {
            residues,
            n_term: None,
            c_term: None,
        })
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Sequence without modifications.
    pub fn unmodified_sequence(&self) -> String {
        self.residues.iter().map(|r| r.code as char).collect()
    }

    pub fn residue(&self, idx: usize) -> Option<u8> {
        self.residues.get(idx).map(|r| r.code)
    }

    pub fn contains_residue(&self, code: u8) -> bool {
        self.residues.iter().any(|r| r.code == code)
    }

    /// All sites in enumeration order: N-terminus, residues, C-terminus.
    pub fn sites(&self) -> Vec<Site> {
        let mut sites = Vec::with_capacity(self.residues.len() + 2);
        sites.push(Site::NTerm);
        sites.extend((0..self.residues.len()).map(Site::Residue));
        sites.push(Site::CTerm);
        sites
    }

    pub fn is_unmodified(&self, site: Site) -> bool {
        match site {
            Site::NTerm => self.n_term.is_none(),
            Site::CTerm => self.c_term.is_none(),
            Site::Residue(idx) => self
                .residues
                .get(idx)
                .is_some_and(|r| r.modification.is_none()),
        }
    }

    /// True if `modification` may be placed at `site` (ignores whether the site is occupied).
    pub fn accepts(&self, site: Site, modification: &Modification) -> bool {
        match (site, modification.terminus) {
            (Site::NTerm, Terminus::NTerm) => self
                .residues
                .first()
                .is_some_and(|r| modification.applies_to(r.code)),
            (Site::CTerm, Terminus::CTerm) => self
                .residues
                .last()
                .is_some_and(|r| modification.applies_to(r.code)),
            (Site::Residue(idx), Terminus::Anywhere) => self
                .residues
                .get(idx)
                .is_some_and(|r| !modification.residues.is_empty() && modification.applies_to(r.code)),
            _ => false,
        }
    }

    pub fn set_modification(&mut self, site: Site, modification: Arc<Modification>) {
        match site {
            Site::NTerm => self.n_term = Some(modification),
            Site::CTerm => self.c_term = Some(modification),
            Site::Residue(idx) => {
                if let Some(residue) = self.residues.get_mut(idx) {
                    residue.modification = Some(modification);
                }
            }
        }
    }

    /// The peptide as a rustyms peptidoform, carrying all placed modifications.
    pub fn peptidoform(&self) -> Peptidoform<UnAmbiguous> {
        let mut peptidoform: Peptidoform<UnAmbiguous> = self
            .residues
            .iter()
            .map(|residue| SequenceElement::new(residue.aminoacid, None))
            .collect();
        if let Some(modification) = &self.n_term {
            peptidoform.add_simple_n_term(modification.simple.clone());
        }
        for (idx, residue) in self.residues.iter().enumerate() {
            if let Some(modification) = &residue.modification {
                peptidoform.add_simple_modification(
                    Site::Residue(idx).into(),
                    modification.simple.clone(),
                );
            }
        }
        if let Some(modification) = &self.c_term {
            peptidoform.add_simple_c_term(modification.simple.clone());
        }
        peptidoform
    }

    /// Neutral monoisotopic mass of the full peptide.
    pub fn monoisotopic_mass(&self) -> f64 {
        self.peptidoform().formula().dalton()
    }
}

/// Renders modifications in brackets after the residue, terminal ones with a dot:
/// `.(Acetyl)PEM(Oxidation)K.(Amidated)`
impl fmt::Display for ModifiedPeptide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(modification) = &self.n_term {
            write!(f, ".({})", modification.id)?;
        }
        for residue in self.residues.iter() {
            write!(f, "{}", residue.code as char)?;
            if let Some(modification) = &residue.modification {
                write!(f, "({})", modification.id)?;
            }
        }
        if let Some(modification) = &self.c_term {
            write!(f, ".({})", modification.id)?;
        }
        Ok(())
    }
}
