use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rustyms::modification::{Ontology, SimpleModification, SimpleModificationInner};
use rustyms::placement_rule::{PlacementRule, Position};
use rustyms::{AminoAcid, MolecularFormula};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Error};
use crate::formula::FormulaExt;
use crate::peptide::{ModifiedPeptide, Site};

/// Where a modification may be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminus {
    Anywhere,
    NTerm,
    CTerm,
}

impl Terminus {
    fn suffix(&self) -> Option<&'static str> {
        match self {
            Terminus::Anywhere => None,
            Terminus::NTerm => Some("N-term"),
            Terminus::CTerm => Some("C-term"),
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "N-term" => Some(Terminus::NTerm),
            "C-term" => Some(Terminus::CTerm),
            _ => None,
        }
    }
}

/// A named mass delta that applies to some residues and/or a peptide terminus.
#[derive(Clone, Debug, PartialEq)]
pub struct Modification {
    /// Short name used in rendered sequences, e.g. `Oxidation`
    pub id: String,
    /// Name used for lookup, e.g. `Oxidation (M)` or `U-H2O (N-term)`
    pub full_id: String,
    pub formula: MolecularFormula,
    pub mass: f64,
    /// Residues the modification applies to. Empty means any residue (terminal modifications only).
    pub residues: Vec<u8>,
    pub terminus: Terminus,
    /// The modification as placed on the rustyms peptidoform
    pub simple: SimpleModification,
}

impl Modification {
    /// Modification defined by its formula only.
    pub fn new(
        id: &str,
        formula: MolecularFormula,
        residues: &[u8],
        terminus: Terminus,
    ) -> Self {
        let simple = Arc::new(SimpleModificationInner::Formula(formula.clone()));
        Self::with_simple(id, formula, residues, terminus, simple)
    }

    fn with_simple(
        id: &str,
        formula: MolecularFormula,
        residues: &[u8],
        terminus: Terminus,
        simple: SimpleModification,
    ) -> Self {
        let specificity = match terminus.suffix() {
            Some(suffix) => suffix.to_string(),
            None => residues.iter().map(|r| *r as char).collect(),
        };
        Self {
            id: id.to_string(),
            full_id: format!("{id} ({specificity})"),
            mass: formula.dalton(),
            formula,
            residues: residues.to_vec(),
            terminus,
            simple,
        }
    }

    /// Resolves `Name (Residues)`, `Name (N-term)` or `Name (C-term)` against the Unimod
    /// ontology. Fails if the name is unknown or Unimod does not allow the placement.
    ///
    /// # Arguments
    /// * `full_id` - Modification name with its specificity, e.g. `Phospho (STY)`
    ///
    pub fn from_unimod(full_id: &str) -> Option<Self> {
        let (name, specificity) = full_id.trim().strip_suffix(')')?.rsplit_once('(')?;
        let (name, specificity) = (name.trim(), specificity.trim());
        let simple = Ontology::Unimod.find_name(name, None)?;
        let SimpleModificationInner::Database {
            specificities,
            formula,
            ..
        } = &*simple
        else {
            return None;
        };
        let allowed = |aa: AminoAcid, position: Position| {
            specificities
                .iter()
                .any(|(rules, _, _)| PlacementRule::any_possible_aa(rules, aa, position))
        };

        let (residues, terminus) = match Terminus::from_suffix(specificity) {
            Some(terminus) => (Vec::new(), terminus),
            None => (specificity.bytes().collect::<Vec<u8>>(), Terminus::Anywhere),
        };
        // terminal rules do not look at the residue, Unknown never matches a residue rule
        let placeable = match terminus {
            Terminus::NTerm => allowed(AminoAcid::Unknown, Position::AnyNTerm),
            Terminus::CTerm => allowed(AminoAcid::Unknown, Position::AnyCTerm),
            Terminus::Anywhere => {
                !residues.is_empty()
                    && residues.iter().all(|code| {
                        AminoAcid::try_from(*code)
                            .is_ok_and(|aa| aa != AminoAcid::Unknown && allowed(aa, Position::Anywhere))
                    })
            }
        };
        placeable.then(|| {
            Self::with_simple(name, formula.clone(), &residues, terminus, simple.clone())
        })
    }

    /// True if the modification may be placed on `residue`. For terminal modifications
    /// `residue` is the terminal residue.
    pub fn applies_to(&self, residue: u8) -> bool {
        self.residues.is_empty() || self.residues.contains(&residue)
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_id)
    }
}

/// Read-mostly lookup of modifications by their full id.
pub trait ModificationCatalog {
    fn lookup(&self, name: &str) -> Option<Arc<Modification>>;

    /// Registers `name` as terminal modification, does nothing if a modification with the
    /// same full id already exists.
    fn register_terminal_modification(
        &mut self,
        name: &str,
        formula: &MolecularFormula,
        terminus: Terminus,
    );
}

/// Modification database backed by the Unimod ontology of rustyms. Registered entries
/// (the fragment adducts) shadow Unimod names.
#[derive(Clone, Debug, Default)]
pub struct ModificationDatabase {
    registered: HashMap<String, Arc<Modification>>,
}

impl ModificationDatabase {
    pub fn insert(&mut self, modification: Modification) {
        self.registered
            .entry(modification.full_id.clone())
            .or_insert_with(|| Arc::new(modification));
    }

    /// Number of registered modifications, Unimod entries are not counted.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Looks up all names, failing on the first unknown one.
    pub fn lookup_all(&self, names: &[String]) -> Result<Vec<Arc<Modification>>, ConfigurationError> {
        names
            .iter()
            .map(|name| {
                self.lookup(name)
                    .ok_or_else(|| ConfigurationError::UnknownModification(name.clone()))
            })
            .collect()
    }
}

impl ModificationCatalog for ModificationDatabase {
    fn lookup(&self, name: &str) -> Option<Arc<Modification>> {
        let name = name.trim();
        self.registered
            .get(name)
            .cloned()
            .or_else(|| Modification::from_unimod(name).map(Arc::new))
    }

    fn register_terminal_modification(
        &mut self,
        name: &str,
        formula: &MolecularFormula,
        terminus: Terminus,
    ) {
        self.insert(Modification::new(name, formula.clone(), &[], terminus));
    }
}

/// Full id under which fragment adducts are registered as terminal modification.
pub fn terminal_modification_id(name: &str, terminus: Terminus) -> String {
    match terminus.suffix() {
        Some(suffix) => format!("{name} ({suffix})"),
        None => name.to_string(),
    }
}

/// Enumerates concrete modified peptides from an unmodified sequence.
pub trait ModifiedPeptideGenerator {
    fn apply_fixed(&self, peptide: &mut ModifiedPeptide);

    /// All variable modification combinations with at most `max_per_peptide` modified
    /// sites. The order is deterministic and the first entry carries no variable modification.
    fn apply_variable(&self, peptide: &ModifiedPeptide, max_per_peptide: usize) -> Vec<ModifiedPeptide>;
}

/// Fixed and variable modifications of a search. Hits only store the index into
/// [`ModificationCombinations::enumerate`], the peptide is rebuilt on demand.
#[derive(Clone, Debug, Default)]
pub struct ModificationCombinations {
    fixed: Vec<Arc<Modification>>,
    variable: Vec<Arc<Modification>>,
    max_variable_per_peptide: usize,
}

impl ModificationCombinations {
    pub fn new(
        fixed: Vec<Arc<Modification>>,
        variable: Vec<Arc<Modification>>,
        max_variable_per_peptide: usize,
    ) -> Self {
        Self {
            fixed,
            variable,
            max_variable_per_peptide,
        }
    }

    /// Looks up the configured modification names.
    ///
    /// # Arguments
    /// * `catalog` - Modification database
    /// * `fixed` - Names of fixed modifications
    /// * `variable` - Names of variable modifications
    /// * `max_variable_per_peptide` - Maximum number of variable modified sites
    ///
    pub fn from_names(
        catalog: &ModificationDatabase,
        fixed: &[String],
        variable: &[String],
        max_variable_per_peptide: usize,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(
            catalog.lookup_all(fixed)?,
            catalog.lookup_all(variable)?,
            max_variable_per_peptide,
        ))
    }

    /// All modified variants of `sequence` in enumeration order.
    pub fn enumerate(&self, sequence: &str) -> Result<Vec<ModifiedPeptide>, Error> {
        let mut peptide = ModifiedPeptide::from_sequence(sequence)?;
        self.apply_fixed(&mut peptide);
        Ok(self.apply_variable(&peptide, self.max_variable_per_peptide))
    }

    /// Rebuilds the variant at `index` of [`Self::enumerate`].
    pub fn reconstruct(&self, sequence: &str, index: usize) -> Result<ModifiedPeptide, Error> {
        self.enumerate(sequence)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::ModificationIndex(index, sequence.to_string()))
    }

    fn site_candidates(&self, peptide: &ModifiedPeptide) -> Vec<(Site, Vec<Arc<Modification>>)> {
        peptide
            .sites()
            .into_iter()
            .filter(|site| peptide.is_unmodified(*site))
            .filter_map(|site| {
                let applicable: Vec<Arc<Modification>> = self
                    .variable
                    .iter()
                    .filter(|modification| peptide.accepts(site, modification))
                    .cloned()
                    .collect();
                (!applicable.is_empty()).then_some((site, applicable))
            })
            .collect()
    }
}

impl ModifiedPeptideGenerator for ModificationCombinations {
    fn apply_fixed(&self, peptide: &mut ModifiedPeptide) {
        for modification in self.fixed.iter() {
            for site in peptide.sites() {
                if peptide.is_unmodified(site) && peptide.accepts(site, modification) {
                    peptide.set_modification(site, modification.clone());
                }
            }
        }
    }

    fn apply_variable(&self, peptide: &ModifiedPeptide, max_per_peptide: usize) -> Vec<ModifiedPeptide> {
        let mut peptides = vec![peptide.clone()];
        let candidates = self.site_candidates(peptide);
        let max_sites = max_per_peptide.min(candidates.len());

        for n_sites in 1..=max_sites {
            for site_selection in combinations(candidates.len(), n_sites) {
                // cartesian product over the applicable modifications of every chosen site
                let mut partial = vec![peptide.clone()];
                for &candidate_idx in site_selection.iter() {
                    let (site, modifications) = &candidates[candidate_idx];
                    partial = partial
                        .into_iter()
                        .flat_map(|base| {
                            modifications.iter().map(move |modification| {
                                let mut modified = base.clone();
                                modified.set_modification(*site, modification.clone());
                                modified
                            })
                        })
                        .collect();
                }
                peptides.extend(partial);
            }
        }
        peptides
    }
}

/// All `k` element subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    if k > n {
        return result;
    }
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        result.push(current.clone());
        // find the rightmost index which can still be increased
        let mut idx = k;
        while idx > 0 && current[idx - 1] == n - k + idx - 1 {
            idx -= 1;
        }
        if idx == 0 {
            break;
        }
        current[idx - 1] += 1;
        for j in idx..k {
            current[j] = current[j - 1] + 1;
        }
    }
    result
}
