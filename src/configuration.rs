use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::digestion::Enzyme;
use crate::error::ConfigurationError;

/// Mass tolerance, either relative (ppm) or absolute (Dalton).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tolerance {
    Ppm(f64),
    Da(f64),
}

impl Tolerance {
    /// Half width of the tolerance window around `mass` in Dalton.
    pub fn delta(&self, mass: f64) -> f64 {
        match self {
            Tolerance::Ppm(ppm) => ppm * mass * 1e-6,
            Tolerance::Da(da) => *da,
        }
    }

    /// (`lower`, `upper`) window in Dalton
    pub fn bounds(&self, center: f64) -> (f64, f64) {
        let delta = self.delta(center);
        (center - delta, center + delta)
    }

    pub fn contains(&self, center: f64, value: f64) -> bool {
        (value - center).abs() <= self.delta(center)
    }

    fn value(&self) -> f64 {
        match self {
            Tolerance::Ppm(value) | Tolerance::Da(value) => *value,
        }
    }
}

/// Noise filtering and deisotoping settings applied to every MS2 spectrum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfiguration {
    /// Width of the jumping window (Th)
    pub window_size: f64,
    /// Peaks kept per window
    pub peaks_per_window: usize,
    /// Peaks kept per spectrum
    pub max_peaks: usize,
    pub min_isotope_charge: usize,
    pub max_isotope_charge: usize,
    /// Minimum number of isotope peaks (incl. the monoisotopic one) to accept an envelope
    pub min_isopeaks: usize,
    pub max_isopeaks: usize,
}

impl Default for PreprocessingConfiguration {
    fn default() -> Self {
        Self {
            window_size: 100.0,
            peaks_per_window: 20,
            max_peaks: 400,
            min_isotope_charge: 1,
            max_isotope_charge: 3,
            min_isopeaks: 3,
            max_isopeaks: 10,
        }
    }
}

/// Nucleotide adduct settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NucleotideConfiguration {
    /// Maximum oligonucleotide length, 0 disables the adduct search
    pub max_length: usize,
    /// Only generate chains occurring in this sequence (disabled if empty)
    pub sequence_restriction: String,
    /// `letter=formula` of the nucleoside monophosphates, e.g. `U=C9H13N2O9P`
    pub target_nucleotides: Vec<String>,
    /// `source->target`, e.g. `U->X`
    pub mappings: Vec<String>,
    /// `letter=min_count`, e.g. `U=1`
    pub restrictions: Vec<String>,
    /// Losses/gains combined with every chain, e.g. `-H2O`
    pub modifications: Vec<String>,
    /// `formula;name` or `precursor->formula;name`
    pub fragment_adducts: Vec<String>,
    /// Search the +152 cysteine adduct
    pub cysteine_adduct: bool,
}

impl Default for NucleotideConfiguration {
    fn default() -> Self {
        let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        Self {
            max_length: 2,
            sequence_restriction: String::new(),
            target_nucleotides: strings(&[
                "A=C10H14N5O7P",
                "C=C9H14N3O8P",
                "G=C10H14N5O8P",
                "U=C9H13N2O9P",
            ]),
            mappings: strings(&["A->A", "C->C", "G->G", "U->U"]),
            restrictions: strings(&["A=0", "C=0", "U=1", "G=0"]),
            modifications: strings(&["", "-H2O", "-H2O-HPO3", "-HPO3"]),
            fragment_adducts: strings(&[
                "C9H10N2O5;U-H3PO4",
                "C4H4N2O2;U'",
                "C4H2N2O1;U'-H2O",
                "C3O;C3O",
                "C9H13N2O9P1;U",
                "C9H11N2O8P1;U-H2O",
                "C9H12N2O6;U-HPO3",
            ]),
            cysteine_adduct: false,
        }
    }
}

/// Search parameters. `Default` reproduces the defaults of the RNPxl search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub precursor_tolerance: Tolerance,
    pub min_precursor_charge: usize,
    pub max_precursor_charge: usize,
    pub fragment_tolerance: Tolerance,
    /// UniMod style names, e.g. `Carbamidomethyl (C)`
    pub fixed_modifications: Vec<String>,
    pub variable_modifications: Vec<String>,
    pub max_variable_mods_per_peptide: usize,
    pub min_peptide_length: usize,
    pub missed_cleavages: usize,
    pub enzyme: String,
    /// Hits reported per spectrum
    pub top_hits: usize,
    pub nucleotides: NucleotideConfiguration,
    /// Run partial loss localization on the reported hits
    pub localization: bool,
    /// Drop precursors whose fractional mass rules out a nucleotide
    pub filter_fractional_mass: bool,
    /// Drop precursors lighter than this (Da)
    pub small_peptide_mass_filter: f64,
    /// Tolerance for the marker ion report (Da)
    pub marker_ions_tolerance: f64,
    pub preprocessing: PreprocessingConfiguration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            precursor_tolerance: Tolerance::Ppm(10.0),
            min_precursor_charge: 2,
            max_precursor_charge: 5,
            fragment_tolerance: Tolerance::Ppm(10.0),
            fixed_modifications: Vec::new(),
            variable_modifications: Vec::new(),
            max_variable_mods_per_peptide: 2,
            min_peptide_length: 6,
            missed_cleavages: 1,
            enzyme: "Trypsin".to_string(),
            top_hits: 1,
            nucleotides: NucleotideConfiguration::default(),
            localization: false,
            filter_fractional_mass: false,
            small_peptide_mass_filter: 600.0,
            marker_ions_tolerance: 0.05,
            preprocessing: PreprocessingConfiguration::default(),
        }
    }
}

impl Configuration {
    /// Checks everything which can be checked without the modification database or the
    /// adduct rules (those are validated when the search is set up).
    ///
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_unique(&self.fixed_modifications)
            .map_err(ConfigurationError::DuplicateFixedModification)?;
        check_unique(&self.variable_modifications)
            .map_err(ConfigurationError::DuplicateVariableModification)?;

        self.enzyme()?;

        for (name, tolerance) in [
            ("precursor_tolerance", self.precursor_tolerance),
            ("fragment_tolerance", self.fragment_tolerance),
        ] {
            if !(tolerance.value() > 0.0) {
                return Err(ConfigurationError::InvalidParameter(
                    name,
                    format!("{tolerance:?} must be positive"),
                ));
            }
        }
        if self.min_precursor_charge == 0 || self.min_precursor_charge > self.max_precursor_charge {
            return Err(ConfigurationError::InvalidParameter(
                "precursor charge",
                format!(
                    "invalid range {}..={}",
                    self.min_precursor_charge, self.max_precursor_charge
                ),
            ));
        }
        if self.top_hits == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "top_hits",
                "at least one hit per spectrum must be reported".to_string(),
            ));
        }
        let preprocessing = &self.preprocessing;
        if preprocessing.min_isotope_charge == 0
            || preprocessing.min_isotope_charge > preprocessing.max_isotope_charge
        {
            return Err(ConfigurationError::InvalidParameter(
                "isotope charge",
                format!(
                    "invalid range {}..={}",
                    preprocessing.min_isotope_charge, preprocessing.max_isotope_charge
                ),
            ));
        }
        if preprocessing.min_isopeaks > preprocessing.max_isopeaks {
            return Err(ConfigurationError::InvalidParameter(
                "isopeaks",
                format!(
                    "min_isopeaks ({}) > max_isopeaks ({})",
                    preprocessing.min_isopeaks, preprocessing.max_isopeaks
                ),
            ));
        }
        if !(preprocessing.window_size > 0.0) {
            return Err(ConfigurationError::InvalidParameter(
                "window_size",
                preprocessing.window_size.to_string(),
            ));
        }
        Ok(())
    }

    pub fn enzyme(&self) -> Result<Enzyme, ConfigurationError> {
        self.enzyme.parse()
    }
}

/// Returns the first duplicated name.
fn check_unique(names: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(duplicate) => Err(duplicate.clone()),
        None => Ok(()),
    }
}
