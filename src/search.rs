use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adduct::{
    compute_all_feasible_fragment_adducts, enumerate_precursor_adducts, parse_fragment_adduct_rules,
    FeasibleFragmentAdducts, FragmentAdductRules, PrecursorAdducts,
};
use crate::alignment::GreedyAligner;
use crate::configuration::Configuration;
use crate::constants::SIGNIFICANCE_FLOOR;
use crate::digestion::{EnzymaticDigestion, SequenceDigestor};
use crate::error::Error;
use crate::hit::{AnnotatedHit, HitCollector};
use crate::hyperscore::{HyperScore, PrimaryScoringFunction};
use crate::localization::LocalizationEngine;
use crate::mass_index::{CandidateMassIndex, MassIndexStatistics};
use crate::modification::{ModificationCombinations, ModificationDatabase};
use crate::preprocessing::SpectrumPreprocessor;
use crate::report::{marker_ion_intensities, marker_ion_table, Identification, IdentifiedHit};
use crate::spectrum::Spectrum;
use crate::theoretical::{complete_loss_spectrum, FragmentIonGenerator, TheoreticalPeak};

/// Protein database entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Protein {
    pub accession: String,
    pub sequence: String,
}

impl Protein {
    pub fn new(accession: &str, sequence: &str) -> Self {
        Self {
            accession: accession.to_string(),
            sequence: sequence.to_string(),
        }
    }
}

/// Counters of a search run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub proteins: usize,
    /// Distinct peptide sequences scored
    pub peptides: usize,
    pub spectra: MassIndexStatistics,
}

/// Search set up from a validated configuration: modification catalog with the registered
/// fragment adducts, modification combinatorics and all adduct tables. Immutable once built.
#[derive(Debug)]
pub struct SearchEngine {
    configuration: Configuration,
    catalog: ModificationDatabase,
    modifications: ModificationCombinations,
    digestion: EnzymaticDigestion,
    precursor_adducts: PrecursorAdducts,
    fragment_adduct_rules: FragmentAdductRules,
    fragment_adducts: FeasibleFragmentAdducts,
}

impl SearchEngine {
    /// Creates a new search engine with the built-in modification database.
    ///
    /// # Arguments
    /// * `configuration` - Search configuration
    ///
    pub fn new(configuration: Configuration) -> Result<Self, Error> {
        Self::with_catalog(configuration, ModificationDatabase::default())
    }

    /// Creates a new search engine.
    ///
    /// # Arguments
    /// * `configuration` - Search configuration
    /// * `catalog` - Modification database, fragment adducts are registered in it
    ///
    pub fn with_catalog(configuration: Configuration, mut catalog: ModificationDatabase) -> Result<Self, Error> {
        configuration.validate()?;
        let digestion = EnzymaticDigestion::new(configuration.enzyme()?, configuration.missed_cleavages);
        let modifications = ModificationCombinations::from_names(
            &catalog,
            &configuration.fixed_modifications,
            &configuration.variable_modifications,
            configuration.max_variable_mods_per_peptide,
        )?;
        let fragment_adduct_rules =
            parse_fragment_adduct_rules(&configuration.nucleotides.fragment_adducts, &mut catalog)?;
        let precursor_adducts = enumerate_precursor_adducts(&configuration.nucleotides)?;
        let fragment_adducts =
            compute_all_feasible_fragment_adducts(&precursor_adducts, &fragment_adduct_rules);
        info!(
            "{} precursor adducts, {} fragment adduct rules",
            precursor_adducts.len(),
            fragment_adduct_rules.len()
        );
        if configuration.localization && fragment_adduct_rules.is_empty() {
            warn!("Localization is enabled but no fragment adduct rules are configured");
        }

        Ok(Self {
            configuration,
            catalog,
            modifications,
            digestion,
            precursor_adducts,
            fragment_adduct_rules,
            fragment_adducts,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn precursor_adducts(&self) -> &PrecursorAdducts {
        &self.precursor_adducts
    }

    /// Scores all variants of one peptide against the spectra within the precursor tolerance.
    fn score_peptide<'a>(
        &self,
        sequence: &'a str,
        spectra: &[Spectrum],
        index: &CandidateMassIndex,
        collector: &HitCollector<'a>,
    ) {
        let variants = match self.modifications.enumerate(sequence) {
            Ok(variants) => variants,
            Err(error) => {
                debug!("Skipping {sequence}: {error}");
                return;
            }
        };

        for (modification_index, peptide) in variants.iter().enumerate() {
            let peptide_mass = peptide.monoisotopic_mass();
            let mut theoretical_by_charge: HashMap<usize, Vec<TheoreticalPeak>> = HashMap::new();

            for (adduct_index, adduct) in self.precursor_adducts.iter().enumerate() {
                for spectrum_idx in index.query(peptide_mass + adduct.mass, self.configuration.precursor_tolerance) {
                    let spectrum = &spectra[spectrum_idx];
                    let charge = spectrum.precursors.first().map_or(1, |precursor| precursor.charge);
                    let theoretical = theoretical_by_charge
                        .entry(charge)
                        .or_insert_with(|| complete_loss_spectrum(&FragmentIonGenerator, peptide, charge));

                    let score = HyperScore.score(spectrum, theoretical, self.configuration.fragment_tolerance);
                    if score < SIGNIFICANCE_FLOOR {
                        continue;
                    }
                    collector.add(
                        spectrum_idx,
                        AnnotatedHit::new(sequence, modification_index, adduct_index, score),
                    );
                }
            }
        }
    }

    /// Runs the search: preprocessing, mass indexing, scoring, top-N selection, optional
    /// localization and report assembly.
    ///
    /// # Arguments
    /// * `spectra` - MS2 spectra (not preprocessed)
    /// * `proteins` - Protein database
    ///
    pub fn run(
        &self,
        spectra: &[Spectrum],
        proteins: &[Protein],
    ) -> Result<(Vec<Identification>, Diagnostics), Error> {
        if proteins.is_empty() {
            return Err(Error::EmptyProteinDatabase);
        }

        info!("Preprocessing {} spectra", spectra.len());
        let mut scoring_spectra = spectra.to_vec();
        SpectrumPreprocessor::for_scoring(&self.configuration).process_all(&mut scoring_spectra);

        let (index, statistics) = CandidateMassIndex::build(&scoring_spectra, &self.configuration);
        if index.is_empty() {
            return Err(Error::NoUsableSpectra);
        }

        info!("Scoring {} proteins", proteins.len());
        let collector = HitCollector::new(scoring_spectra.len());
        let processed: Mutex<HashSet<&str>> = Mutex::new(HashSet::new());
        let peptide_count = AtomicUsize::new(0);

        proteins.par_iter().for_each(|protein| {
            for sequence in self
                .digestion
                .digest(&protein.sequence, self.configuration.min_peptide_length)
            {
                let is_new = processed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(sequence);
                if !is_new {
                    continue;
                }
                peptide_count.fetch_add(1, Ordering::Relaxed);
                self.score_peptide(sequence, &scoring_spectra, &index, &collector);
            }
        });

        let mut top_hits = collector.into_top_hits(self.configuration.top_hits);
        let diagnostics = Diagnostics {
            proteins: proteins.len(),
            peptides: peptide_count.into_inner(),
            spectra: statistics,
        };
        info!(
            "Scored {} distinct peptides, {} spectra with hits",
            diagnostics.peptides,
            top_hits.iter().filter(|hits| !hits.is_empty()).count()
        );

        let marker_spectra = if self.configuration.localization {
            info!("Localizing adducts");
            let mut localization_spectra = spectra.to_vec();
            SpectrumPreprocessor::for_localization(&self.configuration)
                .process_all(&mut localization_spectra);
            let engine = LocalizationEngine::new(
                FragmentIonGenerator,
                GreedyAligner,
                &self.catalog,
                self.configuration.fragment_tolerance,
            );
            top_hits
                .par_iter_mut()
                .zip(localization_spectra.par_iter())
                .try_for_each(|(hits, spectrum)| -> Result<(), Error> {
                    for hit in hits.iter_mut() {
                        let peptide = self.modifications.reconstruct(hit.sequence, hit.modification_index)?;
                        let adduct = self.precursor_adducts.get(hit.adduct_index)?;
                        let fragment_adducts = self.fragment_adducts.for_precursor(adduct);
                        engine.localize(hit, spectrum, &peptide, adduct, fragment_adducts);
                    }
                    Ok(())
                })?;
            localization_spectra
        } else {
            scoring_spectra
        };

        let identifications = self.identifications(&top_hits, spectra, &marker_spectra, proteins)?;
        Ok((identifications, diagnostics))
    }

    /// One identification per spectrum with at least one hit, ordered by spectrum index.
    fn identifications(
        &self,
        top_hits: &[Vec<AnnotatedHit<'_>>],
        spectra: &[Spectrum],
        marker_spectra: &[Spectrum],
        proteins: &[Protein],
    ) -> Result<Vec<Identification>, Error> {
        let marker_ions = marker_ion_table(&self.fragment_adduct_rules);
        let tolerance = self.configuration.marker_ions_tolerance;

        top_hits
            .par_iter()
            .enumerate()
            .filter(|(_, hits)| !hits.is_empty())
            .map(|(spectrum_idx, hits)| -> Result<Identification, Error> {
                let spectrum = &spectra[spectrum_idx];
                let precursor = spectrum.precursors.first();
                let hits = hits
                    .iter()
                    .enumerate()
                    .map(|(rank, hit)| self.identified_hit(rank + 1, hit, proteins))
                    .collect::<Result<Vec<IdentifiedHit>, Error>>()?;
                Ok(Identification {
                    spectrum_index: spectrum_idx,
                    native_id: spectrum.native_id.clone(),
                    rt: spectrum.rt,
                    precursor_mz: precursor.map_or(0.0, |precursor| precursor.mz),
                    charge: precursor.map_or(0, |precursor| precursor.charge),
                    marker_ions: marker_ion_intensities(&marker_spectra[spectrum_idx], &marker_ions, tolerance),
                    hits,
                })
            })
            .collect()
    }

    fn identified_hit(
        &self,
        rank: usize,
        hit: &AnnotatedHit<'_>,
        proteins: &[Protein],
    ) -> Result<IdentifiedHit, Error> {
        let peptide = self.modifications.reconstruct(hit.sequence, hit.modification_index)?;
        let adduct = self.precursor_adducts.get(hit.adduct_index)?;
        let accessions = proteins
            .iter()
            .filter(|protein| protein.sequence.contains(hit.sequence))
            .map(|protein| protein.accession.clone())
            .collect();
        let localization = hit.localization.as_ref();
        Ok(IdentifiedHit {
            rank,
            score: hit.score,
            peptide: peptide.to_string(),
            unmodified_sequence: hit.sequence.to_string(),
            accessions,
            adduct_composition: adduct.representative().to_string(),
            adduct_formula: adduct.formula.to_string(),
            adduct_mass: adduct.mass,
            best_localization_score: localization.map(|localization| localization.best_score),
            localization_scores: localization.map(|localization| localization.scores.clone()),
            best_localization: localization.map(|localization| localization.best_localization.clone()),
            fragment_annotation: hit.fragment_annotation.clone(),
        })
    }
}

/// Searches the spectra against the protein database.
///
/// # Arguments
/// * `spectra` - MS2 spectra
/// * `proteins` - Protein database
/// * `configuration` - Search configuration
///
pub fn run_search(
    spectra: &[Spectrum],
    proteins: &[Protein],
    configuration: &Configuration,
) -> Result<(Vec<Identification>, Diagnostics), Error> {
    SearchEngine::new(configuration.clone())?.run(spectra, proteins)
}
