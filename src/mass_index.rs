use serde::Serialize;
use tracing::info;

use crate::configuration::{Configuration, Tolerance};
use crate::constants::{FRACTIONAL_MASS_CUTOFF, FRACTIONAL_MASS_FILTER_MAX_MASS};
use crate::spectrum::Spectrum;
use crate::utils::mass_to_charge_to_dalton;

/// Number of spectra excluded from the index, per exclusion rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MassIndexStatistics {
    pub indexed: usize,
    /// No or more than one precursor
    pub precursor_count: usize,
    pub too_few_peaks: usize,
    pub charge_out_of_range: usize,
    pub fractional_mass: usize,
    pub small_peptide_mass: usize,
}

/// Precursor neutral masses of all searchable spectra, sorted ascending.
/// Built once before scoring and never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct CandidateMassIndex {
    entries: Vec<(f64, usize)>,
}

impl CandidateMassIndex {
    /// Indexes all spectra passing the precursor filters.
    ///
    /// # Arguments
    /// * `spectra` - Preprocessed spectra
    /// * `config` - Search configuration
    ///
    pub fn build(spectra: &[Spectrum], config: &Configuration) -> (Self, MassIndexStatistics) {
        let mut statistics = MassIndexStatistics::default();
        let mut entries = Vec::with_capacity(spectra.len());

        for (spectrum_idx, spectrum) in spectra.iter().enumerate() {
            let precursor = match spectrum.precursors.as_slice() {
                [precursor] => precursor,
                _ => {
                    statistics.precursor_count += 1;
                    continue;
                }
            };
            if spectrum.len() < config.min_peptide_length {
                statistics.too_few_peaks += 1;
                continue;
            }
            if precursor.charge < config.min_precursor_charge
                || precursor.charge > config.max_precursor_charge
            {
                statistics.charge_out_of_range += 1;
                continue;
            }

            let mass = mass_to_charge_to_dalton(precursor.mz, precursor.charge);
            if config.filter_fractional_mass
                && mass < FRACTIONAL_MASS_FILTER_MAX_MASS
                && mass - mass.floor() < FRACTIONAL_MASS_CUTOFF
            {
                statistics.fractional_mass += 1;
                continue;
            }
            if mass < config.small_peptide_mass_filter {
                statistics.small_peptide_mass += 1;
                continue;
            }
            entries.push((mass, spectrum_idx));
        }

        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        statistics.indexed = entries.len();
        info!(
            "Indexed {} of {} spectra ({:?})",
            entries.len(),
            spectra.len(),
            statistics
        );
        (Self { entries }, statistics)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexes of all spectra whose precursor mass lies within the tolerance window of `mass`.
    /// The window is inclusive on both ends.
    ///
    /// # Arguments
    /// * `mass` - Theoretical neutral mass
    /// * `tolerance` - Precursor tolerance
    ///
    pub fn query(&self, mass: f64, tolerance: Tolerance) -> impl Iterator<Item = usize> + '_ {
        let (lower, upper) = tolerance.bounds(mass);
        let start = self.entries.partition_point(|(indexed, _)| *indexed < lower);
        let end = self.entries.partition_point(|(indexed, _)| *indexed <= upper);
        self.entries[start..end.max(start)]
            .iter()
            .map(|(_, spectrum_idx)| *spectrum_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::proton_mass;

    fn spectrum_with_precursor(mz: f64, charge: usize) -> Spectrum {
        Spectrum::new(vec![100.0; 10], vec![1.0; 10])
            .unwrap()
            .with_precursor(mz, charge)
    }

    #[test]
    fn test_ppm_round_trip() {
        let config = Configuration::default();
        let mass = 1500.75;
        let mz = (mass + 2.0 * proton_mass()) / 2.0;
        let spectra = vec![spectrum_with_precursor(mz, 2)];
        let (index, statistics) = CandidateMassIndex::build(&spectra, &config);
        assert_eq!(statistics.indexed, 1);

        let tolerance = Tolerance::Ppm(10.0);
        assert_eq!(index.query(mass, tolerance).collect::<Vec<_>>(), vec![0]);
        // 9.9 ppm off
        assert_eq!(index.query(mass * (1.0 + 9.9e-6), tolerance).count(), 1);
        assert_eq!(index.query(mass * (1.0 - 9.9e-6), tolerance).count(), 1);
        // 10.1 ppm off
        assert_eq!(index.query(mass * (1.0 + 10.1e-6), tolerance).count(), 0);
        assert_eq!(index.query(mass * (1.0 - 10.1e-6), tolerance).count(), 0);
    }

    #[test]
    fn test_filters() {
        let config = Configuration {
            filter_fractional_mass: true,
            ..Default::default()
        };
        let mz_for = |mass: f64, charge: usize| (mass + charge as f64 * proton_mass()) / charge as f64;
        let spectra = vec![
            spectrum_with_precursor(mz_for(1500.5, 2), 2),
            // no precursor
            Spectrum::new(vec![100.0; 10], vec![1.0; 10]).unwrap(),
            // two precursors
            spectrum_with_precursor(500.0, 2).with_precursor(600.0, 3),
            // too few peaks
            Spectrum::new(vec![100.0], vec![1.0]).unwrap().with_precursor(700.0, 2),
            spectrum_with_precursor(mz_for(1500.5, 1), 1),
            spectrum_with_precursor(mz_for(1500.5, 6), 6),
            // fractional mass
            spectrum_with_precursor(mz_for(1500.1, 2), 2),
            // small
            spectrum_with_precursor(mz_for(550.5, 2), 2),
            spectrum_with_precursor(mz_for(1000.5, 3), 3),
        ];
        let (index, statistics) = CandidateMassIndex::build(&spectra, &config);
        assert_eq!(
            statistics,
            MassIndexStatistics {
                indexed: 2,
                precursor_count: 2,
                too_few_peaks: 1,
                charge_out_of_range: 2,
                fractional_mass: 1,
                small_peptide_mass: 1,
            }
        );
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.query(1250.0, Tolerance::Da(300.0)).collect::<Vec<_>>(),
            vec![8, 0]
        );
        assert_eq!(index.query(2000.0, Tolerance::Da(1.0)).count(), 0);
    }

    #[test]
    fn test_dalton_window_is_inclusive() {
        let config = Configuration::default();
        let mz_for = |mass: f64| (mass + 2.0 * proton_mass()) / 2.0;
        let spectra = vec![
            spectrum_with_precursor(mz_for(1501.0), 2),
            spectrum_with_precursor(mz_for(1501.0 + 1e-6), 2),
        ];
        let (index, _) = CandidateMassIndex::build(&spectra, &config);
        assert_eq!(index.len(), 2);
        let edge = index.entries[0].0;
        assert!(index.entries[1].0 > edge);

        // upper bound lands exactly on the first spectrum, the second is just above it
        let tolerance = Tolerance::Da(0.5);
        assert_eq!(tolerance.bounds(edge - 0.5).1, edge);
        assert_eq!(index.query(edge - 0.5, tolerance).collect::<Vec<_>>(), vec![0]);
        // lower bound lands exactly on the first spectrum
        assert_eq!(tolerance.bounds(edge + 0.5).0, edge);
        assert_eq!(index.query(edge + 0.5, tolerance).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            index.query(index.entries[1].0 + 0.5, tolerance).collect::<Vec<_>>(),
            vec![1]
        );
    }
}
