use std::cmp::Ordering;

use ndarray::Array1;
use rayon::prelude::*;
use tracing::debug;

use crate::configuration::{Configuration, PreprocessingConfiguration, Tolerance};
use crate::constants::C13C12_MASS_DIFF;
use crate::spectrum::Spectrum;
use crate::utils::proton_mass;

/// Groups isotope envelopes and reduces every envelope to its monoisotopic peak.
#[derive(Clone, Debug)]
pub struct Deisotoper {
    pub tolerance: Tolerance,
    pub min_charge: usize,
    pub max_charge: usize,
    /// Drop all peaks not assigned to an envelope
    pub keep_only_deisotoped: bool,
    pub min_isopeaks: usize,
    pub max_isopeaks: usize,
    /// Convert monoisotopic peaks to their singly charged m/z
    pub make_single_charged: bool,
    /// Store the charge of every peak (0 = unknown) in [`Spectrum::charges`]
    pub annotate_charge: bool,
}

impl Deisotoper {
    /// Deisotopes the spectrum in place. The spectrum needs to be sorted by position.
    ///
    /// # Arguments
    /// * `spectrum` - Spectrum sorted by m/z
    ///
    pub fn deisotope(&self, spectrum: &mut Spectrum) {
        let peaks = spectrum.len();
        // envelope id per peak
        let mut features: Vec<Option<usize>> = vec![None; peaks];
        // charge of monoisotopic peaks, 0 for all others
        let mut monoisotopic_charge = vec![0usize; peaks];
        let mut feature_number = 0;

        for seed in 0..peaks {
            let seed_mz = spectrum.mz[seed];
            for charge in (self.min_charge..=self.max_charge).rev() {
                if features[seed].is_some() {
                    break;
                }
                let mut extensions: Vec<usize> = Vec::with_capacity(self.max_isopeaks);
                let mut has_min_isopeaks = true;

                for isotope in 0..self.max_isopeaks {
                    let expected_mz = seed_mz + isotope as f64 * C13C12_MASS_DIFF / charge as f64;
                    let matching = spectrum.find_nearest(expected_mz).filter(|&found| {
                        let found_mz = spectrum.mz[found];
                        (found_mz - expected_mz).abs() <= self.tolerance.delta(found_mz)
                            && (found == seed || features[found].is_none())
                    });
                    let accepted = match matching {
                        // isotope intensities must decrease after the first isotope peak
                        Some(found) => match extensions.last() {
                            Some(&previous)
                                if spectrum.intensity[found] > spectrum.intensity[previous] =>
                            {
                                None
                            }
                            _ => Some(found),
                        },
                        None => None,
                    };
                    match accepted {
                        Some(found) => extensions.push(found),
                        None => {
                            has_min_isopeaks = isotope >= self.min_isopeaks;
                            break;
                        }
                    }
                }

                if has_min_isopeaks {
                    monoisotopic_charge[seed] = charge;
                    for extension in extensions {
                        features[extension] = Some(feature_number);
                    }
                    feature_number += 1;
                }
            }
        }

        let mut keep = Vec::with_capacity(peaks);
        let mut charges = Vec::with_capacity(peaks);
        for idx in 0..peaks {
            match (features[idx], monoisotopic_charge[idx]) {
                (None, _) if !self.keep_only_deisotoped => {
                    keep.push(idx);
                    charges.push(0);
                }
                (Some(_), charge) if charge > 0 => {
                    keep.push(idx);
                    charges.push(charge);
                }
                _ => {}
            }
        }

        spectrum.select(&keep);
        if self.make_single_charged {
            for (mz, charge) in spectrum.mz.iter_mut().zip(charges.iter()) {
                if *charge > 1 {
                    let z = *charge as f64;
                    *mz = *mz * z - (z - 1.0) * proton_mass();
                }
            }
        }
        if self.annotate_charge {
            spectrum.charges = Some(Array1::from(charges));
        }
        if self.make_single_charged {
            spectrum.sort_by_position();
        }
        debug!(
            "Deisotoped {}: {peaks} -> {} peaks, {feature_number} envelopes",
            spectrum.native_id,
            spectrum.len()
        );
    }
}

/// Removes all peaks with an intensity ≤ 0.
pub fn remove_zero_intensities(spectrum: &mut Spectrum) {
    let keep: Vec<usize> = spectrum
        .intensity
        .iter()
        .enumerate()
        .filter(|(_, intensity)| **intensity > 0.0)
        .map(|(idx, _)| idx)
        .collect();
    if keep.len() != spectrum.len() {
        spectrum.select(&keep);
    }
}

/// Scales intensities to a maximum of 1.
pub fn normalize_to_max(spectrum: &mut Spectrum) {
    let max = spectrum.intensity.iter().fold(0.0f64, |a, &b| a.max(b));
    if max > 0.0 {
        spectrum.intensity.mapv_inplace(|intensity| intensity / max);
    }
}

/// Indexes of the `n` most intense peaks among `candidates`, ties resolved by position.
fn most_intense(spectrum: &Spectrum, mut candidates: Vec<usize>, n: usize) -> Vec<usize> {
    candidates.sort_by(|a, b| {
        spectrum.intensity[*b]
            .partial_cmp(&spectrum.intensity[*a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(b))
    });
    candidates.truncate(n);
    candidates
}

/// Keeps the `peaks_per_window` most intense peaks in every jumping window of `window_size` Th,
/// starting at the first peak. The spectrum needs to be sorted by position.
///
/// # Arguments
/// * `spectrum` - Spectrum sorted by m/z
/// * `window_size` - Window width (Th)
/// * `peaks_per_window` - Peaks kept per window
///
pub fn window_mower(spectrum: &mut Spectrum, window_size: f64, peaks_per_window: usize) {
    let Some(&first_mz) = spectrum.mz.get(0) else {
        return;
    };
    let mut keep = Vec::with_capacity(spectrum.len());
    let mut window: Vec<usize> = Vec::new();
    let mut window_end = first_mz + window_size;
    for idx in 0..spectrum.len() {
        while spectrum.mz[idx] >= window_end {
            keep.extend(most_intense(spectrum, std::mem::take(&mut window), peaks_per_window));
            window_end += window_size;
        }
        window.push(idx);
    }
    keep.extend(most_intense(spectrum, window, peaks_per_window));
    keep.sort_unstable();
    spectrum.select(&keep);
}

/// Keeps the `n` most intense peaks. Changes the peak order.
pub fn n_largest(spectrum: &mut Spectrum, n: usize) {
    if spectrum.len() <= n {
        return;
    }
    let keep = most_intense(spectrum, (0..spectrum.len()).collect(), n);
    spectrum.select(&keep);
}

/// Noise filtering pipeline applied to every spectrum before scoring or localization.
#[derive(Clone, Debug)]
pub struct SpectrumPreprocessor {
    config: PreprocessingConfiguration,
    deisotoper: Deisotoper,
}

impl SpectrumPreprocessor {
    /// Creates a new preprocessor.
    ///
    /// # Arguments
    /// * `config` - Preprocessing configuration
    /// * `fragment_tolerance` - Tolerance for isotope peak matching
    /// * `make_single_charged` - Convert deisotoped peaks to charge 1
    /// * `annotate_charge` - Keep the charge of each peak
    ///
    pub fn new(
        config: &PreprocessingConfiguration,
        fragment_tolerance: Tolerance,
        make_single_charged: bool,
        annotate_charge: bool,
    ) -> Self {
        Self {
            config: config.clone(),
            deisotoper: Deisotoper {
                tolerance: fragment_tolerance,
                min_charge: config.min_isotope_charge,
                max_charge: config.max_isotope_charge,
                keep_only_deisotoped: false,
                min_isopeaks: config.min_isopeaks,
                max_isopeaks: config.max_isopeaks,
                make_single_charged,
                annotate_charge,
            },
        }
    }

    /// Preprocessing for the primary scoring: peaks converted to charge 1.
    pub fn for_scoring(config: &Configuration) -> Self {
        Self::new(&config.preprocessing, config.fragment_tolerance, true, false)
    }

    /// Preprocessing for localization: original m/z with charge annotation.
    pub fn for_localization(config: &Configuration) -> Self {
        Self::new(&config.preprocessing, config.fragment_tolerance, false, true)
    }

    pub fn process(&self, spectrum: &mut Spectrum) {
        remove_zero_intensities(spectrum);
        normalize_to_max(spectrum);
        spectrum.sort_by_position();
        self.deisotoper.deisotope(spectrum);
        window_mower(
            spectrum,
            self.config.window_size,
            self.config.peaks_per_window,
        );
        n_largest(spectrum, self.config.max_peaks);
        spectrum.sort_by_position();
    }

    /// Processes all spectra in parallel.
    pub fn process_all(&self, spectra: &mut [Spectrum]) {
        spectra
            .par_iter_mut()
            .for_each(|spectrum| self.process(spectrum));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deisotoper(make_single_charged: bool) -> Deisotoper {
        Deisotoper {
            tolerance: Tolerance::Ppm(10.0),
            min_charge: 1,
            max_charge: 3,
            keep_only_deisotoped: false,
            min_isopeaks: 3,
            max_isopeaks: 10,
            make_single_charged,
            annotate_charge: true,
        }
    }

    #[test]
    fn test_single_peak_is_unchanged() {
        let mut spectrum = Spectrum::new(vec![500.0], vec![1.0]).unwrap();
        deisotoper(true).deisotope(&mut spectrum);
        assert_eq!(spectrum.mz.to_vec(), vec![500.0]);
        assert_eq!(spectrum.charge_at(0), 0);
    }

    #[test]
    fn test_doubly_charged_envelope() {
        let m = 500.0;
        let spacing = C13C12_MASS_DIFF / 2.0;
        let mut spectrum =
            Spectrum::new(vec![m, m + spacing, m + 2.0 * spacing], vec![1.0, 0.6, 0.3]).unwrap();
        deisotoper(true).deisotope(&mut spectrum);
        assert_eq!(spectrum.len(), 1);
        assert!((spectrum.mz[0] - (2.0 * m - proton_mass())).abs() < 1e-9);
        assert_eq!(spectrum.charge_at(0), 2);

        let mut spectrum =
            Spectrum::new(vec![m, m + spacing, m + 2.0 * spacing], vec![1.0, 0.6, 0.3]).unwrap();
        deisotoper(false).deisotope(&mut spectrum);
        assert_eq!(spectrum.mz.to_vec(), vec![m]);
        assert_eq!(spectrum.charge_at(0), 2);
    }

    #[test]
    fn test_rising_intensity_rejects_envelope() {
        let m = 500.0;
        let spacing = C13C12_MASS_DIFF;
        let mut spectrum =
            Spectrum::new(vec![m, m + spacing, m + 2.0 * spacing], vec![0.5, 0.4, 1.0]).unwrap();
        deisotoper(true).deisotope(&mut spectrum);
        assert_eq!(spectrum.len(), 3);
        assert!((0..3).all(|idx| spectrum.charge_at(idx) == 0));
    }

    #[test]
    fn test_keep_only_deisotoped() {
        let spacing = C13C12_MASS_DIFF;
        let mut spectrum = Spectrum::new(
            vec![200.0, 500.0, 500.0 + spacing, 500.0 + 2.0 * spacing],
            vec![1.0, 1.0, 0.5, 0.2],
        )
        .unwrap();
        let deisotoper = Deisotoper {
            keep_only_deisotoped: true,
            ..deisotoper(true)
        };
        deisotoper.deisotope(&mut spectrum);
        assert_eq!(spectrum.mz.to_vec(), vec![500.0]);
        assert_eq!(spectrum.charge_at(0), 1);
    }

    #[test]
    fn test_window_mower() {
        let mut spectrum = Spectrum::new(
            vec![100.0, 120.0, 150.0, 199.0, 210.0, 250.0],
            vec![0.1, 0.5, 0.3, 0.4, 0.2, 0.1],
        )
        .unwrap();
        window_mower(&mut spectrum, 100.0, 2);
        assert_eq!(spectrum.mz.to_vec(), vec![120.0, 199.0, 210.0, 250.0]);
    }

    #[test]
    fn test_n_largest() {
        let mut spectrum =
            Spectrum::new(vec![100.0, 200.0, 300.0], vec![0.5, 0.1, 1.0]).unwrap();
        n_largest(&mut spectrum, 2);
        spectrum.sort_by_position();
        assert_eq!(spectrum.mz.to_vec(), vec![100.0, 300.0]);
    }

    #[test]
    fn test_pipeline() {
        let mut spectra = vec![Spectrum::new(
            vec![300.0, 100.0, 200.0, 250.0],
            vec![10.0, 0.0, 5.0, 20.0],
        )
        .unwrap()];
        let preprocessor = SpectrumPreprocessor::for_scoring(&Configuration::default());
        preprocessor.process_all(&mut spectra);
        assert_eq!(spectra[0].mz.to_vec(), vec![200.0, 250.0, 300.0]);
        assert_eq!(spectra[0].intensity.to_vec(), vec![0.25, 1.0, 0.5]);
        assert!(spectra[0].charges.is_none());
    }
}
