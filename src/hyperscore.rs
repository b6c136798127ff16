use crate::configuration::Tolerance;
use crate::spectrum::Spectrum;
use crate::theoretical::{IonKind, TheoreticalPeak};
use crate::utils::ln_factorial;

/// Summed matched intensity at or below this value scores 0.
const MIN_MATCHED_INTENSITY: f64 = 0.1;

/// Scores a candidate against an experimental spectrum.
pub trait PrimaryScoringFunction {
    /// # Arguments
    /// * `experimental` - Preprocessed experimental spectrum, sorted by position
    /// * `theoretical` - Complete-loss theoretical spectrum
    /// * `tolerance` - Fragment tolerance
    ///
    fn score(
        &self,
        experimental: &Spectrum,
        theoretical: &[TheoreticalPeak],
        tolerance: Tolerance,
    ) -> f64;
}

/// X!Tandem style hyperscore: `ln(Σ matched intensity) + ln(#b!) + ln(#y!)`.
/// Each theoretical peak is matched to its nearest experimental peak.
#[derive(Clone, Copy, Debug, Default)]
pub struct HyperScore;

impl PrimaryScoringFunction for HyperScore {
    fn score(
        &self,
        experimental: &Spectrum,
        theoretical: &[TheoreticalPeak],
        tolerance: Tolerance,
    ) -> f64 {
        let mut dot_product = 0.0;
        let mut y_ion_count = 0;
        let mut b_ion_count = 0;

        for peak in theoretical {
            let Some(nearest) = experimental.find_nearest(peak.mz) else {
                break;
            };
            if !tolerance.contains(peak.mz, experimental.mz[nearest]) {
                continue;
            }
            dot_product += experimental.intensity[nearest];
            if peak.annotation.kind == IonKind::Y {
                y_ion_count += 1;
            } else {
                b_ion_count += 1;
            }
        }

        if dot_product <= MIN_MATCHED_INTENSITY {
            return 0.0;
        }
        dot_product.ln() + ln_factorial(b_ion_count) + ln_factorial(y_ion_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peptide::ModifiedPeptide;
    use crate::theoretical::{complete_loss_spectrum, FragmentIonGenerator};

    #[test]
    fn test_hyperscore() {
        let peptide = ModifiedPeptide::from_sequence("PEPTIDEK").unwrap();
        let theoretical = complete_loss_spectrum(&FragmentIonGenerator, &peptide, 1);
        let mzs: Vec<f64> = theoretical.iter().take(4).map(|peak| peak.mz).collect();
        let experimental = Spectrum::new(mzs, vec![0.5; 4]).unwrap();
        let b = theoretical[..4]
            .iter()
            .filter(|peak| peak.annotation.kind == IonKind::B)
            .count();
        let expected = 2f64.ln() + ln_factorial(b) + ln_factorial(4 - b);
        let score = HyperScore.score(&experimental, &theoretical, Tolerance::Ppm(10.0));
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_low_intensity_scores_zero() {
        let peptide = ModifiedPeptide::from_sequence("AK").unwrap();
        let theoretical = complete_loss_spectrum(&FragmentIonGenerator, &peptide, 1);
        let mzs: Vec<f64> = theoretical.iter().map(|peak| peak.mz).collect();
        let experimental = Spectrum::new(mzs, vec![0.05, 0.05]).unwrap();
        assert_eq!(
            HyperScore.score(&experimental, &theoretical, Tolerance::Ppm(10.0)),
            0.0
        );
        let empty = Spectrum::new(vec![], vec![]).unwrap();
        assert_eq!(
            HyperScore.score(&empty, &theoretical, Tolerance::Ppm(10.0)),
            0.0
        );
    }
}
