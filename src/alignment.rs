use crate::configuration::Tolerance;
use crate::spectrum::Spectrum;
use crate::theoretical::TheoreticalPeak;

/// Matches theoretical against experimental peaks.
pub trait SpectrumAligner {
    /// One-to-one pairs `(theoretical index, experimental index)` ordered by theoretical index.
    ///
    /// # Arguments
    /// * `theoretical` - Theoretical peaks
    /// * `experimental` - Experimental spectrum, sorted by position
    /// * `tolerance` - Fragment tolerance, ppm relative to the theoretical m/z
    ///
    fn align(
        &self,
        theoretical: &[TheoreticalPeak],
        experimental: &Spectrum,
        tolerance: Tolerance,
    ) -> Vec<(usize, usize)>;
}

/// Accepts candidate pairs with the smallest m/z error first, every peak is used at most once.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyAligner;

impl SpectrumAligner for GreedyAligner {
    fn align(
        &self,
        theoretical: &[TheoreticalPeak],
        experimental: &Spectrum,
        tolerance: Tolerance,
    ) -> Vec<(usize, usize)> {
        if theoretical.is_empty() || experimental.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for (theoretical_idx, peak) in theoretical.iter().enumerate() {
            let (lower, upper) = tolerance.bounds(peak.mz);
            for experimental_idx in experimental.peaks_within(lower, upper) {
                let error = (experimental.mz[experimental_idx] - peak.mz).abs();
                candidates.push((error, theoretical_idx, experimental_idx));
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut theoretical_used = vec![false; theoretical.len()];
        let mut experimental_used = vec![false; experimental.len()];
        let mut pairs = Vec::new();
        for (_, theoretical_idx, experimental_idx) in candidates {
            if theoretical_used[theoretical_idx] || experimental_used[experimental_idx] {
                continue;
            }
            theoretical_used[theoretical_idx] = true;
            experimental_used[experimental_idx] = true;
            pairs.push((theoretical_idx, experimental_idx));
        }
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theoretical::IonKind;

    fn theoretical(mzs: &[f64]) -> Vec<TheoreticalPeak> {
        mzs.iter()
            .enumerate()
            .map(|(idx, mz)| TheoreticalPeak::new(*mz, IonKind::B, idx + 1, 1))
            .collect()
    }

    #[test]
    fn test_one_to_one() {
        let experimental = Spectrum::new(vec![100.0, 100.02, 300.0], vec![1.0; 3]).unwrap();
        let peaks = theoretical(&[100.01, 100.025, 200.0]);
        let pairs = GreedyAligner.align(&peaks, &experimental, Tolerance::Da(0.05));
        // 100.025 <-> 100.02 is the closest pair, 100.01 takes the remaining 100.0
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_ppm_window() {
        let experimental = Spectrum::new(vec![1000.0], vec![1.0]).unwrap();
        assert_eq!(
            GreedyAligner
                .align(&theoretical(&[1000.0099]), &experimental, Tolerance::Ppm(10.0))
                .len(),
            1
        );
        assert!(GreedyAligner
            .align(&theoretical(&[1000.0101]), &experimental, Tolerance::Ppm(10.0))
            .is_empty());
        assert!(GreedyAligner
            .align(&[], &experimental, Tolerance::Ppm(10.0))
            .is_empty());
    }
}
