use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::utils::compare_scores;

/// Outcome of the adduct site localization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Localization {
    /// Highest per-residue site score (>= 0)
    pub best_score: f64,
    /// Space separated per-residue scores (`100 * score`, `0` for non-positive ones)
    pub scores: String,
    /// Sequence with the best sites lower-cased
    pub best_localization: String,
}

/// Candidate explaining a spectrum. The modified peptide and the precursor adduct are
/// stored as indices and rebuilt on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedHit<'a> {
    /// Unmodified sequence, borrowed from the protein database
    pub sequence: &'a str,
    pub modification_index: usize,
    pub adduct_index: usize,
    pub score: f64,
    pub localization: Option<Localization>,
    pub fragment_annotation: String,
}

impl<'a> AnnotatedHit<'a> {
    pub fn new(sequence: &'a str, modification_index: usize, adduct_index: usize, score: f64) -> Self {
        Self {
            sequence,
            modification_index,
            adduct_index,
            score,
            localization: None,
            fragment_annotation: String::new(),
        }
    }

    /// Total order: score descending, then sequence, modification and adduct index ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        compare_scores(other.score, self.score)
            .then_with(|| self.sequence.cmp(other.sequence))
            .then_with(|| self.modification_index.cmp(&other.modification_index))
            .then_with(|| self.adduct_index.cmp(&other.adduct_index))
    }
}

/// Keeps the `n` best hits, sorted best first.
///
/// # Arguments
/// * `hits` - Hits of one spectrum
/// * `n` - Number of hits to keep
///
pub fn retain_top_n(hits: &mut Vec<AnnotatedHit<'_>>, n: usize) {
    if n == 0 {
        hits.clear();
        return;
    }
    if hits.len() > n {
        hits.select_nth_unstable_by(n - 1, AnnotatedHit::rank_cmp);
        hits.truncate(n);
    }
    hits.sort_by(AnnotatedHit::rank_cmp);
}

/// One mutex guarded hit list per spectrum.
#[derive(Debug)]
pub struct HitCollector<'a> {
    hits: Vec<Mutex<Vec<AnnotatedHit<'a>>>>,
}

impl<'a> HitCollector<'a> {
    pub fn new(spectrum_count: usize) -> Self {
        Self {
            hits: (0..spectrum_count).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// Appends a hit to the list of spectrum `spectrum_idx`.
    pub fn add(&self, spectrum_idx: usize, hit: AnnotatedHit<'a>) {
        if let Some(hits) = self.hits.get(spectrum_idx) {
            hits.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(hit);
        }
    }

    /// Top-`n` hits per spectrum, indexed like the spectra.
    pub fn into_top_hits(self, n: usize) -> Vec<Vec<AnnotatedHit<'a>>> {
        self.hits
            .into_par_iter()
            .map(|hits| {
                let mut hits = hits.into_inner().unwrap_or_else(PoisonError::into_inner);
                retain_top_n(&mut hits, n);
                hits
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retain_top_n() {
        let scores = [3.0, 7.0, 1.0, 5.0, 9.0];
        let mut hits: Vec<AnnotatedHit> = scores
            .iter()
            .enumerate()
            .map(|(idx, score)| AnnotatedHit::new("PEPTIDE", idx, 0, *score))
            .collect();
        retain_top_n(&mut hits, 3);
        assert_eq!(
            hits.iter().map(|hit| hit.score).collect::<Vec<f64>>(),
            vec![9.0, 7.0, 5.0]
        );

        let mut few = vec![AnnotatedHit::new("PEPTIDE", 0, 0, 1.0)];
        retain_top_n(&mut few, 3);
        assert_eq!(few.len(), 1);

        let mut none: Vec<AnnotatedHit> = Vec::new();
        retain_top_n(&mut none, 3);
        assert!(none.is_empty());
    }

    #[test]
    fn test_ties_are_deterministic() {
        let mut forward = vec![
            AnnotatedHit::new("KPEPTIDE", 0, 1, 2.0),
            AnnotatedHit::new("PEPTIDE", 1, 0, 2.0),
            AnnotatedHit::new("PEPTIDE", 0, 3, 2.0),
            AnnotatedHit::new("PEPTIDE", 0, 2, 2.0),
        ];
        let mut backward: Vec<AnnotatedHit> = forward.iter().rev().cloned().collect();
        retain_top_n(&mut forward, 2);
        retain_top_n(&mut backward, 2);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].sequence, "KPEPTIDE");
        assert_eq!(forward[1].adduct_index, 2);
    }

    #[test]
    fn test_nan_score_ranks_deterministically() {
        let hits = vec![
            AnnotatedHit::new("PEPTIDE", 0, 0, 2.0),
            AnnotatedHit::new("PEPTIDE", 1, 0, f64::NAN),
            AnnotatedHit::new("PEPTIDE", 2, 0, 5.0),
            AnnotatedHit::new("PEPTIDE", 3, 0, 1.0),
        ];
        let order = |mut hits: Vec<AnnotatedHit>| {
            retain_top_n(&mut hits, 3);
            hits.iter().map(|hit| hit.modification_index).collect::<Vec<usize>>()
        };
        let forward = order(hits.clone());
        let backward = order(hits.into_iter().rev().collect());
        assert_eq!(forward, backward);
        // NaN sorts above every number in the total order
        assert_eq!(forward, vec![1, 2, 0]);
    }

    #[test]
    fn test_collector() {
        let collector = HitCollector::new(2);
        (0..100).into_par_iter().for_each(|idx| {
            collector.add(idx % 2, AnnotatedHit::new("PEPTIDE", idx, 0, idx as f64));
        });
        collector.add(5, AnnotatedHit::new("PEPTIDE", 0, 0, 1.0));
        let top = collector.into_top_hits(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0][0].score, 98.0);
        assert_eq!(top[1][1].score, 97.0);
    }
}
