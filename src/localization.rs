use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use tracing::debug;

use crate::adduct::{AdductDefinition, PrecursorAdductCombination};
use crate::alignment::SpectrumAligner;
use crate::configuration::Tolerance;
use crate::constants::NUCLEOTIDE_MARKER_IONS;
use crate::formula::{parse_formula, FormulaExt};
use crate::hit::{AnnotatedHit, Localization};
use crate::modification::{terminal_modification_id, ModificationCatalog, Terminus};
use crate::peptide::ModifiedPeptide;
use crate::spectrum::Spectrum;
use crate::theoretical::{sort_by_mz, IonKind, TheoreticalPeak, TheoreticalSpectrumBuilder};
use crate::utils::proton_mass;

/// Weight of ion evidence contradicting an adduct at the scored residue
const CONTRADICTION_WEIGHT: f64 = 2.0;

/// Residues scoring within this distance of the best score are reported as best sites
const BEST_SITE_EPSILON: f64 = 1e-6;

/// Immonium ions in priority order: (residues, label, formula or m/z)
const IMMONIUM_IONS: [(&[u8], u8, ImmoniumMass); 9] = [
    (b"Y", b'Y', ImmoniumMass::Formula("C8H10NO")),
    (b"W", b'W', ImmoniumMass::Formula("C10H11N2")),
    (b"F", b'F', ImmoniumMass::Formula("C8H10N")),
    (b"H", b'H', ImmoniumMass::Formula("C5H8N3")),
    (b"C", b'C', ImmoniumMass::Formula("C2H6NS")),
    (b"P", b'P', ImmoniumMass::Formula("C4H8N")),
    (b"LI", b'L', ImmoniumMass::Formula("C5H12N")),
    (b"K", b'K', ImmoniumMass::MassToCharge(101.10732)),
    (b"M", b'M', ImmoniumMass::MassToCharge(104.05285)),
];

#[derive(Clone, Copy, Debug)]
enum ImmoniumMass {
    Formula(&'static str),
    MassToCharge(f64),
}

/// (residues, label, m/z) of the immonium ions
fn immonium_ions() -> &'static [(&'static [u8], u8, f64)] {
    static IONS: OnceLock<Vec<(&'static [u8], u8, f64)>> = OnceLock::new();
    IONS.get_or_init(|| {
        IMMONIUM_IONS
            .iter()
            .filter_map(|(residues, label, mass)| {
                let mz = match mass {
                    ImmoniumMass::Formula(formula) => parse_formula(formula).ok()?.dalton(),
                    ImmoniumMass::MassToCharge(mz) => *mz,
                };
                Some((*residues, *label, mz))
            })
            .collect()
    })
}

/// One matched experimental peak of an a/b/y ion.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentAnnotationDetail {
    /// Fragment adduct name, `None` for unshifted ions
    pub shift: Option<String>,
    pub charge: usize,
    pub mz: f64,
    pub intensity: f64,
}

/// Formats a matched peak as `(mz,intensity in %,"label")`.
fn annotation_entry(mz: f64, intensity: f64, label: &str) -> String {
    format!("({mz:.3},{:.1},\"{label}\")", 100.0 * intensity)
}

/// Matched a/b/y ions by ion number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IonSeriesEvidence {
    pub b: BTreeMap<usize, Vec<FragmentAnnotationDetail>>,
    pub y: BTreeMap<usize, Vec<FragmentAnnotationDetail>>,
    pub a: BTreeMap<usize, Vec<FragmentAnnotationDetail>>,
}

impl IonSeriesEvidence {
    fn record(&mut self, kind: IonKind, number: usize, detail: FragmentAnnotationDetail) {
        let series = match kind {
            IonKind::B => &mut self.b,
            IonKind::Y => &mut self.y,
            IonKind::A => &mut self.a,
            _ => return,
        };
        series.entry(number).or_default().push(detail);
    }

    /// Annotation strings of the b, y and a series (empty if nothing matched).
    fn annotation_groups(&self) -> [String; 3] {
        [
            series_annotation('b', &self.b),
            series_annotation('y', &self.y),
            series_annotation('a', &self.a),
        ]
    }
}

/// `[b3]+` for unshifted and `[y3+U-H2O]++` for shifted ions.
fn series_annotation(ion_type: char, series: &BTreeMap<usize, Vec<FragmentAnnotationDetail>>) -> String {
    series
        .iter()
        .flat_map(|(number, details)| {
            details.iter().map(move |detail| {
                let charge = "+".repeat(detail.charge);
                let label = match &detail.shift {
                    Some(shift) => format!("[{ion_type}{number}+{shift}]{charge}"),
                    None => format!("[{ion_type}{number}]{charge}"),
                };
                annotation_entry(detail.mz, detail.intensity, &label)
            })
        })
        .collect::<Vec<String>>()
        .join("|")
}

fn grouped_annotation<K, V>(groups: &BTreeMap<K, BTreeMap<String, V>>) -> String {
    groups
        .values()
        .flat_map(|entries| entries.keys().cloned())
        .collect::<Vec<String>>()
        .join("|")
}

/// Everything the alignments of one hit explained, bucketed by ion type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentEvidence {
    pub unshifted: IonSeriesEvidence,
    pub shifted: IonSeriesEvidence,
    /// Shifted immonium ions by residue letter: annotation entry -> intensity
    pub immonium: BTreeMap<u8, BTreeMap<String, f64>>,
    /// Marker ions by label: annotation entry -> intensity
    pub markers: BTreeMap<String, BTreeMap<String, f64>>,
    /// Precursor ions (shifted and unshifted) by label: annotation entry -> intensity
    pub precursors: BTreeMap<String, BTreeMap<String, f64>>,
}

impl FragmentEvidence {
    /// Pipe joined annotation of the unshifted ions only.
    pub fn unshifted_annotation(&self) -> String {
        join_non_empty(self.unshifted.annotation_groups())
    }

    /// Pipe joined annotation: unshifted b, y, a, shifted b, y, a, immonium, marker and
    /// precursor ions.
    pub fn annotation(&self) -> String {
        let [unshifted_b, unshifted_y, unshifted_a] = self.unshifted.annotation_groups();
        let [shifted_b, shifted_y, shifted_a] = self.shifted.annotation_groups();
        join_non_empty([
            unshifted_b,
            unshifted_y,
            unshifted_a,
            shifted_b,
            shifted_y,
            shifted_a,
            grouped_annotation(&self.immonium),
            grouped_annotation(&self.markers),
            grouped_annotation(&self.precursors),
        ])
    }
}

fn join_non_empty<I: IntoIterator<Item = String>>(groups: I) -> String {
    groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .collect::<Vec<String>>()
        .join("|")
}

/// Additive adduct site score per residue.
///
/// Shifted a/b-ion `k` covers the residues `0..k`, shifted y-ion `k` the residues `L-k..L`.
/// An ion covering residue `i` supports `i` with `(1 - d) * intensity`, one not covering it
/// contradicts `i` with twice that weight, `d` being the relative distance between `i` and
/// the ion's last (a/b) or first (y) residue. Shifted immonium ions support every residue of
/// their type with their summed intensity.
///
/// # Arguments
/// * `sequence` - Unmodified peptide sequence
/// * `evidence` - Matched peaks of the hit
///
pub fn site_scores(sequence: &str, evidence: &FragmentEvidence) -> Vec<f64> {
    let residues = sequence.as_bytes();
    let length = residues.len();
    let span = length.saturating_sub(1).max(1) as f64;
    let weight = |position: usize, site: usize, intensity: f64, contradicts: bool| {
        let distance = position.abs_diff(site) as f64 / span;
        if contradicts {
            -CONTRADICTION_WEIGHT * (1.0 - distance) * intensity
        } else {
            (1.0 - distance) * intensity
        }
    };

    (0..length)
        .map(|site| {
            let mut score = 0.0;
            for (number, details) in evidence.shifted.b.iter().chain(evidence.shifted.a.iter()) {
                let Some(position) = number.checked_sub(1) else {
                    continue;
                };
                for detail in details {
                    score += weight(position, site, detail.intensity, position < site);
                }
            }
            for (number, details) in &evidence.shifted.y {
                let Some(position) = length.checked_sub(*number) else {
                    continue;
                };
                for detail in details {
                    score += weight(position, site, detail.intensity, position > site);
                }
            }
            if let Some(immonium) = evidence.immonium.get(&residues[site]) {
                score += immonium.values().sum::<f64>();
            }
            score
        })
        .collect()
}

/// Renders the site scores: best score (floored at 0), the per-residue score string and the
/// sequence with the best sites lower-cased.
pub fn render_localization(sequence: &str, scores: &[f64]) -> Localization {
    let best_score = scores.iter().copied().fold(0.0, f64::max);
    let rendered_scores = scores
        .iter()
        .map(|score| {
            if *score > 0.0 {
                format!("{:.2}", 100.0 * score)
            } else {
                "0".to_string()
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    let best_localization = sequence
        .chars()
        .zip(scores.iter())
        .map(|(residue, score)| {
            if best_score > 0.0 && *score >= best_score - BEST_SITE_EPSILON {
                residue.to_ascii_lowercase()
            } else {
                residue
            }
        })
        .collect();
    Localization {
        best_score,
        scores: rendered_scores,
        best_localization,
    }
}

/// Partial loss based adduct site localization.
pub struct LocalizationEngine<'c, B, A, C: ?Sized> {
    builder: B,
    aligner: A,
    catalog: &'c C,
    tolerance: Tolerance,
}

impl<'c, B, A, C> LocalizationEngine<'c, B, A, C>
where
    B: TheoreticalSpectrumBuilder,
    A: SpectrumAligner,
    C: ModificationCatalog + ?Sized,
{
    /// Creates a new localization engine.
    ///
    /// # Arguments
    /// * `builder` - Theoretical spectrum builder
    /// * `aligner` - Spectrum aligner
    /// * `catalog` - Modification catalog holding the fragment adducts as N-terminal modifications
    /// * `tolerance` - Fragment tolerance
    ///
    pub fn new(builder: B, aligner: A, catalog: &'c C, tolerance: Tolerance) -> Self {
        Self {
            builder,
            aligner,
            catalog,
            tolerance,
        }
    }

    /// a-, b-, y- and precursor ions of the peptide without adduct, sorted by m/z.
    pub fn total_loss_spectrum(&self, peptide: &ModifiedPeptide, precursor_charge: usize) -> Vec<TheoreticalPeak> {
        let mut peaks = Vec::new();
        for charge in 1..=precursor_charge {
            for kind in [IonKind::A, IonKind::B, IonKind::Y] {
                peaks.extend(self.builder.ion_series(peptide, kind, charge));
            }
            peaks.extend(self.builder.precursor_peaks(peptide, charge));
        }
        sort_by_mz(&mut peaks);
        peaks
    }

    /// Mass of the fragment adduct as registered in the catalog.
    fn shift_mass(&self, adduct: &AdductDefinition) -> f64 {
        self.catalog
            .lookup(&terminal_modification_id(&adduct.name, Terminus::NTerm))
            .map_or(adduct.mass, |modification| modification.mass)
    }

    /// Nucleotide marker ions, free fragment adducts, shifted immonium ions and ion series
    /// carrying a fragment adduct, sorted by m/z.
    ///
    /// # Arguments
    /// * `peptide` - Modified peptide
    /// * `precursor_charge` - Highest fragment charge
    /// * `composition` - Precursor adduct composition gating the nucleotide marker ions
    /// * `fragment_adducts` - Feasible fragment adducts of the precursor adduct
    ///
    pub fn partial_loss_spectrum(
        &self,
        peptide: &ModifiedPeptide,
        precursor_charge: usize,
        composition: &str,
        fragment_adducts: &[AdductDefinition],
    ) -> Vec<TheoreticalPeak> {
        let mut peaks: Vec<TheoreticalPeak> = NUCLEOTIDE_MARKER_IONS
            .iter()
            .filter(|(nucleotide, _, _)| composition.contains(*nucleotide))
            .map(|(_, mz, label)| TheoreticalPeak::single_charged(*mz, IonKind::Marker, label))
            .collect();

        let immonium = immonium_ions()
            .iter()
            .find(|(residues, _, _)| residues.iter().any(|residue| peptide.contains_residue(*residue)));

        for adduct in fragment_adducts {
            peaks.push(TheoreticalPeak::single_charged(
                adduct.mass + proton_mass(),
                IonKind::Marker,
                &adduct.name,
            ));
            if let Some((_, label, mz)) = immonium {
                peaks.push(TheoreticalPeak::single_charged(
                    mz + adduct.mass,
                    IonKind::Immonium(*label),
                    &adduct.name,
                ));
            }

            let shift = self.shift_mass(adduct);
            for charge in 1..=precursor_charge {
                for kind in [IonKind::A, IonKind::B, IonKind::Y] {
                    peaks.extend(
                        self.builder
                            .ion_series(peptide, kind, charge)
                            .iter()
                            .map(|peak| peak.shifted(shift, &adduct.name)),
                    );
                }
                peaks.extend(
                    self.builder
                        .precursor_peaks(peptide, charge)
                        .iter()
                        .map(|peak| peak.shifted(shift, &adduct.name)),
                );
            }
        }
        sort_by_mz(&mut peaks);
        peaks
    }

    /// Annotates the hit and scores every residue as adduct site. Without any partial loss
    /// match the hit only gets the annotation of the unshifted ions.
    ///
    /// # Arguments
    /// * `hit` - Hit to localize
    /// * `spectrum` - Experimental spectrum with per-peak charge annotation
    /// * `peptide` - Modified peptide of the hit
    /// * `precursor_adduct` - Precursor adduct of the hit
    /// * `fragment_adducts` - Feasible fragment adducts of the precursor adduct
    ///
    pub fn localize(
        &self,
        hit: &mut AnnotatedHit<'_>,
        spectrum: &Spectrum,
        peptide: &ModifiedPeptide,
        precursor_adduct: &PrecursorAdductCombination,
        fragment_adducts: &[AdductDefinition],
    ) {
        let precursor_charge = spectrum
            .precursors
            .first()
            .map_or(1, |precursor| precursor.charge.max(1));
        let mut evidence = FragmentEvidence::default();
        let mut explained = HashSet::new();

        let total_loss = self.total_loss_spectrum(peptide, precursor_charge);
        for (theoretical_idx, experimental_idx) in self.aligner.align(&total_loss, spectrum, self.tolerance) {
            explained.insert(experimental_idx);
            let annotation = &total_loss[theoretical_idx].annotation;
            let mz = spectrum.mz[experimental_idx];
            let intensity = spectrum.intensity[experimental_idx];
            let peak_charge = spectrum.charge_at(experimental_idx);
            match annotation.kind {
                IonKind::Precursor => {
                    let label = annotation.to_string();
                    evidence
                        .precursors
                        .entry(label.clone())
                        .or_default()
                        .insert(annotation_entry(mz, intensity, &label), intensity);
                }
                kind if peak_charge == 0 || peak_charge == annotation.charge => {
                    evidence.unshifted.record(
                        kind,
                        annotation.number,
                        FragmentAnnotationDetail {
                            shift: None,
                            charge: annotation.charge,
                            mz,
                            intensity,
                        },
                    );
                }
                _ => {}
            }
        }

        let partial_loss = self.partial_loss_spectrum(
            peptide,
            precursor_charge,
            precursor_adduct.representative(),
            fragment_adducts,
        );
        let alignment = self.aligner.align(&partial_loss, spectrum, self.tolerance);
        if alignment.is_empty() {
            hit.localization = None;
            hit.fragment_annotation = evidence.unshifted_annotation();
            return;
        }

        for (theoretical_idx, experimental_idx) in alignment {
            if explained.contains(&experimental_idx) {
                continue;
            }
            let annotation = &partial_loss[theoretical_idx].annotation;
            let mz = spectrum.mz[experimental_idx];
            let intensity = spectrum.intensity[experimental_idx];
            let peak_charge = spectrum.charge_at(experimental_idx);
            let label = annotation.to_string();
            match annotation.kind {
                IonKind::A | IonKind::B | IonKind::Y => {
                    if peak_charge == 0 || peak_charge == annotation.charge {
                        evidence.shifted.record(
                            annotation.kind,
                            annotation.number,
                            FragmentAnnotationDetail {
                                shift: annotation.adduct.clone(),
                                charge: annotation.charge,
                                mz,
                                intensity,
                            },
                        );
                    }
                }
                IonKind::Immonium(residue) => {
                    if peak_charge <= 1 {
                        evidence
                            .immonium
                            .entry(residue)
                            .or_default()
                            .insert(annotation_entry(mz, intensity, &label), intensity);
                    }
                }
                IonKind::Marker => {
                    if peak_charge <= 1 {
                        evidence
                            .markers
                            .entry(label.clone())
                            .or_default()
                            .insert(annotation_entry(mz, intensity, &label), intensity);
                    }
                }
                IonKind::Precursor => {
                    evidence
                        .precursors
                        .entry(label.clone())
                        .or_default()
                        .insert(annotation_entry(mz, intensity, &label), intensity);
                }
            }
        }

        let scores = site_scores(hit.sequence, &evidence);
        let localization = render_localization(hit.sequence, &scores);
        debug!(
            "Localization of {} ({}): {} [{}]",
            peptide,
            precursor_adduct.composition_text(),
            localization.best_localization,
            localization.scores
        );
        hit.localization = Some(localization);
        hit.fragment_annotation = evidence.annotation();
    }
}
