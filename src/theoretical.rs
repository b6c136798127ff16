use std::fmt;

use rustyms::fragment::FragmentType;
use rustyms::model::{ChargePoint, ChargeRange, FragmentationModel, PrimaryIonSeries};
use rustyms::system::{e, usize::Charge};
use rustyms::{Fragment, MassMode};

use crate::constants::MARKER_ION_PREFIX;
use crate::peptide::ModifiedPeptide;
use crate::utils::compare_scores;

/// Ion types generated for scoring and localization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IonKind {
    A,
    B,
    Y,
    Precursor,
    /// Immonium ion of the given residue
    Immonium(u8),
    /// Nucleotide marker ion or free fragment adduct
    Marker,
}

/// Tag of a theoretical peak.
#[derive(Clone, Debug, PartialEq)]
pub struct IonAnnotation {
    pub kind: IonKind,
    /// Ion number for a/b/y ions, peptide length for precursor ions, otherwise 0
    pub number: usize,
    pub charge: usize,
    /// Name of the fragment adduct the ion carries (for marker ions the marker name)
    pub adduct: Option<String>,
}

/// Renders the ion name: `b3++`, `y2+ U-H2O`, `[M+2H]++`, `iY+U'`, `RNA:U-H2O`
impl fmt::Display for IonAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let charge = "+".repeat(self.charge);
        let adduct = self.adduct.as_deref().unwrap_or_default();
        match self.kind {
            IonKind::A | IonKind::B | IonKind::Y => {
                let letter = match self.kind {
                    IonKind::A => 'a',
                    IonKind::B => 'b',
                    _ => 'y',
                };
                write!(f, "{letter}{}{charge}", self.number)?;
            }
            IonKind::Precursor => match self.charge {
                1 => write!(f, "[M+H]+")?,
                z => write!(f, "[M+{z}H]{charge}")?,
            },
            IonKind::Immonium(residue) => {
                return write!(f, "i{}+{adduct}", residue as char);
            }
            IonKind::Marker => {
                return write!(f, "{MARKER_ION_PREFIX}{adduct}");
            }
        }
        if !adduct.is_empty() {
            write!(f, " {adduct}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TheoreticalPeak {
    pub mz: f64,
    pub intensity: f64,
    pub annotation: IonAnnotation,
}

impl TheoreticalPeak {
    pub fn new(mz: f64, kind: IonKind, number: usize, charge: usize) -> Self {
        Self {
            mz,
            intensity: 1.0,
            annotation: IonAnnotation {
                kind,
                number,
                charge,
                adduct: None,
            },
        }
    }

    /// Peak of a singly charged ion without ion series position (marker/immonium ions).
    pub fn single_charged(mz: f64, kind: IonKind, adduct: &str) -> Self {
        let mut peak = Self::new(mz, kind, 0, 1);
        peak.annotation.adduct = Some(adduct.to_string());
        peak
    }

    /// The same ion carrying an additional neutral mass.
    ///
    /// # Arguments
    /// * `mass` - Added neutral mass (Da)
    /// * `adduct` - Name of the added adduct
    ///
    pub fn shifted(&self, mass: f64, adduct: &str) -> Self {
        let charge = self.annotation.charge.max(1) as f64;
        let mut shifted = self.clone();
        shifted.mz += mass / charge;
        shifted.annotation.adduct = Some(adduct.to_string());
        shifted
    }
}

/// Sorts peaks by m/z.
pub fn sort_by_mz(peaks: &mut [TheoreticalPeak]) {
    peaks.sort_by(|a, b| compare_scores(a.mz, b.mz));
}

/// Generates tagged theoretical peaks for a modified peptide.
pub trait TheoreticalSpectrumBuilder {
    /// Ion series `1..len` of the given kind at the given charge.
    fn ion_series(&self, peptide: &ModifiedPeptide, kind: IonKind, charge: usize) -> Vec<TheoreticalPeak>;

    /// `[M+zH]` peak of the intact peptide.
    fn precursor_peaks(&self, peptide: &ModifiedPeptide, charge: usize) -> Vec<TheoreticalPeak>;
}

/// Charge range containing only `charge`.
fn exact_charge(charge: usize) -> ChargeRange {
    let charge = ChargePoint::Absolute(charge as isize);
    let mut range = ChargeRange::ONE;
    range.start = charge;
    range.end = charge;
    range
}

/// Fragmentation model producing a single primary ion series at a single charge.
fn series_model(kind: IonKind, charge: usize) -> Option<FragmentationModel> {
    let series = PrimaryIonSeries::default().charge_range(exact_charge(charge));
    let model = FragmentationModel::none().clone();
    match kind {
        IonKind::A => Some(model.a(series)),
        IonKind::B => Some(model.b(series)),
        IonKind::Y => Some(model.y(series)),
        _ => None,
    }
}

/// Kind and ion number of a generated fragment.
fn fragment_kind(fragment: &Fragment, length: usize) -> Option<(IonKind, usize)> {
    match &fragment.ion {
        FragmentType::a(position, 0) => Some((IonKind::A, position.series_number)),
        FragmentType::b(position, 0) => Some((IonKind::B, position.series_number)),
        FragmentType::y(position, 0) => Some((IonKind::Y, position.series_number)),
        FragmentType::Precursor => Some((IonKind::Precursor, length)),
        _ => None,
    }
}

/// Monoisotopic a-, b- and y-ions including the first prefix ion, generated by rustyms
/// from the peptidoform of the modified peptide.
#[derive(Clone, Copy, Debug, Default)]
pub struct FragmentIonGenerator;

impl FragmentIonGenerator {
    fn generate(
        &self,
        peptide: &ModifiedPeptide,
        model: &FragmentationModel,
        kind: IonKind,
        charge: usize,
    ) -> Vec<TheoreticalPeak> {
        let fragments = peptide
            .peptidoform()
            .generate_theoretical_fragments(Charge::new::<e>(charge), model);
        let mut peaks: Vec<TheoreticalPeak> = fragments
            .iter()
            .filter(|fragment| fragment.neutral_loss.is_empty() && fragment.charge.value == charge)
            .filter_map(|fragment| {
                let (fragment_kind, number) = fragment_kind(fragment, peptide.len())?;
                let mz = fragment.mz(MassMode::Monoisotopic)?.value;
                (fragment_kind == kind).then(|| TheoreticalPeak::new(mz, kind, number, charge))
            })
            .collect();
        peaks.sort_by(|a, b| {
            a.annotation
                .number
                .cmp(&b.annotation.number)
                .then_with(|| compare_scores(a.mz, b.mz))
        });
        peaks.dedup_by(|a, b| a.annotation.number == b.annotation.number);
        peaks
    }
}

impl TheoreticalSpectrumBuilder for FragmentIonGenerator {
    fn ion_series(&self, peptide: &ModifiedPeptide, kind: IonKind, charge: usize) -> Vec<TheoreticalPeak> {
        if charge == 0 {
            return Vec::new();
        }
        match series_model(kind, charge) {
            Some(model) => self.generate(peptide, &model, kind, charge),
            None => Vec::new(),
        }
    }

    fn precursor_peaks(&self, peptide: &ModifiedPeptide, charge: usize) -> Vec<TheoreticalPeak> {
        if charge == 0 {
            return Vec::new();
        }
        self.generate(peptide, FragmentationModel::none(), IonKind::Precursor, charge)
    }
}

/// b- and y-ions at charges `1..=max_charge`, sorted by m/z. Used for the primary score.
///
/// # Arguments
/// * `builder` - Theoretical spectrum builder
/// * `peptide` - Modified peptide without adduct
/// * `max_charge` - Highest fragment charge
///
pub fn complete_loss_spectrum<B: TheoreticalSpectrumBuilder + ?Sized>(
    builder: &B,
    peptide: &ModifiedPeptide,
    max_charge: usize,
) -> Vec<TheoreticalPeak> {
    let mut peaks = Vec::new();
    for charge in 1..=max_charge {
        peaks.extend(builder.ion_series(peptide, IonKind::B, charge));
        peaks.extend(builder.ion_series(peptide, IonKind::Y, charge));
    }
    sort_by_mz(&mut peaks);
    peaks
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::modification::Modification;
    use crate::peptide::Site;

    #[test]
    fn test_ion_series() {
        let peptide = ModifiedPeptide::from_sequence("AK").unwrap();
        let generator = FragmentIonGenerator;
        let b = generator.ion_series(&peptide, IonKind::B, 1);
        assert_eq!(b.len(), 1);
        assert!((b[0].mz - 72.04439).abs() < 1e-4);
        let y = generator.ion_series(&peptide, IonKind::Y, 1);
        assert!((y[0].mz - 147.11280).abs() < 1e-4);
        let a = generator.ion_series(&peptide, IonKind::A, 1);
        assert!((a[0].mz - 44.04948).abs() < 1e-4);
        let y2 = generator.ion_series(&peptide, IonKind::Y, 2);
        assert!((y2[0].mz - 74.06004).abs() < 1e-4);
        assert!(generator.ion_series(&peptide, IonKind::Marker, 1).is_empty());

        let precursor = generator.precursor_peaks(&peptide, 2);
        assert!((precursor[0].mz - (217.14264 + 2.0 * 1.007276) / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_modified_ion_series() {
        let oxidation = Arc::new(Modification::from_unimod("Oxidation (M)").unwrap());
        let mut peptide = ModifiedPeptide::from_sequence("AMK").unwrap();
        let generator = FragmentIonGenerator;
        let unmodified_b = generator.ion_series(&peptide, IonKind::B, 1);
        let unmodified_y = generator.ion_series(&peptide, IonKind::Y, 1);
        peptide.set_modification(Site::Residue(1), oxidation);
        let b = generator.ion_series(&peptide, IonKind::B, 1);
        let y = generator.ion_series(&peptide, IonKind::Y, 1);
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].annotation.number, 2);
        assert!((b[0].mz - unmodified_b[0].mz).abs() < 1e-9);
        assert!((b[1].mz - unmodified_b[1].mz - 15.994915).abs() < 1e-5);
        assert!((y[0].mz - unmodified_y[0].mz).abs() < 1e-9);
        assert!((y[1].mz - unmodified_y[1].mz - 15.994915).abs() < 1e-5);
    }

    #[test]
    fn test_complete_loss_spectrum_is_sorted() {
        let peptide = ModifiedPeptide::from_sequence("PEPTIDEK").unwrap();
        let peaks = complete_loss_spectrum(&FragmentIonGenerator, &peptide, 2);
        assert_eq!(peaks.len(), 2 * 2 * 7);
        assert!(peaks.windows(2).all(|w| w[0].mz <= w[1].mz));
        assert!(peaks
            .iter()
            .all(|peak| matches!(peak.annotation.kind, IonKind::B | IonKind::Y)));
    }

    #[test]
    fn test_labels() {
        let peak = TheoreticalPeak::new(100.0, IonKind::B, 3, 2);
        assert_eq!(peak.annotation.to_string(), "b3++");
        let shifted = peak.shifted(10.0, "U-H2O");
        assert_eq!(shifted.annotation.to_string(), "b3++ U-H2O");
        assert!((shifted.mz - 105.0).abs() < 1e-12);
        assert_eq!(
            TheoreticalPeak::new(100.0, IonKind::Precursor, 8, 1)
                .annotation
                .to_string(),
            "[M+H]+"
        );
        assert_eq!(
            TheoreticalPeak::new(100.0, IonKind::Precursor, 8, 3)
                .annotation
                .to_string(),
            "[M+3H]+++"
        );
        assert_eq!(
            TheoreticalPeak::single_charged(100.0, IonKind::Immonium(b'Y'), "U'")
                .annotation
                .to_string(),
            "iY+U'"
        );
        assert_eq!(
            TheoreticalPeak::single_charged(136.0623, IonKind::Marker, "A'")
                .annotation
                .to_string(),
            "RNA:A'"
        );
    }
}
