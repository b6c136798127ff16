use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use serde::Serialize;

use crate::adduct::FragmentAdductRules;
use crate::constants::{MARKER_ION_PREFIX, REPORTED_MARKER_IONS};
use crate::error::Error;
use crate::spectrum::Spectrum;
use crate::utils::proton_mass;

/// One ranked candidate of an identified spectrum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IdentifiedHit {
    /// 1-based rank, 1 is the best hit
    pub rank: usize,
    pub score: f64,
    /// Modified peptide, e.g. `PEM(Oxidation)K`
    pub peptide: String,
    pub unmodified_sequence: String,
    pub accessions: Vec<String>,
    pub adduct_composition: String,
    pub adduct_formula: String,
    pub adduct_mass: f64,
    pub best_localization_score: Option<f64>,
    pub localization_scores: Option<String>,
    pub best_localization: Option<String>,
    pub fragment_annotation: String,
}

/// All hits of one spectrum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identification {
    pub spectrum_index: usize,
    pub native_id: String,
    pub rt: f64,
    pub precursor_mz: f64,
    pub charge: usize,
    /// Summed intensity around each marker ion
    pub marker_ions: BTreeMap<String, f64>,
    pub hits: Vec<IdentifiedHit>,
}

/// Marker ions reported per spectrum: the nucleobase ions and every free fragment adduct.
///
/// # Arguments
/// * `rules` - Fragment adduct rules
///
pub fn marker_ion_table(rules: &FragmentAdductRules) -> Vec<(String, f64)> {
    let mut table: Vec<(String, f64)> = REPORTED_MARKER_IONS
        .iter()
        .map(|(label, mz)| (label.to_string(), *mz))
        .collect();
    let mut seen = HashSet::new();
    for adduct in rules.adducts() {
        if seen.insert(adduct.name.as_str()) {
            table.push((
                format!("{MARKER_ION_PREFIX}{}", adduct.name),
                adduct.mass + proton_mass(),
            ));
        }
    }
    table
}

/// Summed intensity within `tolerance` Da of every marker ion.
pub fn marker_ion_intensities(
    spectrum: &Spectrum,
    table: &[(String, f64)],
    tolerance: f64,
) -> BTreeMap<String, f64> {
    table
        .iter()
        .map(|(label, mz)| (label.clone(), spectrum.intensity_around(*mz, tolerance)))
        .collect()
}

/// Writes the identifications as pretty printed JSON.
pub fn write_json<W: Write>(writer: W, identifications: &[Identification]) -> Result<(), Error> {
    serde_json::to_writer_pretty(writer, identifications).map_err(Error::Serialization)
}

const REPORT_HEADERS: [&str; 17] = [
    "spectrum_index",
    "native_id",
    "rt",
    "precursor_mz",
    "charge",
    "rank",
    "score",
    "peptide",
    "unmodified_sequence",
    "accessions",
    "adduct_composition",
    "adduct_formula",
    "adduct_mass",
    "best_localization_score",
    "localization_scores",
    "best_localization",
    "fragment_annotation",
];

/// Writes one tab separated row per hit, followed by one column per marker ion.
///
/// # Arguments
/// * `writer` - Output
/// * `identifications` - Identifications to report
///
pub fn write_tsv_report<W: Write>(writer: W, identifications: &[Identification]) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    let marker_labels: Vec<&str> = identifications
        .first()
        .map(|identification| identification.marker_ions.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let mut headers = csv::StringRecord::from(REPORT_HEADERS.to_vec());
    headers.extend(marker_labels.iter().copied());
    wtr.write_record(&headers).map_err(Error::Report)?;

    for identification in identifications {
        for hit in &identification.hits {
            let mut record = csv::StringRecord::new();
            record.push_field(&identification.spectrum_index.to_string());
            record.push_field(&identification.native_id);
            record.push_field(&identification.rt.to_string());
            record.push_field(&identification.precursor_mz.to_string());
            record.push_field(&identification.charge.to_string());
            record.push_field(&hit.rank.to_string());
            record.push_field(&hit.score.to_string());
            record.push_field(&hit.peptide);
            record.push_field(&hit.unmodified_sequence);
            record.push_field(&hit.accessions.join(";"));
            record.push_field(&hit.adduct_composition);
            record.push_field(&hit.adduct_formula);
            record.push_field(&hit.adduct_mass.to_string());
            record.push_field(
                &hit.best_localization_score
                    .map(|score| score.to_string())
                    .unwrap_or_default(),
            );
            record.push_field(hit.localization_scores.as_deref().unwrap_or_default());
            record.push_field(hit.best_localization.as_deref().unwrap_or_default());
            record.push_field(&hit.fragment_annotation);
            for label in &marker_labels {
                let intensity = identification.marker_ions.get(*label).copied().unwrap_or(0.0);
                record.push_field(&intensity.to_string());
            }
            wtr.write_record(&record).map_err(Error::Report)?;
        }
    }
    wtr.flush().map_err(|error| Error::Report(error.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adduct::parse_fragment_adduct_rules;
    use crate::modification::ModificationDatabase;

    fn identification() -> Identification {
        Identification {
            spectrum_index: 3,
            native_id: "scan=4".to_string(),
            rt: 12.5,
            precursor_mz: 500.25,
            charge: 2,
            marker_ions: BTreeMap::from([("A'".to_string(), 0.0), ("U'".to_string(), 0.5)]),
            hits: vec![IdentifiedHit {
                rank: 1,
                score: 4.2,
                peptide: "PEPTIDEK".to_string(),
                unmodified_sequence: "PEPTIDEK".to_string(),
                accessions: vec!["P1".to_string(), "P2".to_string()],
                adduct_composition: "U-H2O".to_string(),
                adduct_formula: "C9H11N2O8P1".to_string(),
                adduct_mass: 306.025302,
                best_localization_score: Some(3.5),
                localization_scores: Some("0 350.00".to_string()),
                best_localization: Some("PEPtIDEK".to_string()),
                fragment_annotation: "(100.000,100.0,\"[b1]+\")".to_string(),
            }],
        }
    }

    #[test]
    fn test_tsv_report() {
        let mut buffer = Vec::new();
        write_tsv_report(&mut buffer, &[identification()]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let header: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(header.len(), REPORT_HEADERS.len() + 2);
        assert_eq!(header[REPORT_HEADERS.len()], "A'");
        let row: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(row.len(), header.len());
        assert_eq!(row[9], "P1;P2");
        assert_eq!(row[15], "PEPtIDEK");
        assert_eq!(row[header.len() - 1], "0.5");
    }

    #[test]
    fn test_json() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &[identification()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["hits"][0]["best_localization"], "PEPtIDEK");
        assert_eq!(value[0]["marker_ions"]["U'"], 0.5);
    }

    #[test]
    fn test_marker_ions() {
        let mut catalog = ModificationDatabase::default();
        let rules = parse_fragment_adduct_rules(
            &["C9H11N2O8P;U-H2O".to_string()],
            &mut catalog,
        )
        .unwrap();
        let table = marker_ion_table(&rules);
        assert_eq!(table.len(), REPORTED_MARKER_IONS.len() + 1);
        assert_eq!(table[4].0, "RNA:U-H2O");

        let spectrum = Spectrum::new(vec![113.03, 113.04, table[4].1], vec![1.0, 2.0, 4.0]).unwrap();
        let intensities = marker_ion_intensities(&spectrum, &table, 0.05);
        assert_eq!(intensities["U'"], 3.0);
        assert_eq!(intensities["A'"], 0.0);
        assert_eq!(intensities["RNA:U-H2O"], 4.0);
    }
}
