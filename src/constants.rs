/// Mass difference between 13C and 12C, spacing of isotope peaks at charge 1
///
pub const C13C12_MASS_DIFF: f64 = 1.003_354_837_8;

/// Water, removed once per phosphodiester bond
///
pub const WATER_FORMULA: &str = "H2O";

/// Hyperscores below this value are not considered a hit at all
///
pub const SIGNIFICANCE_FLOOR: f64 = 0.001;

/// Precursors below this mass with a fractional mass below [`FRACTIONAL_MASS_CUTOFF`]
/// cannot carry a nucleotide.
///
pub const FRACTIONAL_MASS_FILTER_MAX_MASS: f64 = 1750.0;

/// See [`FRACTIONAL_MASS_FILTER_MAX_MASS`]
///
pub const FRACTIONAL_MASS_CUTOFF: f64 = 0.2;

/// Nucleobase marker ions whose presence depends on the nucleotides in the precursor adduct:
/// (nucleotide letter, m/z, label)
///
pub const NUCLEOTIDE_MARKER_IONS: [(char, f64, &str); 3] = [
    ('A', 136.0623, "A'"),
    ('G', 152.0572, "G'"),
    ('C', 112.0510, "C'"),
];

/// Marker ions reported per spectrum: (label, m/z)
///
pub const REPORTED_MARKER_IONS: [(&str, f64); 4] = [
    ("A'", 136.0623),
    ("G'", 152.0572),
    ("C'", 112.0510),
    ("U'", 113.0346),
];

/// Label prefix of all nucleotide derived marker ions
///
pub const MARKER_ION_PREFIX: &str = "RNA:";

/// Composition text of the precursor without any adduct
///
pub const NO_ADDUCT_COMPOSITION: &str = "none";

/// Formula of the +152 cysteine adduct
///
pub const CYSTEINE_ADDUCT_FORMULA: &str = "C4H8O2S2";
