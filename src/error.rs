use thiserror::Error;

/// Problems with the search parameters. All of them are detected before the first
/// parallel phase starts, so a run either aborts up front or runs to completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Malformed fragment adduct rule: {0}")]
    MalformedAdductRule(String),
    #[error("Malformed formula: {0}")]
    MalformedFormula(String),
    #[error("Malformed nucleotide definition: {0}")]
    MalformedNucleotide(String),
    #[error("Duplicate fixed modification provided: {0}")]
    DuplicateFixedModification(String),
    #[error("Duplicate variable modification provided: {0}")]
    DuplicateVariableModification(String),
    #[error("Unknown modification: {0}")]
    UnknownModification(String),
    #[error("Unknown enzyme: {0}")]
    UnknownEnzyme(String),
    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(&'static str, String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(ConfigurationError),
    #[error("Protein database is empty")]
    EmptyProteinDatabase,
    #[error("No usable spectra left after filtering")]
    NoUsableSpectra,
    #[error("Invalid peptide sequence: {0}")]
    InvalidPeptideSequence(String),
    #[error("m/z ({0}) and intensities ({1}) arrays must have the same length")]
    ExperimentalSpectrumShape(usize, usize),
    #[error("Modification index {0} out of range for peptide {1}")]
    ModificationIndex(usize, String),
    #[error("Adduct index {0} out of range")]
    AdductIndex(usize),
    #[error("Cannot write report: {0}")]
    Report(csv::Error),
    #[error("Cannot serialize identifications: {0}")]
    Serialization(serde_json::Error),
}

impl From<ConfigurationError> for Error {
    fn from(error: ConfigurationError) -> Self {
        Error::Configuration(error)
    }
}

impl Error {
    /// True for the empty-input class of errors (no proteins, no usable spectra).
    pub fn is_input_empty(&self) -> bool {
        matches!(self, Error::EmptyProteinDatabase | Error::NoUsableSpectra)
    }
}
