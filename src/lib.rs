/// Precursor and fragment nucleotide adducts
pub mod adduct;
pub mod alignment;
pub mod configuration;
pub mod constants;
pub mod digestion;
pub mod error;
pub mod formula;
pub mod hit;
/// Primary scoring
pub mod hyperscore;
/// Partial loss based adduct site localization
pub mod localization;
pub mod mass_index;
pub mod modification;
pub mod peptide;
/// Deisotoping and noise filtering
pub mod preprocessing;
pub mod report;
pub mod search;
pub mod spectrum;
pub mod theoretical;
// Various utilities
pub mod utils;

pub use configuration::{Configuration, Tolerance};
pub use error::{ConfigurationError, Error};
pub use report::{write_json, write_tsv_report, Identification, IdentifiedHit};
pub use search::{run_search, Diagnostics, Protein, SearchEngine};
pub use spectrum::{Precursor, Spectrum};
