use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use rustyms::MolecularFormula;
use tracing::{debug, info};

use crate::configuration::NucleotideConfiguration;
use crate::constants::{CYSTEINE_ADDUCT_FORMULA, NO_ADDUCT_COMPOSITION, WATER_FORMULA};
use crate::error::{ConfigurationError, Error};
use crate::formula::{parse_formula, parse_signed_formula, split_signed, FormulaExt};
use crate::modification::{ModificationCatalog, Terminus};

/// Composition text of the cysteine adduct. Contains no upper case letter so it never
/// matches a nucleotide pattern or gates a nucleotide marker ion.
const CYSTEINE_ADDUCT_COMPOSITION: &str = "cys+152";

/// Fragment adduct: a formula (all counts ≥ 0) and the name used in annotations.
#[derive(Clone, Debug)]
pub struct AdductDefinition {
    pub formula: MolecularFormula,
    pub name: String,
    pub mass: f64,
}

impl AdductDefinition {
    pub fn new(formula: MolecularFormula, name: &str) -> Self {
        Self {
            mass: formula.dalton(),
            formula,
            name: name.to_string(),
        }
    }
}

impl PartialEq for AdductDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.formula == other.formula && self.name == other.name
    }
}

impl Eq for AdductDefinition {}

impl PartialOrd for AdductDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic on (formula text, name)
impl Ord for AdductDefinition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.formula
            .to_string()
            .cmp(&other.formula.to_string())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Precursor adduct mass together with all compositions resulting in the same formula
/// (e.g. `AU` and `UA`).
#[derive(Clone, Debug)]
pub struct PrecursorAdductCombination {
    pub formula: MolecularFormula,
    pub mass: f64,
    pub compositions: BTreeSet<String>,
}

impl PrecursorAdductCombination {
    /// The composition used for fragment adduct lookup.
    pub fn representative(&self) -> &str {
        self.compositions
            .iter()
            .next()
            .map(String::as_str)
            .unwrap_or(NO_ADDUCT_COMPOSITION)
    }

    /// All compositions joined by `,`
    pub fn composition_text(&self) -> String {
        self.compositions
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(",")
    }

    pub fn is_none(&self) -> bool {
        self.formula.is_empty()
    }
}

/// All precursor adducts of a search, ordered by formula text. Index 0 is always the
/// "none" adduct with the empty formula.
#[derive(Clone, Debug)]
pub struct PrecursorAdducts {
    combinations: Vec<PrecursorAdductCombination>,
}

impl PrecursorAdducts {
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<&PrecursorAdductCombination, Error> {
        self.combinations.get(idx).ok_or(Error::AdductIndex(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrecursorAdductCombination> {
        self.combinations.iter()
    }
}

/// Fragment adduct rules grouped by their normalized precursor pattern. The empty pattern
/// holds the rules which apply to every precursor adduct.
#[derive(Clone, Debug, Default)]
pub struct FragmentAdductRules {
    rules: BTreeMap<String, BTreeSet<AdductDefinition>>,
}

impl FragmentAdductRules {
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All distinct fragment adducts, regardless of pattern.
    pub fn adducts(&self) -> BTreeSet<&AdductDefinition> {
        self.rules.values().flatten().collect()
    }
}

/// Feasible fragment adducts per representative precursor composition. Read-only after
/// construction.
#[derive(Clone, Debug, Default)]
pub struct FeasibleFragmentAdducts {
    by_composition: HashMap<String, Vec<AdductDefinition>>,
}

impl FeasibleFragmentAdducts {
    /// Fragment adducts of the precursor adduct, empty if none are feasible.
    pub fn for_precursor(&self, precursor: &PrecursorAdductCombination) -> &[AdductDefinition] {
        self.by_composition
            .get(precursor.representative())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_composition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_composition.is_empty()
    }
}

/// Sorts the nucleotides and the loss/gain formulas of a precursor adduct pattern,
/// e.g. `UA-HPO3-H2O` becomes `AU-H1O3P1-H2O1`.
///
/// # Arguments
/// * `name` - Precursor adduct pattern
///
pub fn normalize_adduct_name(name: &str) -> Result<String, ConfigurationError> {
    let (nucleotides, losses) = split_composition(name);
    let mut normalized = if nucleotides.chars().all(|c| c.is_ascii_alphabetic()) {
        let mut sorted: Vec<char> = nucleotides.chars().collect();
        sorted.sort_unstable();
        sorted.into_iter().collect()
    } else {
        nucleotides.to_string()
    };
    for (sign, formula) in canonical_losses(losses)? {
        normalized.push(sign);
        normalized.push_str(&formula);
    }
    Ok(normalized)
}

/// Splits `AU-H2O` into (`AU`, `-H2O`).
fn split_composition(composition: &str) -> (&str, &str) {
    let split = composition
        .find(['+', '-'])
        .unwrap_or(composition.len());
    composition.split_at(split)
}

/// Loss/gain tokens with canonical formula text, sorted.
fn canonical_losses(losses: &str) -> Result<Vec<(char, String)>, ConfigurationError> {
    let mut tokens = split_signed(losses)
        .into_iter()
        .map(|(sign, token)| {
            if token.is_empty() {
                return Err(ConfigurationError::MalformedFormula(losses.to_string()));
            }
            Ok((sign, parse_formula(token)?.to_string()))
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;
    tokens.sort();
    Ok(tokens)
}

fn nucleotide_counts(nucleotides: &str) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for c in nucleotides.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

fn count_signs(text: &str) -> usize {
    text.chars().filter(|c| *c == '+' || *c == '-').count()
}

/// Parses the fragment adduct rules (`formula;name` or `precursor->formula;name`) and
/// registers every fragment adduct as N- and C-terminal modification.
///
/// # Arguments
/// * `rules` - Rule strings
/// * `catalog` - Modification catalog the fragment adducts are registered in
///
pub fn parse_fragment_adduct_rules<C: ModificationCatalog + ?Sized>(
    rules: &[String],
    catalog: &mut C,
) -> Result<FragmentAdductRules, ConfigurationError> {
    let mut parsed = FragmentAdductRules::default();
    for rule in rules {
        let compact: String = rule.chars().filter(|c| !c.is_whitespace()).collect();
        let malformed = || ConfigurationError::MalformedAdductRule(rule.clone());

        let parts: Vec<&str> = compact.split("->").collect();
        let (pattern, fragment) = match parts.as_slice() {
            [fragment] => (String::new(), *fragment),
            [pattern, fragment] if !pattern.is_empty() => {
                (normalize_adduct_name(pattern).map_err(|_| malformed())?, *fragment)
            }
            _ => return Err(malformed()),
        };

        let fields: Vec<&str> = fragment.split(';').collect();
        let (formula_text, name) = match fields.as_slice() {
            [formula] => (*formula, *formula),
            [formula, name] if !name.is_empty() => (*formula, *name),
            _ => return Err(malformed()),
        };
        if formula_text.is_empty() {
            return Err(malformed());
        }
        let formula = parse_formula(formula_text).map_err(|_| malformed())?;
        if !formula.is_non_negative() {
            return Err(malformed());
        }

        catalog.register_terminal_modification(name, &formula, Terminus::NTerm);
        catalog.register_terminal_modification(name, &formula, Terminus::CTerm);

        parsed
            .rules
            .entry(pattern)
            .or_default()
            .insert(AdductDefinition::new(formula, name));
    }
    Ok(parsed)
}

/// True if the (normalized) rule pattern applies to the experimental precursor composition.
fn pattern_matches(pattern: &str, composition: &str) -> bool {
    if count_signs(pattern) != count_signs(composition) {
        return false;
    }
    let (pattern_nucleotides, pattern_losses) = split_composition(pattern);
    let (nucleotides, losses) = split_composition(composition);

    let available = nucleotide_counts(nucleotides);
    let all_present = nucleotide_counts(pattern_nucleotides)
        .iter()
        .all(|(nucleotide, required)| available.get(nucleotide).is_some_and(|n| n >= required));
    if !all_present {
        return false;
    }

    match (canonical_losses(pattern_losses), canonical_losses(losses)) {
        (Ok(expected), Ok(observed)) => expected == observed,
        _ => false,
    }
}

/// Fragment adducts derivable from one precursor adduct.
///
/// # Arguments
/// * `composition` - Precursor adduct composition, e.g. `AU-H2O`
/// * `formula` - Formula of the precursor adduct
/// * `rules` - Parsed fragment adduct rules
///
pub fn compute_feasible_fragment_adducts(
    composition: &str,
    formula: &MolecularFormula,
    rules: &FragmentAdductRules,
) -> Vec<AdductDefinition> {
    if formula.is_empty() {
        return Vec::new();
    }
    let mut feasible: BTreeSet<&AdductDefinition> = BTreeSet::new();
    for (pattern, fragments) in rules.rules.iter() {
        if pattern.is_empty() {
            feasible.extend(fragments.iter().filter(|fragment| formula.contains(&fragment.formula)));
        } else if pattern_matches(pattern, composition) {
            debug!("Rule {pattern} matches precursor adduct {composition}");
            feasible.extend(fragments.iter());
        }
    }
    feasible.into_iter().cloned().collect()
}

/// Feasible fragment adducts of every precursor adduct, computed once per precursor adduct
/// formula from its representative composition.
///
/// # Arguments
/// * `precursor_adducts` - All precursor adducts
/// * `rules` - Parsed fragment adduct rules
///
pub fn compute_all_feasible_fragment_adducts(
    precursor_adducts: &PrecursorAdducts,
    rules: &FragmentAdductRules,
) -> FeasibleFragmentAdducts {
    let mut by_composition = HashMap::new();
    for precursor in precursor_adducts.iter() {
        let composition = precursor.representative();
        let feasible = compute_feasible_fragment_adducts(composition, &precursor.formula, rules);
        info!(
            "Precursor adduct '{composition}' has {} feasible fragment adducts: {}",
            feasible.len(),
            feasible
                .iter()
                .map(|adduct| format!("{} ({})", adduct.name, adduct.formula))
                .collect::<Vec<String>>()
                .join(", ")
        );
        by_composition.insert(composition.to_string(), feasible);
    }
    FeasibleFragmentAdducts { by_composition }
}

/// Parses `letter=value` pairs.
fn parse_assignment(definition: &str) -> Result<(char, &str), ConfigurationError> {
    let malformed = || ConfigurationError::MalformedNucleotide(definition.to_string());
    let (letter, value) = definition.trim().split_once('=').ok_or_else(malformed)?;
    let mut letters = letter.trim().chars();
    match (letters.next(), letters.next()) {
        (Some(letter), None) => Ok((letter, value.trim())),
        _ => Err(malformed()),
    }
}

fn parse_mapping(definition: &str) -> Result<(char, char), ConfigurationError> {
    let malformed = || ConfigurationError::MalformedNucleotide(definition.to_string());
    let (source, target) = definition.trim().split_once("->").ok_or_else(malformed)?;
    let single = |text: &str| {
        let mut chars = text.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    };
    match (single(source), single(target)) {
        (Some(source), Some(target)) => Ok((source, target)),
        _ => Err(malformed()),
    }
}

/// All words of length `1..=max_length` over `alphabet`.
fn all_words(alphabet: &[char], max_length: usize) -> Vec<String> {
    let mut words = Vec::new();
    let mut current: Vec<String> = vec![String::new()];
    for _ in 0..max_length {
        current = current
            .iter()
            .flat_map(|prefix| {
                alphabet.iter().map(move |c| {
                    let mut word = prefix.clone();
                    word.push(*c);
                    word
                })
            })
            .collect();
        words.extend(current.iter().cloned());
    }
    words
}

/// Words of length `1..=max_length` occurring in `sequence`, with every letter replaced by
/// each of its mapping targets.
fn restricted_words(sequence: &str, mappings: &[(char, char)], max_length: usize) -> Vec<String> {
    let sequence: Vec<char> = sequence.trim().chars().collect();
    let mut words = BTreeSet::new();
    for start in 0..sequence.len() {
        for end in start + 1..=(start + max_length).min(sequence.len()) {
            let mut expanded = vec![String::new()];
            for source in sequence[start..end].iter() {
                let targets: Vec<char> = mappings
                    .iter()
                    .filter(|(s, _)| s == source)
                    .map(|(_, t)| *t)
                    .collect();
                expanded = expanded
                    .iter()
                    .flat_map(|prefix| {
                        targets.iter().map(move |t| {
                            let mut word = prefix.clone();
                            word.push(*t);
                            word
                        })
                    })
                    .collect();
            }
            words.extend(expanded);
        }
    }
    words.into_iter().filter(|word| !word.is_empty()).collect()
}

/// Enumerates all precursor adducts: nucleotide chains up to the configured length
/// combined with every loss/gain, the optional cysteine adduct and the "none" adduct.
///
/// # Arguments
/// * `config` - Nucleotide configuration
///
pub fn enumerate_precursor_adducts(
    config: &NucleotideConfiguration,
) -> Result<PrecursorAdducts, ConfigurationError> {
    let mut by_formula: BTreeMap<String, PrecursorAdductCombination> = BTreeMap::new();
    let mut add = |formula: MolecularFormula, composition: String| {
        by_formula
            .entry(formula.to_string())
            .or_insert_with(|| PrecursorAdductCombination {
                mass: formula.dalton(),
                formula,
                compositions: BTreeSet::new(),
            })
            .compositions
            .insert(composition);
    };

    if config.max_length > 0 {
        let targets = config
            .target_nucleotides
            .iter()
            .map(|definition| {
                let (letter, formula) = parse_assignment(definition)?;
                Ok((letter, parse_formula(formula)?))
            })
            .collect::<Result<BTreeMap<char, MolecularFormula>, ConfigurationError>>()?;
        let mappings = config
            .mappings
            .iter()
            .map(|mapping| parse_mapping(mapping))
            .collect::<Result<Vec<(char, char)>, ConfigurationError>>()?;
        if let Some((_, target)) = mappings.iter().find(|(_, t)| !targets.contains_key(t)) {
            return Err(ConfigurationError::MalformedNucleotide(format!(
                "mapping target {target} is no target nucleotide"
            )));
        }
        let restrictions = config
            .restrictions
            .iter()
            .map(|definition| {
                let (letter, count) = parse_assignment(definition)?;
                let count = count
                    .parse::<usize>()
                    .map_err(|_| ConfigurationError::MalformedNucleotide(definition.clone()))?;
                Ok((letter, count))
            })
            .collect::<Result<Vec<(char, usize)>, ConfigurationError>>()?;
        let modifications = config
            .modifications
            .iter()
            .map(|modification| {
                let modification = modification.trim();
                Ok((modification, parse_signed_formula(modification)?))
            })
            .collect::<Result<Vec<(&str, MolecularFormula)>, ConfigurationError>>()?;

        let words = if config.sequence_restriction.trim().is_empty() {
            let alphabet: Vec<char> = targets.keys().copied().collect();
            all_words(&alphabet, config.max_length)
        } else {
            restricted_words(&config.sequence_restriction, &mappings, config.max_length)
        };

        let water = parse_formula(WATER_FORMULA)?;
        for word in words {
            let satisfies_restrictions = restrictions
                .iter()
                .all(|(letter, min_count)| word.chars().filter(|c| c == letter).count() >= *min_count);
            if !satisfies_restrictions {
                continue;
            }
            let mut chain = MolecularFormula::default();
            for letter in word.chars() {
                // words are built from target letters only
                if let Some(formula) = targets.get(&letter) {
                    chain = &chain + formula;
                }
            }
            let links = word.chars().count() as i32 - 1;
            chain = &chain - &water * links;

            for (text, modification) in modifications.iter() {
                let formula = &chain + modification;
                if !formula.is_non_negative() {
                    debug!("Skipping {word}{text}, negative formula {formula}");
                    continue;
                }
                add(formula, format!("{word}{text}"));
            }
        }

        if config.cysteine_adduct {
            add(
                parse_formula(CYSTEINE_ADDUCT_FORMULA)?,
                CYSTEINE_ADDUCT_COMPOSITION.to_string(),
            );
        }
    }

    // unmodified peptides are searched with the empty adduct, its key sorts first
    by_formula.insert(
        String::new(),
        PrecursorAdductCombination {
            formula: MolecularFormula::default(),
            mass: 0.0,
            compositions: BTreeSet::from([NO_ADDUCT_COMPOSITION.to_string()]),
        },
    );

    info!("{} precursor adducts", by_formula.len());
    Ok(PrecursorAdducts {
        combinations: by_formula.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modification::{terminal_modification_id, ModificationDatabase};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_normalize_adduct_name() {
        assert_eq!(normalize_adduct_name("UA").unwrap(), "AU");
        assert_eq!(
            normalize_adduct_name("UA-HPO3-H2O").unwrap(),
            "AU-H1O3P1-H2O1"
        );
        assert_eq!(normalize_adduct_name("U'").unwrap(), "U'");
        assert!(normalize_adduct_name("U-Xx").is_err());
    }

    #[test]
    fn test_default_precursor_adducts() {
        let adducts = enumerate_precursor_adducts(&NucleotideConfiguration::default()).unwrap();
        // U, AU, CU, GU, UU times 4 losses plus "none"
        assert_eq!(adducts.len(), 21);
        let none = adducts.get(0).unwrap();
        assert!(none.is_none());
        assert_eq!(none.representative(), NO_ADDUCT_COMPOSITION);
        assert_eq!(none.mass, 0.0);

        let uridine = adducts
            .iter()
            .find(|adduct| adduct.compositions.contains("U"))
            .unwrap();
        assert!((uridine.mass - 324.035867).abs() < 1e-4);

        let au = adducts
            .iter()
            .find(|adduct| adduct.compositions.contains("AU"))
            .unwrap();
        assert!(au.compositions.contains("UA"));
        assert_eq!(au.formula.to_string(), "C19H25N7O15P2");
        assert!(adducts.get(21).is_err());
    }

    #[test]
    fn test_length_zero_only_none() {
        let config = NucleotideConfiguration {
            max_length: 0,
            ..Default::default()
        };
        let adducts = enumerate_precursor_adducts(&config).unwrap();
        assert_eq!(adducts.len(), 1);
    }

    #[test]
    fn test_sequence_restriction_and_cysteine() {
        let config = NucleotideConfiguration {
            max_length: 2,
            sequence_restriction: "AUG".to_string(),
            restrictions: Vec::new(),
            modifications: strings(&[""]),
            cysteine_adduct: true,
            ..Default::default()
        };
        let adducts = enumerate_precursor_adducts(&config).unwrap();
        let compositions: BTreeSet<String> = adducts
            .iter()
            .flat_map(|adduct| adduct.compositions.iter().cloned())
            .collect();
        assert_eq!(
            compositions,
            BTreeSet::from_iter(strings(&[
                "A",
                "AU",
                "G",
                "U",
                "UG",
                "cys+152",
                "none"
            ]))
        );
    }

    #[test]
    fn test_malformed_nucleotides() {
        let config = NucleotideConfiguration {
            target_nucleotides: strings(&["AB=C10H14N5O7P"]),
            ..Default::default()
        };
        assert!(matches!(
            enumerate_precursor_adducts(&config),
            Err(ConfigurationError::MalformedNucleotide(_))
        ));

        let config = NucleotideConfiguration {
            mappings: strings(&["U->X"]),
            ..Default::default()
        };
        assert!(enumerate_precursor_adducts(&config).is_err());
    }

    #[test]
    fn test_parse_rules_registers_modifications() {
        let mut database = ModificationDatabase::default();
        let rules = parse_fragment_adduct_rules(
            &strings(&["C9H10N2O5;U-H3PO4", "C3O", "UA-H2O -> C4H4N2O2;U'"]),
            &mut database,
        )
        .unwrap();
        assert_eq!(rules.len(), 3);
        assert!(rules.rules.contains_key("AU-H2O1"));
        // N- and C-terminal variant of each adduct
        assert_eq!(database.len(), 6);
        let registered = database
            .lookup(&terminal_modification_id("U-H3PO4", Terminus::NTerm))
            .unwrap();
        assert!((registered.mass - parse_formula("C9H10N2O5").unwrap().dalton()).abs() < 1e-9);
        assert!(database
            .lookup(&terminal_modification_id("C3O", Terminus::CTerm))
            .is_some());
    }

    #[test]
    fn test_malformed_rules() {
        let mut database = ModificationDatabase::default();
        for rule in ["C3O;a;b", "U->A->C3O", ";name", "Xx3;name", "->C3O"] {
            assert!(
                matches!(
                    parse_fragment_adduct_rules(&strings(&[rule]), &mut database),
                    Err(ConfigurationError::MalformedAdductRule(_))
                ),
                "{rule}"
            );
        }
    }

    #[test]
    fn test_feasible_adducts_are_subformulas() {
        let mut database = ModificationDatabase::default();
        let rules = parse_fragment_adduct_rules(
            &NucleotideConfiguration::default().fragment_adducts,
            &mut database,
        )
        .unwrap();

        let uridine = parse_formula("C9H13N2O9P").unwrap();
        let feasible = compute_feasible_fragment_adducts("U", &uridine, &rules);
        assert_eq!(feasible.len(), 7);

        let uridine_water_loss = parse_formula("C9H11N2O8P").unwrap();
        let feasible = compute_feasible_fragment_adducts("U-H2O", &uridine_water_loss, &rules);
        assert!(!feasible.is_empty());
        for adduct in feasible.iter() {
            assert!(uridine_water_loss.contains(&adduct.formula), "{}", adduct.name);
        }
        assert!(feasible.iter().all(|adduct| adduct.name != "U"));
        assert!(feasible.iter().all(|adduct| adduct.name != "U-HPO3"));
        // ordered by formula text
        let mut sorted = feasible.clone();
        sorted.sort();
        assert_eq!(sorted, feasible);

        assert!(compute_feasible_fragment_adducts("none", &MolecularFormula::default(), &rules).is_empty());
    }

    #[test]
    fn test_pattern_rules() {
        let mut database = ModificationDatabase::default();
        let rules = parse_fragment_adduct_rules(
            &strings(&["U-H2O->C9H11N2O8P1;U-H2O", "AU->C4H4N2O2;U'"]),
            &mut database,
        )
        .unwrap();
        let formula = parse_formula("C9H11N2O8P").unwrap();
        let names = |composition: &str| -> Vec<String> {
            compute_feasible_fragment_adducts(composition, &formula, &rules)
                .into_iter()
                .map(|adduct| adduct.name)
                .collect()
        };
        assert_eq!(names("U-H2O"), strings(&["U-H2O"]));
        assert_eq!(names("UU-H2O"), strings(&["U-H2O"]));
        assert!(names("U").is_empty());
        assert!(names("U-HPO3").is_empty());
        assert_eq!(names("UA"), strings(&["U'"]));
        assert!(names("A").is_empty());
    }

    #[test]
    fn test_all_feasible_adducts() {
        let mut database = ModificationDatabase::default();
        let config = NucleotideConfiguration::default();
        let rules = parse_fragment_adduct_rules(&config.fragment_adducts, &mut database).unwrap();
        let precursors = enumerate_precursor_adducts(&config).unwrap();
        let feasible = compute_all_feasible_fragment_adducts(&precursors, &rules);
        assert_eq!(feasible.len(), precursors.len());
        assert!(feasible.for_precursor(precursors.get(0).unwrap()).is_empty());
        let uridine = precursors
            .iter()
            .find(|adduct| adduct.compositions.contains("U"))
            .unwrap();
        assert_eq!(feasible.for_precursor(uridine).len(), 7);
    }
}
