use rustyms::{Element, MolecularFormula};

use crate::error::ConfigurationError;

/// Parses an unsigned formula like `C9H13N2O9P1`, `H2O` or `H-1N-1O` into a rustyms formula.
/// An empty string is the empty formula. Only the common elements are recognized so `CO` is
/// carbon monoxide and not cobalt.
///
/// # Arguments
/// * `formula` - Formula text
///
pub fn parse_formula(formula: &str) -> Result<MolecularFormula, ConfigurationError> {
    let text = formula.trim();
    if text.is_empty() {
        return Ok(MolecularFormula::default());
    }
    if !text.is_ascii() {
        return Err(ConfigurationError::MalformedFormula(formula.to_string()));
    }
    MolecularFormula::from_pro_forma(text, .., false, false, false)
        .map_err(|_| ConfigurationError::MalformedFormula(formula.to_string()))
}

/// Parses a chain of signed formulas like `-H2O-HPO3` or `H2O+PO3`. A leading formula
/// without sign counts as a gain.
///
/// # Arguments
/// * `formulas` - Signed formula text
///
pub fn parse_signed_formula(formulas: &str) -> Result<MolecularFormula, ConfigurationError> {
    let mut result = MolecularFormula::default();
    for (sign, token) in split_signed(formulas) {
        if token.is_empty() {
            return Err(ConfigurationError::MalformedFormula(formulas.to_string()));
        }
        let formula = parse_formula(token)?;
        result = match sign {
            '-' => &result - &formula,
            _ => &result + &formula,
        };
    }
    Ok(result)
}

/// Formula arithmetic used by the adduct enumeration on top of [`MolecularFormula`].
pub trait FormulaExt {
    /// Monoisotopic mass in Dalton.
    fn dalton(&self) -> f64;

    /// Number of atoms of the element with natural isotope distribution (0 if absent).
    fn count(&self, element: Element) -> i32;

    /// True if no element count is negative.
    fn is_non_negative(&self) -> bool;

    /// True if every element of `other` is present at least as often in `self`,
    /// i.e. `self - other` has no negative counts.
    fn contains(&self, other: &MolecularFormula) -> bool;
}

impl FormulaExt for MolecularFormula {
    fn dalton(&self) -> f64 {
        self.monoisotopic_mass().value
    }

    fn count(&self, element: Element) -> i32 {
        self.elements()
            .iter()
            .filter(|(e, isotope, _)| *e == element && isotope.is_none())
            .map(|(_, _, count)| *count)
            .sum()
    }

    fn is_non_negative(&self) -> bool {
        self.elements().iter().all(|(_, _, count)| *count >= 0)
    }

    fn contains(&self, other: &MolecularFormula) -> bool {
        (self - other).is_non_negative()
    }
}

/// Splits `-H2O+PO3` into `[('-', "H2O"), ('+', "PO3")]`. Text before the first sign gets `'+'`.
pub(crate) fn split_signed(text: &str) -> Vec<(char, &str)> {
    let mut tokens = Vec::new();
    let mut sign = '+';
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if c == '+' || c == '-' {
            if idx > start {
                tokens.push((sign, &text[start..idx]));
            } else if idx > 0 {
                // two signs in a row
                tokens.push((sign, ""));
            }
            sign = c;
            start = idx + c.len_utf8();
        }
    }
    if start < text.len() {
        tokens.push((sign, &text[start..]));
    } else if !text.is_empty() {
        tokens.push((sign, ""));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let formula = parse_formula("C9H13N2O9P").unwrap();
        assert_eq!(formula.count(Element::C), 9);
        assert_eq!(formula.count(Element::P), 1);
        assert_eq!(formula.to_string(), "C9H13N2O9P1");
        assert_eq!(parse_formula("HPO3").unwrap().to_string(), "H1O3P1");
        assert_eq!(parse_formula("CO").unwrap().to_string(), "C1O1");
        assert!(parse_formula("").unwrap().is_empty());
        assert!(parse_formula("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_formula("C9x"),
            Err(ConfigurationError::MalformedFormula(_))
        ));
        assert!(matches!(
            parse_formula("Xy2"),
            Err(ConfigurationError::MalformedFormula(_))
        ));
        assert!(matches!(
            parse_formula("C9Ö"),
            Err(ConfigurationError::MalformedFormula(_))
        ));
    }

    #[test]
    fn test_parse_signed() {
        let loss = parse_signed_formula("-H2O-HPO3").unwrap();
        assert_eq!(loss.count(Element::H), -3);
        assert_eq!(loss.count(Element::O), -4);
        assert_eq!(loss.count(Element::P), -1);
        assert!(!loss.is_non_negative());

        let gain = parse_signed_formula("H2O+PO3").unwrap();
        assert_eq!(gain.count(Element::O), 4);
        assert!(parse_signed_formula("--H2O").is_err());
    }

    #[test]
    fn test_monoisotopic_mass() {
        let water = parse_formula("H2O").unwrap();
        assert!((water.dalton() - 18.010565).abs() < 1e-5);
        let uridine_monophosphate = parse_formula("C9H13N2O9P").unwrap();
        assert!((uridine_monophosphate.dalton() - 324.035867).abs() < 1e-4);
    }

    #[test]
    fn test_contains() {
        let precursor = parse_formula("C9H13N2O9P").unwrap();
        assert!(precursor.contains(&parse_formula("C9H11N2O8P").unwrap()));
        assert!(precursor.contains(&parse_formula("C3O").unwrap()));
        assert!(!precursor.contains(&parse_formula("C10H14N5O7P").unwrap()));
    }

    #[test]
    fn test_split_signed() {
        assert_eq!(split_signed("-H2O-HPO3"), vec![('-', "H2O"), ('-', "HPO3")]);
        assert_eq!(split_signed("H2O+PO3"), vec![('+', "H2O"), ('+', "PO3")]);
        assert!(split_signed("").is_empty());
    }
}
