use std::sync::OnceLock;

use rustyms::Element::{Electron, H as Hydrogen};

/// Mass of a proton (hydrogen atom without its electron) in Dalton
pub fn proton_mass() -> f64 {
    static PROTON: OnceLock<f64> = OnceLock::new();
    *PROTON.get_or_init(|| {
        let hydrogen = Hydrogen.mass(None).map_or(0.0, |mass| mass.value);
        let electron = Electron.mass(None).map_or(0.0, |mass| mass.value);
        hydrogen - electron
    })
}

/// Converts mass to charge ratio (Thompson) to the neutral mass (Dalton)
///
/// # Arguments
/// * `mz` - Mass to charge ratio (Thompson)
/// * `charge` - Charge
///
pub fn mass_to_charge_to_dalton(mz: f64, charge: usize) -> f64 {
    let charge = charge as f64;
    mz * charge - proton_mass() * charge
}

/// Converts a neutral mass (Dalton) to the m/z of the `charge` times protonated ion
///
/// # Arguments
/// * `mass` - Neutral mass (Dalton)
/// * `charge` - Charge, must be > 0
///
pub fn dalton_to_mass_to_charge(mass: f64, charge: usize) -> f64 {
    let charge = charge as f64;
    (mass + proton_mass() * charge) / charge
}

/// `ln(n!)`, 0 for `n < 2`
pub fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|i| (i as f64).ln()).sum()
}

/// Total order for scores and m/z values (IEEE 754 `totalOrder`, NaN sorts above +inf).
pub fn compare_scores(a: f64, b: f64) -> std::cmp::Ordering {
    a.total_cmp(&b)
}
