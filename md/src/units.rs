//! Physical constants in the engine's `real` unit system
//! (Å, fs, kcal/mol, g/mol, K).

/// Gas constant in kcal/(mol K).
pub const GAS_CONSTANT_KCAL: f64 = 1.9872036e-3;

/// Gas constant in kJ/(mol K).
pub const GAS_CONSTANT_KJ: f64 = 8.3144598e-3;

pub mod argon {
    /// Atomic mass in g/mol.
    pub const MASS: f64 = 39.948;
    /// LJ well depth in kcal/mol.
    pub const EPSILON: f64 = 0.23748;
    /// LJ diameter in Å.
    pub const SIGMA: f64 = 3.4;
    /// Pair cutoff in Å.
    pub const CUTOFF: f64 = 12.0;
}

/// Thermal energy kT in kcal/mol.
#[inline]
pub fn thermal_energy(temperature: f64) -> f64 {
    GAS_CONSTANT_KCAL * temperature
}

/// Effective friction felt by a particle coupled to a hydrodynamic cell of
/// width `dx` (Å) in a fluid of shear viscosity `eta` (Poise), with lattice
/// geometry factor `g` (Giupponi et al., JCP 2007).
pub fn effective_friction(zeta_bare: f64, eta: f64, g: f64, dx: f64) -> f64 {
    1.0 / zeta_bare + 1.0 / (g * eta * dx)
}
