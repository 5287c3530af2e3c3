//! Boundary forces applied directly to the engine's atom buffers.

use crate::error::{ConfigError, HacError, Result};
use crate::units::thermal_energy;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

fn check_ids(buffer: &[Vector3<f64>], ids: &[usize]) -> Result<()> {
    let natoms = buffer.len();
    match ids.iter().find(|&&id| id >= natoms) {
        Some(&id) => Err(HacError::AtomIdOutOfRange { id, natoms }),
        None => Ok(()),
    }
}

fn add_to_selected(buffer: &mut [Vector3<f64>], ids: &[usize], delta: Vector3<f64>) -> Result<()> {
    check_ids(buffer, ids)?;
    for &id in ids {
        buffer[id] += delta;
    }
    Ok(())
}

/// Shift the selected atoms by `dx`.
pub fn add_positions(x: &mut [Vector3<f64>], ids: &[usize], dx: Vector3<f64>) -> Result<()> {
    add_to_selected(x, ids, dx)
}

/// Add `dv` to the velocity of the selected atoms.
pub fn add_velocities(v: &mut [Vector3<f64>], ids: &[usize], dv: Vector3<f64>) -> Result<()> {
    add_to_selected(v, ids, dv)
}

/// Add a constant force `df` to the selected atoms.
pub fn add_forces(f: &mut [Vector3<f64>], ids: &[usize], df: Vector3<f64>) -> Result<()> {
    add_to_selected(f, ids, df)
}

/// Mean force over the selected atoms; `None` for an empty selection.
pub fn mean_force(f: &[Vector3<f64>], ids: &[usize]) -> Result<Option<Vector3<f64>>> {
    check_ids(f, ids)?;
    if ids.is_empty() {
        return Ok(None);
    }
    let sum: Vector3<f64> = ids.iter().map(|&id| f[id]).sum();
    Ok(Some(sum / ids.len() as f64))
}

/// Langevin coupling of buffer atoms to a bulk flow.
///
/// Each selected atom receives a drag `-zeta (v - u)` towards the target
/// velocity `u` plus a Gaussian random force whose per-component variance
/// `2 zeta kT` balances the drag at temperature `T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LangevinBoundary {
    /// Friction coefficient
    pub zeta: f64,
    /// Bath temperature (K)
    pub temperature: f64,
}

impl LangevinBoundary {
    pub fn new(zeta: f64, temperature: f64) -> Self {
        LangevinBoundary { zeta, temperature }
    }

    /// Standard deviation of each random force component.
    pub fn noise_sigma(&self) -> f64 {
        (2.0 * thermal_energy(self.temperature) * self.zeta).sqrt()
    }

    /// Deterministic part of the force on an atom moving with `v`.
    #[inline]
    pub fn drag(&self, v: &Vector3<f64>, target: &Vector3<f64>) -> Vector3<f64> {
        -(v - target) * self.zeta
    }

    /// Add the boundary force to every atom in `ids`.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        f: &mut [Vector3<f64>],
        v: &[Vector3<f64>],
        target: &Vector3<f64>,
        ids: &[usize],
        rng: &mut R,
    ) -> Result<()> {
        check_ids(f, ids)?;
        check_ids(v, ids)?;

        let sigma = self.noise_sigma();
        if sigma == 0.0 {
            for &id in ids {
                f[id] += self.drag(&v[id], target);
            }
            return Ok(());
        }

        let noise = Normal::new(0.0, sigma).map_err(|e| ConfigError::Invalid {
            field: "boundary noise",
            message: e.to_string(),
        })?;
        for &id in ids {
            let kick = Vector3::new(
                noise.sample(&mut *rng),
                noise.sample(&mut *rng),
                noise.sample(&mut *rng),
            );
            f[id] += self.drag(&v[id], target) + kick;
        }
        Ok(())
    }
}
