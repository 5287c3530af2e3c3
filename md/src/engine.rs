//! Seams to the external MD engine.
//!
//! The engine owns the per-atom arrays and the integrator. The driver only
//! issues input lines through [`CommandSink`] and touches the raw buffers
//! through [`MdEngine`] between runs.

use crate::error::EngineError;
use nalgebra::Vector3;
use std::path::Path;

pub trait CommandSink {
    /// Issue a single input line.
    fn command(&mut self, line: &str) -> Result<(), EngineError>;

    /// Process an engine input file.
    fn file(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Mark the start of a setup phase. Engines ignore it; recorders may
    /// use it to annotate their output.
    fn section(&mut self, _title: &str) {}
}

pub trait MdEngine: CommandSink {
    /// Total number of atoms in the simulation.
    fn natoms(&self) -> usize;

    /// Positions of atoms owned by this rank.
    fn positions(&self) -> &[Vector3<f64>];

    /// Velocities of atoms owned by this rank.
    fn velocities(&self) -> &[Vector3<f64>];

    /// Force buffer of atoms owned by this rank, together with read access to
    /// the velocities. Writes land in the engine's own array.
    fn forces_and_velocities(&mut self) -> (&mut [Vector3<f64>], &[Vector3<f64>]);

    /// Advance the engine by `nsteps` timesteps with whatever fixes are active.
    fn run(&mut self, nsteps: usize) -> Result<(), EngineError> {
        self.command(&format!("run {}", nsteps))
    }

    fn close(&mut self) -> Result<(), EngineError>;

    /// Ids of atoms local to this rank.
    fn local_atom_ids(&self) -> Vec<usize> {
        (0..self.positions().len()).collect()
    }

    fn forces_mut(&mut self) -> &mut [Vector3<f64>] {
        self.forces_and_velocities().0
    }
}

/// Check that the engine exposes consistent local buffers.
pub fn check_buffers<E: MdEngine + ?Sized>(engine: &mut E) -> Result<usize, EngineError> {
    let n = engine.positions().len();
    let nv = engine.velocities().len();
    if nv != n {
        return Err(EngineError::BufferLength {
            buffer: "v",
            len: nv,
            expected: n,
        });
    }
    let nf = engine.forces_mut().len();
    if nf != n {
        return Err(EngineError::BufferLength {
            buffer: "f",
            len: nf,
            expected: n,
        });
    }
    Ok(n)
}
