//! Continuum field arrays and the seam to the external field solver.
//!
//! Field arrays follow the solver's layout: column-major `f32` with shape
//! `(nx, ny, nz, nQ, nB)`, i.e. cells, conserved variables and basis
//! functions. Basis 0 holds the cell average.

use crate::buffer::Side;
use crate::config::{FieldConfig, HacConfig};
use crate::domain::Domain;
use crate::error::{HacError, Result};
use nalgebra::Vector3;
use ndarray::{s, Array5, ShapeBuilder};
use tracing::{debug, info};

/// Indices of the conserved variables.
pub mod var {
    pub const RH: usize = 0;
    pub const MX: usize = 1;
    pub const MY: usize = 2;
    pub const MZ: usize = 3;
    pub const EN: usize = 4;
    pub const EXX: usize = 5;
    pub const EYY: usize = 6;
    pub const EZZ: usize = 7;
    pub const EXY: usize = 8;
    pub const EXZ: usize = 9;
    pub const EYZ: usize = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub nq: usize,
    pub nb: usize,
}

impl FieldShape {
    pub fn new(nx: usize, ny: usize, nz: usize, nq: usize, nb: usize) -> Self {
        FieldShape { nx, ny, nz, nq, nb }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        FieldShape::new(config.nx, config.ny, config.nz, config.nq, config.nb)
    }

    pub fn dims(&self) -> [usize; 5] {
        [self.nx, self.ny, self.nz, self.nq, self.nb]
    }

    /// Shape of the per-rank block sent to the reduction: basis 0 only.
    pub fn result_shape(&self) -> FieldShape {
        FieldShape { nb: 1, ..*self }
    }

    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FieldShape {
    fn default() -> Self {
        FieldShape::new(4, 4, 1, 11, 8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    data: Array5<f32>,
}

impl FieldArray {
    pub fn zeros(shape: FieldShape) -> Self {
        let [nx, ny, nz, nq, nb] = shape.dims();
        FieldArray {
            data: Array5::zeros((nx, ny, nz, nq, nb).f()),
        }
    }

    pub fn from_array(data: Array5<f32>) -> Self {
        FieldArray { data }
    }

    pub fn shape(&self) -> FieldShape {
        let d = self.data.shape();
        FieldShape::new(d[0], d[1], d[2], d[3], d[4])
    }

    pub fn data(&self) -> &Array5<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array5<f32> {
        &mut self.data
    }

    pub fn into_array(self) -> Array5<f32> {
        self.data
    }

    /// Contiguous column-major storage, as handed to a Fortran solver.
    pub fn as_fortran_slice(&self) -> Option<&[f32]> {
        self.data.as_slice_memory_order().filter(|_| self.data.t().is_standard_layout())
    }

    pub fn ensure_shape(&self, expected: FieldShape) -> Result<()> {
        let found = self.shape();
        if found != expected {
            return Err(HacError::FieldShape {
                expected: expected.dims().to_vec(),
                found: found.dims().to_vec(),
            });
        }
        Ok(())
    }

    /// Set variable `q` of basis 0 in every cell, zeroing the higher bases.
    pub fn fill_variable(&mut self, q: usize, value: f32) {
        self.data.slice_mut(s![.., .., .., q, ..]).fill(0.0);
        self.data.slice_mut(s![.., .., .., q, 0]).fill(value);
    }

    /// Basis-0 slice with shape `(nx, ny, nz, nQ, 1)`.
    pub fn result_block(&self) -> FieldArray {
        let shape = self.shape().result_shape();
        let mut block = FieldArray::zeros(shape);
        block
            .data
            .assign(&self.data.slice(s![.., .., .., .., 0..1]));
        block
    }

    /// Flow velocity of a cell from its basis-0 density and momentum.
    pub fn cell_velocity(&self, ix: usize, iy: usize, iz: usize) -> Vector3<f64> {
        let at = |q: usize| self.data[[ix, iy, iz, q, 0]] as f64;
        let rho = at(var::RH);
        if rho <= 0.0 {
            return Vector3::zeros();
        }
        Vector3::new(at(var::MX), at(var::MY), at(var::MZ)) / rho
    }

    /// Mean cell velocity over the y-z plane of cells facing a buffer.
    /// Zero for an array without cells.
    pub fn edge_velocity(&self, side: Side) -> Vector3<f64> {
        let shape = self.shape();
        if shape.nx == 0 || shape.ny == 0 || shape.nz == 0 {
            return Vector3::zeros();
        }
        let ix = match side {
            Side::Left => 0,
            Side::Right => shape.nx - 1,
        };
        let mut sum = Vector3::zeros();
        for iy in 0..shape.ny {
            for iz in 0..shape.nz {
                sum += self.cell_velocity(ix, iy, iz);
            }
        }
        sum / (shape.ny * shape.nz) as f64
    }
}

/// Time and output bookkeeping shared with the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverClock {
    pub t: f64,
    pub tf: f64,
    pub dt: f64,
    /// Time of the last output
    pub t1: f64,
    /// Wall-clock start, filled by the solver
    pub t_start: f64,
    pub dtout: f64,
    /// Number of outputs written
    pub nout: usize,
}

impl SolverClock {
    pub fn new(tf: f64, dt: f64, dtout: f64) -> Self {
        SolverClock {
            t: 0.0,
            tf,
            dt,
            t1: 0.0,
            t_start: 0.0,
            dtout,
            nout: 0,
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        SolverClock::new(config.tf, config.dt, config.output_interval())
    }

    /// Slack for accumulated rounding in `t`.
    fn slack(&self) -> f64 {
        1e-6 * self.dt
    }

    pub fn finished(&self) -> bool {
        self.t + self.slack() >= self.tf
    }

    /// Whether output frame `nout + 1` is due; records it when it is.
    pub fn take_output(&mut self) -> bool {
        if self.t + self.slack() >= (self.nout + 1) as f64 * self.dtout {
            self.t1 = self.t;
            self.nout += 1;
            true
        } else {
            false
        }
    }
}

/// Entry points of a continuum solver.
pub trait FieldSolver {
    fn setup(&mut self, q_io: &mut FieldArray, clock: &mut SolverClock) -> Result<()>;

    /// Advance `q_io` by one timestep; `q1` and `q2` are stage scratch.
    fn step(
        &mut self,
        q_io: &mut FieldArray,
        q1: &mut FieldArray,
        q2: &mut FieldArray,
        clock: &mut SolverClock,
    ) -> Result<()>;

    fn generate_output(&mut self, q_io: &FieldArray, clock: &mut SolverClock) -> Result<()>;

    fn cleanup(&mut self, clock: &SolverClock) -> Result<()>;
}

/// Solver state: the three field arrays, the clock and the solver itself.
pub struct FieldState<S: FieldSolver> {
    solver: S,
    pub q_io: FieldArray,
    q1: FieldArray,
    q2: FieldArray,
    pub clock: SolverClock,
}

impl<S: FieldSolver> FieldState<S> {
    pub fn new(mut solver: S, shape: FieldShape, mut clock: SolverClock) -> Result<Self> {
        let mut q_io = FieldArray::zeros(shape);
        solver.setup(&mut q_io, &mut clock)?;
        q_io.ensure_shape(shape)?;
        Ok(FieldState {
            solver,
            q_io,
            q1: FieldArray::zeros(shape),
            q2: FieldArray::zeros(shape),
            clock,
        })
    }

    pub fn from_config(solver: S, config: &FieldConfig) -> Result<Self> {
        Self::new(
            solver,
            FieldShape::from_config(config),
            SolverClock::from_config(config),
        )
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    fn advance(&mut self) -> Result<()> {
        self.solver
            .step(&mut self.q_io, &mut self.q1, &mut self.q2, &mut self.clock)?;
        self.solver.generate_output(&self.q_io, &mut self.clock)
    }

    /// Take `n` solver steps, producing output after each.
    pub fn run_steps(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.advance()?;
        }
        debug!("field solver at t = {:.4}", self.clock.t);
        Ok(())
    }

    /// Step until the clock reaches its final time. Returns the step count.
    pub fn run_to_end(&mut self) -> Result<usize> {
        let mut steps = 0;
        while !self.clock.finished() {
            self.advance()?;
            steps += 1;
        }
        info!(
            "field solver reached t = {:.4} after {} steps ({} outputs)",
            self.clock.t, steps, self.clock.nout
        );
        Ok(steps)
    }

    pub fn result_block(&self) -> FieldArray {
        self.q_io.result_block()
    }

    pub fn finish(mut self) -> Result<S> {
        self.solver.cleanup(&self.clock)?;
        Ok(self.solver)
    }
}

/// A stationary flow: uniform density with velocity `u(x) = u0 + shear * (x - lx/2) ŷ`.
///
/// It carries no dynamics of its own and stands in for the continuum solver
/// when only the buffer targets are needed.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescribedFlow {
    pub density: f64,
    pub velocity: Vector3<f64>,
    pub shear_rate: f64,
    /// Length of the field domain along x
    pub length: f64,
    /// Output frames produced so far
    pub frames: usize,
}

impl PrescribedFlow {
    pub fn new(density: f64, velocity: Vector3<f64>, shear_rate: f64, length: f64) -> Self {
        PrescribedFlow {
            density,
            velocity,
            shear_rate,
            length,
            frames: 0,
        }
    }

    /// Flow spanning the atomistic box with the mean of the two configured
    /// buffer targets as its centre velocity.
    ///
    /// Without an explicit `field.shear_rate` the profile passes through both
    /// targets at the buffer centres.
    pub fn from_config(config: &HacConfig) -> Self {
        let coupling = &config.coupling;
        let left = Vector3::from(coupling.left_target);
        let right = Vector3::from(coupling.right_target);
        let domain = Domain::from_config(config);
        let shear_rate = config.field.shear_rate.unwrap_or_else(|| {
            // buffer centres sit lx - width apart
            let span = domain.lx - domain.buffer_width;
            if span > 0.0 {
                (right.y - left.y) / span
            } else {
                0.0
            }
        });
        PrescribedFlow::new(config.field.density, 0.5 * (left + right), shear_rate, domain.lx)
    }

    pub fn velocity_at(&self, x: f64) -> Vector3<f64> {
        self.velocity + Vector3::y() * (self.shear_rate * (x - 0.5 * self.length))
    }
}

impl FieldSolver for PrescribedFlow {
    fn setup(&mut self, q_io: &mut FieldArray, _clock: &mut SolverClock) -> Result<()> {
        let shape = q_io.shape();
        let dx = self.length / shape.nx as f64;
        q_io.data_mut().fill(0.0);
        let data = q_io.data_mut();
        for ix in 0..shape.nx {
            let u = self.velocity_at((ix as f64 + 0.5) * dx);
            let momentum = u * self.density;
            let mut cells = data.slice_mut(s![ix, .., .., .., 0]);
            cells.slice_mut(s![.., .., var::RH]).fill(self.density as f32);
            cells.slice_mut(s![.., .., var::MX]).fill(momentum.x as f32);
            cells.slice_mut(s![.., .., var::MY]).fill(momentum.y as f32);
            cells.slice_mut(s![.., .., var::MZ]).fill(momentum.z as f32);
        }
        Ok(())
    }

    fn step(
        &mut self,
        q_io: &mut FieldArray,
        q1: &mut FieldArray,
        q2: &mut FieldArray,
        clock: &mut SolverClock,
    ) -> Result<()> {
        q1.data_mut().assign(q_io.data());
        q2.data_mut().assign(q_io.data());
        clock.t += clock.dt;
        Ok(())
    }

    fn generate_output(&mut self, _q_io: &FieldArray, clock: &mut SolverClock) -> Result<()> {
        if clock.take_output() {
            self.frames += 1;
        }
        Ok(())
    }

    fn cleanup(&mut self, clock: &SolverClock) -> Result<()> {
        debug!("prescribed flow done at t = {} with {} frames", clock.t, self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shear_state() -> FieldState<PrescribedFlow> {
        let solver = PrescribedFlow::new(2.0, Vector3::new(0.0, 0.5, 0.0), 0.01, 40.0);
        FieldState::new(solver, FieldShape::default(), SolverClock::new(1.0, 0.1, 0.25)).unwrap()
    }

    #[test]
    fn test_fortran_layout() {
        let field = FieldArray::zeros(FieldShape::default());
        assert_eq!(field.data().shape(), &[4, 4, 1, 11, 8]);
        assert_eq!(field.data().strides(), &[1, 4, 16, 16, 176]);
        assert_eq!(field.as_fortran_slice().map(|s| s.len()), Some(4 * 4 * 11 * 8));
    }

    #[test]
    fn test_result_block_keeps_basis_zero() {
        let mut field = FieldArray::zeros(FieldShape::new(2, 2, 1, 5, 3));
        field.data_mut()[[1, 0, 0, var::MY, 0]] = 3.0;
        field.data_mut()[[1, 0, 0, var::MY, 2]] = 9.0;

        let block = field.result_block();
        assert_eq!(block.shape(), FieldShape::new(2, 2, 1, 5, 1));
        assert_eq!(block.data()[[1, 0, 0, var::MY, 0]], 3.0);
        assert!(block.as_fortran_slice().is_some());
    }

    #[test]
    fn test_fill_variable_zeros_higher_bases() {
        let mut field = FieldArray::zeros(FieldShape::new(2, 1, 1, 4, 2));
        field.data_mut()[[0, 0, 0, var::RH, 1]] = 5.0;
        field.fill_variable(var::RH, 1.5);
        assert_eq!(field.data()[[0, 0, 0, var::RH, 0]], 1.5);
        assert_eq!(field.data()[[0, 0, 0, var::RH, 1]], 0.0);
    }

    #[test]
    fn test_cell_velocity_of_empty_cell_is_zero() {
        let field = FieldArray::zeros(FieldShape::default());
        assert_eq!(field.cell_velocity(0, 0, 0), Vector3::zeros());
    }

    #[test]
    fn test_prescribed_shear_profile() {
        let state = shear_state();
        // cell centers at 5, 15, 25, 35; profile centered at 20
        let left = state.q_io.edge_velocity(Side::Left);
        let right = state.q_io.edge_velocity(Side::Right);
        assert_relative_eq!(left.y, 0.5 - 0.15, epsilon = 1e-6);
        assert_relative_eq!(right.y, 0.5 + 0.15, epsilon = 1e-6);
        assert_relative_eq!(left.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prescribed_flow_from_default_config() {
        let config = HacConfig::default();
        let flow = PrescribedFlow::from_config(&config);
        assert_eq!(flow.velocity, Vector3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(flow.length, 57.8, epsilon = 1e-10);
        // buffer centres at 5.78 and 52.02 carry the two targets
        assert_relative_eq!(flow.shear_rate, 1.0 / 46.24, epsilon = 1e-12);
        assert_relative_eq!(flow.velocity_at(5.78).y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(flow.velocity_at(52.02).y, 1.0, epsilon = 1e-12);

        // edge cells centred at lx/8 and 7lx/8
        let state = FieldState::from_config(flow, &config.field).unwrap();
        let left = state.q_io.edge_velocity(Side::Left);
        let right = state.q_io.edge_velocity(Side::Right);
        assert_relative_eq!(left.y, 0.03125, epsilon = 1e-5);
        assert_relative_eq!(right.y, 0.96875, epsilon = 1e-5);
        assert_eq!(state.clock.tf, 100.0);
    }

    #[test]
    fn test_explicit_shear_rate_wins() {
        let mut config = HacConfig::default();
        config.field.shear_rate = Some(0.0);
        let flow = PrescribedFlow::from_config(&config);
        assert_eq!(flow.shear_rate, 0.0);
        assert_eq!(flow.velocity_at(0.0), Vector3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_edge_velocity_of_empty_array_is_zero() {
        let field = FieldArray::from_array(Array5::zeros((0, 2, 1, 4, 1).f()));
        assert_eq!(field.edge_velocity(Side::Left), Vector3::zeros());
        assert_eq!(field.edge_velocity(Side::Right), Vector3::zeros());
    }

    #[test]
    fn test_run_to_end_counts_steps_and_outputs() {
        let mut state = shear_state();
        let steps = state.run_to_end().unwrap();
        assert_eq!(steps, 10);
        assert!(state.clock.finished());
        assert_eq!(state.clock.nout, 4);
        assert_eq!(state.solver().frames, 4);

        let solver = state.finish().unwrap();
        assert_eq!(solver.frames, 4);
    }

    #[test]
    fn test_run_steps_leaves_field_unchanged() {
        let mut state = shear_state();
        let before = state.q_io.clone();
        state.run_steps(3).unwrap();
        assert_eq!(state.q_io, before);
        assert_relative_eq!(state.clock.t, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let field = FieldArray::zeros(FieldShape::new(1, 1, 1, 4, 1));
        assert!(field.ensure_shape(FieldShape::default()).is_err());
    }
}
