//! Exchange loop between the MD engine and the continuum field solver.

use crate::buffer::{select_buffer_atoms, BufferPair, Side, Slab};
use crate::comm::{gather_average, Communicator};
use crate::config::{HacConfig, TargetSource};
use crate::domain::Setup;
use crate::engine::MdEngine;
use crate::error::Result;
use crate::field::{FieldArray, FieldSolver, FieldState};
use crate::force::{mean_force, LangevinBoundary};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// How many steps each side takes per exchange, and how many exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingSchedule {
    pub md_steps_per_exchange: usize,
    pub hd_steps_per_exchange: usize,
    pub exchanges: usize,
    /// Exchanges between progress reports and restart files
    pub report_every: usize,
}

impl CouplingSchedule {
    pub fn from_config(config: &HacConfig) -> Self {
        CouplingSchedule {
            md_steps_per_exchange: config.md.n_md,
            hd_steps_per_exchange: config.coupling.hd_steps_per_exchange,
            exchanges: config.md.nsteps,
            report_every: config.md.nout.max(1),
        }
    }
}

/// Where the buffer target velocities come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Targets {
    Constant {
        left: Vector3<f64>,
        right: Vector3<f64>,
    },
    /// Edge cells of the current field
    Field,
}

impl Targets {
    pub fn from_config(config: &HacConfig) -> Self {
        match config.coupling.target_source {
            TargetSource::Constant => Targets::Constant {
                left: Vector3::from(config.coupling.left_target),
                right: Vector3::from(config.coupling.right_target),
            },
            TargetSource::Field => Targets::Field,
        }
    }

    fn resolve(&self, field: &FieldArray, side: Side) -> Vector3<f64> {
        match (self, side) {
            (Targets::Constant { left, .. }, Side::Left) => *left,
            (Targets::Constant { right, .. }, Side::Right) => *right,
            (Targets::Field, side) => field.edge_velocity(side),
        }
    }
}

/// Per-buffer outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferReport {
    pub atoms: usize,
    pub target: Vector3<f64>,
    pub force_before: Option<Vector3<f64>>,
    pub force_after: Option<Vector3<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReport {
    pub index: usize,
    pub left: BufferReport,
    pub right: BufferReport,
    /// Rank-averaged result block, present on the root rank only
    pub field: Option<FieldArray>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CouplingSummary {
    pub exchanges: usize,
    pub md_steps: usize,
    pub hd_steps: usize,
    pub mean_left_atoms: f64,
    pub mean_right_atoms: f64,
    pub field: Option<FieldArray>,
}

/// Couples buffer atoms of an MD engine to a field solver through a
/// Langevin boundary force.
pub struct HybridCoupler<'a, E: MdEngine, S: FieldSolver, C: Communicator> {
    engine: E,
    field: FieldState<S>,
    comm: C,
    setup: Setup<'a>,
    buffers: BufferPair,
    boundary: LangevinBoundary,
    targets: Targets,
    schedule: CouplingSchedule,
    rng: StdRng,
    exchanges_done: usize,
}

impl<'a, E: MdEngine, S: FieldSolver, C: Communicator> HybridCoupler<'a, E, S, C> {
    pub fn new(engine: E, field: FieldState<S>, comm: C, config: &'a HacConfig) -> Self {
        let setup = Setup::new(config);
        let buffers = BufferPair::from_domain(setup.domain());
        // ranks draw independent noise streams
        let seed = config.coupling.seed.wrapping_add(comm.rank() as u64);
        HybridCoupler {
            engine,
            field,
            comm,
            setup,
            buffers,
            boundary: LangevinBoundary::new(config.coupling.zeta_bare, config.thermostat.te_sim),
            targets: Targets::from_config(config),
            schedule: CouplingSchedule::from_config(config),
            rng: StdRng::seed_from_u64(seed),
            exchanges_done: 0,
        }
    }

    pub fn with_schedule(mut self, schedule: CouplingSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_targets(mut self, targets: Targets) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_boundary(mut self, boundary: LangevinBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn schedule(&self) -> &CouplingSchedule {
        &self.schedule
    }

    pub fn boundary(&self) -> &LangevinBoundary {
        &self.boundary
    }

    pub fn buffers(&self) -> &BufferPair {
        &self.buffers
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn field(&self) -> &FieldState<S> {
        &self.field
    }

    /// Put the engine into the NVE production state.
    pub fn prepare(&mut self) -> Result<()> {
        self.setup
            .prepare_nve(&mut self.engine, self.schedule.md_steps_per_exchange)
    }

    fn couple_buffer(&mut self, side: Side, slab: Slab) -> Result<BufferReport> {
        let ids = self.engine.local_atom_ids();
        let selected = select_buffer_atoms(self.engine.positions(), &ids, slab)?;
        let target = self.targets.resolve(&self.field.q_io, side);

        let (f, v) = self.engine.forces_and_velocities();
        let force_before = mean_force(f, &selected)?;
        if !selected.is_empty() {
            self.boundary
                .apply(f, v, &target, &selected, &mut self.rng)?;
        }
        let force_after = mean_force(f, &selected)?;

        if let (Some(before), Some(after)) = (force_before, force_after) {
            debug!(
                "{} buffer: {} atoms, avgforce before {:?} after {:?}",
                side.name(),
                selected.len(),
                before.as_slice(),
                after.as_slice()
            );
        }

        Ok(BufferReport {
            atoms: selected.len(),
            target,
            force_before,
            force_after,
        })
    }

    /// One coupling cycle: MD segment, boundary forces, field steps and the
    /// rank reduction of the field result.
    pub fn exchange(&mut self) -> Result<ExchangeReport> {
        self.engine.run(self.schedule.md_steps_per_exchange)?;

        let left = self.couple_buffer(Side::Left, self.buffers.left)?;
        let right = self.couple_buffer(Side::Right, self.buffers.right)?;

        self.field.run_steps(self.schedule.hd_steps_per_exchange)?;
        let field = gather_average(&self.comm, &self.field.result_block())?;

        let index = self.exchanges_done;
        self.exchanges_done += 1;
        Ok(ExchangeReport {
            index,
            left,
            right,
            field,
        })
    }

    /// Run every scheduled exchange. Restart files are written at each report
    /// and once more at the end.
    pub fn run(&mut self) -> Result<CouplingSummary> {
        let schedule = self.schedule;
        let (mut left_atoms, mut right_atoms) = (0usize, 0usize);
        let mut field = None;

        for i in 0..schedule.exchanges {
            let report = self.exchange()?;
            left_atoms += report.left.atoms;
            right_atoms += report.right.atoms;
            if report.field.is_some() {
                field = report.field;
            }

            if (i + 1) % schedule.report_every == 0 {
                if self.comm.is_root() {
                    info!(
                        "exchange {}/{}: {} left / {} right buffer atoms, field t = {:.4}",
                        i + 1,
                        schedule.exchanges,
                        report.left.atoms,
                        report.right.atoms,
                        self.field.clock.t
                    );
                }
                self.setup.write_restart(&mut self.engine)?;
            }
        }
        if schedule.exchanges % schedule.report_every != 0 {
            self.setup.write_restart(&mut self.engine)?;
        }

        let n = schedule.exchanges.max(1) as f64;
        Ok(CouplingSummary {
            exchanges: schedule.exchanges,
            md_steps: schedule.exchanges * schedule.md_steps_per_exchange,
            hd_steps: schedule.exchanges * schedule.hd_steps_per_exchange,
            mean_left_atoms: left_atoms as f64 / n,
            mean_right_atoms: right_atoms as f64 / n,
            field,
        })
    }

    /// Close the engine, clean up the solver and hand both back.
    pub fn finish(mut self) -> Result<(E, S)> {
        self.engine.close()?;
        let solver = self.field.finish()?;
        Ok((self.engine, solver))
    }
}
