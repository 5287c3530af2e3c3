//! Simulation box geometry and the engine setup phases.
//!
//! Every phase only issues commands, so the same code drives a live engine
//! or records an [`InputDeck`](crate::deck::InputDeck).

use crate::buffer::{setup_buffer, Slab};
use crate::config::{BoundaryStyle, HacConfig, WallKind};
use crate::engine::CommandSink;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Box geometry derived from the configuration (Å).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub lattice_spacing: f64,
    /// Width of each buffer slab
    pub buffer_width: f64,
    /// Lower x edge of the simulation box
    pub xlo: f64,
    /// Upper x edge of the simulation box
    pub xhi: f64,
}

impl Domain {
    pub fn from_config(config: &HacConfig) -> Self {
        let system = &config.system;
        let l = system.box_length;
        let lx = l * system.x_aspect;
        let (xlo, xhi) = match system.boundary {
            BoundaryStyle::Walled => {
                let offset = system.wall.kind.offset() * config.potential.sigma();
                (-offset, lx + offset)
            }
            BoundaryStyle::Periodic => (0.0, lx),
        };
        Domain {
            lx,
            ly: l,
            lz: l,
            lattice_spacing: system.lattice_spacing,
            buffer_width: lx * config.buffer.width_fraction,
            xlo,
            xhi,
        }
    }

    /// Extent of the atom-filled region in lattice units.
    pub fn lattice_extent(&self) -> [f64; 3] {
        let inv = 1.0 / self.lattice_spacing;
        [self.lx * inv, self.ly * inv, self.lz * inv]
    }

    pub fn left_buffer(&self) -> Slab {
        Slab::new(0.0, self.buffer_width)
    }

    pub fn right_buffer(&self) -> Slab {
        Slab::new(self.lx - self.buffer_width, self.lx)
    }
}

/// Issues the setup, equilibration and production phases of a run.
pub struct Setup<'a> {
    config: &'a HacConfig,
    domain: Domain,
    data_dir: PathBuf,
}

impl<'a> Setup<'a> {
    pub fn new(config: &'a HacConfig) -> Self {
        Setup {
            config,
            domain: Domain::from_config(config),
            data_dir: config.output.data_dir(),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn config(&self) -> &HacConfig {
        self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn data_file(&self, prefix: &str, ext: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.{}", prefix, self.config.output.basename, ext))
    }

    /// Units, box, atoms, pair style and neighbor settings. Returns the path
    /// of the initial-structure snapshot.
    pub fn setup<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        input: Option<&Path>,
    ) -> Result<PathBuf> {
        info!("Setting up simulation...");
        if let Some(path) = input {
            sink.file(path)?;
        }

        sink.command("units real")?;
        sink.command("newton on")?;

        self.create_box(sink)?;
        self.init_positions(sink)?;

        let potential = &self.config.potential;
        let cutoff = potential.cutoff();
        sink.command(&format!("pair_style  lj/cut {}", cutoff))?;
        sink.command(&format!(
            "pair_coeff  1 1 {} {} {}",
            potential.epsilon(),
            potential.sigma(),
            cutoff
        ))?;
        sink.command("pair_modify shift yes")?;
        sink.command("neighbor     3.0 bin")?;
        sink.command("neigh_modify delay 0 every 20 check no")?;

        sink.command("thermo_style multi")?;

        let snapshot = self.data_file("init", "xyz");
        sink.command(&format!("write_dump all xyz {}", snapshot.display()))?;
        let base = &self.config.output.basename;
        sink.command(&format!(
            "restart {} {}_a.res {}_b.res",
            self.config.output.restart_interval, base, base
        ))?;
        Ok(snapshot)
    }

    pub fn create_box<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let d = &self.domain;
        let [xx, yy, zz] = d.lattice_extent();

        sink.command("dimension    3")?;
        match self.config.system.boundary {
            BoundaryStyle::Walled => sink.command("boundary     f p p")?,
            BoundaryStyle::Periodic => sink.command("boundary     p p p")?,
        }
        sink.command("atom_style   atomic")?;
        sink.command("atom_modify  map hash")?;
        sink.command(&format!("lattice      fcc {}", d.lattice_spacing))?;

        sink.command(&format!("region mybox block 0 {} 0 {} 0 {}", xx, yy, zz))?;
        match self.config.system.boundary {
            BoundaryStyle::Walled => {
                sink.command(&format!(
                    "region rid_wall block {} {} {} {} {} {} units box",
                    d.xlo, d.xhi, 0.0, d.ly, 0.0, d.lz
                ))?;
                sink.command("create_box   1 rid_wall")?;
            }
            BoundaryStyle::Periodic => sink.command("create_box   1 mybox")?,
        }
        Ok(())
    }

    pub fn init_positions<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.command("create_atoms 1 region mybox units box")?;
        sink.command(&format!("mass  1 {}", self.config.system.mass))?;
        Ok(())
    }

    /// LJ walls just outside the lattice region on both x faces.
    pub fn setup_wall<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let kind: WallKind = self.config.system.wall.kind;
        let sigma = self.config.potential.sigma();
        let epsilon = self.config.potential.epsilon();
        let offset = kind.offset() * sigma;
        let cutoff = kind.cutoff() * sigma;

        for (id, face, coord) in [
            ("wall_xlo", "xlo", -offset),
            ("wall_xhi", "xhi", self.domain.lx + offset),
        ] {
            sink.command(&format!(
                "fix {} all {} {} {} {} {} {} units box",
                id,
                kind.style(),
                face,
                coord,
                0.25 * epsilon,
                0.5 * sigma,
                cutoff
            ))?;
        }
        Ok(())
    }

    pub fn init_velocities<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.command(&format!(
            "velocity all create {} {} loop geom",
            0.1 * self.config.thermostat.te_sim,
            self.config.md.velocity_seed
        ))?;
        Ok(())
    }

    /// Energy minimization. Returns the path of the minimized snapshot.
    pub fn minimize<S: CommandSink + ?Sized>(&self, sink: &mut S, style: &str) -> Result<PathBuf> {
        let nmin = self.config.md.nmin;
        info!(">>> Minimizing for {} steps...", nmin);
        sink.command("thermo     100")?;
        sink.command(&format!(
            "dump       emin all dcd {} {}",
            self.config.output.minimize_dump_interval,
            self.data_file("em", "dcd").display()
        ))?;

        sink.command(&format!("min_style {}", style))?;
        sink.command(&format!("minimize   0.0 0.0 {} {}", nmin, 100 * nmin))?;
        let snapshot = self.data_file("em", "xyz");
        sink.command(&format!("write_dump all xyz {}", snapshot.display()))?;

        sink.command("undump emin")?;
        Ok(snapshot)
    }

    /// NVT equilibration ramping from `te_i` to `te_f`. Returns the path of
    /// the equilibrated snapshot.
    pub fn equilibrate<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        te_i: f64,
        te_f: f64,
    ) -> Result<PathBuf> {
        let md = &self.config.md;
        info!(">>> NVT equilibration for {} steps...", md.equilibration_steps);
        sink.command("thermo   100")?;
        sink.command(&format!("timestep {}", md.equilibration_timestep))?;
        sink.command(&format!(
            "fix      1 all nvt temp {} {} {} tchain 1",
            te_i, te_f, self.config.thermostat.damping
        ))?;
        sink.command(&format!(
            "dump     eq1 all dcd {} {}",
            self.config.output.equilibration_dump_interval,
            self.data_file("eq1", "dcd").display()
        ))?;

        sink.command(&format!("run      {}", md.equilibration_steps))?;
        let snapshot = self.data_file("eq1", "xyz");
        sink.command(&format!("write_dump all xyz {}", snapshot.display()))?;

        sink.command("unfix 1")?;
        sink.command("undump eq1")?;
        Ok(snapshot)
    }

    /// Production trajectory, written once per exchange.
    pub fn production_dump<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.command(&format!(
            "dump     run all dcd {} {}",
            self.config.md.n_md,
            self.data_file("md", "dcd").display()
        ))?;
        sink.command("dump_modify run pbc yes")?;
        Ok(())
    }

    /// Switch the engine to NVE with the production timestep.
    pub fn prepare_nve<S: CommandSink + ?Sized>(&self, sink: &mut S, n_md: usize) -> Result<()> {
        debug!("NVE segments of {} steps", n_md);
        sink.command(&format!("thermo {}", 10 * n_md))?;
        sink.command(&format!("timestep {}", self.config.md.dt_md))?;
        sink.command("fix      1 all nve")?;
        Ok(())
    }

    pub fn write_restart<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.command(&format!("write_restart {}.res", self.config.output.basename))?;
        Ok(())
    }

    /// Run an NVE segment of `n_md` steps and write a restart file.
    pub fn run_nve<S: CommandSink + ?Sized>(&self, sink: &mut S, n_md: usize) -> Result<()> {
        info!(">>> Running NVE simulation for {} steps...", n_md);
        self.prepare_nve(sink, n_md)?;
        sink.command(&format!("run      {}", n_md))?;
        self.write_restart(sink)
    }

    /// Everything ahead of production: setup, optional walls, buffer
    /// averaging, velocities, optional minimization, equilibration at
    /// `te_init` and the production trajectory dump. Returns the snapshots
    /// written on the way.
    pub fn prepare<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        input: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let mut snapshots = Vec::new();

        sink.section("setup");
        snapshots.push(self.setup(sink, input)?);
        if self.config.system.wall.enabled {
            sink.section("walls");
            self.setup_wall(sink)?;
        }
        sink.section("buffer averages");
        setup_buffer(sink, self.config)?;
        sink.section("velocities");
        self.init_velocities(sink)?;
        if self.config.md.minimize {
            sink.section("minimization");
            snapshots.push(self.minimize(sink, "cg")?);
        }
        sink.section("equilibration");
        let te = self.config.thermostat.te_init;
        snapshots.push(self.equilibrate(sink, te, te)?);
        sink.section("production");
        self.production_dump(sink)?;
        Ok(snapshots)
    }

    /// Production run with engine-side buffer thermostats. The run is split
    /// into NVE segments of `nout` coupling intervals, each ending in a
    /// restart file. Returns the number of segments.
    pub fn native_production<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<usize> {
        let md = &self.config.md;
        sink.section("buffer thermostats");
        self.native_buffers(sink)?;

        sink.section("NVE production");
        let full = md.nsteps / md.nout;
        let rest = md.nsteps % md.nout;
        for _ in 0..full {
            self.run_nve(sink, md.nout * md.n_md)?;
        }
        if rest > 0 {
            self.run_nve(sink, rest * md.n_md)?;
        }
        Ok(full + usize::from(rest > 0))
    }

    /// Engine-side buffer coupling: Langevin thermostats on dynamic groups
    /// that follow the two buffer slabs.
    pub fn native_buffers<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let d = &self.domain;
        let n_md = self.config.md.n_md;
        let te = self.config.thermostat.te_sim;
        let damp = self.config.system.mass / self.config.coupling.zeta_bare;
        let seed = self.config.coupling.seed;

        for (side, slab) in [("left", d.left_buffer()), ("right", d.right_buffer())] {
            sink.command(&format!(
                "region  rid_{} block {} {} {} {} {} {} units box",
                side, slab.lo, slab.hi, 0.0, d.ly, 0.0, d.lz
            ))?;
        }
        for side in ["left", "right"] {
            sink.command(&format!(
                "group {}_buf dynamic all region rid_{} every {}",
                side, side, n_md
            ))?;
        }
        for side in ["left", "right"] {
            sink.command(&format!(
                "fix lange_{} {}_buf langevin {} {} {} {}",
                side, side, te, te, damp, seed
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
