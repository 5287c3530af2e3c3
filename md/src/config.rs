use crate::error::{ConfigError, Result};
use crate::units::argon;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a hybrid atomistic-continuum run
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HacConfig {
    /// Simulation box and lattice
    pub system: SystemConfig,
    /// Pair potential parameters
    pub potential: PotentialConfig,
    /// Temperatures and pressures
    pub thermostat: ThermostatConfig,
    /// MD phase lengths and timesteps
    pub md: MdRunConfig,
    /// Buffer slabs and their time averaging
    pub buffer: BufferConfig,
    /// Atomistic-continuum coupling
    pub coupling: CouplingConfig,
    /// Continuum field arrays and solver clock
    pub field: FieldConfig,
    /// Output files
    pub output: OutputConfig,
}

/// Simulation box configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    /// Length of a single box dimension in Å
    pub box_length: f64,
    /// Ratio Lx / L of the coupled direction
    pub x_aspect: f64,
    /// FCC lattice spacing in Å
    pub lattice_spacing: f64,
    /// Atomic mass in g/mol
    pub mass: f64,
    /// Boundary treatment along x
    pub boundary: BoundaryStyle,
    /// Repulsive walls closing the x boundaries
    pub wall: WallConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStyle {
    /// Fixed x boundary enclosing a wall region, periodic y and z
    Walled,
    /// Periodic in all directions
    Periodic,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WallConfig {
    pub enabled: bool,
    pub kind: WallKind,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WallKind {
    /// 12-6 LJ wall
    Lj126,
    /// 10-4-3 LJ wall
    Lj1043,
}

/// Potential energy configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum PotentialConfig {
    /// Truncated and shifted Lennard-Jones potential
    #[serde(rename = "lennard_jones")]
    LennardJones {
        /// Well depth parameter ε (kcal/mol)
        epsilon: f64,
        /// Collision diameter σ (Å)
        sigma: f64,
        /// Cutoff distance (Å)
        #[serde(default = "default_lj_cutoff")]
        cutoff: f64,
    },
}

/// Temperatures (K) and pressures (atm)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ThermostatConfig {
    /// Equilibration temperature
    pub te_init: f64,
    /// Production temperature, also used by the boundary thermostat
    pub te_sim: f64,
    pub pr_init: f64,
    pub pr_sim: f64,
    /// Nose-Hoover damping time (fs)
    pub damping: f64,
}

/// MD phase configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MdRunConfig {
    /// Production timestep (fs)
    pub dt_md: f64,
    /// MD steps per coupling exchange
    pub n_md: usize,
    /// Energy minimization steps
    pub nmin: usize,
    /// Whether to minimize before equilibration
    pub minimize: bool,
    /// Number of coupling exchanges in production
    pub nsteps: usize,
    /// Progress report interval, in exchanges
    pub nout: usize,
    /// NVT equilibration length
    pub equilibration_steps: usize,
    /// NVT equilibration timestep (fs)
    pub equilibration_timestep: f64,
    /// Seed for the initial velocity distribution
    pub velocity_seed: u64,
}

/// Buffer slab configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Width of each slab as a fraction of Lx
    pub width_fraction: f64,
    /// Sample every this many steps
    pub every: usize,
    /// Number of samples per average
    pub repeat: usize,
    /// Average output interval
    pub frequency: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouplingMode {
    /// The engine thermostats the buffers itself with `fix langevin`
    Native,
    /// The driver applies the boundary force to the engine's buffers
    External,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Fixed target velocities from this configuration
    Constant,
    /// Cell velocities of the continuum field at each buffer
    Field,
}

/// Atomistic-continuum coupling configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CouplingConfig {
    pub mode: CouplingMode,
    pub target_source: TargetSource,
    /// Bare friction coefficient
    pub zeta_bare: f64,
    /// Shear viscosity (Poise)
    pub eta: f64,
    /// Lattice geometry factor
    pub geometry_factor: f64,
    /// Hydrodynamic cell size (Å)
    pub hd_cell_size: f64,
    /// Target bulk velocity of the left buffer (Å/fs)
    pub left_target: [f64; 3],
    /// Target bulk velocity of the right buffer (Å/fs)
    pub right_target: [f64; 3],
    /// Field solver steps per exchange
    pub hd_steps_per_exchange: usize,
    /// Seed for the boundary noise
    pub seed: u64,
}

/// Continuum field configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Number of conserved variables
    pub nq: usize,
    /// Number of basis functions per cell
    pub nb: usize,
    /// Final solver time
    pub tf: f64,
    /// Solver timestep
    pub dt: f64,
    /// Output interval; defaults to tf / 1000
    pub dtout: Option<f64>,
    /// Density of the prescribed flow
    pub density: f64,
    /// Shear rate du_y/dx of the prescribed flow; defaults to the gradient
    /// between the two buffer targets
    pub shear_rate: Option<f64>,
}

/// Output configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Base name of simulation files
    pub basename: String,
    /// Output directory; defaults to `data/<basename>_test`
    pub data_dir: Option<PathBuf>,
    /// Restart file interval
    pub restart_interval: usize,
    /// Minimization trajectory interval
    pub minimize_dump_interval: usize,
    /// Equilibration trajectory interval
    pub equilibration_dump_interval: usize,
}

fn default_lj_cutoff() -> f64 {
    argon::CUTOFF
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            box_length: 34.68,
            x_aspect: 5.0 / 3.0,
            lattice_spacing: 6.0,
            mass: argon::MASS,
            boundary: BoundaryStyle::Walled,
            wall: WallConfig::default(),
        }
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        WallConfig {
            enabled: false,
            kind: WallKind::Lj126,
        }
    }
}

impl Default for PotentialConfig {
    fn default() -> Self {
        PotentialConfig::LennardJones {
            epsilon: argon::EPSILON,
            sigma: argon::SIGMA,
            cutoff: argon::CUTOFF,
        }
    }
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        ThermostatConfig {
            te_init: 30.0,
            te_sim: 94.4,
            pr_init: 1.0,
            pr_sim: 1.0,
            damping: 100.0,
        }
    }
}

impl Default for MdRunConfig {
    fn default() -> Self {
        MdRunConfig {
            dt_md: 10.0,
            n_md: 10,
            nmin: 200,
            minimize: false,
            nsteps: 10000,
            nout: 100,
            equilibration_steps: 10000,
            equilibration_timestep: 1.0,
            velocity_seed: 87287,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            width_fraction: 0.2,
            every: 2,
            repeat: 5,
            frequency: 10,
        }
    }
}

impl Default for CouplingConfig {
    fn default() -> Self {
        CouplingConfig {
            mode: CouplingMode::Native,
            target_source: TargetSource::Constant,
            zeta_bare: 1.0,
            eta: 2.084e-3,
            geometry_factor: 45.5,
            hd_cell_size: 10.0,
            left_target: [0.0, 0.0, 0.0],
            right_target: [0.0, 1.0, 0.0],
            hd_steps_per_exchange: 1,
            seed: 12345,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            nx: 4,
            ny: 4,
            nz: 1,
            nq: 11,
            nb: 8,
            tf: 1.0e2,
            dt: 1.0e-2,
            dtout: None,
            density: 1.0,
            shear_rate: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            basename: "lj_pylmp_hac".to_string(),
            data_dir: None,
            restart_interval: 1000,
            minimize_dump_interval: 10,
            equilibration_dump_interval: 100,
        }
    }
}

impl PotentialConfig {
    pub fn epsilon(&self) -> f64 {
        match self {
            PotentialConfig::LennardJones { epsilon, .. } => *epsilon,
        }
    }

    pub fn sigma(&self) -> f64 {
        match self {
            PotentialConfig::LennardJones { sigma, .. } => *sigma,
        }
    }

    pub fn cutoff(&self) -> f64 {
        match self {
            PotentialConfig::LennardJones { cutoff, .. } => *cutoff,
        }
    }
}

impl WallKind {
    /// Wall position outside the lattice region, in units of σ.
    pub fn offset(self) -> f64 {
        match self {
            WallKind::Lj126 => 0.25,
            WallKind::Lj1043 => 0.5,
        }
    }

    /// Wall interaction cutoff, in units of σ.
    pub fn cutoff(self) -> f64 {
        match self {
            WallKind::Lj126 => 1.0,
            WallKind::Lj1043 => 1.5,
        }
    }

    pub fn style(self) -> &'static str {
        match self {
            WallKind::Lj126 => "wall/lj126",
            WallKind::Lj1043 => "wall/lj1043",
        }
    }
}

impl FieldConfig {
    pub fn output_interval(&self) -> f64 {
        self.dtout.unwrap_or(self.tf / 1000.0)
    }
}

impl OutputConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("data/{}_test", self.basename)))
    }
}

fn positive(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn nonzero(field: &'static str, value: usize) -> std::result::Result<(), ConfigError> {
    positive(field, value as f64)
}

impl HacConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: HacConfig = serde_yml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let system = &self.system;
        positive("system.box_length", system.box_length)?;
        positive("system.x_aspect", system.x_aspect)?;
        positive("system.lattice_spacing", system.lattice_spacing)?;
        positive("system.mass", system.mass)?;

        positive("potential.epsilon", self.potential.epsilon())?;
        positive("potential.sigma", self.potential.sigma())?;
        positive("potential.cutoff", self.potential.cutoff())?;

        positive("thermostat.te_init", self.thermostat.te_init)?;
        positive("thermostat.te_sim", self.thermostat.te_sim)?;
        positive("thermostat.damping", self.thermostat.damping)?;

        if system.wall.enabled && system.boundary == BoundaryStyle::Periodic {
            return Err(ConfigError::Invalid {
                field: "system.wall.enabled",
                message: "walls need a non-periodic x boundary".to_string(),
            });
        }

        positive("md.dt_md", self.md.dt_md)?;
        positive("md.equilibration_timestep", self.md.equilibration_timestep)?;
        nonzero("md.n_md", self.md.n_md)?;
        nonzero("md.nout", self.md.nout)?;

        let buffer = &self.buffer;
        positive("buffer.width_fraction", buffer.width_fraction)?;
        if buffer.width_fraction >= 0.5 {
            let length = system.box_length * system.x_aspect;
            return Err(ConfigError::OverlappingBuffers {
                width: buffer.width_fraction * length,
                length,
            });
        }
        nonzero("buffer.every", buffer.every)?;
        nonzero("buffer.repeat", buffer.repeat)?;
        nonzero("buffer.frequency", buffer.frequency)?;
        if buffer.frequency % buffer.every != 0 {
            return Err(ConfigError::Averaging(format!(
                "frequency {} is not a multiple of every {}",
                buffer.frequency, buffer.every
            )));
        }
        if buffer.repeat * buffer.every > buffer.frequency {
            return Err(ConfigError::Averaging(format!(
                "{} samples every {} steps do not fit in {} steps",
                buffer.repeat, buffer.every, buffer.frequency
            )));
        }

        let coupling = &self.coupling;
        positive("coupling.zeta_bare", coupling.zeta_bare)?;
        positive("coupling.eta", coupling.eta)?;
        positive("coupling.geometry_factor", coupling.geometry_factor)?;
        positive("coupling.hd_cell_size", coupling.hd_cell_size)?;

        let field = &self.field;
        for (name, n) in [
            ("field.nx", field.nx),
            ("field.ny", field.ny),
            ("field.nz", field.nz),
            ("field.nb", field.nb),
        ] {
            nonzero(name, n)?;
        }
        if field.nq < 4 {
            return Err(ConfigError::Invalid {
                field: "field.nq",
                message: format!("need density and three momenta, got {} variables", field.nq),
            });
        }
        positive("field.tf", field.tf)?;
        positive("field.dt", field.dt)?;
        positive("field.dtout", field.output_interval())?;
        positive("field.density", field.density)?;

        if self.output.basename.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output.basename",
                message: "must not be empty".to_string(),
            });
        }
        nonzero("output.restart_interval", self.output.restart_interval)?;
        nonzero("output.minimize_dump_interval", self.output.minimize_dump_interval)?;
        nonzero(
            "output.equilibration_dump_interval",
            self.output.equilibration_dump_interval,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = HacConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.system.box_length * config.system.x_aspect, 57.8, epsilon = 1e-10);
        assert_eq!(config.output.data_dir(), PathBuf::from("data/lj_pylmp_hac_test"));
        assert_relative_eq!(config.field.output_interval(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = HacConfig::from_yaml("{}").unwrap();
        assert_eq!(config, HacConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "
thermostat:
  te_sim: 120.0
coupling:
  mode: external
  right_target: [0.0, 0.5, 0.0]
potential:
  type: lennard_jones
  epsilon: 0.2
  sigma: 3.0
";
        let config = HacConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.thermostat.te_sim, 120.0);
        assert_eq!(config.thermostat.te_init, 30.0);
        assert_eq!(config.coupling.mode, CouplingMode::External);
        assert_eq!(config.coupling.right_target, [0.0, 0.5, 0.0]);
        assert_eq!(config.potential.cutoff(), argon::CUTOFF);
        assert_eq!(config.potential.sigma(), 3.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HacConfig::default();

        config.md.dt_md = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "md.dt_md",
                value: -1.0
            })
        );
        config.md.dt_md = 10.0;

        config.coupling.zeta_bare = 0.0;
        assert!(config.validate().is_err());
        config.coupling.zeta_bare = 1.0;

        config.buffer.width_fraction = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlappingBuffers { .. })
        ));
        config.buffer.width_fraction = 0.2;

        config.system.wall.enabled = true;
        config.system.boundary = BoundaryStyle::Periodic;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
        config.system.boundary = BoundaryStyle::Walled;
        assert!(config.validate().is_ok());

        config.field.nq = 3;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_averaging_validation() {
        let mut config = HacConfig::default();

        config.buffer.frequency = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Averaging(_))));

        config.buffer.frequency = 8;
        assert!(matches!(config.validate(), Err(ConfigError::Averaging(_))));

        config.buffer.repeat = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_io() {
        let mut config = HacConfig::default();
        config.system.boundary = BoundaryStyle::Periodic;
        config.system.wall.kind = WallKind::Lj1043;
        config.field.dtout = Some(0.5);

        let temp_file = tempfile::NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded = HacConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "md:\n  n_md: 0\n").unwrap();
        assert!(HacConfig::from_file(temp_file.path()).is_err());
    }
}
