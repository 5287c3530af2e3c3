//! Configuration loading and command-line overrides

mod args;

pub use args::{Args, Command, DeckArgs, FieldArgs, Xyz2PdbArgs};

use color_eyre::eyre::{Result, WrapErr};
use hac_md::HacConfig;
use std::path::Path;
use tracing::info;

/// Read and validate a configuration file, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<HacConfig> {
    match path {
        Some(path) => {
            info!("Reading configuration from: {}", path.display());
            HacConfig::from_file(path)
                .wrap_err_with(|| format!("Unable to load configuration file: {}", path.display()))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(HacConfig::default())
        }
    }
}

pub fn apply_deck_overrides(config: &mut HacConfig, args: &DeckArgs) -> Result<()> {
    if let Some(nsteps) = args.nsteps {
        info!("Overriding nsteps with: {}", nsteps);
        config.md.nsteps = nsteps;
    }
    if let Some(seed) = args.seed {
        info!("Overriding coupling seed with: {}", seed);
        config.coupling.seed = seed;
    }
    if args.minimize {
        config.md.minimize = true;
    }
    if args.walls {
        config.system.wall.enabled = true;
    }
    config
        .validate()
        .wrap_err("Configuration is invalid after command-line overrides")
}

pub fn apply_field_overrides(config: &mut HacConfig, args: &FieldArgs) -> Result<()> {
    if let Some(tf) = args.tf {
        info!("Overriding tf with: {}", tf);
        config.field.tf = tf;
    }
    if let Some(dt) = args.dt {
        info!("Overriding dt with: {}", dt);
        config.field.dt = dt;
    }
    config
        .validate()
        .wrap_err("Configuration is invalid after command-line overrides")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn deck_args() -> DeckArgs {
        DeckArgs {
            config_file: None,
            output: PathBuf::from("in.hac"),
            input: None,
            nsteps: None,
            seed: None,
            minimize: false,
            walls: false,
        }
    }

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), HacConfig::default());
    }

    #[test]
    fn loads_written_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hac.yaml");
        let mut config = HacConfig::default();
        config.md.nsteps = 42;
        config.to_file(&path).unwrap();

        assert_eq!(load_config(Some(path.as_path())).unwrap().md.nsteps, 42);
        let missing = dir.path().join("missing.yaml");
        assert!(load_config(Some(missing.as_path())).is_err());
    }

    #[test]
    fn deck_overrides() {
        let mut config = HacConfig::default();
        let args = DeckArgs {
            nsteps: Some(7),
            seed: Some(99),
            walls: true,
            ..deck_args()
        };
        apply_deck_overrides(&mut config, &args).unwrap();
        assert_eq!(config.md.nsteps, 7);
        assert_eq!(config.coupling.seed, 99);
        assert!(config.system.wall.enabled);
    }

    #[test]
    fn invalid_field_override_is_rejected() {
        let mut config = HacConfig::default();
        let args = FieldArgs {
            config_file: None,
            tf: None,
            dt: Some(-0.1),
        };
        assert!(apply_field_overrides(&mut config, &args).is_err());
    }
}
