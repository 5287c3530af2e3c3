//! Command-line argument parsing for HAC runs

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Driver for hybrid atomistic-continuum simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write the log to this file instead of stdout
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the engine input deck for a run with engine-side buffer coupling
    Deck(DeckArgs),

    /// Write the default configuration as YAML
    InitConfig {
        #[arg(short, long, default_value = "hac.yaml")]
        output: PathBuf,
    },

    /// Summarize buffer average files written during a run
    Profile {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Convert an XYZ snapshot to PDB using the configured box
    Xyz2pdb(Xyz2PdbArgs),

    /// Run the prescribed-flow field solver to its final time
    Field(FieldArgs),
}

#[derive(ClapArgs, Debug)]
pub struct DeckArgs {
    /// Path to the YAML configuration file (defaults when omitted)
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,

    /// Output script
    #[arg(short, long, default_value = "in.hac")]
    pub output: PathBuf,

    /// Engine input file included before the setup
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the number of coupling intervals
    #[arg(long)]
    pub nsteps: Option<usize>,

    /// Override the buffer thermostat seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimize before equilibration
    #[arg(long)]
    pub minimize: bool,

    /// Close the x boundaries with LJ walls
    #[arg(long)]
    pub walls: bool,
}

#[derive(ClapArgs, Debug)]
pub struct Xyz2PdbArgs {
    /// XYZ snapshot
    pub xyz: PathBuf,

    /// Output file (defaults to the snapshot path with a .pdb extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration that defines the box
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct FieldArgs {
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,

    /// Override the final time
    #[arg(long)]
    pub tf: Option<f64>,

    /// Override the timestep
    #[arg(long)]
    pub dt: Option<f64>,
}
