mod report;
mod runner;

pub use runner::{run_deck, run_field, run_init_config, run_profile, run_xyz2pdb};

use crate::config::{Args, Command};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::Result;

pub struct HacApplication {
    args: Args,
}

impl HacApplication {
    pub fn from_cli() -> Result<Self> {
        Ok(Self {
            args: Args::parse(),
        })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.log_file.as_deref(), self.args.verbose)?;

        match &self.args.command {
            Command::Deck(args) => run_deck(args),
            Command::InitConfig { output } => run_init_config(output),
            Command::Profile { files } => run_profile(files),
            Command::Xyz2pdb(args) => run_xyz2pdb(args),
            Command::Field(args) => run_field(args),
        }
    }
}
