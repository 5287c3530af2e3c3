//! Command-line driver for hybrid atomistic-continuum (HAC) runs
//!
//! Renders engine input decks, inspects buffer averages and snapshots, and
//! exercises the field solver driver.

use color_eyre::eyre::Result;

mod app;
mod config;
mod io;

use app::HacApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    HacApplication::from_cli()?.run()
}
