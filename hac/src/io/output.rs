//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use hac_md::field::{var, FieldArray};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    filter::LevelFilter, fmt::format::Writer, fmt::layer, fmt::time::FormatTime,
    layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Wall-clock time of day with second precision
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Send log output to a file or stdout
pub fn setup_output(log_file: Option<&Path>, verbosity: u8) -> Result<()> {
    let level = level_for(verbosity);
    match log_file {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create log file: {}", path.display()))?;
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            Registry::default().with(level).with(file_layer).init();
            info!("Log written to: {}", path.display());
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(level).with(stdout_layer).init();
        }
    }
    Ok(())
}

/// Basis-0 density and velocity of every cell, one row per cell.
pub fn write_field_table<W: Write>(writer: &mut W, field: &FieldArray) -> Result<()> {
    let shape = field.shape();
    writeln!(writer, "# ix iy iz rho ux uy uz")?;
    for iz in 0..shape.nz {
        for iy in 0..shape.ny {
            for ix in 0..shape.nx {
                let rho = field.data()[[ix, iy, iz, var::RH, 0]];
                let u = field.cell_velocity(ix, iy, iz);
                writeln!(
                    writer,
                    "{:>3} {:>3} {:>3} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
                    ix, iy, iz, rho, u.x, u.y, u.z
                )?;
            }
        }
    }
    Ok(())
}
