use crate::io::write_field_table;
use color_eyre::eyre::Result;
use hac_md::buffer::Side;
use hac_md::field::{FieldArray, SolverClock};
use hac_md::force::LangevinBoundary;
use hac_md::profile::Profile;
use hac_md::units::effective_friction;
use hac_md::{HacConfig, InputDeck};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn report_coupling(config: &HacConfig) {
    let c = &config.coupling;
    let boundary = LangevinBoundary::new(c.zeta_bare, config.thermostat.te_sim);
    info!("Buffer coupling:");
    info!("  Mode: {:?}", c.mode);
    info!("  Bare friction: {:.4}", c.zeta_bare);
    info!(
        "  Effective friction: {:.6}",
        effective_friction(c.zeta_bare, c.eta, c.geometry_factor, c.hd_cell_size)
    );
    info!(
        "  Noise sigma at {} K: {:.6}",
        boundary.temperature,
        boundary.noise_sigma()
    );
    if let Ok(yaml) = serde_yml::to_string(config) {
        debug!("Resolved configuration:\n{}", yaml);
    }
}

pub fn report_deck(output: &Path, deck: &InputDeck, snapshots: &[PathBuf], data_dir: &Path) {
    info!("Wrote {} commands to {}", deck.len(), output.display());
    info!("Run output goes to {}", data_dir.display());
    info!("Snapshots written by the run:");
    for snapshot in snapshots {
        info!("  {}  (convert with `hac xyz2pdb`)", snapshot.display());
    }
}

pub fn report_profile(path: &Path, profile: &Profile) {
    let name = profile.columns.last().map(String::as_str).unwrap_or("value");
    match profile.summary() {
        Some(s) => info!(
            "{}: {} = {:.6} ± {:.6} over {} blocks (steps {}..{})",
            path.display(),
            name,
            s.mean,
            s.std,
            s.blocks,
            s.first_step,
            s.last_step
        ),
        None => info!("{}: no data", path.display()),
    }
}

pub fn report_field(block: &FieldArray, clock: &SolverClock, steps: usize, frames: usize) -> Result<()> {
    info!("\nField solver finished.");
    info!("  Steps: {}  t = {:.4}  outputs: {}", steps, clock.t, clock.nout);
    info!("  Frames written: {}", frames);
    for side in [Side::Left, Side::Right] {
        let u = block.edge_velocity(side);
        info!(
            "  {} edge velocity: [{:+.6}, {:+.6}, {:+.6}]",
            side.name(),
            u.x,
            u.y,
            u.z
        );
    }

    let mut table = Vec::new();
    write_field_table(&mut table, block)?;
    info!("\nAveraged cells:\n{}", String::from_utf8_lossy(&table));
    Ok(())
}
