use super::report::{report_coupling, report_deck, report_field, report_profile};
use crate::config::{
    apply_deck_overrides, apply_field_overrides, load_config, DeckArgs, FieldArgs, Xyz2PdbArgs,
};
use color_eyre::eyre::{eyre, Result, WrapErr};
use hac_md::comm::gather_average;
use hac_md::config::CouplingMode;
use hac_md::profile::Profile;
use hac_md::xyz::{pdb_path, write_pdb, XyzFrame};
use hac_md::{Domain, FieldState, HacConfig, InputDeck, PrescribedFlow, SerialCommunicator};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run_deck(args: &DeckArgs) -> Result<()> {
    let mut config = load_config(args.config_file.as_deref())?;
    apply_deck_overrides(&mut config, args)?;
    if config.coupling.mode == CouplingMode::External {
        warn!("External coupling needs a live engine; the deck uses engine-side buffer thermostats");
    }
    report_coupling(&config);

    let (deck, snapshots) = InputDeck::native_run(&config, args.input.as_deref())
        .wrap_err("Failed to build the input deck")?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Unable to create directory: {}", parent.display()))?;
    }
    deck.save(&args.output)
        .wrap_err_with(|| format!("Unable to write deck: {}", args.output.display()))?;

    report_deck(&args.output, &deck, &snapshots, &config.output.data_dir());
    Ok(())
}

pub fn run_init_config(output: &Path) -> Result<()> {
    let config = HacConfig::default();
    config
        .to_file(output)
        .wrap_err_with(|| format!("Unable to write configuration: {}", output.display()))?;
    info!("Default configuration written to: {}", output.display());
    Ok(())
}

pub fn run_profile(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for path in files {
        match Profile::from_file(path) {
            Ok(profile) => report_profile(path, &profile),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }
    if failures == files.len() {
        return Err(eyre!("None of the {} profile files could be read", files.len()));
    }
    Ok(())
}

pub fn run_xyz2pdb(args: &Xyz2PdbArgs) -> Result<()> {
    let config = load_config(args.config_file.as_deref())?;
    let domain = Domain::from_config(&config);
    let frame = XyzFrame::from_file(&args.xyz)
        .wrap_err_with(|| format!("Unable to read snapshot: {}", args.xyz.display()))?;

    let output = args.output.clone().unwrap_or_else(|| pdb_path(&args.xyz));
    let mut writer = BufWriter::new(
        File::create(&output)
            .wrap_err_with(|| format!("Unable to create: {}", output.display()))?,
    );
    write_pdb(&mut writer, &frame, [domain.lx, domain.ly, domain.lz])?;
    writer.flush()?;

    info!(
        "Converted {} atoms from {} to {}",
        frame.len(),
        args.xyz.display(),
        output.display()
    );
    Ok(())
}

pub fn run_field(args: &FieldArgs) -> Result<()> {
    let mut config = load_config(args.config_file.as_deref())?;
    apply_field_overrides(&mut config, args)?;

    let flow = PrescribedFlow::from_config(&config);
    let mut state = FieldState::from_config(flow, &config.field)
        .wrap_err("Failed to set up the field solver")?;
    let steps = state.run_to_end()?;

    let comm = SerialCommunicator;
    let averaged = gather_average(&comm, &state.result_block())?;
    let clock = state.clock.clone();
    let solver = state.finish()?;

    if let Some(block) = averaged {
        report_field(&block, &clock, steps, solver.frames)?;
    }
    Ok(())
}
