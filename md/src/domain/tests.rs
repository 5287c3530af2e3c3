use super::*;
use crate::deck::InputDeck;
use approx::assert_relative_eq;

fn record<F>(config: &HacConfig, phase: F) -> Vec<String>
where
    F: FnOnce(&Setup<'_>, &mut InputDeck) -> Result<()>,
{
    let setup = Setup::new(config);
    let mut deck = InputDeck::new();
    phase(&setup, &mut deck).unwrap();
    deck.commands().map(str::to_string).collect()
}

#[test]
fn test_walled_domain_geometry() {
    let config = HacConfig::default();
    let d = Domain::from_config(&config);

    assert_relative_eq!(d.lx, 57.8, epsilon = 1e-10);
    assert_relative_eq!(d.ly, 34.68, epsilon = 1e-12);
    assert_relative_eq!(d.buffer_width, 11.56, epsilon = 1e-10);
    assert_relative_eq!(d.xlo, -0.85, epsilon = 1e-12);
    assert_relative_eq!(d.xhi, 57.8 + 0.85, epsilon = 1e-10);

    let [xx, yy, zz] = d.lattice_extent();
    assert_relative_eq!(xx, 57.8 / 6.0, epsilon = 1e-10);
    assert_relative_eq!(yy, 5.78, epsilon = 1e-10);
    assert_relative_eq!(zz, 5.78, epsilon = 1e-10);
}

#[test]
fn test_periodic_domain_has_no_wall_margin() {
    let mut config = HacConfig::default();
    config.system.boundary = BoundaryStyle::Periodic;
    let d = Domain::from_config(&config);
    assert_eq!(d.xlo, 0.0);
    assert_eq!(d.xhi, d.lx);
}

#[test]
fn test_lj1043_walls_sit_further_out() {
    let mut config = HacConfig::default();
    config.system.wall.kind = WallKind::Lj1043;
    let d = Domain::from_config(&config);
    assert_relative_eq!(d.xlo, -1.7, epsilon = 1e-12);
}

#[test]
fn test_buffers_sit_at_box_edges() {
    let d = Domain::from_config(&HacConfig::default());
    let (left, right) = (d.left_buffer(), d.right_buffer());
    assert_eq!(left.lo, 0.0);
    assert_relative_eq!(left.hi, right.lo - 3.0 * d.buffer_width, epsilon = 1e-9);
    assert_eq!(right.hi, d.lx);
}

#[test]
fn test_setup_sequence() {
    let config = HacConfig::default();
    let setup = Setup::new(&config);
    let mut deck = InputDeck::new();
    let snapshot = setup.setup(&mut deck, None).unwrap();
    let commands: Vec<_> = deck.commands().collect();

    assert_eq!(commands[0], "units real");
    assert_eq!(commands[1], "newton on");
    assert_eq!(commands[2], "dimension    3");
    assert_eq!(commands[3], "boundary     f p p");
    assert!(commands.contains(&"create_box   1 rid_wall"));
    assert!(commands.contains(&"create_atoms 1 region mybox units box"));
    assert!(commands.contains(&"mass  1 39.948"));
    assert!(commands.contains(&"pair_style  lj/cut 12"));
    assert!(commands.contains(&"pair_coeff  1 1 0.23748 3.4 12"));
    assert!(commands.contains(&"neigh_modify delay 0 every 20 check no"));
    assert_eq!(
        commands[commands.len() - 1],
        "restart 1000 lj_pylmp_hac_a.res lj_pylmp_hac_b.res"
    );

    assert_eq!(
        snapshot,
        PathBuf::from("data/lj_pylmp_hac_test/init_lj_pylmp_hac.xyz")
    );
    assert!(commands.contains(&"write_dump all xyz data/lj_pylmp_hac_test/init_lj_pylmp_hac.xyz"));
}

#[test]
fn test_setup_includes_input_file_first() {
    let config = HacConfig::default();
    let setup = Setup::new(&config);
    let mut deck = InputDeck::new();
    setup.setup(&mut deck, Some(Path::new("in.extra"))).unwrap();
    assert_eq!(deck.commands().next(), Some("include in.extra"));
}

#[test]
fn test_periodic_box_uses_lattice_region() {
    let mut config = HacConfig::default();
    config.system.boundary = BoundaryStyle::Periodic;
    let commands = record(&config, |s, deck| s.create_box(deck));

    assert!(commands.contains(&"boundary     p p p".to_string()));
    assert!(commands.contains(&"create_box   1 mybox".to_string()));
    assert!(!commands.iter().any(|c| c.contains("rid_wall")));
}

#[test]
fn test_wall_fixes() {
    let config = HacConfig::default();
    let commands = record(&config, |s, deck| s.setup_wall(deck));

    assert_eq!(commands.len(), 2);
    assert_eq!(
        commands[0],
        "fix wall_xlo all wall/lj126 xlo -0.85 0.05937 1.7 3.4 units box"
    );
    assert!(commands[1].starts_with("fix wall_xhi all wall/lj126 xhi 58.6"));
    assert!(commands[1].ends_with("0.05937 1.7 3.4 units box"));
}

#[test]
fn test_velocities_and_minimize() {
    let config = HacConfig::default();
    let commands = record(&config, |s, deck| {
        s.init_velocities(deck)?;
        s.minimize(deck, "cg").map(|_| ())
    });

    assert!(commands[0].starts_with("velocity all create 9.44"));
    assert!(commands[0].ends_with("87287 loop geom"));
    assert!(commands.contains(&"min_style cg".to_string()));
    assert!(commands.contains(&"minimize   0.0 0.0 200 20000".to_string()));
    assert_eq!(commands.last().map(String::as_str), Some("undump emin"));
}

#[test]
fn test_equilibrate_ramps_temperature() {
    let config = HacConfig::default();
    let setup = Setup::new(&config);
    let mut deck = InputDeck::new();
    let snapshot = setup.equilibrate(&mut deck, 30.0, 94.4).unwrap();
    let commands: Vec<_> = deck.commands().collect();

    assert!(commands.contains(&"timestep 1"));
    assert!(commands.contains(&"fix      1 all nvt temp 30 94.4 100 tchain 1"));
    assert!(commands.contains(&"run      10000"));
    assert_eq!(&commands[commands.len() - 2..], &["unfix 1", "undump eq1"]);
    assert!(snapshot.ends_with("eq1_lj_pylmp_hac.xyz"));
}

#[test]
fn test_run_nve_writes_restart() {
    let config = HacConfig::default();
    let commands = record(&config, |s, deck| s.run_nve(deck, 10));

    assert_eq!(
        commands,
        vec![
            "thermo 100",
            "timestep 10",
            "fix      1 all nve",
            "run      10",
            "write_restart lj_pylmp_hac.res",
        ]
    );
}

#[test]
fn test_production_dump() {
    let config = HacConfig::default();
    let commands = record(&config, |s, deck| s.production_dump(deck));
    assert_eq!(
        commands,
        vec![
            "dump     run all dcd 10 data/lj_pylmp_hac_test/md_lj_pylmp_hac.dcd",
            "dump_modify run pbc yes",
        ]
    );
}

#[test]
fn test_native_buffers() {
    let config = HacConfig::default();
    let commands = record(&config, |s, deck| s.native_buffers(deck));

    assert_eq!(commands.len(), 6);
    let bounds = |c: &str| -> Vec<f64> {
        c.split_whitespace()
            .skip(3)
            .take(6)
            .map(|w| w.parse().unwrap())
            .collect()
    };
    assert!(commands[0].starts_with("region  rid_left block "));
    let left = bounds(commands[0].as_str());
    assert_relative_eq!(left[1], 11.56, epsilon = 1e-9);
    assert_relative_eq!(left[3], 34.68, epsilon = 1e-12);
    let right = bounds(commands[1].as_str());
    assert_relative_eq!(right[0], 46.24, epsilon = 1e-9);
    assert_relative_eq!(right[1], 57.8, epsilon = 1e-9);
    assert_eq!(commands[2], "group left_buf dynamic all region rid_left every 10");
    assert_eq!(commands[3], "group right_buf dynamic all region rid_right every 10");
    assert_eq!(commands[4], "fix lange_left left_buf langevin 94.4 94.4 39.948 12345");
    assert_eq!(commands[5], "fix lange_right right_buf langevin 94.4 94.4 39.948 12345");
}
