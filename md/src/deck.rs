//! Command recorder that turns the setup phases into an engine input script.

use crate::config::HacConfig;
use crate::domain::Setup;
use crate::engine::CommandSink;
use crate::error::{EngineError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Command(String),
    Comment(String),
    Blank,
}

/// Ordered list of engine input lines.
#[derive(Debug, Clone, Default)]
pub struct InputDeck {
    lines: Vec<Line>,
}

impl InputDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            Line::Command(c) => Some(c.as_str()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.commands().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay every recorded command into another sink, e.g. a live engine.
    pub fn replay<S: CommandSink + ?Sized>(&self, sink: &mut S) -> std::result::Result<(), EngineError> {
        for command in self.commands() {
            sink.command(command)?;
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Command(c) => out.push_str(c),
                Line::Comment(c) => {
                    out.push_str("# ");
                    out.push_str(c);
                }
                Line::Blank => {}
            }
            out.push('\n');
        }
        out
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.render().as_bytes())?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    /// Complete script for a run coupled through engine-side buffer
    /// thermostats. Also returns the snapshots the script writes.
    pub fn native_run(config: &HacConfig, input: Option<&Path>) -> Result<(Self, Vec<PathBuf>)> {
        let setup = Setup::new(config);
        let mut deck = InputDeck::new();
        let snapshots = setup.prepare(&mut deck, input)?;
        let segments = setup.native_production(&mut deck)?;
        debug!("deck has {} commands in {} production segments", deck.len(), segments);
        Ok((deck, snapshots))
    }
}

impl CommandSink for InputDeck {
    fn command(&mut self, line: &str) -> std::result::Result<(), EngineError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(EngineError::Command {
                command: String::new(),
                reason: "empty command".to_string(),
            });
        }
        self.lines.push(Line::Command(line.to_string()));
        Ok(())
    }

    fn file(&mut self, path: &Path) -> std::result::Result<(), EngineError> {
        self.lines
            .push(Line::Command(format!("include {}", path.display())));
        Ok(())
    }

    fn section(&mut self, title: &str) {
        if !self.lines.is_empty() {
            self.lines.push(Line::Blank);
        }
        self.lines.push(Line::Comment(title.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn records_commands_in_order() {
        let mut deck = InputDeck::new();
        deck.command("units real").unwrap();
        deck.command("  newton on ").unwrap();
        deck.file(&PathBuf::from("extra.in")).unwrap();

        let commands: Vec<_> = deck.commands().collect();
        assert_eq!(commands, vec!["units real", "newton on", "include extra.in"]);
    }

    #[test]
    fn rejects_empty_command() {
        let mut deck = InputDeck::new();
        assert!(deck.command("   ").is_err());
        assert!(deck.is_empty());
    }

    #[test]
    fn render_separates_sections() {
        let mut deck = InputDeck::new();
        deck.section("setup");
        deck.command("units real").unwrap();
        deck.section("run");
        deck.command("run 10").unwrap();

        assert_eq!(deck.render(), "# setup\nunits real\n\n# run\nrun 10\n");
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn replay_copies_commands_only() {
        let mut deck = InputDeck::new();
        deck.section("header");
        deck.command("dimension 3").unwrap();

        let mut copy = InputDeck::new();
        deck.replay(&mut copy).unwrap();
        assert_eq!(copy.render(), "dimension 3\n");
    }

    #[test]
    fn native_run_deck() {
        let mut config = HacConfig::default();
        config.md.nsteps = 250;
        config.md.nout = 100;
        config.system.wall.enabled = true;

        let (deck, snapshots) = InputDeck::native_run(&config, None).unwrap();
        let commands: Vec<_> = deck.commands().collect();

        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[1].ends_with("eq1_lj_pylmp_hac.xyz"));
        assert!(commands.iter().any(|c| c.starts_with("fix wall_xlo")));
        assert!(commands.contains(&"fix      1 all nvt temp 30 30 100 tchain 1"));
        assert!(commands.iter().any(|c| c.starts_with("fix lange_right")));

        let runs: Vec<_> = commands
            .iter()
            .filter(|c| c.starts_with("run      ") && **c != "run      10000")
            .collect();
        assert_eq!(runs, vec![&"run      1000", &"run      1000", &"run      500"]);
        assert_eq!(commands.last(), Some(&"write_restart lj_pylmp_hac.res"));

        let script = deck.render();
        assert!(script.starts_with("# setup\n"));
        assert!(script.contains("\n# NVE production\n"));
    }

    #[test]
    fn minimization_adds_snapshot() {
        let mut config = HacConfig::default();
        config.md.minimize = true;
        let (_, snapshots) = InputDeck::native_run(&config, None).unwrap();
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots[1].ends_with("em_lj_pylmp_hac.xyz"));
    }

    #[test]
    fn save_writes_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.hac");

        let mut deck = InputDeck::new();
        deck.command("run 0").unwrap();
        deck.save(&path).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "run 0\n");
    }
}
