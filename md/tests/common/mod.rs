use hac_md::comm::Communicator;
use hac_md::engine::{CommandSink, MdEngine};
use hac_md::error::{EngineError, Result as HacResult};
use hac_md::field::FieldArray;
use nalgebra::Vector3;
use std::path::Path;

/// In-memory engine: a fixed set of atoms that never move. `run` clears the
/// force buffer the way a real force evaluation would overwrite it.
pub struct MockEngine {
    pub x: Vec<Vector3<f64>>,
    pub v: Vec<Vector3<f64>>,
    pub f: Vec<Vector3<f64>>,
    pub commands: Vec<String>,
    pub closed: bool,
}

impl MockEngine {
    /// `n` atoms evenly spaced along x in `[0, lx)`, all moving with `v`.
    pub fn line(n: usize, lx: f64, v: Vector3<f64>) -> Self {
        let dx = lx / n as f64;
        MockEngine {
            x: (0..n)
                .map(|i| Vector3::new((i as f64 + 0.5) * dx, 1.0, 1.0))
                .collect(),
            v: vec![v; n],
            f: vec![Vector3::zeros(); n],
            commands: Vec::new(),
            closed: false,
        }
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl CommandSink for MockEngine {
    fn command(&mut self, line: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if let Some(n) = line.strip_prefix("run ") {
            n.trim().parse::<usize>().map_err(|e| EngineError::Command {
                command: line.to_string(),
                reason: e.to_string(),
            })?;
            self.f.iter_mut().for_each(|f| *f = Vector3::zeros());
        }
        self.commands.push(line.to_string());
        Ok(())
    }

    fn file(&mut self, path: &Path) -> Result<(), EngineError> {
        Err(EngineError::MissingInput(path.to_path_buf()))
    }
}

impl MdEngine for MockEngine {
    fn natoms(&self) -> usize {
        self.x.len()
    }

    fn positions(&self) -> &[Vector3<f64>] {
        &self.x
    }

    fn velocities(&self) -> &[Vector3<f64>] {
        &self.v
    }

    fn forces_and_velocities(&mut self) -> (&mut [Vector3<f64>], &[Vector3<f64>]) {
        (&mut self.f, &self.v)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.closed = true;
        Ok(())
    }
}

/// One rank of a multi-rank world in which every rank holds the same block.
/// The root receives `size` copies; the other ranks receive nothing.
#[derive(Debug, Clone, Copy)]
pub struct RankCommunicator {
    pub rank: usize,
    pub size: usize,
}

impl Communicator for RankCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn gather(&self, block: &FieldArray) -> HacResult<Option<Vec<FieldArray>>> {
        if self.rank == 0 {
            Ok(Some(vec![block.clone(); self.size]))
        } else {
            Ok(None)
        }
    }
}
