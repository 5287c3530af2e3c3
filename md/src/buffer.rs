//! Buffer slabs at the x boundaries of the atomistic domain.

use crate::config::HacConfig;
use crate::domain::Domain;
use crate::engine::CommandSink;
use crate::error::{HacError, Result};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Scans shorter than this run on the calling thread.
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

/// Half-open interval `[lo, hi)` along x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slab {
    pub lo: f64,
    pub hi: f64,
}

impl Slab {
    pub fn new(lo: f64, hi: f64) -> Self {
        Slab { lo, hi }
    }

    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lo && x < self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn center(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }
}

/// Ids of the atoms in `ids` whose x coordinate lies in `slab`, in input order.
pub fn select_buffer_atoms(
    positions: &[Vector3<f64>],
    ids: &[usize],
    slab: Slab,
) -> Result<Vec<usize>> {
    let natoms = positions.len();
    if let Some(&id) = ids.iter().find(|&&id| id >= natoms) {
        return Err(HacError::AtomIdOutOfRange { id, natoms });
    }

    let selected = if ids.len() < PARALLEL_SCAN_THRESHOLD {
        ids.iter()
            .copied()
            .filter(|&id| slab.contains(positions[id].x))
            .collect()
    } else {
        ids.par_iter()
            .copied()
            .filter(|&id| slab.contains(positions[id].x))
            .collect()
    };
    Ok(selected)
}

/// The two coupling slabs of a domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferPair {
    pub left: Slab,
    pub right: Slab,
}

impl BufferPair {
    pub fn from_domain(domain: &Domain) -> Self {
        BufferPair {
            left: domain.left_buffer(),
            right: domain.right_buffer(),
        }
    }
}

/// Averaged quantities written for each buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferQuantity {
    Density,
    Ux,
    Uy,
    Uz,
    Temperature,
}

impl BufferQuantity {
    pub const ALL: [BufferQuantity; 5] = [
        BufferQuantity::Density,
        BufferQuantity::Ux,
        BufferQuantity::Uy,
        BufferQuantity::Uz,
        BufferQuantity::Temperature,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            BufferQuantity::Density => "rh",
            BufferQuantity::Ux => "ux",
            BufferQuantity::Uy => "uy",
            BufferQuantity::Uz => "uz",
            BufferQuantity::Temperature => "te",
        }
    }

    /// Per-atom value averaged by `ave/chunk`; temperature goes through
    /// `temp/chunk` instead.
    fn chunk_value(self) -> Option<&'static str> {
        match self {
            BufferQuantity::Density => Some("density/mass"),
            BufferQuantity::Ux => Some("vx"),
            BufferQuantity::Uy => Some("vy"),
            BufferQuantity::Uz => Some("vz"),
            BufferQuantity::Temperature => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    fn file_suffix(self) -> &'static str {
        match self {
            Side::Left => "lbuffer",
            Side::Right => "rbuffer",
        }
    }
}

/// Output file for a buffer average, e.g. `<data_dir>/ux.lbuffer`.
pub fn buffer_file(data_dir: &Path, quantity: BufferQuantity, side: Side) -> PathBuf {
    data_dir.join(format!("{}.{}", quantity.prefix(), side.file_suffix()))
}

/// Chunk computes and time-averaging fixes that write density, velocity and
/// temperature of each buffer to the data directory.
pub fn setup_buffer<S: CommandSink + ?Sized>(sink: &mut S, config: &HacConfig) -> Result<()> {
    let w = config.buffer.width_fraction;
    let (neve, nrep, nfre) = (config.buffer.every, config.buffer.repeat, config.buffer.frequency);
    let data_dir = config.output.data_dir();

    // STEP 1: bin atoms of each slab into a single chunk, in reduced x units
    sink.command(&format!(
        "compute cid_left  all chunk/atom bin/1d x lower {} discard yes bound x 0.0 {} units reduced",
        w, w
    ))?;
    sink.command(&format!(
        "compute cid_right all chunk/atom bin/1d x {} {} discard yes bound x {} 1.0 units reduced",
        1.0 - w,
        w,
        1.0 - w
    ))?;

    // STEP 2: time averages over the chunks
    for quantity in BufferQuantity::ALL {
        for side in [Side::Left, Side::Right] {
            let file = buffer_file(&data_dir, quantity, side);
            let id = format!("{}_{}", quantity.prefix(), side.name());
            match quantity.chunk_value() {
                Some(value) => sink.command(&format!(
                    "fix {} all ave/chunk {} {} {} cid_{} {} norm sample ave one file {}",
                    id,
                    neve,
                    nrep,
                    nfre,
                    side.name(),
                    value,
                    file.display()
                ))?,
                None => {
                    sink.command(&format!(
                        "compute {}_t all temp/chunk cid_{} temp com yes",
                        id,
                        side.name()
                    ))?;
                    sink.command(&format!(
                        "fix {} all ave/time {} {} {} c_{}_t ave one file {}",
                        id,
                        neve,
                        nrep,
                        nfre,
                        id,
                        file.display()
                    ))?;
                }
            }
        }
    }
    Ok(())
}
