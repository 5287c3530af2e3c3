//! XYZ snapshots written by the engine and their conversion to PDB.

use crate::error::{HacError, Result};
use nalgebra::Vector3;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct XyzFrame {
    pub comment: String,
    pub names: Vec<String>,
    pub positions: Vec<Vector3<f64>>,
}

impl XyzFrame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// First frame of an XYZ file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        parse_frames(&content)?
            .into_iter()
            .next()
            .ok_or_else(|| HacError::parse("xyz", 1, "file holds no frame"))
    }
}

/// Parse every frame of an XYZ trajectory.
pub fn parse_frames(content: &str) -> Result<Vec<XyzFrame>> {
    let mut frames = Vec::new();
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((lineno, header)) = lines.next() {
        let header = header.trim();
        if header.is_empty() {
            continue;
        }
        let natoms: usize = header
            .parse()
            .map_err(|_| HacError::parse("xyz", lineno, format!("bad atom count `{}`", header)))?;
        let comment = match lines.next() {
            Some((_, c)) => c.trim().to_string(),
            None => return Err(HacError::parse("xyz", lineno + 1, "missing comment line")),
        };

        let mut names = Vec::with_capacity(natoms);
        let mut positions = Vec::with_capacity(natoms);
        for k in 0..natoms {
            let (lineno, line) = lines.next().ok_or_else(|| {
                HacError::parse("xyz", lineno + 2 + k, format!("expected {} atoms, found {}", natoms, k))
            })?;
            let mut fields = line.split_whitespace();
            let name = fields
                .next()
                .ok_or_else(|| HacError::parse("xyz", lineno, "empty atom line"))?;
            let mut coord = [0.0; 3];
            for c in coord.iter_mut() {
                let word = fields
                    .next()
                    .ok_or_else(|| HacError::parse("xyz", lineno, "missing coordinate"))?;
                *c = word
                    .parse()
                    .map_err(|_| HacError::parse("xyz", lineno, format!("bad coordinate `{}`", word)))?;
            }
            names.push(name.to_string());
            positions.push(Vector3::from(coord));
        }
        frames.push(XyzFrame {
            comment,
            names,
            positions,
        });
    }
    Ok(frames)
}

/// Write one frame as PDB with an orthorhombic `CRYST1` cell of edge lengths `cell`.
pub fn write_pdb<W: Write>(mut writer: W, frame: &XyzFrame, cell: [f64; 3]) -> Result<()> {
    if !frame.comment.is_empty() {
        writeln!(writer, "REMARK     {}", frame.comment)?;
    }
    writeln!(
        writer,
        "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
        cell[0], cell[1], cell[2], 90.0, 90.0, 90.0
    )?;
    for (i, (name, r)) in frame.names.iter().zip(&frame.positions).enumerate() {
        let serial = (i + 1) % 100_000;
        let resid = (i + 1) % 10_000;
        writeln!(
            writer,
            "ATOM  {:>5} {:<4} {:>3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            serial,
            fit(name, 4),
            "UNK",
            "X",
            resid,
            r.x,
            r.y,
            r.z,
            1.0,
            0.0,
            fit(name, 2)
        )?;
    }
    writeln!(writer, "END")?;
    Ok(())
}

fn fit(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Sibling path with a `.pdb` extension.
pub fn pdb_path(xyz: &Path) -> PathBuf {
    xyz.with_extension("pdb")
}

/// Convert the first frame of `xyz` to PDB next to it. Returns the new path.
pub fn xyz_to_pdb(xyz: &Path, cell: [f64; 3]) -> Result<PathBuf> {
    let frame = XyzFrame::from_file(xyz)?;
    let out = pdb_path(xyz);
    let mut writer = BufWriter::new(File::create(&out)?);
    write_pdb(&mut writer, &frame, cell)?;
    writer.flush()?;
    info!("Wrote {} atoms to {}", frame.len(), out.display());
    Ok(out)
}
