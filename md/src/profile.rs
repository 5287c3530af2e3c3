//! Reader for the engine's time-averaged buffer files.
//!
//! Two layouts occur. Chunk averages (and vector time averages) are written
//! as blocks: a `timestep nrows [total]` header followed by `nrows` rows
//! that start with a row index. Scalar time averages are one
//! `timestep value...` line per output. Comment lines start with `#`; the
//! last one before the data names the columns.

use crate::error::{HacError, Result};
use itertools::{Itertools, MinMaxResult};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub index: usize,
    /// Columns after the row index
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBlock {
    pub timestep: u64,
    pub rows: Vec<ProfileRow>,
}

impl ProfileBlock {
    /// Mean of the last column over the rows of this block.
    pub fn value(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|r| r.values.last().copied())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub columns: Vec<String>,
    pub blocks: Vec<ProfileBlock>,
}

/// Statistics of the averaged value over all blocks of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub blocks: usize,
    pub first_step: u64,
    pub last_step: u64,
    pub mean: f64,
    /// Sample standard deviation, zero for a single block
    pub std: f64,
}

fn is_block_layout(comments: &[&str]) -> bool {
    comments.iter().any(|c| {
        let c = c.trim_start_matches('#').trim_start();
        c.starts_with("Chunk") || c.starts_with("Row")
    })
}

fn parse_number<T: std::str::FromStr>(word: &str, line: usize) -> Result<T> {
    word.parse()
        .map_err(|_| HacError::parse("profile", line, format!("bad number `{}`", word)))
}

impl Profile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut comments = Vec::new();
        let mut data = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                comments.push(trimmed);
            } else {
                data.push((i + 1, trimmed));
            }
        }

        let columns = comments
            .last()
            .map(|c| {
                c.trim_start_matches('#')
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let blocks = if is_block_layout(&comments) {
            Self::parse_blocks(&data)?
        } else {
            Self::parse_series(&data)?
        };
        Ok(Profile { columns, blocks })
    }

    fn parse_blocks(data: &[(usize, &str)]) -> Result<Vec<ProfileBlock>> {
        let mut blocks = Vec::new();
        let mut lines = data.iter();
        while let Some(&(lineno, header)) = lines.next() {
            let words: Vec<&str> = header.split_whitespace().collect();
            if words.len() < 2 || words.len() > 3 {
                return Err(HacError::parse(
                    "profile",
                    lineno,
                    "expected `timestep nrows [total]` block header",
                ));
            }
            let timestep: u64 = parse_number(words[0], lineno)?;
            let nrows: usize = parse_number(words[1], lineno)?;

            let mut rows = Vec::with_capacity(nrows);
            for k in 0..nrows {
                let &(lineno, line) = lines.next().ok_or_else(|| {
                    HacError::parse(
                        "profile",
                        lineno,
                        format!("block at step {} ends after {} of {} rows", timestep, k, nrows),
                    )
                })?;
                let mut words = line.split_whitespace();
                let index = match words.next() {
                    Some(w) => parse_number(w, lineno)?,
                    None => return Err(HacError::parse("profile", lineno, "empty row")),
                };
                let values = words
                    .map(|w| parse_number(w, lineno))
                    .collect::<Result<Vec<f64>>>()?;
                rows.push(ProfileRow { index, values });
            }
            blocks.push(ProfileBlock { timestep, rows });
        }
        Ok(blocks)
    }

    fn parse_series(data: &[(usize, &str)]) -> Result<Vec<ProfileBlock>> {
        data.iter()
            .map(|&(lineno, line)| {
                let mut words = line.split_whitespace();
                let timestep = match words.next() {
                    Some(w) => parse_number(w, lineno)?,
                    None => return Err(HacError::parse("profile", lineno, "empty line")),
                };
                let values = words
                    .map(|w| parse_number(w, lineno))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(ProfileBlock {
                    timestep,
                    rows: vec![ProfileRow { index: 1, values }],
                })
            })
            .collect()
    }

    /// `(timestep, value)` per block.
    pub fn series(&self) -> Vec<(u64, f64)> {
        self.blocks
            .iter()
            .filter_map(|b| b.value().map(|v| (b.timestep, v)))
            .collect()
    }

    pub fn summary(&self) -> Option<ProfileSummary> {
        let series = self.series();
        let (first_step, last_step) = match series.iter().map(|&(t, _)| t).minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(t) => (t, t),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        let n = series.len() as f64;
        let mean = series.iter().map(|&(_, v)| v).sum::<f64>() / n;
        let std = if series.len() > 1 {
            let ss: f64 = series.iter().map(|&(_, v)| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(ProfileSummary {
            blocks: series.len(),
            first_step,
            last_step,
            mean,
            std,
        })
    }
}
