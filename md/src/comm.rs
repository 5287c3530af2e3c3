//! Collective operations across driver ranks.

use crate::error::{HacError, Result};
use crate::field::FieldArray;
use ndarray::Zip;
use rayon::prelude::*;

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Gather one block from every rank onto rank 0, ordered by rank.
    /// Returns `None` on every other rank.
    fn gather(&self, block: &FieldArray) -> Result<Option<Vec<FieldArray>>>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// A single-rank world.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn gather(&self, block: &FieldArray) -> Result<Option<Vec<FieldArray>>> {
        Ok(Some(vec![block.clone()]))
    }
}

/// Element-wise mean of equally shaped blocks.
pub fn average_blocks(blocks: &[FieldArray]) -> Result<FieldArray> {
    let first = blocks.first().ok_or(HacError::EmptyReduction)?;
    let shape = first.shape();
    for block in &blocks[1..] {
        block.ensure_shape(shape)?;
    }

    let mut sum = blocks
        .par_iter()
        .map(|b| b.data().mapv(f64::from))
        .reduce_with(|mut acc, next| {
            acc += &next;
            acc
        })
        .ok_or(HacError::EmptyReduction)?;
    sum /= blocks.len() as f64;

    let mut mean = FieldArray::zeros(shape);
    Zip::from(mean.data_mut())
        .and(&sum)
        .for_each(|out, &s| *out = s as f32);
    Ok(mean)
}

/// Gather `block` onto the root and average it there.
pub fn gather_average<C: Communicator + ?Sized>(
    comm: &C,
    block: &FieldArray,
) -> Result<Option<FieldArray>> {
    match comm.gather(block)? {
        Some(blocks) => Ok(Some(average_blocks(&blocks)?)),
        None => Ok(None),
    }
}
