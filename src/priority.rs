// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The seam-pixel priority grid: for every pixel of the original
//! image, the 0-based order in which its seam is removed.

use crate::error::{Result, SeamError};

/// Slots nobody has claimed yet.
pub const UNASSIGNED: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityGrid {
    width: u32,
    height: u32,
    order: Vec<u32>,
}

impl PriorityGrid {
    pub fn new(width: u32, height: u32) -> Self {
        PriorityGrid {
            width,
            height,
            order: vec![UNASSIGNED; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, original_index: usize) -> Option<u32> {
        self.order
            .get(original_index)
            .copied()
            .filter(|o| *o != UNASSIGNED)
    }

    pub fn is_assigned(&self, original_index: usize) -> bool {
        self.get(original_index).is_some()
    }

    /// Fail if any of `indices` already belongs to a seam.
    pub fn check_unassigned(&self, indices: &[u32]) -> Result<()> {
        match indices.iter().find(|i| self.is_assigned(**i as usize)) {
            Some(i) => Err(SeamError::SeamOverlap(*i as usize)),
            None => Ok(()),
        }
    }

    /// Give every pixel of one seam the same removal order.
    pub fn assign(&mut self, indices: &[u32], order: u32) -> Result<()> {
        let len = self.order.len();
        if let Some(&i) = indices.iter().find(|i| **i as usize >= len) {
            return Err(SeamError::IndexOutOfBounds {
                index: i as usize,
                group: 1,
                len,
            });
        }
        self.check_unassigned(indices)?;
        for &i in indices {
            self.order[i as usize] = order;
        }
        Ok(())
    }

    /// Number of slots with a removal order.
    pub fn assigned(&self) -> usize {
        self.order.iter().filter(|o| **o != UNASSIGNED).count()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.order
    }
}
