// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Random seams
//!
//! Cheap and approximate.  Every scan line is cut into adjacent pairs
//! of pixels, and a hash of the pixel's position decides whether each
//! pair swaps places or carries straight on.  Following any top-row
//! pixel down through the swaps traces an 8-connected path; since every
//! scan line is a permutation of the one above, the `width` paths
//! cover the image exactly once and never touch.  Sum each path's
//! energy, keep the cheapest batch, and throw the rest away.
//!
//! The hash depends only on the map's current dimensions, so the same
//! map always yields the same seams.

use crate::bottomk::bottom_k;
use crate::energymap::{EnergyMap, Seam};
use crate::error::Result;
use crate::generator::{apply_batch, batch_size, GeneratorOptions, SeamBatcher};
use crate::priority::PriorityGrid;

/// A single pseudo-random bit for `seed2` within the stream `seed1`,
/// from the MurmurHash3 finaliser.
pub fn binary_rnd(seed1: u32, seed2: u32) -> u32 {
    let mut h = seed1 ^ seed2;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h & 1
}

pub struct RandomBatcher {
    batch_percentage: f64,
    min_batch_size: u32,
    // Per pixel: -1, 0 or 1, the step to the column below.
    connections: Vec<i8>,
}

impl RandomBatcher {
    pub fn new(options: &GeneratorOptions) -> Self {
        RandomBatcher {
            batch_percentage: options.batch_percentage,
            min_batch_size: options.min_batch_size,
            connections: Vec::new(),
        }
    }

    pub fn create(options: &GeneratorOptions) -> Box<dyn SeamBatcher> {
        Box::new(RandomBatcher::new(options))
    }

    fn generate_connections(&mut self, width: u32, height: u32) {
        let (w, h) = (width as usize, height as usize);
        let seed = width.wrapping_mul(height).wrapping_add(1);
        self.connections.clear();
        self.connections.resize(w * h, 0);

        for y in 0..h {
            let row = &mut self.connections[y * w..(y + 1) * w];
            let mut x = 0;
            while x < w {
                let straight = x + 1 == w || binary_rnd(seed, (y * w + x) as u32) == 1;
                if !straight {
                    row[x] = 1;
                    row[x + 1] = -1;
                    x += 1;
                }
                x += 1;
            }
        }
    }

    fn seam_from(&self, energy: &EnergyMap, start: u32) -> (Seam, u64) {
        let width = energy.width() as usize;
        let mut x = start as i64;
        let mut total = 0u64;
        let seam = (0..energy.height())
            .map(|y| {
                x += i64::from(self.connections[y as usize * width + x as usize]);
                total += u64::from(energy.energy_at(x as u32, y));
                x as u32
            })
            .collect();
        (seam, total)
    }
}

impl SeamBatcher for RandomBatcher {
    fn name(&self) -> &'static str {
        "random"
    }

    fn generate_batch(
        &mut self,
        energy: &mut EnergyMap,
        grid: &mut PriorityGrid,
        generated: u32,
    ) -> Result<u32> {
        let (width, height) = (energy.width(), energy.height());
        if width == 0 || height == 0 {
            return Ok(0);
        }

        self.generate_connections(width, height);
        let candidates: Vec<(Seam, u64)> = (0..width).map(|x| self.seam_from(energy, x)).collect();
        let size = batch_size(width, self.batch_percentage, self.min_batch_size) as usize;
        let seams: Vec<Seam> = bottom_k(candidates, size, |(_, total)| *total)
            .into_iter()
            .map(|(seam, _)| seam)
            .collect();

        apply_batch(energy, grid, &seams, generated)
    }
}
