// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Predictive seams
//!
//! True minimum-cost seams from the cumulative cost table, several per
//! table: the cheapest bottom-row endpoints are traced back and kept
//! while they stay clear of each other.  One table build and one
//! compaction serve the whole batch.

use crate::energymap::EnergyMap;
use crate::error::Result;
use crate::generator::{apply_batch, batch_size, GeneratorOptions, SeamBatcher};
use crate::priority::PriorityGrid;
use crate::seamfinder::cheapest_disjoint_seams;

pub struct PredictiveBatcher {
    batch_percentage: f64,
    min_batch_size: u32,
}

impl PredictiveBatcher {
    pub fn new(options: &GeneratorOptions) -> Self {
        PredictiveBatcher {
            batch_percentage: options.batch_percentage,
            min_batch_size: options.min_batch_size,
        }
    }

    pub fn create(options: &GeneratorOptions) -> Box<dyn SeamBatcher> {
        Box::new(PredictiveBatcher::new(options))
    }
}

impl SeamBatcher for PredictiveBatcher {
    fn name(&self) -> &'static str {
        "predictive"
    }

    fn generate_batch(
        &mut self,
        energy: &mut EnergyMap,
        grid: &mut PriorityGrid,
        generated: u32,
    ) -> Result<u32> {
        let size = batch_size(energy.width(), self.batch_percentage, self.min_batch_size);
        let seams = cheapest_disjoint_seams(energy, size);
        apply_batch(energy, grid, &seams, generated)
    }
}
