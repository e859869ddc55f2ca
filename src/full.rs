// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Full precomputation
//!
//! Classic one-seam-at-a-time carving, run to exhaustion in a single
//! batch: find the cheapest seam, take it out through the incremental
//! path, repeat until the map is empty.  The most expensive strategy
//! by far, and the only one whose every seam is optimal for the map it
//! was taken from.

use crate::energymap::EnergyMap;
use crate::error::Result;
use crate::generator::{apply_seam, GeneratorOptions, SeamBatcher};
use crate::priority::PriorityGrid;
use crate::seamfinder::minimum_seam;

#[derive(Default)]
pub struct FullBatcher;

impl FullBatcher {
    pub fn create(_options: &GeneratorOptions) -> Box<dyn SeamBatcher> {
        Box::new(FullBatcher)
    }
}

impl SeamBatcher for FullBatcher {
    fn name(&self) -> &'static str {
        "full"
    }

    fn generate_batch(
        &mut self,
        energy: &mut EnergyMap,
        grid: &mut PriorityGrid,
        generated: u32,
    ) -> Result<u32> {
        let mut produced = 0;
        while let Some(seam) = minimum_seam(energy) {
            apply_seam(energy, grid, &seam, generated + produced)?;
            produced += 1;
        }
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energymap::Algorithm;
    use crate::flipper::Axis;
    use image::{ImageBuffer, Rgba, RgbaImage};

    #[test]
    fn every_pixel_gets_an_order() {
        let image: RgbaImage = ImageBuffer::from_fn(6, 4, |x, y| {
            let v = ((x * 41 + y * 17) % 200) as u8;
            Rgba([v, v, v, 255])
        });
        let mut energy = EnergyMap::new(&image, None, Axis::Vertical, Algorithm::Sobel).unwrap();
        let mut grid = PriorityGrid::new(6, 4);
        let produced = FullBatcher.generate_batch(&mut energy, &mut grid, 0).unwrap();

        assert_eq!(produced, 6);
        assert_eq!(energy.width(), 0);
        assert_eq!(grid.assigned(), 24);
        for y in 0..4 {
            let mut row: Vec<u32> = (0..6).filter_map(|x| grid.get(y * 6 + x)).collect();
            row.sort_unstable();
            assert_eq!(row, [0, 1, 2, 3, 4, 5]);
        }
    }
}
