// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Minimum-cost seams by dynamic programming
//!
//! The classic Avidan & Shamir table: every cell holds the cheapest
//! cost of any seam reaching it from the top row, and which of the
//! three cells above it that seam came through.  Reading a seam out is
//! then a walk up the back pointers from any bottom-row cell.

use crate::bottomk::bottom_k;
use crate::energymap::{EnergyMap, Seam};
use crate::twodmap::{CostAndBackPointer, TwoDimensionalMap};

pub type SeamTable = TwoDimensionalMap<CostAndBackPointer>;

/// Build the cumulative cost table for the live map.
pub fn cumulative_energy(energy: &EnergyMap) -> SeamTable {
    let (width, height) = (energy.width(), energy.height());
    let mut target = SeamTable::new(width, height);
    if width == 0 || height == 0 {
        return target;
    }

    // Populate the first row with their native energies.
    for x in 0..width {
        target[(x, 0)] = CostAndBackPointer {
            cost: u64::from(energy.energy_at(x, 0)),
            parent: x,
        };
    }

    let maxwidth = width - 1;
    // For every subsequent row, populate the target cell with the sum
    // of the *lowest adjacent upper cost* and the *x coordinate of
    // that cost*.  Ties go straight up, so seams through flat regions
    // don't all funnel into the same column.
    for y in 1..height {
        for x in 0..width {
            let range = cq!(x == 0, 0, x - 1)..=cq!(x == maxwidth, maxwidth, x + 1);
            let mut parent_x = x;
            for candidate in range {
                if target[(candidate, y - 1)].cost < target[(parent_x, y - 1)].cost {
                    parent_x = candidate;
                }
            }
            target[(x, y)] = CostAndBackPointer {
                cost: u64::from(energy.energy_at(x, y)) + target[(parent_x, y - 1)].cost,
                parent: parent_x,
            };
        }
    }
    target
}

/// Working backwards from `end` on the bottom row, collect the x
/// coordinates of the seam, top row first.
pub fn trace(table: &SeamTable, end: u32) -> Seam {
    let mut seam_col = end;
    let mut seam: Seam = (0..table.height)
        .rev()
        .map(|y| {
            let x = seam_col;
            seam_col = table[(x, y)].parent;
            x
        })
        .collect();
    seam.reverse();
    seam
}

/// The single cheapest seam through the live map, if it has any
/// pixels.
pub fn minimum_seam(energy: &EnergyMap) -> Option<Seam> {
    let table = cumulative_energy(energy);
    let bottom = table.height.checked_sub(1)?;
    let end = (0..table.width).min_by_key(|x| table[(*x, bottom)].cost)?;
    Some(trace(&table, end))
}

/// Up to `count` seams that share no pixel, cheapest first.
///
/// Several bottom-row endpoints usually funnel into the same valley,
/// so a few times `count` endpoints are considered; each is traced in
/// cost order and kept only if it avoids every seam already kept.  The
/// optimal seam is always the first one back.
pub fn cheapest_disjoint_seams(energy: &EnergyMap, count: u32) -> Vec<Seam> {
    let (width, height) = (energy.width(), energy.height());
    if width == 0 || height == 0 || count == 0 {
        return Vec::new();
    }

    let table = cumulative_energy(energy);
    let bottom = height - 1;
    let candidates = (count.saturating_mul(4)).min(width) as usize;
    let endpoints = bottom_k((0..width).collect(), candidates, |x| table[(*x, bottom)].cost);

    let mut taken = vec![false; width as usize * height as usize];
    let mut seams = Vec::with_capacity(count as usize);
    for end in endpoints {
        let seam = trace(&table, end);
        let pixels: Vec<usize> = seam
            .iter()
            .enumerate()
            .map(|(y, x)| y * width as usize + *x as usize)
            .collect();
        if pixels.iter().any(|p| taken[*p]) {
            continue;
        }
        for p in pixels {
            taken[p] = true;
        }
        seams.push(seam);
        if seams.len() == count as usize {
            break;
        }
    }
    seams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energymap::Algorithm;
    use crate::flipper::Axis;
    use image::{ImageBuffer, Rgba, RgbaImage};

    fn spot(width: u32, height: u32, (sx, sy): (u32, u32)) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            cq!((x, y) == (sx, sy), Rgba([255, 255, 255, 255]), Rgba([20, 20, 20, 255]))
        })
    }

    fn map(image: &RgbaImage) -> EnergyMap {
        EnergyMap::new(image, None, Axis::Vertical, Algorithm::Sobel).unwrap()
    }

    #[test]
    fn table_accumulates_down_the_cheapest_path() {
        let energy = map(&spot(5, 4, (2, 1)));
        let table = cumulative_energy(&energy);
        let bottom: Vec<u64> = table.row(3).iter().map(|c| c.cost).collect();
        // The far columns never see the spot.
        assert_eq!(bottom[0], 0);
        assert_eq!(bottom[4], 0);
        assert!(bottom[2] > 0);
    }

    #[test]
    fn minimum_seam_avoids_the_bright_spot() {
        let energy = map(&spot(4, 4, (2, 2)));
        let seam = minimum_seam(&energy).unwrap();
        assert_eq!(seam.len(), 4);
        assert_ne!(seam[2], 2);
        assert!(energy.validate_seam(&seam).is_ok());
    }

    #[test]
    fn disjoint_seams_share_nothing() {
        let energy = map(&spot(12, 8, (6, 3)));
        let seams = cheapest_disjoint_seams(&energy, 4);
        assert!(!seams.is_empty());
        assert_eq!(seams[0], minimum_seam(&energy).unwrap());
        for (i, a) in seams.iter().enumerate() {
            assert!(energy.validate_seam(a).is_ok());
            for b in &seams[i + 1..] {
                assert!(a.iter().zip(b).all(|(xa, xb)| xa != xb));
            }
        }
    }

    #[test]
    fn empty_maps_have_no_seams() {
        let energy = map(&RgbaImage::new(0, 3));
        assert!(minimum_seam(&energy).is_none());
        assert!(cheapest_disjoint_seams(&energy, 2).is_empty());
    }
}
