// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image using the Avidan & Shamir
//! "Forward Energy" idea, folded into the per-pixel score.
//!
//! The backward term is the Sobel gradient.  The forward term
//! estimates the new edges that would appear if this pixel were
//! removed and its neighbours closed ranks: the colour distance
//! between the pixels on either side, the pixels above and below, and
//! (at half weight) the two diagonals that would come to touch.

use crate::energy::Surface;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dual {
    pub forward_energy_weight: f64,
}

impl Dual {
    /// Neighbourhood radius read by `score`.
    pub const REACH: u32 = 1;

    pub fn new(forward_energy_weight: f64) -> Self {
        Dual {
            forward_energy_weight,
        }
    }

    pub fn score(&self, surface: &Surface, x: u32, y: u32) -> f64 {
        surface.sobel(x, y) + self.forward_energy_weight * forward_energy(surface, x, y)
    }
}

// Cost of stitching the neighbours together once (x, y) is gone.
//
//   F(x,y) = D[(x−1,y),(x+1,y)] + D[(x,y−1),(x,y+1)]
//          + ½·D[(x−1,y−1),(x+1,y)] + ½·D[(x+1,y+1),(x−1,y)]
//
// A diagonal term only counts when its leading pixel is on the image.
fn forward_energy(surface: &Surface, x: u32, y: u32) -> f64 {
    let (x, y) = (i64::from(x), i64::from(y));
    let (w, h) = (i64::from(surface.width), i64::from(surface.height));

    let mut cost = surface.color_distance((x - 1, y), (x + 1, y))
        + surface.color_distance((x, y - 1), (x, y + 1));

    if x >= 1 && y >= 1 {
        cost += 0.5 * surface.color_distance((x - 1, y - 1), (x + 1, y));
    }
    if x + 1 < w && y + 1 < h {
        cost += 0.5 * surface.color_distance((x + 1, y + 1), (x - 1, y));
    }
    cost
}
