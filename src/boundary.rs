// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Boundary-aware energy
//!
//! Sobel plus an unweighted forward term, plus a penalty on pixels
//! that sit on the border between two visually distinct regions: a
//! building against the sky, a wall against foliage.  Seam carving
//! happily slices along such borders because the regions on each side
//! are cheap; the penalty makes it think twice.
//!
//! Regions are sampled as 5x5 windows centred three pixels away on
//! each side, and compared by their standard deviation of intensity.

use crate::energy::Surface;

/// Radius of the sampled windows.
const REGION_RADIUS: i64 = 2;
/// Distance from the pixel to the centre of each window.
const REGION_OFFSET: i64 = 3;
/// Scales a boundary strength in [0, 1] into energy units.
const PENALTY_SCALE: f64 = 200.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundaryAware {
    pub boundary_penalty_weight: f64,
    pub uniformity_threshold: f64,
    pub edge_threshold: f64,
}

impl BoundaryAware {
    /// Neighbourhood radius read by `score`.
    pub const REACH: u32 = (REGION_OFFSET + REGION_RADIUS) as u32;

    pub fn score(&self, surface: &Surface, x: u32, y: u32) -> f64 {
        let gradient = surface.sobel(x, y);
        let (sx, sy) = (i64::from(x), i64::from(y));
        let forward = surface.color_distance((sx - 1, sy), (sx + 1, sy))
            + surface.color_distance((sx, sy - 1), (sx, sy + 1));
        gradient + forward + self.boundary_penalty_weight * self.penalty(surface, gradient, sx, sy)
    }

    fn penalty(&self, surface: &Surface, gradient: f64, x: i64, y: i64) -> f64 {
        let (unif, edge) = (self.uniformity_threshold, self.edge_threshold);
        if gradient < edge * 0.3 {
            return 0.0;
        }

        let left = region_deviation(surface, x - REGION_OFFSET, y);
        let right = region_deviation(surface, x + REGION_OFFSET, y);
        let top = region_deviation(surface, x, y - REGION_OFFSET);
        let bottom = region_deviation(surface, x, y + REGION_OFFSET);

        let mut strength: f64 = 0.0;

        // One side nearly featureless.
        let min_deviation = left.min(right).min(top).min(bottom);
        if min_deviation < unif * 0.5 {
            let uniformity = ((unif * 0.5 - min_deviation) / (unif * 0.5)).max(0.0);
            strength = strength.max(uniformity * 0.3);
        }

        // Very different textures on opposite sides of a real edge.
        let texture_difference = (left - right).abs().max((top - bottom).abs());
        if texture_difference > unif * 4.0 && gradient > edge {
            strength = strength.max((texture_difference / (unif * 8.0)).min(1.0) * 0.2);
        }

        // Strong edges, whatever surrounds them.
        if gradient > edge * 2.5 {
            strength = strength.max((gradient / (edge * 4.0)).min(1.0) * 0.15);
        }

        cq!(
            strength > 0.0,
            strength * (gradient / (edge * 2.0)).min(1.0) * PENALTY_SCALE,
            0.0
        )
    }
}

// Standard deviation of intensity over the on-image part of a square
// window.  Fewer than two samples is no evidence at all.
fn region_deviation(surface: &Surface, cx: i64, cy: i64) -> f64 {
    let (sum, sum_squares, count) = iproduct!(
        (cy - REGION_RADIUS)..=(cy + REGION_RADIUS),
        (cx - REGION_RADIUS)..=(cx + REGION_RADIUS)
    )
    .filter_map(|(y, x)| surface.gray_at(x, y))
    .fold((0.0, 0.0, 0usize), |(s, ss, n), g| (s + g, ss + g * g, n + 1));

    if count < 2 {
        return 0.0;
    }
    let mean = sum / count as f64;
    (sum_squares / count as f64 - mean * mean).max(0.0).sqrt()
}
