// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - from priorities to pixels
//!
//! Once a priority grid covers enough seams, resizing is a single pass
//! over the image: to lose `n` pixels per scan line, drop every pixel
//! whose seam order is below `n`; to gain `n`, write those pixels
//! twice.  Each scan line holds exactly one pixel of every seam, so the
//! arithmetic always comes out even.

use crate::error::{Result, SeamError};
use crate::flipper::{orient, Axis};
use crate::priority::PriorityGrid;
use image::{ImageBuffer, RgbaImage};
use log::debug;

/// Resize `image` along `axis` so the carving dimension is `target`.
pub fn carve(image: &RgbaImage, grid: &PriorityGrid, axis: Axis, target: u32) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    if (grid.width(), grid.height()) != (width, height) {
        return Err(SeamError::DimensionMismatch {
            what: "priority grid",
            width: grid.width(),
            height: grid.height(),
            expected_width: width,
            expected_height: height,
        });
    }

    let (length, lines) = axis.oriented((width, height));
    let seams = cq!(target < length, length - target, target - length);
    if seams == 0 {
        return Ok(image.clone());
    }

    let covered = cq!(lines == 0, 0, (grid.assigned() / lines as usize) as u32);
    if seams > covered || seams > length {
        return Err(SeamError::TooManySeams {
            requested: seams,
            available: covered.min(length),
        });
    }

    let grow = target > length;
    let oriented = orient(image, axis);
    let mut data = Vec::with_capacity(target as usize * lines as usize * 4);
    for (x, y, pixel) in oriented.enumerate_pixels() {
        let original = axis.original_index(x, y, width) as usize;
        let in_seam = grid.get(original).map_or(false, |order| order < seams);
        if !in_seam || grow {
            data.extend_from_slice(&pixel.0);
        }
        if in_seam && grow {
            data.extend_from_slice(&pixel.0);
        }
    }

    let carved: RgbaImage = ImageBuffer::from_raw(target, lines, data).ok_or_else(|| {
        SeamError::InvalidSeam(format!(
            "priority grid does not hold {} seams per scan line",
            seams
        ))
    })?;
    debug!("carved {} seams, {:?}, to {}", seams, axis, target);
    Ok(orient(&carved, axis))
}
