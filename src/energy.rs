// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of a pixel
//!
//! The live pixel surface every energy algorithm reads from, and the
//! pieces they share: the Sobel gradient over the grayscale plane, and
//! the colour distance between two RGBA pixels.  Everything here is in
//! carving space (see `flipper`), and everything shrinks together as
//! seams come out.

use crate::flipper::{orient, Axis};
use crate::grayscale::to_grayscale;
use image::{GrayImage, RgbaImage};

/// The pixels still in play.  `gray`, `rgba` and `original` always
/// describe the same `width * height` pixels; the mask is indexed by
/// original pixel index and never shrinks.
#[derive(Debug, Clone)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub gray: Vec<u8>,
    pub rgba: Vec<u8>,
    pub original: Vec<u32>,
    pub mask: Option<Vec<u8>>,
}

impl Surface {
    /// Lay out an image (and an optional mask of the same dimensions)
    /// in carving space.
    pub fn new(image: &RgbaImage, mask: Option<&GrayImage>, axis: Axis) -> Self {
        let original_width = image.width();
        let oriented = orient(image, axis);
        let (width, height) = oriented.dimensions();
        let gray = to_grayscale(&oriented, false, false).into_flat();
        let original = iproduct!(0..height, 0..width)
            .map(|(y, x)| axis.original_index(x, y, original_width))
            .collect();

        Surface {
            width,
            height,
            gray,
            rgba: oriented.into_raw(),
            original,
            mask: mask.map(|m| m.as_raw().clone()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[inline]
    pub fn gray(&self, x: u32, y: u32) -> i32 {
        i32::from(self.gray[self.index(x, y)])
    }

    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.rgba[self.index(x, y) * 4 + 3]
    }

    /// The RGBA channels at a signed coordinate; `None` off the image.
    #[inline]
    pub fn rgba_at(&self, x: i64, y: i64) -> Option<&[u8]> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        let i = self.index(x as u32, y as u32) * 4;
        Some(&self.rgba[i..i + 4])
    }

    /// The grayscale value at a signed coordinate; `None` off the image.
    #[inline]
    pub fn gray_at(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(f64::from(self.gray[self.index(x as u32, y as u32)]))
    }

    /// Mask weight for the pixel now at (x, y), if there is a mask.
    #[inline]
    pub fn mask_at(&self, x: u32, y: u32) -> Option<u8> {
        let original = self.original[self.index(x, y)] as usize;
        self.mask.as_ref().map(|m| m[original])
    }

    /// The 3x3 Sobel gradient over the grayscale plane, with the
    /// border replicated outward.
    pub fn sobel(&self, x: u32, y: u32) -> f64 {
        let (mw, mh) = (self.width - 1, self.height - 1);
        let (x1, x3) = (cq!(x == 0, 0, x - 1), cq!(x >= mw, mw, x + 1));
        let (y1, y3) = (cq!(y == 0, 0, y - 1), cq!(y >= mh, mh, y + 1));
        let g = |x, y| self.gray(x, y);

        let gx = -g(x1, y1) + g(x3, y1) - 2 * g(x1, y) + 2 * g(x3, y) - g(x1, y3) + g(x3, y3);
        let gy = -g(x1, y1) - 2 * g(x, y1) - g(x3, y1) + g(x1, y3) + 2 * g(x, y3) + g(x3, y3);
        gradient_magnitude(gx, gy)
    }

    /// Euclidean RGB distance between two pixels; zero when either is
    /// off the image.
    pub fn color_distance(&self, (x1, y1): (i64, i64), (x2, y2): (i64, i64)) -> f64 {
        match (self.rgba_at(x1, y1), self.rgba_at(x2, y2)) {
            (Some(p1), Some(p2)) => energy_of_pair(p1, p2).sqrt(),
            _ => 0.0,
        }
    }
}

#[cfg(not(feature = "square_root"))]
#[inline]
fn gradient_magnitude(gx: i32, gy: i32) -> f64 {
    f64::from(gx.abs() + gy.abs())
}

#[cfg(feature = "square_root")]
#[inline]
fn gradient_magnitude(gx: i32, gy: i32) -> f64 {
    f64::from(gx * gx + gy * gy).sqrt()
}

// Takes the channels (R,G,B) from two pixels and maps the difference
// between each channel, squares it, and then sums them all up.  This
// is the rusty expression of:
//
//        |Δ|² = (Δr)²+(Δg)²+(Δb)²
//
// Alpha is not a colour and is left out.
fn energy_of_pair(p1: &[u8], p2: &[u8]) -> f64 {
    p1.iter()
        .zip(p2)
        .take(3)
        .map(|(c1, c2)| {
            let d = f64::from(*c1) - f64::from(*c2);
            d * d
        })
        .sum()
}
