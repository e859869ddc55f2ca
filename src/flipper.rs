// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image dimensional flipper

//! A utility proxy for the ImageRS `GenericImageView` trait that maps
//! the width to the original height, and vice versa, as well as every
//! x to y and vice versa.
//!
//! Every engine in this crate only knows how to find vertical seams.
//! Horizontal carving is done by flipping the source first, which has
//! the effect of making each column of the original a contiguous row,
//! the way rows are laid out in memory.  The seam tables, the
//! compaction passes, and the row-parallel energy code then work
//! unchanged.

use image::{GenericImageView, ImageBuffer, Pixel};
use std::str::FromStr;

/// Which way the seams run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    /// Top-to-bottom seams; removing one narrows the image by a column.
    Vertical,
    /// Left-to-right seams; removing one shortens the image by a row.
    Horizontal,
}

impl Default for Axis {
    fn default() -> Self {
        Axis::Vertical
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" | "width" => Ok(Axis::Vertical),
            "horizontal" | "height" => Ok(Axis::Horizontal),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

impl Axis {
    /// Dimensions as seen by the seam engines: (scan-line length,
    /// number of scan lines).
    pub fn oriented(self, (width, height): (u32, u32)) -> (u32, u32) {
        match self {
            Axis::Vertical => (width, height),
            Axis::Horizontal => (height, width),
        }
    }

    /// Map a coordinate in carving space back to the index of that
    /// pixel in the original, unflipped image.
    #[inline]
    pub fn original_index(self, x: u32, y: u32, original_width: u32) -> u32 {
        match self {
            Axis::Vertical => y * original_width + x,
            Axis::Horizontal => x * original_width + y,
        }
    }
}

pub struct Flipper<'a, I: GenericImageView> {
    pub image: &'a I,
}

impl<'a, I: GenericImageView> GenericImageView for Flipper<'a, I> {
    type Pixel = I::Pixel;

    fn dimensions(&self) -> (u32, u32) {
        let (x, y) = self.image.dimensions();
        (y, x)
    }

    fn get_pixel(&self, x: u32, y: u32) -> I::Pixel {
        self.image.get_pixel(y, x)
    }

    fn bounds(&self) -> (u32, u32, u32, u32) {
        let (x1, y1, x2, y2) = self.image.bounds();
        (y1, x1, y2, x2)
    }
}

/// Materialise an image in carving space: unchanged for vertical
/// seams, flipped for horizontal ones.
pub fn orient<I, P>(image: &I, axis: Axis) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel + 'static,
{
    match axis {
        Axis::Vertical => {
            let (w, h) = image.dimensions();
            ImageBuffer::from_fn(w, h, |x, y| image.get_pixel(x, y))
        }
        Axis::Horizontal => {
            let flipper = Flipper { image };
            let (w, h) = flipper.dimensions();
            ImageBuffer::from_fn(w, h, |x, y| flipper.get_pixel(x, y))
        }
    }
}

/// Drop the trailing scan-line element of an odd-length axis so the
/// carving dimension is even.
pub fn even_along<I, P>(image: &I, axis: Axis) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();
    let (width, height) = match axis {
        Axis::Vertical => (width - width % 2, height),
        Axis::Horizontal => (width, height - height % 2),
    };
    ImageBuffer::from_fn(width, height, |x, y| image.get_pixel(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn fixture() -> GrayImage {
        ImageBuffer::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn flipper_swaps_axes() {
        let image = fixture();
        let flipped = Flipper { image: &image };
        assert_eq!(flipped.dimensions(), (2, 3));
        assert_eq!(flipped.get_pixel(1, 0), Luma([4]));
        assert_eq!(flipped.get_pixel(0, 2), Luma([3]));
        // Bounds follow the swapped dimensions.
        assert!(flipped.in_bounds(1, 2));
        assert!(!flipped.in_bounds(2, 1));
        assert_eq!((flipped.width(), flipped.height()), (2, 3));
    }

    #[test]
    fn orient_horizontal_is_a_transpose() {
        let flipped = orient(&fixture(), Axis::Horizontal);
        assert_eq!(flipped.dimensions(), (2, 3));
        assert_eq!(flipped.into_raw(), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(orient(&fixture(), Axis::Vertical).into_raw(), fixture().into_raw());
    }

    #[test]
    fn original_indices_follow_the_flip() {
        // (x=1, y=2) in carving space is (x=2, y=1) in the original.
        assert_eq!(Axis::Horizontal.original_index(1, 2, 3), 5);
        assert_eq!(Axis::Vertical.original_index(1, 1, 3), 4);
    }

    #[test]
    fn odd_axes_are_trimmed() {
        assert_eq!(even_along(&fixture(), Axis::Vertical).dimensions(), (2, 2));
        assert_eq!(even_along(&fixture(), Axis::Horizontal).dimensions(), (3, 2));
    }

    #[test]
    fn axis_names() {
        assert_eq!("horizontal".parse::<Axis>(), Ok(Axis::Horizontal));
        assert!("diagonal".parse::<Axis>().is_err());
    }
}
