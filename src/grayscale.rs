// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! RGBA to single-channel intensity.
//!
//! Alpha is folded into the intensity, so a fully transparent pixel is
//! black no matter what its colour channels say.  Carving therefore
//! treats transparent regions as the cheapest thing in the image.

use image::{GrayImage, RgbaImage};

/// One byte per pixel, either as a single row-major buffer or as one
/// buffer per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Grayscale {
    Flat(Vec<u8>),
    Rows(Vec<Vec<u8>>),
}

impl Grayscale {
    /// Collapse into one row-major buffer.
    pub fn into_flat(self) -> Vec<u8> {
        match self {
            Grayscale::Flat(data) => data,
            Grayscale::Rows(rows) => rows.concat(),
        }
    }
}

#[inline]
pub(crate) fn intensity(rgba: &[u8], use_linear_approximation: bool) -> u8 {
    let (r, g, b, a) = (
        f32::from(rgba[0]),
        f32::from(rgba[1]),
        f32::from(rgba[2]),
        f32::from(rgba[3]),
    );
    let gray = if use_linear_approximation {
        (r + g + b) / 3.0 * a / 255.0
    } else {
        (0.299 * r + 0.587 * g + 0.114 * b) * a / 255.0
    };
    // truncates
    gray as u8
}

/// Convert an RGBA image to grayscale.  With `as_rows` every row comes
/// back as its own buffer, which lets downstream row-parallel code
/// take rows without index arithmetic.
pub fn to_grayscale(image: &RgbaImage, as_rows: bool, use_linear_approximation: bool) -> Grayscale {
    let width = image.width() as usize;
    let pixels = image.as_raw();

    if as_rows {
        if width == 0 {
            return Grayscale::Rows(vec![Vec::new(); image.height() as usize]);
        }
        Grayscale::Rows(
            pixels
                .chunks_exact(width * 4)
                .map(|row| {
                    row.chunks_exact(4)
                        .map(|px| intensity(px, use_linear_approximation))
                        .collect()
                })
                .collect(),
        )
    } else {
        Grayscale::Flat(
            pixels
                .chunks_exact(4)
                .map(|px| intensity(px, use_linear_approximation))
                .collect(),
        )
    }
}

/// A mask is any image; only its perceptual intensity matters.
pub fn mask_from_image(image: &RgbaImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let data = to_grayscale(image, false, false).into_flat();
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}
