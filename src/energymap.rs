// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The live energy map
//!
//! One owner for everything that has to shrink in lockstep as seams
//! come out: the per-pixel scores, the live-to-original index map, and
//! the pixel planes the scores are computed from.  Removal builds every
//! replacement buffer first and swaps them in together, so no caller
//! ever sees the arrays at different lengths.
//!
//! The scoring algorithm is picked once, at construction, from a
//! closed set of variants; there is no dynamic dispatch per pixel.

#[cfg(feature = "boundary-aware")]
use crate::boundary::BoundaryAware;
use crate::compact::remove_indices;
#[cfg(feature = "dual")]
use crate::dual::Dual;
use crate::energy::Surface;
use crate::error::{Result, SeamError};
use crate::flipper::{orient, Axis};
use image::imageops::{resize, FilterType};
use image::{GrayImage, ImageBuffer, Rgba, RgbaImage};
use log::debug;

/// One column index per scan line, top to bottom, in carving space.
pub type Seam = Vec<u32>;

/// Parameters for every energy algorithm.  Each algorithm reads the
/// ones it understands and ignores the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMapOptions {
    pub algorithm: String,
    pub forward_energy_weight: f64,
    pub boundary_penalty_weight: f64,
    pub uniformity_threshold: f64,
    pub edge_threshold: f64,
}

impl Default for EnergyMapOptions {
    fn default() -> Self {
        EnergyMapOptions {
            algorithm: "sobel".to_string(),
            forward_energy_weight: 1.0,
            boundary_penalty_weight: 5.0,
            uniformity_threshold: 10.0,
            edge_threshold: 20.0,
        }
    }
}

/// The scoring rule in force for a map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Algorithm {
    Sobel,
    #[cfg(feature = "dual")]
    Dual(Dual),
    #[cfg(feature = "boundary-aware")]
    BoundaryAware(BoundaryAware),
}

impl Algorithm {
    pub fn sobel(_options: &EnergyMapOptions) -> Self {
        Algorithm::Sobel
    }

    #[cfg(feature = "dual")]
    pub fn dual(options: &EnergyMapOptions) -> Self {
        Algorithm::Dual(Dual::new(options.forward_energy_weight))
    }

    #[cfg(feature = "boundary-aware")]
    pub fn boundary_aware(options: &EnergyMapOptions) -> Self {
        Algorithm::BoundaryAware(BoundaryAware {
            boundary_penalty_weight: options.boundary_penalty_weight,
            uniformity_threshold: options.uniformity_threshold,
            edge_threshold: options.edge_threshold,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Sobel => "sobel",
            #[cfg(feature = "dual")]
            Algorithm::Dual(_) => "dual",
            #[cfg(feature = "boundary-aware")]
            Algorithm::BoundaryAware(_) => "boundary-aware",
        }
    }

    /// How far, in pixels, a score looks from its own pixel.
    pub fn reach(&self) -> u32 {
        match self {
            Algorithm::Sobel => 1,
            #[cfg(feature = "dual")]
            Algorithm::Dual(_) => Dual::REACH,
            #[cfg(feature = "boundary-aware")]
            Algorithm::BoundaryAware(_) => BoundaryAware::REACH,
        }
    }

    fn score(&self, surface: &Surface, x: u32, y: u32) -> f64 {
        match self {
            Algorithm::Sobel => surface.sobel(x, y),
            #[cfg(feature = "dual")]
            Algorithm::Dual(dual) => dual.score(surface, x, y),
            #[cfg(feature = "boundary-aware")]
            Algorithm::BoundaryAware(boundary) => boundary.score(surface, x, y),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnergyMap {
    algorithm: Algorithm,
    axis: Axis,
    surface: Surface,
    energy: Vec<u16>,
}

impl EnergyMap {
    /// Score every pixel of `image`.  A mask, if given, must have the
    /// image's dimensions.
    pub fn new(
        image: &RgbaImage,
        mask: Option<&GrayImage>,
        axis: Axis,
        algorithm: Algorithm,
    ) -> Result<Self> {
        if let Some(mask) = mask {
            if mask.dimensions() != image.dimensions() {
                return Err(SeamError::DimensionMismatch {
                    what: "mask",
                    width: mask.width(),
                    height: mask.height(),
                    expected_width: image.width(),
                    expected_height: image.height(),
                });
            }
        }

        let mut map = EnergyMap {
            algorithm,
            axis,
            surface: Surface::new(image, mask, axis),
            energy: Vec::new(),
        };
        map.rescore_all();
        debug!(
            "{} energy map ready: {}x{}",
            algorithm.name(),
            map.width(),
            map.height()
        );
        Ok(map)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Current scan-line length, in carving space.
    pub fn width(&self) -> u32 {
        self.surface.width
    }

    /// Number of scan lines, in carving space.
    pub fn height(&self) -> u32 {
        self.surface.height
    }

    /// The live scores, row-major in carving space.
    pub fn energy_map(&self) -> &[u16] {
        &self.energy
    }

    /// For each live pixel, its index in the original image.
    pub fn original_indices(&self) -> &[u32] {
        &self.surface.original
    }

    #[inline]
    pub fn energy_at(&self, x: u32, y: u32) -> u16 {
        self.energy[self.surface.index(x, y)]
    }

    #[inline]
    pub fn original_index(&self, x: u32, y: u32) -> u32 {
        self.surface.original[self.surface.index(x, y)]
    }

    /// Original indices of every pixel on `seam`.
    pub fn seam_original_indices(&self, seam: &[u32]) -> Vec<u32> {
        seam.iter()
            .enumerate()
            .map(|(y, x)| self.original_index(*x, y as u32))
            .collect()
    }

    /// A seam must have one in-bounds column per scan line, and each
    /// must touch the one above it.
    pub fn validate_seam(&self, seam: &[u32]) -> Result<()> {
        if seam.len() != self.height() as usize {
            return Err(SeamError::InvalidSeam(format!(
                "seam has {} coordinates but the map has {} scan lines",
                seam.len(),
                self.height()
            )));
        }
        if let Some((y, x)) = seam.iter().enumerate().find(|(_, x)| **x >= self.width()) {
            return Err(SeamError::InvalidSeam(format!(
                "column {} on scan line {} is outside a map {} wide",
                x,
                y,
                self.width()
            )));
        }
        if let Some(y) = seam
            .windows(2)
            .position(|pair| (i64::from(pair[0]) - i64::from(pair[1])).abs() > 1)
        {
            return Err(SeamError::InvalidSeam(format!(
                "broken path between scan lines {} and {}",
                y,
                y + 1
            )));
        }
        Ok(())
    }

    /// Take one seam out of the map.  Only pixels whose neighbourhood
    /// reached the removed path are re-scored.
    pub fn remove_seam(&mut self, seam: &[u32]) -> Result<()> {
        self.validate_seam(seam)?;
        let width = self.width() as usize;
        let indices: Vec<usize> = seam
            .iter()
            .enumerate()
            .map(|(y, x)| y * width + *x as usize)
            .collect();
        self.compact(&indices, 1)?;

        let width = self.width();
        if width == 0 {
            return Ok(());
        }
        let reach = self.algorithm.reach();
        for (y, s) in seam.iter().enumerate() {
            let first = s.saturating_sub(2 * reach + 1);
            let last = (s + 2 * reach).min(width - 1);
            for x in first..=last {
                let i = self.surface.index(x, y as u32);
                self.energy[i] = self.score_at(x, y as u32);
            }
        }
        Ok(())
    }

    /// Take several seams out in one compaction pass.  Every seam is
    /// validated against the current map, and no two may share a
    /// pixel; nothing changes unless all of them pass.
    pub fn remove_seams(&mut self, seams: &[Seam]) -> Result<()> {
        if seams.is_empty() {
            return Ok(());
        }
        for seam in seams {
            self.validate_seam(seam)?;
        }

        let width = self.width() as usize;
        let mut indices = Vec::with_capacity(seams.len() * self.height() as usize);
        let mut row = Vec::with_capacity(seams.len());
        for y in 0..self.height() as usize {
            row.clear();
            row.extend(seams.iter().map(|seam| seam[y] as usize));
            row.sort_unstable();
            indices.extend(row.iter().map(|x| y * width + x));
        }
        self.compact(&indices, seams.len() as u32)?;
        self.rescore_all();
        debug!(
            "removed {} seams, map now {}x{}",
            seams.len(),
            self.width(),
            self.height()
        );
        Ok(())
    }

    // Shrinks every live buffer by the same pixels, `removed` per scan
    // line, or leaves them all alone.
    fn compact(&mut self, indices: &[usize], removed: u32) -> Result<()> {
        let energy = remove_indices(&self.energy, indices, 1)?;
        let original = remove_indices(&self.surface.original, indices, 1)?;
        let gray = remove_indices(&self.surface.gray, indices, 1)?;
        let rgba_indices: Vec<usize> = indices.iter().map(|i| i * 4).collect();
        let rgba = remove_indices(&self.surface.rgba, &rgba_indices, 4)?;

        self.energy = energy;
        self.surface.original = original;
        self.surface.gray = gray;
        self.surface.rgba = rgba;
        self.surface.width -= removed;
        Ok(())
    }

    // Transparent pixels are free.  A mask lifts a score so that more
    // mask always means more energy, even where the image is flat.
    fn score_at(&self, x: u32, y: u32) -> u16 {
        if self.surface.alpha(x, y) == 0 {
            return 0;
        }
        let raw = self.algorithm.score(&self.surface, x, y);
        let blended = match self.surface.mask_at(x, y) {
            Some(m) => {
                let m = f64::from(m);
                raw * m / 255.0 + m
            }
            None => raw,
        };
        num_traits::cast::<f64, u16>(blended.round().max(0.0).min(f64::from(u16::MAX)))
            .unwrap_or(u16::MAX)
    }

    fn rescore_all(&mut self) {
        let mut energy = vec![0u16; self.surface.len()];
        self.fill_rows(&mut energy);
        self.energy = energy;
    }

    #[cfg(not(feature = "threaded"))]
    fn fill_rows(&self, energy: &mut [u16]) {
        let width = self.width() as usize;
        if width == 0 {
            return;
        }
        for (y, row) in energy.chunks_mut(width).enumerate() {
            for (x, e) in row.iter_mut().enumerate() {
                *e = self.score_at(x as u32, y as u32);
            }
        }
    }

    // Each worker takes a band of whole rows; the scores only read the
    // surface, so the bands never contend.
    #[cfg(feature = "threaded")]
    fn fill_rows(&self, energy: &mut [u16]) {
        let width = self.width() as usize;
        if width == 0 || energy.is_empty() {
            return;
        }
        let rows = energy.len() / width;
        let workers = num_cpus::get().max(1);
        let band = ((rows + workers - 1) / workers).max(1);

        let outcome = crossbeam::scope(|scope| {
            for (band_index, chunk) in energy.chunks_mut(band * width).enumerate() {
                scope.spawn(move |_| {
                    let first_row = band_index * band;
                    for (dy, row) in chunk.chunks_mut(width).enumerate() {
                        for (x, e) in row.iter_mut().enumerate() {
                            *e = self.score_at(x as u32, (first_row + dy) as u32);
                        }
                    }
                });
            }
        });
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }

    /// Render the live scores as an opaque grayscale picture, in image
    /// orientation, stretched so the lowest score is black and the
    /// highest white.  With `size`, the picture is resampled to it.
    pub fn to_image(&self, size: Option<(u32, u32)>) -> RgbaImage {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            let (w, h) = size.unwrap_or((0, 0));
            return RgbaImage::new(w, h);
        }

        let low = self.energy.iter().copied().min().unwrap_or(0);
        let high = self.energy.iter().copied().max().unwrap_or(0);
        let span = f64::from(high - low);
        let carving: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
            let e = f64::from(self.energy_at(x, y) - low);
            let v = cq!(span > 0.0, (e * 255.0 / span).round() as u8, 0);
            Rgba([v, v, v, 255])
        });
        let rendered = orient(&carving, self.axis);

        match size {
            Some((w, h)) if (w, h) != rendered.dimensions() => {
                resize(&rendered, w, h, FilterType::Triangle)
            }
            _ => rendered,
        }
    }
}
