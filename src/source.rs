// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image sources
//!
//! Where pixels come from, and the loader that fetches them in the
//! background.  Loaded images are trimmed so the carving dimension is
//! even.

use crate::error::{Result, SeamError};
use crate::flipper::{even_along, Axis};
use crate::grayscale::mask_from_image;
use crate::staged::{spawn_pending, Pending, Staged};
use image::{GrayImage, RgbaImage};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Anything that can produce decoded RGBA pixels.
pub trait ImageSource: Send + Sync {
    fn load(&self) -> Result<RgbaImage>;
}

impl ImageSource for PathBuf {
    fn load(&self) -> Result<RgbaImage> {
        open_rgba(self)
    }
}

impl ImageSource for RgbaImage {
    fn load(&self) -> Result<RgbaImage> {
        Ok(self.clone())
    }
}

/// Open and decode an image file.
pub fn open_rgba(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|err| SeamError::Resource(format!("{}: {}", path.display(), err)))
}

/// Loads a source on a worker thread and keeps the result for whoever
/// asks.  `reload` swaps the source; readers already waiting get the
/// new image, never the old one.  Clones share the same slot.
#[derive(Clone)]
pub struct ImageLoader {
    axis: Axis,
    image: Arc<Staged<RgbaImage>>,
}

impl ImageLoader {
    pub fn new<S: ImageSource + 'static>(source: S, axis: Axis) -> Self {
        ImageLoader {
            axis,
            image: Arc::new(Staged::new(Self::start(source, axis))),
        }
    }

    fn start<S: ImageSource + 'static>(
        source: S,
        axis: Axis,
    ) -> Arc<Pending<RgbaImage>> {
        spawn_pending("seamgrid-loader", move || {
            let image = source.load()?;
            let (width, height) = image.dimensions();
            let even = even_along(&image, axis);
            if even.dimensions() != (width, height) {
                info!(
                    "trimmed {}x{} image to {}x{}",
                    width,
                    height,
                    even.width(),
                    even.height()
                );
            }
            Ok(even)
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The loaded image, waiting for it if need be.
    pub fn image(&self) -> Result<Arc<RgbaImage>> {
        self.image.get()
    }

    /// The loaded image read as a mask.
    pub fn mask(&self) -> Result<GrayImage> {
        Ok(mask_from_image(&*self.image()?))
    }

    /// Start loading a different source in place of this one.
    pub fn reload<S: ImageSource + 'static>(&self, source: S) -> u64 {
        self.image.replace(Self::start(source, self.axis))
    }

    pub fn generation(&self) -> u64 {
        self.image.generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{ImageBuffer, Rgba};

    fn solid(width: u32, height: u32, v: u8) -> RgbaImage {
        ImageBuffer::from_pixel(width, height, Rgba([v, v, v, 255]))
    }

    #[test]
    fn odd_widths_are_trimmed() {
        let loader = ImageLoader::new(solid(5, 3, 9), Axis::Vertical);
        assert_eq!(loader.image().unwrap().dimensions(), (4, 3));

        let loader = ImageLoader::new(solid(5, 3, 9), Axis::Horizontal);
        assert_eq!(loader.image().unwrap().dimensions(), (5, 2));
    }

    #[test]
    fn reload_replaces_the_image() {
        let loader = ImageLoader::new(solid(4, 4, 1), Axis::Vertical);
        assert_eq!(loader.reload(solid(2, 2, 200)), 1);
        let image = loader.image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(loader.mask().unwrap().get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn missing_files_are_resource_errors() {
        let loader = ImageLoader::new(PathBuf::from("/nonexistent/seamgrid.png"), Axis::Vertical);
        let err = loader.image().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.to_string().contains("seamgrid.png"));
    }
}
