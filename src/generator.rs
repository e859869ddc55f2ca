// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seam generation sessions
//!
//! A `SeamGenerator` owns one image's worth of state: the live energy
//! map, the priority grid being filled in, and the strategy that
//! decides which seams come out next.  The energy map is built on a
//! worker thread as soon as the session exists; the first call that
//! needs it waits for it.
//!
//! Generation proceeds in batches.  A batch is all-or-nothing: the
//! seams are checked against both the map and the grid before either
//! is touched, so a failed batch leaves the session where the previous
//! one did.

use crate::energymap::{EnergyMap, EnergyMapOptions, Seam};
use crate::error::{Result, SeamError};
use crate::flipper::Axis;
use crate::priority::PriorityGrid;
use crate::profiler::Profiler;
use crate::registry::Registries;
use crate::source::ImageLoader;
use crate::staged::{spawn_pending, Pending};
use image::{GrayImage, RgbaImage};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Everything a session needs to know up front.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub generator: String,
    pub axis: Axis,
    /// Fraction of the live width to remove per batch.
    pub batch_percentage: f64,
    /// Floor on the batch size, when the image is wide enough.
    pub min_batch_size: u32,
    pub energy: EnergyMapOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            generator: "random".to_string(),
            axis: Axis::Vertical,
            batch_percentage: 0.05,
            min_batch_size: 10,
            energy: EnergyMapOptions::default(),
        }
    }
}

/// One strategy for choosing the next seams.
pub trait SeamBatcher: Send {
    fn name(&self) -> &'static str;

    /// Pick at least one seam from the live map, record each in `grid`
    /// starting at order `generated`, and take them out of the map.
    /// Returns how many seams were recorded.
    fn generate_batch(
        &mut self,
        energy: &mut EnergyMap,
        grid: &mut PriorityGrid,
        generated: u32,
    ) -> Result<u32>;
}

/// How many seams to take from a map `width` wide: a percentage of
/// the width rounded down to an even number, but never less than the
/// minimum (or the whole width, if that is smaller).
pub fn batch_size(width: u32, batch_percentage: f64, min_batch_size: u32) -> u32 {
    let scaled = ((f64::from(width) * batch_percentage).ceil().max(0.0) as u32 >> 1) << 1;
    scaled.max(min_batch_size.min(width)).min(width)
}

/// Record `seams` in the grid at consecutive orders from `generated`
/// and remove them from the map in one compaction.  Either all of it
/// happens or none of it.
pub fn apply_batch(
    energy: &mut EnergyMap,
    grid: &mut PriorityGrid,
    seams: &[Seam],
    generated: u32,
) -> Result<u32> {
    for seam in seams {
        energy.validate_seam(seam)?;
    }
    let originals: Vec<Vec<u32>> = seams
        .iter()
        .map(|seam| energy.seam_original_indices(seam))
        .collect();
    for indices in &originals {
        grid.check_unassigned(indices)?;
    }

    energy.remove_seams(seams)?;
    for (order, indices) in (generated..).zip(&originals) {
        grid.assign(indices, order)?;
    }
    Ok(seams.len() as u32)
}

/// A single seam, removed through the incremental path.
pub fn apply_seam(
    energy: &mut EnergyMap,
    grid: &mut PriorityGrid,
    seam: &[u32],
    order: u32,
) -> Result<()> {
    energy.validate_seam(seam)?;
    let indices = energy.seam_original_indices(seam);
    grid.check_unassigned(&indices)?;
    energy.remove_seam(seam)?;
    grid.assign(&indices, order)
}

/// Where a session is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// The energy map is still being built.
    Energizing,
    /// Ready for (more) batches.
    Batching,
    /// Every seam along the axis has an order.
    Done,
    /// The energy map could not be built; the session is unusable.
    Failed,
}

enum Stage {
    Energizing(Arc<Pending<EnergyMap>>),
    Ready(EnergyMap),
    Failed(SeamError),
}

impl Stage {
    // Wait for the worker, if it is still out.
    fn settle(&mut self) -> Result<&mut EnergyMap> {
        if let Stage::Energizing(pending) = self {
            // Nobody else holds the map, so this rarely copies.
            let settled = pending
                .take()
                .map(|map| Arc::try_unwrap(map).unwrap_or_else(|shared| (*shared).clone()));
            *self = match settled {
                Ok(map) => Stage::Ready(map),
                Err(err) => Stage::Failed(err),
            };
        }
        match self {
            Stage::Ready(map) => Ok(map),
            Stage::Failed(err) => Err(err.clone()),
            Stage::Energizing(_) => Err(SeamError::Resource(
                "energy map is not ready".to_string(),
            )),
        }
    }
}

pub struct SeamGenerator {
    batcher: Box<dyn SeamBatcher>,
    stage: Stage,
    grid: PriorityGrid,
    generated: u32,
    seam_capacity: u32,
    profiler: Profiler,
}

impl SeamGenerator {
    /// Start a session on pixels already in hand.  The strategy and
    /// the energy algorithm are looked up now, so a misconfiguration
    /// fails here; the energy map itself is built in the background.
    pub fn new(
        image: RgbaImage,
        mask: Option<GrayImage>,
        options: &GeneratorOptions,
        registries: &Registries,
    ) -> Result<Self> {
        SeamGenerator::start(options, registries, move || Ok((image, mask)))
    }

    /// Start a session on whatever `image` (and `mask`) are loading.
    /// The worker reads them through the loaders, so a reload that
    /// lands before the read is the image the session carves.
    pub fn from_loader(
        image: &ImageLoader,
        mask: Option<&ImageLoader>,
        options: &GeneratorOptions,
        registries: &Registries,
    ) -> Result<Self> {
        let image = image.clone();
        let mask = mask.cloned();
        SeamGenerator::start(options, registries, move || {
            let mask = match mask {
                Some(loader) => Some(loader.mask()?),
                None => None,
            };
            Ok(((*image.image()?).clone(), mask))
        })
    }

    fn start<F>(options: &GeneratorOptions, registries: &Registries, pixels: F) -> Result<Self>
    where
        F: FnOnce() -> Result<(RgbaImage, Option<GrayImage>)> + Send + 'static,
    {
        let batcher = registries.generator(options)?;
        let algorithm = registries.algorithm(&options.energy)?;
        let axis = options.axis;
        info!(
            "{} session, {} energy, {:?} seams",
            batcher.name(),
            algorithm.name(),
            axis
        );

        let pending = spawn_pending("seamgrid-energy", move || {
            let (image, mask) = pixels()?;
            EnergyMap::new(&image, mask.as_ref(), axis, algorithm)
        });

        Ok(SeamGenerator {
            batcher,
            stage: Stage::Energizing(pending),
            grid: PriorityGrid::new(0, 0),
            generated: 0,
            seam_capacity: 0,
            profiler: Profiler::new(),
        })
    }

    // The grid and the capacity are sized from the first map, in
    // original image orientation.
    fn energize(&mut self) -> Result<()> {
        let fresh = matches!(self.stage, Stage::Energizing(_));
        self.profiler.start("energize", Duration::from_millis(1));
        let settled = self.stage.settle();
        self.profiler.end("energize");
        let map = settled?;
        if fresh {
            let (width, height) = map.axis().oriented((map.width(), map.height()));
            self.seam_capacity = map.width();
            self.grid = PriorityGrid::new(width, height);
            info!("energy map ready for a {}x{} image", width, height);
        }
        Ok(())
    }

    pub fn state(&self) -> State {
        match &self.stage {
            Stage::Energizing(_) => State::Energizing,
            Stage::Failed(_) => State::Failed,
            Stage::Ready(_) if self.generated >= self.seam_capacity => State::Done,
            Stage::Ready(_) => State::Batching,
        }
    }

    /// Seams generated so far.
    pub fn generated(&self) -> u32 {
        self.generated
    }

    /// The most seams this image can yield along its axis, waiting for
    /// the energy map if need be.
    pub fn seam_capacity(&mut self) -> Result<u32> {
        self.energize()?;
        Ok(self.seam_capacity)
    }

    /// The grid so far; empty until the energy map is ready.
    pub fn grid(&self) -> &PriorityGrid {
        &self.grid
    }

    pub fn into_grid(self) -> PriorityGrid {
        self.grid
    }

    /// The live energy map, waiting for it if need be.
    pub fn energy_map(&mut self) -> Result<&EnergyMap> {
        self.energize()?;
        self.stage.settle().map(|map| &*map)
    }

    /// Generate batches until at least `min_seams` seams have an order,
    /// and return the grid.  Asking for more seams than the image has
    /// along the axis is an error; asking for fewer than are already
    /// done returns at once.
    pub fn generate_seam_grid(&mut self, min_seams: u32) -> Result<&PriorityGrid> {
        self.energize()?;
        if min_seams > self.seam_capacity {
            return Err(SeamError::TooManySeams {
                requested: min_seams,
                available: self.seam_capacity,
            });
        }

        let SeamGenerator {
            batcher,
            stage,
            grid,
            generated,
            seam_capacity,
            profiler,
        } = self;
        let energy = stage.settle()?;

        let mut iterations = 0;
        while *generated < min_seams {
            iterations += 1;
            if iterations > *seam_capacity {
                return Err(SeamError::Stalled(batcher.name()));
            }

            profiler.start("batch", Duration::from_millis(1));
            let produced = batcher.generate_batch(energy, grid, *generated);
            profiler.end("batch");

            match produced? {
                0 => return Err(SeamError::Stalled(batcher.name())),
                n => *generated += n,
            }
            debug!(
                "{} batch: {} seams ({} of {})",
                batcher.name(),
                *generated,
                min_seams,
                *seam_capacity
            );
        }

        Ok(&*grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energymap::Algorithm;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn batch_sizes() {
        // 5% of 400 is 20.
        assert_eq!(batch_size(400, 0.05, 10), 20);
        // ceil(5% of 90) = 5, evened down to 4, raised to the minimum.
        assert_eq!(batch_size(90, 0.05, 10), 10);
        // 25, evened down.
        assert_eq!(batch_size(500, 0.05, 10), 24);
        assert_eq!(batch_size(6, 0.05, 10), 6);
        assert_eq!(batch_size(4, 0.0, 1), 1);
        assert_eq!(batch_size(0, 0.05, 10), 0);
        assert_eq!(batch_size(10, 1.0, 1), 10);
    }

    fn stripes() -> RgbaImage {
        ImageBuffer::from_fn(8, 4, |x, _| {
            let v = (x * 30) as u8;
            Rgba([v, v, v, 255])
        })
    }

    struct Misbehaving;

    impl SeamBatcher for Misbehaving {
        fn name(&self) -> &'static str {
            "misbehaving"
        }

        fn generate_batch(&mut self, _: &mut EnergyMap, _: &mut PriorityGrid, _: u32) -> Result<u32> {
            Ok(0)
        }
    }

    #[test]
    fn a_batch_that_fails_changes_nothing() {
        let mut energy = EnergyMap::new(&stripes(), None, Axis::Vertical, Algorithm::Sobel).unwrap();
        let mut grid = PriorityGrid::new(8, 4);
        let before = energy.original_indices().to_vec();

        // One good seam, one that runs off the map.
        let err = apply_batch(&mut energy, &mut grid, &[vec![2, 2, 2, 2], vec![3, 4, 5, 9]], 0);
        assert!(err.is_err());
        assert_eq!(energy.original_indices(), &before[..]);
        assert_eq!(grid.assigned(), 0);

        // A seam through a pixel some earlier batch already claimed.
        grid.assign(&[10], 0).unwrap();
        let err = apply_batch(&mut energy, &mut grid, &[vec![2, 2, 2, 2]], 1);
        assert_eq!(err, Err(SeamError::SeamOverlap(10)));
        assert_eq!(energy.original_indices(), &before[..]);
        assert_eq!(energy.width(), 8);
        assert_eq!(grid.assigned(), 1);
    }

    #[test]
    fn batches_are_recorded_in_order() {
        let mut energy = EnergyMap::new(&stripes(), None, Axis::Vertical, Algorithm::Sobel).unwrap();
        let mut grid = PriorityGrid::new(8, 4);
        let n = apply_batch(&mut energy, &mut grid, &[vec![1, 1, 1, 1], vec![5, 5, 5, 5]], 0).unwrap();
        assert_eq!(n, 2);
        assert_eq!(grid.get(1), Some(0));
        assert_eq!(grid.get(29), Some(1));
        apply_seam(&mut energy, &mut grid, &[0, 0, 0, 0], 2).unwrap();
        assert_eq!(grid.get(24), Some(2));
        assert_eq!(grid.assigned(), 12);
        assert_eq!(energy.width(), 5);
    }

    #[test]
    fn stalled_strategies_are_caught() {
        let mut session = SeamGenerator::new(
            stripes(),
            None,
            &GeneratorOptions::default(),
            &Registries::register_all(),
        )
        .unwrap();
        session.batcher = Box::new(Misbehaving);
        assert_eq!(
            session.generate_seam_grid(2).unwrap_err(),
            SeamError::Stalled("misbehaving")
        );
        assert_eq!(session.generated(), 0);
    }

    #[test]
    fn sessions_refuse_impossible_requests() {
        let mut session = SeamGenerator::new(
            stripes(),
            None,
            &GeneratorOptions::default(),
            &Registries::register_all(),
        )
        .unwrap();
        assert_eq!(
            session.generate_seam_grid(9).unwrap_err(),
            SeamError::TooManySeams {
                requested: 9,
                available: 8
            }
        );
        assert!(session.energy_map().is_ok());
        assert_eq!(session.state(), State::Batching);
    }

    #[test]
    fn sessions_read_through_loaders() {
        let loader = ImageLoader::new(ImageBuffer::from_pixel(3, 3, Rgba([5, 5, 5, 255])), Axis::Vertical);
        // Lands before the worker reads, or the worker waits for it.
        loader.reload(stripes());
        let mut session = SeamGenerator::from_loader(
            &loader,
            None,
            &GeneratorOptions::default(),
            &Registries::register_all(),
        )
        .unwrap();
        assert_eq!(session.seam_capacity(), Ok(8));
        session.generate_seam_grid(4).unwrap();
        assert_eq!((session.grid().width(), session.grid().height()), (8, 4));
        assert_eq!(session.grid().assigned(), session.generated() as usize * 4);
    }

    #[test]
    fn loader_failures_fail_the_session() {
        let loader = ImageLoader::new(
            std::path::PathBuf::from("/nonexistent/seamgrid.png"),
            Axis::Vertical,
        );
        let mut session = SeamGenerator::from_loader(
            &loader,
            None,
            &GeneratorOptions::default(),
            &Registries::register_all(),
        )
        .unwrap();
        let err = session.generate_seam_grid(1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resource);
        assert_eq!(session.state(), State::Failed);
        // The failure sticks.
        assert_eq!(session.seam_capacity(), Err(err));
    }

    #[test]
    fn bad_masks_fail_the_session() {
        let mut session = SeamGenerator::new(
            stripes(),
            Some(GrayImage::new(2, 2)),
            &GeneratorOptions::default(),
            &Registries::register_all(),
        )
        .unwrap();
        assert!(session.generate_seam_grid(1).is_err());
        assert_eq!(session.state(), State::Failed);
    }
}
