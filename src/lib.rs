// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Batched seam-priority generation for content-aware resizing.
//!
//! Give a `SeamGenerator` an image and ask it for some number of
//! seams; it hands back a `PriorityGrid` saying, for every pixel of the
//! original image, in which order its seam would be removed.  `carve`
//! turns a grid into a narrower (or wider) image.

#[macro_use]
extern crate itertools;

#[macro_use]
mod ternary;

pub mod bottomk;
pub mod compact;
pub mod error;
pub mod flipper;
pub mod grayscale;
pub mod priority;
pub mod twodmap;

pub mod energy;
pub mod energymap;
#[cfg(feature = "dual")]
pub mod dual;
#[cfg(feature = "boundary-aware")]
pub mod boundary;

pub mod seamfinder;
pub mod generator;
pub mod registry;
#[cfg(feature = "random-generator")]
pub mod random;
#[cfg(feature = "predictive-generator")]
pub mod predictive;
#[cfg(feature = "full-generator")]
pub mod full;

pub mod profiler;
pub mod staged;
pub mod source;
pub mod seamcarver;

pub use bottomk::bottom_k;
pub use compact::remove_indices;
pub use energymap::{Algorithm, EnergyMap, EnergyMapOptions, Seam};
pub use error::{ErrorKind, Result, SeamError};
pub use flipper::Axis;
pub use generator::{GeneratorOptions, SeamBatcher, SeamGenerator, State};
pub use grayscale::{to_grayscale, Grayscale};
pub use priority::{PriorityGrid, UNASSIGNED};
pub use profiler::Profiler;
pub use registry::Registries;
pub use seamcarver::carve;
pub use source::{ImageLoader, ImageSource};
