// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors
//!
//! Every failure the engine can report, grouped into the three kinds a
//! caller actually has to distinguish: a bad configuration (an
//! algorithm that isn't in this build), bad input to a single call,
//! and a collaborator that couldn't hand us pixels.

use failure::Fail;

/// The broad class of a [`SeamError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An algorithm or generator was requested that was never
    /// registered.  Fatal; never silently substituted.
    Configuration,
    /// The arguments to a single call were malformed.  The call fails;
    /// retained state is untouched.
    Validation,
    /// The image (or mask) could not be acquired.
    Resource,
}

#[derive(Debug, Clone, PartialEq, Fail)]
pub enum SeamError {
    #[fail(
        display = "energy map algorithm '{}' is not registered or included in the build",
        _0
    )]
    UnknownAlgorithm(String),

    #[fail(
        display = "seam generator '{}' is not registered or included in the build",
        _0
    )]
    UnknownGenerator(String),

    #[fail(display = "invalid seam: {}", _0)]
    InvalidSeam(String),

    #[fail(display = "indices not sorted: {} follows {}", current, previous)]
    UnsortedIndices { previous: usize, current: usize },

    #[fail(display = "duplicate index {}", _0)]
    DuplicateIndex(usize),

    #[fail(
        display = "index {} with group size {} is out of bounds for length {}",
        index, group, len
    )]
    IndexOutOfBounds { index: usize, group: usize, len: usize },

    #[fail(
        display = "cannot generate {} seams for an image spanning {} pixels",
        requested, available
    )]
    TooManySeams { requested: u32, available: u32 },

    #[fail(
        display = "{} is {}x{} but the image is {}x{}",
        what, width, height, expected_width, expected_height
    )]
    DimensionMismatch {
        what: &'static str,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[fail(display = "seam overlap detected at original pixel {}", _0)]
    SeamOverlap(usize),

    #[fail(display = "seam generator '{}' produced an empty batch", _0)]
    Stalled(&'static str),

    #[fail(display = "{}", _0)]
    Resource(String),
}

impl SeamError {
    /// Which of the three broad error classes this belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SeamError::UnknownAlgorithm(_) | SeamError::UnknownGenerator(_) => {
                ErrorKind::Configuration
            }
            SeamError::Resource(_) => ErrorKind::Resource,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<image::ImageError> for SeamError {
    fn from(err: image::ImageError) -> Self {
        SeamError::Resource(format!("failed to load image: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, SeamError>;
