//! Copy-move forgery detection for raster images.
//!
//! The detector tiles the luminance plane into overlapping blocks, orders
//! them by a low-frequency DCT signature, clusters near-duplicate pairs by
//! their quantized translation vector, and renders `from`/`to` overlay
//! canvases for the ranked clusters.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use serde::Serialize;

use crate::report::visualization::Annotator;
use crate::report::JsonReport;

pub mod analysis;
pub mod error;
pub mod grey;
pub mod image_utils;
pub mod report;

pub use analysis::shift::{Point, Shift, ShiftHit};
pub use analysis::sorter::{DctSorter, ShiftImages};
pub use error::{CopyMoveError, Result};
pub use grey::GreyView;

#[derive(Debug, Clone, Serialize)]
pub struct SorterParams {
    /// Strictness knob: raises the stddev floor for textured blocks and
    /// tightens the signature tolerance.
    pub quality: u32,
    /// Minimum bucket size for a shift to become a hit.
    pub minimal_hits: usize,
    /// Block side in pixels; even, at least 8.
    pub block_size: u32,
    /// Shift vectors snap to multiples of this quantum.
    pub shift_quantum: u32,
}

impl Default for SorterParams {
    fn default() -> Self {
        Self {
            quality: 5,
            minimal_hits: 10,
            block_size: 16,
            shift_quantum: 4,
        }
    }
}

impl SorterParams {
    pub fn valid(&self) -> bool {
        (1..=10).contains(&self.quality)
            && self.minimal_hits >= 1
            && self.block_size >= 8
            && self.block_size % 2 == 0
            && self.shift_quantum >= 1
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(CopyMoveError::InvalidParams(format!("{self:?}")))
        }
    }

    /// Minimum standard deviation for a block to count as textured.
    pub(crate) fn stddev_floor(&self) -> f32 {
        self.quality as f32
    }

    /// Per-coefficient agreement tolerance; higher quality is tighter.
    pub(crate) fn similarity_tolerance(&self) -> f32 {
        32.0 / self.quality as f32
    }
}

/// Convenience front end: decode an image, run the detector, collect the
/// ranked hits and overlay canvases.
pub struct CopyMoveAnalyzer {
    original: DynamicImage,
    params: SorterParams,
}

impl CopyMoveAnalyzer {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            original: image::open(path)?,
            params: SorterParams::default(),
        })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            original: image,
            params: SorterParams::default(),
        }
    }

    pub fn with_params(mut self, params: SorterParams) -> Result<Self> {
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    pub fn detect(&self) -> Result<CopyMoveReport> {
        let grey = image_utils::rgb_to_gray(&self.original.to_rgb8());

        let mut sorter = DctSorter::new();
        sorter.set_params(self.params.clone())?;
        sorter.set_grey(&grey)?;
        sorter.work()?;

        Ok(CopyMoveReport {
            params: self.params.clone(),
            hits: sorter.shift_hits()?.to_vec(),
            images: sorter.shift_images()?.clone(),
        })
    }
}

/// Everything a completed detection run produced, plus the parameters
/// that produced it.
#[derive(Debug, Clone)]
pub struct CopyMoveReport {
    pub params: SorterParams,
    pub hits: Vec<ShiftHit>,
    pub images: ShiftImages,
}

impl CopyMoveReport {
    /// Draw the ranked hits onto a copy of the inspected image.
    pub fn annotate(&self, original: &RgbImage) -> RgbImage {
        Annotator::new().mark_hits(original, &self.hits)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        JsonReport::from(self).to_json()
    }
}
