use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{GrayImage, Luma};
use rayon::prelude::*;

use crate::analysis::block::Block;
use crate::analysis::dct::{DctPlan, DctScratch};
use crate::analysis::shift::{Point, Shift, ShiftHit};
use crate::error::{CopyMoveError, Result};
use crate::grey::GreyView;
use crate::image_utils;
use crate::SorterParams;

/// Pipeline progress. Transitions are one-way; `set_grey` is the only
/// way back to the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    GreyLoaded,
    Working,
    BlocksBuilt,
    BlocksSorted,
    DuplicatesFound,
    Ranked,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Empty => "Empty",
            State::GreyLoaded => "GreyLoaded",
            State::Working => "Working",
            State::BlocksBuilt => "BlocksBuilt",
            State::BlocksSorted => "BlocksSorted",
            State::DuplicatesFound => "DuplicatesFound",
            State::Ranked => "Ranked",
        }
    }
}

/// Overlay canvases of a completed run: stamped source and destination
/// regions, zero where nothing was detected.
#[derive(Debug, Clone)]
pub struct ShiftImages {
    pub from: GrayImage,
    pub to: GrayImage,
}

pub type ProgressCallback = Box<dyn Fn(u32) + Send + Sync>;

/// Copy-move detector: orders blocks of the luminance plane by their DCT
/// signature, then clusters near-duplicate pairs by translation vector.
pub struct DctSorter {
    params: SorterParams,
    state: State,
    grey: GrayImage,
    images: ShiftImages,
    blocks: Vec<Block>,
    shifts: BTreeMap<Shift, Vec<(Point, Point)>>,
    hits: Vec<ShiftHit>,
    progress: Option<ProgressCallback>,
}

impl Default for DctSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl DctSorter {
    pub fn new() -> Self {
        Self {
            params: SorterParams::default(),
            state: State::Empty,
            grey: GrayImage::new(0, 0),
            images: ShiftImages {
                from: GrayImage::new(0, 0),
                to: GrayImage::new(0, 0),
            },
            blocks: Vec::new(),
            shifts: BTreeMap::new(),
            hits: Vec::new(),
            progress: None,
        }
    }

    /// Allowed in any state; takes effect at the next `set_grey`/`work`.
    pub fn set_params(&mut self, params: SorterParams) -> Result<()> {
        params.validate()?;
        log::debug!("params: {params:?}");
        self.params = params;
        Ok(())
    }

    /// Install the luminance source and reset all downstream state.
    pub fn set_grey<G: GreyView>(&mut self, grey: &G) -> Result<()> {
        let (width, height) = (grey.width(), grey.height());
        let side = self.params.block_size;
        if width < side || height < side {
            return Err(CopyMoveError::EmptyInput(format!(
                "{width}x{height} plane cannot fit a single {side}x{side} block"
            )));
        }

        log::debug!("grey source {width}x{height}");
        let mut plane = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                plane.put_pixel(x, y, Luma([grey.sample(x, y)]));
            }
        }

        self.grey = plane;
        self.images = ShiftImages {
            from: GrayImage::new(width, height),
            to: GrayImage::new(width, height),
        };
        self.blocks.clear();
        self.shifts.clear();
        self.hits.clear();
        self.state = State::GreyLoaded;
        Ok(())
    }

    pub fn set_progress_callback(&mut self, callback: impl Fn(u32) + Send + Sync + 'static) {
        self.progress = Some(Box::new(callback));
    }

    /// Run the full pipeline. Needs a freshly loaded plane; call
    /// `set_grey` again before reworking.
    pub fn work(&mut self) -> Result<()> {
        self.expect_state(State::GreyLoaded, "work")?;
        self.state = State::Working;
        log::info!(
            "analyzing {}x{} plane",
            self.grey.width(),
            self.grey.height()
        );

        self.report_progress(20);
        self.read_grey_to_blocks()?;
        self.report_progress(40);
        self.sort_blocks()?;
        self.report_progress(60);
        self.search_duplicates()?;
        self.report_progress(80);
        self.sort_shifts()?;
        self.report_progress(99);
        Ok(())
    }

    /// Ranked hits, best supported first. Only readable after `work`.
    pub fn shift_hits(&self) -> Result<&[ShiftHit]> {
        self.require_ranked("shift_hits")?;
        Ok(&self.hits)
    }

    /// The stamped `from`/`to` overlay canvases. Only readable after `work`.
    pub fn shift_images(&self) -> Result<&ShiftImages> {
        self.require_ranked("shift_images")?;
        Ok(&self.images)
    }

    /// Diagnostic dump of the signature stream, one block per line.
    pub fn dump_blocks<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for block in &self.blocks {
            writeln!(out, "{block}")?;
        }
        Ok(())
    }

    fn require_ranked(&self, operation: &'static str) -> Result<()> {
        if self.state != State::Ranked {
            return Err(CopyMoveError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    /// Entry guard for a stage. The stage commits its own transition
    /// only after its fallible work has succeeded, so a failed stage
    /// leaves the pipeline short of `Ranked` and the getters blocked.
    fn expect_state(&self, expected: State, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(CopyMoveError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    fn report_progress(&self, percent: u32) {
        if let Some(callback) = &self.progress {
            callback(percent);
        }
    }

    /// Stage 2: extract one block per grid position, in parallel. Each
    /// worker owns a scratch window; block slots are disjoint and the
    /// `collect` is the join barrier.
    fn read_grey_to_blocks(&mut self) -> Result<()> {
        self.expect_state(State::Working, "read_grey_to_blocks")?;

        let side = self.params.block_size;
        let wide = (self.grey.width() - side) as usize;
        let tall = (self.grey.height() - side) as usize;
        let plan = DctPlan::new(side as usize);
        let floor = self.params.stddev_floor();
        let grey = &self.grey;

        log::debug!("extracting {} blocks", wide * tall);
        let blocks: Vec<Block> = (0..wide * tall)
            .into_par_iter()
            .map_init(
                || DctScratch::new(side as usize),
                |scratch, i| {
                    let x = (i % wide) as u32;
                    let y = (i / wide) as u32;
                    Block::extract(grey, x, y, &plan, floor, scratch)
                },
            )
            .collect();

        self.blocks = blocks;
        self.state = State::BlocksBuilt;
        Ok(())
    }

    /// Stage 3: order the signature stream so near-duplicates are adjacent.
    fn sort_blocks(&mut self) -> Result<()> {
        self.expect_state(State::BlocksBuilt, "sort_blocks")?;

        log::debug!("sorting {} signatures", self.blocks.len());
        self.blocks.sort_unstable_by(Block::cmp_signature);

        if let Some(i) = self
            .blocks
            .windows(2)
            .position(|w| Block::cmp_signature(&w[0], &w[1]) == Ordering::Greater)
        {
            return Err(CopyMoveError::Internal(format!(
                "signature order violated at index {i}"
            )));
        }
        self.state = State::BlocksSorted;
        Ok(())
    }

    /// Stage 4: sweep similarity runs and bucket candidate pairs by
    /// quantized shift. A shift and its negation share one bucket.
    fn search_duplicates(&mut self) -> Result<()> {
        self.expect_state(State::BlocksSorted, "search_duplicates")?;

        let tolerance = self.params.similarity_tolerance();
        let min_distance = 5 * self.params.block_size;
        let quantum = self.params.shift_quantum as i32;

        for b in 0..self.blocks.len() {
            let block = &self.blocks[b];
            if !block.interesting() {
                continue;
            }

            for c in (b + 1)..self.blocks.len() {
                let other = &self.blocks[c];
                if !block.similar_freqs(other, tolerance) {
                    break;
                }
                // An uninteresting run member is skipped, not a run end.
                if other.interesting() && block.manhattan_distance(other) > min_distance {
                    let shift = Shift::quantized(
                        other.x() as i32 - block.x() as i32,
                        other.y() as i32 - block.y() as i32,
                        quantum,
                    );
                    let (key, pair) = bucket_insertion(shift, block.pos(), other.pos());
                    self.shifts.entry(key).or_default().push(pair);
                }
            }
        }

        log::debug!("{} shift buckets", self.shifts.len());
        self.state = State::DuplicatesFound;
        Ok(())
    }

    /// Stage 5: promote buckets to hits, rank them, stamp the overlays.
    fn sort_shifts(&mut self) -> Result<()> {
        self.expect_state(State::DuplicatesFound, "sort_shifts")?;

        let size = self.grey.dimensions();
        let side = self.params.block_size;
        let quantum = self.params.shift_quantum as i32;

        let mut hits = Vec::with_capacity(self.shifts.len());
        for (shift, pairs) in std::mem::take(&mut self.shifts) {
            for (from, to) in &pairs {
                let actual = Shift::quantized(
                    to.x as i32 - from.x as i32,
                    to.y as i32 - from.y as i32,
                    quantum,
                );
                if actual != shift && actual != shift.negated() {
                    return Err(CopyMoveError::Internal(format!(
                        "pair {from} -> {to} landed in bucket {shift}"
                    )));
                }
            }

            let mut hit = ShiftHit::new(shift, size, self.params.minimal_hits, side);
            hit.set_pairs(pairs);
            if hit.looks_good() {
                hits.push(hit);
            }
        }

        hits.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        for (position, hit) in hits.iter_mut().enumerate() {
            hit.set_ranking(position);
        }

        let total = hits.len();
        log::info!("{total} shift hits");
        for (i, hit) in hits.iter().enumerate() {
            log::debug!("found {hit}");
            let intensity = (255 * (total - i) / total) as u8;
            for (from, to) in hit.pairs() {
                image_utils::fill_block(&mut self.images.from, from.x, from.y, side, intensity);
                image_utils::fill_block(&mut self.images.to, to.x, to.y, side, intensity);
            }
        }

        self.hits = hits;
        self.state = State::Ranked;
        Ok(())
    }
}

/// Canonicalize a candidate at insertion: a non-canonical shift is
/// negated and its pair swapped, so antiparallel candidates fold into
/// the same bucket without a lookup-then-insert dance.
fn bucket_insertion(shift: Shift, from: Point, to: Point) -> (Shift, (Point, Point)) {
    if shift.is_canonical() {
        (shift, (from, to))
    } else {
        (shift.negated(), (to, from))
    }
}
