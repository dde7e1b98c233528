use std::cmp::Ordering;
use std::fmt;

use crate::analysis::dct::{DctPlan, DctScratch, SIGNATURE_LEN};
use crate::analysis::shift::Point;
use crate::grey::GreyView;
use crate::image_utils;

/// One overlapping N×N tile of the luminance plane.
///
/// Only the low-frequency signature survives extraction; the pixel window
/// lives in worker-local scratch and is reused for the next tile.
#[derive(Debug, Clone)]
pub struct Block {
    x: u32,
    y: u32,
    stddev: f32,
    interesting: bool,
    sig: [f32; SIGNATURE_LEN],
}

impl Block {
    pub fn extract<G: GreyView>(
        grey: &G,
        x: u32,
        y: u32,
        plan: &DctPlan,
        stddev_floor: f32,
        scratch: &mut DctScratch,
    ) -> Self {
        grey.read_block(&mut scratch.window, x, y);
        let stddev = image_utils::window_stddev(&scratch.window);
        scratch.window.mapv_inplace(|v| v - 128.0);
        plan.forward_into(scratch);

        Self {
            x,
            y,
            stddev,
            interesting: stddev >= stddev_floor,
            sig: plan.signature_of(scratch),
        }
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn stddev(&self) -> f32 {
        self.stddev
    }

    /// Textured blocks only; flat regions never support a shift.
    pub fn interesting(&self) -> bool {
        self.interesting
    }

    /// Agreement of the low-frequency coefficients within `tolerance`.
    pub fn similar_freqs(&self, other: &Block, tolerance: f32) -> bool {
        self.sig
            .iter()
            .zip(other.sig.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    pub fn manhattan_distance(&self, other: &Block) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Total order: lexicographic over the signature with bitwise-exact
    /// float comparison, position as the final tie-break.
    pub fn cmp_signature(&self, other: &Block) -> Ordering {
        for (a, b) in self.sig.iter().zip(other.sig.iter()) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        (self.x, self.y).cmp(&(other.x, other.y))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} stddev {:.3} {}",
            self.x,
            self.y,
            self.stddev,
            if self.interesting { "textured" } else { "flat" }
        )?;
        for c in &self.sig {
            write!(f, " {c:.3}")?;
        }
        Ok(())
    }
}
