use std::fmt;

use serde::Serialize;

/// Pixel position of a block's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Quantized translation vector between two block positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Shift {
    dx: i32,
    dy: i32,
}

impl Shift {
    /// Snap both components to the nearest multiple of `quantum`.
    pub fn quantized(dx: i32, dy: i32, quantum: i32) -> Self {
        Self {
            dx: snap(dx, quantum),
            dy: snap(dy, quantum),
        }
    }

    pub fn dx(&self) -> i32 {
        self.dx
    }

    pub fn dy(&self) -> i32 {
        self.dy
    }

    pub fn negated(&self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    /// Canonical form: `dy > 0`, or `dy == 0` and `dx >= 0`. A shift and
    /// its negation share one canonical representative.
    pub fn is_canonical(&self) -> bool {
        self.dy > 0 || (self.dy == 0 && self.dx >= 0)
    }

    pub fn canonicalized(&self) -> Self {
        if self.is_canonical() {
            *self
        } else {
            self.negated()
        }
    }

    pub fn magnitude_sq(&self) -> i64 {
        self.dx as i64 * self.dx as i64 + self.dy as i64 * self.dy as i64
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

fn snap(v: i32, quantum: i32) -> i32 {
    let half = quantum / 2;
    if v >= 0 {
        (v + half) / quantum * quantum
    } else {
        -((-v + half) / quantum * quantum)
    }
}

/// A shift bucket promoted to a detection candidate: the quantized
/// translation plus every supporting block pair.
#[derive(Debug, Clone)]
pub struct ShiftHit {
    shift: Shift,
    image_size: (u32, u32),
    min_hits: usize,
    block_size: u32,
    pairs: Vec<(Point, Point)>,
    ranking: usize,
}

impl ShiftHit {
    pub fn new(shift: Shift, image_size: (u32, u32), min_hits: usize, block_size: u32) -> Self {
        Self {
            shift,
            image_size,
            min_hits,
            block_size,
            pairs: Vec::new(),
            ranking: 0,
        }
    }

    pub fn set_pairs(&mut self, pairs: Vec<(Point, Point)>) {
        self.pairs = pairs;
    }

    pub fn shift(&self) -> Shift {
        self.shift
    }

    pub fn dx(&self) -> i32 {
        self.shift.dx()
    }

    pub fn dy(&self) -> i32 {
        self.shift.dy()
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn pairs(&self) -> &[(Point, Point)] {
        &self.pairs
    }

    pub fn ranking(&self) -> usize {
        self.ranking
    }

    pub fn set_ranking(&mut self, ranking: usize) {
        self.ranking = ranking;
    }

    /// Arithmetic mean of the `from` positions; the annotator uses it as
    /// the arrow origin.
    pub fn centroid(&self) -> Point {
        if self.pairs.is_empty() {
            return Point::new(0, 0);
        }
        let n = self.pairs.len() as u64;
        let sum_x: u64 = self.pairs.iter().map(|(from, _)| from.x as u64).sum();
        let sum_y: u64 = self.pairs.iter().map(|(from, _)| from.y as u64).sum();
        Point::new((sum_x / n) as u32, (sum_y / n) as u32)
    }

    /// Larger side of the bounding box of the `from` positions.
    fn spread(&self) -> u32 {
        let mut min_x = u32::MAX;
        let mut max_x = 0;
        let mut min_y = u32::MAX;
        let mut max_y = 0;

        if self.pairs.is_empty() {
            return 0;
        }
        for (from, _) in &self.pairs {
            min_x = min_x.min(from.x);
            max_x = max_x.max(from.x);
            min_y = min_y.min(from.y);
            max_y = max_y.max(from.y);
        }
        (max_x - min_x).max(max_y - min_y)
    }

    /// Enough supporting pairs, spread over more than a tight local blob.
    pub fn looks_good(&self) -> bool {
        self.pairs.len() >= self.min_hits && self.spread() >= self.block_size / 2
    }

    /// Descending sort key: support first, shift magnitude as tie-break.
    pub(crate) fn sort_key(&self) -> (usize, i64) {
        (self.pairs.len(), self.shift.magnitude_sq())
    }
}

impl fmt::Display for ShiftHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank {}: shift {} supported by {} pairs around {}",
            self.ranking,
            self.shift,
            self.pairs.len(),
            self.centroid()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap(0, 4), 0);
        assert_eq!(snap(1, 4), 0);
        assert_eq!(snap(2, 4), 4);
        assert_eq!(snap(5, 4), 4);
        assert_eq!(snap(43, 4), 44);
        assert_eq!(snap(-1, 4), 0);
        assert_eq!(snap(-2, 4), -4);
        assert_eq!(snap(-43, 4), -44);
    }

    #[test]
    fn quantum_one_is_identity() {
        for v in [-17, -1, 0, 3, 95] {
            assert_eq!(snap(v, 1), v);
        }
    }

    #[test]
    fn canonical_representative_folds_negation() {
        let up = Shift::quantized(8, 12, 4);
        let down = up.negated();

        assert!(up.is_canonical());
        assert!(!down.is_canonical());
        assert_eq!(down.canonicalized(), up);

        // Horizontal shifts: positive dx wins.
        assert!(Shift::quantized(8, 0, 4).is_canonical());
        assert!(!Shift::quantized(-8, 0, 4).is_canonical());
        assert_eq!(Shift::quantized(-8, 0, 4).canonicalized(), Shift::quantized(8, 0, 4));
    }

    fn hit_with_pairs(pairs: Vec<(Point, Point)>, min_hits: usize) -> ShiftHit {
        let mut hit = ShiftHit::new(Shift::quantized(40, 40, 4), (128, 128), min_hits, 16);
        hit.set_pairs(pairs);
        hit
    }

    fn spread_pairs(count: usize, step: u32) -> Vec<(Point, Point)> {
        (0..count as u32)
            .map(|i| (Point::new(i * step, 4), Point::new(i * step + 40, 44)))
            .collect()
    }

    #[test]
    fn looks_good_needs_enough_pairs() {
        assert!(!hit_with_pairs(spread_pairs(2, 8), 3).looks_good());
        assert!(hit_with_pairs(spread_pairs(3, 8), 3).looks_good());
    }

    #[test]
    fn looks_good_rejects_tight_blobs() {
        // Ten pairs all within a 2-pixel blob: plenty of support, no spread.
        assert!(!hit_with_pairs(spread_pairs(10, 0), 3).looks_good());
        assert!(hit_with_pairs(spread_pairs(10, 2), 3).looks_good());
    }

    #[test]
    fn centroid_averages_from_positions() {
        let hit = hit_with_pairs(
            vec![
                (Point::new(0, 10), Point::new(40, 50)),
                (Point::new(20, 30), Point::new(60, 70)),
            ],
            1,
        );
        assert_eq!(hit.centroid(), Point::new(10, 20));
    }

    #[test]
    fn sort_key_prefers_support_then_magnitude() {
        let small = hit_with_pairs(spread_pairs(3, 8), 1);
        let large = hit_with_pairs(spread_pairs(5, 8), 1);
        assert!(large.sort_key() > small.sort_key());

        let mut far = hit_with_pairs(spread_pairs(3, 8), 1);
        far.shift = Shift::quantized(100, 0, 4);
        assert!(far.sort_key() > small.sort_key());
    }
}
