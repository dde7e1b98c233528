use ndarray::linalg::general_mat_mul;
use ndarray::Array2;

/// Number of zig-zag coefficients retained as a block signature.
pub const SIGNATURE_LEN: usize = 16;

/// Precomputed machinery for the N×N 2-D DCT-II.
///
/// The transform is separable: with `B` the orthonormal basis matrix,
/// the coefficient matrix of a pixel window `X` is `B · X · Bᵀ`.
pub struct DctPlan {
    side: usize,
    basis: Array2<f32>,
    basis_t: Array2<f32>,
    zigzag: Vec<usize>,
}

impl DctPlan {
    pub fn new(side: usize) -> Self {
        let basis = dct_basis(side);
        let basis_t = basis.t().to_owned();

        Self {
            side,
            basis,
            basis_t,
            zigzag: zigzag_order(side),
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Transform the scratch window in place, leaving the coefficient
    /// matrix in `scratch.coeffs`.
    pub fn forward_into(&self, scratch: &mut DctScratch) {
        general_mat_mul(1.0, &self.basis, &scratch.window, 0.0, &mut scratch.tmp);
        general_mat_mul(1.0, &scratch.tmp, &self.basis_t, 0.0, &mut scratch.coeffs);
    }

    /// The first [`SIGNATURE_LEN`] coefficients in zig-zag order,
    /// low frequencies first.
    pub fn signature_of(&self, scratch: &DctScratch) -> [f32; SIGNATURE_LEN] {
        let mut sig = [0.0f32; SIGNATURE_LEN];
        for (slot, &idx) in sig.iter_mut().zip(self.zigzag.iter()) {
            *slot = scratch.coeffs[[idx / self.side, idx % self.side]];
        }
        sig
    }
}

/// Per-worker buffers reused across block extractions.
pub struct DctScratch {
    pub window: Array2<f32>,
    tmp: Array2<f32>,
    coeffs: Array2<f32>,
}

impl DctScratch {
    pub fn new(side: usize) -> Self {
        Self {
            window: Array2::zeros((side, side)),
            tmp: Array2::zeros((side, side)),
            coeffs: Array2::zeros((side, side)),
        }
    }
}

/// Orthonormal DCT-II basis matrix for side `n`.
fn dct_basis(n: usize) -> Array2<f32> {
    let mut basis = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            basis[[i, j]] = if i == 0 {
                (1.0 / n as f32).sqrt()
            } else {
                (2.0 / n as f32).sqrt()
                    * (std::f32::consts::PI * (2.0 * j as f32 + 1.0) * i as f32
                        / (2.0 * n as f32))
                        .cos()
            };
        }
    }

    basis
}

/// Diagonal zig-zag walk over an n×n grid, as row-major indices.
///
/// Even antidiagonals are walked bottom-up, odd ones top-down, matching
/// the JPEG coefficient order for n = 8.
pub fn zigzag_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n * n);

    for s in 0..(2 * n - 1) {
        let lo = s.saturating_sub(n - 1);
        let hi = s.min(n - 1);

        if s % 2 == 0 {
            for row in (lo..=hi).rev() {
                order.push(row * n + (s - row));
            }
        } else {
            for row in lo..=hi {
                order.push(row * n + (s - row));
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_matches_jpeg_order_for_8x8() {
        let order = zigzag_order(8);
        // Leading entries of the canonical JPEG scan.
        assert_eq!(
            &order[..16],
            &[0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5]
        );
        assert_eq!(order[63], 63);
    }

    #[test]
    fn zigzag_is_a_permutation() {
        for n in [4usize, 8, 16] {
            let order = zigzag_order(n);
            let mut seen = vec![false; n * n];
            for &idx in &order {
                assert!(!seen[idx], "duplicate index {idx}");
                seen[idx] = true;
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn constant_window_has_dc_only() {
        let plan = DctPlan::new(8);
        let mut scratch = DctScratch::new(8);
        scratch.window.fill(1.0);
        plan.forward_into(&mut scratch);

        // DC of an orthonormal DCT-II of an all-ones window is n.
        assert!((scratch.coeffs[[0, 0]] - 8.0).abs() < 1e-4);
        for i in 0..8 {
            for j in 0..8 {
                if i == 0 && j == 0 {
                    continue;
                }
                assert!(scratch.coeffs[[i, j]].abs() < 1e-4);
            }
        }
    }

    #[test]
    fn basis_is_orthonormal() {
        let basis = dct_basis(16);
        let product = basis.dot(&basis.t());

        for i in 0..16 {
            for j in 0..16 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (product[[i, j]] - expected).abs() < 1e-4,
                    "entry ({i}, {j}) = {}",
                    product[[i, j]]
                );
            }
        }
    }

    #[test]
    fn signature_reads_low_frequencies_first() {
        let plan = DctPlan::new(8);
        let mut scratch = DctScratch::new(8);
        for i in 0..8 {
            for j in 0..8 {
                scratch.coeffs[[i, j]] = (i * 8 + j) as f32;
            }
        }

        let sig = plan.signature_of(&scratch);
        assert_eq!(sig[0], 0.0); // (0, 0)
        assert_eq!(sig[1], 1.0); // (0, 1)
        assert_eq!(sig[2], 8.0); // (1, 0)
        assert_eq!(sig[3], 16.0); // (2, 0)
    }
}
