//! In-place gate kernels over the local amplitude slice
//!
//! Every local kernel is expressed through one block-pair iteration: for a
//! qubit with stride `s = 1 << q`, amplitudes pair up as (i, i + s) where i
//! ranges over the low halves of blocks of size 2s. Stepping blocks by 2s
//! visits each pair exactly once. Blocks are independent, so the outer loop
//! forks across the rayon pool once the slice is large enough to amortize
//! the join.
//!
//! Kernels assume their preconditions (stride < len, distinct operands)
//! were validated by the register; they never fail.

use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;

/// Slices at or above this length fork the block loop across threads
pub(crate) const PARALLEL_THRESHOLD: usize = 1 << 12;

/// Run `f` on every (low, high) pair for the given stride, exactly once
#[inline]
pub fn for_each_pair<F>(state: &mut [Complex64], stride: usize, f: F)
where
    F: Fn(&mut Complex64, &mut Complex64) + Sync + Send,
{
    debug_assert!(stride < state.len());
    let block = 2 * stride;
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_chunks_exact_mut(block).for_each(|chunk| {
            let (lo, hi) = chunk.split_at_mut(stride);
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                f(a, b);
            }
        });
    } else {
        for chunk in state.chunks_exact_mut(block) {
            let (lo, hi) = chunk.split_at_mut(stride);
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                f(a, b);
            }
        }
    }
}

/// Like [`for_each_pair`] but hands `f` the global-in-slice index of the
/// low element, for kernels conditioned on control bits
#[inline]
pub fn for_each_indexed_pair<F>(state: &mut [Complex64], stride: usize, f: F)
where
    F: Fn(usize, &mut Complex64, &mut Complex64) + Sync + Send,
{
    debug_assert!(stride < state.len());
    let block = 2 * stride;
    if state.len() >= PARALLEL_THRESHOLD {
        state
            .par_chunks_exact_mut(block)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let base = chunk_idx * block;
                let (lo, hi) = chunk.split_at_mut(stride);
                for (j, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    f(base + j, a, b);
                }
            });
    } else {
        for (chunk_idx, chunk) in state.chunks_exact_mut(block).enumerate() {
            let base = chunk_idx * block;
            let (lo, hi) = chunk.split_at_mut(stride);
            for (j, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                f(base + j, a, b);
            }
        }
    }
}

/// H = [[1,1],[1,-1]]/√2
pub fn hadamard(state: &mut [Complex64], stride: usize) {
    for_each_pair(state, stride, |a, b| {
        let (x, y) = (*a, *b);
        *a = (x + y) * FRAC_1_SQRT_2;
        *b = (x - y) * FRAC_1_SQRT_2;
    });
}

/// X: pair swap
pub fn pauli_x(state: &mut [Complex64], stride: usize) {
    for_each_pair(state, stride, |a, b| {
        std::mem::swap(a, b);
    });
}

/// Y: a → -i·b, b → i·a
pub fn pauli_y(state: &mut [Complex64], stride: usize) {
    let i_unit = Complex64::new(0.0, 1.0);
    for_each_pair(state, stride, move |a, b| {
        let (x, y) = (*a, *b);
        *a = -i_unit * y;
        *b = i_unit * x;
    });
}

/// Z: negate the high half
pub fn pauli_z(state: &mut [Complex64], stride: usize) {
    for_each_pair(state, stride, |_a, b| {
        *b = -*b;
    });
}

/// diag(1, phase): multiplies amplitudes with the qubit set
///
/// S, S†, T and T† are all instances of this kernel.
pub fn phase(state: &mut [Complex64], stride: usize, phase: Complex64) {
    for_each_pair(state, stride, move |_a, b| {
        *b *= phase;
    });
}

/// RY(θ) = [[c,-s],[s,c]] with c = cos(θ/2), s = sin(θ/2)
pub fn rotation_y(state: &mut [Complex64], stride: usize, angle: f64) {
    let c = (angle / 2.0).cos();
    let s = (angle / 2.0).sin();
    for_each_pair(state, stride, move |a, b| {
        let (x, y) = (*a, *b);
        *a = c * x - s * y;
        *b = s * x + c * y;
    });
}

/// RZ(θ) = diag(e^{-iθ/2}, e^{iθ/2})
pub fn rotation_z(state: &mut [Complex64], stride: usize, angle: f64) {
    let z0 = Complex64::from_polar(1.0, -angle / 2.0);
    let z1 = Complex64::from_polar(1.0, angle / 2.0);
    for_each_pair(state, stride, move |a, b| {
        *a *= z0;
        *b *= z1;
    });
}

/// diag(d0, d1) with both halves scaled
pub fn diagonal(state: &mut [Complex64], stride: usize, diag: [Complex64; 2]) {
    for_each_pair(state, stride, move |a, b| {
        *a *= diag[0];
        *b *= diag[1];
    });
}

/// Local CNOT: swap (i, i ^ t) wherever the control bit is set
pub fn cnot(state: &mut [Complex64], control_mask: usize, target_stride: usize) {
    for_each_indexed_pair(state, target_stride, move |low_index, a, b| {
        if low_index & control_mask != 0 {
            std::mem::swap(a, b);
        }
    });
}

/// Local Toffoli: swap wherever both control bits are set
pub fn toffoli(
    state: &mut [Complex64],
    control1_mask: usize,
    control2_mask: usize,
    target_stride: usize,
) {
    for_each_indexed_pair(state, target_stride, move |low_index, a, b| {
        if low_index & control1_mask != 0 && low_index & control2_mask != 0 {
            std::mem::swap(a, b);
        }
    });
}

/// Scale every amplitude by a real factor
pub fn scale(state: &mut [Complex64], factor: f64) {
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_iter_mut().for_each(|a| *a *= factor);
    } else {
        for a in state.iter_mut() {
            *a *= factor;
        }
    }
}

/// Multiply every amplitude by a complex factor
pub fn scale_complex(state: &mut [Complex64], factor: Complex64) {
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_iter_mut().for_each(|a| *a *= factor);
    } else {
        for a in state.iter_mut() {
            *a *= factor;
        }
    }
}

/// Sum of |a|² over the slice
pub fn norm_sqr(state: &[Complex64]) -> f64 {
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_iter().map(|a| a.norm_sqr()).sum()
    } else {
        state.iter().map(|a| a.norm_sqr()).sum()
    }
}

/// Combine the local half of a rank-global single-qubit gate
///
/// After the pairwise exchange, a rank whose global bit is 0 holds the
/// low element of every pair and received the high element; a rank whose
/// bit is 1 holds the high element and received the low one.
pub fn combine_exchanged(
    state: &mut [Complex64],
    received: &[Complex64],
    bit_set: bool,
    matrix: &[[Complex64; 2]; 2],
) {
    let [[m00, m01], [m10, m11]] = *matrix;
    if state.len() >= PARALLEL_THRESHOLD {
        state
            .par_iter_mut()
            .zip(received.par_iter())
            .for_each(|(own, their)| {
                *own = if bit_set {
                    m10 * *their + m11 * *own
                } else {
                    m00 * *own + m01 * *their
                };
            });
    } else {
        for (own, their) in state.iter_mut().zip(received.iter()) {
            *own = if bit_set {
                m10 * *their + m11 * *own
            } else {
                m00 * *own + m01 * *their
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground(n: usize) -> Vec<Complex64> {
        let mut state = vec![Complex64::new(0.0, 0.0); 1 << n];
        state[0] = Complex64::new(1.0, 0.0);
        state
    }

    #[test]
    fn test_hadamard_superposition() {
        let mut state = ground(1);
        hadamard(&mut state, 1);
        assert_relative_eq!(state[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state[1].re, FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_hadamard_twice_is_identity() {
        let mut state = vec![
            Complex64::new(0.6, 0.1),
            Complex64::new(0.3, -0.2),
            Complex64::new(0.2, 0.4),
            Complex64::new(0.1, 0.3),
        ];
        let original = state.clone();
        hadamard(&mut state, 2);
        hadamard(&mut state, 2);
        for (a, b) in state.iter().zip(original.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pauli_x_flips() {
        let mut state = ground(1);
        pauli_x(&mut state, 1);
        assert_relative_eq!(state[0].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(state[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pauli_y_phases() {
        let mut state = ground(1);
        pauli_y(&mut state, 1);
        // Y|0⟩ = i|1⟩
        assert_relative_eq!(state[1].im, 1.0, epsilon = 1e-12);
        pauli_y(&mut state, 1);
        // Y²|0⟩ = |0⟩
        assert_relative_eq!(state[0].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_z_inverse_pair() {
        let mut state = vec![
            Complex64::new(0.5, 0.5),
            Complex64::new(0.5, -0.5),
        ];
        let original = state.clone();
        rotation_z(&mut state, 1, 0.37);
        rotation_z(&mut state, 1, -0.37);
        for (a, b) in state.iter().zip(original.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_cnot_respects_control() {
        // |01⟩ (qubit 0 set): CNOT(0, 1) → |11⟩
        let mut state = vec![Complex64::new(0.0, 0.0); 4];
        state[1] = Complex64::new(1.0, 0.0);
        cnot(&mut state, 1 << 0, 1 << 1);
        assert_relative_eq!(state[3].re, 1.0, epsilon = 1e-12);

        // Control clear: no-op on |00⟩
        let mut state = ground(2);
        cnot(&mut state, 1 << 0, 1 << 1);
        assert_relative_eq!(state[0].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cnot_reverse_direction() {
        // |10⟩ (qubit 1 set): CNOT(1, 0) → |11⟩
        let mut state = vec![Complex64::new(0.0, 0.0); 4];
        state[2] = Complex64::new(1.0, 0.0);
        cnot(&mut state, 1 << 1, 1 << 0);
        assert_relative_eq!(state[3].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_toffoli_needs_both_controls() {
        // |011⟩: both controls (0, 1) set, target 2 clear → |111⟩
        let mut state = vec![Complex64::new(0.0, 0.0); 8];
        state[3] = Complex64::new(1.0, 0.0);
        toffoli(&mut state, 1, 2, 4);
        assert_relative_eq!(state[7].re, 1.0, epsilon = 1e-12);

        // |001⟩: only one control set → unchanged
        let mut state = vec![Complex64::new(0.0, 0.0); 8];
        state[1] = Complex64::new(1.0, 0.0);
        toffoli(&mut state, 1, 2, 4);
        assert_relative_eq!(state[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_kernel_only_touches_high_half() {
        let mut state = vec![Complex64::new(0.5, 0.0); 4];
        phase(&mut state, 1, Complex64::new(0.0, 1.0));
        assert_relative_eq!(state[0].re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(state[1].im, 0.5, epsilon = 1e-12);
        assert_relative_eq!(state[2].re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(state[3].im, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_norm_preserved_by_unitaries() {
        let mut state: Vec<Complex64> = (0..16)
            .map(|k| Complex64::new((k as f64 * 0.13).sin(), (k as f64 * 0.29).cos()))
            .collect();
        let inv = 1.0 / norm_sqr(&state).sqrt();
        scale(&mut state, inv);

        hadamard(&mut state, 2);
        pauli_y(&mut state, 1);
        rotation_y(&mut state, 4, 1.2);
        rotation_z(&mut state, 8, -0.8);
        cnot(&mut state, 1, 4);

        assert_relative_eq!(norm_sqr(&state), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_combine_exchanged_matches_local_hadamard() {
        // Simulate a 1-qubit H split across two "ranks" of one amplitude each.
        let h = [
            [
                Complex64::new(FRAC_1_SQRT_2, 0.0),
                Complex64::new(FRAC_1_SQRT_2, 0.0),
            ],
            [
                Complex64::new(FRAC_1_SQRT_2, 0.0),
                Complex64::new(-FRAC_1_SQRT_2, 0.0),
            ],
        ];
        let a = Complex64::new(0.6, 0.0);
        let b = Complex64::new(0.8, 0.0);

        let mut rank0 = vec![a];
        let mut rank1 = vec![b];
        combine_exchanged(&mut rank0, &[b], false, &h);
        combine_exchanged(&mut rank1, &[a], true, &h);

        let mut reference = vec![a, b];
        hadamard(&mut reference, 1);
        assert_relative_eq!(rank0[0].re, reference[0].re, epsilon = 1e-12);
        assert_relative_eq!(rank1[0].re, reference[1].re, epsilon = 1e-12);
    }
}
