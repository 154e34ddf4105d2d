//! SIMD-accelerated generic single-qubit apply
//!
//! The named kernels in [`crate::kernels`] are specialized per gate; this
//! module holds the one generic 2×2 matrix apply and picks its width at
//! runtime. Platform concerns stay inside this module: callers see only
//! [`apply_matrix2`].
//!
//! Dispatch policy: slices large enough to amortize a fork use the
//! parallel scalar block loop (threads beat lanes there); small slices use
//! SSE2 when the CPU has it, scalar otherwise.

use crate::kernels::{for_each_pair, PARALLEL_THRESHOLD};
use num_complex::Complex64;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Apply a 2×2 unitary to every amplitude pair of a local qubit
pub fn apply_matrix2(state: &mut [Complex64], matrix: &[[Complex64; 2]; 2], stride: usize) {
    if state.len() >= PARALLEL_THRESHOLD {
        let [[m00, m01], [m10, m11]] = *matrix;
        for_each_pair(state, stride, move |a, b| {
            let (x, y) = (*a, *b);
            *a = m00 * x + m01 * y;
            *b = m10 * x + m11 * y;
        });
        return;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("sse2") {
            unsafe { apply_matrix2_sse2(state, matrix, stride) };
            return;
        }
    }

    apply_matrix2_scalar(state, matrix, stride);
}

/// Reference scalar implementation
pub fn apply_matrix2_scalar(state: &mut [Complex64], matrix: &[[Complex64; 2]; 2], stride: usize) {
    let [[m00, m01], [m10, m11]] = *matrix;
    for_each_pair(state, stride, move |a, b| {
        let (x, y) = (*a, *b);
        *a = m00 * x + m01 * y;
        *b = m10 * x + m11 * y;
    });
}

/// scalar · amplitude with one register per complex value
///
/// `amp` holds [re, im]; the product lands in the same layout.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn complex_mul(m: Complex64, amp: __m128d) -> __m128d {
    // (mr + i·mi)(ar + i·ai) = [mr·ar - mi·ai, mr·ai + mi·ar]
    let t1 = _mm_mul_pd(_mm_set1_pd(m.re), amp);
    let swapped = _mm_shuffle_pd::<0b01>(amp, amp); // [ai, ar]
    let sign = _mm_set_pd(1.0, -1.0); // lane0 = -1, lane1 = +1
    let t2 = _mm_mul_pd(_mm_mul_pd(_mm_set1_pd(m.im), swapped), sign);
    _mm_add_pd(t1, t2)
}

/// SSE2 block-pair apply; one 128-bit lane per Complex64
///
/// # Safety
/// Requires SSE2 and `stride < state.len()`.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn apply_matrix2_sse2(state: &mut [Complex64], matrix: &[[Complex64; 2]; 2], stride: usize) {
    let block = 2 * stride;
    let len = state.len();
    let ptr = state.as_mut_ptr();

    let mut base = 0;
    while base + block <= len {
        for j in base..base + stride {
            let pa = ptr.add(j) as *mut f64;
            let pb = ptr.add(j + stride) as *mut f64;

            let a = _mm_loadu_pd(pa);
            let b = _mm_loadu_pd(pb);

            let new_a = _mm_add_pd(
                complex_mul(matrix[0][0], a),
                complex_mul(matrix[0][1], b),
            );
            let new_b = _mm_add_pd(
                complex_mul(matrix[1][0], a),
                complex_mul(matrix[1][1], b),
            );

            _mm_storeu_pd(pa, new_a);
            _mm_storeu_pd(pb, new_b);
        }
        base += block;
    }
}
