//! Aligned amplitude storage
//!
//! The amplitude buffer is the only heap allocation a register owns. It is
//! 64-byte aligned so the SIMD kernels can use aligned loads, and it is
//! never aliased: the register hands out slices, not the allocation.

use num_complex::Complex64;
use qvec_core::{EngineError, Result};
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

/// Alignment for SIMD loads (64 bytes covers AVX-512 lanes)
const SIMD_ALIGNMENT: usize = 64;

/// Contiguous, aligned storage for `len` complex amplitudes
pub struct AmplitudeBuffer {
    data: NonNull<Complex64>,
    len: usize,
    layout: Layout,
}

impl AmplitudeBuffer {
    /// Allocate a zeroed buffer of `len` amplitudes
    pub fn zeroed(len: usize) -> Result<Self> {
        let size = len * std::mem::size_of::<Complex64>();
        let layout = Layout::from_size_align(size, SIMD_ALIGNMENT)
            .map_err(|_| EngineError::AllocationError { size })?;

        let data = unsafe {
            let ptr = alloc(layout) as *mut Complex64;
            if ptr.is_null() {
                return Err(EngineError::AllocationError { size });
            }
            std::ptr::write_bytes(ptr, 0, len);
            NonNull::new_unchecked(ptr)
        };

        Ok(Self { data, len, layout })
    }

    /// Allocate a buffer holding a copy of `amplitudes`
    pub fn from_slice(amplitudes: &[Complex64]) -> Result<Self> {
        let buffer = Self::zeroed(amplitudes.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(
                amplitudes.as_ptr(),
                buffer.data.as_ptr(),
                amplitudes.len(),
            );
        }
        Ok(buffer)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Complex64] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    /// Zero every amplitude
    pub fn fill_zero(&mut self) {
        unsafe {
            std::ptr::write_bytes(self.data.as_ptr(), 0, self.len);
        }
    }

    /// Overwrite contents from a slice of identical length
    pub fn copy_from(&mut self, amplitudes: &[Complex64]) -> Result<()> {
        if amplitudes.len() != self.len {
            return Err(EngineError::Internal(format!(
                "buffer copy length mismatch: {} vs {}",
                amplitudes.len(),
                self.len
            )));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(amplitudes.as_ptr(), self.data.as_ptr(), self.len);
        }
        Ok(())
    }

    /// Whether the allocation honors the SIMD alignment
    #[inline]
    pub fn is_simd_aligned(&self) -> bool {
        (self.data.as_ptr() as usize) % SIMD_ALIGNMENT == 0
    }
}

impl Drop for AmplitudeBuffer {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

// Safety: the buffer owns its allocation exclusively.
unsafe impl Send for AmplitudeBuffer {}
unsafe impl Sync for AmplitudeBuffer {}
