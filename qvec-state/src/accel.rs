//! Accelerator residency behind an opaque context trait
//!
//! Device and driver types never appear in the register's API: the
//! register talks to an [`AcceleratorContext`] through buffer handles.
//! The active context is a process-lifetime resource, installed once and
//! torn down explicitly; registers acquire it lazily at first transfer.
//!
//! [`InProcessAccelerator`] is the reference implementation: it keeps
//! "device" buffers resident in host memory and runs the CPU kernels on
//! them, giving the residency machinery full coverage on machines without
//! a device. The `gpu` feature adds a wgpu-backed context.

use crate::kernels;
use crate::simd;
use num_complex::Complex64;
use parking_lot::{Mutex, RwLock};
use qvec_core::{EngineError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque identifier of a device-resident amplitude buffer
pub type AccelHandle = u64;

/// Operations a device must provide for resident execution
///
/// Handles identify device buffers created by `upload`; every gate method
/// mutates the buffer in place on the device. Implementations define their
/// own precision; the contract is the gate semantics.
pub trait AcceleratorContext: Send + Sync {
    /// Human-readable device name for provenance
    fn name(&self) -> &str;

    /// Copy amplitudes to the device, returning a buffer handle
    fn upload(&self, amplitudes: &[Complex64]) -> Result<AccelHandle>;

    /// Copy a device buffer back into `out` (same length as uploaded)
    fn download(&self, handle: AccelHandle, out: &mut [Complex64]) -> Result<()>;

    /// Free a device buffer; unknown handles are ignored
    fn release(&self, handle: AccelHandle);

    /// Apply a 2×2 unitary to the target qubit
    fn apply_matrix2(
        &self,
        handle: AccelHandle,
        matrix: &[[Complex64; 2]; 2],
        target: usize,
    ) -> Result<()>;

    /// Apply diag(d0, d1) to the target qubit
    fn apply_diagonal(
        &self,
        handle: AccelHandle,
        diag: [Complex64; 2],
        target: usize,
    ) -> Result<()>;

    /// Apply CNOT
    fn apply_cnot(&self, handle: AccelHandle, control: usize, target: usize) -> Result<()>;

    /// Apply Toffoli
    fn apply_toffoli(
        &self,
        handle: AccelHandle,
        control1: usize,
        control2: usize,
        target: usize,
    ) -> Result<()>;
}

static CONTEXT: RwLock<Option<Arc<dyn AcceleratorContext>>> = RwLock::new(None);

/// Serializes tests that touch the process-wide registry
#[cfg(test)]
pub(crate) static TEST_REGISTRY_LOCK: Mutex<()> = Mutex::new(());

/// Install the process-wide accelerator context
pub fn install(context: Arc<dyn AcceleratorContext>) {
    *CONTEXT.write() = Some(context);
}

/// The active context, if one is installed
pub fn acquire() -> Option<Arc<dyn AcceleratorContext>> {
    CONTEXT.read().clone()
}

/// Drop the process-wide context
///
/// Registers still holding device buffers keep their own `Arc` and remain
/// valid; new transfers will report `AcceleratorUnavailable`.
pub fn teardown() {
    *CONTEXT.write() = None;
}

/// Host-memory accelerator: resident buffers, CPU kernels
pub struct InProcessAccelerator {
    buffers: Mutex<HashMap<AccelHandle, Vec<Complex64>>>,
    next_handle: AtomicU64,
}

impl InProcessAccelerator {
    pub fn new() -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn with_buffer<F>(&self, handle: AccelHandle, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Complex64>),
    {
        let mut buffers = self.buffers.lock();
        let buffer = buffers
            .get_mut(&handle)
            .ok_or_else(|| EngineError::Internal(format!("unknown device buffer {}", handle)))?;
        f(buffer);
        Ok(())
    }
}

impl Default for InProcessAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorContext for InProcessAccelerator {
    fn name(&self) -> &str {
        "in-process"
    }

    fn upload(&self, amplitudes: &[Complex64]) -> Result<AccelHandle> {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.buffers.lock().insert(handle, amplitudes.to_vec());
        Ok(handle)
    }

    fn download(&self, handle: AccelHandle, out: &mut [Complex64]) -> Result<()> {
        let buffers = self.buffers.lock();
        let buffer = buffers
            .get(&handle)
            .ok_or_else(|| EngineError::Internal(format!("unknown device buffer {}", handle)))?;
        if buffer.len() != out.len() {
            return Err(EngineError::Internal(format!(
                "device buffer length {} does not match host buffer {}",
                buffer.len(),
                out.len()
            )));
        }
        out.copy_from_slice(buffer);
        Ok(())
    }

    fn release(&self, handle: AccelHandle) {
        self.buffers.lock().remove(&handle);
    }

    fn apply_matrix2(
        &self,
        handle: AccelHandle,
        matrix: &[[Complex64; 2]; 2],
        target: usize,
    ) -> Result<()> {
        self.with_buffer(handle, |state| {
            simd::apply_matrix2(state, matrix, 1 << target);
        })
    }

    fn apply_diagonal(
        &self,
        handle: AccelHandle,
        diag: [Complex64; 2],
        target: usize,
    ) -> Result<()> {
        self.with_buffer(handle, |state| {
            kernels::diagonal(state, 1 << target, diag);
        })
    }

    fn apply_cnot(&self, handle: AccelHandle, control: usize, target: usize) -> Result<()> {
        self.with_buffer(handle, |state| {
            kernels::cnot(state, 1 << control, 1 << target);
        })
    }

    fn apply_toffoli(
        &self,
        handle: AccelHandle,
        control1: usize,
        control2: usize,
        target: usize,
    ) -> Result<()> {
        self.with_buffer(handle, |state| {
            kernels::toffoli(state, 1 << control1, 1 << control2, 1 << target);
        })
    }
}
