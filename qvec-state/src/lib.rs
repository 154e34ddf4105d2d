//! Quantum state storage and evolution for qvec
//!
//! This crate owns the state-vector half of the engine:
//!
//! - [`Register`]: the rank-partitioned, host- or accelerator-resident
//!   amplitude store, with the tape riding along
//! - [`kernels`] / [`simd`]: in-place gate kernels built on one block-pair
//!   iteration, parallelized with rayon and vectorized where the CPU
//!   allows
//! - measurement with collapse and Pauli-string expectation values
//! - [`Communicator`]: the collective-communication seam for the
//!   distributed layout, with an in-process thread world for SPMD tests
//! - [`AcceleratorContext`]: opaque device residency; a wgpu context is
//!   available behind the `gpu` feature
//!
//! # Example
//!
//! ```
//! use qvec_state::Register;
//!
//! let mut reg = Register::new(2).unwrap();
//! reg.apply_h(0).unwrap();
//! reg.apply_cnot(0, 1).unwrap();
//! assert!((reg.expectation_str("ZZ").unwrap() - 1.0).abs() < 1e-10);
//! ```

pub mod accel;
pub mod buffer;
pub mod comm;
pub mod kernels;
pub mod measure;
pub mod noise;
pub mod observable;
pub mod partition;
pub mod register;
pub mod simd;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use accel::{AccelHandle, AcceleratorContext, InProcessAccelerator};
pub use buffer::AmplitudeBuffer;
pub use comm::{Communicator, SoloCommunicator, ThreadCommunicator};
pub use partition::Partition;
pub use register::{Register, Residency};

pub use qvec_core::{EngineError, ErrorKind, Result};
