//! Core data model for the qvec quantum state-vector engine
//!
//! This crate carries the vocabulary shared by every layer of the engine:
//!
//! - **Gates**: [`GateKind`] and the tape entry format [`RecordedGate`]
//! - **Tape**: the replayable gate log ([`Tape`])
//! - **Pauli algebra**: [`Pauli`], [`PauliString`], [`PauliTerm`]
//! - **Errors**: the engine-wide [`EngineError`] and its mapping onto the
//!   caller-visible [`ErrorKind`] categories

pub mod error;
pub mod gate;
pub mod pauli;
pub mod tape;

pub use error::{EngineError, ErrorKind, Result};
pub use gate::{GateKind, RecordedGate};
pub use num_complex::Complex64;
pub use pauli::{Hamiltonian, Pauli, PauliString, PauliTerm};
pub use tape::Tape;
