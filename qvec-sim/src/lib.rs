//! Analytic gradients for variational circuits
//!
//! Two engines differentiate Σ_k c_k ⟨0…0|U†(θ)P_kU(θ)|0…0⟩ with respect
//! to θ:
//!
//! - [`parameter_shift_gradient`]: exact ±π/2 shifts, 2P circuit
//!   executions, embarrassingly parallel across parameters
//! - [`adjoint_gradient`]: reverse replay of the recorded tape with a
//!   costate vector; cost independent of the parameter count, two extra
//!   state vectors of memory
//!
//! Both consume the same [`Ansatz`] contract. [`Molecule`] carries the
//! chemistry fixtures used by VQE-style callers.

pub mod adjoint;
pub mod ansatz;
pub mod energy;
pub mod molecule;
pub mod parameter_shift;

pub use adjoint::adjoint_gradient;
pub use ansatz::{Ansatz, HardwareEfficientAnsatz};
pub use energy::evaluate_energy;
pub use molecule::Molecule;
pub use parameter_shift::parameter_shift_gradient;

pub use qvec_core::{EngineError, Hamiltonian, PauliTerm, Result};
