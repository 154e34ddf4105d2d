//! Hamiltonian energy evaluation
//!
//! E(θ) = Σ_k c_k ⟨0…0| U†(θ) P_k U(θ) |0…0⟩, computed on a fresh
//! single-rank register per call.

use crate::ansatz::Ansatz;
use qvec_core::{PauliTerm, Result};
use qvec_state::Register;

/// Evaluate the energy of a Hamiltonian under an ansatz at `params`
pub fn evaluate_energy<A>(
    num_qubits: usize,
    params: &[f64],
    ansatz: &A,
    hamiltonian: &[PauliTerm],
) -> Result<f64>
where
    A: Ansatz + ?Sized,
{
    let mut register = Register::new(num_qubits)?;
    ansatz.apply(params, &mut register)?;

    let mut energy = 0.0;
    for term in hamiltonian {
        energy += term.coefficient * register.expectation(&term.string)?;
    }
    Ok(energy)
}
