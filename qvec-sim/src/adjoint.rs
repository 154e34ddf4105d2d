//! Adjoint gradients by reverse tape replay
//!
//! One forward pass builds |ψ⟩ from the recorded tape; for every
//! Hamiltonian term the costate |λ⟩ = c·P|ψ⟩ is walked backwards through
//! the circuit together with |ψ⟩. At each parameterized gate U = e^{-iθA/2}
//! the derivative contribution is 2·Re(⟨λ|(−½iA)U|ψ⟩), evaluated on a
//! scratch copy. Cost is O((1+K)·L) gate applications regardless of the
//! parameter count, with three state vectors resident at the peak.

use crate::ansatz::Ansatz;
use num_complex::Complex64;
use qvec_core::{EngineError, Pauli, PauliString, PauliTerm, RecordedGate, Result};
use qvec_state::Register;

/// Hamiltonian terms below this weight are skipped outright
const COEFFICIENT_CUTOFF: f64 = 1e-9;

/// Gradient of the Hamiltonian expectation via adjoint backpropagation
///
/// Records the ansatz once, validates that the tape carries exactly
/// `params.len()` parameterized gates (a mismatch is an error, never a
/// silent realignment), then accumulates per-term contributions.
pub fn adjoint_gradient<A>(
    num_qubits: usize,
    params: &[f64],
    ansatz: &A,
    hamiltonian: &[PauliTerm],
) -> Result<Vec<f64>>
where
    A: Ansatz + ?Sized,
{
    // Record the circuit once.
    let mut trace = Register::new(num_qubits)?;
    trace.enable_recording(true);
    ansatz.apply(params, &mut trace)?;
    let positions = trace.tape().parameterized_positions();
    let tape: Vec<RecordedGate> = trace.tape().entries().to_vec();
    drop(trace);

    if positions.len() != params.len() {
        return Err(EngineError::ParameterMismatch {
            params: params.len(),
            recorded: positions.len(),
        });
    }

    let mut gradients = vec![0.0; params.len()];

    for term in hamiltonian {
        if term.coefficient.abs() <= COEFFICIENT_CUTOFF {
            continue;
        }

        // Forward pass: |ψ⟩ = U(θ)|0…0⟩.
        let mut psi = Register::new(num_qubits)?;
        for gate in &tape {
            psi.apply_recorded(gate)?;
        }

        // Costate: |λ⟩ = c·P|ψ⟩.
        let mut lambda = psi.clone_state()?;
        apply_pauli_string(&mut lambda, &term.string)?;
        lambda.scale(term.coefficient)?;

        // Reverse walk.
        let mut param_cursor = positions.len();
        for (k, gate) in tape.iter().enumerate().rev() {
            psi.apply_recorded_inverse(gate)?;

            if param_cursor > 0 && k == positions[param_cursor - 1] {
                param_cursor -= 1;
                let generator = gate.kind().generator().ok_or_else(|| {
                    EngineError::Internal(format!(
                        "parameterized tape entry {} has no rotation generator",
                        gate
                    ))
                })?;

                // ⟨λ|(−½iA)U|ψ_{k−1}⟩ on a scratch copy.
                let mut scratch = psi.clone_state()?;
                scratch.apply_recorded(gate)?;
                apply_pauli(&mut scratch, generator, gate.qubits()[0])?;
                let overlap = lambda.inner_product(&scratch)?;
                let derivative = overlap * Complex64::new(0.0, -0.5);
                gradients[param_cursor] += 2.0 * derivative.re;
            }

            lambda.apply_recorded_inverse(gate)?;
        }
    }

    Ok(gradients)
}

fn apply_pauli(register: &mut Register, op: Pauli, qubit: usize) -> Result<()> {
    match op {
        Pauli::I => Ok(()),
        Pauli::X => register.apply_x(qubit),
        Pauli::Y => register.apply_y(qubit),
        Pauli::Z => register.apply_z(qubit),
    }
}

fn apply_pauli_string(register: &mut Register, string: &PauliString) -> Result<()> {
    for (qubit, op) in string.iter() {
        apply_pauli(register, op, qubit)?;
    }
    Ok(())
}
