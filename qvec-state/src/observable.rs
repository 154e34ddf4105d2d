//! Pauli-string expectation values
//!
//! ⟨ψ|P|ψ⟩ for P = ⊗_q σ_{s[q]} without collapsing the state. For every
//! basis index i the string determines a permuted index j and a phase
//! φ ∈ {±1, ±i}: X flips the qubit's bit in j, Y flips it and contributes
//! ±i depending on the bit's value in i, Z contributes ±1, I does nothing.
//! The contribution Re(conj(aᵢ)·φ·aⱼ) is summed over the local shard and
//! reduced across ranks.

use crate::kernels::PARALLEL_THRESHOLD;
use crate::register::Register;
use num_complex::Complex64;
use qvec_core::{EngineError, Pauli, PauliString, Result};
use rayon::prelude::*;

impl Register {
    /// Expectation value ⟨ψ|P|ψ⟩ of a Pauli string
    ///
    /// Strings shorter than the register act as identity on the remaining
    /// qubits. With more than one rank, X and Y factors must sit on
    /// rank-local qubits; X/Y on a global qubit would permute amplitudes
    /// across shards and reports `DistributedUnsupported` (decompose the
    /// observable instead). Z factors on global qubits are resolved from
    /// the rank bits.
    pub fn expectation(&self, pauli: &PauliString) -> Result<f64> {
        if pauli.len() > self.num_qubits() {
            return Err(EngineError::PauliLengthMismatch {
                string_len: pauli.len(),
                num_qubits: self.num_qubits(),
            });
        }
        let partition = *self.partition();
        let amps = self.local_slice()?;

        // Split the string into the local scan list, the permutation mask,
        // and the per-rank sign fixed by global Z factors.
        let mut flip_mask = 0usize;
        let mut local_ops: Vec<(usize, Pauli)> = Vec::new();
        let mut rank_sign = 1.0;
        for (q, op) in pauli.iter() {
            match op {
                Pauli::I => {}
                Pauli::Z => {
                    if partition.is_local(q) {
                        local_ops.push((q, Pauli::Z));
                    } else if partition.rank_bit_set(q) {
                        rank_sign = -rank_sign;
                    }
                }
                Pauli::X | Pauli::Y => {
                    if !partition.is_local(q) {
                        return Err(EngineError::DistributedUnsupported {
                            gate: "PAULI_EXPECTATION",
                        });
                    }
                    flip_mask |= partition.stride(q);
                    if op == Pauli::Y {
                        local_ops.push((q, Pauli::Y));
                    }
                }
            }
        }

        let base_phase = Complex64::new(rank_sign, 0.0);
        let contribution = |i: usize| -> f64 {
            let j = i ^ flip_mask;
            let mut phase = base_phase;
            for &(q, op) in &local_ops {
                let bit = i & partition.stride(q) != 0;
                match op {
                    Pauli::Y => {
                        phase *= if bit {
                            Complex64::new(0.0, -1.0)
                        } else {
                            Complex64::new(0.0, 1.0)
                        };
                    }
                    Pauli::Z => {
                        if bit {
                            phase = -phase;
                        }
                    }
                    _ => {}
                }
            }
            (amps[i].conj() * phase * amps[j]).re
        };

        let local_sum: f64 = if amps.len() >= PARALLEL_THRESHOLD {
            (0..amps.len()).into_par_iter().map(contribution).sum()
        } else {
            (0..amps.len()).map(contribution).sum()
        };

        self.comm().allreduce_sum(local_sum)
    }

    /// Expectation of a textual Pauli string, e.g. `"ZZ"`
    pub fn expectation_str(&self, pauli: &str) -> Result<f64> {
        self.expectation(&PauliString::parse(pauli)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_all_z_on_ground_state() {
        let reg = Register::new(4).unwrap();
        let z = PauliString::all_z(4);
        assert_relative_eq!(reg.expectation(&z).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_x_on_plus_state() {
        let mut reg = Register::new(1).unwrap();
        reg.apply_h(0).unwrap();
        assert_relative_eq!(reg.expectation_str("X").unwrap(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(reg.expectation_str("Z").unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_z_flips_sign_on_excited_state() {
        let mut reg = Register::new(1).unwrap();
        reg.apply_x(0).unwrap();
        assert_relative_eq!(reg.expectation_str("Z").unwrap(), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_y_on_circular_state() {
        // S·H|0⟩ = (|0⟩ + i|1⟩)/√2 is the +1 eigenstate of Y.
        let mut reg = Register::new(1).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_s(0).unwrap();
        assert_relative_eq!(reg.expectation_str("Y").unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bell_state_correlations() {
        let mut reg = Register::new(2).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_cnot(0, 1).unwrap();
        assert_relative_eq!(reg.expectation_str("ZZ").unwrap(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(reg.expectation_str("XX").unwrap(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(reg.expectation_str("YY").unwrap(), -1.0, epsilon = 1e-10);
        assert_relative_eq!(reg.expectation_str("ZI").unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_short_string_pads_with_identity() {
        let mut reg = Register::new(3).unwrap();
        reg.apply_x(0).unwrap();
        assert_relative_eq!(reg.expectation_str("Z").unwrap(), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_string_longer_than_register() {
        let reg = Register::new(2).unwrap();
        assert!(matches!(
            reg.expectation_str("ZZZ"),
            Err(EngineError::PauliLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_expectation_of_ry_rotation() {
        // RY(θ)|0⟩: ⟨Z⟩ = cos θ.
        let theta = 0.9f64;
        let mut reg = Register::new(1).unwrap();
        reg.apply_ry(0, theta).unwrap();
        assert_relative_eq!(
            reg.expectation_str("Z").unwrap(),
            theta.cos(),
            epsilon = 1e-10
        );
    }
}
