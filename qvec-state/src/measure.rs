//! Projective single-qubit measurement with collapse
//!
//! The probability reduction and the outcome broadcast are collective:
//! every rank computes its local contribution to p₁, the sums meet in an
//! allreduce, rank 0 draws the sample, and the outcome is broadcast so all
//! ranks collapse identically. In the single-rank layout all of that
//! degenerates to local arithmetic.

use crate::kernels::PARALLEL_THRESHOLD;
use crate::register::Register;
use num_complex::Complex64;
use qvec_core::{EngineError, Result};
use rand::Rng;
use rayon::prelude::*;

impl Register {
    /// Measure qubit `target` in the computational basis and collapse
    ///
    /// The sample is drawn from the per-thread RNG on rank 0 and agreed on
    /// by every rank. Returns 0 or 1. Never recorded on the tape.
    pub fn measure(&mut self, target: usize) -> Result<u8> {
        let sample = rand::thread_rng().gen::<f64>();
        self.measure_with(target, sample)
    }

    /// Measure with an explicit sample in [0, 1)
    ///
    /// Only rank 0's sample decides the outcome; other ranks' values are
    /// ignored. Useful for deterministic tests and seeded trajectories.
    pub fn measure_with(&mut self, target: usize, sample: f64) -> Result<u8> {
        if target >= self.num_qubits() {
            return Err(EngineError::InvalidQubitIndex {
                index: target,
                num_qubits: self.num_qubits(),
            });
        }
        let partition = *self.partition();

        // 1. Local probability of the qubit reading 1.
        let local_p1: f64 = {
            let amps = self.local_slice()?;
            amps.iter()
                .enumerate()
                .filter(|(i, _)| partition.global_bit(*i, target))
                .map(|(_, a)| a.norm_sqr())
                .sum()
        };

        // 2–3. Global probability, outcome drawn once, agreed everywhere.
        let p1 = self.comm().allreduce_sum(local_p1)?;
        let outcome = u8::from(sample < p1);
        let outcome = self.comm().broadcast_byte(outcome, 0)?;

        // 4. Collapse onto the chosen branch.
        let chosen = if outcome == 1 { p1 } else { 1.0 - p1 };
        if chosen <= 0.0 {
            return Err(EngineError::Internal(
                "measurement selected a zero-probability branch".into(),
            ));
        }
        let inv_norm = 1.0 / chosen.sqrt();
        let keep = outcome == 1;
        let state = self.local_amplitudes_mut();
        let collapse = |i: usize, a: &mut Complex64| {
            if partition.global_bit(i, target) == keep {
                *a *= inv_norm;
            } else {
                *a = Complex64::new(0.0, 0.0);
            }
        };
        if state.len() >= PARALLEL_THRESHOLD {
            state
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, a)| collapse(i, a));
        } else {
            for (i, a) in state.iter_mut().enumerate() {
                collapse(i, a);
            }
        }

        Ok(outcome)
    }
}
