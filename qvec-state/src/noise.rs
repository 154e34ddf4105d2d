//! Stochastic depolarizing noise
//!
//! Monte-Carlo trajectory semantics: per qubit, with probability p, one of
//! X, Y, Z is applied uniformly at random. A single call produces one
//! trajectory; density-matrix behavior emerges only by averaging many
//! trajectories, which is the caller's job.

use crate::register::Register;
use qvec_core::Result;
use rand::Rng;

/// Error channel codes broadcast from rank 0 so all shards agree
const ERR_NONE: u8 = 0;
const ERR_X: u8 = 1;
const ERR_Y: u8 = 2;
const ERR_Z: u8 = 3;

impl Register {
    /// Apply one depolarizing-noise trajectory across all qubits
    ///
    /// Rank 0 draws the error for each qubit and broadcasts it, keeping
    /// the SPMD ranks in lock-step. Trajectory errors are transient and
    /// never recorded on the tape.
    pub fn apply_depolarizing_noise(&mut self, probability: f64) -> Result<()> {
        let was_recording = self.tape().is_enabled();
        self.enable_recording(false);
        let result = self.noise_trajectory(probability);
        self.enable_recording(was_recording);
        result
    }

    fn noise_trajectory(&mut self, probability: f64) -> Result<()> {
        for q in 0..self.num_qubits() {
            let code = if self.rank() == 0 {
                let mut rng = rand::thread_rng();
                if rng.gen::<f64>() < probability {
                    // X, Y, Z with equal weight
                    match rng.gen_range(0..3u8) {
                        0 => ERR_X,
                        1 => ERR_Y,
                        _ => ERR_Z,
                    }
                } else {
                    ERR_NONE
                }
            } else {
                ERR_NONE
            };
            let code = self.comm().broadcast_byte(code, 0)?;
            match code {
                ERR_X => self.apply_x(q)?,
                ERR_Y => self.apply_y(q)?,
                ERR_Z => self.apply_z(q)?,
                _ => {}
            }
        }
        Ok(())
    }
}
