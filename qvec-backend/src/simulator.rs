//! State-vector simulator backend
//!
//! Wraps a [`Register`] behind the backend trait: every operation is
//! executed faithfully, measured bits are collected per classical
//! register, and the final response carries the exact amplitudes.

use crate::dispatch::{apply_operation, serialize_state};
use crate::error::{BackendError, Result};
use crate::op::{GateOperation, StateResponse};
use qvec_state::Register;
use std::collections::HashMap;

pub struct SimulatorBackend {
    register: Register,
    classical: HashMap<u32, u8>,
    noise_probability: f64,
}

impl SimulatorBackend {
    pub fn new(num_qubits: usize) -> Result<Self> {
        Ok(Self {
            register: Register::new(num_qubits)?,
            classical: HashMap::new(),
            noise_probability: 0.0,
        })
    }

    /// Enable one depolarizing trajectory, sampled before readout
    pub fn with_noise(mut self, probability: f64) -> Self {
        self.noise_probability = probability;
        self
    }

    /// The wrapped register, e.g. for expectation values after a run
    pub fn register(&self) -> &Register {
        &self.register
    }
}

impl crate::backend::QuantumBackend for SimulatorBackend {
    fn name(&self) -> &str {
        "simulator"
    }

    fn apply_gate(&mut self, op: &GateOperation) -> Result<()> {
        apply_operation(&mut self.register, op, &mut self.classical)
    }

    fn get_result(&mut self, response: &mut StateResponse) -> Result<()> {
        if self.noise_probability > 0.0 {
            self.register
                .apply_depolarizing_noise(self.noise_probability)
                .map_err(BackendError::from)?;
        }
        serialize_state(&self.register, &self.classical, response)
    }
}
