//! The backend dispatch trait
//!
//! The one contract the RPC layer sees: gates go in one at a time, and a
//! final call copies whatever the backend considers its result into the
//! response. Implementations range from the faithful state-vector
//! simulator to stubs that only pretend to run anything.

use crate::cloud::CloudBackend;
use crate::error::Result;
use crate::mock_hardware::MockHardwareBackend;
use crate::op::{GateOperation, StateResponse};
use crate::simulator::SimulatorBackend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A gate-at-a-time execution backend
pub trait QuantumBackend: Send {
    /// Backend name for logs and provenance
    fn name(&self) -> &str;

    /// Apply (or enqueue) a single operation
    fn apply_gate(&mut self, op: &GateOperation) -> Result<()>;

    /// Copy the local amplitudes and measured bits into `response`
    fn get_result(&mut self, response: &mut StateResponse) -> Result<()>;
}

/// Selector carried by circuit requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackendKind {
    #[default]
    Simulator,
    MockHardware,
    Cloud,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Simulator => write!(f, "simulator"),
            BackendKind::MockHardware => write!(f, "mock-hardware"),
            BackendKind::Cloud => write!(f, "cloud"),
        }
    }
}

/// Instantiate the backend family selected by a request
pub fn create_backend(
    kind: BackendKind,
    num_qubits: usize,
    noise_probability: Option<f64>,
) -> Result<Box<dyn QuantumBackend>> {
    tracing::debug!(backend = %kind, num_qubits, "creating backend");
    match kind {
        BackendKind::Simulator => {
            let mut backend = SimulatorBackend::new(num_qubits)?;
            if let Some(p) = noise_probability {
                backend = backend.with_noise(p);
            }
            Ok(Box::new(backend))
        }
        BackendKind::MockHardware => Ok(Box::new(MockHardwareBackend::new(num_qubits))),
        BackendKind::Cloud => Ok(Box::new(CloudBackend::new(num_qubits))),
    }
}
