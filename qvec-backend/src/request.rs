//! Circuit request handling
//!
//! [`run_circuit`] is the library-side body of the submission API: it
//! validates the request, instantiates the selected backend, feeds it the
//! operation sequence, and collects the response. The RPC layer above
//! only translates between its transport and these types.

use crate::backend::{create_backend, BackendKind};
use crate::error::{BackendError, Result};
use crate::op::{GateOperation, StateResponse};
use qvec_core::EngineError;
use serde::{Deserialize, Serialize};

/// Bytes per complex amplitude (two f64)
const AMPLITUDE_BYTES: usize = 16;

/// A complete circuit submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitRequest {
    pub num_qubits: usize,
    pub operations: Vec<GateOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_probability: Option<f64>,
    #[serde(default)]
    pub backend: BackendKind,
}

impl CircuitRequest {
    pub fn new(num_qubits: usize, operations: Vec<GateOperation>) -> Self {
        Self {
            num_qubits,
            operations,
            noise_probability: None,
            backend: BackendKind::default(),
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_noise(mut self, probability: f64) -> Self {
        self.noise_probability = Some(probability);
        self
    }
}

/// Process-level execution limits
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Memory budget for state vectors in bytes; 0 means unlimited
    pub memory_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { memory_limit: 0 }
    }
}

impl EngineConfig {
    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = limit;
        self
    }
}

/// Execute a circuit request against its selected backend
pub fn run_circuit(request: &CircuitRequest, config: &EngineConfig) -> Result<StateResponse> {
    let n = request.num_qubits;
    if n == 0 || n > 30 {
        return Err(EngineError::InvalidQubitCount(n).into());
    }

    // 2^n amplitudes plus a 5% overhead margin against the budget.
    if config.memory_limit > 0 {
        let required = (1usize << n) * AMPLITUDE_BYTES;
        let with_margin = required + required / 20;
        if with_margin > config.memory_limit {
            return Err(EngineError::ResourceExhausted {
                required: with_margin,
                available: config.memory_limit,
            }
            .into());
        }
    }

    if let Some(p) = request.noise_probability {
        if !(0.0..=1.0).contains(&p) {
            return Err(BackendError::InvalidConfiguration(format!(
                "noise probability {} outside [0, 1]",
                p
            )));
        }
    }

    tracing::info!(
        num_qubits = n,
        operations = request.operations.len(),
        backend = %request.backend,
        "executing circuit request"
    );

    let mut backend = create_backend(request.backend, n, request.noise_probability)?;
    for op in &request.operations {
        backend.apply_gate(op)?;
    }

    let mut response = StateResponse::default();
    backend.get_result(&mut response)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OperationKind;
    use qvec_core::ErrorKind;

    #[test]
    fn test_qubit_range_is_enforced() {
        let config = EngineConfig::default();
        for n in [0, 31] {
            let request = CircuitRequest::new(n, vec![]);
            let err = run_circuit(&request, &config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_memory_budget_is_enforced() {
        // 20 qubits need 16 MiB plus margin; budget 1 MiB.
        let config = EngineConfig::default().with_memory_limit(1 << 20);
        let request = CircuitRequest::new(20, vec![]);
        let err = run_circuit(&request, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

        // Small circuits fit.
        let request = CircuitRequest::new(10, vec![]);
        assert!(run_circuit(&request, &config).is_ok());
    }

    #[test]
    fn test_noise_probability_range() {
        let config = EngineConfig::default();
        let request = CircuitRequest::new(2, vec![]).with_noise(1.5);
        let err = run_circuit(&request, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_request_json_roundtrip() {
        let request = CircuitRequest::new(
            2,
            vec![
                GateOperation::single(OperationKind::Hadamard, 0),
                GateOperation::cnot(0, 1),
            ],
        )
        .with_backend(BackendKind::MockHardware);

        let json = serde_json::to_string(&request).unwrap();
        let back: CircuitRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_qubits, 2);
        assert_eq!(back.operations.len(), 2);
        assert_eq!(back.backend, BackendKind::MockHardware);
        assert_eq!(back.noise_probability, None);
    }

    #[test]
    fn test_backend_defaults_to_simulator() {
        let back: CircuitRequest =
            serde_json::from_str(r#"{"num_qubits":1,"operations":[]}"#).unwrap();
        assert_eq!(back.backend, BackendKind::Simulator);
    }
}
