//! Mock-hardware backend
//!
//! Stands in for a hardware queue during development: gates cost a small
//! synthetic transmission delay, results cost a queue wait, and the
//! returned vector is a noisy neighborhood of |0…0⟩ rather than anything
//! the gates produced. Frontends get realistic shapes and latencies
//! without a device.

use crate::error::Result;
use crate::op::{GateOperation, StateResponse};
use rand::Rng;
use std::time::Duration;

/// Per-gate synthetic transmission latency
const GATE_LATENCY: Duration = Duration::from_millis(5);
/// Synthetic queue wait before results
const QUEUE_LATENCY: Duration = Duration::from_millis(250);
/// Response vectors are capped at this many amplitudes
const MAX_RESPONSE_DIM: usize = 1024;
/// Noise floor width around the ideal amplitudes
const NOISE_SCALE: f64 = 0.05;

pub struct MockHardwareBackend {
    num_qubits: usize,
    gates_received: usize,
}

impl MockHardwareBackend {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates_received: 0,
        }
    }
}

impl crate::backend::QuantumBackend for MockHardwareBackend {
    fn name(&self) -> &str {
        "mock-hardware"
    }

    fn apply_gate(&mut self, _op: &GateOperation) -> Result<()> {
        // Hardware queues whole circuits; per-gate latency stands in for
        // transmission time.
        std::thread::sleep(GATE_LATENCY);
        self.gates_received += 1;
        Ok(())
    }

    fn get_result(&mut self, response: &mut StateResponse) -> Result<()> {
        tracing::debug!(
            gates = self.gates_received,
            "mock hardware flushing queued circuit"
        );
        std::thread::sleep(QUEUE_LATENCY);

        let dim = (1usize << self.num_qubits).min(MAX_RESPONSE_DIM);
        let mut rng = rand::thread_rng();

        response.amplitudes = (0..dim)
            .map(|i| {
                let ideal = if i == 0 { 0.9 } else { 0.0 };
                (
                    ideal + rng.gen_range(-NOISE_SCALE..NOISE_SCALE),
                    rng.gen_range(-NOISE_SCALE..NOISE_SCALE),
                )
            })
            .collect();
        response.classical_results.clear();
        response.server_id = "mock-hardware-system-one".to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QuantumBackend;
    use crate::op::OperationKind;

    #[test]
    fn test_returns_noisy_ground_state() {
        let mut backend = MockHardwareBackend::new(3);
        backend
            .apply_gate(&GateOperation::single(OperationKind::Hadamard, 0))
            .unwrap();

        let mut response = StateResponse::default();
        backend.get_result(&mut response).unwrap();

        assert_eq!(response.amplitudes.len(), 8);
        assert!(response.amplitudes[0].0 > 0.7);
        for (re, im) in &response.amplitudes[1..] {
            assert!(re.abs() < 0.2 && im.abs() < 0.2);
        }
        assert_eq!(response.server_id, "mock-hardware-system-one");
    }

    #[test]
    fn test_response_dimension_is_capped() {
        let mut backend = MockHardwareBackend::new(20);
        let mut response = StateResponse::default();
        backend.get_result(&mut response).unwrap();
        assert_eq!(response.amplitudes.len(), MAX_RESPONSE_DIM);
    }
}
