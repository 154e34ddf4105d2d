//! Cloud-stub backend
//!
//! Buffers gate operations as a remote provider would and returns a
//! canonical |0…0⟩ with a cloud provenance tag. Credentials come from the
//! `CLOUD_API_KEY` and `CLOUD_PROVIDER_URL` environment variables; in
//! their absence the stub drops into demo mode with a loud warning. No
//! network traffic leaves this module.

use crate::error::Result;
use crate::op::{GateOperation, StateResponse};
use std::time::Duration;

const DEMO_PROVIDER_URL: &str = "https://api.quantum-cloud.example/v1";
const SUBMIT_LATENCY: Duration = Duration::from_millis(200);

pub struct CloudBackend {
    num_qubits: usize,
    api_key: String,
    provider_url: String,
    buffered_ops: Vec<GateOperation>,
}

impl CloudBackend {
    pub fn new(num_qubits: usize) -> Self {
        let api_key = std::env::var("CLOUD_API_KEY").ok();
        let provider_url = std::env::var("CLOUD_PROVIDER_URL").ok();

        let (api_key, provider_url) = match (api_key, provider_url) {
            (Some(key), Some(url)) => (key, url),
            _ => {
                tracing::warn!(
                    "CLOUD_API_KEY or CLOUD_PROVIDER_URL not set; using demo credentials"
                );
                ("DEMO_KEY".to_string(), DEMO_PROVIDER_URL.to_string())
            }
        };

        tracing::info!(provider = %provider_url, "cloud backend configured");
        Self {
            num_qubits,
            api_key,
            provider_url,
            buffered_ops: Vec::new(),
        }
    }

    pub fn provider_url(&self) -> &str {
        &self.provider_url
    }
}

impl crate::backend::QuantumBackend for CloudBackend {
    fn name(&self) -> &str {
        "cloud"
    }

    fn apply_gate(&mut self, op: &GateOperation) -> Result<()> {
        // Batched for submission; nothing executes locally.
        self.buffered_ops.push(op.clone());
        Ok(())
    }

    fn get_result(&mut self, response: &mut StateResponse) -> Result<()> {
        tracing::info!(
            gates = self.buffered_ops.len(),
            provider = %self.provider_url,
            key_configured = self.api_key != "DEMO_KEY",
            "submitting buffered job"
        );
        std::thread::sleep(SUBMIT_LATENCY);

        // The provider holds the real state; return the canonical ground
        // state so renderers have something well-formed.
        let dim = 1usize << self.num_qubits;
        response.amplitudes = (0..dim)
            .map(|i| if i == 0 { (1.0, 0.0) } else { (0.0, 0.0) })
            .collect();
        response.classical_results.clear();
        response.server_id = format!("cloud::{}", self.provider_url);
        Ok(())
    }
}
