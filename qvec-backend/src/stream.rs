//! Streaming gate session
//!
//! A bidirectional channel feeds gate operations one at a time and reads
//! the post-gate state after each. The session demands an explicit setup
//! frame carrying the register size before the first gate; a gate before
//! setup, or a second setup, is rejected as a protocol violation.

use crate::dispatch::{apply_operation, serialize_state};
use crate::error::{BackendError, Result};
use crate::op::{GateOperation, StateResponse};
use qvec_state::Register;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Frames accepted on the gate stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamFrame {
    /// Must be the first frame: allocates the register
    Setup { num_qubits: usize },
    /// One gate or measurement; answered with the post-gate state
    Gate(GateOperation),
}

/// Server-side state of one gate stream
pub struct StreamSession {
    register: Option<Register>,
    classical: HashMap<u32, u8>,
}

impl StreamSession {
    /// A fresh session awaiting its setup frame
    pub fn new() -> Self {
        Self {
            register: None,
            classical: HashMap::new(),
        }
    }

    /// Whether the setup frame has been consumed
    pub fn is_initialized(&self) -> bool {
        self.register.is_some()
    }

    /// Handle one frame, returning the state after it
    pub fn process(&mut self, frame: &StreamFrame) -> Result<StateResponse> {
        match frame {
            StreamFrame::Setup { num_qubits } => {
                if self.register.is_some() {
                    return Err(BackendError::StreamProtocol(
                        "setup frame received twice".into(),
                    ));
                }
                let register = Register::new(*num_qubits)?;
                tracing::debug!(num_qubits, "gate stream initialized");
                self.register = Some(register);
                self.respond()
            }
            StreamFrame::Gate(op) => {
                let register = self.register.as_mut().ok_or_else(|| {
                    BackendError::StreamProtocol(
                        "gate frame before the setup frame".into(),
                    )
                })?;
                apply_operation(register, op, &mut self.classical)?;
                self.respond()
            }
        }
    }

    fn respond(&self) -> Result<StateResponse> {
        let register = self.register.as_ref().ok_or_else(|| {
            BackendError::StreamProtocol("response requested before setup".into())
        })?;
        let mut response = StateResponse::default();
        serialize_state(register, &self.classical, &mut response)?;
        Ok(response)
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}
