//! Wire-level operation and response records
//!
//! These are the types the RPC layer marshals: a flat gate-operation
//! record (kind, target, optional controls, optional angle, optional
//! classical register) and the state response carrying amplitudes,
//! measured bits, and provenance.

use qvec_core::{EngineError, Result as CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operations accepted in circuit requests and gate streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Hadamard,
    PauliX,
    PauliY,
    PauliZ,
    PhaseS,
    PhaseT,
    RotationX,
    RotationY,
    RotationZ,
    Cnot,
    Toffoli,
    Measure,
}

impl OperationKind {
    /// Parse the canonical wire name, e.g. `"CNOT"` or `"ROTATION_Y"`
    pub fn from_name(name: &str) -> CoreResult<Self> {
        match name {
            "HADAMARD" => Ok(OperationKind::Hadamard),
            "PAULI_X" => Ok(OperationKind::PauliX),
            "PAULI_Y" => Ok(OperationKind::PauliY),
            "PAULI_Z" => Ok(OperationKind::PauliZ),
            "PHASE_S" => Ok(OperationKind::PhaseS),
            "PHASE_T" => Ok(OperationKind::PhaseT),
            "ROTATION_X" => Ok(OperationKind::RotationX),
            "ROTATION_Y" => Ok(OperationKind::RotationY),
            "ROTATION_Z" => Ok(OperationKind::RotationZ),
            "CNOT" => Ok(OperationKind::Cnot),
            "TOFFOLI" => Ok(OperationKind::Toffoli),
            "MEASURE" => Ok(OperationKind::Measure),
            other => Err(EngineError::UnknownGate(other.to_string())),
        }
    }

    /// Whether this operation carries a rotation angle
    pub fn takes_angle(self) -> bool {
        matches!(
            self,
            OperationKind::RotationX | OperationKind::RotationY | OperationKind::RotationZ
        )
    }
}

/// One gate (or measurement) as carried by a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOperation {
    pub kind: OperationKind,
    pub target: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_control: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classical_register: Option<u32>,
}

impl GateOperation {
    pub fn single(kind: OperationKind, target: usize) -> Self {
        Self {
            kind,
            target,
            control: None,
            second_control: None,
            angle: None,
            classical_register: None,
        }
    }

    pub fn rotation(kind: OperationKind, target: usize, angle: f64) -> Self {
        Self {
            angle: Some(angle),
            ..Self::single(kind, target)
        }
    }

    pub fn cnot(control: usize, target: usize) -> Self {
        Self {
            control: Some(control),
            ..Self::single(OperationKind::Cnot, target)
        }
    }

    pub fn toffoli(control1: usize, control2: usize, target: usize) -> Self {
        Self {
            control: Some(control1),
            second_control: Some(control2),
            ..Self::single(OperationKind::Toffoli, target)
        }
    }

    pub fn measure(target: usize, classical_register: Option<u32>) -> Self {
        Self {
            classical_register,
            ..Self::single(OperationKind::Measure, target)
        }
    }
}

/// Result of executing a circuit or a single streamed gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateResponse {
    /// Local amplitudes as (re, im) pairs, in basis-index order
    pub amplitudes: Vec<(f64, f64)>,

    /// Measured bits keyed by classical register id
    pub classical_results: HashMap<u32, u8>,

    /// Provenance: "<hostname>[ (rank R/W)]" or a backend tag
    pub server_id: String,
}
