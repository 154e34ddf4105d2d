//! Gate vocabulary and recorded operations
//!
//! [`GateKind`] enumerates the kernels the engine implements natively.
//! [`RecordedGate`] is the tape entry format: kind, operand qubits, and an
//! optional rotation angle. Replay and inversion are driven entirely by
//! this record, so the structure captures everything a kernel needs.

use crate::error::{EngineError, Result};
use crate::pauli::Pauli;
use smallvec::SmallVec;
use std::fmt;

/// Kinds of gates with native kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Hadamard
    H,
    /// Pauli X (bit flip)
    X,
    /// Pauli Y
    Y,
    /// Pauli Z (phase flip)
    Z,
    /// Phase gate S = diag(1, i)
    S,
    /// Phase gate T = diag(1, e^{iπ/4})
    T,
    /// Rotation about X: exp(-iθX/2)
    Rx,
    /// Rotation about Y: exp(-iθY/2)
    Ry,
    /// Rotation about Z: exp(-iθZ/2)
    Rz,
    /// Controlled NOT
    Cnot,
    /// Doubly-controlled NOT
    Toffoli,
}

impl GateKind {
    /// Number of operand qubits
    pub fn arity(self) -> usize {
        match self {
            GateKind::Cnot => 2,
            GateKind::Toffoli => 3,
            _ => 1,
        }
    }

    /// Whether this kind takes a rotation angle
    pub fn is_parameterized(self) -> bool {
        matches!(self, GateKind::Rx | GateKind::Ry | GateKind::Rz)
    }

    /// Whether applying the gate twice restores the state
    pub fn is_self_inverse(self) -> bool {
        matches!(
            self,
            GateKind::H
                | GateKind::X
                | GateKind::Y
                | GateKind::Z
                | GateKind::Cnot
                | GateKind::Toffoli
        )
    }

    /// Generator of a rotation gate: exp(-iθ·A/2) for A ∈ {X, Y, Z}
    pub fn generator(self) -> Option<Pauli> {
        match self {
            GateKind::Rx => Some(Pauli::X),
            GateKind::Ry => Some(Pauli::Y),
            GateKind::Rz => Some(Pauli::Z),
            _ => None,
        }
    }

    /// Canonical name as it appears in requests and logs
    pub fn name(self) -> &'static str {
        match self {
            GateKind::H => "H",
            GateKind::X => "X",
            GateKind::Y => "Y",
            GateKind::Z => "Z",
            GateKind::S => "S",
            GateKind::T => "T",
            GateKind::Rx => "RX",
            GateKind::Ry => "RY",
            GateKind::Rz => "RZ",
            GateKind::Cnot => "CNOT",
            GateKind::Toffoli => "TOFFOLI",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A gate as recorded on the tape
///
/// Operand order follows the kernel signatures: `[target]` for single-qubit
/// gates, `[control, target]` for CNOT, `[control1, control2, target]` for
/// Toffoli.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGate {
    kind: GateKind,
    qubits: SmallVec<[usize; 3]>,
    param: Option<f64>,
}

impl RecordedGate {
    /// Create a recorded gate, validating arity and operand distinctness
    pub fn new(kind: GateKind, qubits: &[usize], param: Option<f64>) -> Result<Self> {
        if qubits.len() != kind.arity() {
            return Err(EngineError::Internal(format!(
                "{} expects {} operands, got {}",
                kind,
                kind.arity(),
                qubits.len()
            )));
        }
        for i in 0..qubits.len() {
            for j in (i + 1)..qubits.len() {
                if qubits[i] == qubits[j] {
                    return Err(EngineError::DuplicateQubit(qubits[i]));
                }
            }
        }
        if kind.is_parameterized() != param.is_some() {
            return Err(EngineError::Internal(format!(
                "{} parameter presence mismatch",
                kind
            )));
        }
        Ok(Self {
            kind,
            qubits: SmallVec::from_slice(qubits),
            param,
        })
    }

    /// Shorthand for an unparameterized single-qubit record
    pub fn single(kind: GateKind, target: usize) -> Self {
        Self {
            kind,
            qubits: SmallVec::from_slice(&[target]),
            param: None,
        }
    }

    /// Shorthand for a rotation record
    pub fn rotation(kind: GateKind, target: usize, angle: f64) -> Self {
        debug_assert!(kind.is_parameterized());
        Self {
            kind,
            qubits: SmallVec::from_slice(&[target]),
            param: Some(angle),
        }
    }

    /// Shorthand for a CNOT record
    pub fn cnot(control: usize, target: usize) -> Self {
        Self {
            kind: GateKind::Cnot,
            qubits: SmallVec::from_slice(&[control, target]),
            param: None,
        }
    }

    /// Shorthand for a Toffoli record
    pub fn toffoli(control1: usize, control2: usize, target: usize) -> Self {
        Self {
            kind: GateKind::Toffoli,
            qubits: SmallVec::from_slice(&[control1, control2, target]),
            param: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    #[inline]
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    #[inline]
    pub fn param(&self) -> Option<f64> {
        self.param
    }

    /// Whether this entry consumes a parameter slot
    #[inline]
    pub fn is_parameterized(&self) -> bool {
        self.param.is_some()
    }
}

impl fmt::Display for RecordedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "q{}", q)?;
        }
        if let Some(angle) = self.param {
            write!(f, ", {:.6}", angle)?;
        }
        write!(f, ")")
    }
}
