//! Engine-wide error types
//!
//! Every component reports errors through [`EngineError`]. The structured
//! variants carry enough context for diagnostics; [`EngineError::kind`]
//! collapses them onto the five categories the RPC layer exposes to
//! remote callers.

use thiserror::Error;

/// Errors that can occur during engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Invalid qubit index for the register size
    #[error("invalid qubit index {index} for {num_qubits}-qubit register")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// Duplicate qubit in a multi-qubit gate
    #[error("duplicate qubit {0} in gate operation")]
    DuplicateQubit(usize),

    /// Register size outside the supported range
    #[error("qubit count {0} outside supported range 1..=30")]
    InvalidQubitCount(usize),

    /// Unknown gate kind in a request
    #[error("unknown gate kind: {0}")]
    UnknownGate(String),

    /// Unknown Pauli operator character
    #[error("unknown Pauli operator '{0}', expected one of I, X, Y, Z")]
    UnknownPauli(char),

    /// Pauli string length does not match the register
    #[error("Pauli string spans {string_len} qubits, register has {num_qubits}")]
    PauliLengthMismatch {
        string_len: usize,
        num_qubits: usize,
    },

    /// Parameter vector does not match the recorded tape
    #[error("parameter vector has {params} entries, tape records {recorded} parameterized gates")]
    ParameterMismatch { params: usize, recorded: usize },

    /// Operation needs the amplitudes host-side
    #[error("operation requires host residency; transfer the register with to_host() first")]
    HostResidencyRequired,

    /// State vector would exceed the memory budget
    #[error("state vector requires {required} bytes, budget is {available}")]
    ResourceExhausted { required: usize, available: usize },

    /// Memory allocation failed
    #[error("failed to allocate {size} bytes for amplitude buffer")]
    AllocationError { size: usize },

    /// Gate needs cross-rank coordination the communicator cannot provide
    #[error("{gate} spans rank-global qubits; distributed execution is not configured for it")]
    DistributedUnsupported { gate: &'static str },

    /// Accelerator residency requested without an initialized device
    #[error("accelerator residency requested but no device is initialized")]
    AcceleratorUnavailable,

    /// Invariant violation; the operation left the store untouched
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// The five error categories surfaced across the service boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    ResourceExhausted,
    DistributedUnsupported,
    AcceleratorUnavailable,
    Internal,
}

impl EngineError {
    /// Map this error onto the caller-visible category
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidQubitIndex { .. }
            | EngineError::DuplicateQubit(_)
            | EngineError::InvalidQubitCount(_)
            | EngineError::UnknownGate(_)
            | EngineError::UnknownPauli(_)
            | EngineError::PauliLengthMismatch { .. }
            | EngineError::ParameterMismatch { .. }
            | EngineError::HostResidencyRequired => ErrorKind::InvalidArgument,
            EngineError::ResourceExhausted { .. } | EngineError::AllocationError { .. } => {
                ErrorKind::ResourceExhausted
            }
            EngineError::DistributedUnsupported { .. } => ErrorKind::DistributedUnsupported,
            EngineError::AcceleratorUnavailable => ErrorKind::AcceleratorUnavailable,
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
