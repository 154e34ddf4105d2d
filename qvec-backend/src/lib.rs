//! Execution backends and request handling for qvec
//!
//! The RPC layer talks to exactly one contract: [`QuantumBackend`], a
//! gate-at-a-time interface with a final result copy. Three families
//! implement it:
//!
//! - [`SimulatorBackend`]: the faithful state-vector engine
//! - [`MockHardwareBackend`]: synthetic latency, noisy near-ground result
//! - [`CloudBackend`]: buffers the circuit, answers with a canonical
//!   ground state and a provenance tag
//!
//! On top sit the wire types ([`GateOperation`], [`CircuitRequest`],
//! [`StateResponse`], [`StreamFrame`]), the request runner
//! [`run_circuit`], and the streaming [`StreamSession`] with its explicit
//! setup frame.

pub mod backend;
pub mod cloud;
mod dispatch;
pub mod error;
pub mod mock_hardware;
pub mod op;
pub mod request;
pub mod simulator;
pub mod stream;

pub use backend::{create_backend, BackendKind, QuantumBackend};
pub use cloud::CloudBackend;
pub use error::{BackendError, Result};
pub use mock_hardware::MockHardwareBackend;
pub use op::{GateOperation, OperationKind, StateResponse};
pub use request::{run_circuit, CircuitRequest, EngineConfig};
pub use simulator::SimulatorBackend;
pub use stream::{StreamFrame, StreamSession};

pub use qvec_core::ErrorKind;
