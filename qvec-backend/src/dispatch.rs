//! Shared helpers mapping wire operations onto the register
//!
//! Both the simulator backend and the streaming session route their gates
//! through [`apply_operation`] and serialize with [`serialize_state`], so
//! the two surfaces cannot drift apart.

use crate::error::{BackendError, Result};
use crate::op::{GateOperation, OperationKind, StateResponse};
use qvec_state::Register;
use std::collections::HashMap;

/// Apply one wire operation; measured bits land in `classical`
pub(crate) fn apply_operation(
    register: &mut Register,
    op: &GateOperation,
    classical: &mut HashMap<u32, u8>,
) -> Result<()> {
    match op.kind {
        OperationKind::Hadamard => register.apply_h(op.target)?,
        OperationKind::PauliX => register.apply_x(op.target)?,
        OperationKind::PauliY => register.apply_y(op.target)?,
        OperationKind::PauliZ => register.apply_z(op.target)?,
        OperationKind::PhaseS => register.apply_s(op.target)?,
        OperationKind::PhaseT => register.apply_t(op.target)?,
        OperationKind::RotationX => register.apply_rx(op.target, required_angle(op)?)?,
        OperationKind::RotationY => register.apply_ry(op.target, required_angle(op)?)?,
        OperationKind::RotationZ => register.apply_rz(op.target, required_angle(op)?)?,
        OperationKind::Cnot => {
            let control = required_control(op)?;
            register.apply_cnot(control, op.target)?;
        }
        OperationKind::Toffoli => {
            let control = required_control(op)?;
            let second = op.second_control.ok_or_else(|| {
                BackendError::MalformedOperation("TOFFOLI without a second control qubit".into())
            })?;
            register.apply_toffoli(control, second, op.target)?;
        }
        OperationKind::Measure => {
            let bit = register.measure(op.target)?;
            let key = op.classical_register.unwrap_or(op.target as u32);
            classical.insert(key, bit);
        }
    }
    Ok(())
}

fn required_angle(op: &GateOperation) -> Result<f64> {
    op.angle.ok_or_else(|| {
        BackendError::MalformedOperation(format!("{:?} without a rotation angle", op.kind))
    })
}

fn required_control(op: &GateOperation) -> Result<usize> {
    op.control.ok_or_else(|| {
        BackendError::MalformedOperation(format!("{:?} without a control qubit", op.kind))
    })
}

/// Copy the local amplitudes and measured bits into a response
pub(crate) fn serialize_state(
    register: &Register,
    classical: &HashMap<u32, u8>,
    response: &mut StateResponse,
) -> Result<()> {
    response.amplitudes = register
        .local_slice()?
        .iter()
        .map(|a| (a.re, a.im))
        .collect();
    response.classical_results = classical.clone();
    response.server_id = server_id(register);
    Ok(())
}

/// "<hostname>[ (rank R/W)]"
pub(crate) fn server_id(register: &Register) -> String {
    let mut id = hostname();
    if register.world_size() > 1 {
        id.push_str(&format!(
            " (rank {}/{})",
            register.rank(),
            register.world_size()
        ));
    }
    id
}

pub(crate) fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::GateOperation;

    #[test]
    fn test_missing_angle_is_malformed() {
        let mut reg = Register::new(1).unwrap();
        let mut classical = HashMap::new();
        let op = GateOperation::single(OperationKind::RotationY, 0);
        let result = apply_operation(&mut reg, &op, &mut classical);
        assert!(matches!(result, Err(BackendError::MalformedOperation(_))));
    }

    #[test]
    fn test_missing_control_is_malformed() {
        let mut reg = Register::new(2).unwrap();
        let mut classical = HashMap::new();
        let op = GateOperation::single(OperationKind::Cnot, 1);
        let result = apply_operation(&mut reg, &op, &mut classical);
        assert!(matches!(result, Err(BackendError::MalformedOperation(_))));
    }

    #[test]
    fn test_measure_defaults_to_target_register() {
        let mut reg = Register::new(2).unwrap();
        reg.apply_x(1).unwrap();
        let mut classical = HashMap::new();
        apply_operation(&mut reg, &GateOperation::measure(1, None), &mut classical).unwrap();
        assert_eq!(classical.get(&1), Some(&1));
    }
}
