//! The ansatz contract
//!
//! An ansatz prepares U(θ)|0…0⟩ on a register. The gradient engines rely
//! on one structural guarantee: the circuit applies exactly `params.len()`
//! parameterized rotation gates, in the order the parameters appear, with
//! any number of fixed gates in between. The adjoint engine asserts this
//! against the recorded tape and refuses to differentiate a circuit that
//! breaks it.

use qvec_core::Result;
use qvec_state::Register;

/// A parameterized circuit template
pub trait Ansatz: Sync {
    /// Apply the circuit for the given parameter values
    fn apply(&self, params: &[f64], register: &mut Register) -> Result<()>;
}

impl<F> Ansatz for F
where
    F: Fn(&[f64], &mut Register) -> Result<()> + Sync,
{
    fn apply(&self, params: &[f64], register: &mut Register) -> Result<()> {
        self(params, register)
    }
}

/// RY layers separated by a CNOT entangler chain
///
/// Each layer consumes one parameter per qubit; `params.len()` must be a
/// positive multiple of the qubit count. For two qubits and four
/// parameters this is RY(q0), RY(q1), CNOT(0,1), RY(q0), RY(q1).
pub struct HardwareEfficientAnsatz {
    num_qubits: usize,
}

impl HardwareEfficientAnsatz {
    pub fn new(num_qubits: usize) -> Self {
        Self { num_qubits }
    }
}

impl Ansatz for HardwareEfficientAnsatz {
    fn apply(&self, params: &[f64], register: &mut Register) -> Result<()> {
        let layers = params.len() / self.num_qubits;
        let mut next = 0;
        for layer in 0..layers {
            for q in 0..self.num_qubits {
                register.apply_ry(q, params[next])?;
                next += 1;
            }
            if layer + 1 < layers {
                for q in 0..self.num_qubits.saturating_sub(1) {
                    register.apply_cnot(q, q + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qvec_core::GateKind;

    #[test]
    fn test_hardware_efficient_layout() {
        let ansatz = HardwareEfficientAnsatz::new(2);
        let mut reg = Register::new(2).unwrap();
        reg.enable_recording(true);
        ansatz.apply(&[0.1, 0.2, 0.3, 0.4], &mut reg).unwrap();

        let kinds: Vec<_> = reg.tape().entries().iter().map(|g| g.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                GateKind::Ry,
                GateKind::Ry,
                GateKind::Cnot,
                GateKind::Ry,
                GateKind::Ry
            ]
        );
        assert_eq!(reg.tape().parameterized_positions().len(), 4);
    }

    #[test]
    fn test_closure_ansatz() {
        let ansatz = |params: &[f64], reg: &mut Register| -> qvec_core::Result<()> {
            reg.apply_ry(0, params[0])?;
            Ok(())
        };
        let mut reg = Register::new(1).unwrap();
        Ansatz::apply(&ansatz, &[0.5], &mut reg).unwrap();
        assert!((reg.norm_sqr().unwrap() - 1.0).abs() < 1e-12);
    }
}
