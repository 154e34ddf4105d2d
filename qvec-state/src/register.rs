//! The quantum register: amplitude store plus gate dispatch
//!
//! A [`Register`] owns the local shard of the global amplitude vector, its
//! immutable [`Partition`], the residency tag, the communicator for
//! cross-rank collectives, and the tape. Gate methods validate their
//! operands before touching any state, so a failed call leaves the
//! register exactly as it was.
//!
//! The register has no internal synchronization: gates on one register
//! must be issued sequentially, and in a multi-rank world every rank must
//! issue the same gates in the same order.

use crate::accel::{self, AccelHandle, AcceleratorContext};
use crate::buffer::AmplitudeBuffer;
use crate::comm::{Communicator, SoloCommunicator};
use crate::kernels;
use crate::partition::Partition;
use crate::simd;
use num_complex::Complex64;
use qvec_core::{EngineError, GateKind, RecordedGate, Result, Tape};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::sync::Arc;

/// Which copy of the amplitudes is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Host,
    Accelerator,
}

struct DeviceState {
    context: Arc<dyn AcceleratorContext>,
    handle: AccelHandle,
}

/// N-qubit state vector, rank-partitioned, host- or device-resident
pub struct Register {
    partition: Partition,
    buffer: AmplitudeBuffer,
    residency: Residency,
    device: Option<DeviceState>,
    comm: Arc<dyn Communicator>,
    tape: Tape,
}

impl Register {
    /// Create a register in |0…0⟩ with the default single-rank layout
    ///
    /// # Example
    /// ```
    /// use qvec_state::Register;
    ///
    /// let reg = Register::new(3).unwrap();
    /// assert_eq!(reg.num_qubits(), 3);
    /// assert_eq!(reg.local_slice().unwrap().len(), 8);
    /// ```
    pub fn new(num_qubits: usize) -> Result<Self> {
        Self::with_comm(num_qubits, Arc::new(SoloCommunicator))
    }

    /// Create a register partitioned across the communicator's world
    ///
    /// Rank 0 holds local index 0 = (1, 0); every other entry everywhere
    /// is zero.
    pub fn with_comm(num_qubits: usize, comm: Arc<dyn Communicator>) -> Result<Self> {
        let partition = Partition::new(num_qubits, comm.rank(), comm.world_size())?;
        let mut buffer = AmplitudeBuffer::zeroed(partition.local_dim())?;
        if partition.rank() == 0 {
            buffer.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
        }
        Ok(Self {
            partition,
            buffer,
            residency: Residency::Host,
            device: None,
            comm,
            tape: Tape::new(),
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.partition.num_qubits()
    }

    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.partition.rank()
    }

    #[inline]
    pub fn world_size(&self) -> usize {
        self.partition.world_size()
    }

    #[inline]
    pub fn residency(&self) -> Residency {
        self.residency
    }

    pub(crate) fn comm(&self) -> &Arc<dyn Communicator> {
        &self.comm
    }

    /// Read-only view of the local amplitudes (host residency only)
    pub fn local_slice(&self) -> Result<&[Complex64]> {
        self.require_host()?;
        Ok(self.buffer.as_slice())
    }

    /// Exchange the local storage with `buffer` (host residency only)
    ///
    /// `buffer` must hold exactly `local_dim` amplitudes; used by
    /// distributed primitives that install a received shard wholesale.
    pub fn swap(&mut self, buffer: &mut Vec<Complex64>) -> Result<()> {
        self.require_host()?;
        if buffer.len() != self.partition.local_dim() {
            return Err(EngineError::Internal(format!(
                "swap buffer holds {} amplitudes, local dimension is {}",
                buffer.len(),
                self.partition.local_dim()
            )));
        }
        for (own, other) in self.buffer.as_mut_slice().iter_mut().zip(buffer.iter_mut()) {
            std::mem::swap(own, other);
        }
        Ok(())
    }

    /// Reset the amplitudes to |0…0⟩; the tape is left untouched
    pub fn reset(&mut self) -> Result<()> {
        self.require_host()?;
        self.buffer.fill_zero();
        if self.partition.rank() == 0 {
            self.buffer.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
        }
        Ok(())
    }

    /// Σ|aᵢ|² across all ranks
    pub fn norm_sqr(&self) -> Result<f64> {
        self.require_host()?;
        let local = kernels::norm_sqr(self.buffer.as_slice());
        self.comm.allreduce_sum(local)
    }

    /// |aᵢ|² for every local amplitude
    pub fn probabilities(&self) -> Result<Vec<f64>> {
        self.require_host()?;
        Ok(self.buffer.as_slice().iter().map(|a| a.norm_sqr()).collect())
    }

    /// ⟨self|other⟩, reduced across ranks
    ///
    /// Both registers must share the same partition.
    pub fn inner_product(&self, other: &Register) -> Result<Complex64> {
        self.require_host()?;
        other.require_host()?;
        if self.partition != other.partition {
            return Err(EngineError::Internal(
                "inner product across differently partitioned registers".into(),
            ));
        }
        let mut local = Complex64::new(0.0, 0.0);
        for (a, b) in self
            .buffer
            .as_slice()
            .iter()
            .zip(other.buffer.as_slice().iter())
        {
            local += a.conj() * b;
        }
        let re = self.comm.allreduce_sum(local.re)?;
        let im = self.comm.allreduce_sum(local.im)?;
        Ok(Complex64::new(re, im))
    }

    /// Scale every local amplitude by a real factor
    ///
    /// Leaves the register unnormalized; used to fold Hamiltonian
    /// coefficients into a costate.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        self.require_host()?;
        kernels::scale(self.buffer.as_mut_slice(), factor);
        Ok(())
    }

    /// Deep copy: same partition and communicator, fresh buffer, empty tape
    pub fn clone_state(&self) -> Result<Register> {
        self.require_host()?;
        Ok(Register {
            partition: self.partition,
            buffer: AmplitudeBuffer::from_slice(self.buffer.as_slice())?,
            residency: Residency::Host,
            device: None,
            comm: Arc::clone(&self.comm),
            tape: Tape::new(),
        })
    }

    // --- Tape control ---

    pub fn enable_recording(&mut self, enabled: bool) {
        self.tape.enable(enabled);
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn clear_tape(&mut self) {
        self.tape.clear();
    }

    // --- Residency transfer ---

    /// Move the amplitudes to the accelerator; idempotent
    pub fn to_accelerator(&mut self) -> Result<()> {
        if self.residency == Residency::Accelerator {
            return Ok(());
        }
        if self.partition.world_size() > 1 {
            return Err(EngineError::DistributedUnsupported {
                gate: "ACCELERATOR_TRANSFER",
            });
        }
        let context = accel::acquire().ok_or(EngineError::AcceleratorUnavailable)?;
        let handle = context.upload(self.buffer.as_slice())?;
        self.device = Some(DeviceState { context, handle });
        self.residency = Residency::Accelerator;
        Ok(())
    }

    /// Move the amplitudes back to host memory; idempotent
    pub fn to_host(&mut self) -> Result<()> {
        if self.residency == Residency::Host {
            return Ok(());
        }
        let device = self.device.take().ok_or_else(|| {
            EngineError::Internal("accelerator residency without a device buffer".into())
        })?;
        device
            .context
            .download(device.handle, self.buffer.as_mut_slice())?;
        device.context.release(device.handle);
        self.residency = Residency::Host;
        Ok(())
    }

    fn require_host(&self) -> Result<()> {
        match self.residency {
            Residency::Host => Ok(()),
            Residency::Accelerator => Err(EngineError::HostResidencyRequired),
        }
    }

    // --- Gate surface ---

    pub fn apply_h(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::H, target, None)
    }

    pub fn apply_x(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::X, target, None)
    }

    pub fn apply_y(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::Y, target, None)
    }

    pub fn apply_z(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::Z, target, None)
    }

    pub fn apply_s(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::S, target, None)
    }

    pub fn apply_t(&mut self, target: usize) -> Result<()> {
        self.apply_single(GateKind::T, target, None)
    }

    pub fn apply_rx(&mut self, target: usize, angle: f64) -> Result<()> {
        self.apply_single(GateKind::Rx, target, Some(angle))
    }

    pub fn apply_ry(&mut self, target: usize, angle: f64) -> Result<()> {
        self.apply_single(GateKind::Ry, target, Some(angle))
    }

    pub fn apply_rz(&mut self, target: usize, angle: f64) -> Result<()> {
        self.apply_single(GateKind::Rz, target, Some(angle))
    }

    pub fn apply_cnot(&mut self, control: usize, target: usize) -> Result<()> {
        self.check_qubit(control)?;
        self.check_qubit(target)?;
        if control == target {
            return Err(EngineError::DuplicateQubit(control));
        }
        match self.residency {
            Residency::Host => self.cnot_host(control, target)?,
            Residency::Accelerator => {
                let device = self.device_state()?;
                device.context.apply_cnot(device.handle, control, target)?;
            }
        }
        self.tape.record(RecordedGate::cnot(control, target));
        Ok(())
    }

    pub fn apply_toffoli(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.check_qubit(control1)?;
        self.check_qubit(control2)?;
        self.check_qubit(target)?;
        if control1 == control2 || control1 == target || control2 == target {
            return Err(EngineError::DuplicateQubit(if control1 == control2 {
                control1
            } else {
                target
            }));
        }
        if !(self.partition.is_local(control1)
            && self.partition.is_local(control2)
            && self.partition.is_local(target))
        {
            return Err(EngineError::DistributedUnsupported { gate: "TOFFOLI" });
        }
        match self.residency {
            Residency::Host => kernels::toffoli(
                self.buffer.as_mut_slice(),
                1 << control1,
                1 << control2,
                1 << target,
            ),
            Residency::Accelerator => {
                let device = self.device_state()?;
                device
                    .context
                    .apply_toffoli(device.handle, control1, control2, target)?;
            }
        }
        self.tape
            .record(RecordedGate::toffoli(control1, control2, target));
        Ok(())
    }

    /// Replay a tape entry; records again if recording is enabled
    pub fn apply_recorded(&mut self, gate: &RecordedGate) -> Result<()> {
        let q = gate.qubits();
        match gate.kind() {
            GateKind::Cnot => self.apply_cnot(q[0], q[1]),
            GateKind::Toffoli => self.apply_toffoli(q[0], q[1], q[2]),
            kind => self.apply_single(kind, q[0], gate.param()),
        }
    }

    /// Apply the inverse of a tape entry; never records
    ///
    /// Self-inverse gates run unchanged, rotations run with the negated
    /// angle, and the phase gates run with the conjugate phase.
    pub fn apply_recorded_inverse(&mut self, gate: &RecordedGate) -> Result<()> {
        let q = gate.qubits();
        let was_recording = self.tape.is_enabled();
        self.tape.enable(false);
        let result = match gate.kind() {
            GateKind::Cnot => self.apply_cnot(q[0], q[1]),
            GateKind::Toffoli => self.apply_toffoli(q[0], q[1], q[2]),
            kind if kind.is_self_inverse() => self.apply_single(kind, q[0], None),
            GateKind::S => self.dispatch_phase(q[0], Complex64::new(0.0, -1.0)),
            GateKind::T => self.dispatch_phase(q[0], Complex64::from_polar(1.0, -FRAC_PI_4)),
            kind => {
                let angle = gate.param().ok_or_else(|| {
                    EngineError::Internal(format!("{} recorded without an angle", kind))
                })?;
                self.apply_single(kind, q[0], Some(-angle))
            }
        };
        self.tape.enable(was_recording);
        result
    }

    // --- Internal dispatch ---

    fn check_qubit(&self, q: usize) -> Result<()> {
        if q >= self.num_qubits() {
            return Err(EngineError::InvalidQubitIndex {
                index: q,
                num_qubits: self.num_qubits(),
            });
        }
        Ok(())
    }

    fn device_state(&self) -> Result<&DeviceState> {
        self.device.as_ref().ok_or_else(|| {
            EngineError::Internal("accelerator residency without a device buffer".into())
        })
    }

    fn apply_single(&mut self, kind: GateKind, target: usize, param: Option<f64>) -> Result<()> {
        self.check_qubit(target)?;
        match self.residency {
            Residency::Host => self.single_host(kind, target, param)?,
            Residency::Accelerator => self.single_device(kind, target, param)?,
        }
        let record = match param {
            Some(angle) => RecordedGate::rotation(kind, target, angle),
            None => RecordedGate::single(kind, target),
        };
        self.tape.record(record);
        Ok(())
    }

    fn single_host(&mut self, kind: GateKind, target: usize, param: Option<f64>) -> Result<()> {
        if self.partition.is_local(target) {
            let stride = self.partition.stride(target);
            let state = self.buffer.as_mut_slice();
            match kind {
                GateKind::H => kernels::hadamard(state, stride),
                GateKind::X => kernels::pauli_x(state, stride),
                GateKind::Y => kernels::pauli_y(state, stride),
                GateKind::Z => kernels::pauli_z(state, stride),
                GateKind::S => kernels::phase(state, stride, Complex64::new(0.0, 1.0)),
                GateKind::T => {
                    kernels::phase(state, stride, Complex64::from_polar(1.0, FRAC_PI_4))
                }
                GateKind::Rx => {
                    let matrix = rotation_x_matrix(required_angle(kind, param)?);
                    simd::apply_matrix2(state, &matrix, stride);
                }
                GateKind::Ry => kernels::rotation_y(state, stride, required_angle(kind, param)?),
                GateKind::Rz => kernels::rotation_z(state, stride, required_angle(kind, param)?),
                GateKind::Cnot | GateKind::Toffoli => {
                    return Err(EngineError::Internal(format!(
                        "{} dispatched through the single-qubit path",
                        kind
                    )))
                }
            }
            return Ok(());
        }

        // Rank-global qubit: diagonal gates reduce to a per-rank factor,
        // everything else pairs up with the partner rank.
        let bit = self.partition.rank_bit_set(target);
        match kind {
            GateKind::Z => {
                if bit {
                    kernels::scale_complex(self.buffer.as_mut_slice(), Complex64::new(-1.0, 0.0));
                }
            }
            GateKind::S => {
                if bit {
                    kernels::scale_complex(self.buffer.as_mut_slice(), Complex64::new(0.0, 1.0));
                }
            }
            GateKind::T => {
                if bit {
                    kernels::scale_complex(
                        self.buffer.as_mut_slice(),
                        Complex64::from_polar(1.0, FRAC_PI_4),
                    );
                }
            }
            GateKind::Rz => {
                let angle = required_angle(kind, param)?;
                let factor = Complex64::from_polar(1.0, if bit { angle / 2.0 } else { -angle / 2.0 });
                kernels::scale_complex(self.buffer.as_mut_slice(), factor);
            }
            _ => {
                let matrix = match kind {
                    GateKind::H => hadamard_matrix(),
                    GateKind::X => pauli_x_matrix(),
                    GateKind::Y => pauli_y_matrix(),
                    GateKind::Rx => rotation_x_matrix(required_angle(kind, param)?),
                    GateKind::Ry => rotation_y_matrix(required_angle(kind, param)?),
                    _ => {
                        return Err(EngineError::Internal(format!(
                            "{} has no pairwise matrix form",
                            kind
                        )))
                    }
                };
                let partner = self.partition.partner_rank(target);
                let received = self.comm.exchange(partner, self.buffer.as_slice())?;
                kernels::combine_exchanged(self.buffer.as_mut_slice(), &received, bit, &matrix);
            }
        }
        Ok(())
    }

    fn single_device(&mut self, kind: GateKind, target: usize, param: Option<f64>) -> Result<()> {
        let device = self.device_state()?;
        match kind {
            GateKind::Z => device.context.apply_diagonal(
                device.handle,
                [Complex64::new(1.0, 0.0), Complex64::new(-1.0, 0.0)],
                target,
            ),
            GateKind::S => device.context.apply_diagonal(
                device.handle,
                [Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)],
                target,
            ),
            GateKind::T => device.context.apply_diagonal(
                device.handle,
                [Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, FRAC_PI_4)],
                target,
            ),
            GateKind::Rz => {
                let angle = required_angle(kind, param)?;
                device.context.apply_diagonal(
                    device.handle,
                    [
                        Complex64::from_polar(1.0, -angle / 2.0),
                        Complex64::from_polar(1.0, angle / 2.0),
                    ],
                    target,
                )
            }
            GateKind::H => device
                .context
                .apply_matrix2(device.handle, &hadamard_matrix(), target),
            GateKind::X => device
                .context
                .apply_matrix2(device.handle, &pauli_x_matrix(), target),
            GateKind::Y => device
                .context
                .apply_matrix2(device.handle, &pauli_y_matrix(), target),
            GateKind::Rx => device.context.apply_matrix2(
                device.handle,
                &rotation_x_matrix(required_angle(kind, param)?),
                target,
            ),
            GateKind::Ry => device.context.apply_matrix2(
                device.handle,
                &rotation_y_matrix(required_angle(kind, param)?),
                target,
            ),
            GateKind::Cnot | GateKind::Toffoli => Err(EngineError::Internal(format!(
                "{} dispatched through the single-qubit path",
                kind
            ))),
        }
    }

    /// diag(1, phase) on the target qubit, residency- and rank-aware
    fn dispatch_phase(&mut self, target: usize, ph: Complex64) -> Result<()> {
        self.check_qubit(target)?;
        match self.residency {
            Residency::Host => {
                if self.partition.is_local(target) {
                    kernels::phase(self.buffer.as_mut_slice(), self.partition.stride(target), ph);
                } else if self.partition.rank_bit_set(target) {
                    kernels::scale_complex(self.buffer.as_mut_slice(), ph);
                }
                Ok(())
            }
            Residency::Accelerator => {
                let device = self.device_state()?;
                device
                    .context
                    .apply_diagonal(device.handle, [Complex64::new(1.0, 0.0), ph], target)
            }
        }
    }

    fn cnot_host(&mut self, control: usize, target: usize) -> Result<()> {
        let p = self.partition;
        match (p.is_local(control), p.is_local(target)) {
            // Both local: conditional pair swap.
            (true, true) => {
                kernels::cnot(self.buffer.as_mut_slice(), 1 << control, 1 << target);
            }
            // Control global, target local: the control bit is fixed on
            // this rank, so the gate is either a local X or a no-op.
            (false, true) => {
                if p.rank_bit_set(control) {
                    kernels::pauli_x(self.buffer.as_mut_slice(), 1 << target);
                }
            }
            // Both global: ranks with the control bit set swap shards.
            (false, false) => {
                if p.rank_bit_set(control) {
                    let partner = p.partner_rank(target);
                    let received = self.comm.exchange(partner, self.buffer.as_slice())?;
                    self.buffer.copy_from(&received)?;
                }
            }
            // Control local, target global: exchange shards, then take
            // the partner's amplitude exactly where the control is set.
            (true, false) => {
                let partner = p.partner_rank(target);
                let received = self.comm.exchange(partner, self.buffer.as_slice())?;
                let control_mask = 1 << control;
                for (i, (own, their)) in self
                    .buffer
                    .as_mut_slice()
                    .iter_mut()
                    .zip(received.iter())
                    .enumerate()
                {
                    if i & control_mask != 0 {
                        *own = *their;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn local_amplitudes(&self) -> &[Complex64] {
        self.buffer.as_slice()
    }

    pub(crate) fn local_amplitudes_mut(&mut self) -> &mut [Complex64] {
        self.buffer.as_mut_slice()
    }
}

impl Drop for Register {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            device.context.release(device.handle);
        }
    }
}

fn required_angle(kind: GateKind, param: Option<f64>) -> Result<f64> {
    param.ok_or_else(|| EngineError::Internal(format!("{} applied without an angle", kind)))
}

fn hadamard_matrix() -> [[Complex64; 2]; 2] {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn pauli_x_matrix() -> [[Complex64; 2]; 2] {
    [
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
    ]
}

fn pauli_y_matrix() -> [[Complex64; 2]; 2] {
    [
        [Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)],
        [Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)],
    ]
}

fn rotation_x_matrix(angle: f64) -> [[Complex64; 2]; 2] {
    let c = Complex64::new((angle / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(angle / 2.0).sin());
    [[c, s], [s, c]]
}

fn rotation_y_matrix(angle: f64) -> [[Complex64; 2]; 2] {
    let c = Complex64::new((angle / 2.0).cos(), 0.0);
    let s = Complex64::new((angle / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let reg = Register::new(3).unwrap();
        let amps = reg.local_slice().unwrap();
        assert_relative_eq!(amps[0].re, 1.0);
        for a in &amps[1..] {
            assert_relative_eq!(a.norm(), 0.0);
        }
    }

    #[test]
    fn test_qubit_count_bounds() {
        assert!(Register::new(0).is_err());
        assert!(Register::new(31).is_err());
        assert!(Register::new(1).is_ok());
    }

    #[test]
    fn test_x_flips_ground() {
        let mut reg = Register::new(1).unwrap();
        reg.apply_x(0).unwrap();
        let amps = reg.local_slice().unwrap();
        assert_relative_eq!(amps[0].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_h_superposition() {
        let mut reg = Register::new(1).unwrap();
        reg.apply_h(0).unwrap();
        let amps = reg.local_slice().unwrap();
        assert_relative_eq!(amps[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(amps[1].re, FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_bell_state() {
        let mut reg = Register::new(2).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_cnot(0, 1).unwrap();
        let amps = reg.local_slice().unwrap();
        assert_relative_eq!(amps[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(amps[1].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[2].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[3].re, FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_reverse_direction_cnot() {
        // X(1) then CNOT(1, 0) lands in |11⟩.
        let mut reg = Register::new(2).unwrap();
        reg.apply_x(1).unwrap();
        reg.apply_cnot(1, 0).unwrap();
        let amps = reg.local_slice().unwrap();
        assert_relative_eq!(amps[3].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_operands() {
        let mut reg = Register::new(2).unwrap();
        assert!(matches!(
            reg.apply_h(2),
            Err(EngineError::InvalidQubitIndex { index: 2, .. })
        ));
        assert!(matches!(
            reg.apply_cnot(1, 1),
            Err(EngineError::DuplicateQubit(1))
        ));
        assert!(matches!(
            reg.apply_toffoli(0, 0, 1),
            Err(EngineError::DuplicateQubit(0))
        ));
    }

    #[test]
    fn test_failed_gate_leaves_state_untouched() {
        let mut reg = Register::new(2).unwrap();
        reg.apply_h(0).unwrap();
        let before: Vec<_> = reg.local_slice().unwrap().to_vec();
        assert!(reg.apply_cnot(0, 5).is_err());
        assert_eq!(reg.local_slice().unwrap(), before.as_slice());
    }

    #[test]
    fn test_self_inverse_gates() {
        let mut reg = Register::new(3).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_ry(1, 0.9).unwrap();
        reg.apply_cnot(0, 2).unwrap();
        let before: Vec<_> = reg.local_slice().unwrap().to_vec();

        for gate in [
            RecordedGate::single(GateKind::H, 1),
            RecordedGate::single(GateKind::X, 0),
            RecordedGate::single(GateKind::Y, 2),
            RecordedGate::single(GateKind::Z, 1),
            RecordedGate::cnot(1, 2),
            RecordedGate::toffoli(0, 1, 2),
        ] {
            reg.apply_recorded(&gate).unwrap();
            reg.apply_recorded(&gate).unwrap();
        }

        for (a, b) in reg.local_slice().unwrap().iter().zip(before.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rotation_inverse_pairs() {
        let mut reg = Register::new(2).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_h(1).unwrap();
        let before: Vec<_> = reg.local_slice().unwrap().to_vec();

        for (kind, q) in [
            (GateKind::Rx, 0),
            (GateKind::Ry, 1),
            (GateKind::Rz, 0),
        ] {
            let gate = RecordedGate::rotation(kind, q, 0.73);
            reg.apply_recorded(&gate).unwrap();
            reg.apply_recorded_inverse(&gate).unwrap();
        }

        for (a, b) in reg.local_slice().unwrap().iter().zip(before.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_phase_gate_inverses() {
        let mut reg = Register::new(1).unwrap();
        reg.apply_h(0).unwrap();
        let before: Vec<_> = reg.local_slice().unwrap().to_vec();

        for kind in [GateKind::S, GateKind::T] {
            let gate = RecordedGate::single(kind, 0);
            reg.apply_recorded(&gate).unwrap();
            reg.apply_recorded_inverse(&gate).unwrap();
        }

        for (a, b) in reg.local_slice().unwrap().iter().zip(before.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_norm_preserved_over_sequence() {
        let mut reg = Register::new(5).unwrap();
        reg.apply_h(0).unwrap();
        reg.apply_cnot(0, 3).unwrap();
        reg.apply_rx(2, 0.4).unwrap();
        reg.apply_ry(4, -1.1).unwrap();
        reg.apply_t(1).unwrap();
        reg.apply_toffoli(0, 3, 4).unwrap();
        assert_relative_eq!(reg.norm_sqr().unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tape_records_in_order() {
        let mut reg = Register::new(2).unwrap();
        reg.enable_recording(true);
        reg.apply_h(0).unwrap();
        reg.apply_ry(1, 0.5).unwrap();
        reg.apply_cnot(0, 1).unwrap();

        let tape = reg.tape();
        assert_eq!(tape.len(), 3);
        assert_eq!(tape.entries()[0].kind(), GateKind::H);
        assert_eq!(tape.entries()[1].kind(), GateKind::Ry);
        assert_eq!(tape.entries()[1].param(), Some(0.5));
        assert_eq!(tape.entries()[2].kind(), GateKind::Cnot);
    }

    #[test]
    fn test_tape_roundtrip_replay() {
        let mut reg = Register::new(3).unwrap();
        reg.enable_recording(true);
        reg.apply_h(0).unwrap();
        reg.apply_cnot(0, 1).unwrap();
        reg.apply_ry(2, 1.3).unwrap();
        reg.apply_t(1).unwrap();
        let final_state: Vec<_> = reg.local_slice().unwrap().to_vec();

        reg.enable_recording(false);
        reg.reset().unwrap();
        let tape: Vec<_> = reg.tape().entries().to_vec();
        for gate in &tape {
            reg.apply_recorded(gate).unwrap();
        }

        for (a, b) in reg.local_slice().unwrap().iter().zip(final_state.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_swap_exchanges_storage() {
        let mut reg = Register::new(1).unwrap();
        let mut other = vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];
        reg.swap(&mut other).unwrap();
        assert_relative_eq!(reg.local_slice().unwrap()[1].re, 1.0);
        assert_relative_eq!(other[0].re, 1.0);

        let mut short = vec![Complex64::new(0.0, 0.0)];
        assert!(reg.swap(&mut short).is_err());
    }

    #[test]
    fn test_accelerator_roundtrip() {
        let _guard = crate::accel::TEST_REGISTRY_LOCK.lock();
        crate::accel::install(Arc::new(crate::accel::InProcessAccelerator::new()));

        let mut reg = Register::new(2).unwrap();
        reg.to_accelerator().unwrap();
        assert_eq!(reg.residency(), Residency::Accelerator);
        reg.to_accelerator().unwrap(); // idempotent

        // Same gates resident as a host register applies.
        reg.apply_h(0).unwrap();
        reg.apply_cnot(0, 1).unwrap();
        reg.apply_rz(1, 0.7).unwrap();
        assert!(reg.local_slice().is_err());

        reg.to_host().unwrap();
        let device_result: Vec<_> = reg.local_slice().unwrap().to_vec();

        let mut host = Register::new(2).unwrap();
        host.apply_h(0).unwrap();
        host.apply_cnot(0, 1).unwrap();
        host.apply_rz(1, 0.7).unwrap();

        for (a, b) in device_result.iter().zip(host.local_slice().unwrap().iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }

        crate::accel::teardown();
    }

    #[test]
    fn test_accelerator_unavailable() {
        let _guard = crate::accel::TEST_REGISTRY_LOCK.lock();
        crate::accel::teardown();
        let mut reg = Register::new(1).unwrap();
        assert!(matches!(
            reg.to_accelerator(),
            Err(EngineError::AcceleratorUnavailable)
        ));
        assert!(reg.to_host().is_ok()); // idempotent no-op
    }

    #[test]
    fn test_inner_product() {
        let mut a = Register::new(1).unwrap();
        a.apply_h(0).unwrap();
        let b = a.clone_state().unwrap();
        let overlap = a.inner_product(&b).unwrap();
        assert_relative_eq!(overlap.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(overlap.im, 0.0, epsilon = 1e-12);

        let ground = Register::new(1).unwrap();
        let overlap = a.inner_product(&ground).unwrap();
        assert_relative_eq!(overlap.re, FRAC_1_SQRT_2, epsilon = 1e-12);
    }
}
