//! SPMD scenarios over the in-process thread world
//!
//! Each test spins up one thread per rank, every thread issuing the same
//! gates on its shard of the register, and checks the per-rank amplitudes.

use num_complex::Complex64;
use qvec_state::{Register, ThreadCommunicator};
use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::Arc;
use std::thread;

/// Run `program` on every rank of a `world_size` world and collect each
/// rank's final local amplitudes, in rank order.
fn run_world<F>(world_size: usize, num_qubits: usize, program: F) -> Vec<Vec<Complex64>>
where
    F: Fn(&mut Register) + Send + Sync + Copy + 'static,
{
    let comms = ThreadCommunicator::group(world_size);
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut reg = Register::with_comm(num_qubits, Arc::new(comm)).unwrap();
                program(&mut reg);
                reg.local_slice().unwrap().to_vec()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn assert_amp(amp: Complex64, re: f64, im: f64) {
    assert!(
        (amp.re - re).abs() < 1e-10 && (amp.im - im).abs() < 1e-10,
        "amplitude {} != ({}, {})",
        amp,
        re,
        im
    );
}

fn assert_zero_except(shard: &[Complex64], keep: &[usize]) {
    for (i, amp) in shard.iter().enumerate() {
        if !keep.contains(&i) {
            assert!(amp.norm() < 1e-10, "index {} expected zero, got {}", i, amp);
        }
    }
}

#[test]
fn global_hadamard_then_cross_rank_cnot() {
    // n=4 over 2 ranks: H on the rank qubit, then CNOT(3, 0).
    let shards = run_world(2, 4, |reg| {
        reg.apply_h(3).unwrap();
        reg.apply_cnot(3, 0).unwrap();
    });

    assert_amp(shards[0][0], FRAC_1_SQRT_2, 0.0);
    assert_zero_except(&shards[0], &[0]);
    assert_amp(shards[1][1], FRAC_1_SQRT_2, 0.0);
    assert_zero_except(&shards[1], &[1]);
}

#[test]
fn cross_rank_cnot_with_local_control() {
    // X(0), then CNOT(0, 3): |0001⟩ → |1001⟩, landing on rank 1 index 1.
    let shards = run_world(2, 4, |reg| {
        reg.apply_x(0).unwrap();
        reg.apply_cnot(0, 3).unwrap();
    });

    assert_zero_except(&shards[0], &[]);
    assert_amp(shards[1][1], 1.0, 0.0);
    assert_zero_except(&shards[1], &[1]);
}

#[test]
fn cross_rank_cnot_with_both_global() {
    // 4 ranks on n=4: qubits 2 and 3 live in the rank bits.
    // X(2) excites rank 1; CNOT(2, 3) moves its shard to rank 3.
    let shards = run_world(4, 4, |reg| {
        reg.apply_x(2).unwrap();
        reg.apply_cnot(2, 3).unwrap();
    });

    assert_zero_except(&shards[0], &[]);
    assert_zero_except(&shards[1], &[]);
    assert_zero_except(&shards[2], &[]);
    assert_amp(shards[3][0], 1.0, 0.0);
    assert_zero_except(&shards[3], &[0]);
}

#[test]
fn global_diagonal_gates_scale_per_rank() {
    // (|0000⟩ + |1000⟩)/√2, then Z on the rank qubit flips the top sign.
    let shards = run_world(2, 4, |reg| {
        reg.apply_h(3).unwrap();
        reg.apply_z(3).unwrap();
    });

    assert_amp(shards[0][0], FRAC_1_SQRT_2, 0.0);
    assert_amp(shards[1][0], -FRAC_1_SQRT_2, 0.0);
}

#[test]
fn distributed_measurement_agrees_on_all_ranks() {
    let comms = ThreadCommunicator::group(2);
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut reg = Register::with_comm(4, Arc::new(comm)).unwrap();
                reg.apply_h(3).unwrap();
                // Rank 0's sample decides: 0.9 ≥ p1 = 0.5 picks outcome 0.
                let outcome = reg.measure_with(3, 0.9).unwrap();
                let norm = reg.norm_sqr().unwrap();
                (outcome, norm, reg.local_slice().unwrap().to_vec())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (outcome, norm, _) in &results {
        assert_eq!(*outcome, 0);
        assert!((norm - 1.0).abs() < 1e-9);
    }
    // Outcome 0 leaves everything on rank 0.
    assert_amp(results[0].2[0], 1.0, 0.0);
    assert_zero_except(&results[1].2, &[]);
}

#[test]
fn distributed_expectation_reduces_across_ranks() {
    let comms = ThreadCommunicator::group(2);
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut reg = Register::with_comm(4, Arc::new(comm)).unwrap();
                reg.apply_h(3).unwrap();
                let z_global = reg.expectation_str("IIIZ").unwrap();
                let z_local = reg.expectation_str("Z").unwrap();
                let x_global = reg.expectation_str("IIIX");
                (z_global, z_local, x_global.is_err())
            })
        })
        .collect();

    for handle in handles {
        let (z_global, z_local, x_rejected) = handle.join().unwrap();
        // Equal superposition on the rank qubit: ⟨Z⟩ = 0 there, +1 on q0.
        assert!(z_global.abs() < 1e-10);
        assert!((z_local - 1.0).abs() < 1e-10);
        assert!(x_rejected, "X on a rank-global qubit must be rejected");
    }
}

#[test]
fn distributed_toffoli_is_rejected() {
    let comms = ThreadCommunicator::group(2);
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut reg = Register::with_comm(4, Arc::new(comm)).unwrap();
                reg.apply_toffoli(0, 1, 3)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(matches!(
            result,
            Err(qvec_state::EngineError::DistributedUnsupported { .. })
        ));
    }
}

#[test]
fn norm_is_globally_one_after_distributed_circuit() {
    let comms = ThreadCommunicator::group(2);
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let mut reg = Register::with_comm(5, Arc::new(comm)).unwrap();
                reg.apply_h(0).unwrap();
                reg.apply_h(4).unwrap();
                reg.apply_cnot(0, 4).unwrap();
                reg.apply_cnot(4, 2).unwrap();
                reg.apply_ry(4, 0.83).unwrap();
                reg.apply_rz(4, -1.21).unwrap();
                reg.apply_t(1).unwrap();
                reg.norm_sqr().unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!((handle.join().unwrap() - 1.0).abs() < 1e-9);
    }
}
