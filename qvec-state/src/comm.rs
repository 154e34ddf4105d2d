//! Rank-to-rank communication for the distributed layout
//!
//! Collective primitives used by the kernels: pairwise buffer exchange
//! (distributed CNOT and global single-qubit gates), scalar allreduce
//! (measurement probabilities, expectation values), and a byte broadcast
//! (measurement outcomes). All participating ranks must issue the same
//! calls in the same order on the same register (the SPMD contract).
//!
//! [`SoloCommunicator`] serves the default single-rank layout.
//! [`ThreadCommunicator`] runs a whole world inside one process, one rank
//! per thread, over a full mesh of channels; an MPI binding would
//! implement the same trait against a real interconnect.

use num_complex::Complex64;
use qvec_core::{EngineError, Result};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// Collective communication between the ranks holding one register
pub trait Communicator: Send + Sync {
    /// This process's rank, 0 ≤ rank < world_size
    fn rank(&self) -> usize;

    /// Number of cooperating ranks; a power of two
    fn world_size(&self) -> usize;

    /// Swap local amplitude buffers with a partner rank
    ///
    /// Blocks until the partner's buffer arrives. Both sides must call
    /// with each other as partner.
    fn exchange(&self, partner: usize, send: &[Complex64]) -> Result<Vec<Complex64>>;

    /// Sum a scalar across all ranks; every rank receives the total
    fn allreduce_sum(&self, value: f64) -> Result<f64>;

    /// Distribute a byte from `root` to every rank
    fn broadcast_byte(&self, value: u8, root: usize) -> Result<u8>;
}

/// The degenerate single-rank world
#[derive(Debug, Default)]
pub struct SoloCommunicator;

impl Communicator for SoloCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn world_size(&self) -> usize {
        1
    }

    fn exchange(&self, partner: usize, _send: &[Complex64]) -> Result<Vec<Complex64>> {
        Err(EngineError::Internal(format!(
            "exchange with rank {} requested in a single-rank world",
            partner
        )))
    }

    fn allreduce_sum(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn broadcast_byte(&self, value: u8, _root: usize) -> Result<u8> {
        Ok(value)
    }
}

enum Message {
    Amplitudes(Vec<Complex64>),
    Scalar(f64),
    Byte(u8),
}

/// In-process communicator: one rank per thread over a channel mesh
pub struct ThreadCommunicator {
    rank: usize,
    world_size: usize,
    // Indexed by peer rank; None at our own position.
    senders: Vec<Option<Mutex<Sender<Message>>>>,
    receivers: Vec<Option<Mutex<Receiver<Message>>>>,
}

impl ThreadCommunicator {
    /// Build a fully connected world of `world_size` ranks
    ///
    /// Returns one communicator per rank, in rank order; hand each to its
    /// own thread.
    pub fn group(world_size: usize) -> Vec<ThreadCommunicator> {
        let mut sender_grid: Vec<Vec<Option<Sender<Message>>>> = (0..world_size)
            .map(|_| (0..world_size).map(|_| None).collect())
            .collect();
        let mut receiver_grid: Vec<Vec<Option<Receiver<Message>>>> = (0..world_size)
            .map(|_| (0..world_size).map(|_| None).collect())
            .collect();

        for from in 0..world_size {
            for to in 0..world_size {
                if from == to {
                    continue;
                }
                let (tx, rx) = channel();
                sender_grid[from][to] = Some(tx);
                receiver_grid[to][from] = Some(rx);
            }
        }

        sender_grid
            .into_iter()
            .zip(receiver_grid)
            .enumerate()
            .map(|(rank, (senders, receivers))| ThreadCommunicator {
                rank,
                world_size,
                senders: senders.into_iter().map(|s| s.map(Mutex::new)).collect(),
                receivers: receivers.into_iter().map(|r| r.map(Mutex::new)).collect(),
            })
            .collect()
    }

    fn send_to(&self, peer: usize, message: Message) -> Result<()> {
        let slot = self
            .senders
            .get(peer)
            .and_then(|s| s.as_ref())
            .ok_or_else(|| EngineError::Internal(format!("no channel to rank {}", peer)))?;
        let sender = slot
            .lock()
            .map_err(|_| EngineError::Internal("communicator lock poisoned".into()))?;
        sender
            .send(message)
            .map_err(|_| EngineError::Internal(format!("rank {} disconnected", peer)))
    }

    fn recv_from(&self, peer: usize) -> Result<Message> {
        let slot = self
            .receivers
            .get(peer)
            .and_then(|r| r.as_ref())
            .ok_or_else(|| EngineError::Internal(format!("no channel from rank {}", peer)))?;
        let receiver = slot
            .lock()
            .map_err(|_| EngineError::Internal("communicator lock poisoned".into()))?;
        receiver
            .recv()
            .map_err(|_| EngineError::Internal(format!("rank {} disconnected", peer)))
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn exchange(&self, partner: usize, send: &[Complex64]) -> Result<Vec<Complex64>> {
        if partner == self.rank || partner >= self.world_size {
            return Err(EngineError::Internal(format!(
                "invalid exchange partner {} for rank {}",
                partner, self.rank
            )));
        }
        self.send_to(partner, Message::Amplitudes(send.to_vec()))?;
        match self.recv_from(partner)? {
            Message::Amplitudes(buf) => Ok(buf),
            _ => Err(EngineError::Internal(
                "collective order violation: expected amplitude buffer".into(),
            )),
        }
    }

    fn allreduce_sum(&self, value: f64) -> Result<f64> {
        for peer in 0..self.world_size {
            if peer != self.rank {
                self.send_to(peer, Message::Scalar(value))?;
            }
        }
        let mut total = value;
        for peer in 0..self.world_size {
            if peer == self.rank {
                continue;
            }
            match self.recv_from(peer)? {
                Message::Scalar(v) => total += v,
                _ => {
                    return Err(EngineError::Internal(
                        "collective order violation: expected scalar".into(),
                    ))
                }
            }
        }
        Ok(total)
    }

    fn broadcast_byte(&self, value: u8, root: usize) -> Result<u8> {
        if self.rank == root {
            for peer in 0..self.world_size {
                if peer != root {
                    self.send_to(peer, Message::Byte(value))?;
                }
            }
            Ok(value)
        } else {
            match self.recv_from(root)? {
                Message::Byte(v) => Ok(v),
                _ => Err(EngineError::Internal(
                    "collective order violation: expected byte".into(),
                )),
            }
        }
    }
}
