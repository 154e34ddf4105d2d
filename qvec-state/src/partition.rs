//! Rank partitioning of the global amplitude vector
//!
//! The 2^n amplitudes are split evenly across `world_size` ranks in index
//! order: rank R owns global indices [R·local_dim, (R+1)·local_dim). A
//! qubit whose stride fits inside the local dimension is *local*; higher
//! qubits are *global* and their value on a given rank is fixed by the
//! rank's own bits.

use qvec_core::{EngineError, Result};

/// Immutable partition descriptor for one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    num_qubits: usize,
    rank: usize,
    world_size: usize,
    local_dim: usize,
}

impl Partition {
    /// Build a partition, validating the register size and layout
    ///
    /// `world_size` must be a power of two dividing 2^n, and `rank` must be
    /// inside it.
    pub fn new(num_qubits: usize, rank: usize, world_size: usize) -> Result<Self> {
        if num_qubits == 0 || num_qubits > 30 {
            return Err(EngineError::InvalidQubitCount(num_qubits));
        }
        let global_dim = 1usize << num_qubits;
        if world_size == 0 || !world_size.is_power_of_two() || world_size > global_dim {
            return Err(EngineError::Internal(format!(
                "world size {} does not partition a {}-qubit register",
                world_size, num_qubits
            )));
        }
        if rank >= world_size {
            return Err(EngineError::Internal(format!(
                "rank {} outside world of size {}",
                rank, world_size
            )));
        }
        Ok(Self {
            num_qubits,
            rank,
            world_size,
            local_dim: global_dim / world_size,
        })
    }

    /// Single-rank partition (the default layout)
    pub fn single(num_qubits: usize) -> Result<Self> {
        Self::new(num_qubits, 0, 1)
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    #[inline]
    pub fn local_dim(&self) -> usize {
        self.local_dim
    }

    #[inline]
    pub fn global_dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Bit mask of qubit `q` in a basis-state index
    #[inline]
    pub fn stride(&self, q: usize) -> usize {
        1 << q
    }

    /// A qubit is local when its stride fits in the local block
    #[inline]
    pub fn is_local(&self, q: usize) -> bool {
        self.stride(q) < self.local_dim
    }

    /// Rank-bit mask of a global qubit
    #[inline]
    pub fn rank_bit(&self, q: usize) -> usize {
        self.stride(q) / self.local_dim
    }

    /// Value of a global qubit on this rank
    #[inline]
    pub fn rank_bit_set(&self, q: usize) -> bool {
        self.rank & self.rank_bit(q) != 0
    }

    /// The rank holding the flipped value of global qubit `q`
    #[inline]
    pub fn partner_rank(&self, q: usize) -> usize {
        self.rank ^ self.rank_bit(q)
    }

    /// Value of qubit `q` for the amplitude at `local_index` on this rank
    #[inline]
    pub fn global_bit(&self, local_index: usize, q: usize) -> bool {
        if self.is_local(q) {
            local_index & self.stride(q) != 0
        } else {
            self.rank_bit_set(q)
        }
    }
}
