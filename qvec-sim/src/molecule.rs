//! Molecular Hamiltonian tables for variational runs
//!
//! Qubit Hamiltonians from standard quantum-chemistry datasets, mapped to
//! two qubits. These feed the gradient engines and the optimizer layers
//! sitting above them.

use qvec_core::{Hamiltonian, PauliTerm};

/// Molecules with tabulated qubit Hamiltonians
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Molecule {
    /// H₂ at 0.7414 Å bond distance, parity-mapped to two qubits
    H2,
    /// Tapered LiH placeholder pinned at its demo ground-state energy
    LiH,
}

impl Molecule {
    /// Number of qubits the mapped Hamiltonian acts on
    pub fn num_qubits(self) -> usize {
        match self {
            Molecule::H2 => 2,
            Molecule::LiH => 2,
        }
    }

    /// The Hamiltonian as weighted Pauli strings (coefficients in Hartree)
    pub fn hamiltonian(self) -> Hamiltonian {
        match self {
            Molecule::H2 => vec![
                term(-1.052373245772859, "II"),
                term(0.397937424843187, "IZ"),
                term(-0.397937424843187, "ZI"),
                term(-0.011280104256235, "ZZ"),
                term(0.180931199784231, "XX"),
            ],
            Molecule::LiH => vec![term(-7.86, "II")],
        }
    }
}

fn term(coefficient: f64, string: &str) -> PauliTerm {
    PauliTerm::parse(coefficient, string).expect("static Pauli table")
}
