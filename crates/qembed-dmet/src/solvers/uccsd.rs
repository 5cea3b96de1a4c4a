//! Spin-restricted UCCSD ansatz with a single Trotter step.
//!
//! Excitations are spin-summed singlet operators `E_ai` (i occupied, a
//! virtual) and pair products `E_ai E_bj`. Each amplitude θ_k multiplies the
//! anti-Hermitian generator `G_k = T_k − T_k†`; the circuit applies
//! `Π_k exp(θ_k G_k)` to the Hartree-Fock reference.

use qembed_chem::FermionMapper;
use qembed_ir::Circuit;
use qembed_sim::operator::DEFAULT_TOLERANCE;
use qembed_sim::synthesis::append_trotter_step;
use qembed_sim::{QubitOperator, Statevector};

use crate::error::{DmetError, DmetResult};

/// Parameterized UCCSD circuit for one embedding problem.
#[derive(Debug, Clone)]
pub struct UccsdAnsatz {
    reference: Circuit,
    /// `i·G_k`, Hermitian with real Pauli coefficients.
    generators: Vec<QubitOperator>,
    n_qubits: u32,
}

impl UccsdAnsatz {
    /// Build the ansatz for `n_occupied` doubly occupied orbitals out of `n_orbitals`.
    pub fn new(mapper: &FermionMapper, n_orbitals: usize, n_occupied: usize) -> DmetResult<Self> {
        let mut singles = Vec::new();
        for i in 0..n_occupied {
            for a in n_occupied..n_orbitals {
                singles.push(mapper.one_body(a, i)?);
            }
        }

        let mut generators = Vec::with_capacity(singles.len() * (singles.len() + 3) / 2);
        for t in &singles {
            generators.push(hermitian_generator(t.clone()));
        }
        for (k, t1) in singles.iter().enumerate() {
            for t2 in &singles[k..] {
                generators.push(hermitian_generator(t1 * t2));
            }
        }

        let reference = mapper.hf_circuit()?;
        let n_qubits = reference.width();
        if generators.iter().any(|g| g.n_qubits() > n_qubits) {
            return Err(DmetError::Configuration(
                "excitation operators act outside the mapped register".into(),
            ));
        }
        tracing::debug!(
            n_singles = singles.len(),
            n_parameters = generators.len(),
            n_qubits,
            "uccsd ansatz"
        );
        Ok(Self {
            reference,
            generators,
            n_qubits,
        })
    }

    /// Number of variational parameters.
    pub fn n_parameters(&self) -> usize {
        self.generators.len()
    }

    /// Register width.
    pub fn n_qubits(&self) -> u32 {
        self.n_qubits
    }

    /// Reference preparation followed by one Trotter step per generator.
    pub fn circuit(&self, params: &[f64]) -> DmetResult<Circuit> {
        if params.len() != self.n_parameters() {
            return Err(DmetError::Configuration(format!(
                "ansatz takes {} parameters, got {}",
                self.n_parameters(),
                params.len()
            )));
        }
        let mut circuit = Circuit::with_width(self.n_qubits);
        circuit.extend(&self.reference)?;
        for (generator, &theta) in self.generators.iter().zip(params) {
            // exp(θG) = exp(-iθ·(iG))
            append_trotter_step(&mut circuit, generator, theta, true)?;
        }
        Ok(circuit)
    }

    /// Simulate the ansatz state.
    pub fn prepare(&self, params: &[f64]) -> DmetResult<Statevector> {
        let mut state = Statevector::new(self.n_qubits)?;
        state.apply_circuit(&self.circuit(params)?)?;
        Ok(state)
    }
}

fn hermitian_generator(excitation: QubitOperator) -> QubitOperator {
    let deexcitation = excitation.adjoint().scale(-1.0);
    (excitation + &deexcitation)
        .scale(num_complex::Complex64::i())
        .compress(DEFAULT_TOLERANCE)
}
