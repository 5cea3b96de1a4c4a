//! `qembed-sim`: qubit operators and exact statevector execution.
//!
//! - [`PauliString`] / [`QubitOperator`]: sparse Pauli algebra with complex
//!   coefficients
//! - [`synthesis`]: `exp(-i θ P)` as CNOT-ladder circuits on [`qembed_ir::Circuit`]
//! - [`Statevector`]: dense simulation, Pauli expectations and seeded sampling
//! - [`measurement`]: per-term outcome frequencies and their resampling
//!
//! # Quick start
//!
//! ```rust
//! use qembed_ir::Circuit;
//! use qembed_sim::{PauliString, Statevector, synthesis::append_exp_pauli};
//!
//! let p: PauliString = "X0 Y1".parse().unwrap();
//! let mut circuit = Circuit::with_width(2);
//! append_exp_pauli(&mut circuit, &p, 0.25, true).unwrap();
//!
//! let mut state = Statevector::new(2).unwrap();
//! state.apply_circuit(&circuit).unwrap();
//! assert!((state.norm_sqr() - 1.0).abs() < 1e-12);
//! assert_eq!(circuit.variational_gate_count(), 1);
//! ```

pub mod error;
pub mod measurement;
pub mod operator;
pub mod pauli;
pub mod statevector;
pub mod synthesis;

pub use error::{SimError, SimResult};
pub use measurement::Frequencies;
pub use operator::QubitOperator;
pub use pauli::{PauliOp, PauliString};
pub use statevector::Statevector;
