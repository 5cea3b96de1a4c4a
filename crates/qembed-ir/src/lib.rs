//! qembed circuit model
//!
//! A backend-agnostic representation of a quantum circuit: an ordered
//! sequence of [`Gate`] operations, each naming a [`GateName`], its target
//! qubits, optional control qubits and an optional real parameter.
//!
//! # Example
//!
//! ```rust
//! use qembed_ir::{Circuit, GateName, QubitId};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.rz(0.5, QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.width(), 2);
//! assert_eq!(circuit.counts()[&GateName::Cnot], 1);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Targets | Controls | Parameter |
//! |------|---------|----------|-----------|
//! | `H`, `X`, `Y`, `Z`, `S`, `T` | 1 | 0 | no |
//! | `RX`, `RY`, `RZ`, `PHASE` | 1 | 0 | yes |
//! | `CNOT`, `CY`, `CZ` | 1 | 1 | no |
//! | `CRZ`, `CPHASE` | 1 | 1 | yes |
//! | `SWAP` | 2 | 0 | no |
//! | `CSWAP` | 2 | 1 | no |
//! | `MEASURE` | 1 | 0 | no |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateName};
pub use qubit::QubitId;
