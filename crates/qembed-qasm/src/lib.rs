//! `OpenQASM` 2 translator for qembed circuits
//!
//! Converts a [`qembed_ir::Circuit`] to and from the OpenQASM 2.0 text
//! consumed by external toolkits. The gate vocabulary is fixed (see
//! [`gates::OPENQASM_GATES`]); anything outside it fails with
//! [`TranslationError`].
//!
//! # Supported Features
//!
//! | Feature | Status | Example |
//! |---------|--------|---------|
//! | Header and registers | ✅ | `qreg q[2]; creg c[2];` |
//! | Fixed gates | ✅ | `h q[0];`, `cx q[0],q[1];` |
//! | Single-parameter gates | ✅ | `rz(-pi/4) q[1];` |
//! | Measurement | ✅ | `measure q[0] -> c[0];` |
//! | Comments | ✅ | `// comment` |
//! | Multi-parameter gates | ❌ | `u3(a,b,c) q[0];` |
//! | Classical conditions | ❌ | `if (c==1) x q[0];` |
//!
//! # Example
//!
//! ```rust
//! use qembed_ir::{Circuit, QubitId};
//! use qembed_qasm::{from_openqasm, to_openqasm};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(QubitId(0)).unwrap();
//! circuit.crz(0.25, QubitId(0), QubitId(1)).unwrap();
//!
//! let text = to_openqasm(&circuit).unwrap();
//! assert!(text.contains("crz(0.25) q[0],q[1];"));
//!
//! let back = from_openqasm(&text).unwrap();
//! assert_eq!(back.gates(), circuit.gates());
//! ```

pub mod emitter;
pub mod error;
pub mod gates;
pub mod lexer;
pub mod parser;

use qembed_ir::Circuit;

pub use error::{TranslationError, TranslationResult};

/// Translate a circuit into OpenQASM 2.0 text.
pub fn to_openqasm(circuit: &Circuit) -> TranslationResult<String> {
    emitter::emit(circuit)
}

/// Translate OpenQASM 2.0 text into a circuit.
pub fn from_openqasm(source: &str) -> TranslationResult<Circuit> {
    parser::parse(source)
}
