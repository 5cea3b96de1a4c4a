//! Bidirectional gate-name table.
//!
//! Most gates map to their lower-case label. The two irregular entries are
//! `CNOT -> cx` and `PHASE -> p` (and its controlled form `CPHASE -> cp`).

use std::sync::LazyLock;

use qembed_ir::GateName;
use rustc_hash::FxHashMap;

/// Every supported gate and its OpenQASM 2 mnemonic.
pub const OPENQASM_GATES: [(GateName, &str); 18] = [
    (GateName::H, "h"),
    (GateName::X, "x"),
    (GateName::Y, "y"),
    (GateName::Z, "z"),
    (GateName::S, "s"),
    (GateName::T, "t"),
    (GateName::Rx, "rx"),
    (GateName::Ry, "ry"),
    (GateName::Rz, "rz"),
    (GateName::Phase, "p"),
    (GateName::Cnot, "cx"),
    (GateName::Cy, "cy"),
    (GateName::Cz, "cz"),
    (GateName::Crz, "crz"),
    (GateName::CPhase, "cp"),
    (GateName::Swap, "swap"),
    (GateName::CSwap, "cswap"),
    (GateName::Measure, "measure"),
];

static TO_MNEMONIC: LazyLock<FxHashMap<GateName, &'static str>> =
    LazyLock::new(|| OPENQASM_GATES.iter().copied().collect());

static FROM_MNEMONIC: LazyLock<FxHashMap<&'static str, GateName>> =
    LazyLock::new(|| OPENQASM_GATES.iter().map(|&(g, m)| (m, g)).collect());

/// OpenQASM mnemonic for a gate.
pub fn mnemonic(gate: GateName) -> Option<&'static str> {
    TO_MNEMONIC.get(&gate).copied()
}

/// Gate for an OpenQASM mnemonic.
pub fn gate_for(mnemonic: &str) -> Option<GateName> {
    FROM_MNEMONIC.get(mnemonic).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_vocabulary() {
        for gate in GateName::ALL {
            let m = mnemonic(gate).unwrap();
            assert_eq!(gate_for(m), Some(gate));
        }
    }

    #[test]
    fn test_irregular_names() {
        assert_eq!(mnemonic(GateName::Cnot), Some("cx"));
        assert_eq!(mnemonic(GateName::Phase), Some("p"));
        assert_eq!(mnemonic(GateName::CPhase), Some("cp"));
        assert_eq!(gate_for("cnot"), None);
        assert_eq!(gate_for("ccx"), None);
    }

    #[test]
    fn test_regular_names_are_lowercase_labels() {
        for (gate, m) in OPENQASM_GATES {
            if !matches!(gate, GateName::Cnot | GateName::Phase | GateName::CPhase) {
                assert_eq!(m, gate.label().to_lowercase());
            }
        }
    }
}
