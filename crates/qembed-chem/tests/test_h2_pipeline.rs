//! End-to-end checks on H₂/STO-3G: mean field, correlated solvers and qubit Hamiltonians.

use qembed_chem::linalg::{transform_one, transform_two};
use qembed_chem::{
    BasisSet, BasisSetName, CcsdOptions, ElectronicHamiltonian, FermionMapper, Integrals,
    Molecule, QubitMapping, Rhf, ScfResult, solve_ccsd, solve_fci,
};
use qembed_sim::Statevector;

fn h2() -> (Integrals, ScfResult) {
    let mol = Molecule::from_symbols(
        [("H", [0.0, 0.0, 0.0]), ("H", [0.0, 0.0, 0.7414])],
        BasisSetName::Sto3g,
    )
    .unwrap();
    let basis = BasisSet::build(&mol, mol.basis).unwrap();
    let ints = Integrals::compute(&mol, &basis);
    let h = ints.core_hamiltonian();
    let scf = Rhf::new(&h, &ints.eri, 2)
        .with_overlap(ints.overlap.clone())
        .with_energy_shift(ints.nuclear_repulsion)
        .run()
        .unwrap();
    (ints, scf)
}

fn mo_hamiltonian(ints: &Integrals, scf: &ScfResult) -> ElectronicHamiltonian {
    let c = scf.mo_coeff.view();
    ElectronicHamiltonian::new(
        transform_one(ints.core_hamiltonian().view(), c),
        transform_two(&ints.eri, c),
        ints.nuclear_repulsion,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Correlated energies
// ---------------------------------------------------------------------------

#[test]
fn test_fci_and_ccsd_agree_for_two_electrons() {
    let (ints, scf) = h2();
    assert!((scf.energy + 1.1168).abs() < 1e-3, "{}", scf.energy);

    let ham = mo_hamiltonian(&ints, &scf);
    let fci = solve_fci(&ham, 2).unwrap();
    let cc = solve_ccsd(&ham, 2, CcsdOptions::default()).unwrap();
    assert!((fci.energy + 1.1373).abs() < 1e-3, "{}", fci.energy);
    assert!((cc.energy - fci.energy).abs() < 1e-8);
    assert!((ham.rdm_energy(&cc.one_rdm, &cc.two_rdm) - fci.energy).abs() < 1e-7);
}

// ---------------------------------------------------------------------------
// Qubit Hamiltonians
// ---------------------------------------------------------------------------

#[test]
fn test_term_counts_and_widths() {
    let (ints, scf) = h2();
    let ham = mo_hamiltonian(&ints, &scf);

    let jw = FermionMapper::new(QubitMapping::Jw, 2, 2, false).unwrap();
    let h_jw = jw.hamiltonian(&ham.one_body, &ham.two_body, ham.constant).unwrap();
    assert_eq!(h_jw.n_terms(), 15);
    assert_eq!(jw.n_qubits(), 4);

    let scbk = FermionMapper::new(QubitMapping::Scbk, 2, 2, true).unwrap();
    let h_scbk = scbk.hamiltonian(&ham.one_body, &ham.two_body, ham.constant).unwrap();
    assert_eq!(h_scbk.n_terms(), 5);
    assert_eq!(scbk.n_qubits(), 2);
    assert!(h_scbk.is_real(1e-12));
}

#[test]
fn test_hartree_fock_state_energy_in_every_mapping() {
    let (ints, scf) = h2();
    let ham = mo_hamiltonian(&ints, &scf);
    for (mapping, up_then_down) in [
        (QubitMapping::Jw, false),
        (QubitMapping::Jw, true),
        (QubitMapping::Bk, false),
        (QubitMapping::Parity, false),
        (QubitMapping::Scbk, true),
    ] {
        let mapper = FermionMapper::new(mapping, 2, 2, up_then_down).unwrap();
        let h = mapper.hamiltonian(&ham.one_body, &ham.two_body, ham.constant).unwrap();
        let mut state = Statevector::new(mapper.n_qubits() as u32).unwrap();
        state.apply_circuit(&mapper.hf_circuit().unwrap()).unwrap();
        let e = state.expectation_operator(&h).unwrap();
        assert!(
            (e.re - scf.energy).abs() < 1e-8,
            "{mapping} (up_then_down={up_then_down}): {} vs {}",
            e.re,
            scf.energy
        );
        assert!(e.im.abs() < 1e-12);
    }
}
