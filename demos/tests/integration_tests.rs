//! Checks of the `dmet-run` helpers against the bundled configuration.

use std::path::PathBuf;

use qembed_demos::{ansatz_qasm, load_config, read_record, write_record};
use qembed_dmet::{DmetProblemDecomposition, FragmentSolvers};

fn sample_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/h4_ring.yaml")
}

#[test]
fn test_sample_config_loads() {
    let config = load_config(sample_config()).unwrap();
    assert_eq!(config.fragment_atoms, vec![1, 1, 1, 1]);
    assert_eq!(
        config.fragment_solvers,
        FragmentSolvers::PerFragment(vec![
            "vqe".into(),
            "ccsd".into(),
            "ccsd".into(),
            "ccsd".into()
        ])
    );
}

#[test]
fn test_missing_config_names_the_file() {
    let err = load_config("does/not/exist.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("does/not/exist.yaml"));
}

#[test]
fn test_ansatz_qasm_round_trip() {
    let config = load_config(sample_config()).unwrap();
    let mut dmet = DmetProblemDecomposition::new(config);
    let qasm = ansatz_qasm(&mut dmet, 0).unwrap();
    assert!(qasm.starts_with("OPENQASM 2.0;"));
    assert!(qasm.contains("qreg q[2];"));

    let circuit = qembed_qasm::from_openqasm(&qasm).unwrap();
    assert_eq!(circuit.width(), 2);
    assert!(circuit.size() > 0);

    assert!(ansatz_qasm(&mut dmet, 1).is_err());
    assert!(ansatz_qasm(&mut dmet, 9).is_err());
}

#[test]
fn test_record_file_round_trip() {
    let config = load_config(sample_config()).unwrap();
    let mut dmet = DmetProblemDecomposition::new(config);
    dmet.simulate().unwrap();
    let record = dmet.rdm_measurements().cloned().unwrap();

    let path = std::env::temp_dir().join(format!("qembed-record-{}.json", std::process::id()));
    write_record(&record, &path).unwrap();
    let back = read_record(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(back, record);
}
