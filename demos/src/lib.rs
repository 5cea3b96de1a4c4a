//! Helpers behind the `dmet-run` binary.
//!
//! Configuration and measurement-record I/O with file context on errors,
//! OpenQASM export of a fragment's ansatz, and console formatting.

use anyhow::{Context, bail};
use console::style;
use std::collections::BTreeMap;
use std::path::Path;

use qembed_dmet::estimator::ResourceReport;
use qembed_dmet::solvers::VqeSolver;
use qembed_dmet::{DmetConfig, DmetProblemDecomposition, MeasurementRecord};

/// Load and validate a YAML configuration.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<DmetConfig> {
    let path = path.as_ref();
    let config = DmetConfig::from_file(path)
        .with_context(|| format!("failed to load configuration '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration '{}'", path.display()))?;
    Ok(config)
}

/// Write a measurement record as JSON.
pub fn write_record(record: &MeasurementRecord, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, record.to_json()?)
        .with_context(|| format!("failed to write '{}'", path.display()))
}

/// Read a measurement record written by [`write_record`].
pub fn read_record(path: impl AsRef<Path>) -> anyhow::Result<MeasurementRecord> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(MeasurementRecord::from_json(&text)?)
}

/// OpenQASM 2 text of the VQE ansatz of `fragment`.
///
/// Uses the fitted chemical potential when the decomposition has been
/// simulated and μ = 0 otherwise. Parameters are the configured initial ones.
pub fn ansatz_qasm(dmet: &mut DmetProblemDecomposition, fragment: usize) -> anyhow::Result<String> {
    let n_fragments = dmet.config().fragment_atoms.len();
    let solvers = dmet.config().fragment_solvers.resolve(n_fragments)?;
    match solvers.get(fragment).map(String::as_str) {
        Some("vqe") => {}
        Some(other) => bail!("fragment {fragment} is solved by '{other}', not vqe"),
        None => bail!("fragment {fragment} does not exist, there are {n_fragments}"),
    }
    let mu = dmet.chemical_potential().unwrap_or(0.0);
    let problem = dmet.embedded_problem(fragment, mu)?;
    let options = dmet
        .solver_options(fragment)
        .cloned()
        .unwrap_or_default();
    let (_, ansatz, _) = VqeSolver::build(&problem, &options)?;
    let params = options
        .initial_parameters
        .unwrap_or_else(|| vec![0.0; ansatz.n_parameters()]);
    let circuit = ansatz.circuit(&params)?;
    Ok(qembed_qasm::to_openqasm(&circuit)?)
}

/// Print a header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a section title.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print one row per fragment report.
pub fn print_resources(reports: &BTreeMap<usize, ResourceReport>) {
    if reports.is_empty() {
        println!("  no fragment uses quantum resources");
        return;
    }
    println!(
        "  {:>8} {:>8} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "fragment", "terms", "width", "gates", "2q", "var", "params"
    );
    for (fragment, r) in reports {
        println!(
            "  {:>8} {:>8} {:>7} {:>7} {:>7} {:>7} {:>7}",
            fragment,
            r.qubit_hamiltonian_terms,
            r.circuit_width,
            r.circuit_gates,
            r.circuit_2qubit_gates,
            r.circuit_var_gates,
            r.vqe_variational_parameters
        );
    }
}
