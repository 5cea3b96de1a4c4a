//! Run DMET from a YAML configuration.
//!
//! ```text
//! dmet-run configs/h4_ring.yaml --resources --error-bars --shots 50000 --resamples 10
//! ```

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use qembed_demos::{
    ansatz_qasm, load_config, print_header, print_resources, print_result, print_section,
    read_record, write_record,
};
use qembed_dmet::DmetProblemDecomposition;

#[derive(Parser, Debug)]
#[command(name = "dmet-run")]
#[command(author, version, about = "Density matrix embedding from a YAML configuration")]
struct Args {
    /// Configuration file
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print quantum resource estimates
    #[arg(long)]
    resources: bool,

    /// Estimate bootstrap error bars
    #[arg(long)]
    error_bars: bool,

    /// Shots per measured term in each bootstrap trial
    #[arg(long, default_value = "50000")]
    shots: u64,

    /// Bootstrap trials
    #[arg(long, default_value = "10")]
    resamples: usize,

    /// Purify resampled RDMs
    #[arg(long)]
    purify: bool,

    /// Bootstrap seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Resample this measurement record instead of the fresh one
    #[arg(long)]
    record_in: Option<PathBuf>,

    /// Save the measurement record as JSON
    #[arg(long)]
    record_out: Option<PathBuf>,

    /// Print the OpenQASM ansatz of this fragment
    #[arg(long)]
    qasm: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config = load_config(&args.config)?;
    print_header("DMET");
    print_result("Configuration", args.config.display());
    print_result("Atoms", config.molecule.n_atoms());
    print_result("Fragments", config.fragment_atoms.len());
    print_result("Localization", config.electron_localization);

    let mut dmet = DmetProblemDecomposition::new(config);
    let start = Instant::now();
    dmet.build()?;
    if let Some(e) = dmet.mean_field_energy() {
        print_result("Mean-field energy", format!("{e:.10}"));
    }

    if args.resources {
        print_section("Resources");
        print_resources(&dmet.get_resources()?);
    }

    print_section("Simulation");
    let energy = dmet.simulate()?;
    print_result("DMET energy", format!("{energy:.10}"));
    if let Some(mu) = dmet.chemical_potential() {
        print_result("Chemical potential", format!("{mu:.6e}"));
    }
    for outcome in dmet.fragment_outcomes() {
        print_result(
            &format!("Fragment {} ({})", outcome.index, outcome.solver),
            format!(
                "E = {:.8}, N = {:.6}",
                outcome.fragment_energy, outcome.electrons
            ),
        );
    }
    print_result("Time", format!("{:.2?}", start.elapsed()));

    if let (Some(path), Some(record)) = (&args.record_out, dmet.rdm_measurements()) {
        write_record(record, path)?;
        print_result("Record written", path.display());
    }

    if args.error_bars {
        print_section("Bootstrap");
        let record = args.record_in.as_ref().map(read_record).transpose()?;
        let mut rng = StdRng::seed_from_u64(args.seed);
        let (mean, std) =
            dmet.energy_error_bars(args.shots, args.resamples, args.purify, record.as_ref(), &mut rng)?;
        print_result("Shots", args.shots);
        print_result("Resamples", args.resamples);
        print_result("Energy", format!("{mean:.8} ± {std:.8}"));
    }

    if let Some(fragment) = args.qasm {
        print_section(&format!("Ansatz of fragment {fragment}"));
        println!("{}", ansatz_qasm(&mut dmet, fragment)?);
    }
    Ok(())
}
