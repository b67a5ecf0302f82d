//! Gate Benchmark
//!
//! Converts every Qiskit gate into the target format and checks the
//! result with `circuits_allclose`, then reports the pass rate.

use clap::Parser;
use console::style;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::PI;
use std::time::Instant;

use qbridge::ProgramFormat;
use qbridge_demos::sweep::{Outcome, SweepReport, gate_cases, random_cases, sweep};
use qbridge_demos::{
    init_tracing, print_failure, print_header, print_result, print_section, print_success,
};

#[derive(Parser, Debug)]
#[command(name = "gate_benchmark")]
#[command(about = "Convert every Qiskit gate and verify the unitaries")]
struct Args {
    /// Target format (cirq, braket, qiskit, quil)
    #[arg(short, long, default_value = "braket")]
    target: ProgramFormat,

    /// Also run N random circuits with random bound angles
    #[arg(long, value_name = "N")]
    random: Option<usize>,

    /// Maximum gates per random circuit
    #[arg(long, default_value_t = 8)]
    max_gates: usize,

    /// Seed for the random circuits
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn print_sweep(title: &str, report: &SweepReport, elapsed: std::time::Duration) {
    print_section(title);
    print_result("Target", report.target);
    print_result("Cases", report.total());
    print_result("Passed", report.passed());
    print_result("Pass rate", format!("{:.1}%", report.pass_rate() * 100.0));
    print_result("Time", format!("{elapsed:.2?}"));
    for case in report.failures() {
        let reason = match &case.outcome {
            Outcome::Mismatch => "unitary mismatch".to_string(),
            Outcome::Failed(e) => e.clone(),
            Outcome::Passed => continue,
        };
        println!("  {} {} {}", style("✗").red(), case.name, style(reason).dim());
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    print_header("qbridge Gate Benchmark");

    // Fixed angle for the catalog sweep, away from every well-known value.
    let start = Instant::now();
    let cases = gate_cases(&mut || PI / 7.0)?;
    let report = sweep(&cases, args.target);
    print_sweep("Qiskit gate catalog", &report, start.elapsed());
    let mut all_passed = report.passed() == report.total();

    if let Some(count) = args.random {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = Instant::now();
        let cases = random_cases(&mut rng, count, args.max_gates)?;
        let report = sweep(&cases, args.target);
        print_sweep("Random circuits", &report, start.elapsed());
        all_passed &= report.passed() == report.total();
    }

    println!();
    if all_passed {
        print_success("Every case converted and verified");
    } else {
        print_failure("Some cases failed");
    }
    Ok(())
}
