//! Conversion Scenarios
//!
//! Runs each scenario from its source format into every other format and
//! prints what happened.

use clap::Parser;
use console::style;
use std::time::Instant;

use qbridge_demos::scenarios::{self, ScenarioReport};
use qbridge_demos::{
    init_tracing, print_failure, print_header, print_result, print_section, print_success,
};

#[derive(Parser, Debug)]
#[command(name = "convert_demo")]
#[command(about = "Walk through cross-framework conversion scenarios")]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn print_report(report: &ScenarioReport) {
    print_section(report.title);
    print_result("Source", report.source);
    for outcome in &report.outcomes {
        let mark = if outcome.passed {
            style("ok").green()
        } else {
            style("FAIL").red().bold()
        };
        println!(
            "  {:<8} {:<5} {}",
            outcome.target.to_string(),
            mark,
            style(&outcome.detail).dim()
        );
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let start = Instant::now();

    print_header("qbridge Conversion Scenarios");

    let reports = scenarios::all()?;
    for report in &reports {
        print_report(report);
    }

    println!();
    let failed: Vec<_> = reports.iter().filter(|r| !r.passed()).collect();
    print_result("Time", format!("{:.2?}", start.elapsed()));
    if failed.is_empty() {
        print_success(&format!("All {} scenarios passed", reports.len()));
        Ok(())
    } else {
        for report in &failed {
            print_failure(report.title);
        }
        anyhow::bail!("{} of {} scenarios failed", failed.len(), reports.len())
    }
}
