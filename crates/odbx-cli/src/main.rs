use std::process::ExitCode;

use odbx_post::{ExportSummary, run_export};
use tracing_subscriber::EnvFilter;

mod args;

use args::{Command, USAGE, parse_args};

fn usage() {
    println!("{USAGE}");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &ExportSummary) {
    println!("stress_position: {}", summary.stress_position);
    for inst in &summary.instances {
        println!(
            "instance {}: stress_elements={} active_elements={} boundary_nodes={}",
            inst.name, inst.stress_elements, inst.active_elements, inst.boundary_nodes
        );
    }
    println!("nodes: {} ({})", summary.counts.nodes, summary.paths.nodes.display());
    println!(
        "elements: {} ({})",
        summary.counts.elements,
        summary.paths.elements.display()
    );
    println!("stress: {} ({})", summary.counts.stress, summary.paths.stress.display());
    println!(
        "boundary_nodes: {} ({})",
        summary.counts.boundary_nodes,
        summary.paths.boundary_nodes.display()
    );
    if let Some(vtk) = &summary.vtk {
        println!("vtk: {}", vtk.display());
    }
}

fn main() -> ExitCode {
    init_logging();

    let config = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Export(config)) => config,
        Ok(Command::Help) => {
            usage();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}");
            usage();
            return ExitCode::from(2);
        }
    };

    match run_export(&config) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            ExitCode::from(1)
        }
    }
}
