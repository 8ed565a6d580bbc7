use clap::Parser;
use tracing_subscriber::EnvFilter;

use seestar_drift::cli::{Cli, Commands};
use seestar_drift::commands::{analyze, inspect, AnalyzeOptions};
use seestar_drift::DriftError;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seestar_drift={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze {
            paths,
            output,
            format,
            plate_scale,
            reference,
            plot_dir,
            no_plots,
        } => {
            let options = AnalyzeOptions {
                output,
                format,
                plate_scale,
                reference_pixel: reference.pixel(),
                plot_dir,
                no_plots,
            };
            analyze(&paths, &options)?;
        }
        Commands::Inspect {
            path,
            reference,
            format,
        } => {
            inspect(&path, reference.pixel(), &format)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<DriftError>() {
            Some(drift) => {
                eprintln!("{}: {}", drift.kind(), drift);
                if let Some(exposure) = drift.exposure() {
                    eprintln!("Offending exposure: {}", exposure);
                }
                eprintln!("No results were written.");
            }
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
