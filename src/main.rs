mod cli;
mod dataset;
mod error;
mod filter;
mod fmt;
mod metrics;
mod models;
mod reports;
mod session;
mod settings;
mod telemetry;
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load { file, kind } => cli::load::run(&file, &kind),
        Commands::Report { command } => cli::report::dispatch(command),
        Commands::Status => cli::status::run(),
        Commands::Demo { output_dir } => cli::demo::run(output_dir),
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_warning() => eprintln!("Warning: {e}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
