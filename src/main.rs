mod builder;
mod cli;
mod codec;
#[cfg(feature = "pdf")]
mod convert;
mod error;
mod fmt;
mod importer;
mod manifest;
mod matcher;
mod models;
mod pipeline;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            input_dir,
            output_dir,
        } => cli::init::run(input_dir, output_dir),
        Commands::Process {
            file,
            output,
            no_launch,
        } => cli::process::run(file, output, no_launch),
        Commands::Collect {
            file,
            downloads_dir,
            window,
        } => cli::collect::run(file, downloads_dir, window),
        Commands::Verify { file } => cli::verify::run(file),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
