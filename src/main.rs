// CLI binary entry point for chunktag

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use cli::commands::{command_delete, command_info, command_read, command_write};
use cli::{expand_files, Commands, Config, OutputFormatter};

fn main() {
    let config = Config::parse();
    init_logging(&config);

    match run(&config) {
        Ok(0) => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Number of files that failed
fn run(config: &Config) -> anyhow::Result<usize> {
    let options = config.tag_options()?;
    let formatter = OutputFormatter::new(config.format, config.quiet);

    let failures = match &config.command {
        Commands::Read { files } => command_read(&expand_files(files)?, &options, &formatter),
        Commands::Write { files, fields } => command_write(&expand_files(files)?, fields, &options, &formatter)?,
        Commands::Delete { files } => command_delete(&expand_files(files)?, &options, &formatter),
        Commands::Info { files } => command_info(&expand_files(files)?, &options, &formatter),
    };
    Ok(failures)
}
