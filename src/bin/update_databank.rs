use std::{error::Error, path::Path};

use clap::Parser;
use databank::{
    config::Config,
    etl::{update_databank, PipelineError},
};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// File with the indicator codes, one per line
    #[arg(short, long, default_value = "indicators.txt")]
    indicators: String,
}

/// Replace the content of the databank with the latest indicator values.
/// Only one instance may run against a given destination at a time.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .parse_default_env()
        .init();

    let env_file = format!(".env/{}.env", args.env);
    if let Err(e) = dotenvy::from_path(Path::new(&env_file)) {
        warn!("Not loading {}: {}", env_file, e);
    }
    let config = Config::from_env()?;

    info!("Populating database...");
    match update_databank(&config, Path::new(&args.indicators)) {
        Ok(report) => {
            info!(
                "Completed! {} indicators fetched, {} skipped, {} records loaded",
                report.fetch.fetched_count(),
                report.fetch.skipped_count(),
                report.loaded
            );
            Ok(())
        }
        Err(PipelineError::Load(e)) => {
            error!("An error has occurred, nothing was loaded: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
