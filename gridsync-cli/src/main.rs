use clap::{Parser, Subcommand};
use tracing::info;

use gridsync_cli::{
    ApiClient, Settings,
    config::{DEFAULT_SCRIPT_PATH, DEFAULT_SETUP_PATH, validate_export, validate_import},
    load_script_config, load_setup_config,
    logging::init_logging,
    run_export, run_import,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grids, credentials and file mappings
    #[arg(long, default_value = DEFAULT_SETUP_PATH)]
    setup: String,

    /// Service URL, paging and logging settings
    #[arg(long, default_value = DEFAULT_SCRIPT_PATH)]
    script: String,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload local localization files into grids.
    Import,

    /// Download grids into local localization files.
    Export,
}

fn run(args: Args) -> Result<(), String> {
    let script = load_script_config(&args.script)?;
    init_logging(&script.log)?;
    let setup = load_setup_config(&args.setup)?;
    let settings = Settings::from_script(&script);

    match args.commands {
        Commands::Import => {
            let (api_key, import) = validate_import(&setup)?;
            let created = run_import(&ApiClient::new(api_key), &settings, import)?;
            info!("Import finished, {} record(s) created.", created);
        }
        Commands::Export => {
            let (api_key, export) = validate_export(&setup)?;
            let written = run_export(&ApiClient::new(api_key), &settings, export)?;
            info!("Export finished, {} file(s) written.", written.len());
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
