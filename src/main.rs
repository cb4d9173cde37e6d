//! Craft Warden - control panel for backend-supervised game servers
//!
//! This is the binary entry point. All logic lives in the library crates.

mod runner;

use clap::Parser;
use cwarden_app::config;
use cwarden_core::prelude::*;

/// Craft Warden - control panel for backend-supervised game servers
#[derive(Parser, Debug)]
#[command(name = "cwarden")]
#[command(about = "Control panel for backend-supervised game server instances", long_about = None)]
struct Args {
    /// Instance to attach a console to (id or name)
    #[arg(value_name = "INSTANCE")]
    instance: Option<String>,

    /// Backend address (host:port), overriding the config file
    #[arg(long, short = 'a')]
    address: Option<String>,

    /// List instances and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize error handling
    color_eyre::install().map_err(|e| Error::session(e.to_string()))?;

    // Initialize logging (to file; stdout belongs to the runners)
    cwarden_core::logging::init()?;

    let mut settings = config::load_settings();
    if let Some(address) = args.address {
        settings.backend.address = address;
    }

    info!("Backend address: {}", settings.backend.address);

    let result = if args.list {
        runner::run_list(settings).await
    } else if let Some(instance) = args.instance {
        runner::run_attached(settings, instance).await
    } else {
        runner::run_monitor(settings).await
    };

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }

    info!("Craft Warden exiting");
    result
}
