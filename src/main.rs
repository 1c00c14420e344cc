//! CLI for Fanout
//!
//! Subcommands:
//! - `demo`: run the observer walkthrough and print one delivery report per publish
//! - `config`: print the effective configuration

mod demo;

use clap::Parser;
use fanout::config::{Settings, load_config};
use fanout::utils::logging;
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "fanout")]
enum Command {
    /// Run the observer walkthrough against a fresh registry
    Demo {
        /// Deliver through per-subscriber workers instead of the calling thread
        #[arg(long = "async")]
        use_async: bool,
        /// Print delivery reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the configuration after file and environment overrides
    Config,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            warn!("Failed to load configuration, using defaults: {}", e);
            Settings::default()
        }
    };
    logging::init(&settings.logging.level);

    let result = match cmd {
        Command::Demo { use_async, json } => {
            let mode = if use_async {
                demo::Mode::Async
            } else {
                demo::Mode::Sync
            };
            demo::run(settings, mode, json).await
        }
        Command::Config => print_config(&settings),
    };

    if let Err(e) = result {
        error!("fanout failed: {}", e);
        std::process::exit(1);
    }
}

fn print_config(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("[registry]");
    println!("name = {:?}", settings.registry.name);
    println!("replay_last = {}", settings.registry.replay_last);
    println!("strict_unsubscribe = {}", settings.registry.strict_unsubscribe);
    println!();
    println!("[logging]");
    println!("level = {:?}", settings.logging.level);
    Ok(())
}
