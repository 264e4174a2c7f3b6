mod api_key;
mod app;
mod cli;
mod constants;
mod gemini;
mod logging;
mod provider;
mod tools;

use anyhow::Result;

use crate::api_key::load_dotenv;
use crate::app::run_app;
use crate::cli::Config;
use crate::logging::{init_logging, log_debug, log_info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    log_info("Starting sandcall");

    // .env values must be visible before clap reads env-backed defaults
    load_dotenv();

    let config = Config::from_args();
    log_debug(&format!("Configuration: {:?}", config));

    run_app(config).await
}
