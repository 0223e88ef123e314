#![cfg(not(tarpaulin_include))]

use clap::Parser;
use guestlist::app;
use guestlist::config::Config;

/// Main entry point for the guest list web application
///
/// Reads the configuration from the command line and environment, sets up
/// logging (`RUST_LOG`, default `info`) and serves until stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    app::run(config).await
}
