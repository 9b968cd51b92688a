// src/main.rs
//! GPS Gateway - serial NMEA receiver to UDP position service

use clap::Parser;
use gps_gateway::{config::GatewayConfig, error::Result, gateway::GpsGateway};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Serial GPS position gateway serving NMEA fixes over UDP")]
struct Args {
    /// Path to the configuration file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = GatewayConfig::load(args.config.as_deref())?;

    println!("Starting GPS Gateway...");

    let gateway = GpsGateway::new();
    gateway.connect_serial(&config).await?;
    gateway.run_network(&config).await
}
