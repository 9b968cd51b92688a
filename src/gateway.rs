// src/gateway.rs
//! Main gateway coordination

use crate::{
    config::GatewayConfig,
    dump,
    error::{GpsError, Result},
    gps::{data::PositionFix, nmea::NmeaDecoder},
    network,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPortBuilderExt;

/// Size of one serial read; sentences may span several reads.
const READ_CHUNK: usize = 200;

/// Main GPS gateway that coordinates the serial decoder and the UDP service
pub struct GpsGateway {
    fix: Arc<RwLock<PositionFix>>,
    running: Arc<AtomicBool>,
}

impl GpsGateway {
    /// Create a new GPS gateway
    pub fn new() -> Self {
        Self {
            fix: Arc::new(RwLock::new(PositionFix::new())),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Connect to the GPS receiver and start decoding in the background
    pub async fn connect_serial(&self, config: &GatewayConfig) -> Result<()> {
        println!(
            "Connecting to GPS on {} at {} baud...",
            config.gps_port, config.gps_speed
        );

        let serial = tokio_serial::new(&config.gps_port, config.gps_speed)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(|e| {
                GpsError::Connection(format!(
                    "Failed to open serial port {}: {}",
                    config.gps_port, e
                ))
            })?;

        println!("Connected successfully!");

        let fix = Arc::clone(&self.fix);
        let running = Arc::clone(&self.running);
        let gps_debug = config.gps_debug;
        let debug = config.debug;
        let policy = config.numeric_fields;

        tokio::spawn(async move {
            let mut serial = serial;
            let mut decoder = NmeaDecoder::with_policy(policy);
            let mut current = PositionFix::new();
            let mut buffer = [0u8; READ_CHUNK];

            while running.load(Ordering::Relaxed) {
                match serial.read(&mut buffer).await {
                    Ok(0) => break, // EOF
                    Ok(n) => {
                        if gps_debug {
                            dump::dump("GPS Data", &buffer[..n]);
                        }

                        if decoder.feed(&buffer[..n], &mut current) > 0 {
                            current.update_timestamp();
                            *fix.write().unwrap() = current.clone();

                            if debug {
                                println!("Position: {}", current.format_position());
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading from serial port: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Serve position requests over UDP until shutdown
    pub async fn run_network(&self, config: &GatewayConfig) -> Result<()> {
        network::run_responder(
            config.network_port,
            config.network_debug,
            Arc::clone(&self.fix),
            Arc::clone(&self.running),
        )
        .await
    }

    /// Stop the gateway
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Check if the gateway is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get a clone of the current position fix
    pub fn position(&self) -> PositionFix {
        self.fix.read().unwrap().clone()
    }
}

impl Default for GpsGateway {
    fn default() -> Self {
        Self::new()
    }
}
