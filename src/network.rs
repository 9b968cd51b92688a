// src/network.rs
//! UDP position service

use crate::dump;
use crate::error::{GpsError, Result};
use crate::gps::data::PositionFix;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};
use tokio::net::UdpSocket;

/// Encode a position fix for the wire
pub fn encode_position(fix: &PositionFix) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(fix)?)
}

/// Answer position requests over UDP until shutdown.
///
/// Any inbound datagram counts as a request; the reply is the JSON-encoded
/// current fix, sent back to the datagram's source address.
pub async fn run_responder(
    port: u16,
    debug: bool,
    fix: Arc<RwLock<PositionFix>>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", port))
        .await
        .map_err(|e| GpsError::Connection(format!("Failed to bind UDP port {}: {}", port, e)))?;

    println!("Listening for position requests on UDP port {}", port);

    let mut buffer = [0u8; 200];
    while running.load(Ordering::Relaxed) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                running.store(false, Ordering::Relaxed);
            }
            received = socket.recv_from(&mut buffer) => {
                let (len, addr) = match received {
                    Ok(result) => result,
                    Err(e) => {
                        eprintln!("Error reading from network: {}", e);
                        continue;
                    }
                };

                if debug {
                    dump::dump(&format!("Data from {}", addr), &buffer[..len]);
                }

                // The read guard must not be held across the send await.
                let reply = {
                    let current = fix.read().unwrap();
                    encode_position(&current)?
                };

                if let Err(e) = socket.send_to(&reply, addr).await {
                    eprintln!("Error replying to {}: {}", addr, e);
                }
            }
        }
    }

    println!("\nShutting down...");
    Ok(())
}
