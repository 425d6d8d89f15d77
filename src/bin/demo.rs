//! Voltage MBAP Demo
//!
//! Connects to a Modbus TCP device, runs each of the eight data-access
//! functions once and prints the results.
//!
//! Usage: cargo run --features demo --bin demo [host] [port] [unit_id]
//! Example: cargo run --features demo --bin demo 127.0.0.1 502 1
//!
//! Set `RUST_LOG=voltage_mbap=trace` to see every frame on the wire.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use voltage_mbap::{ModbusClient, ModbusSession, SessionConfig, DEFAULT_TCP_PORT};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => DEFAULT_TCP_PORT,
    };
    let unit_id = match args.next() {
        Some(unit) => unit.parse()?,
        None => 1,
    };

    println!("Voltage MBAP v{} Demo", voltage_mbap::VERSION);
    println!("==========================");

    let config = SessionConfig::new(host, port)
        .with_unit_id(unit_id)
        .with_timeout(Duration::from_secs(5))
        .with_connect_timeout(Duration::from_secs(5));
    let session = ModbusSession::open(config).await?;
    println!("Connected to {} (unit {})\n", session.peer(), session.unit_id());

    match session.read_coils(0, 3).await {
        Ok(values) => println!("  Coils 0-2:             {:?}", values),
        Err(e) => println!("  Read coils failed: {}", e),
    }

    match session.read_discrete_inputs(0, 4).await {
        Ok(values) => println!("  Discrete inputs 0-3:   {:?}", values),
        Err(e) => println!("  Read discrete inputs failed: {}", e),
    }

    match session.read_holding_registers(0, 4).await {
        Ok(values) => println!("  Holding registers 0-3: {:?}", values),
        Err(e) => println!("  Read holding registers failed: {}", e),
    }

    match session.read_input_registers(0, 4).await {
        Ok(values) => println!("  Input registers 0-3:   {:?}", values),
        Err(e) => println!("  Read input registers failed: {}", e),
    }

    if let Err(e) = session.write_single_coil(0, true).await {
        println!("  Write single coil failed: {}", e);
    }

    if let Err(e) = session.write_single_register(0, 123).await {
        println!("  Write single register failed: {}", e);
    }

    let coils = [true, true, true, true, true, true, true, true, false, true];
    if let Err(e) = session.write_multiple_coils(10, &coils).await {
        println!("  Write multiple coils failed: {}", e);
    }

    if let Err(e) = session.write_multiple_registers(10, &[1, -2, 3]).await {
        println!("  Write multiple registers failed: {}", e);
    }

    let stats = session.stats().await;
    println!(
        "\n  {} requests, {} replies, {} errors, {} bytes sent, {} bytes received",
        stats.requests_sent,
        stats.responses_received,
        stats.errors,
        stats.bytes_sent,
        stats.bytes_received
    );

    session.disconnect().await?;
    println!("Disconnected");
    Ok(())
}
