//! Manual smoke test against a real device.
//!
//! Usage: cargo run --example test_tcp [IP] [PORT]
//!
//! Default IP: 192.168.90.11, default port: 4370.

use rbzk::zk::client::Options;
use rbzk::zk::ZkTeco;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let ip = std::env::args().nth(1).unwrap_or_else(|| "192.168.90.11".to_string());
    let port: u16 = std::env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(4370);

    println!("Testing connection to {ip}:{port}");
    println!("======================================");

    let mut device = ZkTeco::new(Options {
        ip,
        port,
        ..Default::default()
    });

    println!("\n[1] Connecting...");
    device.connect()?;
    println!("    Connected! session_id established.");

    println!("\n[2] Reading device storage counts...");
    match device.read_sizes() {
        Ok(counts) => println!("    Device reports {} users, {} attendance records", counts.users, counts.records),
        Err(e) => println!("    Warning: could not read sizes: {e}"),
    }

    println!("\n[3] Downloading attendance data...");
    let records = device.get_attendance_logs()?;
    println!("    Downloaded {} records", records.len());

    for (i, record) in records.iter().take(5).enumerate() {
        println!(
            "      {}. uid {:5} | user_id {} | {} | status {} | punch {}",
            i + 1,
            record.uid,
            record.user_id,
            record.timestamp,
            record.status,
            record.punch
        );
    }

    println!("\n[4] Disconnecting...");
    device.disconnect()?;
    println!("    Disconnected.");

    println!("\n======================================");
    println!("Done!");

    Ok(())
}
