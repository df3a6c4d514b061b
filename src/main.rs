use anyhow::Result;
use clap::Parser;
use std::time::Duration;

mod catalog;
mod config;
mod output;
mod protocol;
mod scheduler;

use catalog::Catalog;
use scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "pattern_cycler")]
#[command(about = "Pattern cycler\n\nEncodes projection patterns into checksummed frames and cycles them over a serial link.", long_about = None)]
struct Cli {
    /// Path to patterns file (JSON)
    patterns: String,

    /// Serial port device
    #[arg(long, default_value = "/dev/serial0")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = 57600)]
    baud: u32,

    /// Milliseconds between pattern transmissions
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Enable debug output (encoded pattern table, per-tick status)
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and encode every pattern before touching the port
    let patterns = config::load_patterns(&cli.patterns)?;
    let catalog = Catalog::build(patterns)?;

    if cli.debug {
        print_pattern_table(&catalog);
    }

    let mut port = output::open_port(&cli.port, cli.baud)?;

    if cli.debug {
        println!(
            "✓ Opened {} ({} baud, {} patterns, {} ms interval)",
            cli.port,
            cli.baud,
            catalog.len(),
            cli.interval_ms
        );
        println!("(Press Ctrl-C to stop)");
    }

    let mut scheduler = Scheduler::new(catalog, cli.debug);

    // Set up Ctrl-C handler with graceful shutdown
    let running = scheduler.get_running_flag();
    let debug_for_handler = cli.debug;
    let result = ctrlc::set_handler(move || {
        if debug_for_handler {
            println!("\nShutting down...");
        }
        running.store(false, std::sync::atomic::Ordering::Relaxed);
    });

    if let Err(e) = result {
        eprintln!("Warning: Could not set Ctrl-C handler: {}", e);
    }

    // Run playback loop (blocks until shutdown)
    scheduler.run(&mut port, Duration::from_millis(cli.interval_ms))?;

    // Graceful shutdown - blank the projector
    scheduler.shutdown(&mut port);

    Ok(())
}

/// Dump every pattern's encoded frame pair, in catalog order.
fn print_pattern_table(catalog: &Catalog) {
    for pattern_id in 0..catalog.len() {
        if let Some(frames) = catalog.get(pattern_id) {
            let header: String = frames
                .header
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            let body: String = frames
                .body
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "{}: header {} | body {}",
                catalog.name(pattern_id).unwrap_or("?"),
                header,
                body
            );
        }
    }
}
