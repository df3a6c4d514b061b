use anyhow::{Context, Result};
use serialport::SerialPort;
use std::thread;
use std::time::Duration;

/// Open the projector's serial port: 8 data bits, no parity, one stop
/// bit, no flow control.
pub fn open_port(port: &str, baud: u32) -> Result<Box<dyn SerialPort>> {
    let mut handle = serialport::new(port, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .open()
        .context(format!("Failed to open serial port {}", port))?;

    // Set write timeout to avoid blocking forever
    handle
        .set_timeout(Duration::from_millis(1000))
        .context("Failed to set serial port timeout")?;

    // Set DTR to match pyserial defaults
    if let Err(e) = handle.write_data_terminal_ready(true) {
        eprintln!("Warning: Failed to set DTR on {}: {}", port, e);
    }

    // Allow device to initialize
    thread::sleep(Duration::from_millis(100));

    Ok(handle)
}
