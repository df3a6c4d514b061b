use anyhow::{Context, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::catalog::{Catalog, EncodedPattern};

/// An all-zero word has even parity, so a zeroed frame is valid on the wire.
const BLANK_FRAME: [u8; 4] = [0x00; 4];

/// Display state derived from the tick counter: three 3-tick bands over a
/// 9-tick period. Reported per tick for diagnostics; the transmitted
/// frames are identical in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Ramp,
    Hold,
    Fade,
}

impl DisplayState {
    fn from_counter(counter: u32) -> DisplayState {
        match counter % 9 {
            0..=2 => DisplayState::Ramp,
            3..=5 => DisplayState::Hold,
            _ => DisplayState::Fade,
        }
    }
}

/// Mutable playback position: tick counter (period 9) and pattern cursor.
#[derive(Debug)]
struct PlaybackState {
    counter: u32,
    cursor: usize,
}

/// Cycles the catalog out over a transport on a fixed cadence.
pub struct Scheduler {
    catalog: Catalog,
    state: PlaybackState,
    running: Arc<AtomicBool>,
    debug: bool,
}

impl Scheduler {
    pub fn new(catalog: Catalog, debug: bool) -> Scheduler {
        Scheduler {
            catalog,
            state: PlaybackState {
                counter: 0,
                cursor: 0,
            },
            running: Arc::new(AtomicBool::new(true)),
            debug,
        }
    }

    /// Get a clone of the running flag for signal handlers
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Select the pattern at the cursor, then advance the cursor modulo
    /// catalog length and the counter modulo 9. Returns the pattern chosen
    /// before the advance, with the display state of the new counter.
    pub fn tick(&mut self) -> Result<(EncodedPattern, DisplayState)> {
        let frames = *self
            .catalog
            .get(self.state.cursor)
            .context("Pattern cursor out of catalog range")?;

        self.state.cursor = (self.state.cursor + 1) % self.catalog.len();
        self.state.counter = (self.state.counter + 1) % 9;

        Ok((frames, DisplayState::from_counter(self.state.counter)))
    }

    /// Run the playback loop: sleep one interval, transmit one pattern,
    /// repeat until the running flag clears. A failed write terminates the
    /// loop; a partial frame would desynchronize the receiver's 4-byte
    /// boundary and the protocol has no resync marker.
    pub fn run<W: Write>(&mut self, port: &mut W, tick_interval: Duration) -> Result<()> {
        while self.running.load(Ordering::Relaxed) {
            thread::sleep(tick_interval);

            // Re-check so a Ctrl-C during the sleep does not trigger one
            // more transmission.
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            let pattern_id = self.state.cursor;
            let (frames, state) = self.tick()?;
            transmit(port, &frames)?;

            if self.debug {
                println!(
                    "Sent {} ({:?})",
                    self.catalog.name(pattern_id).unwrap_or("?"),
                    state
                );
            }
        }

        Ok(())
    }

    /// Best-effort blanking on exit - a zeroed header and body park the
    /// projector.
    pub fn shutdown<W: Write>(&self, port: &mut W) {
        let _ = port.write_all(&BLANK_FRAME);
        let _ = port.write_all(&BLANK_FRAME);
        let _ = port.flush();
    }
}

/// Write one pattern as two discrete 4-byte frames, header first.
fn transmit<W: Write>(port: &mut W, frames: &EncodedPattern) -> Result<()> {
    port.write_all(&frames.header)
        .context("Failed to write header frame")?;
    port.write_all(&frames.body)
        .context("Failed to write body frame")?;
    port.flush().context("Failed to flush serial port")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternDef, PatternEntry};

    fn catalog(size: usize) -> Catalog {
        let patterns = (0..size)
            .map(|i| PatternDef {
                name: format!("pattern-{}", i),
                entries: vec![PatternEntry::Active; i + 1],
            })
            .collect();

        Catalog::build(patterns).unwrap()
    }

    #[test]
    fn test_cursor_wraps_after_full_cycle() {
        let mut scheduler = Scheduler::new(catalog(3), false);

        let first: Vec<EncodedPattern> =
            (0..3).map(|_| scheduler.tick().unwrap().0).collect();
        let second: Vec<EncodedPattern> =
            (0..3).map(|_| scheduler.tick().unwrap().0).collect();

        // Distinct patterns cycled, and the cursor is back at the start.
        assert_ne!(first[0], first[1]);
        assert_eq!(first, second);
        assert_eq!(0, scheduler.state.cursor);
    }

    #[test]
    fn test_counter_period_is_nine() {
        let mut scheduler = Scheduler::new(catalog(2), false);

        let states: Vec<DisplayState> =
            (0..9).map(|_| scheduler.tick().unwrap().1).collect();

        assert_eq!(
            vec![
                DisplayState::Ramp,
                DisplayState::Ramp,
                DisplayState::Hold,
                DisplayState::Hold,
                DisplayState::Hold,
                DisplayState::Fade,
                DisplayState::Fade,
                DisplayState::Fade,
                DisplayState::Ramp,
            ],
            states
        );
        assert_eq!(0, scheduler.state.counter);
    }

    #[test]
    fn test_display_state_bands() {
        assert_eq!(DisplayState::Ramp, DisplayState::from_counter(0));
        assert_eq!(DisplayState::Ramp, DisplayState::from_counter(2));
        assert_eq!(DisplayState::Hold, DisplayState::from_counter(3));
        assert_eq!(DisplayState::Hold, DisplayState::from_counter(5));
        assert_eq!(DisplayState::Fade, DisplayState::from_counter(6));
        assert_eq!(DisplayState::Fade, DisplayState::from_counter(8));
    }

    #[test]
    fn test_transmit_writes_header_then_body() {
        let frames = EncodedPattern {
            header: [0xF0, 0x14, 0x20, 0x01],
            body: [0x00, 0x03, 0x80, 0x01],
        };

        let mut wire = Vec::new();
        transmit(&mut wire, &frames).unwrap();

        assert_eq!(
            vec![0xF0, 0x14, 0x20, 0x01, 0x00, 0x03, 0x80, 0x01],
            wire
        );
    }

    #[test]
    fn test_run_exits_without_writing_when_stopped() {
        let mut scheduler = Scheduler::new(catalog(1), false);
        scheduler
            .get_running_flag()
            .store(false, Ordering::Relaxed);

        let mut wire = Vec::new();
        scheduler
            .run(&mut wire, Duration::from_millis(0))
            .unwrap();

        assert!(wire.is_empty());
    }

    #[test]
    fn test_shutdown_blanks_both_frames() {
        let scheduler = Scheduler::new(catalog(1), false);

        let mut wire = Vec::new();
        scheduler.shutdown(&mut wire);

        assert_eq!(vec![0u8; 8], wire);
    }
}
