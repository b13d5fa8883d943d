// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! LED refresh thread.
//!
//! Owns the shift-register chain for the lifetime of the process and
//! repaints it every tick from the board snapshot, independent of whatever
//! blocking chip I/O the controller is doing.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;
use log::warn;

use clonebay_common::blink::{startup_frames, BlinkScheduler, STARTUP_STEP_MS, TICK_MS};
use clonebay_common::{BoardReader, ClonerError, LedMatrix};

use crate::buttons::Event;

/// Chase animation shown once at startup, ending dark.
pub fn play_startup<P: OutputPin>(leds: &mut LedMatrix<P>) -> Result<(), ClonerError> {
    let step = Duration::from_millis(STARTUP_STEP_MS.into());
    for frame in startup_frames() {
        leds.render(frame)?;
        thread::sleep(step);
    }
    leds.render(0)
}

/// Handle on the running refresh thread.
pub struct Refresh {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Refresh {
    /// Blank the chain and wait for the thread to end.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Release);
        if self.thread.join().is_err() {
            warn!("LED thread panicked");
        }
    }
}

/// Start the refresh loop.
///
/// A failed render raises `cancel`, is reported once as a fault and ends
/// the thread.
pub fn spawn_refresh<P>(
    mut leds: LedMatrix<P>,
    board: BoardReader,
    faults: SyncSender<Event>,
    cancel: Arc<AtomicBool>,
) -> io::Result<Refresh>
where
    P: OutputPin + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let stopping = Arc::clone(&stop);

    let thread = thread::Builder::new().name("leds".into()).spawn(move || {
        let tick = Duration::from_millis(TICK_MS.into());
        let mut scheduler = BlinkScheduler::new();
        let mut deadline = Instant::now();

        loop {
            if stopping.load(Ordering::Acquire) {
                if let Err(e) = leds.render(0) {
                    warn!("Could not blank LEDs: {}", e);
                }
                return;
            }

            let frame = scheduler.tick(&board.led_modes());
            if let Err(e) = leds.render(frame) {
                // Last attempt at leaving the lamps dark.
                let _ = leds.render(0);
                cancel.store(true, Ordering::Release);
                let _ = faults.send(Event::Fault("LED refresh", e));
                return;
            }

            deadline += tick;
            let now = Instant::now();
            match deadline.checked_duration_since(now) {
                Some(wait) => thread::sleep(wait),
                None => {
                    // Fell behind (scheduler stall); restart the cadence.
                    if now - deadline > tick * 10 {
                        warn!("LED refresh late by {:?}", now - deadline);
                    }
                    deadline = now;
                }
            }
        }
    })?;

    Ok(Refresh { stop, thread })
}
