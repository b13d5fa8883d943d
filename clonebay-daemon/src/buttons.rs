// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Button polling thread.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embedded_hal::digital::InputPin;
use log::{debug, info};

use clonebay_common::debounce::POLL_INTERVAL_MS;
use clonebay_common::{ButtonEvent, ButtonInput, ClonerError};

/// Message from a worker thread to the main loop.
#[derive(Debug)]
pub enum Event {
    /// A press accepted while idle. The busy flag is already set.
    Pressed(ButtonEvent),
    /// A worker thread lost access to its pins and stopped.
    Fault(&'static str, ClonerError),
    /// SIGINT or SIGTERM received.
    Shutdown,
}

/// Start sampling the CHECK and WRITE lines.
///
/// A press is only forwarded if it wins the busy flag; presses arriving
/// while a workflow runs are dropped here. The main loop clears the flag
/// once the workflow is over. A failed pin read raises `cancel` and ends
/// the thread.
pub fn spawn_poller<C, W>(
    mut buttons: ButtonInput<C, W>,
    busy: Arc<AtomicBool>,
    events: SyncSender<Event>,
    cancel: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    C: InputPin + Send + 'static,
    W: InputPin + Send + 'static,
{
    thread::Builder::new()
        .name("buttons".into())
        .spawn(move || {
            let start = Instant::now();
            let period = Duration::from_millis(POLL_INTERVAL_MS);

            loop {
                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let pressed = match buttons.poll(now_ms) {
                    Ok(pressed) => pressed,
                    Err(e) => {
                        cancel.store(true, Ordering::Release);
                        let _ = events.send(Event::Fault("button poll", e));
                        return;
                    }
                };

                for event in pressed.into_iter().flatten() {
                    if !dispatch(event, &busy, &events) {
                        debug!("Event loop gone, button thread exiting");
                        return;
                    }
                }

                thread::sleep(period);
            }
        })
}

/// Returns `false` once the receiving side has hung up.
fn dispatch(event: ButtonEvent, busy: &AtomicBool, events: &SyncSender<Event>) -> bool {
    if busy
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        info!("{:?} pressed while busy, ignored", event);
        return true;
    }

    info!("{:?} pressed", event);
    events.send(Event::Pressed(event)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{sync_channel, TryRecvError};

    #[test]
    fn test_press_while_idle_is_forwarded() {
        let busy = AtomicBool::new(false);
        let (tx, rx) = sync_channel(1);

        assert!(dispatch(ButtonEvent::Check, &busy, &tx));
        assert!(busy.load(Ordering::Acquire));
        assert!(matches!(
            rx.try_recv(),
            Ok(Event::Pressed(ButtonEvent::Check))
        ));
    }

    #[test]
    fn test_press_while_busy_is_dropped() {
        let busy = AtomicBool::new(true);
        let (tx, rx) = sync_channel(1);

        assert!(dispatch(ButtonEvent::Write, &busy, &tx));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_second_press_in_same_sample_is_dropped() {
        let busy = AtomicBool::new(false);
        let (tx, rx) = sync_channel(1);

        dispatch(ButtonEvent::Check, &busy, &tx);
        dispatch(ButtonEvent::Write, &busy, &tx);
        assert!(matches!(
            rx.try_recv(),
            Ok(Event::Pressed(ButtonEvent::Check))
        ));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_hung_up_receiver_stops_dispatch() {
        let busy = AtomicBool::new(false);
        let (tx, rx) = sync_channel(1);
        drop(rx);

        assert!(!dispatch(ButtonEvent::Check, &busy, &tx));
    }
}
