// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Button debouncing - pure state machine plus a two-button driver.
//!
//! The state machine works on sampled levels and a caller-supplied
//! millisecond clock, so it can be exercised without hardware. A level
//! change is accepted only after it has been stable for the debounce
//! interval; a confirmed press fires exactly once and the button must be
//! stably released before it can fire again.

use embedded_hal::digital::InputPin;

use crate::error::ClonerError;

/// Minimum stable time before a level change is accepted.
pub const DEBOUNCE_MS: u64 = 75;

/// Sampling period of the button lines.
pub const POLL_INTERVAL_MS: u64 = 20;

/// A confirmed press of one of the two front-panel buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Scan all slots against the reference.
    Check,
    /// Read the reference and clone it to every matching slot.
    Write,
}

/// Debounce states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// Stably released.
    Idle,
    /// Pressed level seen, waiting for it to hold.
    PressPending { since: u64 },
    /// Press accepted (event already emitted).
    PressConfirmed,
    /// Released level seen after a press, waiting for it to hold.
    ReleasePending { since: u64 },
}

/// Debouncer for one active-low button line.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    state: DebounceState,
    stable_ms: u64,
}

impl Debouncer {
    pub const fn new(stable_ms: u64) -> Self {
        Self {
            state: DebounceState::Idle,
            stable_ms,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one sample. Returns `true` when a press is confirmed.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> bool {
        use DebounceState::*;

        let held = |since: u64| now_ms.saturating_sub(since) >= self.stable_ms;

        let (next, fired) = match (self.state, pressed) {
            (Idle, false) => (Idle, false),
            (Idle, true) => (PressPending { since: now_ms }, false),
            (PressPending { .. }, false) => (Idle, false),
            (PressPending { since }, true) if held(since) => (PressConfirmed, true),
            (state @ PressPending { .. }, true) => (state, false),
            (PressConfirmed, true) => (PressConfirmed, false),
            (PressConfirmed, false) => (ReleasePending { since: now_ms }, false),
            (ReleasePending { .. }, true) => (PressConfirmed, false),
            (ReleasePending { since }, false) if held(since) => (Idle, false),
            (state @ ReleasePending { .. }, false) => (state, false),
        };

        self.state = next;
        fired
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

/// CHECK and WRITE buttons (active-low, pulled up).
pub struct ButtonInput<C, W> {
    check: C,
    write: W,
    check_state: Debouncer,
    write_state: Debouncer,
}

impl<C: InputPin, W: InputPin> ButtonInput<C, W> {
    pub fn new(check: C, write: W) -> Self {
        Self {
            check,
            write,
            check_state: Debouncer::default(),
            write_state: Debouncer::default(),
        }
    }

    /// Sample both lines once and return the confirmed presses, CHECK first.
    pub fn poll(&mut self, now_ms: u64) -> Result<[Option<ButtonEvent>; 2], ClonerError> {
        let check = self.check.is_low().map_err(|_| ClonerError::GpioFault)?;
        let write = self.write.is_low().map_err(|_| ClonerError::GpioFault)?;

        Ok([
            self.check_state
                .update(check, now_ms)
                .then_some(ButtonEvent::Check),
            self.write_state
                .update(write, now_ms)
                .then_some(ButtonEvent::Write),
        ])
    }
}
