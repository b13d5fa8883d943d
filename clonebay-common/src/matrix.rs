// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Driver for the two daisy-chained 74HC595 shift registers behind the
//! slot LEDs.
//!
//! Bits are shifted MSB first, so slot 15 ends up in the far register and
//! slot 0 in the near one. Nothing becomes visible until the latch pulse,
//! which moves the whole frame to the outputs at once.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ClonerError;

/// Number of outputs in the chain.
pub const CHAIN_BITS: u32 = 16;

pub struct LedMatrix<P> {
    clock: P,
    latch: P,
    data: P,
    active_low: bool,
}

impl<P: OutputPin> LedMatrix<P> {
    /// `active_low` inverts the frame for LEDs wired to sink current.
    pub fn new(clock: P, latch: P, data: P, active_low: bool) -> Self {
        Self {
            clock,
            latch,
            data,
            active_low,
        }
    }

    /// Shift a frame into the chain and latch it (bit n lights slot n).
    pub fn render(&mut self, frame: u16) -> Result<(), ClonerError> {
        let bits = if self.active_low { !frame } else { frame };

        for bit in (0..CHAIN_BITS).rev() {
            let level = PinState::from((bits >> bit) & 1 != 0);
            self.data.set_state(level).map_err(|_| ClonerError::GpioFault)?;
            pulse(&mut self.clock)?;
        }

        pulse(&mut self.latch)
    }
}

fn pulse(pin: &mut impl OutputPin) -> Result<(), ClonerError> {
    pin.set_high().map_err(|_| ClonerError::GpioFault)?;
    pin.set_low().map_err(|_| ClonerError::GpioFault)
}
