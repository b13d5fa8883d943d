// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Chip-select addressing through the CD74HC154 demultiplexer.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ClonerError;
use crate::slot::SlotIndex;

/// Settle time after changing the address, before any chip access.
pub const SETTLE_US: u32 = 1_000;

/// Anything that can route the SPI chip-select to one slot.
pub trait SlotSelect {
    /// Make `slot` the only active chip-select. Returns once the lines have
    /// settled and the chip may be accessed.
    fn select(&mut self, slot: SlotIndex) -> Result<(), ClonerError>;
}

/// Drives the four demux address lines A0..A3.
pub struct SlotAddresser<P, D> {
    lines: [P; 4],
    delay: D,
    current: Option<SlotIndex>,
}

impl<P: OutputPin, D: DelayNs> SlotAddresser<P, D> {
    /// `lines` are ordered A0 (LSB) to A3 (MSB).
    pub fn new(lines: [P; 4], delay: D) -> Self {
        Self {
            lines,
            delay,
            current: None,
        }
    }

    /// Slot currently addressed, if the lines are in a known state.
    pub fn current(&self) -> Option<SlotIndex> {
        self.current
    }
}

impl<P: OutputPin, D: DelayNs> SlotSelect for SlotAddresser<P, D> {
    fn select(&mut self, slot: SlotIndex) -> Result<(), ClonerError> {
        if self.current == Some(slot) {
            return Ok(());
        }

        // Unknown until every line has been driven.
        self.current = None;
        for (line, bit) in self.lines.iter_mut().zip(slot.address_bits()) {
            line.set_state(PinState::from(bit))
                .map_err(|_| ClonerError::GpioFault)?;
        }

        self.delay.delay_us(SETTLE_US);
        self.current = Some(slot);
        Ok(())
    }
}
