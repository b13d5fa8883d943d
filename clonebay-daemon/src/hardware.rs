// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! GPIO line assignment and acquisition.
//!
//! All lines are requested once at startup through the Linux GPIO
//! character device. A line that is already held by another process is a
//! startup failure; the daemon exits and the supervisor retries.
//!
//! Outputs go through `linux-embedded-hal`. Inputs are requested through
//! the v2 uAPI so the SoC pull-ups can be enabled: the buttons and DIP
//! switches only ever short their line to ground.

use anyhow::{anyhow, Context, Result};
use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin};
use gpio_cdev::{Chip, LineRequestFlags};
use gpiocdev::line::{Bias, Value};
use gpiocdev::Request;
use linux_embedded_hal::{CdevPin, Delay};

use clonebay_common::speed::dip_value;
use clonebay_common::{ButtonInput, ClonerError, LedMatrix, SlotAddresser};

/// Shift register clock (BCM numbering).
pub const PIN_CLOCK: u32 = 2;
/// Shift register storage latch.
pub const PIN_LATCH: u32 = 3;
/// Shift register serial data.
pub const PIN_DATA: u32 = 4;

pub const PIN_CHECK: u32 = 5;
pub const PIN_WRITE: u32 = 6;

/// Demultiplexer address lines A0..A3 (A0 = LSB).
pub const PIN_ADDRESS: [u32; 4] = [22, 23, 24, 25];

/// Speed DIP switches DIP1..DIP4 (DIP1 = bit 0), active-low.
pub const PIN_DIP: [u32; 4] = [16, 19, 20, 21];

/// Bias on every input line.
pub const INPUT_BIAS: Bias = Bias::PullUp;

const CONSUMER: &str = "clonebay";

pub type Leds = LedMatrix<CdevPin>;
pub type Addresser = SlotAddresser<CdevPin, Delay>;
pub type Buttons = ButtonInput<PulledUpInput, PulledUpInput>;

/// Every peripheral the daemon drives, ready to be handed to its thread.
pub struct Hardware {
    pub leds: Leds,
    pub addresser: Addresser,
    pub buttons: Buttons,
    /// DIP switch value sampled at startup (0..=15).
    pub dip: u8,
}

impl Hardware {
    /// Open the GPIO chip and request every line.
    pub fn open(path: &str, active_low_leds: bool) -> Result<Self> {
        let mut chip =
            Chip::new(path).with_context(|| format!("Failed to open GPIO chip {}", path))?;

        let leds = LedMatrix::new(
            output(&mut chip, PIN_CLOCK)?,
            output(&mut chip, PIN_LATCH)?,
            output(&mut chip, PIN_DATA)?,
            active_low_leds,
        );

        let addresser = SlotAddresser::new(
            [
                output(&mut chip, PIN_ADDRESS[0])?,
                output(&mut chip, PIN_ADDRESS[1])?,
                output(&mut chip, PIN_ADDRESS[2])?,
                output(&mut chip, PIN_ADDRESS[3])?,
            ],
            Delay,
        );

        let buttons = ButtonInput::new(input(path, PIN_CHECK)?, input(path, PIN_WRITE)?);

        // Released again once read.
        let dip = read_switches([
            input(path, PIN_DIP[0])?,
            input(path, PIN_DIP[1])?,
            input(path, PIN_DIP[2])?,
            input(path, PIN_DIP[3])?,
        ])?;

        Ok(Self {
            leds,
            addresser,
            buttons,
            dip,
        })
    }
}

/// Sample the DIP switches. A closed switch pulls its line low.
fn read_switches<I: InputPin>(lines: [I; 4]) -> Result<u8> {
    let mut switches = [false; 4];
    for (n, (closed, mut line)) in switches.iter_mut().zip(lines).enumerate() {
        *closed = line
            .is_low()
            .map_err(|e| anyhow!("Failed to read DIP{}: {:?}", n + 1, e))?;
    }
    Ok(dip_value(switches))
}

/// Input line requested with [`INPUT_BIAS`].
pub struct PulledUpInput {
    request: Request,
    offset: u32,
}

/// Failed read of a [`PulledUpInput`].
#[derive(Debug)]
pub struct LineError(gpiocdev::Error);

impl Error for LineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for PulledUpInput {
    type Error = LineError;
}

impl InputPin for PulledUpInput {
    fn is_high(&mut self) -> Result<bool, LineError> {
        self.request
            .value(self.offset)
            .map(|value| !is_low_level(value))
            .map_err(LineError)
    }

    fn is_low(&mut self) -> Result<bool, LineError> {
        self.is_high().map(|high| !high)
    }
}

/// Lines are requested active-high, so `Inactive` is the physical low level.
fn is_low_level(value: Value) -> bool {
    value == Value::Inactive
}

fn output(chip: &mut Chip, offset: u32) -> Result<CdevPin> {
    request(chip, offset, LineRequestFlags::OUTPUT)
}

fn input(path: &str, offset: u32) -> Result<PulledUpInput> {
    let request = Request::builder()
        .on_chip(path)
        .with_consumer(CONSUMER)
        .with_line(offset)
        .as_input()
        .with_bias(INPUT_BIAS)
        .request()
        .with_context(|| format!("GPIO line {}: {}", offset, ClonerError::ResourceBusy))?;
    Ok(PulledUpInput { request, offset })
}

fn request(chip: &mut Chip, offset: u32, flags: LineRequestFlags) -> Result<CdevPin> {
    let handle = chip
        .get_line(offset)
        .and_then(|line| line.request(flags, 0, CONSUMER))
        .with_context(|| format!("GPIO line {}: {}", offset, ClonerError::ResourceBusy))?;
    CdevPin::new(handle).with_context(|| format!("GPIO line {}: unusable handle", offset))
}
