// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! LED blink scheduling.
//!
//! The scheduler is ticked at a fixed rate by the refresh thread and turns
//! the per-slot [`LedMode`]s into one 16-bit lamp frame per tick. It keeps
//! only its own phase counters; slot modes are read fresh on every tick so
//! the lamps follow the slot board without any coupling to chip I/O.
//!
//! Timing at the 10 ms tick:
//! - fast blink toggles every [`FAST_TOGGLE_TICKS`] ticks (100 ms)
//! - slow blink toggles every [`SLOW_TOGGLE_TICKS`] ticks (1 s)
//! - data activity draws a new pseudo-random bit every [`DATA_REROLL_TICKS`] ticks

use crate::slot::{LedMode, SLOT_COUNT};

/// Refresh period of the LED chain.
pub const TICK_MS: u32 = 10;

/// Ticks between toggles in fast blink.
pub const FAST_TOGGLE_TICKS: u16 = 5;

/// Ticks between toggles in slow blink.
pub const SLOW_TOGGLE_TICKS: u16 = 100;

/// Ticks between new random bits in data-activity mode.
pub const DATA_REROLL_TICKS: u16 = 5;

/// Delay between startup animation frames.
pub const STARTUP_STEP_MS: u32 = 50;

const DEFAULT_SEED: u32 = 0x2545_F491;

// Fast and slow must stay visually distinct.
const _: () = assert!(SLOW_TOGGLE_TICKS >= 3 * FAST_TOGGLE_TICKS);

#[derive(Clone, Copy, Default)]
struct Channel {
    mode: LedMode,
    phase: u16,
    data_bit: bool,
}

/// Per-slot phase tracking for the LED chain.
pub struct BlinkScheduler {
    channels: [Channel; SLOT_COUNT],
    rng: u32,
}

impl BlinkScheduler {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Scheduler with a specific data-activity seed (zero is remapped).
    pub fn with_seed(seed: u32) -> Self {
        Self {
            channels: [Channel::default(); SLOT_COUNT],
            rng: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Advance one tick and return the lamp frame (bit n = slot n).
    ///
    /// A slot whose mode changed since the previous tick restarts its phase,
    /// so every blink begins with the lamp lit.
    pub fn tick(&mut self, modes: &[LedMode; SLOT_COUNT]) -> u16 {
        let rng = &mut self.rng;
        let mut frame = 0u16;

        for (slot, (channel, &mode)) in self.channels.iter_mut().zip(modes.iter()).enumerate() {
            if channel.mode != mode {
                *channel = Channel {
                    mode,
                    phase: 0,
                    data_bit: false,
                };
            }

            let lit = match mode {
                LedMode::Off => false,
                LedMode::On => true,
                LedMode::SlowBlink => channel.phase < SLOW_TOGGLE_TICKS,
                LedMode::FastBlink => channel.phase < FAST_TOGGLE_TICKS,
                LedMode::DataActivity => {
                    if channel.phase == 0 {
                        channel.data_bit = xorshift32(rng) & 1 != 0;
                    }
                    channel.data_bit
                }
            };

            channel.phase = (channel.phase + 1) % cycle_ticks(mode);

            if lit {
                frame |= 1 << slot;
            }
        }

        frame
    }
}

impl Default for BlinkScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks between on/off toggles for a steadily blinking mode.
pub fn toggle_ticks(mode: LedMode) -> Option<u16> {
    match mode {
        LedMode::SlowBlink => Some(SLOW_TOGGLE_TICKS),
        LedMode::FastBlink => Some(FAST_TOGGLE_TICKS),
        LedMode::Off | LedMode::On | LedMode::DataActivity => None,
    }
}

fn cycle_ticks(mode: LedMode) -> u16 {
    match mode {
        LedMode::Off | LedMode::On => 1,
        LedMode::SlowBlink => 2 * SLOW_TOGGLE_TICKS,
        LedMode::FastBlink => 2 * FAST_TOGGLE_TICKS,
        LedMode::DataActivity => DATA_REROLL_TICKS,
    }
}

fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

/// Boot animation: light slots 0..15 one by one, then extinguish them in
/// the same order. The last frame is all off.
pub fn startup_frames() -> impl Iterator<Item = u16> {
    let fill = (0..SLOT_COUNT as u32).map(|n| ((1u32 << (n + 1)) - 1) as u16);
    let drain = (0..SLOT_COUNT as u32).map(|n| (0xFFFFu32 << (n + 1)) as u16);
    fill.chain(drain)
}
