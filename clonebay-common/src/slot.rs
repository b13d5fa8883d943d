// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Per-slot status model and LED mode derivation.
//!
//! A slot's LED is never set directly. Workflows record what they learned
//! about the chip (presence, size match, last operation) and what they are
//! doing with it right now ([`Activity`]); [`SlotState::led_mode`] turns
//! that into the lamp pattern.

use core::fmt;

use crate::error::ClonerError;

/// Number of physical slots on the carrier.
pub const SLOT_COUNT: usize = 16;

/// Slot holding the chip whose content is cloned.
pub const REFERENCE_SLOT: SlotIndex = SlotIndex(0);

/// Validated slot number (0..=15).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Build a slot index, rejecting anything the demultiplexer cannot address.
    pub const fn new(index: u8) -> Result<Self, ClonerError> {
        if (index as usize) < SLOT_COUNT {
            Ok(Self(index))
        } else {
            Err(ClonerError::AddressOutOfRange)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub const fn is_reference(self) -> bool {
        self.0 == REFERENCE_SLOT.0
    }

    /// Demultiplexer address lines A0..A3 (A0 = LSB).
    pub const fn address_bits(self) -> [bool; 4] {
        [
            self.0 & 0b0001 != 0,
            self.0 & 0b0010 != 0,
            self.0 & 0b0100 != 0,
            self.0 & 0b1000 != 0,
        ]
    }

    /// All slots, reference first.
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..SLOT_COUNT as u8).map(SlotIndex)
    }

    /// Target slots 1..=15.
    pub fn targets() -> impl Iterator<Item = SlotIndex> {
        (1..SLOT_COUNT as u8).map(SlotIndex)
    }
}

impl TryFrom<u8> for SlotIndex {
    type Error = ClonerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Whether a chip answered on the slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Presence {
    /// Not probed since the last reset.
    #[default]
    Unprobed,
    Absent,
    Present,
}

/// Size comparison against the reference chip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMatch {
    #[default]
    Unknown,
    Match,
    Mismatch,
}

impl SizeMatch {
    /// Compare a detected size against the reference size.
    pub fn classify(size: Option<u32>, reference: Option<u32>) -> Self {
        match (size, reference) {
            (Some(size), Some(reference)) if size == reference => SizeMatch::Match,
            (Some(_), Some(_)) => SizeMatch::Mismatch,
            _ => SizeMatch::Unknown,
        }
    }
}

/// Outcome of the last read/write/verify on the slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpResult {
    #[default]
    None,
    Success,
    VerifyFailed,
    ReadFailed,
    WriteFailed,
}

impl OpResult {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            OpResult::VerifyFailed | OpResult::ReadFailed | OpResult::WriteFailed
        )
    }

    /// Error kind recorded by a failed operation.
    pub fn error(self) -> Option<ClonerError> {
        match self {
            OpResult::VerifyFailed => Some(ClonerError::VerifyFailure),
            OpResult::ReadFailed => Some(ClonerError::ReadFailure),
            OpResult::WriteFailed => Some(ClonerError::WriteFailure),
            OpResult::None | OpResult::Success => None,
        }
    }
}

/// What the running workflow is doing with the slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    /// Waiting for its turn in the clone loop.
    Queued,
    /// Chip I/O in progress.
    InFlight,
}

/// Visual state of one slot LED.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LedMode {
    #[default]
    Off,
    On,
    SlowBlink,
    FastBlink,
    DataActivity,
}

/// Everything known about one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotState {
    pub index: SlotIndex,
    pub presence: Presence,
    pub size_match: SizeMatch,
    pub last_op: OpResult,
    pub activity: Activity,
    /// Detected chip size in bytes, when the probe reported one.
    pub size: Option<u32>,
}

impl SlotState {
    pub const fn new(index: SlotIndex) -> Self {
        Self {
            index,
            presence: Presence::Unprobed,
            size_match: SizeMatch::Unknown,
            last_op: OpResult::None,
            activity: Activity::Idle,
            size: None,
        }
    }

    /// Record a probe that found no chip.
    pub fn mark_absent(&mut self) {
        *self = Self {
            presence: Presence::Absent,
            ..Self::new(self.index)
        };
    }

    /// Record a probe that found a chip, or could not tell (`size = None`).
    pub fn mark_present(&mut self, size: Option<u32>, reference: Option<u32>) {
        *self = Self {
            presence: Presence::Present,
            size_match: SizeMatch::classify(size, reference),
            size,
            ..Self::new(self.index)
        };
    }

    /// Close an operation and record its outcome.
    pub fn finish(&mut self, result: OpResult) {
        self.activity = Activity::Idle;
        self.last_op = result;
    }

    /// Eligible for the clone loop.
    pub fn is_clone_target(&self) -> bool {
        !self.index.is_reference()
            && self.presence == Presence::Present
            && self.size_match == SizeMatch::Match
    }

    /// LED pattern for the current state.
    ///
    /// Targets: slow blink = ready, fast blink = needs attention, on = cloned
    /// and verified, off = empty. The reference slot shows on when usable and
    /// fast blink when missing or unreadable.
    pub fn led_mode(&self) -> LedMode {
        match self.activity {
            Activity::InFlight => return LedMode::DataActivity,
            Activity::Queued => return LedMode::Off,
            Activity::Idle => {}
        }

        if self.last_op == OpResult::Success {
            return LedMode::On;
        }
        if self.last_op.is_failure() {
            return LedMode::FastBlink;
        }

        let reference = self.index.is_reference();
        match (self.presence, self.size_match) {
            (Presence::Unprobed, _) => LedMode::Off,
            (Presence::Absent, _) if reference => LedMode::FastBlink,
            (Presence::Absent, _) => LedMode::Off,
            (Presence::Present, SizeMatch::Match) if reference => LedMode::On,
            (Presence::Present, SizeMatch::Match) => LedMode::SlowBlink,
            (Presence::Present, _) => LedMode::FastBlink,
        }
    }
}

/// Fresh, unprobed state for every slot.
pub fn fresh_slots() -> [SlotState; SLOT_COUNT] {
    core::array::from_fn(|i| SlotState::new(SlotIndex(i as u8)))
}

/// Byte count formatted the way flashrom reports chip sizes.
pub struct HumanSize(pub Option<u32>);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) if n >= 1024 * 1024 => write!(f, "{} MiB", n / (1024 * 1024)),
            Some(n) if n >= 1024 => write!(f, "{} KiB", n / 1024),
            Some(n) if n > 0 => write!(f, "{} B", n),
            _ => f.write_str("n/a"),
        }
    }
}
