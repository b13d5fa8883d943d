// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error taxonomy shared by the workflows and the daemon.

use core::fmt;

/// Everything that can go wrong while driving the carrier.
///
/// The first five kinds are local to one slot: they end up in that slot's
/// [`OpResult`](crate::slot::OpResult) and LED, and the workflow moves on.
/// `Cancelled` ends the current run between two slots. The remaining kinds
/// mean the hardware can no longer be trusted and the process should exit
/// so the supervisor restarts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClonerError {
    NoChipDetected,
    SizeMismatch,
    ReadFailure,
    WriteFailure,
    VerifyFailure,
    /// The run was stopped between slots (shutdown or a failed worker).
    Cancelled,
    /// A GPIO line could not be acquired at startup.
    ResourceBusy,
    /// Slot index outside 0..=15.
    AddressOutOfRange,
    /// A pin access failed after startup.
    GpioFault,
}

impl ClonerError {
    /// Whether this error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClonerError::ResourceBusy | ClonerError::AddressOutOfRange | ClonerError::GpioFault
        )
    }
}

impl fmt::Display for ClonerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClonerError::NoChipDetected => "no chip detected",
            ClonerError::SizeMismatch => "chip size does not match the reference",
            ClonerError::ReadFailure => "read failed",
            ClonerError::WriteFailure => "write failed",
            ClonerError::VerifyFailure => "verify failed",
            ClonerError::Cancelled => "cancelled",
            ClonerError::ResourceBusy => "hardware line busy",
            ClonerError::AddressOutOfRange => "slot address out of range",
            ClonerError::GpioFault => "GPIO access failed",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ClonerError {}
