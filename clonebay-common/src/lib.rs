// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and logic for the clonebay slot cloner.
//!
//! The carrier holds one reference chip (slot 0) and up to fifteen targets,
//! addressed one at a time through a 4-line demultiplexer, with one status
//! LED per slot behind two chained shift registers.
//!
//! This crate supports both `no_std` and `std` environments:
//! - Without `std`: slot model, blink scheduling, debouncing and the
//!   `embedded-hal` drivers for the address lines and the LED chain
//! - `std` feature (default): the shared slot board and the CHECK / WRITE
//!   workflows, which hold chip images in memory

#![cfg_attr(not(feature = "std"), no_std)]

pub mod blink;
pub mod debounce;
pub mod error;
pub mod hash;
pub mod matrix;
pub mod select;
pub mod slot;
pub mod speed;

#[cfg(feature = "std")]
pub mod board;
#[cfg(feature = "std")]
pub mod controller;

// Re-export commonly used types
pub use debounce::{ButtonEvent, ButtonInput};
pub use error::ClonerError;
pub use matrix::LedMatrix;
pub use select::{SlotAddresser, SlotSelect};
pub use slot::{LedMode, SlotIndex, SlotState, REFERENCE_SLOT, SLOT_COUNT};

#[cfg(feature = "std")]
pub use board::{slot_board, BoardReader, BoardWriter};
#[cfg(feature = "std")]
pub use controller::{Archiver, ChipInfo, Controller, FlashAdapter, FlashError, ReferenceImage};
