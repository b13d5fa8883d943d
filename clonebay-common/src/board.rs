// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared slot board: one writer (the controller), any number of readers
//! (LED refresh, status reporting).
//!
//! The sixteen [`SlotState`] records sit behind a single mutex that is held
//! only for the copy in or out, never across chip I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::slot::{fresh_slots, LedMode, SlotIndex, SlotState, SLOT_COUNT};

type Slots = [SlotState; SLOT_COUNT];

/// Create a board with every slot unprobed.
pub fn slot_board() -> (BoardWriter, BoardReader) {
    let shared = Arc::new(Mutex::new(fresh_slots()));
    (
        BoardWriter {
            shared: Arc::clone(&shared),
        },
        BoardReader { shared },
    )
}

fn lock(shared: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    // Slot records are plain data; a panicked writer leaves them usable.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive write access to the board. Not `Clone`.
pub struct BoardWriter {
    shared: Arc<Mutex<Slots>>,
}

impl BoardWriter {
    /// Mutate one slot and return whatever the closure returns.
    pub fn update<R>(&mut self, slot: SlotIndex, f: impl FnOnce(&mut SlotState) -> R) -> R {
        f(&mut lock(&self.shared)[slot.as_usize()])
    }

    /// Forget everything learned about every slot.
    pub fn reset(&mut self) {
        *lock(&self.shared) = fresh_slots();
    }

    pub fn get(&self, slot: SlotIndex) -> SlotState {
        lock(&self.shared)[slot.as_usize()]
    }
}

/// Read-only view of the board.
#[derive(Clone)]
pub struct BoardReader {
    shared: Arc<Mutex<Slots>>,
}

impl BoardReader {
    pub fn snapshot(&self) -> [SlotState; SLOT_COUNT] {
        *lock(&self.shared)
    }

    /// Current LED mode of every slot, taken from one consistent snapshot.
    pub fn led_modes(&self) -> [LedMode; SLOT_COUNT] {
        self.snapshot().map(|slot| slot.led_mode())
    }
}
