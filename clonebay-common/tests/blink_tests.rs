// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the LED blink scheduler.

use clonebay_common::blink::{
    startup_frames, toggle_ticks, BlinkScheduler, DATA_REROLL_TICKS, FAST_TOGGLE_TICKS,
    SLOW_TOGGLE_TICKS,
};
use clonebay_common::{LedMode, SLOT_COUNT};

fn uniform(mode: LedMode) -> [LedMode; SLOT_COUNT] {
    [mode; SLOT_COUNT]
}

/// Lamp state of `slot` over `ticks` ticks with fixed modes.
fn trace(modes: &[LedMode; SLOT_COUNT], slot: usize, ticks: usize) -> Vec<bool> {
    let mut scheduler = BlinkScheduler::new();
    (0..ticks)
        .map(|_| scheduler.tick(modes) & (1 << slot) != 0)
        .collect()
}

/// Tick distances between consecutive level changes.
fn toggle_gaps(levels: &[bool]) -> Vec<usize> {
    let edges: Vec<usize> = levels
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1])
        .map(|(i, _)| i + 1)
        .collect();
    edges.windows(2).map(|w| w[1] - w[0]).collect()
}

// =============================================================================
// Steady modes
// =============================================================================

#[test]
fn test_off_and_on_are_steady() {
    let mut scheduler = BlinkScheduler::new();
    for _ in 0..500 {
        assert_eq!(scheduler.tick(&uniform(LedMode::Off)), 0x0000);
    }
    let mut scheduler = BlinkScheduler::new();
    for _ in 0..500 {
        assert_eq!(scheduler.tick(&uniform(LedMode::On)), 0xFFFF);
    }
}

#[test]
fn test_frame_bit_per_slot() {
    let mut modes = uniform(LedMode::Off);
    modes[0] = LedMode::On;
    modes[9] = LedMode::On;
    let mut scheduler = BlinkScheduler::new();
    assert_eq!(scheduler.tick(&modes), (1 << 0) | (1 << 9));
}

// =============================================================================
// Blink rates
// =============================================================================

#[test]
fn test_fast_blink_toggle_interval() {
    let levels = trace(&uniform(LedMode::FastBlink), 3, 200);
    let gaps = toggle_gaps(&levels);
    assert!(!gaps.is_empty());
    assert!(gaps.iter().all(|&g| g == FAST_TOGGLE_TICKS as usize));
}

#[test]
fn test_slow_blink_toggle_interval() {
    let levels = trace(&uniform(LedMode::SlowBlink), 7, 1000);
    let gaps = toggle_gaps(&levels);
    assert!(!gaps.is_empty());
    assert!(gaps.iter().all(|&g| g == SLOW_TOGGLE_TICKS as usize));
}

#[test]
fn test_slow_is_at_least_three_times_slower_than_fast() {
    let slow = toggle_ticks(LedMode::SlowBlink).unwrap();
    let fast = toggle_ticks(LedMode::FastBlink).unwrap();
    assert!(slow >= 3 * fast);

    let mut modes = uniform(LedMode::Off);
    modes[1] = LedMode::SlowBlink;
    modes[2] = LedMode::FastBlink;
    let mut scheduler = BlinkScheduler::new();
    let frames: Vec<u16> = (0..1000).map(|_| scheduler.tick(&modes)).collect();

    let count = |slot: usize| {
        frames
            .windows(2)
            .filter(|w| (w[0] ^ w[1]) & (1 << slot) != 0)
            .count()
    };
    assert!(count(2) >= 3 * count(1));
}

#[test]
fn test_blink_starts_lit_after_mode_change() {
    let mut scheduler = BlinkScheduler::new();
    let mut modes = uniform(LedMode::Off);
    for _ in 0..37 {
        scheduler.tick(&modes);
    }
    modes[5] = LedMode::SlowBlink;
    assert_ne!(scheduler.tick(&modes) & (1 << 5), 0);
    modes[5] = LedMode::FastBlink;
    assert_ne!(scheduler.tick(&modes) & (1 << 5), 0);
}

#[test]
fn test_steady_modes_have_no_toggle_interval() {
    assert_eq!(toggle_ticks(LedMode::Off), None);
    assert_eq!(toggle_ticks(LedMode::On), None);
    assert_eq!(toggle_ticks(LedMode::DataActivity), None);
}

// =============================================================================
// Data activity
// =============================================================================

#[test]
fn test_data_activity_flickers() {
    let levels = trace(&uniform(LedMode::DataActivity), 0, 2000);
    let lit = levels.iter().filter(|&&on| on).count();
    assert!(lit > 0 && lit < levels.len());
}

#[test]
fn test_data_activity_holds_between_rerolls() {
    let levels = trace(&uniform(LedMode::DataActivity), 4, 500);
    for chunk in levels.chunks(DATA_REROLL_TICKS as usize) {
        assert!(chunk.iter().all(|&on| on == chunk[0]));
    }
}

#[test]
fn test_zero_seed_still_flickers() {
    let mut scheduler = BlinkScheduler::with_seed(0);
    let frames: Vec<u16> = (0..500)
        .map(|_| scheduler.tick(&uniform(LedMode::DataActivity)))
        .collect();
    assert!(frames.iter().any(|&f| f != 0));
    assert!(frames.iter().any(|&f| f != 0xFFFF));
}

// =============================================================================
// Startup animation
// =============================================================================

#[test]
fn test_startup_frames_fill_then_drain() {
    let frames: Vec<u16> = startup_frames().collect();
    assert_eq!(frames.len(), 2 * SLOT_COUNT);
    assert_eq!(frames[0], 0x0001);
    assert_eq!(frames[1], 0x0003);
    assert_eq!(frames[SLOT_COUNT - 1], 0xFFFF);
    assert_eq!(frames[SLOT_COUNT], 0xFFFE);
    assert_eq!(*frames.last().unwrap(), 0x0000);
}
