// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the button debounce state machine.

use clonebay_common::debounce::{DebounceState, Debouncer, DEBOUNCE_MS, POLL_INTERVAL_MS};

/// Feed `(pressed, now_ms)` samples and count emitted presses.
fn presses(debouncer: &mut Debouncer, samples: &[(bool, u64)]) -> usize {
    samples
        .iter()
        .filter(|&&(pressed, now)| debouncer.update(pressed, now))
        .count()
}

/// A level held for `duration` ms, sampled every poll interval from `start`.
fn hold(pressed: bool, start: u64, duration: u64) -> Vec<(bool, u64)> {
    (0..=duration / POLL_INTERVAL_MS)
        .map(|i| (pressed, start + i * POLL_INTERVAL_MS))
        .collect()
}

// =============================================================================
// Clean presses
// =============================================================================

#[test]
fn test_clean_press_fires_once() {
    let mut d = Debouncer::default();
    let mut samples = hold(true, 0, 500);
    samples.extend(hold(false, 520, 200));
    assert_eq!(presses(&mut d, &samples), 1);
    assert_eq!(d.state(), DebounceState::Idle);
}

#[test]
fn test_press_confirms_after_stable_interval() {
    let mut d = Debouncer::new(DEBOUNCE_MS);
    assert!(!d.update(true, 1000));
    assert!(!d.update(true, 1000 + DEBOUNCE_MS - 1));
    assert!(d.update(true, 1000 + DEBOUNCE_MS));
    assert_eq!(d.state(), DebounceState::PressConfirmed);
}

#[test]
fn test_hold_does_not_repeat() {
    let mut d = Debouncer::default();
    assert_eq!(presses(&mut d, &hold(true, 0, 10_000)), 1);
}

#[test]
fn test_two_separate_presses_fire_twice() {
    let mut d = Debouncer::default();
    let mut samples = hold(true, 0, 200);
    samples.extend(hold(false, 220, 200));
    samples.extend(hold(true, 440, 200));
    assert_eq!(presses(&mut d, &samples), 2);
}

// =============================================================================
// Bounce rejection
// =============================================================================

#[test]
fn test_short_glitch_is_ignored() {
    let mut d = Debouncer::default();
    let samples = [(true, 0), (true, 20), (false, 40), (false, 60), (false, 200)];
    assert_eq!(presses(&mut d, &samples), 0);
    assert_eq!(d.state(), DebounceState::Idle);
}

#[test]
fn test_bounce_burst_yields_at_most_one_event() {
    let mut d = Debouncer::default();
    // Contact chatter every 5 ms for 60 ms, then settle pressed.
    let mut samples: Vec<(bool, u64)> = (0..12).map(|i| (i % 2 == 0, i * 5)).collect();
    samples.extend(hold(true, 60, 300));
    assert_eq!(presses(&mut d, &samples), 1);
}

#[test]
fn test_release_bounce_does_not_refire() {
    let mut d = Debouncer::default();
    let mut samples = hold(true, 0, 200);
    // Release with chatter: brief releases shorter than the debounce window.
    samples.extend([(false, 220), (true, 240), (false, 260), (true, 280)]);
    samples.extend(hold(true, 300, 100));
    assert_eq!(presses(&mut d, &samples), 1);
    assert_eq!(d.state(), DebounceState::PressConfirmed);
}

#[test]
fn test_release_must_be_stable_before_next_press() {
    let mut d = Debouncer::new(50);
    assert!(!d.update(true, 0));
    assert!(d.update(true, 50));
    assert!(!d.update(false, 60));
    assert!(matches!(d.state(), DebounceState::ReleasePending { since: 60 }));
    assert!(!d.update(false, 110));
    assert_eq!(d.state(), DebounceState::Idle);
}

#[test]
fn test_clock_going_backwards_does_not_fire() {
    let mut d = Debouncer::default();
    assert!(!d.update(true, 1000));
    assert!(!d.update(true, 10));
}
