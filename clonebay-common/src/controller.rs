// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CHECK and WRITE workflows.
//!
//! The controller walks the slots strictly one at a time: select, settle,
//! then talk to the chip through the [`FlashAdapter`]. Every outcome is
//! written to the [`BoardWriter`], which is all the LED refresh thread ever
//! sees. A failure on one target is recorded on that slot and the loop
//! moves on. Only the reference slot or the cancel flag (checked before
//! each slot) can abort a workflow, and only hardware faults
//! ([`ClonerError::is_fatal`]) escape as process errors.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};

use crate::board::BoardWriter;
use crate::debounce::ButtonEvent;
use crate::error::ClonerError;
use crate::hash::content_hash;
use crate::select::SlotSelect;
use crate::slot::{
    Activity, HumanSize, OpResult, Presence, SizeMatch, SlotIndex, SlotState, REFERENCE_SLOT,
};

/// Chip identification returned by a probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChipInfo {
    pub name: String,
    /// Size in bytes, `None` when the probe could not tell.
    pub size: Option<u32>,
}

/// Failure talking to the flash tool.
#[derive(Debug)]
pub enum FlashError {
    /// The tool could not be started.
    Launch(String),
    /// The tool ran and reported failure.
    Exit { code: Option<i32> },
    /// Image file could not be read or written.
    Io(String),
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashError::Launch(msg) => write!(f, "could not launch flash tool: {}", msg),
            FlashError::Exit { code: Some(code) } => write!(f, "flash tool exited with {}", code),
            FlashError::Exit { code: None } => f.write_str("flash tool killed by signal"),
            FlashError::Io(msg) => write!(f, "image file error: {}", msg),
        }
    }
}

impl std::error::Error for FlashError {}

/// Content of the reference chip for one WRITE run. Immutable once read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceImage {
    bytes: Vec<u8>,
    hash: u64,
}

impl ReferenceImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let hash = content_hash(&bytes);
        Self { bytes, hash }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Image length as a chip size, saturating on absurd lengths.
    pub fn size(&self) -> u32 {
        u32::try_from(self.bytes.len()).unwrap_or(u32::MAX)
    }
}

/// Chip access for the currently selected slot.
///
/// Calls block for as long as the chip needs (seconds). `slot` is the slot
/// the controller has just selected; implementations use it for labelling.
pub trait FlashAdapter {
    /// Probe the chip. `Ok(None)` means nothing answered.
    fn detect(&mut self, slot: SlotIndex) -> Result<Option<ChipInfo>, FlashError>;

    fn read(&mut self, slot: SlotIndex) -> Result<Vec<u8>, FlashError>;

    fn write(&mut self, slot: SlotIndex, image: &ReferenceImage) -> Result<(), FlashError>;

    /// Re-read the chip and compare against `image`.
    fn verify(&mut self, slot: SlotIndex, image: &ReferenceImage) -> Result<bool, FlashError>;
}

/// Persistent store for reference images, keyed by content digest.
pub trait Archiver {
    fn store(&mut self, bytes: &[u8], hash: u64) -> io::Result<PathBuf>;
}

/// Result of a CHECK run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub reference_size: Option<u32>,
    pub matched: usize,
    pub mismatched: usize,
    pub empty: usize,
}

/// Result of a WRITE run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloneSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub archived: Option<PathBuf>,
}

enum Detection {
    Absent,
    Found(ChipInfo),
    Failed(FlashError),
}

impl Detection {
    fn size(&self) -> Option<u32> {
        match self {
            Detection::Found(chip) => chip.size,
            Detection::Absent | Detection::Failed(_) => None,
        }
    }
}

/// Slot orchestration over one carrier.
pub struct Controller<S, F, A> {
    selector: S,
    flash: F,
    archiver: A,
    board: BoardWriter,
    /// Reference size the target records were last classified against.
    classified_against: Option<u32>,
    cancel: Arc<AtomicBool>,
}

impl<S: SlotSelect, F: FlashAdapter, A: Archiver> Controller<S, F, A> {
    pub fn new(selector: S, flash: F, archiver: A, board: BoardWriter) -> Self {
        Self {
            selector,
            flash,
            archiver,
            board,
            classified_against: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the running workflow before its next slot.
    ///
    /// Once raised it stays raised: every later workflow stops at its first
    /// slot with [`ClonerError::Cancelled`].
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn slot(&self, slot: SlotIndex) -> SlotState {
        self.board.get(slot)
    }

    /// Leave the reference slot addressed while idle.
    pub fn park(&mut self) -> Result<(), ClonerError> {
        self.selector.select(REFERENCE_SLOT)
    }

    /// Run the workflow for a button press.
    ///
    /// Per-run aborts (missing or unreadable reference) are logged and
    /// swallowed; only fatal hardware errors are returned.
    pub fn handle(&mut self, event: ButtonEvent) -> Result<(), ClonerError> {
        let outcome = match event {
            ButtonEvent::Check => self.check().map(|summary| {
                info!(
                    "[scan] Done. ready={}, attention={}, empty={}",
                    summary.matched, summary.mismatched, summary.empty
                );
            }),
            ButtonEvent::Write => self.write().map(|summary| {
                info!(
                    "[clone] Done. ok={}, failed={}, skipped={}",
                    summary.succeeded, summary.failed, summary.skipped
                );
            }),
        };

        let parked = self.park();
        match outcome {
            Err(e) if !e.is_fatal() => {
                warn!("{:?} aborted: {}", event, e);
                parked
            }
            other => other.and(parked),
        }
    }

    /// CHECK: probe the reference, then classify every target against it.
    ///
    /// Stops after slot 0 when the reference is missing. A reference of
    /// unknown size is still scanned against, so nothing can match.
    pub fn check(&mut self) -> Result<ScanSummary, ClonerError> {
        self.board.reset();
        self.classified_against = None;

        info!("[scan] Probing source slot {}...", REFERENCE_SLOT);
        let source = self.probe(REFERENCE_SLOT)?;
        let reference = self.record(REFERENCE_SLOT, &source, source.size());

        match (&source, reference) {
            (Detection::Absent, _) => {
                warn!(
                    "[scan] Slot {}: source {} - skipping all other checks",
                    REFERENCE_SLOT,
                    ClonerError::NoChipDetected
                );
                return Err(ClonerError::NoChipDetected);
            }
            (_, None) => warn!("[scan] Slot {}: source size unknown", REFERENCE_SLOT),
            (_, Some(size)) => info!(
                "[scan] Slot {}: source {} ({})",
                REFERENCE_SLOT,
                chip_name(&source),
                HumanSize(Some(size))
            ),
        }

        self.classify_targets(reference)
    }

    /// WRITE: read the reference, archive it and clone it to every matching
    /// target.
    pub fn write(&mut self) -> Result<CloneSummary, ClonerError> {
        let image = self.read_reference()?;

        let archived = match self.archiver.store(image.bytes(), image.hash()) {
            Ok(path) => {
                info!("[clone] Archived as {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("[clone] Archive failed, continuing: {}", e);
                None
            }
        };

        let reference = image.size();
        info!("[clone] Source size: {}", HumanSize(Some(reference)));

        if self.classified_against != Some(reference) {
            info!("[clone] No scan for this source, probing targets first");
            self.classify_targets(Some(reference))?;
        }

        let targets: Vec<SlotIndex> = SlotIndex::targets()
            .filter(|&slot| self.board.get(slot).is_clone_target())
            .collect();
        for &slot in &targets {
            self.board.update(slot, |s| {
                s.last_op = OpResult::None;
                s.activity = Activity::Queued;
            });
        }
        info!("[clone] {} target(s) queued", targets.len());

        let mut summary = CloneSummary {
            skipped: SlotIndex::targets().count() - targets.len(),
            archived,
            ..CloneSummary::default()
        };

        for slot in targets {
            if self.clone_slot(slot, &image)? == OpResult::Success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        Ok(summary)
    }

    fn read_reference(&mut self) -> Result<ReferenceImage, ClonerError> {
        info!("[clone] Probing source slot {}...", REFERENCE_SLOT);
        let source = self.probe(REFERENCE_SLOT)?;
        let detected = self.record(REFERENCE_SLOT, &source, source.size());
        if matches!(source, Detection::Absent) {
            warn!(
                "[clone] Slot {}: source {}",
                REFERENCE_SLOT,
                ClonerError::NoChipDetected
            );
            return Err(ClonerError::NoChipDetected);
        }

        self.board
            .update(REFERENCE_SLOT, |s| s.activity = Activity::InFlight);
        info!("[clone] Slot {}: reading source...", REFERENCE_SLOT);

        let image = match self.flash.read(REFERENCE_SLOT) {
            Ok(bytes) if !bytes.is_empty() => ReferenceImage::new(bytes),
            Ok(_) => {
                error!(
                    "[clone] Slot {}: source read returned no data",
                    REFERENCE_SLOT
                );
                self.board
                    .update(REFERENCE_SLOT, |s| s.finish(OpResult::ReadFailed));
                return Err(ClonerError::ReadFailure);
            }
            Err(e) => {
                error!("[clone] Slot {}: source read failed: {}", REFERENCE_SLOT, e);
                self.board
                    .update(REFERENCE_SLOT, |s| s.finish(OpResult::ReadFailed));
                return Err(ClonerError::ReadFailure);
            }
        };

        if detected.is_some_and(|size| size != image.size()) {
            warn!(
                "[clone] Source probed as {} but read {} bytes",
                HumanSize(detected),
                image.len()
            );
        }

        self.board
            .update(REFERENCE_SLOT, |s| s.finish(OpResult::Success));
        info!(
            "[clone] Slot {}: read OK ({} bytes, digest {:016x})",
            REFERENCE_SLOT,
            image.len(),
            image.hash()
        );
        Ok(image)
    }

    fn classify_targets(&mut self, reference: Option<u32>) -> Result<ScanSummary, ClonerError> {
        let mut summary = ScanSummary {
            reference_size: reference,
            ..ScanSummary::default()
        };

        for slot in SlotIndex::targets() {
            let detection = self.probe(slot)?;
            self.record(slot, &detection, reference);
            self.log_target(slot, &detection, reference);

            match self.board.get(slot) {
                state if state.is_clone_target() => summary.matched += 1,
                state if state.presence == Presence::Present => summary.mismatched += 1,
                _ => summary.empty += 1,
            }
        }

        self.classified_against = reference;
        Ok(summary)
    }

    /// Select a slot and probe it, showing activity while the probe runs.
    fn probe(&mut self, slot: SlotIndex) -> Result<Detection, ClonerError> {
        self.checkpoint()?;
        self.selector.select(slot)?;
        self.board.update(slot, |s| s.activity = Activity::InFlight);

        let detection = match self.flash.detect(slot) {
            Ok(Some(chip)) => Detection::Found(chip),
            Ok(None) => Detection::Absent,
            Err(e) => Detection::Failed(e),
        };

        self.board.update(slot, |s| s.activity = Activity::Idle);
        Ok(detection)
    }

    /// Store a probe result on the board. Returns the detected size.
    fn record(
        &mut self,
        slot: SlotIndex,
        detection: &Detection,
        reference: Option<u32>,
    ) -> Option<u32> {
        self.board.update(slot, |s| match detection {
            Detection::Absent => s.mark_absent(),
            Detection::Found(chip) => s.mark_present(chip.size, reference),
            Detection::Failed(_) => s.mark_present(None, reference),
        });
        detection.size()
    }

    fn log_target(&self, slot: SlotIndex, detection: &Detection, reference: Option<u32>) {
        match detection {
            Detection::Absent => info!("[scan] Slot {}: no chip found", slot),
            Detection::Failed(e) => warn!("[scan] Slot {}: probe failed: {}", slot, e),
            Detection::Found(chip) => match SizeMatch::classify(chip.size, reference) {
                SizeMatch::Match => info!(
                    "[scan] Slot {}: {} ({}) size matches source",
                    slot,
                    chip.name,
                    HumanSize(chip.size)
                ),
                SizeMatch::Mismatch => warn!(
                    "[scan] Slot {}: {} - {} != {}",
                    slot,
                    ClonerError::SizeMismatch,
                    HumanSize(chip.size),
                    HumanSize(reference)
                ),
                SizeMatch::Unknown => warn!(
                    "[scan] Slot {}: {} ({}) size unknown",
                    slot,
                    chip.name,
                    HumanSize(chip.size)
                ),
            },
        }
    }

    /// Write and verify one target. Chip failures are recorded on the slot,
    /// never returned.
    fn clone_slot(
        &mut self,
        slot: SlotIndex,
        image: &ReferenceImage,
    ) -> Result<OpResult, ClonerError> {
        self.checkpoint()?;
        self.selector.select(slot)?;
        self.board.update(slot, |s| s.activity = Activity::InFlight);

        info!("[clone] Slot {}: writing...", slot);
        let (result, detail) = match self.flash.write(slot, image) {
            Err(e) => (OpResult::WriteFailed, e.to_string()),
            Ok(()) => {
                info!("[clone] Slot {}: verifying...", slot);
                match self.flash.verify(slot, image) {
                    Ok(true) => (OpResult::Success, String::new()),
                    Ok(false) => (OpResult::VerifyFailed, "content differs".to_string()),
                    Err(e) => (OpResult::VerifyFailed, e.to_string()),
                }
            }
        };

        match result.error() {
            Some(kind) => warn!("[clone] Slot {}: {}: {}", slot, kind, detail),
            None => info!("[clone] Slot {}: OK", slot),
        }

        self.board.update(slot, |s| s.finish(result));
        Ok(result)
    }

    fn checkpoint(&self) -> Result<(), ClonerError> {
        if self.cancel.load(Ordering::Acquire) {
            Err(ClonerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn chip_name(detection: &Detection) -> &str {
    match detection {
        Detection::Found(chip) => &chip.name,
        Detection::Absent | Detection::Failed(_) => "unknown",
    }
}
