// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! [`FlashAdapter`] backed by the `flashrom` command-line tool.
//!
//! flashrom talks to whichever chip the demultiplexer currently routes to
//! the SPI bus, so every call here acts on the slot the controller has just
//! selected. Images pass through a single working file on disk.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;

use clonebay_common::hash::content_hash;
use clonebay_common::{ChipInfo, FlashAdapter, FlashError, ReferenceImage, SlotIndex};

/// `Found Winbond flash chip "W25Q16.V" (2048 kB, SPI) on linux_spi.`
const FOUND_PATTERN: &str = r#"Found .* chip "?([\w.\-/]+)"?\s+\((\d+)\s*(kB|KB|MiB|MB)\b"#;

/// Same line when the size is missing or unparseable.
const FOUND_NAME_PATTERN: &str = r#"Found .* chip "?([\w.\-/]+)"?"#;

pub struct Flashrom {
    program: PathBuf,
    /// `-p` argument, e.g. `linux_spi:dev=/dev/spidev0.0,spispeed=2000`.
    programmer: String,
    chip: Option<String>,
    image: PathBuf,
    found: Regex,
    found_name: Regex,
    /// Digest of what the working file holds right now.
    staged: Option<u64>,
}

impl Flashrom {
    pub fn new(
        program: PathBuf,
        spi_device: &str,
        speed_khz: u32,
        chip: Option<String>,
        image: PathBuf,
    ) -> Result<Self> {
        Ok(Self {
            program,
            programmer: format!("linux_spi:dev={},spispeed={}", spi_device, speed_khz),
            chip,
            image,
            found: Regex::new(FOUND_PATTERN).context("Invalid chip pattern")?,
            found_name: Regex::new(FOUND_NAME_PATTERN).context("Invalid chip pattern")?,
            staged: None,
        })
    }

    pub fn programmer(&self) -> &str {
        &self.programmer
    }

    /// Run flashrom with the common arguments plus `args`, forwarding its
    /// output to the debug log.
    fn invoke<I, A>(&self, slot: SlotIndex, args: I) -> Result<(Output, String), FlashError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-p").arg(&self.programmer);
        if let Some(chip) = &self.chip {
            cmd.arg("-c").arg(chip);
        }
        cmd.args(args);
        debug!("[flashrom S{}] {:?}", slot, cmd);

        let output = cmd
            .output()
            .map_err(|e| FlashError::Launch(format!("{}: {}", self.program.display(), e)))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[flashrom S{}] {}", slot, line.trim_end());
        }

        Ok((output, text))
    }

    /// Like [`invoke`](Self::invoke) but a non-zero exit is an error.
    fn run<I, A>(&self, slot: SlotIndex, args: I) -> Result<(), FlashError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let (output, _) = self.invoke(slot, args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(FlashError::Exit {
                code: output.status.code(),
            })
        }
    }

    /// Make sure the working file holds `image`.
    fn stage(&mut self, image: &ReferenceImage) -> Result<(), FlashError> {
        if self.staged == Some(image.hash()) {
            return Ok(());
        }
        self.staged = None;
        fs::write(&self.image, image.bytes()).map_err(|e| io_error(&self.image, e))?;
        self.staged = Some(image.hash());
        Ok(())
    }
}

impl FlashAdapter for Flashrom {
    fn detect(&mut self, slot: SlotIndex) -> Result<Option<ChipInfo>, FlashError> {
        // Exit status is not trusted here: flashrom fails both for "no chip"
        // and for "several definitions match", and still prints what it found.
        let (_, text) = self.invoke(slot, std::iter::empty::<&OsStr>())?;
        Ok(parse_found(&self.found, &text).or_else(|| parse_name(&self.found_name, &text)))
    }

    fn read(&mut self, slot: SlotIndex) -> Result<Vec<u8>, FlashError> {
        self.staged = None;
        match fs::remove_file(&self.image) {
            Ok(()) => debug!("Removed stale {}", self.image.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&self.image, e)),
        }

        self.run(slot, [OsStr::new("-r"), self.image.as_os_str()])?;
        let bytes = fs::read(&self.image).map_err(|e| io_error(&self.image, e))?;
        self.staged = Some(content_hash(&bytes));
        Ok(bytes)
    }

    fn write(&mut self, slot: SlotIndex, image: &ReferenceImage) -> Result<(), FlashError> {
        self.stage(image)?;
        self.run(slot, [OsStr::new("-w"), self.image.as_os_str()])
    }

    fn verify(&mut self, slot: SlotIndex, image: &ReferenceImage) -> Result<bool, FlashError> {
        self.stage(image)?;
        match self.run(slot, [OsStr::new("--verify"), self.image.as_os_str()]) {
            Ok(()) => Ok(true),
            Err(FlashError::Exit { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn io_error(path: &Path, e: io::Error) -> FlashError {
    FlashError::Io(format!("{}: {}", path.display(), e))
}

/// Extract chip name and size from flashrom's probe output.
fn parse_found(re: &Regex, text: &str) -> Option<ChipInfo> {
    let caps = re.captures(text)?;
    let count: u32 = caps[2].parse().ok()?;
    let unit = match &caps[3] {
        "kB" | "KB" => 1024,
        _ => 1024 * 1024,
    };
    Some(ChipInfo {
        name: caps[1].to_string(),
        size: count.checked_mul(unit),
    })
}

fn parse_name(re: &Regex, text: &str) -> Option<ChipInfo> {
    let caps = re.captures(text)?;
    Some(ChipInfo {
        name: caps[1].to_string(),
        size: None,
    })
}
