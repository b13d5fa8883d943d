// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface and the main event loop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::info;

use clonebay_common::speed::spi_speed_khz;
use clonebay_common::{slot_board, Controller};

use crate::archive::DirArchive;
use crate::buttons::{self, Event};
use crate::flashrom::Flashrom;
use crate::hardware::{Addresser, Buttons, Hardware};
use crate::leds;

type Daemon = Controller<Addresser, Flashrom, DirArchive>;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "clonebay")]
#[command(about = "Button-driven SPI flash cloner for the 16-slot carrier")]
pub struct Cli {
    /// GPIO character device
    #[arg(long, default_value = "/dev/gpiochip0")]
    pub gpio_chip: String,

    /// SPI device the carrier is wired to
    #[arg(long, default_value = "/dev/spidev0.0")]
    pub spi_device: String,

    /// SPI clock in kHz (overrides the DIP switches)
    #[arg(long, value_name = "KHZ")]
    pub spi_speed_khz: Option<u32>,

    /// Chip definition passed to flashrom as `-c`
    #[arg(short, long)]
    pub chip: Option<String>,

    /// flashrom executable
    #[arg(long, default_value = "flashrom")]
    pub flashrom: PathBuf,

    /// Working image file
    #[arg(long, value_name = "FILE", default_value = "card.bin")]
    pub image: PathBuf,

    /// Directory receiving a copy of every reference image
    #[arg(long, value_name = "DIR", default_value = "CardArchive")]
    pub archive_dir: PathBuf,

    /// LEDs are wired to sink current (invert every frame)
    #[arg(long)]
    pub active_low_leds: bool,
}

/// Bring up the hardware and serve button presses until a fault or a
/// termination signal. The LEDs are blanked on every way out.
pub fn run(cli: Cli) -> Result<()> {
    let Hardware {
        leds: mut matrix,
        addresser,
        buttons: panel,
        dip,
    } = Hardware::open(&cli.gpio_chip, cli.active_low_leds)?;

    let speed = match cli.spi_speed_khz {
        Some(khz) => {
            info!("SPI speed {} kHz (command line, DIP={} ignored)", khz, dip);
            khz
        }
        None => {
            let khz = spi_speed_khz(dip);
            info!("SPI speed {} kHz (DIP={})", khz, dip);
            khz
        }
    };

    let flash = Flashrom::new(cli.flashrom, &cli.spi_device, speed, cli.chip, cli.image)?;
    info!("Programmer: {}", flash.programmer());

    leds::play_startup(&mut matrix).context("Startup animation failed")?;

    let (board, reader) = slot_board();
    let archive = DirArchive::new(cli.archive_dir);
    let mut controller = Controller::new(addresser, flash, archive, board);
    let (events_tx, events) = sync_channel(1);
    let busy = Arc::new(AtomicBool::new(false));

    let refresh = leds::spawn_refresh(matrix, reader, events_tx.clone(), controller.cancel_flag())
        .context("Failed to start LED thread")?;

    let outcome = start(&mut controller, panel, &busy, events_tx)
        .and_then(|()| serve(&mut controller, &events, &busy));

    refresh.shutdown();
    info!("LEDs off, exiting");
    outcome
}

/// Everything after the LED thread is up.
fn start(
    controller: &mut Daemon,
    panel: Buttons,
    busy: &Arc<AtomicBool>,
    events: SyncSender<Event>,
) -> Result<()> {
    let cancel = controller.cancel_flag();
    let signals = events.clone();
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::Release);
        let _ = signals.send(Event::Shutdown);
    })
    .context("Failed to install signal handler")?;

    controller.park().context("Failed to select reference slot")?;

    buttons::spawn_poller(panel, Arc::clone(busy), events, controller.cancel_flag())
        .context("Failed to start button thread")?;

    info!("Ready. CHECK = scan slots, WRITE = clone slot 0 to matching slots");
    Ok(())
}

/// Run workflows until a fault or shutdown.
///
/// A worker fault or a signal raises the controller's cancel flag, so a
/// running workflow stops before its next slot and the event is seen
/// right after.
fn serve(controller: &mut Daemon, events: &Receiver<Event>, busy: &AtomicBool) -> Result<()> {
    loop {
        let event = events
            .recv()
            .map_err(|_| anyhow!("All worker threads stopped"))?;

        match event {
            Event::Pressed(button) => {
                let outcome = controller.handle(button);
                busy.store(false, Ordering::Release);
                outcome.with_context(|| format!("{:?} workflow", button))?;
            }
            Event::Fault(source, e) => bail!("{} stopped: {}", source, e),
            Event::Shutdown => {
                info!("Shutdown requested");
                return Ok(());
            }
        }
    }
}
