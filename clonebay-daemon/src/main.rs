// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Button-driven SPI flash cloner for the 16-slot clonebay carrier.
//!
//! Usage:
//!   clonebay
//!   clonebay --spi-speed-khz 8000 --chip W25Q16.V
//!   RUST_LOG=debug clonebay --archive-dir /srv/cards
//!
//! Runs until SIGINT/SIGTERM (clean exit) or a hardware fault (non-zero
//! exit, for the supervisor to restart it). Either way the LEDs go dark.

mod archive;
mod buttons;
mod cli;
mod flashrom;
mod hardware;
mod leds;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();
    cli::run(args)
}
