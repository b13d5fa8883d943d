// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Content digest used to name archived reference images.

use crc::{Crc, CRC_64_XZ};

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Deterministic digest of a chip image.
pub fn content_hash(bytes: &[u8]) -> u64 {
    CRC64.checksum(bytes)
}
