// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! SPI clock selection from the DIP switches.

/// flashrom linux_spi default, used with all switches off.
pub const BASE_SPI_SPEED_KHZ: u32 = 2_000;

/// Added per DIP step.
pub const SPI_SPEED_STEP_KHZ: u32 = 2_000;

/// Pack the four switch positions (DIP1 = bit 0) into a 4-bit value.
pub fn dip_value(switches: [bool; 4]) -> u8 {
    switches
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &on)| acc | ((on as u8) << bit))
}

/// SPI clock for a DIP value: 2 MHz base, 2 MHz per step (up to 32 MHz).
pub fn spi_speed_khz(dip: u8) -> u32 {
    BASE_SPI_SPEED_KHZ + u32::from(dip & 0x0F) * SPI_SPEED_STEP_KHZ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dip_value_bit_order() {
        assert_eq!(dip_value([false; 4]), 0);
        assert_eq!(dip_value([true, false, false, false]), 1);
        assert_eq!(dip_value([false, false, false, true]), 8);
        assert_eq!(dip_value([true; 4]), 15);
    }

    #[test]
    fn test_spi_speed_range() {
        assert_eq!(spi_speed_khz(0), 2_000);
        assert_eq!(spi_speed_khz(1), 4_000);
        assert_eq!(spi_speed_khz(15), 32_000);
    }

    #[test]
    fn test_spi_speed_ignores_high_bits() {
        assert_eq!(spi_speed_khz(0xF3), spi_speed_khz(3));
    }
}
