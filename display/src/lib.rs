use log::debug;

use common::*;

use lazy_static::lazy_static;
lazy_static! {
    pub static ref DISPLAY: RomImage = display_rom();
}

/// Segment patterns for 0..=9, wired a-g onto bits 6..0 of the output.
pub const DIGITS: [u8; 10] = [0x7e, 0x30, 0x6d, 0x79, 0x33, 0x5b, 0x5f, 0x70, 0x7f, 0x7b];

pub const MINUS: u8 = 0x01;
pub const BLANK: u8 = 0x00;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Place {
    Ones = 0,
    Tens = 1,
    Hundreds = 2,
    Sign = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Unsigned = 0,
    TwosComplement = 1,
}

/// Input lines: A10 mode, A9..A8 place, A7..A0 value.
pub fn address(mode: Mode, place: Place, value: u8) -> usize {
    (mode as usize) << 10 | (place as usize) << 8 | value as usize
}

pub fn digit(magnitude: u32, place: Place) -> u8 {
    let divisor = match place {
        Place::Ones => 1,
        Place::Tens => 10,
        Place::Hundreds => 100,
        Place::Sign => return BLANK,
    };
    DIGITS[(magnitude / divisor % 10) as usize]
}

pub fn display_rom() -> RomImage {
    let mut rom = [0u8; ROM_SIZE];

    for value in 0..=255u8 {
        for place in [Place::Ones, Place::Tens, Place::Hundreds] {
            rom[address(Mode::Unsigned, place, value)] = digit(value as u32, place);
        }
    }

    for value in -128..=127i8 {
        let magnitude = value.unsigned_abs() as u32;
        let raw = value as u8;
        for place in [Place::Ones, Place::Tens, Place::Hundreds] {
            rom[address(Mode::TwosComplement, place, raw)] = digit(magnitude, place);
        }
        rom[address(Mode::TwosComplement, Place::Sign, raw)] = if value < 0 { MINUS } else { BLANK };
    }

    debug!("rendered display rom");
    RomImage::from(rom)
}
