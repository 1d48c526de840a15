extern crate strum;
#[macro_use]
extern crate strum_macros;

extern crate packed_struct;
use packed_struct::prelude::*;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[macro_use]
extern crate bitflags;

mod error;
pub mod hexfile;

pub use error::RomError;
use hexfile::HexFile;

bitflags! {
    /// One clock step's worth of control lines. Bit 15 is HLT, bit 0 is FI.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ControlWord: u16 {
        /// Halt clock
        const HLT = 1 << 15;
        /// Memory address register in
        const MI = 1 << 14;
        /// RAM data in
        const RI = 1 << 13;
        /// RAM data out
        const RO = 1 << 12;
        /// Instruction register out
        const IO = 1 << 11;
        /// Instruction register in
        const II = 1 << 10;
        /// A register in
        const AI = 1 << 9;
        /// A register out
        const AO = 1 << 8;
        /// ALU out
        const EO = 1 << 7;
        /// ALU subtract
        const SU = 1 << 6;
        /// B register in
        const BI = 1 << 5;
        /// Output register in
        const OI = 1 << 4;
        /// Program counter enable
        const CE = 1 << 3;
        /// Program counter out
        const CO = 1 << 2;
        /// Jump (program counter in)
        const J = 1 << 1;
        /// Flags register in
        const FI = 1 << 0;
    }
}

impl ControlWord {
    pub const NONE: ControlWord = ControlWord::empty();

    pub fn high_byte(&self) -> u8 {
        (self.bits() >> 8) as u8
    }

    pub fn low_byte(&self) -> u8 {
        (self.bits() & 0xFF) as u8
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct FlagState: u8 {
        const CARRY = 0b01;
        const ZERO = 0b10;
    }
}

pub const FLAG_STATE_COUNT: usize = 4;

impl FlagState {
    /// Every reachable (Zero, Carry) combination, in index order 00, 01, 10, 11.
    pub fn states() -> impl Iterator<Item = FlagState> {
        (0..FLAG_STATE_COUNT as u8).map(FlagState::from_bits_truncate)
    }

    pub fn index(&self) -> usize {
        self.bits() as usize
    }
}

#[derive(Clone, Copy, Display, Debug, PartialEq, Eq, Hash)]
#[derive(EnumCount, EnumIter, EnumString)]
#[derive(PrimitiveEnum_u8)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Opcode {
    Nop = 0x0, // fetch only
    Lda = 0x1, // MEM[operand] -> A
    Add = 0x2, // A + MEM[operand] -> A + FLAGS
    Sub = 0x3, // A - MEM[operand] -> A + FLAGS
    Sta = 0x4, // A -> MEM[operand]
    Ldi = 0x5, // operand -> A
    Jmp = 0x6, // operand -> PC
    Jc = 0x7,  // if FLAGS & CARRY { operand -> PC }
    Jz = 0x8,  // if FLAGS & ZERO { operand -> PC }
    Out = 0xE, // A -> OUT
    Hlt = 0xF, // stop the clock
}

pub const OPCODE_BITS: u32 = 4;
pub const OPCODE_SLOTS: usize = 1 << OPCODE_BITS;

pub const STEP_BITS: u32 = 3;
pub const STEP_COUNT: usize = 1 << STEP_BITS;

/// Addresses [0, DECODED_SIZE) carry the control table; the rest of the chip stays blank.
pub const DECODED_SIZE: usize = 1024;
pub const ROM_SIZE: usize = 2048;

#[derive(Clone, Copy, Display, Debug, PartialEq, Eq)]
#[derive(EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Raw,
    Hex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RomImage {
    bytes: Vec<u8>,
}

impl Default for RomImage {
    fn default() -> Self {
        RomImage::new()
    }
}

impl From<[u8; ROM_SIZE]> for RomImage {
    fn from(bytes: [u8; ROM_SIZE]) -> Self {
        RomImage {
            bytes: bytes.to_vec(),
        }
    }
}

impl RomImage {
    pub fn new() -> RomImage {
        RomImage {
            bytes: vec![0u8; ROM_SIZE],
        }
    }

    pub fn set(&mut self, addr: usize, value: u8) -> Result<(), RomError> {
        let b = self
            .bytes
            .get_mut(addr)
            .ok_or(RomError::AddressOutOfRange { index: addr })?;
        *b = value;
        Ok(())
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

    pub fn write<W: Write>(&self, out: W, format: ImageFormat) -> Result<(), RomError> {
        let mut out = BufWriter::new(out);
        match format {
            ImageFormat::Raw => out.write_all(&self.bytes)?,
            ImageFormat::Hex => HexFile::from_bytes(&self.bytes).write(&mut out)?,
        }
        out.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, format: ImageFormat) -> Result<(), RomError> {
        let file = File::create(path)?;
        self.write(file, format)
    }
}
