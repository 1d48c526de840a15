use packed_struct::prelude::*;

use common::*;

use crate::VariantTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(PrimitiveEnum_u8)]
pub enum ByteSelect {
    High = 0,
    Low = 1,
}

/// Control ROM address lines: A9..A8 flags, A7 byte select, A6..A3 opcode, A2..A0 step.
#[derive(Clone, Copy, Debug)]
#[derive(PackedStruct)]
#[packed_struct(size_bytes = "2", endian = "lsb", bit_numbering = "lsb0")]
pub struct RomAddress {
    #[packed_field(bits = "0..=2")]
    pub step: Integer<u8, packed_bits::Bits::<3>>,
    #[packed_field(bits = "3..=6")]
    pub opcode: Integer<u8, packed_bits::Bits::<4>>,
    #[packed_field(bits = "7", ty = "enum")]
    pub byte_select: ByteSelect,
    #[packed_field(bits = "8..=9")]
    pub flags: Integer<u8, packed_bits::Bits::<2>>,
}

impl RomAddress {
    pub fn new(flags: FlagState, byte_select: ByteSelect, opcode: u8, step: usize) -> RomAddress {
        RomAddress {
            step: (step as u8 & 0b111).into(),
            opcode: (opcode & 0xF).into(),
            byte_select,
            flags: flags.bits().into(),
        }
    }

    pub fn decode(index: usize) -> Result<RomAddress, RomError> {
        if index >= DECODED_SIZE {
            return Err(RomError::AddressOutOfRange { index });
        }
        let bytes = (index as u16).to_be_bytes();
        Ok(RomAddress::unpack(&bytes)?)
    }

    pub fn index(&self) -> Result<usize, RomError> {
        let bytes = self.pack()?;
        Ok(u16::from_be_bytes(bytes) as usize)
    }

    pub fn flag_state(&self) -> FlagState {
        FlagState::from_bits_truncate(*self.flags)
    }

    pub fn opcode_nibble(&self) -> u8 {
        *self.opcode
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_primitive(*self.opcode)
    }

    pub fn step_index(&self) -> usize {
        *self.step as usize
    }

    pub fn word(&self, variants: &VariantTable) -> ControlWord {
        variants.word(self.flag_state(), self.opcode_nibble(), self.step_index())
    }

    pub fn byte_of(&self, w: ControlWord) -> u8 {
        match self.byte_select {
            ByteSelect::High => w.high_byte(),
            ByteSelect::Low => w.low_byte(),
        }
    }
}
