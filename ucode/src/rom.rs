use std::io::Write;

use log::debug;

use common::*;

use crate::{ByteSelect, OpcodeTable, RomAddress, VariantTable};

/// Steps at or past this one are never used by any opcode, so the trace skips them.
pub const TRACE_STEPS: usize = 6;

/// Fill the first DECODED_SIZE bytes from the flag-conditioned tables.
/// The second chip's half of the image stays zero.
pub fn render(variants: &VariantTable) -> Result<RomImage, RomError> {
    let mut rom = RomImage::new();
    for index in 0..DECODED_SIZE {
        let addr = RomAddress::decode(index)?;
        rom.set(index, addr.byte_of(addr.word(variants)))?;
    }
    debug!("rendered {} of {} bytes", DECODED_SIZE, rom.len());
    Ok(rom)
}

pub fn write_trace<W: Write>(variants: &VariantTable, out: &mut W) -> Result<(), RomError> {
    for index in 0..DECODED_SIZE {
        let addr = RomAddress::decode(index)?;
        let step = addr.step_index();
        if step < TRACE_STEPS {
            writeln!(
                out,
                "{:4} - {:010b}  ->  Fl {:02b}, ByteSel {}, Op {:04b}, Step {:03b} - Control {:016b}",
                index,
                index,
                addr.flag_state().bits(),
                addr.byte_select as u8,
                addr.opcode_nibble(),
                step,
                addr.word(variants).bits()
            )?;
        }
        if step == TRACE_STEPS - 1 {
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Layout for a board with no flag lines: high bytes at (opcode, step),
/// low bytes 128 above.
pub fn render_plain(table: &OpcodeTable) -> Result<RomImage, RomError> {
    let mut rom = RomImage::new();
    for (opcode, program) in table.programs() {
        for (step, w) in program.steps().iter().enumerate() {
            for byte_select in [ByteSelect::High, ByteSelect::Low] {
                let addr = RomAddress::new(FlagState::empty(), byte_select, opcode, step);
                rom.set(addr.index()?, addr.byte_of(*w))?;
            }
        }
    }
    debug!("rendered plain table");
    Ok(rom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{base_table, expand, plain_table, JUMP};

    fn image() -> RomImage {
        render(&expand(&base_table())).unwrap()
    }

    #[test]
    fn deterministic() {
        assert_eq!(image(), image());
    }

    #[test]
    fn bounds() {
        let rom = image();
        assert_eq!(ROM_SIZE, rom.len());
        assert!(rom.bytes()[DECODED_SIZE..].iter().all(|b| *b == 0));
    }

    #[test]
    fn fetch_bytes() {
        let rom = image();
        for flags in 0..4usize {
            for opcode in 0..OPCODE_SLOTS {
                let base = flags << 8 | opcode << 3;
                // MI|CO, RO|II|CE
                assert_eq!(0x40, rom.bytes()[base]);
                assert_eq!(0x14, rom.bytes()[base + 1]);
                assert_eq!(0x04, rom.bytes()[base | 1 << 7]);
                assert_eq!(0x08, rom.bytes()[(base | 1 << 7) + 1]);
            }
        }
    }

    #[test]
    fn conditional_jump_bytes() {
        let rom = image();
        let jc_carry = 0b01_0_0111_010;
        assert_eq!(JUMP.high_byte(), rom.bytes()[jc_carry]);
        assert_eq!(JUMP.low_byte(), rom.bytes()[jc_carry | 1 << 7]);

        let jz_carry = 0b01_0_1000_010;
        assert_eq!(0, rom.bytes()[jz_carry]);
        assert_eq!(0, rom.bytes()[jz_carry | 1 << 7]);

        let jz_zero = 0b10_0_1000_010;
        assert_eq!(0x08, rom.bytes()[jz_zero]);
        assert_eq!(0x02, rom.bytes()[jz_zero | 1 << 7]);
    }

    #[test]
    fn unused_step_is_blank() {
        let rom = image();
        let addr = RomAddress::decode(0b0100001111).unwrap();
        assert_eq!(FlagState::CARRY, addr.flag_state());
        assert_eq!(ByteSelect::High, addr.byte_select);
        assert_eq!(0b0001, addr.opcode_nibble());
        assert_eq!(7, addr.step_index());
        assert_eq!(0x00, rom.bytes()[0b0100001111]);

        assert_eq!(0x00, rom.bytes()[0b01_0_0111_111]);
    }

    #[test]
    fn arithmetic_latches_flags() {
        let rom = image();
        // SUB step 4 low byte: EO|SU|FI
        assert_eq!(0b1100_0001, rom.bytes()[0b00_1_0011_100]);
        // SUB step 4 high byte: AI
        assert_eq!(0b0000_0010, rom.bytes()[0b00_0_0011_100]);
    }

    #[test]
    fn trace_lines() {
        let mut out = Vec::new();
        write_trace(&expand(&base_table()), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        // 128 groups of 6 steps, each followed by a blank line
        assert_eq!(128 * 7, lines.len());
        assert_eq!(
            "   0 - 0000000000  ->  Fl 00, ByteSel 0, Op 0000, Step 000 - Control 0100000000000100",
            lines[0]
        );
        assert_eq!("", lines[6]);
        assert!(lines.iter().all(|l| !l.contains("Step 110") && !l.contains("Step 111")));

        let jc = lines
            .iter()
            .find(|l| l.starts_with(" 314 - "))
            .unwrap();
        assert!(jc.ends_with("Control 0000100000000010"), "{}", jc);
    }

    #[test]
    fn trace_does_not_touch_image() {
        let variants = expand(&base_table());
        let before = render(&variants).unwrap();
        write_trace(&variants, &mut std::io::sink()).unwrap();
        assert_eq!(before, render(&variants).unwrap());
    }

    #[test]
    fn plain_layout() {
        let table = plain_table();
        let rom = render_plain(&table).unwrap();
        assert_eq!(ROM_SIZE, rom.len());
        assert!(rom.bytes()[256..].iter().all(|b| *b == 0));
        for (opcode, program) in table.programs() {
            for step in 0..STEP_COUNT {
                let addr = (opcode as usize) << 3 | step;
                assert_eq!(program.step(step).high_byte(), rom.bytes()[addr]);
                assert_eq!(program.step(step).low_byte(), rom.bytes()[addr + 128]);
            }
        }
        // LDI step 2: IO|AI
        assert_eq!(0x0A, rom.bytes()[0b0101_010]);
        assert_eq!(0x00, rom.bytes()[0b0101_010 + 128]);
    }
}
