extern crate packed_struct;
use packed_struct::prelude::*;

use log::{debug, trace};

use common::*;

mod address;
mod rom;
mod variants;

pub use address::*;
pub use rom::*;
pub use variants::*;

use lazy_static::lazy_static;
lazy_static! {
    pub static ref BASE_TABLE: OpcodeTable = base_table();
    pub static ref PLAIN_TABLE: OpcodeTable = plain_table();
    pub static ref VARIANTS: VariantTable = expand(&BASE_TABLE);
}

/// Latch the operand (low nibble of IR) into the program counter.
pub const JUMP: ControlWord = ControlWord::IO.union(ControlWord::J);

/// Steps 0 and 1 of every opcode.
pub const FETCH: [ControlWord; 2] = [
    ControlWord::MI.union(ControlWord::CO),
    ControlWord::RO.union(ControlWord::II).union(ControlWord::CE),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Microprogram {
    steps: [ControlWord; STEP_COUNT],
}

impl Microprogram {
    fn from_steps(steps: &[ControlWord]) -> Microprogram {
        let mut program = Microprogram::default();
        program.steps[..steps.len()].copy_from_slice(steps);
        program
    }

    /// Panics if `step` is not below STEP_COUNT.
    pub fn step(&self, step: usize) -> ControlWord {
        debug_assert!(step < STEP_COUNT, "step {} past {}", step, STEP_COUNT);
        self.steps[step]
    }

    pub fn steps(&self) -> &[ControlWord; STEP_COUNT] {
        &self.steps
    }

    /// Number of steps before the inert tail.
    pub fn len(&self) -> usize {
        self.steps
            .iter()
            .rposition(|w| !w.is_empty())
            .map_or(0, |i| i + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One microprogram per opcode nibble, unassigned nibbles included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeTable {
    programs: [Microprogram; OPCODE_SLOTS],
}

impl OpcodeTable {
    /// `opcode` is a raw nibble, 0..OPCODE_SLOTS; anything larger panics.
    pub fn program(&self, opcode: u8) -> &Microprogram {
        debug_assert!((opcode as usize) < OPCODE_SLOTS, "opcode {:#x} is not a nibble", opcode);
        &self.programs[opcode as usize]
    }

    /// `step` must be below STEP_COUNT.
    pub fn word(&self, opcode: u8, step: usize) -> ControlWord {
        self.program(opcode).step(step)
    }

    pub fn programs(&self) -> impl Iterator<Item = (u8, &Microprogram)> {
        self.programs.iter().enumerate().map(|(i, p)| (i as u8, p))
    }

    fn patch(&mut self, opcode: Opcode, step: usize, word: ControlWord) {
        self.programs[opcode.to_primitive() as usize].steps[step] = word;
    }

    fn without(&self, signals: ControlWord) -> OpcodeTable {
        let mut table = self.clone();
        for program in table.programs.iter_mut() {
            for w in program.steps.iter_mut() {
                w.remove(signals);
            }
        }
        table
    }
}

struct Ucode {
    steps: Vec<ControlWord>,
    opcode: u8,
}

macro_rules! add {
    ($self:expr, $word:expr) => {
        $self.add_with_source($word, file!(), line!());
    };
}

impl Ucode {
    fn new() -> Ucode {
        Ucode {
            steps: Vec::with_capacity(STEP_COUNT),
            opcode: 0,
        }
    }

    fn add_with_source(&mut self, w: ControlWord, file: &'static str, line: u32) {
        trace!(
            "op:{:04b} step:{} word:{:016b} {:?} source:{}:{}",
            self.opcode,
            self.steps.len(),
            w.bits(),
            w,
            file,
            line
        );
        self.steps.push(w);
    }

    fn fetch(&mut self) {
        for w in FETCH {
            add!(self, w);
        }
    }

    fn operand_to_mar(&mut self) {
        add!(self, ControlWord::IO | ControlWord::MI);
    }

    fn alu_to_a(&mut self, sub: bool) {
        self.operand_to_mar();
        add!(self, ControlWord::RO | ControlWord::BI);
        let mut w = ControlWord::EO | ControlWord::AI | ControlWord::FI;
        w.set(ControlWord::SU, sub);
        add!(self, w);
    }

    fn build(&mut self) -> OpcodeTable {
        let mut programs = [Microprogram::default(); OPCODE_SLOTS];

        for encoded in 0..OPCODE_SLOTS as u8 {
            self.opcode = encoded;
            self.steps.clear();
            let opcode = Opcode::from_primitive(encoded);

            self.fetch();

            match opcode {
                Some(Opcode::Nop) | None => {}
                Some(Opcode::Lda) => {
                    self.operand_to_mar();
                    add!(self, ControlWord::RO | ControlWord::AI);
                }
                Some(Opcode::Add) => self.alu_to_a(false),
                Some(Opcode::Sub) => self.alu_to_a(true),
                Some(Opcode::Sta) => {
                    self.operand_to_mar();
                    add!(self, ControlWord::AO | ControlWord::RI);
                }
                Some(Opcode::Ldi) => {
                    add!(self, ControlWord::IO | ControlWord::AI);
                }
                Some(Opcode::Jmp) => {
                    add!(self, JUMP);
                }
                // filled per flag state by `expand`
                Some(Opcode::Jc) | Some(Opcode::Jz) => {}
                Some(Opcode::Out) => {
                    add!(self, ControlWord::AO | ControlWord::OI);
                }
                Some(Opcode::Hlt) => {
                    add!(self, ControlWord::HLT);
                }
            }

            let step_count = self.steps.len();
            assert!(step_count <= STEP_COUNT, "{} > {} for {:?}", step_count, STEP_COUNT, &opcode);
            trace!(
                "filling remaining {} steps of {:?} with no-ops",
                STEP_COUNT - step_count,
                opcode
            );

            programs[encoded as usize] = Microprogram::from_steps(&self.steps);
        }

        OpcodeTable { programs }
    }
}

/// The flag-independent table every flag state starts from.
pub fn base_table() -> OpcodeTable {
    let table = Ucode::new().build();
    debug!("built base table");
    table
}

/// Base table for boards without a flags register: no step latches FI.
pub fn plain_table() -> OpcodeTable {
    base_table().without(ControlWord::FI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    type W = ControlWord;

    #[test]
    fn fetch_prologue() {
        let table = base_table();
        for (_, program) in table.programs() {
            assert_eq!(W::MI | W::CO, program.step(0));
            assert_eq!(W::RO | W::II | W::CE, program.step(1));
        }
    }

    #[test]
    fn execute_steps() {
        let table = base_table();
        let expect: &[(Opcode, &[W])] = &[
            (Opcode::Nop, &[]),
            (Opcode::Lda, &[W::IO | W::MI, W::RO | W::AI]),
            (Opcode::Add, &[W::IO | W::MI, W::RO | W::BI, W::EO | W::AI | W::FI]),
            (Opcode::Sub, &[W::IO | W::MI, W::RO | W::BI, W::EO | W::AI | W::SU | W::FI]),
            (Opcode::Sta, &[W::IO | W::MI, W::AO | W::RI]),
            (Opcode::Ldi, &[W::IO | W::AI]),
            (Opcode::Jmp, &[W::IO | W::J]),
            (Opcode::Jc, &[]),
            (Opcode::Jz, &[]),
            (Opcode::Out, &[W::AO | W::OI]),
            (Opcode::Hlt, &[W::HLT]),
        ];
        assert_eq!(Opcode::iter().count(), expect.len());

        for (opcode, execute) in expect {
            let program = table.program(*opcode as u8);
            assert_eq!(2 + execute.len(), program.len(), "{}", opcode);
            for (i, w) in execute.iter().enumerate() {
                assert_eq!(*w, program.step(2 + i), "{} step {}", opcode, 2 + i);
            }
            for step in program.len()..STEP_COUNT {
                assert_eq!(W::NONE, program.step(step));
            }
        }
    }

    #[test]
    fn unassigned_opcodes_are_nop() {
        let table = base_table();
        let nop = *table.program(Opcode::Nop as u8);
        for opcode in 0x9..=0xD {
            assert_eq!(nop, *table.program(opcode));
        }
    }

    #[test]
    fn only_arithmetic_latches_flags() {
        let table = base_table();
        for (opcode, program) in table.programs() {
            let latches = program.steps().iter().any(|w| w.contains(W::FI));
            let arithmetic = opcode == Opcode::Add as u8 || opcode == Opcode::Sub as u8;
            assert_eq!(arithmetic, latches, "{:04b}", opcode);
        }
    }

    #[test]
    fn plain_table_drops_flag_latch() {
        let base = base_table();
        let plain = plain_table();
        assert_eq!(
            W::EO | W::AI | W::SU,
            plain.word(Opcode::Sub as u8, 4)
        );
        for (opcode, program) in plain.programs() {
            for step in 0..STEP_COUNT {
                assert!(!program.step(step).contains(W::FI));
                assert_eq!(base.word(opcode, step) - W::FI, program.step(step));
            }
        }
    }

    #[test]
    fn every_nibble_and_step_resolves() {
        let table = base_table();
        for opcode in 0..OPCODE_SLOTS as u8 {
            for step in 0..STEP_COUNT {
                assert_eq!(table.program(opcode).step(step), table.word(opcode, step));
            }
        }
    }

    #[test]
    #[should_panic]
    fn opcode_past_nibble_panics() {
        base_table().program(OPCODE_SLOTS as u8);
    }

    #[test]
    #[should_panic]
    fn step_past_program_panics() {
        base_table().word(Opcode::Hlt as u8, STEP_COUNT);
    }

    #[test]
    fn statics_match_builders() {
        assert_eq!(base_table(), *BASE_TABLE);
        assert_eq!(plain_table(), *PLAIN_TABLE);
        assert_eq!(expand(&base_table()), *VARIANTS);
    }
}
