use log::debug;

use common::*;

use crate::{OpcodeTable, JUMP};

/// Execute step that a taken conditional jump replaces.
pub const JUMP_STEP: usize = 2;

/// Conditional jumps and the flag that must be set for them to be taken.
pub const CONDITIONAL_JUMPS: [(Opcode, FlagState); 2] = [
    (Opcode::Jc, FlagState::CARRY),
    (Opcode::Jz, FlagState::ZERO),
];

/// One complete opcode table per flag state. Each table is its own value,
/// so patching one never shows through another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantTable {
    tables: [OpcodeTable; FLAG_STATE_COUNT],
}

impl VariantTable {
    pub fn table(&self, flags: FlagState) -> &OpcodeTable {
        &self.tables[flags.index()]
    }

    pub fn word(&self, flags: FlagState, opcode: u8, step: usize) -> ControlWord {
        self.table(flags).word(opcode, step)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlagState, &OpcodeTable)> {
        FlagState::states().zip(self.tables.iter())
    }
}

pub fn expand(base: &OpcodeTable) -> VariantTable {
    let tables = std::array::from_fn(|i| {
        let flags = FlagState::from_bits_truncate(i as u8);
        let mut table = base.clone();
        for (opcode, condition) in CONDITIONAL_JUMPS {
            if flags.contains(condition) {
                debug!("flags {:02b}: {} step {} jumps", flags.bits(), opcode, JUMP_STEP);
                table.patch(opcode, JUMP_STEP, JUMP);
            }
        }
        table
    });

    VariantTable { tables }
}
