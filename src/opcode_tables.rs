use crate::error::OpcodeTableError;
use crate::instruction::{InstructionDescriptor, OperandShape, ILLEGAL};
use log::debug;

use OperandShape::{Device, Immediate8, Implied, LongAddr16, RegDest, RegSrcNonzero, ShortAddr8};

const fn op(mnemonic: &'static str, base_code: u8, shape: OperandShape) -> InstructionDescriptor {
    InstructionDescriptor::new(mnemonic, base_code, shape)
}

/// The CDP1802 instruction set as declarative (mnemonic, base, shape) entries
pub const INSTRUCTION_SET: &[InstructionDescriptor] = &[
    // Register groups
    op("IDL", 0x00, Implied),
    op("LDN", 0x00, RegSrcNonzero), // 00 is IDL
    op("INC", 0x10, RegDest),
    op("DEC", 0x20, RegDest),
    // Short branches
    op("BR", 0x30, ShortAddr8),
    op("BQ", 0x31, ShortAddr8),
    op("BZ", 0x32, ShortAddr8),
    op("BDF", 0x33, ShortAddr8),
    op("B1", 0x34, ShortAddr8),
    op("B2", 0x35, ShortAddr8),
    op("B3", 0x36, ShortAddr8),
    op("B4", 0x37, ShortAddr8),
    op("SKP", 0x38, Implied),
    op("BNQ", 0x39, ShortAddr8),
    op("BNZ", 0x3A, ShortAddr8),
    op("BNF", 0x3B, ShortAddr8),
    op("BN1", 0x3C, ShortAddr8),
    op("BN2", 0x3D, ShortAddr8),
    op("BN3", 0x3E, ShortAddr8),
    op("BN4", 0x3F, ShortAddr8),
    op("LDA", 0x40, RegDest),
    op("STR", 0x50, RegDest),
    // I/O
    op("IRX", 0x60, Implied),
    op("OUT", 0x60, Device),
    op("INP", 0x68, Device), // 68 is unassigned on the 1802
    // Control and memory-reference group
    op("RET", 0x70, Implied),
    op("DIS", 0x71, Implied),
    op("LDXA", 0x72, Implied),
    op("STXD", 0x73, Implied),
    op("ADC", 0x74, Implied),
    op("SDB", 0x75, Implied),
    op("SHRC", 0x76, Implied),
    op("SMB", 0x77, Implied),
    op("SAV", 0x78, Implied),
    op("MARK", 0x79, Implied),
    op("REQ", 0x7A, Implied),
    op("SEQ", 0x7B, Implied),
    op("ADCI", 0x7C, Immediate8),
    op("SDBI", 0x7D, Immediate8),
    op("SHLC", 0x7E, Implied),
    op("SMBI", 0x7F, Immediate8),
    op("GLO", 0x80, RegDest),
    op("GHI", 0x90, RegDest),
    op("PLO", 0xA0, RegDest),
    op("PHI", 0xB0, RegDest),
    // Long branches and skips
    op("LBR", 0xC0, LongAddr16),
    op("LBQ", 0xC1, LongAddr16),
    op("LBZ", 0xC2, LongAddr16),
    op("LBDF", 0xC3, LongAddr16),
    op("NOP", 0xC4, Implied),
    op("LSNQ", 0xC5, Implied),
    op("LSNZ", 0xC6, Implied),
    op("LSNF", 0xC7, Implied),
    op("LSKP", 0xC8, Implied),
    op("LBNQ", 0xC9, LongAddr16),
    op("LBNZ", 0xCA, LongAddr16),
    op("LBNF", 0xCB, LongAddr16),
    op("LSIE", 0xCC, Implied),
    op("LSQ", 0xCD, Implied),
    op("LSZ", 0xCE, Implied),
    op("LSDF", 0xCF, Implied),
    op("SEP", 0xD0, RegDest),
    op("SEX", 0xE0, RegDest),
    // ALU
    op("LDX", 0xF0, Implied),
    op("OR", 0xF1, Implied),
    op("AND", 0xF2, Implied),
    op("XOR", 0xF3, Implied),
    op("ADD", 0xF4, Implied),
    op("SD", 0xF5, Implied),
    op("SHR", 0xF6, Implied),
    op("SM", 0xF7, Implied),
    op("LDI", 0xF8, Immediate8),
    op("ORI", 0xF9, Immediate8),
    op("ANI", 0xFA, Immediate8),
    op("XRI", 0xFB, Immediate8),
    op("ADI", 0xFC, Immediate8),
    op("SDI", 0xFD, Immediate8),
    op("SHL", 0xFE, Implied),
    op("SMI", 0xFF, Immediate8),
];

lazy_static! {
    pub static ref OPCODE_TABLE: OpcodeTable = OpcodeTable::build(INSTRUCTION_SET)
        .expect("built-in 1802 instruction set claims each opcode at most once");
}

/// 256-entry decode table, one slot per opcode byte
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    slots: [Option<InstructionDescriptor>; 256],
}

impl OpcodeTable {
    /// Expand each descriptor over its claimed range.
    ///
    /// A slot may be claimed once; a second claim is reported as a collision.
    pub fn build(descriptors: &[InstructionDescriptor]) -> Result<Self, OpcodeTableError> {
        let mut slots = [None; 256];

        for desc in descriptors {
            let offsets = desc.shape.claimed_offsets();
            if desc.base_code.checked_add(*offsets.end()).is_none() {
                return Err(OpcodeTableError::OutOfRange {
                    base: desc.base_code,
                    mnemonic: desc.mnemonic,
                });
            }

            for offset in offsets {
                let code = desc.base_code + offset;
                let slot: &mut Option<InstructionDescriptor> = &mut slots[code as usize];
                if let Some(existing) = slot {
                    return Err(OpcodeTableError::Collision {
                        code,
                        mnemonic: desc.mnemonic,
                        existing: existing.mnemonic,
                    });
                }
                *slot = Some(*desc);
            }
        }

        let table = OpcodeTable { slots };
        debug!(
            "Opcode table built: {} claimed, {} illegal",
            table.claimed_count(),
            256 - table.claimed_count()
        );
        Ok(table)
    }

    /// Descriptor for `code`, or the `???` placeholder
    pub fn lookup(&self, code: u8) -> &InstructionDescriptor {
        self.slots[code as usize].as_ref().unwrap_or(&ILLEGAL)
    }

    pub fn is_claimed(&self, code: u8) -> bool {
        self.slots[code as usize].is_some()
    }

    pub fn claimed_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
