use crate::image::MemoryImage;
use crate::opcode_tables::OpcodeTable;
use log::debug;
use std::fmt::{Display, Error, Formatter};
use std::ops::RangeInclusive;

/// Operand shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// No operand
    Implied,
    /// Register 0-F in the low nibble
    RegDest,
    /// Register 1-F in the low nibble; the base code is a different instruction
    RegSrcNonzero,
    /// I/O device 1-7 in the low three bits
    Device,
    /// One immediate byte follows
    Immediate8,
    /// One byte follows, replacing the low byte of the current address
    ShortAddr8,
    /// Two bytes follow, high byte first
    LongAddr16,
}

impl OperandShape {
    /// Offsets from the base code that a descriptor of this shape claims
    pub fn claimed_offsets(&self) -> RangeInclusive<u8> {
        match self {
            OperandShape::RegDest => 0..=15,
            OperandShape::RegSrcNonzero => 1..=15,
            OperandShape::Device => 1..=7,
            OperandShape::Implied
            | OperandShape::Immediate8
            | OperandShape::ShortAddr8
            | OperandShape::LongAddr16 => 0..=0,
        }
    }

    /// Number of bytes following the opcode
    pub fn operand_bytes(&self) -> u32 {
        match self {
            OperandShape::Immediate8 | OperandShape::ShortAddr8 => 1,
            OperandShape::LongAddr16 => 2,
            _ => 0,
        }
    }
}

/// One entry of the declarative instruction list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub mnemonic: &'static str,
    pub base_code: u8,
    pub shape: OperandShape,
}

impl InstructionDescriptor {
    pub const fn new(mnemonic: &'static str, base_code: u8, shape: OperandShape) -> Self {
        Self {
            mnemonic,
            base_code,
            shape,
        }
    }

    /// True when `code` falls inside this descriptor's claimed range
    pub fn claims(&self, code: u8) -> bool {
        match code.checked_sub(self.base_code) {
            Some(offset) => self.shape.claimed_offsets().contains(&offset),
            None => false,
        }
    }
}

/// Placeholder for codes no descriptor claims
pub const ILLEGAL: InstructionDescriptor = InstructionDescriptor::new("???", 0, OperandShape::Implied);

/// Decoded operand value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Register(u8),
    Device(u8),
    Immediate(u8),
    /// Branch or jump target address
    Target(u16),
}

/// A decoded 1802 instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the opcode byte
    pub address: u32,
    pub opcode: u8,
    pub descriptor: InstructionDescriptor,
    pub operand: Operand,
    /// Opcode plus operand bytes
    pub size: u32,
}

impl Instruction {
    /// Decode the instruction whose opcode sits at `addr`.
    ///
    /// Never fails: unclaimed codes come back as `???` with no operand.
    pub fn decode(image: &MemoryImage, addr: u32, table: &OpcodeTable) -> Self {
        let opcode = image.byte(addr);
        let descriptor = *table.lookup(opcode);

        let operand = match descriptor.shape {
            OperandShape::Implied => Operand::None,
            OperandShape::RegDest | OperandShape::RegSrcNonzero => Operand::Register(opcode & 0x0F),
            OperandShape::Device => Operand::Device(opcode & 0x07),
            OperandShape::Immediate8 => Operand::Immediate(image.byte(addr + 1)),
            OperandShape::ShortAddr8 => {
                let page = (addr as u16) & 0xFF00;
                Operand::Target(page | image.byte(addr + 1) as u16)
            }
            OperandShape::LongAddr16 => {
                let high = image.byte(addr + 1) as u16;
                let low = image.byte(addr + 2) as u16;
                Operand::Target((high << 8) | low)
            }
        };

        if descriptor == ILLEGAL {
            debug!("Illegal opcode {:02X} at {:04X}", opcode, addr);
        }

        Instruction {
            address: addr,
            opcode,
            descriptor,
            operand,
            size: 1 + descriptor.shape.operand_bytes(),
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        self.descriptor.mnemonic
    }

    /// Branch target, if this instruction carries one
    pub fn target(&self) -> Option<u16> {
        match self.operand {
            Operand::Target(addr) => Some(addr),
            _ => None,
        }
    }
}

impl Display for Operand {
    /// Operand text for everything except targets, which need the symbol table
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Operand::None => Ok(()),
            Operand::Register(r) => write!(f, "{:X}", r),
            Operand::Device(d) => write!(f, "{}", d),
            Operand::Immediate(value) => write!(f, "#{:02X}", value),
            Operand::Target(addr) => write!(f, "{:04X}", addr),
        }
    }
}
