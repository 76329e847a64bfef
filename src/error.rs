// Disassembler error handling

use thiserror::Error;

/// Failures while reading a binary image into memory.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("line {line}: checksum mismatch (record says {expected:02X}, computed {computed:02X})")]
    Checksum {
        line: usize,
        expected: u8,
        computed: u8,
    },

    #[error("line {line}: unsupported record type {kind:02X}")]
    UnsupportedRecord { line: usize, kind: u8 },

    #[error("line {line}: data runs past the end of the 16-bit address space")]
    AddressOverflow { line: usize },

    #[error("binary of {len} bytes does not fit at base {base:04X}")]
    TooLarge { base: u16, len: usize },

    #[error("image contains no data")]
    Empty,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while reading the code/data annotation file.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("annotation file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("area {start:#06x}..{end:#06x} is empty or outside the address space")]
    InvalidArea { start: u32, end: u32 },

    #[error("label address {address:#x} is outside the address space")]
    LabelOutOfRange { address: u32 },

    #[error("empty label name for address {address:04X}")]
    EmptyName { address: u16 },

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("address {address:04X} is already named {existing}")]
    Duplicate { address: u16, existing: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpcodeTableError {
    #[error("{mnemonic} claims opcode {code:02X}, already taken by {existing}")]
    Collision {
        code: u8,
        mnemonic: &'static str,
        existing: &'static str,
    },

    #[error("{mnemonic} at base {base:02X} claims codes past FF")]
    OutOfRange { base: u8, mnemonic: &'static str },
}

/// Failures raised by the decode engine itself.
#[derive(Error, Debug)]
pub enum DisasmError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("emit pass reached unbound target {address:04X}; discover pass was skipped or diverged")]
    PassDivergence { address: u16 },

    #[error("writing listing: {0}")]
    Output(#[from] std::io::Error),
}
