#![crate_name = "cosmac_dasm"]

#[macro_use]
extern crate lazy_static;

pub mod annotations;
pub mod disassembler;
pub mod error;
pub mod image;
pub mod instruction;
pub mod listing;
pub mod memory_map;
pub mod opcode_tables;
pub mod symbols;


pub use disassembler::{Disassembler, Pass};
pub use error::{AnnotationError, DisasmError, ImageError, OpcodeTableError, SymbolError};
pub use image::MemoryImage;
pub use listing::{ListingSink, OutputOptions, WriteSink};

/*
CDP1802 opcode map, by high nibble

0  IDL / LDN r      8  GLO r
1  INC r            9  GHI r
2  DEC r            A  PLO r
3  short branches   B  PHI r
4  LDA r            C  long branches and skips
5  STR r            D  SEP r
6  IRX / OUT / INP  E  SEX r
7  control, carry   F  ALU and immediates
*/
