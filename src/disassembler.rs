use crate::error::DisasmError;
use crate::image::MemoryImage;
use crate::instruction::Instruction;
use crate::listing::{self, DataRun, ListingSink, NullSink, OutputOptions};
use crate::memory_map::{AreaKind, MemoryAreaIndex};
use crate::opcode_tables::{OpcodeTable, OPCODE_TABLE};
use crate::symbols::SymbolTable;
use log::{debug, warn};

/// Which of the two walks is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Bind a name to every branch target reached in code
    Discover,
    /// Produce the listing from the completed symbol table
    Emit,
}

/// Two-pass 1802 disassembler.
///
/// Both passes walk `[image.start, image.end)` identically; only `Emit` writes lines, and only
/// `Discover` may bind new labels. The emit pass meeting an unbound target means the passes
/// diverged (or discover never ran) and is reported as `DisasmError::PassDivergence`.
pub struct Disassembler<'a> {
    image: &'a MemoryImage,
    areas: &'a MemoryAreaIndex,
    opcodes: &'a OpcodeTable,
    symbols: SymbolTable,
    options: OutputOptions,
}

impl<'a> Disassembler<'a> {
    /// Disassembler over the built-in 1802 table, seeded with user labels
    pub fn new(image: &'a MemoryImage, areas: &'a MemoryAreaIndex, symbols: SymbolTable) -> Self {
        Self::with_table(image, areas, &OPCODE_TABLE, symbols)
    }

    pub fn with_table(
        image: &'a MemoryImage,
        areas: &'a MemoryAreaIndex,
        opcodes: &'a OpcodeTable,
        symbols: SymbolTable,
    ) -> Self {
        debug!(
            "Disassembler over {:04X}..{:04X}, {} areas, {} user labels",
            image.start(),
            image.end(),
            areas.areas().len(),
            symbols.len()
        );
        Disassembler {
            image,
            areas,
            opcodes,
            symbols,
            options: OutputOptions::default(),
        }
    }

    pub fn set_output_options(&mut self, options: OutputOptions) {
        self.options = options;
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    /// Pass 1: bind every branch target
    pub fn discover(&mut self) -> Result<(), DisasmError> {
        let before = self.symbols.len();
        self.walk(Pass::Discover, &mut NullSink)?;
        debug!(
            "Discover pass bound {} new labels ({} total)",
            self.symbols.len() - before,
            self.symbols.len()
        );
        Ok(())
    }

    /// Pass 2: write the listing
    pub fn emit(&mut self, sink: &mut dyn ListingSink) -> Result<(), DisasmError> {
        self.walk(Pass::Emit, sink)?;
        debug!("Emit pass complete");
        Ok(())
    }

    /// Both passes in order
    pub fn run(&mut self, sink: &mut dyn ListingSink) -> Result<(), DisasmError> {
        self.discover()?;
        self.emit(sink)
    }

    /// Convenience wrapper returning the listing as lines
    pub fn listing(&mut self) -> Result<Vec<String>, DisasmError> {
        let mut lines = Vec::new();
        self.run(&mut lines)?;
        Ok(lines)
    }

    fn walk(&mut self, pass: Pass, sink: &mut dyn ListingSink) -> Result<(), DisasmError> {
        let image = self.image;
        let areas = self.areas;
        let end = image.end();
        let mut cursor = areas.cursor();
        let mut data = DataRun::new(&self.options);
        let mut addr = image.start();

        while addr < end {
            if pass == Pass::Emit {
                if let Some(name) = self.symbols.lookup(addr as u16) {
                    data.flush(sink)?;
                    sink.push_line(&listing::label_line(name))?;
                }
            }

            let step = cursor.advance(addr);
            if step.changed {
                data.flush(sink)?;
            }

            match step.kind {
                AreaKind::Code => {
                    let inst = Instruction::decode(image, addr, self.opcodes);
                    let operand = match inst.target() {
                        Some(target) => self.resolve_target(pass, target)?,
                        None => inst.operand.to_string(),
                    };

                    if pass == Pass::Emit {
                        let raw: Vec<u8> = (0..inst.size).map(|i| image.byte(addr + i)).collect();
                        let line = listing::instruction_line(&inst, &operand, &raw, &self.options);
                        sink.push_line(&line)?;
                    }

                    if addr + inst.size > end && pass == Pass::Discover {
                        warn!(
                            "{} at {:04X} reads operand bytes past the end of the image ({:04X})",
                            inst.mnemonic(),
                            addr,
                            end
                        );
                    }
                    addr += inst.size;
                }
                AreaKind::Data => {
                    data.push(addr, image.byte(addr), sink)?;
                    addr += 1;
                }
            }
        }

        data.flush(sink)?;
        if pass == Pass::Emit {
            sink.push_line(&listing::end_line())?;
        }
        Ok(())
    }

    /// Name for a branch target, binding a synthetic one during discovery
    fn resolve_target(&mut self, pass: Pass, target: u16) -> Result<String, DisasmError> {
        if !self.symbols.has_name(target) {
            match pass {
                Pass::Discover => {
                    self.symbols
                        .add(SymbolTable::synthetic_name(target), target)?;
                }
                Pass::Emit => return Err(DisasmError::PassDivergence { address: target }),
            }
        }
        Ok(self.symbols.get_name(target))
    }
}
