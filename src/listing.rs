//! Listing lines and the sinks that receive them

use crate::instruction::Instruction;
use std::io::{self, Write};

/// Width of the text before an optional `;` comment column
const COMMENT_COLUMN: usize = 32;

/// Output formatting options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// A data line is flushed once its byte text grows past this many characters
    pub data_line_width: usize,
    /// Append `; AAAA` with the address of each line (-n flag)
    pub show_addresses: bool,
    /// Append raw instruction bytes (-d flag)
    pub dump_hex: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            data_line_width: 48,
            show_addresses: false,
            dump_hex: false,
        }
    }
}

/// Receives listing lines in emission order
pub trait ListingSink {
    fn push_line(&mut self, line: &str) -> io::Result<()>;
}

impl ListingSink for Vec<String> {
    fn push_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line followed by a newline
pub struct WriteSink<W: Write> {
    out: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(out: W) -> Self {
        WriteSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ListingSink for WriteSink<W> {
    fn push_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }
}

/// Drops everything; the discover pass writes here
pub(crate) struct NullSink;

impl ListingSink for NullSink {
    fn push_line(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

pub fn label_line(name: &str) -> String {
    format!("{}:", name)
}

pub fn end_line() -> String {
    "    END".to_string()
}

/// `    MNEMONIC  operand`, with no trailing blanks when there is no operand
pub fn instruction_line(
    inst: &Instruction,
    operand: &str,
    raw: &[u8],
    options: &OutputOptions,
) -> String {
    let mut line = if operand.is_empty() {
        format!("    {}", inst.mnemonic())
    } else {
        format!("    {}  {}", inst.mnemonic(), operand)
    };

    if options.show_addresses || options.dump_hex {
        let mut comment = String::new();
        if options.show_addresses {
            comment.push_str(&format!("{:04X}", inst.address as u16));
        }
        if options.dump_hex {
            for byte in raw {
                if !comment.is_empty() {
                    comment.push(' ');
                }
                comment.push_str(&format!("{:02X}", byte));
            }
        }
        append_comment(&mut line, &comment);
    }
    line
}

/// Pending run of inline data bytes
#[derive(Debug)]
pub struct DataRun {
    start: u32,
    text: String,
    width: usize,
    show_addresses: bool,
}

impl DataRun {
    pub fn new(options: &OutputOptions) -> Self {
        DataRun {
            start: 0,
            text: String::new(),
            width: options.data_line_width,
            show_addresses: options.show_addresses,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Add a byte, flushing the run once its text passes the width
    pub fn push(&mut self, addr: u32, byte: u8, sink: &mut dyn ListingSink) -> io::Result<()> {
        if self.text.is_empty() {
            self.start = addr;
        } else {
            self.text.push(',');
        }
        self.text.push_str(&format!("#{:02X}", byte));

        if self.text.len() > self.width {
            self.flush(sink)?;
        }
        Ok(())
    }

    pub fn flush(&mut self, sink: &mut dyn ListingSink) -> io::Result<()> {
        if self.text.is_empty() {
            return Ok(());
        }
        let mut line = format!("    {}", self.text);
        if self.show_addresses {
            append_comment(&mut line, &format!("{:04X}", self.start as u16));
        }
        self.text.clear();
        sink.push_line(&line)
    }
}

fn append_comment(line: &mut String, comment: &str) {
    if comment.is_empty() {
        return;
    }
    while line.len() < COMMENT_COLUMN {
        line.push(' ');
    }
    line.push_str(" ; ");
    line.push_str(comment);
}
