use crate::error::ImageError;
use log::{debug, info, warn};
use std::fmt::{Debug, Display, Error, Formatter};
use std::fs;
use std::path::Path;

/// Size of the 1802 address space
pub const ADDRESS_SPACE: usize = 0x10000;

/// MemoryImage is the full 64K address space plus the extent that was actually loaded
pub struct MemoryImage {
    bytes: Vec<u8>,
    /// Lowest loaded address
    start: u32,
    /// One past the highest loaded address
    end: u32,
}

impl MemoryImage {
    fn empty() -> Self {
        MemoryImage {
            bytes: vec![0u8; ADDRESS_SPACE],
            start: ADDRESS_SPACE as u32,
            end: 0,
        }
    }

    /// Load a raw binary at `base`
    pub fn from_binary(base: u16, data: &[u8]) -> Result<Self, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        let base_addr = base as usize;
        if base_addr + data.len() > ADDRESS_SPACE {
            return Err(ImageError::TooLarge {
                base,
                len: data.len(),
            });
        }

        let mut image = Self::empty();
        image.store(base as u32, data);
        info!(
            "Loaded {} raw bytes at {:04X}..{:04X}",
            data.len(),
            image.start,
            image.end
        );
        Ok(image)
    }

    /// Parse Intel HEX text
    pub fn from_intel_hex(text: &str) -> Result<Self, ImageError> {
        let mut image = Self::empty();
        let mut seen_eof = false;
        let mut data_bytes = 0usize;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let record = raw.trim();
            if record.is_empty() {
                continue;
            }

            let record = parse_record(record, line)?;
            match record.kind {
                0x00 => {
                    let address = record.address as u32;
                    if address as usize + record.data.len() > ADDRESS_SPACE {
                        return Err(ImageError::AddressOverflow { line });
                    }
                    image.store(address, &record.data);
                    data_bytes += record.data.len();
                }
                0x01 => {
                    seen_eof = true;
                    break;
                }
                0x02 | 0x04 => {
                    // Segment and linear bases only make sense at zero in a 16-bit space
                    if record.data.iter().any(|&b| b != 0) {
                        return Err(ImageError::UnsupportedRecord {
                            line,
                            kind: record.kind,
                        });
                    }
                }
                0x03 | 0x05 => {
                    debug!("line {}: ignoring start address record", line);
                }
                kind => return Err(ImageError::UnsupportedRecord { line, kind }),
            }
        }

        if !seen_eof {
            warn!("hex image has no end-of-file record");
        }
        if data_bytes == 0 {
            return Err(ImageError::Empty);
        }

        info!(
            "Loaded {} bytes from hex records, extent {:04X}..{:04X}",
            data_bytes, image.start, image.end
        );
        Ok(image)
    }

    pub fn load_intel_hex_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let text = fs::read_to_string(path)?;
        Self::from_intel_hex(&text)
    }

    pub fn load_binary_file<P: AsRef<Path>>(path: P, base: u16) -> Result<Self, ImageError> {
        let data = fs::read(path)?;
        Self::from_binary(base, &data)
    }

    fn store(&mut self, address: u32, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let from = address as usize;
        self.bytes[from..from + data.len()].copy_from_slice(data);
        self.start = self.start.min(address);
        self.end = self.end.max(address + data.len() as u32);
    }

    /// Byte at `addr`; addresses wrap at the top of the 16-bit space
    pub fn byte(&self, addr: u32) -> u8 {
        self.bytes[(addr as usize) & (ADDRESS_SPACE - 1)]
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for MemoryImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "image {:04X}..{:04X} ({} bytes)",
            self.start,
            self.end,
            self.len()
        )
    }
}

impl Debug for MemoryImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_struct("MemoryImage")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

struct HexRecord {
    address: u16,
    kind: u8,
    data: Vec<u8>,
}

fn parse_record(record: &str, line: usize) -> Result<HexRecord, ImageError> {
    let malformed = |reason: &str| ImageError::Malformed {
        line,
        reason: reason.to_string(),
    };

    let body = record
        .strip_prefix(':')
        .ok_or_else(|| malformed("record does not start with ':'"))?;
    if !body.is_ascii() {
        return Err(malformed("invalid hex digit"));
    }
    if body.len() % 2 != 0 {
        return Err(malformed("odd number of hex digits"));
    }

    let bytes = (0..body.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&body[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| malformed("invalid hex digit"))?;

    // length, address (2), type, checksum
    if bytes.len() < 5 {
        return Err(malformed("record too short"));
    }
    let count = bytes[0] as usize;
    if bytes.len() != count + 5 {
        return Err(malformed("byte count does not match record length"));
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - 1);
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let computed = sum.wrapping_neg();
    if computed != checksum[0] {
        return Err(ImageError::Checksum {
            line,
            expected: checksum[0],
            computed,
        });
    }

    Ok(HexRecord {
        address: ((bytes[1] as u16) << 8) | bytes[2] as u16,
        kind: bytes[3],
        data: bytes[4..4 + count].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_single_data_record() {
        let image = MemoryImage::from_intel_hex(":04000000F8053A00C5\n:00000001FF\n").unwrap();
        assert_eq!(image.start(), 0x0000);
        assert_eq!(image.end(), 0x0004);
        assert_eq!(image.byte(0), 0xF8);
        assert_eq!(image.byte(1), 0x05);
        assert_eq!(image.byte(2), 0x3A);
        assert_eq!(image.byte(3), 0x00);
    }

    #[test]
    fn test_extent_covers_all_records() {
        let text = ":0320000012345641\n:011000007F70\n:00000001FF\n";
        let image = MemoryImage::from_intel_hex(text).unwrap();
        assert_eq!(image.start(), 0x1000);
        assert_eq!(image.end(), 0x2003);
        assert_eq!(image.byte(0x1000), 0x7F);
        assert_eq!(image.byte(0x2001), 0x34);
        // gap between records reads as zero
        assert_eq!(image.byte(0x1800), 0x00);
    }

    #[test]
    fn test_records_after_eof_ignored() {
        let text = ":01000000C43B\n:00000001FF\n:01000100C43A\n";
        let image = MemoryImage::from_intel_hex(text).unwrap();
        assert_eq!(image.end(), 1);
    }

    #[test]
    fn test_bad_checksum() {
        let err = MemoryImage::from_intel_hex(":04000000F8053A00C6\n").unwrap_err();
        assert!(matches!(
            err,
            ImageError::Checksum {
                line: 1,
                expected: 0xC6,
                computed: 0xC5
            }
        ));
    }

    #[test]
    fn test_missing_colon() {
        let err = MemoryImage::from_intel_hex("04000000F8053A00C5\n").unwrap_err();
        assert!(matches!(err, ImageError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = MemoryImage::from_intel_hex(":05000000F8053A00C5\n").unwrap_err();
        assert!(matches!(err, ImageError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_nonzero_segment_rejected() {
        let err = MemoryImage::from_intel_hex(":020000021000EC\n").unwrap_err();
        assert!(matches!(
            err,
            ImageError::UnsupportedRecord { line: 1, kind: 0x02 }
        ));
    }

    #[test]
    fn test_empty_image() {
        let err = MemoryImage::from_intel_hex(":00000001FF\n").unwrap_err();
        assert!(matches!(err, ImageError::Empty));
    }

    #[test]
    fn test_binary_at_base() {
        let image = MemoryImage::from_binary(0x8000, &[0xC4, 0xC4]).unwrap();
        assert_eq!(image.start(), 0x8000);
        assert_eq!(image.end(), 0x8002);
        assert_eq!(image.len(), 2);
    }

    #[test]
    fn test_binary_reaching_top_of_memory() {
        let image = MemoryImage::from_binary(0xFFFE, &[0x30, 0x00]).unwrap();
        assert_eq!(image.end(), 0x10000);
        assert!(MemoryImage::from_binary(0xFFFF, &[0x30, 0x00]).is_err());
    }

    #[test]
    fn test_byte_wraps_past_top() {
        let image = MemoryImage::from_binary(0x0000, &[0xAB]).unwrap();
        assert_eq!(image.byte(0x10000), 0xAB);
    }
}
