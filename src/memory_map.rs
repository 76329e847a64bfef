use log::warn;
use serde::Deserialize;
use std::fmt::{Display, Error, Formatter};

/// How bytes inside an area are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaKind {
    Code,
    Data,
}

/// A half-open address range `[start, end)` tagged code or data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryArea {
    pub kind: AreaKind,
    pub start: u32,
    pub end: u32,
}

impl MemoryArea {
    pub fn new(kind: AreaKind, start: u32, end: u32) -> Self {
        MemoryArea { kind, start, end }
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr < self.end
    }
}

impl Display for MemoryArea {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let kind = match self.kind {
            AreaKind::Code => "code",
            AreaKind::Data => "data",
        };
        write!(f, "{} {:04X}..{:04X}", kind, self.start, self.end)
    }
}

/// Ordered list of areas, immutable once built
#[derive(Debug, Clone, Default)]
pub struct MemoryAreaIndex {
    areas: Vec<MemoryArea>,
}

impl MemoryAreaIndex {
    /// Sorts by start address (stable, so equal starts keep their given order)
    pub fn new(mut areas: Vec<MemoryArea>) -> Self {
        areas.sort_by_key(|area| area.start);
        for pair in areas.windows(2) {
            if pair[1].start < pair[0].end {
                warn!("areas overlap: {} and {}", pair[0], pair[1]);
            }
        }
        MemoryAreaIndex { areas }
    }

    /// A single code area, used when no annotations were supplied
    pub fn all_code(start: u32, end: u32) -> Self {
        Self::new(vec![MemoryArea::new(AreaKind::Code, start, end)])
    }

    pub fn areas(&self) -> &[MemoryArea] {
        &self.areas
    }

    pub fn cursor(&self) -> AreaCursor<'_> {
        AreaCursor {
            areas: &self.areas,
            index: 0,
            region: None,
            started: false,
        }
    }
}

/// Result of advancing the cursor to an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaStep {
    pub kind: AreaKind,
    /// The covering area differs from the previous address's
    pub changed: bool,
}

/// Forward-only walk over the areas.
///
/// Addresses passed to `advance` must not decrease.
pub struct AreaCursor<'a> {
    areas: &'a [MemoryArea],
    index: usize,
    /// Index of the area covering the last address, if any
    region: Option<usize>,
    started: bool,
}

impl<'a> AreaCursor<'a> {
    pub fn advance(&mut self, addr: u32) -> AreaStep {
        while self.index < self.areas.len() && self.areas[self.index].end <= addr {
            self.index += 1;
        }

        let region = match self.areas.get(self.index) {
            Some(area) if area.contains(addr) => Some(self.index),
            _ => None,
        };
        let kind = match region {
            Some(i) => self.areas[i].kind,
            None => AreaKind::Data,
        };

        let changed = self.started && region != self.region;
        self.region = region;
        self.started = true;
        AreaStep { kind, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn index(areas: &[(AreaKind, u32, u32)]) -> MemoryAreaIndex {
        MemoryAreaIndex::new(
            areas
                .iter()
                .map(|&(kind, start, end)| MemoryArea::new(kind, start, end))
                .collect(),
        )
    }

    #[test]
    fn test_kind_inside_and_outside_areas() {
        let idx = index(&[(AreaKind::Code, 0x10, 0x20)]);
        let mut cursor = idx.cursor();
        assert_eq!(cursor.advance(0x00).kind, AreaKind::Data);
        assert_eq!(cursor.advance(0x10).kind, AreaKind::Code);
        assert_eq!(cursor.advance(0x1F).kind, AreaKind::Code);
        assert_eq!(cursor.advance(0x20).kind, AreaKind::Data);
    }

    #[test]
    fn test_first_address_is_not_a_change() {
        let idx = index(&[(AreaKind::Data, 0x00, 0x10)]);
        let mut cursor = idx.cursor();
        assert!(!cursor.advance(0x00).changed);
        assert!(!cursor.advance(0x01).changed);
    }

    #[test]
    fn test_adjacent_same_kind_areas_report_change() {
        let idx = index(&[(AreaKind::Data, 0x00, 0x02), (AreaKind::Data, 0x02, 0x04)]);
        let mut cursor = idx.cursor();
        cursor.advance(0x00);
        assert!(!cursor.advance(0x01).changed);
        let step = cursor.advance(0x02);
        assert_eq!(step.kind, AreaKind::Data);
        assert!(step.changed);
    }

    #[test]
    fn test_leaving_area_into_gap_reports_change() {
        let idx = index(&[(AreaKind::Data, 0x00, 0x02), (AreaKind::Data, 0x08, 0x0A)]);
        let mut cursor = idx.cursor();
        cursor.advance(0x01);
        assert!(cursor.advance(0x02).changed);
        assert!(!cursor.advance(0x05).changed);
        assert!(cursor.advance(0x08).changed);
    }

    #[test]
    fn test_skipping_whole_area() {
        let idx = index(&[
            (AreaKind::Code, 0x00, 0x02),
            (AreaKind::Data, 0x02, 0x03),
            (AreaKind::Code, 0x03, 0x08),
        ]);
        let mut cursor = idx.cursor();
        cursor.advance(0x00);
        // long instruction consumed 0x01..0x03
        let step = cursor.advance(0x04);
        assert_eq!(step.kind, AreaKind::Code);
        assert!(step.changed);
    }

    #[test]
    fn test_areas_sorted_by_start() {
        let idx = index(&[(AreaKind::Data, 0x80, 0x90), (AreaKind::Code, 0x00, 0x80)]);
        assert_eq!(idx.areas()[0].start, 0x00);
        assert_eq!(idx.areas()[1].start, 0x80);
    }
}
