//! Code/data annotation files
//!
//! ```toml
//! [[area]]
//! kind = "code"
//! start = 0x0000
//! end = 0x0100
//!
//! [labels]
//! START = 0x0000
//! ```

use crate::error::AnnotationError;
use crate::image::ADDRESS_SPACE;
use crate::memory_map::{AreaKind, MemoryArea, MemoryAreaIndex};
use crate::symbols::SymbolTable;
use indexmap::IndexMap;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnnotationFile {
    #[serde(default, rename = "area")]
    areas: Vec<AreaEntry>,
    #[serde(default)]
    labels: IndexMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AreaEntry {
    kind: AreaKind,
    start: u32,
    end: u32,
}

/// Areas and user labels read from an annotation file
#[derive(Debug)]
pub struct Annotations {
    pub areas: MemoryAreaIndex,
    pub symbols: SymbolTable,
}

impl Annotations {
    /// Used when no annotation file is given: everything loaded is code
    pub fn whole_image_as_code(start: u32, end: u32) -> Self {
        Annotations {
            areas: MemoryAreaIndex::all_code(start, end),
            symbols: SymbolTable::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, AnnotationError> {
        let file: AnnotationFile = toml::from_str(text)?;

        let mut areas = Vec::with_capacity(file.areas.len());
        for entry in &file.areas {
            if entry.start >= entry.end || entry.end as usize > ADDRESS_SPACE {
                return Err(AnnotationError::InvalidArea {
                    start: entry.start,
                    end: entry.end,
                });
            }
            areas.push(MemoryArea::new(entry.kind, entry.start, entry.end));
        }

        let mut symbols = SymbolTable::new();
        for (name, &address) in &file.labels {
            let address = u16::try_from(address)
                .map_err(|_| AnnotationError::LabelOutOfRange { address })?;
            if name.trim().is_empty() {
                return Err(AnnotationError::EmptyName { address });
            }
            if let Some(existing) = symbols.lookup(address) {
                warn!(
                    "label {} ignored: {:04X} is already named {}",
                    name, address, existing
                );
                continue;
            }
            symbols.add(name.as_str(), address)?;
        }

        info!(
            "Annotations: {} areas, {} labels",
            areas.len(),
            symbols.len()
        );
        Ok(Annotations {
            areas: MemoryAreaIndex::new(areas),
            symbols,
        })
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
