//! Address to label name bindings

use crate::error::SymbolError;
use indexmap::IndexMap;
use log::debug;

/// Label bindings, kept in the order they were made.
///
/// User labels are bound before decoding starts; the discover pass then appends one
/// synthetic `Lxxxx` name per new branch target. A binding never changes once made.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: IndexMap<u16, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_name(&self, address: u16) -> bool {
        self.names.contains_key(&address)
    }

    /// Bind `name` to `address`.
    ///
    /// Callers check `has_name` first; binding a named address is an error.
    pub fn add(&mut self, name: impl Into<String>, address: u16) -> Result<(), SymbolError> {
        if let Some(existing) = self.names.get(&address) {
            return Err(SymbolError::Duplicate {
                address,
                existing: existing.clone(),
            });
        }
        let name = name.into();
        debug!("Label {} = {:04X}", name, address);
        self.names.insert(address, name);
        Ok(())
    }

    /// Bound name, or the synthetic form without binding it
    pub fn get_name(&self, address: u16) -> String {
        match self.names.get(&address) {
            Some(name) => name.clone(),
            None => Self::synthetic_name(address),
        }
    }

    pub fn lookup(&self, address: u16) -> Option<&str> {
        self.names.get(&address).map(String::as_str)
    }

    pub fn synthetic_name(address: u16) -> String {
        format!("L{:04X}", address)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bindings in the order they were made
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.names.iter().map(|(addr, name)| (*addr, name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_add_and_lookup() {
        let mut table = SymbolTable::new();
        assert!(!table.has_name(0x0100));
        table.add("START", 0x0100).unwrap();
        assert!(table.has_name(0x0100));
        assert_eq!(table.get_name(0x0100), "START");
        assert_eq!(table.lookup(0x0100), Some("START"));
    }

    #[test]
    fn test_get_name_does_not_bind() {
        let table = SymbolTable::new();
        assert_eq!(table.get_name(0x00AB), "L00AB");
        assert!(!table.has_name(0x00AB));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut table = SymbolTable::new();
        table.add("START", 0x0000).unwrap();
        let err = table.add("L0000", 0x0000).unwrap_err();
        assert_eq!(
            err,
            SymbolError::Duplicate {
                address: 0x0000,
                existing: "START".to_string()
            }
        );
        assert_eq!(table.get_name(0x0000), "START");
    }

    #[test]
    fn test_iteration_in_binding_order() {
        let mut table = SymbolTable::new();
        table.add("B", 0x0200).unwrap();
        table.add("A", 0x0100).unwrap();
        let order: Vec<_> = table.iter().collect();
        assert_eq!(order, vec![(0x0200, "B"), (0x0100, "A")]);
    }
}
