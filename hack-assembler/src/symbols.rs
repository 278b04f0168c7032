use phf::phf_map;
use std::collections::HashMap;

/// Predefined symbols, fixed by the Hack platform.
pub static PREDEFINED: phf::Map<&'static str, u16> = phf_map! {
    "R0" => 0, "R1" => 1, "R2" => 2, "R3" => 3,
    "R4" => 4, "R5" => 5, "R6" => 6, "R7" => 7,
    "R8" => 8, "R9" => 9, "R10" => 10, "R11" => 11,
    "R12" => 12, "R13" => 13, "R14" => 14, "R15" => 15,
    "SP" => 0, "LCL" => 1, "ARG" => 2, "THIS" => 3, "THAT" => 4,
    "SCREEN" => 16384, "KBD" => 24576,
};

/// First RAM address handed out to user variables.
const FIRST_VARIABLE_ADDRESS: u16 = 16;

pub struct SymbolTable {
    symbols: HashMap<String, u16>,
    next_var_address: u16,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::with_capacity(64),
            next_var_address: FIRST_VARIABLE_ADDRESS,
        }
    }

    /// Bind a `(LABEL)` to a ROM address. Returns the name back on redefinition.
    pub fn add_label(&mut self, label: String, address: u16) -> std::result::Result<(), String> {
        if PREDEFINED.contains_key(label.as_str()) || self.symbols.contains_key(&label) {
            return Err(label);
        }
        self.symbols.insert(label, address);
        Ok(())
    }

    /// Resolve a symbol, allocating the next free RAM address on first sight.
    pub fn get_or_allocate(&mut self, symbol: &str) -> u16 {
        if let Some(&addr) = PREDEFINED.get(symbol) {
            return addr;
        }

        if let Some(&addr) = self.symbols.get(symbol) {
            return addr;
        }

        let addr = self.next_var_address;
        self.symbols.insert(symbol.to_string(), addr);
        self.next_var_address += 1;
        addr
    }

    pub fn get(&self, symbol: &str) -> Option<u16> {
        PREDEFINED
            .get(symbol)
            .copied()
            .or_else(|| self.symbols.get(symbol).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_environment() {
        let table = SymbolTable::new();
        assert_eq!(table.get("R0"), Some(0));
        assert_eq!(table.get("R15"), Some(15));
        assert_eq!(table.get("SP"), Some(0));
        assert_eq!(table.get("LCL"), Some(1));
        assert_eq!(table.get("ARG"), Some(2));
        assert_eq!(table.get("THIS"), Some(3));
        assert_eq!(table.get("THAT"), Some(4));
        assert_eq!(table.get("SCREEN"), Some(16384));
        assert_eq!(table.get("KBD"), Some(24576));
    }

    #[test]
    fn labels_bind_once() {
        let mut table = SymbolTable::new();
        assert!(table.add_label("LOOP".to_string(), 10).is_ok());
        assert_eq!(table.get("LOOP"), Some(10));
        assert_eq!(table.add_label("LOOP".to_string(), 20), Err("LOOP".to_string()));
    }

    #[test]
    fn predefined_names_cannot_be_labels() {
        let mut table = SymbolTable::new();
        assert!(table.add_label("SCREEN".to_string(), 3).is_err());
    }

    #[test]
    fn variables_allocate_from_16() {
        let mut table = SymbolTable::new();
        assert_eq!(table.get_or_allocate("i"), 16);
        assert_eq!(table.get_or_allocate("j"), 17);
        assert_eq!(table.get_or_allocate("i"), 16);
    }

    #[test]
    fn allocation_never_shadows_predefined() {
        let mut table = SymbolTable::new();
        assert_eq!(table.get_or_allocate("KBD"), 24576);
        assert_eq!(table.get_or_allocate("first"), 16);
    }
}
