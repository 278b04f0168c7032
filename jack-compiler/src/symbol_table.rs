//! Two-scope symbol table for Jack compilation.
//!
//! Class scope holds `static` and `field` variables and persists across a
//! class's subroutines; subroutine scope holds arguments and locals and is
//! rebuilt at every subroutine entry. Each of the four kinds has its own
//! index counter, so indices are dense per kind. Lookup is subroutine scope
//! first, letting locals shadow class variables.

use crate::error::CompileError;
use jack_analyzer::ast::Type;
use jack_analyzer::token::Span;
use std::collections::HashMap;

/// Symbol kind; determines the VM segment the variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    /// VM segment for this kind.
    pub fn to_segment(self) -> &'static str {
        match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "this",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
        }
    }

    pub fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub symbol_type: Type,
    pub kind: SymbolKind,
    pub index: u16,
}

impl Symbol {
    pub fn segment(&self) -> &'static str {
        self.kind.to_segment()
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    static_count: u16,
    field_count: u16,
    argument_count: u16,
    local_count: u16,
    class_name: String,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            class_scope: HashMap::new(),
            subroutine_scope: HashMap::new(),
            static_count: 0,
            field_count: 0,
            argument_count: 0,
            local_count: 0,
            class_name: String::new(),
        }
    }

    /// Begin a new class: both scopes and all counters reset.
    pub fn start_class(&mut self, name: &str) {
        self.class_scope.clear();
        self.subroutine_scope.clear();
        self.static_count = 0;
        self.field_count = 0;
        self.argument_count = 0;
        self.local_count = 0;
        self.class_name = name.to_string();
    }

    /// Begin a new subroutine: subroutine scope and its two counters reset,
    /// class scope untouched.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.argument_count = 0;
        self.local_count = 0;
    }

    /// Define a symbol, assigning the next index of its kind.
    pub fn define(
        &mut self,
        name: &str,
        symbol_type: Type,
        kind: SymbolKind,
        span: Span,
    ) -> Result<(), CompileError> {
        let scope = if kind.is_class_level() {
            &self.class_scope
        } else {
            &self.subroutine_scope
        };

        if scope.contains_key(name) {
            return Err(CompileError::duplicate_definition(name, span));
        }

        let counter = match kind {
            SymbolKind::Static => &mut self.static_count,
            SymbolKind::Field => &mut self.field_count,
            SymbolKind::Argument => &mut self.argument_count,
            SymbolKind::Local => &mut self.local_count,
        };
        let index = *counter;
        *counter += 1;

        let symbol = Symbol {
            name: name.to_string(),
            symbol_type,
            kind,
            index,
        };

        if kind.is_class_level() {
            self.class_scope.insert(name.to_string(), symbol);
        } else {
            self.subroutine_scope.insert(name.to_string(), symbol);
        }

        Ok(())
    }

    /// Subroutine scope first, then class scope; `None` for unknown names.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        match kind {
            SymbolKind::Static => self.static_count,
            SymbolKind::Field => self.field_count,
            SymbolKind::Argument => self.argument_count,
            SymbolKind::Local => self.local_count,
        }
    }

    /// Field count, which sizes the constructor's Memory.alloc call.
    pub fn field_count(&self) -> u16 {
        self.field_count
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
