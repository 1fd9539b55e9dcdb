use indexmap::IndexMap;

use crate::error::AssembleError;
use crate::parser::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Label,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub address: u8,
}

/// Labels and variables share one namespace. Variables additionally get their
/// initial values recorded in declaration order, which is also what fixes
/// their addresses: the n-th declared variable lives at `base - n`.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
    values: Vec<u16>,
    base: Option<u8>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base(&mut self, base: u8) {
        self.base = Some(base);
    }

    pub fn base(&self) -> Option<u8> {
        self.base
    }

    pub fn variable_values(&self) -> &[u16] {
        &self.values
    }

    pub fn declare_label(
        &mut self,
        name: &str,
        word_index: usize,
        line: usize,
    ) -> Result<(), AssembleError> {
        self.insert(
            name,
            Symbol {
                kind: SymbolKind::Label,
                address: word_index as u8,
            },
            line,
        )
    }

    pub fn declare_variable(
        &mut self,
        name: &str,
        value: u16,
        line: usize,
    ) -> Result<(), AssembleError> {
        let base = self
            .base
            .ok_or(AssembleError::VariableAddressUnset { line })?;
        let address = base.wrapping_sub(self.values.len() as u8);
        self.insert(
            name,
            Symbol {
                kind: SymbolKind::Variable,
                address,
            },
            line,
        )?;
        self.values.push(value);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<u8> {
        self.symbols.get(name).map(|s| s.address)
    }

    pub fn variable_address(&self, name: &str) -> Option<u8> {
        self.symbols
            .get(name)
            .filter(|s| s.kind == SymbolKind::Variable)
            .map(|s| s.address)
    }

    /// The numeric literal resolver: a number stands for itself, a name for
    /// the address of an already-declared variable.
    pub fn resolve_token(&self, token: &Token, line: usize) -> Result<u16, AssembleError> {
        match token {
            Token::Number(n) => Ok(*n),
            Token::Name(name) => self
                .variable_address(name)
                .map(u16::from)
                .ok_or_else(|| AssembleError::LiteralParse {
                    token: name.clone(),
                    line,
                }),
        }
    }

    fn insert(&mut self, name: &str, symbol: Symbol, line: usize) -> Result<(), AssembleError> {
        if self.symbols.contains_key(name) {
            return Err(AssembleError::DuplicateSymbol {
                name: name.to_owned(),
                line,
            });
        }
        self.symbols.insert(name.to_owned(), symbol);
        Ok(())
    }
}
