//! Operator overload and conversion tables
//!
//! Resolution is an exact match on the full ordered operand-type signature.
//! Type names are compared in normalized form (see `ident::normalize_type_name`),
//! there is no coercion search.

use crate::ident::normalize_type_name;
use crate::runtime::ClassId;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised while registering operators
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Same symbol with the same operand types registered twice
    #[error("operator '{symbol}' already defined for ({operands})")]
    Duplicate {
        /// Operator symbol
        symbol: String,
        /// Operand type names joined with `, `
        operands: String,
    },

    /// Same from/to conversion registered twice
    #[error("conversion from '{from}' to '{to}' already defined")]
    DuplicateConversion {
        /// Source type
        from: String,
        /// Target type
        to: String,
    },
}

/// One operator overload
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorEntry {
    /// Normalized symbol (`+`, `=`, `in`, `not`)
    pub symbol: String,
    /// Normalized operand type names in order
    pub operand_types: Vec<String>,
    /// Function or method implementing the operator
    pub binding: String,
    /// Owning class for class operators
    pub class: Option<ClassId>,
    /// Position of the implicit `Self` operand; `None` for static bindings
    pub self_index: Option<usize>,
    /// Whether the binding is a class (static) method
    pub is_class_method: bool,
}

impl OperatorEntry {
    /// Global operator bound to a free function
    pub fn global(symbol: &str, operand_types: &[String], binding: &str) -> Self {
        Self {
            symbol: symbol.to_ascii_lowercase(),
            operand_types: operand_types.iter().map(|t| normalize_type_name(t)).collect(),
            binding: binding.to_string(),
            class: None,
            self_index: None,
            is_class_method: false,
        }
    }

    /// Arity of the operator
    pub fn arity(&self) -> usize {
        self.operand_types.len()
    }
}

/// Operators keyed by symbol
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    entries: FxHashMap<String, Vec<OperatorEntry>>,
}

impl OperatorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry, rejecting an identical signature for the same symbol
    pub fn register(&mut self, entry: OperatorEntry) -> Result<(), OperatorError> {
        let list = self.entries.entry(entry.symbol.clone()).or_default();
        if list.iter().any(|e| e.operand_types == entry.operand_types) {
            return Err(OperatorError::Duplicate {
                symbol: entry.symbol,
                operands: entry.operand_types.join(", "),
            });
        }
        list.push(entry);
        Ok(())
    }

    /// Exact lookup by symbol and operand type names
    pub fn lookup(&self, symbol: &str, operand_types: &[String]) -> Option<&OperatorEntry> {
        let list = self.entries.get(&symbol.to_ascii_lowercase())?;
        list.iter().find(|e| {
            e.operand_types.len() == operand_types.len()
                && e.operand_types
                    .iter()
                    .zip(operand_types)
                    .all(|(declared, actual)| *declared == normalize_type_name(actual))
        })
    }

    /// Remove the entry with exactly this signature, returning it
    pub fn remove(&mut self, symbol: &str, operand_types: &[String]) -> Option<OperatorEntry> {
        let list = self.entries.get_mut(&symbol.to_ascii_lowercase())?;
        let position = list.iter().position(|e| {
            e.operand_types.len() == operand_types.len()
                && e.operand_types
                    .iter()
                    .zip(operand_types)
                    .all(|(declared, given)| *declared == normalize_type_name(given))
        })?;
        Some(list.remove(position))
    }

    /// Whether any overload exists for the symbol
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.entries.contains_key(&symbol.to_ascii_lowercase())
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One conversion operator
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEntry {
    /// Normalized source type
    pub from: String,
    /// Normalized target type
    pub to: String,
    /// Function implementing the conversion
    pub binding: String,
    /// `implicit` (applied automatically) vs `explicit` (casts only)
    pub implicit: bool,
}

/// Conversion operators keyed by (from, to)
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    entries: FxHashMap<(String, String), ConversionEntry>,
}

impl ConversionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion, rejecting duplicate from/to pairs
    pub fn register(
        &mut self,
        from: &str,
        to: &str,
        binding: &str,
        implicit: bool,
    ) -> Result<(), OperatorError> {
        let key = (normalize_type_name(from), normalize_type_name(to));
        if self.entries.contains_key(&key) {
            return Err(OperatorError::DuplicateConversion {
                from: key.0,
                to: key.1,
            });
        }
        self.entries.insert(
            key.clone(),
            ConversionEntry {
                from: key.0,
                to: key.1,
                binding: binding.to_string(),
                implicit,
            },
        );
        Ok(())
    }

    /// Any conversion from `from` to `to`
    pub fn lookup(&self, from: &str, to: &str) -> Option<&ConversionEntry> {
        self.entries
            .get(&(normalize_type_name(from), normalize_type_name(to)))
    }

    /// Implicit conversion from `from` to `to`
    pub fn find_implicit(&self, from: &str, to: &str) -> Option<&ConversionEntry> {
        self.lookup(from, to).filter(|c| c.implicit)
    }

    /// Number of registered conversions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_signature_match() {
        let mut table = OperatorTable::new();
        table
            .register(OperatorEntry::global("+", &names(&["TPoint", "Integer"]), "AddInt"))
            .unwrap();

        assert!(table.lookup("+", &names(&["tpoint", "integer"])).is_some());
        assert!(table.lookup("+", &names(&["Integer", "TPoint"])).is_none());
        assert!(table.lookup("+", &names(&["TPoint", "Float"])).is_none());
        assert!(table.lookup("-", &names(&["TPoint", "Integer"])).is_none());
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let mut table = OperatorTable::new();
        table
            .register(OperatorEntry::global("=", &names(&["TA", "TA"]), "Same"))
            .unwrap();
        let err = table
            .register(OperatorEntry::global("=", &names(&["ta", "ta"]), "Other"))
            .unwrap_err();
        assert!(matches!(err, OperatorError::Duplicate { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_allows_redefinition() {
        let mut table = OperatorTable::new();
        table
            .register(OperatorEntry::global("-", &names(&["TVec", "TVec"]), "SubA"))
            .unwrap();
        let removed = table.remove("-", &names(&["tvec", "TVEC"])).unwrap();
        assert_eq!(removed.binding, "SubA");
        table
            .register(OperatorEntry::global("-", &names(&["TVec", "TVec"]), "SubB"))
            .unwrap();
        assert_eq!(table.lookup("-", &names(&["tvec", "tvec"])).unwrap().binding, "SubB");
        assert!(table.remove("-", &names(&["tvec"])).is_none());
    }

    #[test]
    fn test_word_symbols_are_case_insensitive() {
        let mut table = OperatorTable::new();
        table
            .register(OperatorEntry::global("IN", &names(&["Integer", "TSet"]), "Contains"))
            .unwrap();
        assert!(table.has_symbol("in"));
        assert!(table.lookup("In", &names(&["integer", "tset"])).is_some());
    }

    #[test]
    fn test_conversions() {
        let mut table = ConversionTable::new();
        table.register("Integer", "TMoney", "IntToMoney", true).unwrap();
        table.register("TMoney", "String", "MoneyToStr", false).unwrap();

        assert!(table.find_implicit("integer", "tmoney").is_some());
        assert!(table.find_implicit("TMoney", "String").is_none());
        assert_eq!(table.lookup("TMoney", "String").unwrap().binding, "MoneyToStr");

        let err = table.register("INTEGER", "tmoney", "Again", false).unwrap_err();
        assert!(matches!(err, OperatorError::DuplicateConversion { .. }));
    }
}
