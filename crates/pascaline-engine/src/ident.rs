//! Identifier normalization
//!
//! The language is case-insensitive. Every name-keyed table stores the
//! ASCII-lowercased form and every lookup normalizes its key first.

/// Normalize an identifier for table lookups
#[inline]
pub fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Normalize a type name for signature comparison
///
/// Lowercases and collapses interior whitespace so `array of  String` and
/// `Array Of String` produce the same key.
pub fn normalize_type_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive identifier comparison
#[inline]
pub fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize("TPoint"), "tpoint");
        assert_eq!(normalize("FValue"), "fvalue");
    }

    #[test]
    fn test_normalize_type_name_collapses_whitespace() {
        assert_eq!(normalize_type_name("Array  Of String"), "array of string");
        assert_eq!(normalize_type_name(" Integer "), "integer");
    }

    #[test]
    fn test_same_ignores_case() {
        assert!(same("Create", "CREATE"));
        assert!(!same("Create", "Created"));
    }
}
