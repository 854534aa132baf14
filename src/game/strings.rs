//! Interned message strings.
//!
//! Votes, proposals, notes and trigger events carry text. Actions only carry
//! a `StringId`; the text lives once in the game's `StringTable`, filled by
//! the compile pass.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Index of an interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringId(pub u32);

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "String({})", self.0)
    }
}

/// Append-only string interner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
    index: FxHashMap<String, StringId>,
}

impl StringTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing ID if already present.
    pub fn intern(&mut self, text: &str) -> StringId {
        if let Some(&id) = self.index.get(text) {
            return id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(text.to_owned());
        self.index.insert(text.to_owned(), id);
        id
    }

    /// ID of already interned text.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<StringId> {
        self.index.get(text).copied()
    }

    /// Text of an ID.
    #[must_use]
    pub fn get(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(String::as_str)
    }

    /// Number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether nothing is interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut table = StringTable::new();
        let a = table.intern("Draw");
        let b = table.intern("Resign");
        assert_eq!(table.intern("Draw"), a);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b), Some("Resign"));
        assert_eq!(table.lookup("Resign"), Some(b));
        assert_eq!(table.lookup("Pass"), None);
        assert_eq!(table.get(StringId(7)), None);
    }
}
