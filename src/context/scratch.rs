//! Scratch fields and field sets.

use serde::{Deserialize, Serialize};

use crate::core::{Site, SiteType};

/// The scratch fields rule nodes pass to their subtrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scratch {
    pub from: Option<Site>,
    pub to: Option<Site>,
    pub between: Option<Site>,
    pub level: Option<usize>,
    pub value: Option<i64>,
    /// Element kind nodes use when they don't name one.
    pub site_type: SiteType,
}

/// One scratch field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvField {
    From,
    To,
    Between,
    Level,
    Value,
}

impl EnvField {
    /// Every field.
    pub const ALL: [EnvField; 5] = [
        EnvField::From,
        EnvField::To,
        EnvField::Between,
        EnvField::Level,
        EnvField::Value,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of scratch fields, used for static read/write declarations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvFields(u8);

impl EnvFields {
    pub const EMPTY: EnvFields = EnvFields(0);
    pub const ALL: EnvFields = EnvFields(0b1_1111);

    /// A set holding one field.
    #[must_use]
    pub const fn of(field: EnvField) -> Self {
        EnvFields(field.bit())
    }

    /// This set plus `field`.
    #[must_use]
    pub const fn with(self, field: EnvField) -> Self {
        EnvFields(self.0 | field.bit())
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: EnvFields) -> Self {
        EnvFields(self.0 | other.0)
    }

    /// Fields in `self` that are not in `other`.
    #[must_use]
    pub const fn without(self, other: EnvFields) -> Self {
        EnvFields(self.0 & !other.0)
    }

    #[must_use]
    pub const fn contains(self, field: EnvField) -> bool {
        self.0 & field.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the fields in declaration order.
    pub fn iter(self) -> impl Iterator<Item = EnvField> {
        EnvField::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl std::ops::BitOr for EnvFields {
    type Output = EnvFields;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOr<EnvField> for EnvFields {
    type Output = EnvFields;

    fn bitor(self, rhs: EnvField) -> Self::Output {
        self.with(rhs)
    }
}

impl From<EnvField> for EnvFields {
    fn from(field: EnvField) -> Self {
        EnvFields::of(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set_ops() {
        let set = EnvFields::of(EnvField::To) | EnvField::Between;
        assert!(set.contains(EnvField::To));
        assert!(set.contains(EnvField::Between));
        assert!(!set.contains(EnvField::From));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![EnvField::To, EnvField::Between]);
        assert_eq!(set.without(EnvFields::of(EnvField::To)), EnvFields::of(EnvField::Between));
        assert!(EnvFields::EMPTY.is_empty());
        assert_eq!(EnvFields::ALL.iter().count(), 5);
    }
}
