//! Element-type tags and the cumulative catalog of type sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BenchError, BenchResult};

/// Selector emitted when no tag is active.
pub const NO_TYPES_SELECTOR: &str = "no_int";

/// One primitive element type, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
}

impl TypeTag {
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Int,
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
    ];

    /// Selector token for this tag.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
        }
    }

    /// Position in the standard catalog.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Rust type the in-process lists store for this tag.
    pub fn rust_type(self) -> &'static str {
        match self {
            TypeTag::Int => "isize",
            TypeTag::Int8 => "i8",
            TypeTag::Int16 => "i16",
            TypeTag::Int32 => "i32",
            TypeTag::Int64 => "i64",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s || t.rust_type() == s)
            .ok_or_else(|| BenchError::Message(format!("unknown type tag '{s}'")))
    }
}

/// Ordered, prefix-closed set of tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSet {
    tags: Vec<TypeTag>,
}

impl TypeSet {
    pub fn empty() -> Self {
        TypeSet { tags: Vec::new() }
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    pub fn cardinality(&self) -> usize {
        self.tags.len()
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_superset_of(&self, other: &TypeSet) -> bool {
        other.tags.iter().all(|t| self.contains(*t))
    }

    /// Comma-joined tag names, or [`NO_TYPES_SELECTOR`] when empty.
    pub fn selector(&self) -> String {
        if self.tags.is_empty() {
            return NO_TYPES_SELECTOR.to_string();
        }
        self.tags
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// The fixed universe of tags. `prefix(k)` is the first `k` tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSetCatalog {
    tags: Vec<TypeTag>,
}

impl Default for TypeSetCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeSetCatalog {
    /// All five tags: int, int8, int16, int32, int64.
    pub fn standard() -> Self {
        TypeSetCatalog {
            tags: TypeTag::ALL.to_vec(),
        }
    }

    /// Build a catalog from an arbitrary selection, sorted into canonical order.
    pub fn new(tags: impl IntoIterator<Item = TypeTag>) -> BenchResult<Self> {
        let mut tags: Vec<TypeTag> = tags.into_iter().collect();
        tags.sort();
        let before = tags.len();
        tags.dedup();
        if tags.len() != before {
            return Err(BenchError::Message(
                "type catalog contains duplicate tags".into(),
            ));
        }
        Ok(TypeSetCatalog { tags })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    pub fn prefix(&self, k: usize) -> BenchResult<TypeSet> {
        if k > self.tags.len() {
            return Err(BenchError::OutOfRange {
                requested: k,
                available: self.tags.len(),
            });
        }
        Ok(TypeSet {
            tags: self.tags[..k].to_vec(),
        })
    }

    /// Cardinality of the smallest prefix that contains `tag`.
    pub fn entry_cardinality(&self, tag: TypeTag) -> Option<usize> {
        self.tags.iter().position(|t| *t == tag).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_cardinality_and_order() {
        let catalog = TypeSetCatalog::standard();
        assert_eq!(catalog.len(), 5);
        let set = catalog.prefix(3).unwrap();
        assert_eq!(set.cardinality(), 3);
        assert_eq!(set.tags(), &[TypeTag::Int, TypeTag::Int8, TypeTag::Int16]);
    }

    #[test]
    fn test_prefix_out_of_range() {
        let catalog = TypeSetCatalog::standard();
        let err = catalog.prefix(6).unwrap_err();
        assert!(matches!(
            err,
            BenchError::OutOfRange {
                requested: 6,
                available: 5
            }
        ));
    }

    #[test]
    fn test_selector_strings() {
        let catalog = TypeSetCatalog::standard();
        assert_eq!(catalog.prefix(0).unwrap().selector(), "no_int");
        assert_eq!(catalog.prefix(1).unwrap().selector(), "int");
        assert_eq!(
            catalog.prefix(5).unwrap().selector(),
            "int,int8,int16,int32,int64"
        );
    }

    #[test]
    fn test_new_sorts_and_rejects_duplicates() {
        let catalog = TypeSetCatalog::new([TypeTag::Int32, TypeTag::Int]).unwrap();
        assert_eq!(catalog.tags(), &[TypeTag::Int, TypeTag::Int32]);
        assert!(TypeSetCatalog::new([TypeTag::Int8, TypeTag::Int8]).is_err());
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("int32".parse::<TypeTag>().unwrap(), TypeTag::Int32);
        assert_eq!("i16".parse::<TypeTag>().unwrap(), TypeTag::Int16);
        assert!("float".parse::<TypeTag>().is_err());
    }

    #[test]
    fn test_entry_cardinality() {
        let catalog = TypeSetCatalog::standard();
        assert_eq!(catalog.entry_cardinality(TypeTag::Int), Some(1));
        assert_eq!(catalog.entry_cardinality(TypeTag::Int32), Some(4));
        let small = TypeSetCatalog::new([TypeTag::Int]).unwrap();
        assert_eq!(small.entry_cardinality(TypeTag::Int64), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_prefix_is_cumulative(k in 1usize..=5) {
            let catalog = TypeSetCatalog::standard();
            let larger = catalog.prefix(k).unwrap();
            let smaller = catalog.prefix(k - 1).unwrap();
            prop_assert_eq!(larger.cardinality(), k);
            prop_assert!(larger.is_superset_of(&smaller));
        }

        #[test]
        fn prop_prefix_rejects_beyond_catalog(k in 6usize..1000) {
            let catalog = TypeSetCatalog::standard();
            prop_assert!(catalog.prefix(k).is_err());
        }
    }
}
