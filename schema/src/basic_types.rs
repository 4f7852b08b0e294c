//! Size and alignment facts for the engine's built-in container types
//!
//! Consumers compare these against their own opaque stand-ins before generating bindings, so a
//! layout drift between the engine build and the bindings is caught before any call is made.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::ordered_map::{deserialize_pairs, serialize_pairs};

/// Built-in container types whose layout is exported under `basic_types`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum BasicType {
    /// Interned name handle
    FName,
    /// Owned UTF-16 string
    FString,
    /// Localizable text
    FText,
    /// Type-erased dynamic array
    FScriptArray,
    /// Type-erased hash set
    FScriptSet,
    /// Type-erased hash map
    FScriptMap,
    /// Soft object reference
    FSoftObjectPtr,
}

impl BasicType {
    /// Layout of this type in a 64-bit engine build
    pub const fn engine_layout(self) -> BasicTypeLayout {
        match self {
            Self::FName => BasicTypeLayout::new(12, 4),
            Self::FString | Self::FText | Self::FScriptArray => BasicTypeLayout::new(16, 8),
            Self::FScriptSet | Self::FScriptMap => BasicTypeLayout::new(80, 8),
            Self::FSoftObjectPtr => BasicTypeLayout::new(48, 8),
        }
    }
}

/// Size and alignment of one type, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicTypeLayout {
    /// Size in bytes
    pub size:  u64,
    /// Alignment in bytes
    pub align: u64,
}

impl BasicTypeLayout {
    /// Create a layout from size and alignment
    pub const fn new(size: u64, align: u64) -> Self { Self { size, align } }
}

/// Ordered set of basic type layouts, rendered as a JSON object keyed by type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicTypes(Vec<(BasicType, BasicTypeLayout)>);

impl BasicTypes {
    /// Layouts of every basic type as built by the engine
    pub fn engine_defaults() -> Self {
        Self(
            BasicType::iter()
                .map(|ty| (ty, ty.engine_layout()))
                .collect(),
        )
    }

    /// Empty set, used only when reading partial documents
    pub const fn empty() -> Self { Self(Vec::new()) }

    /// Replace or add the layout of `ty`, keeping the original position when replacing
    #[must_use]
    pub fn with_layout(mut self, ty: BasicType, layout: BasicTypeLayout) -> Self {
        match self.0.iter_mut().find(|(existing, _)| *existing == ty) {
            Some(entry) => entry.1 = layout,
            None => self.0.push((ty, layout)),
        }
        self
    }

    /// Layout of `ty`, if present
    pub fn get(&self, ty: BasicType) -> Option<BasicTypeLayout> {
        self.0
            .iter()
            .find(|(existing, _)| *existing == ty)
            .map(|(_, layout)| *layout)
    }

    /// Iterate layouts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (BasicType, BasicTypeLayout)> + '_ {
        self.0.iter().copied()
    }

    /// Number of entries
    pub const fn len(&self) -> usize { self.0.len() }

    /// Whether there are no entries
    pub const fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl Default for BasicTypes {
    fn default() -> Self { Self::engine_defaults() }
}

impl Serialize for BasicTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BasicTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_pairs::<D, BasicTypeLayout>(deserializer)?
            .into_iter()
            .map(|(name, layout)| {
                name.parse::<BasicType>()
                    .map(|ty| (ty, layout))
                    .map_err(|_| D::Error::custom(format!("unknown basic type `{name}`")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults_cover_every_basic_type_in_order() {
        let names: Vec<String> = BasicTypes::engine_defaults()
            .iter()
            .map(|(ty, _)| ty.to_string())
            .collect();
        assert_eq!(
            names,
            [
                "FName",
                "FString",
                "FText",
                "FScriptArray",
                "FScriptSet",
                "FScriptMap",
                "FSoftObjectPtr"
            ]
        );
    }

    #[test]
    fn test_with_layout_replaces_in_place() {
        let types = BasicTypes::engine_defaults()
            .with_layout(BasicType::FName, BasicTypeLayout::new(8, 4));
        assert_eq!(types.get(BasicType::FName), Some(BasicTypeLayout::new(8, 4)));
        assert_eq!(types.iter().next().map(|(ty, _)| ty), Some(BasicType::FName));
        assert_eq!(types.len(), 7);
    }

    #[test]
    fn test_unknown_basic_type_is_rejected() {
        let result: Result<BasicTypes, _> =
            serde_json::from_str(r#"{"FVector": {"size": 24, "align": 8}}"#);
        assert!(result.is_err());
    }
}
