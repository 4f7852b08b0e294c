//! In-memory descriptors of reflected entities and their JSON wire shape
//!
//! Descriptors are built fresh on every export pass and dropped after serialization. Names are
//! the only correlation key downstream consumers have.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

use crate::basic_types::BasicTypes;
use crate::error::Error;
use crate::ordered_map::{deserialize_pairs, serialize_pairs};
use crate::property_flags;

/// Type tag rendered in the `"property"` field
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyTag {
    /// Fixed-width scalar; `type_info` names the scalar
    Primitive,
    /// Object reference; `type_info` is the class display name
    Object,
    /// Inline struct; `type_info` is the struct display name
    Struct,
    /// Enum value; `type_info` is the enum symbol name
    Enum,
    /// Interned name
    Name,
    /// Owned string
    String,
    /// Localizable text
    Text,
}

/// Scalar kinds rendered in `type_info` for primitive properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    /// Raw (non enum-backed) byte
    Byte,
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

/// Resolved type of a property
///
/// Referencing variants carry the related type name, so a descriptor cannot exist without it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Fixed-width scalar
    Primitive(PrimitiveType),
    /// Object reference to the class with this display name
    Object(String),
    /// Inline struct with this display name
    Struct(String),
    /// Enum with this symbol name
    Enum(String),
    /// Interned name
    Name,
    /// Owned string
    String,
    /// Localizable text
    Text,
}

impl PropertyType {
    /// Tag rendered in the `"property"` field
    pub const fn tag(&self) -> PropertyTag {
        match self {
            Self::Primitive(_) => PropertyTag::Primitive,
            Self::Object(_) => PropertyTag::Object,
            Self::Struct(_) => PropertyTag::Struct,
            Self::Enum(_) => PropertyTag::Enum,
            Self::Name => PropertyTag::Name,
            Self::String => PropertyTag::String,
            Self::Text => PropertyTag::Text,
        }
    }

    /// Value rendered in the `"type_info"` field; empty for name, string and text
    pub fn type_info(&self) -> &str {
        match self {
            Self::Primitive(primitive) => primitive.as_ref(),
            Self::Object(name) | Self::Struct(name) | Self::Enum(name) => name,
            Self::Name | Self::String | Self::Text => "",
        }
    }

    /// Rebuild a type from its wire tag and `type_info`
    pub fn from_wire(tag: PropertyTag, type_info: &str) -> Result<Self, Error> {
        let related = |kind: &str| {
            if type_info.is_empty() {
                Err(Error::invalid(
                    "property",
                    format!("{kind} property without a related type name"),
                ))
            } else {
                Ok(type_info.to_string())
            }
        };

        match tag {
            PropertyTag::Primitive => type_info
                .parse::<PrimitiveType>()
                .map(Self::Primitive)
                .map_err(|_| Error::invalid("primitive type", type_info)),
            PropertyTag::Object => related("object").map(Self::Object),
            PropertyTag::Struct => related("struct").map(Self::Struct),
            PropertyTag::Enum => related("enum").map(Self::Enum),
            PropertyTag::Name => Ok(Self::Name),
            PropertyTag::String => Ok(Self::String),
            PropertyTag::Text => Ok(Self::Text),
        }
    }
}

/// One property, struct member or function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PropertyRecord", try_from = "PropertyRecord")]
pub struct PropertyDescriptor {
    /// Authored name
    pub name:          String,
    /// Resolved type
    pub property_type: PropertyType,
    /// Raw flag bits, passed through verbatim
    pub flags:         u64,
}

impl PropertyDescriptor {
    /// Descriptor with the given flags
    pub fn new(name: impl Into<String>, property_type: PropertyType, flags: u64) -> Self {
        Self {
            name: name.into(),
            property_type,
            flags,
        }
    }

    /// Whether every bit of `mask` is set in the flags
    pub const fn has_flags(&self, mask: u64) -> bool { self.flags & mask == mask }

    /// Whether the callee writes this parameter back
    pub const fn is_output(&self) -> bool { property_flags::is_output(self.flags) }
}

/// Flat wire form of [`PropertyDescriptor`]
#[derive(Serialize, Deserialize)]
struct PropertyRecord {
    name:      String,
    property:  PropertyTag,
    type_info: String,
    flags:     u64,
}

impl From<PropertyDescriptor> for PropertyRecord {
    fn from(descriptor: PropertyDescriptor) -> Self {
        Self {
            property:  descriptor.property_type.tag(),
            type_info: descriptor.property_type.type_info().to_string(),
            name:      descriptor.name,
            flags:     descriptor.flags,
        }
    }
}

impl TryFrom<PropertyRecord> for PropertyDescriptor {
    type Error = Error;

    fn try_from(record: PropertyRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            property_type: PropertyType::from_wire(record.property, &record.type_info)?,
            name:          record.name,
            flags:         record.flags,
        })
    }
}

/// One function with its parameters in call-argument order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Authored name
    pub name:   String,
    /// Parameters in declaration order
    pub params: Vec<PropertyDescriptor>,
}

/// One class with the members it declares itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Display name
    pub name:       String,
    /// Display name of the direct super class, rendered as `""` when absent
    #[serde(
        rename = "super",
        serialize_with = "empty_when_none",
        deserialize_with = "none_when_empty"
    )]
    pub super_name: Option<String>,
    /// Declared properties
    pub properties: Vec<PropertyDescriptor>,
    /// Declared functions
    pub functions:  Vec<FunctionDescriptor>,
}

/// One struct with its members and native layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDescriptor {
    /// Display name
    pub name:    String,
    /// Members in declaration order
    pub members: Vec<PropertyDescriptor>,
    /// Native size in bytes
    pub size:    u64,
    /// Native alignment in bytes
    pub align:   u64,
}

/// One named enum value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Authored variant name, unique within its enum
    pub name:  String,
    /// Integer value
    pub value: i64,
}

/// One enum with its variants in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    /// Symbol name
    pub name:     String,
    /// Variants rendered as an ordered JSON object
    #[serde(serialize_with = "variants_as_map", deserialize_with = "variants_from_map")]
    pub variants: Vec<EnumVariant>,
    /// Width in bytes of the underlying integer
    #[serde(default = "byte_width")]
    pub size:     u64,
}

impl EnumDescriptor {
    /// Value of the variant called `name`
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|variant| variant.name == name)
            .map(|variant| variant.value)
    }
}

/// The whole exported document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Every exported class
    pub classes:     Vec<ClassDescriptor>,
    /// Every exported struct
    pub structs:     Vec<StructDescriptor>,
    /// Every exported enum
    pub enums:       Vec<EnumDescriptor>,
    /// Layouts of the built-in container types
    pub basic_types: BasicTypes,
}

fn empty_when_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

fn none_when_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

const fn byte_width() -> u64 { 1 }

fn variants_as_map<S: Serializer>(variants: &[EnumVariant], serializer: S) -> Result<S::Ok, S::Error> {
    let pairs: Vec<(&str, i64)> = variants
        .iter()
        .map(|variant| (variant.name.as_str(), variant.value))
        .collect();
    serialize_pairs(&pairs, serializer)
}

fn variants_from_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<EnumVariant>, D::Error> {
    Ok(deserialize_pairs::<D, i64>(deserializer)?
        .into_iter()
        .map(|(name, value)| EnumVariant { name, value })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::property_flags::{OUT_PARM, PARM, RETURN_PARM};

    #[test]
    fn test_property_renders_flat_wire_shape() {
        let property = PropertyDescriptor::new(
            "Health",
            PropertyType::Primitive(PrimitiveType::Int32),
            0,
        );
        assert_eq!(
            serde_json::to_value(&property).unwrap(),
            json!({"name": "Health", "property": "primitive", "type_info": "int32", "flags": 0})
        );
    }

    #[test]
    fn test_name_string_text_render_empty_type_info() {
        for (property_type, tag) in [
            (PropertyType::Name, "name"),
            (PropertyType::String, "string"),
            (PropertyType::Text, "text"),
        ] {
            let value = serde_json::to_value(PropertyDescriptor::new("P", property_type, 4)).unwrap();
            assert_eq!(value["property"], tag);
            assert_eq!(value["type_info"], "");
            assert_eq!(value["flags"], 4);
        }
    }

    #[test]
    fn test_referencing_tag_without_type_info_is_rejected() {
        let record = json!({"name": "Owner", "property": "object", "type_info": "", "flags": 0});
        assert!(serde_json::from_value::<PropertyDescriptor>(record).is_err());
    }

    #[test]
    fn test_unknown_primitive_is_rejected() {
        let record = json!({"name": "Count", "property": "primitive", "type_info": "uint16", "flags": 0});
        assert!(serde_json::from_value::<PropertyDescriptor>(record).is_err());
    }

    #[test]
    fn test_class_without_super_renders_empty_string() {
        let class = ClassDescriptor {
            name:       "Object".to_string(),
            super_name: None,
            properties: Vec::new(),
            functions:  Vec::new(),
        };
        let value = serde_json::to_value(&class).unwrap();
        assert_eq!(value["super"], "");
        assert_eq!(value["functions"], json!([]));

        let read_back: ClassDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(read_back.super_name, None);
    }

    #[test]
    fn test_enum_variants_keep_declaration_order() {
        let descriptor = EnumDescriptor {
            name:     "ECollisionChannel".to_string(),
            variants: vec![
                EnumVariant { name: "ECC_WorldStatic".to_string(), value: 0 },
                EnumVariant { name: "ECC_Pawn".to_string(), value: 3 },
                EnumVariant { name: "ECC_Camera".to_string(), value: 2 },
            ],
            size:     1,
        };
        let text = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(
            text,
            r#"{"name":"ECollisionChannel","variants":{"ECC_WorldStatic":0,"ECC_Pawn":3,"ECC_Camera":2},"size":1}"#
        );

        let read_back: EnumDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(read_back, descriptor);
        assert_eq!(read_back.value_of("ECC_Pawn"), Some(3));
    }

    #[test]
    fn test_enum_without_size_reads_as_byte_backed() {
        let read_back: EnumDescriptor =
            serde_json::from_str(r#"{"name":"EMode","variants":{"A":0}}"#).unwrap();
        assert_eq!(read_back.size, 1);
    }

    #[test]
    fn test_has_flags_tests_individual_bits() {
        let property = PropertyDescriptor::new("Out", PropertyType::Name, PARM | OUT_PARM);
        assert!(property.has_flags(OUT_PARM));
        assert!(property.has_flags(PARM));
        assert!(!property.has_flags(RETURN_PARM));
    }

    #[test]
    fn test_return_value_is_output() {
        let return_value = PropertyDescriptor::new(
            "ReturnValue",
            PropertyType::Primitive(PrimitiveType::Bool),
            PARM | OUT_PARM | RETURN_PARM,
        );
        let input = PropertyDescriptor::new("Amount", PropertyType::Primitive(PrimitiveType::Int32), PARM);
        assert!(return_value.is_output());
        assert!(!input.is_output());
    }
}
