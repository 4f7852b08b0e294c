//! Classification of one reflected property into an exported type
//!
//! The cascade is fixed and first match wins:
//! Object > Struct > Enum > Name > String > Text > Byte > Bool > Int32 > Int64 > Float > Double.
//! Everything else is unsupported. The match below is exhaustive over [`PropertyKind`], so adding
//! a host kind forces a decision here.

use thiserror::Error;

use crate::descriptor::{PrimitiveType, PropertyDescriptor, PropertyType};
use crate::registry::{PropertyInfo, PropertyKind};

/// A property whose kind has no exported representation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported property type: `{property}` is {kind}")]
pub struct UnsupportedProperty {
    /// Name of the property
    pub property: String,
    /// Host kind of the property
    pub kind:     String,
}

/// Resolve a property kind to its exported type, or `None` when unsupported
///
/// Object and struct references use the referenced type's display name. Enum references use the
/// enum's symbol name because enums have no display name. A byte backed by an enum is an enum,
/// never a primitive byte.
pub fn resolve_property_type(kind: &PropertyKind) -> Option<PropertyType> {
    let resolved = match kind {
        PropertyKind::Object { class } => PropertyType::Object(class.display_name.clone()),
        PropertyKind::Struct { script_struct } => {
            PropertyType::Struct(script_struct.display_name.clone())
        },
        PropertyKind::Enum { enum_name, .. } => PropertyType::Enum(enum_name.clone()),
        PropertyKind::Name => PropertyType::Name,
        PropertyKind::Str => PropertyType::String,
        PropertyKind::Text => PropertyType::Text,
        PropertyKind::Byte {
            enum_name: Some(enum_name),
        } => PropertyType::Enum(enum_name.clone()),
        PropertyKind::Byte { enum_name: None } => PropertyType::Primitive(PrimitiveType::Byte),
        PropertyKind::Bool => PropertyType::Primitive(PrimitiveType::Bool),
        PropertyKind::Int32 => PropertyType::Primitive(PrimitiveType::Int32),
        PropertyKind::Int64 => PropertyType::Primitive(PrimitiveType::Int64),
        PropertyKind::Float => PropertyType::Primitive(PrimitiveType::Float),
        PropertyKind::Double => PropertyType::Primitive(PrimitiveType::Double),
        PropertyKind::Array
        | PropertyKind::Set
        | PropertyKind::Map
        | PropertyKind::Delegate
        | PropertyKind::SoftObject
        | PropertyKind::WeakObject
        | PropertyKind::Interface
        | PropertyKind::Other(_) => return None,
    };

    // A reference without a name would break the related-type invariant downstream
    match &resolved {
        PropertyType::Object(name) | PropertyType::Struct(name) | PropertyType::Enum(name)
            if name.is_empty() =>
        {
            None
        },
        _ => Some(resolved),
    }
}

/// Resolve one reflected property into its descriptor
pub fn resolve_property(property: &PropertyInfo) -> Result<PropertyDescriptor, UnsupportedProperty> {
    resolve_property_type(&property.kind)
        .map(|property_type| {
            PropertyDescriptor::new(property.name.clone(), property_type, property.flags)
        })
        .ok_or_else(|| UnsupportedProperty {
            property: property.name.clone(),
            kind:     match &property.kind {
                PropertyKind::Other(host_kind) => host_kind.clone(),
                kind => kind.as_ref().to_string(),
            },
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::descriptor::PropertyTag;
    use crate::registry::TypeRef;

    #[test]
    fn test_object_uses_class_display_name() {
        let kind = PropertyKind::Object {
            class: TypeRef::new("BP_Hero_C", "BP_Hero"),
        };
        assert_eq!(
            resolve_property_type(&kind),
            Some(PropertyType::Object("BP_Hero".to_string()))
        );
    }

    #[test]
    fn test_struct_uses_struct_display_name() {
        let kind = PropertyKind::Struct {
            script_struct: TypeRef::new("S_Loadout_2A9F", "S_Loadout"),
        };
        assert_eq!(
            resolve_property_type(&kind),
            Some(PropertyType::Struct("S_Loadout".to_string()))
        );
    }

    #[test]
    fn test_enum_uses_symbol_name() {
        let kind = PropertyKind::Enum {
            enum_name:       "E_Team".to_string(),
            underlying_size: 1,
        };
        assert_eq!(
            resolve_property_type(&kind),
            Some(PropertyType::Enum("E_Team".to_string()))
        );
    }

    #[test]
    fn test_enum_backed_byte_resolves_to_enum() {
        let kind = PropertyKind::Byte {
            enum_name: Some("EMovementMode".to_string()),
        };
        let resolved = resolve_property_type(&kind).unwrap();
        assert_eq!(resolved.tag(), PropertyTag::Enum);
        assert_eq!(resolved.type_info(), "EMovementMode");
    }

    #[test]
    fn test_raw_byte_resolves_to_primitive_byte() {
        let resolved = resolve_property_type(&PropertyKind::Byte { enum_name: None }).unwrap();
        assert_eq!(resolved.tag(), PropertyTag::Primitive);
        assert_eq!(resolved.type_info(), "byte");
    }

    #[test]
    fn test_primitive_names() {
        let cases = [
            (PropertyKind::Bool, "bool"),
            (PropertyKind::Int32, "int32"),
            (PropertyKind::Int64, "int64"),
            (PropertyKind::Float, "float"),
            (PropertyKind::Double, "double"),
        ];
        for (kind, expected) in cases {
            let resolved = resolve_property_type(&kind).unwrap();
            assert_eq!(resolved.tag(), PropertyTag::Primitive);
            assert_eq!(resolved.type_info(), expected);
        }
    }

    #[test]
    fn test_text_like_kinds_have_empty_type_info() {
        assert_eq!(resolve_property_type(&PropertyKind::Name), Some(PropertyType::Name));
        assert_eq!(resolve_property_type(&PropertyKind::Str), Some(PropertyType::String));
        assert_eq!(resolve_property_type(&PropertyKind::Text), Some(PropertyType::Text));
    }

    #[test]
    fn test_containers_and_delegates_are_unsupported() {
        for kind in [
            PropertyKind::Array,
            PropertyKind::Set,
            PropertyKind::Map,
            PropertyKind::Delegate,
            PropertyKind::SoftObject,
            PropertyKind::WeakObject,
            PropertyKind::Interface,
            PropertyKind::Other("UInt16Property".to_string()),
        ] {
            assert_eq!(resolve_property_type(&kind), None, "{kind:?}");
        }
    }

    #[test]
    fn test_reference_without_name_is_unsupported() {
        let kind = PropertyKind::Object {
            class: TypeRef::new("UnnamedClass", ""),
        };
        assert_eq!(resolve_property_type(&kind), None);
    }

    #[test]
    fn test_resolve_property_keeps_name_and_flags() {
        let property = PropertyInfo::new("Speed", PropertyKind::Float).with_flags(0x0010_0000_0000_0005);
        let descriptor = resolve_property(&property).unwrap();
        assert_eq!(descriptor.name, "Speed");
        assert_eq!(descriptor.flags, 0x0010_0000_0000_0005);
    }

    #[test]
    fn test_resolve_property_reports_host_kind() {
        let property = PropertyInfo::new("Inventory", PropertyKind::Array);
        let error = resolve_property(&property).unwrap_err();
        assert_eq!(error.property, "Inventory");
        assert_eq!(error.kind, "array");

        let property = PropertyInfo::new("Tags", PropertyKind::Other("FieldPathProperty".to_string()));
        assert_eq!(resolve_property(&property).unwrap_err().kind, "FieldPathProperty");
    }
}
