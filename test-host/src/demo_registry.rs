//! A small engine-like type registry to export

use bprust_schema::property_flags::{OUT_PARM, PARM, RETURN_PARM};
use bprust_schema::{
    ClassInfo, EnumInfo, FunctionInfo, InMemoryRegistry, PropertyInfo, PropertyKind, StructInfo,
    TypeRef,
};

/// Class the demo calls into
pub const LAMP_CLASS: &str = "BP_Lamp";

fn param(name: &str, kind: PropertyKind) -> PropertyInfo { PropertyInfo::new(name, kind).with_flags(PARM) }

fn return_value(kind: PropertyKind) -> PropertyInfo {
    PropertyInfo::new("ReturnValue", kind).with_flags(PARM | OUT_PARM | RETURN_PARM)
}

/// Object, Actor and a blueprint lamp with a struct and an enum
pub fn build() -> InMemoryRegistry {
    let actor = TypeRef::new("/Script/Engine.Actor", "Actor");
    let linear_color = TypeRef::new("/Script/CoreUObject.LinearColor", "LinearColor");

    InMemoryRegistry::new()
        .with_class(ClassInfo::new(TypeRef::new("/Script/CoreUObject.Object", "Object")))
        .with_class(
            ClassInfo::new(actor.clone())
                .with_super(TypeRef::named("Object"))
                .with_property(PropertyInfo::new("bHidden", PropertyKind::Bool))
                .with_property(PropertyInfo::new("Tags", PropertyKind::Array))
                .with_property(PropertyInfo::new(
                    "Owner",
                    PropertyKind::Object {
                        class: actor.clone(),
                    },
                ))
                .with_function(
                    FunctionInfo::new("SetActorHiddenInGame")
                        .with_param(param("bNewHidden", PropertyKind::Bool)),
                )
                .with_function(FunctionInfo::new("GetComponents").with_param(
                    PropertyInfo::new("OutComponents", PropertyKind::Array).with_flags(PARM | OUT_PARM),
                )),
        )
        .with_class(
            ClassInfo::new(TypeRef::new("/Game/Props/BP_Lamp.BP_Lamp_C", LAMP_CLASS))
                .with_super(actor)
                .with_property(PropertyInfo::new("Brightness", PropertyKind::Float))
                .with_property(PropertyInfo::new(
                    "Color",
                    PropertyKind::Struct {
                        script_struct: linear_color.clone(),
                    },
                ))
                .with_property(PropertyInfo::new(
                    "Mode",
                    PropertyKind::Byte {
                        enum_name: Some("E_LampMode".to_string()),
                    },
                ))
                .with_property(PropertyInfo::new("Label", PropertyKind::Text))
                .with_function(
                    FunctionInfo::new("SetBrightness").with_param(param("Value", PropertyKind::Float)),
                )
                .with_function(FunctionInfo::new("Toggle").with_param(return_value(PropertyKind::Bool)))
                .with_function(
                    FunctionInfo::new("OnSwitched")
                        .with_param(param("bLit", PropertyKind::Bool))
                        .with_param(param("Brightness", PropertyKind::Float))
                        .with_param(param(
                            "Tint",
                            PropertyKind::Struct {
                                script_struct: linear_color.clone(),
                            },
                        )),
                ),
        )
        .with_struct(
            StructInfo::new(linear_color, 16, 4)
                .with_member(PropertyInfo::new("R", PropertyKind::Float))
                .with_member(PropertyInfo::new("G", PropertyKind::Float))
                .with_member(PropertyInfo::new("B", PropertyKind::Float))
                .with_member(PropertyInfo::new("A", PropertyKind::Float)),
        )
        .with_enum(
            EnumInfo::new("E_LampMode")
                .with_entry("Off", 0)
                .with_entry("Dim", 1)
                .with_entry("Bright", 2)
                .with_entry("E_LampMode_MAX", 3),
        )
}
