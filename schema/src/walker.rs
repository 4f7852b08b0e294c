//! Enumeration of every live class, struct and enum into descriptors
//!
//! Two failure policies apply and are deliberately distinct:
//! - member listings (class properties, struct members) are best-effort: an unsupported
//!   property is skipped and the rest are listed
//! - function listings are all-or-nothing: one unsupported parameter drops the whole function,
//!   since callers rely on the declared parameter order and offsets
//!
//! A function parameter whose enum storage width disagrees with the width exported for that enum
//! counts as unsupported, because consumers size enum slots from the enum descriptor.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::descriptor::{
    ClassDescriptor, EnumDescriptor, EnumVariant, FunctionDescriptor, PropertyDescriptor,
    SchemaDocument, StructDescriptor,
};
use crate::registry::{
    ClassInfo, EnumInfo, FunctionInfo, PropertyInfo, PropertyKind, StructInfo, TypeRegistry,
};
use crate::resolver::resolve_property;

/// Tally of one export pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Classes exported
    pub classes:            usize,
    /// Structs exported
    pub structs:            usize,
    /// Enums exported
    pub enums:              usize,
    /// Functions exported
    pub functions:          usize,
    /// Class properties and struct members skipped as unsupported
    pub skipped_properties: usize,
    /// Functions omitted because a parameter was unsupported
    pub omitted_functions:  usize,
    /// Classes, structs or enums sharing a name with an earlier entry of the same kind
    pub duplicate_names:    usize,
    /// Enum variants dropped because their name repeated within the enum
    pub duplicate_variants: usize,
}

/// Descriptor graph and tally produced by one walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWalk {
    /// Descriptor graph ready for serialization
    pub document: SchemaDocument,
    /// What was exported and what was left out
    pub stats:    ExportStats,
}

/// Walks a registry snapshot and builds descriptors
pub struct TypeCatalogWalker<'r, R> {
    registry: &'r R,
}

impl<'r, R: TypeRegistry> TypeCatalogWalker<'r, R> {
    /// Walker over `registry`, which must stay unchanged while walking
    pub const fn new(registry: &'r R) -> Self { Self { registry } }

    /// Describe every class, struct and enum in registry order
    pub fn walk(&self) -> CatalogWalk {
        let mut stats = ExportStats::default();

        // Lookups by enum name resolve to the first entry, as consumers of the document do
        let mut enum_sizes = HashMap::new();
        for enum_info in self.registry.enums() {
            enum_sizes.entry(enum_info.name.clone()).or_insert(enum_info.size);
        }

        let mut seen = HashSet::new();
        let classes: Vec<ClassDescriptor> = self
            .registry
            .classes()
            .map(|class| {
                note_duplicate("class", &class.name.display_name, &mut seen, &mut stats);
                describe_class(class, &enum_sizes, &mut stats)
            })
            .collect();

        let mut seen = HashSet::new();
        let structs: Vec<StructDescriptor> = self
            .registry
            .structs()
            .map(|script_struct| {
                note_duplicate("struct", &script_struct.name.display_name, &mut seen, &mut stats);
                describe_struct(script_struct, &mut stats)
            })
            .collect();

        let mut seen = HashSet::new();
        let enums: Vec<EnumDescriptor> = self
            .registry
            .enums()
            .map(|enum_info| {
                note_duplicate("enum", &enum_info.name, &mut seen, &mut stats);
                describe_enum(enum_info, &mut stats)
            })
            .collect();

        stats.classes = classes.len();
        stats.structs = structs.len();
        stats.enums = enums.len();

        debug!(
            classes = stats.classes,
            structs = stats.structs,
            enums = stats.enums,
            functions = stats.functions,
            skipped_properties = stats.skipped_properties,
            omitted_functions = stats.omitted_functions,
            "Type catalog walk complete"
        );

        CatalogWalk {
            document: SchemaDocument {
                classes,
                structs,
                enums,
                basic_types: self.registry.basic_types(),
            },
            stats,
        }
    }
}

fn note_duplicate(kind: &str, name: &str, seen: &mut HashSet<String>, stats: &mut ExportStats) {
    if !seen.insert(name.to_string()) {
        stats.duplicate_names += 1;
        warn!("Duplicate {kind} name `{name}` in registry; consumers keyed by name will collide");
    }
}

/// Describe a class with its declared properties and functions
fn describe_class(
    class: &ClassInfo,
    enum_sizes: &HashMap<String, u64>,
    stats: &mut ExportStats,
) -> ClassDescriptor {
    let functions = class
        .functions
        .iter()
        .filter_map(|function| {
            let described = describe_function(function, enum_sizes);
            match described {
                Some(_) => stats.functions += 1,
                None => stats.omitted_functions += 1,
            }
            described
        })
        .collect();

    ClassDescriptor {
        name: class.name.display_name.clone(),
        super_name: class
            .super_class
            .as_ref()
            .map(|super_class| super_class.display_name.clone()),
        properties: describe_members(&class.properties, stats),
        functions,
    }
}

fn describe_struct(script_struct: &StructInfo, stats: &mut ExportStats) -> StructDescriptor {
    StructDescriptor {
        name:    script_struct.name.display_name.clone(),
        members: describe_members(&script_struct.members, stats),
        size:    script_struct.size,
        align:   script_struct.align,
    }
}

/// Best-effort listing: unsupported properties are left out
fn describe_members(properties: &[PropertyInfo], stats: &mut ExportStats) -> Vec<PropertyDescriptor> {
    properties
        .iter()
        .filter_map(|property| match resolve_property(property) {
            Ok(descriptor) => Some(descriptor),
            Err(unsupported) => {
                stats.skipped_properties += 1;
                debug!("Skipping property: {unsupported}");
                None
            },
        })
        .collect()
}

/// All-or-nothing listing: `None` when any parameter is unsupported
fn describe_function(
    function: &FunctionInfo,
    enum_sizes: &HashMap<String, u64>,
) -> Option<FunctionDescriptor> {
    if let Some(mismatch) = function
        .params
        .iter()
        .find_map(|param| enum_width_mismatch(param, enum_sizes))
    {
        debug!("Omitting function `{}`: {mismatch}", function.name);
        return None;
    }

    let params = function
        .params
        .iter()
        .map(resolve_property)
        .collect::<Result<Vec<_>, _>>();

    match params {
        Ok(params) => Some(FunctionDescriptor {
            name: function.name.clone(),
            params,
        }),
        Err(unsupported) => {
            debug!("Omitting function `{}`: {unsupported}", function.name);
            None
        },
    }
}

/// Describe a parameter stored at a different width than its enum is exported with
fn enum_width_mismatch(param: &PropertyInfo, enum_sizes: &HashMap<String, u64>) -> Option<String> {
    let (enum_name, width) = match &param.kind {
        PropertyKind::Enum {
            enum_name,
            underlying_size,
        } => (enum_name, *underlying_size),
        PropertyKind::Byte {
            enum_name: Some(enum_name),
        } => (enum_name, 1),
        _ => return None,
    };
    let exported = *enum_sizes.get(enum_name)?;
    (exported != width).then(|| {
        format!(
            "parameter `{}` stores enum `{enum_name}` in {width} bytes, enum is exported as {exported}",
            param.name
        )
    })
}

fn describe_enum(enum_info: &EnumInfo, stats: &mut ExportStats) -> EnumDescriptor {
    let mut seen = HashSet::new();
    let mut variants = Vec::with_capacity(enum_info.entries.len());
    for (name, value) in &enum_info.entries {
        if seen.insert(name.as_str()) {
            variants.push(EnumVariant {
                name:  name.clone(),
                value: *value,
            });
        } else {
            stats.duplicate_variants += 1;
            warn!(
                "Duplicate variant `{name}` in enum `{}`; keeping the first",
                enum_info.name
            );
        }
    }

    EnumDescriptor {
        name: enum_info.name.clone(),
        variants,
        size: enum_info.size,
    }
}
