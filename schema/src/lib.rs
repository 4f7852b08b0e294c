//! Reflected type registry export
//!
//! This crate walks a live, read-only type registry (classes, structs, enums, their declared
//! properties and function signatures) and renders it as one deterministic JSON schema
//! document. Generated foreign bindings use that document as the authoritative description of
//! parameter layout when they call back into native code through `bprust_bridge`.
//!
//! # Usage
//!
//! ```no_run
//! use bprust_schema::{DefinitionExporter, ExportConfig, InMemoryRegistry};
//!
//! let registry = InMemoryRegistry::new();
//! let exporter = DefinitionExporter::new(ExportConfig::new().with_output_dir("target"));
//! let succeeded = exporter.trigger(&registry);
//! println!("Definition export {}", if succeeded { "succeed" } else { "failed" });
//! ```
//!
//! # Document shape
//!
//! ```json
//! {
//!   "classes": [{ "name": "Foo", "super": "Base", "properties": [], "functions": [] }],
//!   "structs": [{ "name": "Vector", "members": [], "size": 24, "align": 8 }],
//!   "enums": [{ "name": "EMovementMode", "variants": { "MOVE_None": 0 }, "size": 1 }],
//!   "basic_types": { "FName": { "size": 12, "align": 4 } }
//! }
//! ```

mod basic_types;
mod constants;
mod descriptor;
mod error;
mod export;
mod ordered_map;
pub mod property_flags;
mod registry;
mod resolver;
mod serializer;
mod stamp;
mod walker;

pub use basic_types::{BasicType, BasicTypeLayout, BasicTypes};
pub use constants::{ABI_VERSION, DEFINITIONS_DIR_ENV, DEFINITIONS_FILE_NAME};
pub use descriptor::{
    ClassDescriptor, EnumDescriptor, EnumVariant, FunctionDescriptor, PrimitiveType,
    PropertyDescriptor, PropertyTag, PropertyType, SchemaDocument, StructDescriptor,
};
pub use error::{Error, Result};
pub use export::{DefinitionExporter, ExportConfig, ExportReport, stamp_path_for};
pub use registry::{
    ClassInfo, EnumInfo, FunctionInfo, InMemoryRegistry, PropertyInfo, PropertyKind, StructInfo,
    TypeRef, TypeRegistry,
};
pub use resolver::{UnsupportedProperty, resolve_property, resolve_property_type};
pub use serializer::{SchemaSerializer, parse_document};
pub use stamp::{SchemaHash, SchemaStamp};
pub use walker::{CatalogWalk, ExportStats, TypeCatalogWalker};
