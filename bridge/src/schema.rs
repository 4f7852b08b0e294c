//! The exported schema as the bridge reads it

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use bprust_schema::{
    ABI_VERSION, ClassDescriptor, EnumDescriptor, FunctionDescriptor, SchemaDocument, SchemaHash,
    SchemaStamp, StructDescriptor, parse_document, stamp_path_for,
};
use error_stack::{Report, ResultExt};
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::layout::FunctionLayout;

/// A parsed schema document, its hash and name indexes
///
/// When names repeat within a kind, lookups resolve to the first entry.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    document: SchemaDocument,
    hash:     SchemaHash,
    classes:  HashMap<String, usize>,
    structs:  HashMap<String, usize>,
    enums:    HashMap<String, usize>,
}

impl LoadedSchema {
    /// Parse document text, hashing the exact bytes given
    pub fn from_json(text: &str) -> Result<Self> {
        let document = parse_document(text)
            .change_context(BridgeError::Schema("Failed to parse schema document".to_string()))?;
        Ok(Self::index(document, SchemaHash::of_document(text)))
    }

    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|error| {
            Report::new(BridgeError::Schema(format!(
                "Failed to read {}: {error}",
                path.display()
            )))
        })?;
        Self::from_json(&text)
    }

    /// Read the document at `path` and check it against the stamp written beside it
    pub fn load_stamped(path: &Path) -> Result<Self> {
        let schema = Self::load(path)?;
        let stamp_path = stamp_path_for(path);
        let stamp_text = fs::read_to_string(&stamp_path).map_err(|error| {
            Report::new(BridgeError::Schema(format!(
                "Failed to read {}: {error}",
                stamp_path.display()
            )))
        })?;
        let stamp: SchemaStamp = serde_json::from_str(&stamp_text).map_err(|error| {
            Report::new(BridgeError::Schema(format!(
                "Invalid stamp {}: {error}",
                stamp_path.display()
            )))
        })?;
        schema.verify_stamp(&stamp)?;
        Ok(schema)
    }

    fn index(document: SchemaDocument, hash: SchemaHash) -> Self {
        let classes = index_by_name("class", document.classes.iter().map(|class| &class.name));
        let structs = index_by_name(
            "struct",
            document.structs.iter().map(|script_struct| &script_struct.name),
        );
        let enums = index_by_name("enum", document.enums.iter().map(|enum_type| &enum_type.name));
        debug!(
            classes = document.classes.len(),
            structs = document.structs.len(),
            enums = document.enums.len(),
            %hash,
            "Loaded schema"
        );
        Self {
            document,
            hash,
            classes,
            structs,
            enums,
        }
    }

    /// Check that `stamp` was produced for this document and this bridge
    pub fn verify_stamp(&self, stamp: &SchemaStamp) -> Result<()> {
        if stamp.abi_version != ABI_VERSION {
            return Err(Report::new(BridgeError::AbiVersionMismatch {
                expected: ABI_VERSION,
                found:    stamp.abi_version,
            }));
        }
        if stamp.schema_hash != self.hash {
            return Err(Report::new(BridgeError::SchemaMismatch {
                expected: self.hash,
                found:    stamp.schema_hash,
            }));
        }
        Ok(())
    }

    /// Parsed document
    pub const fn document(&self) -> &SchemaDocument { &self.document }

    /// Hash of the document bytes
    pub const fn hash(&self) -> SchemaHash { self.hash }

    /// Stamp matching this document
    pub const fn stamp(&self) -> SchemaStamp {
        SchemaStamp {
            abi_version: ABI_VERSION,
            schema_hash: self.hash,
        }
    }

    /// Class called `name`
    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes
            .get(name)
            .and_then(|&index| self.document.classes.get(index))
    }

    /// Struct called `name`
    pub fn struct_descriptor(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs
            .get(name)
            .and_then(|&index| self.document.structs.get(index))
    }

    /// Enum called `name`
    pub fn enum_descriptor(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums
            .get(name)
            .and_then(|&index| self.document.enums.get(index))
    }

    /// Find `function` on `class` or the nearest super class declaring it
    ///
    /// Returns the declaring class with the function. The walk stops at a super class that is
    /// not in the schema.
    pub fn find_function(
        &self,
        class: &str,
        function: &str,
    ) -> Result<(&ClassDescriptor, &FunctionDescriptor)> {
        let mut visited = HashSet::new();
        let mut current = self.class(class);

        while let Some(descriptor) = current {
            if !visited.insert(descriptor.name.as_str()) {
                warn!("Super chain of `{class}` loops at `{}`", descriptor.name);
                break;
            }
            if let Some(found) = descriptor
                .functions
                .iter()
                .find(|candidate| candidate.name == function)
            {
                return Ok((descriptor, found));
            }
            current = descriptor
                .super_name
                .as_deref()
                .and_then(|super_name| self.class(super_name));
        }

        Err(Report::new(BridgeError::unknown_function(class, function)))
    }

    /// Parameter layout of `function` as resolved from `class`
    pub fn function_layout(&self, class: &str, function: &str) -> Result<FunctionLayout> {
        let (_, descriptor) = self.find_function(class, function)?;
        FunctionLayout::compute(descriptor, self)
    }
}

fn index_by_name<'a>(kind: &str, names: impl Iterator<Item = &'a String>) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (position, name) in names.enumerate() {
        if index.contains_key(name) {
            warn!("Duplicate {kind} `{name}` in schema; lookups use the first entry");
        } else {
            index.insert(name.clone(), position);
        }
    }
    index
}
