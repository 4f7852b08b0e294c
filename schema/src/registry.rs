//! Read-only view of the host's live type registry
//!
//! The export pass never owns the registry: the host hands the walker a snapshot handle
//! implementing [`TypeRegistry`] and keeps it quiescent for the duration of the walk. Hosts that
//! cannot borrow their reflection data directly can materialize it into an
//! [`InMemoryRegistry`].

use strum::AsRefStr;

use crate::basic_types::BasicTypes;

/// Read-only snapshot handle over the host's reflected types
///
/// Iteration order is the registry's own order; the export keeps it as-is.
pub trait TypeRegistry {
    /// Every live class
    fn classes(&self) -> impl Iterator<Item = &ClassInfo>;

    /// Every live struct
    fn structs(&self) -> impl Iterator<Item = &StructInfo>;

    /// Every live enum
    fn enums(&self) -> impl Iterator<Item = &EnumInfo>;

    /// Layouts of the built-in container types in this engine build
    fn basic_types(&self) -> BasicTypes { BasicTypes::engine_defaults() }
}

/// Reference to a reflected class or struct by both of its names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Internal symbol name
    pub symbol_name:  String,
    /// Designer-facing (authored) name
    pub display_name: String,
}

impl TypeRef {
    /// Reference whose symbol and display names differ
    pub fn new(symbol_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol_name:  symbol_name.into(),
            display_name: display_name.into(),
        }
    }

    /// Reference whose symbol and display names are the same
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            symbol_name:  name.clone(),
            display_name: name,
        }
    }
}

/// Every property kind the host reflection can report
///
/// Only the first twelve kinds are exportable; the rest exist so the host can describe what it
/// has without pre-filtering, and resolve to "unsupported".
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PropertyKind {
    /// Reference to an object of `class`
    Object {
        /// Referenced class
        class: TypeRef,
    },
    /// Inline value of `script_struct`
    Struct {
        /// Referenced struct
        script_struct: TypeRef,
    },
    /// Enum-typed property with its own underlying storage
    Enum {
        /// Internal symbol name of the referenced enum
        enum_name:       String,
        /// Width in bytes of the underlying integer property
        underlying_size: u64,
    },
    /// Interned name
    Name,
    /// Owned string
    Str,
    /// Localizable text
    Text,
    /// Byte-width value, optionally backed by an enum
    Byte {
        /// Symbol name of the backing enum, when the byte is enum-backed
        enum_name: Option<String>,
    },
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
    /// Dynamic array
    Array,
    /// Hash set
    Set,
    /// Hash map
    Map,
    /// Single or multicast delegate
    Delegate,
    /// Soft object reference
    SoftObject,
    /// Weak object reference
    WeakObject,
    /// Interface reference
    Interface,
    /// Any other host kind, by host name
    Other(String),
}

/// One reflected property or function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Authored name
    pub name:  String,
    /// Raw property flag bits, exported verbatim
    pub flags: u64,
    /// Reflected kind
    pub kind:  PropertyKind,
}

impl PropertyInfo {
    /// Property with no flags set
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            kind,
        }
    }

    /// Set the raw flag bits
    #[must_use]
    pub const fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }
}

/// One reflected function and its parameters in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Authored name
    pub name:   String,
    /// Parameters in call-argument order, including out and return parameters
    pub params: Vec<PropertyInfo>,
}

impl FunctionInfo {
    /// Function with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn with_param(mut self, param: PropertyInfo) -> Self {
        self.params.push(param);
        self
    }
}

/// One reflected class with the members it declares itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// The class
    pub name:        TypeRef,
    /// Direct super class, if any
    pub super_class: Option<TypeRef>,
    /// Properties declared on this class, excluding inherited ones
    pub properties:  Vec<PropertyInfo>,
    /// Functions declared on this class, excluding inherited ones
    pub functions:   Vec<FunctionInfo>,
}

impl ClassInfo {
    /// Class without super class or members
    pub fn new(name: TypeRef) -> Self {
        Self {
            name,
            super_class: None,
            properties: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Set the direct super class
    #[must_use]
    pub fn with_super(mut self, super_class: TypeRef) -> Self {
        self.super_class = Some(super_class);
        self
    }

    /// Append a declared property
    #[must_use]
    pub fn with_property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Append a declared function
    #[must_use]
    pub fn with_function(mut self, function: FunctionInfo) -> Self {
        self.functions.push(function);
        self
    }
}

/// One reflected struct with its native size and alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructInfo {
    /// The struct
    pub name:    TypeRef,
    /// Native size in bytes
    pub size:    u64,
    /// Native alignment in bytes
    pub align:   u64,
    /// Members in declaration order
    pub members: Vec<PropertyInfo>,
}

impl StructInfo {
    /// Struct without members
    pub const fn new(name: TypeRef, size: u64, align: u64) -> Self {
        Self {
            name,
            size,
            align,
            members: Vec::new(),
        }
    }

    /// Append a member
    #[must_use]
    pub fn with_member(mut self, member: PropertyInfo) -> Self {
        self.members.push(member);
        self
    }
}

/// One reflected enum; enums only carry their internal symbol name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumInfo {
    /// Internal symbol name
    pub name:    String,
    /// Entries in declaration order as (authored name, value)
    pub entries: Vec<(String, i64)>,
    /// Width in bytes of the underlying integer
    pub size:    u64,
}

impl EnumInfo {
    /// Byte-backed enum without entries
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            entries: Vec::new(),
            size:    1,
        }
    }

    /// Set the underlying integer width, for enums stored wider than a byte
    #[must_use]
    pub const fn with_underlying_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Append an entry
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, value: i64) -> Self {
        self.entries.push((name.into(), value));
        self
    }
}

/// Registry snapshot held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    classes:     Vec<ClassInfo>,
    structs:     Vec<StructInfo>,
    enums:       Vec<EnumInfo>,
    basic_types: Option<BasicTypes>,
}

impl InMemoryRegistry {
    /// Empty registry using engine-default basic type layouts
    pub fn new() -> Self { Self::default() }

    /// Append a class
    #[must_use]
    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.classes.push(class);
        self
    }

    /// Append a struct
    #[must_use]
    pub fn with_struct(mut self, script_struct: StructInfo) -> Self {
        self.structs.push(script_struct);
        self
    }

    /// Append an enum
    #[must_use]
    pub fn with_enum(mut self, enum_info: EnumInfo) -> Self {
        self.enums.push(enum_info);
        self
    }

    /// Override the basic type layouts reported by this registry
    #[must_use]
    pub fn with_basic_types(mut self, basic_types: BasicTypes) -> Self {
        self.basic_types = Some(basic_types);
        self
    }
}

impl TypeRegistry for InMemoryRegistry {
    fn classes(&self) -> impl Iterator<Item = &ClassInfo> { self.classes.iter() }

    fn structs(&self) -> impl Iterator<Item = &StructInfo> { self.structs.iter() }

    fn enums(&self) -> impl Iterator<Item = &EnumInfo> { self.enums.iter() }

    fn basic_types(&self) -> BasicTypes {
        self.basic_types
            .clone()
            .unwrap_or_else(BasicTypes::engine_defaults)
    }
}
