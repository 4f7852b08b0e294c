//! Native parameter layouts computed from schema function signatures
//!
//! Parameters follow natural C layout in declaration order: each slot starts at a multiple of
//! its own alignment and the total size is rounded up to the largest alignment.

use bprust_schema::{BasicType, FunctionDescriptor, PrimitiveType, PropertyType, property_flags};
use error_stack::Report;

use crate::error::{BridgeError, Result};
use crate::schema::LoadedSchema;

/// Largest slot alignment a parameter buffer guarantees
pub const MAX_SLOT_ALIGN: usize = 8;

/// Position of one parameter inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// Byte offset from the buffer start
    pub offset: usize,
    /// Size in bytes
    pub size:   usize,
    /// Alignment in bytes
    pub align:  usize,
}

/// One laid-out parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    /// Authored parameter name
    pub name:          String,
    /// Schema type of the parameter
    pub property_type: PropertyType,
    /// Raw property flags from the schema
    pub flags:         u64,
    /// Position in the buffer
    pub layout:        SlotLayout,
}

impl ParamSlot {
    /// Whether the callee writes this slot back
    pub const fn is_output(&self) -> bool { property_flags::is_output(self.flags) }
}

/// Layout of a whole parameter block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionLayout {
    function: String,
    slots:    Vec<ParamSlot>,
    size:     usize,
    align:    usize,
}

impl FunctionLayout {
    /// Lay out `function`'s parameters using sizes from `schema`
    pub fn compute(function: &FunctionDescriptor, schema: &LoadedSchema) -> Result<Self> {
        let mut slots = Vec::with_capacity(function.params.len());
        let mut cursor = 0_usize;
        let mut align = 1_usize;

        for param in &function.params {
            let (slot_size, slot_align) = slot_size_align(&param.property_type, schema)
                .map_err(|detail| {
                    Report::new(BridgeError::UnsupportedLayout(format!(
                        "parameter `{}` of `{}`: {detail}",
                        param.name, function.name
                    )))
                })?;

            let Some((offset, end)) = cursor
                .checked_next_multiple_of(slot_align)
                .and_then(|offset| Some((offset, offset.checked_add(slot_size)?)))
            else {
                return Err(Report::new(BridgeError::UnsupportedLayout(format!(
                    "parameter `{}` of `{}` overflows the parameter block",
                    param.name, function.name
                ))));
            };
            cursor = end;
            align = align.max(slot_align);

            slots.push(ParamSlot {
                name:          param.name.clone(),
                property_type: param.property_type.clone(),
                flags:         param.flags,
                layout:        SlotLayout {
                    offset,
                    size: slot_size,
                    align: slot_align,
                },
            });
        }

        // Buffers over-allocate by one alignment to place the block
        let size = cursor
            .checked_next_multiple_of(align)
            .filter(|size| size.checked_add(MAX_SLOT_ALIGN).is_some())
            .ok_or_else(|| {
                Report::new(BridgeError::UnsupportedLayout(format!(
                    "parameters of `{}` span {cursor} bytes, too large for a parameter block",
                    function.name
                )))
            })?;

        Ok(Self {
            function: function.name.clone(),
            slots,
            size,
            align,
        })
    }

    /// Function this layout was computed for
    pub fn function(&self) -> &str { &self.function }

    /// Slots in call-argument order
    pub fn slots(&self) -> &[ParamSlot] { &self.slots }

    /// Total size in bytes
    pub const fn size(&self) -> usize { self.size }

    /// Alignment of the whole block
    pub const fn align(&self) -> usize { self.align }

    /// Slot called `name`
    pub fn slot(&self, name: &str) -> Option<&ParamSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Whether `other` places every byte where this layout does
    ///
    /// Slot names and the function name are not compared.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.size == other.size
            && self.align == other.align
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(mine, theirs)| mine.layout == theirs.layout)
    }

    /// First difference between this layout and `actual`, for error messages
    pub(crate) fn describe_difference(&self, actual: &Self) -> String {
        if self.size != actual.size || self.align != actual.align {
            return format!(
                "expected {} bytes aligned to {}, buffer has {} bytes aligned to {} (laid out for `{}`)",
                self.size, self.align, actual.size, actual.align, actual.function
            );
        }
        if self.slots.len() != actual.slots.len() {
            return format!(
                "expected {} parameters, buffer has {} (laid out for `{}`)",
                self.slots.len(),
                actual.slots.len(),
                actual.function
            );
        }
        self.slots
            .iter()
            .zip(&actual.slots)
            .find(|(expected, found)| expected.layout != found.layout)
            .map_or_else(
                || "layouts are compatible".to_string(),
                |(expected, found)| {
                    format!(
                        "parameter `{}` expected at offset {} size {}, buffer has offset {} size {}",
                        expected.name,
                        expected.layout.offset,
                        expected.layout.size,
                        found.layout.offset,
                        found.layout.size
                    )
                },
            )
    }
}

fn slot_size_align(
    property_type: &PropertyType,
    schema: &LoadedSchema,
) -> std::result::Result<(usize, usize), String> {
    let (size, align) = match property_type {
        PropertyType::Primitive(PrimitiveType::Byte | PrimitiveType::Bool) => (1, 1),
        PropertyType::Primitive(PrimitiveType::Int32 | PrimitiveType::Float) => (4, 4),
        PropertyType::Primitive(PrimitiveType::Int64 | PrimitiveType::Double) => (8, 8),
        PropertyType::Object(_) => (size_of::<usize>(), align_of::<usize>()),
        PropertyType::Name => basic_layout(BasicType::FName, schema)?,
        PropertyType::String => basic_layout(BasicType::FString, schema)?,
        PropertyType::Text => basic_layout(BasicType::FText, schema)?,
        PropertyType::Enum(name) => {
            let enum_type = schema
                .enum_descriptor(name)
                .ok_or_else(|| format!("enum `{name}` is not in the schema"))?;
            let width = to_usize(enum_type.size, name)?;
            (width, width)
        },
        PropertyType::Struct(name) => {
            let script_struct = schema
                .struct_descriptor(name)
                .ok_or_else(|| format!("struct `{name}` is not in the schema"))?;
            (
                to_usize(script_struct.size, name)?,
                to_usize(script_struct.align, name)?,
            )
        },
    };

    if !align.is_power_of_two() || align > MAX_SLOT_ALIGN {
        return Err(format!(
            "alignment {align} is not a power of two no greater than {MAX_SLOT_ALIGN}"
        ));
    }
    Ok((size, align))
}

fn basic_layout(
    basic_type: BasicType,
    schema: &LoadedSchema,
) -> std::result::Result<(usize, usize), String> {
    let layout = schema
        .document()
        .basic_types
        .get(basic_type)
        .ok_or_else(|| format!("basic type {basic_type} is missing from the schema"))?;
    Ok((
        to_usize(layout.size, basic_type.as_ref())?,
        to_usize(layout.align, basic_type.as_ref())?,
    ))
}

fn to_usize(value: u64, what: &str) -> std::result::Result<usize, String> {
    usize::try_from(value).map_err(|_| format!("`{what}` layout value {value} does not fit usize"))
}
