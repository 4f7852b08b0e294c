//! Owned parameter storage laid out for one function

use core::ffi::c_void;

use error_stack::Report;

use crate::abi::ObjectPtr;
use crate::error::{BridgeError, Result};
use crate::layout::{FunctionLayout, MAX_SLOT_ALIGN, ParamSlot};

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width value stored in a parameter slot in native byte order
pub trait SlotValue: sealed::Sealed + Copy {
    /// Encoded width in bytes
    const SIZE: usize;

    /// Write the native encoding into `out`, which is exactly [`Self::SIZE`] bytes
    fn encode(self, out: &mut [u8]);

    /// Read a value from exactly [`Self::SIZE`] bytes
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_slot_value {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl SlotValue for $ty {
                const SIZE: usize = size_of::<$ty>();

                fn encode(self, out: &mut [u8]) { out.copy_from_slice(&self.to_ne_bytes()); }

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0_u8; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_slot_value!(u8, i32, i64, f32, f64);

impl sealed::Sealed for bool {}

impl SlotValue for bool {
    const SIZE: usize = 1;

    fn encode(self, out: &mut [u8]) { out[0] = u8::from(self); }

    fn decode(bytes: &[u8]) -> Self { bytes[0] != 0 }
}

impl sealed::Sealed for ObjectPtr {}

impl SlotValue for ObjectPtr {
    const SIZE: usize = size_of::<usize>();

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.as_ptr().expose_provenance().to_ne_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0_u8; size_of::<usize>()];
        raw.copy_from_slice(bytes);
        Self::new(core::ptr::with_exposed_provenance_mut(usize::from_ne_bytes(raw)))
    }
}

/// Zeroed parameter block whose start is aligned to [`MAX_SLOT_ALIGN`]
#[derive(Debug)]
pub struct ParamBuffer {
    layout:  FunctionLayout,
    storage: Vec<u8>,
    start:   usize,
}

impl ParamBuffer {
    /// Zeroed buffer for `layout`
    pub fn new(layout: FunctionLayout) -> Self {
        // `FunctionLayout::compute` rejects sizes where this would overflow
        let storage = vec![0_u8; layout.size() + MAX_SLOT_ALIGN];
        let misalignment = storage.as_ptr().addr() % MAX_SLOT_ALIGN;
        let start = (MAX_SLOT_ALIGN - misalignment) % MAX_SLOT_ALIGN;
        Self {
            layout,
            storage,
            start,
        }
    }

    /// Layout this buffer was built for
    pub const fn layout(&self) -> &FunctionLayout { &self.layout }

    /// The whole parameter block
    pub fn bytes(&self) -> &[u8] { &self.storage[self.start..self.start + self.layout.size()] }

    /// The whole parameter block, mutably
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.layout.size();
        &mut self.storage[self.start..self.start + size]
    }

    /// Aligned pointer to the block, handed to the host
    pub fn as_mut_ptr(&mut self) -> *mut c_void { self.bytes_mut().as_mut_ptr().cast() }

    /// Store `value` in the slot called `name`
    pub fn write<T: SlotValue>(&mut self, name: &str, value: T) -> Result<()> {
        let range = self.typed_range::<T>(name)?;
        value.encode(&mut self.bytes_mut()[range]);
        Ok(())
    }

    /// Load the value in the slot called `name`
    pub fn read<T: SlotValue>(&self, name: &str) -> Result<T> {
        let range = self.typed_range::<T>(name)?;
        Ok(T::decode(&self.bytes()[range]))
    }

    /// Raw bytes of the slot called `name`, for names, strings and structs
    pub fn slot_bytes(&self, name: &str) -> Result<&[u8]> {
        let slot = self.find_slot(name)?;
        let range = slot_range(slot);
        Ok(&self.bytes()[range])
    }

    /// Raw bytes of the slot called `name`, mutably
    pub fn slot_bytes_mut(&mut self, name: &str) -> Result<&mut [u8]> {
        let slot = self.find_slot(name)?;
        let range = slot_range(slot);
        Ok(&mut self.bytes_mut()[range])
    }

    /// Raw bytes of the slot at `index`, used while resolving thunk arguments
    pub(crate) fn slot_bytes_at_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let range = self.layout.slots().get(index).map(slot_range)?;
        Some(&mut self.bytes_mut()[range])
    }

    fn find_slot(&self, name: &str) -> Result<&ParamSlot> {
        self.layout.slot(name).ok_or_else(|| {
            Report::new(BridgeError::layout_mismatch(
                self.layout.function(),
                format!("no parameter named `{name}`"),
            ))
        })
    }

    fn typed_range<T: SlotValue>(&self, name: &str) -> Result<std::ops::Range<usize>> {
        let slot = self.find_slot(name)?;
        if slot.layout.size != T::SIZE {
            return Err(Report::new(BridgeError::layout_mismatch(
                self.layout.function(),
                format!(
                    "parameter `{name}` is {} bytes, value is {} bytes",
                    slot.layout.size,
                    T::SIZE
                ),
            )));
        }
        Ok(slot_range(slot))
    }
}

impl Clone for ParamBuffer {
    // A cloned Vec may start at a different alignment
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.layout.clone());
        copy.bytes_mut().copy_from_slice(self.bytes());
        copy
    }
}

fn slot_range(slot: &ParamSlot) -> std::ops::Range<usize> {
    slot.layout.offset..slot.layout.offset + slot.layout.size
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::schema::LoadedSchema;

    const SCHEMA: &str = r#"{
        "classes": [{"name": "Hero", "super": "", "properties": [], "functions": [
            {"name": "Setup", "params": [
                {"name": "alive", "property": "primitive", "type_info": "bool", "flags": 0},
                {"name": "level", "property": "primitive", "type_info": "int32", "flags": 0},
                {"name": "target", "property": "object", "type_info": "Actor", "flags": 0},
                {"name": "tag", "property": "name", "type_info": "", "flags": 0}
            ]}
        ]}],
        "structs": [],
        "enums": [],
        "basic_types": {"FName": {"size": 12, "align": 4}}
    }"#;

    fn setup_buffer() -> ParamBuffer {
        let schema = LoadedSchema::from_json(SCHEMA).unwrap();
        ParamBuffer::new(schema.function_layout("Hero", "Setup").unwrap())
    }

    #[test]
    fn test_block_is_aligned_and_zeroed() {
        let mut buffer = setup_buffer();
        assert_eq!(buffer.as_mut_ptr().addr() % MAX_SLOT_ALIGN, 0);
        assert_eq!(buffer.bytes().len(), buffer.layout().size());
        assert!(buffer.bytes().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_typed_slots_store_native_bytes() {
        let mut buffer = setup_buffer();
        buffer.write("alive", true).unwrap();
        buffer.write("level", 42_i32).unwrap();

        let object = ObjectPtr::new(core::ptr::without_provenance_mut(0x1000));
        buffer.write("target", object).unwrap();

        assert!(buffer.read::<bool>("alive").unwrap());
        assert_eq!(buffer.read::<i32>("level").unwrap(), 42);
        assert_eq!(buffer.read::<ObjectPtr>("target").unwrap().addr(), 0x1000);

        let offset = buffer.layout().slot("level").unwrap().layout.offset;
        assert_eq!(&buffer.bytes()[offset..offset + 4], &42_i32.to_ne_bytes());
    }

    #[test]
    fn test_raw_slot_access_for_basic_types() {
        let mut buffer = setup_buffer();
        buffer.slot_bytes_mut("tag").unwrap().fill(0xAB);
        assert_eq!(buffer.slot_bytes("tag").unwrap(), &[0xAB; 12]);
    }

    #[test]
    fn test_wrong_width_or_name_is_layout_mismatch() {
        let mut buffer = setup_buffer();
        for error in [
            buffer.write("level", 1_i64).unwrap_err(),
            buffer.write("alive", 1_i32).unwrap_err(),
            buffer.write("missing", 1_u8).unwrap_err(),
        ] {
            assert!(matches!(error.current_context(), BridgeError::LayoutMismatch { .. }));
        }
    }
}
