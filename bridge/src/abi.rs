//! C ABI shared with the embedding host
//!
//! The host fills one [`CallBridgeTable`] and registers it once. Every type here is `#[repr(C)]`
//! and mirrors this header:
//!
//! ```c
//! struct Handler {
//!     void *context;
//!     void *frame;
//!     void *param_result;
//! };
//!
//! struct CallBridgeTable {
//!     uint32_t abi_version;
//!     uint8_t  schema_hash[32];
//!     void (*handle_custom_thunk)(Handler *handler,
//!                                 void *user_data,
//!                                 void (*resolve_param)(void *user_data, Handler *handler),
//!                                 void (*call_function)(void *user_data, void *object));
//!     void (*process_event)(void *object, const char *function_name, void *params);
//! };
//! ```

use core::ffi::{c_char, c_void};
use core::ptr;

use bprust_schema::{SchemaHash, SchemaStamp};

/// Native call frame handed to a custom thunk
///
/// The bridge only reads `param_result`: before each `resolve_param` call the host points it at
/// the current argument's storage in the native frame.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    /// Host execution context
    pub context:      *mut c_void,
    /// Host call frame
    pub frame:        *mut c_void,
    /// Storage of the argument being resolved
    pub param_result: *mut c_void,
}

impl Handler {
    /// Handler over a host context and frame with no argument selected yet
    pub const fn new(context: *mut c_void, frame: *mut c_void) -> Self {
        Self {
            context,
            frame,
            param_result: ptr::null_mut(),
        }
    }
}

/// Bridge callback: copy the argument at `handler.param_result` into the next slot
pub type ResolveParamFn = extern "C" fn(user_data: *mut c_void, handler: *mut Handler);

/// Bridge callback: run the foreign implementation against `object`
pub type CallFunctionFn = extern "C" fn(user_data: *mut c_void, object: *mut c_void);

/// Host entry driving one custom thunk
///
/// The host calls `resolve_param` once per declared parameter, in order, then
/// `call_function` exactly once, then returns.
pub type CustomThunkFn = extern "C" fn(
    handler: *mut Handler,
    user_data: *mut c_void,
    resolve_param: ResolveParamFn,
    call_function: CallFunctionFn,
);

/// Host entry invoking a native function by name with a laid-out parameter buffer
pub type ProcessEventFn =
    extern "C" fn(object: *mut c_void, function_name: *const c_char, params: *mut c_void);

/// Function table the host registers with the bridge
///
/// All function pointers must be valid for the lifetime of the bridge.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CallBridgeTable {
    /// Bridge ABI version the host was built for
    pub abi_version:         u32,
    /// SHA-256 of the schema document the host was built against
    pub schema_hash:         [u8; 32],
    /// Custom-thunk handler
    pub handle_custom_thunk: CustomThunkFn,
    /// Invoke-by-name dispatcher
    pub process_event:       ProcessEventFn,
}

impl CallBridgeTable {
    /// Table stamped with the given schema stamp
    pub const fn new(
        stamp: SchemaStamp,
        handle_custom_thunk: CustomThunkFn,
        process_event: ProcessEventFn,
    ) -> Self {
        Self {
            abi_version: stamp.abi_version,
            schema_hash: *stamp.schema_hash.as_bytes(),
            handle_custom_thunk,
            process_event,
        }
    }

    /// Schema hash stamped in the table
    pub const fn schema_hash(&self) -> SchemaHash { SchemaHash::from_bytes(self.schema_hash) }
}

impl std::fmt::Debug for CallBridgeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallBridgeTable")
            .field("abi_version", &self.abi_version)
            .field("schema_hash", &self.schema_hash())
            .finish_non_exhaustive()
    }
}

/// Opaque pointer to a host object
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectPtr(*mut c_void);

impl ObjectPtr {
    /// Null object
    pub const NULL: Self = Self(ptr::null_mut());

    /// Wrap a host object pointer
    pub const fn new(object: *mut c_void) -> Self { Self(object) }

    /// Raw pointer for the host
    pub const fn as_ptr(self) -> *mut c_void { self.0 }

    /// Whether the pointer is null
    pub fn is_null(self) -> bool { self.0.is_null() }

    /// Address as an integer, the form stored in parameter buffers
    pub fn addr(self) -> usize { self.0.addr() }
}
