//! Native call bridge driven by an exported reflection schema
//!
//! Generated foreign bindings call native functions through a [`CallBridge`]. The embedding
//! host registers one [`CallBridgeTable`] holding two entries:
//! - `handle_custom_thunk`: native code calling a function overridden in foreign code
//! - `process_event`: foreign code invoking a native function by name
//!
//! Parameter buffers are laid out from the schema document `bprust_schema` exported. The table
//! carries the hash of that document, and registration fails unless it matches the schema the
//! bridge loaded, so bindings and host can never disagree on a layout.
//!
//! # Usage
//!
//! ```no_run
//! # use bprust_bridge::{CallBridge, CallBridgeTable, LoadedSchema, ObjectPtr, Result};
//! # fn run(table: CallBridgeTable, target: ObjectPtr) -> Result<()> {
//! let schema = LoadedSchema::load_stamped("blueprint_definitions.json".as_ref())?;
//! let mut bridge = CallBridge::new();
//! bridge.register(table, schema)?;
//!
//! let mut params = bridge.new_params("Foo", "Heal")?;
//! params.write("amount", 25_i32)?;
//! bridge.invoke(target, "Foo", "Heal", &mut params)?;
//! # Ok(())
//! # }
//! ```

mod abi;
mod bridge;
mod buffer;
mod error;
mod layout;
mod schema;
mod thunk;

pub use abi::{
    CallBridgeTable, CallFunctionFn, CustomThunkFn, Handler, ObjectPtr, ProcessEventFn,
    ResolveParamFn,
};
pub use bprust_schema::ABI_VERSION;
pub use bridge::CallBridge;
pub use buffer::{ParamBuffer, SlotValue};
pub use error::{BridgeError, Result};
pub use layout::{FunctionLayout, MAX_SLOT_ALIGN, ParamSlot, SlotLayout};
pub use schema::LoadedSchema;
pub use thunk::{ThunkState, ThunkViolation};
