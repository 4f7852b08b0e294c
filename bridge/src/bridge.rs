//! The call bridge and its registration lifecycle

use std::ffi::CString;
use std::ptr;

use error_stack::Report;
use strum::AsRefStr;
use tracing::{debug, error, info};

use crate::abi::{CallBridgeTable, Handler, ObjectPtr};
use crate::buffer::ParamBuffer;
use crate::error::{BridgeError, Result};
use crate::layout::FunctionLayout;
use crate::schema::LoadedSchema;
use crate::thunk::{ThunkSession, call_function_callback, resolve_param_callback};
use crate::ABI_VERSION;

#[derive(AsRefStr)]
enum BridgeState {
    Uninitialized,
    Active {
        table:  CallBridgeTable,
        schema: LoadedSchema,
    },
}

/// Routes foreign calls into native code through the host's registered table
///
/// A bridge starts uninitialized and becomes active on the first successful
/// [`register`](Self::register). It never goes back. The bridge does no locking: the host calls
/// it from its dispatch thread.
pub struct CallBridge {
    state: BridgeState,
}

impl Default for CallBridge {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for CallBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("CallBridge");
        debug.field("state", &self.state.as_ref());
        if let BridgeState::Active { table, .. } = &self.state {
            debug.field("table", table);
        }
        debug.finish()
    }
}

impl CallBridge {
    /// Uninitialized bridge
    pub const fn new() -> Self {
        Self {
            state: BridgeState::Uninitialized,
        }
    }

    /// Activate the bridge with the host's table and the schema it was built against
    ///
    /// Fails with `AlreadyRegistered` on a second call, and with `AbiVersionMismatch` or
    /// `SchemaMismatch` when the table does not match; the bridge then stays uninitialized.
    pub fn register(&mut self, table: CallBridgeTable, schema: LoadedSchema) -> Result<()> {
        if matches!(self.state, BridgeState::Active { .. }) {
            error!("Call bridge registration rejected: already registered");
            return Err(Report::new(BridgeError::AlreadyRegistered));
        }

        if table.abi_version != ABI_VERSION {
            error!(
                "Call bridge registration rejected: host ABI {} != {ABI_VERSION}",
                table.abi_version
            );
            return Err(Report::new(BridgeError::AbiVersionMismatch {
                expected: ABI_VERSION,
                found:    table.abi_version,
            }));
        }

        if table.schema_hash() != schema.hash() {
            error!(
                "Call bridge registration rejected: host schema {} != loaded schema {}",
                table.schema_hash(),
                schema.hash()
            );
            return Err(Report::new(BridgeError::SchemaMismatch {
                expected: schema.hash(),
                found:    table.schema_hash(),
            }));
        }

        info!(
            "Call bridge registered (ABI {ABI_VERSION}, schema {})",
            schema.hash()
        );
        self.state = BridgeState::Active { table, schema };
        Ok(())
    }

    /// Whether a table has been registered
    pub const fn is_active(&self) -> bool { matches!(self.state, BridgeState::Active { .. }) }

    fn active(&self) -> Result<(&CallBridgeTable, &LoadedSchema)> {
        match &self.state {
            BridgeState::Active { table, schema } => Ok((table, schema)),
            BridgeState::Uninitialized => Err(Report::new(BridgeError::NotActive)),
        }
    }

    /// Schema the bridge was registered with
    pub fn schema(&self) -> Result<&LoadedSchema> { self.active().map(|(_, schema)| schema) }

    /// Parameter layout of `function` as resolved from `class`
    pub fn function_layout(&self, class: &str, function: &str) -> Result<FunctionLayout> {
        self.active()?.1.function_layout(class, function)
    }

    /// Zeroed parameter buffer for `function` as resolved from `class`
    pub fn new_params(&self, class: &str, function: &str) -> Result<ParamBuffer> {
        self.function_layout(class, function).map(ParamBuffer::new)
    }

    /// Invoke `function` on `target` by name through the host dispatcher
    ///
    /// The function is looked up on `class` and then its super chain. `params` must have been
    /// laid out for that function; output parameters are written back into it by the host.
    pub fn invoke(
        &self,
        target: ObjectPtr,
        class: &str,
        function: &str,
        params: &mut ParamBuffer,
    ) -> Result<()> {
        let (table, schema) = self.active()?;
        let expected = schema.function_layout(class, function)?;

        if !expected.is_compatible_with(params.layout()) {
            let detail = expected.describe_difference(params.layout());
            error!("Rejected invoke of `{class}::{function}`: {detail}");
            return Err(Report::new(BridgeError::layout_mismatch(function, detail)));
        }
        if target.is_null() {
            return Err(Report::new(BridgeError::NullObject(format!("{class}::{function}"))));
        }
        let function_name = CString::new(function)
            .map_err(|_| Report::new(BridgeError::InvalidName(function.to_string())))?;

        debug!(
            "Invoking `{class}::{function}` with {} parameter bytes",
            expected.size()
        );
        (table.process_event)(target.as_ptr(), function_name.as_ptr(), params.as_mut_ptr());
        Ok(())
    }

    /// Serve a native call into a foreign override of `function`
    ///
    /// The host thunk handler resolves every declared argument from `handler`'s frame, then
    /// dispatches once; `implementation` runs on that dispatch with the target object and the
    /// resolved arguments. Returns the arguments as the implementation left them.
    pub fn run_custom_thunk<F>(
        &self,
        handler: &mut Handler,
        class: &str,
        function: &str,
        mut implementation: F,
    ) -> Result<ParamBuffer>
    where
        F: FnMut(ObjectPtr, &mut ParamBuffer),
    {
        let (table, schema) = self.active()?;
        let layout = schema.function_layout(class, function)?;

        let mut session = ThunkSession::new(layout, &mut implementation);
        (table.handle_custom_thunk)(
            ptr::from_mut(handler),
            ptr::from_mut(&mut session).cast(),
            resolve_param_callback,
            call_function_callback,
        );

        debug!(
            "Custom thunk `{class}::{function}` finished in state {}",
            session.state().as_ref()
        );
        session.finish().map_err(|violation| {
            error!("Custom thunk `{class}::{function}` failed: {violation}");
            Report::new(BridgeError::ThunkProtocolViolation(violation))
        })
    }
}
