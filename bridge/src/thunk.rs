//! Custom-thunk sessions
//!
//! When native code calls a function overridden in foreign code, the host's thunk handler
//! drives one [`ThunkSession`] through the two bridge callbacks:
//!
//! ```text
//! ResolvingParams { next: 0 } --resolve--> ... --resolve--> ResolvingParams { next: N }
//! ResolvingParams { next: N } --call_function--> Dispatched
//! any other transition --------------------------------> Violated
//! ```
//!
//! The foreign implementation runs only on the `ResolvingParams { next: N } -> Dispatched`
//! transition, so it never runs twice and never runs on partially resolved arguments.

use core::ffi::c_void;
use core::slice;

use strum::AsRefStr;
use thiserror::Error;
use tracing::{debug, error};

use crate::abi::{Handler, ObjectPtr};
use crate::buffer::ParamBuffer;
use crate::layout::FunctionLayout;

/// Ways a host can break the thunk call sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThunkViolation {
    /// More resolutions than declared parameters
    #[error("resolve requested after all {declared} parameters were resolved")]
    ExtraResolution {
        /// Declared parameter count
        declared: usize,
    },

    /// The host selected no argument storage before resolving
    #[error("argument {index} has a null storage pointer")]
    NullParamResult {
        /// Parameter position
        index: usize,
    },

    /// Dispatch before every parameter was resolved
    #[error("dispatched after resolving {resolved} of {declared} parameters")]
    MissingResolutions {
        /// Parameters resolved so far
        resolved: usize,
        /// Declared parameter count
        declared: usize,
    },

    /// A resolution after the implementation ran
    #[error("resolve requested after dispatch")]
    ResolveAfterDispatch,

    /// A second dispatch
    #[error("dispatched more than once")]
    DoubleDispatch,

    /// The handler returned without dispatching
    #[error("handler returned without dispatching after resolving {resolved} of {declared} parameters")]
    NotDispatched {
        /// Parameters resolved
        resolved: usize,
        /// Declared parameter count
        declared: usize,
    },
}

/// Where a session is in the call sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ThunkState {
    /// Waiting for the argument at position `next`
    ResolvingParams {
        /// Next parameter position to resolve
        next: usize,
    },
    /// The foreign implementation ran
    Dispatched,
    /// The sequence was broken; later callbacks are ignored
    Violated(ThunkViolation),
}

/// One in-flight custom thunk
pub(crate) struct ThunkSession<'a> {
    state:          ThunkState,
    buffer:         ParamBuffer,
    implementation: &'a mut (dyn FnMut(ObjectPtr, &mut ParamBuffer) + 'a),
}

impl<'a> ThunkSession<'a> {
    pub(crate) fn new(
        layout: FunctionLayout,
        implementation: &'a mut (dyn FnMut(ObjectPtr, &mut ParamBuffer) + 'a),
    ) -> Self {
        Self {
            state: ThunkState::ResolvingParams { next: 0 },
            buffer: ParamBuffer::new(layout),
            implementation,
        }
    }

    pub(crate) const fn state(&self) -> ThunkState { self.state }

    fn declared(&self) -> usize { self.buffer.layout().slots().len() }

    /// Copy the argument at `source` into the next slot
    fn resolve_next(&mut self, source: *const u8) {
        let next = match self.state {
            ThunkState::ResolvingParams { next } => next,
            ThunkState::Dispatched => {
                self.violate(ThunkViolation::ResolveAfterDispatch);
                return;
            },
            ThunkState::Violated(_) => return,
        };

        let declared = self.declared();
        if next >= declared {
            self.violate(ThunkViolation::ExtraResolution { declared });
            return;
        }
        if source.is_null() {
            self.violate(ThunkViolation::NullParamResult { index: next });
            return;
        }

        if let Some(slot) = self.buffer.slot_bytes_at_mut(next) {
            // SAFETY: the host points `param_result` at the current argument in its frame, which
            // holds at least as many bytes as the schema declares for this parameter
            let argument = unsafe { slice::from_raw_parts(source, slot.len()) };
            slot.copy_from_slice(argument);
        }
        self.state = ThunkState::ResolvingParams { next: next + 1 };
    }

    /// Run the implementation if every parameter was resolved
    fn dispatch(&mut self, object: ObjectPtr) {
        let declared = self.declared();
        match self.state {
            ThunkState::ResolvingParams { next } if next == declared => {
                self.state = ThunkState::Dispatched;
                (self.implementation)(object, &mut self.buffer);
            },
            ThunkState::ResolvingParams { next } => {
                self.violate(ThunkViolation::MissingResolutions {
                    resolved: next,
                    declared,
                });
            },
            ThunkState::Dispatched => self.violate(ThunkViolation::DoubleDispatch),
            ThunkState::Violated(_) => {},
        }
    }

    fn violate(&mut self, violation: ThunkViolation) {
        debug!(
            "Thunk for `{}` violated in state {}: {violation}",
            self.buffer.layout().function(),
            self.state.as_ref()
        );
        if !matches!(self.state, ThunkState::Violated(_)) {
            self.state = ThunkState::Violated(violation);
        }
    }

    /// Close the session, returning the resolved arguments
    pub(crate) fn finish(self) -> Result<ParamBuffer, ThunkViolation> {
        match self.state {
            ThunkState::Dispatched => Ok(self.buffer),
            ThunkState::ResolvingParams { next } => Err(ThunkViolation::NotDispatched {
                resolved: next,
                declared: self.declared(),
            }),
            ThunkState::Violated(violation) => Err(violation),
        }
    }
}

/// Recover the session behind `user_data`
///
/// # Safety
/// `user_data` must be null or the session pointer the bridge passed to the host for the
/// thunk currently running.
unsafe fn session_from<'s>(user_data: *mut c_void) -> Option<&'s mut ThunkSession<'s>> {
    // SAFETY: guaranteed by the caller
    unsafe { user_data.cast::<ThunkSession<'s>>().as_mut() }
}

/// Bridge side of `resolve_param`
pub(crate) extern "C" fn resolve_param_callback(user_data: *mut c_void, handler: *mut Handler) {
    // SAFETY: the host hands back the `user_data` it was given for this thunk
    let Some(session) = (unsafe { session_from(user_data) }) else {
        error!("resolve_param called without a thunk session");
        return;
    };
    // SAFETY: the host hands back the handler it was given, or null
    let source = unsafe { handler.as_ref() }
        .map_or(core::ptr::null(), |handler| handler.param_result.cast_const().cast::<u8>());
    session.resolve_next(source);
}

/// Bridge side of `call_function`
pub(crate) extern "C" fn call_function_callback(user_data: *mut c_void, object: *mut c_void) {
    // SAFETY: the host hands back the `user_data` it was given for this thunk
    let Some(session) = (unsafe { session_from(user_data) }) else {
        error!("call_function called without a thunk session");
        return;
    };
    session.dispatch(ObjectPtr::new(object));
}
