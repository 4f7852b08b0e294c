//! Fake native side of the bridge: objects, frames and the two table entries

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use bprust_bridge::{CallBridgeTable, CallFunctionFn, Handler, ObjectPtr, ResolveParamFn};
use bprust_schema::SchemaStamp;
use tracing::{debug, warn};

/// Native lamp object
#[derive(Debug, Default)]
pub struct NativeLamp {
    /// Whether the lamp is on
    pub lit:        bool,
    /// Last brightness set
    pub brightness: f32,
    /// Times `Toggle` ran
    pub toggles:    i32,
}

impl NativeLamp {
    /// Pointer handed across the bridge
    pub fn as_object(&mut self) -> ObjectPtr { ObjectPtr::new(ptr::from_mut(self).cast()) }
}

/// Argument storage of one native call frame
pub struct NativeFrame {
    args:   Vec<*mut c_void>,
    object: *mut c_void,
}

impl NativeFrame {
    /// Frame calling `object` with arguments at `args`, in declaration order
    pub const fn new(object: ObjectPtr, args: Vec<*mut c_void>) -> Self {
        Self {
            args,
            object: object.as_ptr(),
        }
    }

    /// Handler over this frame
    pub fn handler(&mut self) -> Handler { Handler::new(ptr::null_mut(), ptr::from_mut(self).cast()) }
}

/// Table wired to this module's entries, stamped for `stamp`
pub fn table(stamp: SchemaStamp) -> CallBridgeTable { CallBridgeTable::new(stamp, handle_custom_thunk, process_event) }

extern "C" fn handle_custom_thunk(
    handler: *mut Handler,
    user_data: *mut c_void,
    resolve_param: ResolveParamFn,
    call_function: CallFunctionFn,
) {
    // SAFETY: the bridge passes back the handler built by `NativeFrame::handler`, whose frame
    // outlives the thunk
    let Some(frame) = (unsafe { handler.as_ref() })
        .and_then(|handler| unsafe { handler.frame.cast::<NativeFrame>().as_ref() })
    else {
        warn!("Custom thunk called without a native frame");
        return;
    };

    for (index, &argument) in frame.args.iter().enumerate() {
        debug!("Native frame resolving argument {index}");
        // SAFETY: `handler` was checked non-null above
        unsafe { (*handler).param_result = argument };
        resolve_param(user_data, handler);
    }
    call_function(user_data, frame.object);
}

extern "C" fn process_event(object: *mut c_void, function_name: *const c_char, params: *mut c_void) {
    // SAFETY: the bridge passes a nul-terminated name that lives for this call
    let name = unsafe { CStr::from_ptr(function_name) }.to_string_lossy();
    // SAFETY: every object the demo hands out is a `NativeLamp`
    let Some(lamp) = (unsafe { object.cast::<NativeLamp>().as_mut() }) else {
        warn!("process_event `{name}` on a null object");
        return;
    };

    debug!("Native process_event `{name}`");
    match name.as_ref() {
        "SetBrightness" => {
            // SAFETY: the bridge checked the buffer against the layout `Value: float` at offset 0
            lamp.brightness = unsafe { params.cast::<f32>().read() };
        },
        "Toggle" => {
            lamp.lit = !lamp.lit;
            lamp.toggles += 1;
            // SAFETY: the bridge checked the buffer against the layout `ReturnValue: bool` at offset 0
            unsafe { params.cast::<u8>().write(u8::from(lamp.lit)) };
        },
        "SetActorHiddenInGame" => {
            // SAFETY: layout `bNewHidden: bool` at offset 0
            let hidden = unsafe { params.cast::<u8>().read() } != 0;
            lamp.lit &= !hidden;
        },
        other => warn!("No native implementation for `{other}`"),
    }
}
