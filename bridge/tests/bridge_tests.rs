//! Bridge driven by fake hosts over a freshly exported schema

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;
use std::ffi::{CStr, c_char, c_void};
use std::path::Path;
use std::ptr;

use bprust_bridge::{
    BridgeError, CallBridge, CallBridgeTable, CallFunctionFn, Handler, LoadedSchema, ObjectPtr,
    ProcessEventFn, ResolveParamFn, ThunkViolation,
};
use bprust_schema::property_flags::{OUT_PARM, PARM, RETURN_PARM};
use bprust_schema::{
    ClassInfo, DefinitionExporter, EnumInfo, ExportConfig, FunctionInfo, InMemoryRegistry,
    PropertyInfo, PropertyKind, StructInfo, TypeRef,
};
use tempfile::TempDir;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Argument pointers a native frame would hold
struct FakeFrame {
    args:   Vec<*mut c_void>,
    object: *mut c_void,
}

fn registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
        .with_class(
            ClassInfo::new(TypeRef::named("Base")).with_function(
                FunctionInfo::new("Heal")
                    .with_param(PropertyInfo::new("amount", PropertyKind::Int32).with_flags(PARM))
                    .with_param(
                        PropertyInfo::new("ReturnValue", PropertyKind::Int32)
                            .with_flags(PARM | OUT_PARM | RETURN_PARM),
                    ),
            ),
        )
        .with_class(
            ClassInfo::new(TypeRef::named("Foo"))
                .with_super(TypeRef::named("Base"))
                .with_function(
                    FunctionInfo::new("Teleport")
                        .with_param(PropertyInfo::new("instant", PropertyKind::Bool))
                        .with_param(PropertyInfo::new(
                            "destination",
                            PropertyKind::Struct {
                                script_struct: TypeRef::named("Vector"),
                            },
                        )),
                )
                .with_function(
                    FunctionInfo::new("Trace")
                        .with_param(PropertyInfo::new(
                            "channel",
                            PropertyKind::Enum {
                                enum_name:       "ECollisionChannel32".to_string(),
                                underlying_size: 4,
                            },
                        ))
                        .with_param(PropertyInfo::new("n", PropertyKind::Int32)),
                ),
        )
        .with_struct(
            StructInfo::new(TypeRef::named("Vector"), 24, 8)
                .with_member(PropertyInfo::new("X", PropertyKind::Double))
                .with_member(PropertyInfo::new("Y", PropertyKind::Double))
                .with_member(PropertyInfo::new("Z", PropertyKind::Double)),
        )
        .with_enum(
            EnumInfo::new("ECollisionChannel32")
                .with_entry("ECC_Visibility", 0)
                .with_entry("ECC_Camera", 1)
                .with_underlying_size(4),
        )
}

/// Config writing into `dir` whatever `BPRUST_DEFINITIONS_DIR` says
fn config_in(dir: &Path) -> ExportConfig { ExportConfig::new().with_output_dir(dir).without_env_override() }

fn exported_schema() -> (TempDir, LoadedSchema) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let exporter = DefinitionExporter::new(config_in(temp_dir.path()));
    let report = exporter.export(&registry()).unwrap();
    let schema = LoadedSchema::load_stamped(&report.definitions_path).unwrap();
    (temp_dir, schema)
}

fn active_bridge(handle_custom_thunk: bprust_bridge::CustomThunkFn) -> (TempDir, CallBridge) {
    let (temp_dir, schema) = exported_schema();
    let table = CallBridgeTable::new(schema.stamp(), handle_custom_thunk, record_process_event);
    let mut bridge = CallBridge::new();
    bridge.register(table, schema).unwrap();
    EVENTS.with(|events| events.borrow_mut().clear());
    (temp_dir, bridge)
}

/// Records the call and answers `Heal` by doubling `amount` into `ReturnValue`
extern "C" fn record_process_event(object: *mut c_void, function_name: *const c_char, params: *mut c_void) {
    let name = unsafe { CStr::from_ptr(function_name) }.to_string_lossy().into_owned();
    EVENTS.with(|events| events.borrow_mut().push(format!("{name}@{:#x}", object.addr())));
    if name == "Heal" {
        let params = params.cast::<i32>();
        unsafe { params.add(1).write(params.read() * 2) };
    }
}

fn frame_of(handler: *mut Handler) -> &'static FakeFrame {
    unsafe { &*(*handler).frame.cast::<FakeFrame>() }
}

fn resolve_all(handler: *mut Handler, user_data: *mut c_void, resolve_param: ResolveParamFn) {
    for &argument in &frame_of(handler).args {
        unsafe { (*handler).param_result = argument };
        resolve_param(user_data, handler);
    }
}

extern "C" fn well_behaved_thunk(
    handler: *mut Handler,
    user_data: *mut c_void,
    resolve_param: ResolveParamFn,
    call_function: CallFunctionFn,
) {
    resolve_all(handler, user_data, resolve_param);
    call_function(user_data, frame_of(handler).object);
}

extern "C" fn forgetful_thunk(
    handler: *mut Handler,
    user_data: *mut c_void,
    resolve_param: ResolveParamFn,
    _call_function: CallFunctionFn,
) {
    resolve_all(handler, user_data, resolve_param);
}

extern "C" fn stuttering_thunk(
    handler: *mut Handler,
    user_data: *mut c_void,
    resolve_param: ResolveParamFn,
    call_function: CallFunctionFn,
) {
    resolve_all(handler, user_data, resolve_param);
    call_function(user_data, frame_of(handler).object);
    call_function(user_data, frame_of(handler).object);
}

extern "C" fn hasty_thunk(
    handler: *mut Handler,
    user_data: *mut c_void,
    _resolve_param: ResolveParamFn,
    call_function: CallFunctionFn,
) {
    call_function(user_data, frame_of(handler).object);
}

fn object(address: usize) -> ObjectPtr { ObjectPtr::new(ptr::without_provenance_mut(address)) }

#[test]
fn test_invoke_resolves_inherited_function_and_reads_output() {
    let (_temp_dir, bridge) = active_bridge(well_behaved_thunk);

    let mut params = bridge.new_params("Foo", "Heal").unwrap();
    params.write("amount", 25_i32).unwrap();
    bridge.invoke(object(0x40), "Foo", "Heal", &mut params).unwrap();

    assert_eq!(params.read::<i32>("ReturnValue").unwrap(), 50);
    let outputs: Vec<&str> = params
        .layout()
        .slots()
        .iter()
        .filter(|slot| slot.is_output())
        .map(|slot| slot.name.as_str())
        .collect();
    assert_eq!(outputs, ["ReturnValue"]);
    EVENTS.with(|events| assert_eq!(events.borrow().as_slice(), ["Heal@0x40"]));
}

#[test]
fn test_wide_enum_param_gets_full_width_slot() {
    let (_temp_dir, bridge) = active_bridge(well_behaved_thunk);

    let mut params = bridge.new_params("Foo", "Trace").unwrap();
    params.write("channel", 1_i32).unwrap();
    params.write("n", 9_i32).unwrap();

    let channel = params.layout().slot("channel").unwrap();
    assert_eq!((channel.layout.offset, channel.layout.size), (0, 4));
    assert_eq!(params.bytes()[..4], 1_i32.to_ne_bytes());
    assert_eq!(params.read::<i32>("n").unwrap(), 9);
}

#[test]
fn test_invoke_rejects_buffer_for_other_function() {
    let (_temp_dir, bridge) = active_bridge(well_behaved_thunk);

    let mut params = bridge.new_params("Foo", "Teleport").unwrap();
    let error = bridge
        .invoke(object(0x40), "Foo", "Heal", &mut params)
        .unwrap_err();
    assert!(matches!(error.current_context(), BridgeError::LayoutMismatch { function, .. } if function == "Heal"));
    EVENTS.with(|events| assert!(events.borrow().is_empty()));
}

#[test]
fn test_invoke_unknown_function() {
    let (_temp_dir, bridge) = active_bridge(well_behaved_thunk);

    let mut params = bridge.new_params("Foo", "Heal").unwrap();
    for (class, function) in [("Foo", "Fly"), ("Ghost", "Heal"), ("Base", "Teleport")] {
        let error = bridge
            .invoke(object(0x40), class, function, &mut params)
            .unwrap_err();
        assert!(matches!(error.current_context(), BridgeError::UnknownFunction { .. }));
    }
}

#[test]
fn test_custom_thunk_copies_arguments_and_runs_once() {
    let (_temp_dir, bridge) = active_bridge(well_behaved_thunk);

    let mut instant = true;
    let mut destination = [1.0_f64, 2.0, 3.0];
    let mut frame = FakeFrame {
        args:   vec![(&raw mut instant).cast(), (&raw mut destination).cast()],
        object: ptr::without_provenance_mut(0x80),
    };
    let mut handler = Handler::new(ptr::null_mut(), (&raw mut frame).cast());

    let mut calls = Vec::new();
    let params = bridge
        .run_custom_thunk(&mut handler, "Foo", "Teleport", |target, params| {
            let z = params.slot_bytes("destination").unwrap()[16..24].to_vec();
            calls.push((target.addr(), params.read::<bool>("instant").unwrap(), z));
        })
        .unwrap();

    assert_eq!(calls, [(0x80, true, 3.0_f64.to_ne_bytes().to_vec())]);
    let destination_bytes: Vec<u8> = destination.iter().flat_map(|value| value.to_ne_bytes()).collect();
    assert_eq!(params.slot_bytes("destination").unwrap(), destination_bytes.as_slice());
}

#[test]
fn test_misbehaving_hosts_are_protocol_violations() {
    let cases: [(bprust_bridge::CustomThunkFn, ThunkViolation, usize); 3] = [
        (
            forgetful_thunk,
            ThunkViolation::NotDispatched {
                resolved: 2,
                declared: 2,
            },
            0,
        ),
        (stuttering_thunk, ThunkViolation::DoubleDispatch, 1),
        (
            hasty_thunk,
            ThunkViolation::MissingResolutions {
                resolved: 0,
                declared: 2,
            },
            0,
        ),
    ];

    for (thunk, expected, expected_runs) in cases {
        let (_temp_dir, bridge) = active_bridge(thunk);

        let mut amount = 7_i32;
        let mut result = 0_i32;
        let mut frame = FakeFrame {
            args:   vec![(&raw mut amount).cast(), (&raw mut result).cast()],
            object: ptr::without_provenance_mut(0x80),
        };
        let mut handler = Handler::new(ptr::null_mut(), (&raw mut frame).cast());

        let mut runs = 0;
        let error = bridge
            .run_custom_thunk(&mut handler, "Foo", "Heal", |_, _| runs += 1)
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            BridgeError::ThunkProtocolViolation(violation) if *violation == expected
        ));
        assert_eq!(runs, expected_runs);
    }
}

#[test]
fn test_table_built_for_other_schema_is_rejected() {
    let (_temp_dir, schema) = exported_schema();
    let other = InMemoryRegistry::new().with_class(ClassInfo::new(TypeRef::named("Other")));
    let other_dir = TempDir::new().expect("Failed to create temp directory");
    let other_report = DefinitionExporter::new(config_in(other_dir.path()))
        .export(&other)
        .unwrap();

    let process_event: ProcessEventFn = record_process_event;
    let table = CallBridgeTable::new(other_report.stamp, well_behaved_thunk, process_event);
    let mut bridge = CallBridge::new();
    let error = bridge.register(table, schema).unwrap_err();
    assert!(matches!(error.current_context(), BridgeError::SchemaMismatch { .. }));
    assert!(!bridge.is_active());
}
