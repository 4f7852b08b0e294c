//! # BPRust test host
//!
//! Stands in for an engine embedding the exporter and the call bridge. It exports a small
//! registry, loads the written schema back, registers a fake native table against it and
//! drives both bridge entries.
//!
//! Set `BPRUST_DEFINITIONS_DIR` to choose where the schema is written and `BPRUST_LOG` to set
//! tracing filter directives.

use std::error::Error;
use std::fmt::Debug;
use std::ptr;

use bprust_bridge::{CallBridge, LoadedSchema};
use bprust_schema::{DefinitionExporter, ExportConfig};
use demo_registry::LAMP_CLASS;
use native::{NativeFrame, NativeLamp};
use support::tracing::{get_trace_log_path, init_tracing};
use tracing::{info, warn};

mod demo_registry;
mod native;
mod support;

fn main() -> Result<(), Box<dyn Error>> {
    // Keep the guard alive so the file log is flushed on exit
    let _guard = init_tracing();
    info!("Trace log: {}", get_trace_log_path().display());

    let config = ExportConfig::new().with_output_dir(std::env::temp_dir());
    let (output_dir, source) = config.get_effective_output_dir();
    info!("Exporting definitions to {} ({source})", output_dir.display());

    let exporter = DefinitionExporter::new(config.clone());
    if !exporter.trigger(&demo_registry::build()) {
        println!("Definition export failed");
        return Err("definition export failed, see the trace log".into());
    }
    println!("Definition export succeed");

    let schema = LoadedSchema::load_stamped(&config.definitions_path()).map_err(boxed)?;
    let lamp = exercise_bridge(schema).map_err(boxed)?;
    println!(
        "Lamp after bridge calls: lit={} brightness={} toggles={}",
        lamp.lit, lamp.brightness, lamp.toggles
    );

    Ok(())
}

fn boxed(report: impl Debug) -> Box<dyn Error> { format!("{report:?}").into() }

fn exercise_bridge(schema: LoadedSchema) -> bprust_bridge::Result<NativeLamp> {
    let stamp = schema.stamp();
    let mut bridge = CallBridge::new();
    bridge.register(native::table(stamp), schema.clone())?;

    if let Err(report) = bridge.register(native::table(stamp), schema) {
        warn!("Second registration rejected: {}", report.current_context());
    }

    let mut lamp = NativeLamp::default();

    let mut params = bridge.new_params(LAMP_CLASS, "SetBrightness")?;
    params.write("Value", 0.75_f32)?;
    bridge.invoke(lamp.as_object(), LAMP_CLASS, "SetBrightness", &mut params)?;

    let mut params = bridge.new_params(LAMP_CLASS, "Toggle")?;
    bridge.invoke(lamp.as_object(), LAMP_CLASS, "Toggle", &mut params)?;
    for slot in params.layout().slots().iter().filter(|slot| slot.is_output()) {
        info!("Toggle wrote back `{}` = {}", slot.name, params.read::<bool>(&slot.name)?);
    }

    // Declared on Actor, resolved through the super chain
    let mut params = bridge.new_params(LAMP_CLASS, "SetActorHiddenInGame")?;
    params.write("bNewHidden", false)?;
    bridge.invoke(lamp.as_object(), LAMP_CLASS, "SetActorHiddenInGame", &mut params)?;

    let mismatched = bridge.invoke(lamp.as_object(), LAMP_CLASS, "SetBrightness", &mut params);
    if let Err(report) = mismatched {
        warn!("Mismatched buffer rejected: {}", report.current_context());
    }

    let mut lit = true;
    let mut brightness = 0.5_f32;
    let mut tint = [1.0_f32, 0.8, 0.6, 1.0];
    let mut frame = NativeFrame::new(
        lamp.as_object(),
        vec![
            ptr::from_mut(&mut lit).cast(),
            ptr::from_mut(&mut brightness).cast(),
            ptr::from_mut(&mut tint).cast(),
        ],
    );
    let mut handler = frame.handler();
    bridge.run_custom_thunk(&mut handler, LAMP_CLASS, "OnSwitched", |target, params| {
        let lit = params.read::<bool>("bLit").unwrap_or_default();
        let brightness = params.read::<f32>("Brightness").unwrap_or_default();
        info!(
            "Foreign OnSwitched on {:#x}: lit={lit} brightness={brightness}",
            target.addr()
        );
    })?;

    Ok(lamp)
}
