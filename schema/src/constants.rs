//! Shared constants for schema export

/// Version of the call bridge ABI that documents produced by this crate are stamped with
///
/// Bump whenever the parameter layout rules or the bridge table shape change.
pub const ABI_VERSION: u32 = 1;

/// Default file name of the exported schema document
pub const DEFINITIONS_FILE_NAME: &str = "blueprint_definitions.json";

/// Extension replacing `json` on the definitions file to form the stamp file name
pub(crate) const STAMP_EXTENSION: &str = "stamp.json";

/// Environment variable overriding the export output directory
pub const DEFINITIONS_DIR_ENV: &str = "BPRUST_DEFINITIONS_DIR";
