//! The export trigger: walk, render, write
//!
//! A single parameterless user action calls [`DefinitionExporter::trigger`], which reports only
//! success or failure. Failure details go to the log.

use std::fs;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use tracing::{debug, error, info};

use crate::constants::{DEFINITIONS_DIR_ENV, DEFINITIONS_FILE_NAME, STAMP_EXTENSION};
use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::serializer::SchemaSerializer;
use crate::stamp::SchemaStamp;
use crate::walker::{ExportStats, TypeCatalogWalker};

/// Where the export writes its files
#[derive(Debug, Clone)]
pub struct ExportConfig {
    output_dir:   Option<PathBuf>,
    file_name:    String,
    env_override: bool,
}

impl Default for ExportConfig {
    fn default() -> Self { Self::new() }
}

impl ExportConfig {
    /// Default file name in the current directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_dir:   None,
            file_name:    DEFINITIONS_FILE_NAME.to_string(),
            env_override: true,
        }
    }

    /// Write into `dir` unless the environment overrides it
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Ignore `BPRUST_DEFINITIONS_DIR`, so the configured directory is always used
    #[must_use]
    pub const fn without_env_override(mut self) -> Self {
        self.env_override = false;
        self
    }

    /// Use a different definitions file name
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Get the effective output directory, checking the environment variable first
    ///
    /// Priority order:
    /// 1. `BPRUST_DEFINITIONS_DIR` environment variable (highest priority), unless disabled with
    ///    `without_env_override()`
    /// 2. Explicitly set directory via `with_output_dir()`
    /// 3. Current directory
    #[must_use]
    pub fn get_effective_output_dir(&self) -> (PathBuf, String) {
        let env_dir = self
            .env_override
            .then(|| std::env::var_os(DEFINITIONS_DIR_ENV))
            .flatten()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        resolve_output_dir(env_dir, self.output_dir.as_deref())
    }

    /// Full path of the definitions file
    #[must_use]
    pub fn definitions_path(&self) -> PathBuf { self.get_effective_output_dir().0.join(&self.file_name) }

    /// Full path of the stamp file written beside the definitions file
    #[must_use]
    pub fn stamp_path(&self) -> PathBuf { stamp_path_for(&self.definitions_path()) }
}

fn resolve_output_dir(env_dir: Option<PathBuf>, explicit: Option<&Path>) -> (PathBuf, String) {
    match (env_dir, explicit) {
        (Some(dir), Some(explicit)) => (
            dir,
            format!(
                "environment override from with_output_dir {}",
                explicit.display()
            ),
        ),
        (Some(dir), None) => (dir, "environment override from default".to_string()),
        (None, Some(explicit)) => (explicit.to_path_buf(), "with_output_dir".to_string()),
        (None, None) => (PathBuf::from("."), "default".to_string()),
    }
}

/// Stamp file path for a definitions file: `name.json` becomes `name.stamp.json`
pub fn stamp_path_for(definitions_path: &Path) -> PathBuf {
    definitions_path.with_extension(STAMP_EXTENSION)
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Written definitions file
    pub definitions_path: PathBuf,
    /// Written stamp file
    pub stamp_path:       PathBuf,
    /// Stamp of the written document
    pub stamp:            SchemaStamp,
    /// What was exported and what was left out
    pub stats:            ExportStats,
}

/// Runs one export pass against a registry snapshot
#[derive(Debug, Clone, Default)]
pub struct DefinitionExporter {
    config: ExportConfig,
}

impl DefinitionExporter {
    /// Exporter writing where `config` says
    pub const fn new(config: ExportConfig) -> Self { Self { config } }

    /// Configuration in use
    pub const fn config(&self) -> &ExportConfig { &self.config }

    /// Walk `registry`, render the document and write it with its stamp
    pub fn export<R: TypeRegistry>(&self, registry: &R) -> Result<ExportReport> {
        let (output_dir, source) = self.config.get_effective_output_dir();
        debug!("Exporting definitions to {} ({source})", output_dir.display());

        let walk = TypeCatalogWalker::new(registry).walk();
        let document = SchemaSerializer::pretty().render(&walk.document)?;
        let stamp = SchemaStamp::of_document(&document);

        let definitions_path = output_dir.join(&self.config.file_name);
        let stamp_path = stamp_path_for(&definitions_path);

        fs::write(&definitions_path, &document).map_err(|error| {
            Report::new(Error::io_failed("write definitions to", &definitions_path, error))
        })?;

        let stamp_text = serde_json::to_string_pretty(&stamp)
            .change_context(Error::Serialization("Failed to render schema stamp".to_string()))?;
        fs::write(&stamp_path, stamp_text)
            .map_err(|error| Report::new(Error::io_failed("write stamp to", &stamp_path, error)))?;

        Ok(ExportReport {
            definitions_path,
            stamp_path,
            stamp,
            stats: walk.stats,
        })
    }

    /// The user action: export and report success as a single boolean
    pub fn trigger<R: TypeRegistry>(&self, registry: &R) -> bool {
        match self.export(registry) {
            Ok(report) => {
                info!(
                    "Definition export succeed: {} ({} classes, {} structs, {} enums, hash {})",
                    report.definitions_path.display(),
                    report.stats.classes,
                    report.stats.structs,
                    report.stats.enums,
                    report.stamp.schema_hash
                );
                true
            },
            Err(report) => {
                error!("Definition export failed: {report:?}");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_priority() {
        let env = Some(PathBuf::from("/env"));
        let explicit = Path::new("/explicit");

        let (dir, source) = resolve_output_dir(env.clone(), Some(explicit));
        assert_eq!(dir, PathBuf::from("/env"));
        assert_eq!(source, "environment override from with_output_dir /explicit");

        let (dir, source) = resolve_output_dir(env, None);
        assert_eq!(dir, PathBuf::from("/env"));
        assert_eq!(source, "environment override from default");

        let (dir, source) = resolve_output_dir(None, Some(explicit));
        assert_eq!(dir, PathBuf::from("/explicit"));
        assert_eq!(source, "with_output_dir");

        let (dir, source) = resolve_output_dir(None, None);
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(source, "default");
    }

    #[test]
    fn test_disabled_env_override_keeps_explicit_dir() {
        let config = ExportConfig::new()
            .with_output_dir("/explicit")
            .without_env_override();
        let (dir, source) = config.get_effective_output_dir();
        assert_eq!(dir, PathBuf::from("/explicit"));
        assert_eq!(source, "with_output_dir");
        assert_eq!(
            config.definitions_path(),
            PathBuf::from("/explicit").join(DEFINITIONS_FILE_NAME)
        );
    }

    #[test]
    fn test_stamp_path_sits_beside_definitions() {
        assert_eq!(
            stamp_path_for(Path::new("out/blueprint_definitions.json")),
            PathBuf::from("out/blueprint_definitions.stamp.json")
        );
    }
}
