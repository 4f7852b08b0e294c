//! Rendering of the descriptor graph to one JSON document, and reading it back
//!
//! Output is deterministic: identical descriptor graphs produce byte-identical text, which is
//! what the schema stamp hashes. Ordering follows registry iteration order; nothing is sorted.

use error_stack::{Report, ResultExt};

use crate::descriptor::SchemaDocument;
use crate::error::{Error, Result};

/// Whitespace style of the rendered document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Style {
    #[default]
    Pretty,
    Compact,
}

/// Renders a [`SchemaDocument`] as JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaSerializer {
    style: Style,
}

impl SchemaSerializer {
    /// Indented output, as written to the definitions file
    pub const fn pretty() -> Self { Self { style: Style::Pretty } }

    /// Single-line output
    pub const fn compact() -> Self { Self { style: Style::Compact } }

    /// Render `document`
    pub fn render(&self, document: &SchemaDocument) -> Result<String> {
        let rendered = match self.style {
            Style::Pretty => serde_json::to_string_pretty(document),
            Style::Compact => serde_json::to_string(document),
        };
        rendered.change_context(Error::Serialization(
            "Failed to render schema document".to_string(),
        ))
    }
}

/// Read a document written by [`SchemaSerializer`]
///
/// This is the input contract downstream generators and the call bridge rely on.
pub fn parse_document(text: &str) -> Result<SchemaDocument> {
    serde_json::from_str(text).map_err(|error| {
        Report::new(Error::Parse(format!(
            "line {} column {}: {error}",
            error.line(),
            error.column()
        )))
    })
}
