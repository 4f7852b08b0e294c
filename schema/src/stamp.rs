//! Version and content stamp persisted next to the exported document
//!
//! The bridge refuses to trust parameter buffer layouts unless the host's ABI table was built
//! against the exact document it is given, identified by the SHA-256 of the document bytes.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::constants::ABI_VERSION;
use crate::error::Error;

/// SHA-256 of an exported document's exact bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaHash([u8; 32]);

impl SchemaHash {
    /// Hash of `document` as written to disk
    pub fn of_document(document: &str) -> Self { Self(Sha256::digest(document.as_bytes()).into()) }

    /// Wrap raw hash bytes, e.g. from an ABI table
    pub const fn from_bytes(bytes: [u8; 32]) -> Self { Self(bytes) }

    /// Raw hash bytes
    pub const fn as_bytes(&self) -> &[u8; 32] { &self.0 }

    /// Lowercase hex form
    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    /// Parse the lowercase or uppercase hex form
    pub fn from_hex(text: &str) -> Result<Self, Error> {
        let bytes = hex::decode(text).map_err(|error| Error::invalid("schema hash", error))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| Error::invalid("schema hash", format!("{} bytes, expected 32", bytes.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaHash").field(&self.to_hex()).finish()
    }
}

impl Serialize for SchemaHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SchemaHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(D::Error::custom)
    }
}

/// ABI version and document hash written beside the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStamp {
    /// Bridge ABI version the document was produced for
    pub abi_version: u32,
    /// Hash of the document bytes
    pub schema_hash: SchemaHash,
}

impl SchemaStamp {
    /// Stamp `document` with the current ABI version
    pub fn of_document(document: &str) -> Self {
        Self {
            abi_version: ABI_VERSION,
            schema_hash: SchemaHash::of_document(document),
        }
    }
}
