//! Output manifest types shared by the pipeline and its targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version for the output manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// OutputManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` structure written next to rendered documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Tool version that rendered the documents.
    pub tool_version: String,
    /// When the documents were rendered.
    pub generated_at: DateTime<Utc>,
    /// Every document written, in write order.
    pub documents: Vec<DocumentRecord>,
}

/// One rendered document on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document name as requested by the emitter (e.g. `Acme.Widget`).
    pub name: String,
    /// File path relative to the output directory.
    pub path: String,
    /// SHA-256 of the written content.
    pub sha256: String,
    /// Content length in bytes.
    pub size_bytes: usize,
}
