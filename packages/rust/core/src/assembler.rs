//! Output directory assembler.
//!
//! [`DirectoryTarget`] receives rendered documents from the emitter and
//! writes each one to `<out>/<name><extension>`, then writes `manifest.json`
//! with checksums once the conversion finishes.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use apidoc_emit::Target;
use apidoc_shared::{
    ApiDocError, CURRENT_SCHEMA_VERSION, DocumentRecord, OutputManifest, Result,
};

/// Writes documents into a directory.
#[derive(Debug)]
pub struct DirectoryTarget {
    root: PathBuf,
    extension: String,
    tool_version: String,
    records: Mutex<Vec<DocumentRecord>>,
}

impl DirectoryTarget {
    /// Create `root` if needed and return a target writing into it.
    pub fn create(root: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| ApiDocError::io(&root, e))?;
        debug!(path = %root.display(), "output directory ready");
        Ok(Self {
            root,
            extension: extension.into(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Records of every document written so far, in write order.
    pub fn records(&self) -> Vec<DocumentRecord> {
        self.records.lock().clone()
    }

    /// Write `manifest.json` and return the manifest.
    #[instrument(skip_all, fields(path = %self.root.display()))]
    pub fn finish(&self) -> Result<OutputManifest> {
        let manifest = OutputManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            tool_version: self.tool_version.clone(),
            generated_at: Utc::now(),
            documents: self.records(),
        };
        write_json(&self.root.join("manifest.json"), &manifest)?;
        info!(documents = manifest.documents.len(), "manifest written");
        Ok(manifest)
    }

    fn file_name(&self, document: &str) -> Result<String> {
        let valid = !document.is_empty()
            && !document.starts_with('.')
            && !document.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']);
        if !valid {
            return Err(ApiDocError::validation(format!(
                "invalid document name '{document}'"
            )));
        }
        Ok(format!("{document}{}", self.extension))
    }
}

impl Target for DirectoryTarget {
    #[instrument(skip_all, fields(document = document))]
    fn accept(&self, document: &str, fragments: &[std::sync::Arc<str>]) -> Result<()> {
        let file_name = self.file_name(document)?;
        let content: String = fragments.iter().map(|f| f.as_ref()).collect();

        let path = self.root.join(&file_name);
        let temp = self.root.join(format!(".{file_name}.tmp"));
        std::fs::write(&temp, &content).map_err(|e| ApiDocError::io(&temp, e))?;
        std::fs::rename(&temp, &path).map_err(|e| ApiDocError::io(&path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let sha256 = format!("{:x}", hasher.finalize());

        debug!(path = %path.display(), size = content.len(), "wrote document");

        let mut records = self.records.lock();
        records.retain(|r| r.name != document);
        records.push(DocumentRecord {
            name: document.to_string(),
            path: file_name,
            sha256,
            size_bytes: content.len(),
        });
        Ok(())
    }
}

/// Read and check a previously written `manifest.json`.
pub fn read_manifest(root: &Path) -> Result<OutputManifest> {
    let path = root.join("manifest.json");
    let content = std::fs::read_to_string(&path).map_err(|e| ApiDocError::io(&path, e))?;
    let manifest: OutputManifest = serde_json::from_str(&content)
        .map_err(|e| ApiDocError::validation(format!("invalid manifest.json: {e}")))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(ApiDocError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    for record in &manifest.documents {
        if !root.join(&record.path).exists() {
            debug!(path = %record.path, "manifest entry has no file");
        }
    }
    Ok(manifest)
}

fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ApiDocError::validation(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| ApiDocError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
