//! Loading metadata graphs and their doc files from disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use apidoc_index::{DocSource, SourcePair};
use apidoc_metadata::AssemblyInfo;
use apidoc_shared::{ApiDocError, Result, SourceEntry};

/// One metadata file and, optionally, its XML documentation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub metadata: PathBuf,
    pub docs: Option<PathBuf>,
}

impl SourceSpec {
    pub fn new(metadata: impl Into<PathBuf>) -> Self {
        Self {
            metadata: metadata.into(),
            docs: None,
        }
    }

    pub fn with_docs(mut self, docs: impl Into<PathBuf>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// The explicit doc path, or the conventional sibling `<base>.xml` if it exists.
    pub fn resolved_docs(&self) -> Option<PathBuf> {
        if let Some(docs) = &self.docs {
            return Some(docs.clone());
        }
        let candidate = self.metadata.with_extension("xml");
        candidate.is_file().then_some(candidate)
    }
}

impl From<&SourceEntry> for SourceSpec {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            metadata: PathBuf::from(&entry.metadata),
            docs: entry.docs.as_ref().map(PathBuf::from),
        }
    }
}

/// Read every source, in order.
#[instrument(skip_all, fields(sources = specs.len()))]
pub fn load_sources(specs: &[SourceSpec]) -> Result<Vec<SourcePair>> {
    let mut pairs = Vec::with_capacity(specs.len());
    for spec in specs {
        let metadata = load_metadata(&spec.metadata)?;
        let docs = match spec.resolved_docs() {
            Some(path) => Some(load_docs(&path)?),
            None => {
                debug!(metadata = %spec.metadata.display(), "no doc file");
                None
            }
        };
        info!(
            assembly = %metadata.name,
            types = metadata.types.len(),
            documented = docs.is_some(),
            "loaded source"
        );
        pairs.push(SourcePair::new(metadata, docs));
    }
    Ok(pairs)
}

/// Read a metadata graph emitted by the reflection collaborator.
pub fn load_metadata(path: &Path) -> Result<AssemblyInfo> {
    let text = std::fs::read_to_string(path).map_err(|e| ApiDocError::io(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| ApiDocError::load(path.display().to_string(), e.to_string()))
}

fn load_docs(path: &Path) -> Result<DocSource> {
    let text = std::fs::read_to_string(path).map_err(|e| ApiDocError::io(path, e))?;
    debug!(path = %path.display(), bytes = text.len(), "read doc file");
    Ok(DocSource::new(path.display().to_string(), text))
}
