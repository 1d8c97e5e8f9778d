//! End-to-end conversion: sources → index → emission → documents.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use apidoc_emit::{EmissionContext, RootNode, Target, anchor_id};
use apidoc_index::{DocumentIndex, IndexStats};
use apidoc_markdown::{FilterChain, preset};
use apidoc_metadata::MemberIdentity;
use apidoc_shared::{ApiDocError, OutputManifest, RenderConfig, Result};

use crate::assembler::DirectoryTarget;
use crate::sources::{SourceSpec, load_sources};

/// Result of a conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Documents handed to the target.
    pub documents: usize,
    pub stats: IndexStats,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document reaches the target.
    fn document_written(&self, name: &str, current: usize, total: usize);
    /// Called when the conversion completes.
    fn done(&self, result: &ConvertResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_written(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &ConvertResult) {}
}

/// Document name of a type page: `Acme.Widget`, `Acme.Box-1`, `Acme.Outer.Inner`.
pub fn document_name(identity: &MemberIdentity) -> String {
    identity.body().replace('`', "-")
}

/// Render every assembly in `index` into `target`.
///
/// Each assembly yields an index document named after the assembly and one
/// document per type. Link targets for every type and member are defined
/// before anything is rendered, so cross references resolve regardless of
/// declaration order.
#[instrument(skip_all, fields(assemblies = index.assemblies().len()))]
pub fn convert(
    index: Arc<DocumentIndex>,
    config: &RenderConfig,
    target: Arc<dyn Target>,
    progress: &dyn ProgressReporter,
) -> Result<ConvertResult> {
    let start = Instant::now();
    config.validate()?;

    progress.phase("Resolving link targets");
    let root = EmissionContext::root(Arc::clone(&index));
    let total = define_link_targets(&root, &index, &config.link_extension)?;

    progress.phase("Rendering documents");
    let chain = FilterChain::from_config(config);
    let root = preset(&root.with_target(target), config);

    let mut written = 0;
    root.select_assemblies().for_each(|asm| {
        let name = asm.node().name().to_string();
        let asm = asm.document(&name, |c| c.with_filter(&chain, |c| c.render()))?;
        written += 1;
        progress.document_written(&name, written, total);

        let asm = asm.select_types().for_each(|ty| {
            let name = document_name(ty.node().identity());
            let ty = ty.document(&name, |c| c.with_filter(&chain, |c| c.render()))?;
            written += 1;
            progress.document_written(&name, written, total);
            Ok(ty.end())
        })?;
        Ok(asm.end())
    })?;

    let result = ConvertResult {
        documents: written,
        stats: index.stats(),
        elapsed: start.elapsed(),
    };
    info!(
        documents = result.documents,
        documented = result.stats.documented,
        undocumented = result.stats.undocumented,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "conversion complete"
    );
    progress.done(&result);
    Ok(result)
}

/// Define a link target for every type and member; return the number of
/// documents the conversion will produce.
fn define_link_targets(
    root: &EmissionContext<RootNode>,
    index: &DocumentIndex,
    extension: &str,
) -> Result<usize> {
    let mut documents = HashSet::new();
    let mut claim = |name: String| {
        if documents.insert(name.clone()) {
            Ok(())
        } else {
            Err(ApiDocError::validation(format!(
                "two documents would be named '{name}'"
            )))
        }
    };

    for assembly in index.assemblies() {
        claim(assembly.name().to_string())?;
        for ty in assembly.types() {
            let document = document_name(&ty.identity);
            let file = format!("{document}{extension}");
            root.define_link_target(ty.identity.as_str(), &file)?;
            for member in &ty.members {
                root.define_link_target(
                    member.as_str(),
                    &format!("{file}#{}", anchor_id(member)),
                )?;
            }
            claim(document)?;
        }
    }
    debug!(documents = documents.len(), "link targets defined");
    Ok(documents.len())
}

/// Load `sources`, convert them into `out_dir`, and write the manifest.
#[instrument(skip_all, fields(out = %out_dir.display(), sources = sources.len()))]
pub fn convert_sources(
    sources: &[SourceSpec],
    config: &RenderConfig,
    out_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<(ConvertResult, OutputManifest)> {
    progress.phase("Loading sources");
    let pairs = load_sources(sources)?;

    progress.phase("Indexing documentation");
    let index = Arc::new(DocumentIndex::build(pairs)?);

    let target = Arc::new(DirectoryTarget::create(out_dir, &config.link_extension)?);
    let result = convert(index, config, Arc::clone(&target) as Arc<dyn Target>, progress)?;
    let manifest = target.finish()?;
    Ok((result, manifest))
}
