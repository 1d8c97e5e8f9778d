//! The immutable documentation index.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use apidoc_metadata::{AssemblyInfo, MemberIdentity, TypeInfo, member_identity, type_identity};
use apidoc_shared::{ApiDocError, Result};

use crate::entry::DocumentationEntry;
use crate::source::{DocSource, read_doc_file};

/// One metadata source with its optional documentation.
#[derive(Debug, Clone)]
pub struct SourcePair {
    pub metadata: AssemblyInfo,
    pub docs: Option<DocSource>,
}

impl SourcePair {
    pub fn new(metadata: AssemblyInfo, docs: Option<DocSource>) -> Self {
        Self { metadata, docs }
    }
}

/// A type with its own identity and the identities of its members,
/// positionally aligned with [`TypeInfo::members`].
#[derive(Debug, Clone)]
pub struct IndexedType {
    pub identity: MemberIdentity,
    pub members: Vec<MemberIdentity>,
}

/// An assembly with every identity precomputed at build time.
#[derive(Debug, Clone)]
pub struct IndexedAssembly {
    info: Arc<AssemblyInfo>,
    types: Vec<IndexedType>,
}

impl IndexedAssembly {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &AssemblyInfo {
        &self.info
    }

    pub fn types(&self) -> &[IndexedType] {
        &self.types
    }

    pub fn type_info(&self, index: usize) -> Option<&TypeInfo> {
        self.info.types.get(index)
    }
}

/// Counters gathered while building the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Documentation entries read from doc sources.
    pub entries: usize,
    /// Types and members in the metadata.
    pub members: usize,
    /// Metadata members with a non-empty entry.
    pub documented: usize,
    pub undocumented: usize,
    /// Entries whose identity matches no metadata member.
    pub orphaned: usize,
}

/// Map from (assembly, identity) to documentation, built once and read-only.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    assemblies: Vec<IndexedAssembly>,
    entries: BTreeMap<String, BTreeMap<MemberIdentity, Arc<DocumentationEntry>>>,
    stats: IndexStats,
}

impl DocumentIndex {
    /// Build the index from metadata/doc pairs.
    ///
    /// Fails on malformed doc sources, unsupported member kinds, and any
    /// (assembly, identity) key claimed twice.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn build(sources: Vec<SourcePair>) -> Result<Self> {
        let mut assemblies = Vec::with_capacity(sources.len());
        let mut known: HashMap<(String, MemberIdentity), String> = HashMap::new();
        let mut docs = Vec::new();

        for SourcePair { metadata, docs: doc } in sources {
            let indexed = index_assembly(metadata, &mut known)?;
            if let Some(doc) = doc {
                docs.push((indexed.name().to_string(), doc));
            }
            assemblies.push(indexed);
        }

        let mut entries: BTreeMap<String, BTreeMap<MemberIdentity, Arc<DocumentationEntry>>> =
            BTreeMap::new();

        for (assembly, source) in docs {
            let file = read_doc_file(&source)?;
            if let Some(declared) = file.assembly.as_deref().filter(|d| *d != assembly) {
                warn!(
                    origin = %source.origin,
                    declared,
                    metadata = %assembly,
                    "doc source names a different assembly; keying by metadata name"
                );
            }

            let slot = entries.entry(assembly.clone()).or_default();
            let count = file.members.len();
            for raw in file.members {
                let entry = DocumentationEntry::from_raw(raw)?;
                if let Some(existing) = slot.get(entry.identity()) {
                    return Err(ApiDocError::DuplicateEntry {
                        assembly,
                        identity: entry.identity().to_string(),
                        first: describe_location(existing),
                        second: describe_location(&entry),
                    });
                }
                slot.insert(entry.identity().clone(), Arc::new(entry));
            }
            debug!(origin = %source.origin, assembly = %assembly, entries = count, "read doc source");
        }

        let stats = compute_stats(&known, &entries);
        info!(
            assemblies = assemblies.len(),
            entries = stats.entries,
            undocumented = stats.undocumented,
            orphaned = stats.orphaned,
            "document index built"
        );

        Ok(Self {
            assemblies,
            entries,
            stats,
        })
    }

    /// Documentation for `identity`, or a synthesized empty entry.
    pub fn lookup(&self, assembly: &str, identity: &MemberIdentity) -> Arc<DocumentationEntry> {
        self.get(assembly, identity)
            .cloned()
            .unwrap_or_else(|| Arc::new(DocumentationEntry::empty(identity.clone())))
    }

    /// Stored entry for `identity`, without synthesizing.
    pub fn get(&self, assembly: &str, identity: &MemberIdentity) -> Option<&Arc<DocumentationEntry>> {
        self.entries.get(assembly)?.get(identity)
    }

    /// Every stored entry, ordered by assembly then identity.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Arc<DocumentationEntry>)> {
        self.entries
            .iter()
            .flat_map(|(asm, slot)| slot.values().map(move |e| (asm.as_str(), e)))
    }

    /// Assemblies in source order.
    pub fn assemblies(&self) -> &[IndexedAssembly] {
        &self.assemblies
    }

    pub fn assembly(&self, index: usize) -> Option<&IndexedAssembly> {
        self.assemblies.get(index)
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

fn index_assembly(
    metadata: AssemblyInfo,
    known: &mut HashMap<(String, MemberIdentity), String>,
) -> Result<IndexedAssembly> {
    let assembly = metadata.name.clone();
    let mut types = Vec::with_capacity(metadata.types.len());

    for ty in &metadata.types {
        let identity = type_identity(ty);
        claim(known, &assembly, &identity, format!("type {}", ty.name()))?;

        let members = ty
            .members
            .iter()
            .map(|member| {
                let id = member_identity(ty, member)?;
                claim(known, &assembly, &id, format!("{}.{} ({})", ty.name(), member.name, member.kind.label()))?;
                Ok(id)
            })
            .collect::<Result<Vec<_>>>()?;

        types.push(IndexedType { identity, members });
    }

    debug!(assembly = %assembly, types = types.len(), "indexed metadata");
    Ok(IndexedAssembly {
        info: Arc::new(metadata),
        types,
    })
}

fn claim(
    known: &mut HashMap<(String, MemberIdentity), String>,
    assembly: &str,
    identity: &MemberIdentity,
    description: String,
) -> Result<()> {
    let key = (assembly.to_string(), identity.clone());
    if let Some(first) = known.get(&key) {
        return Err(ApiDocError::DuplicateEntry {
            assembly: assembly.to_string(),
            identity: identity.to_string(),
            first: first.clone(),
            second: description,
        });
    }
    known.insert(key, description);
    Ok(())
}

fn describe_location(entry: &DocumentationEntry) -> String {
    entry
        .location()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<synthesized>".into())
}

fn compute_stats(
    known: &HashMap<(String, MemberIdentity), String>,
    entries: &BTreeMap<String, BTreeMap<MemberIdentity, Arc<DocumentationEntry>>>,
) -> IndexStats {
    let documented = known
        .keys()
        .filter(|(asm, id)| {
            entries
                .get(asm)
                .and_then(|slot| slot.get(id))
                .is_some_and(|e| !e.is_empty())
        })
        .count();
    let mut total = 0;
    let mut orphaned = 0;
    for (assembly, slot) in entries {
        for identity in slot.keys() {
            total += 1;
            if !known.contains_key(&(assembly.clone(), identity.clone())) {
                debug!(assembly = %assembly, identity = %identity, "orphaned doc entry");
                orphaned += 1;
            }
        }
    }

    IndexStats {
        entries: total,
        members: known.len(),
        documented,
        undocumented: known.len() - documented,
        orphaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_metadata::{MemberInfo, MemberKind, NamedType, ParameterInfo, TypeKind, TypeRef};
    use pretty_assertions::assert_eq;

    fn widget_assembly() -> AssemblyInfo {
        let spin = MemberInfo::new(MemberKind::Method, "Spin").with_parameters(vec![
            ParameterInfo::new("times", TypeRef::named("System", "Int32")),
        ]);
        let size = MemberInfo::new(MemberKind::Property, "Size");
        AssemblyInfo {
            name: "Acme".into(),
            types: vec![TypeInfo {
                named: NamedType::new(Some("Acme"), "Widget"),
                kind: TypeKind::Class,
                generic_parameters: Vec::new(),
                members: vec![spin, size],
            }],
        }
    }

    const DOCS: &str = r#"<?xml version="1.0"?>
<doc>
    <assembly><name>Acme</name></assembly>
    <members>
        <member name="T:Acme.Widget">
            <summary>
            A widget.
            </summary>
        </member>
        <member name="M:Acme.Widget.Spin(System.Int32)">
            <summary>Spins.</summary>
        </member>
        <member name="N:Acme">
            <summary>The Acme namespace.</summary>
        </member>
    </members>
</doc>
"#;

    fn build() -> DocumentIndex {
        DocumentIndex::build(vec![SourcePair::new(
            widget_assembly(),
            Some(DocSource::new("Acme.xml", DOCS)),
        )])
        .unwrap()
    }

    #[test]
    fn lookup_round_trips_every_documented_member() {
        let index = build();
        let asm = &index.assemblies()[0];
        let widget = &asm.types()[0];

        let entry = index.lookup("Acme", &widget.identity);
        assert_eq!(entry.name_attribute(), Some(widget.identity.as_str()));
        assert_eq!(entry.element("summary").unwrap().text(), "\nA widget.\n");

        let spin = index.lookup("Acme", &widget.members[0]);
        assert_eq!(spin.name_attribute(), Some("M:Acme.Widget.Spin(System.Int32)"));
    }

    #[test]
    fn miss_returns_empty_entry() {
        let index = build();
        let size = &index.assemblies()[0].types()[0].members[1];
        assert_eq!(size.as_str(), "P:Acme.Widget.Size");

        let entry = index.lookup("Acme", size);
        assert!(entry.is_empty());
        assert_eq!(entry.identity(), size);
        assert!(index.lookup("Other", size).is_empty());
    }

    #[test]
    fn stats_count_documented_and_orphaned() {
        let stats = build().stats();
        assert_eq!(
            stats,
            IndexStats {
                entries: 3,
                members: 3,
                documented: 2,
                undocumented: 1,
                orphaned: 1,
            }
        );
    }

    #[test]
    fn duplicate_doc_entry_across_sources_is_fatal() {
        let extra = r#"<doc><members><member name="T:Acme.Widget"><summary>Again.</summary></member></members></doc>"#;
        let err = DocumentIndex::build(vec![
            SourcePair::new(widget_assembly(), Some(DocSource::new("Acme.xml", DOCS))),
            SourcePair::new(
                AssemblyInfo {
                    name: "Acme".into(),
                    types: Vec::new(),
                },
                Some(DocSource::new("Extra.xml", extra)),
            ),
        ])
        .unwrap_err();

        match err {
            ApiDocError::DuplicateEntry {
                identity, first, second, ..
            } => {
                assert_eq!(identity, "T:Acme.Widget");
                assert_eq!(first, "Acme.xml:5");
                assert_eq!(second, "Extra.xml:1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn colliding_metadata_identities_are_fatal() {
        let mut asm = widget_assembly();
        let dup = asm.types[0].members[0].clone();
        asm.types[0].members.push(dup);
        let err = DocumentIndex::build(vec![SourcePair::new(asm, None)]).unwrap_err();
        assert!(matches!(err, ApiDocError::DuplicateEntry { .. }));
    }

    #[test]
    fn unsupported_member_kind_aborts_build() {
        let mut asm = widget_assembly();
        asm.types[0]
            .members
            .push(MemberInfo::new(MemberKind::Unknown, "Weird"));
        let err = DocumentIndex::build(vec![SourcePair::new(asm, None)]).unwrap_err();
        assert!(matches!(err, ApiDocError::UnsupportedMemberKind { .. }));
    }

    #[test]
    fn mismatched_doc_assembly_name_is_keyed_by_metadata() {
        let docs = DOCS.replace("<name>Acme</name>", "<name>Acme.Legacy</name>");
        let index = DocumentIndex::build(vec![SourcePair::new(
            widget_assembly(),
            Some(DocSource::new("Acme.xml", docs)),
        )])
        .unwrap();
        let widget = MemberIdentity::from_raw("T:Acme.Widget");
        assert!(!index.lookup("Acme", &widget).is_empty());
        assert!(index.get("Acme.Legacy", &widget).is_none());
    }

    #[test]
    fn entries_enumerate_in_identity_order() {
        let index = build();
        let ids: Vec<_> = index.entries().map(|(_, e)| e.identity().as_str().to_string()).collect();
        assert_eq!(ids, ["M:Acme.Widget.Spin(System.Int32)", "N:Acme", "T:Acme.Widget"]);
    }
}
