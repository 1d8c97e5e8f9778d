//! Conversion pipeline for apidoc.
//!
//! Ties source loading, indexing, Markdown emission and the output directory
//! together into end-to-end workflows (e.g., [`pipeline::convert_sources`]).

pub mod assembler;
pub mod pipeline;
pub mod sources;

pub use assembler::{DirectoryTarget, read_manifest};
pub use pipeline::{
    ConvertResult, ProgressReporter, SilentProgress, convert, convert_sources, document_name,
};
pub use sources::{SourceSpec, load_metadata, load_sources};
