//! Source providers: where the builder's input files come from.

pub(crate) mod directory;
pub(crate) mod project;

pub use directory::DirectoryProvider;
pub use project::{ProjectInfo, is_standard_package};

use crate::error::Error;
use crate::types::SourceBlob;
use std::collections::BTreeSet;
use std::future::Future;

/// Everything a provider knows about one import path.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub sources: Vec<SourceBlob>,
    /// Import paths of the directories directly below this one that hold Go sources.
    pub children: BTreeSet<String>,
    pub project: ProjectInfo,
    /// Digest of the fetched content, handed back on the next fetch.
    pub etag: String,
}

/// Fetches the source files of Go packages.
///
/// Implementations return [`Error::NotFound`] when the import path resolves to
/// nothing and [`Error::NotModified`] when `etag` matches the current content.
/// Any other error is transient.
pub trait SourceProvider: Send + Sync {
    fn fetch(
        &self,
        import_path: &str,
        etag: Option<&str>,
    ) -> impl Future<Output = Result<Fetched, Error>> + Send;

    /// Every import path this provider can serve.
    fn list_import_paths(&self) -> impl Future<Output = Result<Vec<String>, Error>> + Send;
}
