//! Glue between source providers, the documentation builder and the index.
//!
//! A refresh fetches one import path, builds it on a blocking thread and stores
//! the result. A crawl refreshes every path a provider lists, a bounded number
//! at a time.

use crate::doc;
use crate::error::Error;
use crate::search::Index;
use crate::source::{Fetched, SourceProvider};
use crate::types::Package;
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use std::time::Instant;

/// What a refresh did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// A freshly built package was stored.
    Updated,
    /// The provider reported the content as unchanged; the index was left alone.
    Unchanged,
    /// The import path no longer resolves; any stale entry was dropped.
    Removed,
}

/// Counts of refresh outcomes over a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub failed: usize,
}

impl CrawlSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Removed => self.removed += 1,
        }
    }
}

/// Fetch, build and index `import_path`.
///
/// The etag of the currently indexed package is handed to the provider so an
/// unchanged source tree skips the rebuild. Transient errors are returned and
/// leave the index untouched.
pub async fn refresh<P: SourceProvider>(
    provider: &P,
    index: &Index,
    import_path: &str,
    anchor_format: &str,
) -> Result<Outcome, Error> {
    let etag = index.get(import_path).ok().map(|pkg| pkg.etag.clone());

    let fetched = match provider.fetch(import_path, etag.as_deref()).await {
        Ok(fetched) => fetched,
        Err(e) if e.is_not_modified() => {
            tracing::debug!("{} is unchanged", import_path);
            return Ok(Outcome::Unchanged);
        }
        Err(e) if e.is_not_found() => return Ok(remove(index, import_path)),
        Err(e) => return Err(e),
    };

    let start = Instant::now();
    let Fetched {
        sources,
        children,
        project,
        etag,
    } = fetched;
    let built = {
        let path = import_path.to_string();
        let anchor = anchor_format.to_string();
        tokio::task::spawn_blocking(move || doc::build(&path, &anchor, &sources, &children))
            .await
            .map_err(|e| Error::task(import_path, e))?
    };

    let mut pkg = match built {
        Ok(pkg) => pkg,
        Err(e) if e.is_not_found() => return Ok(remove(index, import_path)),
        Err(e) => return Err(e),
    };
    pkg.project_root = project.root;
    pkg.project_name = project.name;
    pkg.project_url = project.url;
    pkg.etag = etag;

    if !pkg.errors.is_empty() {
        tracing::warn!("{} built with {} errors", import_path, pkg.errors.len());
    }
    index.put(pkg)?;
    tracing::info!("Updated {} in {:?}", import_path, start.elapsed());
    Ok(Outcome::Updated)
}

fn remove(index: &Index, import_path: &str) -> Outcome {
    if index.remove(import_path) {
        tracing::info!("Removed {}: no longer found", import_path);
    } else {
        tracing::debug!("{} not found", import_path);
    }
    Outcome::Removed
}

/// Refresh every import path `provider` lists, `concurrency` at a time.
///
/// Per-path failures are logged and counted; only a failure to list paths is
/// returned as an error.
pub async fn crawl<P: SourceProvider>(
    provider: &P,
    index: &Index,
    anchor_format: &str,
    concurrency: usize,
) -> Result<CrawlSummary, Error> {
    let start = Instant::now();
    let paths = provider.list_import_paths().await?;
    tracing::debug!("Crawling {} import paths", paths.len());

    let mut refreshes = stream::iter(paths)
        .map(|import_path| async move {
            let outcome = refresh(provider, index, &import_path, anchor_format).await;
            (import_path, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    let mut summary = CrawlSummary::default();
    while let Some((import_path, outcome)) = refreshes.next().await {
        match outcome {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                tracing::warn!("Failed to refresh {}: {}", import_path, e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "Crawl finished in {:?}: {} updated, {} unchanged, {} removed, {} failed ({} packages indexed)",
        start.elapsed(),
        summary.updated,
        summary.unchanged,
        summary.removed,
        summary.failed,
        index.len()
    );
    Ok(summary)
}

/// Store previously built packages, as when restoring an index at startup.
///
/// Returns the number of packages stored.
pub fn load(index: &Index, packages: impl IntoIterator<Item = Package>) -> Result<usize, Error> {
    let mut count = 0;
    for pkg in packages {
        index.put(pkg)?;
        count += 1;
    }
    tracing::info!(
        "Loaded {} packages ({} indexed, {} terms)",
        count,
        index.len(),
        index.term_count()
    );
    Ok(count)
}
