//! Source provider backed by a GOPATH-style `src` tree on local disk.

use super::{Fetched, ProjectInfo, SourceProvider};
use crate::doc::is_doc_file;
use crate::error::Error;
use crate::types::SourceBlob;
use futures::future::try_join_all;
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// Directories the go tool never treats as packages.
const TESTDATA_DIR: &str = "testdata";

/// Serves `<root>/<import path>` directories as packages.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
    browse_base: String,
}

impl DirectoryProvider {
    /// A provider whose browse links point at the files themselves.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let browse_base = format!("file://{}", root.display());
        Self { root, browse_base }
    }

    /// Use `base` as the prefix of file browse links instead of `file://<root>`.
    pub fn with_browse_base(mut self, base: impl Into<String>) -> Self {
        self.browse_base = base.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory of `import_path`, or `None` if the path escapes the root.
    fn dir_of(&self, import_path: &str) -> Option<PathBuf> {
        let invalid = import_path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
        (!invalid).then(|| self.root.join(import_path))
    }

    fn browse_url(&self, import_path: &str, filename: &str) -> String {
        format!(
            "{}/{}",
            self.browse_base.trim_end_matches('/'),
            join_import_path(import_path, filename)
        )
    }

    async fn read_sources(&self, import_path: &str, dir: &Path) -> Result<Vec<SourceBlob>, Error> {
        let names = doc_file_names(dir)
            .await
            .map_err(|e| Error::fetch(import_path, e))?;

        try_join_all(names.into_iter().map(|name| async move {
            let content = tokio::fs::read(dir.join(&name))
                .await
                .map_err(|e| Error::fetch(import_path, e))?;
            let browse_url = self.browse_url(import_path, &name);
            Ok::<_, Error>(SourceBlob::new(name, content, browse_url))
        }))
        .await
    }
}

impl SourceProvider for DirectoryProvider {
    async fn fetch(&self, import_path: &str, etag: Option<&str>) -> Result<Fetched, Error> {
        let not_found = || Error::NotFound(import_path.to_string());
        let dir = self.dir_of(import_path).ok_or_else(not_found)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(Error::fetch(import_path, e)),
        }

        let sources = self.read_sources(import_path, &dir).await?;
        let children = {
            let dir = dir.clone();
            let parent = import_path.to_string();
            tokio::task::spawn_blocking(move || child_import_paths(&dir, &parent))
                .await
                .map_err(|e| Error::task(import_path, e))?
        };
        if sources.is_empty() && children.is_empty() {
            return Err(not_found());
        }

        let digest = content_digest(&sources, &children);
        if etag == Some(digest.as_str()) {
            return Err(Error::NotModified(import_path.to_string()));
        }

        tracing::debug!(
            "Fetched {} ({} files, {} children) from {}",
            import_path,
            sources.len(),
            children.len(),
            dir.display()
        );
        Ok(Fetched {
            sources,
            children,
            project: ProjectInfo::from_import_path(import_path),
            etag: digest,
        })
    }

    async fn list_import_paths(&self) -> Result<Vec<String>, Error> {
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || {
            let mut paths = BTreeSet::new();
            for entry in source_walker(&root).build().filter_map(Result::ok) {
                if !is_doc_entry(&entry) {
                    continue;
                }
                let Some(rel) = entry.path().parent().and_then(|p| p.strip_prefix(&root).ok())
                else {
                    continue;
                };
                let import_path = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !import_path.is_empty() {
                    paths.insert(import_path);
                }
            }
            paths
        })
        .await
        .map_err(|e| Error::task("", e))?;

        Ok(paths.into_iter().collect())
    }
}

/// Sorted names of the documentation files directly inside `dir`.
async fn doc_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && is_doc_file(name)
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn source_walker(dir: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(dir);
    builder.hidden(true).filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        entry.depth() == 0 || !(name.starts_with('_') || name == TESTDATA_DIR)
    });
    builder
}

fn is_doc_entry(entry: &ignore::DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_file())
        && entry.file_name().to_str().is_some_and(is_doc_file)
}

/// Child directories of `dir` with Go sources anywhere below them.
///
/// Each child's walk stops at the first documentation file it finds.
fn child_import_paths(dir: &Path, import_path: &str) -> BTreeSet<String> {
    source_walker(dir)
        .max_depth(Some(1))
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.depth() == 1 && entry.file_type().is_some_and(|t| t.is_dir()))
        .filter(|entry| {
            source_walker(entry.path())
                .build()
                .filter_map(Result::ok)
                .any(|e| is_doc_entry(&e))
        })
        .map(|entry| join_import_path(import_path, &entry.file_name().to_string_lossy()))
        .collect()
}

fn join_import_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Digest over file names, file contents and child paths.
fn content_digest(sources: &[SourceBlob], children: &BTreeSet<String>) -> String {
    let mut hasher = Xxh3::new();
    for blob in sources {
        hasher.update(blob.filename.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(blob.content.len() as u64).to_le_bytes());
        hasher.update(&blob.content);
    }
    for child in children {
        hasher.update(child.as_bytes());
        hasher.update(&[0]);
    }
    format!("{:016x}", hasher.digest())
}
