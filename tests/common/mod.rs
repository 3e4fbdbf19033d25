//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `go_tree`: a GOPATH-style source tree with a small multi-package project
//! - `index`: an empty [`Index`] with a fixed salt
//!
//! # Shared Infrastructure
//!
//! [`TempWorkspace`] provides a reusable temp directory abstraction for any test
//! that needs filesystem isolation. [`blob`] and [`library`] build in-memory
//! inputs for builder and index tests.

use gopkgdoc::search::TermSalt;
use gopkgdoc::{Decl, Func, Index, Package, SearchResult, SourceBlob};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary source tree that is removed when dropped.
///
/// # Example
///
/// ```ignore
/// let workspace = TempWorkspace::new();
/// workspace.create_file("example.com/demo/demo.go", "package demo\n");
/// assert!(workspace.path().join("example.com/demo/demo.go").exists());
/// ```
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Removes a file from this workspace.
    ///
    /// # Panics
    /// Panics if the file cannot be removed.
    pub fn remove_file(&self, path: &str) {
        std::fs::remove_file(self.root.join(path))
            .unwrap_or_else(|e| panic!("Failed to remove file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Root of the project laid out by [`go_tree`].
#[allow(dead_code)]
pub const PROJECT: &str = "github.com/acme/kit";

/// A source tree holding one project:
///
/// - `kit`: library with a package comment and a constructor
/// - `kit/log`: library importing `kit`
/// - `kit/cmd/kitctl`: runnable command with a `doc.go`
/// - `kit/internal/empty`: library without exports
/// - `kit/assets`: directory without Go files
#[fixture]
pub fn go_tree() -> TempWorkspace {
    let workspace = TempWorkspace::new();
    workspace.create_file(
        "github.com/acme/kit/kit.go",
        "// Package kit provides building blocks. It is small.\npackage kit\n\n// Client talks to the server.\ntype Client struct {\n\tAddr string\n\tconn int\n}\n\n// NewClient returns a client for addr.\nfunc NewClient(addr string) *Client {\n\treturn &Client{Addr: addr}\n}\n",
    );
    workspace.create_file(
        "github.com/acme/kit/kit_test.go",
        "package kit_test\n\nimport \"fmt\"\n\nfunc ExampleNewClient() {\n\tfmt.Println(\"ok\")\n\t// Output: ok\n}\n",
    );
    workspace.create_file(
        "github.com/acme/kit/log/log.go",
        "// Package log writes structured records.\npackage log\n\nimport \"github.com/acme/kit\"\n\n// Logger writes records for a client.\ntype Logger struct {\n\tClient *kit.Client\n}\n",
    );
    workspace.create_file(
        "github.com/acme/kit/cmd/kitctl/main.go",
        "package main\n\nfunc main() {}\n",
    );
    workspace.create_file(
        "github.com/acme/kit/cmd/kitctl/doc.go",
        "// Kitctl manages kit servers. It reads flags from the environment.\npackage documentation\n",
    );
    workspace.create_file(
        "github.com/acme/kit/internal/empty/empty.go",
        "package empty\n\nfunc helper() {}\n",
    );
    workspace.create_file("github.com/acme/kit/assets/logo.txt", "logo");
    workspace.create_file("github.com/acme/kit/_scratch/scratch.go", "package scratch\n");
    workspace
}

/// An empty index with a fixed salt.
#[fixture]
pub fn index() -> Index {
    Index::new(TermSalt::new(42))
}

/// A source blob whose browse URL is derived from its name.
#[allow(dead_code)]
pub fn blob(name: &str, content: &str) -> SourceBlob {
    SourceBlob::new(name, content, format!("https://src.example/{name}"))
}

/// A searchable library package with one exported function.
#[allow(dead_code)]
pub fn library(import_path: &str, name: &str, project_root: &str) -> Package {
    let mut pkg = Package::new(import_path);
    pkg.name = name.to_string();
    pkg.project_root = project_root.to_string();
    pkg.synopsis = format!("Package {name} does things.");
    pkg.funcs.push(Func {
        decl: Decl::default(),
        url: String::new(),
        doc: String::new(),
        name: "Run".to_string(),
        recv: String::new(),
        examples: Vec::new(),
    });
    pkg
}

/// Import paths of `results`, in order.
#[allow(dead_code)]
pub fn paths(results: &[SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.import_path.clone()).collect()
}
