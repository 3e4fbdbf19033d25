//! The documentation model produced by the builder and stored by the index.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

/// A named source file handed to the builder by a source provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    pub filename: String,
    pub content: Vec<u8>,
    pub browse_url: String,
}

impl SourceBlob {
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        browse_url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            browse_url: browse_url.into(),
        }
    }
}

/// A cross-reference span inside [`Decl::text`].
///
/// `import_path` is empty for identifiers declared in the same package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub import_path: String,
    pub name: String,
}

/// Rendered declaration source with its cross-references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub text: String,
    pub annotations: Vec<Annotation>,
}

/// A const or var group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub decl: Decl,
    pub url: String,
    pub doc: String,
}

/// A runnable example extracted from a test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub code: String,
    pub output: String,
}

/// A function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Func {
    pub decl: Decl,
    pub url: String,
    pub doc: String,
    pub name: String,
    /// Receiver type as written (`*T` or `T`), empty for plain functions.
    pub recv: String,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub doc: String,
    pub name: String,
    pub decl: Decl,
    pub url: String,
    pub consts: Vec<Value>,
    pub vars: Vec<Value>,
    pub funcs: Vec<Func>,
    pub methods: Vec<Func>,
    pub examples: Vec<Example>,
}

/// A source file that contributed to the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub browse_url: String,
}

/// Documentation for a single import path.
///
/// A package with an empty `name` is a directory placeholder and is only
/// valid while `children` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub import_path: String,
    pub project_root: String,
    pub project_name: String,
    pub project_url: String,
    /// Content digest supplied by the source provider.
    #[serde(default)]
    pub etag: String,

    pub name: String,
    pub doc: String,
    pub synopsis: String,
    pub is_cmd: bool,
    pub hide: bool,

    pub consts: Vec<Value>,
    pub vars: Vec<Value>,
    pub funcs: Vec<Func>,
    pub types: Vec<Type>,
    pub examples: BTreeMap<String, Vec<Example>>,

    pub files: Vec<File>,
    pub imports: BTreeSet<String>,
    pub test_imports: BTreeSet<String>,
    pub children: BTreeSet<String>,
    pub errors: Vec<String>,
    pub updated: SystemTime,
}

impl Package {
    /// An empty package for `import_path`, stamped with the current time.
    pub fn new(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            project_root: String::new(),
            project_name: String::new(),
            project_url: String::new(),
            etag: String::new(),
            name: String::new(),
            doc: String::new(),
            synopsis: String::new(),
            is_cmd: false,
            hide: false,
            consts: Vec::new(),
            vars: Vec::new(),
            funcs: Vec::new(),
            types: Vec::new(),
            examples: BTreeMap::new(),
            files: Vec::new(),
            imports: BTreeSet::new(),
            test_imports: BTreeSet::new(),
            children: BTreeSet::new(),
            errors: Vec::new(),
            updated: SystemTime::now(),
        }
    }

    /// True when this record only stands for a directory of child packages.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }

    /// True when the package declares no exported consts, vars, funcs or types.
    pub fn has_no_exports(&self) -> bool {
        self.consts.is_empty()
            && self.vars.is_empty()
            && self.funcs.is_empty()
            && self.types.is_empty()
    }

    /// Final segment of the import path.
    pub fn last_segment(&self) -> &str {
        last_segment(&self.import_path)
    }
}

pub(crate) fn last_segment(import_path: &str) -> &str {
    import_path
        .rsplit_once('/')
        .map_or(import_path, |(_, last)| last)
}

/// The lightweight listing projection of an indexed package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub import_path: String,
    pub synopsis: String,
    pub is_cmd: bool,
    pub score: f32,
}
