//! Documentation builder for Go packages.
//!
//! [`build`] turns the source files of one import path into a [`Package`]:
//!
//! 1. Parse every non-test `.go` file and group the files by declared package name.
//! 2. Pick the candidate package that best matches the import path.
//! 3. Read the exported declarations, package comment and examples.
//! 4. Classify the package as a command, a library, or noise to hide.

pub(crate) mod comment;
pub(crate) mod example;
pub(crate) mod gofile;
pub(crate) mod reader;
pub(crate) mod render;

pub use comment::{has_multiple_sentences, synopsis};
pub use gofile::is_doc_file;

use crate::error::Error;
use crate::types::{Example, File, Package, SourceBlob, last_segment};
use example::collect_examples;
use gofile::{GoFile, is_test_file};
use reader::PackageReader;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Instant, SystemTime};

/// Package name of documentation-only files for commands (`doc.go`).
const DOCUMENTATION_PACKAGE: &str = "documentation";
const MAIN_PACKAGE: &str = "main";

/// Build the documentation model for `import_path`.
///
/// Files that fail to parse are skipped and reported in [`Package::errors`].
/// When no file yields a package, a directory placeholder is returned if
/// `known_children` is non-empty, and [`Error::NotFound`] otherwise.
pub fn build(
    import_path: &str,
    anchor_format: &str,
    sources: &[SourceBlob],
    known_children: &BTreeSet<String>,
) -> Result<Package, Error> {
    let start = Instant::now();

    let mut sources: Vec<&SourceBlob> = sources
        .iter()
        .filter(|blob| blob.filename.ends_with(".go"))
        .collect();
    sources.sort_by(|a, b| a.filename.cmp(&b.filename));

    let mut errors = Vec::new();
    let mut candidates: BTreeMap<String, Vec<GoFile>> = BTreeMap::new();
    for blob in sources.iter().filter(|b| !is_test_file(&b.filename)) {
        match GoFile::parse(&blob.filename, &blob.content) {
            Some(file) => candidates
                .entry(file.package_name.clone())
                .or_default()
                .push(file),
            None => {
                tracing::debug!("Skipping unparseable file '{}' in {}", blob.filename, import_path);
                errors.push(format!("{}: could not parse file", blob.filename));
            }
        }
    }

    let Some(chosen) = select_candidate(import_path, &candidates) else {
        if known_children.is_empty() {
            return Err(Error::NotFound(import_path.to_string()));
        }
        tracing::debug!(
            "No package in {}, recording directory with {} children",
            import_path,
            known_children.len()
        );
        let mut placeholder = Package::new(import_path);
        placeholder.children = known_children.clone();
        placeholder.errors = errors;
        return Ok(placeholder);
    };

    let has_app_main = candidates
        .get(MAIN_PACKAGE)
        .is_some_and(|files| files.iter().any(GoFile::has_main_func));
    let files = candidates.remove(&chosen).unwrap_or_default();
    if !candidates.is_empty() {
        tracing::debug!(
            "Chose package '{}' for {} over {:?}",
            chosen,
            import_path,
            candidates.keys().collect::<Vec<_>>()
        );
    }

    let urls: HashMap<String, String> = sources
        .iter()
        .map(|blob| (blob.filename.clone(), blob.browse_url.clone()))
        .collect();

    let mut pkg = Package::new(import_path);
    pkg.name.clone_from(&chosen);
    pkg.children = known_children.clone();
    pkg.errors = errors;

    pkg.doc = package_doc(&files);
    pkg.synopsis = synopsis(&pkg.doc);

    for file in &files {
        pkg.imports
            .extend(file.imports.iter().map(|spec| spec.path.clone()));
    }
    pkg.files = files
        .iter()
        .map(|file| File {
            name: file.name.clone(),
            browse_url: urls.get(&file.name).cloned().unwrap_or_default(),
        })
        .collect();

    let mut decls = PackageReader::new(&files, anchor_format, &urls).read();

    let test_package = format!("{}_test", chosen);
    let mut examples: BTreeMap<String, Vec<Example>> = BTreeMap::new();
    for blob in sources.iter().filter(|b| is_test_file(&b.filename)) {
        let Some(file) = GoFile::parse(&blob.filename, &blob.content) else {
            tracing::debug!("Skipping unparseable test file '{}'", blob.filename);
            continue;
        };
        if file.package_name != chosen && file.package_name != test_package {
            continue;
        }
        pkg.test_imports
            .extend(file.imports.iter().map(|spec| spec.path.clone()));
        for named in collect_examples(&file) {
            examples.entry(named.target).or_default().push(named.example);
        }
    }
    decls.attach_examples(&examples);
    pkg.examples = examples;

    let no_exports = decls.is_empty();
    pkg.consts = decls.consts;
    pkg.vars = decls.vars;
    pkg.funcs = decls.funcs;
    pkg.types = decls.types;

    if is_command_doc(&chosen, &files, no_exports, has_app_main) {
        pkg.is_cmd = true;
        pkg.name = last_segment(import_path).to_string();
    }
    pkg.hide = (pkg.name == MAIN_PACKAGE && has_app_main) || (no_exports && !pkg.is_cmd);
    pkg.updated = SystemTime::now();

    tracing::debug!(
        "Built {} (package {}, {} files, cmd={}, hide={}) in {:?}",
        import_path,
        pkg.name,
        pkg.files.len(),
        pkg.is_cmd,
        pkg.hide,
        start.elapsed()
    );
    Ok(pkg)
}

/// Rank of a candidate package name for `import_path`.
fn candidate_score(import_path: &str, name: &str) -> u8 {
    if import_path.ends_with(name) {
        3
    } else if name != MAIN_PACKAGE {
        2
    } else {
        1
    }
}

/// The best candidate package. Ties go to the candidate with more declarations,
/// then to the lexicographically smaller name.
fn select_candidate(import_path: &str, candidates: &BTreeMap<String, Vec<GoFile>>) -> Option<String> {
    let declarations = |files: &[GoFile]| files.iter().map(GoFile::declaration_count).sum::<usize>();
    candidates
        .iter()
        .max_by(|(a_name, a_files), (b_name, b_files)| {
            candidate_score(import_path, a_name)
                .cmp(&candidate_score(import_path, b_name))
                .then_with(|| declarations(a_files).cmp(&declarations(b_files)))
                .then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| name.clone())
}

/// Package comments from all files in order, falling back to the first comment
/// group of the first file that has one.
fn package_doc(files: &[GoFile]) -> String {
    let docs: Vec<String> = files
        .iter()
        .filter_map(|file| file.package_clause().map(|clause| comment::doc_comment(file, clause)))
        .filter(|doc| !doc.is_empty())
        .collect();
    if !docs.is_empty() {
        return docs.join("\n");
    }
    files
        .iter()
        .map(comment::first_comment_group)
        .find(|doc| !doc.is_empty())
        .unwrap_or_default()
}

/// A command is documented by a lone `doc.go` in package `documentation`
/// next to a runnable `main` package.
fn is_command_doc(name: &str, files: &[GoFile], no_exports: bool, has_app_main: bool) -> bool {
    name == DOCUMENTATION_PACKAGE
        && matches!(files, [file] if last_segment(&file.name) == "doc.go")
        && no_exports
        && has_app_main
}
