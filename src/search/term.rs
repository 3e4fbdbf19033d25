//! Search term derivation and fixed-width term encoding.

use crate::doc::has_multiple_sentences;
use crate::types::Package;
use xxhash_rust::xxh3::xxh3_128_with_seed;

/// Width of an encoded term in bytes.
pub const TERM_SIZE: usize = 16;

/// Prefix of the term that groups every package of a project.
pub(crate) const PROJECT_PREFIX: &str = "project:";
/// Prefix of the terms that find importers of a package.
pub(crate) const IMPORT_PREFIX: &str = "import:";

/// A lower-cased search term packed into a fixed-width block.
///
/// Terms of up to [`TERM_SIZE`] bytes are stored verbatim and zero padded;
/// longer terms are replaced by a salted 128-bit hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term([u8; TERM_SIZE]);

/// Seed for hashing long terms.
///
/// Encodings are only comparable under the same salt, so an index is rebuilt
/// rather than persisted across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSalt(u64);

impl TermSalt {
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// A salt drawn from the process's random source.
    pub fn random() -> Self {
        Self(ahash::RandomState::new().hash_one(TERM_SIZE))
    }

    pub fn term(self, s: &str) -> Term {
        let lower = s.to_lowercase();
        let bytes = lower.as_bytes();
        let mut block = [0u8; TERM_SIZE];
        if bytes.len() <= TERM_SIZE {
            block[..bytes.len()].copy_from_slice(bytes);
        } else {
            block = xxh3_128_with_seed(bytes, self.0).to_le_bytes();
        }
        Term(block)
    }
}

/// The search terms a package contributes, before encoding.
///
/// Placeholders contribute nothing. Every other package is findable through its
/// project; hidden packages, sparse commands and empty libraries stop there.
pub(crate) fn package_terms(pkg: &Package) -> Vec<String> {
    if pkg.is_placeholder() {
        return Vec::new();
    }

    let mut terms = vec![format!("{PROJECT_PREFIX}{}", pkg.project_root)];
    if pkg.hide {
        return terms;
    }

    let searchable = if pkg.is_cmd {
        !pkg.synopsis.is_empty() && has_multiple_sentences(&pkg.doc)
    } else {
        !pkg.has_no_exports()
    };
    if !searchable {
        return terms;
    }

    terms.push(pkg.name.clone());
    let last = pkg.last_segment();
    if last != pkg.name {
        terms.push(last.to_string());
    }
    terms.extend(pkg.imports.iter().map(|path| format!("{IMPORT_PREFIX}{path}")));
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Decl, Func};
    use assert2::check;
    use rstest::rstest;

    fn exported_func() -> Func {
        Func {
            decl: Decl::default(),
            url: String::new(),
            doc: String::new(),
            name: "New".into(),
            recv: String::new(),
            examples: Vec::new(),
        }
    }

    fn library(import_path: &str, name: &str) -> Package {
        let mut pkg = Package::new(import_path);
        pkg.name = name.into();
        pkg.project_root = "github.com/user/proj".into();
        pkg.funcs.push(exported_func());
        pkg
    }

    #[rstest]
    #[case("http")]
    #[case("HTTP")]
    #[case("0123456789abcdef")]
    fn test_short_terms_are_stored_verbatim(#[case] s: &str) {
        let term = TermSalt::new(1).term(s);
        let lower = s.to_lowercase();
        check!(&term.0[..lower.len()] == lower.as_bytes());
        check!(term.0[lower.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_terms_are_case_insensitive() {
        let salt = TermSalt::new(7);
        check!(salt.term("Mux") == salt.term("mux"));
        check!(salt.term("import:github.com/Gorilla/Mux") == salt.term("import:github.com/gorilla/mux"));
    }

    #[test]
    fn test_long_terms_depend_on_salt() {
        let long = "project:github.com/user/project";
        check!(TermSalt::new(1).term(long) == TermSalt::new(1).term(long));
        check!(TermSalt::new(1).term(long) != TermSalt::new(2).term(long));
        check!(TermSalt::new(1).term("short") == TermSalt::new(2).term("short"));
    }

    #[test]
    fn test_library_terms() {
        let mut pkg = library("github.com/user/proj/go-thing", "thing");
        pkg.imports.insert("net/http".into());
        let terms = package_terms(&pkg);
        check!(
            terms
                == [
                    "project:github.com/user/proj",
                    "thing",
                    "go-thing",
                    "import:net/http"
                ]
        );
    }

    #[test]
    fn test_restricted_terms() {
        check!(package_terms(&Package::new("example.com/dir")).is_empty());

        let mut hidden = library("github.com/user/proj/tool", "main");
        hidden.hide = true;
        check!(package_terms(&hidden) == ["project:github.com/user/proj"]);

        let mut empty = library("github.com/user/proj/empty", "empty");
        empty.funcs.clear();
        check!(package_terms(&empty) == ["project:github.com/user/proj"]);
    }

    #[rstest]
    #[case("", "", false)]
    #[case("Tool runs.", "Tool runs.", false)]
    #[case("Tool runs.", "Tool runs. It takes flags.", true)]
    fn test_command_terms_need_documentation(
        #[case] synopsis: &str,
        #[case] doc: &str,
        #[case] searchable: bool,
    ) {
        let mut cmd = library("github.com/user/proj/cmd/tool", "tool");
        cmd.funcs.clear();
        cmd.is_cmd = true;
        cmd.synopsis = synopsis.into();
        cmd.doc = doc.into();
        check!(package_terms(&cmd).contains(&"tool".to_string()) == searchable);
    }
}
