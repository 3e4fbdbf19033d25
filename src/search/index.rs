//! In-memory inverted index over built packages.

use super::identifier::{Identifier, IdentifierSet};
use super::query::{ALL_QUERY, SortBy, query_terms};
use super::scoring::package_score;
use super::term::{PROJECT_PREFIX, Term, TermSalt, package_terms};
use crate::error::Error;
use crate::types::{Package, SearchResult};
use ahash::AHashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How a term changes between the old and the new version of a package.
const TERM_ADD: u8 = 1;
const TERM_REMOVE: u8 = 2;

/// A stored package and its listing projection.
#[derive(Debug)]
struct Entry {
    result: SearchResult,
    package: Arc<Package>,
}

#[derive(Debug, Default)]
struct IndexState {
    /// Slot per identifier; `None` marks a removed package. Slots are never reused.
    entries: Vec<Option<Entry>>,
    ids: AHashMap<String, Identifier>,
    postings: AHashMap<Term, IdentifierSet>,
}

/// Searchable store of package documentation.
///
/// Writers (`put`, `remove`) hold the write lock for a whole update; readers see
/// either the state before or after it.
#[derive(Debug)]
pub struct Index {
    salt: TermSalt,
    state: RwLock<IndexState>,
}

impl Default for Index {
    fn default() -> Self {
        Self::new(TermSalt::random())
    }
}

impl Index {
    pub fn new(salt: TermSalt) -> Self {
        Self {
            salt,
            state: RwLock::new(IndexState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn terms_of(&self, pkg: &Package) -> Vec<Term> {
        package_terms(pkg)
            .iter()
            .map(|term| self.salt.term(term))
            .collect()
    }

    /// Store `pkg`, replacing any previous version of the same import path.
    pub fn put(&self, pkg: impl Into<Arc<Package>>) -> Result<(), Error> {
        let pkg: Arc<Package> = pkg.into();
        if pkg.import_path.is_empty() {
            return Err(Error::EmptyImportPath);
        }

        let mut changes: AHashMap<Term, u8> = AHashMap::new();
        for term in self.terms_of(&pkg) {
            *changes.entry(term).or_default() |= TERM_ADD;
        }
        let result = SearchResult {
            import_path: pkg.import_path.clone(),
            synopsis: pkg.synopsis.clone(),
            is_cmd: pkg.is_cmd,
            score: package_score(&pkg),
        };

        let mut state = self.write();
        let id = match state.ids.get(&pkg.import_path) {
            Some(&id) => {
                if let Some(old) = state.entries[id as usize].as_ref() {
                    for term in self.terms_of(&old.package) {
                        *changes.entry(term).or_default() |= TERM_REMOVE;
                    }
                }
                id
            }
            None => {
                let id = Identifier::try_from(state.entries.len()).map_err(|_| Error::IndexFull)?;
                state.entries.push(None);
                state.ids.insert(pkg.import_path.clone(), id);
                id
            }
        };

        for (term, change) in changes {
            match change {
                TERM_ADD => state.postings.entry(term).or_default().add(id),
                TERM_REMOVE => remove_posting(&mut state.postings, term, id),
                _ => {}
            }
        }

        tracing::debug!("Indexed {} as #{}", pkg.import_path, id);
        state.entries[id as usize] = Some(Entry {
            result,
            package: pkg,
        });
        Ok(())
    }

    pub fn get(&self, import_path: &str) -> Result<Arc<Package>, Error> {
        let state = self.read();
        state
            .ids
            .get(import_path)
            .and_then(|&id| state.entries[id as usize].as_ref())
            .map(|entry| Arc::clone(&entry.package))
            .ok_or_else(|| Error::NotFound(import_path.to_string()))
    }

    /// Drop the package stored for `import_path`. Returns false if there was none.
    pub fn remove(&self, import_path: &str) -> bool {
        let mut state = self.write();
        let Some(&id) = state.ids.get(import_path) else {
            return false;
        };
        let Some(old) = state.entries[id as usize].take() else {
            return false;
        };
        for term in self.terms_of(&old.package) {
            remove_posting(&mut state.postings, term, id);
        }
        tracing::debug!("Removed {} (#{})", import_path, id);
        true
    }

    /// Packages matching every whitespace-separated term of `query`.
    ///
    /// [`ALL_QUERY`] lists every stored package that is not a placeholder.
    pub fn query(&self, query: &str, sort_by: SortBy) -> Result<Vec<SearchResult>, Error> {
        let state = self.read();

        let mut results: Vec<SearchResult> = if query.trim() == ALL_QUERY {
            state
                .entries
                .iter()
                .flatten()
                .filter(|entry| !entry.package.is_placeholder())
                .map(|entry| entry.result.clone())
                .collect()
        } else {
            match self.matching(&state, &query_terms(query)) {
                Some(ids) => collect_results(&state, ids.iter()),
                None => Vec::new(),
            }
        };

        sort_by.apply(&mut results);
        Ok(results)
    }

    /// Intersection of the postings of `terms`; `None` when any term matches nothing.
    fn matching(&self, state: &IndexState, terms: &[&str]) -> Option<IdentifierSet> {
        let (first, rest) = terms.split_first()?;
        let mut ids = state.postings.get(&self.salt.term(first))?.clone();
        for term in rest {
            let postings = state.postings.get(&self.salt.term(term))?;
            ids = ids.intersect(postings);
            if ids.is_empty() {
                return None;
            }
        }
        Some(ids)
    }

    /// Packages below `import_path` in the project that owns it.
    ///
    /// The owning project is the closest of `import_path` and its ancestors that
    /// is indexed as a project root.
    pub fn subdirs(&self, import_path: &str) -> Result<Vec<SearchResult>, Error> {
        let state = self.read();
        let prefix = format!("{}/", import_path);

        let mut candidate = import_path;
        loop {
            let project = self.salt.term(&format!("{PROJECT_PREFIX}{candidate}"));
            if let Some(ids) = state.postings.get(&project) {
                let mut results = collect_results(&state, ids.iter());
                results.retain(|r| r.import_path.starts_with(&prefix));
                return Ok(results);
            }
            if candidate.is_empty() {
                return Ok(Vec::new());
            }
            candidate = candidate.rsplit_once('/').map_or("", |(parent, _)| parent);
        }
    }

    /// Number of stored packages.
    pub fn len(&self) -> usize {
        self.read().entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct terms with at least one package.
    pub fn term_count(&self) -> usize {
        self.read().postings.len()
    }
}

fn remove_posting(postings: &mut AHashMap<Term, IdentifierSet>, term: Term, id: Identifier) {
    if let Some(ids) = postings.get_mut(&term) {
        ids.remove(id);
        if ids.is_empty() {
            postings.remove(&term);
        }
    }
}

/// Results of the live, non-placeholder entries among `ids`.
fn collect_results(state: &IndexState, ids: impl Iterator<Item = Identifier>) -> Vec<SearchResult> {
    ids.filter_map(|id| state.entries.get(id as usize)?.as_ref())
        .filter(|entry| !entry.package.is_placeholder())
        .map(|entry| entry.result.clone())
        .collect()
}
