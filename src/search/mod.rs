//! Package Index: term-based search over built packages.
//!
//! Every stored package contributes a handful of lower-cased terms (its name,
//! the last segment of its import path, `project:<root>` and `import:<path>`
//! for each import). A query is the intersection of the postings of its terms.

pub(crate) mod identifier;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod term;

pub use index::Index;
pub use query::{ALL_QUERY, SortBy};
pub use term::{TERM_SIZE, Term, TermSalt};
