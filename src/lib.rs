pub mod cli;
pub mod config;
pub mod doc;
pub mod error;
pub mod search;
pub mod service;
pub mod source;
pub mod tracing;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use search::{ALL_QUERY, Index, SortBy, TermSalt};
pub use service::{CrawlSummary, Outcome};
pub use source::{DirectoryProvider, Fetched, ProjectInfo, SourceProvider};
pub use types::{
    Annotation, Decl, Example, File, Func, Package, SearchResult, SourceBlob, Type, Value,
};
