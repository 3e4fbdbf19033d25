//! Error handling types and utilities.

/// A specialized Result type for application-level gopkgdoc operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in the binary and configuration layers.
pub type Result<T> = anyhow::Result<T>;

/// Errors surfaced by the documentation builder, the package index and source providers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The import path has no buildable package and no known children,
    /// or has no entry in the index.
    #[error("package not found: {0}")]
    NotFound(String),

    /// The source content is unchanged since the last fetch. Callers skip the rebuild.
    #[error("package not modified: {0}")]
    NotModified(String),

    /// A package without an import path cannot be keyed in the index.
    #[error("cannot index a package with an empty import path")]
    EmptyImportPath,

    /// Every compact identifier has been handed out.
    #[error("package index is full")]
    IndexFull,

    /// Transient failure while reading sources. Safe to retry.
    #[error("failed to fetch '{import_path}': {source}")]
    Fetch {
        import_path: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking build or directory walk panicked. Retrying the same input fails again.
    #[error("background task for '{import_path}' failed: {source}")]
    Task {
        import_path: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl Error {
    /// True for the not-found sentinel, which callers propagate instead of retrying.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub const fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified(_))
    }

    /// True for failures worth retrying on the next refresh.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    pub(crate) fn fetch(import_path: &str, source: std::io::Error) -> Self {
        Self::Fetch {
            import_path: import_path.to_string(),
            source,
        }
    }

    pub(crate) fn task(import_path: &str, source: tokio::task::JoinError) -> Self {
        tracing::error!("Background task for '{}' failed: {}", import_path, source);
        Self::Task {
            import_path: import_path.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_sentinels_are_distinguished() {
        check!(Error::NotFound("a/b".into()).is_not_found());
        check!(!Error::NotModified("a/b".into()).is_not_found());
        check!(Error::NotModified("a/b".into()).is_not_modified());

        let transient = Error::fetch("a/b", std::io::Error::other("reset"));
        check!(!transient.is_not_found());
        check!(transient.to_string() == "failed to fetch 'a/b': reset");
        check!(transient.is_transient());
    }

    #[tokio::test]
    async fn test_panicked_task_is_not_transient() {
        let result: std::result::Result<(), _> = tokio::task::spawn_blocking(|| panic!("boom")).await;
        let join_error = result.expect_err("task panics");
        let error = Error::task("a/b", join_error);
        check!(!error.is_transient());
        check!(!error.is_not_found());
        check!(error.to_string().starts_with("background task for 'a/b' failed"));
    }
}
