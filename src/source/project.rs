//! Project identification from import paths.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const STDLIB_NAME: &str = "Go";
const STDLIB_URL: &str = "https://golang.org/";

/// A hosting pattern and how to name the project from its captures.
struct HostPattern {
    pattern: Regex,
    project: fn(&Captures<'_>) -> ProjectInfo,
}

static HOST_PATTERNS: LazyLock<Vec<HostPattern>> = LazyLock::new(|| {
    let compile = |re: &str| Regex::new(re).expect("host pattern is valid");
    vec![
        HostPattern {
            pattern: compile(r"^github\.com/([a-zA-Z0-9_.\-]+)/([a-zA-Z0-9_.\-]+)(/[a-zA-Z0-9_.\-/]*)?$"),
            project: |m| ProjectInfo {
                root: format!("github.com/{}/{}", &m[1], &m[2]),
                name: m[2].to_string(),
                url: format!("https://github.com/{}/{}/", &m[1], &m[2]),
            },
        },
        HostPattern {
            pattern: compile(r"^bitbucket\.org/([a-zA-Z0-9_.\-]+)/([a-zA-Z0-9_.\-]+)(/[a-zA-Z0-9_.\-/]*)?$"),
            project: |m| ProjectInfo {
                root: format!("bitbucket.org/{}/{}", &m[1], &m[2]),
                name: m[2].to_string(),
                url: format!("https://bitbucket.org/{}/{}/", &m[1], &m[2]),
            },
        },
        HostPattern {
            pattern: compile(r"^code\.google\.com/p/([a-z0-9\-]+)(\.[a-z0-9\-]+)?(/[a-zA-Z0-9_.\-/]+)?$"),
            project: |m| {
                let subrepo = m.get(2).map_or("", |s| s.as_str());
                ProjectInfo {
                    root: format!("code.google.com/p/{}{}", &m[1], subrepo),
                    name: format!("{}{}", &m[1], subrepo),
                    url: format!("https://code.google.com/p/{}/", &m[1]),
                }
            },
        },
        HostPattern {
            pattern: compile(r"^launchpad\.net/([a-zA-Z0-9_.\-]+)(/[a-zA-Z0-9_.\-/]+)?$"),
            project: |m| ProjectInfo {
                root: format!("launchpad.net/{}", &m[1]),
                name: m[1].to_string(),
                url: format!("https://launchpad.net/{}/", &m[1]),
            },
        },
    ]
});

/// The project an import path belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Import path prefix shared by every package of the project; empty for the standard library.
    pub root: String,
    pub name: String,
    pub url: String,
}

impl ProjectInfo {
    pub fn from_import_path(import_path: &str) -> Self {
        if is_standard_package(import_path) {
            return Self {
                root: String::new(),
                name: STDLIB_NAME.to_string(),
                url: STDLIB_URL.to_string(),
            };
        }

        for host in HOST_PATTERNS.iter() {
            if let Some(captures) = host.pattern.captures(import_path) {
                return (host.project)(&captures);
            }
        }

        let host = import_path.split('/').next().unwrap_or(import_path);
        Self {
            root: host.to_string(),
            name: host.to_string(),
            url: format!("https://{}/", host),
        }
    }
}

/// Standard library import paths have no dot in their first segment.
pub fn is_standard_package(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or_default();
    !first.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("net/http", "", "Go", "https://golang.org/")]
    #[case("fmt", "", "Go", "https://golang.org/")]
    #[case(
        "github.com/garyburd/go-oauth/oauth",
        "github.com/garyburd/go-oauth",
        "go-oauth",
        "https://github.com/garyburd/go-oauth/"
    )]
    #[case(
        "bitbucket.org/user/repo",
        "bitbucket.org/user/repo",
        "repo",
        "https://bitbucket.org/user/repo/"
    )]
    #[case(
        "code.google.com/p/go.net/websocket",
        "code.google.com/p/go.net",
        "go.net",
        "https://code.google.com/p/go/"
    )]
    #[case(
        "launchpad.net/goyaml",
        "launchpad.net/goyaml",
        "goyaml",
        "https://launchpad.net/goyaml/"
    )]
    #[case("example.com/a/b", "example.com", "example.com", "https://example.com/")]
    fn test_from_import_path(
        #[case] import_path: &str,
        #[case] root: &str,
        #[case] name: &str,
        #[case] url: &str,
    ) {
        let project = ProjectInfo::from_import_path(import_path);
        check!(project.root == root);
        check!(project.name == name);
        check!(project.url == url);
    }
}
