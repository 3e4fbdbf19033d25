use crate::search::SortBy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gopkgdoc")]
#[command(about = "Build and search documentation for Go packages", long_about = None)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/gopkgdoc/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Source tree to serve, overriding the config file
    #[arg(long, global = true, env = "GOPKGDOC_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build one package and print it as JSON
    Build { import_path: String },
    /// Index the source tree and print packages matching every query term
    Search {
        query: String,
        #[arg(short, long, value_enum, default_value_t = SortArg::None)]
        sort: SortArg,
    },
    /// Index the source tree and list the packages below an import path
    Subdirs { import_path: String },
    /// Index the source tree and print one indexed package as JSON
    Show { import_path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    None,
    Path,
    Score,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::None => Self::None,
            SortArg::Path => Self::Path,
            SortArg::Score => Self::Score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_parse_search_with_sort() {
        let cli = Cli::parse_from(["gopkgdoc", "--root", "/srv/src", "search", "http json", "--sort", "score"]);
        check!(cli.root == Some(PathBuf::from("/srv/src")));
        let_assert!(Commands::Search { query, sort } = cli.command);
        check!(query == "http json");
        check!(SortBy::from(sort) == SortBy::Score);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["gopkgdoc", "show", "example.com/a", "--config", "c.toml"]);
        check!(cli.config == Some(PathBuf::from("c.toml")));
        let_assert!(Commands::Show { import_path } = cli.command);
        check!(import_path == "example.com/a");
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
