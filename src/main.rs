use anyhow::Context;
use clap::Parser;
use gopkgdoc::cli::{Cli, Commands};
use gopkgdoc::source::SourceProvider;
use gopkgdoc::{Config, Index, doc, service};
use serde::Serialize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gopkgdoc::tracing::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).await?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    let provider = config.provider();
    tracing::debug!("Serving sources from {}", provider.root().display());

    match cli.command {
        Commands::Build { import_path } => {
            let fetched = provider
                .fetch(&import_path, None)
                .await
                .with_context(|| format!("Failed to fetch {}", import_path))?;
            let mut pkg = doc::build(
                &import_path,
                &config.anchor_format,
                &fetched.sources,
                &fetched.children,
            )?;
            pkg.project_root = fetched.project.root;
            pkg.project_name = fetched.project.name;
            pkg.project_url = fetched.project.url;
            pkg.etag = fetched.etag;
            print_json(&pkg)?;
        }
        Commands::Search { query, sort } => {
            let index = crawl(&provider, &config).await?;
            print_json(&index.query(&query, sort.into())?)?;
        }
        Commands::Subdirs { import_path } => {
            let index = crawl(&provider, &config).await?;
            print_json(&index.subdirs(&import_path)?)?;
        }
        Commands::Show { import_path } => {
            let index = crawl(&provider, &config).await?;
            let pkg = index.get(&import_path)?;
            print_json(&*pkg)?;
        }
    }

    Ok(())
}

async fn crawl(provider: &impl SourceProvider, config: &Config) -> anyhow::Result<Index> {
    let index = Index::default();
    service::crawl(provider, &index, &config.anchor_format, config.concurrency())
        .await
        .with_context(|| format!("Failed to crawl {}", config.root.display()))?;
    Ok(index)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
