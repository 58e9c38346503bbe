//! Corpus loader CLI
//!
//! Run with: cargo run -p corpus-loader --features cli -- --corpus docs/ --text-header document

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use corpus_loader::{CorpusLoader, DataType, ExportFormat, LoaderConfig, Role};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build a corpus from document and metadata files and export it
#[derive(Parser)]
#[command(name = "corpus-loader", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Files or zip archives holding documents
    #[arg(long, num_args = 1..)]
    corpus: Vec<String>,

    /// Files or zip archives holding metadata
    #[arg(long, num_args = 1..)]
    meta: Vec<String>,

    /// Column holding document text
    #[arg(long, default_value = "document")]
    text_header: String,

    /// Corpus-side column joined to the metadata
    #[arg(long)]
    corpus_link: Option<String>,

    /// Metadata-side column joined to the corpus
    #[arg(long)]
    meta_link: Option<String>,

    /// Override a header datatype, as NAME=TYPE (corpus headers first, then metadata)
    #[arg(long = "datatype", value_name = "NAME=TYPE")]
    datatypes: Vec<String>,

    /// Leave a header out of the corpus
    #[arg(long = "exclude", value_name = "NAME")]
    excluded: Vec<String>,

    /// Corpus name; generated when omitted
    #[arg(long, default_value = "")]
    name: String,

    /// Export format: csv, xlsx or zip
    #[arg(long, default_value = "csv")]
    format: String,

    /// Output file; defaults to <name>.<format>
    #[arg(long)]
    output: Option<PathBuf>,

    /// Load files whose name starts with '.'
    #[arg(long)]
    include_hidden: bool,

    /// List files under the root directory with their inferred headers, then exit
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corpus_loader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    let include_hidden = cli.include_hidden || config.ingest.include_hidden;
    let mut loader = CorpusLoader::new(config)?;

    if cli.list {
        return list_files(&mut loader);
    }
    if cli.corpus.is_empty() && cli.meta.is_empty() {
        anyhow::bail!("nothing to load: pass --corpus and/or --meta");
    }
    let format: ExportFormat = cli.format.parse()?;

    if !cli.corpus.is_empty() {
        loader.load_files(&cli.corpus, Role::Corpus, include_hidden)?;
    }
    if !cli.meta.is_empty() {
        loader.load_files(&cli.meta, Role::Meta, include_hidden)?;
    }
    apply_header_edits(&mut loader, &cli)?;

    loader.set_text_header(Some(&cli.text_header));
    if loader.text_header().is_none() {
        anyhow::bail!("no loaded header is named '{}'", cli.text_header);
    }
    loader.set_link_header(Role::Corpus, cli.corpus_link.as_deref());
    loader.set_link_header(Role::Meta, cli.meta_link.as_deref());

    let name = loader.build(&cli.name)?.name().to_string();

    let mut exporter = loader.exporter(&name, format)?;
    let bar = ProgressBar::new(exporter.total() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} rows")?.progress_chars("=> "),
    );
    bar.set_message(format!("Exporting {}", name));
    for step in exporter.by_ref() {
        bar.set_position(step?.processed as u64);
    }
    let bytes = exporter.finish()?;
    bar.finish_and_clear();

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", name, format.extension())));
    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = loader
        .corpus(&name)
        .map(|corpus| corpus.summary())
        .context("corpus disappeared after build")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    tracing::info!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn apply_header_edits(loader: &mut CorpusLoader, cli: &Cli) -> anyhow::Result<()> {
    for edit in &cli.datatypes {
        let (name, datatype) = edit
            .split_once('=')
            .with_context(|| format!("expected NAME=TYPE, got '{}'", edit))?;
        let datatype: DataType = datatype.parse().map_err(anyhow::Error::msg)?;
        let updated = [Role::Corpus, Role::Meta]
            .into_iter()
            .any(|role| loader.update_header(role, name, None, Some(datatype)));
        if !updated {
            anyhow::bail!("no loaded header is named '{}'", name);
        }
    }
    for name in &cli.excluded {
        let updated = [Role::Corpus, Role::Meta]
            .into_iter()
            .any(|role| loader.update_header(role, name, Some(false), None));
        if !updated {
            anyhow::bail!("no loaded header is named '{}'", name);
        }
    }
    Ok(())
}

fn list_files(loader: &mut CorpusLoader) -> anyhow::Result<()> {
    let ingest = loader.config().ingest.clone();
    for file in loader.discover(true)? {
        if file.is_hidden() && !ingest.include_hidden {
            continue;
        }
        let headers = corpus_loader::LoaderStrategy::for_file(&file)
            .and_then(|strategy| strategy.infer_headers(&file, &ingest));
        match headers {
            Ok(headers) => {
                let described: Vec<String> = headers
                    .iter()
                    .map(|h| format!("{}:{}", h.name, h.datatype))
                    .collect();
                println!("{}  [{}]", file.path(), described.join(", "));
            }
            Err(e) => println!("{}  ({})", file.path(), e),
        }
    }
    Ok(())
}
