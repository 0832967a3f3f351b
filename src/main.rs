use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use table_export::{ExportConfig, ExportRequest, ExportRequestBuilder, PdfEngineKind, TableData};

mod cli;

use cli::{Cli, ColumnArgs, Command, ExportArgs, PreviewArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ExportConfig::load_from(path)?,
        None => ExportConfig::load()?,
    };

    match cli.command {
        Command::Export(args) => run_export(&config, args),
        Command::Preview(args) => run_preview(&config, args),
        Command::Config => show_config(&config),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_export(config: &ExportConfig, args: ExportArgs) -> Result<()> {
    let mut builder = request_builder(config, &args.columns)?;

    if let Some(format) = args.format {
        builder = builder.format(format);
    }
    if let Some(file_name) = args.file_name {
        builder = builder.file_name(file_name);
    }
    if let Some(orientation) = args.orientation {
        builder = builder.page_orientation(orientation);
    }
    if let Some(delimiter) = args.delimiter {
        builder = builder.csv_delimiter(delimiter);
    }
    if let Some(engine) = args.pdf_engine {
        builder = builder.pdf_engine(engine.parse::<PdfEngineKind>()?);
    }

    let request = builder.build()?;
    let download = request.download()?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;
    let path = download.save_to(&args.output_dir)?;

    info!(path = %path.display(), bytes = download.bytes.len(), "Export saved");
    println!("{}", path.display());
    Ok(())
}

fn run_preview(config: &ExportConfig, args: PreviewArgs) -> Result<()> {
    let request: ExportRequest = request_builder(config, &args.columns)?.build()?;

    let html = if args.all {
        request.print_html()?
    } else {
        request.preview_html(args.page)?
    };

    print!("{}", html);
    Ok(())
}

fn show_config(config: &ExportConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    let problems = config.validate();
    if !problems.is_empty() {
        eprintln!("Configuration problems:");
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        anyhow::bail!("configuration has {} problem(s)", problems.len());
    }

    Ok(())
}

fn request_builder(config: &ExportConfig, args: &ColumnArgs) -> Result<ExportRequestBuilder> {
    let data = load_table(&args.table)?;

    let mut builder = ExportRequest::builder(config)
        .table(data.table)
        .records(data.records)
        .filtered_columns(args.columns.iter().cloned())
        .additional_columns(args.additional.iter().cloned())
        .with_hidden_columns(args.show_hidden);

    for (key, value) in &args.view_data {
        builder = builder.extra_view_data(key.as_str(), value.as_str());
    }

    Ok(builder)
}

fn load_table(path: &Path) -> Result<TableData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse table file {}", path.display()))
}
