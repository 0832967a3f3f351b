use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "table-export",
    version,
    about = "Export table records to CSV, XLSX or PDF"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file to use instead of the platform default.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write an export file for a table.
    Export(ExportArgs),

    /// Print one page of the table as HTML.
    Preview(PreviewArgs),

    /// Show the effective configuration.
    Config,
}

/// Column selection shared by export and preview.
#[derive(Args)]
pub struct ColumnArgs {
    /// Table JSON: { heading, columns, hidden_columns, records }.
    #[arg(value_name = "TABLE_JSON")]
    pub table: PathBuf,

    /// Only include these columns (comma separated names).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub columns: Vec<String>,

    /// Extra constant column, as Title=Value. Repeatable.
    #[arg(long = "additional", value_name = "TITLE=VALUE", value_parser = parse_pair)]
    pub additional: Vec<(String, String)>,

    /// Include toggled-off columns.
    #[arg(long)]
    pub show_hidden: bool,

    /// Extra view data shown in PDF and HTML output, as key=value. Repeatable.
    #[arg(long = "view-data", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub view_data: Vec<(String, String)>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub columns: ColumnArgs,

    /// csv, xlsx or pdf (default from config).
    #[arg(long)]
    pub format: Option<String>,

    /// Directory the file is written into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// File name without extension (default: current time).
    #[arg(long)]
    pub file_name: Option<String>,

    /// portrait or landscape (PDF only).
    #[arg(long)]
    pub orientation: Option<String>,

    /// CSV delimiter character.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// native or wkhtmltopdf.
    #[arg(long, value_name = "ENGINE")]
    pub pdf_engine: Option<String>,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub columns: ColumnArgs,

    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Print every record instead of one page.
    #[arg(long, conflicts_with = "page")]
    pub all: bool,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_args() {
        let cli = Cli::parse_from([
            "table-export",
            "export",
            "users.json",
            "--format",
            "csv",
            "--columns",
            "id,name",
            "--additional",
            "Source=import",
            "-v",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.format.as_deref(), Some("csv"));
                assert_eq!(args.columns.columns, vec!["id", "name"]);
                assert_eq!(
                    args.columns.additional,
                    vec![("Source".to_string(), "import".to_string())]
                );
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }
}
