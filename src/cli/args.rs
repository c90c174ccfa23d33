use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

/// Default location of the operator data file.
pub const DEFAULT_DATA_PATH: &str = "operadoras.csv";

/// Default bind address for `operadoras serve`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Top-level CLI entrypoint for `operadoras`.
#[derive(Parser, Debug)]
#[command(
    name = "operadoras",
    about = "Search healthcare-plan operator records loaded from a delimited file",
    author = "operadoras developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Log filter directive (e.g. "debug" or "operadoras=trace").
    ///
    /// Overrides the `RUST_LOG` environment variable. Defaults to
    /// "info" when neither is set.
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the data file and serve the search API over HTTP.
    Serve(ServeArgs),
    /// Run a single search and print the matching rows.
    Search(SearchArgs),
    /// Load the data file and print its columns and row count.
    Info(InfoArgs),
}

/// Arguments specific to the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Delimited data file to load at startup.
    #[arg(long = "data", env = "OPERADORAS_DATA")]
    pub data: Option<PathBuf>,

    /// Address to bind the HTTP server to, e.g. "127.0.0.1:5000".
    ///
    /// Defaults to the config file's `[serve] addr`, then to
    /// "127.0.0.1:5000".
    #[arg(long = "addr")]
    pub addr: Option<String>,

    /// Origins allowed to call the API from a browser.
    ///
    /// Multiple origins can be given via commas or repeated flags.
    /// When none are configured, any origin is allowed.
    #[arg(long = "cors-origin", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text term matched case-insensitively against every column.
    pub term: String,

    /// Delimited data file to search (ignored when using a server).
    #[arg(long = "data", env = "OPERADORAS_DATA")]
    pub data: Option<PathBuf>,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Optional server URL for delegating the search to a running
    /// `operadoras serve`.
    ///
    /// When set (either via this flag or the `OPERADORAS_SERVER_URL`
    /// environment variable), the CLI calls `GET /buscar` on the
    /// server instead of loading the data file locally. Use
    /// `--no-server` to override this and force local execution.
    #[arg(long = "server", env = "OPERADORAS_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and force local search.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments specific to the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Delimited data file to inspect.
    #[arg(long = "data", env = "OPERADORAS_DATA")]
    pub data: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
}

/// Resolve the bind address, falling back to the built-in default.
pub fn bind_addr(addr: Option<&str>) -> &str {
    addr.unwrap_or(DEFAULT_ADDR)
}

/// Resolve the data path, falling back to the built-in default.
pub fn data_path(data: Option<&PathBuf>) -> PathBuf {
    data.cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["operadoras", "serve"]).expect("parse");
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.addr, None);
        assert_eq!(bind_addr(args.addr.as_deref()), DEFAULT_ADDR);
        assert!(args.cors_origins.is_empty());
    }

    #[test]
    fn serve_accepts_comma_separated_origins() {
        let cli = Cli::try_parse_from([
            "operadoras",
            "serve",
            "--cors-origin",
            "http://a.test,http://b.test",
            "--data",
            "dados.csv",
        ])
        .expect("parse");
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(
            args.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(args.data, Some(PathBuf::from("dados.csv")));
    }

    #[test]
    fn search_respects_all_fields() {
        let cli = Cli::try_parse_from([
            "operadoras",
            "--log-level",
            "debug",
            "search",
            "alfa",
            "--format",
            "json",
            "--server",
            "http://localhost:5000",
        ])
        .expect("parse");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(args.term, "alfa");
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.server.as_deref(), Some("http://localhost:5000"));
        assert!(!args.no_server);
    }

    #[test]
    fn data_path_defaults_to_operadoras_csv() {
        assert_eq!(data_path(None), PathBuf::from(DEFAULT_DATA_PATH));
        let custom = PathBuf::from("x.csv");
        assert_eq!(data_path(Some(&custom)), custom);
    }
}
