use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;

use crate::search;
use crate::server;
use crate::table;

mod args;
mod config;
mod format;
mod http_backend;

pub use args::{Cli, Commands, InfoArgs, OutputFormat, SearchArgs, ServeArgs};

use config::{
    apply_info_config_defaults, apply_search_config_defaults, apply_serve_config_defaults,
    load_cli_config,
};
use http_backend::HttpSearchBackend;

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    crate::logging::init(cli.log_level.as_deref())?;

    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }

            let addr_arg = args::bind_addr(serve_args.addr.as_deref());
            let addr: SocketAddr = addr_arg
                .parse()
                .with_context(|| format!("invalid bind address {addr_arg:?}"))?;

            // Load before binding so no request is accepted until the
            // table is ready or has definitively failed to load.
            let data = args::data_path(serve_args.data.as_ref());
            let table = table::load_or_empty(&data);

            info!(%addr, "starting operadoras HTTP server");

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(server::run(addr, table, &serve_args.cors_origins))?;
            Ok(())
        }
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let result = if let Some(server_url) =
                effective_server_url(search_args.server.as_deref(), search_args.no_server)
            {
                let backend = HttpSearchBackend::new(server_url)?;
                backend.search(&search_args.term)?
            } else {
                let data = args::data_path(search_args.data.as_ref());
                let table = table::load_or_empty(&data);
                search::search(&table, &search_args.term)?
            };

            match search_args.format {
                OutputFormat::Text => format::print_text(&result),
                OutputFormat::Table => format::print_table(&result),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &result)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Info(mut info_args)) => {
            if let Some(ref config) = cli_config {
                apply_info_config_defaults(config, &mut info_args);
            }

            let data = args::data_path(info_args.data.as_ref());
            let table = table::load(&data)?;
            let info = table
                .info()
                .context("loaded table is missing its metadata")?;

            match info_args.format {
                OutputFormat::Text | OutputFormat::Table => format::print_info_text(&info),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &info)?;
                    println!();
                    Ok(())
                }
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn effective_server_url(server_flag: Option<&str>, no_server: bool) -> Option<String> {
    if no_server {
        None
    } else {
        server_flag.map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::effective_server_url;

    #[test]
    fn no_server_overrides_configured_url() {
        assert_eq!(effective_server_url(Some("http://x.test"), true), None);
        assert_eq!(
            effective_server_url(Some("http://x.test"), false).as_deref(),
            Some("http://x.test")
        );
        assert_eq!(effective_server_url(None, false), None);
    }
}
